use quickdial_core::{CallType, CoreError};
use quickdial_store::error::{StoreError, StoreErrorKind};
use quickdial_store::repo::{CallNew, ContactNew};
use quickdial_store::Store;

fn store() -> Store {
    let store = Store::open_in_memory().expect("open in memory");
    store.migrate().expect("migrate");
    store
}

fn new_contact(id: &str, name: &str, numbers: &[&str]) -> ContactNew {
    ContactNew {
        id: Some(id.to_string()),
        display_name: name.to_string(),
        numbers: numbers.iter().map(|n| n.to_string()).collect(),
        ..ContactNew::default()
    }
}

#[test]
fn contact_crud_roundtrip() {
    let store = store();
    let created = store
        .contacts()
        .create(ContactNew {
            photo_uri: Some(" content://photos/42 ".to_string()),
            ..new_contact("42", "  Alex   Kim ", &["+15550101", "555-0101", "(415) 555-1212"])
        })
        .expect("create contact");
    assert_eq!(created.display_name.as_deref(), Some("Alex Kim"));
    assert_eq!(created.numbers, vec!["+15550101", "(415) 555-1212"]);
    assert_eq!(created.photo_uri.as_deref(), Some("content://photos/42"));

    let fetched = store
        .contacts()
        .get("42")
        .expect("get contact")
        .expect("contact exists");
    assert_eq!(fetched, created);

    store.contacts().set_starred("42", true).expect("star");
    assert!(store.contacts().get("42").expect("get").expect("exists").starred);

    store.contacts().delete("42").expect("delete contact");
    assert!(store.contacts().get("42").expect("get contact").is_none());
}

#[test]
fn generated_ids_are_unique() {
    let store = store();
    let first = store
        .contacts()
        .create(ContactNew {
            id: None,
            ..new_contact("", "Ivy", &["5550101"])
        })
        .expect("create");
    let second = store
        .contacts()
        .create(ContactNew {
            id: None,
            ..new_contact("", "Ivy", &["5550102"])
        })
        .expect("create");
    assert_ne!(first.id, second.id);
    assert_eq!(store.contacts().count().expect("count"), 2);
}

#[test]
fn create_rejects_invalid_input() {
    let store = store();
    let err = store
        .contacts()
        .create(new_contact("1", "  ", &["5550101"]))
        .unwrap_err();
    assert!(matches!(err, StoreError::Core(CoreError::EmptyDisplayName)));

    let err = store
        .contacts()
        .create(new_contact("1", "Ivy", &["12"]))
        .unwrap_err();
    assert!(matches!(err, StoreError::Core(CoreError::InvalidPhoneNumber(_))));

    let err = store.contacts().create(new_contact("1", "Ivy", &[])).unwrap_err();
    assert!(matches!(err, StoreError::Core(CoreError::NoPhoneNumbers)));

    store
        .contacts()
        .create(new_contact("1", "Ivy", &["5550101"]))
        .expect("create");
    let err = store
        .contacts()
        .create(new_contact("1", "Ivy", &["5550101"]))
        .unwrap_err();
    assert_eq!(err.kind(), StoreErrorKind::InvalidInput);
}

#[test]
fn add_number_skips_same_line() {
    let store = store();
    store
        .contacts()
        .create(new_contact("7", "Ivy", &["5550101"]))
        .expect("create");
    assert!(!store.contacts().add_number("7", "+1 555 0101").expect("add"));
    assert!(store.contacts().add_number("7", "(415) 555-1212").expect("add"));
    let numbers = store.contacts().get("7").expect("get").expect("exists").numbers;
    assert_eq!(numbers, vec!["5550101", "(415) 555-1212"]);

    let err = store.contacts().add_number("missing", "5550101").unwrap_err();
    assert_eq!(err.kind(), StoreErrorKind::NotFound);
}

#[test]
fn missing_contacts_report_not_found() {
    let store = store();
    assert_eq!(
        store.contacts().set_starred("nope", true).unwrap_err().kind(),
        StoreErrorKind::NotFound
    );
    assert_eq!(
        store.contacts().set_photo_uri("nope", None).unwrap_err().kind(),
        StoreErrorKind::NotFound
    );
    assert_eq!(
        store.contacts().delete("nope").unwrap_err().kind(),
        StoreErrorKind::NotFound
    );
}

#[test]
fn list_by_display_name_ignores_case_and_spacing() {
    let store = store();
    store
        .contacts()
        .create(new_contact("1", "Alex Kim", &["5550101"]))
        .expect("create");
    store
        .contacts()
        .create(new_contact("2", "Alexandra", &["5550102"]))
        .expect("create");
    let found = store
        .contacts()
        .list_by_display_name(" alex  KIM ")
        .expect("list");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, "1");
    assert_eq!(store.contacts().list().expect("list").len(), 2);
}

#[test]
fn call_log_returns_newest_first() {
    let store = store();
    for (number, at, call_type) in [
        ("5550101", 10, CallType::Missed),
        ("5550102", 30, CallType::Outgoing),
        ("5550103", 20, CallType::Incoming),
    ] {
        store
            .calls()
            .record(CallNew {
                number: number.to_string(),
                cached_name: Some("  ".to_string()),
                occurred_at_millis: at,
                call_type,
            })
            .expect("record call");
    }

    let rows = store.calls().recent(2).expect("recent");
    let numbers: Vec<&str> = rows.iter().filter_map(|r| r.number.as_deref()).collect();
    assert_eq!(numbers, vec!["5550102", "5550103"]);
    assert_eq!(rows[0].call_type, Some(CallType::Outgoing));
    assert!(rows[0].cached_name.is_none());
    assert_eq!(store.calls().count().expect("count"), 3);
}

#[test]
fn unknown_call_type_reads_as_missing() {
    let store = store();
    store
        .connection()
        .execute(
            "INSERT INTO call_log (number, occurred_at, call_type) VALUES ('5550101', 5, 'voicemail');",
            [],
        )
        .expect("insert raw call");
    let rows = store.calls().recent(10).expect("recent");
    assert_eq!(rows.len(), 1);
    assert!(rows[0].call_type.is_none());
}
