use crate::error::{Result, StoreError};
use quickdial_core::domain::normalize_display_name;
use quickdial_core::phone;
use quickdial_core::CoreError;
use rusqlite::{params, Connection, OptionalExtension, Params};

#[derive(Debug, Clone, Default)]
pub struct ContactNew {
    /// Generated when absent.
    pub id: Option<String>,
    pub display_name: String,
    pub numbers: Vec<String>,
    pub photo_uri: Option<String>,
    pub starred: bool,
}

/// A contact as the provider holds it; names and numbers are raw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredContact {
    pub id: String,
    pub display_name: Option<String>,
    pub numbers: Vec<String>,
    pub photo_uri: Option<String>,
    pub starred: bool,
}

pub struct ContactsRepo<'a> {
    conn: &'a Connection,
}

impl<'a> ContactsRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn create(&self, input: ContactNew) -> Result<StoredContact> {
        let display_name =
            normalize_display_name(&input.display_name).ok_or(CoreError::EmptyDisplayName)?;
        let numbers = checked_numbers(&input.numbers)?;
        let id = match input.id.as_deref().map(str::trim) {
            Some("") => return Err(CoreError::EmptyContactId.into()),
            Some(id) => id.to_string(),
            None => uuid::Uuid::new_v4().to_string(),
        };
        if self.exists(&id)? {
            return Err(StoreError::InvalidInput(format!(
                "contact id already exists: {id}"
            )));
        }
        let photo_uri = input
            .photo_uri
            .map(|uri| uri.trim().to_string())
            .filter(|uri| !uri.is_empty());

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO contacts (id, display_name, name_folded, photo_uri, starred)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                id,
                display_name,
                fold_name(&display_name),
                photo_uri,
                input.starred
            ],
        )?;
        for number in &numbers {
            insert_number(&tx, &id, number)?;
        }
        tx.commit()?;

        Ok(StoredContact {
            id,
            display_name: Some(display_name),
            numbers,
            photo_uri,
            starred: input.starred,
        })
    }

    pub fn get(&self, id: &str) -> Result<Option<StoredContact>> {
        let head = self
            .conn
            .query_row(
                "SELECT id, display_name, photo_uri, starred FROM contacts WHERE id = ?1;",
                [id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, bool>(3)?,
                    ))
                },
            )
            .optional()?;
        let Some((id, display_name, photo_uri, starred)) = head else {
            return Ok(None);
        };
        let numbers = self.numbers_for(&id)?;
        Ok(Some(StoredContact {
            id,
            display_name,
            numbers,
            photo_uri,
            starred,
        }))
    }

    /// Every contact, in insertion order.
    pub fn list(&self) -> Result<Vec<StoredContact>> {
        self.load_where("1 = 1", params![])
    }

    pub fn list_by_display_name(&self, name: &str) -> Result<Vec<StoredContact>> {
        let Some(name) = normalize_display_name(name) else {
            return Ok(Vec::new());
        };
        self.load_where("name_folded = ?1", params![fold_name(&name)])
    }

    /// Adds `number` unless the contact already has that line. Returns whether
    /// a row was added.
    pub fn add_number(&self, id: &str, number: &str) -> Result<bool> {
        let number = number.trim();
        if !phone::is_valid(number) {
            return Err(CoreError::InvalidPhoneNumber(number.to_string()).into());
        }
        if !self.exists(id)? {
            return Err(StoreError::NotFound(id.to_string()));
        }
        let line = phone::normalize(number);
        if self.numbers_for(id)?.iter().any(|n| phone::normalize(n) == line) {
            return Ok(false);
        }
        insert_number(self.conn, id, number)?;
        Ok(true)
    }

    pub fn set_starred(&self, id: &str, starred: bool) -> Result<()> {
        let updated = self.conn.execute(
            "UPDATE contacts SET starred = ?1 WHERE id = ?2;",
            params![starred, id],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    pub fn set_photo_uri(&self, id: &str, photo_uri: Option<&str>) -> Result<()> {
        let photo_uri = photo_uri.map(str::trim).filter(|uri| !uri.is_empty());
        let updated = self.conn.execute(
            "UPDATE contacts SET photo_uri = ?1 WHERE id = ?2;",
            params![photo_uri, id],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM contacts WHERE id = ?1;", [id])?;
        if deleted == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    pub fn count(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM contacts;", [], |row| row.get(0))?;
        Ok(count)
    }

    fn exists(&self, id: &str) -> Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row("SELECT 1 FROM contacts WHERE id = ?1;", [id], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(found.is_some())
    }

    fn load_where<P: Params>(&self, filter: &str, params: P) -> Result<Vec<StoredContact>> {
        let sql = format!("SELECT id FROM contacts WHERE {filter} ORDER BY rowid;");
        let mut stmt = self.conn.prepare(&sql)?;
        let ids = stmt
            .query_map(params, |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        let mut contacts = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(contact) = self.get(&id)? {
                contacts.push(contact);
            }
        }
        Ok(contacts)
    }

    fn numbers_for(&self, id: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT number FROM phone_numbers WHERE contact_id = ?1 AND number IS NOT NULL ORDER BY id;",
        )?;
        let numbers = stmt
            .query_map([id], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(numbers)
    }
}

/// Lowercased name the match passes compare against. SQLite only folds ASCII
/// case on its own.
pub(crate) fn fold_name(name: &str) -> String {
    name.to_lowercase()
}

fn insert_number(conn: &Connection, contact_id: &str, number: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO phone_numbers (contact_id, number, normalized) VALUES (?1, ?2, ?3);",
        params![contact_id, number, phone::normalize(number)],
    )?;
    Ok(())
}

/// Trimmed, valid numbers with one spelling per line.
fn checked_numbers(raw: &[String]) -> Result<Vec<String>> {
    let mut numbers: Vec<String> = Vec::new();
    for number in raw {
        let number = number.trim();
        if !phone::is_valid(number) {
            return Err(CoreError::InvalidPhoneNumber(number.to_string()).into());
        }
        if !numbers.iter().any(|kept| phone::same_number(kept, number)) {
            numbers.push(number.to_string());
        }
    }
    if numbers.is_empty() {
        return Err(CoreError::NoPhoneNumbers.into());
    }
    Ok(numbers)
}
