use anyhow::Result;
use quickdial_config::AppConfig;
use quickdial_core::phone;
use quickdial_core::search::RankedContact;
use quickdial_core::time::format_timestamp_millis;
use quickdial_core::{Contact, SearchEngine};
use quickdial_store::{Store, StoreProvider};
use serde::Serialize;
use std::io::{self, Write};

pub mod calls;
pub mod contacts;
pub mod format;
pub mod search;
pub mod sync;

pub struct Context<'a> {
    pub store: &'a Store,
    pub json: bool,
    pub config: &'a AppConfig,
}

impl<'a> Context<'a> {
    pub fn engine(&self) -> SearchEngine<StoreProvider<'a>> {
        SearchEngine::new(self.store.provider())
    }
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct CallView {
    pub call_type: &'static str,
    pub timestamp_millis: i64,
}

/// A contact as the CLI shows it: the engine value plus display formatting.
#[derive(Debug, Clone, Serialize)]
pub struct ContactView {
    pub id: String,
    pub name: String,
    pub phone_number: String,
    pub formatted_number: String,
    pub phone_numbers: Vec<String>,
    pub photo_uri: Option<String>,
    pub international: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_call: Option<CallView>,
}

impl ContactView {
    pub fn new(contact: Contact, config: &AppConfig) -> Self {
        let international = phone::is_international(
            &config.home_country,
            &contact.phone_number,
            config.international_detection,
        );
        Self {
            id: contact.id.to_string(),
            formatted_number: phone::format(&contact.phone_number),
            name: contact.name,
            phone_number: contact.phone_number,
            phone_numbers: contact.phone_numbers,
            photo_uri: contact.photo_uri,
            international,
            weight: None,
            last_call: contact.last_call.map(|call| CallView {
                call_type: call.call_type.as_str(),
                timestamp_millis: call.timestamp_millis,
            }),
        }
    }

    pub fn ranked(ranked: RankedContact, config: &AppConfig) -> Self {
        Self {
            weight: Some(ranked.weight),
            ..Self::new(ranked.contact, config)
        }
    }
}

pub fn contact_views(contacts: Vec<Contact>, config: &AppConfig) -> Vec<ContactView> {
    contacts
        .into_iter()
        .map(|contact| ContactView::new(contact, config))
        .collect()
}

pub fn print_contacts(ctx: &Context<'_>, views: &[ContactView], empty: &str) -> Result<()> {
    if ctx.json {
        return print_json(&views);
    }
    if views.is_empty() {
        println!("{empty}");
        return Ok(());
    }
    let mut stdout = io::stdout().lock();
    for view in views {
        writeln!(stdout, "{}", contact_line(view))?;
    }
    Ok(())
}

fn contact_line(view: &ContactView) -> String {
    let mut line = format!("{}  {}  {}", view.id, view.name, view.formatted_number);
    let others = view.phone_numbers.len().saturating_sub(1);
    if others > 0 {
        line.push_str(&format!(" (+{others})"));
    }
    if view.international {
        line.push_str(" [intl]");
    }
    if let Some(weight) = view.weight {
        line.push_str(&format!(" [{weight}]"));
    }
    if let Some(call) = &view.last_call {
        line.push_str(&format!(
            "  {} {}",
            call.call_type,
            format_timestamp_millis(call.timestamp_millis)
        ));
    }
    line
}
