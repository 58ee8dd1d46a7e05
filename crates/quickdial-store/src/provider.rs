//! The store seen through the core provider boundary.

use crate::error::{Result, StoreError};
use crate::query::{name_clause, name_param};
use crate::repo::CallLogRepo;
use quickdial_core::phone;
use quickdial_core::provider::Result as ProviderResult;
use quickdial_core::{CallLogRow, ContactProvider, MatchPass, ProviderError, ProviderRow};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension};
use tracing::{trace, warn};

const ROW_SELECT: &str = "SELECT c.id, c.display_name, p.number
     FROM contacts c
     INNER JOIN phone_numbers p ON p.contact_id = c.id";

/// Row order: contact insertion order, then number insertion order.
const ROW_ORDER: &str = "ORDER BY c.rowid, p.id";

#[derive(Clone, Copy)]
pub struct StoreProvider<'a> {
    conn: &'a Connection,
}

impl<'a> StoreProvider<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn rows(&self, filter: Option<&str>, params: Vec<Value>) -> ProviderResult<Vec<ProviderRow>> {
        let sql = match filter {
            Some(filter) => format!("{ROW_SELECT} WHERE {filter} {ROW_ORDER};"),
            None => format!("{ROW_SELECT} {ROW_ORDER};"),
        };
        query_rows(self.conn, &sql, params).map_err(provider_error)
    }
}

impl ContactProvider for StoreProvider<'_> {
    fn name_matches(&self, pass: MatchPass, query: &str) -> ProviderResult<Vec<ProviderRow>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        trace!(pass = pass.as_str(), query, "name pass");
        self.rows(
            Some(name_clause(pass)),
            vec![Value::from(name_param(pass, query))],
        )
    }

    fn number_matches(&self, number: &str) -> ProviderResult<Vec<ProviderRow>> {
        let line = phone::normalize(number);
        if line.is_empty() {
            return Ok(Vec::new());
        }
        self.rows(Some("p.normalized = ?1"), vec![Value::from(line)])
    }

    fn contact_rows(&self, contact_id: &str) -> ProviderResult<Vec<ProviderRow>> {
        self.rows(Some("c.id = ?1"), vec![Value::from(contact_id.to_string())])
    }

    fn favorites(&self) -> ProviderResult<Vec<ProviderRow>> {
        self.rows(Some("c.starred = 1"), Vec::new())
    }

    fn roster(&self) -> ProviderResult<Vec<ProviderRow>> {
        self.rows(None, Vec::new())
    }

    fn recent_calls(&self, limit: usize) -> ProviderResult<Vec<CallLogRow>> {
        CallLogRepo::new(self.conn)
            .recent(limit)
            .map_err(provider_error)
    }

    fn photo_uri(&self, contact_id: &str) -> Option<String> {
        let photo = self
            .conn
            .query_row(
                "SELECT photo_uri FROM contacts WHERE id = ?1;",
                [contact_id],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional();
        match photo {
            Ok(photo) => photo.flatten(),
            Err(err) => {
                warn!(contact_id, error = %err, "photo lookup failed");
                None
            }
        }
    }
}

fn query_rows(conn: &Connection, sql: &str, params: Vec<Value>) -> Result<Vec<ProviderRow>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params_from_iter(params), |row| {
            Ok(ProviderRow {
                contact_id: row.get(0)?,
                display_name: row.get(1)?,
                number: row.get(2)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn provider_error(err: StoreError) -> ProviderError {
    ProviderError::new(err.to_string())
}
