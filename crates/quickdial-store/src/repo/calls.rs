use crate::error::{Result, StoreError};
use quickdial_core::{CallLogRow, CallType};
use rusqlite::{params, Connection};

#[derive(Debug, Clone)]
pub struct CallNew {
    pub number: String,
    pub cached_name: Option<String>,
    pub occurred_at_millis: i64,
    pub call_type: CallType,
}

pub struct CallLogRepo<'a> {
    conn: &'a Connection,
}

impl<'a> CallLogRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn record(&self, input: CallNew) -> Result<i64> {
        let number = input.number.trim();
        if number.is_empty() {
            return Err(StoreError::InvalidInput("call number is empty".to_string()));
        }
        let cached_name = input
            .cached_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty());
        self.conn.execute(
            "INSERT INTO call_log (number, cached_name, occurred_at, call_type) VALUES (?1, ?2, ?3, ?4);",
            params![
                number,
                cached_name,
                input.occurred_at_millis,
                input.call_type.as_str()
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Newest first. Unknown call types come back as `None`.
    pub fn recent(&self, limit: usize) -> Result<Vec<CallLogRow>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut stmt = self.conn.prepare(
            "SELECT number, cached_name, occurred_at, call_type
             FROM call_log
             ORDER BY occurred_at DESC, id DESC
             LIMIT ?1;",
        )?;
        let rows = stmt
            .query_map([limit], |row| {
                let call_type: Option<String> = row.get(3)?;
                Ok(CallLogRow {
                    number: row.get(0)?,
                    cached_name: row.get(1)?,
                    timestamp_millis: row.get(2)?,
                    call_type: call_type.as_deref().and_then(CallType::parse),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn count(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM call_log;", [], |row| row.get(0))?;
        Ok(count)
    }
}
