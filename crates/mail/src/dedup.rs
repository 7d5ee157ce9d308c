//! Optional dedup store consulted before dispatch. If any invoice for a
//! party was already recorded as sent, the whole party is skipped.

use std::path::Path;

use rusqlite::{params, Connection};

use crate::error::DedupError;

pub trait DedupStore {
    /// True if any of the party's invoices was already recorded as sent.
    fn any_sent(&self, party_code: &str, invoice_nos: &[String]) -> Result<bool, DedupError>;

    /// Record one row per invoice number after a successful send.
    fn record_sent(
        &self,
        party_code: &str,
        invoice_nos: &[String],
        sent_at: &str,
    ) -> Result<(), DedupError>;
}

/// Default collaborator: dedup disabled.
pub struct NoopDedup;

impl DedupStore for NoopDedup {
    fn any_sent(&self, _party_code: &str, _invoice_nos: &[String]) -> Result<bool, DedupError> {
        Ok(false)
    }

    fn record_sent(
        &self,
        _party_code: &str,
        _invoice_nos: &[String],
        _sent_at: &str,
    ) -> Result<(), DedupError> {
        Ok(())
    }
}

pub struct SqliteDedup {
    conn: Connection,
}

impl SqliteDedup {
    pub fn open(path: &Path) -> Result<Self, DedupError> {
        let conn = Connection::open(path).map_err(|e| DedupError(e.to_string()))?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sent_invoices (
                party_code TEXT NOT NULL,
                invoice_no TEXT NOT NULL,
                sent_at    TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_sent_party ON sent_invoices (party_code);",
        )
        .map_err(|e| DedupError(e.to_string()))?;
        Ok(Self { conn })
    }
}

impl DedupStore for SqliteDedup {
    fn any_sent(&self, party_code: &str, invoice_nos: &[String]) -> Result<bool, DedupError> {
        let mut stmt = self
            .conn
            .prepare("SELECT 1 FROM sent_invoices WHERE party_code = ?1 AND invoice_no = ?2 LIMIT 1")
            .map_err(|e| DedupError(e.to_string()))?;
        for invoice_no in invoice_nos {
            let hit = stmt
                .exists(params![party_code, invoice_no])
                .map_err(|e| DedupError(e.to_string()))?;
            if hit {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn record_sent(
        &self,
        party_code: &str,
        invoice_nos: &[String],
        sent_at: &str,
    ) -> Result<(), DedupError> {
        let mut stmt = self
            .conn
            .prepare("INSERT INTO sent_invoices (party_code, invoice_no, sent_at) VALUES (?1, ?2, ?3)")
            .map_err(|e| DedupError(e.to_string()))?;
        for invoice_no in invoice_nos {
            stmt.execute(params![party_code, invoice_no, sent_at])
                .map_err(|e| DedupError(e.to_string()))?;
        }
        Ok(())
    }
}
