//! Append-only run log. Three line shapes, pattern-matched back into
//! tabular form by the log export.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use ledgerpost_recon::model::{DispatchRecord, DispatchStatus};

use crate::error::AuditError;

pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, record: &DispatchRecord) -> Result<(), AuditError> {
        append_lines(&self.path, [line_for(record)])
    }
}

/// The audit line for one dispatch outcome.
pub fn line_for(record: &DispatchRecord) -> String {
    match &record.status {
        DispatchStatus::Sent => format!(
            "Party Code: {} | Party Name: {} | Emails: {} | CC: {}",
            record.party_code,
            record.party_name,
            record.recipients.join(", "),
            record.cc.join(", "),
        ),
        DispatchStatus::Failed(error) => {
            format!("FAILED: {} | Error: {}", record.party_code, error)
        }
        DispatchStatus::Skipped(reason) => {
            format!("SKIPPED: {} — {}", record.party_code, reason)
        }
    }
}

/// Append lines to one of the run's append-only text logs.
pub fn append_lines(
    path: &Path,
    lines: impl IntoIterator<Item = String>,
) -> Result<(), AuditError> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| AuditError(e.to_string()))?;
    for line in lines {
        writeln!(file, "{line}").map_err(|e| AuditError(e.to_string()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(status: DispatchStatus) -> DispatchRecord {
        DispatchRecord {
            party_code: "P1".into(),
            party_name: "Alpha Corp".into(),
            recipients: vec!["a@x.com".into(), "b@x.com".into()],
            cc: vec!["boss@x.com".into()],
            status,
            sent_at: "2025-06-01T10:00:00Z".into(),
        }
    }

    #[test]
    fn three_line_shapes() {
        assert_eq!(
            line_for(&record(DispatchStatus::Sent)),
            "Party Code: P1 | Party Name: Alpha Corp | Emails: a@x.com, b@x.com | CC: boss@x.com"
        );
        assert_eq!(
            line_for(&record(DispatchStatus::Failed("connection closed".into()))),
            "FAILED: P1 | Error: connection closed"
        );
        assert_eq!(
            line_for(&record(DispatchStatus::Skipped("already sent".into()))),
            "SKIPPED: P1 — already sent"
        );
    }

    #[test]
    fn append_is_append_only() {
        let dir = tempdir().unwrap();
        let log = AuditLog::new(dir.path().join("FinalEmailLog.txt"));
        log.append(&record(DispatchStatus::Sent)).unwrap();
        log.append(&record(DispatchStatus::Failed("boom".into()))).unwrap();

        let text = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Party Code: P1"));
        assert!(lines[1].starts_with("FAILED: P1"));
    }
}
