//! Party email directory: a JSON document store keyed by party code,
//! read and written as a full collection replace.

use std::fs;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader};
use serde::{Deserialize, Serialize};

use ledgerpost_recon::model::PartyContact;

use crate::error::StoreError;

/// On-disk document shape. Email and CC are comma-joined strings; an absent
/// CC reads back as empty, never null.
#[derive(Debug, Serialize, Deserialize)]
struct PartyRecord {
    #[serde(rename = "PartyCode")]
    party_code: String,
    #[serde(rename = "PartyName")]
    party_name: String,
    #[serde(rename = "Email")]
    email: String,
    #[serde(rename = "CC", default)]
    cc: String,
}

fn split_addresses(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn to_contact(record: PartyRecord) -> PartyContact {
    PartyContact {
        party_code: record.party_code.trim().to_string(),
        party_name: record.party_name.trim().to_string(),
        to_emails: split_addresses(&record.email),
        cc_emails: split_addresses(&record.cc),
    }
}

fn to_record(contact: &PartyContact) -> PartyRecord {
    PartyRecord {
        party_code: contact.party_code.clone(),
        party_name: contact.party_name.clone(),
        email: contact.to_emails.join(","),
        cc: contact.cc_emails.join(","),
    }
}

/// Seeded when no store file exists yet, so the pipeline always has a
/// directory shape to work with.
pub fn sample_contacts() -> Vec<PartyContact> {
    vec![
        PartyContact {
            party_code: "PC123".into(),
            party_name: "Alpha Corp".into(),
            to_emails: vec!["alpha@example.com".into()],
            cc_emails: vec![],
        },
        PartyContact {
            party_code: "PC456".into(),
            party_name: "Beta Ltd".into(),
            to_emails: vec!["beta@example.com".into()],
            cc_emails: vec![],
        },
    ]
}

/// Outcome of a directory-replacing workbook import. Rows with
/// empty/placeholder addresses are reported, not rejected.
#[derive(Debug)]
pub struct ImportOutcome {
    pub imported: usize,
    pub missing_emails: Vec<String>,
}

pub struct DirectoryStore {
    path: PathBuf,
}

impl DirectoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load persisted entries. A missing store file is seeded with the
    /// sample set and never surfaces as an error.
    pub fn load(&self) -> Result<Vec<PartyContact>, StoreError> {
        if !self.path.exists() {
            let sample = sample_contacts();
            self.save(&sample)?;
            return Ok(sample);
        }
        let text = fs::read_to_string(&self.path).map_err(|e| StoreError::Read(e.to_string()))?;
        let records: Vec<PartyRecord> =
            serde_json::from_str(&text).map_err(|e| StoreError::Parse(e.to_string()))?;
        Ok(records.into_iter().map(to_contact).collect())
    }

    /// Overwrite the whole store. Temp-file + rename: atomic or failed,
    /// full replace not merge.
    pub fn save(&self, entries: &[PartyContact]) -> Result<(), StoreError> {
        let records: Vec<PartyRecord> = entries.iter().map(to_record).collect();
        let text = serde_json::to_string_pretty(&records)
            .map_err(|e| StoreError::Write(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, text).map_err(|e| StoreError::Write(e.to_string()))?;
        fs::rename(&tmp, &self.path).map_err(|e| StoreError::Write(e.to_string()))?;
        Ok(())
    }

    /// Replace one entry's recipient list and persist the full set.
    pub fn update(&self, party_code: &str, to_emails: &[String]) -> Result<(), StoreError> {
        let mut entries = self.load()?;
        let entry = entries
            .iter_mut()
            .find(|e| e.party_code == party_code)
            .ok_or_else(|| StoreError::UnknownParty(party_code.to_string()))?;
        entry.to_emails = to_emails
            .iter()
            .flat_map(|e| split_addresses(e))
            .collect();
        self.save(&entries)
    }

    /// Replace the directory from an uploaded workbook with columns
    /// `Party Code`, `Party Name`, `Email` (CC optional).
    pub fn import_workbook(&self, workbook_path: &Path) -> Result<ImportOutcome, StoreError> {
        let mut workbook = open_workbook_auto(workbook_path)
            .map_err(|e| StoreError::Workbook(e.to_string()))?;
        let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
        let first = sheet_names
            .first()
            .ok_or_else(|| StoreError::Workbook("workbook contains no sheets".into()))?
            .clone();
        let range = workbook
            .worksheet_range(&first)
            .map_err(|e| StoreError::Workbook(e.to_string()))?;

        let mut rows = range.rows();
        let header = rows
            .next()
            .ok_or_else(|| StoreError::MissingColumns(required_directory_columns()))?;
        let headers: Vec<String> = header.iter().map(|c| cell_text(c).to_lowercase()).collect();

        let mut missing = Vec::new();
        let code_col = column(&headers, "Party Code");
        let name_col = column(&headers, "Party Name");
        let email_col = column(&headers, "Email");
        for (col, name) in [(code_col, "Party Code"), (name_col, "Party Name"), (email_col, "Email")] {
            if col.is_none() {
                missing.push(name.to_string());
            }
        }
        if !missing.is_empty() {
            return Err(StoreError::MissingColumns(missing));
        }
        let (code_col, name_col, email_col) =
            (code_col.unwrap_or(0), name_col.unwrap_or(0), email_col.unwrap_or(0));
        let cc_col = column(&headers, "CC");

        let mut entries = Vec::new();
        let mut missing_emails = Vec::new();
        for row in rows {
            let party_code = row.get(code_col).map(cell_text).unwrap_or_default();
            let party_name = row.get(name_col).map(cell_text).unwrap_or_default();
            if party_code.is_empty() && party_name.is_empty() {
                continue;
            }
            let email = row.get(email_col).map(cell_text).unwrap_or_default();
            let cc = cc_col.and_then(|c| row.get(c)).map(cell_text).unwrap_or_default();

            if email.is_empty()
                || email.eq_ignore_ascii_case("nan")
                || email.eq_ignore_ascii_case("none")
            {
                missing_emails.push(format!("{party_name} ({party_code})"));
            }
            entries.push(PartyContact {
                party_code,
                party_name,
                to_emails: split_addresses(&email),
                cc_emails: split_addresses(&cc),
            });
        }

        self.save(&entries)?;
        Ok(ImportOutcome {
            imported: entries.len(),
            missing_emails,
        })
    }
}

fn required_directory_columns() -> Vec<String> {
    vec!["Party Code".into(), "Party Name".into(), "Email".into()]
}

fn column(headers: &[String], name: &str) -> Option<usize> {
    let wanted = name.to_lowercase();
    headers.iter().position(|h| *h == wanted)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(n) => {
            if n.fract() == 0.0 && n.abs() < 1e15 {
                format!("{}", *n as i64)
            } else {
                format!("{n}")
            }
        }
        Data::Int(n) => format!("{n}"),
        other => format!("{other}"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_store_seeds_sample_set() {
        let dir = tempdir().unwrap();
        let store = DirectoryStore::new(dir.path().join("party_emails.json"));
        let entries = store.load().unwrap();
        assert_eq!(entries, sample_contacts());
        // Seed is persisted, not just returned.
        assert!(store.path().exists());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let store = DirectoryStore::new(dir.path().join("party_emails.json"));
        let entries = vec![
            PartyContact {
                party_code: "P1".into(),
                party_name: "Alpha Corp".into(),
                to_emails: vec!["a@x.com".into(), "b@x.com".into()],
                cc_emails: vec!["boss@x.com".into()],
            },
            PartyContact {
                party_code: "P2".into(),
                party_name: "Beta Ltd".into(),
                to_emails: vec!["c@x.com".into()],
                cc_emails: vec![],
            },
        ];
        store.save(&entries).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded, entries);
        // Empty CC comes back as an empty list, not null.
        assert!(loaded[1].cc_emails.is_empty());

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"Email\": \"a@x.com,b@x.com\""));
        assert!(raw.contains("\"CC\": \"\""));
    }

    #[test]
    fn update_replaces_one_entry_and_persists() {
        let dir = tempdir().unwrap();
        let store = DirectoryStore::new(dir.path().join("party_emails.json"));
        store.save(&sample_contacts()).unwrap();

        store
            .update("PC123", &["new@x.com, second@x.com".into()])
            .unwrap();
        let entries = store.load().unwrap();
        let updated = entries.iter().find(|e| e.party_code == "PC123").unwrap();
        assert_eq!(updated.to_emails, vec!["new@x.com", "second@x.com"]);
        // Other entries untouched.
        assert!(entries.iter().any(|e| e.party_code == "PC456"));
    }

    #[test]
    fn update_unknown_party_is_an_error() {
        let dir = tempdir().unwrap();
        let store = DirectoryStore::new(dir.path().join("party_emails.json"));
        store.save(&sample_contacts()).unwrap();
        let err = store.update("NOPE", &["x@x.com".into()]).unwrap_err();
        assert!(matches!(err, StoreError::UnknownParty(code) if code == "NOPE"));
    }

    #[test]
    fn import_workbook_replaces_store_and_reports_placeholders() {
        use rust_xlsxwriter::Workbook;

        let dir = tempdir().unwrap();
        let workbook_path = dir.path().join("SampleMail.xlsx");
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        let rows = [
            ["Party Code", "Party Name", "Email", "CC"],
            ["P1", "Alpha Corp", "a@x.com,b@x.com", "boss@x.com"],
            ["P2", "Beta Ltd", "nan", ""],
            ["P3", "Gamma", "", ""],
        ];
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                worksheet.write(r as u32, c as u16, *value).unwrap();
            }
        }
        workbook.save(&workbook_path).unwrap();

        let store = DirectoryStore::new(dir.path().join("party_emails.json"));
        store.save(&sample_contacts()).unwrap();

        let outcome = store.import_workbook(&workbook_path).unwrap();
        assert_eq!(outcome.imported, 3);
        assert_eq!(outcome.missing_emails, vec!["Beta Ltd (P2)", "Gamma (P3)"]);

        // Full replace: the old sample entries are gone.
        let entries = store.load().unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].party_code, "P1");
        assert_eq!(entries[0].cc_emails, vec!["boss@x.com"]);
        assert!(entries.iter().all(|e| e.party_code != "PC123"));
    }

    #[test]
    fn import_workbook_missing_columns_fail() {
        use rust_xlsxwriter::Workbook;

        let dir = tempdir().unwrap();
        let workbook_path = dir.path().join("bad.xlsx");
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.write(0, 0, "Party Code").unwrap();
        worksheet.write(0, 1, "Party Name").unwrap();
        workbook.save(&workbook_path).unwrap();

        let store = DirectoryStore::new(dir.path().join("party_emails.json"));
        let err = store.import_workbook(&workbook_path).unwrap_err();
        assert!(matches!(err, StoreError::MissingColumns(cols) if cols == vec!["Email".to_string()]));
    }
}
