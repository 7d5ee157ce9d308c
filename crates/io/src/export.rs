//! Workbook exports: onboarding samples, per-party sheets for a finished
//! match run, and the tabular rendering of the audit log.

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use rust_xlsxwriter::{Workbook, Worksheet};

use ledgerpost_recon::model::MatchResult;

use crate::error::ExportError;

fn exf(e: impl std::fmt::Display) -> ExportError {
    ExportError(e.to_string())
}

fn write_row(
    worksheet: &mut Worksheet,
    row: u32,
    values: &[&str],
) -> Result<(), ExportError> {
    for (col, value) in values.iter().enumerate() {
        worksheet.write(row, col as u16, *value).map_err(exf)?;
    }
    Ok(())
}

fn date_text(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default()
}

fn amount(cents: i64) -> f64 {
    cents as f64 / 100.0
}

/// Worksheet names are limited to 31 characters; leave room for the
/// longest suffix.
fn sheet_name(code: &str, suffix: &str) -> String {
    let head: String = code.chars().take(25).collect();
    format!("{head}{suffix}")
}

// ---------------------------------------------------------------------------
// Samples
// ---------------------------------------------------------------------------

/// Two-sheet legacy-shape sample workbook for operator download.
pub fn sample_payment_workbook(path: &Path) -> Result<(), ExportError> {
    let mut workbook = Workbook::new();

    let payments = workbook.add_worksheet();
    payments.set_name("Payment Details").map_err(exf)?;
    write_row(
        payments,
        0,
        &[
            "Party Code", "Party Name", "Inv. No.", "Pur. Date", "Total Inv. Amount",
            "Debit Amount", "Net Amount", "Bank Payment", "Payment Date", "Debit Note",
        ],
    )?;
    write_row(
        payments,
        1,
        &["PC123", "Alpha Corp", "INV001", "2025-01-10", "10000", "500", "9500", "9500",
            "2025-02-10", "DN001"],
    )?;
    write_row(
        payments,
        2,
        &["PC456", "Beta Ltd", "INV002", "2025-01-15", "20000", "", "20000", "20000",
            "2025-02-20", ""],
    )?;

    let notes = workbook.add_worksheet();
    notes.set_name("Debit Notes").map_err(exf)?;
    write_row(notes, 0, &["Party Code", "Party Name", "Date", "Return Invoice No.", "Amount"])?;
    write_row(notes, 1, &["PC123", "Alpha Corp", "2025-02-05", "DN001", "500"])?;

    workbook.save(path).map_err(exf)?;
    Ok(())
}

/// Sample directory workbook for operator download.
pub fn sample_directory_workbook(path: &Path) -> Result<(), ExportError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    write_row(worksheet, 0, &["Party Code", "Party Name", "Email", "CC"])?;
    write_row(
        worksheet,
        1,
        &["PC123", "ABC Traders", "abc@example.com,bcd@example.com", ""],
    )?;
    write_row(worksheet, 2, &["PC456", "XYZ Pvt Ltd", "xyz@example.com", ""])?;
    workbook.save(path).map_err(exf)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Per-party workbook
// ---------------------------------------------------------------------------

/// One `<code>_Pay` sheet per READY party, plus a `<code>_Debit` sheet when
/// the party has notes.
pub fn partywise_workbook(path: &Path, results: &[MatchResult]) -> Result<(), ExportError> {
    let mut workbook = Workbook::new();

    for result in results {
        let payments = workbook.add_worksheet();
        payments
            .set_name(sheet_name(&result.party_code, "_Pay"))
            .map_err(exf)?;
        write_row(
            payments,
            0,
            &["Party Code", "Party Name", "Inv. No.", "Pur. Date", "Total Inv. Amount",
                "Debit Amount", "Net Amount", "Bank Payment", "Payment Date"],
        )?;
        for (i, row) in result.payments.iter().enumerate() {
            let r = (i + 1) as u32;
            payments.write(r, 0, &row.party_code).map_err(exf)?;
            payments.write(r, 1, &row.party_name).map_err(exf)?;
            payments.write(r, 2, &row.invoice_no).map_err(exf)?;
            payments.write(r, 3, date_text(row.purchase_date)).map_err(exf)?;
            payments.write(r, 4, amount(row.total_invoice_cents)).map_err(exf)?;
            payments.write(r, 5, amount(row.debit_cents)).map_err(exf)?;
            payments.write(r, 6, amount(row.net_cents)).map_err(exf)?;
            payments.write(r, 7, amount(row.bank_payment_cents)).map_err(exf)?;
            payments.write(r, 8, date_text(row.payment_date)).map_err(exf)?;
        }

        if !result.notes.is_empty() {
            let notes = workbook.add_worksheet();
            notes
                .set_name(sheet_name(&result.party_code, "_Debit"))
                .map_err(exf)?;
            write_row(notes, 0, &["Party Code", "Party Name", "Date", "Return Invoice No.", "Amount"])?;
            for (i, note) in result.notes.iter().enumerate() {
                let r = (i + 1) as u32;
                notes.write(r, 0, &note.party_code).map_err(exf)?;
                notes.write(r, 1, &note.party_name).map_err(exf)?;
                notes.write(r, 2, date_text(note.date)).map_err(exf)?;
                notes.write(r, 3, &note.reference_no).map_err(exf)?;
                notes.write(r, 4, amount(note.amount_cents)).map_err(exf)?;
            }
        }
    }

    workbook.save(path).map_err(exf)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Audit log export
// ---------------------------------------------------------------------------

/// One parsed audit-log line: Status, Party Code, Party Name, Emails/Error.
type AuditRow = [String; 4];

/// Pattern-match the three audit line shapes into 4-column rows. Lines that
/// match no prefix (section headers, blanks) are dropped.
fn parse_audit_lines(text: &str) -> Vec<AuditRow> {
    let mut rows = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("Party Code:") {
            let parts: Vec<&str> = rest.split('|').collect();
            let party_code = parts.first().map(|s| s.trim()).unwrap_or_default();
            let party_name = parts
                .get(1)
                .map(|s| s.trim().trim_start_matches("Party Name:").trim())
                .unwrap_or_default();
            let emails = parts
                .get(2)
                .map(|s| s.trim().trim_start_matches("Emails:").trim())
                .unwrap_or_default();
            rows.push([
                "SENT".into(),
                party_code.into(),
                party_name.into(),
                emails.into(),
            ]);
        } else if let Some(rest) = line.strip_prefix("FAILED:") {
            let parts: Vec<&str> = rest.split('|').collect();
            let party_code = parts.first().map(|s| s.trim()).unwrap_or_default();
            let error = parts
                .get(1)
                .map(|s| s.trim().trim_start_matches("Error:").trim())
                .unwrap_or_default();
            rows.push(["FAILED".into(), party_code.into(), String::new(), error.into()]);
        } else if line.starts_with("SKIPPED:") {
            rows.push(["SKIPPED".into(), String::new(), String::new(), line.into()]);
        }
    }
    rows
}

/// Render the append-only run log into a 4-column worksheet. Returns the
/// number of data rows written.
pub fn audit_log_workbook(log_path: &Path, out_path: &Path) -> Result<usize, ExportError> {
    let text = fs::read_to_string(log_path).map_err(exf)?;
    let rows = parse_audit_lines(&text);

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Email Log").map_err(exf)?;
    write_row(worksheet, 0, &["Status", "Party Code", "Party Name", "Emails / Error"])?;
    for (i, row) in rows.iter().enumerate() {
        for (col, value) in row.iter().enumerate() {
            worksheet
                .write((i + 1) as u32, col as u16, value)
                .map_err(exf)?;
        }
    }
    workbook.save(out_path).map_err(exf)?;
    Ok(rows.len())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    use crate::normalize::normalize_workbook;

    #[test]
    fn sample_payment_workbook_normalizes_as_legacy() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("SampleInvoices.xlsx");
        sample_payment_workbook(&path).unwrap();

        let tables = normalize_workbook(&path).unwrap();
        assert_eq!(tables.payments.len(), 2);
        assert_eq!(tables.notes.len(), 1);
        assert_eq!(tables.payments[0].party_code, "PC123");
        assert_eq!(tables.payments[0].debit_cents, 50000);
        assert_eq!(tables.notes[0].amount_cents, 50000);
    }

    #[test]
    fn sample_directory_workbook_imports_cleanly() {
        use crate::directory::DirectoryStore;

        let dir = tempdir().unwrap();
        let path = dir.path().join("SampleMail.xlsx");
        sample_directory_workbook(&path).unwrap();

        let store = DirectoryStore::new(dir.path().join("party_emails.json"));
        let outcome = store.import_workbook(&path).unwrap();
        assert_eq!(outcome.imported, 2);
        assert!(outcome.missing_emails.is_empty());
        let entries = store.load().unwrap();
        assert_eq!(entries[0].to_emails, vec!["abc@example.com", "bcd@example.com"]);
    }

    #[test]
    fn parse_audit_lines_matches_three_shapes() {
        let text = "\
=== Emails Sent Successfully ===
Party Code: P1 | Party Name: Alpha Corp | Emails: a@x.com, b@x.com | CC: boss@x.com
FAILED: P2 | Error: connection closed
SKIPPED: P3 — No payment rows found in payment sheet

=== Skipped Parties ===
None
";
        let rows = parse_audit_lines(text);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], ["SENT", "P1", "Alpha Corp", "a@x.com, b@x.com"].map(String::from));
        assert_eq!(rows[1], ["FAILED", "P2", "", "connection closed"].map(String::from));
        assert_eq!(rows[2][0], "SKIPPED");
        assert!(rows[2][3].contains("P3"));
    }

    #[test]
    fn audit_log_workbook_writes_rows() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("FinalEmailLog.txt");
        std::fs::write(
            &log_path,
            "Party Code: P1 | Party Name: Alpha | Emails: a@x.com | CC:\nSKIPPED: P9\n",
        )
        .unwrap();
        let out_path = dir.path().join("FinalEmailLog.xlsx");
        let written = audit_log_workbook(&log_path, &out_path).unwrap();
        assert_eq!(written, 2);
        assert!(out_path.exists());
    }

    #[test]
    fn partywise_workbook_round_trips_sheet_names() {
        use calamine::{open_workbook_auto, Reader};
        use ledgerpost_recon::model::{NoteRow, PaymentRow};

        let result = MatchResult {
            party_code: "A-very-long-party-code-that-needs-truncation".into(),
            party_name: "Long Corp".into(),
            to_emails: vec!["a@x.com".into()],
            cc_emails: vec![],
            payments: vec![PaymentRow {
                party_code: "A-very-long-party-code-that-needs-truncation".into(),
                party_name: "Long Corp".into(),
                invoice_no: "INV1".into(),
                purchase_date: None,
                total_invoice_cents: 100000,
                debit_cents: 0,
                net_cents: 100000,
                bank_payment_cents: 100000,
                payment_date: None,
                debit_note_ref: None,
                transaction_type: None,
                advice_no: None,
                seller_advice_no: None,
            }],
            notes: vec![NoteRow {
                party_code: "A-very-long-party-code-that-needs-truncation".into(),
                party_name: "Long Corp".into(),
                date: None,
                reference_no: "DN1".into(),
                amount_cents: 1000,
            }],
        };

        let dir = tempdir().unwrap();
        let path = dir.path().join("partywise.xlsx");
        partywise_workbook(&path, &[result]).unwrap();

        let workbook = open_workbook_auto(&path).unwrap();
        let names = workbook.sheet_names().to_vec();
        assert_eq!(names.len(), 2);
        assert_eq!(names[0], "A-very-long-party-code-th_Pay");
        assert_eq!(names[1], "A-very-long-party-code-th_Debit");
    }
}
