//! Workbook normalization: detect the layout variant and project it into
//! the canonical payment and note tables.
//!
//! Two layouts are accepted. The legacy workbook carries a "Payment Details"
//! and a "Debit Notes" sheet whose columns map straight onto the canonical
//! schema. The ledger workbook is a single DR/CR sheet with free-form
//! headers resolved through an alias list, from which note rows are
//! synthesized. Downstream components never branch on the layout except via
//! the recorded variant tag.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader};
use chrono::NaiveDate;
use log::warn;

use ledgerpost_recon::model::{NoteRow, PaymentRow, SheetVariant};

use crate::error::SchemaError;

const LEGACY_PAYMENT_SHEET: &str = "Payment Details";
const LEGACY_NOTES_SHEET: &str = "Debit Notes";

#[derive(Debug)]
pub struct NormalizedTables {
    pub variant: SheetVariant,
    pub payments: Vec<PaymentRow>,
    pub notes: Vec<NoteRow>,
    /// Cells that failed numeric/date parsing and were coerced. The rows
    /// survive; the count is surfaced per run.
    pub parse_warnings: usize,
}

pub fn normalize_workbook(path: &Path) -> Result<NormalizedTables, SchemaError> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| SchemaError::Workbook(e.to_string()))?;
    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    if sheet_names.is_empty() {
        return Err(SchemaError::UnrecognizedLayout);
    }

    let has_legacy_pair = sheet_names.iter().any(|n| n == LEGACY_PAYMENT_SHEET)
        && sheet_names.iter().any(|n| n == LEGACY_NOTES_SHEET);

    if has_legacy_pair {
        let payments = workbook
            .worksheet_range(LEGACY_PAYMENT_SHEET)
            .map_err(|e| SchemaError::Workbook(e.to_string()))?;
        let notes = workbook
            .worksheet_range(LEGACY_NOTES_SHEET)
            .map_err(|e| SchemaError::Workbook(e.to_string()))?;
        normalize_legacy(&payments, &notes)
    } else {
        let first = sheet_names[0].clone();
        let range = workbook
            .worksheet_range(&first)
            .map_err(|e| SchemaError::Workbook(e.to_string()))?;
        normalize_ledger(&first, &range)
    }
}

// ---------------------------------------------------------------------------
// Cell access
// ---------------------------------------------------------------------------

fn cell_str(cell: Option<&Data>) -> String {
    match cell {
        None | Some(Data::Empty) => String::new(),
        Some(Data::String(s)) => s.trim().to_string(),
        Some(Data::Float(n)) => {
            if n.fract() == 0.0 && n.abs() < 1e15 {
                format!("{}", *n as i64)
            } else {
                format!("{n}")
            }
        }
        Some(Data::Int(n)) => format!("{n}"),
        Some(Data::Bool(b)) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Some(Data::Error(e)) => format!("#{e:?}"),
        Some(Data::DateTime(dt)) => match excel_serial_date(dt.as_f64()) {
            Some(d) => d.format("%Y-%m-%d").to_string(),
            None => String::new(),
        },
        Some(Data::DateTimeIso(s)) | Some(Data::DurationIso(s)) => s.trim().to_string(),
    }
}

/// Parse an amount cell into minor units. Unparseable non-empty cells
/// coerce to 0 and count as a parse warning.
fn cell_cents(cell: Option<&Data>, warnings: &mut usize) -> i64 {
    match cell {
        None | Some(Data::Empty) => 0,
        Some(Data::Float(n)) => to_cents(*n),
        Some(Data::Int(n)) => n * 100,
        Some(Data::String(s)) => {
            let cleaned = s.trim().replace(',', "");
            if cleaned.is_empty() {
                return 0;
            }
            match cleaned.parse::<f64>() {
                Ok(n) => to_cents(n),
                Err(_) => {
                    warn!("unparseable amount '{}' coerced to 0", s.trim());
                    *warnings += 1;
                    0
                }
            }
        }
        Some(other) => {
            warn!("unparseable amount cell {other:?} coerced to 0");
            *warnings += 1;
            0
        }
    }
}

fn to_cents(value: f64) -> i64 {
    (value * 100.0).round() as i64
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y", "%m/%d/%Y"];

/// Parse a date cell. Unparseable non-empty cells coerce to `None` and
/// count as a parse warning.
fn cell_date(cell: Option<&Data>, warnings: &mut usize) -> Option<NaiveDate> {
    match cell {
        None | Some(Data::Empty) => None,
        Some(Data::DateTime(dt)) => excel_serial_date(dt.as_f64()),
        Some(Data::Float(n)) => excel_serial_date(*n),
        Some(Data::Int(n)) => excel_serial_date(*n as f64),
        Some(Data::String(s)) | Some(Data::DateTimeIso(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            // Timestamps keep only their date part.
            let date_part = trimmed.split(&[' ', 'T'][..]).next().unwrap_or(trimmed);
            for format in DATE_FORMATS {
                if let Ok(d) = NaiveDate::parse_from_str(date_part, format) {
                    return Some(d);
                }
            }
            warn!("unparseable date '{trimmed}' coerced to blank");
            *warnings += 1;
            None
        }
        Some(other) => {
            warn!("unparseable date cell {other:?} coerced to blank");
            *warnings += 1;
            None
        }
    }
}

/// 1900-system Excel date serial to a calendar date.
fn excel_serial_date(serial: f64) -> Option<NaiveDate> {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(chrono::Duration::days(serial.floor() as i64))
}

// ---------------------------------------------------------------------------
// Header resolution
// ---------------------------------------------------------------------------

fn header_names(row: &[Data]) -> Vec<String> {
    row.iter()
        .map(|cell| cell_str(Some(cell)).to_lowercase())
        .collect()
}

fn find_column(headers: &[String], name: &str) -> Option<usize> {
    let wanted = name.to_lowercase();
    headers.iter().position(|h| *h == wanted)
}

fn find_alias(headers: &[String], aliases: &[&str]) -> Option<usize> {
    aliases.iter().find_map(|a| find_column(headers, a))
}

fn row_is_blank(row: &[Data]) -> bool {
    row.iter().all(|cell| cell_str(Some(cell)).is_empty())
}

// ---------------------------------------------------------------------------
// Legacy path
// ---------------------------------------------------------------------------

const LEGACY_REQUIRED: &[&str] = &[
    "Inv. No.",
    "Pur. Date",
    "Total Inv. Amount",
    "Debit Amount",
    "Net Amount",
    "Bank Payment",
    "Payment Date",
];

fn normalize_legacy(
    payment_range: &Range<Data>,
    notes_range: &Range<Data>,
) -> Result<NormalizedTables, SchemaError> {
    let mut warnings = 0usize;

    let mut payment_rows = payment_range.rows();
    let header = payment_rows.next().ok_or_else(|| SchemaError::MissingColumns {
        sheet: LEGACY_PAYMENT_SHEET.into(),
        columns: LEGACY_REQUIRED.iter().map(|c| c.to_string()).collect(),
    })?;
    let headers = header_names(header);

    let code_col = find_column(&headers, "Party Code");
    let name_col = find_column(&headers, "Party Name");

    let mut missing: Vec<String> = Vec::new();
    if code_col.is_none() && name_col.is_none() {
        missing.push("Party Code".into());
    }
    let mut required_cols = Vec::with_capacity(LEGACY_REQUIRED.len());
    for name in LEGACY_REQUIRED {
        match find_column(&headers, name) {
            Some(idx) => required_cols.push(idx),
            None => missing.push(name.to_string()),
        }
    }
    if !missing.is_empty() {
        return Err(SchemaError::MissingColumns {
            sheet: LEGACY_PAYMENT_SHEET.into(),
            columns: missing,
        });
    }
    let &[inv_col, pur_date_col, total_col, debit_col, net_col, bank_col, pay_date_col] =
        required_cols.as_slice()
    else {
        return Err(SchemaError::UnrecognizedLayout);
    };
    let note_ref_col = find_column(&headers, "Debit Note");

    let mut payments = Vec::new();
    for row in payment_rows {
        if row_is_blank(row) {
            continue;
        }
        let code_value = code_col.map(|c| cell_str(row.get(c))).unwrap_or_default();
        let name_value = name_col.map(|c| cell_str(row.get(c))).unwrap_or_default();
        if code_value.is_empty() && name_value.is_empty() {
            continue;
        }
        let party_code = if code_value.is_empty() { name_value.clone() } else { code_value };
        let party_name = {
            let n = name_col.map(|c| cell_str(row.get(c))).unwrap_or_default();
            if n.is_empty() { party_code.clone() } else { n }
        };
        let debit_note_ref = note_ref_col
            .map(|c| cell_str(row.get(c)))
            .filter(|s| !s.is_empty());

        payments.push(PaymentRow {
            party_code,
            party_name,
            invoice_no: cell_str(row.get(inv_col)),
            purchase_date: cell_date(row.get(pur_date_col), &mut warnings),
            total_invoice_cents: cell_cents(row.get(total_col), &mut warnings),
            debit_cents: cell_cents(row.get(debit_col), &mut warnings),
            net_cents: cell_cents(row.get(net_col), &mut warnings),
            bank_payment_cents: cell_cents(row.get(bank_col), &mut warnings),
            payment_date: cell_date(row.get(pay_date_col), &mut warnings),
            debit_note_ref,
            transaction_type: None,
            advice_no: None,
            seller_advice_no: None,
        });
    }

    let notes = normalize_legacy_notes(notes_range, &mut warnings)?;

    Ok(NormalizedTables {
        variant: SheetVariant::Legacy,
        payments,
        notes,
        parse_warnings: warnings,
    })
}

fn normalize_legacy_notes(
    notes_range: &Range<Data>,
    warnings: &mut usize,
) -> Result<Vec<NoteRow>, SchemaError> {
    let mut rows = notes_range.rows();
    let header = rows.next().ok_or_else(|| SchemaError::MissingColumns {
        sheet: LEGACY_NOTES_SHEET.into(),
        columns: vec!["Return Invoice No.".into(), "Amount".into(), "Party Code".into()],
    })?;
    let headers = header_names(header);

    let code_col = find_column(&headers, "Party Code");
    let name_col = find_column(&headers, "Party Name");

    let mut missing: Vec<String> = Vec::new();
    if code_col.is_none() && name_col.is_none() {
        missing.push("Party Code".into());
    }
    let reference_col = find_column(&headers, "Return Invoice No.");
    if reference_col.is_none() {
        missing.push("Return Invoice No.".into());
    }
    let amount_col = find_column(&headers, "Amount");
    if amount_col.is_none() {
        missing.push("Amount".into());
    }
    if !missing.is_empty() {
        return Err(SchemaError::MissingColumns {
            sheet: LEGACY_NOTES_SHEET.into(),
            columns: missing,
        });
    }
    let (reference_col, amount_col) = (reference_col.unwrap_or(0), amount_col.unwrap_or(0));
    let date_col = find_column(&headers, "Date");

    let mut notes = Vec::new();
    for row in rows {
        if row_is_blank(row) {
            continue;
        }
        let code_value = code_col.map(|c| cell_str(row.get(c))).unwrap_or_default();
        let name_value = name_col.map(|c| cell_str(row.get(c))).unwrap_or_default();
        if code_value.is_empty() && name_value.is_empty() {
            continue;
        }
        let party_code = if code_value.is_empty() { name_value.clone() } else { code_value };
        let party_name = if name_value.is_empty() { party_code.clone() } else { name_value };

        notes.push(NoteRow {
            party_code,
            party_name,
            date: date_col.and_then(|c| cell_date(row.get(c), warnings)),
            reference_no: cell_str(row.get(reference_col)),
            amount_cents: cell_cents(row.get(amount_col), warnings),
        });
    }
    Ok(notes)
}

// ---------------------------------------------------------------------------
// Ledger path
// ---------------------------------------------------------------------------

const PARTY_ALIASES: &[&str] = &["seller name", "party name"];
const BILL_ALIASES: &[&str] = &["bill no", "bill no.", "invoice no", "invoice no.", "inv. no."];
const BILL_DATE_ALIASES: &[&str] = &["bill date", "invoice date", "doc date", "date"];
const ADVICE_ALIASES: &[&str] = &["advised no", "advised no.", "advice no", "advice no."];
const SELLER_ADVICE_ALIASES: &[&str] = &[
    "seller advised no",
    "seller advised no.",
    "seller advice no",
    "seller advice no.",
];
const DEBIT_ALIASES: &[&str] = &["dr", "debit", "debit amount"];
const CREDIT_ALIASES: &[&str] = &["cr", "credit", "credit amount"];
const TOTAL_WITH_TAX_ALIASES: &[&str] =
    &["total with tax", "total amount with tax", "bill amount with tax"];
const ALT_TOTAL_WITH_TAX_ALIASES: &[&str] =
    &["total amt with tax", "total (with tax)", "gross amount"];
const TOTAL_WITHOUT_TAX_ALIASES: &[&str] =
    &["total without tax", "total amount without tax", "taxable amount"];
const TXN_TYPE_ALIASES: &[&str] = &["type", "transaction type", "tran type", "doc type"];

/// Derive a party code from the ledger's seller-name string: the leading
/// digit run if the name starts with digits, else the text before the first
/// hyphen, else the whole name.
pub fn derive_party_code(name: &str) -> String {
    let name = name.trim();
    let digits: String = name.chars().take_while(|c| c.is_ascii_digit()).collect();
    if !digits.is_empty() {
        return digits;
    }
    if let Some(idx) = name.find('-') {
        return name[..idx].trim().to_string();
    }
    name.to_string()
}

fn normalize_ledger(
    sheet_name: &str,
    range: &Range<Data>,
) -> Result<NormalizedTables, SchemaError> {
    let rows: Vec<&[Data]> = range.rows().collect();
    if rows.is_empty() {
        return Err(SchemaError::UnrecognizedLayout);
    }

    // Some exports prepend a merged two-row banner; headers then start at
    // row index 2.
    let merged_banner = rows.iter().take(2).any(|row| {
        let first = cell_str(row.first());
        first.contains("Seller Name:") && first.contains("Advised No")
    });
    let header_idx = if merged_banner { 2 } else { 0 };
    let header = rows.get(header_idx).ok_or(SchemaError::UnrecognizedLayout)?;
    let headers = header_names(header);

    let party_col = find_alias(&headers, PARTY_ALIASES);
    let bill_col = find_alias(&headers, BILL_ALIASES);
    let bill_date_col = find_alias(&headers, BILL_DATE_ALIASES);
    let advice_col = find_alias(&headers, ADVICE_ALIASES);
    let seller_advice_col = find_alias(&headers, SELLER_ADVICE_ALIASES);

    let mut missing: Vec<String> = Vec::new();
    for (col, display) in [
        (party_col, "Seller Name"),
        (bill_col, "Bill No"),
        (bill_date_col, "Bill Date"),
        (advice_col, "Advised No"),
        (seller_advice_col, "Seller Advised No"),
    ] {
        if col.is_none() {
            missing.push(display.to_string());
        }
    }
    if !missing.is_empty() {
        return Err(SchemaError::MissingColumns {
            sheet: sheet_name.to_string(),
            columns: missing,
        });
    }
    let (party_col, bill_col, bill_date_col, advice_col, seller_advice_col) = (
        party_col.unwrap_or(0),
        bill_col.unwrap_or(0),
        bill_date_col.unwrap_or(0),
        advice_col.unwrap_or(0),
        seller_advice_col.unwrap_or(0),
    );

    // Amount columns degrade gracefully: a missing total column falls back
    // to the next alternative, ultimately to the CR+DR sum; missing DR/CR
    // columns read as zero.
    let debit_col = find_alias(&headers, DEBIT_ALIASES);
    let credit_col = find_alias(&headers, CREDIT_ALIASES);
    let total_col = find_alias(&headers, TOTAL_WITH_TAX_ALIASES)
        .or_else(|| find_alias(&headers, ALT_TOTAL_WITH_TAX_ALIASES))
        .or_else(|| find_alias(&headers, TOTAL_WITHOUT_TAX_ALIASES));
    let txn_type_col = find_alias(&headers, TXN_TYPE_ALIASES);

    let mut warnings = 0usize;
    let mut payments = Vec::new();
    let mut notes = Vec::new();

    for row in rows.iter().skip(header_idx + 1) {
        if row_is_blank(row) {
            continue;
        }
        let party_name = cell_str(row.get(party_col));
        if party_name.is_empty() {
            continue;
        }
        let party_code = derive_party_code(&party_name);

        let invoice_no = cell_str(row.get(bill_col));
        let bill_date = cell_date(row.get(bill_date_col), &mut warnings);
        let debit = debit_col.map_or(0, |c| cell_cents(row.get(c), &mut warnings));
        let credit = credit_col.map_or(0, |c| cell_cents(row.get(c), &mut warnings));
        let total = match total_col {
            Some(c) => cell_cents(row.get(c), &mut warnings),
            None => credit + debit,
        };

        payments.push(PaymentRow {
            party_code: party_code.clone(),
            party_name: party_name.clone(),
            invoice_no: invoice_no.clone(),
            purchase_date: bill_date,
            total_invoice_cents: total,
            debit_cents: debit,
            net_cents: total - debit - credit,
            bank_payment_cents: credit,
            payment_date: None,
            debit_note_ref: None,
            transaction_type: txn_type_col
                .map(|c| cell_str(row.get(c)))
                .filter(|s| !s.is_empty()),
            advice_no: Some(cell_str(row.get(advice_col))).filter(|s| !s.is_empty()),
            seller_advice_no: Some(cell_str(row.get(seller_advice_col))).filter(|s| !s.is_empty()),
        });

        if debit > 0 {
            notes.push(NoteRow {
                party_code: party_code.clone(),
                party_name: party_name.clone(),
                date: bill_date,
                reference_no: invoice_no.clone(),
                amount_cents: debit,
            });
        }
        if credit > 0 {
            notes.push(NoteRow {
                party_code,
                party_name,
                date: bill_date,
                reference_no: format!("{invoice_no} (CR)"),
                amount_cents: -credit,
            });
        }
    }

    Ok(NormalizedTables {
        variant: SheetVariant::Ledger,
        payments,
        notes,
        parse_warnings: warnings,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;
    use tempfile::tempdir;

    fn write_rows(
        workbook: &mut Workbook,
        sheet: &str,
        rows: &[Vec<&str>],
    ) {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet).unwrap();
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                worksheet.write(r as u32, c as u16, *value).unwrap();
            }
        }
    }

    fn legacy_workbook() -> Vec<(String, Vec<Vec<&'static str>>)> {
        vec![
            (
                LEGACY_PAYMENT_SHEET.to_string(),
                vec![
                    vec![
                        "Party Code", "Party Name", "Inv. No.", "Pur. Date", "Total Inv. Amount",
                        "Debit Amount", "Net Amount", "Bank Payment", "Payment Date", "Debit Note",
                    ],
                    vec![
                        "P1", "Alpha Corp", "INV001", "2025-01-10", "10000", "500", "9500",
                        "9500", "2025-02-10", "DN001",
                    ],
                    vec!["P2", "Beta Ltd", "INV002", "2025-01-15", "20000", "", "20000", "20000",
                        "2025-02-20", ""],
                ],
            ),
            (
                LEGACY_NOTES_SHEET.to_string(),
                vec![
                    vec!["Party Code", "Party Name", "Date", "Return Invoice No.", "Amount"],
                    vec!["P1", "Alpha Corp", "2025-02-05", "DN001", "500"],
                ],
            ),
        ]
    }

    fn save_workbook(sheets: &[(String, Vec<Vec<&str>>)]) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("upload.xlsx");
        let mut workbook = Workbook::new();
        for (name, rows) in sheets {
            write_rows(&mut workbook, name, rows);
        }
        workbook.save(&path).unwrap();
        (dir, path)
    }

    #[test]
    fn legacy_layout_detected_and_projected() {
        let (_dir, path) = save_workbook(&legacy_workbook());
        let tables = normalize_workbook(&path).unwrap();

        assert_eq!(tables.variant, SheetVariant::Legacy);
        assert_eq!(tables.payments.len(), 2);
        assert_eq!(tables.notes.len(), 1);
        assert_eq!(tables.parse_warnings, 0);

        let first = &tables.payments[0];
        assert_eq!(first.party_code, "P1");
        assert_eq!(first.party_name, "Alpha Corp");
        assert_eq!(first.invoice_no, "INV001");
        assert_eq!(first.total_invoice_cents, 1000000);
        assert_eq!(first.debit_cents, 50000);
        assert_eq!(first.net_cents, 950000);
        assert_eq!(first.debit_note_ref.as_deref(), Some("DN001"));
        assert_eq!(
            first.purchase_date,
            NaiveDate::from_ymd_opt(2025, 1, 10)
        );

        // Empty debit cell coerces to zero without a warning.
        assert_eq!(tables.payments[1].debit_cents, 0);
        assert!(tables.payments[1].debit_note_ref.is_none());

        assert_eq!(tables.notes[0].reference_no, "DN001");
        assert_eq!(tables.notes[0].amount_cents, 50000);
    }

    #[test]
    fn legacy_determinism_identical_bytes_identical_tables() {
        let (_dir, path) = save_workbook(&legacy_workbook());
        let a = normalize_workbook(&path).unwrap();
        let b = normalize_workbook(&path).unwrap();
        let a_json = serde_json::to_string(&a.payments).unwrap();
        let b_json = serde_json::to_string(&b.payments).unwrap();
        assert_eq!(a_json, b_json);
    }

    #[test]
    fn legacy_missing_columns_are_named() {
        let sheets = vec![
            (
                LEGACY_PAYMENT_SHEET.to_string(),
                vec![vec!["Party Code", "Inv. No.", "Pur. Date"]],
            ),
            (
                LEGACY_NOTES_SHEET.to_string(),
                vec![vec!["Party Code", "Return Invoice No.", "Amount"]],
            ),
        ];
        let (_dir, path) = save_workbook(&sheets);
        let err = normalize_workbook(&path).unwrap_err();
        let SchemaError::MissingColumns { sheet, columns } = err else {
            panic!("expected missing columns, got {err}");
        };
        assert_eq!(sheet, LEGACY_PAYMENT_SHEET);
        assert!(columns.contains(&"Total Inv. Amount".to_string()));
        assert!(columns.contains(&"Payment Date".to_string()));
        assert!(!columns.contains(&"Inv. No.".to_string()));
    }

    fn ledger_rows() -> Vec<Vec<&'static str>> {
        vec![
            vec![
                "Seller Name", "Bill No", "Bill Date", "Advised No", "Seller Advised No",
                "DR", "CR", "Total With Tax", "Type",
            ],
            vec![
                "731-AUROMIN-Amazon", "B100", "2025-03-01", "ADV-9", "SADV-9", "100", "0",
                "1000", "Purchase",
            ],
            vec!["Acme-Traders", "B101", "2025-03-02", "ADV-10", "SADV-10", "0", "250", "250", "Return"],
            vec!["", "", "", "", "", "", "", "", ""],
        ]
    }

    #[test]
    fn ledger_layout_projects_and_synthesizes_notes() {
        let sheets = vec![("Ledger".to_string(), ledger_rows())];
        let (_dir, path) = save_workbook(&sheets);
        let tables = normalize_workbook(&path).unwrap();

        assert_eq!(tables.variant, SheetVariant::Ledger);
        assert_eq!(tables.payments.len(), 2);

        let first = &tables.payments[0];
        assert_eq!(first.party_code, "731");
        assert_eq!(first.party_name, "731-AUROMIN-Amazon");
        assert_eq!(first.debit_cents, 10000);
        assert_eq!(first.bank_payment_cents, 0);
        // net = total - debit - credit
        assert_eq!(first.net_cents, 90000);
        assert_eq!(first.advice_no.as_deref(), Some("ADV-9"));
        assert_eq!(first.seller_advice_no.as_deref(), Some("SADV-9"));
        assert_eq!(first.transaction_type.as_deref(), Some("Purchase"));

        // Hyphenated name with no leading digits takes the pre-hyphen text.
        assert_eq!(tables.payments[1].party_code, "Acme");

        // One debit note for B100, one credit note for B101, nothing else.
        assert_eq!(tables.notes.len(), 2);
        assert_eq!(tables.notes[0].reference_no, "B100");
        assert_eq!(tables.notes[0].amount_cents, 10000);
        assert_eq!(tables.notes[1].reference_no, "B101 (CR)");
        assert_eq!(tables.notes[1].amount_cents, -25000);
    }

    #[test]
    fn ledger_merged_banner_shifts_header_row() {
        let mut rows = vec![
            vec!["Seller Name: 731-AUROMIN  Advised No: ADV-9", "", "", "", "", "", "", "", ""],
            vec!["", "", "", "", "", "", "", "", ""],
        ];
        rows.extend(ledger_rows());
        let sheets = vec![("Sheet1".to_string(), rows)];
        let (_dir, path) = save_workbook(&sheets);
        let tables = normalize_workbook(&path).unwrap();
        assert_eq!(tables.payments.len(), 2);
        assert_eq!(tables.payments[0].party_code, "731");
    }

    #[test]
    fn ledger_missing_hard_required_columns_fail() {
        let sheets = vec![(
            "Sheet1".to_string(),
            vec![vec!["Seller Name", "Bill No", "DR", "CR"]],
        )];
        let (_dir, path) = save_workbook(&sheets);
        let err = normalize_workbook(&path).unwrap_err();
        let SchemaError::MissingColumns { columns, .. } = err else {
            panic!("expected missing columns, got {err}");
        };
        assert!(columns.contains(&"Bill Date".to_string()));
        assert!(columns.contains(&"Advised No".to_string()));
        assert!(columns.contains(&"Seller Advised No".to_string()));
    }

    #[test]
    fn ledger_total_falls_back_to_cr_dr_sum() {
        let sheets = vec![(
            "Sheet1".to_string(),
            vec![
                vec!["Seller Name", "Bill No", "Bill Date", "Advised No", "Seller Advised No", "DR", "CR"],
                vec!["731-AUROMIN", "B1", "2025-03-01", "A1", "S1", "100", "400"],
            ],
        )];
        let (_dir, path) = save_workbook(&sheets);
        let tables = normalize_workbook(&path).unwrap();
        let row = &tables.payments[0];
        assert_eq!(row.total_invoice_cents, 50000);
        assert_eq!(row.net_cents, 0);
    }

    #[test]
    fn garbage_numerics_coerce_to_zero_and_count() {
        let sheets = vec![(
            "Sheet1".to_string(),
            vec![
                vec!["Seller Name", "Bill No", "Bill Date", "Advised No", "Seller Advised No", "DR", "CR", "Total With Tax"],
                vec!["731-AUROMIN", "B1", "2025-03-01", "A1", "S1", "n/a", "0", "1000"],
            ],
        )];
        let (_dir, path) = save_workbook(&sheets);
        let tables = normalize_workbook(&path).unwrap();
        assert_eq!(tables.payments[0].debit_cents, 0);
        assert_eq!(tables.parse_warnings, 1);
        assert!(tables.notes.is_empty());
    }

    #[test]
    fn party_code_derivation_rules() {
        assert_eq!(derive_party_code("731-AUROMIN-Amazon"), "731");
        assert_eq!(derive_party_code("Acme-Traders"), "Acme");
        assert_eq!(derive_party_code("PlainName"), "PlainName");
        assert_eq!(derive_party_code("42"), "42");
        assert_eq!(derive_party_code("  9-X "), "9");
    }

    #[test]
    fn empty_workbook_is_unrecognized() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.xlsx");
        let mut workbook = Workbook::new();
        workbook.add_worksheet();
        workbook.save(&path).unwrap();
        let err = normalize_workbook(&path).unwrap_err();
        assert!(matches!(err, SchemaError::UnrecognizedLayout));
    }
}
