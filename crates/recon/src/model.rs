use chrono::NaiveDate;
use serde::Serialize;

/// Absolute amount tolerance, in minor units. One cent regardless of scale.
pub const AMOUNT_TOLERANCE_CENTS: i64 = 1;

/// Format minor units as a decimal string ("1234" -> "12.34").
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Which workbook layout the canonical tables came from. Only the statement
/// renderer branches on this; matching is layout-agnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetVariant {
    /// Two-sheet "Payment Details" + "Debit Notes" workbook.
    Legacy,
    /// Single-sheet DR/CR ledger workbook.
    Ledger,
}

impl std::fmt::Display for SheetVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Legacy => write!(f, "legacy"),
            Self::Ledger => write!(f, "ledger"),
        }
    }
}

/// One purchase/payment transaction for a party.
///
/// Both `party_code` and `party_name` are populated by normalization no
/// matter which layout the row came from, so the matcher can key on either.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentRow {
    pub party_code: String,
    pub party_name: String,
    pub invoice_no: String,
    pub purchase_date: Option<NaiveDate>,
    pub total_invoice_cents: i64,
    pub debit_cents: i64,
    /// Independently supplied in the legacy layout; total - debit - credit
    /// in the ledger layout.
    pub net_cents: i64,
    /// Credit applied. The ledger layout stores the CR amount here.
    pub bank_payment_cents: i64,
    pub payment_date: Option<NaiveDate>,
    /// Reference into the notes table, legacy layout only.
    pub debit_note_ref: Option<String>,
    pub transaction_type: Option<String>,
    /// Main advice number (ledger layout).
    pub advice_no: Option<String>,
    /// Seller advice number (ledger layout).
    pub seller_advice_no: Option<String>,
}

/// A debit or credit note tied to a party. Positive amount = debit/charge,
/// negative = credit (ledger layout only).
#[derive(Debug, Clone, Serialize)]
pub struct NoteRow {
    pub party_code: String,
    pub party_name: String,
    pub date: Option<NaiveDate>,
    pub reference_no: String,
    pub amount_cents: i64,
}

/// Directory entry mapping a party to its recipients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartyContact {
    pub party_code: String,
    pub party_name: String,
    pub to_emails: Vec<String>,
    /// May be empty; an empty CC list is preserved as empty, never null.
    pub cc_emails: Vec<String>,
}

impl PartyContact {
    /// True if at least one address is neither empty nor a placeholder
    /// ("nan"/"none") left behind by a spreadsheet upload.
    pub fn has_real_address(&self) -> bool {
        self.to_emails.iter().any(|e| {
            let e = e.trim();
            !e.is_empty() && !e.eq_ignore_ascii_case("nan") && !e.eq_ignore_ascii_case("none")
        })
    }
}

// ---------------------------------------------------------------------------
// Match output
// ---------------------------------------------------------------------------

/// A party that passed every consistency gate and is ready to be mailed.
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    pub party_code: String,
    pub party_name: String,
    pub to_emails: Vec<String>,
    pub cc_emails: Vec<String>,
    /// Included payment rows, in sheet order.
    pub payments: Vec<PaymentRow>,
    /// Every note for the party, in sheet order.
    pub notes: Vec<NoteRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum SkipReason {
    NoPayments,
    DebitMismatch {
        payment_debit_cents: i64,
        note_debit_cents: i64,
    },
    AllRowsMatched,
}

/// A directory entry that did not survive matching, with the reason recorded
/// as data. `Display` produces the skip-log line shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartySkip {
    pub party_code: String,
    pub reason: SkipReason,
}

impl std::fmt::Display for PartySkip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.reason {
            SkipReason::NoPayments => write!(
                f,
                "SKIPPED: {} — No payment rows found in payment sheet",
                self.party_code
            ),
            SkipReason::DebitMismatch {
                payment_debit_cents,
                note_debit_cents,
            } => write!(
                f,
                "SKIPPED: {} — Debit amount mismatch: payment sheet {} vs debit notes {}",
                self.party_code,
                format_cents(*payment_debit_cents),
                format_cents(*note_debit_cents)
            ),
            SkipReason::AllRowsMatched => write!(
                f,
                "SKIPPED: {} — All payment rows matched with debit notes correctly",
                self.party_code
            ),
        }
    }
}

/// A payment row excluded by the per-row cross-check: its referenced note
/// exists but carries a different amount. Logged, not a skip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowMismatch {
    pub party_code: String,
    pub note_ref: String,
    pub payment_net_cents: i64,
    pub note_amount_cents: i64,
}

impl std::fmt::Display for RowMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Mismatch DebitNote: {} | Party: {} | Payment Sheet Amount: {} | Debit Sheet Amount: {}",
            self.note_ref,
            self.party_code,
            format_cents(self.payment_net_cents),
            format_cents(self.note_amount_cents)
        )
    }
}

/// A key present in the payment sheet with no usable directory entry.
/// Computed over the full payment set, independent of match outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingContact {
    pub key: String,
    pub payment_rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchReport {
    pub ready: Vec<MatchResult>,
    pub skips: Vec<PartySkip>,
    pub missing_contacts: Vec<MissingContact>,
    pub mismatches: Vec<RowMismatch>,
}

// ---------------------------------------------------------------------------
// Dispatch output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "detail")]
pub enum DispatchStatus {
    Sent,
    /// Transport error message, captured verbatim.
    Failed(String),
    Skipped(String),
}

/// Outcome of one attempted send. One record per attempted party per run.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchRecord {
    pub party_code: String,
    pub party_name: String,
    pub recipients: Vec<String>,
    pub cc: Vec<String>,
    #[serde(flatten)]
    pub status: DispatchStatus,
    /// RFC 3339 timestamp of the attempt.
    pub sent_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_cents_pads_and_signs() {
        assert_eq!(format_cents(0), "0.00");
        assert_eq!(format_cents(5), "0.05");
        assert_eq!(format_cents(123456), "1234.56");
        assert_eq!(format_cents(-90000), "-900.00");
    }

    #[test]
    fn placeholder_addresses_are_not_real() {
        let mut contact = PartyContact {
            party_code: "P1".into(),
            party_name: "Alpha Corp".into(),
            to_emails: vec!["nan".into(), "".into()],
            cc_emails: vec![],
        };
        assert!(!contact.has_real_address());
        contact.to_emails.push("a@x.com".into());
        assert!(contact.has_real_address());
    }

    #[test]
    fn skip_lines_carry_both_sums() {
        let skip = PartySkip {
            party_code: "P2".into(),
            reason: SkipReason::DebitMismatch {
                payment_debit_cents: 50000,
                note_debit_cents: 40000,
            },
        };
        let line = skip.to_string();
        assert!(line.starts_with("SKIPPED: P2"));
        assert!(line.contains("500.00"));
        assert!(line.contains("400.00"));
    }
}
