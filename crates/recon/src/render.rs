use chrono::NaiveDate;
use serde::Serialize;

use crate::model::{format_cents, MatchResult, SheetVariant};

/// Days a party has to dispute a statement. Fixed business rule.
const DISPUTE_WINDOW_DAYS: u32 = 7;

// ---------------------------------------------------------------------------
// Statement tree
// ---------------------------------------------------------------------------

/// A rendered per-party statement: header, line items, optional notes block,
/// totals. `to_html` turns it into an email-safe body.
#[derive(Debug, Clone, Serialize)]
pub struct Statement {
    pub party_name: String,
    pub variant: SheetVariant,
    pub body: StatementBody,
    pub notes: Option<NotesBlock>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case", tag = "layout")]
pub enum StatementBody {
    Legacy {
        lines: Vec<LegacyLine>,
        totals: LegacyTotals,
    },
    Ledger {
        lines: Vec<LedgerLine>,
        /// Equals the last line's running balance; both sides use the same
        /// credit-minus-debit formula.
        final_balance_cents: i64,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct LegacyLine {
    pub invoice_no: String,
    pub purchase_date: Option<NaiveDate>,
    pub total_invoice_cents: i64,
    pub debit_cents: i64,
    pub net_cents: i64,
    pub bank_payment_cents: i64,
    pub payment_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LegacyTotals {
    pub total_invoice_cents: i64,
    pub net_cents: i64,
    pub bank_payment_cents: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LedgerLine {
    pub invoice_no: String,
    pub advice_no: Option<String>,
    pub seller_advice_no: Option<String>,
    pub transaction_type: Option<String>,
    pub debit_cents: i64,
    pub credit_cents: i64,
    /// Cumulative credit minus debit, accumulated in input order.
    pub running_balance_cents: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct NotesBlock {
    pub lines: Vec<NoteLine>,
    pub total_cents: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct NoteLine {
    pub date: Option<NaiveDate>,
    pub reference_no: String,
    pub amount_cents: i64,
}

// ---------------------------------------------------------------------------
// Render
// ---------------------------------------------------------------------------

pub fn render(result: &MatchResult, variant: SheetVariant) -> Statement {
    let body = match variant {
        SheetVariant::Legacy => {
            let lines: Vec<LegacyLine> = result
                .payments
                .iter()
                .map(|row| LegacyLine {
                    invoice_no: row.invoice_no.clone(),
                    purchase_date: row.purchase_date,
                    total_invoice_cents: row.total_invoice_cents,
                    debit_cents: row.debit_cents,
                    net_cents: row.net_cents,
                    bank_payment_cents: row.bank_payment_cents,
                    payment_date: row.payment_date,
                })
                .collect();
            let totals = LegacyTotals {
                total_invoice_cents: lines.iter().map(|l| l.total_invoice_cents).sum(),
                net_cents: lines.iter().map(|l| l.net_cents).sum(),
                bank_payment_cents: lines.iter().map(|l| l.bank_payment_cents).sum(),
            };
            StatementBody::Legacy { lines, totals }
        }
        SheetVariant::Ledger => {
            let mut running = 0i64;
            let lines: Vec<LedgerLine> = result
                .payments
                .iter()
                .map(|row| {
                    let credit = row.bank_payment_cents;
                    running += credit - row.debit_cents;
                    LedgerLine {
                        invoice_no: row.invoice_no.clone(),
                        advice_no: row.advice_no.clone(),
                        seller_advice_no: row.seller_advice_no.clone(),
                        transaction_type: row.transaction_type.clone(),
                        debit_cents: row.debit_cents,
                        credit_cents: credit,
                        running_balance_cents: running,
                    }
                })
                .collect();
            StatementBody::Ledger {
                lines,
                final_balance_cents: running,
            }
        }
    };

    let notes = if result.notes.is_empty() {
        None
    } else {
        let lines: Vec<NoteLine> = result
            .notes
            .iter()
            .map(|n| NoteLine {
                date: n.date,
                reference_no: n.reference_no.clone(),
                amount_cents: n.amount_cents,
            })
            .collect();
        let total_cents = lines.iter().map(|l| l.amount_cents).sum();
        Some(NotesBlock { lines, total_cents })
    };

    Statement {
        party_name: result.party_name.clone(),
        variant,
        body,
        notes,
    }
}

// ---------------------------------------------------------------------------
// HTML
// ---------------------------------------------------------------------------

/// Escape a value for interpolation into the HTML body.
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn fmt_date(date: Option<NaiveDate>) -> String {
    match date {
        Some(d) => d.format("%Y-%m-%d").to_string(),
        None => "-".into(),
    }
}

fn fmt_opt(value: &Option<String>) -> String {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => escape(v),
        _ => "-".into(),
    }
}

const TD: &str = "border:1px solid #ccc; padding:6px;";
const TH: &str = "border:1px solid #333; padding:8px;";

fn header_row(columns: &[&str]) -> String {
    let mut out = String::from("<tr style=\"background-color:#f2f2f2;\">");
    for col in columns {
        out.push_str(&format!("<th style=\"{TH}\">{col}</th>"));
    }
    out.push_str("</tr>");
    out
}

impl Statement {
    pub fn to_html(&self) -> String {
        let mut html = String::new();
        html.push_str("<html><body style=\"font-family: Arial, sans-serif; color: #333;\">");
        html.push_str(&format!("<p>Dear {},</p>", escape(&self.party_name)));
        html.push_str(
            "<p>Please find below the summary of your recent transactions with us:</p>",
        );
        html.push_str("<h3>Purchase &amp; Payment Details</h3>");
        html.push_str(
            "<table style=\"border-collapse: collapse; width: 100%; margin-bottom: 20px;\"><thead>",
        );

        match &self.body {
            StatementBody::Legacy { lines, totals } => {
                html.push_str(&header_row(&[
                    "Purchase Bill",
                    "Pur. Date",
                    "Amount Rs.",
                    "Debit Note",
                    "Total Payment",
                    "Bank Payment",
                    "Payment Date",
                ]));
                html.push_str("</thead><tbody>");
                for line in lines {
                    html.push_str(&format!(
                        "<tr style=\"text-align:center;\">\
                         <td style=\"{TD}\">{}</td><td style=\"{TD}\">{}</td>\
                         <td style=\"{TD}\">{}</td><td style=\"{TD}\">{}</td>\
                         <td style=\"{TD}\">{}</td><td style=\"{TD}\">{}</td>\
                         <td style=\"{TD}\">{}</td></tr>",
                        escape(&line.invoice_no),
                        fmt_date(line.purchase_date),
                        format_cents(line.total_invoice_cents),
                        format_cents(line.debit_cents),
                        format_cents(line.net_cents),
                        format_cents(line.bank_payment_cents),
                        fmt_date(line.payment_date),
                    ));
                }
                html.push_str(&format!(
                    "<tr style=\"text-align:center; font-weight:bold; background-color:#f9f9f9;\">\
                     <td colspan=\"2\" style=\"{TD}\">Total</td>\
                     <td style=\"{TD}\">{}</td><td style=\"{TD}\">-</td>\
                     <td style=\"{TD}\">{}</td><td style=\"{TD}\">{}</td>\
                     <td style=\"{TD}\">-</td></tr>",
                    format_cents(totals.total_invoice_cents),
                    format_cents(totals.net_cents),
                    format_cents(totals.bank_payment_cents),
                ));
            }
            StatementBody::Ledger {
                lines,
                final_balance_cents,
            } => {
                html.push_str(&header_row(&[
                    "Invoice No.",
                    "Advice No.",
                    "Seller Advice No.",
                    "Type",
                    "Debit",
                    "Credit",
                    "Balance",
                ]));
                html.push_str("</thead><tbody>");
                for line in lines {
                    html.push_str(&format!(
                        "<tr style=\"text-align:center;\">\
                         <td style=\"{TD}\">{}</td><td style=\"{TD}\">{}</td>\
                         <td style=\"{TD}\">{}</td><td style=\"{TD}\">{}</td>\
                         <td style=\"{TD}\">{}</td><td style=\"{TD}\">{}</td>\
                         <td style=\"{TD}\">{}</td></tr>",
                        escape(&line.invoice_no),
                        fmt_opt(&line.advice_no),
                        fmt_opt(&line.seller_advice_no),
                        fmt_opt(&line.transaction_type),
                        format_cents(line.debit_cents),
                        format_cents(line.credit_cents),
                        format_cents(line.running_balance_cents),
                    ));
                }
                html.push_str(&format!(
                    "<tr style=\"text-align:center; font-weight:bold; background-color:#f9f9f9;\">\
                     <td colspan=\"6\" style=\"{TD}\">Final Balance</td>\
                     <td style=\"{TD}\">{}</td></tr>",
                    format_cents(*final_balance_cents),
                ));
            }
        }
        html.push_str("</tbody></table>");

        if let Some(notes) = &self.notes {
            html.push_str("<h3>Return/Debit Details</h3>");
            html.push_str(
                "<table style=\"border-collapse: collapse; width: auto; text-align:center;\"><thead>",
            );
            html.push_str(&header_row(&["Date", "Return Invoice No.", "Amount"]));
            html.push_str("</thead><tbody>");
            for line in &notes.lines {
                html.push_str(&format!(
                    "<tr style=\"text-align:center;\">\
                     <td style=\"{TD}\">{}</td><td style=\"{TD}\">{}</td>\
                     <td style=\"{TD}\">{}</td></tr>",
                    fmt_date(line.date),
                    escape(&line.reference_no),
                    format_cents(line.amount_cents),
                ));
            }
            html.push_str(&format!(
                "<tr style=\"background-color:#f9f9f9; font-weight:bold;\">\
                 <td colspan=\"2\" style=\"{TD} text-align:right;\">Total Debit Amount:</td>\
                 <td style=\"{TD}\">{}</td></tr>",
                format_cents(notes.total_cents),
            ));
            html.push_str("</tbody></table>");
        }

        html.push_str(&format!(
            "<br><p><strong>Important Note:</strong> If you have any discrepancies or concerns \
             regarding the above payment summary, please raise the issue within {DISPUTE_WINDOW_DAYS} days. \
             No changes or claims will be entertained after this period.</p>",
        ));
        html.push_str("<p>Thank you for your continued partnership.</p>");
        html.push_str("</body></html>");
        html
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
