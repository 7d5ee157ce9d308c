use std::fmt;

/// Required structure is absent from an uploaded workbook. Fatal to the run,
/// surfaced before any matching occurs.
#[derive(Debug)]
pub enum SchemaError {
    /// The workbook could not be opened or a sheet could not be read.
    Workbook(String),
    /// Required column(s) absent from a sheet.
    MissingColumns { sheet: String, columns: Vec<String> },
    /// Neither the two-sheet nor the ledger layout was recognizable.
    UnrecognizedLayout,
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Workbook(msg) => write!(f, "cannot read workbook: {msg}"),
            Self::MissingColumns { sheet, columns } => {
                write!(f, "sheet '{sheet}': missing required column(s): {}", columns.join(", "))
            }
            Self::UnrecognizedLayout => write!(f, "unrecognized workbook layout"),
        }
    }
}

impl std::error::Error for SchemaError {}

/// Party directory store failure.
#[derive(Debug)]
pub enum StoreError {
    Read(String),
    Write(String),
    Parse(String),
    /// `update` was asked for a party code the store does not hold.
    UnknownParty(String),
    /// Directory import workbook problems.
    Workbook(String),
    MissingColumns(Vec<String>),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read(msg) => write!(f, "cannot read directory store: {msg}"),
            Self::Write(msg) => write!(f, "cannot write directory store: {msg}"),
            Self::Parse(msg) => write!(f, "cannot parse directory store: {msg}"),
            Self::UnknownParty(code) => write!(f, "unknown party code: {code}"),
            Self::Workbook(msg) => write!(f, "cannot read directory workbook: {msg}"),
            Self::MissingColumns(columns) => {
                write!(f, "directory workbook missing column(s): {}", columns.join(", "))
            }
        }
    }
}

impl std::error::Error for StoreError {}

/// Administrative secret mismatch. The gated operation is refused with no
/// partial effect.
#[derive(Debug, PartialEq, Eq)]
pub struct AuthError;

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "administrative secret rejected")
    }
}

impl std::error::Error for AuthError {}

/// Workbook export failure.
#[derive(Debug)]
pub struct ExportError(pub String);

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "export failed: {}", self.0)
    }
}

impl std::error::Error for ExportError {}
