//! CLI Exit Code Registry
//!
//! Single source of truth for all CLI exit codes. Exit codes are part of
//! the shell contract — scripts rely on them.
//!
//! | Code | Meaning                                         |
//! |------|-------------------------------------------------|
//! | 0    | Success                                         |
//! | 1    | General error (unspecified)                     |
//! | 2    | Usage error (bad args, missing file)            |
//! | 3    | Run config invalid                              |
//! | 4    | Workbook schema error (missing columns/layout)  |
//! | 5    | Directory store error                           |
//! | 6    | Administrative secret rejected                  |
//! | 7    | One or more dispatches failed                   |
//! | 8    | Workbook export error                           |

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// Run config failed to parse or validate.
pub const EXIT_CONFIG: u8 = 3;

/// Uploaded workbook is missing required columns or has no recognizable
/// layout.
pub const EXIT_SCHEMA: u8 = 4;

/// Party directory store could not be read or written.
pub const EXIT_STORE: u8 = 5;

/// Administrative secret rejected; the gated operation was refused.
pub const EXIT_AUTH: u8 = 6;

/// The run completed but at least one party's dispatch failed.
pub const EXIT_DISPATCH: u8 = 7;

/// Workbook export failed.
pub const EXIT_EXPORT: u8 = 8;
