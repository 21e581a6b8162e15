//! Process exit codes

/// Clean exit
pub const SUCCESS: i32 = 0;

/// Any startup or runtime failure
pub const GENERAL_ERROR: i32 = 1;
