//! Constants shared across modules

use std::time::Duration;

/// SQL API v2 statement endpoint, relative to the account URL
pub const STATEMENTS_PATH: &str = "api/v2/statements";

/// First delay between status polls of a running statement
pub const POLL_INITIAL_DELAY: Duration = Duration::from_millis(50);

/// Upper bound for the doubling poll delay
pub const POLL_MAX_DELAY: Duration = Duration::from_secs(2);

/// Session parameter enabling multi-statement requests; `0` means any count
pub const MULTI_STATEMENT_COUNT: &str = "MULTI_STATEMENT_COUNT";

/// Fetch the cached result of an earlier statement by query id
pub const RESULT_SCAN_QUERY: &str = "SELECT * FROM TABLE(RESULT_SCAN(?))";

/// Cancel a running statement by query id
pub const CANCEL_QUERY: &str = "SELECT SYSTEM$CANCEL_QUERY(?)";

/// Longest identifier Snowflake accepts
pub const MAX_IDENTIFIER_LENGTH: usize = 255;

/// Rows per `INSERT ... SELECT ... FROM VALUES` chunk
pub const INSERT_CHUNK_ROWS: usize = 1_000;

/// Column holding the object name in `SHOW` output
pub const SHOW_NAME_COLUMN: &str = "name";

/// `rowcount` when the server does not report one
pub const UNKNOWN_ROWCOUNT: i64 = -1;
