//! Shared constants and invariants

pub const DEFAULT_SAFETY_MARGIN_SECS: u64 = 0;
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

pub const DEFAULT_SCOPE: &str = "code";
pub const DEFAULT_ROOT_PATH: &str = "api/v1";

pub const GRANT_TYPE_CLIENT_CREDENTIALS: &str = "client_credentials";
pub const CHANGES_SINCE_PARAM: &str = "changesSince";
