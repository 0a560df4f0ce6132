/// Default analysis server URL
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";

/// Environment variable overriding the server URL
pub const SERVER_URL_ENV: &str = "MEMFLOW_SERVER_URL";

/// Environment variable holding the request timeout in seconds
pub const TIMEOUT_SECS_ENV: &str = "MEMFLOW_TIMEOUT_SECS";

/// Environment variable overriding the upload size limit in bytes
pub const MAX_UPLOAD_BYTES_ENV: &str = "MEMFLOW_MAX_UPLOAD_BYTES";

/// Default delay between two polls of `watch`
pub const DEFAULT_WATCH_INTERVAL_SECS: u64 = 5;

/// Width of the progress bar printed by `status` and `watch`
pub const PROGRESS_BAR_WIDTH: usize = 30;
