use common::file_utils::MAX_UPLOAD_BYTES;

/// Default data directory for stored dumps
pub const DEFAULT_DATA_DIR: &str = "server_data";

/// Default server host
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port
pub const DEFAULT_PORT: &str = "5000";

/// Prefix of every case endpoint
pub const CASES_SCOPE: &str = "/api/cases";

/// Seconds a new case waits in the queue before processing starts
pub const DEFAULT_QUEUE_SECS: u64 = 5;

/// Seconds the simulated analysis takes
pub const DEFAULT_PROCESSING_SECS: u64 = 30;

/// Listing page used when the request names none
pub const DEFAULT_PAGE: u32 = 1;

/// Listing page size used when the request names none
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Largest accepted listing page size
pub const MAX_PAGE_SIZE: u32 = 100;

/// Upper bound for a whole multipart upload, dump included
pub const MAX_UPLOAD_SIZE: u64 = MAX_UPLOAD_BYTES;

/// Memory allowed for the text fields of an upload
pub const MAX_FORM_MEMORY: usize = 64 * 1024;

/// Case directory file name of a stored dump, followed by its extension
pub const DUMP_FILE_STEM: &str = "raw";

/// Summary of the placeholder report
pub const REPORT_SUMMARY: &str =
    "This is a placeholder report. Real analysis will be implemented in a future update.";

/// Tasks reported while a case is processing, in order
pub const PIPELINE_TASKS: [&str; 5] = [
    "Identifying memory profile",
    "Enumerating processes",
    "Scanning network connections",
    "Extracting artifacts",
    "Generating report",
];
