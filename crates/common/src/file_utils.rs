use std::path::Path;
use thiserror::Error;

/// Memory dump extensions accepted for upload (compared case-insensitively)
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["raw", "mem", "vmem", "bin"];

/// Largest dump the analysis service accepts (8 GiB)
pub const MAX_UPLOAD_BYTES: u64 = 8 * 1024 * 1024 * 1024;

pub const MIN_PRIORITY: u8 = 1;
pub const MAX_PRIORITY: u8 = 10;
pub const DEFAULT_PRIORITY: u8 = 5;

/// Problems detected locally, before anything is sent to the server
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Filename cannot be empty")]
    EmptyFilename,
    #[error("Filename cannot contain null bytes")]
    ContainsNullByte,
    #[error("File has no extension; allowed extensions: {}", allowed_list())]
    MissingExtension,
    #[error("Unsupported file type .{0}; allowed extensions: {}", allowed_list())]
    UnsupportedExtension(String),
    #[error("Case name is required")]
    EmptyCaseName,
    #[error("Priority must be between {} and {}, got {0}", MIN_PRIORITY, MAX_PRIORITY)]
    PriorityOutOfRange(i64),
    #[error("File is {size} bytes, larger than the {limit} byte limit")]
    FileTooLarge { size: u64, limit: u64 },
    #[error("Not a regular file: {0}")]
    NotAFile(String),
    #[error("Invalid case id: {0:?}")]
    InvalidCaseId(String),
}

fn allowed_list() -> String {
    ALLOWED_EXTENSIONS
        .iter()
        .map(|ext| format!(".{ext}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Return the lowercased extension of a dump filename if it is on the whitelist.
/// `filename` is a bare name; use [`validate_dump_path`] for full paths.
pub fn dump_extension(filename: &str) -> Result<String, ValidationError> {
    if filename.is_empty() {
        return Err(ValidationError::EmptyFilename);
    }

    if filename.contains('\0') {
        return Err(ValidationError::ContainsNullByte);
    }

    // "dump." and ".raw" both count as having no usable extension
    let extension = match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => ext.to_ascii_lowercase(),
        _ => return Err(ValidationError::MissingExtension),
    };

    if ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        Ok(extension)
    } else {
        Err(ValidationError::UnsupportedExtension(extension))
    }
}

/// Validate the file name component of a dump path
pub fn validate_dump_path(path: &Path) -> Result<String, ValidationError> {
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or(ValidationError::EmptyFilename)?;
    dump_extension(filename)?;
    Ok(filename.to_string())
}

/// Case names are required; surrounding whitespace is dropped
pub fn validate_case_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyCaseName);
    }
    Ok(trimmed.to_string())
}

pub fn validate_priority(priority: i64) -> Result<u8, ValidationError> {
    if (i64::from(MIN_PRIORITY)..=i64::from(MAX_PRIORITY)).contains(&priority) {
        // in range, so the cast cannot truncate
        Ok(priority as u8)
    } else {
        Err(ValidationError::PriorityOutOfRange(priority))
    }
}

/// Case ids are server-assigned; reject anything that would alter the request path
pub fn validate_case_id(case_id: &str) -> Result<&str, ValidationError> {
    let trimmed = case_id.trim();
    let well_formed = !trimmed.is_empty()
        && trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if well_formed {
        Ok(trimmed)
    } else {
        Err(ValidationError::InvalidCaseId(case_id.to_string()))
    }
}

pub fn validate_file_size(size: u64, limit: u64) -> Result<(), ValidationError> {
    if size > limit {
        return Err(ValidationError::FileTooLarge { size, limit });
    }
    Ok(())
}
