use actix_multipart::form::{tempfile::TempFile, text::Text, MultipartForm};
use common::file_utils::{self, ValidationError};

/// Multipart form for case creation
#[derive(MultipartForm)]
pub struct UploadForm {
    /// The memory dump
    #[multipart(limit = "8GiB")]
    pub file: Option<TempFile>,

    /// Case name
    pub name: Option<Text<String>>,

    /// Free-text description
    pub description: Option<Text<String>>,

    /// Priority from 1 to 10, default 5
    pub priority: Option<Text<i64>>,
}

/// Upload fields after validation
pub struct ValidUpload {
    pub file: TempFile,
    pub original_filename: String,
    pub extension: String,
    pub name: String,
    pub description: String,
    pub priority: u8,
}

/// Why an upload form was rejected
#[derive(Debug)]
pub enum FormError {
    MissingFile,
    NoSelectedFile,
    InvalidFileType,
    Field(ValidationError),
}

impl FormError {
    pub fn message(&self) -> String {
        match self {
            FormError::MissingFile => "No file part in request".to_string(),
            FormError::NoSelectedFile => "No selected file".to_string(),
            FormError::InvalidFileType => "Invalid file type".to_string(),
            FormError::Field(ValidationError::PriorityOutOfRange(_)) => {
                "Priority must be between 1 and 10".to_string()
            }
            FormError::Field(e) => e.to_string(),
        }
    }
}

impl UploadForm {
    /// Checked in order: file, extension, name, priority
    pub fn validate(self) -> Result<ValidUpload, FormError> {
        let file = self.file.ok_or(FormError::MissingFile)?;
        let original_filename = file
            .file_name
            .clone()
            .filter(|name| !name.is_empty())
            .ok_or(FormError::NoSelectedFile)?;
        let extension = file_utils::dump_extension(&original_filename).map_err(|e| match e {
            ValidationError::EmptyFilename => FormError::NoSelectedFile,
            _ => FormError::InvalidFileType,
        })?;

        let name = file_utils::validate_case_name(
            self.name.as_ref().map(|name| name.as_str()).unwrap_or_default(),
        )
        .map_err(FormError::Field)?;

        let priority = self
            .priority
            .map(Text::into_inner)
            .unwrap_or(i64::from(file_utils::DEFAULT_PRIORITY));
        let priority = file_utils::validate_priority(priority).map_err(FormError::Field)?;

        Ok(ValidUpload {
            file,
            original_filename,
            extension,
            name,
            description: self.description.map(Text::into_inner).unwrap_or_default(),
            priority,
        })
    }
}
