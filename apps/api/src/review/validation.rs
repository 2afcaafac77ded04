use thiserror::Error;

use crate::platform::fs::UploadFile;
use crate::util::format_size;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";
/// 20 MiB.
pub const MAX_FILE_SIZE: u64 = 20 * 1024 * 1024;

#[derive(Debug, Error, PartialEq)]
pub enum UploadRejection {
    #[error("A resume file is required")]
    Missing,

    #[error("Only one file can be uploaded at a time")]
    MultipleFiles,

    #[error("Only PDF files are accepted (got {0})")]
    NotPdf(String),

    #[error("The file is empty")]
    Empty,

    #[error("PDF files up to {} are accepted (got {})", format_size(MAX_FILE_SIZE), size_label(.0))]
    TooLarge(u64),
}

fn size_label(bytes: &u64) -> String {
    format_size(*bytes)
}

/// Picker-side checks. Runs before anything is sent to the platform.
pub fn validate_upload(file: &UploadFile) -> Result<(), UploadRejection> {
    let mime = file
        .content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    if mime != PDF_CONTENT_TYPE {
        return Err(UploadRejection::NotPdf(file.content_type.clone()));
    }

    let size = file.size();
    if size == 0 {
        return Err(UploadRejection::Empty);
    }
    if size > MAX_FILE_SIZE {
        return Err(UploadRejection::TooLarge(size));
    }
    Ok(())
}
