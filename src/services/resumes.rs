use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

use crate::utils::errors::AppError;

const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "doc", "docx"];

/// Detected types accepted for each extension. Word 97 files sniff as an OLE
/// container and DOCX as a zip archive when the inner parts are not inspected.
fn accepted_types(extension: &str) -> &'static [&'static str] {
    match extension {
        "pdf" => &["application/pdf"],
        "doc" => &["application/msword", "application/x-ole-storage"],
        "docx" => &[
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            "application/zip",
        ],
        _ => &[],
    }
}

fn content_type_for(extension: &str) -> mime::Mime {
    match extension {
        "pdf" => mime::APPLICATION_PDF,
        "doc" => "application/msword".parse().unwrap_or(mime::APPLICATION_OCTET_STREAM),
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            .parse()
            .unwrap_or(mime::APPLICATION_OCTET_STREAM),
        _ => mime::APPLICATION_OCTET_STREAM,
    }
}

fn extension_of(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

fn validate_extension(original_name: &str) -> Result<String, AppError> {
    match extension_of(original_name) {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => Ok(ext),
        _ => Err(AppError::UnsupportedMediaType(
            "Resume must be a PDF, DOC or DOCX file".to_string(),
        )),
    }
}

fn validate_content(extension: &str, data: &[u8]) -> Result<(), AppError> {
    let detected = infer::get(data).map(|kind| kind.mime_type());
    match detected {
        Some(mime_type) if accepted_types(extension).contains(&mime_type) => Ok(()),
        _ => Err(AppError::UnsupportedMediaType(format!(
            "Resume content does not look like a .{} file",
            extension
        ))),
    }
}

/// Resume files on local disk, addressed by a generated file name.
#[derive(Debug, Clone)]
pub struct ResumeStorage {
    dir: PathBuf,
    max_bytes: usize,
}

impl ResumeStorage {
    pub fn new(dir: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            dir: dir.into(),
            max_bytes,
        }
    }

    /// Checks a resume without writing it.
    pub fn validate(&self, original_name: &str, data: &[u8]) -> Result<String, AppError> {
        let extension = validate_extension(original_name)?;
        if data.is_empty() {
            return Err(AppError::invalid_field("resume", "Resume file is empty"));
        }
        if data.len() > self.max_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "Resume exceeds the {} MB limit",
                self.max_bytes / (1024 * 1024)
            )));
        }
        validate_content(&extension, data)?;
        Ok(extension)
    }

    /// Writes the resume and returns the stored file name.
    pub async fn save(&self, original_name: &str, data: &[u8]) -> Result<String, AppError> {
        let extension = self.validate(original_name, data)?;
        let stored_name = format!("{}.{}", Uuid::new_v4(), extension);

        fs::create_dir_all(&self.dir).await?;
        fs::write(self.dir.join(&stored_name), data).await?;

        tracing::debug!("Stored resume {} ({} bytes)", stored_name, data.len());
        Ok(stored_name)
    }

    pub async fn read(&self, stored_name: &str) -> Result<(Vec<u8>, mime::Mime), AppError> {
        let path = self.path_of(stored_name)?;
        let data = match fs::read(&path).await {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(AppError::NotFound("Resume file not found".to_string()))
            }
            Err(err) => return Err(err.into()),
        };

        let extension = extension_of(stored_name).unwrap_or_default();
        Ok((data, content_type_for(&extension)))
    }

    /// Best effort: a file that cannot be removed is logged and left behind.
    pub async fn remove(&self, stored_name: &str) {
        let Ok(path) = self.path_of(stored_name) else {
            return;
        };
        if let Err(err) = fs::remove_file(&path).await {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Failed to remove resume {}: {}", path.display(), err);
            }
        }
    }

    fn path_of(&self, stored_name: &str) -> Result<PathBuf, AppError> {
        let plain = Path::new(stored_name)
            .file_name()
            .map(|name| name == stored_name)
            .unwrap_or(false);
        if !plain {
            return Err(AppError::NotFound("Resume file not found".to_string()));
        }
        Ok(self.dir.join(stored_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PDF: &[u8] = b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog >>\nendobj\n%%EOF";

    #[tokio::test]
    async fn saves_and_reads_back_a_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let storage = ResumeStorage::new(dir.path(), 1024 * 1024);

        let stored = storage.save("Asha Rao CV.PDF", PDF).await.unwrap();
        assert!(stored.ends_with(".pdf"));

        let (data, content_type) = storage.read(&stored).await.unwrap();
        assert_eq!(data, PDF);
        assert_eq!(content_type, mime::APPLICATION_PDF);
    }

    #[test]
    fn rejects_unlisted_extensions() {
        let storage = ResumeStorage::new("unused", 1024);
        let err = storage.validate("photo.png", PDF).unwrap_err();
        assert!(matches!(err, AppError::UnsupportedMediaType(_)));
    }

    #[test]
    fn rejects_content_that_does_not_match_the_extension() {
        let storage = ResumeStorage::new("unused", 1024);
        let err = storage.validate("resume.pdf", b"just some text").unwrap_err();
        assert!(matches!(err, AppError::UnsupportedMediaType(_)));
    }

    #[test]
    fn enforces_the_size_limit() {
        let storage = ResumeStorage::new("unused", 16);
        let err = storage.validate("resume.pdf", PDF).unwrap_err();
        assert!(matches!(err, AppError::PayloadTooLarge(_)));
    }

    #[tokio::test]
    async fn refuses_paths_outside_the_upload_dir() {
        let dir = tempfile::tempdir().unwrap();
        let storage = ResumeStorage::new(dir.path(), 1024);

        let err = storage.read("../Cargo.toml").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn remove_deletes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = ResumeStorage::new(dir.path(), 1024 * 1024);
        let stored = storage.save("cv.pdf", PDF).await.unwrap();

        storage.remove(&stored).await;

        assert!(!dir.path().join(&stored).exists());
        assert!(matches!(storage.read(&stored).await, Err(AppError::NotFound(_))));
    }
}
