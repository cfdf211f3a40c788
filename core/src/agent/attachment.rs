use crate::agent::transcript::ImageFormat;
use crate::error::AttachmentError;
use std::path::{Path, PathBuf};

/// A diagram image ready to be sent with the first query of a session.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub path: PathBuf,
    pub format: ImageFormat,
    pub bytes: Vec<u8>,
}

/// Checks the file extension against the supported set without touching the
/// file.
pub fn image_format_for(path: &Path) -> Result<ImageFormat, AttachmentError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    ImageFormat::from_extension(&extension)
        .ok_or(AttachmentError::UnsupportedFormat { extension })
}

impl Attachment {
    /// Attachments always live in the data directory. The format is validated
    /// before any bytes are read.
    pub async fn load(data_dir: &Path, file_name: &str) -> Result<Self, AttachmentError> {
        let path = data_dir.join(file_name);
        let format = image_format_for(&path)?;

        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|source| AttachmentError::Read {
                path: path.clone(),
                source,
            })?;

        tracing::debug!(path = %path.display(), size = bytes.len(), "Loaded attachment");

        Ok(Self {
            path,
            format,
            bytes,
        })
    }

    pub fn display_path(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn unsupported_extension_is_named() {
        let err = image_format_for(Path::new("demo/diagram.bmp")).unwrap_err();
        assert!(matches!(
            &err,
            AttachmentError::UnsupportedFormat { extension } if extension == "bmp"
        ));
        assert_eq!(
            err.to_string(),
            "Unsupported image format: 'bmp' not in [png, jpg, jpeg]"
        );
    }

    #[test]
    fn missing_extension_is_unsupported() {
        let err = image_format_for(Path::new("demo/diagram")).unwrap_err();
        assert!(matches!(
            err,
            AttachmentError::UnsupportedFormat { extension } if extension.is_empty()
        ));
    }

    #[test]
    fn extension_check_ignores_case() {
        assert_eq!(
            image_format_for(Path::new("Diagram.JPG")).unwrap(),
            ImageFormat::Jpeg
        );
    }

    #[tokio::test]
    async fn unsupported_file_is_never_read() {
        let tmp = TempDir::new().unwrap();
        // does not exist on disk: a read attempt would surface as Read
        let err = Attachment::load(tmp.path(), "diagram.bmp").await.unwrap_err();
        assert!(matches!(err, AttachmentError::UnsupportedFormat { .. }));
    }

    #[tokio::test]
    async fn loads_supported_image() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("arch.png"), b"\x89PNG").unwrap();

        let attachment = Attachment::load(tmp.path(), "arch.png").await.unwrap();
        assert_eq!(attachment.format, ImageFormat::Png);
        assert_eq!(attachment.bytes, b"\x89PNG");
        assert!(attachment.display_path().ends_with("arch.png"));
    }

    #[tokio::test]
    async fn missing_supported_file_reports_read_error() {
        let tmp = TempDir::new().unwrap();
        let err = Attachment::load(tmp.path(), "absent.jpeg").await.unwrap_err();
        assert!(matches!(err, AttachmentError::Read { .. }));
    }
}
