use std::path::PathBuf;

use crate::agent::transcript::SUPPORTED_IMAGE_EXTENSIONS;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("request to the inference endpoint failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("inference endpoint throttled the request: {0}")]
    Throttled(String),

    #[error("inference endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response from inference endpoint: {0}")]
    Malformed(String),

    #[error("could not sign request: {0}")]
    Signing(String),
}

impl GatewayError {
    pub fn is_throttled(&self) -> bool {
        matches!(self, Self::Throttled(_))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AttachmentError {
    #[error(
        "Unsupported image format: '{extension}' not in [{}]",
        SUPPORTED_IMAGE_EXTENSIONS.join(", ")
    )]
    UnsupportedFormat { extension: String },

    #[error("Failed to read attachment {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Attachment(#[from] AttachmentError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}
