use crate::DomainResult;
use crate::ports::BoxFuture;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaKind {
    Photo,
    Audio,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Photo => "photo",
            MediaKind::Audio => "audio",
        }
    }
}

/// Result of handing a binary payload to the external media host. The core
/// stores only the returned URL, never the bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaUpload {
    pub secure_url: String,
    pub public_id: String,
}

pub trait MediaDelegate: Send + Sync {
    fn upload(&self, kind: MediaKind, bytes: Vec<u8>) -> BoxFuture<'_, DomainResult<MediaUpload>>;
}
