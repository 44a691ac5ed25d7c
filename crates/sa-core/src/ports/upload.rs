use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::errors::GatewayError;

/// A file picked by the user, ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// One stored file as described by the upload endpoint. Depending on the
/// storage backend either `url` or `publicUrl` is filled in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,
}

impl UploadedFile {
    /// Address to store on the record, preferring `url`. Blank values count
    /// as missing.
    pub fn href(&self) -> Option<&str> {
        fn present(value: &Option<String>) -> Option<&str> {
            value.as_deref().filter(|s| !s.trim().is_empty())
        }
        present(&self.url).or_else(|| present(&self.public_url))
    }
}

#[async_trait]
pub trait UploadPort: Send + Sync {
    async fn upload(&self, file: &FileUpload) -> Result<Vec<UploadedFile>, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn href_falls_back_to_public_url() {
        let file: UploadedFile =
            serde_json::from_value(serde_json::json!({ "publicUrl": "https://cdn/x.png" }))
                .unwrap();
        assert_eq!(file.href(), Some("https://cdn/x.png"));

        let both = UploadedFile {
            url: Some("https://a".into()),
            public_url: Some("https://b".into()),
        };
        assert_eq!(both.href(), Some("https://a"));
        assert_eq!(UploadedFile::default().href(), None);
    }

    #[test]
    fn blank_url_falls_back_to_public_url() {
        let file = UploadedFile {
            url: Some(String::new()),
            public_url: Some("https://cdn/x.png".into()),
        };
        assert_eq!(file.href(), Some("https://cdn/x.png"));

        let blank = UploadedFile {
            url: Some(" ".into()),
            public_url: Some("".into()),
        };
        assert_eq!(blank.href(), None);
    }
}
