use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use tracing::instrument;

use sa_core::ports::{FileUpload, GatewayError, UploadPort, UploadedFile};

use super::HttpClient;

/// Multipart upload to `POST {base}/upload`, field `file`.
pub struct HttpUploader {
    http: HttpClient,
}

impl HttpUploader {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl UploadPort for HttpUploader {
    #[instrument(name = "http.upload", skip(self, file), fields(file_name = %file.file_name))]
    async fn upload(&self, file: &FileUpload) -> Result<Vec<UploadedFile>, GatewayError> {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(&file.content_type)
            .map_err(|err| GatewayError::Network(format!("invalid content type: {err}")))?;
        let request = self
            .http
            .request(Method::POST, "upload")
            .multipart(Form::new().part("file", part));
        self.http.send_data(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use std::time::Duration;

    #[tokio::test]
    async fn uploads_as_multipart_file_field() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/upload")
            .match_header(
                "content-type",
                Matcher::Regex("multipart/form-data; boundary=.*".into()),
            )
            .match_body(Matcher::Regex(r#"name="file"; filename="a.png""#.into()))
            .with_status(200)
            .with_body(r#"{"success":true,"data":[{"publicUrl":"https://cdn/a.png"}]}"#)
            .create_async()
            .await;

        let uploader =
            HttpUploader::new(HttpClient::new(server.url(), Duration::from_secs(5)).unwrap());
        let stored = uploader
            .upload(&FileUpload {
                file_name: "a.png".into(),
                content_type: "image/png".into(),
                bytes: vec![1, 2, 3],
            })
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(stored[0].href(), Some("https://cdn/a.png"));
    }
}
