use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use sa_core::catalog::{GalleryImage, GalleryImageDraft};
use sa_core::ports::{FileUpload, UploadPort};
use sa_core::{MutationError, ValidationError};

use crate::mutator::OptimisticMutator;
use crate::timeout::with_timeout;

/// Use case for adding an image to the gallery.
///
/// The file is sent to the upload endpoint first; the gallery record is
/// then created through the regular mutator so that the mirror and the
/// invalidation signals behave like any other create.
pub struct UploadGalleryImage {
    uploader: Arc<dyn UploadPort>,
    mutator: Arc<OptimisticMutator<GalleryImage>>,
    timeout: Duration,
}

impl UploadGalleryImage {
    pub fn new(
        uploader: Arc<dyn UploadPort>,
        mutator: Arc<OptimisticMutator<GalleryImage>>,
        timeout: Duration,
    ) -> Self {
        Self {
            uploader,
            mutator,
            timeout,
        }
    }

    /// Uploads `file` and records it in the gallery under `title`.
    ///
    /// Non-image files are rejected before anything is sent.
    #[tracing::instrument(
        name = "usecase.upload_gallery_image.execute",
        skip(self, file, title),
        fields(file_name = %file.file_name, size = file.bytes.len())
    )]
    pub async fn execute(
        &self,
        file: FileUpload,
        title: impl Into<String>,
    ) -> Result<GalleryImage, MutationError> {
        if !file.content_type.starts_with("image/") {
            return Err(ValidationError::new(
                "file",
                format!("unsupported content type '{}'", file.content_type),
            )
            .into());
        }
        if file.bytes.is_empty() {
            return Err(ValidationError::required("file").into());
        }

        let uploaded = with_timeout(self.timeout, self.uploader.upload(&file))
            .await
            .map_err(|err| {
                warn!(error = %err, "upload failed");
                MutationError::from(err)
            })?;

        let url = uploaded
            .iter()
            .find_map(|stored| stored.href())
            .ok_or_else(|| MutationError::Server {
                status: None,
                message: "upload response contained no file url".to_string(),
            })?
            .to_string();
        info!(url = %url, "file uploaded");

        self.mutator
            .create_record(GalleryImageDraft {
                title: title.into(),
                url,
                featured: false,
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mirror_store::MirrorStore;
    use async_trait::async_trait;
    use sa_core::ports::{
        AuthContextPort, AuthStatus, GatewayError, ListQuery, ListResponse, RemoteGatewayPort,
        UploadedFile,
    };
    use sa_core::{Entity, RecordId};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Ready;

    impl AuthContextPort for Ready {
        fn status(&self) -> AuthStatus {
            AuthStatus::Unauthenticated
        }
    }

    struct Gallery {
        creates: AtomicUsize,
    }

    #[async_trait]
    impl RemoteGatewayPort<GalleryImage> for Gallery {
        async fn get_all(
            &self,
            _query: &ListQuery,
        ) -> Result<ListResponse<GalleryImage>, GatewayError> {
            Ok(ListResponse::unpaginated(Vec::new()))
        }

        async fn create(&self, draft: &GalleryImageDraft) -> Result<GalleryImage, GatewayError> {
            self.creates.fetch_add(1, Ordering::SeqCst);
            Ok(GalleryImage::from_draft(
                RecordId::from("img-1"),
                draft.clone(),
                chrono::Utc::now(),
            ))
        }

        async fn update(
            &self,
            _id: &RecordId,
            _patch: &<GalleryImage as Entity>::Patch,
        ) -> Result<GalleryImage, GatewayError> {
            Err(GatewayError::server("not used"))
        }

        async fn remove(&self, _id: &RecordId) -> Result<bool, GatewayError> {
            Ok(true)
        }
    }

    struct StubUploader {
        calls: AtomicUsize,
        answer: Vec<UploadedFile>,
    }

    #[async_trait]
    impl UploadPort for StubUploader {
        async fn upload(&self, _file: &FileUpload) -> Result<Vec<UploadedFile>, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.answer.clone())
        }
    }

    fn setup(answer: Vec<UploadedFile>) -> (UploadGalleryImage, Arc<StubUploader>, Arc<Gallery>) {
        let gateway = Arc::new(Gallery {
            creates: AtomicUsize::new(0),
        });
        let store = Arc::new(MirrorStore::new(
            gateway.clone(),
            Arc::new(Ready),
            Duration::from_secs(5),
        ));
        let uploader = Arc::new(StubUploader {
            calls: AtomicUsize::new(0),
            answer,
        });
        let usecase = UploadGalleryImage::new(
            uploader.clone(),
            Arc::new(OptimisticMutator::new(store)),
            Duration::from_secs(5),
        );
        (usecase, uploader, gateway)
    }

    fn png() -> FileUpload {
        FileUpload {
            file_name: "banner.png".into(),
            content_type: "image/png".into(),
            bytes: vec![0x89, 0x50, 0x4e, 0x47],
        }
    }

    #[tokio::test]
    async fn creates_record_with_uploaded_url() {
        let (usecase, _, gateway) = setup(vec![UploadedFile {
            url: None,
            public_url: Some("https://cdn/banner.png".into()),
        }]);

        let image = usecase.execute(png(), "Banner").await.unwrap();

        assert_eq!(image.url, "https://cdn/banner.png");
        assert_eq!(image.title, "Banner");
        assert_eq!(gateway.creates.load(Ordering::SeqCst), 1);
        assert!(usecase.mutator.store().contains(&RecordId::from("img-1")));
    }

    #[tokio::test]
    async fn rejects_non_images_without_uploading() {
        let (usecase, uploader, _) = setup(Vec::new());
        let file = FileUpload {
            content_type: "application/pdf".into(),
            ..png()
        };

        let err = usecase.execute(file, "Doc").await.unwrap_err();

        assert!(matches!(err, MutationError::Validation(_)));
        assert_eq!(uploader.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_url_is_a_server_error() {
        let (usecase, _, gateway) = setup(vec![UploadedFile::default()]);

        let err = usecase.execute(png(), "Banner").await.unwrap_err();

        assert!(matches!(err, MutationError::Server { .. }));
        assert_eq!(gateway.creates.load(Ordering::SeqCst), 0);
    }
}
