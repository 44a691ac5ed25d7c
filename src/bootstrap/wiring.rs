//! # Dependency Injection
//!
//! The only place that knows about both `sa-infra` adapters and `sa-app`
//! services. Assembly only: no business decisions are made here.

use std::sync::Arc;

use sa_app::usecases::UploadGalleryImage;
use sa_app::{
    BadgePoller, BadgePollerDeps, BeaconPolicy, InvalidationRegistry, MirrorStore,
    OptimisticMutator, TrackingBeacon,
};
use sa_core::catalog::{Attribute, Collection, Customer, GalleryImage, Role};
use sa_core::ports::{
    AuthContextPort, BadgeCountPort, BeaconPort, ClockPort, RemoteGatewayPort, UploadPort,
};
use sa_core::{AppConfig, DeleteProtection, Entity};
use sa_infra::http::HttpSetupError;
use sa_infra::{
    HttpBadgeCounts, HttpBeacon, HttpClient, HttpGateway, HttpUploader, SystemClock,
};

/// Result type for wiring operations
pub type WiringResult<T> = Result<T, WiringError>;

#[derive(Debug, thiserror::Error)]
pub enum WiringError {
    #[error("HTTP client initialization failed: {0}")]
    Http(#[from] HttpSetupError),
}

/// Sections refreshed after a successful catalog mutation.
const CATALOG_SECTIONS: &[&str] = &["store"];

/// Every port the admin needs, as trait objects.
pub struct AdminDeps {
    pub roles: Arc<dyn RemoteGatewayPort<Role>>,
    pub collections: Arc<dyn RemoteGatewayPort<Collection>>,
    pub customers: Arc<dyn RemoteGatewayPort<Customer>>,
    pub gallery: Arc<dyn RemoteGatewayPort<GalleryImage>>,
    pub attributes: Arc<dyn RemoteGatewayPort<Attribute>>,
    pub uploader: Arc<dyn UploadPort>,
    pub badge_counts: Arc<dyn BadgeCountPort>,
    pub beacon: Arc<dyn BeaconPort>,
    pub auth: Arc<dyn AuthContextPort>,
    pub clock: Arc<dyn ClockPort>,
}

impl AdminDeps {
    /// REST adapters against `[api] base_url`.
    pub fn http(config: &AppConfig, auth: Arc<dyn AuthContextPort>) -> WiringResult<Self> {
        let http = HttpClient::new(config.api.base_url.clone(), config.api.request_timeout())?;
        Ok(Self {
            roles: Arc::new(HttpGateway::new(http.clone())),
            collections: Arc::new(HttpGateway::new(http.clone())),
            customers: Arc::new(HttpGateway::new(http.clone())),
            gallery: Arc::new(HttpGateway::new(http.clone())),
            attributes: Arc::new(HttpGateway::new(http.clone())),
            uploader: Arc::new(HttpUploader::new(http.clone())),
            badge_counts: Arc::new(HttpBadgeCounts::new(http.clone())),
            beacon: Arc::new(HttpBeacon::new(http)),
            auth,
            clock: Arc::new(SystemClock),
        })
    }
}

/// The assembled admin services.
pub struct AdminRuntime {
    pub registry: Arc<InvalidationRegistry>,
    pub roles: Arc<OptimisticMutator<Role>>,
    pub collections: Arc<OptimisticMutator<Collection>>,
    pub customers: Arc<OptimisticMutator<Customer>>,
    pub gallery: Arc<OptimisticMutator<GalleryImage>>,
    pub attributes: Arc<OptimisticMutator<Attribute>>,
    pub upload_gallery_image: UploadGalleryImage,
    pub beacon: TrackingBeacon,
    pub badges: BadgePoller,
}

impl AdminRuntime {
    /// Wires services and starts the badge poller. Must be called from
    /// within a Tokio runtime.
    pub fn start(deps: AdminDeps, config: &AppConfig) -> Self {
        let registry = InvalidationRegistry::new();
        let timeout = config.api.request_timeout();
        let wire = Wire {
            auth: &deps.auth,
            registry: &registry,
            timeout,
        };

        let roles = wire
            .mutator(deps.roles, CATALOG_SECTIONS)
            .with_protection(DeleteProtection::from_names(
                config.policy.protected_roles.iter().cloned(),
            ));
        let collections = wire.mutator(deps.collections, CATALOG_SECTIONS);
        let customers = wire.mutator(deps.customers, &[]);
        let gallery = Arc::new(wire.mutator(deps.gallery, CATALOG_SECTIONS));
        let attributes = wire.mutator(deps.attributes, CATALOG_SECTIONS);

        let upload_gallery_image =
            UploadGalleryImage::new(deps.uploader, Arc::clone(&gallery), timeout);
        let beacon = TrackingBeacon::new(
            deps.beacon,
            deps.clock,
            BeaconPolicy::from_config(&config.beacon),
        );
        let badges = BadgePoller::spawn(
            BadgePollerDeps {
                counts: deps.badge_counts,
                auth: Arc::clone(&deps.auth),
                registry: Arc::clone(&registry),
            },
            config.badges.sections.clone(),
            config.badges.poll_interval(),
            timeout,
        );
        ::tracing::info!(
            base_url = %config.api.base_url,
            sections = ?config.badges.sections,
            "admin runtime started"
        );

        Self {
            registry,
            roles: Arc::new(roles),
            collections: Arc::new(collections),
            customers: Arc::new(customers),
            gallery,
            attributes: Arc::new(attributes),
            upload_gallery_image,
            beacon,
            badges,
        }
    }

    /// Stops background work.
    pub async fn shutdown(self) {
        self.badges.shutdown().await;
    }
}

struct Wire<'a> {
    auth: &'a Arc<dyn AuthContextPort>,
    registry: &'a Arc<InvalidationRegistry>,
    timeout: std::time::Duration,
}

impl Wire<'_> {
    fn mutator<T: Entity>(
        &self,
        gateway: Arc<dyn RemoteGatewayPort<T>>,
        sections: &[&str],
    ) -> OptimisticMutator<T> {
        let store = Arc::new(MirrorStore::new(gateway, Arc::clone(self.auth), self.timeout));
        let mutator = OptimisticMutator::new(store);
        if sections.is_empty() {
            mutator
        } else {
            mutator.invalidating(Arc::clone(self.registry), sections.iter().copied())
        }
    }
}
