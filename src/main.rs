use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use sa_core::ports::AuthStatus;
use sa_core::{AppConfig, Entity, FilterSortDescriptor, UserId};
use sa_infra::StaticAuthContext;
use storefront_admin::bootstrap::wiring::AdminDeps;
use storefront_admin::{init_tracing_subscriber, load_config, AdminRuntime};

/// Usage: `storefront-admin [config.toml] [search]`
///
/// Loads the role collection from the configured backend and prints the
/// derived view sorted by title.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let config = match args.next().map(PathBuf::from) {
        Some(path) => load_config(&path)?,
        None => AppConfig::default(),
    };
    let search = args.next().unwrap_or_default();

    init_tracing_subscriber(&config.logging).context("Failed to initialize tracing")?;

    let auth = Arc::new(StaticAuthContext::new(match std::env::var("ADMIN_USER_ID") {
        Ok(user_id) => AuthStatus::Authenticated {
            user_id: UserId::from(user_id),
        },
        Err(_) => AuthStatus::Unauthenticated,
    }));
    let runtime = AdminRuntime::start(AdminDeps::http(&config, auth)?, &config);

    let store = runtime.roles.store();
    let loaded = store.load().await;
    if let Err(err) = &loaded {
        tracing::error!(error = %err, "failed to load roles");
    }

    let mut descriptor = FilterSortDescriptor::searching(search);
    descriptor.toggle_sort("title");
    for role in store.view(&descriptor) {
        println!("{}\t{}\t{}", role.id(), role.title, role.routes.join(","));
    }

    runtime.shutdown().await;
    loaded.map(|_| ()).context("roles could not be loaded")
}
