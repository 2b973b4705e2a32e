use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pagevault_backend_lib::{
    config::Settings,
    router,
    store::{ensure_bootstrap_admin, InMemoryCredentialStore, InMemoryPageStore},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing token secret must abort startup here, before anything binds.
    let settings = Settings::load().or_else(|_| Settings::load_from("config/pagevault.toml"))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(settings.log_level.clone())),
        )
        .init();

    let credentials = Arc::new(InMemoryCredentialStore::new());
    let pages = Arc::new(InMemoryPageStore::new());

    if let Some(bootstrap) = &settings.bootstrap_admin {
        ensure_bootstrap_admin(credentials.as_ref(), bootstrap).await?;
    }

    let bind_addr = settings.bind_addr;
    let state = Arc::new(AppState::new(settings, credentials, pages)?);

    // bound memory for the rate-limit window map
    let _sweeper = state.rate_limiter.clone().spawn_sweeper();

    let app = router::create_router(state);

    let listener = TcpListener::bind(bind_addr).await?;
    info!("listening on {bind_addr}");
    axum::serve(listener, app).await?;

    Ok(())
}
