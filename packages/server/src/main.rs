use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use common::storage::{MediaStore, filesystem::FilesystemMediaStore};
use tracing::info;
use tracing_subscriber::EnvFilter;

use server::chain::AnchorClient;
use server::config::AppConfig;
use server::database::init_db;
use server::events::EventBus;
use server::gateway::{PaymentGateway, razorpay::RazorpayGateway};
use server::state::AppState;
use server::subscribers;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Arc::new(AppConfig::load()?);

    let db = init_db(&config.database.url).await?;

    let gateway: Arc<dyn PaymentGateway> = Arc::new(RazorpayGateway::new(&config.gateway)?);
    let media: Arc<dyn MediaStore> = Arc::new(
        FilesystemMediaStore::new(
            PathBuf::from(&config.storage.media_root),
            config.storage.public_base_url.clone(),
        )
        .await?,
    );

    let state = AppState {
        db,
        config: config.clone(),
        gateway,
        media,
        events: EventBus::default(),
    };

    let anchor_client = AnchorClient::from_config(&config.chain);
    if anchor_client.is_none() {
        info!("Blockchain anchoring disabled (no chain.base_url configured)");
    }
    subscribers::spawn_all(&state, anchor_client);

    let app = server::build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("ApnaGhar backend listening at http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
