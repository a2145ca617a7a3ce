use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dreamy_dl::server::{ApiServer, ApiServerConfig, AppState};
use relay::{HttpByteSource, StreamOrchestrator, TranscodePipeline, YtDlp};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dreamy_dl=debug,relay=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let metadata = YtDlp::from_env().map_err(std::io::Error::other)?;
    let pipeline = TranscodePipeline::from_env().map_err(std::io::Error::other)?;
    let orchestrator = StreamOrchestrator::new(
        Arc::new(metadata),
        HttpByteSource::new(reqwest::Client::new()),
        pipeline,
    );

    let config = ApiServerConfig::from_env_or_default();
    let server = ApiServer::new(config, AppState::new(Arc::new(orchestrator)));

    let cancel_token = server.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel_token.cancel();
        }
    });

    server.run().await
}
