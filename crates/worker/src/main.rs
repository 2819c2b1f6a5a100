use std::sync::Arc;

use locker_worker::{FfmpegExtractor, ThumbnailProcessor, ThumbnailRunner, WorkerConfig};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "locker_worker=debug,locker_storage=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = WorkerConfig::from_env();
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = locker_db::create_pool(&database_url).await?;
    locker_db::health_check(&pool).await?;
    tracing::info!("Database connection established");

    let store = locker_storage::build_store(&config.storage).await?;
    let processor = ThumbnailProcessor::new(pool.clone(), store, Arc::new(FfmpegExtractor));
    let runner =
        ThumbnailRunner::new(pool.clone(), processor).with_poll_interval(config.poll_interval);

    let cancel = CancellationToken::new();
    let handle = tokio::spawn({
        let cancel = cancel.clone();
        async move { runner.run(cancel).await }
    });

    shutdown_signal().await;
    cancel.cancel();
    handle.await?;

    pool.close().await;
    tracing::info!("Worker shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C"),
        _ = terminate => tracing::info!("Received SIGTERM"),
    }
}
