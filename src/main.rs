use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use tokio::net::TcpListener;

use samtale::application::ports::BlobStore;
use samtale::application::services::{JobScheduler, ProcessingService};
use samtale::infrastructure::audio::AzureSpeechEngine;
use samtale::infrastructure::observability::init_tracing;
use samtale::infrastructure::persistence::{
    PgDirectory, PgJobRepository, PgSessionStore, create_pool,
};
use samtale::infrastructure::storage::AzureBlobStore;
use samtale::presentation::{AppState, Settings, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let settings = Settings::from_env()?;
    init_tracing(&settings.logging.level, settings.logging.json);

    let pool = create_pool(
        &settings.database.url,
        settings.database.max_connections,
        settings.database.connect_retries,
    )
    .await?;

    let job_repository = Arc::new(PgJobRepository::new(pool.clone()));
    let directory = Arc::new(PgDirectory::new(pool.clone()));
    let session_store = Arc::new(PgSessionStore::new(pool));

    let blob_store: Arc<dyn BlobStore> = Arc::new(AzureBlobStore::new(
        &settings.storage.account,
        &settings.storage.access_key,
        &settings.storage.container,
    )?);

    let transcription_engine = Arc::new(AzureSpeechEngine::new(
        &settings.speech.endpoint,
        &settings.speech.api_key,
        &settings.speech.locale,
        settings.speech.poll_interval(),
        Arc::clone(&blob_store),
    ));

    let scheduler = Arc::new(JobScheduler::new(
        job_repository.clone(),
        transcription_engine,
        Arc::clone(&blob_store),
        directory,
        session_store,
    ));

    let processing_service = Arc::new(ProcessingService::new(
        job_repository,
        scheduler,
        settings.jobs.max_retries,
    ));

    let router = create_router(AppState { processing_service });

    let host: IpAddr = settings.server.host.parse()?;
    let addr = SocketAddr::new(host, settings.server.port);
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
