use std::time::Duration;

use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::{info, instrument, warn};

use crate::application::ports::RepositoryError;

/// Connects to the job store database. The pipeline often starts alongside
/// its database, so failed attempts are retried with a doubling delay until
/// the configured budget runs out.
#[instrument(skip(url))]
pub async fn create_pool(
    url: &str,
    max_connections: u32,
    connect_retries: u32,
) -> Result<PgPool, RepositoryError> {
    let mut delay = Duration::from_millis(250);
    let mut attempt: u32 = 0;

    loop {
        match PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
        {
            Ok(pool) => {
                info!(attempt, "Job store database pool ready");
                return Ok(pool);
            }
            Err(e) => {
                attempt += 1;
                if attempt > connect_retries {
                    return Err(RepositoryError::ConnectionFailed(e.to_string()));
                }
                warn!(
                    error = %e,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Job store database not reachable yet, will retry"
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
        }
    }
}
