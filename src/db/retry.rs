use std::future::Future;
use std::time::Duration;

/// Extra attempts after the first failure.
pub const MAX_TRANSIENT_RETRIES: u32 = 2;

/// Connection-class and timeout failures are worth retrying; anything else
/// (including constraint violations) surfaces immediately.
pub fn is_transient(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut => true,
        sqlx::Error::Database(db_error) => db_error
            .code()
            // SQLSTATE class 08 = connection exception
            .map(|code| code.starts_with("08"))
            .unwrap_or(false),
        _ => false,
    }
}

/// Runs a read-path operation, retrying transient failures with linear
/// backoff (250ms * attempt). Multi-statement writes must NOT go through
/// this: retrying a partially applied write is unsafe, their transaction
/// already rolls back on failure.
pub async fn with_transient_retry<T, F, Fut>(operation: F) -> Result<T, sqlx::Error>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, sqlx::Error>>,
{
    let mut attempt: u32 = 0;
    loop {
        match operation().await {
            Err(error) if attempt < MAX_TRANSIENT_RETRIES && is_transient(&error) => {
                attempt += 1;
                let delay = Duration::from_millis(250 * attempt as u64);
                tracing::warn!(attempt, delay_ms = delay.as_millis() as u64, error = %error, "transient database error, retrying");
                tokio::time::sleep(delay).await;
            }
            result => return result,
        }
    }
}
