use crate::domain::model::ServiceDescriptor;
use crate::domain::ports::{RawResponse, Transport};
use crate::utils::error::{ConeError, Result};
use crate::utils::validation::validate_positive_number;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 3;
pub const DEFAULT_RETRIES: u32 = 3;

/// Timeout and attempt budget for one query. Fixed once a
/// [`ConeSearch`](crate::core::cone::ConeSearch) is built.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySettings {
    pub timeout: Duration,
    /// Total number of attempts, not additional ones.
    pub retries: u32,
    /// Pause between attempts. Zero means retry immediately.
    pub retry_delay: Duration,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
            retries: DEFAULT_RETRIES,
            retry_delay: Duration::ZERO,
        }
    }
}

impl QuerySettings {
    pub fn validate(&self) -> Result<()> {
        validate_positive_number("query.retries", self.retries as usize, 1)?;
        if self.timeout.is_zero() {
            return Err(ConeError::InvalidConfigValueError {
                field: "query.timeout_seconds".to_string(),
                value: "0".to_string(),
                reason: "Timeout must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

/// GETs `service` with `params`, retrying every failure until the attempt
/// budget is spent. The last failure is returned inside
/// [`ConeError::RetriesExhausted`].
pub async fn try_query(
    transport: &dyn Transport,
    service: &ServiceDescriptor,
    params: &[(&'static str, String)],
    settings: &QuerySettings,
) -> Result<RawResponse> {
    let attempts = settings.retries.max(1);
    let mut attempt = 1;

    loop {
        tracing::debug!(
            "📡 {}: attempt {}/{} with {:?}",
            service.label(),
            attempt,
            attempts,
            params
        );

        match transport
            .get(&service.access_url, params, settings.timeout)
            .await
        {
            Ok(response) => {
                tracing::debug!(
                    "📡 {}: HTTP {} ({} bytes)",
                    service.label(),
                    response.status,
                    response.body.len()
                );
                return Ok(response);
            }
            Err(e) if attempt >= attempts => {
                tracing::warn!(
                    "❌ {}: giving up after {} attempt(s): {}",
                    service.label(),
                    attempts,
                    e
                );
                return Err(ConeError::RetriesExhausted {
                    url: service.access_url.clone(),
                    attempts,
                    last: Box::new(e),
                });
            }
            Err(e) => {
                tracing::warn!(
                    "⚠️ {}: attempt {}/{} failed: {}",
                    service.label(),
                    attempt,
                    attempts,
                    e
                );
                if !settings.retry_delay.is_zero() {
                    tokio::time::sleep(settings.retry_delay).await;
                }
                attempt += 1;
            }
        }
    }
}
