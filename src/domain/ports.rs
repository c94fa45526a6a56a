use crate::domain::model::SkyPosition;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// What came back from a service: the final URL (query string included),
/// the status code and the undecoded body.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub url: String,
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// One HTTP GET. Implementations return an error for transport failures,
/// timeouts and non-2xx statuses alike; retrying is the caller's job.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(
        &self,
        url: &str,
        params: &[(&'static str, String)],
        timeout: Duration,
    ) -> Result<RawResponse>;
}

/// Looks up the position of a named object such as `"M31"`.
#[async_trait]
pub trait NameResolver: Send + Sync {
    async fn resolve(&self, name: &str) -> Result<SkyPosition>;
}
