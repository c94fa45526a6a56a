use crate::domain::ports::{RawResponse, Transport};
use crate::utils::error::{ConeError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// [`Transport`] over a shared reqwest client.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(
        &self,
        url: &str,
        params: &[(&'static str, String)],
        timeout: Duration,
    ) -> Result<RawResponse> {
        let mut request = self.client.get(url).timeout(timeout);
        // 無參數時保留 URL 原有的查詢字串
        if !params.is_empty() {
            request = request.query(params);
        }
        let response = request.send().await?;

        let status = response.status();
        let final_url = response.url().to_string();

        if !status.is_success() {
            return Err(ConeError::HttpStatus {
                url: final_url,
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;

        Ok(RawResponse {
            url: final_url,
            status: status.as_u16(),
            body: body.to_vec(),
        })
    }
}
