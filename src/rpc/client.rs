use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use super::{RpcError, RpcReply, RpcRequest, RPC_PATH};

/// Why a call to the authentication service produced no result.
#[derive(Debug, thiserror::Error)]
pub enum CallError {
    /// The service answered with a structured domain error.
    #[error("remote error: {0}")]
    Remote(RpcError),
    #[error("authentication service timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed reply: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for CallError {
    fn from(err: reqwest::Error) -> Self {
        match err {
            err if err.is_timeout() => CallError::Timeout,
            err if err.is_decode() => CallError::Malformed(err.to_string()),
            err => CallError::Transport(err.to_string()),
        }
    }
}

/// Synchronous request/reply client the gateway uses to reach the authentication service.
#[derive(Clone)]
pub struct AuthClient {
    http: reqwest::Client,
    endpoint: String,
}

impl AuthClient {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), RPC_PATH),
        })
    }

    /// Sends `cmd` with `payload` and waits for the reply or the client timeout.
    pub async fn send<P>(&self, cmd: &str, payload: &P) -> Result<serde_json::Value, CallError>
    where
        P: Serialize + ?Sized,
    {
        let data = serde_json::to_value(payload)
            .map_err(|e| CallError::Transport(format!("encode {} payload: {}", cmd, e)))?;

        let response = self
            .http
            .post(&self.endpoint)
            .json(&RpcRequest::new(cmd, data))
            .send()
            .await?;

        let http_status = response.status();
        if !http_status.is_success() {
            return Err(CallError::Malformed(format!(
                "{} answered HTTP {}",
                cmd, http_status
            )));
        }

        match response.json::<RpcReply>().await? {
            RpcReply::Ok(body) => {
                debug!(cmd, "rpc ok");
                Ok(body)
            }
            RpcReply::Err(err) => {
                debug!(cmd, status = err.status, "rpc error reply");
                Err(CallError::Remote(err))
            }
        }
    }
}
