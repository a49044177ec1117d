//! HTTP client adapter.
//!
//! Every request goes through [`HttpClient::send`]: it attaches the persisted
//! bearer token, normalizes failures into [`ApiError`] exactly once, and turns
//! an authorization-denied answer into a forced logout.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::transport::{ApiRequest, Transport};
use crate::{error::ApiError, repository::TokenStore, StateReset};

#[derive(Clone)]
pub struct HttpClient {
    transport: Arc<dyn Transport>,
    tokens: Arc<dyn TokenStore>,
    resets: Arc<Vec<Arc<dyn StateReset>>>,
}

impl HttpClient {
    /// `resets` is the client state wiped on forced logout, in order
    pub fn new(
        transport: Arc<dyn Transport>,
        tokens: Arc<dyn TokenStore>,
        resets: Vec<Arc<dyn StateReset>>,
    ) -> Self {
        Self {
            transport,
            tokens,
            resets: Arc::new(resets),
        }
    }

    /// Send a request and return the body of a 2xx response
    pub async fn send(&self, mut request: ApiRequest) -> Result<Value, ApiError> {
        if request.authenticated {
            request.bearer = match self.tokens.load().await {
                Ok(token) => token,
                Err(e) => {
                    tracing::warn!("Failed to read session token: {}", e);
                    None
                }
            };
        }

        let authenticated = request.bearer.is_some();
        let method = request.method;
        let path = request.path.clone();
        tracing::debug!(?method, %path, authenticated, "Sending request");

        let response = match self.transport.execute(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(?method, %path, "Request failed without a response: {}", e);
                return Err(ApiError::network());
            }
        };

        if (200..300).contains(&response.status) {
            return Ok(response.body);
        }

        let error = ApiError::from_response(response.status, response.body);
        tracing::debug!(?method, %path, status = error.status, kind = %error.kind, "Request rejected");

        // Only a rejected token means the session is gone; a 401 from login is a bad password.
        if error.is_auth() && authenticated {
            tracing::warn!(%path, "Session rejected by the server");
            self.force_logout().await;
        }
        Err(error)
    }

    /// Send and decode a 2xx body
    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let path = request.path.clone();
        let body = self.send(request).await?;
        serde_json::from_value(body).map_err(|e| {
            tracing::warn!(%path, "Failed to decode response: {}", e);
            ApiError::unexpected()
        })
    }

    /// Drop the persisted token, then reset every registered piece of client state.
    ///
    /// The token goes first so nothing retried afterwards can pick it up.
    pub async fn force_logout(&self) {
        tracing::info!("Resetting client state");
        if let Err(e) = self.tokens.clear().await {
            tracing::error!("Failed to clear session token: {}", e);
        }
        for state in self.resets.iter() {
            state.reset();
        }
    }
}
