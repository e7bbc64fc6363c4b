//! REST client for today's distribution endpoints.
//!
//! [`DistributionService`] is the seam the console coordinates against;
//! [`DistributionApiClient`] implements it over HTTP with [`reqwest`].
//! Mutations ask the injected [`TwoFactorProvider`] for a code before
//! every request.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use stakeboard_core::distribution::DistributionStatus;
use stakeboard_core::form::DistributionRequest;
use stakeboard_core::ros_editor::SlotAllocationRequest;
use stakeboard_core::slots::{DistributionSlot, SlotState};

use crate::envelope::{ApiEnvelope, ErrorBody, GENERIC_ERROR_MESSAGE};
use crate::two_factor::{NoTwoFactor, TwoFactorProvider, TWO_FACTOR_HEADER};

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const TODAY_PATH: &str = "/admin/distribution/today";
const TODAY_SLOTS_PATH: &str = "/admin/distribution/today/slots";
const SLOT_SETTINGS_PATH: &str = "/admin/settings/distribution-slots";

/// Acknowledgement returned by a successful mutation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MutationAck {
    pub message: Option<String>,
}

/// Errors from the distribution REST layer.
#[derive(Debug, thiserror::Error)]
pub enum DistributionApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server returned a non-2xx status code.
    #[error("API error ({status}): {}", .message.as_deref().unwrap_or(GENERIC_ERROR_MESSAGE))]
    ApiError { status: u16, message: Option<String> },

    /// The server challenged for a two-factor code.
    #[error("Two-factor authentication required: {0}")]
    TwoFactorRequired(String),

    /// 2xx response with `success: false`.
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// 2xx response without the expected `data` payload.
    #[error("Response did not include {0}")]
    MissingData(&'static str),
}

impl DistributionApiError {
    /// Message suitable for a toast: the server's own text when it sent
    /// one, otherwise [`GENERIC_ERROR_MESSAGE`].
    pub fn user_message(&self) -> String {
        match self {
            Self::ApiError {
                message: Some(message),
                ..
            } => message.clone(),
            Self::TwoFactorRequired(message) | Self::Rejected(message) => message.clone(),
            Self::Request(_) | Self::ApiError { message: None, .. } | Self::MissingData(_) => {
                GENERIC_ERROR_MESSAGE.to_string()
            }
        }
    }
}

/// Typed operations against today's distribution.
#[async_trait]
pub trait DistributionService: Send + Sync {
    async fn get_today_status(&self) -> Result<DistributionStatus, DistributionApiError>;

    async fn queue_distribution(
        &self,
        request: &DistributionRequest,
    ) -> Result<MutationAck, DistributionApiError>;

    async fn modify_distribution(
        &self,
        request: &DistributionRequest,
    ) -> Result<MutationAck, DistributionApiError>;

    async fn cancel_distribution(&self) -> Result<MutationAck, DistributionApiError>;

    /// Slot configuration from platform settings.
    async fn get_distribution_slots(&self) -> Result<Vec<DistributionSlot>, DistributionApiError>;

    /// Runtime status of each slot today.
    async fn get_today_slots(&self) -> Result<Vec<SlotState>, DistributionApiError>;

    async fn update_slot_allocations(
        &self,
        request: &SlotAllocationRequest,
    ) -> Result<MutationAck, DistributionApiError>;
}

/// HTTP implementation of [`DistributionService`].
pub struct DistributionApiClient {
    client: reqwest::Client,
    api_url: String,
    bearer_token: Option<String>,
    two_factor: Arc<dyn TwoFactorProvider>,
}

impl DistributionApiClient {
    /// Create a client for `api_url` (e.g. `http://host:4000/api`) with the
    /// default timeout and no 2FA provider.
    pub fn new(api_url: impl Into<String>) -> Result<Self, DistributionApiError> {
        Self::with_timeout(api_url, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(
        api_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, DistributionApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, api_url))
    }

    /// Reuse an existing [`reqwest::Client`] (shared connection pool).
    pub fn with_client(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            api_url,
            bearer_token: None,
            two_factor: Arc::new(NoTwoFactor),
        }
    }

    /// Attach the admin session token.  Obtaining and refreshing it is the
    /// caller's business.
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Inject the 2FA code provider used for every mutation.
    pub fn with_two_factor(mut self, provider: Arc<dyn TwoFactorProvider>) -> Self {
        self.two_factor = provider;
        self
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    // ---- private helpers ----

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.bearer_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Attach auth and, when the provider has one, the 2FA code.
    async fn sensitive(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let builder = self.authorized(builder);
        match self.two_factor.code().await {
            Some(code) => builder.header(TWO_FACTOR_HEADER, code),
            None => {
                tracing::debug!("No 2FA code available for sensitive request");
                builder
            }
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        what: &'static str,
    ) -> Result<T, DistributionApiError> {
        let response = self.authorized(self.client.get(self.url(path))).send().await?;
        Self::parse_data(response, what).await
    }

    async fn mutate<B: Serialize + ?Sized>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<MutationAck, DistributionApiError> {
        let mut builder = self.client.request(method.clone(), self.url(path));
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let response = self.sensitive(builder).await.send().await?;
        tracing::debug!(%method, path, status = response.status().as_u16(), "Mutation response");
        Self::parse_ack(response).await
    }

    /// Ensure the response has a success status code, mapping failures to
    /// [`DistributionApiError::ApiError`] or a 2FA challenge.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, DistributionApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let raw = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        let body = ErrorBody::parse(&raw);

        if body.requires_2fa {
            return Err(DistributionApiError::TwoFactorRequired(
                body.message()
                    .unwrap_or_else(|| "A two-factor code is required".to_string()),
            ));
        }

        Err(DistributionApiError::ApiError {
            status: status.as_u16(),
            message: body.message(),
        })
    }

    async fn parse_envelope<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<ApiEnvelope<T>, DistributionApiError> {
        let response = Self::ensure_success(response).await?;
        let envelope = response.json::<ApiEnvelope<T>>().await?;
        if !envelope.success {
            return Err(DistributionApiError::Rejected(
                envelope
                    .message
                    .unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string()),
            ));
        }
        Ok(envelope)
    }

    async fn parse_data<T: DeserializeOwned>(
        response: reqwest::Response,
        what: &'static str,
    ) -> Result<T, DistributionApiError> {
        Self::parse_envelope::<T>(response)
            .await?
            .data
            .ok_or(DistributionApiError::MissingData(what))
    }

    async fn parse_ack(response: reqwest::Response) -> Result<MutationAck, DistributionApiError> {
        let envelope = Self::parse_envelope::<serde_json::Value>(response).await?;
        Ok(MutationAck {
            message: envelope.message,
        })
    }
}

#[async_trait]
impl DistributionService for DistributionApiClient {
    async fn get_today_status(&self) -> Result<DistributionStatus, DistributionApiError> {
        self.get(TODAY_PATH, "distribution status").await
    }

    async fn queue_distribution(
        &self,
        request: &DistributionRequest,
    ) -> Result<MutationAck, DistributionApiError> {
        self.mutate(reqwest::Method::POST, TODAY_PATH, Some(request)).await
    }

    async fn modify_distribution(
        &self,
        request: &DistributionRequest,
    ) -> Result<MutationAck, DistributionApiError> {
        self.mutate(reqwest::Method::PUT, TODAY_PATH, Some(request)).await
    }

    async fn cancel_distribution(&self) -> Result<MutationAck, DistributionApiError> {
        self.mutate::<()>(reqwest::Method::DELETE, TODAY_PATH, None).await
    }

    async fn get_distribution_slots(&self) -> Result<Vec<DistributionSlot>, DistributionApiError> {
        self.get(SLOT_SETTINGS_PATH, "distribution slots").await
    }

    async fn get_today_slots(&self) -> Result<Vec<SlotState>, DistributionApiError> {
        self.get(TODAY_SLOTS_PATH, "slot statuses").await
    }

    async fn update_slot_allocations(
        &self,
        request: &SlotAllocationRequest,
    ) -> Result<MutationAck, DistributionApiError> {
        self.mutate(reqwest::Method::PUT, TODAY_SLOTS_PATH, Some(request)).await
    }
}
