//! Request building, response parsing and the async operations of the
//! Tranco API client.
//!
//! # Design
//! Each endpoint is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`.
//! Both are pure. The async operations (`get_ranks`, `create_list`, ...)
//! run `build_*`, hand the request to the injected [`Transport`], and finish
//! with `parse_*`. Callers that do their own I/O can use the two halves
//! directly.
//!
//! The client is immutable once built and cheap to clone.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;

use crate::config::{ClientConfig, ConfigError, Credentials};
use crate::dates::format_list_date;
use crate::error::{ApiError, DecodeError, Error, ErrorKind, Operation, TransportError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::transport::{CancelToken, ReqwestTransport, Transport};
use crate::types::{Configuration, CreatedList, ListMetadata, Ranks};
use crate::wire::{ApiConfiguration, ApiCreatedList, ApiErrorBody, ApiListMetadata, ApiRanks};

/// Client for the Tranco ranking API.
pub struct TrancoClient<T = ReqwestTransport> {
    base_url: String,
    credentials: Option<Credentials>,
    transport: Arc<T>,
    cancel: Option<CancelToken>,
    call_timeout: Option<Duration>,
}

impl TrancoClient<ReqwestTransport> {
    /// Anonymous client for the production API.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_config(ClientConfig::default())
    }

    /// Authenticated client for the production API.
    pub fn with_credentials(
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        Self::from_config(ClientConfig::default().with_credentials(username, password))
    }

    /// Client using the default transport configured from `config`.
    pub fn from_config(config: ClientConfig) -> Result<Self, ConfigError> {
        let transport = ReqwestTransport::new(config.timeout, &config.user_agent)?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: Transport> TrancoClient<T> {
    /// Client that sends every request through `transport`.
    ///
    /// `config.timeout` and `config.user_agent` only apply to the default
    /// transport and are ignored here.
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credentials: config.credentials,
            transport: Arc::new(transport),
            cancel: None,
            call_timeout: None,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Copy of this client whose calls abort with
    /// `TransportError::Cancelled` once `token` is cancelled.
    pub fn with_cancel(&self, token: CancelToken) -> Self {
        Self {
            cancel: Some(token),
            ..self.clone()
        }
    }

    /// Copy of this client whose calls abort with `TransportError::TimedOut`
    /// when a single call takes longer than `limit`. Requires a tokio runtime.
    pub fn with_call_timeout(&self, limit: Duration) -> Self {
        Self {
            call_timeout: Some(limit),
            ..self.clone()
        }
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// Rank history of `domain`, most recent first.
    pub async fn get_ranks(&self, domain: &str) -> Result<Ranks, Error> {
        let request = self.build_get_ranks(domain)?;
        let response = self.round_trip(Operation::GetRanks, request).await?;
        self.parse_get_ranks(response)
    }

    pub async fn get_list_metadata_by_id(&self, id: &str) -> Result<ListMetadata, Error> {
        let request = self.build_get_list_metadata_by_id(id)?;
        let response = self
            .round_trip(Operation::GetListMetadataById, request)
            .await?;
        self.parse_list_metadata(Operation::GetListMetadataById, response)
    }

    /// Metadata of the daily list for `date`. The date is not range-checked;
    /// the service reports unknown dates as an API error.
    pub async fn get_list_metadata_by_date(&self, date: NaiveDate) -> Result<ListMetadata, Error> {
        let request = self.build_get_list_metadata_by_date(date);
        let response = self
            .round_trip(Operation::GetListMetadataByDate, request)
            .await?;
        self.parse_list_metadata(Operation::GetListMetadataByDate, response)
    }

    /// Check that the configured credentials are accepted.
    pub async fn auth_test(&self) -> Result<(), Error> {
        let request = self.build_auth_test()?;
        let response = self.round_trip(Operation::AuthTest, request).await?;
        self.parse_auth_test(response)
    }

    /// Request generation of a new list.
    pub async fn create_list(&self, configuration: &Configuration) -> Result<CreatedList, Error> {
        let request = self.build_create_list(configuration)?;
        let response = self.round_trip(Operation::CreateList, request).await?;
        self.parse_create_list(response)
    }

    async fn round_trip(
        &self,
        operation: Operation,
        request: HttpRequest,
    ) -> Result<HttpResponse, Error> {
        tracing::debug!(%operation, method = %request.method, url = %request.url, "sending request");
        let response = self
            .send(request)
            .await
            .map_err(|err| Error::new(operation, err))?;
        tracing::debug!(%operation, status = response.status, "received response");
        Ok(response)
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let call = async {
            match self.call_timeout {
                Some(limit) => tokio::time::timeout(limit, self.transport.execute(request))
                    .await
                    .unwrap_or(Err(TransportError::TimedOut)),
                None => self.transport.execute(request).await,
            }
        };
        match &self.cancel {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => Err(TransportError::Cancelled),
                result = call => result,
            },
            None => call.await,
        }
    }

    // -----------------------------------------------------------------------
    // Request builders
    // -----------------------------------------------------------------------

    pub fn build_get_ranks(&self, domain: &str) -> Result<HttpRequest, Error> {
        check_segment("domain", domain).map_err(|kind| Error::new(Operation::GetRanks, kind))?;
        Ok(self.get(&format!("/api/ranks/domain/{domain}")))
    }

    pub fn build_get_list_metadata_by_id(&self, id: &str) -> Result<HttpRequest, Error> {
        check_segment("id", id).map_err(|kind| Error::new(Operation::GetListMetadataById, kind))?;
        Ok(self.get(&format!("/api/lists/id/{id}")))
    }

    pub fn build_get_list_metadata_by_date(&self, date: NaiveDate) -> HttpRequest {
        self.get(&format!("/api/lists/date/{}", format_list_date(date)))
    }

    pub fn build_auth_test(&self) -> Result<HttpRequest, Error> {
        let authorization = self
            .authorization()
            .map_err(|kind| Error::new(Operation::AuthTest, kind))?;
        let mut request = self.get("/api/auth/test");
        request.headers.push(authorization);
        Ok(request)
    }

    pub fn build_create_list(&self, configuration: &Configuration) -> Result<HttpRequest, Error> {
        let authorization = self
            .authorization()
            .map_err(|kind| Error::new(Operation::CreateList, kind))?;
        let body = serde_json::to_string(&ApiConfiguration::from(configuration))
            .map_err(|e| Error::new(Operation::CreateList, ErrorKind::Encode(e)))?;
        Ok(HttpRequest {
            method: HttpMethod::Put,
            url: format!("{}/api/lists/create", self.base_url),
            headers: vec![
                authorization,
                ("content-type".to_string(), "application/json".to_string()),
            ],
            body: Some(body),
        })
    }

    fn get(&self, path: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: format!("{}{path}", self.base_url),
            headers: Vec::new(),
            body: None,
        }
    }

    fn authorization(&self) -> Result<(String, String), ErrorKind> {
        match &self.credentials {
            Some(credentials) if credentials.is_complete() => Ok((
                "authorization".to_string(),
                credentials.basic_auth_header(),
            )),
            _ => Err(ErrorKind::Configuration(
                "username and password are required".to_string(),
            )),
        }
    }

    // -----------------------------------------------------------------------
    // Response parsers
    // -----------------------------------------------------------------------

    pub fn parse_get_ranks(&self, response: HttpResponse) -> Result<Ranks, Error> {
        let wrap = |kind: ErrorKind| Error::new(Operation::GetRanks, kind);
        let api: ApiRanks = decode(response).map_err(wrap)?;
        Ranks::try_from(api).map_err(|e| wrap(e.into()))
    }

    pub fn parse_get_list_metadata_by_id(
        &self,
        response: HttpResponse,
    ) -> Result<ListMetadata, Error> {
        self.parse_list_metadata(Operation::GetListMetadataById, response)
    }

    pub fn parse_get_list_metadata_by_date(
        &self,
        response: HttpResponse,
    ) -> Result<ListMetadata, Error> {
        self.parse_list_metadata(Operation::GetListMetadataByDate, response)
    }

    pub fn parse_auth_test(&self, response: HttpResponse) -> Result<(), Error> {
        check_status(&response).map_err(|kind| Error::new(Operation::AuthTest, kind))
    }

    pub fn parse_create_list(&self, response: HttpResponse) -> Result<CreatedList, Error> {
        let api: ApiCreatedList =
            decode(response).map_err(|kind| Error::new(Operation::CreateList, kind))?;
        Ok(api.into())
    }

    fn parse_list_metadata(
        &self,
        operation: Operation,
        response: HttpResponse,
    ) -> Result<ListMetadata, Error> {
        let wrap = |kind: ErrorKind| Error::new(operation, kind);
        let api: ApiListMetadata = decode(response).map_err(wrap)?;
        ListMetadata::try_from(api).map_err(|e| wrap(e.into()))
    }
}

impl<T> Clone for TrancoClient<T> {
    fn clone(&self) -> Self {
        Self {
            base_url: self.base_url.clone(),
            credentials: self.credentials.clone(),
            transport: Arc::clone(&self.transport),
            cancel: self.cancel.clone(),
            call_timeout: self.call_timeout,
        }
    }
}

impl<T> fmt::Debug for TrancoClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrancoClient")
            .field("base_url", &self.base_url)
            .field("credentials", &self.credentials)
            .field("cancel", &self.cancel)
            .field("call_timeout", &self.call_timeout)
            .finish_non_exhaustive()
    }
}

/// Reject values that would not stay a single path segment once joined
/// into the URL.
fn check_segment(name: &str, value: &str) -> Result<(), ErrorKind> {
    if value.is_empty() {
        return Err(ErrorKind::Validation(format!("{name} must not be empty")));
    }
    if value == "." || value == ".." {
        return Err(ErrorKind::Validation(format!("{name} must not be a dot segment")));
    }
    let forbidden = |c: char| {
        matches!(c, '/' | '?' | '#' | '%' | '\\') || c.is_whitespace() || c.is_control()
    };
    if let Some(c) = value.chars().find(|&c| forbidden(c)) {
        return Err(ErrorKind::Validation(format!(
            "{name} contains {c:?}, which is not allowed in a path segment"
        )));
    }
    Ok(())
}

/// Decode a 2xx body into `W`, or classify the failure.
fn decode<W: DeserializeOwned>(response: HttpResponse) -> Result<W, ErrorKind> {
    check_status(&response)?;
    serde_json::from_slice(&response.body).map_err(|err| {
        tracing::warn!(status = response.status, error = %err, "failed to parse response body");
        ErrorKind::Decode(DecodeError::Json(err))
    })
}

/// Map statuses outside `[200, 300)` to `ApiError`.
fn check_status(response: &HttpResponse) -> Result<(), ErrorKind> {
    if response.is_success() {
        return Ok(());
    }
    Err(ErrorKind::Api(api_error(response)))
}

fn api_error(response: &HttpResponse) -> ApiError {
    match serde_json::from_slice::<ApiErrorBody>(&response.body) {
        Ok(body) => ApiError {
            http_status: response.status,
            code: body.code,
            message: body.message,
        },
        Err(err) => {
            tracing::debug!(
                status = response.status,
                error = %err,
                "error body is not a service error payload"
            );
            ApiError::status_only(response.status)
        }
    }
}
