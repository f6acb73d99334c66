use actix_web::http::Method;
use serde::Deserialize;
use url::Url;

use crate::config::{Credentials, GuestUser, RelayConfig};
use crate::error::{RelayError, Result};
use crate::upstream::SupersetClient;

const WITHHELD_BODY: &str = "upstream error body withheld";

/// Form fields submitted by the embedding page.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct GuestTokenForm {
    #[serde(default)]
    pub superset_url: String,
    #[serde(default)]
    pub dashboard_uuid: String,
}

/// Request parameters that passed validation, trimmed.
#[derive(Debug, PartialEq, Eq)]
pub struct ValidatedRequest<'a> {
    pub base_url: &'a str,
    pub dashboard_id: &'a str,
    /// Host part of `base_url`, safe to log (no userinfo).
    pub host: String,
}

/// Exchanges the configured service account for a dashboard-scoped guest token.
#[derive(Debug, Clone)]
pub struct TokenRelay {
    credentials: Credentials,
    guest_user: GuestUser,
    expose_error_body: bool,
    client: SupersetClient,
}

impl TokenRelay {
    pub fn new(config: &RelayConfig, client: SupersetClient) -> Self {
        Self {
            credentials: config.credentials.clone(),
            guest_user: config.guest_user.clone(),
            expose_error_body: config.upstream.expose_error_body,
            client,
        }
    }

    pub fn from_config(config: &RelayConfig) -> Result<Self> {
        let client = SupersetClient::new(&config.upstream)?;
        Ok(Self::new(config, client))
    }

    /// Checks the request in order: method, presence of both fields, URL shape.
    pub fn validate<'a>(method: &Method, form: &'a GuestTokenForm) -> Result<ValidatedRequest<'a>> {
        if *method != Method::POST {
            return Err(RelayError::MethodNotAllowed);
        }

        let base_url = form.superset_url.trim();
        if base_url.is_empty() {
            return Err(RelayError::MissingParameter("Superset URL"));
        }

        let dashboard_id = form.dashboard_uuid.trim();
        if dashboard_id.is_empty() {
            return Err(RelayError::MissingParameter("Dashboard UUID"));
        }

        let host = http_host(base_url).ok_or(RelayError::InvalidParameter)?;

        Ok(ValidatedRequest {
            base_url,
            dashboard_id,
            host,
        })
    }

    pub async fn handle(&self, method: &Method, form: &GuestTokenForm) -> Result<String> {
        let request = Self::validate(method, form)?;

        let access_token = self
            .client
            .login(request.base_url, &self.credentials)
            .await
            .map_err(|e| self.redact(e))?;

        let token = self
            .client
            .guest_token(
                request.base_url,
                &access_token,
                request.dashboard_id,
                &self.credentials,
                &self.guest_user,
            )
            .await
            .map_err(|e| self.redact(e))?;

        log::info!(
            "Issued guest token for dashboard {} via {}",
            request.dashboard_id,
            request.host
        );

        Ok(token)
    }

    fn redact(&self, err: RelayError) -> RelayError {
        match err {
            RelayError::UpstreamAuthFailed {
                stage,
                status,
                body,
            } if !self.expose_error_body => {
                log::warn!("{} upstream error body ({}): {}", stage, status, body);
                RelayError::UpstreamAuthFailed {
                    stage,
                    status,
                    body: WITHHELD_BODY.to_string(),
                }
            }
            other => other,
        }
    }
}

/// Host of an absolute http(s) URL, or `None` when the URL is not one.
fn http_host(candidate: &str) -> Option<String> {
    let url = Url::parse(candidate).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.host_str()
        .filter(|host| !host.is_empty())
        .map(str::to_owned)
}
