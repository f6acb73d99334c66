use reqwest::header::{ACCEPT, REFERER};
use reqwest::{redirect, StatusCode};
use secrecy::ExposeSecret;
use serde::Serialize;

use super::models::{
    GuestTokenRequest, GuestTokenResponse, GuestUserPayload, LoginRequest, LoginResponse,
};
use crate::config::{Credentials, GuestUser, UpstreamConfig};
use crate::error::{MissingField, RelayError, Result, UpstreamStage};

const LOGIN_PATH: &str = "/api/v1/security/login";
const GUEST_TOKEN_PATH: &str = "/api/v1/security/guest_token/";
const MAX_REDIRECTS: usize = 10;

/// Thin client for the two security endpoints of the dashboard platform.
///
/// Holds a single pooled `reqwest::Client`, so clones are cheap and share
/// connections. No state is kept between calls.
#[derive(Debug, Clone)]
pub struct SupersetClient {
    http: reqwest::Client,
}

impl SupersetClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| RelayError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { http })
    }

    /// Exchanges the service account credentials for an access token.
    pub async fn login(&self, base_url: &str, credentials: &Credentials) -> Result<String> {
        let url = endpoint(base_url, LOGIN_PATH);
        let payload = LoginRequest::database(
            &credentials.username,
            credentials.password.expose_secret(),
        );

        let body = self
            .post_json(UpstreamStage::Login, self.http.post(&url), &url, &payload)
            .await?;

        serde_json::from_str::<LoginResponse>(&body)
            .ok()
            .and_then(|resp| resp.access_token)
            .filter(|token| !token.is_empty())
            .ok_or(RelayError::UpstreamProtocolError(MissingField::AccessToken))
    }

    /// Requests a guest token scoped to a single dashboard.
    pub async fn guest_token(
        &self,
        base_url: &str,
        access_token: &str,
        dashboard_id: &str,
        credentials: &Credentials,
        guest_user: &GuestUser,
    ) -> Result<String> {
        let url = endpoint(base_url, GUEST_TOKEN_PATH);
        let user = GuestUserPayload {
            username: &guest_user.username,
            first_name: &guest_user.first_name,
            last_name: &guest_user.last_name,
        };
        let payload = GuestTokenRequest::for_dashboard(user, dashboard_id);

        let request = self
            .http
            .post(&url)
            .bearer_auth(access_token)
            .header(REFERER, credentials.referer.as_str());

        let body = self
            .post_json(UpstreamStage::GuestToken, request, &url, &payload)
            .await?;

        serde_json::from_str::<GuestTokenResponse>(&body)
            .ok()
            .and_then(|resp| resp.token)
            .filter(|token| !token.is_empty())
            .ok_or(RelayError::UpstreamProtocolError(MissingField::GuestToken))
    }

    /// Sends a JSON body and returns the raw response text of a 200 reply.
    async fn post_json<T: Serialize>(
        &self,
        stage: UpstreamStage,
        request: reqwest::RequestBuilder,
        url: &str,
        payload: &T,
    ) -> Result<String> {
        log::debug!("POST {}", url);

        let response = request
            .header(ACCEPT, "application/json")
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                let detail = error_chain(&e);
                log::error!("{} request failed: {}", stage, detail);
                RelayError::UpstreamUnreachable(detail)
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RelayError::UpstreamUnreachable(error_chain(&e)))?;

        if status != StatusCode::OK {
            log::warn!("{} rejected by upstream with status {}", stage, status);
            return Err(RelayError::UpstreamAuthFailed {
                stage,
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }
}

/// Renders an error with every `source()` below it, so that the root cause
/// (refused connection, DNS, TLS, timeout) reaches the caller.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut detail = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !detail.ends_with(&text) {
            detail.push_str(": ");
            detail.push_str(&text);
        }
        source = cause.source();
    }
    detail
}

/// Joins a caller-supplied base URL with an API path, tolerating trailing slashes.
pub fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}
