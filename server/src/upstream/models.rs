use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub provider: &'a str,
    pub username: &'a str,
    pub password: &'a str,
    pub refresh: bool,
}

impl<'a> LoginRequest<'a> {
    pub fn database(username: &'a str, password: &'a str) -> Self {
        Self {
            provider: "db",
            username,
            password,
            refresh: false,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub access_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GuestTokenRequest<'a> {
    pub user: GuestUserPayload<'a>,
    pub resources: Vec<GuestResource<'a>>,
    /// Must be present and empty; newer platform releases reject the request otherwise.
    pub rls: Vec<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct GuestUserPayload<'a> {
    pub username: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
}

#[derive(Debug, Serialize)]
pub struct GuestResource<'a> {
    #[serde(rename = "type")]
    pub kind: &'a str,
    pub id: &'a str,
}

impl<'a> GuestTokenRequest<'a> {
    pub fn for_dashboard(user: GuestUserPayload<'a>, dashboard_id: &'a str) -> Self {
        Self {
            user,
            resources: vec![GuestResource {
                kind: "dashboard",
                id: dashboard_id,
            }],
            rls: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GuestTokenResponse {
    #[serde(default)]
    pub token: Option<String>,
}
