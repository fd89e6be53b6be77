//! Authenticated connection to a Wikibase `api.php` endpoint.

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::WikibaseError;

const USER_AGENT: &str = concat!("top500-importer/", env!("CARGO_PKG_VERSION"));

#[derive(Deserialize)]
struct TokenResponse {
    query: TokenQuery,
}

#[derive(Deserialize)]
struct TokenQuery {
    tokens: Tokens,
}

#[derive(Deserialize)]
struct Tokens {
    logintoken: Option<String>,
    csrftoken: Option<String>,
}

#[derive(Deserialize)]
struct LoginResponse {
    login: LoginResult,
}

#[derive(Deserialize)]
struct LoginResult {
    result: String,
    reason: Option<String>,
}

/// One logged-in bot session. Created once per process and shared by
/// everything that talks to the knowledge base.
pub struct Session {
    client: reqwest::Client,
    api_url: String,
    csrf: Option<String>,
}

impl Session {
    /// Session against `api_url` (`https://www.wikidata.org/w/api.php`).
    /// Cookies are kept so the login survives across requests.
    pub fn new(api_url: &str) -> Result<Self, WikibaseError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            csrf: None,
        })
    }

    /// HTTP client carrying the session cookies.
    pub fn http(&self) -> reqwest::Client {
        self.client.clone()
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn is_logged_in(&self) -> bool {
        self.csrf.is_some()
    }

    /// Bot-password login followed by a CSRF token fetch.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<(), WikibaseError> {
        info!(api = %self.api_url, user = %username, "logging in");
        let tokens: TokenResponse =
            serde_json::from_value(self.get(&[("action", "query"), ("meta", "tokens"), ("type", "login")]).await?)?;
        let login_token = tokens
            .query
            .tokens
            .logintoken
            .ok_or_else(|| WikibaseError::UnexpectedResponse("no login token".into()))?;

        let resp: LoginResponse = serde_json::from_value(
            self.post(&[
                ("action", "login"),
                ("lgname", username),
                ("lgpassword", password),
                ("lgtoken", login_token.as_str()),
            ])
            .await?,
        )?;
        if resp.login.result != "Success" {
            return Err(WikibaseError::Login(
                resp.login.reason.unwrap_or(resp.login.result),
            ));
        }

        let tokens: TokenResponse =
            serde_json::from_value(self.get(&[("action", "query"), ("meta", "tokens")]).await?)?;
        let csrf = tokens
            .query
            .tokens
            .csrftoken
            .ok_or_else(|| WikibaseError::UnexpectedResponse("no csrf token".into()))?;
        self.csrf = Some(csrf);
        info!(user = %username, "logged in");
        Ok(())
    }

    pub async fn logout(&mut self) -> Result<(), WikibaseError> {
        if !self.is_logged_in() {
            return Ok(());
        }
        self.post_with_token(&[("action", "logout")]).await?;
        self.csrf = None;
        info!("logged out");
        Ok(())
    }

    pub(crate) async fn get(&self, params: &[(&str, &str)]) -> Result<Value, WikibaseError> {
        debug!(params = ?params, "api get");
        let req = self
            .client
            .get(&self.api_url)
            .query(&[("format", "json"), ("formatversion", "2")])
            .query(params);
        send(req).await
    }

    pub(crate) async fn post(&self, params: &[(&str, &str)]) -> Result<Value, WikibaseError> {
        debug!(action = ?params.first(), "api post");
        let req = self
            .client
            .post(&self.api_url)
            .query(&[("format", "json"), ("formatversion", "2")])
            .form(params);
        send(req).await
    }

    /// POST with the session's CSRF token appended.
    pub(crate) async fn post_with_token(&self, params: &[(&str, &str)]) -> Result<Value, WikibaseError> {
        let token = self.csrf.as_deref().ok_or(WikibaseError::NotLoggedIn)?;
        let mut params = params.to_vec();
        params.push(("token", token));
        self.post(&params).await
    }
}

async fn send(req: reqwest::RequestBuilder) -> Result<Value, WikibaseError> {
    let resp = req.send().await?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(WikibaseError::Server {
            status: status.as_u16(),
            body,
        });
    }
    check_api_error(resp.json().await?)
}

/// Turn an `{"error": {"code", "info"}}` body into [`WikibaseError::Api`].
pub(crate) fn check_api_error(body: Value) -> Result<Value, WikibaseError> {
    match body.get("error") {
        Some(err) => Err(WikibaseError::Api {
            code: err["code"].as_str().unwrap_or("unknown").to_string(),
            info: err["info"].as_str().unwrap_or_default().to_string(),
        }),
        None => Ok(body),
    }
}
