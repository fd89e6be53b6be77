use thiserror::Error;

#[derive(Error, Debug)]
pub enum WikibaseError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("API error {code}: {info}")]
    Api { code: String, info: String },
    #[error("login failed: {0}")]
    Login(String),
    #[error("no edit token; log in first")]
    NotLoggedIn,
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unexpected API response: {0}")]
    UnexpectedResponse(String),
}
