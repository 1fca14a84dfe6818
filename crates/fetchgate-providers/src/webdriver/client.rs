use std::time::Duration;

use reqwest::{Client, Method, Url};
use serde_json::{json, Value};

use crate::error::ProviderError;

const STATUS_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Minimal W3C WebDriver wire client.
#[derive(Debug, Clone)]
pub struct WebDriverClient {
    http: Client,
    base: Url,
}

#[derive(Debug)]
enum WireError {
    Transport(ProviderError),
    Command { error: String, message: String },
}

impl From<ProviderError> for WireError {
    fn from(error: ProviderError) -> Self {
        WireError::Transport(error)
    }
}

impl From<reqwest::Error> for WireError {
    fn from(error: reqwest::Error) -> Self {
        WireError::Transport(error.into())
    }
}

impl From<WireError> for ProviderError {
    fn from(error: WireError) -> Self {
        match error {
            WireError::Transport(error) => error,
            WireError::Command { error, message } => {
                ProviderError::Unreachable(format!("webdriver {error}: {message}"))
            }
        }
    }
}

impl WebDriverClient {
    pub fn new(base: &str) -> Result<Self, ProviderError> {
        let trimmed = base.trim();
        let normalized = if trimmed.ends_with('/') {
            trimmed.to_string()
        } else {
            format!("{trimmed}/")
        };
        let base = Url::parse(&normalized)
            .map_err(|error| ProviderError::Misconfigured(format!("webdriver endpoint `{trimmed}`: {error}")))?;
        let http = Client::builder().build()?;
        Ok(Self { http, base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    async fn command(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value, WireError> {
        let url = self
            .base
            .join(path)
            .map_err(|error| ProviderError::Misconfigured(format!("webdriver path `{path}`: {error}")))?;
        let mut request = self.http.request(method, url);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await?;
        let status = response.status();
        let payload: Value = response.json().await?;
        let value = payload.get("value").cloned().unwrap_or(Value::Null);

        if status.is_success() {
            return Ok(value);
        }
        Err(WireError::Command {
            error: value
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string(),
            message: value
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        })
    }

    /// `GET /status`; true when the remote end reports it can create sessions.
    pub async fn ready(&self) -> Result<bool, ProviderError> {
        let url = self
            .base
            .join("status")
            .map_err(|error| ProviderError::Misconfigured(error.to_string()))?;
        let payload: Value = self
            .http
            .get(url)
            .timeout(STATUS_PROBE_TIMEOUT)
            .send()
            .await?
            .json()
            .await?;
        Ok(payload
            .pointer("/value/ready")
            .and_then(Value::as_bool)
            .unwrap_or(false))
    }

    pub async fn new_session(&self, always_match: &Value) -> Result<String, ProviderError> {
        let value = self
            .command(
                Method::POST,
                "session",
                Some(json!({ "capabilities": { "alwaysMatch": always_match } })),
            )
            .await?;
        value
            .get("sessionId")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ProviderError::InvalidResponse("new session reply has no sessionId".into()))
    }

    pub async fn set_page_load_timeout(&self, session: &str, timeout_ms: u64) -> Result<(), ProviderError> {
        self.command(
            Method::POST,
            &format!("session/{session}/timeouts"),
            Some(json!({ "pageLoad": timeout_ms })),
        )
        .await?;
        Ok(())
    }

    pub async fn navigate(&self, session: &str, url: &str) -> Result<(), ProviderError> {
        self.command(
            Method::POST,
            &format!("session/{session}/url"),
            Some(json!({ "url": url })),
        )
        .await?;
        Ok(())
    }

    /// Whether `selector` currently matches an element.
    pub async fn has_element(&self, session: &str, selector: &str) -> Result<bool, ProviderError> {
        let result = self
            .command(
                Method::POST,
                &format!("session/{session}/element"),
                Some(json!({ "using": "css selector", "value": selector })),
            )
            .await;
        match result {
            Ok(_) => Ok(true),
            Err(WireError::Command { error, .. }) if error == "no such element" => Ok(false),
            Err(error) => Err(error.into()),
        }
    }

    pub async fn source(&self, session: &str) -> Result<String, ProviderError> {
        let value = self
            .command(Method::GET, &format!("session/{session}/source"), None)
            .await?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ProviderError::InvalidResponse("page source is not a string".into()))
    }

    pub async fn current_url(&self, session: &str) -> Result<String, ProviderError> {
        let value = self
            .command(Method::GET, &format!("session/{session}/url"), None)
            .await?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ProviderError::InvalidResponse("current url is not a string".into()))
    }

    pub async fn delete_session(&self, session: &str) -> Result<(), ProviderError> {
        self.command(Method::DELETE, &format!("session/{session}"), None)
            .await?;
        Ok(())
    }
}
