use fetchgate_stealth::{random_identity, BrowserIdentity};
use reqwest::header::{ACCEPT_LANGUAGE, LOCATION, USER_AGENT};
use reqwest::redirect::Policy;
use reqwest::{Client, RequestBuilder, Url};

use crate::error::ProviderError;
use crate::types::{FetchOptions, Page};

pub const MAX_REDIRECTS: u32 = 10;

/// Shared HTTP plumbing for the providers that talk plain HTTP.
///
/// Redirects are followed by hand so the hop count can be reported.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    identity: BrowserIdentity,
}

impl HttpFetcher {
    pub fn new(identity: BrowserIdentity) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .cookie_store(true)
            .redirect(Policy::none())
            .build()?;
        Ok(Self { client, identity })
    }

    /// Identity for one request: a random profile under stealth, else the default.
    pub fn identity_for(&self, options: &FetchOptions) -> BrowserIdentity {
        if options.stealth {
            random_identity()
        } else {
            self.identity.clone()
        }
    }

    fn request(&self, url: Url, identity: &BrowserIdentity, options: &FetchOptions) -> RequestBuilder {
        let user_agent = options
            .user_agent
            .as_deref()
            .unwrap_or(identity.user_agent.as_str());
        let mut builder = self
            .client
            .get(url)
            .header(USER_AGENT, user_agent)
            .header(ACCEPT_LANGUAGE, identity.accept_language.as_str());
        for (name, value) in &options.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder
    }

    /// GETs `url`, following up to [`MAX_REDIRECTS`] hops.
    pub async fn get(&self, url: Url, options: &FetchOptions) -> Result<Page, ProviderError> {
        let identity = self.identity_for(options);
        let mut current = url;
        let mut redirects = 0_u32;

        loop {
            let response = self.request(current.clone(), &identity, options).send().await?;
            let status = response.status();

            if status.is_redirection() {
                let location = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|value| value.to_str().ok())
                    .map(str::to_string);
                if let Some(location) = location {
                    if redirects >= MAX_REDIRECTS {
                        return Err(ProviderError::InvalidResponse(format!(
                            "more than {MAX_REDIRECTS} redirects"
                        )));
                    }
                    current = current.join(&location).map_err(|error| {
                        ProviderError::InvalidResponse(format!("bad redirect target `{location}`: {error}"))
                    })?;
                    redirects += 1;
                    tracing::trace!(target: "fetchgate_providers", to = %current, redirects, "following redirect");
                    continue;
                }
            }

            let html = response.text().await?;
            return Ok(Page {
                html,
                status: status.as_u16(),
                final_url: current.to_string(),
                redirects,
                headers: options.headers.clone(),
                user_agent: Some(
                    options
                        .user_agent
                        .clone()
                        .unwrap_or_else(|| identity.user_agent.clone()),
                ),
            });
        }
    }
}

pub fn parse_url(url: &str) -> Result<Url, ProviderError> {
    Url::parse(url).map_err(|error| ProviderError::InvalidUrl(format!("`{url}`: {error}")))
}
