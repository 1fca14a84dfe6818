mod client;
mod provider;

pub use client::WebDriverClient;
pub use provider::{WebDriverConfig, WebDriverProvider, WEBDRIVER_URL_ENV};
