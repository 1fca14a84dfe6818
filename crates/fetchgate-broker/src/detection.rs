use fetchgate_providers::FetchOptions;

/// URL fragments that usually indicate a client-rendered application.
pub const DEFAULT_SPA_TOKENS: &[&str] = &["react", "angular", "vue", "spa", "app.", "dashboard", "admin"];

/// Decides whether a request needs a script-executing provider.
pub trait ScriptDetector: Send + Sync {
    fn requires_javascript(&self, url: &str, options: &FetchOptions) -> bool;
}

/// Wait hints in the options, or a known single-page-app token in the URL.
///
/// Purely lexical, so both false positives ("spa" in "space") and false
/// negatives are expected.
#[derive(Debug, Clone)]
pub struct UrlHeuristicDetector {
    tokens: Vec<String>,
}

impl Default for UrlHeuristicDetector {
    fn default() -> Self {
        Self::with_tokens(DEFAULT_SPA_TOKENS.iter().map(|token| token.to_string()))
    }
}

impl UrlHeuristicDetector {
    pub fn with_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            tokens: tokens
                .into_iter()
                .map(|token| token.as_ref().trim().to_ascii_lowercase())
                .filter(|token| !token.is_empty())
                .collect(),
        }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }
}

impl ScriptDetector for UrlHeuristicDetector {
    fn requires_javascript(&self, url: &str, options: &FetchOptions) -> bool {
        if options.wait_for_selector.is_some() || options.wait_for_network {
            return true;
        }
        let lower = url.to_ascii_lowercase();
        self.tokens.iter().any(|token| lower.contains(token.as_str()))
    }
}
