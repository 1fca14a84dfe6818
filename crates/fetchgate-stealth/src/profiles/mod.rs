pub mod chrome_120;
pub mod firefox_121;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrowserProfile {
    pub id: &'static str,
    pub user_agent: &'static str,
    pub platform: &'static str,
    pub accept_language: &'static str,
}

/// Every bundled profile, in a stable order.
pub fn all() -> [BrowserProfile; 2] {
    [chrome_120::profile(), firefox_121::profile()]
}
