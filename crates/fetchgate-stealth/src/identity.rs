use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::profiles::{self, BrowserProfile};

/// The request-level fingerprint a provider presents to the target site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserIdentity {
    pub name: String,
    pub user_agent: String,
    pub accept_language: String,
}

impl From<BrowserProfile> for BrowserIdentity {
    fn from(profile: BrowserProfile) -> Self {
        Self {
            name: profile.id.to_string(),
            user_agent: profile.user_agent.to_string(),
            accept_language: profile.accept_language.to_string(),
        }
    }
}

impl Default for BrowserIdentity {
    fn default() -> Self {
        profiles::chrome_120::profile().into()
    }
}

/// Picks one of the bundled profiles at random.
pub fn random_identity() -> BrowserIdentity {
    let all = profiles::all();
    let mut rng = rand::thread_rng();
    all.choose(&mut rng)
        .copied()
        .map(BrowserIdentity::from)
        .unwrap_or_default()
}
