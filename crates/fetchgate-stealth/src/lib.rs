//! Browser identities and timing helpers shared by the HTTP-speaking providers.

pub mod behavioral;
pub mod identity;
pub mod profiles;

pub use behavioral::{backoff_delay_ms, jittered_delay_ms};
pub use identity::{random_identity, BrowserIdentity};
pub use profiles::BrowserProfile;
