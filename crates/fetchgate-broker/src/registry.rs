use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use fetchgate_providers::Provider;

use crate::error::BrokerError;

/// Insertion-ordered set of providers keyed by name.
///
/// Readers take a cloned snapshot so no lock is held across an `.await`.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: RwLock<Vec<Arc<dyn Provider>>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Arc<dyn Provider>>> {
        self.providers.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Arc<dyn Provider>>> {
        self.providers.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add(&self, provider: Arc<dyn Provider>) -> Result<(), BrokerError> {
        let mut providers = self.write();
        if providers.iter().any(|existing| existing.name() == provider.name()) {
            return Err(BrokerError::DuplicateProvider(provider.name().to_string()));
        }
        providers.push(provider);
        Ok(())
    }

    pub fn remove(&self, name: &str) -> Option<Arc<dyn Provider>> {
        let mut providers = self.write();
        let position = providers.iter().position(|provider| provider.name() == name)?;
        Some(providers.remove(position))
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.read()
            .iter()
            .find(|provider| provider.name() == name)
            .cloned()
    }

    pub fn list(&self) -> Vec<String> {
        self.read()
            .iter()
            .map(|provider| provider.name().to_string())
            .collect()
    }

    pub fn snapshot(&self) -> Vec<Arc<dyn Provider>> {
        self.read().clone()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.list())
            .finish()
    }
}
