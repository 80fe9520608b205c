use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::infrastructure::{Locator, UiSurface};
use crate::resolver::SemanticResolver;

/// Tries each backend in order; the first hit wins
#[derive(Clone, Default)]
pub struct ResolverChain {
    backends: Vec<Arc<dyn SemanticResolver>>,
}

impl ResolverChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, backend: Arc<dyn SemanticResolver>) -> Self {
        self.backends.push(backend);
        self
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

#[async_trait]
impl SemanticResolver for ResolverChain {
    async fn resolve(&self, surface: &dyn UiSurface, instruction: &str) -> Option<Locator> {
        for (i, backend) in self.backends.iter().enumerate() {
            if let Some(locator) = backend.resolve(surface, instruction).await {
                return Some(locator);
            }
            debug!("resolver #{} missed: {}", i + 1, instruction);
        }
        None
    }
}
