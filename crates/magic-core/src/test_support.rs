//! Test support utilities for magic-core
//!
//! Provides MockRegistry for exercising the mutation pipeline without a real
//! registry.

use async_trait::async_trait;
use magic_registry::*;
use std::sync::{Arc, Mutex};

/// Records which methods were called on the mock
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    Pull {
        reference: String,
    },
    Push {
        reference: String,
        user_agent: Option<String>,
    },
}

/// Configurable in-memory registry for testing
pub struct MockRegistry {
    pub calls: Arc<Mutex<Vec<MockCall>>>,
    /// Result for pull calls
    pub pull_result: Arc<Mutex<Result<Image>>>,
    /// Result for push calls
    pub push_result: Arc<Mutex<Result<PushedImage>>>,
    /// Every image handed to push, in order
    pub pushed: Arc<Mutex<Vec<Image>>>,
}

impl MockRegistry {
    /// A registry serving an empty image and accepting every push
    pub fn new() -> Self {
        Self::with_image(Image::empty())
    }

    /// A registry serving `image` for every pull
    pub fn with_image(image: Image) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            pull_result: Arc::new(Mutex::new(Ok(image))),
            push_result: Arc::new(Mutex::new(Ok(PushedImage {
                manifest_url: "https://registry.test/v2/mock/manifests/latest".to_string(),
            }))),
            pushed: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Record a call
    fn record(&self, call: MockCall) {
        self.calls.lock().unwrap().push(call);
    }

    /// Get all recorded calls
    pub fn get_calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Last image pushed, if any
    pub fn last_pushed(&self) -> Option<Image> {
        self.pushed.lock().unwrap().last().cloned()
    }
}

impl Default for MockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper to clone a Result<T> from an Arc<Mutex<Result<T>>>
fn clone_result<T: Clone>(r: &Arc<Mutex<Result<T>>>) -> Result<T> {
    let guard = r.lock().unwrap();
    match &*guard {
        Ok(v) => Ok(v.clone()),
        Err(e) => Err(clone_registry_error(e)),
    }
}

/// Clone a RegistryError (thiserror types don't implement Clone)
fn clone_registry_error(e: &RegistryError) -> RegistryError {
    match e {
        RegistryError::InvalidReference { reference, message } => RegistryError::InvalidReference {
            reference: reference.clone(),
            message: message.clone(),
        },
        RegistryError::InvalidConfig(s) => RegistryError::InvalidConfig(s.clone()),
        RegistryError::ImageNotFound(s) => RegistryError::ImageNotFound(s.clone()),
        RegistryError::CredentialHelper { helper, message } => RegistryError::CredentialHelper {
            helper: helper.clone(),
            message: message.clone(),
        },
        other => RegistryError::InvalidConfig(format!("{} (cloned)", other)),
    }
}

#[async_trait]
impl ImageRegistry for MockRegistry {
    async fn pull(&self, reference: &Reference) -> Result<Image> {
        self.record(MockCall::Pull {
            reference: reference.whole(),
        });
        clone_result(&self.pull_result)
    }

    async fn push(
        &self,
        reference: &Reference,
        image: &Image,
        user_agent: Option<&str>,
    ) -> Result<PushedImage> {
        self.record(MockCall::Push {
            reference: reference.whole(),
            user_agent: user_agent.map(str::to_string),
        });
        let result = clone_result(&self.push_result);
        if result.is_ok() {
            self.pushed.lock().unwrap().push(image.clone());
        }
        result
    }
}
