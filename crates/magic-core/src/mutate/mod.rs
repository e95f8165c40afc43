//! Image mutation
//!
//! Pulls a base image, appends a layer carrying the credential helpers, their
//! mapping descriptors and a Docker config that selects the magic helper,
//! points the image environment at it and pushes the result.

mod steps;

pub use steps::update_env;

use crate::Result;
use magic_registry::ImageRegistry;
use std::path::PathBuf;
use steps::MutateState;

/// Parameters of one mutation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutateRequest {
    /// Base image reference
    pub source: String,
    /// Where to push the result; defaults to `source`
    pub tag: Option<String>,
    /// Read helper binaries from here instead of the embedded set
    pub helpers_dir: Option<PathBuf>,
    /// Read mapping descriptors from here instead of the embedded set
    pub mappings_dir: Option<PathBuf>,
    /// Helper slugs to install; every supported helper when empty
    pub include_helpers: Vec<String>,
    pub user_agent: Option<String>,
    /// `docker-credential-magic` binary to add; the embedded one when unset
    pub dispatcher_binary: Option<PathBuf>,
}

impl MutateRequest {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Default::default()
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_helpers_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.helpers_dir = Some(dir.into());
        self
    }

    pub fn with_mappings_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.mappings_dir = Some(dir.into());
        self
    }

    pub fn with_include_helpers(mut self, helpers: Vec<String>) -> Self {
        self.include_helpers = helpers;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_dispatcher_binary(mut self, path: impl Into<PathBuf>) -> Self {
        self.dispatcher_binary = Some(path.into());
        self
    }
}

/// Summary of a completed mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutateReport {
    /// Reference the image was pushed to
    pub destination: String,
    /// Helper slugs installed
    pub helpers: Vec<String>,
    /// Absolute paths added to the image, in layer order
    pub files: Vec<String>,
    pub manifest_url: String,
}

/// Runs mutations against a registry
pub struct Mutator<R: ImageRegistry> {
    registry: R,
}

impl<R: ImageRegistry> Mutator<R> {
    pub fn new(registry: R) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Run every step in order; the first failure aborts the mutation
    pub async fn mutate(&self, request: MutateRequest) -> Result<MutateReport> {
        let state = MutateState::default();
        let state = steps::set_destination(&request, state)?;
        let state = steps::set_supported_helpers(&request, state)?;
        let state = steps::set_requested_helpers(&request, state)?;
        let state = steps::pull_base_image(&self.registry, &request, state).await?;
        let state = steps::append_layer(&request, state)?;
        let state = steps::update_config(state)?;
        let state = steps::push_new_image(&self.registry, &request, state).await?;

        tracing::info!("Done.");
        state.into_report()
    }
}
