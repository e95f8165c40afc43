//! Mutation steps
//!
//! Each step takes the state produced by the previous one and returns it with
//! its own part filled in.

use super::{MutateReport, MutateRequest};
use crate::embedded::{is_placeholder, select_asset, AssetSource, EMBEDDED_HELPERS};
use crate::env::{get_env, set_env};
use crate::layer::LayerBuilder;
use crate::mappings::{descriptor_asset, load_supported_helpers, validate_requested, MappingSource};
use crate::{CoreError, Result};
use magic_config::constants::{
    DOCKER_CONFIG_FILE_BASENAME, DOCKER_CONFIG_FILE_CONTENTS, ENV_DOCKER_CONFIG,
    ENV_DOCKER_ORIG_CONFIG, ENV_MAGIC_CONFIG, ENV_PATH, MAGIC_CREDENTIAL_SUFFIX, MAGIC_ROOT_DIR,
};
use magic_config::{
    helper_binary_name, magic_binaries_dir, magic_mappings_dir, mapping_file_name, HelperMapping,
};
use magic_registry::{
    Image, ImageRegistry, Layer, Reference, RegistryError, OCI_LAYER_GZIP_MEDIA_TYPE,
};

/// `created_by` of the history entry for the added layer
const LAYER_CREATED_BY: &str = "docker-credential-magician";

#[derive(Debug, Default)]
pub(super) struct MutateState {
    source: Option<Reference>,
    destination: Option<Reference>,
    supported_helpers: Vec<String>,
    requested_helpers: Vec<String>,
    base_image: Option<Image>,
    new_image: Option<Image>,
    files: Vec<String>,
    manifest_url: Option<String>,
}

impl MutateState {
    pub(super) fn into_report(self) -> Result<MutateReport> {
        let destination = self
            .destination
            .ok_or_else(|| CoreError::InvalidState("destination not set".to_string()))?;
        let manifest_url = self
            .manifest_url
            .ok_or_else(|| CoreError::InvalidState("image not pushed".to_string()))?;
        Ok(MutateReport {
            destination: destination.whole(),
            helpers: self.requested_helpers,
            files: self.files,
            manifest_url,
        })
    }
}

fn parse_reference(reference: &str) -> Result<Reference> {
    magic_registry::parse_reference(reference).map_err(|e| match e {
        RegistryError::InvalidReference { reference, message } => {
            CoreError::ReferenceParse { reference, message }
        }
        other => CoreError::ReferenceParse {
            reference: reference.to_string(),
            message: other.to_string(),
        },
    })
}

/// Parse the source and the destination (the tag, or the source itself)
pub(super) fn set_destination(request: &MutateRequest, mut state: MutateState) -> Result<MutateState> {
    let source = parse_reference(&request.source)?;
    let destination = match request.tag.as_deref() {
        Some(tag) => parse_reference(tag)?,
        None => source.clone(),
    };
    state.source = Some(source);
    state.destination = Some(destination);
    Ok(state)
}

pub(super) fn set_supported_helpers(
    request: &MutateRequest,
    mut state: MutateState,
) -> Result<MutateState> {
    let source = MappingSource::from_override(request.mappings_dir.as_deref());
    state.supported_helpers = load_supported_helpers(&source)?;
    tracing::debug!("Supported helpers: {:?}", state.supported_helpers);
    Ok(state)
}

pub(super) fn set_requested_helpers(
    request: &MutateRequest,
    mut state: MutateState,
) -> Result<MutateState> {
    state.requested_helpers = validate_requested(&request.include_helpers, &state.supported_helpers)?;
    Ok(state)
}

pub(super) async fn pull_base_image<R: ImageRegistry>(
    registry: &R,
    request: &MutateRequest,
    mut state: MutateState,
) -> Result<MutateState> {
    let source = state
        .source
        .clone()
        .ok_or_else(|| CoreError::InvalidState("source not parsed".to_string()))?;
    tracing::info!("Pulling {} ...", request.source);
    let image = registry
        .pull(&source)
        .await
        .map_err(|e| CoreError::Pull {
            reference: request.source.clone(),
            source: e,
        })?;
    state.base_image = Some(image);
    Ok(state)
}

pub(super) fn append_layer(request: &MutateRequest, mut state: MutateState) -> Result<MutateState> {
    let mut image = state
        .base_image
        .clone()
        .ok_or_else(|| CoreError::InvalidState("base image not pulled".to_string()))?;

    let root = MAGIC_ROOT_DIR.trim_start_matches('/');
    let mappings_dir = magic_mappings_dir();
    let binaries_dir = magic_binaries_dir();
    let mut builder = LayerBuilder::new();

    // Descriptors first, learning which helper each one needs
    let source = MappingSource::from_override(request.mappings_dir.as_deref());
    let mut helpers: Vec<String> = Vec::new();
    for slug in &state.requested_helpers {
        let (file, asset) = descriptor_asset(&source, slug)?;
        let contents = asset.read()?;
        let mapping = HelperMapping::parse(&file.file_name, &contents)?;

        let path = format!("{}/{}", mappings_dir.trim_start_matches('/'), mapping_file_name(slug));
        tracing::info!("Adding /{} ({}) ...", path, asset.describe());
        builder.add_file(path, contents);

        if !helpers.contains(&mapping.helper) {
            helpers.push(mapping.helper);
        }
    }

    // Then the helpers, with the dispatcher last
    helpers.retain(|h| h != MAGIC_CREDENTIAL_SUFFIX);
    let dispatcher = helper_binary_name(MAGIC_CREDENTIAL_SUFFIX);
    for helper in &helpers {
        let binary = helper_binary_name(helper);
        let asset = select_asset(
            EMBEDDED_HELPERS,
            request.helpers_dir.as_deref(),
            &binary,
            &[dispatcher.as_str()],
        )?;
        if matches!(asset, AssetSource::Embedded(_)) && is_placeholder(EMBEDDED_HELPERS, &binary) {
            tracing::warn!(
                "{} is not bundled in this build; use --helpers-dir to add the real one",
                binary
            );
        }
        let path = format!("{}/{}", binaries_dir.trim_start_matches('/'), binary);
        tracing::info!("Adding /{} ({}) ...", path, asset.describe());
        builder.add_file(path, asset.read()?);
    }

    let asset = dispatcher_asset(request, &dispatcher)?;
    let path = format!("{}/{}", binaries_dir.trim_start_matches('/'), dispatcher);
    tracing::info!("Adding /{} ({}) ...", path, asset.describe());
    builder.add_file(path, asset.read()?);

    let path = format!("{}/{}", root, DOCKER_CONFIG_FILE_BASENAME);
    tracing::info!("Adding /{} ...", path);
    builder.add_file(path, DOCKER_CONFIG_FILE_CONTENTS.as_bytes().to_vec());

    let layer = builder.build()?;
    tracing::debug!("New layer {} (diff_id {})", layer.digest, layer.diff_id);

    state.files = builder.paths().iter().map(|p| format!("/{}", p)).collect();
    image.config.append_layer(&layer.diff_id, LAYER_CREATED_BY);
    image.layers.push(Layer {
        data: layer.data,
        media_type: OCI_LAYER_GZIP_MEDIA_TYPE.to_string(),
    });
    state.new_image = Some(image);
    Ok(state)
}

/// The dispatcher binary: the requested file, else the embedded one.
/// `helpers_dir` never replaces it and a stand-in is never shipped.
fn dispatcher_asset(request: &MutateRequest, dispatcher: &str) -> Result<AssetSource> {
    if let Some(path) = &request.dispatcher_binary {
        return Ok(AssetSource::File(path.clone()));
    }
    if is_placeholder(EMBEDDED_HELPERS, dispatcher) {
        return Err(CoreError::DispatcherUnavailable);
    }
    select_asset(
        EMBEDDED_HELPERS,
        request.helpers_dir.as_deref(),
        dispatcher,
        &[dispatcher],
    )
}

pub(super) fn update_config(mut state: MutateState) -> Result<MutateState> {
    let image = state
        .new_image
        .as_mut()
        .ok_or_else(|| CoreError::InvalidState("layer not appended".to_string()))?;

    let mut config = image.config.clone();
    let mut env = config.env();
    update_env(&mut env);
    config.set_env(env);
    image.config = config;
    Ok(state)
}

/// Point an image environment at `/opt/magic`.
///
/// Applying it to its own output changes nothing.
pub fn update_env(env: &mut Vec<String>) {
    let bin_dir = magic_binaries_dir();

    let path = match get_env(env, ENV_PATH) {
        Some((_, existing)) if existing == bin_dir || existing.starts_with(&format!("{}:", bin_dir)) => {
            None
        }
        Some((_, existing)) if !existing.is_empty() => Some(format!("{}:{}", bin_dir, existing)),
        _ => Some(bin_dir.clone()),
    };
    if let Some(path) = path {
        tracing::info!("Prepending {} with {} ...", ENV_PATH, bin_dir);
        set_env(env, ENV_PATH, &path);
    }

    let existing_config = get_env(env, ENV_DOCKER_CONFIG)
        .map(|(_, v)| v.to_string())
        .filter(|v| !v.is_empty() && v != MAGIC_ROOT_DIR);
    if let Some(existing) = existing_config {
        tracing::info!(
            "Existing {} detected ({}), setting {} ...",
            ENV_DOCKER_CONFIG,
            existing,
            ENV_DOCKER_ORIG_CONFIG
        );
        set_env(env, ENV_DOCKER_ORIG_CONFIG, &existing);
    }

    tracing::info!("Setting {} to {} ...", ENV_DOCKER_CONFIG, MAGIC_ROOT_DIR);
    set_env(env, ENV_DOCKER_CONFIG, MAGIC_ROOT_DIR);

    tracing::info!("Setting {} to {} ...", ENV_MAGIC_CONFIG, MAGIC_ROOT_DIR);
    set_env(env, ENV_MAGIC_CONFIG, MAGIC_ROOT_DIR);
}

pub(super) async fn push_new_image<R: ImageRegistry>(
    registry: &R,
    request: &MutateRequest,
    mut state: MutateState,
) -> Result<MutateState> {
    let destination = state
        .destination
        .as_ref()
        .ok_or_else(|| CoreError::InvalidState("destination not set".to_string()))?;
    let image = state
        .new_image
        .as_ref()
        .ok_or_else(|| CoreError::InvalidState("image not built".to_string()))?;

    tracing::info!("Pushing image to {} ...", destination);
    let pushed = registry
        .push(destination, image, request.user_agent.as_deref())
        .await
        .map_err(|e| CoreError::Push {
            reference: destination.whole(),
            source: e,
        })?;
    state.manifest_url = Some(pushed.manifest_url);
    Ok(state)
}
