//! OCI distribution registry implementation

use crate::docker_auth::resolve_registry_auth;
use crate::types::{Image, ImageConfig, Layer, PushedImage, ACCEPTED_LAYER_MEDIA_TYPES};
use crate::{ImageRegistry, RegistryError, Result};
use async_trait::async_trait;
use oci_client::client::{ClientConfig, ClientProtocol, Config, ImageLayer};
use oci_client::errors::OciDistributionError;
use oci_client::manifest::OciImageManifest;
use oci_client::{Client, Reference};
use std::collections::HashMap;
use std::sync::Mutex;

/// Registries that are always reached over plain HTTP
const LOCAL_REGISTRIES: &[&str] = &["localhost", "127.0.0.1", "[::1]"];

/// Settings for registry access
#[derive(Debug, Clone, Default)]
pub struct RegistrySettings {
    /// Registries (host[:port]) reached over plain HTTP
    pub insecure: Vec<String>,
}

/// Registry client speaking the OCI distribution protocol.
///
/// One `oci_client::Client` is built per registry and user agent and reused,
/// so tokens obtained during a pull serve the following push.
pub struct OciRegistry {
    settings: RegistrySettings,
    clients: Mutex<HashMap<(String, Option<String>), Client>>,
}

impl OciRegistry {
    pub fn new(settings: RegistrySettings) -> Self {
        Self {
            settings,
            clients: Mutex::new(HashMap::new()),
        }
    }

    fn client_for(&self, reference: &Reference, user_agent: Option<&str>) -> Result<Client> {
        let registry = reference.resolve_registry().to_string();
        let key = (registry, user_agent.map(str::to_string));

        let mut clients = self
            .clients
            .lock()
            .map_err(|_| RegistryError::InvalidConfig("registry client cache poisoned".to_string()))?;
        let client = clients
            .entry(key)
            .or_insert_with_key(|(registry, user_agent)| {
                self.build_client(registry, user_agent.as_deref())
            });
        Ok(client.clone())
    }

    fn build_client(&self, registry: &str, user_agent: Option<&str>) -> Client {
        let mut insecure = self.settings.insecure.clone();
        if is_local_registry(registry) && !insecure.iter().any(|r| r == registry) {
            insecure.push(registry.to_string());
        }
        tracing::debug!("New client for {} (plain HTTP: {:?})", registry, insecure);

        let mut config = ClientConfig {
            protocol: ClientProtocol::HttpsExcept(insecure),
            ..Default::default()
        };
        if let Some(user_agent) = user_agent {
            // ClientConfig only takes a 'static user agent
            config.user_agent = Box::leak(user_agent.to_string().into_boxed_str());
        }
        Client::new(config)
    }
}

/// Whether `registry` (host[:port]) is a loopback registry
fn is_local_registry(registry: &str) -> bool {
    let host = if registry.starts_with('[') {
        registry
            .split_once(']')
            .map(|(h, _)| &registry[..=h.len()])
            .unwrap_or(registry)
    } else {
        registry.split(':').next().unwrap_or(registry)
    };
    LOCAL_REGISTRIES.contains(&host)
}

#[async_trait]
impl ImageRegistry for OciRegistry {
    async fn pull(&self, reference: &Reference) -> Result<Image> {
        let client = self.client_for(reference, None)?;
        let auth = resolve_registry_auth(reference.resolve_registry());

        tracing::debug!("Pulling {} from {}", reference, reference.resolve_registry());
        let data = client
            .pull(reference, &auth, ACCEPTED_LAYER_MEDIA_TYPES.to_vec())
            .await
            .map_err(|e| match e {
                OciDistributionError::ImageManifestNotFoundError(_) => {
                    RegistryError::ImageNotFound(reference.whole())
                }
                other => RegistryError::Oci(other),
            })?;

        let config = ImageConfig::from_bytes(&data.config.data)?;
        let layers = data
            .layers
            .into_iter()
            .map(|layer| Layer {
                data: layer.data.to_vec(),
                media_type: layer.media_type,
            })
            .collect::<Vec<_>>();

        tracing::debug!("Pulled {} with {} layer(s)", reference, layers.len());
        Ok(Image { config, layers })
    }

    async fn push(
        &self,
        reference: &Reference,
        image: &Image,
        user_agent: Option<&str>,
    ) -> Result<PushedImage> {
        let client = self.client_for(reference, user_agent)?;
        let auth = resolve_registry_auth(reference.resolve_registry());

        let layers: Vec<ImageLayer> = image
            .layers
            .iter()
            .map(|layer| ImageLayer::new(layer.data.clone(), layer.media_type.clone(), None))
            .collect();
        let config = Config::oci_v1(image.config.to_bytes()?, None);
        let manifest = OciImageManifest::build(&layers, &config, None);

        tracing::debug!("Pushing {} with {} layer(s)", reference, layers.len());
        let response = client
            .push(reference, &layers, config, &auth, Some(manifest))
            .await?;

        Ok(PushedImage {
            manifest_url: response.manifest_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_local_registry() {
        assert!(is_local_registry("localhost"));
        assert!(is_local_registry("localhost:5000"));
        assert!(is_local_registry("127.0.0.1:5000"));
        assert!(is_local_registry("[::1]:5000"));
        assert!(!is_local_registry("ghcr.io"));
        assert!(!is_local_registry("localhost.example.com"));
        assert!(!is_local_registry("index.docker.io"));
    }

    #[test]
    fn test_clients_are_reused_per_registry_and_user_agent() {
        let registry = OciRegistry::new(RegistrySettings::default());
        let app = Reference::try_from("registry.test/app:1.0").unwrap();
        let other = Reference::try_from("registry.test/other:2.0").unwrap();
        let elsewhere = Reference::try_from("ghcr.io/me/app:1.0").unwrap();

        registry.client_for(&app, None).unwrap();
        registry.client_for(&other, None).unwrap();
        assert_eq!(registry.clients.lock().unwrap().len(), 1);

        registry.client_for(&app, Some("ci/1.0")).unwrap();
        registry.client_for(&other, Some("ci/1.0")).unwrap();
        registry.client_for(&elsewhere, None).unwrap();
        assert_eq!(registry.clients.lock().unwrap().len(), 3);
    }
}
