use std::collections::HashSet;

use super::driver::Driver;
use super::Result;

/// Instance extensions and layers the driver reports, queried once.
#[derive(Debug, Default, Clone)]
pub struct CapabilityRegistry {
    extensions: HashSet<String>,
    layers: HashSet<String>,
}

impl CapabilityRegistry {
    pub fn query<D: Driver>(driver: &D) -> Result<Self> {
        let extensions = Self::query_supported_extensions(driver)?;
        let layers = Self::query_supported_layers(driver)?;
        Ok(Self { extensions, layers })
    }

    pub fn query_supported_extensions<D: Driver>(driver: &D) -> Result<HashSet<String>> {
        let names = driver.instance_extension_names()?;
        tracing::info!("available extensions: {}", names.len());
        for name in &names {
            tracing::info!("\t{}", name);
        }
        Ok(names.into_iter().collect())
    }

    pub fn query_supported_layers<D: Driver>(driver: &D) -> Result<HashSet<String>> {
        let names = driver.instance_layer_names()?;
        tracing::debug!("available layers: {:?}", names);
        Ok(names.into_iter().collect())
    }

    /// Build a registry from known sets without asking a driver.
    pub fn from_names<E, L>(extensions: E, layers: L) -> Self
    where
        E: IntoIterator,
        E::Item: Into<String>,
        L: IntoIterator,
        L::Item: Into<String>,
    {
        Self {
            extensions: extensions.into_iter().map(Into::into).collect(),
            layers: layers.into_iter().map(Into::into).collect(),
        }
    }

    pub fn supports_extension(&self, name: &str) -> bool {
        self.extensions.contains(name)
    }

    pub fn supports_layer(&self, name: &str) -> bool {
        self.layers.contains(name)
    }

    pub fn extensions(&self) -> &HashSet<String> {
        &self.extensions
    }

    pub fn layers(&self) -> &HashSet<String> {
        &self.layers
    }
}
