//! Building, checking and submitting the context creation request.

use std::ops::Deref;
use std::rc::Rc;

use super::capabilities::CapabilityRegistry;
use super::diagnostics::{ChannelConfig, DEBUG_UTILS_EXTENSION};
use super::driver::Driver;
use super::structs::AppInfo;
use super::{GPUError, Result};

/// Extensions and layers asked for at context creation, in request order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CapabilityRequest {
    pub extensions: Vec<String>,
    pub layers: Vec<String>,
}

/// A [`CapabilityRequest`] that passed [`validate`] against a registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest(CapabilityRequest);

impl Deref for ValidatedRequest {
    type Target = CapabilityRequest;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl CapabilityRequest {
    /// Platform extensions first, then the diagnostic extension and layers
    /// when diagnostics are on.
    pub fn build(
        required_platform_extensions: &[String],
        diagnostics_enabled: bool,
        validation_layers: &[String],
    ) -> Self {
        let mut extensions = required_platform_extensions.to_vec();
        let mut layers = Vec::new();
        if diagnostics_enabled {
            extensions.push(DEBUG_UTILS_EXTENSION.to_string());
            layers.extend_from_slice(validation_layers);
        }
        Self { extensions, layers }
    }

    pub fn validate(self, registry: &CapabilityRegistry) -> Result<ValidatedRequest> {
        validate(&self, registry)?;
        Ok(ValidatedRequest(self))
    }
}

/// Succeeds iff every requested extension and layer is supported.
///
/// Extensions are checked in request order and the first unsupported one is
/// reported. Layers are all-or-nothing.
pub fn validate(request: &CapabilityRequest, registry: &CapabilityRegistry) -> Result<()> {
    if let Some(missing) = request
        .extensions
        .iter()
        .find(|name| !registry.supports_extension(name))
    {
        tracing::error!("required vulkan extension {} is not supported", missing);
        return Err(GPUError::MissingCapability(missing.clone()));
    }

    if !request.layers.is_empty() && !all_layers_supported(&request.layers, registry) {
        let missing = request
            .layers
            .iter()
            .find(|name| !registry.supports_layer(name))
            .cloned()
            .unwrap_or_default();
        tracing::error!("validation layers requested, but {} is not available", missing);
        return Err(GPUError::MissingCapability(missing));
    }

    Ok(())
}

pub fn all_layers_supported(layers: &[String], registry: &CapabilityRegistry) -> bool {
    layers.iter().all(|layer| registry.supports_layer(layer))
}

/// The process-wide driver context. Destroyed when the last holder drops.
pub struct ContextHandle<D: Driver> {
    driver: Rc<D>,
    raw: D::Instance,
}

impl<D: Driver> ContextHandle<D> {
    /// Submit a validated request. When `channel` is set its configuration
    /// rides along on the same creation call.
    pub fn create(
        driver: &Rc<D>,
        app: &AppInfo,
        request: &ValidatedRequest,
        channel: Option<&ChannelConfig>,
    ) -> Result<Rc<Self>> {
        let raw = driver.create_instance(app, request, channel)?;
        tracing::debug!(
            "Created context for {:?} with {} extensions and {} layers",
            app.name,
            request.extensions.len(),
            request.layers.len()
        );
        Ok(Rc::new(Self {
            driver: Rc::clone(driver),
            raw,
        }))
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn raw(&self) -> &D::Instance {
        &self.raw
    }
}

impl<D: Driver> Drop for ContextHandle<D> {
    fn drop(&mut self) {
        tracing::debug!("Destroying context");
        // SAFETY: children hold an `Rc` to this handle, so reaching drop means
        // none of them are alive.
        unsafe { self.driver.destroy_instance(&self.raw) };
    }
}
