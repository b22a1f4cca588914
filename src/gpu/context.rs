use std::rc::Rc;

use super::capabilities::CapabilityRegistry;
use super::device_selector::{DeviceSelector, SelectedDevice};
use super::diagnostics::{ChannelConfig, DiagnosticChannel};
use super::driver::Driver;
use super::logical::{LogicalContext, SubmissionQueue};
use super::negotiator::{CapabilityRequest, ContextHandle};
use super::structs::ContextInfo;
use super::{GPUError, Result};

/// A driver context with its diagnostic channel, chosen device and logical
/// context.
///
/// Fields drop top to bottom, which is the reverse of acquisition order. The
/// channel and the logical context each keep the context handle alive, so it
/// is always destroyed last.
pub struct GraphicsContext<D: Driver> {
    logical: LogicalContext<D>,
    channel: DiagnosticChannel<D>,
    context: Rc<ContextHandle<D>>,
    device: SelectedDevice<D::PhysicalDevice>,
    registry: CapabilityRegistry,
    diagnostics: bool,
}

impl<D: Driver> GraphicsContext<D> {
    /// Run the whole bring-up. On failure everything acquired so far is
    /// released before the error is returned.
    pub fn new(driver: D, info: &ContextInfo, platform_extensions: &[String]) -> Result<Self> {
        let driver = Rc::new(driver);

        let registry = CapabilityRegistry::query(driver.as_ref())?;
        let request = CapabilityRequest::build(platform_extensions, info.diagnostics, &info.validation_layers)
            .validate(&registry)?;

        let channel_config = info.diagnostics.then(ChannelConfig::configure);
        let context = ContextHandle::create(&driver, &info.app, &request, channel_config.as_ref())?;

        let channel = match channel_config {
            Some(config) => match DiagnosticChannel::attach(&context, &config) {
                Ok(channel) => channel,
                Err(GPUError::Unsupported(entry)) => {
                    tracing::warn!("{} unavailable, continuing without a diagnostic channel", entry);
                    DiagnosticChannel::disabled()
                }
                Err(err) => return Err(err),
            },
            None => DiagnosticChannel::disabled(),
        };

        let device = DeviceSelector::enumerate(context.driver(), context.raw())?.select(&info.selection)?;

        let logical = LogicalContext::create(&context, &device, info.diagnostics, &info.validation_layers)?;

        Ok(Self {
            logical,
            channel,
            context,
            device,
            registry,
            diagnostics: info.diagnostics,
        })
    }

    pub fn driver(&self) -> &D {
        self.context.driver()
    }

    pub fn instance(&self) -> &D::Instance {
        self.context.raw()
    }

    pub fn device(&self) -> &SelectedDevice<D::PhysicalDevice> {
        &self.device
    }

    pub fn logical(&self) -> &LogicalContext<D> {
        &self.logical
    }

    pub fn queue(&self) -> &SubmissionQueue<D::Queue> {
        self.logical.queue()
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    pub fn diagnostics_enabled(&self) -> bool {
        self.diagnostics
    }

    pub fn diagnostic_channel(&self) -> &DiagnosticChannel<D> {
        &self.channel
    }

    /// Tear everything down: logical context, diagnostic channel, then the
    /// driver context.
    pub fn destroy(self) {
        let Self {
            logical,
            channel,
            context,
            ..
        } = self;
        drop(logical);
        channel.detach();
        drop(context);
    }
}
