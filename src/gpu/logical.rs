use std::rc::Rc;

use super::device_selector::SelectedDevice;
use super::driver::Driver;
use super::negotiator::ContextHandle;
use super::Result;

/// Priority given to the single requested queue.
pub const QUEUE_PRIORITY: f32 = 1.0;

/// What the logical context is created with.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalRequest {
    pub queue_family: u32,
    pub queue_priorities: Vec<f32>,
    /// Validation layers repeated at device level for drivers that still
    /// read them there. Empty when diagnostics are off.
    pub layers: Vec<String>,
}

impl LogicalRequest {
    pub fn new(queue_family: u32, diagnostics_enabled: bool, validation_layers: &[String]) -> Self {
        Self {
            queue_family,
            queue_priorities: vec![QUEUE_PRIORITY],
            layers: if diagnostics_enabled {
                validation_layers.to_vec()
            } else {
                Vec::new()
            },
        }
    }
}

/// A queue handle borrowed from its [`LogicalContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionQueue<Q> {
    pub family: u32,
    pub index: u32,
    pub raw: Q,
}

pub struct LogicalContext<D: Driver> {
    context: Rc<ContextHandle<D>>,
    raw: D::Device,
    queue: SubmissionQueue<D::Queue>,
}

impl<D: Driver> LogicalContext<D> {
    pub fn create(
        context: &Rc<ContextHandle<D>>,
        selected: &SelectedDevice<D::PhysicalDevice>,
        diagnostics_enabled: bool,
        validation_layers: &[String],
    ) -> Result<Self> {
        let request = LogicalRequest::new(selected.queue_family, diagnostics_enabled, validation_layers);
        let driver = context.driver();
        let raw = driver.create_device(context.raw(), selected.physical, &request)?;
        tracing::debug!(
            "Created logical context on {} using queue family {}",
            selected,
            request.queue_family
        );

        // SAFETY: one queue was requested from this family at creation.
        let queue = unsafe { Self::retrieve_queue(driver, &raw, request.queue_family, 0) };

        Ok(Self {
            context: Rc::clone(context),
            raw,
            queue,
        })
    }

    /// # Safety
    /// `family` must have been requested when `device` was created with at
    /// least `index + 1` queues.
    unsafe fn retrieve_queue(
        driver: &D,
        device: &D::Device,
        family: u32,
        index: u32,
    ) -> SubmissionQueue<D::Queue> {
        SubmissionQueue {
            family,
            index,
            raw: unsafe { driver.device_queue(device, family, index) },
        }
    }

    pub fn queue(&self) -> &SubmissionQueue<D::Queue> {
        &self.queue
    }

    pub fn raw(&self) -> &D::Device {
        &self.raw
    }
}

impl<D: Driver> Drop for LogicalContext<D> {
    fn drop(&mut self) {
        tracing::debug!("Destroying logical context");
        // SAFETY: the queue view lives inside `self` and dies with it.
        unsafe { self.context.driver().destroy_device(&self.raw) };
    }
}
