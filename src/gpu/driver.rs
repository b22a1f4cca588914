//! The boundary between the bring-up pipeline and the native driver.
//!
//! Every call the pipeline makes into Vulkan goes through [`Driver`]. The
//! production implementation is [`AshDriver`](super::vulkan::AshDriver); the
//! handle types are associated so a recording driver can stand in for it.

use ash::vk;

use super::device_selector::DeviceInfo;
use super::diagnostics::ChannelConfig;
use super::logical::LogicalRequest;
use super::negotiator::CapabilityRequest;
use super::structs::AppInfo;
use super::Result;

/// Entry points of `VK_EXT_debug_utils` resolved through
/// `vkGetInstanceProcAddr`.
#[derive(Clone, Copy)]
pub struct DebugMessengerFns {
    pub create: vk::PFN_vkCreateDebugUtilsMessengerEXT,
    pub destroy: vk::PFN_vkDestroyDebugUtilsMessengerEXT,
}

impl std::fmt::Debug for DebugMessengerFns {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebugMessengerFns").finish_non_exhaustive()
    }
}

pub trait Driver {
    type Instance;
    type PhysicalDevice: Copy;
    type Device;
    type Queue: Copy;

    /// Names of every instance extension the driver supports.
    fn instance_extension_names(&self) -> Result<Vec<String>>;

    /// Names of every instance layer the driver supports.
    fn instance_layer_names(&self) -> Result<Vec<String>>;

    /// Create the context. When `channel` is set its configuration is chained
    /// onto the creation call so messages emitted during creation are seen.
    fn create_instance(
        &self,
        app: &AppInfo,
        request: &CapabilityRequest,
        channel: Option<&ChannelConfig>,
    ) -> Result<Self::Instance>;

    /// # Safety
    /// Every object derived from `instance` must already be destroyed.
    unsafe fn destroy_instance(&self, instance: &Self::Instance);

    fn raw_instance(&self, instance: &Self::Instance) -> vk::Instance;

    /// Resolve the diagnostic registration entry points, if the driver has them.
    fn debug_messenger_fns(&self, instance: &Self::Instance) -> Option<DebugMessengerFns>;

    fn physical_devices(&self, instance: &Self::Instance) -> Result<Vec<Self::PhysicalDevice>>;

    fn device_info(&self, instance: &Self::Instance, device: Self::PhysicalDevice) -> DeviceInfo;

    /// Capability flags of each queue family, in driver order.
    fn queue_family_flags(
        &self,
        instance: &Self::Instance,
        device: Self::PhysicalDevice,
    ) -> Vec<vk::QueueFlags>;

    fn create_device(
        &self,
        instance: &Self::Instance,
        device: Self::PhysicalDevice,
        request: &LogicalRequest,
    ) -> Result<Self::Device>;

    /// # Safety
    /// `family` and `index` must name a queue requested at device creation.
    unsafe fn device_queue(&self, device: &Self::Device, family: u32, index: u32) -> Self::Queue;

    /// # Safety
    /// No queue retrieved from `device` may be used afterwards.
    unsafe fn destroy_device(&self, device: &Self::Device);
}
