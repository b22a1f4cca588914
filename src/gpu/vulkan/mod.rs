//! [`Driver`] implementation over the system Vulkan loader.

use std::ffi::{c_char, CStr, CString};

use ash::vk;

use super::device_selector::DeviceInfo;
use super::diagnostics::ChannelConfig;
use super::driver::{DebugMessengerFns, Driver};
use super::logical::LogicalRequest;
use super::negotiator::CapabilityRequest;
use super::structs::AppInfo;
use super::{GPUError, Result};

#[cfg(feature = "hikari-winit")]
pub mod winit_window;
#[cfg(feature = "hikari-winit")]
pub use winit_window::WinitWindow;

const CREATE_MESSENGER_NAME: &[u8] = b"vkCreateDebugUtilsMessengerEXT\0";
const DESTROY_MESSENGER_NAME: &[u8] = b"vkDestroyDebugUtilsMessengerEXT\0";

fn c_strings(names: &[String]) -> Result<Vec<CString>> {
    names
        .iter()
        .map(|name| CString::new(name.as_str()).map_err(|_| GPUError::InvalidName(name.clone())))
        .collect()
}

fn name_from_raw(raw: &[c_char]) -> String {
    // SAFETY: Vulkan name arrays are nul-terminated within their bounds.
    unsafe { CStr::from_ptr(raw.as_ptr()) }
        .to_string_lossy()
        .into_owned()
}

pub struct AshDriver {
    entry: ash::Entry,
}

impl AshDriver {
    /// Load the Vulkan loader library.
    ///
    /// # Safety
    /// Loading a shared library runs its initialisers. The returned driver
    /// must outlive every object created through it.
    pub unsafe fn load() -> Result<Self> {
        let entry = unsafe { ash::Entry::load() }?;
        Ok(Self { entry })
    }

    pub fn from_entry(entry: ash::Entry) -> Self {
        Self { entry }
    }

    pub fn entry(&self) -> &ash::Entry {
        &self.entry
    }

    /// Resolve an instance-level entry point by name.
    fn instance_proc(&self, instance: vk::Instance, name: &[u8]) -> vk::PFN_vkVoidFunction {
        // SAFETY: `name` is a nul-terminated byte string.
        unsafe {
            self.entry
                .get_instance_proc_addr(instance, name.as_ptr() as *const c_char)
        }
    }
}

impl Driver for AshDriver {
    type Instance = ash::Instance;
    type PhysicalDevice = vk::PhysicalDevice;
    type Device = ash::Device;
    type Queue = vk::Queue;

    fn instance_extension_names(&self) -> Result<Vec<String>> {
        let properties = self.entry.enumerate_instance_extension_properties(None)?;
        Ok(properties
            .iter()
            .map(|prop| name_from_raw(&prop.extension_name))
            .collect())
    }

    fn instance_layer_names(&self) -> Result<Vec<String>> {
        let properties = self.entry.enumerate_instance_layer_properties()?;
        Ok(properties
            .iter()
            .map(|prop| name_from_raw(&prop.layer_name))
            .collect())
    }

    fn create_instance(
        &self,
        app: &AppInfo,
        request: &CapabilityRequest,
        channel: Option<&ChannelConfig>,
    ) -> Result<Self::Instance> {
        let app_name =
            CString::new(app.name.as_str()).map_err(|_| GPUError::InvalidName(app.name.clone()))?;
        let engine_name = CString::new(app.engine_name.as_str())
            .map_err(|_| GPUError::InvalidName(app.engine_name.clone()))?;

        let app_info = vk::ApplicationInfo::builder()
            .application_name(&app_name)
            .application_version(app.version)
            .engine_name(&engine_name)
            .engine_version(app.engine_version)
            .api_version(app.api_version);

        let extensions = c_strings(&request.extensions)?;
        let layers = c_strings(&request.layers)?;
        let extension_ptrs: Vec<*const c_char> = extensions.iter().map(|ext| ext.as_ptr()).collect();
        let layer_ptrs: Vec<*const c_char> = layers.iter().map(|layer| layer.as_ptr()).collect();

        let mut debug_info = channel.map(ChannelConfig::create_info);

        let mut create_info = vk::InstanceCreateInfo::builder()
            .application_info(&app_info)
            .enabled_extension_names(&extension_ptrs)
            .enabled_layer_names(&layer_ptrs);

        if let Some(ref mut debug_info) = debug_info {
            create_info = create_info.push_next(debug_info);
        }

        // SAFETY: every pointer in `create_info` refers to locals that outlive
        // this call.
        let instance = unsafe { self.entry.create_instance(&create_info, None) }?;
        Ok(instance)
    }

    unsafe fn destroy_instance(&self, instance: &Self::Instance) {
        unsafe { instance.destroy_instance(None) };
    }

    fn raw_instance(&self, instance: &Self::Instance) -> vk::Instance {
        instance.handle()
    }

    fn debug_messenger_fns(&self, instance: &Self::Instance) -> Option<DebugMessengerFns> {
        let create = self.instance_proc(instance.handle(), CREATE_MESSENGER_NAME)?;
        let destroy = self.instance_proc(instance.handle(), DESTROY_MESSENGER_NAME)?;

        // SAFETY: the loader returned these for the named commands, so they
        // have the signatures of those commands.
        unsafe {
            Some(DebugMessengerFns {
                create: std::mem::transmute::<
                    unsafe extern "system" fn(),
                    vk::PFN_vkCreateDebugUtilsMessengerEXT,
                >(create),
                destroy: std::mem::transmute::<
                    unsafe extern "system" fn(),
                    vk::PFN_vkDestroyDebugUtilsMessengerEXT,
                >(destroy),
            })
        }
    }

    fn physical_devices(&self, instance: &Self::Instance) -> Result<Vec<Self::PhysicalDevice>> {
        // SAFETY: `instance` is live.
        Ok(unsafe { instance.enumerate_physical_devices() }?)
    }

    fn device_info(&self, instance: &Self::Instance, device: Self::PhysicalDevice) -> DeviceInfo {
        // SAFETY: `device` was enumerated from `instance`.
        unsafe { instance.get_physical_device_properties(device) }.into()
    }

    fn queue_family_flags(
        &self,
        instance: &Self::Instance,
        device: Self::PhysicalDevice,
    ) -> Vec<vk::QueueFlags> {
        // SAFETY: `device` was enumerated from `instance`.
        unsafe { instance.get_physical_device_queue_family_properties(device) }
            .iter()
            .map(|prop| prop.queue_flags)
            .collect()
    }

    fn create_device(
        &self,
        instance: &Self::Instance,
        device: Self::PhysicalDevice,
        request: &LogicalRequest,
    ) -> Result<Self::Device> {
        let layers = c_strings(&request.layers)?;
        let layer_ptrs: Vec<*const c_char> = layers.iter().map(|layer| layer.as_ptr()).collect();

        let queue_infos = [vk::DeviceQueueCreateInfo::builder()
            .queue_family_index(request.queue_family)
            .queue_priorities(&request.queue_priorities)
            .build()];
        let features = vk::PhysicalDeviceFeatures::default();

        let create_info = vk::DeviceCreateInfo::builder()
            .queue_create_infos(&queue_infos)
            .enabled_layer_names(&layer_ptrs)
            .enabled_features(&features);

        // SAFETY: `device` was enumerated from `instance` and `create_info`
        // only points at locals and `request`.
        let logical = unsafe { instance.create_device(device, &create_info, None) }?;
        Ok(logical)
    }

    unsafe fn device_queue(&self, device: &Self::Device, family: u32, index: u32) -> Self::Queue {
        unsafe { device.get_device_queue(family, index) }
    }

    unsafe fn destroy_device(&self, device: &Self::Device) {
        unsafe { device.destroy_device(None) };
    }
}
