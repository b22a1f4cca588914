#![allow(dead_code)]

use std::cell::{Cell, RefCell};

use hikari::ash::vk::{self, Handle};
use hikari::gpu::diagnostics::DEBUG_UTILS_EXTENSION;
use hikari::gpu::{
    AppInfo, CapabilityRequest, ChannelConfig, DebugMessengerFns, DeviceInfo, DeviceType, Driver,
    LogicalRequest, PlatformWindow, Result,
};

pub const SURFACE: &str = "VK_KHR_surface";
pub const XLIB_SURFACE: &str = "VK_KHR_xlib_surface";
pub const VALIDATION: &str = "VK_LAYER_KHRONOS_validation";

const MESSENGER_HANDLE: u64 = 0xD1A6;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ListExtensions,
    ListLayers,
    CreateInstance {
        extensions: Vec<String>,
        layers: Vec<String>,
        chained_channel: bool,
    },
    CreateMessenger,
    ListDevices,
    QueueFamilies(usize),
    CreateDevice {
        device: usize,
        request: LogicalRequest,
    },
    GetQueue {
        family: u32,
        index: u32,
    },
    DestroyDevice,
    DestroyMessenger,
    DestroyInstance,
}

thread_local! {
    static CALLS: RefCell<Vec<Call>> = RefCell::new(Vec::new());
    static MESSENGER_STATUS: Cell<vk::Result> = Cell::new(vk::Result::SUCCESS);
}

fn record(call: Call) {
    CALLS.with(|calls| calls.borrow_mut().push(call));
}

/// Drain every call recorded on this thread.
pub fn take_calls() -> Vec<Call> {
    CALLS.with(|calls| std::mem::take(&mut *calls.borrow_mut()))
}

/// Only the destroy calls, in the order they happened.
pub fn teardown_calls(calls: &[Call]) -> Vec<Call> {
    calls
        .iter()
        .filter(|call| {
            matches!(
                call,
                Call::DestroyDevice | Call::DestroyMessenger | Call::DestroyInstance
            )
        })
        .cloned()
        .collect()
}

unsafe extern "system" fn fake_create_messenger(
    _instance: vk::Instance,
    _p_create_info: *const vk::DebugUtilsMessengerCreateInfoEXT,
    _p_allocator: *const vk::AllocationCallbacks,
    p_messenger: *mut vk::DebugUtilsMessengerEXT,
) -> vk::Result {
    record(Call::CreateMessenger);
    let status = MESSENGER_STATUS.with(Cell::get);
    if status == vk::Result::SUCCESS {
        unsafe { *p_messenger = vk::DebugUtilsMessengerEXT::from_raw(MESSENGER_HANDLE) };
    }
    status
}

unsafe extern "system" fn fake_destroy_messenger(
    _instance: vk::Instance,
    messenger: vk::DebugUtilsMessengerEXT,
    _p_allocator: *const vk::AllocationCallbacks,
) {
    if messenger.as_raw() == MESSENGER_HANDLE {
        record(Call::DestroyMessenger);
    }
}

#[derive(Debug, Clone)]
pub struct MockDevice {
    pub name: String,
    pub kind: DeviceType,
    pub queue_families: Vec<vk::QueueFlags>,
}

impl MockDevice {
    pub fn new(name: &str, kind: DeviceType, queue_families: Vec<vk::QueueFlags>) -> Self {
        Self {
            name: name.to_string(),
            kind,
            queue_families,
        }
    }

    pub fn graphics(name: &str) -> Self {
        Self::new(
            name,
            DeviceType::Dedicated,
            vec![vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER],
        )
    }

    pub fn compute_only(name: &str) -> Self {
        Self::new(name, DeviceType::Other, vec![vk::QueueFlags::COMPUTE, vk::QueueFlags::TRANSFER])
    }
}

/// In-memory driver that records every call it receives.
pub struct MockDriver {
    pub extensions: Vec<String>,
    pub layers: Vec<String>,
    pub devices: Vec<MockDevice>,
    pub messenger_available: bool,
    pub messenger_status: vk::Result,
    pub instance_status: vk::Result,
    pub device_status: vk::Result,
}

impl Default for MockDriver {
    fn default() -> Self {
        Self {
            extensions: vec![
                SURFACE.to_string(),
                XLIB_SURFACE.to_string(),
                DEBUG_UTILS_EXTENSION.to_string(),
            ],
            layers: vec![VALIDATION.to_string()],
            devices: vec![MockDevice::graphics("Mock GPU")],
            messenger_available: true,
            messenger_status: vk::Result::SUCCESS,
            instance_status: vk::Result::SUCCESS,
            device_status: vk::Result::SUCCESS,
        }
    }
}

impl MockDriver {
    pub fn with_devices(mut self, devices: Vec<MockDevice>) -> Self {
        self.devices = devices;
        self
    }

    pub fn with_extensions(mut self, extensions: &[&str]) -> Self {
        self.extensions = extensions.iter().map(|ext| ext.to_string()).collect();
        self
    }

    pub fn with_layers(mut self, layers: &[&str]) -> Self {
        self.layers = layers.iter().map(|layer| layer.to_string()).collect();
        self
    }

    pub fn without_messenger(mut self) -> Self {
        self.messenger_available = false;
        self
    }

    pub fn failing_messenger(mut self, status: vk::Result) -> Self {
        self.messenger_status = status;
        self
    }

    pub fn failing_instance(mut self, status: vk::Result) -> Self {
        self.instance_status = status;
        self
    }

    pub fn failing_device(mut self, status: vk::Result) -> Self {
        self.device_status = status;
        self
    }
}

impl Driver for MockDriver {
    type Instance = vk::Instance;
    type PhysicalDevice = usize;
    type Device = vk::Device;
    type Queue = vk::Queue;

    fn instance_extension_names(&self) -> Result<Vec<String>> {
        record(Call::ListExtensions);
        Ok(self.extensions.clone())
    }

    fn instance_layer_names(&self) -> Result<Vec<String>> {
        record(Call::ListLayers);
        Ok(self.layers.clone())
    }

    fn create_instance(
        &self,
        _app: &AppInfo,
        request: &CapabilityRequest,
        channel: Option<&ChannelConfig>,
    ) -> Result<Self::Instance> {
        record(Call::CreateInstance {
            extensions: request.extensions.clone(),
            layers: request.layers.clone(),
            chained_channel: channel.is_some(),
        });
        self.instance_status.result()?;
        Ok(vk::Instance::from_raw(0x1))
    }

    unsafe fn destroy_instance(&self, _instance: &Self::Instance) {
        record(Call::DestroyInstance);
    }

    fn raw_instance(&self, instance: &Self::Instance) -> vk::Instance {
        *instance
    }

    fn debug_messenger_fns(&self, _instance: &Self::Instance) -> Option<DebugMessengerFns> {
        MESSENGER_STATUS.with(|status| status.set(self.messenger_status));
        self.messenger_available.then_some(DebugMessengerFns {
            create: fake_create_messenger,
            destroy: fake_destroy_messenger,
        })
    }

    fn physical_devices(&self, _instance: &Self::Instance) -> Result<Vec<Self::PhysicalDevice>> {
        record(Call::ListDevices);
        Ok((0..self.devices.len()).collect())
    }

    fn device_info(&self, _instance: &Self::Instance, device: Self::PhysicalDevice) -> DeviceInfo {
        let mock = &self.devices[device];
        DeviceInfo {
            name: mock.name.clone(),
            kind: mock.kind,
            driver_version: 1,
            api_version: vk::API_VERSION_1_0,
        }
    }

    fn queue_family_flags(
        &self,
        _instance: &Self::Instance,
        device: Self::PhysicalDevice,
    ) -> Vec<vk::QueueFlags> {
        record(Call::QueueFamilies(device));
        self.devices[device].queue_families.clone()
    }

    fn create_device(
        &self,
        _instance: &Self::Instance,
        device: Self::PhysicalDevice,
        request: &LogicalRequest,
    ) -> Result<Self::Device> {
        record(Call::CreateDevice {
            device,
            request: request.clone(),
        });
        self.device_status.result()?;
        Ok(vk::Device::from_raw(0x10 + device as u64))
    }

    unsafe fn device_queue(&self, _device: &Self::Device, family: u32, index: u32) -> Self::Queue {
        record(Call::GetQueue { family, index });
        vk::Queue::from_raw(0x100 + family as u64)
    }

    unsafe fn destroy_device(&self, _device: &Self::Device) {
        record(Call::DestroyDevice);
    }
}

/// Window stand-in that asks to close after a fixed number of polls.
pub struct MockWindow {
    pub extensions: Vec<String>,
    pub polls: usize,
    pub close_after: usize,
}

impl MockWindow {
    pub fn new(extensions: &[&str], close_after: usize) -> Self {
        Self {
            extensions: extensions.iter().map(|ext| ext.to_string()).collect(),
            polls: 0,
            close_after,
        }
    }
}

impl PlatformWindow for MockWindow {
    fn required_extensions(&self) -> Result<Vec<String>> {
        Ok(self.extensions.clone())
    }

    fn poll_events(&mut self) {
        self.polls += 1;
    }

    fn should_close(&self) -> bool {
        self.polls >= self.close_after
    }
}

pub fn platform_extensions() -> Vec<String> {
    vec![SURFACE.to_string(), XLIB_SURFACE.to_string()]
}
