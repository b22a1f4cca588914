use ash::vk;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GPUError {
    /// A requested extension or layer is absent from the driver's supported set.
    #[error("Required capability {0} is not supported by the driver")]
    MissingCapability(String),
    /// An optional, extension-gated entry point could not be resolved.
    #[error("Driver does not expose {0}")]
    Unsupported(&'static str),
    #[error("Vulkan Error: {0}")]
    DriverError(vk::Result),
    #[error("No Vulkan capable devices were found")]
    NoDevicesFound,
    #[error("No device exposes a queue family with the required capability")]
    NoSuitableDevice,
    #[error("Could not load Vulkan: {0}")]
    LoadingError(#[from] ash::LoadingError),
    #[error("Name {0:?} contains an interior nul byte")]
    InvalidName(String),
    #[error("Window system error: {0}")]
    WindowError(String),
}

impl GPUError {
    /// The raw status code when this error came back from a driver call.
    pub fn code(&self) -> Option<vk::Result> {
        match self {
            GPUError::DriverError(res) => Some(*res),
            _ => None,
        }
    }
}

/// Convenient crate-wide result type.
pub type Result<T, E = GPUError> = std::result::Result<T, E>;

impl From<vk::Result> for GPUError {
    fn from(res: vk::Result) -> Self {
        GPUError::DriverError(res)
    }
}
