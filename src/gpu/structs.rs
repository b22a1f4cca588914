use ash::vk;
#[cfg(feature = "hikari-serde")]
use serde::{Deserialize, Serialize};

use super::device_selector::SelectionPolicy;

/// Name of the standard Khronos validation layer.
pub const KHRONOS_VALIDATION_LAYER: &str = "VK_LAYER_KHRONOS_validation";

/// Environment variable that overrides [`ContextInfo::diagnostics`] in
/// [`ContextInfo::from_env`].
pub const VALIDATION_ENV_VAR: &str = "HIKARI_VALIDATION";

#[cfg_attr(feature = "hikari-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct AppInfo {
    pub name: String,
    pub engine_name: String,
    pub version: u32,
    pub engine_version: u32,
    pub api_version: u32,
}

impl Default for AppInfo {
    fn default() -> Self {
        Self {
            name: "Hello Triangle".to_string(),
            engine_name: "No Engine".to_string(),
            version: vk::make_api_version(0, 1, 0, 0),
            engine_version: vk::make_api_version(0, 1, 0, 0),
            api_version: vk::API_VERSION_1_0,
        }
    }
}

/// Everything the context bring-up needs to know up front.
///
/// `diagnostics` follows the build profile by default: debug builds ask for
/// validation layers and a diagnostic channel, release builds do not.
#[cfg_attr(feature = "hikari-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone)]
pub struct ContextInfo {
    pub app: AppInfo,
    pub diagnostics: bool,
    pub validation_layers: Vec<String>,
    pub selection: SelectionPolicy,
}

impl Default for ContextInfo {
    fn default() -> Self {
        Self {
            app: Default::default(),
            diagnostics: cfg!(debug_assertions),
            validation_layers: vec![KHRONOS_VALIDATION_LAYER.to_string()],
            selection: SelectionPolicy::FirstMatch,
        }
    }
}

impl ContextInfo {
    /// Defaults, with `diagnostics` taken from `HIKARI_VALIDATION` when set.
    pub fn from_env() -> Self {
        let mut info = Self::default();
        if let Ok(value) = std::env::var(VALIDATION_ENV_VAR) {
            info.diagnostics = value == "1";
        }
        info
    }

    pub fn with_diagnostics(mut self, enabled: bool) -> Self {
        self.diagnostics = enabled;
        self
    }

    pub fn with_selection(mut self, selection: SelectionPolicy) -> Self {
        self.selection = selection;
        self
    }
}

#[cfg_attr(feature = "hikari-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone)]
pub struct WindowInfo {
    pub title: String,
    pub size: [u32; 2],
    pub resizable: bool,
}

impl Default for WindowInfo {
    fn default() -> Self {
        Self {
            title: "Vulkan".to_string(),
            size: [800, 600],
            resizable: false,
        }
    }
}
