//! Bring-up of a Vulkan context: capability negotiation, the diagnostic
//! channel, device selection and the logical context with its queue.
//!
//! # Examples
//! ```ignore
//! use hikari::gpu::{AshDriver, ContextInfo, GraphicsContext};
//!
//! let driver = unsafe { AshDriver::load()? };
//! let ctx = GraphicsContext::new(driver, &ContextInfo::default(), &[])?;
//! println!("running on {}", ctx.device());
//! ctx.destroy();
//! ```

mod error;
pub use error::*;

pub mod application;
pub use application::{Application, PlatformWindow};
pub mod capabilities;
pub use capabilities::CapabilityRegistry;
pub mod context;
pub use context::GraphicsContext;
pub mod device_selector;
pub use device_selector::*;
pub mod diagnostics;
pub use diagnostics::{ChannelConfig, DiagnosticChannel, DiagnosticMessage};
pub mod driver;
pub use driver::{DebugMessengerFns, Driver};
pub mod logical;
pub use logical::{LogicalContext, LogicalRequest, SubmissionQueue};
pub mod negotiator;
pub use negotiator::{CapabilityRequest, ContextHandle, ValidatedRequest};
pub mod structs;
pub use structs::*;

pub mod vulkan;
pub use vulkan::AshDriver;
#[cfg(feature = "hikari-winit")]
pub use vulkan::WinitWindow;
