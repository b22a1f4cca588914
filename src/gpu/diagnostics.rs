//! Callback-based reporting of driver warnings and errors.
//!
//! The channel is advisory only: the callback always hands `VK_FALSE` back so
//! the call that triggered a message proceeds unchanged.

use std::borrow::Cow;
use std::ffi::{c_void, CStr};
use std::rc::Rc;

use ash::vk;
use bitflags::bitflags;

use super::driver::{DebugMessengerFns, Driver};
use super::negotiator::ContextHandle;
use super::{GPUError, Result};

/// Extension that exposes the diagnostic channel.
pub const DEBUG_UTILS_EXTENSION: &str = "VK_EXT_debug_utils";

const MESSENGER_ENTRY_POINT: &str = "vkCreateDebugUtilsMessengerEXT";

bitflags! {
    #[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DiagnosticSeverity: u32 {
        const VERBOSE = 0x1;
        const INFO    = 0x2;
        const WARNING = 0x4;
        const ERROR   = 0x8;
    }
}

bitflags! {
    #[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DiagnosticCategory: u32 {
        const GENERAL     = 0x1;
        const VALIDATION  = 0x2;
        const PERFORMANCE = 0x4;
    }
}

fn vk_severity_flags(flags: DiagnosticSeverity) -> vk::DebugUtilsMessageSeverityFlagsEXT {
    let mut vk_flags = vk::DebugUtilsMessageSeverityFlagsEXT::empty();
    if flags.contains(DiagnosticSeverity::VERBOSE) {
        vk_flags |= vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE;
    }
    if flags.contains(DiagnosticSeverity::INFO) {
        vk_flags |= vk::DebugUtilsMessageSeverityFlagsEXT::INFO;
    }
    if flags.contains(DiagnosticSeverity::WARNING) {
        vk_flags |= vk::DebugUtilsMessageSeverityFlagsEXT::WARNING;
    }
    if flags.contains(DiagnosticSeverity::ERROR) {
        vk_flags |= vk::DebugUtilsMessageSeverityFlagsEXT::ERROR;
    }
    vk_flags
}

fn vk_category_flags(flags: DiagnosticCategory) -> vk::DebugUtilsMessageTypeFlagsEXT {
    let mut vk_flags = vk::DebugUtilsMessageTypeFlagsEXT::empty();
    if flags.contains(DiagnosticCategory::GENERAL) {
        vk_flags |= vk::DebugUtilsMessageTypeFlagsEXT::GENERAL;
    }
    if flags.contains(DiagnosticCategory::VALIDATION) {
        vk_flags |= vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION;
    }
    if flags.contains(DiagnosticCategory::PERFORMANCE) {
        vk_flags |= vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE;
    }
    vk_flags
}

fn severity_from_vk(flags: vk::DebugUtilsMessageSeverityFlagsEXT) -> DiagnosticSeverity {
    let mut severity = DiagnosticSeverity::empty();
    if flags.contains(vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE) {
        severity |= DiagnosticSeverity::VERBOSE;
    }
    if flags.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
        severity |= DiagnosticSeverity::INFO;
    }
    if flags.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
        severity |= DiagnosticSeverity::WARNING;
    }
    if flags.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        severity |= DiagnosticSeverity::ERROR;
    }
    severity
}

fn category_from_vk(flags: vk::DebugUtilsMessageTypeFlagsEXT) -> DiagnosticCategory {
    let mut category = DiagnosticCategory::empty();
    if flags.contains(vk::DebugUtilsMessageTypeFlagsEXT::GENERAL) {
        category |= DiagnosticCategory::GENERAL;
    }
    if flags.contains(vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION) {
        category |= DiagnosticCategory::VALIDATION;
    }
    if flags.contains(vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE) {
        category |= DiagnosticCategory::PERFORMANCE;
    }
    category
}

/// A decoded driver message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticMessage {
    pub severity: DiagnosticSeverity,
    pub category: DiagnosticCategory,
    pub text: String,
}

impl DiagnosticMessage {
    fn category_label(&self) -> &'static str {
        if self.category.contains(DiagnosticCategory::VALIDATION) {
            "VALIDATION"
        } else if self.category.contains(DiagnosticCategory::PERFORMANCE) {
            "PERFORMANCE"
        } else if self.category.contains(DiagnosticCategory::GENERAL) {
            "GENERAL"
        } else {
            "UNKNOWN"
        }
    }
}

fn report(message: &DiagnosticMessage) {
    let kind = message.category_label();
    if message.severity.contains(DiagnosticSeverity::ERROR) {
        tracing::error!(target: "hikari::diagnostics", "[{}] {}", kind, message.text);
    } else if message.severity.contains(DiagnosticSeverity::WARNING) {
        tracing::warn!(target: "hikari::diagnostics", "[{}] {}", kind, message.text);
    } else if message.severity.contains(DiagnosticSeverity::INFO) {
        tracing::info!(target: "hikari::diagnostics", "[{}] {}", kind, message.text);
    } else {
        tracing::trace!(target: "hikari::diagnostics", "[{}] {}", kind, message.text);
    }
}

unsafe extern "system" fn diagnostic_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _user_data: *mut c_void,
) -> vk::Bool32 {
    // SAFETY: the driver hands us either null or a valid callback payload
    // whose message, when non-null, is a nul-terminated string.
    let text = if p_callback_data.is_null() || unsafe { (*p_callback_data).p_message.is_null() } {
        Cow::Borrowed("")
    } else {
        unsafe { CStr::from_ptr((*p_callback_data).p_message) }.to_string_lossy()
    };

    report(&DiagnosticMessage {
        severity: severity_from_vk(message_severity),
        category: category_from_vk(message_type),
        text: text.into_owned(),
    });

    vk::FALSE
}

/// Which messages the channel asks the driver for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelConfig {
    pub severity: DiagnosticSeverity,
    pub category: DiagnosticCategory,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self::configure()
    }
}

impl ChannelConfig {
    /// Verbose, warning and error messages of every category.
    pub fn configure() -> Self {
        Self {
            severity: DiagnosticSeverity::VERBOSE
                | DiagnosticSeverity::WARNING
                | DiagnosticSeverity::ERROR,
            category: DiagnosticCategory::GENERAL
                | DiagnosticCategory::VALIDATION
                | DiagnosticCategory::PERFORMANCE,
        }
    }

    pub fn create_info(&self) -> vk::DebugUtilsMessengerCreateInfoEXT {
        vk::DebugUtilsMessengerCreateInfoEXT::builder()
            .message_severity(vk_severity_flags(self.severity))
            .message_type(vk_category_flags(self.category))
            .pfn_user_callback(Some(diagnostic_callback))
            .build()
    }
}

struct AttachedChannel<D: Driver> {
    context: Rc<ContextHandle<D>>,
    fns: DebugMessengerFns,
    raw: vk::DebugUtilsMessengerEXT,
}

impl<D: Driver> Drop for AttachedChannel<D> {
    fn drop(&mut self) {
        tracing::debug!("Detaching diagnostic channel {:?}", self.raw);
        let instance = self.context.driver().raw_instance(self.context.raw());
        // SAFETY: the messenger was created from this instance through the
        // same entry point table, and the instance outlives us via `context`.
        unsafe { (self.fns.destroy)(instance, self.raw, std::ptr::null()) };
    }
}

/// A registered diagnostic channel, or the inert stand-in used when
/// diagnostics are off.
pub struct DiagnosticChannel<D: Driver> {
    attached: Option<AttachedChannel<D>>,
}

impl<D: Driver> DiagnosticChannel<D> {
    pub fn disabled() -> Self {
        Self { attached: None }
    }

    /// Register `config` with the driver.
    ///
    /// Fails with [`GPUError::Unsupported`] when the registration entry point
    /// cannot be resolved for this context.
    pub fn attach(context: &Rc<ContextHandle<D>>, config: &ChannelConfig) -> Result<Self> {
        let driver = context.driver();
        let fns = driver
            .debug_messenger_fns(context.raw())
            .ok_or(GPUError::Unsupported(MESSENGER_ENTRY_POINT))?;

        let instance = driver.raw_instance(context.raw());
        let create_info = config.create_info();
        let mut raw = vk::DebugUtilsMessengerEXT::null();
        // SAFETY: `create` was resolved for `instance` and `create_info` is a
        // fully initialised structure with no extension chain.
        unsafe { (fns.create)(instance, &create_info, std::ptr::null(), &mut raw) }.result()?;

        tracing::debug!("Attached diagnostic channel {:?}", raw);
        Ok(Self {
            attached: Some(AttachedChannel {
                context: Rc::clone(context),
                fns,
                raw,
            }),
        })
    }

    pub fn is_active(&self) -> bool {
        self.attached.is_some()
    }

    pub fn raw(&self) -> Option<vk::DebugUtilsMessengerEXT> {
        self.attached.as_ref().map(|channel| channel.raw)
    }

    /// Unregister the channel. Does nothing for a disabled channel.
    pub fn detach(mut self) {
        self.attached.take();
    }
}
