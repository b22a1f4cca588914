use super::context::GraphicsContext;
use super::driver::Driver;
use super::structs::ContextInfo;
use super::Result;

/// The windowing system as seen by the bring-up.
pub trait PlatformWindow {
    /// Instance extensions the platform needs for presenting to this window.
    fn required_extensions(&self) -> Result<Vec<String>>;

    /// Pump pending window events.
    fn poll_events(&mut self);

    fn should_close(&self) -> bool;
}

/// A window and the graphics context created for it.
///
/// The context is declared first so it is released before the window.
pub struct Application<W: PlatformWindow, D: Driver> {
    context: GraphicsContext<D>,
    window: W,
}

impl<W: PlatformWindow, D: Driver> Application<W, D> {
    pub fn new(window: W, driver: D, info: &ContextInfo) -> Result<Self> {
        let extensions = window.required_extensions()?;
        let context = GraphicsContext::new(driver, info, &extensions)?;
        Ok(Self { context, window })
    }

    /// Poll the window until it asks to close.
    pub fn run(&mut self) {
        while !self.window.should_close() {
            self.window.poll_events();
        }
    }

    pub fn context(&self) -> &GraphicsContext<D> {
        &self.context
    }

    pub fn window(&self) -> &W {
        &self.window
    }

    /// Destroy the graphics context, then hand back the window.
    pub fn into_window(self) -> W {
        let Self { context, window } = self;
        context.destroy();
        window
    }
}
