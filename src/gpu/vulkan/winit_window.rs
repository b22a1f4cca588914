use std::ffi::CStr;

use raw_window_handle::HasRawDisplayHandle;
use winit::dpi::PhysicalSize;
use winit::event::{Event, WindowEvent};
use winit::event_loop::EventLoop;
use winit::platform::run_return::EventLoopExtRunReturn;
use winit::window::{Window, WindowBuilder};

use crate::gpu::application::PlatformWindow;
use crate::gpu::structs::WindowInfo;
use crate::gpu::{GPUError, Result};

pub struct WinitWindow {
    event_loop: EventLoop<()>,
    window: Window,
    close_requested: bool,
}

impl WinitWindow {
    pub fn new(info: &WindowInfo) -> Result<Self> {
        let event_loop = EventLoop::new();
        let window = WindowBuilder::new()
            .with_title(info.title.clone())
            .with_inner_size(PhysicalSize::new(info.size[0], info.size[1]))
            .with_resizable(info.resizable)
            .build(&event_loop)
            .map_err(|err| GPUError::WindowError(err.to_string()))?;

        Ok(Self {
            event_loop,
            window,
            close_requested: false,
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }
}

impl PlatformWindow for WinitWindow {
    fn required_extensions(&self) -> Result<Vec<String>> {
        let names = ash_window::enumerate_required_extensions(self.window.raw_display_handle())?;
        Ok(names
            .iter()
            // SAFETY: ash-window hands out static nul-terminated names.
            .map(|&name| unsafe { CStr::from_ptr(name) }.to_string_lossy().into_owned())
            .collect())
    }

    fn poll_events(&mut self) {
        let window_id = self.window.id();
        let close_requested = &mut self.close_requested;
        self.event_loop.run_return(|event, _, control_flow| {
            control_flow.set_poll();
            match event {
                Event::WindowEvent {
                    event: WindowEvent::CloseRequested,
                    window_id: id,
                } if id == window_id => {
                    *close_requested = true;
                    control_flow.set_exit();
                }
                Event::MainEventsCleared => control_flow.set_exit(),
                _ => {}
            }
        });
    }

    fn should_close(&self) -> bool {
        self.close_requested
    }
}
