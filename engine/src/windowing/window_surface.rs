use crate::graphics::RenderContext;
use std::sync::Arc;
use tracing::{debug, info};
use wgpu::{Surface, SurfaceConfiguration};
use winit::dpi::PhysicalSize;
use winit::window::{Window, WindowId};

/// The application window together with the surface it presents to
pub struct WindowSurface {
    pub window: Arc<Window>,
    pub surface: Surface<'static>,
    pub surface_config: SurfaceConfiguration,
}

impl WindowSurface {
    /// Create and configure a surface for `window`
    pub fn new(
        window: Arc<Window>,
        context: &RenderContext,
        surface: Surface<'static>,
    ) -> Self {
        let size = window.inner_size();
        let surface_config =
            context.create_surface_configuration(&surface, size.width.max(1), size.height.max(1));
        surface.configure(&context.device, &surface_config);

        info!(
            window_id = ?window.id(),
            width = surface_config.width,
            height = surface_config.height,
            format = ?surface_config.format,
            "Configured window surface"
        );

        Self {
            window,
            surface,
            surface_config,
        }
    }

    pub fn id(&self) -> WindowId {
        self.window.id()
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.surface_config.format
    }

    /// Reconfigure the surface for a new framebuffer size
    ///
    /// Zero-sized requests (a minimised window) leave the surface as is.
    pub fn resize(&mut self, device: &wgpu::Device, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.surface_config.width = new_size.width;
        self.surface_config.height = new_size.height;
        self.surface.configure(device, &self.surface_config);

        debug!(
            window_id = ?self.window.id(),
            width = new_size.width,
            height = new_size.height,
            "Resized surface"
        );
    }

    /// Reapply the current configuration after the surface was lost
    pub fn reconfigure(&self, device: &wgpu::Device) {
        self.surface.configure(device, &self.surface_config);
    }

    pub fn is_minimized(&self) -> bool {
        let size = self.window.inner_size();
        size.width == 0 || size.height == 0
    }
}
