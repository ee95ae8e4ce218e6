//! Application management for the engine
//!
//! [`EngineApp`] owns the window, the render context and the per-window
//! state (viewport, camera), loads the startup model, links the built-in
//! shader program and clears the framebuffer every frame.

use crate::config::{ConfigError, EngineConfig};
use crate::core::camera::Camera;
use crate::graphics::{
    build_program, build_program_strict, load_model, GraphicsContext, Model, ModelLoadError,
    ProgramBuild, ProgramError, RenderContext, ShaderError, ShaderStageKind, Viewport,
};
use crate::shaders::{
    BASIC_FRAGMENT_SHADER, BASIC_VERTEX_SHADER, FRAGMENT_ENTRY_POINT, VERTEX_ENTRY_POINT,
};
use crate::windowing::WindowSurface;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use winit::{
    application::ApplicationHandler,
    event::{ElementState, WindowEvent},
    event_loop::ActiveEventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::{WindowAttributes, WindowId},
};

/// Errors that abort engine startup
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("failed to create render context: {0}")]
    Context(String),

    #[error(transparent)]
    Shader(#[from] ShaderError),

    #[error(transparent)]
    Program(#[from] ProgramError),

    #[error(transparent)]
    Model(#[from] ModelLoadError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Main engine application struct that implements ApplicationHandler
pub struct EngineApp {
    /// Main window and its surface
    pub window: Option<WindowSurface>,
    /// Render context (device, queue, shader programs)
    pub render_context: Option<RenderContext>,
    /// Framebuffer size and aspect ratio
    pub viewport: Viewport,
    /// Camera whose projection follows the viewport
    pub camera: Camera,
    /// Program linked from the built-in shader stages
    pub program: Option<ProgramBuild>,
    /// Model loaded at startup, if one was configured
    pub model: Option<Model>,

    // Private fields
    config: EngineConfig,
    failure: Option<EngineError>,
    initialized: bool,
}

impl EngineApp {
    /// Create a new engine app with default configuration
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create a new engine app with custom configuration
    pub fn with_config(config: EngineConfig) -> Self {
        crate::init_logging_with_filter(config.log_filter.as_deref());

        info!("Creating EngineApp with config: {:?}", config);

        Self {
            window: None,
            render_context: None,
            viewport: Viewport::new(),
            camera: Camera::default(),
            program: None,
            model: None,
            config,
            failure: None,
            initialized: false,
        }
    }

    /// Check if the engine is initialized
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// The error that stopped the event loop, if any
    pub fn take_error(&mut self) -> Option<EngineError> {
        self.failure.take()
    }

    /// Initialize the engine (called when event loop is ready)
    pub fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<(), EngineError> {
        if self.initialized {
            return Ok(());
        }

        info!("Initializing EngineApp");

        let (width, height) = self.config.window_size;
        let window_attributes = WindowAttributes::default()
            .with_title(self.config.window_title.clone())
            .with_inner_size(winit::dpi::PhysicalSize::new(width, height));
        let window = Arc::new(event_loop.create_window(window_attributes)?);

        // Create WebGPU instance
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window.clone())?;

        let mut render_context = pollster::block_on(RenderContext::new(instance, Some(&surface)))
            .map_err(|e| EngineError::Context(e.to_string()))?;

        let window_surface = WindowSurface::new(window.clone(), &render_context, surface);
        render_context.set_target_format(window_surface.format());

        let program = self.link_basic_program(&mut render_context)?;

        if let Some(model_file) = self.config.model_file()? {
            let model = load_model(&model_file, &self.config.model_load_options())?;
            self.model = Some(model);
        }

        self.window = Some(window_surface);
        self.render_context = Some(render_context);
        self.program = Some(program);
        self.initialized = true;

        // Set up the viewport before the first frame
        self.handle_resize(window.inner_size());
        window.request_redraw();
        Ok(())
    }

    fn link_basic_program(&self, context: &mut RenderContext) -> Result<ProgramBuild, EngineError> {
        let vertex = context.compile_stage(
            ShaderStageKind::Vertex,
            "Basic Vertex Shader",
            BASIC_VERTEX_SHADER,
            VERTEX_ENTRY_POINT,
        )?;
        let fragment = match context.compile_stage(
            ShaderStageKind::Fragment,
            "Basic Fragment Shader",
            BASIC_FRAGMENT_SHADER,
            FRAGMENT_ENTRY_POINT,
        ) {
            Ok(fragment) => fragment,
            Err(e) => {
                context.delete_stage(vertex);
                return Err(e.into());
            }
        };

        if self.config.strict_shaders {
            let program = build_program_strict(context, vertex, fragment)?;
            Ok(ProgramBuild {
                program,
                link_log: None,
            })
        } else {
            let build = build_program(context, vertex, fragment)?;
            if !build.is_linked() {
                warn!("Continuing with an unlinked GPU program");
            }
            Ok(build)
        }
    }

    fn handle_resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        let (Some(window), Some(context)) = (self.window.as_mut(), self.render_context.as_mut())
        else {
            return;
        };

        window.resize(&context.device, new_size);

        match self.viewport.resize(context, new_size.width, new_size.height) {
            Ok(()) => {
                self.camera.set_aspect_ratio(self.viewport.aspect_ratio());
                let projection = self.camera.projection_matrix();
                debug!(
                    x_scale = projection.x_axis.x,
                    y_scale = projection.y_axis.y,
                    "Projection updated"
                );
                info!(
                    width = new_size.width,
                    height = new_size.height,
                    aspect_ratio = self.viewport.aspect_ratio(),
                    "Window resized"
                );
            }
            Err(e) => debug!("Ignoring resize: {e}"),
        }
    }

    /// Render a frame
    pub fn render_frame(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(window), Some(context)) = (&self.window, &self.render_context) else {
            return;
        };

        // Skip rendering if window is minimized
        if window.is_minimized() {
            return;
        }

        let frame = match window.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                info!("Surface lost or outdated, reconfiguring");
                window.reconfigure(&context.device);
                return;
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                error!("Out of memory while acquiring a frame");
                event_loop.exit();
                return;
            }
            Err(e) => {
                error!(error = ?e, "Render error");
                return;
            }
        };

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let [r, g, b, a] = self.config.clear_color;
        let mut encoder = context.create_command_encoder(Some("Frame Encoder"));
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Clear Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if let Some(rect) = context.viewport() {
                let width = rect.width.min(window.surface_config.width);
                let height = rect.height.min(window.surface_config.height);
                if width > 0 && height > 0 {
                    pass.set_viewport(
                        rect.x as f32,
                        rect.y as f32,
                        width as f32,
                        height as f32,
                        0.0,
                        1.0,
                    );
                }
            }
        }

        context.submit(std::iter::once(encoder.finish()));
        frame.present();
    }
}

impl ApplicationHandler for EngineApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        // Initialize on first resume
        if self.initialized {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            error!("Engine initialization failed: {e}");
            self.failure = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.window.as_ref().map(WindowSurface::id) != Some(window_id) {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                info!("Main window close requested");
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                self.handle_resize(physical_size);
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                info!("Scale factor changed to {}", scale_factor);
                if let Some(window) = &self.window {
                    let new_size = window.window.inner_size();
                    self.handle_resize(new_size);
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed
                    && event.physical_key == PhysicalKey::Code(KeyCode::KeyQ)
                {
                    info!("Quit key pressed");
                    event_loop.exit();
                }
            }
            WindowEvent::RedrawRequested => {
                self.render_frame(event_loop);
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        // Request redraw for continuous rendering
        if let Some(window) = &self.window {
            window.window.request_redraw();
        }
    }
}

/// Builder pattern for EngineApp configuration
pub struct EngineBuilder {
    config: EngineConfig,
}

impl EngineBuilder {
    /// Create a new engine builder
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }

    /// Start from an existing configuration
    pub fn from_config(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Set the window title
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.config.window_title = title.into();
        self
    }

    /// Set the window size
    pub fn window_size(mut self, width: u32, height: u32) -> Self {
        self.config.window_size = (width, height);
        self
    }

    /// Load this OBJ file at startup
    pub fn model(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.model = Some(path.into());
        self
    }

    /// Resolve material libraries against this directory
    pub fn material_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.material_dir = Some(dir.into());
        self
    }

    /// Enable or disable triangulation of polygons
    pub fn triangulate(mut self, triangulate: bool) -> Self {
        self.config.triangulate = triangulate;
        self
    }

    /// Treat shader link failures as fatal
    pub fn strict_shaders(mut self, strict: bool) -> Self {
        self.config.strict_shaders = strict;
        self
    }

    /// Set a custom log filter
    pub fn log_filter(mut self, filter: impl Into<String>) -> Self {
        self.config.log_filter = Some(filter.into());
        self
    }

    /// The configuration built so far
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Build the EngineApp
    pub fn build(self) -> EngineApp {
        EngineApp::with_config(self.config)
    }
}

impl Default for EngineApp {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
