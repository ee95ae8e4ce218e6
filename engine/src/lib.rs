//! Scene viewer engine
//!
//! This crate loads Wavefront OBJ models with their materials, links GPU
//! shader programs with readable link diagnostics, and keeps the viewport
//! and camera in sync with the window size.

pub mod app;
pub mod config;
pub mod core;
pub mod graphics;
pub mod shaders;
pub mod windowing;

// Re-export commonly used types
pub mod prelude {
    // Camera types
    pub use crate::core::camera::Camera;

    // Math types
    pub use glam::{Mat3, Mat4, Quat, Vec2, Vec3, Vec4};

    // Model types
    pub use crate::graphics::{
        load_model, Material, Model, ModelFile, ModelLoadError, ModelLoadOptions, Shape,
    };

    // Shader program types
    pub use crate::graphics::{
        build_program, build_program_strict, format_link_log, GpuProgramHandle, GraphicsContext,
        HeadlessContext, ProgramBuild, ProgramError, RenderContext, ShaderStageHandle,
        ShaderStageKind,
    };

    // Graphics types
    pub use crate::graphics::{Mesh, Vertex, Viewport, ViewportError};

    // Config types
    pub use crate::config::{AssetConfig, EngineConfig};

    // App types
    pub use crate::app::{EngineApp, EngineBuilder, EngineError};

    pub use wgpu;
    pub use winit;
}

const DEFAULT_LOG_FILTER: &str = "info,wgpu_core=warn,wgpu_hal=warn";

/// Initialize logging for the engine
///
/// `RUST_LOG` takes precedence over the built-in filter. Calling this more
/// than once keeps the first subscriber.
pub fn init_logging() {
    init_logging_with_filter(None);
}

/// Initialize logging, preferring `filter` over `RUST_LOG` when given
pub fn init_logging_with_filter(filter: Option<&str>) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let env_filter = match filter {
        Some(filter) => EnvFilter::try_new(filter).unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
    };

    // A subscriber may already be installed by the host binary or a test
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
