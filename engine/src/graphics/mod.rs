//! Graphics module
//!
//! Provides model loading, shader program construction, viewport state,
//! and the graphics contexts they run against.

pub mod backend;
pub mod context;
pub mod diagnostics;
pub mod handles;
pub mod headless;
pub mod mesh;
pub mod model;
pub mod model_loader;
pub mod program;
pub mod viewport;

// Re-export commonly used types
pub use backend::{GraphicsContext, GraphicsError, ViewportRect};
pub use context::{RenderContext, ShaderError};
pub use diagnostics::format_link_log;
pub use handles::{GpuProgramHandle, ShaderStageHandle, ShaderStageKind};
pub use headless::HeadlessContext;
pub use mesh::{Mesh, Vertex};
pub use model::{GeometryAttributes, Material, Model, ModelFile, Shape};
pub use model_loader::{load_model, ModelLoadError, ModelLoadOptions};
pub use program::{build_program, build_program_strict, ProgramBuild, ProgramError};
pub use viewport::{Viewport, ViewportError};
