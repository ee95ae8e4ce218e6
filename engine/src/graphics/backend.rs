//! Graphics context abstraction
//!
//! The program builder, link diagnostics and viewport state only need a
//! small set of primitives from the GPU: allocate and link programs, query
//! their status and log, release stages, and set the viewport rectangle.
//! [`GraphicsContext`] captures that set so the same code runs against the
//! wgpu-backed [`RenderContext`] and the CPU-only [`HeadlessContext`].
//!
//! All methods must be called from the thread that owns the context.
//!
//! [`RenderContext`]: crate::graphics::context::RenderContext
//! [`HeadlessContext`]: crate::graphics::headless::HeadlessContext

use crate::graphics::handles::{GpuProgramHandle, ShaderStageHandle, ShaderStageKind};

/// Errors reported by a graphics context
#[derive(Debug, thiserror::Error)]
pub enum GraphicsError {
    #[error("graphics context ran out of handle identifiers")]
    OutOfHandles,
}

/// Pixel rectangle of the framebuffer that rendering maps onto
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewportRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl ViewportRect {
    /// Rectangle covering `width` x `height` pixels anchored at the origin
    pub const fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }
}

/// Primitives a graphics context exposes for program construction
pub trait GraphicsContext {
    /// Allocate a new, empty program
    fn create_program(&mut self) -> Result<GpuProgramHandle, GraphicsError>;

    /// Attach a compiled stage to a program
    fn attach_stage(&mut self, program: GpuProgramHandle, stage: &ShaderStageHandle);

    /// Link every stage attached to `program`
    fn link_program(&mut self, program: GpuProgramHandle);

    /// Whether the last link of `program` succeeded
    fn link_status(&self, program: GpuProgramHandle) -> bool;

    /// Length of the program's info log in bytes, 0 when there is none
    fn info_log_length(&self, program: GpuProgramHandle) -> usize;

    /// Up to `max_len` bytes of the program's info log
    fn program_info_log(&self, program: GpuProgramHandle, max_len: usize) -> String;

    /// Release a stage; programs already linked against it stay valid
    fn delete_stage(&mut self, stage: ShaderStageHandle);

    /// Release a program
    fn delete_program(&mut self, program: GpuProgramHandle);

    /// Set the framebuffer region rendering maps onto
    fn set_viewport(&mut self, rect: ViewportRect);
}

/// Pick the single vertex and single fragment stage out of the stages
/// attached to a program, or describe why linking cannot proceed
pub(crate) fn select_stages<'a, T>(
    attached: &'a [T],
    kind_of: impl Fn(&T) -> ShaderStageKind,
) -> Result<(&'a T, &'a T), String> {
    let single = |kind: ShaderStageKind| {
        let mut stages = attached.iter().filter(|stage| kind_of(stage) == kind);
        match (stages.next(), stages.next()) {
            (Some(stage), None) => Ok(stage),
            (None, _) => Err(format!("no {kind} stage attached")),
            (Some(_), Some(_)) => Err(format!("more than one {kind} stage attached")),
        }
    };
    Ok((
        single(ShaderStageKind::Vertex)?,
        single(ShaderStageKind::Fragment)?,
    ))
}

/// Truncate `log` to at most `max_len` bytes on a character boundary
pub(crate) fn truncate_log(log: &str, max_len: usize) -> String {
    if log.len() <= max_len {
        return log.to_owned();
    }
    let mut end = max_len;
    while !log.is_char_boundary(end) {
        end -= 1;
    }
    log[..end].to_owned()
}
