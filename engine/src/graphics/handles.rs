//! Opaque handles to GPU shader stages and programs
//!
//! Handles are plain identifiers allocated by a [`GraphicsContext`]. A stage
//! handle is move-only: passing it to the program builder gives up the
//! caller's ownership of the stage.
//!
//! [`GraphicsContext`]: crate::graphics::backend::GraphicsContext

use std::fmt;
use std::num::NonZeroU32;

/// Pipeline stage a compiled shader belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStageKind {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStageKind::Vertex => write!(f, "vertex"),
            ShaderStageKind::Fragment => write!(f, "fragment"),
        }
    }
}

/// Handle to one compiled shader stage
///
/// Not `Clone`: there is exactly one owner, and releasing the stage consumes
/// the handle.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct ShaderStageHandle {
    id: NonZeroU32,
    kind: ShaderStageKind,
}

impl ShaderStageHandle {
    /// Wrap a raw identifier issued by a graphics context
    pub fn from_raw(id: NonZeroU32, kind: ShaderStageKind) -> Self {
        Self { id, kind }
    }

    pub fn id(&self) -> NonZeroU32 {
        self.id
    }

    pub fn kind(&self) -> ShaderStageKind {
        self.kind
    }
}

/// Handle to a GPU program, linked or not
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GpuProgramHandle(NonZeroU32);

impl GpuProgramHandle {
    /// Wrap a raw identifier issued by a graphics context
    pub fn from_raw(id: NonZeroU32) -> Self {
        Self(id)
    }

    pub fn id(&self) -> NonZeroU32 {
        self.0
    }
}

/// Sequential allocator for non-zero handle identifiers
#[derive(Debug)]
pub(crate) struct HandleAllocator {
    next: u32,
}

impl HandleAllocator {
    pub(crate) fn new() -> Self {
        Self { next: 1 }
    }

    /// Returns `None` once the 32-bit identifier space is exhausted
    pub(crate) fn allocate(&mut self) -> Option<NonZeroU32> {
        let id = NonZeroU32::new(self.next)?;
        self.next = self.next.checked_add(1).unwrap_or(0);
        Some(id)
    }
}

impl Default for HandleAllocator {
    fn default() -> Self {
        Self::new()
    }
}
