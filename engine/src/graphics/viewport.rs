//! Viewport state tracking the framebuffer size and aspect ratio

use crate::graphics::backend::{GraphicsContext, ViewportRect};
use tracing::debug;

/// Errors that can occur when applying a resize
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ViewportError {
    #[error("cannot resize viewport to {width}x0: height must be non-zero")]
    ZeroHeight { width: u32 },
}

/// Current framebuffer size and the aspect ratio derived from it
///
/// Owned by whatever builds the projection matrix and updated through
/// [`Viewport::resize`] on every window resize.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    width: u32,
    height: u32,
    aspect_ratio: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            aspect_ratio: 1.0,
        }
    }
}

impl Viewport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Width divided by height; 1.0 until the first resize
    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Apply a framebuffer resize
    ///
    /// Maps rendering onto the full `width` x `height` rectangle and
    /// recomputes the aspect ratio. A zero height is rejected without
    /// touching either the state or the context.
    pub fn resize<C>(&mut self, ctx: &mut C, width: u32, height: u32) -> Result<(), ViewportError>
    where
        C: GraphicsContext + ?Sized,
    {
        if height == 0 {
            return Err(ViewportError::ZeroHeight { width });
        }

        ctx.set_viewport(ViewportRect::full(width, height));

        self.width = width;
        self.height = height;
        self.aspect_ratio = width as f32 / height as f32;

        debug!(
            width = width,
            height = height,
            aspect_ratio = self.aspect_ratio,
            "Viewport resized"
        );
        Ok(())
    }
}
