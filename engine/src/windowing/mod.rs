//! Window and presentation surface management

mod window_surface;

pub use window_surface::WindowSurface;
