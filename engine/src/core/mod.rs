//! Core engine types shared by rendering and application code

pub mod camera;

pub use camera::Camera;
