//! Built-in shader stages
//!
//! The vertex and fragment stages live in separate files so they can be
//! compiled independently and linked into one program.

/// Vertex stage: transforms model vertices and forwards normal and UV
pub const BASIC_VERTEX_SHADER: &str = include_str!("basic_vertex.wgsl");

/// Fragment stage: simple directional lighting over a flat base color
pub const BASIC_FRAGMENT_SHADER: &str = include_str!("basic_fragment.wgsl");

/// Entry point of [`BASIC_VERTEX_SHADER`]
pub const VERTEX_ENTRY_POINT: &str = "vs_main";

/// Entry point of [`BASIC_FRAGMENT_SHADER`]
pub const FRAGMENT_ENTRY_POINT: &str = "fs_main";
