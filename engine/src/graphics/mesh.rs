//! GPU vertex format and conversion from loaded model shapes

use crate::graphics::model::{Model, Shape};
use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Vertex data structure for GPU rendering
///
/// This struct is tightly packed for efficient GPU transfer using bytemuck.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Position in 3D space
    pub position: [f32; 3],
    /// Surface normal vector (normalized)
    pub normal: [f32; 3],
    /// Texture coordinates (UV mapping)
    pub uv: [f32; 2],
}

impl Vertex {
    pub const fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }

    /// Get the vertex attribute layout for wgpu
    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                // Position
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                // Normal
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                // UV
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 6]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

/// Interleaved, triangle-list geometry of a single shape
#[derive(Debug, Clone)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    /// Indices into `vertices`, three per triangle
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Build a mesh from one shape of a loaded model
    ///
    /// Polygons that were not triangulated at load time are fanned into
    /// triangles. Shapes without normals in the file get smooth normals
    /// computed from their faces. Returns `None` when the shape's vertex
    /// range or indices fall outside the model's attribute buffers.
    pub fn from_shape(model: &Model, shape: &Shape) -> Option<Self> {
        let attributes = model.attributes();
        let first = shape.vertex_offset as usize;

        let vertices = (first..first + shape.vertex_count as usize)
            .map(|i| {
                let normal = if shape.has_normals {
                    attributes.normal(i).unwrap_or([0.0, 1.0, 0.0])
                } else {
                    [0.0, 1.0, 0.0]
                };
                Some(Vertex::new(
                    attributes.position(i)?,
                    normal,
                    attributes.texcoord(i).unwrap_or([0.0, 0.0]),
                ))
            })
            .collect::<Option<Vec<_>>>()?;

        let local = shape
            .indices
            .iter()
            .map(|&index| {
                index
                    .checked_sub(shape.vertex_offset)
                    .filter(|&local| local < shape.vertex_count)
            })
            .collect::<Option<Vec<u32>>>()?;
        let indices = if shape.face_arities.is_empty() {
            local
        } else {
            fan_triangulate(&local, &shape.face_arities)
        };

        let mut mesh = Self::new(vertices, indices);
        if !shape.has_normals {
            calculate_normals(&mut mesh.vertices, &mesh.indices);
        }
        Some(mesh)
    }
}

/// Split each polygon into a fan of triangles around its first vertex
fn fan_triangulate(indices: &[u32], face_arities: &[u32]) -> Vec<u32> {
    let mut triangles = Vec::with_capacity(indices.len() * 3);
    let mut start = 0;
    for &arity in face_arities {
        let arity = arity as usize;
        let Some(face) = indices.get(start..start + arity) else {
            break;
        };
        for k in 1..arity.saturating_sub(1) {
            triangles.extend_from_slice(&[face[0], face[k], face[k + 1]]);
        }
        start += arity;
    }
    triangles
}

/// Calculate normals for vertices based on face geometry
fn calculate_normals(vertices: &mut [Vertex], indices: &[u32]) {
    // First, zero out all normals
    for vertex in vertices.iter_mut() {
        vertex.normal = [0.0, 0.0, 0.0];
    }

    // Accumulate area-weighted face normals
    for chunk in indices.chunks_exact(3) {
        let i0 = chunk[0] as usize;
        let i1 = chunk[1] as usize;
        let i2 = chunk[2] as usize;

        if i0 >= vertices.len() || i1 >= vertices.len() || i2 >= vertices.len() {
            continue;
        }

        let v0 = Vec3::from(vertices[i0].position);
        let v1 = Vec3::from(vertices[i1].position);
        let v2 = Vec3::from(vertices[i2].position);

        let face_normal = (v1 - v0).cross(v2 - v0);

        for &i in &[i0, i1, i2] {
            let current = Vec3::from(vertices[i].normal);
            vertices[i].normal = (current + face_normal).to_array();
        }
    }

    // Normalize, leaving vertices outside any face pointing up
    for vertex in vertices.iter_mut() {
        let normal = Vec3::from(vertex.normal).try_normalize().unwrap_or(Vec3::Y);
        vertex.normal = normal.to_array();
    }
}
