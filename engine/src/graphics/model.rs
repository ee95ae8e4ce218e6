//! In-memory representation of a loaded OBJ model
//!
//! A [`Model`] owns one shared set of vertex attributes, the named shapes
//! indexing into it, and the materials read from the companion MTL files.
//! It is built once by the model loader and never mutated afterwards.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Location of a model on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelFile {
    path: PathBuf,
    base_dir: Option<PathBuf>,
}

impl ModelFile {
    /// Model at `path`, with materials resolved next to it
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            base_dir: None,
        }
    }

    /// Resolve material files against `dir` instead of the model's directory
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory that material file references are resolved against
    ///
    /// Falls back to everything before the last separator of the model path,
    /// or the empty path (the current directory) when there is none.
    pub fn base_dir(&self) -> PathBuf {
        match &self.base_dir {
            Some(dir) => dir.clone(),
            None => self
                .path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
        }
    }
}

/// Vertex attribute buffers shared by every shape of a model
///
/// Normals, texture coordinates and colors are either empty or aligned with
/// `positions` (one entry per vertex).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometryAttributes {
    /// xyz triples
    pub positions: Vec<f32>,
    /// xyz triples
    pub normals: Vec<f32>,
    /// uv pairs
    pub texcoords: Vec<f32>,
    /// rgb triples
    pub colors: Vec<f32>,
}

impl GeometryAttributes {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty()
    }

    pub fn has_texcoords(&self) -> bool {
        !self.texcoords.is_empty()
    }

    pub fn has_colors(&self) -> bool {
        !self.colors.is_empty()
    }

    pub fn position(&self, vertex: usize) -> Option<[f32; 3]> {
        triple(&self.positions, vertex)
    }

    pub fn normal(&self, vertex: usize) -> Option<[f32; 3]> {
        triple(&self.normals, vertex)
    }

    pub fn texcoord(&self, vertex: usize) -> Option<[f32; 2]> {
        match self.texcoords.get(vertex * 2..vertex * 2 + 2)? {
            &[u, v] => Some([u, v]),
            _ => None,
        }
    }

    pub fn color(&self, vertex: usize) -> Option<[f32; 3]> {
        triple(&self.colors, vertex)
    }
}

/// Entry `vertex` of an xyz/rgb buffer, `None` when out of range
fn triple(buffer: &[f32], vertex: usize) -> Option<[f32; 3]> {
    match buffer.get(vertex * 3..vertex * 3 + 3)? {
        &[a, b, c] => Some([a, b, c]),
        _ => None,
    }
}

/// A named group of faces
///
/// All faces of one `o`/`g` group, even when the group switches material
/// part way through.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    /// Group or object name, never empty
    pub name: String,
    /// Vertex indices into the model's [`GeometryAttributes`]
    pub indices: Vec<u32>,
    /// Vertex count of each face; empty when every face is a triangle
    pub face_arities: Vec<u32>,
    /// First vertex of this shape in the shared buffers
    pub vertex_offset: u32,
    /// Number of vertices this shape contributed to the shared buffers
    pub vertex_count: u32,
    /// Whether the file supplied normals for every face of this shape
    pub has_normals: bool,
    /// Index into [`Model::materials`] for each face
    pub material_ids: Vec<Option<usize>>,
}

impl Shape {
    pub fn is_triangulated(&self) -> bool {
        self.face_arities.iter().all(|&arity| arity == 3)
    }

    pub fn face_count(&self) -> usize {
        if self.face_arities.is_empty() {
            self.indices.len() / 3
        } else {
            self.face_arities.len()
        }
    }

    /// Material index of face `face`
    pub fn material_id(&self, face: usize) -> Option<usize> {
        self.material_ids.get(face).copied().flatten()
    }

    /// Append the faces of `part`, which must directly follow this shape in
    /// the shared vertex buffers
    pub(crate) fn absorb(&mut self, part: Shape) {
        if !self.face_arities.is_empty() || !part.face_arities.is_empty() {
            if self.face_arities.is_empty() {
                self.face_arities = vec![3; self.indices.len() / 3];
            }
            if part.face_arities.is_empty() {
                self.face_arities
                    .extend(std::iter::repeat(3).take(part.indices.len() / 3));
            } else {
                self.face_arities.extend(part.face_arities);
            }
        }
        self.indices.extend(part.indices);
        self.vertex_count += part.vertex_count;
        self.has_normals &= part.has_normals;
        self.material_ids.extend(part.material_ids);
    }
}

/// Shading parameters of one `newmtl` block
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Material {
    pub name: String,
    pub ambient: Option<[f32; 3]>,
    pub diffuse: Option<[f32; 3]>,
    pub specular: Option<[f32; 3]>,
    pub shininess: Option<f32>,
    pub dissolve: Option<f32>,
    pub optical_density: Option<f32>,
    pub illumination_model: Option<u8>,
    pub ambient_texture: Option<String>,
    pub diffuse_texture: Option<String>,
    pub specular_texture: Option<String>,
    pub normal_texture: Option<String>,
    /// Parameters the MTL parser does not recognise, by keyword
    pub extra: BTreeMap<String, String>,
}

impl From<tobj::Material> for Material {
    fn from(material: tobj::Material) -> Self {
        Self {
            name: material.name,
            ambient: material.ambient,
            diffuse: material.diffuse,
            specular: material.specular,
            shininess: material.shininess,
            dissolve: material.dissolve,
            optical_density: material.optical_density,
            illumination_model: material.illumination_model,
            ambient_texture: material.ambient_texture,
            diffuse_texture: material.diffuse_texture,
            specular_texture: material.specular_texture,
            normal_texture: material.normal_texture,
            extra: material.unknown_param.into_iter().collect(),
        }
    }
}

/// Geometry and materials of one OBJ file
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    path: PathBuf,
    attributes: GeometryAttributes,
    shapes: Vec<Shape>,
    materials: Vec<Material>,
    warnings: Vec<String>,
}

impl Model {
    pub(crate) fn new(
        path: PathBuf,
        attributes: GeometryAttributes,
        shapes: Vec<Shape>,
        materials: Vec<Material>,
        warnings: Vec<String>,
    ) -> Self {
        Self {
            path,
            attributes,
            shapes,
            materials,
            warnings,
        }
    }

    /// File the model was loaded from
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn attributes(&self) -> &GeometryAttributes {
        &self.attributes
    }

    /// Shapes in file order
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    /// Materials in file order
    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    /// Non-fatal problems reported while parsing
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// First shape called `name`
    pub fn shape(&self, name: &str) -> Option<&Shape> {
        self.shapes.iter().find(|shape| shape.name == name)
    }

    pub fn shape_names(&self) -> impl Iterator<Item = &str> {
        self.shapes.iter().map(|shape| shape.name.as_str())
    }

    /// Material of face `face` of `shape`
    pub fn face_material(&self, shape: &Shape, face: usize) -> Option<&Material> {
        shape
            .material_id(face)
            .and_then(|id| self.materials.get(id))
    }

    /// Distinct materials used by `shape`, in order of first use
    pub fn materials_of(&self, shape: &Shape) -> Vec<&Material> {
        let mut seen = Vec::new();
        for id in shape.material_ids.iter().flatten() {
            if !seen.contains(id) {
                seen.push(*id);
            }
        }
        seen.into_iter()
            .filter_map(|id| self.materials.get(id))
            .collect()
    }
}
