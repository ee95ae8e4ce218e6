//! OBJ model loading
//!
//! Parses a Wavefront OBJ file and its MTL libraries with `tobj`, merges the
//! per-object vertex data into one shared attribute set, and enforces that
//! every shape carries a name.

use crate::graphics::model::{GeometryAttributes, Material, Model, ModelFile, Shape};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Name `tobj` assigns to faces that appear before any `o` or `g` statement
pub const UNNAMED_SHAPE_PLACEHOLDER: &str = "unnamed_object";

/// Errors that can occur during model loading
#[derive(Debug, thiserror::Error)]
pub enum ModelLoadError {
    #[error("failed to load model {path:?}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("shape #{index} in model {path:?} has no name; every object must be named with `o` or `g`")]
    MissingShapeName { path: PathBuf, index: usize },
}

/// Parser settings for [`load_model`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelLoadOptions {
    /// Split faces with more than three vertices into triangles
    pub triangulate: bool,
}

impl Default for ModelLoadOptions {
    fn default() -> Self {
        Self { triangulate: true }
    }
}

impl Model {
    /// Load the model at `path` with default options
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ModelLoadError> {
        load_model(&ModelFile::new(path), &ModelLoadOptions::default())
    }
}

/// Load a model and its materials from disk
///
/// Material libraries named by `mtllib` are resolved against
/// [`ModelFile::base_dir`]. A material library that cannot be read, or a
/// `usemtl` naming a material no library defines, is recorded as a warning
/// on the returned model; an unreadable or malformed OBJ file, or any shape
/// without a name, fails the whole load.
pub fn load_model(file: &ModelFile, options: &ModelLoadOptions) -> Result<Model, ModelLoadError> {
    let path = file.path();
    info!(path = %path.display(), "Loading model");

    let parse_error = |message: String| ModelLoadError::Parse {
        path: path.to_path_buf(),
        message,
    };

    let source = fs::read(path).map_err(|e| parse_error(e.to_string()))?;
    let base_dir = file.base_dir();

    let load_options = tobj::LoadOptions {
        triangulate: options.triangulate,
        single_index: true,
        ..Default::default()
    };

    let (objects, material_result) =
        tobj::load_obj_buf(&mut source.as_slice(), &load_options, |mtl_path: &Path| {
            let resolved = base_dir.join(mtl_path);
            debug!(path = %resolved.display(), "Loading material library");
            tobj::load_mtl(resolved)
        })
        .map_err(|e| parse_error(e.to_string()))?;

    let mut warnings = Vec::new();
    let materials: Vec<Material> = match material_result {
        Ok(materials) => {
            let materials: Vec<Material> = materials.into_iter().map(Material::from).collect();
            warnings.extend(
                unknown_material_names(&String::from_utf8_lossy(&source), &materials)
                    .into_iter()
                    .map(|name| format!("material `{name}` not found in any material library")),
            );
            materials
        }
        Err(e) => {
            warnings.push(format!("failed to load material library: {e}"));
            Vec::new()
        }
    };
    for warning in &warnings {
        warn!(path = %path.display(), "{}", warning);
    }

    let (attributes, shapes) = merge_objects(objects).map_err(parse_error)?;

    if let Some(index) = shapes.iter().position(|shape| is_unnamed(&shape.name)) {
        error!(
            path = %path.display(),
            index = index,
            "Model contains a shape without a name"
        );
        return Err(ModelLoadError::MissingShapeName {
            path: path.to_path_buf(),
            index,
        });
    }

    for shape in &shapes {
        info!(shape = %shape.name, faces = shape.face_count(), "Found shape");
    }
    info!(
        path = %path.display(),
        shapes = shapes.len(),
        materials = materials.len(),
        vertices = attributes.vertex_count(),
        "Model loaded"
    );

    Ok(Model::new(
        path.to_path_buf(),
        attributes,
        shapes,
        materials,
        warnings,
    ))
}

fn is_unnamed(name: &str) -> bool {
    let name = name.trim();
    name.is_empty() || name == UNNAMED_SHAPE_PLACEHOLDER
}

/// Names used by `usemtl` statements that match none of `materials`, in
/// order of first use
fn unknown_material_names<'a>(obj: &'a str, materials: &[Material]) -> Vec<&'a str> {
    let mut unknown = Vec::new();
    for line in obj.lines() {
        let mut words = line.split_whitespace();
        if words.next() != Some("usemtl") {
            continue;
        }
        let Some(name) = words.next() else {
            continue;
        };
        if !unknown.contains(&name) && !materials.iter().any(|m| m.name == name) {
            unknown.push(name);
        }
    }
    unknown
}

/// Concatenate per-object vertex data into one attribute set, rebasing each
/// object's indices onto it
///
/// `tobj` starts a new object whenever the material changes inside a group,
/// so consecutive objects with the same name are folded back into one shape.
fn merge_objects(
    objects: Vec<tobj::Model>,
) -> Result<(GeometryAttributes, Vec<Shape>), String> {
    let mut attributes = GeometryAttributes::default();
    let mut shapes: Vec<Shape> = Vec::with_capacity(objects.len());
    let (mut any_normals, mut any_texcoords, mut any_colors) = (false, false, false);
    let too_large = || "model has more vertices than a 32-bit index can address".to_string();

    for object in objects {
        let mesh = object.mesh;
        let vertex_count = mesh.positions.len() / 3;
        let vertex_offset = u32::try_from(attributes.vertex_count()).map_err(|_| too_large())?;

        attributes.positions.extend_from_slice(&mesh.positions);
        let has_normals = append_or_pad(&mut attributes.normals, &mesh.normals, 3, vertex_count);
        any_normals |= has_normals;
        any_texcoords |= append_or_pad(&mut attributes.texcoords, &mesh.texcoords, 2, vertex_count);
        any_colors |= append_or_pad(&mut attributes.colors, &mesh.vertex_color, 3, vertex_count);

        let indices: Vec<u32> = mesh
            .indices
            .iter()
            .map(|&index| index + vertex_offset)
            .collect();
        let face_count = if mesh.face_arities.is_empty() {
            indices.len() / 3
        } else {
            mesh.face_arities.len()
        };

        debug!(
            shape = %object.name,
            vertices = vertex_count,
            indices = indices.len(),
            material = ?mesh.material_id,
            "Merged shape geometry"
        );

        let part = Shape {
            name: object.name,
            indices,
            face_arities: mesh.face_arities,
            vertex_offset,
            vertex_count: u32::try_from(vertex_count).map_err(|_| too_large())?,
            has_normals,
            material_ids: vec![mesh.material_id; face_count],
        };
        match shapes.last_mut() {
            Some(shape) if shape.name == part.name => shape.absorb(part),
            _ => shapes.push(part),
        }
    }

    if !any_normals {
        attributes.normals.clear();
    }
    if !any_texcoords {
        attributes.texcoords.clear();
    }
    if !any_colors {
        attributes.colors.clear();
    }

    Ok((attributes, shapes))
}

/// Append `source` when it has one `width`-sized entry per vertex, otherwise
/// pad with zeros so `target` stays aligned with the position buffer
fn append_or_pad(target: &mut Vec<f32>, source: &[f32], width: usize, vertex_count: usize) -> bool {
    let expected = width * vertex_count;
    if vertex_count > 0 && source.len() == expected {
        target.extend_from_slice(source);
        true
    } else {
        target.resize(target.len() + expected, 0.0);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const ROOM_OBJ: &str = "\
mtllib room.mtl
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vn 0 0 1
vt 0 0
vt 1 0
vt 1 1
vt 0 1
o floor
usemtl red
f 1/1/1 2/2/1 3/3/1 4/4/1
o wall
usemtl blue
f 1/1/1 2/2/1 3/3/1
";

    const ROOM_MTL: &str = "\
newmtl red
Kd 1 0 0
Ns 10
newmtl blue
Kd 0 0 1
map_Kd blue.png
";

    #[test]
    fn test_load_shapes_and_materials() {
        let dir = tempdir().unwrap();
        let obj = dir.path().join("room.obj");
        fs::write(&obj, ROOM_OBJ).unwrap();
        fs::write(dir.path().join("room.mtl"), ROOM_MTL).unwrap();

        let model = Model::load(&obj).unwrap();

        assert_eq!(model.shape_names().collect::<Vec<_>>(), ["floor", "wall"]);
        assert_eq!(model.materials().len(), 2);
        assert!(model.warnings().is_empty());

        let floor = model.shape("floor").unwrap();
        assert_eq!(floor.indices.len(), 6);
        assert!(floor.is_triangulated());
        assert_eq!(floor.material_ids, [Some(0), Some(0)]);
        assert_eq!(model.face_material(floor, 1).map(|m| m.name.as_str()), Some("red"));

        let wall = model.shape("wall").unwrap();
        let blue = model.face_material(wall, 0).unwrap();
        assert_eq!(blue.diffuse, Some([0.0, 0.0, 1.0]));
        assert_eq!(blue.diffuse_texture.as_deref(), Some("blue.png"));
    }

    #[test]
    fn test_indices_are_rebased_onto_shared_attributes() {
        let dir = tempdir().unwrap();
        let obj = dir.path().join("room.obj");
        fs::write(&obj, ROOM_OBJ).unwrap();
        fs::write(dir.path().join("room.mtl"), ROOM_MTL).unwrap();

        let model = Model::load(&obj).unwrap();
        let attributes = model.attributes();
        let wall = model.shape("wall").unwrap();

        assert!(wall.vertex_offset > 0);
        let range = wall.vertex_offset..wall.vertex_offset + wall.vertex_count;
        assert!(wall.indices.iter().all(|i| range.contains(i)));
        assert_eq!(
            attributes.vertex_count() as u32,
            model.shapes().iter().map(|s| s.vertex_count).sum::<u32>()
        );
        assert_eq!(attributes.normals.len(), attributes.positions.len());
        assert_eq!(attributes.texcoords.len() / 2, attributes.vertex_count());
    }

    #[test]
    fn test_unnamed_shape_fails() {
        let dir = tempdir().unwrap();
        let obj = dir.path().join("anonymous.obj");
        fs::write(&obj, "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();

        let result = Model::load(&obj);
        assert!(matches!(
            result,
            Err(ModelLoadError::MissingShapeName { index: 0, .. })
        ));
    }

    #[test]
    fn test_missing_file_is_parse_error() {
        let dir = tempdir().unwrap();
        let result = Model::load(dir.path().join("does_not_exist.obj"));
        assert!(matches!(result, Err(ModelLoadError::Parse { .. })));
    }

    #[test]
    fn test_malformed_vertex_is_parse_error() {
        let dir = tempdir().unwrap();
        let obj = dir.path().join("broken.obj");
        fs::write(&obj, "o broken\nv 0 zero 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();

        let result = Model::load(&obj);
        assert!(matches!(result, Err(ModelLoadError::Parse { .. })));
    }

    #[test]
    fn test_missing_material_library_is_a_warning() {
        let dir = tempdir().unwrap();
        let obj = dir.path().join("room.obj");
        fs::write(&obj, ROOM_OBJ).unwrap();

        let model = Model::load(&obj).unwrap();
        assert_eq!(model.shapes().len(), 2);
        assert!(model.materials().is_empty());
        assert_eq!(model.warnings().len(), 1);
    }

    #[test]
    fn test_quads_are_kept_without_triangulation() {
        let dir = tempdir().unwrap();
        let obj = dir.path().join("room.obj");
        fs::write(&obj, ROOM_OBJ).unwrap();
        fs::write(dir.path().join("room.mtl"), ROOM_MTL).unwrap();

        let options = ModelLoadOptions { triangulate: false };
        let model = load_model(&ModelFile::new(&obj), &options).unwrap();

        let floor = model.shape("floor").unwrap();
        assert_eq!(floor.indices.len(), 4);
        assert_eq!(floor.face_arities, [4]);
        assert!(!floor.is_triangulated());
    }

    #[test]
    fn test_attributes_absent_from_every_shape_stay_empty() {
        let dir = tempdir().unwrap();
        let obj = dir.path().join("bare.obj");
        fs::write(&obj, "o tri\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();

        let model = Model::load(&obj).unwrap();
        let attributes = model.attributes();
        assert_eq!(attributes.vertex_count(), 3);
        assert!(!attributes.has_normals());
        assert!(!attributes.has_texcoords());
        assert!(!model.shapes()[0].has_normals);
    }

    #[test]
    fn test_append_or_pad_keeps_buffers_aligned() {
        let mut normals = vec![0.0, 0.0, 1.0];
        assert!(!append_or_pad(&mut normals, &[], 3, 2));
        assert_eq!(normals.len(), 9);
        assert!(append_or_pad(&mut normals, &[1.0, 0.0, 0.0], 3, 1));
        assert_eq!(&normals[9..], &[1.0, 0.0, 0.0]);
    }

    const TWO_TONE_OBJ: &str = "\
mtllib tones.mtl
v 0 0 0
v 1 0 0
v 0 1 0
v 1 1 0
g wall
usemtl a
f 1 2 3
usemtl b
f 2 4 3
usemtl missing
f 1 2 4
";

    #[test]
    fn test_material_switch_keeps_group_as_one_shape() {
        let dir = tempdir().unwrap();
        let obj = dir.path().join("tones.obj");
        fs::write(&obj, TWO_TONE_OBJ).unwrap();
        fs::write(dir.path().join("tones.mtl"), "newmtl a\nKd 1 0 0\nnewmtl b\nKd 0 1 0\n")
            .unwrap();

        let model = Model::load(&obj).unwrap();
        assert_eq!(model.shape_names().collect::<Vec<_>>(), ["wall"]);

        let wall = model.shape("wall").unwrap();
        assert_eq!(wall.face_count(), 3);
        assert_eq!(wall.material_ids.len(), 3);
        assert_eq!(wall.material_id(0), Some(0));
        assert_eq!(wall.material_id(1), Some(1));
        assert_eq!(model.materials_of(wall).len(), 2);
        assert_eq!(
            wall.vertex_count as usize,
            model.attributes().vertex_count()
        );
    }

    #[test]
    fn test_unknown_usemtl_is_a_warning() {
        let dir = tempdir().unwrap();
        let obj = dir.path().join("tones.obj");
        fs::write(&obj, TWO_TONE_OBJ).unwrap();
        fs::write(dir.path().join("tones.mtl"), "newmtl a\nKd 1 0 0\nnewmtl b\nKd 0 1 0\n")
            .unwrap();

        let model = Model::load(&obj).unwrap();
        assert_eq!(model.warnings().len(), 1);
        assert!(model.warnings()[0].contains("`missing`"));
    }

    #[test]
    fn test_unknown_material_names_are_listed_once() {
        let materials = [Material {
            name: "known".to_string(),
            ..Default::default()
        }];
        let obj = "usemtl known\nusemtl gone\nusemtl gone\nusemtl\nusemtl other\n";
        assert_eq!(unknown_material_names(obj, &materials), ["gone", "other"]);
    }
}
