//! Integration tests for OBJ model loading

use engine::graphics::{load_model, Mesh, ModelFile, ModelLoadError, ModelLoadOptions};
use engine::prelude::Model;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const CUBE_OBJ: &str = "\
# unit cube split into two named objects
mtllib cube.mtl
v -1 -1 -1
v  1 -1 -1
v  1  1 -1
v -1  1 -1
v -1 -1  1
v  1 -1  1
v  1  1  1
v -1  1  1
o bottom
usemtl stone
f 1 2 6 5
o top
usemtl moss
f 4 8 7 3
";

const CUBE_MTL: &str = "\
newmtl stone
Ka 0.1 0.1 0.1
Kd 0.5 0.5 0.5
Ks 0 0 0
Ns 4
d 1
illum 2

newmtl moss
Kd 0.1 0.6 0.1
map_Kd moss.png
";

fn write_cube(dir: &Path, mtl_dir: &Path) -> std::path::PathBuf {
    let obj = dir.join("cube.obj");
    fs::write(&obj, CUBE_OBJ).unwrap();
    fs::write(mtl_dir.join("cube.mtl"), CUBE_MTL).unwrap();
    obj
}

#[test]
fn test_load_reports_every_named_shape() {
    let dir = tempdir().unwrap();
    let obj = write_cube(dir.path(), dir.path());

    let model = Model::load(&obj).unwrap();

    assert_eq!(model.path(), obj.as_path());
    assert_eq!(model.shape_names().collect::<Vec<_>>(), ["bottom", "top"]);
    for shape in model.shapes() {
        // One quad, triangulated
        assert_eq!(shape.face_count(), 2);
        assert_eq!(shape.indices.len(), 6);
    }
}

#[test]
fn test_materials_are_resolved_next_to_the_model() {
    let dir = tempdir().unwrap();
    let obj = write_cube(dir.path(), dir.path());

    let model = Model::load(&obj).unwrap();
    assert!(model.warnings().is_empty());

    let stone = model.face_material(model.shape("bottom").unwrap(), 0).unwrap();
    assert_eq!(stone.name, "stone");
    assert_eq!(stone.diffuse, Some([0.5, 0.5, 0.5]));
    assert_eq!(stone.shininess, Some(4.0));
    assert_eq!(stone.illumination_model, Some(2));

    let moss = model.face_material(model.shape("top").unwrap(), 1).unwrap();
    assert_eq!(moss.diffuse_texture.as_deref(), Some("moss.png"));
}

#[test]
fn test_base_dir_override_redirects_material_lookup() {
    let dir = tempdir().unwrap();
    let materials = dir.path().join("materials");
    fs::create_dir(&materials).unwrap();
    let obj = write_cube(dir.path(), &materials);

    // Next to the model there is no cube.mtl
    let plain = load_model(&ModelFile::new(&obj), &ModelLoadOptions::default()).unwrap();
    assert!(plain.materials().is_empty());
    assert_eq!(plain.warnings().len(), 1);

    let file = ModelFile::new(&obj).with_base_dir(&materials);
    let redirected = load_model(&file, &ModelLoadOptions::default()).unwrap();
    assert_eq!(redirected.materials().len(), 2);
    assert!(redirected.warnings().is_empty());
}

#[test]
fn test_loading_twice_gives_identical_geometry() {
    let dir = tempdir().unwrap();
    let obj = write_cube(dir.path(), dir.path());

    let first = Model::load(&obj).unwrap();
    let second = Model::load(&obj).unwrap();

    assert_eq!(first.attributes(), second.attributes());
    assert_eq!(first.shapes(), second.shapes());
}

#[test]
fn test_one_unnamed_shape_fails_the_whole_load() {
    let dir = tempdir().unwrap();
    let obj = dir.path().join("partial.obj");
    fs::write(
        &obj,
        "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\no named\nf 1 3 2\n",
    )
    .unwrap();

    match Model::load(&obj) {
        Err(ModelLoadError::MissingShapeName { path, index }) => {
            assert_eq!(path, obj);
            assert_eq!(index, 0);
        }
        other => panic!("expected MissingShapeName, got {other:?}"),
    }
}

#[test]
fn test_parse_error_names_the_file() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nowhere.obj");

    let err = Model::load(&missing).unwrap_err();
    assert!(matches!(err, ModelLoadError::Parse { .. }));
    assert!(err.to_string().contains("nowhere.obj"));
}

#[test]
fn test_untriangulated_shapes_become_triangle_meshes() {
    let dir = tempdir().unwrap();
    let obj = write_cube(dir.path(), dir.path());

    let options = ModelLoadOptions { triangulate: false };
    let model = load_model(&ModelFile::new(&obj), &options).unwrap();
    let top = model.shape("top").unwrap();
    assert_eq!(top.face_arities, [4]);

    let mesh = Mesh::from_shape(&model, top).unwrap();
    assert_eq!(mesh.vertices.len(), 4);
    assert_eq!(mesh.indices.len(), 6);
    assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertices.len()));

    // No normals in the file, so they are computed from the winding
    for vertex in &mesh.vertices {
        let [x, y, z] = vertex.normal;
        assert!((x * x + y * y + z * z - 1.0).abs() < 1e-5);
    }
}

const PANELS_OBJ: &str = "\
mtllib panels.mtl
v 0 0 0
v 1 0 0
v 0 1 0
v 1 1 0
g wall
usemtl brick
f 1 2 3
usemtl plaster
f 2 4 3
usemtl brick
f 1 2 4
g floor
usemtl plaster
f 1 3 4
g wall
usemtl brick
f 3 2 1
";

const PANELS_MTL: &str = "\
newmtl brick
Kd 0.6 0.2 0.1
newmtl plaster
Kd 0.9 0.9 0.85
";

#[test]
fn test_group_with_several_materials_is_one_shape() {
    let dir = tempdir().unwrap();
    let obj = dir.path().join("panels.obj");
    fs::write(&obj, PANELS_OBJ).unwrap();
    fs::write(dir.path().join("panels.mtl"), PANELS_MTL).unwrap();

    let model = Model::load(&obj).unwrap();

    // Three group statements, three shapes
    assert_eq!(
        model.shape_names().collect::<Vec<_>>(),
        ["wall", "floor", "wall"]
    );

    let wall = &model.shapes()[0];
    assert_eq!(wall.face_count(), 3);
    let face_materials: Vec<&str> = (0..wall.face_count())
        .map(|face| model.face_material(wall, face).unwrap().name.as_str())
        .collect();
    assert_eq!(face_materials, ["brick", "plaster", "brick"]);

    let names: Vec<&str> = model
        .materials_of(wall)
        .iter()
        .map(|m| m.name.as_str())
        .collect();
    assert_eq!(names, ["brick", "plaster"]);

    let mesh = Mesh::from_shape(&model, wall).unwrap();
    assert_eq!(mesh.indices.len(), 9);
}

#[test]
fn test_shape_split_does_not_depend_on_material_library() {
    let dir = tempdir().unwrap();
    let obj = dir.path().join("panels.obj");
    fs::write(&obj, PANELS_OBJ).unwrap();

    let without = Model::load(&obj).unwrap();
    fs::write(dir.path().join("panels.mtl"), PANELS_MTL).unwrap();
    let with = Model::load(&obj).unwrap();

    assert_eq!(
        without.shape_names().collect::<Vec<_>>(),
        with.shape_names().collect::<Vec<_>>()
    );
    for (a, b) in without.shapes().iter().zip(with.shapes()) {
        assert_eq!(a.face_count(), b.face_count());
        assert_eq!(a.material_ids.len(), b.material_ids.len());
    }
}
