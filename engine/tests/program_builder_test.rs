//! Integration tests for program building, link diagnostics and viewport
//! state against the headless graphics context

use engine::graphics::{
    build_program, build_program_strict, format_link_log, GraphicsContext, HeadlessContext,
    ProgramError, ShaderStageKind, Viewport, ViewportError, ViewportRect,
};
use engine::prelude::Camera;

const HEADER: &str = "ERROR: linking of GPU program failed.";
const START: &str = "== Start of link log";
const END: &str = "== End of link log";

fn stages(
    ctx: &mut HeadlessContext,
    fragment_inputs: &[&str],
) -> (
    engine::graphics::ShaderStageHandle,
    engine::graphics::ShaderStageHandle,
) {
    let vertex = ctx
        .create_stage(
            ShaderStageKind::Vertex,
            &["position", "normal", "uv"],
            &["v_normal", "v_uv"],
        )
        .unwrap();
    let fragment = ctx
        .create_stage(ShaderStageKind::Fragment, fragment_inputs, &["color"])
        .unwrap();
    (vertex, fragment)
}

#[test]
fn test_linked_program_has_no_diagnostic() {
    let mut ctx = HeadlessContext::new();
    let (vertex, fragment) = stages(&mut ctx, &["v_normal", "v_uv"]);

    let build = build_program(&mut ctx, vertex, fragment).unwrap();

    assert!(build.is_linked());
    assert_eq!(build.link_log, None);
    assert_eq!(format_link_log(&ctx, build.program), "");
    assert_eq!(ctx.live_stage_count(), 0);
}

#[test]
fn test_failed_link_diagnostic_layout() {
    let mut ctx = HeadlessContext::new();
    let (vertex, fragment) = stages(&mut ctx, &["v_tangent"]);
    let stage_ids = [vertex.id(), fragment.id()];

    let build = build_program(&mut ctx, vertex, fragment).unwrap();
    let diagnostic = build.link_log.clone().unwrap();

    // Stages are consumed even though linking failed
    assert!(stage_ids.iter().all(|&id| !ctx.is_stage_live(id)));

    let lines: Vec<&str> = diagnostic.lines().collect();
    assert_eq!(lines.first(), Some(&HEADER));
    assert_eq!(lines.get(1), Some(&START));
    assert_eq!(lines.last(), Some(&END));
    assert!(diagnostic.ends_with('\n'));

    let body = &lines[2..lines.len() - 1];
    assert_eq!(
        body,
        ["fragment input `v_tangent` is not written by the vertex stage"]
    );

    // Querying the context again gives the same text
    assert_eq!(format_link_log(&ctx, build.program), diagnostic);
}

#[test]
fn test_every_fragment_mismatch_is_reported() {
    let mut ctx = HeadlessContext::new();
    let (vertex, fragment) = stages(&mut ctx, &["v_tangent", "v_normal", "v_color"]);

    let build = build_program(&mut ctx, vertex, fragment).unwrap();
    let diagnostic = build.link_log.unwrap();

    assert!(diagnostic.contains("`v_tangent`"));
    assert!(diagnostic.contains("`v_color`"));
    assert!(!diagnostic.contains("`v_normal`"));
}

#[test]
fn test_builder_works_through_a_trait_object() {
    let mut headless = HeadlessContext::new();
    let (vertex, fragment) = stages(&mut headless, &["v_uv"]);

    let ctx: &mut dyn GraphicsContext = &mut headless;
    let program = build_program_strict(ctx, vertex, fragment).unwrap();

    assert!(headless.link_status(program));
    assert_eq!(headless.live_stage_count(), 0);
}

#[test]
fn test_strict_failure_releases_everything() {
    let mut ctx = HeadlessContext::new();
    let (vertex, fragment) = stages(&mut ctx, &["v_tangent"]);

    let (program, diagnostic) = match build_program_strict(&mut ctx, vertex, fragment) {
        Err(ProgramError::Link {
            program,
            diagnostic,
        }) => (program, diagnostic),
        other => panic!("expected a link error, got {other:?}"),
    };

    assert!(diagnostic.starts_with(HEADER));
    assert!(!ctx.is_program_live(program));
    assert_eq!(ctx.live_stage_count(), 0);
}

#[test]
fn test_each_build_allocates_a_fresh_program() {
    let mut ctx = HeadlessContext::new();
    let (v1, f1) = stages(&mut ctx, &["v_uv"]);
    let (v2, f2) = stages(&mut ctx, &["v_uv"]);

    let first = build_program(&mut ctx, v1, f1).unwrap().program;
    let second = build_program(&mut ctx, v2, f2).unwrap().program;

    assert_ne!(first, second);
    assert!(ctx.link_status(first));
    assert!(ctx.link_status(second));
}

#[test]
fn test_resize_drives_viewport_and_camera() {
    let mut ctx = HeadlessContext::new();
    let mut viewport = Viewport::new();
    let mut camera = Camera::default();
    assert_eq!(viewport.aspect_ratio(), 1.0);

    viewport.resize(&mut ctx, 1920, 1080).unwrap();
    camera.set_aspect_ratio(viewport.aspect_ratio());

    assert_eq!(ctx.viewport(), Some(ViewportRect::full(1920, 1080)));
    assert!((camera.aspect_ratio - 16.0 / 9.0).abs() < 1e-6);

    // Portrait windows give ratios below one, not a truncated zero
    viewport.resize(&mut ctx, 600, 800).unwrap();
    assert!((viewport.aspect_ratio() - 0.75).abs() < 1e-6);
}

#[test]
fn test_zero_height_resize_keeps_previous_state() {
    let mut ctx = HeadlessContext::new();
    let mut viewport = Viewport::new();
    viewport.resize(&mut ctx, 800, 600).unwrap();

    assert_eq!(
        viewport.resize(&mut ctx, 800, 0),
        Err(ViewportError::ZeroHeight { width: 800 })
    );
    assert_eq!((viewport.width(), viewport.height()), (800, 600));
    assert!((viewport.aspect_ratio() - 4.0 / 3.0).abs() < 1e-6);
    assert_eq!(ctx.viewport(), Some(ViewportRect::full(800, 600)));
}
