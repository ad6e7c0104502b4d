use mr_ngin::{
    cgmath::{Matrix4, SquareMatrix, Vector3},
    data_structures::scene_graph::SceneGraph,
    error::{ErrorKind, SceneError},
    placement::{self, Placement},
    tracking::Trackable,
};

use crate::common::test_utils::{MemoryAsset, MemoryRepository, hit, plane_hit};

mod common;

fn asset(name: &str) -> MemoryAsset {
    MemoryAsset {
        name: name.to_string(),
    }
}

fn scene_with(
    repo: &mut MemoryRepository,
    names: &[&str],
) -> SceneGraph<MemoryRepository> {
    let mut scene = SceneGraph::new();
    for name in names {
        scene.add_model(repo, name, asset(name));
    }
    scene
}

#[test]
fn add_model_is_idempotent_by_name() {
    let mut repo = MemoryRepository::new();
    let mut scene = SceneGraph::new();

    assert_eq!(scene.add_model(&mut repo, "chair", asset("chair")), 0);
    assert_eq!(scene.add_model(&mut repo, "lamp", asset("lamp")), 1);
    assert_eq!(scene.add_model(&mut repo, "chair", asset("chair")), 0);

    assert_eq!(scene.models().len(), 2);
    // the duplicate asset went back to the repository
    assert_eq!(repo.destroyed, vec!["chair".to_string()]);
}

#[test]
fn placing_an_unknown_model_leaves_the_scene_unchanged() {
    let mut repo = MemoryRepository::new();
    let mut scene = scene_with(&mut repo, &["chair"]);

    let err = scene
        .place_object(&mut repo, 3, Matrix4::identity())
        .unwrap_err();

    assert!(matches!(err, SceneError::InvalidReference { index: 3, len: 1 }));
    assert_eq!(err.kind(), ErrorKind::InvalidReference);
    assert!(scene.placed_objects().is_empty());
    assert!(repo.attached.is_empty());
}

#[test]
fn placed_objects_get_fresh_attached_instances() {
    let mut repo = MemoryRepository::new();
    let mut scene = scene_with(&mut repo, &["chair"]);
    let moved = Matrix4::from_translation(Vector3::new(1.0, 0.0, 0.0));

    let first = scene
        .place_object(&mut repo, 0, Matrix4::identity())
        .unwrap();
    let second = scene.place_object(&mut repo, 0, moved).unwrap();

    assert_ne!(first, second);
    let placed = scene.placed_objects();
    assert_eq!(placed.len(), 2);
    assert_ne!(placed[0].instance, placed[1].instance);
    assert_eq!(repo.attached.len(), 2);
    assert_eq!(repo.transforms[&placed[1].instance.0], moved);
}

#[test]
fn non_rigid_transforms_are_rejected() {
    let mut repo = MemoryRepository::new();
    let mut scene = scene_with(&mut repo, &["chair"]);
    let scaled = Matrix4::from_scale(2.0);
    let mut non_finite = Matrix4::identity();
    non_finite.w.x = f32::NAN;

    for transform in [scaled, non_finite] {
        let err = scene.place_object(&mut repo, 0, transform).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransform);
    }
    assert!(scene.placed_objects().is_empty());
    assert!(repo.attached.is_empty());
    assert!(repo.transforms.is_empty());
}

#[test]
fn clear_all_detaches_everything_but_keeps_models() {
    let mut repo = MemoryRepository::new();
    let mut scene = scene_with(&mut repo, &["chair", "lamp"]);
    scene
        .place_object(&mut repo, 0, Matrix4::identity())
        .unwrap();
    scene
        .place_object(&mut repo, 1, Matrix4::identity())
        .unwrap();

    assert_eq!(scene.clear_all(&mut repo), 2);

    assert!(scene.placed_objects().is_empty());
    assert_eq!(scene.models().len(), 2);
    assert!(repo.attached.is_empty());
    assert_eq!(repo.released.len(), 2);
}

#[test]
fn selection_wraps_around_the_loaded_models() {
    let mut repo = MemoryRepository::new();
    let mut scene = scene_with(&mut repo, &["a", "b", "c"]);

    scene.select(1).unwrap();
    for _ in 0..3 {
        scene.selection_next();
    }
    assert_eq!(scene.selection(), Some(1));

    assert_eq!(scene.selection_next(), Some(2));
    assert_eq!(scene.selection_next(), Some(0));
}

#[test]
fn selection_next_without_models_is_a_no_op() {
    let mut scene: SceneGraph<MemoryRepository> = SceneGraph::new();
    assert_eq!(scene.selection_next(), None);
    assert!(scene.select(0).is_err());
}

#[test]
fn first_qualifying_hit_wins() {
    let mut repo = MemoryRepository::new();
    let mut scene = scene_with(&mut repo, &["chair"]);
    scene.select(0).unwrap();

    let hits = vec![
        hit(Trackable::Plane { contains_pose: false }, 0.0, 0.0, -0.5),
        hit(
            Trackable::Point {
                orientation_estimated: false,
            },
            0.0,
            0.0,
            -0.7,
        ),
        hit(
            Trackable::Point {
                orientation_estimated: true,
            },
            0.0,
            0.0,
            -1.0,
        ),
        plane_hit(0.0, 0.0, -2.0, 2.0),
    ];

    let placement = placement::resolve(&mut scene, &mut repo, || hits).unwrap();

    assert!(matches!(placement, Placement::Placed(_)));
    let placed = &scene.placed_objects()[0];
    assert_eq!(placed.model_index, 0);
    assert_eq!(placed.transform.w.z, -1.0);
}

#[test]
fn no_qualifying_hit_is_a_miss() {
    let mut repo = MemoryRepository::new();
    let mut scene = scene_with(&mut repo, &["chair"]);
    scene.select(0).unwrap();

    let hits = vec![hit(Trackable::Plane { contains_pose: false }, 0.0, 0.0, -1.0)];
    let placement = placement::resolve(&mut scene, &mut repo, || hits).unwrap();

    assert_eq!(placement, Placement::Missed);
    assert!(scene.placed_objects().is_empty());
}

#[test]
fn tap_without_selection_never_runs_the_hit_test() {
    let mut repo = MemoryRepository::new();
    let mut scene = scene_with(&mut repo, &["chair"]);
    let mut hit_tests = 0;

    let err = placement::resolve(&mut scene, &mut repo, || {
        hit_tests += 1;
        vec![plane_hit(0.0, 0.0, -1.0, 1.0)]
    })
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NoModelSelected);
    assert_eq!(hit_tests, 0);
    assert!(scene.placed_objects().is_empty());
}

#[test]
fn release_destroys_every_asset() {
    let mut repo = MemoryRepository::new();
    let mut scene = scene_with(&mut repo, &["chair", "lamp"]);
    scene
        .place_object(&mut repo, 1, Matrix4::identity())
        .unwrap();

    scene.release(&mut repo);

    assert!(repo.attached.is_empty());
    assert_eq!(repo.destroyed, vec!["chair".to_string(), "lamp".to_string()]);
}
