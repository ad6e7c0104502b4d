use mr_ngin::{
    cgmath::{Matrix4, Vector3},
    data_structures::scene_graph::SceneGraph,
    error::ErrorKind,
    resources::{ModelRepository, model::GltfRepository},
};

const MINIMAL_GLTF: &str = r#"{
    "asset": { "version": "2.0" },
    "nodes": [ { "name": "seat" }, { "name": "back" } ],
    "scenes": [ { "nodes": [0, 1] } ]
}"#;

#[test]
fn decodes_gltf_documents() {
    let mut repo = GltfRepository::new();
    let asset = repo.load_asset("chair.gltf", MINIMAL_GLTF.as_bytes()).unwrap();

    assert_eq!(asset.name, "chair.gltf");
    assert_eq!(asset.nodes, 2);
    assert_eq!(asset.meshes, 0);
    assert_eq!(repo.live_assets(), 1);
}

#[test]
fn rejects_undecodable_bytes() {
    let mut repo = GltfRepository::new();
    let err = repo.load_asset("chair.glb", b"definitely not gltf").unwrap_err();

    assert_eq!(err.kind(), ErrorKind::AssetLoadFailure);
    assert!(err.to_string().contains("chair.glb"));
    assert_eq!(repo.live_assets(), 0);
}

#[test]
fn placements_become_attached_entity_groups() {
    let mut repo = GltfRepository::new();
    let mut scene = SceneGraph::new();
    let asset = repo.load_asset("chair.gltf", MINIMAL_GLTF.as_bytes()).unwrap();
    let index = scene.add_model(&mut repo, "chair.gltf", asset);
    let transform = Matrix4::from_translation(Vector3::new(0.5, 0.0, -1.0));

    scene.place_object(&mut repo, index, transform).unwrap();
    scene.place_object(&mut repo, index, transform).unwrap();

    let placed = scene.placed_objects();
    assert_ne!(placed[0].instance.root, placed[1].instance.root);
    assert!(repo.is_attached(&placed[0].instance));
    assert_eq!(repo.root_transform(&placed[1].instance), Some(&transform));
    // a root entity plus one per node, for each placement
    assert_eq!(repo.renderable_count(), 6);

    scene.clear_all(&mut repo);
    assert_eq!(repo.renderable_count(), 0);
    scene.release(&mut repo);
    assert_eq!(repo.live_assets(), 0);
}
