// Host-side tests for scene construction: background composition, skill-icon
// mapping and particle layout seeding.

use halo_core::geometry::Mesh;
use halo_core::{
    build_background, build_icon, BackgroundParams, BlendMode, GeometryKind, IconParams, Light,
    SceneRig, SceneVariant, SkillIcon,
};

fn particles(params: &BackgroundParams) -> Vec<glam::Vec3> {
    let (scene, rig) = build_background(params);
    let SceneRig::Background(rig) = rig else {
        panic!("background builder returned an icon rig");
    };
    match &scene.node(rig.particles).mesh {
        Mesh::Points(p) => p.clone(),
        other => panic!("particle node is not a point list: {other:?}"),
    }
}

#[test]
fn background_has_particles_knot_and_icosahedron() {
    let (scene, rig) = build_background(&BackgroundParams::with_seed(1));
    let SceneRig::Background(rig) = rig else {
        panic!("expected background rig");
    };
    assert_eq!(scene.variant(), SceneVariant::Background);
    assert_eq!(scene.nodes().len(), 3);

    let dust = scene.node(rig.particles);
    assert_eq!(dust.kind, GeometryKind::ParticleField);
    assert_eq!(dust.mesh.vertex_count(), 4000);
    assert_eq!(dust.material.blend, BlendMode::Additive);
    assert!((dust.material.opacity - 0.15).abs() < 1e-6);
    assert!((dust.material.point_size - 0.012).abs() < 1e-6);

    let knot = scene.node(rig.knot);
    assert_eq!(knot.kind, GeometryKind::TorusKnot);
    assert!(knot.material.wireframe);
    assert!((knot.material.opacity - 0.05).abs() < 1e-6);
    assert_eq!(knot.transform.position.x, 4.0);

    let ico = scene.node(rig.icosahedron);
    assert_eq!(ico.kind, GeometryKind::Icosahedron);
    assert!((ico.material.opacity - 0.1).abs() < 1e-6);
    assert_eq!(ico.transform.position.to_array(), [-5.0, -2.0, -2.0]);

    assert_eq!(scene.lights().len(), 1);
    match scene.lights()[0] {
        Light::Point { position, intensity } => {
            assert_eq!(position.to_array(), [2.0, 3.0, 4.0]);
            assert_eq!(intensity, 1.0);
        }
        ref other => panic!("unexpected light {other:?}"),
    }
}

#[test]
fn particles_fill_a_cube_of_side_twenty_five() {
    let pts = particles(&BackgroundParams::with_seed(99));
    assert_eq!(pts.len(), 4000);
    assert!(pts
        .iter()
        .all(|p| p.abs().max_element() <= 12.5 + f32::EPSILON));
    // A uniform layout over 4000 samples reaches near every face.
    let max = pts.iter().fold(0.0f32, |m, p| m.max(p.abs().max_element()));
    assert!(max > 12.0);
}

#[test]
fn seeded_layouts_are_reproducible_and_unseeded_ones_are_not() {
    let a = particles(&BackgroundParams::with_seed(42));
    let b = particles(&BackgroundParams::with_seed(42));
    let c = particles(&BackgroundParams::with_seed(43));
    assert_eq!(a, b);
    assert_ne!(a, c);

    let d = particles(&BackgroundParams::default());
    let e = particles(&BackgroundParams::default());
    assert_ne!(d, e);
}

#[test]
fn every_skill_identifier_maps_to_its_geometry() {
    let expected = [
        ("html", GeometryKind::Box),
        ("css", GeometryKind::Torus),
        ("js", GeometryKind::Icosahedron),
        ("react", GeometryKind::TorusKnot),
        ("typescript", GeometryKind::Capsule),
        ("motion", GeometryKind::Dodecahedron),
        ("three", GeometryKind::Octahedron),
        ("design", GeometryKind::Sphere),
    ];
    for (id, kind) in expected {
        let (scene, _) = build_icon(id, &IconParams::default());
        assert_eq!(scene.nodes().len(), 1, "{id}");
        assert_eq!(scene.nodes()[0].kind, kind, "{id}");
        assert_eq!(
            scene.variant(),
            SceneVariant::Icon(SkillIcon::from_identifier(id))
        );
    }
    for icon in SkillIcon::KNOWN {
        let id = icon.identifier().unwrap_or_default();
        assert_eq!(SkillIcon::from_identifier(id), icon);
    }
}

#[test]
fn unknown_identifiers_fall_back_to_the_default_cube() {
    for id in ["cobol", "", "HTML", "react "] {
        let (scene, _) = build_icon(id, &IconParams::default());
        assert_eq!(scene.variant(), SceneVariant::Icon(SkillIcon::Fallback));
        assert_eq!(scene.nodes().len(), 1);
        assert_eq!(scene.nodes()[0].kind, GeometryKind::Box);
    }
    let (cube, _) = build_icon("cobol", &IconParams::default());
    let (html, _) = build_icon("html", &IconParams::default());
    // Same topology, smaller edge.
    assert_eq!(cube.nodes()[0].mesh.edge_count(), html.nodes()[0].mesh.edge_count());
    assert_ne!(cube.nodes()[0].mesh, html.nodes()[0].mesh);
}

#[test]
fn icon_material_and_lights_match_the_card_look() {
    let (scene, _) = build_icon("react", &IconParams::default());
    let node = &scene.nodes()[0];
    assert!(node.material.wireframe);
    assert!((node.material.opacity - 0.4).abs() < 1e-6);
    assert_eq!(node.material.color, [1.0, 1.0, 1.0]);

    let lights = scene.lights();
    assert!(matches!(lights[0], Light::Ambient { intensity } if intensity == 1.5));
    assert!(matches!(lights[1], Light::Point { intensity, .. } if intensity == 2.0));
    assert!(matches!(
        lights[2],
        Light::Spot { angle, penumbra, intensity, .. }
            if angle == 0.15 && penumbra == 1.0 && intensity == 2.0
    ));
}
