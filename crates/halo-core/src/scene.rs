//! Scene graph and the two scene variants (background, icon).

use glam::{EulerRot, Mat4, Quat, Vec3};
use rand::rngs::StdRng;
use rand::SeedableRng;
use smallvec::{smallvec, SmallVec};

use crate::config::{BackgroundParams, IconParams};
use crate::constants::*;
use crate::geometry::{particle_field, Geometry, GeometryKind, Mesh, SkillIcon};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlendMode {
    Alpha,
    Additive,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub color: [f32; 3],
    pub opacity: f32,
    pub wireframe: bool,
    pub blend: BlendMode,
    /// World-space point size; only meaningful for particle fields.
    pub point_size: f32,
    /// Constant self-illumination added on top of lighting.
    pub emissive: f32,
}

impl Material {
    pub fn wireframe(opacity: f32) -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            opacity,
            wireframe: true,
            blend: BlendMode::Alpha,
            point_size: 0.0,
            emissive: 0.0,
        }
    }

    pub fn points(size: f32, opacity: f32) -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            opacity,
            wireframe: false,
            blend: BlendMode::Additive,
            point_size: size,
            emissive: 0.0,
        }
    }
}

/// Position, XYZ Euler rotation (radians) and scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn matrix(&self) -> Mat4 {
        let rot = Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        );
        Mat4::from_scale_rotation_translation(self.scale, rot, self.position)
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.rotation.is_finite() && self.scale.is_finite()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Light {
    Ambient {
        intensity: f32,
    },
    Point {
        position: Vec3,
        intensity: f32,
    },
    Spot {
        position: Vec3,
        angle: f32,
        penumbra: f32,
        intensity: f32,
    },
}

/// One geometry + material + transform unit submitted each frame.
#[derive(Clone, Debug)]
pub struct Drawable {
    pub kind: GeometryKind,
    pub mesh: Mesh,
    pub material: Material,
    pub transform: Transform,
}

/// Index of a drawable inside its [`SceneGraph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SceneVariant {
    Background,
    Icon(SkillIcon),
}

/// Ordered drawables plus lights. Node count and kinds are fixed once built;
/// only transforms change afterwards.
#[derive(Clone, Debug)]
pub struct SceneGraph {
    variant: SceneVariant,
    nodes: Vec<Drawable>,
    lights: SmallVec<[Light; 4]>,
}

impl SceneGraph {
    #[inline]
    pub fn variant(&self) -> SceneVariant {
        self.variant
    }

    #[inline]
    pub fn nodes(&self) -> &[Drawable] {
        &self.nodes
    }

    #[inline]
    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &Drawable {
        &self.nodes[id.0]
    }

    #[inline]
    pub fn transform_mut(&mut self, id: NodeId) -> &mut Transform {
        &mut self.nodes[id.0].transform
    }
}

/// Node handles of the background variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackgroundRig {
    pub particles: NodeId,
    pub knot: NodeId,
    pub icosahedron: NodeId,
}

/// Node handle of the icon variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IconRig {
    pub mesh: NodeId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SceneRig {
    Background(BackgroundRig),
    Icon(IconRig),
}

#[derive(Default)]
struct GraphBuilder {
    nodes: Vec<Drawable>,
    lights: SmallVec<[Light; 4]>,
}

impl GraphBuilder {
    fn add(
        &mut self,
        kind: GeometryKind,
        mesh: Mesh,
        material: Material,
        transform: Transform,
    ) -> NodeId {
        self.nodes.push(Drawable {
            kind,
            mesh,
            material,
            transform,
        });
        NodeId(self.nodes.len() - 1)
    }

    fn add_solid(
        &mut self,
        geometry: &Geometry,
        material: Material,
        transform: Transform,
    ) -> NodeId {
        self.add(geometry.kind(), geometry.wireframe(), material, transform)
    }

    fn finish(self, variant: SceneVariant) -> SceneGraph {
        SceneGraph {
            variant,
            nodes: self.nodes,
            lights: self.lights,
        }
    }
}

/// Build the full-viewport background: dust field, torus knot, icosahedron.
///
/// The particle layout is drawn once here from `params.seed` (or entropy).
pub fn build_background(params: &BackgroundParams) -> (SceneGraph, SceneRig) {
    let mut rng = match params.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let points = particle_field(params.particle_count, params.cube_side, &mut rng);

    let mut b = GraphBuilder::default();
    let particles = b.add(
        GeometryKind::ParticleField,
        Mesh::Points(points),
        Material::points(params.particle_size, params.particle_opacity),
        Transform::default(),
    );
    let knot = b.add_solid(
        &Geometry::torus_knot(
            KNOT_RADIUS,
            KNOT_TUBE,
            KNOT_TUBULAR_SEGMENTS,
            KNOT_RADIAL_SEGMENTS,
        ),
        Material::wireframe(params.knot_opacity),
        Transform::at(Vec3::new(KNOT_BASE_X, 0.0, 0.0)),
    );
    let icosahedron = b.add_solid(
        &Geometry::Icosahedron {
            radius: ICOSAHEDRON_RADIUS,
            detail: ICOSAHEDRON_DETAIL,
        },
        Material::wireframe(params.icosahedron_opacity),
        Transform::at(Vec3::from(ICOSAHEDRON_POSITION)),
    );
    b.lights.push(Light::Point {
        position: Vec3::from(BACKGROUND_LIGHT_POSITION),
        intensity: BACKGROUND_LIGHT_INTENSITY,
    });

    let rig = BackgroundRig {
        particles,
        knot,
        icosahedron,
    };
    (b.finish(SceneVariant::Background), SceneRig::Background(rig))
}

/// Build a single-icon scene. Unknown identifiers fall back to a cube.
pub fn build_icon(identifier: &str, params: &IconParams) -> (SceneGraph, SceneRig) {
    let icon = SkillIcon::from_identifier(identifier);
    if icon == SkillIcon::Fallback {
        log::debug!("[scene] unknown icon '{}', using default cube", identifier);
    }
    let mut material = Material::wireframe(params.opacity);
    material.emissive = params.emissive;

    let mut b = GraphBuilder::default();
    let mesh = b.add_solid(&icon.geometry(), material, Transform::default());
    b.lights = smallvec![
        Light::Ambient {
            intensity: ICON_AMBIENT_INTENSITY,
        },
        Light::Point {
            position: Vec3::from(ICON_POINT_LIGHT_POSITION),
            intensity: ICON_LIGHT_INTENSITY,
        },
        Light::Spot {
            position: Vec3::from(ICON_SPOT_LIGHT_POSITION),
            angle: ICON_SPOT_ANGLE,
            penumbra: ICON_SPOT_PENUMBRA,
            intensity: ICON_LIGHT_INTENSITY,
        },
    ];
    (b.finish(SceneVariant::Icon(icon)), SceneRig::Icon(IconRig { mesh }))
}
