//! Geometry kinds, skill-icon mapping and CPU-side mesh generation.
//!
//! Solids are generated as triangle meshes, welded, and reduced to their
//! unique edges so the renderer can draw them as line lists.

use std::f32::consts::{FRAC_PI_2, PI, TAU};

use fnv::{FnvHashMap, FnvHashSet};
use glam::Vec3;
use rand::Rng;

/// Closed set of primitive shapes a drawable can use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    ParticleField,
    TorusKnot,
    Icosahedron,
    Box,
    Torus,
    Capsule,
    Sphere,
    Dodecahedron,
    Octahedron,
}

/// Parametric wireframe solid.
#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    TorusKnot {
        radius: f32,
        tube: f32,
        tubular_segments: u32,
        radial_segments: u32,
        p: u32,
        q: u32,
    },
    Icosahedron { radius: f32, detail: u32 },
    Box { size: f32 },
    Torus {
        radius: f32,
        tube: f32,
        radial_segments: u32,
        tubular_segments: u32,
    },
    Capsule {
        radius: f32,
        length: f32,
        cap_segments: u32,
        radial_segments: u32,
    },
    Sphere {
        radius: f32,
        width_segments: u32,
        height_segments: u32,
    },
    Dodecahedron { radius: f32, detail: u32 },
    Octahedron { radius: f32, detail: u32 },
}

impl Geometry {
    pub fn torus_knot(radius: f32, tube: f32, tubular_segments: u32, radial_segments: u32) -> Self {
        Geometry::TorusKnot {
            radius,
            tube,
            tubular_segments,
            radial_segments,
            p: 2,
            q: 3,
        }
    }

    pub fn kind(&self) -> GeometryKind {
        match self {
            Geometry::TorusKnot { .. } => GeometryKind::TorusKnot,
            Geometry::Icosahedron { .. } => GeometryKind::Icosahedron,
            Geometry::Box { .. } => GeometryKind::Box,
            Geometry::Torus { .. } => GeometryKind::Torus,
            Geometry::Capsule { .. } => GeometryKind::Capsule,
            Geometry::Sphere { .. } => GeometryKind::Sphere,
            Geometry::Dodecahedron { .. } => GeometryKind::Dodecahedron,
            Geometry::Octahedron { .. } => GeometryKind::Octahedron,
        }
    }

    /// Build the wireframe edge mesh for this solid.
    pub fn wireframe(&self) -> Mesh {
        let tris = match *self {
            Geometry::TorusKnot {
                radius,
                tube,
                tubular_segments,
                radial_segments,
                p,
                q,
            } => torus_knot(radius, tube, tubular_segments, radial_segments, p, q),
            Geometry::Icosahedron { radius, detail } => {
                polyhedron(&ICOSAHEDRON_VERTS, &ICOSAHEDRON_FACES, radius, detail)
            }
            Geometry::Box { size } => cuboid(size),
            Geometry::Torus {
                radius,
                tube,
                radial_segments,
                tubular_segments,
            } => torus(radius, tube, radial_segments, tubular_segments),
            Geometry::Capsule {
                radius,
                length,
                cap_segments,
                radial_segments,
            } => capsule(radius, length, cap_segments, radial_segments),
            Geometry::Sphere {
                radius,
                width_segments,
                height_segments,
            } => sphere(radius, width_segments, height_segments),
            Geometry::Dodecahedron { radius, detail } => {
                polyhedron(&dodecahedron_verts(), &DODECAHEDRON_FACES, radius, detail)
            }
            Geometry::Octahedron { radius, detail } => {
                polyhedron(&OCTAHEDRON_VERTS, &OCTAHEDRON_FACES, radius, detail)
            }
        };
        tris.weld().into_wireframe()
    }
}

/// Skill identifiers understood by the icon builder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SkillIcon {
    Html,
    Css,
    Js,
    React,
    Typescript,
    Motion,
    Three,
    Design,
    /// Anything else; rendered as the default cube.
    Fallback,
}

impl SkillIcon {
    pub const KNOWN: [SkillIcon; 8] = [
        SkillIcon::Html,
        SkillIcon::Css,
        SkillIcon::Js,
        SkillIcon::React,
        SkillIcon::Typescript,
        SkillIcon::Motion,
        SkillIcon::Three,
        SkillIcon::Design,
    ];

    /// Total mapping from identifier to icon; never fails.
    pub fn from_identifier(id: &str) -> Self {
        match id {
            "html" => SkillIcon::Html,
            "css" => SkillIcon::Css,
            "js" => SkillIcon::Js,
            "react" => SkillIcon::React,
            "typescript" => SkillIcon::Typescript,
            "motion" => SkillIcon::Motion,
            "three" => SkillIcon::Three,
            "design" => SkillIcon::Design,
            _ => SkillIcon::Fallback,
        }
    }

    pub fn identifier(self) -> Option<&'static str> {
        match self {
            SkillIcon::Html => Some("html"),
            SkillIcon::Css => Some("css"),
            SkillIcon::Js => Some("js"),
            SkillIcon::React => Some("react"),
            SkillIcon::Typescript => Some("typescript"),
            SkillIcon::Motion => Some("motion"),
            SkillIcon::Three => Some("three"),
            SkillIcon::Design => Some("design"),
            SkillIcon::Fallback => None,
        }
    }

    pub fn geometry(self) -> Geometry {
        match self {
            SkillIcon::React => Geometry::torus_knot(0.6, 0.18, 128, 16),
            SkillIcon::Js => Geometry::Icosahedron {
                radius: 0.7,
                detail: 0,
            },
            SkillIcon::Css => Geometry::Torus {
                radius: 0.5,
                tube: 0.2,
                radial_segments: 16,
                tubular_segments: 100,
            },
            SkillIcon::Html => Geometry::Box { size: 0.8 },
            SkillIcon::Three => Geometry::Octahedron {
                radius: 0.8,
                detail: 2,
            },
            SkillIcon::Motion => Geometry::Dodecahedron {
                radius: 0.7,
                detail: 0,
            },
            SkillIcon::Typescript => Geometry::Capsule {
                radius: 0.4,
                length: 0.4,
                cap_segments: 4,
                radial_segments: 12,
            },
            SkillIcon::Design => Geometry::Sphere {
                radius: 0.65,
                width_segments: 32,
                height_segments: 32,
            },
            SkillIcon::Fallback => Geometry::Box { size: 0.7 },
        }
    }
}

/// CPU-side vertex data for one drawable.
#[derive(Clone, Debug, PartialEq)]
pub enum Mesh {
    Points(Vec<Vec3>),
    /// Indexed line list: every pair of indices is one edge.
    Lines {
        positions: Vec<Vec3>,
        indices: Vec<u32>,
    },
}

impl Mesh {
    pub fn vertex_count(&self) -> usize {
        match self {
            Mesh::Points(p) => p.len(),
            Mesh::Lines { positions, .. } => positions.len(),
        }
    }

    pub fn edge_count(&self) -> usize {
        match self {
            Mesh::Points(_) => 0,
            Mesh::Lines { indices, .. } => indices.len() / 2,
        }
    }
}

/// Uniformly scatter `count` points in a cube of edge `side` centred on the origin.
pub fn particle_field(count: usize, side: f32, rng: &mut impl Rng) -> Vec<Vec3> {
    (0..count)
        .map(|_| {
            Vec3::new(
                (rng.gen::<f32>() - 0.5) * side,
                (rng.gen::<f32>() - 0.5) * side,
                (rng.gen::<f32>() - 0.5) * side,
            )
        })
        .collect()
}

// ---------------- triangle meshes ----------------

#[derive(Default)]
struct TriMesh {
    positions: Vec<Vec3>,
    indices: Vec<u32>,
}

impl TriMesh {
    fn push_tri(&mut self, a: Vec3, b: Vec3, c: Vec3) {
        let base = self.positions.len() as u32;
        self.positions.extend_from_slice(&[a, b, c]);
        self.indices.extend_from_slice(&[base, base + 1, base + 2]);
    }

    /// Merge coincident vertices (seams, poles, shared polyhedron edges).
    fn weld(self) -> Self {
        let mut lookup: FnvHashMap<[i32; 3], u32> = FnvHashMap::default();
        let mut positions = Vec::new();
        let mut remap = Vec::with_capacity(self.positions.len());
        for p in &self.positions {
            let key = [quantize(p.x), quantize(p.y), quantize(p.z)];
            let idx = *lookup.entry(key).or_insert_with(|| {
                positions.push(*p);
                (positions.len() - 1) as u32
            });
            remap.push(idx);
        }
        let indices = self.indices.iter().map(|&i| remap[i as usize]).collect();
        Self { positions, indices }
    }

    fn into_wireframe(self) -> Mesh {
        let mut seen: FnvHashSet<(u32, u32)> = FnvHashSet::default();
        let mut lines = Vec::with_capacity(self.indices.len() * 2);
        for tri in self.indices.chunks_exact(3) {
            for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
                if a == b {
                    continue;
                }
                let key = (a.min(b), a.max(b));
                if seen.insert(key) {
                    lines.push(key.0);
                    lines.push(key.1);
                }
            }
        }
        Mesh::Lines {
            positions: self.positions,
            indices: lines,
        }
    }
}

#[inline]
fn quantize(v: f32) -> i32 {
    (v * 1.0e4).round() as i32
}

/// Regular (rows+1) x (cols+1) vertex grid, two triangles per cell.
fn parametric(rows: u32, cols: u32, vertex: impl Fn(u32, u32) -> Vec3) -> TriMesh {
    let rows = rows.max(1);
    let cols = cols.max(1);
    let mut mesh = TriMesh::default();
    for r in 0..=rows {
        for c in 0..=cols {
            mesh.positions.push(vertex(r, c));
        }
    }
    let stride = cols + 1;
    for r in 0..rows {
        for c in 0..cols {
            let a = r * stride + c;
            let b = (r + 1) * stride + c;
            let d = r * stride + c + 1;
            let e = (r + 1) * stride + c + 1;
            mesh.indices.extend_from_slice(&[a, b, d, b, e, d]);
        }
    }
    mesh
}

fn knot_curve(u: f32, p: f32, q: f32, radius: f32) -> Vec3 {
    let qu_over_p = q / p * u;
    let cs = qu_over_p.cos();
    Vec3::new(
        radius * (2.0 + cs) * 0.5 * u.cos(),
        radius * (2.0 + cs) * 0.5 * u.sin(),
        radius * qu_over_p.sin() * 0.5,
    )
}

fn torus_knot(radius: f32, tube: f32, tubular: u32, radial: u32, p: u32, q: u32) -> TriMesh {
    let (p, q) = (p.max(1) as f32, q as f32);
    let tubular = tubular.max(3);
    let radial = radial.max(3);
    parametric(tubular, radial, |i, j| {
        let u = i as f32 / tubular as f32 * p * TAU;
        let p1 = knot_curve(u, p, q, radius);
        let p2 = knot_curve(u + 0.01, p, q, radius);
        let t = p2 - p1;
        let b = t.cross(p2 + p1);
        let n = b.cross(t).normalize_or_zero();
        let b = b.normalize_or_zero();
        let v = j as f32 / radial as f32 * TAU;
        p1 + n * (-tube * v.cos()) + b * (tube * v.sin())
    })
}

fn torus(radius: f32, tube: f32, radial: u32, tubular: u32) -> TriMesh {
    let radial = radial.max(3);
    let tubular = tubular.max(3);
    parametric(radial, tubular, |j, i| {
        let u = i as f32 / tubular as f32 * TAU;
        let v = j as f32 / radial as f32 * TAU;
        Vec3::new(
            (radius + tube * v.cos()) * u.cos(),
            (radius + tube * v.cos()) * u.sin(),
            tube * v.sin(),
        )
    })
}

fn sphere(radius: f32, width: u32, height: u32) -> TriMesh {
    let width = width.max(3);
    let height = height.max(2);
    parametric(height, width, |iy, ix| {
        let u = ix as f32 / width as f32;
        let v = iy as f32 / height as f32;
        Vec3::new(
            -radius * (u * TAU).cos() * (v * PI).sin(),
            radius * (v * PI).cos(),
            radius * (u * TAU).sin() * (v * PI).sin(),
        )
    })
}

/// Two hemispheres joined by a cylinder, revolved around Y.
fn capsule(radius: f32, length: f32, cap_segments: u32, radial: u32) -> TriMesh {
    let cap = cap_segments.max(1);
    let radial = radial.max(3);
    let half = length * 0.5;
    let mut profile: Vec<(f32, f32)> = Vec::with_capacity(2 * (cap as usize + 1));
    for k in 0..=cap {
        let a = -FRAC_PI_2 + k as f32 / cap as f32 * FRAC_PI_2;
        profile.push((radius * a.cos(), -half + radius * a.sin()));
    }
    for k in 0..=cap {
        let a = k as f32 / cap as f32 * FRAC_PI_2;
        profile.push((radius * a.cos(), half + radius * a.sin()));
    }
    let rows = profile.len() as u32 - 1;
    parametric(rows, radial, |r, c| {
        let (x, y) = profile[r as usize];
        let phi = c as f32 / radial as f32 * TAU;
        Vec3::new(x * phi.sin(), y, x * phi.cos())
    })
}

fn cuboid(size: f32) -> TriMesh {
    let h = size * 0.5;
    let corner = |i: usize| {
        Vec3::new(
            if i & 1 == 0 { -h } else { h },
            if i & 2 == 0 { -h } else { h },
            if i & 4 == 0 { -h } else { h },
        )
    };
    const FACES: [[usize; 4]; 6] = [
        [0, 4, 6, 2],
        [1, 3, 7, 5],
        [0, 1, 5, 4],
        [2, 6, 7, 3],
        [0, 2, 3, 1],
        [4, 5, 7, 6],
    ];
    let mut mesh = TriMesh::default();
    for [a, b, c, d] in FACES {
        mesh.push_tri(corner(a), corner(b), corner(c));
        mesh.push_tri(corner(a), corner(c), corner(d));
    }
    mesh
}

/// Subdivide each face `detail + 1` times per edge and project onto a sphere.
fn polyhedron(verts: &[[f32; 3]], faces: &[[usize; 3]], radius: f32, detail: u32) -> TriMesh {
    let cols = detail as usize + 1;
    let mut mesh = TriMesh::default();
    for face in faces {
        let a = Vec3::from(verts[face[0]]);
        let b = Vec3::from(verts[face[1]]);
        let c = Vec3::from(verts[face[2]]);
        let mut grid: Vec<Vec<Vec3>> = Vec::with_capacity(cols + 1);
        for i in 0..=cols {
            let t = i as f32 / cols as f32;
            let aj = a.lerp(c, t);
            let bj = b.lerp(c, t);
            let rows = cols - i;
            let row = (0..=rows)
                .map(|j| {
                    if rows == 0 {
                        aj
                    } else {
                        aj.lerp(bj, j as f32 / rows as f32)
                    }
                })
                .collect();
            grid.push(row);
        }
        for i in 0..cols {
            for j in 0..(2 * (cols - i) - 1) {
                let k = j / 2;
                if j % 2 == 0 {
                    mesh.push_tri(grid[i][k + 1], grid[i + 1][k], grid[i][k]);
                } else {
                    mesh.push_tri(grid[i][k + 1], grid[i + 1][k + 1], grid[i + 1][k]);
                }
            }
        }
    }
    for p in mesh.positions.iter_mut() {
        *p = p.normalize_or_zero() * radius;
    }
    mesh
}

const GOLDEN: f32 = 1.618_034;

const ICOSAHEDRON_VERTS: [[f32; 3]; 12] = [
    [-1.0, GOLDEN, 0.0],
    [1.0, GOLDEN, 0.0],
    [-1.0, -GOLDEN, 0.0],
    [1.0, -GOLDEN, 0.0],
    [0.0, -1.0, GOLDEN],
    [0.0, 1.0, GOLDEN],
    [0.0, -1.0, -GOLDEN],
    [0.0, 1.0, -GOLDEN],
    [GOLDEN, 0.0, -1.0],
    [GOLDEN, 0.0, 1.0],
    [-GOLDEN, 0.0, -1.0],
    [-GOLDEN, 0.0, 1.0],
];

const ICOSAHEDRON_FACES: [[usize; 3]; 20] = [
    [0, 11, 5],
    [0, 5, 1],
    [0, 1, 7],
    [0, 7, 10],
    [0, 10, 11],
    [1, 5, 9],
    [5, 11, 4],
    [11, 10, 2],
    [10, 7, 6],
    [7, 1, 8],
    [3, 9, 4],
    [3, 4, 2],
    [3, 2, 6],
    [3, 6, 8],
    [3, 8, 9],
    [4, 9, 5],
    [2, 4, 11],
    [6, 2, 10],
    [8, 6, 7],
    [9, 8, 1],
];

const OCTAHEDRON_VERTS: [[f32; 3]; 6] = [
    [1.0, 0.0, 0.0],
    [-1.0, 0.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, -1.0, 0.0],
    [0.0, 0.0, 1.0],
    [0.0, 0.0, -1.0],
];

const OCTAHEDRON_FACES: [[usize; 3]; 8] = [
    [0, 2, 4],
    [0, 4, 3],
    [0, 3, 5],
    [0, 5, 2],
    [1, 2, 5],
    [1, 5, 3],
    [1, 3, 4],
    [1, 4, 2],
];

fn dodecahedron_verts() -> [[f32; 3]; 20] {
    let t = GOLDEN;
    let r = 1.0 / GOLDEN;
    [
        [-1.0, -1.0, -1.0],
        [-1.0, -1.0, 1.0],
        [-1.0, 1.0, -1.0],
        [-1.0, 1.0, 1.0],
        [1.0, -1.0, -1.0],
        [1.0, -1.0, 1.0],
        [1.0, 1.0, -1.0],
        [1.0, 1.0, 1.0],
        [0.0, -r, -t],
        [0.0, -r, t],
        [0.0, r, -t],
        [0.0, r, t],
        [-r, -t, 0.0],
        [-r, t, 0.0],
        [r, -t, 0.0],
        [r, t, 0.0],
        [-t, 0.0, -r],
        [t, 0.0, -r],
        [-t, 0.0, r],
        [t, 0.0, r],
    ]
}

// Twelve pentagons, three triangles each.
const DODECAHEDRON_FACES: [[usize; 3]; 36] = [
    [3, 11, 7],
    [3, 7, 15],
    [3, 15, 13],
    [7, 19, 17],
    [7, 17, 6],
    [7, 6, 15],
    [17, 4, 8],
    [17, 8, 10],
    [17, 10, 6],
    [8, 0, 16],
    [8, 16, 2],
    [8, 2, 10],
    [0, 12, 1],
    [0, 1, 18],
    [0, 18, 16],
    [6, 10, 2],
    [6, 2, 13],
    [6, 13, 15],
    [2, 16, 18],
    [2, 18, 3],
    [2, 3, 13],
    [18, 1, 9],
    [18, 9, 11],
    [18, 11, 3],
    [4, 14, 12],
    [4, 12, 0],
    [4, 0, 8],
    [11, 9, 5],
    [11, 5, 19],
    [11, 19, 7],
    [19, 5, 14],
    [19, 14, 4],
    [19, 4, 17],
    [1, 12, 14],
    [1, 14, 5],
    [1, 5, 9],
];

#[cfg(test)]
mod tests {
    use super::*;

    fn edges(mesh: &Mesh) -> Vec<(u32, u32)> {
        match mesh {
            Mesh::Lines { indices, .. } => {
                indices.chunks_exact(2).map(|e| (e[0], e[1])).collect()
            }
            Mesh::Points(_) => Vec::new(),
        }
    }

    #[test]
    fn platonic_solids_have_expected_edge_counts() {
        let ico = Geometry::Icosahedron {
            radius: 1.0,
            detail: 0,
        };
        assert_eq!(ico.wireframe().edge_count(), 30);
        assert_eq!(ico.wireframe().vertex_count(), 12);

        let ico1 = Geometry::Icosahedron {
            radius: 1.0,
            detail: 1,
        };
        assert_eq!(ico1.wireframe().edge_count(), 120);

        let oct = Geometry::Octahedron {
            radius: 1.0,
            detail: 0,
        };
        assert_eq!(oct.wireframe().edge_count(), 12);

        let dodeca = Geometry::Dodecahedron {
            radius: 1.0,
            detail: 0,
        };
        assert_eq!(dodeca.wireframe().vertex_count(), 20);
    }

    #[test]
    fn box_shows_face_diagonals() {
        // 12 cube edges plus one diagonal per face
        assert_eq!(Geometry::Box { size: 1.0 }.wireframe().edge_count(), 18);
    }

    #[test]
    fn polyhedra_vertices_lie_on_radius() {
        let mesh = Geometry::Octahedron {
            radius: 0.8,
            detail: 2,
        }
        .wireframe();
        let Mesh::Lines { positions, .. } = mesh else {
            panic!("expected lines");
        };
        for p in positions {
            assert!((p.length() - 0.8).abs() < 1e-4);
        }
    }

    #[test]
    fn wireframes_have_no_duplicate_or_degenerate_edges() {
        for icon in SkillIcon::KNOWN {
            let mesh = icon.geometry().wireframe();
            let list = edges(&mesh);
            let unique: FnvHashSet<(u32, u32)> = list.iter().copied().collect();
            assert_eq!(unique.len(), list.len(), "{icon:?} has duplicate edges");
            assert!(list.iter().all(|(a, b)| a != b), "{icon:?} has degenerate edges");
            assert!(!list.is_empty());
        }
    }

    #[test]
    fn particle_field_stays_inside_cube() {
        use rand::SeedableRng;
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let pts = particle_field(500, 25.0, &mut rng);
        assert_eq!(pts.len(), 500);
        assert!(pts
            .iter()
            .all(|p| p.abs().max_element() <= 12.5 && p.is_finite()));
    }
}
