//! Procedural primitives: cube, UV sphere, cylinder and N-sided prism.
//!
//! All generators emit the `PositionColorNormalUv` layout, outward normals and
//! counter-clockwise front faces in a right-handed, Y-up frame, so they render correctly with
//! back-face culling enabled.

use std::f32::consts::{PI, TAU};
use std::fmt;

use rand::Rng;

use crate::geometry::{GeometryData, GeometryError, MAX_VERTICES, Vertex};

/// The built-in shapes, with the parameters the demo scene uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum GeometryKind {
    #[default]
    Cube,
    Sphere,
    Cylinder,
    TrianglePrism,
    HexagonPrism,
}

impl GeometryKind {
    pub const ALL: [GeometryKind; 5] = [
        GeometryKind::Cube,
        GeometryKind::Sphere,
        GeometryKind::Cylinder,
        GeometryKind::TrianglePrism,
        GeometryKind::HexagonPrism,
    ];

    pub fn label(self) -> &'static str {
        match self {
            GeometryKind::Cube => "Cube",
            GeometryKind::Sphere => "Sphere",
            GeometryKind::Cylinder => "Cylinder",
            GeometryKind::TrianglePrism => "Prism (Triangle)",
            GeometryKind::HexagonPrism => "Prism (Hexagon)",
        }
    }

    /// Lower-case identifier used for generated scene object names.
    pub fn slug(self) -> &'static str {
        match self {
            GeometryKind::Cube => "cube",
            GeometryKind::Sphere => "sphere",
            GeometryKind::Cylinder => "cylinder",
            GeometryKind::TrianglePrism => "triangle_prism",
            GeometryKind::HexagonPrism => "hexagon_prism",
        }
    }

    pub fn build(self) -> Result<GeometryData, GeometryError> {
        match self {
            GeometryKind::Cube => cube(1.0),
            GeometryKind::Sphere => sphere(1.0, 32, 16),
            GeometryKind::Cylinder => cylinder(0.5, 2.0, 32),
            GeometryKind::TrianglePrism => prism(0.5, 2.0, 3),
            GeometryKind::HexagonPrism => prism(0.5, 2.0, 6),
        }
    }
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn positive(name: &'static str, value: f32) -> Result<(), GeometryError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(GeometryError::InvalidParameter {
            name,
            reason: format!("must be positive, got {value}"),
        })
    }
}

fn at_least(name: &'static str, value: u32, min: u32) -> Result<(), GeometryError> {
    if value >= min {
        Ok(())
    } else {
        Err(GeometryError::InvalidParameter {
            name,
            reason: format!("must be at least {min}, got {value}"),
        })
    }
}

fn fits_u16(count: usize) -> Result<(), GeometryError> {
    if count <= MAX_VERTICES {
        Ok(())
    } else {
        Err(GeometryError::TooManyVertices(count))
    }
}

/// Axis-aligned cube with half-extent `size` and a random colour per vertex.
pub fn cube(size: f32) -> Result<GeometryData, GeometryError> {
    let mut rng = rand::rng();
    let mut colors = [[0.0; 3]; 24];
    for color in &mut colors {
        *color = [rng.random(), rng.random(), rng.random()];
    }
    cube_with_colors(size, &colors)
}

/// Cube with explicit per-vertex colours, four per face in +Z, -Z, +Y, -Y, +X, -X order.
pub fn cube_with_colors(size: f32, colors: &[[f32; 3]; 24]) -> Result<GeometryData, GeometryError> {
    positive("size", size)?;
    let s = size;

    // position, normal, uv per corner
    #[rustfmt::skip]
    let corners: [([f32; 3], [f32; 3], [f32; 2]); 24] = [
        // Front (+Z)
        ([-s, -s,  s], [ 0.0,  0.0,  1.0], [0.0, 0.0]),
        ([ s, -s,  s], [ 0.0,  0.0,  1.0], [1.0, 0.0]),
        ([ s,  s,  s], [ 0.0,  0.0,  1.0], [1.0, 1.0]),
        ([-s,  s,  s], [ 0.0,  0.0,  1.0], [0.0, 1.0]),
        // Back (-Z)
        ([ s, -s, -s], [ 0.0,  0.0, -1.0], [0.0, 0.0]),
        ([-s, -s, -s], [ 0.0,  0.0, -1.0], [1.0, 0.0]),
        ([-s,  s, -s], [ 0.0,  0.0, -1.0], [1.0, 1.0]),
        ([ s,  s, -s], [ 0.0,  0.0, -1.0], [0.0, 1.0]),
        // Top (+Y)
        ([-s,  s,  s], [ 0.0,  1.0,  0.0], [0.0, 0.0]),
        ([ s,  s,  s], [ 0.0,  1.0,  0.0], [1.0, 0.0]),
        ([ s,  s, -s], [ 0.0,  1.0,  0.0], [1.0, 1.0]),
        ([-s,  s, -s], [ 0.0,  1.0,  0.0], [0.0, 1.0]),
        // Bottom (-Y)
        ([-s, -s, -s], [ 0.0, -1.0,  0.0], [0.0, 0.0]),
        ([ s, -s, -s], [ 0.0, -1.0,  0.0], [1.0, 0.0]),
        ([ s, -s,  s], [ 0.0, -1.0,  0.0], [1.0, 1.0]),
        ([-s, -s,  s], [ 0.0, -1.0,  0.0], [0.0, 1.0]),
        // Right (+X)
        ([ s, -s,  s], [ 1.0,  0.0,  0.0], [0.0, 0.0]),
        ([ s, -s, -s], [ 1.0,  0.0,  0.0], [1.0, 0.0]),
        ([ s,  s, -s], [ 1.0,  0.0,  0.0], [1.0, 1.0]),
        ([ s,  s,  s], [ 1.0,  0.0,  0.0], [0.0, 1.0]),
        // Left (-X)
        ([-s, -s, -s], [-1.0,  0.0,  0.0], [0.0, 0.0]),
        ([-s, -s,  s], [-1.0,  0.0,  0.0], [1.0, 0.0]),
        ([-s,  s,  s], [-1.0,  0.0,  0.0], [1.0, 1.0]),
        ([-s,  s, -s], [-1.0,  0.0,  0.0], [0.0, 1.0]),
    ];

    let vertices: Vec<Vertex> = corners
        .iter()
        .zip(colors)
        .map(|(&(position, normal, uv), &color)| Vertex::new(position, color, normal, uv))
        .collect();

    let indices = (0..6u16)
        .flat_map(|face| {
            let b = face * 4;
            [b, b + 1, b + 2, b, b + 2, b + 3]
        })
        .collect();

    GeometryData::from_vertices(&vertices, indices)
}

/// UV sphere centred at the origin.
///
/// Produces `(rings + 1) * (segments + 1)` vertices; the seam column and the pole rows are
/// duplicated so UVs stay continuous. Colour is a vertical gradient from blue at the bottom
/// to red at the top.
pub fn sphere(radius: f32, segments: u32, rings: u32) -> Result<GeometryData, GeometryError> {
    positive("radius", radius)?;
    at_least("segments", segments, 3)?;
    at_least("rings", rings, 2)?;
    fits_u16((rings as usize + 1) * (segments as usize + 1))?;

    let mut vertices = Vec::with_capacity((rings as usize + 1) * (segments as usize + 1));
    for ring in 0..=rings {
        let theta = ring as f32 * PI / rings as f32;
        let (sin_theta, cos_theta) = theta.sin_cos();

        for segment in 0..=segments {
            let phi = segment as f32 * TAU / segments as f32;
            let (sin_phi, cos_phi) = phi.sin_cos();

            let normal = [sin_theta * cos_phi, cos_theta, sin_theta * sin_phi];
            let position = normal.map(|n| n * radius);

            let t = (position[1] / radius + 1.0) / 2.0;
            let color = [t * 0.8 + 0.2, 0.5, (1.0 - t) * 0.8 + 0.2];

            let uv = [
                1.0 - segment as f32 / segments as f32,
                1.0 - ring as f32 / rings as f32,
            ];
            vertices.push(Vertex::new(position, color, normal, uv));
        }
    }

    let columns = segments as u16 + 1;
    let mut indices = Vec::with_capacity((rings * segments * 6) as usize);
    for ring in 0..rings as u16 {
        for segment in 0..segments as u16 {
            let first = ring * columns + segment;
            let second = first + columns;
            indices.extend_from_slice(&[first, first + 1, second]);
            indices.extend_from_slice(&[second, first + 1, second + 1]);
        }
    }

    GeometryData::from_vertices(&vertices, indices)
}

const CYLINDER_TOP: [f32; 3] = [1.0, 1.0, 0.0];
const CYLINDER_BOTTOM: [f32; 3] = [0.0, 1.0, 1.0];

/// Pushes interleaved top/bottom cap rings, the two cap centres and their fans.
///
/// Ring vertex `2 * i` is on the top cap, `2 * i + 1` on the bottom cap.
fn push_caps(
    vertices: &mut Vec<Vertex>,
    indices: &mut Vec<u16>,
    radius: f32,
    half_height: f32,
    sides: u32,
    top_color: [f32; 3],
    bottom_color: [f32; 3],
) {
    let base = vertices.len() as u16;
    for i in 0..=sides {
        let angle = i as f32 * TAU / sides as f32;
        let (sin, cos) = angle.sin_cos();
        let (x, z) = (radius * cos, radius * sin);
        let uv = [cos * 0.5 + 0.5, sin * 0.5 + 0.5];

        vertices.push(Vertex::new([x, half_height, z], top_color, [0.0, 1.0, 0.0], uv));
        vertices.push(Vertex::new([x, -half_height, z], bottom_color, [0.0, -1.0, 0.0], uv));
    }

    let top_center = vertices.len() as u16;
    vertices.push(Vertex::new([0.0, half_height, 0.0], top_color, [0.0, 1.0, 0.0], [0.5, 0.5]));
    let bottom_center = top_center + 1;
    vertices.push(Vertex::new([0.0, -half_height, 0.0], bottom_color, [0.0, -1.0, 0.0], [0.5, 0.5]));

    for i in 0..sides as u16 {
        let top = base + 2 * i;
        indices.extend_from_slice(&[top_center, top + 2, top]);
    }
    for i in 0..sides as u16 {
        let bottom = base + 2 * i + 1;
        indices.extend_from_slice(&[bottom_center, bottom, bottom + 2]);
    }
}

/// Capped cylinder along Y with smooth radial side normals.
///
/// The side wall has its own vertex ring so cap edges keep their flat normals.
pub fn cylinder(radius: f32, height: f32, segments: u32) -> Result<GeometryData, GeometryError> {
    positive("radius", radius)?;
    positive("height", height)?;
    at_least("segments", segments, 3)?;
    fits_u16(4 * (segments as usize + 1) + 2)?;

    let half_height = height / 2.0;
    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    push_caps(
        &mut vertices,
        &mut indices,
        radius,
        half_height,
        segments,
        CYLINDER_TOP,
        CYLINDER_BOTTOM,
    );

    let side_start = vertices.len() as u16;
    for i in 0..=segments {
        let u = i as f32 / segments as f32;
        let (sin, cos) = (u * TAU).sin_cos();
        let normal = [cos, 0.0, sin];
        let (x, z) = (radius * cos, radius * sin);

        vertices.push(Vertex::new([x, half_height, z], CYLINDER_TOP, normal, [u, 1.0]));
        vertices.push(Vertex::new([x, -half_height, z], CYLINDER_BOTTOM, normal, [u, 0.0]));
    }

    for i in 0..segments as u16 {
        let top_left = side_start + 2 * i;
        let bottom_left = top_left + 1;
        let top_right = top_left + 2;
        let bottom_right = top_right + 1;

        indices.extend_from_slice(&[top_left, top_right, bottom_left]);
        indices.extend_from_slice(&[top_right, bottom_right, bottom_left]);
    }

    GeometryData::from_vertices(&vertices, indices)
}

/// Top and bottom colours for a prism. Triangles are orange over blue, everything else
/// purple over orange.
fn prism_palette(sides: u32) -> ([f32; 3], [f32; 3]) {
    if sides == 3 {
        ([1.0, 0.5, 0.0], [0.0, 0.5, 1.0])
    } else {
        ([0.5, 0.0, 1.0], [1.0, 0.5, 0.0])
    }
}

fn lerp3(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [
        a[0] * (1.0 - t) + b[0] * t,
        a[1] * (1.0 - t) + b[1] * t,
        a[2] * (1.0 - t) + b[2] * t,
    ]
}

/// Regular N-sided prism along Y with flat side faces.
///
/// Each side is a quad with four dedicated vertices sharing the face normal. Side colour
/// blends from the top colour to the bottom colour across the side index.
pub fn prism(radius: f32, height: f32, sides: u32) -> Result<GeometryData, GeometryError> {
    positive("radius", radius)?;
    positive("height", height)?;
    at_least("sides", sides, 3)?;
    fits_u16(2 * (sides as usize + 1) + 2 + 4 * sides as usize)?;

    let half_height = height / 2.0;
    let (top_color, bottom_color) = prism_palette(sides);
    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    push_caps(
        &mut vertices,
        &mut indices,
        radius,
        half_height,
        sides,
        top_color,
        bottom_color,
    );

    let side_start = vertices.len() as u16;
    for i in 0..sides {
        let a1 = i as f32 * TAU / sides as f32;
        let a2 = (i + 1) as f32 * TAU / sides as f32;
        let (x1, z1) = (radius * a1.cos(), radius * a1.sin());
        let (x2, z2) = (radius * a2.cos(), radius * a2.sin());

        let mid = (a1 + a2) / 2.0;
        let normal = [mid.cos(), 0.0, mid.sin()];

        let t = i as f32 / sides as f32;
        let color = lerp3(top_color, bottom_color, t);
        let (u1, u2) = (t, (i + 1) as f32 / sides as f32);

        vertices.push(Vertex::new([x1, half_height, z1], color, normal, [u1, 1.0]));
        vertices.push(Vertex::new([x1, -half_height, z1], color, normal, [u1, 0.0]));
        vertices.push(Vertex::new([x2, -half_height, z2], color, normal, [u2, 0.0]));
        vertices.push(Vertex::new([x2, half_height, z2], color, normal, [u2, 1.0]));

        let base = side_start + 4 * i as u16;
        indices.extend_from_slice(&[base, base + 3, base + 1]);
        indices.extend_from_slice(&[base + 3, base + 2, base + 1]);
    }

    GeometryData::from_vertices(&vertices, indices)
}
