//! Wavefront OBJ import.
//!
//! Supports the subset real-world exports mostly use: `v`, `vt`, `vn` and `f` records, with
//! face corners written as `v`, `v/vt`, `v/vt/vn` or `v//vn`. Indices are 1-based; negative
//! indices count back from the most recent element.
//!
//! The parser is deliberately lenient. Unknown records are skipped, missing or unparsable
//! numbers read as `0`, and out-of-range references fall back to defaults. Only I/O failures
//! and vertex counts past the 16-bit index limit are errors.
//!
//! Output uses the `PositionColorNormalUv` layout with a flat light-grey colour. N-gons are
//! fan-triangulated from their first corner, corners sharing the same `(v, vt, vn)` triple
//! share a vertex, and `v` texture coordinates are flipped to `1 - v`.

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;

use crate::geometry::{GeometryData, GeometryError, Vertex};

/// Colour assigned to every imported vertex.
pub const DEFAULT_COLOR: [f32; 3] = [0.7, 0.7, 0.7];

#[derive(Debug, Error)]
pub enum ObjError {
    #[error("failed to read OBJ file: {0}")]
    Io(#[from] std::io::Error),
    #[error("OBJ data does not fit a geometry buffer: {0}")]
    Geometry(#[from] GeometryError),
}

/// Reads and parses an OBJ file from disk.
pub fn load(path: impl AsRef<Path>) -> Result<GeometryData, ObjError> {
    let text = std::fs::read_to_string(path.as_ref())?;
    let geometry = parse(&text)?;
    log::debug!(
        "loaded {}: {} vertices, {} triangles",
        path.as_ref().display(),
        geometry.vertex_count(),
        geometry.index_count() / 3
    );
    Ok(geometry)
}

type CornerKey = (Option<usize>, Option<usize>, Option<usize>);

#[derive(Default)]
struct ObjParser {
    positions: Vec<[f32; 3]>,
    uvs: Vec<[f32; 2]>,
    normals: Vec<[f32; 3]>,
    faces: Vec<Vec<CornerKey>>,
}

fn number(parts: &[&str], i: usize) -> f32 {
    parts.get(i).and_then(|s| s.parse().ok()).unwrap_or(0.0)
}

/// Resolves a 1-based or negative OBJ index against `len` elements.
fn resolve(raw: Option<&str>, len: usize) -> Option<usize> {
    let index: i64 = raw?.parse().ok()?;
    let resolved = match index {
        0 => return None,
        i if i > 0 => i - 1,
        i => len as i64 + i,
    };
    usize::try_from(resolved).ok()
}

impl ObjParser {
    fn line(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts[0] {
            "v" => self
                .positions
                .push([number(&parts, 1), number(&parts, 2), number(&parts, 3)]),
            "vt" => self.uvs.push([number(&parts, 1), number(&parts, 2)]),
            "vn" => self
                .normals
                .push([number(&parts, 1), number(&parts, 2), number(&parts, 3)]),
            "f" => {
                let face = parts[1..].iter().map(|corner| self.corner(corner)).collect();
                self.faces.push(face);
            }
            other => log::trace!("skipping OBJ record `{other}`"),
        }
    }

    fn corner(&self, corner: &str) -> CornerKey {
        let mut fields = corner.split('/');
        let v = resolve(fields.next(), self.positions.len());
        let vt = resolve(fields.next().filter(|s| !s.is_empty()), self.uvs.len());
        let vn = resolve(fields.next(), self.normals.len());
        (v, vt, vn)
    }

    fn vertex(&self, (v, vt, vn): CornerKey) -> Vertex {
        let position = v.and_then(|i| self.positions.get(i)).copied().unwrap_or_default();
        let uv = vt.and_then(|i| self.uvs.get(i)).copied().unwrap_or_default();
        let normal = vn.and_then(|i| self.normals.get(i)).copied().unwrap_or_default();
        Vertex::new(position, DEFAULT_COLOR, normal, [uv[0], 1.0 - uv[1]])
    }

    fn build(self) -> Result<GeometryData, GeometryError> {
        let mut vertices = Vec::new();
        let mut indices = Vec::new();
        let mut seen: HashMap<CornerKey, u16> = HashMap::new();

        for face in &self.faces {
            for i in 1..face.len().saturating_sub(1) {
                for key in [face[0], face[i], face[i + 1]] {
                    let index = match seen.get(&key) {
                        Some(&index) => index,
                        None => {
                            let index = u16::try_from(vertices.len())
                                .map_err(|_| GeometryError::TooManyVertices(vertices.len() + 1))?;
                            vertices.push(self.vertex(key));
                            seen.insert(key, index);
                            index
                        }
                    };
                    indices.push(index);
                }
            }
        }

        let geometry = GeometryData::from_vertices(&vertices, indices)?;
        if self.normals.is_empty() {
            Ok(geometry.with_smooth_normals())
        } else {
            Ok(geometry)
        }
    }
}

/// Parses OBJ text into geometry. Files without `vn` records get smooth normals.
pub fn parse(text: &str) -> Result<GeometryData, GeometryError> {
    let mut parser = ObjParser::default();
    for line in text.lines() {
        parser.line(line);
    }
    parser.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_triangle_uses_defaults() {
        let geometry = parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();

        assert_eq!(geometry.vertex_count(), 3);
        assert_eq!(geometry.indices(), &[0, 1, 2]);
        for v in geometry.iter_vertices() {
            assert_eq!(v.color, DEFAULT_COLOR);
            assert_eq!(v.uv, [0.0, 1.0]);
            // smooth normals derived from the counter-clockwise face
            assert!((v.normal[2] - 1.0).abs() < 0.001);
        }
    }

    #[test]
    fn quads_fan_and_share_corners() {
        let text = "\
# a unit quad
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1

f 1/1/1 2/2/1 3/3/1 4/4/1
";
        let geometry = parse(text).unwrap();
        assert_eq!(geometry.vertex_count(), 4);
        assert_eq!(geometry.indices(), &[0, 1, 2, 0, 2, 3]);

        let third = geometry.vertex(2).unwrap();
        assert_eq!(third.uv, [1.0, 0.0]);
        assert_eq!(third.normal, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn distinct_uvs_split_vertices() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvt 1 1\nf 1/1 2/1 3/1\nf 1/2 3/1 2/1\n";
        let geometry = parse(text).unwrap();
        // corner 1 appears with two different uvs
        assert_eq!(geometry.vertex_count(), 4);
        assert_eq!(geometry.index_count(), 6);
    }

    #[test]
    fn normal_only_corners() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 -1\nf 1//1 2//1 3//1\n";
        let geometry = parse(text).unwrap();
        let v = geometry.vertex(0).unwrap();
        assert_eq!(v.normal, [0.0, 0.0, -1.0]);
        assert_eq!(v.uv, [0.0, 1.0]);
    }

    #[test]
    fn negative_indices_are_relative() {
        let text = "v 0 0 0\nv 2 0 0\nv 0 2 0\nf -3 -2 -1\n";
        let geometry = parse(text).unwrap();
        assert_eq!(geometry.vertex(1).unwrap().position, [2.0, 0.0, 0.0]);
    }

    #[test]
    fn lenient_about_junk() {
        let text = "mtllib scene.mtl\no thing\nv 1\nv 1 2 x\nv 0 0 1\ns off\nusemtl red\nf 1 2 3 \nf 1 2\n";
        let geometry = parse(text).unwrap();
        assert_eq!(geometry.vertex_count(), 3);
        assert_eq!(geometry.index_count(), 3);
        assert_eq!(geometry.vertex(0).unwrap().position, [1.0, 0.0, 0.0]);
        assert_eq!(geometry.vertex(1).unwrap().position, [1.0, 2.0, 0.0]);
    }

    #[test]
    fn empty_input_is_empty_geometry() {
        let geometry = parse("# nothing here\n\n").unwrap();
        assert_eq!(geometry.vertex_count(), 0);
        assert_eq!(geometry.index_count(), 0);
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = load("does/not/exist.obj").unwrap_err();
        assert!(matches!(err, ObjError::Io(_)));
    }
}
