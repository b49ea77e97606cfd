//! Wavefront OBJ surface meshes.
//!
//! Only geometry is read: `v` records become points and `f` records become
//! triangles. Polygons are fan-triangulated. Texture and normal indices in
//! `v/vt/vn` face tokens are ignored and negative indices count back from the
//! last vertex read. Files ending in `.gz` are transparently (de)compressed.

use anyhow::{bail, Context, Result};
use catreg_core::{Point3, SurfaceMesh};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

fn is_gzip(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext.eq_ignore_ascii_case("gz"))
}

/// Read a surface mesh from an OBJ file.
pub fn read_obj<P: AsRef<Path>>(path: P) -> Result<SurfaceMesh> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("Failed to open mesh file {}", path.display()))?;
    let reader: Box<dyn BufRead> = if is_gzip(path) {
        Box::new(BufReader::new(GzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };
    parse_obj(reader).with_context(|| format!("Failed to parse mesh file {}", path.display()))
}

/// Parse OBJ text from any buffered reader.
pub fn parse_obj<R: BufRead>(reader: R) -> Result<SurfaceMesh> {
    let mut points: Vec<Point3> = Vec::new();
    let mut triangles: Vec<[usize; 3]> = Vec::new();
    let mut polygon: Vec<usize> = Vec::new();

    for (number, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read line")?;
        let line_no = number + 1;
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("v") => {
                let mut coords = [0.0; 3];
                for c in coords.iter_mut() {
                    let token = tokens
                        .next()
                        .with_context(|| format!("Line {}: vertex needs three coordinates", line_no))?;
                    *c = token
                        .parse()
                        .with_context(|| format!("Line {}: invalid coordinate '{}'", line_no, token))?;
                }
                points.push(Point3::new(coords[0], coords[1], coords[2]));
            }
            Some("f") => {
                polygon.clear();
                for token in tokens {
                    polygon.push(resolve_index(token, points.len(), line_no)?);
                }
                if polygon.len() < 3 {
                    bail!("Line {}: face needs at least three vertices, got {}", line_no, polygon.len());
                }
                for k in 1..polygon.len() - 1 {
                    triangles.push([polygon[0], polygon[k], polygon[k + 1]]);
                }
            }
            _ => {}
        }
    }

    Ok(SurfaceMesh::new(points, triangles)?)
}

/// Turn a face token (`7`, `7/1`, `7//3`, `-2/5/1`) into a zero-based index.
fn resolve_index(token: &str, num_points: usize, line_no: usize) -> Result<usize> {
    let raw = token.split('/').next().unwrap_or(token);
    let index: i64 = raw
        .parse()
        .with_context(|| format!("Line {}: invalid face index '{}'", line_no, token))?;
    let resolved = match index {
        0 => bail!("Line {}: face index 0 is not valid in OBJ", line_no),
        i if i > 0 => i as usize - 1,
        i => {
            let back = i.unsigned_abs() as usize;
            if back > num_points {
                bail!("Line {}: relative index {} reaches before the first vertex", line_no, i);
            }
            num_points - back
        }
    };
    Ok(resolved)
}

/// Write a surface mesh as OBJ, gzip-compressed when `path` ends in `.gz`.
pub fn write_obj<P: AsRef<Path>>(path: P, mesh: &SurfaceMesh) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("Failed to create mesh file {}", path.display()))?;
    if is_gzip(path) {
        let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
        write_obj_to(&mut encoder, mesh)?;
        encoder.finish().context("Failed to finish gzip stream")?.flush()?;
    } else {
        let mut writer = BufWriter::new(file);
        write_obj_to(&mut writer, mesh)?;
        writer.flush()?;
    }
    Ok(())
}

/// Write OBJ text to any writer.
pub fn write_obj_to<W: Write>(writer: &mut W, mesh: &SurfaceMesh) -> Result<()> {
    writeln!(
        writer,
        "# catreg surface: {} points, {} triangles",
        mesh.num_points(),
        mesh.num_triangles()
    )?;
    for p in mesh.points() {
        writeln!(writer, "v {} {} {}", p.x, p.y, p.z)?;
    }
    for [a, b, c] in mesh.triangles() {
        writeln!(writer, "f {} {} {}", a + 1, b + 1, c + 1)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_polygon_and_index_forms() {
        let text = "\
# quad with texture and normal indices
o patch
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vn 0 0 1
f 1/1/1 2/1/1 3//1 4
f -4 -2 -1
";
        let mesh = parse_obj(text.as_bytes()).unwrap();
        assert_eq!(mesh.num_points(), 4);
        assert_eq!(mesh.triangles(), &[[0, 1, 2], [0, 2, 3], [0, 2, 3]]);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_obj("v 0 0\n".as_bytes()).is_err());
        assert!(parse_obj("v 0 0 0\nf 1 2\n".as_bytes()).is_err());
        assert!(parse_obj("v 0 0 0\nf 0 1 1\n".as_bytes()).is_err());
        assert!(parse_obj("v 0 0 0\nf -2 1 1\n".as_bytes()).is_err());
        // Index past the last vertex is caught by the mesh itself.
        assert!(parse_obj("v 0 0 0\nf 1 1 5\n".as_bytes()).is_err());
    }

    #[test]
    fn test_write_text() {
        let mesh = SurfaceMesh::new(
            vec![Point3::new(0.5, 0.0, -1.0), Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 2.0, 0.0)],
            vec![[0, 1, 2]],
        )
        .unwrap();
        let mut buffer = Vec::new();
        write_obj_to(&mut buffer, &mesh).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("v 0.5 0 -1\n"));
        assert!(text.ends_with("f 1 2 3\n"));
    }
}
