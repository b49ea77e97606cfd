//! Catheter sets stored as a folder of OBJ files, one file per catheter.

use anyhow::{bail, Context, Result};
use catreg_core::{Catheter, CatheterSet};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::obj_io::{read_obj, write_obj};

const OBJ_SUFFIXES: [&str; 2] = [".obj", ".obj.gz"];

/// Catheter name for a mesh file: the file name without its OBJ suffix.
fn catheter_name(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    let lower = file_name.to_ascii_lowercase();
    OBJ_SUFFIXES
        .iter()
        .find(|suffix| lower.ends_with(*suffix))
        .map(|suffix| file_name[..file_name.len() - suffix.len()].to_string())
}

/// OBJ files directly inside `dir`, sorted by file name.
pub fn list_catheter_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        bail!("{} is not a directory", dir.display());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to scan {}", dir.display()))?;
        if entry.file_type().is_file() && catheter_name(entry.path()).is_some() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Read every catheter mesh in `dir` into a set called `name`.
///
/// Catheters are ordered by file name and named after the file stem. Files
/// are parsed in parallel.
pub fn read_catheter_folder<P: AsRef<Path>>(dir: P, name: &str) -> Result<CatheterSet> {
    let dir = dir.as_ref();
    let files = list_catheter_files(dir)?;
    if files.is_empty() {
        tracing::warn!("No catheter meshes found in {}", dir.display());
    }

    let catheters = files
        .par_iter()
        .map(|path| {
            let mesh = read_obj(path)?;
            let name = catheter_name(path).unwrap_or_default();
            tracing::debug!(
                "Read catheter '{}': {} points, {} triangles",
                name,
                mesh.num_points(),
                mesh.num_triangles()
            );
            Ok(Catheter::new(name, mesh))
        })
        .collect::<Result<Vec<_>>>()?;

    tracing::info!("Read {} catheters from {}", catheters.len(), dir.display());
    Ok(CatheterSet::from_catheters(name, catheters))
}

/// Write each catheter of `set` to `dir/<name>.obj`, creating `dir` if needed.
pub fn write_catheter_folder<P: AsRef<Path>>(dir: P, set: &CatheterSet) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    set.catheters()
        .iter()
        .map(|catheter| {
            let path = dir.join(format!("{}.obj", catheter.name));
            write_obj(&path, &catheter.mesh)?;
            Ok(path)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catheter_name() {
        assert_eq!(catheter_name(Path::new("/a/Catheter_3.obj")).as_deref(), Some("Catheter_3"));
        assert_eq!(catheter_name(Path::new("tip.OBJ.gz")).as_deref(), Some("tip"));
        assert_eq!(catheter_name(Path::new("notes.txt")), None);
        assert_eq!(catheter_name(Path::new("mesh.gz")), None);
    }
}
