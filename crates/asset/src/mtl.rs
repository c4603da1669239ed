//! Wavefront MTL subset: resolve the diffuse map (`map_Kd`) reference.
//! Everything else in the material file is ignored.

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

/// Scan a material file for the first `map_Kd` directive and return the
/// referenced texture path. Only the first occurrence is honored.
///
/// `model_dir` is the directory of the model that referenced this material
/// (trailing separator included, or empty); relative texture names are
/// resolved against it rather than the process working directory.
///
/// Returns `None` when the file cannot be opened (logged) or contains no
/// `map_Kd` line. Both cases are non-fatal: the caller proceeds without a
/// diffuse map.
pub fn resolve_diffuse_map(mtl_path: impl AsRef<Path>, model_dir: &str) -> Option<String> {
    let mtl_path = mtl_path.as_ref();
    let file = match File::open(mtl_path) {
        Ok(file) => file,
        Err(err) => {
            log::warn!("Failed to open MTL file {}: {}", mtl_path.display(), err);
            return None;
        }
    };
    resolve_diffuse_map_from_reader(BufReader::new(file), model_dir)
}

/// Reader-based variant of [`resolve_diffuse_map`].
pub fn resolve_diffuse_map_from_reader<R: BufRead>(reader: R, model_dir: &str) -> Option<String> {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                log::warn!("Failed to read MTL line: {}", err);
                return None;
            }
        };
        let mut parts = line.split_whitespace();
        if parts.next() == Some("map_Kd") {
            return parts
                .next()
                .map(|name| normalize_texture_path(name, model_dir));
        }
    }
    None
}

/// Names with a drive/scheme separator or a leading slash are kept as-is;
/// anything else is relative to the model's directory.
fn normalize_texture_path(name: &str, model_dir: &str) -> String {
    if name.contains(':') || name.starts_with('/') {
        name.to_string()
    } else {
        format!("{model_dir}{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn resolve(src: &str, dir: &str) -> Option<String> {
        resolve_diffuse_map_from_reader(Cursor::new(src), dir)
    }

    #[test]
    fn first_map_kd_wins() {
        let src = "newmtl wood\nKd 0.8 0.8 0.8\nmap_Kd wood.png\nmap_Kd bark.png\n";
        assert_eq!(resolve(src, "models/"), Some("models/wood.png".to_string()));
    }

    #[test]
    fn no_map_kd_resolves_to_none() {
        let src = "newmtl plain\nKd 1.0 1.0 1.0\n";
        assert_eq!(resolve(src, "models/"), None);
    }

    #[test]
    fn absolute_path_is_kept() {
        assert_eq!(
            resolve("map_Kd /textures/wood.png\n", "models/"),
            Some("/textures/wood.png".to_string())
        );
    }

    #[test]
    fn drive_path_is_kept() {
        assert_eq!(
            resolve("map_Kd C:\\textures\\wood.png\n", "models/"),
            Some("C:\\textures\\wood.png".to_string())
        );
    }

    #[test]
    fn map_kd_without_operand_resolves_to_none() {
        assert_eq!(resolve("map_Kd\n", "models/"), None);
    }

    #[test]
    fn missing_file_resolves_to_none() {
        assert_eq!(
            resolve_diffuse_map("/definitely/not/here.mtl", ""),
            None
        );
    }
}
