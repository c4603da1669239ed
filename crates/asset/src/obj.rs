//! Wavefront OBJ subset parser and flat-vertex-buffer assembler.
//!
//! Recognized line types: `v`, `vt`, `vn`, `f`, `mtllib`; everything else
//! is ignored. Face corners use the `pos[/[tex][/[norm]]]` grammar with
//! 1-based indices. Each corner is emitted as a fresh interleaved vertex in
//! file order; there is no deduplication and no triangulation of faces with
//! more than three corners (such faces are flagged, since a strict triangle
//! consumer will render them malformed).

use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};

use anyhow::{Context, Result};
use thiserror::Error;

use crate::model::{LoadOptions, ModelData};
use crate::mtl;

/// Constant vertex color emitted when [`LoadOptions::include_color`] is set.
/// The format subset carries no material colors.
const FLAT_COLOR: [f32; 3] = [1.0, 0.0, 0.0];

/// Typed failure modes of the loader. Everything else in the format is
/// handled permissively (defaults and warnings, never a crash).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ObjError {
    #[error("invalid position index '{token}' on line {line}")]
    InvalidPositionIndex { token: String, line: usize },
    #[error("position index {index} out of range for {pool_len} positions on line {line}")]
    PositionIndexOutOfRange {
        index: usize,
        pool_len: usize,
        line: usize,
    },
    #[error("no face corners found in OBJ input")]
    EmptyModel,
}

/// Load a model from a file path. Relative `mtllib`/`map_Kd` references are
/// resolved against the model's own directory.
pub fn load_obj_from_path(path: impl AsRef<Path>, options: LoadOptions) -> Result<ModelData> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open OBJ file: {}", path.display()))?;
    let dir = model_directory(path);
    parse_obj(BufReader::new(file), options, &dir)
}

/// Load a model from a [`BufRead`] implementation. `model_dir` is prefixed
/// to relative material references (trailing separator included, or empty).
pub fn load_obj_from_reader<R: BufRead>(
    reader: R,
    options: LoadOptions,
    model_dir: &str,
) -> Result<ModelData> {
    parse_obj(reader, options, model_dir)
}

/// Convenience helper to parse an OBJ string literal.
pub fn load_obj_from_str(contents: &str, options: LoadOptions) -> Result<ModelData> {
    parse_obj(io::Cursor::new(contents), options, "")
}

/// Everything up to and including the last path separator, as a string the
/// material resolver can prefix to relative names.
fn model_directory(path: &Path) -> String {
    let raw = path.to_string_lossy();
    match raw.rfind(['/', '\\']) {
        Some(idx) => raw[..=idx].to_string(),
        None => String::new(),
    }
}

fn parse_obj<R: BufRead>(reader: R, options: LoadOptions, model_dir: &str) -> Result<ModelData> {
    let layout = options.layout();

    let mut positions: Vec<[f32; 3]> = Vec::new();
    let mut texcoords: Vec<[f32; 2]> = Vec::new();
    let mut normals: Vec<[f32; 3]> = Vec::new();

    let mut buffer: Vec<f32> = Vec::new();
    let mut texture_path: Option<String> = None;

    for (line_no, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read line {}", line_no + 1))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let mut parts = trimmed.split_whitespace();
        let Some(tag) = parts.next() else {
            continue;
        };

        match tag {
            "mtllib" => {
                if let Some(name) = parts.next() {
                    let mtl_path = format!("{model_dir}{name}");
                    // Last mtllib wins, even when it fails to resolve.
                    texture_path = mtl::resolve_diffuse_map(&mtl_path, model_dir);
                }
            }
            "v" => {
                let x = parse_f32_lenient(parts.next(), line_no, "x coordinate");
                let y = parse_f32_lenient(parts.next(), line_no, "y coordinate");
                let z = parse_f32_lenient(parts.next(), line_no, "z coordinate");
                positions.push([x, y, z]);
            }
            "vt" => {
                let s = parse_f32_lenient(parts.next(), line_no, "s coordinate");
                let mut t = parse_f32_lenient(parts.next(), line_no, "t coordinate");
                if options.flip_texcoord_v {
                    t = 1.0 - t;
                }
                texcoords.push([s, t]);
            }
            "vn" => {
                let nx = parse_f32_lenient(parts.next(), line_no, "nx coordinate");
                let ny = parse_f32_lenient(parts.next(), line_no, "ny coordinate");
                let nz = parse_f32_lenient(parts.next(), line_no, "nz coordinate");
                normals.push([nx, ny, nz]);
            }
            "f" => {
                let mut corners = 0usize;
                for token in parts {
                    let (pos_idx, tex_idx, norm_idx) =
                        parse_face_corner(token, positions.len(), line_no)?;

                    // Position is required; the index was bounds-checked above.
                    buffer.extend_from_slice(&positions[pos_idx]);

                    if options.include_normals {
                        let normal = norm_idx
                            .and_then(|i| normals.get(i).copied())
                            .unwrap_or([0.0, 0.0, 0.0]);
                        buffer.extend_from_slice(&normal);
                    }

                    let uv = tex_idx
                        .and_then(|i| texcoords.get(i).copied())
                        .unwrap_or([0.0, 0.0]);
                    buffer.extend_from_slice(&uv);

                    if options.include_color {
                        buffer.extend_from_slice(&FLAT_COLOR);
                    }

                    corners += 1;
                }
                if corners > 3 {
                    log::warn!(
                        "Face with {} corners on line {} emitted without triangulation; \
                         the resulting triangle list is malformed",
                        corners,
                        line_no + 1
                    );
                }
            }
            _ => {
                // o/g/s/usemtl and friends.
            }
        }
    }

    if buffer.is_empty() {
        return Err(ObjError::EmptyModel.into());
    }

    Ok(ModelData::new(buffer, layout, texture_path))
}

/// Parse one float permissively: a missing or malformed token becomes 0.0
/// with a warning, mirroring a failed formatted read.
fn parse_f32_lenient(value: Option<&str>, line_no: usize, what: &str) -> f32 {
    let Some(token) = value else {
        log::warn!("Missing {} on line {}; using 0", what, line_no + 1);
        return 0.0;
    };
    match token.parse::<f32>() {
        Ok(parsed) => parsed,
        Err(_) => {
            log::warn!(
                "Malformed {} '{}' on line {}; using 0",
                what,
                token,
                line_no + 1
            );
            0.0
        }
    }
}

/// Split a face corner token into 0-based (position, texcoord?, normal?)
/// indices. An empty field between slashes means "attribute absent", never
/// index 0. The position index must parse, be 1-based and in range; the
/// optional indices fall back to absent on any problem and are
/// bounds-checked by the caller against the pools.
fn parse_face_corner(
    token: &str,
    position_count: usize,
    line_no: usize,
) -> Result<(usize, Option<usize>, Option<usize>), ObjError> {
    let mut fields = token.split('/');

    // split always yields at least one item.
    let pos_field = fields.next().unwrap_or("");
    let raw = pos_field
        .parse::<i64>()
        .map_err(|_| ObjError::InvalidPositionIndex {
            token: token.to_string(),
            line: line_no + 1,
        })?;
    if raw < 1 {
        return Err(ObjError::InvalidPositionIndex {
            token: token.to_string(),
            line: line_no + 1,
        });
    }
    let pos_idx = (raw - 1) as usize;
    if pos_idx >= position_count {
        return Err(ObjError::PositionIndexOutOfRange {
            index: pos_idx,
            pool_len: position_count,
            line: line_no + 1,
        });
    }

    let tex_idx = parse_optional_index(fields.next(), line_no, "texcoord");
    let norm_idx = parse_optional_index(fields.next(), line_no, "normal");

    Ok((pos_idx, tex_idx, norm_idx))
}

fn parse_optional_index(field: Option<&str>, line_no: usize, what: &str) -> Option<usize> {
    let field = field?;
    if field.is_empty() {
        return None;
    }
    match field.parse::<i64>() {
        Ok(raw) if raw >= 1 => Some((raw - 1) as usize),
        Ok(raw) => {
            log::warn!(
                "Non-positive {} index {} on line {}; treating as absent",
                what,
                raw,
                line_no + 1
            );
            None
        }
        Err(_) => {
            log::warn!(
                "Malformed {} index '{}' on line {}; treating as absent",
                what,
                field,
                line_no + 1
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LoadOptions;

    const TRIANGLE: &str = "\
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 1.0 0.0
vt 0.0 0.0
vt 1.0 0.0
vt 0.0 1.0
vn 0.0 0.0 1.0
f 1/1/1 2/2/1 3/3/1
";

    #[test]
    fn vertex_count_equals_corner_count() {
        let src = format!("{TRIANGLE}f 1/1/1 3/3/1 2/2/1\n");
        let model = load_obj_from_str(&src, LoadOptions::flat_color()).expect("parse");
        assert_eq!(model.vertex_count(), 6);
        assert_eq!(model.buffer.len(), 6 * model.layout.stride);
    }

    #[test]
    fn corner_indices_are_one_based() {
        let src = "\
v 1.0 0.0 0.0
v 2.0 0.0 0.0
v 3.0 0.0 0.0
vt 0.1 0.0
vt 0.2 0.0
vn 0.0 1.0 0.0
f 3/2/1 1/1/1 2/2/1
";
        let model = load_obj_from_str(src, LoadOptions::lit()).expect("parse");
        let stride = model.layout.stride;
        // First corner "3/2/1": position[2], texcoord[1], normal[0].
        assert_eq!(model.buffer[0], 3.0);
        let normal_offset = model.layout.normal_offset.unwrap();
        assert_eq!(model.buffer[normal_offset..normal_offset + 3], [0.0, 1.0, 0.0]);
        assert_eq!(model.buffer[model.layout.texcoord_offset], 0.2);
        // Second corner "1/1/1" starts one stride in.
        assert_eq!(model.buffer[stride], 1.0);
    }

    #[test]
    fn empty_texcoord_field_yields_default() {
        let src = "\
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 2.0 0.0 0.0
v 3.0 0.0 0.0
v 4.0 0.0 0.0
vt 0.5 0.5
vn 0.0 0.0 1.0
vn 0.0 1.0 0.0
f 5//2 1//1 2//1
";
        let model = load_obj_from_str(src, LoadOptions::lit()).expect("parse");
        let texcoord_offset = model.layout.texcoord_offset;
        assert_eq!(model.buffer[texcoord_offset], 0.0);
        assert_eq!(model.buffer[texcoord_offset + 1], 0.0);
        // Normal index 2 resolved to normal[1].
        let normal_offset = model.layout.normal_offset.unwrap();
        assert_eq!(model.buffer[normal_offset..normal_offset + 3], [0.0, 1.0, 0.0]);
    }

    #[test]
    fn out_of_range_texcoord_yields_default() {
        let src = "\
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 1.0 0.0
vt 0.5 0.5
f 1/9 2/9 3/9
";
        let model = load_obj_from_str(src, LoadOptions::flat_color()).expect("parse");
        assert_eq!(model.buffer[model.layout.texcoord_offset], 0.0);
    }

    #[test]
    fn out_of_range_position_is_a_typed_error() {
        let src = "\
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 1.0 0.0
f 10 1 2
";
        let err = load_obj_from_str(src, LoadOptions::flat_color()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ObjError>(),
            Some(&ObjError::PositionIndexOutOfRange {
                index: 9,
                pool_len: 3,
                line: 4
            })
        );
    }

    #[test]
    fn zero_position_index_is_a_typed_error() {
        let src = "v 0.0 0.0 0.0\nf 0 1 1\n";
        let err = load_obj_from_str(src, LoadOptions::flat_color()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ObjError>(),
            Some(ObjError::InvalidPositionIndex { .. })
        ));
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = load_obj_from_path("/definitely/not/here.obj", LoadOptions::flat_color());
        assert!(result.is_err());
    }

    #[test]
    fn file_without_faces_is_empty_model() {
        let err = load_obj_from_str("v 0.0 0.0 0.0\n", LoadOptions::flat_color()).unwrap_err();
        assert_eq!(err.downcast_ref::<ObjError>(), Some(&ObjError::EmptyModel));
    }

    #[test]
    fn loading_twice_is_idempotent() {
        let first = load_obj_from_str(TRIANGLE, LoadOptions::lit()).expect("parse");
        let second = load_obj_from_str(TRIANGLE, LoadOptions::lit()).expect("parse");
        assert_eq!(first.buffer, second.buffer);
    }

    #[test]
    fn flat_color_buffer_carries_constant_red() {
        let model = load_obj_from_str(TRIANGLE, LoadOptions::flat_color()).expect("parse");
        let color_offset = model.layout.color_offset.unwrap();
        for corner in 0..model.vertex_count() {
            let base = corner * model.layout.stride + color_offset;
            assert_eq!(model.buffer[base..base + 3], [1.0, 0.0, 0.0]);
        }
    }

    #[test]
    fn lit_preset_flips_v() {
        let model = load_obj_from_str(TRIANGLE, LoadOptions::lit()).expect("parse");
        // Third corner "3/3/1" references vt (0.0, 1.0), stored flipped.
        let base = 2 * model.layout.stride + model.layout.texcoord_offset;
        assert_eq!(model.buffer[base], 0.0);
        assert_eq!(model.buffer[base + 1], 0.0);
        // First corner "1/1/1" references vt (0.0, 0.0), stored as (0.0, 1.0).
        assert_eq!(model.buffer[model.layout.texcoord_offset + 1], 1.0);
    }

    #[test]
    fn flat_color_preset_keeps_v() {
        let model = load_obj_from_str(TRIANGLE, LoadOptions::flat_color()).expect("parse");
        assert_eq!(model.buffer[model.layout.texcoord_offset + 1], 0.0);
    }

    #[test]
    fn quad_face_emits_four_corners_unsplit() {
        let src = "\
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 1.0 1.0 0.0
v 0.0 1.0 0.0
f 1 2 3 4
";
        let model = load_obj_from_str(src, LoadOptions::flat_color()).expect("parse");
        assert_eq!(model.vertex_count(), 4);
    }

    #[test]
    fn malformed_float_falls_back_to_zero() {
        let src = "\
v 1.0 oops 3.0
v 1.0 0.0 0.0
v 0.0 1.0 0.0
f 1 2 3
";
        let model = load_obj_from_str(src, LoadOptions::flat_color()).expect("parse");
        assert_eq!(model.buffer[0], 1.0);
        assert_eq!(model.buffer[1], 0.0);
        assert_eq!(model.buffer[2], 3.0);
    }

    #[test]
    fn unknown_directives_are_ignored() {
        let src = format!("o thing\ng group\ns off\nusemtl wood\n{TRIANGLE}");
        let model = load_obj_from_str(&src, LoadOptions::flat_color()).expect("parse");
        assert_eq!(model.vertex_count(), 3);
    }

    #[test]
    fn mtllib_resolves_relative_to_model_directory() {
        use std::fs;

        let dir = std::env::temp_dir().join(format!("veles3d-obj-test-{}", std::process::id()));
        fs::create_dir_all(&dir).expect("create scratch dir");
        let model_path = dir.join("scene.obj");
        fs::write(
            &model_path,
            "mtllib scene.mtl\nv 0.0 0.0 0.0\nv 1.0 0.0 0.0\nv 0.0 1.0 0.0\nf 1 2 3\n",
        )
        .expect("write obj");
        fs::write(dir.join("scene.mtl"), "newmtl wood\nmap_Kd wood.png\n")
            .expect("write mtl");

        let model =
            load_obj_from_path(&model_path, LoadOptions::flat_color()).expect("parse");
        let expected = format!("{}/wood.png", dir.display());
        assert_eq!(model.texture_path, Some(expected));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_mtl_file_is_non_fatal() {
        let src = format!("mtllib nowhere.mtl\n{TRIANGLE}");
        let model = load_obj_from_str(&src, LoadOptions::flat_color()).expect("parse");
        assert_eq!(model.texture_path, None);
    }
}
