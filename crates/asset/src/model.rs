//! CPU-side model data produced by the OBJ loader: load options, the
//! interleaved-buffer layout contract, and the flat buffer itself.

/// Which attributes the loader packs per vertex, and how texture
/// coordinates are stored.
///
/// OBJ places the texture-coordinate origin at the bottom-left while most
/// decoded images put row 0 at the top, so `flip_texcoord_v` stores `1 - t`
/// instead of `t`. Pick the convention the consuming pipeline expects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadOptions {
    pub include_normals: bool,
    pub include_color: bool,
    pub flip_texcoord_v: bool,
}

impl LoadOptions {
    /// Position + texcoord + constant flat color; V stored as-is.
    pub const fn flat_color() -> Self {
        Self {
            include_normals: false,
            include_color: true,
            flip_texcoord_v: false,
        }
    }

    /// Position + normal + texcoord; V flipped for top-left-origin images.
    pub const fn lit() -> Self {
        Self {
            include_normals: true,
            include_color: false,
            flip_texcoord_v: true,
        }
    }

    pub fn layout(&self) -> VertexLayout {
        VertexLayout::new(self.include_normals, self.include_color)
    }
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self::flat_color()
    }
}

/// Layout of one vertex inside the flat buffer.
///
/// Attribute order is fixed: position (3 floats), then normal (3, if
/// packed), then texcoord (2), then color (3, if packed). Offsets are in
/// floats; the GPU upload step converts to bytes via [`Self::stride_bytes`]
/// and [`Self::byte_offset`]. The buffer is never re-read or mutated after
/// handoff.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VertexLayout {
    pub position_offset: usize,
    pub normal_offset: Option<usize>,
    pub texcoord_offset: usize,
    pub color_offset: Option<usize>,
    /// Floats per vertex.
    pub stride: usize,
}

impl VertexLayout {
    pub fn new(with_normals: bool, with_color: bool) -> Self {
        let mut cursor = 3usize;
        let normal_offset = if with_normals {
            let offset = cursor;
            cursor += 3;
            Some(offset)
        } else {
            None
        };
        let texcoord_offset = cursor;
        cursor += 2;
        let color_offset = if with_color {
            let offset = cursor;
            cursor += 3;
            Some(offset)
        } else {
            None
        };
        Self {
            position_offset: 0,
            normal_offset,
            texcoord_offset,
            color_offset,
            stride: cursor,
        }
    }

    #[inline]
    pub fn stride_bytes(&self) -> usize {
        self.stride * size_of::<f32>()
    }

    #[inline]
    pub fn byte_offset(offset_floats: usize) -> usize {
        offset_floats * size_of::<f32>()
    }
}

/// Result of one load call. Ownership passes to the caller; the loader
/// keeps no state between calls.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelData {
    /// Interleaved attribute floats, `layout.stride` per vertex.
    pub buffer: Vec<f32>,
    pub layout: VertexLayout,
    /// Resolved diffuse-map path, `None` when no material resolved.
    pub texture_path: Option<String>,
}

impl ModelData {
    pub fn new(buffer: Vec<f32>, layout: VertexLayout, texture_path: Option<String>) -> Self {
        Self {
            buffer,
            layout,
            texture_path,
        }
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.buffer.len() / self.layout.stride
    }

    /// Returns `true` if the buffer is non-empty and a whole number of
    /// vertices long.
    pub fn is_valid(&self) -> bool {
        !self.buffer.is_empty() && self.buffer.len() % self.layout.stride == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_color_layout_matches_pos_tex_color() {
        let layout = LoadOptions::flat_color().layout();
        assert_eq!(layout.position_offset, 0);
        assert_eq!(layout.normal_offset, None);
        assert_eq!(layout.texcoord_offset, 3);
        assert_eq!(layout.color_offset, Some(5));
        assert_eq!(layout.stride, 8);
        assert_eq!(layout.stride_bytes(), 32);
    }

    #[test]
    fn lit_layout_matches_pos_normal_tex() {
        let layout = LoadOptions::lit().layout();
        assert_eq!(layout.position_offset, 0);
        assert_eq!(layout.normal_offset, Some(3));
        assert_eq!(layout.texcoord_offset, 6);
        assert_eq!(layout.color_offset, None);
        assert_eq!(layout.stride, 8);
    }

    #[test]
    fn vertex_count_divides_by_stride() {
        let layout = LoadOptions::flat_color().layout();
        let data = ModelData::new(vec![0.0; 24], layout, None);
        assert_eq!(data.vertex_count(), 3);
        assert!(data.is_valid());
    }

    #[test]
    fn truncated_buffer_is_invalid() {
        let layout = LoadOptions::lit().layout();
        let data = ModelData::new(vec![0.0; 13], layout, None);
        assert!(!data.is_valid());
    }
}
