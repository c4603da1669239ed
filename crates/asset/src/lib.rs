//! Asset loading/parsers: OBJ models, MTL material references, textures.
//! The OBJ loader emits a flat interleaved vertex buffer (no indexing);
//! `model::VertexLayout` is the contract the GPU upload step consumes.

pub mod model;
pub mod mtl;
pub mod obj;
pub mod texture;
