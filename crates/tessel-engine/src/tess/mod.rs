//! Vertex tessellation: attribute buffer, accumulator and draw driver.
//!
//! A [`Tessellator`] collects one session of vertices at a time and flushes
//! them through a [`DrawIssuer`]. In atlas mode quads are resolved to tiles
//! of a 16 × 16 texture atlas and drawn tile by tile.

mod accumulator;
mod atlas;
mod buffer;
mod error;
mod flush;
mod issuer;
mod layout;
mod mode;
mod pack;
mod textures;

pub use accumulator::{SessionState, Tessellator, TERRAIN_TEXTURE_PATH};
pub use atlas::{tile_for_uv, AtlasBatcher, ResolvedQuad, StagedVertex, ATLAS_GRID};
pub use buffer::AttributeBuffer;
pub use error::TessError;
pub use issuer::{DrawIssuer, IssuedCall, RecordedDraw, RecordingIssuer, VertexSource};
pub use layout::{
    AttribFormat, AttribPointer, AttributeMask, TexUnit, VertexAttribute, VertexRecord,
    VERTEX_STRIDE, WORDS_PER_VERTEX,
};
pub use mode::DrawMode;
pub use pack::{brightness, PackedColor, PackedNormal};
pub use textures::{AtlasRegistry, TextureId, TextureService, TileTable};
