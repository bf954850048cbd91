//! Fixed vertex record layout.
//!
//! Every vertex occupies eight 32-bit words (32 bytes):
//!
//! | word | bytes  | field                                  |
//! |------|--------|----------------------------------------|
//! | 0..3 | 0..12  | position, 3 × f32                      |
//! | 3..5 | 12..20 | texture coordinate, 2 × f32            |
//! | 5    | 20..24 | color, 4 × u8 (R, G, B, A in memory)   |
//! | 6    | 24..28 | normal, 3 × i8 + pad                   |
//! | 7    | 28..32 | lightmap brightness, 2 × i16           |
//!
//! Words are stored in host byte order; the GPU reads them on the same host.

use bitflags::bitflags;
use bytemuck::{Pod, Zeroable};

pub const WORDS_PER_VERTEX: usize = 8;
pub const VERTEX_STRIDE: u32 = (WORDS_PER_VERTEX * 4) as u32;

pub const POSITION_WORD: usize = 0;
pub const TEX_COORD_WORD: usize = 3;
pub const COLOR_WORD: usize = 5;
pub const NORMAL_WORD: usize = 6;
pub const BRIGHTNESS_WORD: usize = 7;

bitflags! {
    /// Optional vertex attributes active for a session.
    ///
    /// Position is always present and has no flag.
    #[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
    pub struct AttributeMask: u32 {
        const COLOR = 1 << 0;
        const TEXTURE = 1 << 1;
        const BRIGHTNESS = 1 << 2;
        const NORMAL = 1 << 3;
    }
}

/// Vertex attribute slots a backend can have bound.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum VertexAttribute {
    Position,
    TexCoord,
    Lightmap,
    Color,
    Normal,
}

/// Texture unit a texture-coordinate pointer feeds.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TexUnit {
    /// Unit sampling the bound texture.
    Default,
    /// Unit sampling the lightmap; fed by the brightness pair.
    Lightmap,
}

/// Component type of an attribute pointer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum AttribFormat {
    Float32,
    Int16,
    UnsignedByte,
    Byte,
}

/// Where an attribute lives inside each vertex record.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct AttribPointer {
    pub components: u8,
    pub format: AttribFormat,
    pub normalized: bool,
    pub stride: u32,
    pub offset: u32,
}

impl AttribPointer {
    const fn at(components: u8, format: AttribFormat, normalized: bool, word: usize) -> Self {
        Self {
            components,
            format,
            normalized,
            stride: VERTEX_STRIDE,
            offset: (word * 4) as u32,
        }
    }

    pub const POSITION: Self = Self::at(3, AttribFormat::Float32, false, POSITION_WORD);
    pub const TEX_COORD: Self = Self::at(2, AttribFormat::Float32, false, TEX_COORD_WORD);
    pub const COLOR: Self = Self::at(4, AttribFormat::UnsignedByte, true, COLOR_WORD);
    pub const NORMAL: Self = Self::at(3, AttribFormat::Byte, true, NORMAL_WORD);
    pub const LIGHTMAP: Self = Self::at(2, AttribFormat::Int16, false, BRIGHTNESS_WORD);
}

/// One decoded vertex record.
///
/// Byte-for-byte identical to a 32-byte slice of the attribute buffer, so it
/// can be read back with `bytemuck` and uploaded as-is.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct VertexRecord {
    pub position: [f32; 3],
    pub tex_coord: [f32; 2],
    pub color: u32,
    pub normal: u32,
    pub brightness: u32,
}

impl VertexRecord {
    /// Color bytes as laid out in memory (R, G, B, A).
    #[inline]
    pub fn color_bytes(&self) -> [u8; 4] {
        self.color.to_ne_bytes()
    }

    /// Normal bytes as laid out in memory (x, y, z, pad).
    #[inline]
    pub fn normal_bytes(&self) -> [i8; 4] {
        self.normal.to_ne_bytes().map(|b| b as i8)
    }

    /// The two 16-bit lightmap coordinates, in memory order.
    #[inline]
    pub fn brightness_pair(&self) -> [i16; 2] {
        let b = self.brightness.to_ne_bytes();
        [
            i16::from_ne_bytes([b[0], b[1]]),
            i16::from_ne_bytes([b[2], b[3]]),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_matches_stride() {
        assert_eq!(std::mem::size_of::<VertexRecord>(), VERTEX_STRIDE as usize);
    }

    #[test]
    fn pointer_offsets_match_record_fields() {
        assert_eq!(AttribPointer::POSITION.offset, 0);
        assert_eq!(AttribPointer::TEX_COORD.offset, 12);
        assert_eq!(AttribPointer::COLOR.offset, 20);
        assert_eq!(AttribPointer::NORMAL.offset, 24);
        assert_eq!(AttribPointer::LIGHTMAP.offset, 28);
        assert_eq!(AttribPointer::LIGHTMAP.stride, 32);
    }

    #[test]
    fn brightness_pair_reads_shorts_in_memory_order() {
        let word = u32::from_ne_bytes([0x10, 0x00, 0xF0, 0x00]);
        let rec = VertexRecord { brightness: word, ..Default::default() };
        assert_eq!(rec.brightness_pair(), [0x10, 0xF0]);
    }
}
