//! Packing of color, normal and brightness into 32-bit vertex words.

/// RGBA color packed into one vertex word.
///
/// The word's in-memory bytes are always R, G, B, A regardless of host
/// endianness, which is what an unsigned-byte color pointer reads.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct PackedColor(pub u32);

impl PackedColor {
    pub const WHITE: Self = Self::from_bytes([255, 255, 255, 255]);

    #[inline]
    pub const fn from_bytes(rgba: [u8; 4]) -> Self {
        Self(u32::from_ne_bytes(rgba))
    }

    /// Packs integer channels, clamping each to `0..=255`.
    pub fn rgba(r: i32, g: i32, b: i32, a: i32) -> Self {
        Self::from_bytes([clamp_channel(r), clamp_channel(g), clamp_channel(b), clamp_channel(a)])
    }

    /// Packs float channels in `[0, 1]`. Scaling truncates (`1.0` → 255, `0.999` → 254).
    pub fn rgba_f(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self::rgba(unit_to_channel(r), unit_to_channel(g), unit_to_channel(b), unit_to_channel(a))
    }

    /// Packs a `0xRRGGBB` integer with the given alpha.
    pub fn from_rgb_int(rgb: i32, alpha: i32) -> Self {
        Self::rgba((rgb >> 16) & 0xFF, (rgb >> 8) & 0xFF, rgb & 0xFF, alpha)
    }

    #[inline]
    pub fn to_bytes(self) -> [u8; 4] {
        self.0.to_ne_bytes()
    }
}

#[inline]
fn clamp_channel(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}

#[inline]
fn unit_to_channel(v: f32) -> i32 {
    (v * 255.0) as i32
}

/// Normal quantized to three signed bytes.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct PackedNormal(pub u32);

impl PackedNormal {
    /// Quantizes each component with `(n * 127)` truncated toward zero.
    ///
    /// Truncation, not rounding: `0.999` packs to 126.
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self(u32::from_ne_bytes([quantize(x), quantize(y), quantize(z), 0]))
    }
}

#[inline]
fn quantize(n: f32) -> u8 {
    ((n * 127.0) as i32) as i8 as u8
}

/// Packs a lightmap brightness word from block and sky light.
///
/// Block light lands in the low 16 bits, sky light in the high 16 bits.
#[inline]
pub fn brightness(block: u16, sky: u16) -> i32 {
    ((sky as i32) << 16) | block as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── color ─────────────────────────────────────────────────────────────

    #[test]
    fn color_channels_clamp() {
        assert_eq!(PackedColor::rgba(300, -10, 128, 500), PackedColor::rgba(255, 0, 128, 255));
    }

    #[test]
    fn color_bytes_are_rgba_in_memory() {
        assert_eq!(PackedColor::rgba(1, 2, 3, 4).to_bytes(), [1, 2, 3, 4]);
    }

    #[test]
    fn float_color_truncates() {
        assert_eq!(PackedColor::rgba_f(1.0, 0.5, 0.0, 1.0).to_bytes(), [255, 127, 0, 255]);
    }

    #[test]
    fn rgb_int_splits_channels() {
        assert_eq!(PackedColor::from_rgb_int(0x20_40_80, 255).to_bytes(), [0x20, 0x40, 0x80, 255]);
    }

    // ── normal ────────────────────────────────────────────────────────────

    #[test]
    fn normal_truncates_instead_of_rounding() {
        let n = PackedNormal::new(0.999, -0.999, 1.0).0.to_ne_bytes();
        assert_eq!(n[0] as i8, 126);
        assert_eq!(n[1] as i8, -126);
        assert_eq!(n[2] as i8, 127);
        assert_eq!(n[3], 0);
    }

    #[test]
    fn brightness_places_sky_high() {
        assert_eq!(brightness(0xF0, 0x20), 0x0020_00F0);
    }
}
