//! Atlas-aware quad staging.
//!
//! In atlas mode a quad's corners are held back until all four are known,
//! so the quad can be assigned to one tile of a 16 × 16 atlas grid and its
//! UVs rewritten into that tile's local space.

use super::pack::PackedColor;

/// Tiles per atlas row and column.
pub const ATLAS_GRID: u32 = 16;

/// Raw attributes of one corner, captured when it was submitted.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct StagedVertex {
    pub position: [f64; 3],
    pub uv: [f64; 2],
    pub color: PackedColor,
    pub brightness: i32,
}

/// A complete quad assigned to a tile, UVs already tile-local.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ResolvedQuad {
    pub tile: i32,
    pub vertices: [StagedVertex; 4],
}

/// Tile index and atlas-space origin for a mean UV.
///
/// Each axis is scaled by the grid size and truncated toward zero. UVs
/// outside `[0, 1)` are not clamped and yield indices with no tile behind
/// them.
pub fn tile_for_uv(mean_u: f64, mean_v: f64) -> (i32, [f64; 2]) {
    let grid = ATLAS_GRID as f64;
    let column = (mean_u * grid) as i32;
    let row = (mean_v * grid) as i32;
    let tile = row * ATLAS_GRID as i32 + column;
    (tile, [column as f64 / grid, row as f64 / grid])
}

/// Four-slot staging area for the quad being submitted.
#[derive(Debug, Default)]
pub struct AtlasBatcher {
    slots: [StagedVertex; 4],
    staged: usize,
}

impl AtlasBatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Corners of the current quad received so far.
    #[inline]
    pub fn pending(&self) -> usize {
        self.staged
    }

    /// Drops any partially staged quad.
    #[inline]
    pub fn reset(&mut self) {
        self.staged = 0;
    }

    /// Stages one corner. On the fourth, resolves and returns the quad.
    pub fn stage(&mut self, vertex: StagedVertex) -> Option<ResolvedQuad> {
        self.slots[self.staged] = vertex;
        if self.staged < 3 {
            self.staged += 1;
            return None;
        }
        self.staged = 0;
        Some(resolve(self.slots))
    }
}

fn resolve(mut vertices: [StagedVertex; 4]) -> ResolvedQuad {
    let grid = ATLAS_GRID as f64;
    let mean_u = vertices.iter().map(|v| v.uv[0]).sum::<f64>() / 4.0;
    let mean_v = vertices.iter().map(|v| v.uv[1]).sum::<f64>() / 4.0;
    let (tile, origin) = tile_for_uv(mean_u, mean_v);

    for v in &mut vertices {
        v.uv = [(v.uv[0] - origin[0]) * grid, (v.uv[1] - origin[1]) * grid];
    }

    ResolvedQuad { tile, vertices }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corner(u: f64, v: f64) -> StagedVertex {
        StagedVertex { uv: [u, v], ..Default::default() }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    // ── tile lookup ───────────────────────────────────────────────────────

    #[test]
    fn tile_is_row_major_on_a_16_grid() {
        let (tile, origin) = tile_for_uv(0.2, 0.3);
        assert_eq!(tile, 4 * 16 + 3);
        assert_eq!(origin, [3.0 / 16.0, 4.0 / 16.0]);
    }

    #[test]
    fn first_and_last_tiles() {
        assert_eq!(tile_for_uv(0.01, 0.01).0, 0);
        assert_eq!(tile_for_uv(0.99, 0.99).0, 255);
    }

    #[test]
    fn out_of_range_uv_is_not_clamped() {
        assert_eq!(tile_for_uv(1.5, 0.0).0, 24);
        assert_eq!(tile_for_uv(0.0, 1.0).0, 256);
    }

    // ── staging ───────────────────────────────────────────────────────────

    #[test]
    fn quad_resolves_on_fourth_corner() {
        let mut batcher = AtlasBatcher::new();
        assert!(batcher.stage(corner(0.0, 0.0)).is_none());
        assert!(batcher.stage(corner(0.0, 0.0)).is_none());
        assert!(batcher.stage(corner(0.0, 0.0)).is_none());
        assert_eq!(batcher.pending(), 3);
        assert!(batcher.stage(corner(0.0, 0.0)).is_some());
        assert_eq!(batcher.pending(), 0);
    }

    #[test]
    fn uvs_are_remapped_into_tile_space() {
        // Tile (3, 4) spans u in [3/16, 4/16), v in [4/16, 5/16).
        let (u0, u1) = (3.0 / 16.0, 4.0 / 16.0);
        let (v0, v1) = (4.0 / 16.0, 5.0 / 16.0);
        let mut batcher = AtlasBatcher::new();
        batcher.stage(corner(u0, v0));
        batcher.stage(corner(u0, v1));
        batcher.stage(corner(u1, v1));
        let quad = batcher.stage(corner(u1, v0)).unwrap();

        assert_eq!(quad.tile, 4 * 16 + 3);
        let uvs = quad.vertices.map(|v| v.uv);
        assert!(close(uvs[0][0], 0.0) && close(uvs[0][1], 0.0));
        assert!(close(uvs[1][0], 0.0) && close(uvs[1][1], 1.0));
        assert!(close(uvs[2][0], 1.0) && close(uvs[2][1], 1.0));
        assert!(close(uvs[3][0], 1.0) && close(uvs[3][1], 0.0));
    }

    #[test]
    fn staged_attributes_survive_resolution() {
        let mut batcher = AtlasBatcher::new();
        for i in 0..3 {
            batcher.stage(StagedVertex {
                position: [i as f64, 0.0, 0.0],
                color: PackedColor::rgba(i, 0, 0, 255),
                brightness: i,
                ..Default::default()
            });
        }
        let quad = batcher
            .stage(StagedVertex { position: [3.0, 0.0, 0.0], brightness: 3, ..Default::default() })
            .unwrap();
        assert_eq!(quad.vertices[1].position, [1.0, 0.0, 0.0]);
        assert_eq!(quad.vertices[2].color, PackedColor::rgba(2, 0, 0, 255));
        assert_eq!(quad.vertices[3].brightness, 3);
    }
}
