//! Flush/draw driver: turns an accumulated buffer into backend calls.

use std::collections::HashSet;

use super::error::TessError;
use super::issuer::{DrawIssuer, VertexSource};
use super::layout::{AttribPointer, AttributeMask, TexUnit, VertexAttribute};
use super::mode::DrawMode;
use super::textures::{TextureId, TileTable};

/// A single-range flush.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PlainFlush<'a> {
    pub bytes: &'a [u8],
    pub source: VertexSource,
    pub mode: DrawMode,
    pub vertex_count: u32,
    pub attributes: AttributeMask,
}

/// A flush split by atlas tile.
#[derive(Debug, Clone, Copy)]
pub(crate) struct AtlasFlush<'a> {
    pub bytes: &'a [u8],
    pub mode: DrawMode,
    /// One tag per emitted vertex.
    pub tags: &'a [i32],
    pub tiles: &'a TileTable,
    /// Texture rebound once every tile has been drawn.
    pub base_texture: TextureId,
}

/// Binds position plus every active attribute and draws the whole range once.
pub(crate) fn draw_plain<I: DrawIssuer + ?Sized>(
    issuer: &mut I,
    flush: PlainFlush<'_>,
) -> Result<(), TessError> {
    issuer.upload(flush.source, flush.bytes)?;

    let attrs = flush.attributes;
    if attrs.contains(AttributeMask::TEXTURE) {
        issuer.bind_tex_coord_pointer(TexUnit::Default, AttribPointer::TEX_COORD);
    }
    if attrs.contains(AttributeMask::BRIGHTNESS) {
        issuer.bind_tex_coord_pointer(TexUnit::Lightmap, AttribPointer::LIGHTMAP);
    }
    if attrs.contains(AttributeMask::COLOR) {
        issuer.bind_color_pointer(AttribPointer::COLOR);
    }
    if attrs.contains(AttributeMask::NORMAL) {
        issuer.bind_normal_pointer(AttribPointer::NORMAL);
    }
    issuer.bind_vertex_pointer(AttribPointer::POSITION);

    let drawn = issuer.draw_arrays(flush.mode, 0, flush.vertex_count);

    issuer.unbind_pointer(VertexAttribute::Position);
    if attrs.contains(AttributeMask::TEXTURE) {
        issuer.unbind_pointer(VertexAttribute::TexCoord);
    }
    if attrs.contains(AttributeMask::BRIGHTNESS) {
        issuer.unbind_pointer(VertexAttribute::Lightmap);
    }
    if attrs.contains(AttributeMask::COLOR) {
        issuer.unbind_pointer(VertexAttribute::Color);
    }
    if attrs.contains(AttributeMask::NORMAL) {
        issuer.unbind_pointer(VertexAttribute::Normal);
    }

    drawn
}

/// Draws one contiguous run per tile, in the order tiles are first met.
///
/// A tile is drawn only for the run where it first appears. A later run of
/// the same tile after a gap is skipped, so its vertices are not drawn. Runs
/// that are not a whole number of primitives are skipped too.
///
/// The texture, lightmap and color pointers are bound whatever the session's
/// attribute mask. A session that never set a color leaves its color words
/// zero or stale, so backends that multiply by vertex color may draw those
/// quads transparent.
pub(crate) fn draw_atlas<I: DrawIssuer + ?Sized>(
    issuer: &mut I,
    flush: AtlasFlush<'_>,
) -> Result<(), TessError> {
    issuer.upload(VertexSource::Client, flush.bytes)?;

    issuer.bind_tex_coord_pointer(TexUnit::Default, AttribPointer::TEX_COORD);
    issuer.bind_tex_coord_pointer(TexUnit::Lightmap, AttribPointer::LIGHTMAP);
    issuer.bind_color_pointer(AttribPointer::COLOR);
    issuer.bind_vertex_pointer(AttribPointer::POSITION);

    let drawn = draw_tile_runs(issuer, &flush);

    issuer.unbind_pointer(VertexAttribute::TexCoord);
    issuer.unbind_pointer(VertexAttribute::Lightmap);
    issuer.unbind_pointer(VertexAttribute::Color);
    issuer.unbind_pointer(VertexAttribute::Position);
    if !flush.base_texture.is_none() {
        issuer.bind_texture(flush.base_texture);
    }

    drawn
}

fn draw_tile_runs<I: DrawIssuer + ?Sized>(
    issuer: &mut I,
    flush: &AtlasFlush<'_>,
) -> Result<(), TessError> {
    let tags = flush.tags;
    let per_primitive = flush.mode.vertices_per_primitive() as usize;
    let mut visited = HashSet::new();

    let mut start = 0;
    while start < tags.len() {
        let tile = tags[start];
        let end = tags[start..]
            .iter()
            .position(|&t| t != tile)
            .map_or(tags.len(), |n| start + n);

        if visited.insert(tile) {
            match usize::try_from(tile).ok().and_then(|i| flush.tiles.get(i)) {
                Some(&texture) => issuer.bind_texture(texture),
                None => log::trace!("tile {tile} has no texture; drawing with current binding"),
            }

            let count = end - start;
            if count % per_primitive == 0 {
                issuer.draw_arrays(flush.mode, start as u32, count as u32)?;
            } else {
                log::trace!("skipping tile {tile} run of {count} vertices (partial primitive)");
            }
        }

        start = end;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tess::issuer::{IssuedCall, RecordingIssuer};

    fn tiles() -> TileTable {
        (0..256).map(|i| TextureId(100 + i)).collect::<Vec<_>>().into()
    }

    fn atlas<'a>(tags: &'a [i32], table: &'a TileTable, mode: DrawMode) -> AtlasFlush<'a> {
        AtlasFlush {
            bytes: &[],
            mode,
            tags,
            tiles: table,
            base_texture: TextureId(1),
        }
    }

    // ── plain path ────────────────────────────────────────────────────────

    #[test]
    fn plain_binds_only_active_attributes() {
        let mut rec = RecordingIssuer::new();
        draw_plain(
            &mut rec,
            PlainFlush {
                bytes: &[0; 128],
                source: VertexSource::Client,
                mode: DrawMode::Quads,
                vertex_count: 4,
                attributes: AttributeMask::COLOR,
            },
        )
        .unwrap();

        let bound: Vec<_> = rec
            .calls()
            .iter()
            .filter_map(|c| match c {
                IssuedCall::BindPointer { attribute, .. } => Some(*attribute),
                _ => None,
            })
            .collect();
        assert_eq!(bound, vec![VertexAttribute::Color, VertexAttribute::Position]);
        assert_eq!(rec.draws().len(), 1);
        assert_eq!(rec.draws()[0].count, 4);
        assert!(rec.bound_pointers().is_empty());
    }

    #[test]
    fn plain_unbinds_even_when_the_draw_fails() {
        let mut rec = RecordingIssuer::new();
        rec.fail_draws("lost");
        let res = draw_plain(
            &mut rec,
            PlainFlush {
                bytes: &[0; 32],
                source: VertexSource::Client,
                mode: DrawMode::Points,
                vertex_count: 1,
                attributes: AttributeMask::all(),
            },
        );
        assert!(res.is_err());
        assert!(rec.bound_pointers().is_empty());
    }

    // ── atlas path ────────────────────────────────────────────────────────

    #[test]
    fn atlas_groups_contiguous_runs_by_tile() {
        let table = tiles();
        let tags = [5, 5, 5, 5, 9, 9, 9, 9];
        let mut rec = RecordingIssuer::new();
        draw_atlas(&mut rec, atlas(&tags, &table, DrawMode::Quads)).unwrap();

        let draws = rec.draws();
        assert_eq!(draws.len(), 2);
        assert_eq!((draws[0].first, draws[0].count, draws[0].texture), (0, 4, Some(TextureId(105))));
        assert_eq!((draws[1].first, draws[1].count, draws[1].texture), (4, 4, Some(TextureId(109))));
        assert_eq!(rec.bound_texture(), Some(TextureId(1)));
        assert!(rec.bound_pointers().is_empty());
    }

    #[test]
    fn atlas_skips_a_revisited_tile_after_a_gap() {
        let table = tiles();
        let tags = [5, 5, 5, 5, 9, 9, 9, 9, 5, 5, 5, 5];
        let mut rec = RecordingIssuer::new();
        draw_atlas(&mut rec, atlas(&tags, &table, DrawMode::Quads)).unwrap();

        let drawn: Vec<_> = rec.draws().iter().map(|d| (d.first, d.count)).collect();
        assert_eq!(drawn, vec![(0, 4), (4, 4)]);
    }

    #[test]
    fn atlas_skips_partial_primitive_runs() {
        let table = tiles();
        let tags = [1, 1, 1, 2, 2, 2, 2, 2];
        let mut rec = RecordingIssuer::new();
        draw_atlas(&mut rec, atlas(&tags, &table, DrawMode::Quads)).unwrap();
        assert!(rec.draws().is_empty());

        let mut rec = RecordingIssuer::new();
        draw_atlas(&mut rec, atlas(&[3; 6], &table, DrawMode::Triangles)).unwrap();
        assert_eq!(rec.draws()[0].count, 6);
    }

    #[test]
    fn atlas_tile_without_texture_keeps_current_binding() {
        let table: TileTable = vec![TextureId(100)].into();
        let tags = [0, 0, 0, 0, 300, 300, 300, 300];
        let mut rec = RecordingIssuer::new();
        draw_atlas(&mut rec, atlas(&tags, &table, DrawMode::Quads)).unwrap();

        let draws = rec.draws();
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[1].texture, Some(TextureId(100)));
    }
}
