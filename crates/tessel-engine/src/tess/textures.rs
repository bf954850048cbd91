use std::collections::HashMap;
use std::sync::Arc;

/// Backend texture handle. `0` means "no texture".
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

impl TextureId {
    pub const NONE: Self = Self(0);

    #[inline]
    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

/// Per-tile textures of an atlas, indexed by tile index (row-major 16 × 16).
pub type TileTable = Arc<[TextureId]>;

/// Texture lookups the tessellator needs from its host.
pub trait TextureService {
    /// Resolves a texture path to its id.
    fn texture_id(&mut self, path: &str) -> TextureId;

    /// Returns the tile table bound to `id`, or `None` for non-atlas textures.
    fn tile_mapping(&self, id: TextureId) -> Option<TileTable>;
}

/// In-process texture service: path → id allocation plus atlas tile tables.
///
/// Owned by the tessellator; ids start at 1 and are never reused.
#[derive(Debug, Default)]
pub struct AtlasRegistry {
    paths: HashMap<String, TextureId>,
    tiles: HashMap<TextureId, TileTable>,
    last_id: u32,
}

impl AtlasRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds the per-tile textures of atlas `id`, replacing any previous table.
    ///
    /// Binding to [`TextureId::NONE`] is ignored.
    pub fn set_tile_textures(&mut self, id: TextureId, tiles: impl Into<TileTable>) {
        if id.is_none() {
            log::warn!("AtlasRegistry: ignoring tile table bound to texture 0");
            return;
        }
        self.tiles.insert(id, tiles.into());
    }

    pub fn clear_tile_textures(&mut self, id: TextureId) {
        self.tiles.remove(&id);
    }
}

impl TextureService for AtlasRegistry {
    fn texture_id(&mut self, path: &str) -> TextureId {
        if let Some(&id) = self.paths.get(path) {
            return id;
        }
        self.last_id += 1;
        let id = TextureId(self.last_id);
        self.paths.insert(path.to_owned(), id);
        id
    }

    fn tile_mapping(&self, id: TextureId) -> Option<TileTable> {
        if id.is_none() {
            return None;
        }
        self.tiles.get(&id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_resolve_to_stable_ids() {
        let mut reg = AtlasRegistry::new();
        let terrain = reg.texture_id("/terrain.png");
        let items = reg.texture_id("/gui/items.png");
        assert_eq!(terrain, TextureId(1));
        assert_eq!(items, TextureId(2));
        assert_eq!(reg.texture_id("/terrain.png"), terrain);
    }

    #[test]
    fn tile_mapping_is_absent_for_plain_textures() {
        let mut reg = AtlasRegistry::new();
        let atlas = reg.texture_id("/terrain.png");
        let plain = reg.texture_id("/font.png");
        reg.set_tile_textures(atlas, vec![TextureId(10), TextureId(11)]);

        assert_eq!(reg.tile_mapping(atlas).as_deref(), Some(&[TextureId(10), TextureId(11)][..]));
        assert!(reg.tile_mapping(plain).is_none());
        assert!(reg.tile_mapping(TextureId::NONE).is_none());
    }

    #[test]
    fn texture_zero_never_gets_a_table() {
        let mut reg = AtlasRegistry::new();
        reg.set_tile_textures(TextureId::NONE, vec![TextureId(3)]);
        assert!(reg.tile_mapping(TextureId::NONE).is_none());
    }

    #[test]
    fn clear_drops_tables() {
        let mut reg = AtlasRegistry::new();
        let atlas = reg.texture_id("/terrain.png");
        reg.set_tile_textures(atlas, vec![TextureId(5)]);
        reg.clear_tile_textures(atlas);
        assert!(reg.tile_mapping(atlas).is_none());
    }
}
