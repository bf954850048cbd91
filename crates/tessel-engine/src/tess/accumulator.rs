use crate::config::TessConfig;

use super::atlas::{AtlasBatcher, StagedVertex};
use super::buffer::AttributeBuffer;
use super::error::TessError;
use super::flush::{self, AtlasFlush, PlainFlush};
use super::issuer::{DrawIssuer, VertexSource};
use super::layout::{
    AttributeMask, VertexRecord, BRIGHTNESS_WORD, COLOR_WORD, NORMAL_WORD, POSITION_WORD,
    TEX_COORD_WORD, WORDS_PER_VERTEX,
};
use super::mode::DrawMode;
use super::pack::{PackedColor, PackedNormal};
use super::textures::{AtlasRegistry, TextureId, TextureService, TileTable};

/// Texture whose tile table is used when drawing a chunk with no explicit texture.
pub const TERRAIN_TEXTURE_PATH: &str = "/terrain.png";

/// Free words kept ahead of the cursor before an auto-grow. A single
/// `add_vertex` writes at most three records.
const GROW_HEADROOM_WORDS: usize = 4 * WORDS_PER_VERTEX;

/// Smallest buffer a tessellator will run with: two converted quads.
const MIN_CAPACITY_WORDS: usize = 12 * WORDS_PER_VERTEX;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Drawing,
}

/// Vertex accumulator.
///
/// Collects vertices for one session at a time into a fixed-stride attribute
/// buffer and flushes them through a [`DrawIssuer`]:
///
/// ```ignore
/// tess.begin(DrawMode::Quads)?;
/// tess.set_color_opaque(255, 255, 255);
/// tess.add_vertex_with_uv(0.0, 0.0, 0.0, 0.0, 0.0)?;
/// // ... three more corners ...
/// let bytes = tess.end()?;
/// ```
///
/// Attribute setters store a value for the *next* vertex and switch the
/// attribute on for the session. The attribute mask freezes when the first
/// vertex is written; setters for attributes outside the frozen mask still
/// update the pending value but never write it.
///
/// One instance lives for the whole render context and is reused across
/// sessions. Not thread-safe; drive it from the render loop only.
pub struct Tessellator<I: DrawIssuer> {
    config: TessConfig,
    buffer: AttributeBuffer,
    tile_tags: Vec<i32>,
    issuer: I,
    textures: Box<dyn TextureService>,

    // session
    state: SessionState,
    mode: DrawMode,
    attributes: AttributeMask,
    attributes_frozen: bool,
    warned_late_attribute: bool,
    color_disabled: bool,
    convert_quads: bool,
    tiles: Option<TileTable>,
    base_texture: TextureId,
    vertex_count: usize,
    added_vertices: usize,
    batcher: AtlasBatcher,
    current_tile: i32,

    // pending attribute values
    tex_coord: [f64; 2],
    color: PackedColor,
    brightness: i32,
    normal: PackedNormal,
    translation: [f64; 3],

    // texture binding
    texture_id: TextureId,
    rendering_chunk: bool,
    terrain_texture: Option<TextureId>,
    gpu_slot: usize,
}

impl<I: DrawIssuer> Tessellator<I> {
    pub fn new(config: TessConfig, textures: impl TextureService + 'static, issuer: I) -> Self {
        let buffer = AttributeBuffer::new(config.initial_capacity_words.max(MIN_CAPACITY_WORDS));
        Self {
            config,
            buffer,
            tile_tags: Vec::new(),
            issuer,
            textures: Box::new(textures),
            state: SessionState::Idle,
            mode: DrawMode::Quads,
            attributes: AttributeMask::empty(),
            attributes_frozen: false,
            warned_late_attribute: false,
            color_disabled: false,
            convert_quads: false,
            tiles: None,
            base_texture: TextureId::NONE,
            vertex_count: 0,
            added_vertices: 0,
            batcher: AtlasBatcher::new(),
            current_tile: 0,
            tex_coord: [0.0; 2],
            color: PackedColor::default(),
            brightness: 0,
            normal: PackedNormal::default(),
            translation: [0.0; 3],
            texture_id: TextureId::NONE,
            rendering_chunk: false,
            terrain_texture: None,
            gpu_slot: 0,
        }
    }

    /// Creates a tessellator with an empty [`AtlasRegistry`].
    pub fn with_registry(config: TessConfig, issuer: I) -> Self {
        Self::new(config, AtlasRegistry::new(), issuer)
    }

    // ── collaborators ─────────────────────────────────────────────────────

    #[inline]
    pub fn config(&self) -> &TessConfig {
        &self.config
    }

    /// Mutable configuration. Rendering flags apply from the next `begin`.
    #[inline]
    pub fn config_mut(&mut self) -> &mut TessConfig {
        &mut self.config
    }

    #[inline]
    pub fn issuer(&self) -> &I {
        &self.issuer
    }

    #[inline]
    pub fn issuer_mut(&mut self) -> &mut I {
        &mut self.issuer
    }

    pub fn into_issuer(self) -> I {
        self.issuer
    }

    #[inline]
    pub fn textures_mut(&mut self) -> &mut dyn TextureService {
        self.textures.as_mut()
    }

    /// Texture whose tile table the next session resolves. `NONE` unbinds.
    #[inline]
    pub fn set_texture(&mut self, id: TextureId) {
        self.texture_id = id;
    }

    #[inline]
    pub fn texture(&self) -> TextureId {
        self.texture_id
    }

    #[inline]
    pub fn is_rendering_chunk(&self) -> bool {
        self.rendering_chunk
    }

    /// Chunk sessions with no explicit texture resolve the terrain atlas.
    #[inline]
    pub fn set_rendering_chunk(&mut self, rendering_chunk: bool) {
        self.rendering_chunk = rendering_chunk;
    }

    // ── introspection ─────────────────────────────────────────────────────

    #[inline]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[inline]
    pub fn is_drawing(&self) -> bool {
        self.state == SessionState::Drawing
    }

    #[inline]
    pub fn draw_mode(&self) -> DrawMode {
        self.mode
    }

    #[inline]
    pub fn attributes(&self) -> AttributeMask {
        self.attributes
    }

    /// Vertices written, including those synthesized by quad conversion.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Vertices submitted through `add_vertex`.
    #[inline]
    pub fn added_vertices(&self) -> usize {
        self.added_vertices
    }

    #[inline]
    pub fn word_len(&self) -> usize {
        self.buffer.len_words()
    }

    #[inline]
    pub fn capacity_words(&self) -> usize {
        self.buffer.capacity_words()
    }

    /// Whether the current session splits draws by atlas tile.
    #[inline]
    pub fn is_atlas_session(&self) -> bool {
        self.tiles.is_some()
    }

    /// Decoded record of emitted vertex `index` in the current session.
    pub fn record(&self, index: usize) -> Option<VertexRecord> {
        (index < self.vertex_count).then(|| self.buffer.record(index))
    }

    /// Tile tag of every emitted vertex. Empty outside atlas sessions.
    #[inline]
    pub fn tile_tags(&self) -> &[i32] {
        &self.tile_tags
    }

    #[inline]
    pub fn translation(&self) -> [f64; 3] {
        self.translation
    }

    // ── session ───────────────────────────────────────────────────────────

    /// Opens a session. Fails if one is already open.
    pub fn begin(&mut self, mode: DrawMode) -> Result<(), TessError> {
        self.begin_with(mode, AttributeMask::empty())
    }

    /// Opens a session with attributes declared up front.
    ///
    /// Setters called before the first vertex may still add to `attributes`.
    pub fn begin_with(&mut self, mode: DrawMode, attributes: AttributeMask) -> Result<(), TessError> {
        if self.is_drawing() {
            return Err(TessError::AlreadyDrawing);
        }

        self.state = SessionState::Drawing;
        self.reset();
        self.mode = mode;
        self.attributes = attributes;
        self.attributes_frozen = false;
        self.warned_late_attribute = false;
        self.color_disabled = false;
        self.convert_quads = self.config.convert_quads_to_triangles;
        self.batcher.reset();
        self.current_tile = 0;

        self.base_texture = if self.rendering_chunk && self.texture_id.is_none() {
            self.terrain_texture()
        } else {
            self.texture_id
        };
        self.tiles = if self.config.atlas_rendering {
            self.textures.tile_mapping(self.base_texture)
        } else {
            None
        };

        log::trace!(
            "begin {:?} (texture {}, atlas {})",
            mode,
            self.base_texture.0,
            self.tiles.is_some()
        );
        Ok(())
    }

    /// Shorthand for `begin(DrawMode::Quads)`.
    pub fn start_drawing_quads(&mut self) -> Result<(), TessError> {
        self.begin(DrawMode::Quads)
    }

    /// Flushes the session and returns to idle. See [`draw`](Self::draw).
    pub fn end(&mut self) -> Result<usize, TessError> {
        self.draw()
    }

    /// Issues the accumulated vertices and resets to idle.
    ///
    /// Returns the number of bytes accumulated. Fails if no session is open.
    /// The session is closed even when the backend fails.
    pub fn draw(&mut self) -> Result<usize, TessError> {
        if !self.is_drawing() {
            return Err(TessError::NotDrawing);
        }
        self.state = SessionState::Idle;

        let issued = if self.vertex_count > 0 { self.issue() } else { Ok(()) };

        if self.batcher.pending() > 0 {
            log::debug!(
                "dropping {} staged atlas vertices of an incomplete quad",
                self.batcher.pending()
            );
            self.batcher.reset();
        }

        let bytes = self.buffer.len_words() * 4;
        self.reset();
        issued.map(|()| bytes)
    }

    fn issue(&mut self) -> Result<(), TessError> {
        let mode = self.mode.submitted(self.convert_quads);
        let use_gpu_buffers = self.uses_gpu_buffers();

        match &self.tiles {
            Some(tiles) => {
                if use_gpu_buffers {
                    return Err(TessError::unsupported("GPU buffer pool with atlas sub-batching"));
                }
                flush::draw_atlas(
                    &mut self.issuer,
                    AtlasFlush {
                        bytes: self.buffer.as_bytes(),
                        mode,
                        tags: &self.tile_tags[..self.vertex_count],
                        tiles,
                        base_texture: self.base_texture,
                    },
                )
            }
            None => {
                let source = if use_gpu_buffers {
                    self.gpu_slot = (self.gpu_slot + 1) % self.config.gpu_buffer_count;
                    VertexSource::GpuBuffer(self.gpu_slot)
                } else {
                    VertexSource::Client
                };
                flush::draw_plain(
                    &mut self.issuer,
                    PlainFlush {
                        bytes: self.buffer.as_bytes(),
                        source,
                        mode,
                        vertex_count: self.vertex_count as u32,
                        attributes: self.attributes,
                    },
                )
            }
        }
    }

    fn uses_gpu_buffers(&self) -> bool {
        self.config.gpu_buffers && self.config.gpu_buffer_count > 0 && self.issuer.supports_gpu_buffers()
    }

    fn reset(&mut self) {
        self.vertex_count = 0;
        self.added_vertices = 0;
        self.buffer.clear();
        self.tile_tags.clear();
    }

    fn terrain_texture(&mut self) -> TextureId {
        if let Some(id) = self.terrain_texture {
            return id;
        }
        let id = self.textures.texture_id(TERRAIN_TEXTURE_PATH);
        self.terrain_texture = Some(id);
        id
    }

    // ── attribute setters ─────────────────────────────────────────────────

    fn activate(&mut self, attribute: AttributeMask) -> bool {
        if self.attributes.contains(attribute) {
            return true;
        }
        if self.attributes_frozen {
            if !self.warned_late_attribute {
                log::warn!(
                    "{attribute:?} set after the first vertex of the session; it will not be written"
                );
                self.warned_late_attribute = true;
            }
            return false;
        }
        self.attributes |= attribute;
        true
    }

    pub fn set_tex_coord(&mut self, u: f64, v: f64) {
        self.activate(AttributeMask::TEXTURE);
        self.tex_coord = [u, v];
    }

    /// Sets the packed lightmap coordinates (see [`brightness`](crate::tess::brightness)).
    pub fn set_brightness(&mut self, brightness: i32) {
        self.activate(AttributeMask::BRIGHTNESS);
        self.brightness = brightness;
    }

    /// Sets the color from integer channels, each clamped to `0..=255`.
    pub fn set_color_rgba(&mut self, r: i32, g: i32, b: i32, a: i32) {
        if self.color_disabled {
            return;
        }
        self.activate(AttributeMask::COLOR);
        self.color = PackedColor::rgba(r, g, b, a);
    }

    pub fn set_color_opaque(&mut self, r: i32, g: i32, b: i32) {
        self.set_color_rgba(r, g, b, 255);
    }

    pub fn set_color_rgba_f(&mut self, r: f32, g: f32, b: f32, a: f32) {
        if self.color_disabled {
            return;
        }
        self.activate(AttributeMask::COLOR);
        self.color = PackedColor::rgba_f(r, g, b, a);
    }

    pub fn set_color_opaque_f(&mut self, r: f32, g: f32, b: f32) {
        self.set_color_rgba_f(r, g, b, 1.0);
    }

    /// Sets an opaque color from `0xRRGGBB`.
    pub fn set_color_opaque_packed(&mut self, rgb: i32) {
        self.set_color_rgba_packed(rgb, 255);
    }

    /// Sets a color from `0xRRGGBB` and a separate alpha.
    pub fn set_color_rgba_packed(&mut self, rgb: i32, alpha: i32) {
        if self.color_disabled {
            return;
        }
        self.activate(AttributeMask::COLOR);
        self.color = PackedColor::from_rgb_int(rgb, alpha);
    }

    /// Ignores color setters until the next `begin`.
    pub fn disable_color(&mut self) {
        self.color_disabled = true;
    }

    pub fn set_normal(&mut self, x: f32, y: f32, z: f32) {
        self.activate(AttributeMask::NORMAL);
        self.normal = PackedNormal::new(x, y, z);
    }

    /// Offset added to every subsequent vertex position. Persists across sessions.
    pub fn set_translation(&mut self, x: f64, y: f64, z: f64) {
        self.translation = [x, y, z];
    }

    pub fn add_translation(&mut self, dx: f64, dy: f64, dz: f64) {
        self.translation[0] += dx;
        self.translation[1] += dy;
        self.translation[2] += dz;
    }

    // ── vertices ──────────────────────────────────────────────────────────

    /// Sets the texture coordinate and adds a vertex.
    ///
    /// In atlas sessions the vertex is staged until its quad is complete,
    /// then all four corners are emitted with tile-local UVs.
    pub fn add_vertex_with_uv(&mut self, x: f64, y: f64, z: f64, u: f64, v: f64) -> Result<(), TessError> {
        if self.tiles.is_none() {
            self.set_tex_coord(u, v);
            return self.add_vertex(x, y, z);
        }

        let staged = StagedVertex {
            position: [x, y, z],
            uv: [u, v],
            color: self.color,
            brightness: self.brightness,
        };
        let Some(quad) = self.batcher.stage(staged) else {
            return Ok(());
        };

        let saved_color = self.color;
        let saved_brightness = self.brightness;
        self.current_tile = quad.tile;

        let mut emitted = Ok(());
        for corner in quad.vertices {
            self.color = corner.color;
            self.brightness = corner.brightness;
            self.set_tex_coord(corner.uv[0], corner.uv[1]);
            let [cx, cy, cz] = corner.position;
            emitted = self.add_vertex(cx, cy, cz);
            if emitted.is_err() {
                break;
            }
        }

        self.color = saved_color;
        self.brightness = saved_brightness;
        emitted
    }

    /// Adds a vertex at `(x, y, z)` plus the current translation.
    ///
    /// Grows the buffer first when it runs low (auto-grow), or flushes and
    /// reopens the session at a quad boundary when it is nearly full.
    pub fn add_vertex(&mut self, x: f64, y: f64, z: f64) -> Result<(), TessError> {
        if self.config.auto_grow && self.buffer.remaining_words() <= GROW_HEADROOM_WORDS {
            let (old, new) = self.buffer.grow();
            log::debug!("expand tessellator buffer, old: {old}, new: {new}");
        }

        self.attributes_frozen = true;
        self.added_vertices += 1;

        if self.mode == DrawMode::Quads && self.convert_quads && self.added_vertices % 4 == 0 {
            self.duplicate_for_second_triangle();
        }

        let at = self.buffer.len_words();
        if self.attributes.contains(AttributeMask::TEXTURE) {
            self.buffer.write_f32(at + TEX_COORD_WORD, self.tex_coord[0] as f32);
            self.buffer.write_f32(at + TEX_COORD_WORD + 1, self.tex_coord[1] as f32);
        }
        if self.attributes.contains(AttributeMask::BRIGHTNESS) {
            self.buffer.write_u32(at + BRIGHTNESS_WORD, self.brightness as u32);
        }
        if self.attributes.contains(AttributeMask::COLOR) {
            self.buffer.write_u32(at + COLOR_WORD, self.color.0);
        }
        if self.attributes.contains(AttributeMask::NORMAL) {
            self.buffer.write_u32(at + NORMAL_WORD, self.normal.0);
        }
        let [tx, ty, tz] = self.translation;
        self.buffer.write_f32(at + POSITION_WORD, (x + tx) as f32);
        self.buffer.write_f32(at + POSITION_WORD + 1, (y + ty) as f32);
        self.buffer.write_f32(at + POSITION_WORD + 2, (z + tz) as f32);
        self.push_record(self.current_tile);

        if !self.config.auto_grow
            && self.added_vertices % 4 == 0
            && self.buffer.remaining_words() <= self.quad_words()
        {
            log::debug!(
                "tessellator buffer full at {} words; flushing and restarting",
                self.buffer.len_words()
            );
            self.draw()?;
            self.state = SessionState::Drawing;
        }

        Ok(())
    }

    /// Copies corners A and C of the quad being completed so the buffer
    /// reads A, B, C, A, C before corner D is written.
    fn duplicate_for_second_triangle(&mut self) {
        for back in [3, 2] {
            let at = self.buffer.len_words();
            let src = at - back * WORDS_PER_VERTEX;
            self.buffer.copy_words(src, at, WORDS_PER_VERTEX);
            let tag = self.tile_tags.get(src / WORDS_PER_VERTEX).copied().unwrap_or(self.current_tile);
            self.push_record(tag);
        }
    }

    fn push_record(&mut self, tile: i32) {
        self.buffer.advance(WORDS_PER_VERTEX);
        self.vertex_count += 1;
        if self.tiles.is_some() {
            self.tile_tags.push(tile);
        }
    }

    /// Words one quad can occupy, including synthesized corners.
    fn quad_words(&self) -> usize {
        let per_quad = if self.mode == DrawMode::Quads && self.convert_quads { 6 } else { 4 };
        per_quad * WORDS_PER_VERTEX
    }
}

impl<I: DrawIssuer + std::fmt::Debug> std::fmt::Debug for Tessellator<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tessellator")
            .field("state", &self.state)
            .field("mode", &self.mode)
            .field("attributes", &self.attributes)
            .field("vertex_count", &self.vertex_count)
            .field("added_vertices", &self.added_vertices)
            .field("capacity_words", &self.buffer.capacity_words())
            .field("issuer", &self.issuer)
            .finish_non_exhaustive()
    }
}
