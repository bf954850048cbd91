/// Capacity of the process-wide tessellator, in words.
pub const SHARED_CAPACITY_WORDS: usize = 524_288;

/// Tessellator configuration.
///
/// `atlas_rendering` and `convert_quads_to_triangles` are read when a session
/// begins; changing them mid-session affects the next session only.
#[derive(Debug, Clone)]
pub struct TessConfig {
    /// Initial attribute buffer size, in 32-bit words.
    pub initial_capacity_words: usize,

    /// Double the buffer when it runs low instead of flushing early.
    pub auto_grow: bool,

    /// Split draws by atlas tile when the bound texture has a tile table.
    pub atlas_rendering: bool,

    /// Submit quads as triangle pairs.
    pub convert_quads_to_triangles: bool,

    /// Upload through the backend's GPU buffer pool when it has one.
    pub gpu_buffers: bool,

    /// Slots in the GPU buffer pool, used round robin.
    pub gpu_buffer_count: usize,
}

impl Default for TessConfig {
    fn default() -> Self {
        Self {
            initial_capacity_words: 65_536,
            auto_grow: true,
            atlas_rendering: false,
            convert_quads_to_triangles: false,
            gpu_buffers: false,
            gpu_buffer_count: 10,
        }
    }
}

impl TessConfig {
    /// Configuration of the large shared tessellator.
    pub fn shared() -> Self {
        Self {
            initial_capacity_words: SHARED_CAPACITY_WORDS,
            ..Self::default()
        }
    }
}
