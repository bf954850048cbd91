/// Offscreen color target the tessellated geometry is rendered into.
pub struct OffscreenTarget {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub format: wgpu::TextureFormat,
    pub width: u32,
    pub height: u32,
}

/// A single frame's command recording.
///
/// Short-lived: create, record, hand back to [`Gpu::submit`](super::Gpu::submit).
pub struct GpuFrame {
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}
