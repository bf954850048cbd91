use std::collections::HashMap;

use anyhow::ensure;
use bytemuck::{Pod, Zeroable};

use crate::tess::{
    AttribPointer, DrawIssuer, DrawMode, TessError, TexUnit, TextureId, VertexAttribute,
    VertexSource, VERTEX_STRIDE,
};

use super::{RenderCtx, RenderTarget, Viewport};

/// Distance between per-draw uniforms. wgpu's default
/// `min_uniform_buffer_offset_alignment` is 256.
const UNIFORM_STRIDE: u64 = 256;

// ── uniform ───────────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct DrawUniform {
    projection: [[f32; 4]; 4],
    /// texture, color, lightmap, normal
    flags: [u32; 4],
}

/// Column-major orthographic projection from pixels (top-left origin, +Y
/// down) to NDC. Depth is fixed at 0.5.
fn ortho(viewport: Viewport) -> [[f32; 4]; 4] {
    let w = viewport.width.max(1.0);
    let h = viewport.height.max(1.0);
    [
        [2.0 / w, 0.0, 0.0, 0.0],
        [0.0, -2.0 / h, 0.0, 0.0],
        [0.0, 0.0, 0.0, 0.0],
        [-1.0, 1.0, 0.5, 1.0],
    ]
}

/// Maps a draw mode to the wgpu topology that draws it without re-indexing.
fn topology_for(mode: DrawMode) -> Result<wgpu::PrimitiveTopology, TessError> {
    use wgpu::PrimitiveTopology as T;
    match mode {
        DrawMode::Points => Ok(T::PointList),
        DrawMode::Lines => Ok(T::LineList),
        DrawMode::LineStrip => Ok(T::LineStrip),
        DrawMode::Triangles => Ok(T::TriangleList),
        DrawMode::TriangleStrip => Ok(T::TriangleStrip),
        other => Err(TessError::unsupported(format!(
            "{other:?} has no wgpu topology; enable quad conversion or use a list mode"
        ))),
    }
}

/// One uniform per draw, each at a multiple of [`UNIFORM_STRIDE`].
fn pack_uniforms(projection: [[f32; 4]; 4], draws: &[PendingDraw]) -> Vec<u8> {
    let mut bytes = vec![0u8; draws.len() * UNIFORM_STRIDE as usize];
    for (i, draw) in draws.iter().enumerate() {
        let at = i * UNIFORM_STRIDE as usize;
        let uniform = DrawUniform { projection, flags: draw.flags };
        bytes[at..at + std::mem::size_of::<DrawUniform>()]
            .copy_from_slice(bytemuck::bytes_of(&uniform));
    }
    bytes
}

// ── recorded state ────────────────────────────────────────────────────────

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
struct BoundPointers {
    position: bool,
    tex_coord: bool,
    color: bool,
    lightmap: bool,
    normal: bool,
}

impl BoundPointers {
    fn set(&mut self, attribute: VertexAttribute, on: bool) {
        let slot = match attribute {
            VertexAttribute::Position => &mut self.position,
            VertexAttribute::TexCoord => &mut self.tex_coord,
            VertexAttribute::Color => &mut self.color,
            VertexAttribute::Lightmap => &mut self.lightmap,
            VertexAttribute::Normal => &mut self.normal,
        };
        *slot = on;
    }

    fn flags(&self) -> [u32; 4] {
        [
            self.tex_coord as u32,
            self.color as u32,
            self.lightmap as u32,
            self.normal as u32,
        ]
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
struct PendingDraw {
    topology: wgpu::PrimitiveTopology,
    /// Absolute vertex index into the frame arena.
    first: u32,
    count: u32,
    texture: TextureId,
    flags: [u32; 4],
}

struct GpuTexture {
    _texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

/// Counters for one encoded frame.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub draws: usize,
    pub vertices: u32,
    pub bytes: usize,
}

// ── issuer ────────────────────────────────────────────────────────────────

/// wgpu implementation of [`DrawIssuer`].
///
/// Draw calls issued during a tessellator flush are recorded against a
/// per-frame vertex arena. [`encode`](Self::encode) uploads the arena and
/// replays the draws into one render pass, after which the arena is reset.
///
/// GPU resources are created lazily on first use, so an issuer can be built
/// (and recorded into) before a device exists.
///
/// Fragments are tinted by vertex color whenever the color pointer is bound.
/// Atlas flushes always bind it, so atlas sessions must set a color before
/// their first vertex or the quads come out fully transparent.
#[derive(Default)]
pub struct WgpuIssuer {
    // frame recording
    arena: Vec<u8>,
    upload_base: u32,
    bound: BoundPointers,
    texture: TextureId,
    draws: Vec<PendingDraw>,
    warned_pointer: bool,
    warned_missing_texture: bool,

    // pipelines
    pipeline_format: Option<wgpu::TextureFormat>,
    pipelines: HashMap<wgpu::PrimitiveTopology, wgpu::RenderPipeline>,
    shader: Option<wgpu::ShaderModule>,
    uniform_layout: Option<wgpu::BindGroupLayout>,
    texture_layout: Option<wgpu::BindGroupLayout>,
    pipeline_layout: Option<wgpu::PipelineLayout>,
    sampler: Option<wgpu::Sampler>,

    // buffers
    vertex_buffer: Option<wgpu::Buffer>,
    vertex_capacity: u64,
    uniform_buffer: Option<wgpu::Buffer>,
    uniform_bind_group: Option<wgpu::BindGroup>,
    uniform_capacity: usize,

    // textures
    textures: HashMap<TextureId, GpuTexture>,
    white: Option<GpuTexture>,
}

impl WgpuIssuer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draws recorded since the last [`encode`](Self::encode).
    #[inline]
    pub fn pending_draws(&self) -> usize {
        self.draws.len()
    }

    /// Bytes staged since the last [`encode`](Self::encode).
    #[inline]
    pub fn staged_bytes(&self) -> usize {
        self.arena.len()
    }

    /// Drops recorded draws and staged vertices without rendering them.
    pub fn discard_frame(&mut self) {
        self.arena.clear();
        self.draws.clear();
        self.upload_base = 0;
    }

    /// Uploads an RGBA8 (sRGB) image and makes it bindable as `id`.
    ///
    /// Re-registering an id replaces its texture.
    pub fn register_texture(
        &mut self,
        ctx: &RenderCtx<'_>,
        id: TextureId,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> anyhow::Result<()> {
        ensure!(!id.is_none(), "texture id 0 is reserved");
        ensure!(width > 0 && height > 0, "texture {} has zero size", id.0);
        ensure!(
            rgba.len() == (width * height * 4) as usize,
            "texture {} expects {} bytes, got {}",
            id.0,
            width * height * 4,
            rgba.len()
        );

        self.ensure_layouts(ctx);
        let (Some(layout), Some(sampler)) = (self.texture_layout.as_ref(), self.sampler.as_ref()) else {
            anyhow::bail!("texture bind group layout unavailable");
        };
        let texture = create_texture(ctx, layout, sampler, "tessel texture", width, height, rgba);
        self.textures.insert(id, texture);
        log::debug!("registered texture {} ({width}x{height})", id.0);
        Ok(())
    }

    /// Replays the recorded draws into `target` and resets the frame.
    pub fn encode(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>) -> FrameStats {
        let stats = FrameStats {
            draws: self.draws.len(),
            vertices: self.draws.iter().map(|d| d.count).sum(),
            bytes: self.arena.len(),
        };

        if self.draws.is_empty() && target.clear.is_none() {
            self.discard_frame();
            return stats;
        }

        // Mutating methods must happen before borrowing pipelines/buffers immutably.
        self.ensure_layouts(ctx);
        self.ensure_white(ctx);
        let topologies: Vec<_> = self.draws.iter().map(|d| d.topology).collect();
        for topology in topologies {
            self.ensure_pipeline(ctx, topology);
        }
        self.ensure_vertex_capacity(ctx, self.arena.len() as u64);
        self.ensure_uniform_capacity(ctx, self.draws.len());

        if let Some(vertex_buffer) = self.vertex_buffer.as_ref() {
            if !self.arena.is_empty() {
                ctx.queue.write_buffer(vertex_buffer, 0, &self.arena);
            }
        }
        if let Some(uniform_buffer) = self.uniform_buffer.as_ref() {
            if !self.draws.is_empty() {
                let uniforms = pack_uniforms(ortho(ctx.viewport), &self.draws);
                ctx.queue.write_buffer(uniform_buffer, 0, &uniforms);
            }
        }

        for draw in &self.draws {
            if !draw.texture.is_none()
                && !self.textures.contains_key(&draw.texture)
                && !self.warned_missing_texture
            {
                log::debug!(
                    "WgpuIssuer: texture {} not registered; drawing untextured",
                    draw.texture.0
                );
                self.warned_missing_texture = true;
            }
        }

        self.replay(target);
        self.discard_frame();
        stats
    }

    fn replay(&self, target: &mut RenderTarget<'_>) {
        let load = match target.clear {
            Some(color) => wgpu::LoadOp::Clear(color),
            None => wgpu::LoadOp::Load,
        };

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("tessel pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        if self.draws.is_empty() {
            return;
        }

        let Some(vertex_buffer) = self.vertex_buffer.as_ref() else { return };
        let Some(uniform_bind_group) = self.uniform_bind_group.as_ref() else { return };
        let Some(white) = self.white.as_ref() else { return };

        rpass.set_vertex_buffer(0, vertex_buffer.slice(..));

        let mut current = None;
        for (i, draw) in self.draws.iter().enumerate() {
            let Some(pipeline) = self.pipelines.get(&draw.topology) else { continue };
            if current != Some(draw.topology) {
                rpass.set_pipeline(pipeline);
                current = Some(draw.topology);
            }

            let texture = self.textures.get(&draw.texture).unwrap_or(white);
            rpass.set_bind_group(0, uniform_bind_group, &[(i as u64 * UNIFORM_STRIDE) as u32]);
            rpass.set_bind_group(1, &texture.bind_group, &[]);
            rpass.draw(draw.first..draw.first + draw.count, 0..1);
        }
    }

    fn check_pointer(&mut self, attribute: VertexAttribute, expected: AttribPointer, got: AttribPointer) {
        if expected != got && !self.warned_pointer {
            log::warn!(
                "WgpuIssuer: non-standard {attribute:?} pointer {got:?}; the fixed vertex layout is used"
            );
            self.warned_pointer = true;
        }
        self.bound.set(attribute, true);
    }

    // ── lazy-init helpers ──────────────────────────────────────────────────

    fn ensure_layouts(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline_format != Some(ctx.target_format) {
            self.pipelines.clear();
            self.pipeline_format = Some(ctx.target_format);
        }
        if self.pipeline_layout.is_some() {
            return;
        }

        let uniform_layout = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("tessel uniform bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<DrawUniform>() as u64),
                },
                count: None,
            }],
        });

        let texture_layout = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("tessel texture bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("tessel pipeline layout"),
            bind_group_layouts: &[&uniform_layout, &texture_layout],
            immediate_size: 0,
        });

        self.sampler = Some(ctx.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("tessel sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        }));

        self.shader = Some(ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("tessel shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/tess.wgsl").into()),
        }));

        self.uniform_layout = Some(uniform_layout);
        self.texture_layout = Some(texture_layout);
        self.pipeline_layout = Some(pipeline_layout);
        self.uniform_bind_group = None;
        self.uniform_buffer = None;
        self.uniform_capacity = 0;
    }

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>, topology: wgpu::PrimitiveTopology) {
        if self.pipelines.contains_key(&topology) {
            return;
        }
        let Some(shader) = self.shader.as_ref() else { return };
        let Some(layout) = self.pipeline_layout.as_ref() else { return };

        const ATTRS: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
            0 => Float32x3, // position
            1 => Float32x2, // uv
            2 => Unorm8x4,  // color
            3 => Snorm8x4,  // normal
            4 => Sint16x2   // lightmap
        ];

        let pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("tessel pipeline"),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: VERTEX_STRIDE as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &ATTRS,
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.target_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        self.pipelines.insert(topology, pipeline);
    }

    fn ensure_white(&mut self, ctx: &RenderCtx<'_>) {
        if self.white.is_some() {
            return;
        }
        let Some(layout) = self.texture_layout.as_ref() else { return };
        let Some(sampler) = self.sampler.as_ref() else { return };
        self.white = Some(create_texture(ctx, layout, sampler, "tessel white", 1, 1, &[255; 4]));
    }

    fn ensure_vertex_capacity(&mut self, ctx: &RenderCtx<'_>, required_bytes: u64) {
        if required_bytes <= self.vertex_capacity && self.vertex_buffer.is_some() {
            return;
        }

        let new_cap = required_bytes.next_power_of_two().max(64 * VERTEX_STRIDE as u64);
        self.vertex_buffer = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("tessel vertex buffer"),
            size: new_cap,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.vertex_capacity = new_cap;
        log::debug!("WgpuIssuer: vertex buffer resized to {new_cap} bytes");
    }

    fn ensure_uniform_capacity(&mut self, ctx: &RenderCtx<'_>, required_draws: usize) {
        if required_draws <= self.uniform_capacity && self.uniform_bind_group.is_some() {
            return;
        }
        let Some(layout) = self.uniform_layout.as_ref() else { return };

        let new_cap = required_draws.next_power_of_two().max(64);
        let buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("tessel uniform buffer"),
            size: new_cap as u64 * UNIFORM_STRIDE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("tessel uniform bind group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(std::mem::size_of::<DrawUniform>() as u64),
                }),
            }],
        });

        self.uniform_buffer = Some(buffer);
        self.uniform_bind_group = Some(bind_group);
        self.uniform_capacity = new_cap;
    }
}

fn create_texture(
    ctx: &RenderCtx<'_>,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    label: &str,
    width: u32,
    height: u32,
    rgba: &[u8],
) -> GpuTexture {
    let size = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };
    let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    ctx.queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        rgba,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(width * 4),
            rows_per_image: Some(height),
        },
        size,
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    });

    GpuTexture {
        _texture: texture,
        bind_group,
    }
}

impl DrawIssuer for WgpuIssuer {
    fn upload(&mut self, source: VertexSource, bytes: &[u8]) -> Result<(), TessError> {
        if let VertexSource::GpuBuffer(slot) = source {
            return Err(TessError::unsupported(format!(
                "GPU buffer slot {slot}: WgpuIssuer stages every upload in its frame arena"
            )));
        }
        self.upload_base = (self.arena.len() / VERTEX_STRIDE as usize) as u32;
        self.arena.extend_from_slice(bytes);
        Ok(())
    }

    fn bind_vertex_pointer(&mut self, ptr: AttribPointer) {
        self.check_pointer(VertexAttribute::Position, AttribPointer::POSITION, ptr);
    }

    fn bind_color_pointer(&mut self, ptr: AttribPointer) {
        self.check_pointer(VertexAttribute::Color, AttribPointer::COLOR, ptr);
    }

    fn bind_tex_coord_pointer(&mut self, unit: TexUnit, ptr: AttribPointer) {
        match unit {
            TexUnit::Default => self.check_pointer(VertexAttribute::TexCoord, AttribPointer::TEX_COORD, ptr),
            TexUnit::Lightmap => self.check_pointer(VertexAttribute::Lightmap, AttribPointer::LIGHTMAP, ptr),
        }
    }

    fn bind_normal_pointer(&mut self, ptr: AttribPointer) {
        self.check_pointer(VertexAttribute::Normal, AttribPointer::NORMAL, ptr);
    }

    fn unbind_pointer(&mut self, attribute: VertexAttribute) {
        self.bound.set(attribute, false);
    }

    fn bind_texture(&mut self, id: TextureId) {
        self.texture = id;
    }

    fn draw_arrays(&mut self, mode: DrawMode, first: u32, count: u32) -> Result<(), TessError> {
        let topology = topology_for(mode)?;
        if !self.bound.position {
            return Err(TessError::Backend("draw issued without a vertex pointer".into()));
        }
        if count == 0 {
            return Ok(());
        }

        self.draws.push(PendingDraw {
            topology,
            first: self.upload_base + first,
            count,
            texture: self.texture,
            flags: self.bound.flags(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bound_issuer() -> WgpuIssuer {
        let mut issuer = WgpuIssuer::new();
        issuer.bind_vertex_pointer(AttribPointer::POSITION);
        issuer
    }

    // ── topology ──────────────────────────────────────────────────────────

    #[test]
    fn list_and_strip_modes_map_directly() {
        use wgpu::PrimitiveTopology as T;
        assert_eq!(topology_for(DrawMode::Points), Ok(T::PointList));
        assert_eq!(topology_for(DrawMode::Lines), Ok(T::LineList));
        assert_eq!(topology_for(DrawMode::LineStrip), Ok(T::LineStrip));
        assert_eq!(topology_for(DrawMode::Triangles), Ok(T::TriangleList));
        assert_eq!(topology_for(DrawMode::TriangleStrip), Ok(T::TriangleStrip));
    }

    #[test]
    fn fan_and_quad_modes_are_unsupported() {
        for mode in [
            DrawMode::Quads,
            DrawMode::QuadStrip,
            DrawMode::TriangleFan,
            DrawMode::LineLoop,
            DrawMode::Polygon,
        ] {
            assert!(matches!(topology_for(mode), Err(TessError::Unsupported(_))), "{mode:?}");
        }
    }

    // ── uniforms ──────────────────────────────────────────────────────────

    #[test]
    fn draw_uniform_fits_the_dynamic_stride() {
        assert_eq!(std::mem::size_of::<DrawUniform>(), 80);
        assert!(std::mem::size_of::<DrawUniform>() as u64 <= UNIFORM_STRIDE);
    }

    #[test]
    fn ortho_maps_viewport_corners_to_ndc() {
        let m = ortho(Viewport::new(200.0, 100.0));
        let apply = |x: f32, y: f32| {
            [
                m[0][0] * x + m[1][0] * y + m[3][0],
                m[0][1] * x + m[1][1] * y + m[3][1],
            ]
        };
        let close = |a: [f32; 2], b: [f32; 2]| (a[0] - b[0]).abs() < 1e-5 && (a[1] - b[1]).abs() < 1e-5;
        assert!(close(apply(0.0, 0.0), [-1.0, 1.0]));
        assert!(close(apply(200.0, 100.0), [1.0, -1.0]));
        assert!(close(apply(100.0, 50.0), [0.0, 0.0]));
    }

    #[test]
    fn uniforms_are_packed_at_stride_offsets() {
        let draw = |flags| PendingDraw {
            topology: wgpu::PrimitiveTopology::TriangleList,
            first: 0,
            count: 3,
            texture: TextureId::NONE,
            flags,
        };
        let bytes = pack_uniforms(ortho(Viewport::new(1.0, 1.0)), &[draw([1, 0, 0, 0]), draw([0, 1, 1, 0])]);
        assert_eq!(bytes.len(), 2 * UNIFORM_STRIDE as usize);

        let second: DrawUniform = bytemuck::pod_read_unaligned(
            &bytes[UNIFORM_STRIDE as usize..UNIFORM_STRIDE as usize + 80],
        );
        assert_eq!(second.flags, [0, 1, 1, 0]);
    }

    // ── recording ─────────────────────────────────────────────────────────

    #[test]
    fn draws_are_offset_by_their_upload() {
        let mut issuer = bound_issuer();
        issuer.upload(VertexSource::Client, &[0; 4 * 32]).unwrap();
        issuer.draw_arrays(DrawMode::Triangles, 0, 3).unwrap();
        issuer.upload(VertexSource::Client, &[0; 6 * 32]).unwrap();
        issuer.draw_arrays(DrawMode::Triangles, 3, 3).unwrap();

        assert_eq!(issuer.pending_draws(), 2);
        assert_eq!(issuer.staged_bytes(), 10 * 32);
        assert_eq!(issuer.draws[0].first, 0);
        assert_eq!(issuer.draws[1].first, 7);
    }

    #[test]
    fn draws_snapshot_bound_attributes_and_texture() {
        let mut issuer = bound_issuer();
        issuer.bind_color_pointer(AttribPointer::COLOR);
        issuer.bind_tex_coord_pointer(TexUnit::Default, AttribPointer::TEX_COORD);
        issuer.bind_texture(TextureId(4));
        issuer.upload(VertexSource::Client, &[0; 32]).unwrap();
        issuer.draw_arrays(DrawMode::Points, 0, 1).unwrap();
        issuer.unbind_pointer(VertexAttribute::Color);
        issuer.draw_arrays(DrawMode::Points, 0, 1).unwrap();

        assert_eq!(issuer.draws[0].flags, [1, 1, 0, 0]);
        assert_eq!(issuer.draws[0].texture, TextureId(4));
        assert_eq!(issuer.draws[1].flags, [1, 0, 0, 0]);
    }

    #[test]
    fn drawing_needs_a_vertex_pointer() {
        let mut issuer = WgpuIssuer::new();
        assert!(matches!(
            issuer.draw_arrays(DrawMode::Points, 0, 1),
            Err(TessError::Backend(_))
        ));
    }

    #[test]
    fn gpu_buffer_uploads_are_rejected() {
        let mut issuer = WgpuIssuer::new();
        assert!(!issuer.supports_gpu_buffers());
        assert!(matches!(
            issuer.upload(VertexSource::GpuBuffer(2), &[0; 32]),
            Err(TessError::Unsupported(_))
        ));
    }

    #[test]
    fn discarding_a_frame_resets_the_arena() {
        let mut issuer = bound_issuer();
        issuer.upload(VertexSource::Client, &[0; 64]).unwrap();
        issuer.draw_arrays(DrawMode::Lines, 0, 2).unwrap();
        issuer.discard_frame();
        assert_eq!(issuer.pending_draws(), 0);
        assert_eq!(issuer.staged_bytes(), 0);
    }
}
