use super::error::TessError;
use super::layout::{AttribPointer, TexUnit, VertexAttribute};
use super::mode::DrawMode;
use super::textures::TextureId;

/// Where uploaded vertex bytes are staged before pointers are bound.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum VertexSource {
    /// Client-side memory, read at draw time.
    Client,
    /// Slot of the backend's GPU-resident buffer pool.
    GpuBuffer(usize),
}

/// Immediate-mode draw call issuer.
///
/// A thin seam over the host graphics API. Pointer offsets are relative to
/// the most recent upload. Bindings are global backend state: whoever binds a
/// pointer unbinds it when done.
pub trait DrawIssuer {
    /// Whether [`VertexSource::GpuBuffer`] uploads are available.
    fn supports_gpu_buffers(&self) -> bool {
        false
    }

    /// Stages vertex bytes for the following pointer binds and draws.
    fn upload(&mut self, source: VertexSource, bytes: &[u8]) -> Result<(), TessError>;

    fn bind_vertex_pointer(&mut self, ptr: AttribPointer);
    fn bind_color_pointer(&mut self, ptr: AttribPointer);
    fn bind_tex_coord_pointer(&mut self, unit: TexUnit, ptr: AttribPointer);
    fn bind_normal_pointer(&mut self, ptr: AttribPointer);
    fn unbind_pointer(&mut self, attribute: VertexAttribute);

    fn bind_texture(&mut self, id: TextureId);

    /// Draws `count` vertices starting at vertex `first` of the current upload.
    fn draw_arrays(&mut self, mode: DrawMode, first: u32, count: u32) -> Result<(), TessError>;
}

/// One call observed by a [`RecordingIssuer`].
#[derive(Debug, Clone, PartialEq)]
pub enum IssuedCall {
    Upload { source: VertexSource, bytes: Vec<u8> },
    BindPointer { attribute: VertexAttribute, pointer: AttribPointer },
    UnbindPointer(VertexAttribute),
    BindTexture(TextureId),
    DrawArrays { mode: DrawMode, first: u32, count: u32 },
}

/// A draw as seen by the backend, with the texture bound at the time.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RecordedDraw {
    pub mode: DrawMode,
    pub first: u32,
    pub count: u32,
    pub texture: Option<TextureId>,
}

/// Draw issuer that records every call instead of touching a GPU.
///
/// Used for instrumentation, replay and tests.
#[derive(Debug, Default)]
pub struct RecordingIssuer {
    calls: Vec<IssuedCall>,
    bound: Vec<VertexAttribute>,
    texture: Option<TextureId>,
    gpu_buffers: bool,
    fail_draws: Option<String>,
}

impl RecordingIssuer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advertises GPU buffer pool support.
    pub fn with_gpu_buffers(mut self) -> Self {
        self.gpu_buffers = true;
        self
    }

    /// Makes every subsequent draw fail with `reason`.
    pub fn fail_draws(&mut self, reason: impl Into<String>) {
        self.fail_draws = Some(reason.into());
    }

    #[inline]
    pub fn calls(&self) -> &[IssuedCall] {
        &self.calls
    }

    /// Draw calls in issue order, annotated with the bound texture.
    pub fn draws(&self) -> Vec<RecordedDraw> {
        let mut texture = None;
        let mut out = Vec::new();
        for call in &self.calls {
            match call {
                IssuedCall::BindTexture(id) => texture = Some(*id),
                IssuedCall::DrawArrays { mode, first, count } => out.push(RecordedDraw {
                    mode: *mode,
                    first: *first,
                    count: *count,
                    texture,
                }),
                _ => {}
            }
        }
        out
    }

    /// Bytes of the most recent upload.
    pub fn last_upload(&self) -> Option<(VertexSource, &[u8])> {
        self.calls.iter().rev().find_map(|call| match call {
            IssuedCall::Upload { source, bytes } => Some((*source, bytes.as_slice())),
            _ => None,
        })
    }

    /// Pointers currently bound.
    #[inline]
    pub fn bound_pointers(&self) -> &[VertexAttribute] {
        &self.bound
    }

    #[inline]
    pub fn bound_texture(&self) -> Option<TextureId> {
        self.texture
    }

    fn bind(&mut self, attribute: VertexAttribute, pointer: AttribPointer) {
        if !self.bound.contains(&attribute) {
            self.bound.push(attribute);
        }
        self.calls.push(IssuedCall::BindPointer { attribute, pointer });
    }
}

impl DrawIssuer for RecordingIssuer {
    fn supports_gpu_buffers(&self) -> bool {
        self.gpu_buffers
    }

    fn upload(&mut self, source: VertexSource, bytes: &[u8]) -> Result<(), TessError> {
        if matches!(source, VertexSource::GpuBuffer(_)) && !self.gpu_buffers {
            return Err(TessError::unsupported("GPU buffer upload on a client-memory backend"));
        }
        self.calls.push(IssuedCall::Upload { source, bytes: bytes.to_vec() });
        Ok(())
    }

    fn bind_vertex_pointer(&mut self, ptr: AttribPointer) {
        self.bind(VertexAttribute::Position, ptr);
    }

    fn bind_color_pointer(&mut self, ptr: AttribPointer) {
        self.bind(VertexAttribute::Color, ptr);
    }

    fn bind_tex_coord_pointer(&mut self, unit: TexUnit, ptr: AttribPointer) {
        let attribute = match unit {
            TexUnit::Default => VertexAttribute::TexCoord,
            TexUnit::Lightmap => VertexAttribute::Lightmap,
        };
        self.bind(attribute, ptr);
    }

    fn bind_normal_pointer(&mut self, ptr: AttribPointer) {
        self.bind(VertexAttribute::Normal, ptr);
    }

    fn unbind_pointer(&mut self, attribute: VertexAttribute) {
        self.bound.retain(|a| *a != attribute);
        self.calls.push(IssuedCall::UnbindPointer(attribute));
    }

    fn bind_texture(&mut self, id: TextureId) {
        self.texture = Some(id);
        self.calls.push(IssuedCall::BindTexture(id));
    }

    fn draw_arrays(&mut self, mode: DrawMode, first: u32, count: u32) -> Result<(), TessError> {
        if let Some(reason) = &self.fail_draws {
            return Err(TessError::Backend(reason.clone()));
        }
        self.calls.push(IssuedCall::DrawArrays { mode, first, count });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draws_carry_the_texture_bound_at_issue_time() {
        let mut rec = RecordingIssuer::new();
        rec.draw_arrays(DrawMode::Quads, 0, 4).unwrap();
        rec.bind_texture(TextureId(7));
        rec.draw_arrays(DrawMode::Quads, 4, 4).unwrap();

        let draws = rec.draws();
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].texture, None);
        assert_eq!(draws[1].texture, Some(TextureId(7)));
        assert_eq!(draws[1].first, 4);
    }

    #[test]
    fn unbinding_tracks_pointer_state() {
        let mut rec = RecordingIssuer::new();
        rec.bind_vertex_pointer(AttribPointer::POSITION);
        rec.bind_tex_coord_pointer(TexUnit::Lightmap, AttribPointer::LIGHTMAP);
        assert_eq!(rec.bound_pointers(), &[VertexAttribute::Position, VertexAttribute::Lightmap]);

        rec.unbind_pointer(VertexAttribute::Position);
        rec.unbind_pointer(VertexAttribute::Lightmap);
        assert!(rec.bound_pointers().is_empty());
    }

    #[test]
    fn gpu_uploads_require_support() {
        let mut rec = RecordingIssuer::new();
        assert!(rec.upload(VertexSource::GpuBuffer(0), &[0; 4]).is_err());

        let mut rec = RecordingIssuer::new().with_gpu_buffers();
        rec.upload(VertexSource::GpuBuffer(3), &[1, 2]).unwrap();
        assert_eq!(rec.last_upload(), Some((VertexSource::GpuBuffer(3), &[1u8, 2][..])));
    }

    #[test]
    fn injected_failures_surface_as_backend_errors() {
        let mut rec = RecordingIssuer::new();
        rec.fail_draws("device lost");
        assert_eq!(
            rec.draw_arrays(DrawMode::Points, 0, 1),
            Err(TessError::Backend("device lost".into()))
        );
    }
}
