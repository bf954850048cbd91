//! GPU rendering backend.
//!
//! [`WgpuIssuer`] implements [`DrawIssuer`](crate::tess::DrawIssuer) on top
//! of wgpu: the tessellator's draw calls are recorded while it flushes and
//! replayed into a render pass by [`WgpuIssuer::encode`].
//!
//! Convention:
//! - vertex positions are pixels (top-left origin, +Y down);
//! - the vertex shader converts to NDC with an orthographic projection.

mod ctx;
mod wgpu_issuer;

pub use ctx::{RenderCtx, RenderTarget, Viewport};
pub use wgpu_issuer::{FrameStats, WgpuIssuer};
