//! Headless GPU device management.
//!
//! Creates the wgpu Adapter/Device/Queue without a window, allocates
//! offscreen color targets and hands out per-frame encoders.

mod frame;
mod gpu;
mod init;

pub use frame::{GpuFrame, OffscreenTarget};
pub use gpu::Gpu;
pub use init::GpuInit;
