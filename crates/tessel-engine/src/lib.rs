//! Tessel engine crate.
//!
//! Vertex tessellation for immediate-mode style rendering: attribute
//! accumulation, quad conversion, atlas tile batching and draw issuing, plus
//! the headless wgpu pieces that put the result on a GPU.

pub mod config;
pub mod device;
pub mod logging;
pub mod render;
pub mod tess;
