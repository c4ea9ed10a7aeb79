//! The generation engine boundary.
//!
//! Parameters go in, a packed RGB buffer comes out. Implementations are selected with
//! [`backend::create_engine`].

/// Engine trait, kinds and load-time settings.
pub mod backend;
/// Conversion between packed engine buffers and in-memory images.
pub mod pixels;
/// Built-in synthetic engine.
pub mod preview;
/// stable-diffusion.cpp executable engine.
pub mod process;
