//! Export of rendered frames.
//!
//! Sinks consume finished frames in order; they never see a frame that is still being drawn.

/// MP4 output through the system `ffmpeg` binary.
pub mod ffmpeg;
/// Frame sink trait, PNG output and an in-memory sink.
pub mod sink;
