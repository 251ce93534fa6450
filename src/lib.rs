//! Rotating labeled rings.
//!
//! A [`Scene`] holds a small fixed set of [`Circle`]s, each spinning at its own speed or locked
//! to another circle, with its label laid out along the ring and an optional [`Connection`] line
//! whose ends orbit with their circles. Scenes are drawn with [`render_scene`] onto any
//! [`RenderSurface`]; [`CpuSurface`] rasterizes with `vello_cpu`, and [`Session`] drives a scene
//! into PNG files or an MP4.
#![forbid(unsafe_code)]

mod foundation;

pub mod circle;
pub mod command;
pub mod config;
pub mod connection;
pub mod encode;
pub mod render;
pub mod scene;
pub mod session;
pub mod text_layout;

pub use crate::foundation::core::{
    Affine, Canvas, FrameIndex, Line, Point, Rgba8, Vec2, wrap_angle,
};
pub use crate::foundation::error::{RingError, RingResult};

pub use crate::circle::{AngularState, Circle, CircleId};
pub use crate::command::{Command, TimedCommand, parse_script};
pub use crate::config::{CircleConfig, ConnectionConfig, LayoutProfile, SceneConfig};
pub use crate::connection::{Connection, connection_endpoints};
pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts, is_ffmpeg_on_path};
pub use crate::encode::sink::{FrameSink, InMemorySink, PngSequenceSink, SinkConfig, write_png};
pub use crate::render::cpu::CpuSurface;
pub use crate::render::glyphs::GlyphShaper;
pub use crate::render::{FrameRGBA, RenderStyle, RenderSurface, render_scene};
pub use crate::scene::{Scene, TICK_SCALE};
pub use crate::session::{
    CaptureOpts, HOST_TICK_RATE, Session, export_mp4, export_png, export_png_sequence,
};
pub use crate::text_layout::{GlyphPlacement, layout_label};
