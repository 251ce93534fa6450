use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use crate::{
    command::{Command, TimedCommand},
    config::LayoutProfile,
    encode::{
        ffmpeg::{FfmpegSink, FfmpegSinkOpts, is_ffmpeg_on_path},
        sink::{FrameSink, PngSequenceSink, SinkConfig, write_png},
    },
    foundation::{
        core::FrameIndex,
        error::{RingError, RingResult},
    },
    render::{FrameRGBA, RenderStyle, cpu::CpuSurface, render_scene},
    scene::Scene,
};

/// Rate at which the host advances the simulation, in ticks per second.
pub const HOST_TICK_RATE: u32 = 60;

/// How a range of output frames maps onto simulation ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CaptureOpts {
    /// Output frames per second.
    pub fps: u32,
    /// Number of output frames.
    pub frames: u64,
}

impl CaptureOpts {
    /// Capture `seconds` of animation at `fps`.
    pub fn for_duration(fps: u32, seconds: u32) -> Self {
        Self {
            fps,
            frames: u64::from(fps) * u64::from(seconds),
        }
    }

    /// Ticks elapsed since the start of the capture when output frame `frame` is taken.
    ///
    /// Counted cumulatively so that `fps` output frames always span exactly
    /// [`HOST_TICK_RATE`] ticks, even when the rates do not divide evenly.
    pub fn ticks_at_frame(self, frame: u64) -> u64 {
        if self.fps == 0 {
            return 0;
        }
        (frame + 1) * u64::from(HOST_TICK_RATE) / u64::from(self.fps)
    }
}

/// Owns a scene and the surface it is drawn on, and drives them tick by tick.
///
/// Scripted commands due at a tick are applied before that tick runs. A frame is only handed
/// out after it has been completely drawn.
#[derive(Debug)]
pub struct Session {
    scene: Scene,
    surface: CpuSurface,
    style: RenderStyle,
    script: VecDeque<TimedCommand>,
}

impl Session {
    pub fn new(scene: Scene, surface: CpuSurface) -> Self {
        Self {
            scene,
            surface,
            style: RenderStyle::default(),
            script: VecDeque::new(),
        }
    }

    /// Queue timed commands; entries must be sorted by tick.
    pub fn with_script(mut self, script: Vec<TimedCommand>) -> Self {
        self.script = script.into();
        self
    }

    pub fn with_style(mut self, style: RenderStyle) -> Self {
        self.style = style;
        self
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// Follow a host viewport change: new canvas, profile sizing and a surface to match.
    pub fn resize_viewport(&mut self, width: u32, height: u32) -> RingResult<LayoutProfile> {
        let profile = self.scene.resize_viewport(width, height);
        self.surface.resize(self.scene.canvas())?;
        Ok(profile)
    }

    /// Apply a command immediately. Rejected commands are logged and dropped.
    pub fn apply(&mut self, cmd: Command) {
        if let Err(e) = self.scene.apply(cmd) {
            tracing::warn!(error = %e, "command rejected");
        }
    }

    /// Apply due scripted commands, then advance one tick.
    pub fn step(&mut self) {
        let now = self.scene.ticks();
        while self.script.front().is_some_and(|c| c.tick <= now) {
            if let Some(timed) = self.script.pop_front() {
                self.apply(timed.command);
            }
        }
        self.scene.tick();
    }

    pub fn advance(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.step();
        }
    }

    /// Draw the current state and read the finished frame back.
    pub fn render(&mut self) -> RingResult<FrameRGBA> {
        render_scene(&self.scene, &mut self.surface, &self.style)?;
        Ok(self.surface.read_frame())
    }

    /// Advance and render `opts.frames` frames into `sink`.
    ///
    /// Frame `f` is taken once [`CaptureOpts::ticks_at_frame`] ticks have passed, so the
    /// animation plays back in real time at any output rate.
    #[tracing::instrument(skip(self, sink))]
    pub fn capture(&mut self, opts: CaptureOpts, sink: &mut dyn FrameSink) -> RingResult<()> {
        if opts.frames == 0 {
            return Err(RingError::validation("capture must produce at least one frame"));
        }
        if opts.fps == 0 {
            return Err(RingError::validation("capture fps must be non-zero"));
        }

        let canvas = self.scene.canvas();
        sink.begin(SinkConfig {
            width: canvas.width,
            height: canvas.height,
            fps: opts.fps,
        })?;

        let start = self.scene.ticks();
        for f in 0..opts.frames {
            let target = start + opts.ticks_at_frame(f);
            self.advance(target.saturating_sub(self.scene.ticks()));
            let frame = self.render()?;
            sink.push_frame(FrameIndex(f), &frame)?;
        }

        sink.end()
    }
}

/// Render the session's current state to a single PNG.
pub fn export_png(session: &mut Session, path: &Path) -> RingResult<()> {
    let frame = session.render()?;
    write_png(&frame, path)
}

/// Capture `opts` into `dir` as `frame_001.png`, `frame_002.png`, ... and return the written paths.
#[tracing::instrument(skip(session))]
pub fn export_png_sequence(
    session: &mut Session,
    opts: CaptureOpts,
    dir: &Path,
) -> RingResult<Vec<PathBuf>> {
    let mut sink = PngSequenceSink::new(dir);
    session.capture(opts, &mut sink)?;
    Ok(sink.written().to_vec())
}

/// Capture `opts` into an H.264 MP4 through the system `ffmpeg`.
#[tracing::instrument(skip(session))]
pub fn export_mp4(session: &mut Session, opts: CaptureOpts, path: &Path) -> RingResult<()> {
    if !is_ffmpeg_on_path() {
        return Err(RingError::encode("ffmpeg not found on PATH"));
    }
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(path));
    session.capture(opts, &mut sink)
}
