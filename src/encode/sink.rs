use std::path::{Path, PathBuf};

use crate::{
    foundation::{
        core::FrameIndex,
        error::{RingError, RingResult},
    },
    render::FrameRGBA,
};

/// Configuration handed to a [`FrameSink`] before the first frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SinkConfig {
    pub width: u32,
    pub height: u32,
    /// Output frames per second.
    pub fps: u32,
}

/// Consumer of finished frames.
///
/// `push_frame` is called with strictly increasing indices between `begin` and `end`.
pub trait FrameSink {
    fn begin(&mut self, cfg: SinkConfig) -> RingResult<()>;
    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> RingResult<()>;
    fn end(&mut self) -> RingResult<()>;
}

/// Keeps every frame in memory. Useful for tests and previews.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(FrameIndex, FrameRGBA)>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(&self) -> Option<&SinkConfig> {
        self.cfg.as_ref()
    }

    pub fn frames(&self) -> &[(FrameIndex, FrameRGBA)] {
        &self.frames
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> RingResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> RingResult<()> {
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> RingResult<()> {
        Ok(())
    }
}

/// Writes each frame as `<dir>/<prefix>NNN.png`, numbered from 1 and zero-padded to 3 digits.
#[derive(Debug)]
pub struct PngSequenceSink {
    dir: PathBuf,
    prefix: String,
    written: Vec<PathBuf>,
    started: bool,
}

impl PngSequenceSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            prefix: "frame_".to_string(),
            written: Vec::new(),
            started: false,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Paths written so far, in frame order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn path_for(&self, idx: FrameIndex) -> PathBuf {
        self.dir
            .join(format!("{}{:03}.png", self.prefix, idx.0.saturating_add(1)))
    }
}

impl FrameSink for PngSequenceSink {
    fn begin(&mut self, cfg: SinkConfig) -> RingResult<()> {
        if cfg.width == 0 || cfg.height == 0 {
            return Err(RingError::validation(
                "png sequence width/height must be non-zero",
            ));
        }
        use anyhow::Context as _;
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("create frame directory '{}'", self.dir.display()))?;
        self.written.clear();
        self.started = true;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> RingResult<()> {
        if !self.started {
            return Err(RingError::encode("png sequence sink not started"));
        }
        let path = self.path_for(idx);
        write_png(frame, &path)?;
        self.written.push(path);
        Ok(())
    }

    fn end(&mut self) -> RingResult<()> {
        self.started = false;
        tracing::info!(
            frames = self.written.len(),
            dir = %self.dir.display(),
            "png sequence written"
        );
        Ok(())
    }
}

/// Write one frame as a straight-alpha RGBA PNG, creating parent directories as needed.
pub fn write_png(frame: &FrameRGBA, path: &Path) -> RingResult<()> {
    let expected = frame.width as usize * frame.height as usize * 4;
    if frame.data.len() != expected {
        return Err(RingError::validation(
            "frame.data size mismatch with width*height*4",
        ));
    }

    crate::encode::ffmpeg::ensure_parent_dir(path)?;
    use anyhow::Context as _;
    image::save_buffer_with_format(
        path,
        &frame.to_straight_rgba8(),
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))?;
    Ok(())
}
