//! External-tool processor for animated media.
//!
//! Cropping a GIF must survive with every frame and its timing intact,
//! which no in-process path here attempts. Two external strategies are
//! tried in order:
//!
//! 1. **gifsicle** — frame-aware crop and resize over the whole animated
//!    buffer in one pass.
//! 2. **ffmpeg** — a crop filter followed by a scale filter, with zero
//!    frame-rate conversion (`-vsync 0`) and explicit infinite looping
//!    (`-loop 0`).
//!
//! A gifsicle result is only accepted after a survival check on its
//! frame metadata; a suspected single-frame collapse advances the chain
//! to ffmpeg just like a hard failure does. Each invocation is bounded
//! by a timeout and works inside its own scratch directory, which is
//! removed on every exit path.

use super::backend::{CropRect, Dimensions};
use image::AnimationDecoder;
use image::codecs::gif::GifDecoder;
use std::fs::File;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;
use tempfile::TempDir;
use thiserror::Error;
use tracing::{debug, warn};
use wait_timeout::ChildExt;

#[derive(Error, Debug)]
pub enum AnimatedError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("animated processing exhausted (gifsicle: {primary}; ffmpeg: {fallback})")]
    Exhausted { primary: String, fallback: String },
}

/// A transform request against an animated buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GifTransform {
    /// Extract `rect`, then resize to exactly `target`.
    CropResize { rect: CropRect, target: Dimensions },
    /// Resize to exactly `target` (session pre-upscale).
    Resize { target: Dimensions },
}

impl GifTransform {
    fn target(self) -> Dimensions {
        match self {
            Self::CropResize { target, .. } | Self::Resize { target } => target,
        }
    }
}

/// Outcome of one strategy attempt. `Retry` advances the chain; only
/// scratch setup failures are fatal before the chain is exhausted.
enum StrategyOutcome {
    Success(Vec<u8>),
    Retry(String),
}

pub struct AnimatedProcessor {
    gifsicle: PathBuf,
    ffmpeg: PathBuf,
    timeout: Duration,
    scratch_root: Option<PathBuf>,
}

impl AnimatedProcessor {
    pub fn new(gifsicle: PathBuf, ffmpeg: PathBuf, timeout: Duration) -> Self {
        Self {
            gifsicle,
            ffmpeg,
            timeout,
            scratch_root: None,
        }
    }

    /// Place scratch directories under `root` instead of the system
    /// temp directory.
    pub fn with_scratch_root(mut self, root: PathBuf) -> Self {
        self.scratch_root = Some(root);
        self
    }

    /// Run `op` through the strategy chain.
    ///
    /// Scratch files live in a per-invocation directory that is removed
    /// when this function returns, on success and failure alike.
    pub fn transform(&self, source: &[u8], op: GifTransform) -> Result<Vec<u8>, AnimatedError> {
        let scratch = self.scratch_dir()?;
        let input = scratch.path().join("input.gif");
        std::fs::write(&input, source)?;

        let primary_reason = match self.run_gifsicle(scratch.path(), &input, op) {
            StrategyOutcome::Success(bytes) => {
                if animation_preserved(&bytes) {
                    return Ok(bytes);
                }
                debug!("gifsicle output lost animation metadata, falling back to ffmpeg");
                "output lost animation metadata".to_string()
            }
            StrategyOutcome::Retry(reason) => {
                warn!(%reason, "gifsicle strategy failed");
                reason
            }
        };

        match self.run_ffmpeg(scratch.path(), &input, op) {
            StrategyOutcome::Success(bytes) => Ok(bytes),
            StrategyOutcome::Retry(fallback) => {
                warn!(reason = %fallback, "ffmpeg strategy failed");
                Err(AnimatedError::Exhausted {
                    primary: primary_reason,
                    fallback,
                })
            }
        }
    }

    fn scratch_dir(&self) -> Result<TempDir, AnimatedError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("bannercut-");
        let dir = match &self.scratch_root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };
        Ok(dir)
    }

    fn run_gifsicle(&self, scratch: &Path, input: &Path, op: GifTransform) -> StrategyOutcome {
        let output = scratch.join("gifsicle-out.gif");
        let target = op.target();

        let mut cmd = Command::new(&self.gifsicle);
        if let GifTransform::CropResize { rect, .. } = op {
            cmd.arg("--crop")
                .arg(format!("{},{}+{}x{}", rect.x, rect.y, rect.width, rect.height));
        }
        cmd.arg("--resize")
            .arg(format!("{}x{}", target.width, target.height))
            .arg("-O2")
            .arg(input)
            .arg("-o")
            .arg(&output);

        self.run_tool("gifsicle", cmd, scratch, &output)
    }

    fn run_ffmpeg(&self, scratch: &Path, input: &Path, op: GifTransform) -> StrategyOutcome {
        let output = scratch.join("ffmpeg-out.gif");
        let target = op.target();
        let filter = match op {
            GifTransform::CropResize { rect, .. } => format!(
                "crop={}:{}:{}:{},scale={}:{}:flags=lanczos",
                rect.width, rect.height, rect.x, rect.y, target.width, target.height
            ),
            GifTransform::Resize { .. } => {
                format!("scale={}:{}:flags=lanczos", target.width, target.height)
            }
        };

        let mut cmd = Command::new(&self.ffmpeg);
        cmd.args(["-y", "-v", "error", "-i"])
            .arg(input)
            .args(["-vf", &filter, "-vsync", "0", "-loop", "0"])
            .arg(&output);

        self.run_tool("ffmpeg", cmd, scratch, &output)
    }

    /// Spawn a tool with a bounded wait, then read back its output file.
    /// Every failure mode maps to `Retry` so the chain can advance.
    fn run_tool(
        &self,
        name: &str,
        mut cmd: Command,
        scratch: &Path,
        output: &Path,
    ) -> StrategyOutcome {
        let stderr_path = scratch.join(format!("{name}-stderr"));
        let stderr_file = match File::create(&stderr_path) {
            Ok(f) => f,
            Err(e) => return StrategyOutcome::Retry(format!("scratch setup failed: {e}")),
        };
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::from(stderr_file));

        debug!(tool = name, "invoking external tool");
        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => return StrategyOutcome::Retry(format!("failed to start: {e}")),
        };

        let status = match child.wait_timeout(self.timeout) {
            Ok(Some(status)) => status,
            Ok(None) => {
                let _ = child.kill();
                let _ = child.wait();
                return StrategyOutcome::Retry(format!(
                    "timed out after {}s",
                    self.timeout.as_secs_f32()
                ));
            }
            Err(e) => return StrategyOutcome::Retry(format!("wait failed: {e}")),
        };

        if !status.success() {
            let detail = stderr_excerpt(&stderr_path);
            return StrategyOutcome::Retry(format!("exited with {status}{detail}"));
        }

        match std::fs::read(output) {
            Ok(bytes) if !bytes.is_empty() => StrategyOutcome::Success(bytes),
            Ok(_) => StrategyOutcome::Retry("produced an empty output file".to_string()),
            Err(e) => StrategyOutcome::Retry(format!("produced no output: {e}")),
        }
    }
}

/// Structured animation-survival check on a processed buffer.
///
/// More than one frame, or a single frame that still carries a non-zero
/// delay, counts as preserved — per-frame timing metadata in the output
/// means the animated structure made it through even if only one frame
/// remains visible. A single zero-delay frame is a suspected collapse.
pub fn animation_preserved(bytes: &[u8]) -> bool {
    let Ok(decoder) = GifDecoder::new(Cursor::new(bytes)) else {
        return false;
    };
    let Ok(frames) = decoder.into_frames().collect_frames() else {
        return false;
    };
    match frames.as_slice() {
        [] => false,
        [single] => single.delay().numer_denom_ms().0 != 0,
        _ => true,
    }
}

/// Last line of a tool's captured stderr, for failure reasons.
fn stderr_excerpt(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(text) => match text.lines().rev().find(|l| !l.trim().is_empty()) {
            Some(line) => format!(": {}", line.trim()),
            None => String::new(),
        },
        Err(_) => String::new(),
    }
}
