//! Crop pipeline: session lifecycle and per-format dispatch.
//!
//! The surface a presentation layer consumes: submit an image to open a
//! session, drive the crop region with discrete commands, confirm into
//! the final banner artifact (or cancel). Dispatch between the static
//! codec and the animated processor happens here, on the format fixed
//! at submission.
//!
//! The pipeline is generic over [`MediaBackend`] so unit tests drive it
//! with a recorded mock; [`BannerPipeline::with_default_backend`] wires
//! up the production [`Toolkit`].

use crate::config::Config;
use crate::geometry::{self, Direction};
use crate::media::{
    AnimatedProcessor, BackendError, CropRect, Dimensions, MediaBackend, Quality, RasterCodec,
    SourceFormat, Toolkit,
};
use crate::preview;
use crate::session::{Session, SessionId, SessionStore, StoreError};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("input of {size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: usize, limit: usize },
    #[error("input is not a supported image")]
    NotAnImage,
    #[error("image processing failed: {0}")]
    Backend(#[from] BackendError),
}

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("unknown or expired session")]
    SessionNotFound,
    #[error("session belongs to another user")]
    OwnershipViolation,
    #[error("crop processing failed: {0}")]
    Processing(#[from] BackendError),
}

impl From<StoreError> for CommandError {
    fn from(_: StoreError) -> Self {
        CommandError::SessionNotFound
    }
}

/// A discrete user command against a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    ZoomIn,
    ZoomOut,
    Confirm,
    Cancel,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(Self::MoveUp),
            "down" => Ok(Self::MoveDown),
            "left" => Ok(Self::MoveLeft),
            "right" => Ok(Self::MoveRight),
            "in" | "zoom-in" => Ok(Self::ZoomIn),
            "out" | "zoom-out" => Ok(Self::ZoomOut),
            "confirm" => Ok(Self::Confirm),
            "cancel" => Ok(Self::Cancel),
            other => Err(format!("unknown command '{other}'")),
        }
    }
}

/// A move or zoom, separated from the lifecycle commands.
#[derive(Debug, Clone, Copy)]
enum Motion {
    Shift(Direction),
    Zoom(f32),
}

/// Numeric state reported back alongside every preview refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionReport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub zoom_percent: u32,
}

/// The final product of a confirmed session.
#[derive(Debug, Clone)]
pub struct BannerArtifact {
    pub bytes: Vec<u8>,
    /// Suggested file name, encoding offset and zoom for traceability.
    pub file_name: String,
    pub extension: &'static str,
}

/// Result of applying a command.
pub enum CommandOutcome {
    /// The region changed; fresh preview bytes and numeric state.
    Updated { preview: Vec<u8>, report: RegionReport },
    /// `Confirm` succeeded; the session is gone.
    Finished(BannerArtifact),
    /// `Cancel` deleted the session without output.
    Cancelled,
}

pub struct BannerPipeline<B> {
    backend: B,
    store: SessionStore,
    config: Config,
}

impl BannerPipeline<Toolkit> {
    /// Production pipeline: in-process raster codec plus the external
    /// animated strategy chain, both wired from `config`.
    pub fn with_default_backend(config: Config) -> Self {
        let raster = RasterCodec::new(Quality::new(config.jpeg_quality));
        let mut animated = AnimatedProcessor::new(
            config.gifsicle_path.clone(),
            config.ffmpeg_path.clone(),
            config.tool_timeout(),
        );
        if let Some(root) = &config.scratch_dir {
            animated = animated.with_scratch_root(root.clone());
        }
        Self::new(Toolkit::new(raster, animated), config)
    }
}

impl<B: MediaBackend> BannerPipeline<B> {
    pub fn new(backend: B, config: Config) -> Self {
        let store = SessionStore::new(config.session_ttl());
        Self { backend, store, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The session registry, exposed so embedders can `sweep` it on
    /// their own cadence.
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Open a session from a submitted image.
    ///
    /// Rejections (size cap, format sniffing) happen before any session
    /// state exists. A source smaller than the banner is upscaled here,
    /// once — every later geometry operation works on the upscaled
    /// buffer.
    pub fn submit(
        &self,
        owner: &str,
        bytes: Vec<u8>,
        declared_name: &str,
    ) -> Result<SessionId, SubmitError> {
        if bytes.len() > self.config.max_input_bytes {
            return Err(SubmitError::TooLarge {
                size: bytes.len(),
                limit: self.config.max_input_bytes,
            });
        }
        let format = SourceFormat::detect(&bytes).ok_or(SubmitError::NotAnImage)?;
        debug!(owner, declared_name, %format, "image submitted");

        let size = self.backend.identify(&bytes)?;
        let banner = self.config.banner();

        let (bytes, size) = match geometry::upscale_to_cover((size.width, size.height), banner) {
            Some((w, h)) => {
                let target = Dimensions { width: w, height: h };
                let upscaled = if format.is_animated() {
                    self.backend.resize_animated(&bytes, target)?
                } else {
                    self.backend.resize_static(&bytes, target, format)?
                };
                // Backends resize to the exact requested dimensions.
                (upscaled, target)
            }
            None => (bytes, size),
        };

        let region = geometry::initial_region((size.width, size.height), banner);
        let id = self
            .store
            .create(owner, bytes, size, format, region, self.config.move_step);
        info!(session = %id, owner, %format, "session created");
        Ok(id)
    }

    /// Current preview and numeric state without mutating anything.
    pub fn preview(
        &self,
        id: &SessionId,
        owner: &str,
    ) -> Result<(Vec<u8>, RegionReport), CommandError> {
        self.check_owner(id, owner)?;
        let snapshot = self.store.with(id, |s| s.clone())?;
        let report = self.report(&snapshot);
        Ok((preview::render(&snapshot, &self.config), report))
    }

    /// Apply one command on behalf of `owner`.
    pub fn command(
        &self,
        id: &SessionId,
        owner: &str,
        command: Command,
    ) -> Result<CommandOutcome, CommandError> {
        self.check_owner(id, owner)?;
        match command {
            Command::MoveUp => self.adjust(id, Motion::Shift(Direction::Up)),
            Command::MoveDown => self.adjust(id, Motion::Shift(Direction::Down)),
            Command::MoveLeft => self.adjust(id, Motion::Shift(Direction::Left)),
            Command::MoveRight => self.adjust(id, Motion::Shift(Direction::Right)),
            Command::ZoomIn => self.adjust(id, Motion::Zoom(1.0)),
            Command::ZoomOut => self.adjust(id, Motion::Zoom(-1.0)),
            Command::Confirm => self.confirm(id),
            Command::Cancel => {
                self.store.remove(id);
                info!(session = %id, "session cancelled");
                Ok(CommandOutcome::Cancelled)
            }
        }
    }

    /// Ownership is checked before any state change; the store itself
    /// has no authorization logic.
    fn check_owner(&self, id: &SessionId, owner: &str) -> Result<(), CommandError> {
        let matches = self.store.with(id, |s| s.owner == owner)?;
        if matches { Ok(()) } else { Err(CommandError::OwnershipViolation) }
    }

    fn adjust(&self, id: &SessionId, motion: Motion) -> Result<CommandOutcome, CommandError> {
        let banner = self.config.banner();
        let zoom_step = self.config.zoom_step;
        let snapshot = self.store.mutate(id, |s| {
            let source = (s.size.width, s.size.height);
            s.region = match motion {
                Motion::Shift(direction) => {
                    geometry::shift(s.region, direction, s.step, source, banner)
                }
                Motion::Zoom(sign) => {
                    geometry::apply_zoom(s.region, sign * zoom_step, source, banner)
                }
            };
            s.clone()
        })?;

        let report = self.report(&snapshot);
        Ok(CommandOutcome::Updated {
            preview: preview::render(&snapshot, &self.config),
            report,
        })
    }

    fn confirm(&self, id: &SessionId) -> Result<CommandOutcome, CommandError> {
        let session = self.store.with(id, |s| s.clone())?;
        let banner = self.config.banner();
        let source = (session.size.width, session.size.height);
        let (x, y, width, height) = geometry::crop_rect(session.region, source, banner);
        let rect = CropRect { x, y, width, height };
        let target = Dimensions { width: banner.0, height: banner.1 };

        // A processing failure leaves the session intact so the chosen
        // crop survives for a retried confirm.
        let bytes = if session.format.is_animated() {
            self.backend.crop_animated(&session.source, rect, target)?
        } else {
            self.backend
                .crop_static(&session.source, rect, target, session.format)?
        };

        self.store.remove(id);
        let report = self.report(&session);
        let extension = session.format.extension();
        let file_name = format!(
            "banner-x{}-y{}-z{}.{extension}",
            report.x, report.y, report.zoom_percent
        );
        info!(session = %id, %file_name, "banner produced");
        Ok(CommandOutcome::Finished(BannerArtifact {
            bytes,
            file_name,
            extension,
        }))
    }

    fn report(&self, session: &Session) -> RegionReport {
        let source = (session.size.width, session.size.height);
        let (x, y, width, height) =
            geometry::crop_rect(session.region, source, self.config.banner());
        RegionReport {
            x,
            y,
            width,
            height,
            zoom_percent: (session.region.zoom as f64 * 100.0).round() as u32,
        }
    }
}
