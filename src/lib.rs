//! # Bannercut
//!
//! Interactive crop-to-banner processing: a caller submits an image, a
//! user steers a bounded, zoom-aware crop rectangle over it with
//! discrete move/zoom commands, and a confirm produces a fixed-size
//! banner — with animation preserved when the source is an animated
//! GIF.
//!
//! # Architecture
//!
//! The crate is a pipeline around one piece of mutable state, the
//! session:
//!
//! ```text
//! submit   image bytes → sniff → identify → pre-upscale → session
//! command  move/zoom   → geometry clamp → preview refresh
//! confirm  session     → raster codec | animated tool chain → banner
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`geometry`] | Pure crop-rectangle math: clamped moves, bounded zoom, cover-upscale |
//! | [`session`] | In-memory session registry with fixed-window expiry |
//! | [`preview`] | Overlay preview rendering with a synthetic fallback |
//! | [`media`] | Format sniffing, the backend trait, the static codec, the animated tool chain |
//! | [`pipeline`] | Orchestration: submit/command/confirm, per-format dispatch |
//! | [`config`] | Runtime configuration with TOML overrides |
//!
//! # Design Decisions
//!
//! ## In-Process Static, External Animated
//!
//! PNG and JPEG crops run entirely through the `image` crate — decode,
//! `crop_imm`, Lanczos3 resize, re-encode in the source's own family.
//! Animated GIFs go through external tools instead, because preserving
//! per-frame timing and looping through a crop is exactly what gifsicle
//! and ffmpeg already do well. The two strategies are tried in order,
//! and a gifsicle result is only trusted after its frame metadata shows
//! the animation survived.
//!
//! ## Sessions Are Ephemeral By Design
//!
//! All interactive state lives in one in-memory registry with a fixed
//! expiry window from creation — no persistence, no sliding renewal.
//! An abandoned session costs memory for exactly one window.
//!
//! ## Preview Never Fails
//!
//! The preview path exists to give a human feedback, so it degrades
//! instead of erroring: any render problem produces a synthetic diagram
//! carrying the same numbers as text.

pub mod config;
pub mod geometry;
pub mod media;
pub mod pipeline;
pub mod preview;
pub mod session;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use config::Config;
pub use pipeline::{BannerArtifact, BannerPipeline, Command, CommandOutcome};
pub use session::{SessionId, SessionStore};
