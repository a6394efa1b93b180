//! Core library for the Beatsync chart editor and player.
//!
//! The crate models everything behind the interactive surfaces: the chart
//! document (notes, speed sections, effects), the playback-rate schedule, the
//! per-frame animation driver, the drag/click input layer and the effect
//! trigger scheduler. The host media element and all painting live outside,
//! behind the [`MediaTransport`] seam and the plain-data frame snapshots each
//! module emits.

pub mod chart;
pub mod config;
pub mod driver;
pub mod error;
pub mod input;
pub mod media;
pub mod playback;
pub mod session;
pub mod trigger;

pub use chart::{Chart, Effect, EffectKind, ItemId, Note, Section};
pub use config::{SurfaceConfig, ViewConfig};
pub use driver::{AnimationDriver, DriverState, FrameSnapshot, NoteMarker, Viewport};
pub use error::{BeatsyncError, Result};
pub use input::{DragController, DragTarget, TimelineMetrics};
pub use media::{MediaSession, MediaSource, MediaState, MediaTransport, ScriptedMedia};
pub use playback::{rate_at, target_rate, PlaybackControls};
pub use session::{Session, ViewMode};
pub use trigger::{EffectScheduler, TriggeredEffect};
