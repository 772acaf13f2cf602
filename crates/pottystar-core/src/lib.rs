//! # Pottystar Core Library
//!
//! Business logic for Pottystar, a children's countdown timer that pays out a
//! star for every success. The CLI binary is a thin front-end over this crate.
//!
//! ## Architecture
//!
//! - **Timer**: a one-second countdown state machine whose tick source is a
//!   timer on a virtual-time [`TimerQueue`]. Nothing here reads a clock; the
//!   owner advances time.
//! - **Audio**: oscillator voices rendered from code, sequenced into the four
//!   cues (click, success, star, alarm) and sent to a pluggable output.
//! - **Storage**: SQLite key-value store for the star count and TOML-based
//!   configuration.
//! - **Session**: the controller tying these together behind user actions.
//!
//! ## Key Components
//!
//! - [`CountdownEngine`]: countdown state machine
//! - [`ToneSequencer`]: cue synthesis and scheduling
//! - [`RewardCounter`]: persisted star count
//! - [`Session`]: user-facing actions and time advancement

pub mod audio;
pub mod error;
pub mod events;
pub mod session;
pub mod storage;
pub mod timer;

pub use audio::{AudioOutput, Cue, NullOutput, RecordingOutput, ToneSequencer, Voice};
pub use error::{AudioError, ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::{Event, Outcome};
pub use session::{Job, Session, SessionOptions};
pub use storage::{Config, Database, KvStore, MemoryStore, RewardCounter};
pub use timer::{CountdownEngine, TimerQueue, TimerState};
