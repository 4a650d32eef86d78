//! Gremlin Core - Headless Scene Engine for Cozy Gremlin
//!
//! A small choose-your-own-adventure engine: a scene graph with mood, a
//! typewriter for prompts, and "gimmick" controls that misbehave on purpose.
//! Nothing in this crate draws or sleeps; a surface (the TUI, a test, a
//! headless driver) feeds it events and ticks and renders what it exposes.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Surface (TUI)                          │
//! │        input ──► SurfaceEvent          StageMessage ◄── draw  │
//! └───────────────────────┬──────────────────────▲────────────────┘
//!                         │                      │
//! ┌───────────────────────┼──────────────────────┼────────────────┐
//! │                     STAGE                    │                │
//! │  ┌───────────┐  ┌────────────┐  ┌──────────────┐  ┌─────────┐ │
//! │  │ Navigator │  │ Typewriter │  │ BindingSet   │  │ Controls│ │
//! │  │ (Script)  │  │ (tickets)  │  │ (gimmicks)   │  │ (epoch) │ │
//! │  └───────────┘  └────────────┘  └──────────────┘  └─────────┘ │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`Stage`]: render coordinator, the only thing that changes scenes
//! - [`Script`]: a validated scene document
//! - [`Navigator`]: current scene, history and mood
//! - [`Typewriter`]: tick-driven character reveal and erase
//! - [`Gimmick`] / [`Binding`]: declared and attached control behaviours
//! - [`SurfaceEvent`] / [`StageMessage`]: the surface protocol
//!
//! # Quick Start
//!
//! ```ignore
//! use gremlin_core::{Script, Stage, StageSettings, SurfaceEvent};
//! use std::time::Duration;
//! use tokio::sync::mpsc;
//!
//! let (tx, mut rx) = mpsc::unbounded_channel();
//! let mut stage = Stage::from_load(Script::embedded(), StageSettings::default(), tx);
//! stage.handle_event(SurfaceEvent::Start);
//!
//! loop {
//!     stage.tick(Duration::from_millis(16));
//!     while let Ok(msg) = rx.try_recv() {
//!         // react to one-off messages
//!     }
//!     // draw stage.prompt(), stage.controls(), stage.mood()
//! }
//! ```

pub mod collect;
pub mod config;
pub mod controls;
pub mod error;
pub mod events;
pub mod geometry;
pub mod gimmicks;
pub mod messages;
pub mod mood;
pub mod navigator;
pub mod script;
pub mod stage;
pub mod typewriter;

pub use collect::CollectState;
pub use config::{
    default_config_path, load_config, load_config_from_path, ConfigError, ConfigOverrides,
    ConfigSource, GremlinConfig,
};
pub use controls::{Control, ControlAction, ControlId, ControlSet};
pub use error::{NavError, ScriptError};
pub use events::SurfaceEvent;
pub use geometry::{Area, Point};
pub use gimmicks::{Binding, BindingSet, Gimmick, Interaction, Reaction};
pub use messages::{AsideAnchor, StageMessage, StageState};
pub use mood::{MoodBand, MoodChange, MoodGauge, MoodRange, MoodReading};
pub use navigator::{Navigator, Progress};
pub use script::{Choice, EffectKind, Scene, SceneId, SceneKind, Script, Variant};
pub use stage::{Outcome, Stage, StageSettings};
pub use typewriter::{Cadence, Completion, Finish, Ticket, Typewriter};
