//! Stage Messages
//!
//! Messages sent from the stage to the surface.
//!
//! # Design Philosophy
//!
//! The stage keeps render data (prompt text, controls, mood reading) behind
//! accessors that the surface reads every frame. Messages carry only what
//! happens once: a scene was entered, an aside should appear, an effect
//! should play, loading failed. The surface never interprets story logic.

use serde::{Deserialize, Serialize};

use crate::controls::ControlId;
use crate::navigator::Progress;
use crate::script::{EffectKind, SceneId, SceneKind};

/// Coarse lifecycle state of the stage
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageState {
    /// Loaded, start scene not entered yet
    Idle,
    /// A transition or text animation is running; input is disabled
    Busy,
    /// Controls are live
    Ready,
    /// An ending has been reached
    Ended,
    /// The scene document could not be loaded
    Failed,
}

impl StageState {
    pub fn description(&self) -> &'static str {
        match self {
            Self::Idle => "Waiting",
            Self::Busy => "Typing...",
            Self::Ready => "Your move",
            Self::Ended => "The end",
            Self::Failed => "Could not load the story",
        }
    }
}

/// Where an aside should be placed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AsideAnchor {
    /// Next to a control
    Control(ControlId),
    /// Under the prompt
    Prompt,
    /// Anywhere on the card
    Card,
}

/// Messages from stage to surface
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum StageMessage {
    /// Lifecycle state changed
    State { state: StageState },

    /// A new scene is being rendered
    SceneEntered {
        id: SceneId,
        kind: SceneKind,
        /// Emoji shown above the controls
        expression: Option<String>,
        progress: Progress,
    },

    /// Show an aside for `dwell_ms`
    Aside {
        text: String,
        anchor: AsideAnchor,
        dwell_ms: u64,
    },

    /// Play a cosmetic effect
    Effect {
        effect: EffectKind,
        /// Text for effects that show one (blackout)
        message: Option<String>,
    },

    /// Scene document failed to load; nothing will be navigated
    LoadFailed { reason: String },
}
