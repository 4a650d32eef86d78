//! Surface Events
//!
//! Events sent from the surface to the stage. Surfaces report what happened
//! (pointer moved, control clicked, key typed into an entry) and never decide
//! what it means.

use serde::{Deserialize, Serialize};

use crate::controls::ControlId;
use crate::geometry::{Area, Point};

/// Events from surface to stage
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SurfaceEvent {
    /// Begin the story (enter the start scene)
    Start,

    /// The prompt text was clicked (fast-forwards typing)
    PromptClicked,

    /// The back action was used
    BackRequested,

    /// Pointer moved inside the surface
    PointerMoved { x: f32, y: f32 },

    /// Pointer entered a control
    HoverEnter(ControlId),

    /// Pointer left a control
    HoverLeave(ControlId),

    /// A control was clicked
    Click(ControlId),

    /// A character typed into the collect entry
    TextInput(char),

    /// Backspace in the collect entry
    EntryBackspace,

    /// Commit the collect entry
    EntrySubmit,

    /// Card area and control home positions after layout
    Layout {
        card: Area,
        homes: Vec<(ControlId, Point)>,
    },
}
