//! Display State Types
//!
//! State the surface keeps between frames, derived from `StageMessage`s.
//! Everything else (prompt text, controls, mood) is read straight from the
//! stage when drawing.
//!
//! # Design Philosophy
//!
//! The TUI is a thin client: it draws what the stage exposes and never
//! decides which scene comes next. Display state only holds the things the
//! stage announces once and forgets: asides with a dwell time, effects,
//! the lock on navigation and the load failure.

use std::time::Duration;

use gremlin_core::{AsideAnchor, EffectKind, Progress, SceneId, SceneKind, StageMessage, StageState};

use crate::effects::Effects;

/// Asides kept on screen at once; the oldest goes first
pub const MAX_ASIDES: usize = 3;

/// Asides dim for this long before they vanish
const ASIDE_FADE: Duration = Duration::from_millis(400);

/// A line of commentary next to something on the card
#[derive(Clone, Debug, PartialEq)]
pub struct DisplayAside {
    pub text: String,
    /// What the aside is attached to
    pub anchor: AsideAnchor,
    /// Time left on screen
    pub remaining: Duration,
}

impl DisplayAside {
    /// In its last moments
    pub fn is_fading(&self) -> bool {
        self.remaining <= ASIDE_FADE
    }
}

/// Per-run display state
pub struct DisplayState {
    /// Last state announced by the stage
    pub stage_state: StageState,
    /// Scene currently on the card
    pub scene: Option<SceneId>,
    pub scene_kind: Option<SceneKind>,
    /// Gremlin face for the scene
    pub expression: Option<String>,
    pub progress: Option<Progress>,
    pub asides: Vec<DisplayAside>,
    pub effects: Effects,
    /// Navigation hidden for good
    pub ui_locked: bool,
    /// Why the story could not be loaded
    pub failure: Option<String>,
}

impl DisplayState {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            stage_state: StageState::Idle,
            scene: None,
            scene_kind: None,
            expression: None,
            progress: None,
            asides: Vec::new(),
            effects: Effects::new(seed),
            ui_locked: false,
            failure: None,
        }
    }

    /// Apply a stage message
    pub fn apply_message(&mut self, msg: &StageMessage) {
        match msg {
            StageMessage::State { state } => {
                self.stage_state = *state;
            }
            StageMessage::SceneEntered {
                id,
                kind,
                expression,
                progress,
            } => {
                self.scene = Some(id.clone());
                self.scene_kind = Some(*kind);
                self.expression = expression.clone();
                self.progress = Some(*progress);
                // The old controls are gone; keep their asides readable on the card
                for aside in &mut self.asides {
                    if matches!(aside.anchor, AsideAnchor::Control(_)) {
                        aside.anchor = AsideAnchor::Card;
                    }
                }
            }
            StageMessage::Aside {
                text,
                anchor,
                dwell_ms,
            } => {
                self.asides.push(DisplayAside {
                    text: text.clone(),
                    anchor: *anchor,
                    remaining: Duration::from_millis(*dwell_ms),
                });
                if self.asides.len() > MAX_ASIDES {
                    let excess = self.asides.len() - MAX_ASIDES;
                    self.asides.drain(..excess);
                }
            }
            StageMessage::Effect { effect, message } => match effect {
                EffectKind::LockUi => self.ui_locked = true,
                other => self.effects.trigger(*other, message.clone()),
            },
            StageMessage::LoadFailed { reason } => {
                self.failure = Some(reason.clone());
            }
        }
    }

    /// Count down asides and advance effects
    pub fn update(&mut self, delta: Duration) {
        for aside in &mut self.asides {
            aside.remaining = aside.remaining.saturating_sub(delta);
        }
        self.asides.retain(|a| !a.remaining.is_zero());
        self.effects.update(delta);
    }

    /// Newest aside for an anchor
    pub fn aside_for(&self, anchor: AsideAnchor) -> Option<&DisplayAside> {
        self.asides.iter().rev().find(|a| a.anchor == anchor)
    }

    pub fn is_collecting(&self) -> bool {
        self.scene_kind == Some(SceneKind::Collect)
    }

    /// Back link shown (the stage still decides whether back works)
    pub fn shows_back(&self) -> bool {
        !self.ui_locked && self.progress.is_some_and(|p| p.depth > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gremlin_core::ControlId;
    use pretty_assertions::assert_eq;

    fn aside(text: &str, anchor: AsideAnchor, dwell_ms: u64) -> StageMessage {
        StageMessage::Aside {
            text: text.into(),
            anchor,
            dwell_ms,
        }
    }

    fn entered(id: &str, kind: SceneKind, depth: usize) -> StageMessage {
        StageMessage::SceneEntered {
            id: id.into(),
            kind,
            expression: Some("(•‿•)".into()),
            progress: Progress {
                index: 2,
                total: 5,
                depth,
            },
        }
    }

    #[test]
    fn test_state_and_scene() {
        let mut display = DisplayState::new(Some(1));
        display.apply_message(&StageMessage::State {
            state: StageState::Busy,
        });
        display.apply_message(&entered("wishes", SceneKind::Collect, 1));

        assert_eq!(display.stage_state, StageState::Busy);
        assert_eq!(display.scene, Some(SceneId::new("wishes")));
        assert!(display.is_collecting());
        assert_eq!(display.expression.as_deref(), Some("(•‿•)"));
        assert!(display.shows_back());
    }

    #[test]
    fn test_aside_expires_after_dwell() {
        let mut display = DisplayState::new(Some(1));
        display.apply_message(&aside("ha", AsideAnchor::Prompt, 1000));

        display.update(Duration::from_millis(500));
        assert!(!display.asides[0].is_fading());
        display.update(Duration::from_millis(200));
        assert!(display.asides[0].is_fading());
        display.update(Duration::from_millis(300));
        assert!(display.asides.is_empty());
    }

    #[test]
    fn test_asides_are_capped() {
        let mut display = DisplayState::new(Some(1));
        for i in 0..5 {
            display.apply_message(&aside(&format!("a{i}"), AsideAnchor::Card, 1000));
        }
        assert_eq!(display.asides.len(), MAX_ASIDES);
        assert_eq!(display.asides[0].text, "a2");
        assert_eq!(display.aside_for(AsideAnchor::Card).unwrap().text, "a4");
    }

    #[test]
    fn test_control_asides_move_to_card_on_new_scene() {
        let mut display = DisplayState::new(Some(1));
        let id = ControlId { epoch: 3, slot: 0 };
        display.apply_message(&aside("nope", AsideAnchor::Control(id), 1200));
        display.apply_message(&entered("next", SceneKind::Choices, 1));

        assert!(display.aside_for(AsideAnchor::Control(id)).is_none());
        assert_eq!(display.aside_for(AsideAnchor::Card).unwrap().text, "nope");
    }

    #[test]
    fn test_lock_ui_hides_back() {
        let mut display = DisplayState::new(Some(1));
        display.apply_message(&entered("end", SceneKind::Ending, 4));
        assert!(display.shows_back());

        display.apply_message(&StageMessage::Effect {
            effect: EffectKind::LockUi,
            message: None,
        });
        assert!(display.ui_locked);
        assert!(!display.shows_back());
        assert!(display.effects.is_idle());
    }

    #[test]
    fn test_effects_are_forwarded() {
        let mut display = DisplayState::new(Some(1));
        display.apply_message(&StageMessage::Effect {
            effect: EffectKind::Blackout,
            message: Some("Door's always open.".into()),
        });
        let blackout = display.effects.blackout().unwrap();
        assert_eq!(blackout.message.as_deref(), Some("Door's always open."));
    }

    #[test]
    fn test_load_failure_recorded() {
        let mut display = DisplayState::new(None);
        display.apply_message(&StageMessage::LoadFailed {
            reason: "missing start scene".into(),
        });
        assert_eq!(display.failure.as_deref(), Some("missing start scene"));
        assert!(!display.shows_back());
    }
}
