//! Scene Navigator
//!
//! Owns the navigation state: which scene is current, the back-stack and the
//! authoritative mood. Only [`Navigator::start`], [`Navigator::go_to`] and
//! [`Navigator::go_back`] mutate it.
//!
//! Invariants:
//! - at most one scene is current, and exactly one once started
//! - the back-stack never contains the current scene
//! - mood always lies inside the document's range
//! - going back restores the exact mood recorded on the way forward

use std::fmt;

use crate::error::NavError;
use crate::mood::{MoodChange, MoodRange};
use crate::script::{Scene, SceneId, SceneKind, Script};

/// A back-stack entry
#[derive(Clone, Debug, PartialEq)]
pub struct HistoryEntry {
    pub scene: SceneId,
    pub mood: f32,
}

/// Where the current scene sits in the document
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Progress {
    /// One-based position in document order
    pub index: usize,
    /// Number of scenes in the document
    pub total: usize,
    /// Back-stack depth
    pub depth: usize,
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Scene {}/{}", self.index, self.total)
    }
}

/// Walks the scene graph
#[derive(Debug)]
pub struct Navigator {
    script: Script,
    current: Option<SceneId>,
    history: Vec<HistoryEntry>,
    mood: f32,
    range: MoodRange,
    locked: bool,
}

impl Navigator {
    pub fn new(script: Script) -> Self {
        let settings = script.mood();
        let range = settings.range();
        Self {
            mood: range.clamp(settings.initial),
            script,
            current: None,
            history: Vec::new(),
            range,
            locked: false,
        }
    }

    /// Enter the document's start scene
    pub fn start(&mut self) -> Result<&Scene, NavError> {
        let start = self.script.start().clone();
        self.go_to(&start, None)
    }

    /// Move forward to `id`
    ///
    /// `via` is the chosen control's own mood change; it is applied before the
    /// target scene's change. An unknown id leaves everything untouched.
    pub fn go_to(&mut self, id: &SceneId, via: Option<MoodChange>) -> Result<&Scene, NavError> {
        let Some(scene) = self.script.scene(id) else {
            tracing::warn!(scene = %id, "Navigation aborted: scene not found");
            return Err(NavError::SceneNotFound(id.clone()));
        };
        let scene_change = scene.mood_change();
        let is_ending = scene.kind == SceneKind::Ending;

        if let Some(current) = self.current.take() {
            self.history.push(HistoryEntry {
                scene: current,
                mood: self.mood,
            });
        }

        // A loop back to a visited scene drops everything after its entry
        if let Some(pos) = self.history.iter().position(|e| &e.scene == id) {
            self.history.truncate(pos);
        }

        if let Some(change) = via {
            self.mood = change.apply(self.mood, self.range);
        }
        if let Some(change) = scene_change {
            self.mood = change.apply(self.mood, self.range);
        }

        self.current = Some(id.clone());
        self.locked = is_ending;

        tracing::debug!(
            scene = %id,
            mood = self.mood,
            depth = self.history.len(),
            "Entered scene"
        );

        self.current_scene().ok_or_else(|| NavError::SceneNotFound(id.clone()))
    }

    /// Pop the back-stack, restoring the previous scene and its mood
    ///
    /// Returns `None` when there is nothing to go back to or an ending has
    /// locked navigation.
    pub fn go_back(&mut self) -> Option<&Scene> {
        if !self.can_go_back() {
            return None;
        }
        let entry = self.history.pop()?;
        tracing::debug!(scene = %entry.scene, mood = entry.mood, "Went back");
        self.mood = entry.mood;
        self.current = Some(entry.scene);
        self.locked = false;
        self.current_scene()
    }

    pub fn can_go_back(&self) -> bool {
        !self.locked && !self.history.is_empty()
    }

    pub fn current(&self) -> Option<&SceneId> {
        self.current.as_ref()
    }

    pub fn current_scene(&self) -> Option<&Scene> {
        self.current.as_ref().and_then(|id| self.script.scene(id))
    }

    pub fn mood(&self) -> f32 {
        self.mood
    }

    pub fn mood_range(&self) -> MoodRange {
        self.range
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// True once an ending has been reached
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn script(&self) -> &Script {
        &self.script
    }

    pub fn progress(&self) -> Option<Progress> {
        let current = self.current.as_ref()?;
        let position = self.script.position(current)?;
        Some(Progress {
            index: position + 1,
            total: self.script.len(),
            depth: self.history.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn script() -> Script {
        Script::from_json(
            r#"{
                "mood": { "min": 0, "max": 100, "initial": 50 },
                "scenes": [
                    { "id": "a", "kind": "start", "prompt": "A", "next": "b" },
                    { "id": "b", "kind": "choices", "prompt": "B", "mood_delta": 10,
                      "choices": [
                        { "label": "up", "to": "c", "mood_delta": 30 },
                        { "label": "loop", "to": "a" } ] },
                    { "id": "c", "kind": "single", "prompt": "C", "mood": 5, "next": "d" },
                    { "id": "d", "kind": "ending", "prompt": "D" }
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_start_enters_first_scene() {
        let mut nav = Navigator::new(script());
        assert!(nav.current().is_none());
        assert!(nav.progress().is_none());

        nav.start().unwrap();
        assert_eq!(nav.current(), Some(&SceneId::from("a")));
        assert_eq!(nav.mood(), 50.0);
        assert!(!nav.can_go_back());
        assert_eq!(nav.progress().unwrap().to_string(), "Scene 1/4");
    }

    #[test]
    fn test_go_to_pushes_history_and_applies_mood() {
        let mut nav = Navigator::new(script());
        nav.start().unwrap();
        nav.go_to(&"b".into(), None).unwrap();

        assert_eq!(nav.mood(), 60.0);
        assert_eq!(
            nav.history(),
            &[HistoryEntry {
                scene: "a".into(),
                mood: 50.0
            }]
        );
    }

    #[test]
    fn test_choice_change_applies_before_scene_change() {
        let mut nav = Navigator::new(script());
        nav.start().unwrap();
        nav.go_to(&"b".into(), None).unwrap();
        // choice +30 then scene absolute 5
        nav.go_to(&"c".into(), Some(MoodChange::Shift(30.0))).unwrap();
        assert_eq!(nav.mood(), 5.0);
    }

    #[test]
    fn test_unknown_scene_leaves_state_untouched() {
        let mut nav = Navigator::new(script());
        nav.start().unwrap();
        let err = nav.go_to(&"ghost".into(), Some(MoodChange::Set(0.0))).unwrap_err();

        assert_eq!(err, NavError::SceneNotFound("ghost".into()));
        assert_eq!(nav.current(), Some(&SceneId::from("a")));
        assert_eq!(nav.mood(), 50.0);
        assert!(nav.history().is_empty());
    }

    #[test]
    fn test_back_restores_scene_and_mood() {
        let mut nav = Navigator::new(script());
        nav.start().unwrap();
        nav.go_to(&"b".into(), None).unwrap();
        let mood_at_b = nav.mood();
        nav.go_to(&"c".into(), Some(MoodChange::Shift(30.0))).unwrap();

        let scene = nav.go_back().unwrap();
        assert_eq!(scene.id, SceneId::from("b"));
        assert_eq!(nav.mood(), mood_at_b);
    }

    #[test]
    fn test_back_on_empty_stack_is_noop() {
        let mut nav = Navigator::new(script());
        nav.start().unwrap();
        assert!(nav.go_back().is_none());
        assert_eq!(nav.current(), Some(&SceneId::from("a")));
    }

    #[test]
    fn test_loop_truncates_history() {
        let mut nav = Navigator::new(script());
        nav.start().unwrap();
        nav.go_to(&"b".into(), None).unwrap();
        nav.go_to(&"a".into(), None).unwrap();

        assert_eq!(nav.current(), Some(&SceneId::from("a")));
        assert!(nav.history().iter().all(|e| e.scene.as_str() != "a"));
        assert!(nav.history().is_empty());
    }

    #[test]
    fn test_self_loop_does_not_grow_history() {
        let mut nav = Navigator::new(script());
        nav.start().unwrap();
        nav.go_to(&"b".into(), None).unwrap();
        let depth = nav.history().len();
        for _ in 0..5 {
            nav.go_to(&"b".into(), None).unwrap();
        }
        assert_eq!(nav.history().len(), depth);
    }

    #[test]
    fn test_ending_locks_back() {
        let mut nav = Navigator::new(script());
        nav.start().unwrap();
        nav.go_to(&"b".into(), None).unwrap();
        nav.go_to(&"d".into(), None).unwrap();

        assert!(nav.is_locked());
        assert!(!nav.can_go_back());
        assert!(nav.go_back().is_none());
        assert_eq!(nav.current(), Some(&SceneId::from("d")));
    }
}
