//! Scene Script
//!
//! The scene document: an ordered set of scenes forming a directed graph,
//! loaded from JSON and validated once. After [`Script::from_json`] returns
//! `Ok`, every `to`, `next` and skip target is guaranteed to resolve, so the
//! navigator only ever sees dangling ids when a caller invents one.
//!
//! # Document Shape
//!
//! ```json
//! {
//!   "title": "Cozy Gremlin",
//!   "start": "splash",
//!   "mood": { "min": 0, "max": 100, "initial": 50 },
//!   "scenes": [
//!     { "id": "splash", "kind": "start", "prompt": "Ready?", "next": "vibe" }
//!   ]
//! }
//! ```

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ScriptError;
use crate::gimmicks::{Gimmick, GimmickScope};
use crate::mood::{MoodChange, MoodRange};

/// The scene document bundled with the binary
pub const EMBEDDED_SCRIPT: &str = include_str!("../scripts/cozy_gremlin.json");

// ============================================================================
// Identifiers and Enums
// ============================================================================

/// Unique scene identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneId(String);

impl SceneId {
    /// Create a scene id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SceneId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// What kind of interaction a scene offers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneKind {
    /// Single entry action leading to `next`
    Start,
    /// One continue action leading to `next`
    Single,
    /// Two or more choice controls
    Choices,
    /// Free text entry collected into chips
    Collect,
    /// Terminal scene, closes the story
    Ending,
}

impl SceneKind {
    /// Whether scenes of this kind need a `next` target
    pub fn needs_next(&self) -> bool {
        matches!(self, Self::Start | Self::Single | Self::Collect)
    }
}

/// Visual skin for a choice control
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    Cherry,
    Blue,
    Purple,
    Glass,
}

/// Cosmetic effects the surface knows how to play
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    /// Full confetti burst
    Confetti,
    /// Smaller, gentler confetti burst
    SoftConfetti,
    /// Warm glow around the card
    SoftGlow,
    /// Full-screen overlay with a closing message
    Blackout,
    /// Hide navigation for good
    LockUi,
}

// ============================================================================
// Document Types
// ============================================================================

/// One selectable answer on a `choices` scene
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    /// Button label
    pub label: String,
    /// Small text under the label
    #[serde(default)]
    pub subtext: Option<String>,
    /// Target scene
    pub to: SceneId,
    /// Absolute mood to set when chosen
    #[serde(default)]
    pub mood: Option<f32>,
    /// Mood delta to apply when chosen (ignored if `mood` is set)
    #[serde(default)]
    pub mood_delta: Option<f32>,
    /// Aside shown for a fixed dwell before navigating
    #[serde(default)]
    pub intercept: Option<String>,
    /// Gimmick bound to this choice's control
    #[serde(default)]
    pub gimmick: Option<Gimmick>,
    /// Visual skin
    #[serde(default)]
    pub variant: Option<Variant>,
    /// Effects fired when this choice is taken
    #[serde(default)]
    pub effects: Vec<EffectKind>,
}

impl Choice {
    /// The mood change this choice carries, absolute winning over delta
    pub fn mood_change(&self) -> Option<MoodChange> {
        MoodChange::from_fields(self.mood, self.mood_delta)
    }
}

/// Settings for a `collect` scene
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CollectSpec {
    /// Minimum number of items before continue is enabled
    #[serde(default = "default_collect_min")]
    pub min: usize,
    /// Placeholder shown in an empty entry
    #[serde(default)]
    pub placeholder: Option<String>,
    /// Label for the skip action
    #[serde(default)]
    pub skip_label: Option<String>,
    /// Where skip leads (defaults to `next`)
    #[serde(default)]
    pub skip_to: Option<SceneId>,
}

fn default_collect_min() -> usize {
    1
}

impl Default for CollectSpec {
    fn default() -> Self {
        Self {
            min: default_collect_min(),
            placeholder: None,
            skip_label: None,
            skip_to: None,
        }
    }
}

/// A single scene
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub id: SceneId,
    pub kind: SceneKind,
    /// Text typed into the card
    pub prompt: String,
    /// Label for the start/continue control
    #[serde(default)]
    pub label: Option<String>,
    /// Emoji shown above the controls
    #[serde(default)]
    pub expression: Option<String>,
    #[serde(default)]
    pub mood: Option<f32>,
    #[serde(default)]
    pub mood_delta: Option<f32>,
    #[serde(default)]
    pub choices: Vec<Choice>,
    /// Scene-scoped gimmick spanning all choice controls
    #[serde(default)]
    pub gimmick: Option<Gimmick>,
    #[serde(default)]
    pub next: Option<SceneId>,
    /// Aside shown as soon as the scene renders
    #[serde(default)]
    pub aside: Option<String>,
    /// Effects fired on entry
    #[serde(default)]
    pub effects: Vec<EffectKind>,
    #[serde(default)]
    pub collect: Option<CollectSpec>,
    /// Overlay text for endings (falls back to the prompt)
    #[serde(default)]
    pub closing: Option<String>,
}

impl Scene {
    /// The mood change applied on entering, absolute winning over delta
    pub fn mood_change(&self) -> Option<MoodChange> {
        MoodChange::from_fields(self.mood, self.mood_delta)
    }

    /// Collect settings, defaulted for collect scenes that omit them
    pub fn collect_spec(&self) -> Option<CollectSpec> {
        match self.kind {
            SceneKind::Collect => Some(self.collect.clone().unwrap_or_default()),
            _ => None,
        }
    }

    /// Target of the collect skip action
    pub fn skip_target(&self) -> Option<&SceneId> {
        self.collect
            .as_ref()
            .and_then(|c| c.skip_to.as_ref())
            .or(self.next.as_ref())
    }

    /// Every scene id this scene can lead to
    pub fn targets(&self) -> impl Iterator<Item = &SceneId> {
        self.choices
            .iter()
            .map(|c| &c.to)
            .chain(self.next.iter())
            .chain(self.collect.iter().filter_map(|c| c.skip_to.as_ref()))
    }
}

/// Mood range and starting value
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoodSettings {
    pub min: f32,
    pub max: f32,
    pub initial: f32,
}

impl Default for MoodSettings {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: 100.0,
            initial: 50.0,
        }
    }
}

impl MoodSettings {
    /// The clamp range
    pub fn range(&self) -> MoodRange {
        MoodRange::new(self.min, self.max)
    }
}

#[derive(Deserialize)]
struct ScriptDocument {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    start: Option<SceneId>,
    #[serde(default)]
    mood: MoodSettings,
    scenes: Vec<Scene>,
}

// ============================================================================
// Script
// ============================================================================

/// A validated scene document
#[derive(Clone, Debug)]
pub struct Script {
    title: String,
    start: SceneId,
    mood: MoodSettings,
    scenes: Vec<Scene>,
    index: HashMap<SceneId, usize>,
}

impl Script {
    /// Parse and validate a JSON scene document
    pub fn from_json(json: &str) -> Result<Self, ScriptError> {
        let doc: ScriptDocument = serde_json::from_str(json)?;
        Self::from_document(doc)
    }

    /// Load and validate a scene document from disk
    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let json = std::fs::read_to_string(path).map_err(|e| ScriptError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let script = Self::from_json(&json)?;
        tracing::info!(
            path = %path.display(),
            scenes = script.len(),
            "Loaded scene document"
        );
        Ok(script)
    }

    /// The bundled document
    pub fn embedded() -> Result<Self, ScriptError> {
        Self::from_json(EMBEDDED_SCRIPT)
    }

    fn from_document(doc: ScriptDocument) -> Result<Self, ScriptError> {
        if doc.scenes.is_empty() {
            return Err(ScriptError::Empty);
        }

        let mood = doc.mood;
        if !(mood.min < mood.max) {
            return Err(ScriptError::InvalidMood(format!(
                "min {} must be below max {}",
                mood.min, mood.max
            )));
        }
        if mood.initial < mood.min || mood.initial > mood.max {
            return Err(ScriptError::InvalidMood(format!(
                "initial {} outside {}..={}",
                mood.initial, mood.min, mood.max
            )));
        }

        let mut index = HashMap::with_capacity(doc.scenes.len());
        for (i, scene) in doc.scenes.iter().enumerate() {
            if index.insert(scene.id.clone(), i).is_some() {
                return Err(ScriptError::DuplicateScene(scene.id.clone()));
            }
        }

        let start = doc.start.unwrap_or_else(|| doc.scenes[0].id.clone());
        if !index.contains_key(&start) {
            return Err(ScriptError::MissingStart(start));
        }

        for scene in &doc.scenes {
            validate_scene(scene)?;
            for target in scene.targets() {
                if !index.contains_key(target) {
                    return Err(ScriptError::DanglingReference {
                        from: scene.id.clone(),
                        to: target.clone(),
                    });
                }
            }
        }

        Ok(Self {
            title: doc.title.unwrap_or_else(|| "Untitled".to_string()),
            start,
            mood,
            scenes: doc.scenes,
            index,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn start(&self) -> &SceneId {
        &self.start
    }

    pub fn mood(&self) -> MoodSettings {
        self.mood
    }

    /// Look up a scene by id
    pub fn scene(&self, id: &SceneId) -> Option<&Scene> {
        self.index.get(id).map(|&i| &self.scenes[i])
    }

    pub fn contains(&self, id: &SceneId) -> bool {
        self.index.contains_key(id)
    }

    /// Zero-based position of a scene in document order
    pub fn position(&self, id: &SceneId) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    pub fn scenes(&self) -> impl Iterator<Item = &Scene> {
        self.scenes.iter()
    }

    /// Scenes reachable from the start scene, in breadth-first order
    pub fn reachable(&self) -> Vec<SceneId> {
        let mut seen = HashSet::new();
        let mut order = Vec::new();
        let mut queue = VecDeque::from([self.start.clone()]);

        while let Some(id) = queue.pop_front() {
            if !seen.insert(id.clone()) {
                continue;
            }
            if let Some(scene) = self.scene(&id) {
                queue.extend(scene.targets().cloned());
            }
            order.push(id);
        }

        order
    }
}

/// Check that a scene's shape matches its kind and its gimmicks fit
fn validate_scene(scene: &Scene) -> Result<(), ScriptError> {
    if scene.kind.needs_next() && scene.next.is_none() {
        return Err(ScriptError::invalid(&scene.id, "missing `next` target"));
    }

    match scene.kind {
        SceneKind::Choices if scene.choices.len() < 2 => {
            return Err(ScriptError::invalid(
                &scene.id,
                "choices scenes need at least two choices",
            ));
        }
        SceneKind::Choices => {}
        _ if !scene.choices.is_empty() => {
            return Err(ScriptError::invalid(
                &scene.id,
                "only choices scenes may declare choices",
            ));
        }
        _ => {}
    }

    if let Some(spec) = &scene.collect {
        if scene.kind != SceneKind::Collect {
            return Err(ScriptError::invalid(
                &scene.id,
                "collect settings on a non-collect scene",
            ));
        }
        if spec.min == 0 {
            return Err(ScriptError::invalid(&scene.id, "collect min must be at least 1"));
        }
    }

    if let Some(gimmick) = &scene.gimmick {
        if gimmick.scope() != GimmickScope::Scene {
            return Err(ScriptError::invalid(
                &scene.id,
                format!("{} must be bound to a choice", gimmick.name()),
            ));
        }
        if scene.kind != SceneKind::Choices || scene.choices.len() != 2 {
            return Err(ScriptError::invalid(
                &scene.id,
                format!("{} needs exactly two choices", gimmick.name()),
            ));
        }
    }

    for choice in &scene.choices {
        let Some(gimmick) = &choice.gimmick else {
            continue;
        };
        if gimmick.scope() != GimmickScope::Control {
            return Err(ScriptError::invalid(
                &scene.id,
                format!("{} is scene-wide and cannot sit on a choice", gimmick.name()),
            ));
        }
        if gimmick.needs_partner() && scene.choices.len() != 2 {
            return Err(ScriptError::invalid(
                &scene.id,
                format!("{} needs exactly two choices", gimmick.name()),
            ));
        }
    }

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
