//! Scene Controls
//!
//! The interactive surface of a scene, rebuilt from the scene definition on
//! every transition. Gimmicks decorate controls through the style fields
//! (`label`, `variant`, `order`, `offset`, `scale`, `hidden`, `pulse`); a
//! control always remembers its base look so a detached gimmick can put it
//! back exactly.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::Point;
use crate::script::{Scene, SceneKind, Variant};

/// Identifies a control within one scene rendering
///
/// `epoch` changes on every scene entry, so ids from a previous rendering
/// never resolve against the current controls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ControlId {
    pub epoch: u32,
    pub slot: u16,
}

impl fmt::Display for ControlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}:{}", self.epoch, self.slot)
    }
}

/// What activating a control does
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlAction {
    /// Leave the start scene
    Begin,
    /// Continue to `next` (single and collect scenes)
    Continue,
    /// Skip a collect scene ("not now")
    Skip,
    /// Take the choice at this index
    Choose(usize),
}

#[derive(Clone, Debug, PartialEq)]
struct BaseStyle {
    label: String,
    variant: Option<Variant>,
    order: usize,
}

/// One button on the card
#[derive(Clone, Debug, PartialEq)]
pub struct Control {
    pub id: ControlId,
    pub action: ControlAction,
    pub label: String,
    pub subtext: Option<String>,
    pub variant: Option<Variant>,
    /// Visual slot, left to right
    pub order: usize,
    /// False while text animates or a transition runs
    pub enabled: bool,
    /// True while a precondition (collect minimum) blocks the action
    pub gated: bool,
    pub hidden: bool,
    /// Displacement from the home position
    pub offset: Point,
    pub scale: f32,
    pub pulse: bool,
    /// Untransformed centre reported by the surface
    pub home: Option<Point>,
    base: BaseStyle,
}

impl Control {
    fn new(id: ControlId, action: ControlAction, label: String, variant: Option<Variant>) -> Self {
        let order = id.slot as usize;
        Self {
            id,
            action,
            base: BaseStyle {
                label: label.clone(),
                variant,
                order,
            },
            label,
            subtext: None,
            variant,
            order,
            enabled: false,
            gated: false,
            hidden: false,
            offset: Point::ORIGIN,
            scale: 1.0,
            pulse: false,
            home: None,
        }
    }

    /// Enabled, not gated, not hidden
    pub fn is_actionable(&self) -> bool {
        self.enabled && !self.gated && !self.hidden
    }

    /// Current centre including any gimmick offset
    pub fn center(&self) -> Option<Point> {
        self.home.map(|home| home.offset(self.offset))
    }

    pub fn base_label(&self) -> &str {
        &self.base.label
    }

    pub fn base_variant(&self) -> Option<Variant> {
        self.base.variant
    }

    /// Undo every style a gimmick may have applied
    pub fn reset_style(&mut self) {
        self.label = self.base.label.clone();
        self.variant = self.base.variant;
        self.order = self.base.order;
        self.offset = Point::ORIGIN;
        self.scale = 1.0;
        self.hidden = false;
        self.pulse = false;
    }
}

/// All controls of the current scene
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ControlSet {
    epoch: u32,
    controls: Vec<Control>,
}

impl ControlSet {
    /// Build the controls a scene declares, all disabled
    pub fn for_scene(scene: &Scene, epoch: u32) -> Self {
        let mut controls = Vec::new();
        let mut push = |action, label: String, variant| {
            let id = ControlId {
                epoch,
                slot: controls.len() as u16,
            };
            controls.push(Control::new(id, action, label, variant));
        };

        match scene.kind {
            SceneKind::Start => {
                push(
                    ControlAction::Begin,
                    scene.label.clone().unwrap_or_else(|| "Start".to_string()),
                    Some(Variant::Cherry),
                );
            }
            SceneKind::Single => {
                push(
                    ControlAction::Continue,
                    scene.label.clone().unwrap_or_else(|| "Continue".to_string()),
                    Some(Variant::Blue),
                );
            }
            SceneKind::Choices => {
                for (i, choice) in scene.choices.iter().enumerate() {
                    push(ControlAction::Choose(i), choice.label.clone(), choice.variant);
                }
            }
            SceneKind::Collect => {
                let spec = scene.collect_spec().unwrap_or_default();
                push(
                    ControlAction::Continue,
                    scene.label.clone().unwrap_or_else(|| "Continue".to_string()),
                    Some(Variant::Cherry),
                );
                push(
                    ControlAction::Skip,
                    spec.skip_label.unwrap_or_else(|| "Not now".to_string()),
                    Some(Variant::Glass),
                );
            }
            SceneKind::Ending => {}
        }

        for control in &mut controls {
            if let ControlAction::Choose(i) = control.action {
                control.subtext = scene.choices[i].subtext.clone();
            }
        }

        Self { epoch, controls }
    }

    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    pub fn len(&self) -> usize {
        self.controls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }

    pub fn get(&self, id: ControlId) -> Option<&Control> {
        if id.epoch != self.epoch {
            return None;
        }
        self.controls.get(id.slot as usize)
    }

    pub fn get_mut(&mut self, id: ControlId) -> Option<&mut Control> {
        if id.epoch != self.epoch {
            return None;
        }
        self.controls.get_mut(id.slot as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Control> {
        self.controls.iter()
    }

    /// Controls sorted by visual slot
    pub fn ordered(&self) -> Vec<&Control> {
        let mut ordered: Vec<&Control> = self.controls.iter().collect();
        ordered.sort_by_key(|c| c.order);
        ordered
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        for control in &mut self.controls {
            control.enabled = enabled;
        }
    }

    pub fn any_enabled(&self) -> bool {
        self.controls.iter().any(|c| c.enabled)
    }

    /// Control bound to the choice at `index`
    pub fn choice_control(&self, index: usize) -> Option<ControlId> {
        self.controls
            .iter()
            .find(|c| c.action == ControlAction::Choose(index))
            .map(|c| c.id)
    }

    /// Every choice control, in choice order
    pub fn choice_controls(&self) -> Vec<ControlId> {
        self.controls
            .iter()
            .filter(|c| matches!(c.action, ControlAction::Choose(_)))
            .map(|c| c.id)
            .collect()
    }

    /// Gate or ungate every control with `action`
    pub fn set_gated(&mut self, action: ControlAction, gated: bool) {
        for control in self.controls.iter_mut().filter(|c| c.action == action) {
            control.gated = gated;
        }
    }

    /// Exchange the visual slots of two controls
    pub fn swap_order(&mut self, a: ControlId, b: ControlId) {
        let (Some(order_a), Some(order_b)) = (self.get(a).map(|c| c.order), self.get(b).map(|c| c.order))
        else {
            return;
        };
        if let Some(control) = self.get_mut(a) {
            control.order = order_b;
        }
        if let Some(control) = self.get_mut(b) {
            control.order = order_a;
        }
    }

    pub fn set_home(&mut self, id: ControlId, home: Point) {
        if let Some(control) = self.get_mut(id) {
            control.home = Some(home);
        }
    }

    pub fn reset_style(&mut self, id: ControlId) {
        if let Some(control) = self.get_mut(id) {
            control.reset_style();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::Script;
    use pretty_assertions::assert_eq;

    fn script() -> Script {
        Script::from_json(
            r#"{ "scenes": [
                { "id": "s", "kind": "start", "prompt": "Ready?", "next": "c" },
                { "id": "c", "kind": "choices", "prompt": "?",
                  "choices": [
                    { "label": "No", "to": "w", "variant": "cherry", "subtext": "honest" },
                    { "label": "Yes", "to": "w", "variant": "purple" } ] },
                { "id": "w", "kind": "collect", "prompt": "wishes", "next": "e",
                  "collect": { "min": 2, "skip_label": "Later" } },
                { "id": "e", "kind": "ending", "prompt": "bye" }
            ] }"#,
        )
        .unwrap()
    }

    fn controls_for(id: &str, epoch: u32) -> ControlSet {
        let script = script();
        ControlSet::for_scene(script.scene(&id.into()).unwrap(), epoch)
    }

    #[test]
    fn test_start_scene_has_begin_control() {
        let set = controls_for("s", 1);
        let ordered = set.ordered();
        assert_eq!(ordered.len(), 1);
        assert_eq!(ordered[0].action, ControlAction::Begin);
        assert_eq!(ordered[0].label, "Start");
        assert!(!ordered[0].enabled);
    }

    #[test]
    fn test_choice_controls_follow_choices() {
        let set = controls_for("c", 3);
        assert_eq!(set.choice_controls().len(), 2);
        let no = set.get(set.choice_control(0).unwrap()).unwrap();
        assert_eq!(no.label, "No");
        assert_eq!(no.variant, Some(Variant::Cherry));
        assert_eq!(no.subtext.as_deref(), Some("honest"));
    }

    #[test]
    fn test_collect_has_continue_and_skip() {
        let set = controls_for("w", 1);
        let labels: Vec<&str> = set.ordered().iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["Continue", "Later"]);
    }

    #[test]
    fn test_ending_has_no_controls() {
        assert!(controls_for("e", 1).is_empty());
    }

    #[test]
    fn test_stale_epoch_does_not_resolve() {
        let set = controls_for("c", 2);
        let stale = ControlId { epoch: 1, slot: 0 };
        assert!(set.get(stale).is_none());
    }

    #[test]
    fn test_swap_and_reset() {
        let mut set = controls_for("c", 1);
        let a = set.choice_control(0).unwrap();
        let b = set.choice_control(1).unwrap();
        set.swap_order(a, b);
        assert_eq!(set.ordered()[0].id, b);

        if let Some(c) = set.get_mut(a) {
            c.label = "changed".into();
            c.scale = 0.3;
            c.hidden = true;
        }
        set.reset_style(a);
        set.reset_style(b);

        let control = set.get(a).unwrap();
        assert_eq!(control.label, "No");
        assert_eq!(control.scale, 1.0);
        assert!(!control.hidden);
        assert_eq!(set.ordered()[0].id, a);
    }

    #[test]
    fn test_actionable_respects_gate() {
        let mut set = controls_for("w", 1);
        set.set_enabled(true);
        set.set_gated(ControlAction::Continue, true);
        let ordered = set.ordered();
        assert!(!ordered[0].is_actionable());
        assert!(ordered[1].is_actionable());
    }
}
