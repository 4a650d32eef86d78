//! Gimmick Behaviours
//!
//! A closed set of playful behaviours bound to choice controls for the
//! lifetime of one scene. Gimmicks are declared in the scene document as
//! [`Gimmick`] values and become live [`Binding`]s when the scene turns
//! interactive.
//!
//! # Design Philosophy
//!
//! Bindings never own timers or callbacks. They react to [`Interaction`]s and
//! to `tick` calls from the stage, and answer with a [`Reaction`] the stage
//! interprets. Detaching is therefore just removing the binding and
//! restoring the styles it touched. After that the binding cannot observe
//! anything, so nothing leaks into the next scene.
//!
//! Every attach hands back a [`BindingHandle`]; detach is idempotent.

mod arm_delay;
mod evade;
mod morph;
mod plead;
mod shrink;
mod soften;
mod swap;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::controls::{ControlAction, ControlId, ControlSet};
use crate::geometry::{Area, Point};
use crate::messages::AsideAnchor;

pub use arm_delay::{ArmDelay, ArmDelayParams};
pub use evade::{Evade, EvadeParams};
pub use morph::{Morph, MorphParams};
pub use plead::{Plead, PleadParams};
pub use shrink::{Shrink, ShrinkParams};
pub use soften::{Soften, SoftenParams};
pub use swap::Swap;

// ============================================================================
// Declarations
// ============================================================================

/// A gimmick as declared in the scene document
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Gimmick {
    /// Control runs away from the pointer
    Evade(EvadeParams),
    /// Hover turns the control into the opposite choice
    MorphToOpposite(MorphParams),
    /// Each click shrinks the control until it vanishes
    ShrinkToVanish(ShrinkParams),
    /// Hover swaps the two choice controls
    SwapOnHover,
    /// Click relabels, then proceeds after a delay
    SoftenThenProceed(SoftenParams),
    /// Both controls morph on hover and only work once armed
    ArmDelayMorph(ArmDelayParams),
    /// Each click retypes the prompt with a longer plea
    Plead(PleadParams),
}

/// Where a gimmick may be declared
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GimmickScope {
    /// On a single choice
    Control,
    /// On the scene, spanning every choice control
    Scene,
}

impl Gimmick {
    pub fn scope(&self) -> GimmickScope {
        match self {
            Self::ArmDelayMorph(_) => GimmickScope::Scene,
            _ => GimmickScope::Control,
        }
    }

    /// Whether the gimmick needs the other choice control
    pub fn needs_partner(&self) -> bool {
        matches!(self, Self::MorphToOpposite(_) | Self::SwapOnHover)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Evade(_) => "evade",
            Self::MorphToOpposite(_) => "morph_to_opposite",
            Self::ShrinkToVanish(_) => "shrink_to_vanish",
            Self::SwapOnHover => "swap_on_hover",
            Self::SoftenThenProceed(_) => "soften_then_proceed",
            Self::ArmDelayMorph(_) => "arm_delay_morph",
            Self::Plead(_) => "plead",
        }
    }
}

// ============================================================================
// Interactions and Reactions
// ============================================================================

/// Something the user did that bindings may react to
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Interaction {
    PointerMoved(Point),
    HoverEnter(ControlId),
    HoverLeave(ControlId),
    Click(ControlId),
}

/// A binding's answer to an interaction or tick
#[derive(Clone, Debug, PartialEq)]
pub enum Reaction {
    /// Not for this binding
    Ignored,
    /// Styles changed, nothing else to do
    Handled,
    /// Click swallowed; the control's own action must not run
    Suppressed,
    /// Run this action instead of the clicked control's own
    Invoke(ControlAction),
    /// Show an aside; swallows the click
    Aside { text: String, anchor: AsideAnchor },
    /// Retype the prompt with new text and emphasis; swallows the click
    Retype { text: String, emphasis: f32 },
}

/// What a binding may read and touch while reacting
pub struct GimmickContext<'a> {
    pub controls: &'a mut ControlSet,
    /// Stage clock
    pub now: Duration,
    /// Card area reported by the surface
    pub area: Option<Area>,
}

// ============================================================================
// Bindings
// ============================================================================

/// A live gimmick for one scene
#[derive(Clone, Debug, PartialEq)]
pub enum Binding {
    Evade(Evade),
    Morph(Morph),
    Shrink(Shrink),
    Swap(Swap),
    Soften(Soften),
    ArmDelay(ArmDelay),
    Plead(Plead),
}

impl Binding {
    /// Bind `gimmick` to `target` (a choice control), or to every choice
    /// control for scene-scoped gimmicks
    ///
    /// Returns `None` when the controls the gimmick needs are missing.
    pub fn attach(gimmick: &Gimmick, target: Option<ControlId>, controls: &ControlSet) -> Option<Self> {
        let binding = match (gimmick, target) {
            (Gimmick::ArmDelayMorph(params), _) => {
                Self::ArmDelay(ArmDelay::attach(params.clone(), controls)?)
            }
            (_, None) => return None,
            (Gimmick::Evade(params), Some(id)) => Self::Evade(Evade::attach(id, params.clone(), controls)?),
            (Gimmick::MorphToOpposite(params), Some(id)) => {
                Self::Morph(Morph::attach(id, params, controls)?)
            }
            (Gimmick::ShrinkToVanish(params), Some(id)) => {
                Self::Shrink(Shrink::attach(id, params.clone(), controls)?)
            }
            (Gimmick::SwapOnHover, Some(id)) => Self::Swap(Swap::attach(id, controls)?),
            (Gimmick::SoftenThenProceed(params), Some(id)) => {
                Self::Soften(Soften::attach(id, params.clone(), controls)?)
            }
            (Gimmick::Plead(params), Some(id)) => Self::Plead(Plead::attach(id, params.clone(), controls)?),
        };
        Some(binding)
    }

    pub fn handle(&mut self, interaction: Interaction, ctx: &mut GimmickContext<'_>) -> Reaction {
        match self {
            Self::Evade(b) => b.handle(interaction, ctx),
            Self::Morph(b) => b.handle(interaction, ctx),
            Self::Shrink(b) => b.handle(interaction, ctx),
            Self::Swap(b) => b.handle(interaction, ctx),
            Self::Soften(b) => b.handle(interaction, ctx),
            Self::ArmDelay(b) => b.handle(interaction, ctx),
            Self::Plead(b) => b.handle(interaction, ctx),
        }
    }

    /// Advance time-based behaviour
    pub fn tick(&mut self, ctx: &mut GimmickContext<'_>) -> Reaction {
        match self {
            Self::Soften(b) => b.tick(ctx),
            _ => Reaction::Ignored,
        }
    }

    /// Controls whose style this binding may have changed
    pub fn controls(&self) -> Vec<ControlId> {
        match self {
            Self::Evade(b) => vec![b.control()],
            Self::Morph(b) => vec![b.control()],
            Self::Shrink(b) => vec![b.control()],
            Self::Swap(b) => b.controls().to_vec(),
            Self::Soften(b) => vec![b.control()],
            Self::ArmDelay(b) => b.controls().to_vec(),
            Self::Plead(b) => vec![b.control()],
        }
    }

    fn release(&self, controls: &mut ControlSet) {
        for id in self.controls() {
            controls.reset_style(id);
        }
    }
}

/// The other choice control in a two-choice scene
pub(crate) fn partner_of(id: ControlId, controls: &ControlSet) -> Option<ControlId> {
    let choices = controls.choice_controls();
    if choices.len() != 2 || !choices.contains(&id) {
        return None;
    }
    choices.into_iter().find(|&other| other != id)
}

/// Proof of an attached binding
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BindingHandle(u64);

/// Every live binding of the current scene
#[derive(Debug, Default)]
pub struct BindingSet {
    bindings: Vec<(BindingHandle, Binding)>,
    next_handle: u64,
}

impl BindingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self, binding: Binding) -> BindingHandle {
        self.next_handle += 1;
        let handle = BindingHandle(self.next_handle);
        self.bindings.push((handle, binding));
        handle
    }

    /// Remove one binding and restore its controls
    ///
    /// Returns false if the handle was already detached.
    pub fn detach(&mut self, handle: BindingHandle, controls: &mut ControlSet) -> bool {
        let Some(pos) = self.bindings.iter().position(|(h, _)| *h == handle) else {
            return false;
        };
        let (_, binding) = self.bindings.remove(pos);
        binding.release(controls);
        true
    }

    /// Remove every binding, returning how many were live
    pub fn detach_all(&mut self, controls: &mut ControlSet) -> usize {
        let count = self.bindings.len();
        for (_, binding) in self.bindings.drain(..) {
            binding.release(controls);
        }
        count
    }

    /// Offer an interaction to every binding, collecting non-ignored reactions
    pub fn dispatch(&mut self, interaction: Interaction, ctx: &mut GimmickContext<'_>) -> Vec<Reaction> {
        self.bindings
            .iter_mut()
            .map(|(_, binding)| binding.handle(interaction, ctx))
            .filter(|r| *r != Reaction::Ignored)
            .collect()
    }

    pub fn tick(&mut self, ctx: &mut GimmickContext<'_>) -> Vec<Reaction> {
        self.bindings
            .iter_mut()
            .map(|(_, binding)| binding.tick(ctx))
            .filter(|r| *r != Reaction::Ignored)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_gimmick_parses_with_defaults() {
        let g: Gimmick = serde_json::from_str(r#"{ "kind": "shrink_to_vanish" }"#).unwrap();
        assert_eq!(g, Gimmick::ShrinkToVanish(ShrinkParams::default()));

        let g: Gimmick = serde_json::from_str(r#"{ "kind": "swap_on_hover" }"#).unwrap();
        assert_eq!(g, Gimmick::SwapOnHover);

        let g: Gimmick =
            serde_json::from_str(r#"{ "kind": "soften_then_proceed", "label": "eh", "delay_ms": 100 }"#)
                .unwrap();
        match g {
            Gimmick::SoftenThenProceed(p) => {
                assert_eq!(p.label, "eh");
                assert_eq!(p.delay_ms, 100);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_unknown_gimmick_rejected() {
        assert!(serde_json::from_str::<Gimmick>(r#"{ "kind": "teleport" }"#).is_err());
    }

    #[test]
    fn test_scopes() {
        assert_eq!(
            Gimmick::ArmDelayMorph(ArmDelayParams::default()).scope(),
            GimmickScope::Scene
        );
        assert_eq!(Gimmick::SwapOnHover.scope(), GimmickScope::Control);
        assert!(Gimmick::SwapOnHover.needs_partner());
        assert!(!Gimmick::Evade(EvadeParams::default()).needs_partner());
    }

    #[test]
    fn test_detach_restores_and_is_idempotent() {
        let mut controls = test_support::two_choices();
        let yes = controls.choice_control(1).unwrap();
        let mut set = BindingSet::new();
        let binding = Binding::attach(&Gimmick::SwapOnHover, Some(yes), &controls).unwrap();
        let handle = set.attach(binding);

        let mut ctx = GimmickContext {
            controls: &mut controls,
            now: Duration::ZERO,
            area: None,
        };
        let reactions = set.dispatch(Interaction::HoverEnter(yes), &mut ctx);
        assert_eq!(reactions, vec![Reaction::Handled]);
        assert_eq!(controls.ordered()[0].id, yes);

        assert!(set.detach(handle, &mut controls));
        assert_eq!(controls.ordered()[1].id, yes);
        assert!(!set.detach(handle, &mut controls));
        assert!(set.is_empty());
    }

    #[test]
    fn test_detached_binding_sees_nothing() {
        let mut controls = test_support::two_choices();
        let no = controls.choice_control(1).unwrap();
        let mut set = BindingSet::new();
        set.attach(
            Binding::attach(
                &Gimmick::ShrinkToVanish(ShrinkParams::default()),
                Some(no),
                &controls,
            )
            .unwrap(),
        );
        assert_eq!(set.detach_all(&mut controls), 1);
        assert_eq!(set.detach_all(&mut controls), 0);

        let mut ctx = GimmickContext {
            controls: &mut controls,
            now: Duration::ZERO,
            area: None,
        };
        for _ in 0..20 {
            assert!(set.dispatch(Interaction::Click(no), &mut ctx).is_empty());
        }
        assert_eq!(controls.get(no).unwrap().scale, 1.0);
        assert!(!controls.get(no).unwrap().hidden);
    }

    #[test]
    fn test_attach_requires_target_for_control_gimmicks() {
        let controls = test_support::two_choices();
        assert!(Binding::attach(&Gimmick::SwapOnHover, None, &controls).is_none());
        assert!(
            Binding::attach(&Gimmick::ArmDelayMorph(ArmDelayParams::default()), None, &controls)
                .is_some()
        );
    }
}
