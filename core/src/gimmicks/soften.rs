//! Soften-then-proceed: a click relabels the control, then its own action
//! runs after a short delay

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{GimmickContext, Interaction, Reaction};
use crate::controls::{ControlAction, ControlId, ControlSet};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoftenParams {
    pub label: String,
    pub delay_ms: u64,
}

impl Default for SoftenParams {
    fn default() -> Self {
        Self {
            label: "Just a little, no biggie.".to_string(),
            delay_ms: 560,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum SoftenState {
    Waiting,
    Softened { fire_at: Duration },
    Fired,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Soften {
    control: ControlId,
    params: SoftenParams,
    action: ControlAction,
    state: SoftenState,
}

impl Soften {
    pub fn attach(control: ControlId, params: SoftenParams, controls: &ControlSet) -> Option<Self> {
        let action = controls.get(control)?.action;
        Some(Self {
            control,
            params,
            action,
            state: SoftenState::Waiting,
        })
    }

    pub fn control(&self) -> ControlId {
        self.control
    }

    pub fn handle(&mut self, interaction: Interaction, ctx: &mut GimmickContext<'_>) -> Reaction {
        let Interaction::Click(id) = interaction else {
            return Reaction::Ignored;
        };
        if id != self.control {
            return Reaction::Ignored;
        }
        if self.state != SoftenState::Waiting {
            // Already softening: no double invoke, no restart
            return Reaction::Suppressed;
        }
        let Some(control) = ctx.controls.get_mut(self.control) else {
            return Reaction::Ignored;
        };
        control.label = self.params.label.clone();
        control.pulse = true;
        self.state = SoftenState::Softened {
            fire_at: ctx.now + Duration::from_millis(self.params.delay_ms),
        };
        Reaction::Suppressed
    }

    pub fn tick(&mut self, ctx: &mut GimmickContext<'_>) -> Reaction {
        match self.state {
            SoftenState::Softened { fire_at } if ctx.now >= fire_at => {
                self.state = SoftenState::Fired;
                if let Some(control) = ctx.controls.get_mut(self.control) {
                    control.pulse = false;
                }
                Reaction::Invoke(self.action)
            }
            _ => Reaction::Ignored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gimmicks::test_support::two_choices;

    fn ctx(controls: &mut ControlSet, ms: u64) -> GimmickContext<'_> {
        GimmickContext {
            controls,
            now: Duration::from_millis(ms),
            area: None,
        }
    }

    #[test]
    fn test_click_softens_then_invokes_once() {
        let mut controls = two_choices();
        let yes = controls.choice_control(0).unwrap();
        let mut soften = Soften::attach(yes, SoftenParams::default(), &controls).unwrap();

        assert_eq!(
            soften.handle(Interaction::Click(yes), &mut ctx(&mut controls, 100)),
            Reaction::Suppressed
        );
        assert_eq!(controls.get(yes).unwrap().label, "Just a little, no biggie.");
        assert!(controls.get(yes).unwrap().pulse);

        assert_eq!(soften.tick(&mut ctx(&mut controls, 600)), Reaction::Ignored);
        assert_eq!(
            soften.tick(&mut ctx(&mut controls, 660)),
            Reaction::Invoke(ControlAction::Choose(0))
        );
        assert_eq!(soften.tick(&mut ctx(&mut controls, 2000)), Reaction::Ignored);
    }

    #[test]
    fn test_second_click_does_not_restart_delay() {
        let mut controls = two_choices();
        let yes = controls.choice_control(0).unwrap();
        let mut soften = Soften::attach(yes, SoftenParams::default(), &controls).unwrap();

        soften.handle(Interaction::Click(yes), &mut ctx(&mut controls, 0));
        assert_eq!(
            soften.handle(Interaction::Click(yes), &mut ctx(&mut controls, 500)),
            Reaction::Suppressed
        );
        // still fires at the original deadline
        assert_eq!(
            soften.tick(&mut ctx(&mut controls, 560)),
            Reaction::Invoke(ControlAction::Choose(0))
        );
    }
}
