//! Arm-delay morph: both choice controls take on a shared label when either
//! is hovered, and clicks only count once the hover has had time to arm

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{GimmickContext, Interaction, Reaction};
use crate::controls::{ControlAction, ControlId, ControlSet};
use crate::script::Variant;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmDelayParams {
    pub label: String,
    pub variant: Option<Variant>,
    /// Time after the last hover before clicks are accepted
    pub arm_ms: u64,
}

impl Default for ArmDelayParams {
    fn default() -> Self {
        Self {
            label: "Hm, I get you though.".to_string(),
            variant: Some(Variant::Cherry),
            arm_ms: 220,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ArmDelay {
    controls: [ControlId; 2],
    params: ArmDelayParams,
    /// The scene's shared action: the first choice's
    action: ControlAction,
    armed_at: Option<Duration>,
}

impl ArmDelay {
    pub fn attach(params: ArmDelayParams, controls: &ControlSet) -> Option<Self> {
        let ids = controls.choice_controls();
        let [first, second] = ids.as_slice() else {
            return None;
        };
        let action = controls.get(*first)?.action;
        Some(Self {
            controls: [*first, *second],
            params,
            action,
            armed_at: None,
        })
    }

    pub fn controls(&self) -> &[ControlId; 2] {
        &self.controls
    }

    pub fn handle(&mut self, interaction: Interaction, ctx: &mut GimmickContext<'_>) -> Reaction {
        match interaction {
            Interaction::HoverEnter(id) if self.controls.contains(&id) => {
                for control in self.controls {
                    if let Some(control) = ctx.controls.get_mut(control) {
                        control.label = self.params.label.clone();
                        control.variant = self.params.variant.or(control.variant);
                    }
                }
                self.armed_at = Some(ctx.now);
                Reaction::Handled
            }
            Interaction::Click(id) if self.controls.contains(&id) => {
                let arm = Duration::from_millis(self.params.arm_ms);
                match self.armed_at {
                    Some(at) if ctx.now.saturating_sub(at) < arm => Reaction::Suppressed,
                    _ => Reaction::Invoke(self.action),
                }
            }
            _ => Reaction::Ignored,
        }
    }
}
