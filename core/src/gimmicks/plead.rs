//! Plead: each click retypes the prompt with a longer "Pleease?" and makes
//! it bigger, optionally giving up after a number of pleas

use serde::{Deserialize, Serialize};

use super::{GimmickContext, Interaction, Reaction};
use crate::controls::{ControlAction, ControlId, ControlSet};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PleadParams {
    /// Run the control's own action on this click; `None` pleads forever
    pub give_up_after: Option<u32>,
    /// Cap on extra `e`s so the plea stays readable
    pub max_extra: u32,
    /// Emphasis added per plea
    pub growth: f32,
    pub max_emphasis: f32,
}

impl Default for PleadParams {
    fn default() -> Self {
        Self {
            give_up_after: None,
            max_extra: 20,
            growth: 0.05,
            max_emphasis: 3.2,
        }
    }
}

impl PleadParams {
    /// Text for the `count`-th plea
    pub fn plea(&self, count: u32) -> String {
        let es = 1 + count.min(self.max_extra) as usize;
        format!("Ple{}ase?", "e".repeat(es))
    }

    pub fn emphasis(&self, count: u32) -> f32 {
        (1.0 + count as f32 * self.growth).clamp(1.0, self.max_emphasis.max(1.0))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Plead {
    control: ControlId,
    params: PleadParams,
    action: ControlAction,
    count: u32,
}

impl Plead {
    pub fn attach(control: ControlId, params: PleadParams, controls: &ControlSet) -> Option<Self> {
        let action = controls.get(control)?.action;
        Some(Self {
            control,
            params,
            action,
            count: 0,
        })
    }

    pub fn control(&self) -> ControlId {
        self.control
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn handle(&mut self, interaction: Interaction, _ctx: &mut GimmickContext<'_>) -> Reaction {
        match interaction {
            Interaction::Click(id) if id == self.control => {
                self.count += 1;
                if self.params.give_up_after.is_some_and(|n| self.count >= n) {
                    return Reaction::Invoke(self.action);
                }
                Reaction::Retype {
                    text: self.params.plea(self.count),
                    emphasis: self.params.emphasis(self.count),
                }
            }
            _ => Reaction::Ignored,
        }
    }
}
