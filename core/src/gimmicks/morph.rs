//! Morph-to-opposite: hovering turns the control into the other choice

use serde::{Deserialize, Serialize};

use super::{partner_of, GimmickContext, Interaction, Reaction};
use crate::controls::{ControlAction, ControlId, ControlSet};
use crate::script::Variant;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MorphParams {
    /// Label while morphed (defaults to the other choice's label)
    pub label: Option<String>,
    /// Skin while morphed (defaults to the other choice's skin)
    pub variant: Option<Variant>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Morph {
    control: ControlId,
    label: String,
    variant: Option<Variant>,
    /// The opposite choice's action, taken on click while morphed
    action: ControlAction,
    morphed: bool,
}

impl Morph {
    pub fn attach(control: ControlId, params: &MorphParams, controls: &ControlSet) -> Option<Self> {
        let partner = controls.get(partner_of(control, controls)?)?;
        Some(Self {
            control,
            label: params
                .label
                .clone()
                .unwrap_or_else(|| partner.base_label().to_string()),
            variant: params.variant.or(partner.base_variant()),
            action: partner.action,
            morphed: false,
        })
    }

    pub fn control(&self) -> ControlId {
        self.control
    }

    pub fn handle(&mut self, interaction: Interaction, ctx: &mut GimmickContext<'_>) -> Reaction {
        match interaction {
            Interaction::HoverEnter(id) if id == self.control => {
                let Some(control) = ctx.controls.get_mut(self.control) else {
                    return Reaction::Ignored;
                };
                control.label = self.label.clone();
                control.variant = self.variant;
                self.morphed = true;
                Reaction::Handled
            }
            Interaction::HoverLeave(id) if id == self.control => {
                let Some(control) = ctx.controls.get_mut(self.control) else {
                    return Reaction::Ignored;
                };
                control.label = control.base_label().to_string();
                control.variant = control.base_variant();
                self.morphed = false;
                Reaction::Handled
            }
            Interaction::Click(id) if id == self.control && self.morphed => {
                Reaction::Invoke(self.action)
            }
            _ => Reaction::Ignored,
        }
    }
}
