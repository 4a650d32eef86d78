//! Swap-on-hover: hovering the control trades places with its partner

use super::{partner_of, GimmickContext, Interaction, Reaction};
use crate::controls::{ControlId, ControlSet};

/// Actions stay with their controls; only the visual slots move
#[derive(Clone, Debug, PartialEq)]
pub struct Swap {
    controls: [ControlId; 2],
}

impl Swap {
    pub fn attach(control: ControlId, controls: &ControlSet) -> Option<Self> {
        let partner = partner_of(control, controls)?;
        Some(Self {
            controls: [control, partner],
        })
    }

    pub fn controls(&self) -> &[ControlId; 2] {
        &self.controls
    }

    pub fn handle(&mut self, interaction: Interaction, ctx: &mut GimmickContext<'_>) -> Reaction {
        match interaction {
            Interaction::HoverEnter(id) if id == self.controls[0] => {
                ctx.controls.swap_order(self.controls[0], self.controls[1]);
                Reaction::Handled
            }
            _ => Reaction::Ignored,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::controls::ControlAction;
    use crate::gimmicks::test_support::two_choices;

    #[test]
    fn test_every_hover_swaps() {
        let mut controls = two_choices();
        let no = controls.choice_control(0).unwrap();
        let yes = controls.choice_control(1).unwrap();
        let mut swap = Swap::attach(yes, &controls).unwrap();

        for round in 0..6 {
            swap.handle(
                Interaction::HoverEnter(yes),
                &mut GimmickContext {
                    controls: &mut controls,
                    now: Duration::ZERO,
                    area: None,
                },
            );
            let first = controls.ordered()[0].id;
            let expected = if round % 2 == 0 { yes } else { no };
            assert_eq!(first, expected);
        }
        // actions never move
        assert_eq!(controls.get(yes).unwrap().action, ControlAction::Choose(1));
    }

    #[test]
    fn test_partner_hover_ignored() {
        let mut controls = two_choices();
        let no = controls.choice_control(0).unwrap();
        let yes = controls.choice_control(1).unwrap();
        let mut swap = Swap::attach(yes, &controls).unwrap();
        let reaction = swap.handle(
            Interaction::HoverEnter(no),
            &mut GimmickContext {
                controls: &mut controls,
                now: Duration::ZERO,
                area: None,
            },
        );
        assert_eq!(reaction, Reaction::Ignored);
        assert_eq!(controls.ordered()[0].id, no);
    }
}
