//! Shrink-to-vanish: every click makes the control smaller until it is gone

use serde::{Deserialize, Serialize};

use super::{GimmickContext, Interaction, Reaction};
use crate::controls::{ControlId, ControlSet};
use crate::messages::AsideAnchor;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShrinkParams {
    /// Scale multiplier per click
    pub factor: f32,
    /// The control vanishes once its scale drops below this
    pub threshold: f32,
    /// Aside shown when it vanishes
    pub epitaph: String,
}

impl Default for ShrinkParams {
    fn default() -> Self {
        Self {
            factor: 0.85,
            threshold: 0.1,
            epitaph: "RIP.".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Shrink {
    control: ControlId,
    params: ShrinkParams,
    scale: f32,
    vanished: bool,
}

impl Shrink {
    pub fn attach(control: ControlId, params: ShrinkParams, controls: &ControlSet) -> Option<Self> {
        controls.get(control)?;
        Some(Self {
            control,
            params,
            scale: 1.0,
            vanished: false,
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
        if self.vanished {
            return Reaction::Suppressed;
        }
        let Some(control) = ctx.controls.get_mut(self.control) else {
            return Reaction::Ignored;
        };

        self.scale *= self.params.factor;
        control.scale = self.scale;

        if self.scale < self.params.threshold {
            self.vanished = true;
            control.hidden = true;
            return Reaction::Aside {
                text: self.params.epitaph.clone(),
                anchor: AsideAnchor::Card,
            };
        }
        Reaction::Suppressed
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::gimmicks::test_support::two_choices;

    fn click(shrink: &mut Shrink, controls: &mut ControlSet) -> Reaction {
        let id = shrink.control();
        shrink.handle(
            Interaction::Click(id),
            &mut GimmickContext {
                controls,
                now: Duration::ZERO,
                area: None,
            },
        )
    }

    #[test]
    fn test_vanishes_on_fifteenth_click() {
        let mut controls = two_choices();
        let no = controls.choice_control(1).unwrap();
        let mut shrink = Shrink::attach(no, ShrinkParams::default(), &controls).unwrap();

        for n in 1..=14 {
            assert_eq!(click(&mut shrink, &mut controls), Reaction::Suppressed, "click {n}");
            assert!(!controls.get(no).unwrap().hidden, "hidden too early at click {n}");
        }

        let reaction = click(&mut shrink, &mut controls);
        assert_eq!(
            reaction,
            Reaction::Aside {
                text: "RIP.".into(),
                anchor: AsideAnchor::Card
            }
        );
        assert!(controls.get(no).unwrap().hidden);
    }

    #[test]
    fn test_never_reappears() {
        let mut controls = two_choices();
        let no = controls.choice_control(1).unwrap();
        let mut shrink = Shrink::attach(no, ShrinkParams::default(), &controls).unwrap();
        for _ in 0..15 {
            click(&mut shrink, &mut controls);
        }
        for _ in 0..5 {
            assert_eq!(click(&mut shrink, &mut controls), Reaction::Suppressed);
            assert!(controls.get(no).unwrap().hidden);
        }
    }

    #[test]
    fn test_scale_tracks_clicks() {
        let mut controls = two_choices();
        let no = controls.choice_control(1).unwrap();
        let mut shrink = Shrink::attach(no, ShrinkParams::default(), &controls).unwrap();
        click(&mut shrink, &mut controls);
        click(&mut shrink, &mut controls);
        let scale = controls.get(no).unwrap().scale;
        assert!((scale - 0.7225).abs() < 1e-5);
    }
}
