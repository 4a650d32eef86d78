//! Evade: the control runs away from the pointer

use serde::{Deserialize, Serialize};

use super::{GimmickContext, Interaction, Reaction};
use crate::controls::{ControlId, ControlSet};
use crate::geometry::Point;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvadeParams {
    /// Pointer distance that triggers a dodge
    pub radius: f32,
    /// Push multiplier applied to how far inside the radius the pointer is
    pub push: f32,
    /// Distance the control centre keeps from the card edges
    pub margin: Point,
}

impl Default for EvadeParams {
    fn default() -> Self {
        Self {
            radius: 8.0,
            push: 1.2,
            margin: Point::new(7.0, 2.0),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Evade {
    control: ControlId,
    params: EvadeParams,
}

impl Evade {
    pub fn attach(control: ControlId, params: EvadeParams, controls: &ControlSet) -> Option<Self> {
        controls.get(control)?;
        Some(Self { control, params })
    }

    pub fn control(&self) -> ControlId {
        self.control
    }

    pub fn handle(&mut self, interaction: Interaction, ctx: &mut GimmickContext<'_>) -> Reaction {
        let Interaction::PointerMoved(pointer) = interaction else {
            return Reaction::Ignored;
        };
        let Some(area) = ctx.area else {
            return Reaction::Ignored;
        };
        if !area.contains(pointer) {
            return Reaction::Ignored;
        }
        let Some(control) = ctx.controls.get_mut(self.control) else {
            return Reaction::Ignored;
        };
        let (Some(home), Some(center)) = (control.home, control.center()) else {
            return Reaction::Ignored;
        };

        let away = center.minus(pointer);
        let dist = away.length();
        if dist >= self.params.radius {
            return Reaction::Ignored;
        }

        let dir = if dist <= f32::EPSILON {
            Point::new(1.0, 0.0)
        } else {
            Point::new(away.x / dist, away.y / dist)
        };
        let push = (self.params.radius - dist) * self.params.push;
        let target = center.offset(Point::new(dir.x * push, dir.y * push));
        let clamped = area.clamp_inset(target, self.params.margin);

        control.offset = clamped.minus(home);
        Reaction::Handled
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::geometry::Area;
    use crate::gimmicks::test_support::two_choices;

    fn ctx(controls: &mut ControlSet) -> GimmickContext<'_> {
        GimmickContext {
            controls,
            now: Duration::ZERO,
            area: Some(Area::new(0.0, 0.0, 60.0, 20.0)),
        }
    }

    #[test]
    fn test_far_pointer_is_ignored() {
        let mut controls = two_choices();
        let yes = controls.choice_control(1).unwrap();
        let mut evade = Evade::attach(yes, EvadeParams::default(), &controls).unwrap();

        let reaction = evade.handle(Interaction::PointerMoved(Point::new(5.0, 5.0)), &mut ctx(&mut controls));
        assert_eq!(reaction, Reaction::Ignored);
        assert_eq!(controls.get(yes).unwrap().offset, Point::ORIGIN);
    }

    #[test]
    fn test_near_pointer_pushes_away() {
        let mut controls = two_choices();
        let yes = controls.choice_control(1).unwrap();
        let mut evade = Evade::attach(yes, EvadeParams::default(), &controls).unwrap();

        // Pointer just left of the control centre (40, 10)
        let reaction = evade.handle(Interaction::PointerMoved(Point::new(37.0, 10.0)), &mut ctx(&mut controls));
        assert_eq!(reaction, Reaction::Handled);
        let offset = controls.get(yes).unwrap().offset;
        assert!(offset.x > 0.0);
        assert_eq!(offset.y, 0.0);
    }

    #[test]
    fn test_stays_inside_card() {
        let mut controls = two_choices();
        let yes = controls.choice_control(1).unwrap();
        let mut evade = Evade::attach(yes, EvadeParams::default(), &controls).unwrap();
        let area = Area::new(0.0, 0.0, 60.0, 20.0);

        for _ in 0..200 {
            let center = controls.get(yes).unwrap().center().unwrap();
            let pointer = Point::new(center.x - 1.0, center.y - 0.5);
            if area.contains(pointer) {
                evade.handle(Interaction::PointerMoved(pointer), &mut ctx(&mut controls));
            }
            let center = controls.get(yes).unwrap().center().unwrap();
            assert!(center.x >= 7.0 && center.x <= 53.0);
            assert!(center.y >= 2.0 && center.y <= 18.0);
        }
    }

    #[test]
    fn test_clicks_are_not_intercepted() {
        let mut controls = two_choices();
        let yes = controls.choice_control(1).unwrap();
        let mut evade = Evade::attach(yes, EvadeParams::default(), &controls).unwrap();
        assert_eq!(
            evade.handle(Interaction::Click(yes), &mut ctx(&mut controls)),
            Reaction::Ignored
        );
    }
}
