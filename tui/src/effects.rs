//! Cosmetic Effects
//!
//! Confetti, the warm glow, the closing blackout and the card pulse. All of
//! it is timeline state advanced by `update(delta)`; nothing here can change
//! which scene is showing.
//!
//! Timings:
//! - confetti falls for up to 7s, then fades over 1s
//! - glow holds 1.5s, then fades over 3s
//! - blackout holds 3s, then fades over 0.8s
//! - a full confetti burst pulses the card for 1.5s

use std::f32::consts::TAU;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use unicode_width::UnicodeWidthStr;

use gremlin_core::EffectKind;

use crate::theme;
use crate::widgets::prompt::wrap_lines;

const CONFETTI_COUNT: usize = 150;
const SOFT_CONFETTI_COUNT: usize = 60;
const CONFETTI_GLYPHS: [&str; 3] = ["•", "◆", "■"];

// ============================================================================
// Timeline
// ============================================================================

/// A hold-then-fade envelope
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Timeline {
    elapsed: Duration,
    hold: Duration,
    fade: Duration,
}

impl Timeline {
    pub fn new(hold: Duration, fade: Duration) -> Self {
        Self {
            elapsed: Duration::ZERO,
            hold,
            fade,
        }
    }

    pub fn advance(&mut self, delta: Duration) {
        self.elapsed = self.elapsed.saturating_add(delta);
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// 1.0 while holding, falling to 0.0 across the fade
    pub fn strength(&self) -> f32 {
        if self.elapsed <= self.hold {
            return 1.0;
        }
        if self.fade.is_zero() {
            return 0.0;
        }
        let into_fade = (self.elapsed - self.hold).as_secs_f32();
        (1.0 - into_fade / self.fade.as_secs_f32()).max(0.0)
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.hold + self.fade
    }
}

// ============================================================================
// Confetti
// ============================================================================

/// One falling piece, in screen fractions and seconds
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    pub x: f32,
    pub delay: f32,
    pub fall: f32,
    pub sway: f32,
    pub color: Color,
    pub glyph: &'static str,
}

impl Particle {
    fn random(rng: &mut StdRng) -> Self {
        Self {
            x: rng.gen_range(0.0..1.0),
            delay: rng.gen_range(0.0..2.0),
            fall: rng.gen_range(2.0..5.0),
            sway: rng.gen_range(0.0..TAU),
            color: theme::CONFETTI[rng.gen_range(0..theme::CONFETTI.len())],
            glyph: CONFETTI_GLYPHS[rng.gen_range(0..CONFETTI_GLYPHS.len())],
        }
    }

    /// Screen-fraction position at `t` seconds, `None` before it drops or
    /// after it has left the bottom
    pub fn position(&self, t: f32) -> Option<(f32, f32)> {
        let progress = (t - self.delay) / self.fall;
        if !(0.0..1.0).contains(&progress) {
            return None;
        }
        let x = self.x + (progress * TAU * 1.5 + self.sway).sin() * 0.02;
        Some((x.clamp(0.0, 0.999), progress))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Confetti {
    pub particles: Vec<Particle>,
    pub timeline: Timeline,
    pub intense: bool,
}

// ============================================================================
// Blackout
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct Blackout {
    pub message: Option<String>,
    pub timeline: Timeline,
}

// ============================================================================
// Effects deck
// ============================================================================

/// Everything cosmetic currently playing
pub struct Effects {
    rng: StdRng,
    confetti: Option<Confetti>,
    glow: Option<Timeline>,
    blackout: Option<Blackout>,
    pulse: Option<Timeline>,
}

impl Effects {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            confetti: None,
            glow: None,
            blackout: None,
            pulse: None,
        }
    }

    /// Start an effect; a new burst replaces one already playing
    ///
    /// `LockUi` is not cosmetic and is handled by the display state.
    pub fn trigger(&mut self, kind: EffectKind, message: Option<String>) {
        match kind {
            EffectKind::Confetti => {
                self.burst(CONFETTI_COUNT, true);
                self.pulse = Some(Timeline::new(Duration::from_millis(1500), Duration::ZERO));
            }
            EffectKind::SoftConfetti => self.burst(SOFT_CONFETTI_COUNT, false),
            EffectKind::SoftGlow => {
                self.glow = Some(Timeline::new(
                    Duration::from_millis(1500),
                    Duration::from_millis(3000),
                ));
            }
            EffectKind::Blackout => {
                self.blackout = Some(Blackout {
                    message,
                    timeline: Timeline::new(Duration::from_secs(3), Duration::from_millis(800)),
                });
            }
            EffectKind::LockUi => {}
        }
        tracing::debug!(?kind, "Effect triggered");
    }

    fn burst(&mut self, count: usize, intense: bool) {
        let particles = (0..count)
            .map(|_| Particle::random(&mut self.rng))
            .collect();
        self.confetti = Some(Confetti {
            particles,
            timeline: Timeline::new(Duration::from_secs(7), Duration::from_secs(1)),
            intense,
        });
    }

    pub fn update(&mut self, delta: Duration) {
        fn step(timeline: &mut Option<Timeline>, delta: Duration) {
            if let Some(t) = timeline {
                t.advance(delta);
                if t.is_finished() {
                    *timeline = None;
                }
            }
        }

        step(&mut self.glow, delta);
        step(&mut self.pulse, delta);
        if let Some(confetti) = &mut self.confetti {
            confetti.timeline.advance(delta);
            if confetti.timeline.is_finished() {
                self.confetti = None;
            }
        }
        if let Some(blackout) = &mut self.blackout {
            blackout.timeline.advance(delta);
            if blackout.timeline.is_finished() {
                self.blackout = None;
            }
        }
    }

    pub fn confetti(&self) -> Option<&Confetti> {
        self.confetti.as_ref()
    }

    pub fn blackout(&self) -> Option<&Blackout> {
        self.blackout.as_ref()
    }

    /// Glow strength, 0.0 when not glowing
    pub fn glow(&self) -> f32 {
        self.glow.map_or(0.0, |t| t.strength())
    }

    pub fn is_pulsing(&self) -> bool {
        self.pulse.is_some()
    }

    pub fn is_idle(&self) -> bool {
        self.confetti.is_none() && self.glow.is_none() && self.blackout.is_none() && self.pulse.is_none()
    }

    /// Draw falling confetti over the whole screen
    pub fn render_confetti(&self, area: Rect, buf: &mut Buffer) {
        let Some(confetti) = &self.confetti else {
            return;
        };
        if area.is_empty() {
            return;
        }

        let t = confetti.timeline.elapsed().as_secs_f32();
        let fading = confetti.timeline.strength() < 1.0;
        let mut style = Style::default();
        if !confetti.intense || fading {
            style = style.add_modifier(Modifier::DIM);
        }

        for particle in &confetti.particles {
            let Some((fx, fy)) = particle.position(t) else {
                continue;
            };
            let x = area.x + (fx * f32::from(area.width)) as u16;
            let y = area.y + (fy * f32::from(area.height)) as u16;
            if x < area.right() && y < area.bottom() {
                buf.set_string(x, y, particle.glyph, style.fg(particle.color));
            }
        }
    }

    /// Cover the screen and show the closing message
    ///
    /// Fades from near-black back to the card background.
    pub fn render_blackout(&self, area: Rect, buf: &mut Buffer) {
        let Some(blackout) = &self.blackout else {
            return;
        };
        let strength = blackout.timeline.strength();
        let bg = theme::blend(theme::BACKGROUND, Color::Rgb(0, 0, 0), strength);
        let fg = theme::blend(theme::BACKGROUND, theme::PROMPT_FG, strength);
        buf.set_style(area, Style::default().bg(bg));

        if let Some(message) = &blackout.message {
            let lines = wrap_lines(message, area.width.saturating_sub(8) as usize);
            let top = area.y + area.height.saturating_sub(lines.len() as u16) / 2;
            for (i, line) in lines.iter().enumerate() {
                let width = line.width() as u16;
                let x = area.x + area.width.saturating_sub(width) / 2;
                let y = top + i as u16;
                if y < area.bottom() {
                    buf.set_string(x, y, line, Style::default().fg(fg).bg(bg));
                }
            }
        }
    }
}
