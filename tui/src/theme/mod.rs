//! Theme and Colors
//!
//! The gremlin palette: a dusky card, candy-coloured buttons and confetti.

use ratatui::style::Color;

use gremlin_core::{MoodBand, Variant};

// ============================================================================
// Card Palette
// ============================================================================

/// Terminal background behind the card
pub const BACKGROUND: Color = Color::Rgb(18, 16, 24);

/// Card fill
pub const CARD_BG: Color = Color::Rgb(34, 28, 44);

/// Card outline
pub const CARD_BORDER: Color = Color::Rgb(120, 100, 150);

/// Prompt text
pub const PROMPT_FG: Color = Color::Rgb(245, 240, 250);

/// Hints, progress, placeholders
pub const DIM_TEXT: Color = Color::Rgb(130, 120, 145);

/// Aside text
pub const ASIDE_FG: Color = Color::Rgb(255, 214, 170);

/// Error card accent
pub const ERROR_RED: Color = Color::Rgb(255, 80, 80);

/// Warm glow around the card
pub const GLOW: Color = Color::Rgb(255, 223, 128);

// ============================================================================
// Button Variants
// ============================================================================

pub const CHERRY: Color = Color::Rgb(255, 113, 141);
pub const BLUE: Color = Color::Rgb(124, 178, 255);
pub const PURPLE: Color = Color::Rgb(203, 110, 255);
pub const GLASS: Color = Color::Rgb(185, 185, 205);

/// Accent for a button skin (unskinned buttons look like glass)
pub fn variant_color(variant: Option<Variant>) -> Color {
    match variant {
        Some(Variant::Cherry) => CHERRY,
        Some(Variant::Blue) => BLUE,
        Some(Variant::Purple) => PURPLE,
        Some(Variant::Glass) | None => GLASS,
    }
}

// ============================================================================
// Mood
// ============================================================================

pub fn mood_color(band: MoodBand) -> Color {
    match band {
        MoodBand::Gloomy => Color::Rgb(110, 130, 200),
        MoodBand::Uneasy => Color::Rgb(170, 150, 220),
        MoodBand::Neutral => Color::Rgb(205, 200, 210),
        MoodBand::Warm => Color::Rgb(255, 190, 120),
        MoodBand::Glowing => CHERRY,
    }
}

// ============================================================================
// Confetti
// ============================================================================

/// #ff718d #fdff6a #5dfdcb #7cb2ff #cb6eff
pub const CONFETTI: [Color; 5] = [
    Color::Rgb(0xff, 0x71, 0x8d),
    Color::Rgb(0xfd, 0xff, 0x6a),
    Color::Rgb(0x5d, 0xfd, 0xcb),
    Color::Rgb(0x7c, 0xb2, 0xff),
    Color::Rgb(0xcb, 0x6e, 0xff),
];

/// Linear blend between two RGB colours; non-RGB colours snap at the midpoint
pub fn blend(from: Color, to: Color, t: f32) -> Color {
    let t = t.clamp(0.0, 1.0);
    match (from, to) {
        (Color::Rgb(r1, g1, b1), Color::Rgb(r2, g2, b2)) => {
            let mix = |a: u8, b: u8| (f32::from(a) + (f32::from(b) - f32::from(a)) * t).round() as u8;
            Color::Rgb(mix(r1, r2), mix(g1, g2), mix(b1, b2))
        }
        _ if t < 0.5 => from,
        _ => to,
    }
}
