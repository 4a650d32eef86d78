//! Mood Meter
//!
//! One line: face, bar and band name, right-aligned in the card header.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Widget;

use gremlin_core::MoodReading;

use crate::theme;

const BAR_WIDTH: usize = 10;

pub struct MoodMeter {
    reading: MoodReading,
}

impl MoodMeter {
    pub fn new(reading: MoodReading) -> Self {
        Self { reading }
    }

    /// Filled cells for the smoothed value
    pub fn filled(&self) -> usize {
        (self.reading.fraction() * BAR_WIDTH as f32).round() as usize
    }
}

impl Widget for MoodMeter {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let band = self.reading.band();
        let color = theme::mood_color(band);
        let filled = self.filled().min(BAR_WIDTH);

        Line::from(vec![
            Span::raw(band.emoji()),
            Span::raw(" "),
            Span::styled("█".repeat(filled), Style::default().fg(color)),
            Span::styled(
                "░".repeat(BAR_WIDTH - filled),
                Style::default().fg(theme::DIM_TEXT),
            ),
            Span::raw(" "),
            Span::styled(band.label(), Style::default().fg(color)),
        ])
        .right_aligned()
        .render(area, buf);
    }
}
