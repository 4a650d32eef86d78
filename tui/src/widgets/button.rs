//! Button Widget
//!
//! A rounded pill with the label in the middle and an optional subtext
//! tucked into the bottom border. Squashed buttons (a shrinking "No")
//! drop the border and render as a single highlighted row.

use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, BorderType, Paragraph, Widget};

use crate::theme;

pub struct Button<'a> {
    label: &'a str,
    subtext: Option<&'a str>,
    accent: Color,
    actionable: bool,
    highlighted: bool,
    pulse_on: bool,
}

impl<'a> Button<'a> {
    pub fn new(label: &'a str) -> Self {
        Self {
            label,
            subtext: None,
            accent: theme::GLASS,
            actionable: true,
            highlighted: false,
            pulse_on: false,
        }
    }

    pub fn subtext(mut self, subtext: Option<&'a str>) -> Self {
        self.subtext = subtext;
        self
    }

    pub fn accent(mut self, accent: Color) -> Self {
        self.accent = accent;
        self
    }

    /// Enabled, not gated and not hidden
    pub fn actionable(mut self, actionable: bool) -> Self {
        self.actionable = actionable;
        self
    }

    /// Hovered or keyboard-focused
    pub fn highlighted(mut self, highlighted: bool) -> Self {
        self.highlighted = highlighted;
        self
    }

    /// Current beat of a pulsing button
    pub fn pulse_on(mut self, pulse_on: bool) -> Self {
        self.pulse_on = pulse_on;
        self
    }

    fn accent_color(&self) -> Color {
        if !self.actionable {
            theme::DIM_TEXT
        } else if self.pulse_on {
            theme::GLOW
        } else {
            self.accent
        }
    }

    fn label_style(&self) -> Style {
        let accent = self.accent_color();
        if self.highlighted && self.actionable {
            Style::default()
                .fg(theme::CARD_BG)
                .bg(accent)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(accent).add_modifier(Modifier::BOLD)
        }
    }
}

impl Widget for Button<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.is_empty() {
            return;
        }

        let label_style = self.label_style();
        if area.height < 3 || area.width < 4 {
            buf.set_style(area, label_style);
            Paragraph::new(self.label)
                .alignment(Alignment::Center)
                .style(label_style)
                .render(area, buf);
            return;
        }

        let mut border_style = Style::default().fg(self.accent_color());
        if self.highlighted || self.pulse_on {
            border_style = border_style.add_modifier(Modifier::BOLD);
        }
        let mut block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(border_style);
        if let Some(subtext) = self.subtext {
            block = block.title_bottom(
                Line::from(subtext)
                    .centered()
                    .style(Style::default().fg(theme::DIM_TEXT)),
            );
        }

        let inner = block.inner(area);
        block.render(area, buf);
        if self.highlighted && self.actionable {
            buf.set_style(inner, label_style);
        }
        Paragraph::new(self.label)
            .alignment(Alignment::Center)
            .style(label_style)
            .render(inner, buf);
    }
}
