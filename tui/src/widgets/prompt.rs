//! Prompt Widget
//!
//! The gremlin's line, wrapped and centred in the card. A block cursor
//! trails the text while it is being typed; pleading makes it bigger.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::widgets::Widget;
use textwrap::wrap;
use unicode_width::UnicodeWidthStr;

const CURSOR: char = '▌';

/// Emphasis at which the prompt turns bold
const BOLD_EMPHASIS: f32 = 1.2;
/// Emphasis at which letters start spreading apart
const SPREAD_EMPHASIS: f32 = 1.4;
/// Extra emphasis per additional space between letters
const SPREAD_STEP: f32 = 0.8;

pub struct PromptText<'a> {
    content: &'a str,
    style: Style,
    cursor: bool,
    emphasis: f32,
}

impl<'a> PromptText<'a> {
    pub fn new(content: &'a str) -> Self {
        Self {
            content,
            style: Style::default(),
            cursor: false,
            emphasis: 1.0,
        }
    }

    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn cursor(mut self, cursor: bool) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn emphasis(mut self, emphasis: f32) -> Self {
        self.emphasis = emphasis;
        self
    }

    fn text(&self) -> String {
        let mut text = spread(self.content, letter_gap(self.emphasis));
        if self.cursor {
            text.push(CURSOR);
        }
        text
    }
}

/// Spaces between letters for a prompt emphasis
pub fn letter_gap(emphasis: f32) -> usize {
    if emphasis < SPREAD_EMPHASIS {
        return 0;
    }
    1 + ((emphasis - SPREAD_EMPHASIS) / SPREAD_STEP).floor() as usize
}

fn spread(content: &str, gap: usize) -> String {
    if gap == 0 {
        return content.to_string();
    }
    let filler = " ".repeat(gap);
    content
        .lines()
        .map(|line| {
            let chars: Vec<String> = line.chars().map(String::from).collect();
            chars.join(&filler)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Wrap to a width, keeping blank lines
pub fn wrap_lines(content: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return Vec::new();
    }
    content
        .lines()
        .flat_map(|line| {
            if line.is_empty() {
                vec![String::new()]
            } else {
                wrap(line, width)
                    .into_iter()
                    .map(|cow| cow.to_string())
                    .collect()
            }
        })
        .collect()
}

impl Widget for PromptText<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.is_empty() {
            return;
        }

        let style = if self.emphasis >= BOLD_EMPHASIS {
            self.style.add_modifier(Modifier::BOLD)
        } else {
            self.style
        };
        let lines = wrap_lines(&self.text(), area.width as usize);

        // Keep the newest text visible if it overflows
        let visible = lines.len().min(area.height as usize);
        let skip = lines.len() - visible;
        let top = area.y + (area.height - visible as u16) / 2;

        for (i, line) in lines.iter().skip(skip).enumerate() {
            let width = (line.width() as u16).min(area.width);
            let x = area.x + (area.width - width) / 2;
            buf.set_stringn(x, top + i as u16, line, area.width as usize, style);
        }
    }
}
