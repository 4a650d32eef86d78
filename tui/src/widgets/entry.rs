//! Collect Entry
//!
//! Three rows under the prompt of a `collect` scene: the committed chips,
//! the draft line and a hint counting down to the minimum.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Widget;

use gremlin_core::CollectState;

use crate::theme;

pub struct EntryBox<'a> {
    collect: &'a CollectState,
    placeholder: &'a str,
    active: bool,
}

impl<'a> EntryBox<'a> {
    pub fn new(collect: &'a CollectState) -> Self {
        Self {
            collect,
            placeholder: "Type something, Enter to add",
            active: true,
        }
    }

    pub fn placeholder(mut self, placeholder: &'a str) -> Self {
        self.placeholder = placeholder;
        self
    }

    /// Accepting input (cursor shown)
    pub fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }
}

/// Countdown shown under the draft
pub fn hint(collect: &CollectState) -> String {
    match collect.remaining() {
        0 => "That's plenty. Continue when you're ready.".to_string(),
        1 => "1 more to go".to_string(),
        n => format!("{n} more to go"),
    }
}

impl Widget for EntryBox<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.is_empty() {
            return;
        }

        let chip = Style::default()
            .fg(theme::CARD_BG)
            .bg(theme::PURPLE)
            .add_modifier(Modifier::BOLD);
        let mut chips = Vec::new();
        for item in self.collect.items() {
            chips.push(Span::styled(format!(" {item} "), chip));
            chips.push(Span::raw(" "));
        }
        let rows = [
            Line::from(chips),
            draft_line(self.collect.draft(), self.placeholder, self.active),
            Line::from(Span::styled(
                hint(self.collect),
                Style::default().fg(theme::DIM_TEXT),
            )),
        ];

        for (i, line) in rows.into_iter().enumerate().take(area.height as usize) {
            let row = Rect::new(area.x, area.y + i as u16, area.width, 1);
            line.render(row, buf);
        }
    }
}

fn draft_line<'a>(draft: &'a str, placeholder: &'a str, active: bool) -> Line<'a> {
    let prefix = Span::styled("> ", Style::default().fg(theme::PURPLE));
    let cursor = if active { "▌" } else { "" };
    if draft.is_empty() {
        Line::from(vec![
            prefix,
            Span::styled(cursor, Style::default().fg(theme::PROMPT_FG)),
            Span::styled(
                placeholder,
                Style::default()
                    .fg(theme::DIM_TEXT)
                    .add_modifier(Modifier::ITALIC),
            ),
        ])
    } else {
        Line::from(vec![
            prefix,
            Span::styled(draft, Style::default().fg(theme::PROMPT_FG)),
            Span::styled(cursor, Style::default().fg(theme::PROMPT_FG)),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width)
            .map(|x| buf[(x, y)].symbol().to_string())
            .collect::<String>()
            .trim_end()
            .to_string()
    }

    fn collect_with(items: &[&str], draft: &str) -> CollectState {
        let mut collect = CollectState::new(2, 8, 48);
        for item in items {
            item.chars().for_each(|c| {
                collect.push_char(c);
            });
            collect.commit();
        }
        draft.chars().for_each(|c| {
            collect.push_char(c);
        });
        collect
    }

    #[test]
    fn test_hint_counts_down() {
        assert_eq!(hint(&collect_with(&[], "")), "2 more to go");
        assert_eq!(hint(&collect_with(&["tea"], "")), "1 more to go");
        assert!(hint(&collect_with(&["tea", "naps"], "")).starts_with("That's plenty"));
    }

    #[test]
    fn test_renders_chips_draft_and_hint() {
        let collect = collect_with(&["tea"], "na");
        let area = Rect::new(0, 0, 40, 3);
        let mut buf = Buffer::empty(area);
        EntryBox::new(&collect).render(area, &mut buf);

        assert_eq!(row(&buf, 0), " tea");
        assert_eq!(row(&buf, 1), "> na▌");
        assert_eq!(row(&buf, 2), "1 more to go");
    }

    #[test]
    fn test_placeholder_when_draft_empty() {
        let collect = collect_with(&[], "");
        let area = Rect::new(0, 0, 40, 3);
        let mut buf = Buffer::empty(area);
        EntryBox::new(&collect)
            .placeholder("cozy things")
            .active(false)
            .render(area, &mut buf);
        assert_eq!(row(&buf, 1), "> cozy things");
    }
}
