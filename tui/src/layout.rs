//! Card Layout
//!
//! Pure geometry for the card: where the header, prompt, entry and buttons
//! go for a given terminal size, where each button currently sits once its
//! gimmick has pushed it around, and which control is under a mouse cell.
//!
//! Button homes are reported to the stage in the same cell coordinates the
//! mouse uses, so a gimmick's offsets line up with what is drawn.

use ratatui::layout::{Constraint, Layout, Position, Rect};
use unicode_width::UnicodeWidthStr;

use gremlin_core::{Area, Control, ControlId, ControlSet, Point};

pub const CARD_MAX_WIDTH: u16 = 64;
pub const CARD_MAX_HEIGHT: u16 = 20;

const BUTTON_HEIGHT: u16 = 3;
const BUTTON_GAP: u16 = 3;
const BUTTON_MIN_WIDTH: u16 = 10;
const ENTRY_HEIGHT: u16 = 3;
const BACK_LABEL_WIDTH: u16 = 8;

/// Below this scale a button collapses to a single row
const FLAT_SCALE: f32 = 0.6;

/// Rows and columns of the card for one terminal size
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CardLayout {
    pub screen: Rect,
    pub card: Rect,
    /// Progress on the left, mood meter on the right
    pub header: Rect,
    pub expression: Rect,
    pub prompt: Rect,
    pub aside: Rect,
    /// Zero height unless the scene collects entries
    pub entry: Rect,
    pub actions: Rect,
    pub back: Rect,
    /// Hint line under the card, zero height when there is no room
    pub footer: Rect,
}

impl CardLayout {
    pub fn compute(screen: Rect, has_entry: bool) -> Self {
        let width = screen
            .width
            .saturating_sub(4)
            .min(CARD_MAX_WIDTH)
            .max(screen.width.min(24));
        let height = screen
            .height
            .saturating_sub(2)
            .min(CARD_MAX_HEIGHT)
            .max(screen.height.min(12));
        let card = Rect::new(
            screen.x + (screen.width - width) / 2,
            screen.y + (screen.height - height) / 2,
            width,
            height,
        );

        let inner = Rect::new(
            card.x + 2,
            card.y + 1,
            card.width.saturating_sub(4),
            card.height.saturating_sub(2),
        );
        let entry_height = if has_entry { ENTRY_HEIGHT } else { 0 };
        let [header, expression, _, prompt, aside, entry, actions, back] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(1),
            Constraint::Length(entry_height),
            Constraint::Length(BUTTON_HEIGHT),
            Constraint::Length(1),
        ])
        .areas(inner);

        let footer = if card.bottom() < screen.bottom() {
            Rect::new(card.x, card.bottom(), card.width, 1)
        } else {
            Rect::new(card.x, card.bottom(), card.width, 0)
        };

        Self {
            screen,
            card,
            header,
            expression,
            prompt,
            aside,
            entry,
            actions,
            back,
            footer,
        }
    }

    /// The card in the stage's coordinate space
    pub fn card_area(&self) -> Area {
        rect_area(self.card)
    }

    /// Where the back link is drawn
    pub fn back_rect(&self) -> Rect {
        Rect::new(
            self.back.x,
            self.back.y,
            BACK_LABEL_WIDTH.min(self.back.width),
            self.back.height,
        )
    }

    /// Resting slots for the controls, in display order
    pub fn slots(&self, controls: &ControlSet) -> Vec<ButtonSlot> {
        let ordered = controls.ordered();
        if ordered.is_empty() || self.actions.height == 0 {
            return Vec::new();
        }

        let count = ordered.len() as u16;
        let gaps = BUTTON_GAP * count.saturating_sub(1);
        let mut widths: Vec<u16> = ordered.iter().map(|c| natural_width(c)).collect();
        let total: u16 = widths.iter().sum::<u16>() + gaps;
        if total > self.actions.width {
            let each = (self.actions.width.saturating_sub(gaps) / count).max(3);
            widths.iter_mut().for_each(|w| *w = each);
        }
        let total: u16 = widths.iter().sum::<u16>() + gaps;

        let mut x = self.actions.x + self.actions.width.saturating_sub(total) / 2;
        ordered
            .iter()
            .zip(widths)
            .map(|(control, width)| {
                let slot = ButtonSlot {
                    id: control.id,
                    rect: Rect::new(x, self.actions.y, width, self.actions.height),
                };
                x = x.saturating_add(width + BUTTON_GAP);
                slot
            })
            .collect()
    }

    /// Slot centres, as sent to the stage
    pub fn homes(&self, controls: &ControlSet) -> Vec<(ControlId, Point)> {
        self.slots(controls)
            .iter()
            .map(|slot| (slot.id, slot.home()))
            .collect()
    }

    /// Where a control is drawn after its offset and scale
    ///
    /// Hidden controls have no rect. The result always stays on screen.
    pub fn place(&self, control: &Control, slot: &ButtonSlot) -> Option<Rect> {
        if control.hidden {
            return None;
        }

        let scale = control.scale.clamp(0.0, 2.0);
        let width = ((f32::from(slot.rect.width) * scale).round() as u16)
            .clamp(1, self.screen.width.max(1));
        let height = if scale >= FLAT_SCALE {
            slot.rect.height
        } else {
            1
        };

        let center = slot.home().offset(control.offset);
        let x = clamp_axis(
            center.x - f32::from(width) / 2.0,
            self.screen.x,
            self.screen.right().saturating_sub(width),
        );
        let y = clamp_axis(
            center.y - f32::from(height) / 2.0,
            self.screen.y,
            self.screen.bottom().saturating_sub(height),
        );
        Some(Rect::new(x, y, width, height))
    }
}

/// A control's resting place in the action row
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ButtonSlot {
    pub id: ControlId,
    pub rect: Rect,
}

impl ButtonSlot {
    pub fn home(&self) -> Point {
        rect_area(self.rect).center()
    }
}

/// Mouse cell to stage coordinates (the middle of the cell)
pub fn cell_center(column: u16, row: u16) -> Point {
    Point::new(f32::from(column) + 0.5, f32::from(row) + 0.5)
}

fn rect_area(rect: Rect) -> Area {
    Area::new(
        f32::from(rect.x),
        f32::from(rect.y),
        f32::from(rect.width),
        f32::from(rect.height),
    )
}

fn natural_width(control: &Control) -> u16 {
    let label = control.label.width();
    let subtext = control.subtext.as_deref().map_or(0, UnicodeWidthStr::width);
    (label.max(subtext) as u16 + 4).max(BUTTON_MIN_WIDTH)
}

fn clamp_axis(start: f32, lo: u16, hi: u16) -> u16 {
    let start = start.round().max(0.0) as u16;
    start.clamp(lo, hi.max(lo))
}

// ============================================================================
// Hit Testing
// ============================================================================

/// What is clickable this frame and where
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HitMap {
    /// Drawn back to front
    buttons: Vec<(ControlId, Rect)>,
    prompt: Rect,
    back: Option<Rect>,
}

impl HitMap {
    pub fn build(layout: &CardLayout, controls: &ControlSet, show_back: bool) -> Self {
        let buttons = layout
            .slots(controls)
            .iter()
            .filter_map(|slot| {
                let control = controls.get(slot.id)?;
                layout.place(control, slot).map(|rect| (slot.id, rect))
            })
            .collect();

        Self {
            buttons,
            prompt: layout.prompt,
            back: show_back.then(|| layout.back_rect()),
        }
    }

    pub fn buttons(&self) -> &[(ControlId, Rect)] {
        &self.buttons
    }

    pub fn rect_of(&self, id: ControlId) -> Option<Rect> {
        self.buttons.iter().find(|(c, _)| *c == id).map(|(_, r)| *r)
    }

    /// Topmost control under a cell
    pub fn control_at(&self, column: u16, row: u16) -> Option<ControlId> {
        let pos = Position::new(column, row);
        self.buttons
            .iter()
            .rev()
            .find(|(_, rect)| rect.contains(pos))
            .map(|(id, _)| *id)
    }

    pub fn on_prompt(&self, column: u16, row: u16) -> bool {
        self.prompt.contains(Position::new(column, row))
    }

    pub fn on_back(&self, column: u16, row: u16) -> bool {
        self.back
            .is_some_and(|rect| rect.contains(Position::new(column, row)))
    }
}
