//! Main Application
//!
//! The App struct manages the TUI lifecycle as a thin display client:
//! - Event loop (keyboard, mouse, resize)
//! - StageClient driving the embedded stage
//! - DisplayState for asides, effects and the lock
//!
//! Each frame the App:
//! 1. Converts terminal events to SurfaceEvents and sends them to the stage
//! 2. Ticks the stage by the real frame delta
//! 3. Drains StageMessages into DisplayState
//! 4. Lays out the card, reports button homes, and renders the layers

use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, Event, EventStream, KeyCode, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind,
};
use futures::StreamExt;
use ratatui::backend::CrosstermBackend;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, BorderType, Widget};
use ratatui::Terminal;
use unicode_width::UnicodeWidthStr;

use gremlin_core::{
    Area, AsideAnchor, ControlId, GremlinConfig, Point, Stage, StageState, SurfaceEvent,
};

use crate::compositor::{Compositor, LayerId};
use crate::display::DisplayState;
use crate::layout::{cell_center, CardLayout, HitMap};
use crate::stage_client::StageClient;
use crate::theme;
use crate::widgets::{Button, EntryBox, MoodMeter, PromptText};

/// Quick goodbye lines, printed after the terminal is restored
const QUICK_GOODBYES: &[&str] = &[
    "Bye bye!",
    "See ya!",
    "Later, gator!",
    "Door's always open.",
    "Take care!",
    "Thanks for stopping by.",
    "Go drink some water!",
    "I'll be here. Gremlining.",
    "Peace out!",
];

/// How long a pulsing button spends on each beat
const PULSE_BEAT_MS: u128 = 400;

/// Main application state
pub struct App {
    // === Core State ===
    running: bool,
    /// Goodbye message to show on exit
    goodbye_message: Option<String>,

    // === Stage Integration ===
    client: StageClient,
    /// Display state derived from StageMessages
    display: DisplayState,

    // === UI Components ===
    compositor: Compositor,
    layers: AppLayers,
    layout: CardLayout,
    /// Clickable regions from the last layout pass
    hits: HitMap,
    /// Last layout reported to the stage
    reported: Option<(Area, Vec<(ControlId, Point)>)>,

    // === Input State ===
    hovered: Option<ControlId>,
    /// Keyboard focus, a virtual pointer over one button
    focused: Option<ControlId>,
    /// Control epoch the hover and focus belong to
    input_epoch: u32,

    // === Misc State ===
    last_frame: Instant,
    /// Time since launch, for pulses
    anim_clock: Duration,
    frame_duration: Duration,
    size: (u16, u16),
}

/// Layer IDs, back to front
struct AppLayers {
    card: LayerId,
    controls: LayerId,
    asides: LayerId,
    effects: LayerId,
    overlay: LayerId,
}

impl App {
    /// Create a new App instance
    pub fn new(config: &GremlinConfig) -> anyhow::Result<Self> {
        let size = crossterm::terminal::size()?;
        let area = Rect::new(0, 0, size.0, size.1);

        let mut compositor = Compositor::new(area);
        let layers = AppLayers {
            card: compositor.create_layer(area, 0),
            controls: compositor.create_layer(area, 10),
            asides: compositor.create_layer(area, 20),
            effects: compositor.create_layer(area, 30),
            overlay: compositor.create_layer(area, 40),
        };
        compositor.set_opaque(layers.card, true);
        compositor.set_opaque(layers.overlay, true);
        compositor.set_visible(layers.overlay, false);

        let client = StageClient::new(config);
        tracing::info!(
            title = client.stage().title(),
            state = ?client.state(),
            "Stage ready"
        );

        Ok(Self {
            running: true,
            goodbye_message: None,
            client,
            display: DisplayState::new(config.stage.seed),
            compositor,
            layers,
            layout: CardLayout::compute(area, false),
            hits: HitMap::default(),
            reported: None,
            hovered: None,
            focused: None,
            input_epoch: 0,
            last_frame: Instant::now(),
            anim_clock: Duration::ZERO,
            frame_duration: config.frame_duration(),
            size,
        })
    }

    /// Main event loop
    pub async fn run(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> anyhow::Result<()> {
        let frame_duration = self.frame_duration;

        // Create async event stream for non-blocking terminal events
        let mut event_stream = EventStream::new();

        // Buttons need homes before the first scene settles
        self.process_stage_messages();
        self.sync_layout();
        self.client.send(SurfaceEvent::Start);
        self.render(terminal)?;

        while self.running {
            let frame_start = Instant::now();

            tokio::select! {
                biased;

                // Terminal events first
                maybe_event = event_stream.next() => {
                    if let Some(Ok(event)) = maybe_event {
                        match event {
                            // Only handle Press events (not Release or Repeat)
                            Event::Key(key) if key.kind == KeyEventKind::Press => {
                                self.handle_key(key)
                            }
                            Event::Mouse(mouse) => self.handle_mouse(mouse),
                            Event::Resize(w, h) => self.handle_resize(w, h),
                            _ => {}
                        }
                    }
                }

                // Frame tick
                _ = tokio::time::sleep(Duration::from_millis(16)) => {}
            }

            self.update();
            self.render(terminal)?;

            // Frame rate limiting
            let elapsed = frame_start.elapsed();
            if elapsed < frame_duration {
                tokio::time::sleep(frame_duration - elapsed).await;
            }
        }

        Ok(())
    }

    /// Process all pending messages from the stage
    fn process_stage_messages(&mut self) {
        for msg in self.client.recv_all() {
            tracing::trace!(?msg, "Stage message");
            self.display.apply_message(&msg);
        }
    }

    /// Advance the stage and everything animated by the real frame delta
    fn update(&mut self) {
        let now = Instant::now();
        let delta = now.duration_since(self.last_frame);
        self.last_frame = now;
        self.anim_clock += delta;

        self.client.tick(delta);
        self.process_stage_messages();
        self.display.update(delta);
        self.sync_layout();
    }

    /// Recompute the card for the current scene and report button homes
    /// whenever they move
    fn sync_layout(&mut self) {
        let screen = Rect::new(0, 0, self.size.0, self.size.1);
        let stage = self.client.stage();
        let controls = stage.controls();

        if controls.epoch() != self.input_epoch {
            self.input_epoch = controls.epoch();
            self.hovered = None;
            self.focused = None;
        }

        self.layout = CardLayout::compute(screen, stage.collect().is_some());
        let report = (self.layout.card_area(), self.layout.homes(controls));
        self.hits = HitMap::build(&self.layout, controls, self.display.shows_back());

        if self.reported.as_ref() != Some(&report) {
            self.client.send(SurfaceEvent::Layout {
                card: report.0,
                homes: report.1.clone(),
            });
            self.reported = Some(report);
        }
    }

    // ------------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------------

    /// Handle keyboard input
    fn handle_key(&mut self, key: event::KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let stage = self.client.stage();
        let collecting = self.display.is_collecting() && stage.state() == StageState::Ready;
        let typing = stage.is_typing();

        match key.code {
            KeyCode::Esc => self.quit(),
            KeyCode::Char('c') if ctrl => self.quit(),
            KeyCode::Char('b') if ctrl => {
                self.client.send(SurfaceEvent::BackRequested);
            }
            KeyCode::Enter | KeyCode::Char(' ') if typing => {
                self.client.send(SurfaceEvent::PromptClicked);
            }
            KeyCode::Enter => self.activate(),
            KeyCode::Tab | KeyCode::Right => self.move_focus(1),
            KeyCode::BackTab | KeyCode::Left => self.move_focus(-1),
            KeyCode::Backspace if collecting => {
                self.client.send(SurfaceEvent::EntryBackspace);
            }
            KeyCode::Backspace => {
                self.client.send(SurfaceEvent::BackRequested);
            }
            KeyCode::Char(c) if collecting && !ctrl => {
                self.client.send(SurfaceEvent::TextInput(c));
            }
            KeyCode::Char(' ') => {
                self.client.send(SurfaceEvent::PromptClicked);
            }
            KeyCode::Char(d @ '1'..='9') => {
                let index = d as usize - '1' as usize;
                if let Some((id, rect)) = self.hits.buttons().get(index).copied() {
                    self.point_at(rect);
                    self.client.send(SurfaceEvent::Click(id));
                }
            }
            _ => {}
        }
    }

    /// Enter: commit a draft, or press the focused button
    fn activate(&mut self) {
        let stage = self.client.stage();
        if stage.collect().is_some_and(|c| !c.draft().trim().is_empty()) {
            self.client.send(SurfaceEvent::EntrySubmit);
            return;
        }

        match self.focused {
            Some(id) => {
                self.client.send(SurfaceEvent::Click(id));
            }
            None if self.hits.buttons().len() == 1 => {
                let id = self.hits.buttons()[0].0;
                self.client.send(SurfaceEvent::Click(id));
            }
            None => self.move_focus(1),
        }
    }

    /// Cycle focus through visible buttons, dragging the pointer along
    fn move_focus(&mut self, step: isize) {
        let buttons = self.hits.buttons();
        if buttons.is_empty() {
            return;
        }
        let count = buttons.len() as isize;
        let next = match self.focused.and_then(|id| buttons.iter().position(|(b, _)| *b == id)) {
            Some(i) => (i as isize + step).rem_euclid(count) as usize,
            None if step < 0 => buttons.len() - 1,
            None => 0,
        };
        let (id, rect) = buttons[next];
        self.focused = Some(id);
        self.point_at(rect);
    }

    /// Move the virtual pointer to the middle of a button
    fn point_at(&mut self, rect: Rect) {
        self.pointer_to(rect.x + rect.width / 2, rect.y + rect.height / 2);
    }

    /// Handle mouse input
    fn handle_mouse(&mut self, mouse: event::MouseEvent) {
        let (column, row) = (mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Moved | MouseEventKind::Drag(_) => self.pointer_to(column, row),
            MouseEventKind::Down(MouseButton::Left) => {
                self.pointer_to(column, row);
                if let Some(id) = self.hits.control_at(column, row) {
                    self.focused = Some(id);
                    self.client.send(SurfaceEvent::Click(id));
                } else if self.hits.on_back(column, row) {
                    self.client.send(SurfaceEvent::BackRequested);
                } else if self.hits.on_prompt(column, row) {
                    self.client.send(SurfaceEvent::PromptClicked);
                }
            }
            _ => {}
        }
    }

    fn pointer_to(&mut self, column: u16, row: u16) {
        let p = cell_center(column, row);
        self.client.send(SurfaceEvent::PointerMoved { x: p.x, y: p.y });

        let under = self.hits.control_at(column, row);
        if under == self.hovered {
            return;
        }
        if let Some(old) = self.hovered.take() {
            self.client.send(SurfaceEvent::HoverLeave(old));
        }
        if let Some(new) = under {
            self.client.send(SurfaceEvent::HoverEnter(new));
        }
        self.hovered = under;
    }

    /// Handle terminal resize
    fn handle_resize(&mut self, width: u16, height: u16) {
        self.size = (width, height);
        self.compositor.resize(Rect::new(0, 0, width, height));
        self.sync_layout();
    }

    fn quit(&mut self) {
        tracing::info!(state = ?self.client.state(), "Leaving");
        self.generate_goodbye();
        self.running = false;
    }

    // ------------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------------

    fn render(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> anyhow::Result<()> {
        self.render_card();
        self.render_controls();
        self.render_asides();
        self.render_effects();
        self.render_overlay();

        terminal.draw(|frame| {
            let output = self.compositor.composite();
            let area = frame.area();
            let buf = frame.buffer_mut();

            for y in 0..area.height.min(output.area.height) {
                for x in 0..area.width.min(output.area.width) {
                    let idx = output.index_of(x, y);
                    if idx < output.content.len() {
                        buf[(x, y)] = output.content[idx].clone();
                    }
                }
            }
        })?;

        Ok(())
    }

    /// Card, header, prompt, entry, back link and footer
    fn render_card(&mut self) {
        let pulse_on = self.pulse_on();
        let Some(buf) = self.compositor.layer_buffer_mut(self.layers.card) else {
            return;
        };
        buf.reset();
        draw_card(buf, &self.layout, self.client.stage(), &self.display, pulse_on);
    }

    fn render_controls(&mut self) {
        let pulse_on = self.pulse_on();
        let Some(buf) = self.compositor.layer_buffer_mut(self.layers.controls) else {
            return;
        };
        buf.reset();

        let stage = self.client.stage();
        let ready = stage.state() == StageState::Ready;
        for (id, rect) in self.hits.buttons() {
            let Some(control) = stage.controls().get(*id) else {
                continue;
            };
            let highlighted = self.hovered == Some(*id) || self.focused == Some(*id);
            Button::new(&control.label)
                .subtext(control.subtext.as_deref())
                .accent(theme::variant_color(control.variant))
                .actionable(ready && control.is_actionable())
                .highlighted(highlighted)
                .pulse_on(control.pulse && pulse_on)
                .render(*rect, buf);
        }
    }

    fn render_asides(&mut self) {
        let Some(buf) = self.compositor.layer_buffer_mut(self.layers.asides) else {
            return;
        };
        buf.reset();

        let mut anchors: Vec<AsideAnchor> = Vec::new();
        for aside in self.display.asides.iter().rev() {
            if anchors.contains(&aside.anchor) {
                continue;
            }
            anchors.push(aside.anchor);

            let row = match aside.anchor {
                AsideAnchor::Control(id) => match self.hits.rect_of(id) {
                    Some(rect) if rect.y > self.layout.card.y + 1 => {
                        Rect::new(
                            self.layout.card.x + 1,
                            rect.y - 1,
                            self.layout.card.width.saturating_sub(2),
                            1,
                        )
                    }
                    _ => self.layout.aside,
                },
                AsideAnchor::Prompt => self.layout.aside,
                AsideAnchor::Card => Rect::new(
                    self.layout.card.x + 2,
                    self.layout.card.bottom().saturating_sub(1),
                    self.layout.card.width.saturating_sub(4),
                    1,
                ),
            };

            let mut style = Style::default()
                .fg(theme::ASIDE_FG)
                .add_modifier(Modifier::ITALIC);
            if aside.is_fading() {
                style = style.add_modifier(Modifier::DIM);
            }
            let text = format!(" {} ", aside.text);
            let centre_x = match aside.anchor {
                AsideAnchor::Control(id) => self
                    .hits
                    .rect_of(id)
                    .map(|r| r.x + r.width / 2)
                    .unwrap_or(row.x + row.width / 2),
                _ => row.x + row.width / 2,
            };
            let width = (text.width() as u16).min(row.width);
            let x = centre_x
                .saturating_sub(width / 2)
                .clamp(row.x, row.right().saturating_sub(width).max(row.x));
            buf.set_stringn(x, row.y, &text, row.width as usize, style);
        }
    }

    fn render_effects(&mut self) {
        let Some(buf) = self.compositor.layer_buffer_mut(self.layers.effects) else {
            return;
        };
        buf.reset();
        let area = buf.area;
        self.display.effects.render_confetti(area, buf);
    }

    /// Blackout or the load-failure card
    fn render_overlay(&mut self) {
        let failure = self
            .display
            .failure
            .clone()
            .or_else(|| self.client.stage().failure().map(str::to_string));
        let covering = failure.is_some() || self.display.effects.blackout().is_some();
        self.compositor.set_visible(self.layers.overlay, covering);
        if !covering {
            return;
        }

        let Some(buf) = self.compositor.layer_buffer_mut(self.layers.overlay) else {
            return;
        };
        buf.reset();
        let area = buf.area;
        match failure {
            Some(reason) => draw_failure(buf, area, &reason),
            None => self.display.effects.render_blackout(area, buf),
        }
    }

    fn pulse_on(&self) -> bool {
        (self.anim_clock.as_millis() / PULSE_BEAT_MS) % 2 == 0
    }

    /// Pick a quick goodbye line
    fn generate_goodbye(&mut self) {
        let idx = rand::random::<usize>() % QUICK_GOODBYES.len();
        self.goodbye_message = Some(QUICK_GOODBYES[idx].to_string());
    }

    /// Get the goodbye message for display after TUI closes
    pub fn goodbye(&self) -> Option<&str> {
        self.goodbye_message.as_deref()
    }
}

// ============================================================================
// Drawing
// ============================================================================

fn draw_card(
    buf: &mut Buffer,
    layout: &CardLayout,
    stage: &Stage,
    display: &DisplayState,
    pulse_on: bool,
) {
    buf.set_style(layout.screen, Style::default().bg(theme::BACKGROUND));

    let glow = display.effects.glow();
    let mut border_style =
        Style::default().fg(theme::blend(theme::CARD_BORDER, theme::GLOW, glow));
    if display.effects.is_pulsing() {
        border_style = border_style.add_modifier(Modifier::BOLD);
        if pulse_on {
            border_style = border_style.fg(theme::CHERRY);
        }
    }
    let mut card = Block::bordered()
        .border_type(BorderType::Rounded)
        .border_style(border_style)
        .style(Style::default().bg(theme::CARD_BG));
    if !stage.title().is_empty() {
        card = card.title(
            Line::from(format!(" {} ", stage.title()))
                .centered()
                .style(Style::default().fg(theme::DIM_TEXT)),
        );
    }
    card.render(layout.card, buf);

    // Header: progress left, mood right
    if let Some(progress) = display.progress.or_else(|| stage.progress()) {
        buf.set_stringn(
            layout.header.x,
            layout.header.y,
            progress.to_string(),
            layout.header.width as usize,
            Style::default().fg(theme::DIM_TEXT),
        );
    }
    if let Some(reading) = stage.mood() {
        MoodMeter::new(reading).render(layout.header, buf);
    }

    if let Some(expression) = &display.expression {
        let color = stage
            .mood()
            .map_or(theme::PROMPT_FG, |r| theme::mood_color(r.band()));
        Line::from(expression.as_str())
            .centered()
            .style(Style::default().fg(color))
            .render(layout.expression, buf);
    }

    PromptText::new(stage.prompt())
        .cursor(stage.is_typing())
        .emphasis(stage.prompt_emphasis())
        .style(Style::default().fg(theme::PROMPT_FG))
        .render(layout.prompt, buf);

    if let Some(collect) = stage.collect() {
        let mut entry = EntryBox::new(collect).active(stage.state() == StageState::Ready);
        if let Some(placeholder) = stage
            .current_scene()
            .and_then(|s| s.collect.as_ref())
            .and_then(|c| c.placeholder.as_deref())
        {
            entry = entry.placeholder(placeholder);
        }
        entry.render(layout.entry, buf);
    }

    if display.shows_back() {
        let style = if stage.can_go_back() {
            Style::default().fg(theme::PROMPT_FG)
        } else {
            Style::default().fg(theme::DIM_TEXT)
        };
        let back = layout.back_rect();
        buf.set_stringn(back.x, back.y, "‹ Back", back.width as usize, style);
    }

    if layout.footer.height > 0 {
        Line::from(footer_hint(stage))
            .centered()
            .style(Style::default().fg(theme::DIM_TEXT))
            .render(layout.footer, buf);
    }
}

fn footer_hint(stage: &Stage) -> &'static str {
    match stage.state() {
        StageState::Idle => "",
        StageState::Busy if stage.is_typing() => "Click the text or press Space to hurry me along",
        StageState::Busy => "",
        StageState::Ready if stage.collect().is_some() => {
            "Type, Enter to add, Backspace to undo · Tab to the buttons · Esc to leave"
        }
        StageState::Ready => "Click, or Tab and Enter · 1-9 to pick · Esc to leave",
        StageState::Ended | StageState::Failed => "Esc to leave",
    }
}

fn draw_failure(buf: &mut Buffer, area: Rect, reason: &str) {
    buf.set_style(area, Style::default().bg(theme::BACKGROUND));
    let mid = area.y + area.height / 2;
    let lines = [
        (
            "The story didn't load",
            Style::default()
                .fg(theme::ERROR_RED)
                .add_modifier(Modifier::BOLD),
        ),
        (reason, Style::default().fg(theme::PROMPT_FG)),
        ("Esc to leave", Style::default().fg(theme::DIM_TEXT)),
    ];
    for (i, (text, style)) in lines.into_iter().enumerate() {
        let y = (mid + i as u16 * 2).saturating_sub(2);
        if y >= area.bottom() {
            break;
        }
        Line::from(text)
            .centered()
            .style(style)
            .render(Rect::new(area.x, y, area.width, 1), buf);
    }
}
