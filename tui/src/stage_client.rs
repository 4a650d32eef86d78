//! Stage Client
//!
//! Thin wrapper around the embedded `Stage` for TUI integration. The stage
//! runs in-process; this client owns it together with the receiving end of
//! its message channel.
//!
//! # Architecture
//!
//! The TUI doesn't contain any story logic. Its job is:
//! 1. Convert terminal events to `SurfaceEvent`s
//! 2. Send them to the stage and tick it once per frame
//! 3. Drain `StageMessage`s into display state
//! 4. Draw what the stage exposes

use std::time::Duration;

use tokio::sync::mpsc;

use gremlin_core::{
    GremlinConfig, Outcome, Script, Stage, StageMessage, StageState, SurfaceEvent,
};

/// Client for driving the embedded stage
pub struct StageClient {
    stage: Stage,
    rx: mpsc::UnboundedReceiver<StageMessage>,
}

impl StageClient {
    /// Load the configured story (or the built-in one) into a new stage
    ///
    /// A story that fails to load still yields a client; the stage starts
    /// in the failed state and says why.
    pub fn new(config: &GremlinConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        let loaded = match &config.script_path {
            Some(path) => {
                tracing::info!(path = %path.display(), "Loading story");
                Script::load(path)
            }
            None => Script::embedded(),
        };
        let stage = Stage::from_load(loaded, config.stage.clone(), tx);

        Self { stage, rx }
    }

    /// Send a surface event to the stage
    pub fn send(&mut self, event: SurfaceEvent) -> Outcome {
        let label = event_label(&event);
        let outcome = self.stage.handle_event(event);
        match outcome {
            Outcome::Rejected | Outcome::NotFound => {
                tracing::debug!(event = label, ?outcome, "Stage refused event");
            }
            Outcome::Applied | Outcome::Ignored => {}
        }
        outcome
    }

    /// Advance the stage's clock
    pub fn tick(&mut self, delta: Duration) {
        self.stage.tick(delta);
    }

    /// Receive all pending messages from the stage (non-blocking)
    pub fn recv_all(&mut self) -> Vec<StageMessage> {
        let mut messages = Vec::new();
        while let Ok(msg) = self.rx.try_recv() {
            messages.push(msg);
        }
        messages
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn state(&self) -> StageState {
        self.stage.state()
    }
}

fn event_label(event: &SurfaceEvent) -> &'static str {
    match event {
        SurfaceEvent::Start => "start",
        SurfaceEvent::PromptClicked => "prompt_clicked",
        SurfaceEvent::BackRequested => "back",
        SurfaceEvent::PointerMoved { .. } => "pointer_moved",
        SurfaceEvent::HoverEnter(_) => "hover_enter",
        SurfaceEvent::HoverLeave(_) => "hover_leave",
        SurfaceEvent::Click(_) => "click",
        SurfaceEvent::TextInput(_) => "text_input",
        SurfaceEvent::EntryBackspace => "entry_backspace",
        SurfaceEvent::EntrySubmit => "entry_submit",
        SurfaceEvent::Layout { .. } => "layout",
    }
}
