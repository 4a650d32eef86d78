//! Stage
//!
//! The render coordinator. The stage owns the navigator, the typewriter, the
//! current scene's controls and every gimmick binding, and is the only thing
//! that moves between scenes.
//!
//! # Design Philosophy
//!
//! The stage is headless: it never draws and never sleeps. A surface feeds
//! it [`SurfaceEvent`]s and calls [`Stage::tick`] once per frame; the stage
//! answers with [`StageMessage`]s for one-off happenings and exposes render
//! data through accessors.
//!
//! Every transition runs the same sequence:
//!
//! 1. detach all gimmick bindings and disable the controls
//! 2. erase the current prompt
//! 3. update the navigator
//! 4. rebuild controls from the new scene only
//! 5. type the new prompt
//! 6. attach the new scene's gimmicks and enable the controls
//!
//! Only one transition runs at a time; anything that arrives while the stage
//! is busy is rejected.

use std::time::Duration;

use tokio::sync::mpsc;

use crate::collect::CollectState;
use crate::controls::{ControlAction, ControlId, ControlSet};
use crate::error::{NavError, ScriptError};
use crate::events::SurfaceEvent;
use crate::geometry::{Area, Point};
use crate::gimmicks::{Binding, BindingHandle, BindingSet, GimmickContext, Interaction, Reaction};
use crate::messages::{AsideAnchor, StageMessage, StageState};
use crate::mood::{MoodChange, MoodGauge, MoodReading};
use crate::navigator::{Navigator, Progress};
use crate::script::{EffectKind, Scene, SceneId, SceneKind, Script};
use crate::typewriter::{Cadence, Completion, Ticket, Typewriter};

// ============================================================================
// Settings
// ============================================================================

/// Tunables for the stage
#[derive(Clone, Debug, PartialEq)]
pub struct StageSettings {
    pub cadence: Cadence,
    /// Seed for typing jitter; `None` uses entropy
    pub seed: Option<u64>,
    /// How long an intercept aside shows before navigating
    pub intercept_dwell: Duration,
    /// How long ordinary asides stay up
    pub aside_dwell: Duration,
    /// Mood gauge approach rate per second
    pub mood_smoothing: f32,
    pub collect_max_items: usize,
    pub collect_max_chars: usize,
}

impl Default for StageSettings {
    fn default() -> Self {
        Self {
            cadence: Cadence::default(),
            seed: None,
            intercept_dwell: Duration::from_millis(1200),
            aside_dwell: Duration::from_millis(2600),
            mood_smoothing: 6.0,
            collect_max_items: 8,
            collect_max_chars: 48,
        }
    }
}

// ============================================================================
// Outcomes and Phases
// ============================================================================

/// What happened to a surface event
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The event changed something
    Applied,
    /// The event was valid but had no effect
    Ignored,
    /// The event arrived while input is disabled or gated
    Rejected,
    /// The event referred to a control or scene that does not exist
    NotFound,
}

#[derive(Clone, Debug, PartialEq)]
enum Transition {
    Forward {
        to: SceneId,
        via: Option<MoodChange>,
        effects: Vec<EffectKind>,
    },
    Back,
}

/// How a scene was reached
#[derive(Clone, Debug, PartialEq)]
enum Arrival {
    /// Announced with the choice's effects plus the scene's own
    Forward(Vec<EffectKind>),
    Back,
}

/// What to do once a prompt has finished typing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Settle {
    /// Fresh scene: attach gimmicks, then enable
    Enter,
    /// Retyped prompt on a live scene: just enable
    Resume,
}

#[derive(Clone, Debug, PartialEq)]
enum Phase {
    Idle,
    Erasing { ticket: Ticket, transition: Transition },
    Typing { ticket: Ticket, settle: Settle },
    Intercepting { until: Duration, transition: Transition },
    Ready,
    Ended,
    Failed,
}

// ============================================================================
// Stage
// ============================================================================

/// Headless render coordinator
pub struct Stage {
    nav: Option<Navigator>,
    typewriter: Typewriter,
    controls: ControlSet,
    bindings: BindingSet,
    handles: Vec<BindingHandle>,
    collect: Option<CollectState>,
    gauge: MoodGauge,
    phase: Phase,
    state: StageState,
    settings: StageSettings,
    clock: Duration,
    card: Option<Area>,
    emphasis: f32,
    epoch: u32,
    failure: Option<String>,
    tx: mpsc::UnboundedSender<StageMessage>,
}

impl Stage {
    /// Create a stage for a loaded script; call [`SurfaceEvent::Start`] to begin
    pub fn new(script: Script, settings: StageSettings, tx: mpsc::UnboundedSender<StageMessage>) -> Self {
        let nav = Navigator::new(script);
        let gauge = MoodGauge::new(nav.mood(), settings.mood_smoothing);
        Self {
            nav: Some(nav),
            typewriter: Typewriter::new(settings.cadence.clone(), settings.seed),
            controls: ControlSet::default(),
            bindings: BindingSet::new(),
            handles: Vec::new(),
            collect: None,
            gauge,
            phase: Phase::Idle,
            state: StageState::Idle,
            settings,
            clock: Duration::ZERO,
            card: None,
            emphasis: 1.0,
            epoch: 0,
            failure: None,
            tx,
        }
    }

    /// Create a stage from a load attempt
    ///
    /// A failed load yields a stage in the failed state that announces the
    /// failure and ignores every event.
    pub fn from_load(
        loaded: Result<Script, ScriptError>,
        settings: StageSettings,
        tx: mpsc::UnboundedSender<StageMessage>,
    ) -> Self {
        match loaded {
            Ok(script) => Self::new(script, settings, tx),
            Err(err) => {
                tracing::error!(error = %err, "Scene document failed to load");
                let reason = err.to_string();
                let mut stage = Self {
                    nav: None,
                    typewriter: Typewriter::new(settings.cadence.clone(), settings.seed),
                    controls: ControlSet::default(),
                    bindings: BindingSet::new(),
                    handles: Vec::new(),
                    collect: None,
                    gauge: MoodGauge::new(0.0, settings.mood_smoothing),
                    phase: Phase::Failed,
                    state: StageState::Idle,
                    settings,
                    clock: Duration::ZERO,
                    card: None,
                    emphasis: 1.0,
                    epoch: 0,
                    failure: Some(reason.clone()),
                    tx,
                };
                stage.emit(StageMessage::LoadFailed { reason });
                stage.set_state(StageState::Failed);
                stage
            }
        }
    }

    // ------------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------------

    /// Handle one surface event
    pub fn handle_event(&mut self, event: SurfaceEvent) -> Outcome {
        if self.phase == Phase::Failed {
            return Outcome::Ignored;
        }

        match event {
            SurfaceEvent::Start => self.start(),
            SurfaceEvent::PromptClicked => self.fast_forward(),
            SurfaceEvent::BackRequested => self.back(),
            SurfaceEvent::PointerMoved { x, y } => self.pointer_moved(Point::new(x, y)),
            SurfaceEvent::HoverEnter(id) => self.hover(id, Interaction::HoverEnter(id)),
            SurfaceEvent::HoverLeave(id) => self.hover(id, Interaction::HoverLeave(id)),
            SurfaceEvent::Click(id) => self.click(id),
            SurfaceEvent::TextInput(ch) => self.edit_entry(|c| c.push_char(ch)),
            SurfaceEvent::EntryBackspace => self.edit_entry(|c| {
                let before = (c.draft().len(), c.items().len());
                if let Some(removed) = c.backspace() {
                    tracing::debug!(item = %removed, "Removed collected item");
                }
                before != (c.draft().len(), c.items().len())
            }),
            SurfaceEvent::EntrySubmit => self.edit_entry(CollectState::commit),
            SurfaceEvent::Layout { card, homes } => {
                self.card = Some(card);
                for (id, home) in homes {
                    self.controls.set_home(id, home);
                }
                Outcome::Applied
            }
        }
    }

    fn start(&mut self) -> Outcome {
        if self.phase != Phase::Idle {
            return Outcome::Ignored;
        }
        let Some(start) = self.nav.as_ref().map(|n| n.script().start().clone()) else {
            return Outcome::Ignored;
        };
        self.launch(Transition::Forward {
            to: start,
            via: None,
            effects: Vec::new(),
        });
        Outcome::Applied
    }

    fn fast_forward(&mut self) -> Outcome {
        if !matches!(self.phase, Phase::Typing { .. }) {
            return Outcome::Ignored;
        }
        match self.typewriter.fast_forward() {
            Some(completion) => {
                self.on_completion(completion);
                self.pump();
                Outcome::Applied
            }
            None => Outcome::Ignored,
        }
    }

    fn back(&mut self) -> Outcome {
        if self.phase != Phase::Ready {
            return Outcome::Rejected;
        }
        if !self.nav.as_ref().is_some_and(Navigator::can_go_back) {
            return Outcome::Ignored;
        }
        self.launch(Transition::Back);
        Outcome::Applied
    }

    fn pointer_moved(&mut self, pointer: Point) -> Outcome {
        if self.phase != Phase::Ready {
            return Outcome::Ignored;
        }
        let reactions = self.bindings.dispatch(
            Interaction::PointerMoved(pointer),
            &mut GimmickContext {
                controls: &mut self.controls,
                now: self.clock,
                area: self.card,
            },
        );
        self.apply_reactions(reactions)
    }

    fn hover(&mut self, id: ControlId, interaction: Interaction) -> Outcome {
        if self.controls.get(id).is_none() {
            return Outcome::NotFound;
        }
        if self.phase != Phase::Ready {
            return Outcome::Ignored;
        }
        let reactions = self.bindings.dispatch(
            interaction,
            &mut GimmickContext {
                controls: &mut self.controls,
                now: self.clock,
                area: self.card,
            },
        );
        self.apply_reactions(reactions)
    }

    fn click(&mut self, id: ControlId) -> Outcome {
        let Some(control) = self.controls.get(id) else {
            return Outcome::NotFound;
        };
        if self.phase != Phase::Ready || !control.enabled {
            return Outcome::Rejected;
        }
        if control.hidden {
            return Outcome::Ignored;
        }
        let (action, gated) = (control.action, control.gated);

        let reactions = self.bindings.dispatch(
            Interaction::Click(id),
            &mut GimmickContext {
                controls: &mut self.controls,
                now: self.clock,
                area: self.card,
            },
        );
        if !reactions.is_empty() {
            return self.apply_reactions(reactions);
        }
        if gated {
            return Outcome::Rejected;
        }
        self.perform(action, id)
    }

    fn edit_entry(&mut self, edit: impl FnOnce(&mut CollectState) -> bool) -> Outcome {
        if self.phase != Phase::Ready {
            return Outcome::Rejected;
        }
        let Some(collect) = self.collect.as_mut() else {
            return Outcome::Ignored;
        };
        let changed = edit(collect);
        self.refresh_gate();
        if changed {
            Outcome::Applied
        } else {
            Outcome::Ignored
        }
    }

    // ------------------------------------------------------------------------
    // Time
    // ------------------------------------------------------------------------

    /// Advance every timer by `delta`
    pub fn tick(&mut self, delta: Duration) {
        self.clock += delta;
        self.gauge.tick(delta);

        if self.phase == Phase::Failed {
            return;
        }

        for completion in self.typewriter.tick(delta) {
            self.on_completion(completion);
        }
        self.pump();

        if let Phase::Intercepting { until, .. } = &self.phase {
            if self.clock >= *until {
                if let Phase::Intercepting { transition, .. } =
                    std::mem::replace(&mut self.phase, Phase::Idle)
                {
                    self.launch(transition);
                }
            }
        }

        if self.phase == Phase::Ready {
            let reactions = self.bindings.tick(&mut GimmickContext {
                controls: &mut self.controls,
                now: self.clock,
                area: self.card,
            });
            self.apply_reactions(reactions);
        }
    }

    // ------------------------------------------------------------------------
    // Actions
    // ------------------------------------------------------------------------

    fn perform(&mut self, action: ControlAction, source: ControlId) -> Outcome {
        let Some(scene) = self.current_scene().cloned() else {
            return Outcome::Ignored;
        };

        let target = match action {
            ControlAction::Begin => scene.next.clone(),
            ControlAction::Continue => {
                if self.collect.as_ref().is_some_and(|c| !c.can_continue()) {
                    return Outcome::Rejected;
                }
                scene.next.clone()
            }
            ControlAction::Skip => scene.skip_target().cloned(),
            ControlAction::Choose(i) => {
                let Some(choice) = scene.choices.get(i) else {
                    return Outcome::NotFound;
                };
                let transition = Transition::Forward {
                    to: choice.to.clone(),
                    via: choice.mood_change(),
                    effects: choice.effects.clone(),
                };
                return match &choice.intercept {
                    Some(text) => {
                        let anchor = self
                            .controls
                            .choice_control(i)
                            .map_or(AsideAnchor::Card, AsideAnchor::Control);
                        self.intercept(text.clone(), anchor, transition)
                    }
                    None => self.begin(transition),
                };
            }
        };

        let Some(to) = target else {
            tracing::warn!(scene = %scene.id, control = %source, "Control has no target");
            return Outcome::Ignored;
        };
        if let Some(collect) = &self.collect {
            tracing::debug!(items = ?collect.items(), "Leaving collect scene");
        }
        self.begin(Transition::Forward {
            to,
            via: None,
            effects: Vec::new(),
        })
    }

    /// Show the intercept aside, then navigate once it has dwelt
    fn intercept(&mut self, text: String, anchor: AsideAnchor, transition: Transition) -> Outcome {
        if let Err(outcome) = self.prevalidate(&transition) {
            return outcome;
        }
        self.teardown();
        let dwell = self.settings.intercept_dwell;
        self.emit(StageMessage::Aside {
            text,
            anchor,
            dwell_ms: dwell.as_millis() as u64,
        });
        self.phase = Phase::Intercepting {
            until: self.clock + dwell,
            transition,
        };
        self.set_state(StageState::Busy);
        Outcome::Applied
    }

    fn apply_reactions(&mut self, reactions: Vec<Reaction>) -> Outcome {
        let mut outcome = Outcome::Ignored;
        for reaction in reactions {
            match reaction {
                Reaction::Ignored => {}
                Reaction::Handled | Reaction::Suppressed => outcome = Outcome::Applied,
                Reaction::Aside { text, anchor } => {
                    let dwell_ms = self.settings.aside_dwell.as_millis() as u64;
                    self.emit(StageMessage::Aside {
                        text,
                        anchor,
                        dwell_ms,
                    });
                    outcome = Outcome::Applied;
                }
                Reaction::Retype { text, emphasis } => {
                    self.emphasis = emphasis;
                    self.controls.set_enabled(false);
                    let ticket = self.typewriter.play(&text);
                    self.phase = Phase::Typing {
                        ticket,
                        settle: Settle::Resume,
                    };
                    self.set_state(StageState::Busy);
                    self.pump();
                    return Outcome::Applied;
                }
                Reaction::Invoke(action) => {
                    let source = self
                        .controls
                        .iter()
                        .find(|c| c.action == action)
                        .map(|c| c.id)
                        .unwrap_or(ControlId {
                            epoch: self.epoch,
                            slot: 0,
                        });
                    return self.perform(action, source);
                }
            }
        }
        outcome
    }

    // ------------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------------

    fn prevalidate(&self, transition: &Transition) -> Result<(), Outcome> {
        let Some(nav) = &self.nav else {
            return Err(Outcome::Ignored);
        };
        match transition {
            Transition::Forward { to, .. } if !nav.script().contains(to) => {
                tracing::warn!(
                    error = %NavError::SceneNotFound(to.clone()),
                    "Transition aborted, staying on current scene"
                );
                Err(Outcome::NotFound)
            }
            Transition::Back if !nav.can_go_back() => Err(Outcome::Ignored),
            _ => Ok(()),
        }
    }

    fn begin(&mut self, transition: Transition) -> Outcome {
        if self.phase != Phase::Ready {
            return Outcome::Rejected;
        }
        if let Err(outcome) = self.prevalidate(&transition) {
            return outcome;
        }
        self.launch(transition);
        Outcome::Applied
    }

    /// Tear down the current scene and start erasing its prompt
    fn launch(&mut self, transition: Transition) {
        self.teardown();
        let ticket = self.typewriter.erase();
        self.phase = Phase::Erasing { ticket, transition };
        self.set_state(StageState::Busy);
        self.pump();
    }

    fn teardown(&mut self) {
        for handle in self.handles.drain(..) {
            self.bindings.detach(handle, &mut self.controls);
        }
        debug_assert!(self.bindings.is_empty());
        self.controls.set_enabled(false);
    }

    /// Feed queued typewriter completions back into the phase machine
    fn pump(&mut self) {
        loop {
            let completions = self.typewriter.drain();
            if completions.is_empty() {
                break;
            }
            for completion in completions {
                self.on_completion(completion);
            }
        }
    }

    fn on_completion(&mut self, completion: Completion) {
        let current = match &self.phase {
            Phase::Erasing { ticket, .. } | Phase::Typing { ticket, .. } => *ticket,
            _ => {
                tracing::trace!(ticket = %completion.ticket, "Stale typewriter completion");
                return;
            }
        };
        if completion.ticket != current || !completion.settled() {
            tracing::trace!(ticket = %completion.ticket, "Stale typewriter completion");
            return;
        }

        match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Erasing { transition, .. } => self.enter(transition),
            Phase::Typing { settle, .. } => self.settle(settle),
            other => self.phase = other,
        }
    }

    fn enter(&mut self, transition: Transition) {
        let Some(nav) = self.nav.as_mut() else {
            return;
        };
        let (entered, arrival) = match transition {
            Transition::Forward { to, via, effects } => (
                nav.go_to(&to, via).map(Scene::clone),
                Arrival::Forward(effects),
            ),
            Transition::Back => (
                nav.go_back()
                    .cloned()
                    .ok_or_else(|| NavError::SceneNotFound(SceneId::new("<back>"))),
                Arrival::Back,
            ),
        };

        match entered {
            Ok(scene) => self.render_scene(&scene, arrival),
            Err(err) => {
                tracing::warn!(error = %err, "Transition failed, restoring current scene");
                if let Some(prompt) = self.current_scene().map(|s| s.prompt.clone()) {
                    self.play_prompt(&prompt, Settle::Enter);
                }
            }
        }
    }

    fn render_scene(&mut self, scene: &Scene, arrival: Arrival) {
        self.epoch += 1;
        self.controls = ControlSet::for_scene(scene, self.epoch);
        self.collect = scene.collect_spec().map(|spec| {
            CollectState::new(
                spec.min,
                self.settings.collect_max_items,
                self.settings.collect_max_chars,
            )
        });
        self.refresh_gate();
        self.emphasis = 1.0;

        if let Some(nav) = &self.nav {
            self.gauge.retarget(nav.mood());
        }
        if let Some(progress) = self.progress() {
            self.emit(StageMessage::SceneEntered {
                id: scene.id.clone(),
                kind: scene.kind,
                expression: scene.expression.clone(),
                progress,
            });
        }

        // Returning to a scene does not replay its entrance
        if let Arrival::Forward(effects) = arrival {
            self.announce(scene, effects);
        }

        self.play_prompt(&scene.prompt, Settle::Enter);
    }

    /// Choice effects, then the scene's own entry effects and aside
    fn announce(&mut self, scene: &Scene, effects: Vec<EffectKind>) {
        for effect in effects.into_iter().chain(scene.effects.iter().copied()) {
            let message = match effect {
                EffectKind::Blackout => Some(scene.closing.clone().unwrap_or_else(|| scene.prompt.clone())),
                _ => None,
            };
            self.emit(StageMessage::Effect { effect, message });
        }

        if let Some(aside) = &scene.aside {
            self.emit(StageMessage::Aside {
                text: aside.clone(),
                anchor: AsideAnchor::Prompt,
                dwell_ms: self.settings.aside_dwell.as_millis() as u64,
            });
        }
    }

    fn play_prompt(&mut self, text: &str, settle: Settle) {
        let ticket = self.typewriter.play(text);
        self.phase = Phase::Typing { ticket, settle };
        self.set_state(StageState::Busy);
    }

    fn settle(&mut self, settle: Settle) {
        if settle == Settle::Enter {
            self.attach_gimmicks();
        }

        let ending = self
            .current_scene()
            .filter(|s| s.kind == SceneKind::Ending)
            .map(|s| s.closing.clone().unwrap_or_else(|| s.prompt.clone()));

        match ending {
            Some(closing) if settle == Settle::Enter => {
                self.emit(StageMessage::Effect {
                    effect: EffectKind::Blackout,
                    message: Some(closing),
                });
                self.emit(StageMessage::Effect {
                    effect: EffectKind::LockUi,
                    message: None,
                });
                self.phase = Phase::Ended;
                self.set_state(StageState::Ended);
            }
            _ => {
                self.controls.set_enabled(true);
                self.refresh_gate();
                self.phase = Phase::Ready;
                self.set_state(StageState::Ready);
            }
        }
    }

    fn attach_gimmicks(&mut self) {
        let Some(scene) = self.current_scene().cloned() else {
            return;
        };

        let mut wanted = Vec::new();
        if let Some(gimmick) = &scene.gimmick {
            wanted.push((gimmick.clone(), None));
        }
        for (i, choice) in scene.choices.iter().enumerate() {
            if let Some(gimmick) = &choice.gimmick {
                wanted.push((gimmick.clone(), self.controls.choice_control(i)));
            }
        }

        for (gimmick, target) in wanted {
            match Binding::attach(&gimmick, target, &self.controls) {
                Some(binding) => {
                    let handle = self.bindings.attach(binding);
                    self.handles.push(handle);
                }
                None => tracing::warn!(
                    scene = %scene.id,
                    gimmick = gimmick.name(),
                    "Gimmick could not be attached"
                ),
            }
        }
    }

    fn refresh_gate(&mut self) {
        if let Some(collect) = &self.collect {
            self.controls
                .set_gated(ControlAction::Continue, !collect.can_continue());
        }
    }

    fn set_state(&mut self, state: StageState) {
        if self.state != state {
            self.state = state;
            self.emit(StageMessage::State { state });
        }
    }

    fn emit(&self, msg: StageMessage) {
        if self.tx.send(msg).is_err() {
            tracing::warn!("Surface channel closed, stage message dropped");
        }
    }

    // ------------------------------------------------------------------------
    // Render data
    // ------------------------------------------------------------------------

    pub fn state(&self) -> StageState {
        self.state
    }

    pub fn title(&self) -> &str {
        self.nav.as_ref().map_or("", |n| n.script().title())
    }

    /// Prompt text as currently revealed
    pub fn prompt(&self) -> &str {
        self.typewriter.displayed()
    }

    /// True while the prompt is being typed (not erased)
    pub fn is_typing(&self) -> bool {
        self.typewriter.is_playing()
    }

    /// Prompt scale, grown by pleading
    pub fn prompt_emphasis(&self) -> f32 {
        self.emphasis
    }

    pub fn controls(&self) -> &ControlSet {
        &self.controls
    }

    pub fn collect(&self) -> Option<&CollectState> {
        self.collect.as_ref()
    }

    pub fn mood(&self) -> Option<MoodReading> {
        let nav = self.nav.as_ref()?;
        Some(MoodReading {
            rendered: self.gauge.rendered(),
            value: nav.mood(),
            range: nav.mood_range(),
        })
    }

    pub fn current_scene(&self) -> Option<&Scene> {
        self.nav.as_ref()?.current_scene()
    }

    pub fn progress(&self) -> Option<Progress> {
        self.nav.as_ref()?.progress()
    }

    /// Back is offered only while the scene is interactive
    pub fn can_go_back(&self) -> bool {
        self.phase == Phase::Ready && self.nav.as_ref().is_some_and(Navigator::can_go_back)
    }

    /// Load failure reason, if the stage failed
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    pub fn clock(&self) -> Duration {
        self.clock
    }

    pub fn live_bindings(&self) -> usize {
        self.bindings.len()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DOC: &str = r#"{
        "title": "Test",
        "scenes": [
            { "id": "start", "kind": "start", "prompt": "Ready?", "next": "ask" },
            { "id": "ask", "kind": "choices", "prompt": "Well?", "mood_delta": 5,
              "effects": ["soft_glow"], "aside": "Pick one.",
              "choices": [
                { "label": "Yes", "to": "wish", "mood_delta": 10 },
                { "label": "No", "to": "wish", "intercept": "Fair." } ] },
            { "id": "wish", "kind": "collect", "prompt": "List two.", "next": "end",
              "collect": { "min": 2 } },
            { "id": "end", "kind": "ending", "prompt": "Bye.", "closing": "Door's open." }
        ]
    }"#;

    fn stage() -> (Stage, mpsc::UnboundedReceiver<StageMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let settings = StageSettings {
            seed: Some(42),
            ..StageSettings::default()
        };
        (Stage::new(Script::from_json(DOC).unwrap(), settings, tx), rx)
    }

    fn settle(stage: &mut Stage) {
        for _ in 0..2_000 {
            if matches!(stage.state(), StageState::Ready | StageState::Ended) {
                return;
            }
            stage.tick(Duration::from_millis(16));
        }
        panic!("stage never settled: {:?}", stage.state());
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<StageMessage>) -> Vec<StageMessage> {
        let mut out = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            out.push(msg);
        }
        out
    }

    fn control_for(stage: &Stage, action: ControlAction) -> ControlId {
        stage
            .controls()
            .iter()
            .find(|c| c.action == action)
            .map(|c| c.id)
            .unwrap()
    }

    #[test]
    fn test_start_types_first_prompt() {
        let (mut stage, mut rx) = stage();
        assert_eq!(stage.state(), StageState::Idle);
        assert_eq!(stage.handle_event(SurfaceEvent::Start), Outcome::Applied);
        assert_eq!(stage.state(), StageState::Busy);
        assert!(!stage.controls().any_enabled());

        settle(&mut stage);
        assert_eq!(stage.prompt(), "Ready?");
        assert!(stage.controls().any_enabled());

        let msgs = drain(&mut rx);
        assert!(msgs.iter().any(|m| matches!(
            m,
            StageMessage::SceneEntered { id, .. } if id.as_str() == "start"
        )));
        assert_eq!(stage.handle_event(SurfaceEvent::Start), Outcome::Ignored);
    }

    #[test]
    fn test_click_while_typing_rejected() {
        let (mut stage, _rx) = stage();
        stage.handle_event(SurfaceEvent::Start);
        stage.tick(Duration::from_millis(16));
        let begin = control_for(&stage, ControlAction::Begin);
        assert_eq!(stage.handle_event(SurfaceEvent::Click(begin)), Outcome::Rejected);
    }

    #[test]
    fn test_prompt_click_fast_forwards_and_enables() {
        let (mut stage, _rx) = stage();
        stage.handle_event(SurfaceEvent::Start);
        stage.tick(Duration::from_millis(16));
        assert!(stage.is_typing());

        assert_eq!(stage.handle_event(SurfaceEvent::PromptClicked), Outcome::Applied);
        assert_eq!(stage.prompt(), "Ready?");
        assert_eq!(stage.state(), StageState::Ready);
        assert_eq!(stage.handle_event(SurfaceEvent::PromptClicked), Outcome::Ignored);
    }

    #[test]
    fn test_forward_back_restores_mood() {
        let (mut stage, _rx) = stage();
        stage.handle_event(SurfaceEvent::Start);
        settle(&mut stage);
        let begin = control_for(&stage, ControlAction::Begin);
        stage.handle_event(SurfaceEvent::Click(begin));
        settle(&mut stage);
        let mood_at_ask = stage.mood().unwrap().value;
        assert_eq!(mood_at_ask, 55.0);

        let yes = control_for(&stage, ControlAction::Choose(0));
        stage.handle_event(SurfaceEvent::Click(yes));
        settle(&mut stage);
        assert_eq!(stage.current_scene().unwrap().id.as_str(), "wish");
        assert_eq!(stage.mood().unwrap().value, 65.0);

        assert_eq!(stage.handle_event(SurfaceEvent::BackRequested), Outcome::Applied);
        settle(&mut stage);
        assert_eq!(stage.current_scene().unwrap().id.as_str(), "ask");
        assert_eq!(stage.mood().unwrap().value, mood_at_ask);
        assert_eq!(stage.prompt(), "Well?");
    }

    #[test]
    fn test_back_does_not_replay_entrance() {
        let (mut stage, mut rx) = stage();
        stage.handle_event(SurfaceEvent::Start);
        settle(&mut stage);
        stage.handle_event(SurfaceEvent::Click(control_for(&stage, ControlAction::Begin)));
        settle(&mut stage);

        let entered = drain(&mut rx);
        assert!(entered.contains(&StageMessage::Effect {
            effect: EffectKind::SoftGlow,
            message: None,
        }));
        assert!(entered
            .iter()
            .any(|m| matches!(m, StageMessage::Aside { text, .. } if text == "Pick one.")));

        stage.handle_event(SurfaceEvent::Click(control_for(&stage, ControlAction::Choose(0))));
        settle(&mut stage);
        drain(&mut rx);
        assert_eq!(stage.handle_event(SurfaceEvent::BackRequested), Outcome::Applied);
        settle(&mut stage);

        assert_eq!(stage.current_scene().unwrap().id.as_str(), "ask");
        let returned = drain(&mut rx);
        assert!(returned
            .iter()
            .any(|m| matches!(m, StageMessage::SceneEntered { id, .. } if id.as_str() == "ask")));
        assert!(!returned
            .iter()
            .any(|m| matches!(m, StageMessage::Effect { .. } | StageMessage::Aside { .. })));
    }

    #[test]
    fn test_intercept_dwells_before_navigating() {
        let (mut stage, mut rx) = stage();
        stage.handle_event(SurfaceEvent::Start);
        settle(&mut stage);
        let begin = control_for(&stage, ControlAction::Begin);
        stage.handle_event(SurfaceEvent::Click(begin));
        settle(&mut stage);
        drain(&mut rx);

        let no = control_for(&stage, ControlAction::Choose(1));
        assert_eq!(stage.handle_event(SurfaceEvent::Click(no)), Outcome::Applied);
        assert_eq!(stage.state(), StageState::Busy);
        assert!(!stage.controls().any_enabled());
        assert_eq!(
            drain(&mut rx).first(),
            Some(&StageMessage::Aside {
                text: "Fair.".to_string(),
                anchor: AsideAnchor::Control(no),
                dwell_ms: 1200,
            })
        );

        stage.tick(Duration::from_millis(600));
        assert_eq!(stage.current_scene().unwrap().id.as_str(), "ask");
        assert_eq!(stage.handle_event(SurfaceEvent::BackRequested), Outcome::Rejected);

        stage.tick(Duration::from_millis(700));
        settle(&mut stage);
        assert_eq!(stage.current_scene().unwrap().id.as_str(), "wish");
    }

    #[test]
    fn test_collect_gate_blocks_continue() {
        let (mut stage, _rx) = stage();
        stage.handle_event(SurfaceEvent::Start);
        settle(&mut stage);
        stage.handle_event(SurfaceEvent::Click(control_for(&stage, ControlAction::Begin)));
        settle(&mut stage);
        stage.handle_event(SurfaceEvent::Click(control_for(&stage, ControlAction::Choose(0))));
        settle(&mut stage);

        let cont = control_for(&stage, ControlAction::Continue);
        assert_eq!(stage.handle_event(SurfaceEvent::Click(cont)), Outcome::Rejected);

        for word in ["tea", "naps"] {
            for ch in word.chars() {
                stage.handle_event(SurfaceEvent::TextInput(ch));
            }
            assert_eq!(stage.handle_event(SurfaceEvent::EntrySubmit), Outcome::Applied);
        }
        assert_eq!(stage.collect().unwrap().items().len(), 2);
        assert!(stage.controls().get(cont).unwrap().is_actionable());

        stage.handle_event(SurfaceEvent::TextInput('x'));
        assert_eq!(stage.handle_event(SurfaceEvent::EntryBackspace), Outcome::Applied);
        assert_eq!(stage.collect().unwrap().items().len(), 2);

        assert_eq!(stage.handle_event(SurfaceEvent::Click(cont)), Outcome::Applied);
        settle(&mut stage);
        assert_eq!(stage.state(), StageState::Ended);
        assert!(stage.collect().is_none());
    }

    #[test]
    fn test_backspace_with_nothing_to_remove_is_ignored() {
        let (mut stage, _rx) = stage();
        stage.handle_event(SurfaceEvent::Start);
        settle(&mut stage);
        stage.handle_event(SurfaceEvent::Click(control_for(&stage, ControlAction::Begin)));
        settle(&mut stage);
        stage.handle_event(SurfaceEvent::Click(control_for(&stage, ControlAction::Choose(0))));
        settle(&mut stage);

        assert_eq!(stage.handle_event(SurfaceEvent::EntryBackspace), Outcome::Ignored);

        stage.handle_event(SurfaceEvent::TextInput('a'));
        assert_eq!(stage.handle_event(SurfaceEvent::EntrySubmit), Outcome::Applied);
        assert_eq!(stage.handle_event(SurfaceEvent::EntryBackspace), Outcome::Applied);
        assert!(stage.collect().unwrap().items().is_empty());
        assert_eq!(stage.handle_event(SurfaceEvent::EntryBackspace), Outcome::Ignored);
    }

    #[test]
    fn test_ending_locks_and_blacks_out() {
        let (mut stage, mut rx) = stage();
        stage.handle_event(SurfaceEvent::Start);
        settle(&mut stage);
        stage.handle_event(SurfaceEvent::Click(control_for(&stage, ControlAction::Begin)));
        settle(&mut stage);
        stage.handle_event(SurfaceEvent::Click(control_for(&stage, ControlAction::Choose(0))));
        settle(&mut stage);
        stage.handle_event(SurfaceEvent::Click(control_for(&stage, ControlAction::Skip)));
        settle(&mut stage);

        assert_eq!(stage.state(), StageState::Ended);
        assert!(!stage.can_go_back());
        assert_eq!(stage.handle_event(SurfaceEvent::BackRequested), Outcome::Rejected);

        let msgs = drain(&mut rx);
        assert!(msgs.contains(&StageMessage::Effect {
            effect: EffectKind::Blackout,
            message: Some("Door's open.".to_string()),
        }));
        assert!(msgs.contains(&StageMessage::Effect {
            effect: EffectKind::LockUi,
            message: None,
        }));
    }

    #[test]
    fn test_unknown_control_not_found() {
        let (mut stage, _rx) = stage();
        stage.handle_event(SurfaceEvent::Start);
        settle(&mut stage);
        let bogus = ControlId { epoch: 99, slot: 0 };
        assert_eq!(stage.handle_event(SurfaceEvent::Click(bogus)), Outcome::NotFound);
        assert_eq!(
            stage.handle_event(SurfaceEvent::HoverEnter(bogus)),
            Outcome::NotFound
        );
    }

    #[test]
    fn test_failed_load_reports_and_ignores_input() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let stage_result = Script::from_json("{}");
        let mut stage = Stage::from_load(stage_result, StageSettings::default(), tx);

        assert_eq!(stage.state(), StageState::Failed);
        assert!(stage.failure().is_some());
        assert_eq!(stage.handle_event(SurfaceEvent::Start), Outcome::Ignored);
        assert!(stage.current_scene().is_none());

        let msgs = drain(&mut rx);
        assert!(matches!(msgs[0], StageMessage::LoadFailed { .. }));
        assert_eq!(
            msgs[1],
            StageMessage::State {
                state: StageState::Failed
            }
        );
    }
}
