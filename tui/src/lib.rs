//! Gremlin TUI - Terminal surface for Cozy Gremlin
//!
//! A full-screen card in the terminal: the gremlin types its lines, the
//! buttons misbehave, and confetti falls when things go well.
//!
//! # Architecture
//!
//! - **StageClient**: owns the embedded `gremlin_core::Stage`
//! - **Display**: asides, effects and the UI lock, fed by stage messages
//! - **Layout**: card geometry, button placement and hit testing
//! - **Compositor**: layered rendering (card, buttons, asides, confetti, blackout)
//! - **Widgets**: prompt, buttons, mood meter, collect entry

pub mod app;
pub mod compositor;
pub mod display;
pub mod effects;
pub mod layout;
pub mod stage_client;
pub mod theme;
pub mod widgets;

pub use app::App;
pub use stage_client::StageClient;
