//! Card widgets

pub mod button;
pub mod entry;
pub mod meter;
pub mod prompt;

pub use button::Button;
pub use entry::EntryBox;
pub use meter::MoodMeter;
pub use prompt::PromptText;
