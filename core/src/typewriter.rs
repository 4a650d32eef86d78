//! Typewriter
//!
//! Reveals and erases text one character at a time. The typewriter never
//! sleeps: the owner advances it with [`Typewriter::tick`] and receives
//! [`Completion`]s for finished jobs.
//!
//! # Design Philosophy
//!
//! There is exactly one job at a time. Starting a job cancels the previous
//! one, and every job is identified by a [`Ticket`] so the owner can tell a
//! fresh completion from a stale one. Cancelling is just dropping the job
//! state, so nothing can keep writing after it has been replaced.
//!
//! The displayed string is always either a prefix of the text being played
//! or a prefix of what was on screen when an erase began. A new play clears
//! the display first, so old and new text never mix.

use std::fmt;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// ============================================================================
// Tickets and Completions
// ============================================================================

/// Identifies one play or erase job
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type-{}", self.0)
    }
}

/// How a job ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Finish {
    /// Ran to the end on its own
    Completed,
    /// Skipped to the end by the user
    FastForwarded,
    /// Replaced by a newer job
    Cancelled,
}

/// Result of a job
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Completion {
    pub ticket: Ticket,
    pub finish: Finish,
}

impl Completion {
    /// Whether the job's text is fully settled (not cancelled)
    pub fn settled(&self) -> bool {
        self.finish != Finish::Cancelled
    }
}

// ============================================================================
// Cadence
// ============================================================================

/// Timing parameters for reveal and erase
#[derive(Clone, Debug, PartialEq)]
pub struct Cadence {
    /// Base delay after each revealed character
    pub base: Duration,
    /// Random extra delay, uniform in `0..jitter`
    pub jitter: Duration,
    /// Extra pause after sentence punctuation (`.`, `!`, `?`, `…`)
    pub sentence_pause: Duration,
    /// Random extra on top of a punctuation pause
    pub pause_jitter: Duration,
    /// Chance per character of an extra stumble pause
    pub stumble_chance: f64,
    pub stumble: Duration,
    /// Stumbles allowed per play
    pub max_stumbles: u32,
    /// Base delay per erased character
    pub erase_base: Duration,
    pub erase_jitter: Duration,
}

impl Default for Cadence {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(22),
            jitter: Duration::from_millis(18),
            sentence_pause: Duration::from_millis(90),
            pause_jitter: Duration::from_millis(120),
            stumble_chance: 0.04,
            stumble: Duration::from_millis(240),
            max_stumbles: 2,
            erase_base: Duration::from_millis(10),
            erase_jitter: Duration::from_millis(12),
        }
    }
}

fn jitter(rng: &mut StdRng, max: Duration) -> Duration {
    if max.is_zero() {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(rng.gen_range(0.0..max.as_secs_f64()))
}

impl Cadence {
    /// Delay after revealing `ch`
    fn reveal_delay(&self, ch: char, stumbles: &mut u32, rng: &mut StdRng) -> Duration {
        let mut delay = self.base + jitter(rng, self.jitter);

        match ch {
            '.' | '!' | '?' | '…' => {
                delay += self.sentence_pause + jitter(rng, self.pause_jitter);
            }
            ',' | ';' | ':' | '—' => {
                delay += self.sentence_pause / 2 + jitter(rng, self.pause_jitter / 2);
            }
            _ => {}
        }

        if *stumbles < self.max_stumbles
            && self.stumble_chance > 0.0
            && rng.gen_bool(self.stumble_chance.min(1.0))
        {
            *stumbles += 1;
            delay += self.stumble;
        }

        delay
    }

    fn erase_delay(&self, rng: &mut StdRng) -> Duration {
        self.erase_base + jitter(rng, self.erase_jitter)
    }
}

// ============================================================================
// Typewriter
// ============================================================================

#[derive(Debug)]
enum Mode {
    Play { text: Vec<char>, revealed: usize },
    Erase,
}

#[derive(Debug)]
struct Job {
    ticket: Ticket,
    mode: Mode,
    /// Time left before the next step
    wait: Duration,
    stumbles: u32,
}

/// Character-by-character text animator for one target
#[derive(Debug)]
pub struct Typewriter {
    cadence: Cadence,
    rng: StdRng,
    shown: String,
    job: Option<Job>,
    next_ticket: u64,
    pending: Vec<Completion>,
}

impl Typewriter {
    pub fn new(cadence: Cadence, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            cadence,
            rng,
            shown: String::new(),
            job: None,
            next_ticket: 0,
            pending: Vec::new(),
        }
    }

    /// Clear the display and start revealing `text`
    pub fn play(&mut self, text: &str) -> Ticket {
        self.cancel();
        self.shown.clear();
        let ticket = self.issue();
        let chars: Vec<char> = text.chars().collect();

        if chars.is_empty() {
            self.pending.push(Completion {
                ticket,
                finish: Finish::Completed,
            });
        } else {
            self.job = Some(Job {
                ticket,
                mode: Mode::Play {
                    text: chars,
                    revealed: 0,
                },
                wait: Duration::ZERO,
                stumbles: 0,
            });
        }
        ticket
    }

    /// Start removing the displayed text from the end
    pub fn erase(&mut self) -> Ticket {
        self.cancel();
        let ticket = self.issue();

        if self.shown.is_empty() {
            self.pending.push(Completion {
                ticket,
                finish: Finish::Completed,
            });
        } else {
            self.job = Some(Job {
                ticket,
                mode: Mode::Erase,
                wait: Duration::ZERO,
                stumbles: 0,
            });
        }
        ticket
    }

    /// Show the rest of a running play at once
    ///
    /// Returns the completion for the play, or `None` if nothing was playing.
    /// Erases are not skippable.
    pub fn fast_forward(&mut self) -> Option<Completion> {
        if !matches!(self.job.as_ref()?.mode, Mode::Play { .. }) {
            return None;
        }
        let job = self.job.take()?;
        if let Mode::Play { text, .. } = job.mode {
            self.shown = text.into_iter().collect();
        }
        Some(Completion {
            ticket: job.ticket,
            finish: Finish::FastForwarded,
        })
    }

    /// Advance by `delta`, returning every completion since the last call
    pub fn tick(&mut self, delta: Duration) -> Vec<Completion> {
        let mut budget = delta;

        while let Some(job) = self.job.as_mut() {
            if job.wait > budget {
                job.wait -= budget;
                break;
            }
            budget -= job.wait;

            let done = match &mut job.mode {
                Mode::Play { text, revealed } => {
                    let ch = text[*revealed];
                    self.shown.push(ch);
                    *revealed += 1;
                    job.wait = self
                        .cadence
                        .reveal_delay(ch, &mut job.stumbles, &mut self.rng);
                    *revealed == text.len()
                }
                Mode::Erase => {
                    self.shown.pop();
                    job.wait = self.cadence.erase_delay(&mut self.rng);
                    self.shown.is_empty()
                }
            };

            if done {
                let ticket = job.ticket;
                self.job = None;
                self.pending.push(Completion {
                    ticket,
                    finish: Finish::Completed,
                });
            }
        }

        self.drain()
    }

    /// Take completions queued by `play`, `erase` or `tick`
    pub fn drain(&mut self) -> Vec<Completion> {
        std::mem::take(&mut self.pending)
    }

    /// Text currently on screen (never includes a cursor)
    pub fn displayed(&self) -> &str {
        &self.shown
    }

    pub fn is_busy(&self) -> bool {
        self.job.is_some()
    }

    pub fn is_playing(&self) -> bool {
        matches!(
            self.job,
            Some(Job {
                mode: Mode::Play { .. },
                ..
            })
        )
    }

    fn cancel(&mut self) {
        if let Some(job) = self.job.take() {
            tracing::trace!(ticket = %job.ticket, "Typewriter job cancelled");
            self.pending.push(Completion {
                ticket: job.ticket,
                finish: Finish::Cancelled,
            });
        }
    }

    fn issue(&mut self) -> Ticket {
        self.next_ticket += 1;
        Ticket(self.next_ticket)
    }
}
