//! Output rendering for live answers.
//!
//! The engine never draws anything itself.  It republishes the live answer
//! through a [`Renderer`], which lets a terminal, a TUI, or a test observe
//! the exchange while it streams.

use std::io::{self, Stdout, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::types::{Message, Tier};

/// ANSI escape code for dim text (used for status lines).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for orange-ish yellow text (used for pro answers).
const ANSI_YELLOW: &str = "\x1b[33m";

/// ANSI escape code for red text (used for failures).
const ANSI_RED: &str = "\x1b[31m";

/// Trait for rendering an exchange as it happens.
pub trait Renderer: Send {
    /// Called after the question was accepted and before the first delta.
    fn connecting(&mut self, question: &str, tier: Tier) {
        _ = (question, tier);
    }

    /// Called for every delta with the delta and the whole live answer so far.
    fn live_answer(&mut self, delta: &str, answer: &str);

    /// Called once the answer was committed into the thread.
    fn settled(&mut self, message: &Message) {
        _ = message;
    }

    /// Called when the exchange failed; `notice` replaces the live answer.
    fn failed(&mut self, notice: &str, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Whether the user asked to stop reading the current answer.
    fn should_interrupt(&self) -> bool {
        false
    }
}

/// Plain text renderer with optional ANSI styling.
///
/// Deltas are appended to stdout as they arrive.
pub struct PlainTextRenderer {
    stdout: Stdout,
    use_color: bool,
    pro: bool,
    interrupted: Option<Arc<AtomicBool>>,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            stdout: io::stdout(),
            use_color,
            pro: false,
            interrupted: None,
        }
    }

    /// Attaches an interrupt flag to the renderer.
    pub fn with_interrupt(mut self, interrupted: Arc<AtomicBool>) -> Self {
        self.interrupted = Some(interrupted);
        self
    }

    /// Flushes stdout to ensure immediate display of streamed content.
    fn flush(&mut self) {
        let _ = self.stdout.flush();
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PlainTextRenderer {
    fn connecting(&mut self, _: &str, tier: Tier) {
        self.pro = tier == Tier::Pro;
        if self.use_color {
            print!("{ANSI_DIM}Connecting...{ANSI_RESET}\r");
        } else if self.pro {
            println!("[pro] Connecting...");
        } else {
            println!("Connecting...");
        }
        self.flush();
    }

    fn live_answer(&mut self, delta: &str, answer: &str) {
        if self.use_color {
            if answer.len() == delta.len() {
                // First delta overwrites the status line.
                print!("             \r");
            }
            if self.pro {
                print!("{ANSI_YELLOW}{delta}{ANSI_RESET}");
            } else {
                print!("{delta}");
            }
        } else {
            print!("{delta}");
        }
        self.flush();
    }

    fn settled(&mut self, _: &Message) {
        println!();
        self.flush();
    }

    fn failed(&mut self, notice: &str, error: &str) {
        if self.use_color {
            println!("\n{ANSI_RED}{notice}{ANSI_RESET} {ANSI_DIM}({error}){ANSI_RESET}");
        } else {
            println!("\n{notice} ({error})");
        }
        self.flush();
    }

    fn print_info(&mut self, info: &str) {
        println!("{info}");
        self.flush();
    }

    fn print_error(&mut self, error: &str) {
        eprintln!("Error: {error}");
    }

    fn should_interrupt(&self) -> bool {
        self.interrupted
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

/// A renderer that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn live_answer(&mut self, _: &str, _: &str) {}

    fn failed(&mut self, _: &str, _: &str) {}

    fn print_info(&mut self, _: &str) {}

    fn print_error(&mut self, _: &str) {}
}
