//! Terminal lifecycle for revnav.
//!
//! The TUI renders to stderr so `revnav` can sit in a shell pipeline: stdout only
//! ever carries the final URL printed on exit.

use std::io::{self, BufWriter, Stderr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Once};

use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use signal_hook::consts::{SIGHUP, SIGTERM};

/// Crossterm backend over buffered stderr.
pub type Tui = Terminal<CrosstermBackend<BufWriter<Stderr>>>;

static PANIC_HOOK: Once = Once::new();

/// Switches the terminal into TUI mode: raw input, alternate screen, mouse capture.
///
/// The first call also chains a panic hook that runs [`leave`] before the default
/// panic message, so a panic never leaves the shell in raw mode.
///
/// # Errors
///
/// Returns `Err` if the terminal refuses raw mode or the escape sequences.
pub fn enter() -> io::Result<Tui> {
    PANIC_HOOK.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let _ = leave();
            previous(info);
        }));
    });

    let mut out = BufWriter::new(io::stderr());
    enable_raw_mode()?;
    execute!(out, EnterAlternateScreen, EnableMouseCapture)?;
    Terminal::new(CrosstermBackend::new(out))
}

/// Returns the terminal to line mode. Safe to call more than once.
///
/// # Errors
///
/// Returns `Err` if raw mode cannot be disabled or the escape sequences fail.
pub fn leave() -> io::Result<()> {
    disable_raw_mode()?;
    execute!(io::stderr(), LeaveAlternateScreen, DisableMouseCapture)
}

/// Set once the process is asked to stop from outside: SIGTERM, or SIGHUP when the
/// controlling terminal goes away.
#[derive(Debug, Clone)]
pub struct ShutdownFlag(Arc<AtomicBool>);

impl ShutdownFlag {
    /// Registers the flag for SIGTERM and SIGHUP.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the OS refuses either handler.
    pub fn register() -> io::Result<Self> {
        let flag = Arc::new(AtomicBool::new(false));
        for signal in [SIGTERM, SIGHUP] {
            signal_hook::flag::register(signal, Arc::clone(&flag))?;
        }
        Ok(Self(flag))
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
