//! **teacup** -- A Bubble Tea-style Model-Update-View runtime for the terminal.
//!
//! This is the umbrella crate that re-exports everything you need to build a
//! teacup application from a single dependency:
//!
//! ```toml
//! [dependencies]
//! teacup = "0.1"
//! ```
//!
//! # Re-exports
//!
//! * All public items from [`teacup_core`] are available at the crate root
//!   ([`Model`], [`Message`], [`Command`], [`Runner`], [`command`], etc.).
//! * The [`term`] module re-exports [`teacup_term`] (the crossterm driver and
//!   line renderer).
//! * [`crossterm`] and [`tokio`] are re-exported so downstream crates do not
//!   need to depend on them directly.
//!
//! # Quick start
//!
//! ```ignore
//! use teacup::{command, Command, Message, Model};
//!
//! struct Hello;
//!
//! impl Model for Hello {
//!     type User = ();
//!
//!     fn update(&mut self, msg: Message<()>) -> Option<Command<()>> {
//!         msg.as_key().map(|_| command::quit())
//!     }
//!
//!     fn view(&self) -> String {
//!         "Hello, teacup! Press any key.".into()
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     teacup::run(Hello).await.unwrap();
//! }
//! ```

pub use teacup_core::*;
pub mod term {
    pub use teacup_term::*;
}

// Re-export dependencies for use in demos and downstream crates
pub use crossterm;
pub use tokio;

use std::io;
use std::path::Path;
use std::sync::Mutex;
use teacup_term::CrosstermDriver;
use tracing_subscriber::EnvFilter;

/// Run a teacup application on the real terminal with default options.
pub async fn run<M: Model>(model: M) -> Result<M, RunError> {
    run_with(model, RunnerOptions::default()).await
}

/// Run with custom options.
pub async fn run_with<M: Model>(model: M, options: RunnerOptions) -> Result<M, RunError> {
    Runner::new(model, CrosstermDriver::default(), options)?
        .run()
        .await
}

/// Whether stdin is an interactive terminal.
///
/// Useful for bailing out before [`run`] when input is piped.
pub fn is_tty() -> bool {
    CrosstermDriver::default().is_tty()
}

/// Send `tracing` output to a file.
///
/// A TUI owns the terminal, so logs can't go to stdout.  This installs a
/// global `tracing-subscriber` fmt subscriber that appends to `path`.  The
/// level defaults to `info` and can be changed through `RUST_LOG`.
///
/// This is the equivalent of Bubble Tea's `tea.LogToFile()`.
///
/// # Example
///
/// ```no_run
/// teacup::log_to_file("debug.log").unwrap();
/// tracing::info!("logging to a file");
/// ```
pub fn log_to_file(path: impl AsRef<Path>) -> io::Result<()> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_env_filter(filter)
        .try_init()
        .map_err(io::Error::other)
}
