//! Command/event runtime for the **teacup** TUI framework.
//!
//! `teacup-core` provides the message and command types, the input decoder,
//! and the runner that power every teacup application.  The design follows
//! the [Elm Architecture]: your program is expressed as an
//! **init -> update -> view** cycle, with side effects pushed to the edges
//! through [`Command`]s.
//!
//! # Key types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`Model`] | Application trait (init / update / view) |
//! | [`Message`] | Input to `update`: keys, mouse, resize, focus, quit, or your own payload |
//! | [`Command`] | Describes a side effect to be executed by the runner |
//! | [`Runner`] | Owns the model and drives the loop over a [`TerminalDriver`] |
//! | [`decode`] | Turns a raw driver event descriptor into a [`Message`] |
//! | [`TestProgram`](testing::TestProgram) | Headless harness for unit-testing a [`Model`] |
//!
//! # Architecture
//!
//! 1. **init** -- [`Model::init`] may return a [`Command`] to kick off early
//!    work.  The runner then delivers the terminal size as a
//!    [`Message::WindowSize`].
//! 2. **event** -- Input polled from the driver, messages produced by
//!    commands, and [`RunnerHandle::send`] calls all land on one queue.
//! 3. **update** -- The runner hands each queued message to
//!    [`Model::update`], which mutates state and optionally returns a
//!    [`Command`].  Only the run loop ever touches the model.
//! 4. **view** -- At most once per frame the runner renders
//!    [`Model::view`] through the driver's [`Renderer`].
//! 5. **repeat** -- Steps 2-4 repeat until a quit.
//!
//! # Quick example
//!
//! ```ignore
//! use teacup_core::{command, Command, Message, Model};
//!
//! struct Counter { count: i32 }
//!
//! #[derive(Clone)]
//! enum Msg { Increment, Decrement }
//!
//! impl Model for Counter {
//!     type User = Msg;
//!
//!     fn update(&mut self, msg: Message<Msg>) -> Option<Command<Msg>> {
//!         match msg {
//!             Message::User(Msg::Increment) => self.count += 1,
//!             Message::User(Msg::Decrement) => self.count -= 1,
//!             Message::Key(key) if key.to_string() == "q" => return Some(command::quit()),
//!             _ => {}
//!         }
//!         command::none()
//!     }
//!
//!     fn view(&self) -> String {
//!         format!("Count: {}", self.count)
//!     }
//! }
//! ```
//!
//! [Elm Architecture]: https://guide.elm-lang.org/architecture/

pub mod command;
pub mod config;
pub mod decode;
pub mod driver;
mod exec;
pub mod message;
pub mod model;
pub mod runner;
pub mod testing;
pub mod timers;

pub use command::{CallbackError, Command, Commands, SendMessage, Tick};
pub use config::{ConfigError, MouseMode, RunnerOptions};
pub use decode::{decode, DecodeError, RawEvent};
pub use driver::{DriverError, Renderer, TerminalDriver};
pub use exec::RunState;
pub use message::{
    KeyMsg, KeyType, Message, MouseAction, MouseButton, MouseMsg, WindowSizeMsg,
};
pub use model::Model;
pub use runner::{RunError, Runner, RunnerHandle};
pub use timers::{PendingTimer, TimerKind};
