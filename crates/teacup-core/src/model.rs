use crate::command::Command;
use crate::message::Message;

/// The application trait, following the [Elm Architecture].
///
/// The [`Runner`](crate::Runner) owns the model once it starts and drives an
/// **init -> update -> view** cycle on a single thread:
///
/// 1. [`init`](Model::init) runs once and may return a [`Command`] for early
///    side effects.
/// 2. Each queued [`Message`] is handed to [`update`](Model::update), which
///    mutates the state and may return a [`Command`].
/// 3. [`view`](Model::view) renders the state to a string.
///
/// Every method has a default: `init` and `update` return no command and
/// leave the state untouched, and `view` renders nothing.  Application
/// errors are ordinary data: model them as a message or command and handle
/// them in `update`.
///
/// # Example
///
/// ```rust,ignore
/// use teacup_core::{command, Command, Message, Model};
///
/// struct Counter {
///     count: i32,
/// }
///
/// impl Model for Counter {
///     type User = ();
///
///     fn update(&mut self, msg: Message<()>) -> Option<Command<()>> {
///         match msg.as_key().map(|k| k.to_string()).as_deref() {
///             Some("up") => self.count += 1,
///             Some("down") => self.count -= 1,
///             Some("q") => return Some(command::quit()),
///             _ => {}
///         }
///         command::none()
///     }
///
///     fn view(&self) -> String {
///         format!("Count: {}", self.count)
///     }
/// }
/// ```
///
/// [Elm Architecture]: https://guide.elm-lang.org/architecture/
pub trait Model: Send + 'static {
    /// Application-defined payload carried by [`Message::User`].
    ///
    /// Use `()` when the application has no messages of its own.
    type User: Clone + Send + 'static;

    /// Produce an optional startup command.  Called once, before the first
    /// message is processed.
    fn init(&mut self) -> Option<Command<Self::User>> {
        None
    }

    /// Process a message and return an optional command for side effects.
    fn update(&mut self, msg: Message<Self::User>) -> Option<Command<Self::User>> {
        let _ = msg;
        None
    }

    /// Render the current state.  The runtime calls this after messages have
    /// been processed, at most once per frame.
    fn view(&self) -> String {
        String::new()
    }
}
