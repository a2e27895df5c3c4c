use crate::message::Message;
use std::cell::Cell;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

/// A side effect returned from [`Model::update`](crate::Model::update) or
/// [`Model::init`](crate::Model::init).
///
/// Commands are inert descriptions: nothing happens until the
/// [`Runner`](crate::Runner) executes them.  Every command is [`Clone`], so a
/// command value can be stored, shared, and executed again.
///
/// The absence of an effect is `None` in an `Option<Command<U>>`; see
/// [`none`].
///
/// # Examples
///
/// ```rust,ignore
/// use std::time::Duration;
/// use teacup_core::{batch, command, Command, Message};
///
/// // Fire a message after half a second:
/// let cmd = command::tick(Duration::from_millis(500), || Message::User(Msg::Tick));
///
/// // Run two effects concurrently, skipping an absent one:
/// let cmd = batch![cmd, command::none(), command::quit()];
/// ```
#[derive(Clone)]
pub enum Command<U> {
    /// Stop the run loop.
    Quit,
    /// Run commands concurrently with no ordering between them.
    Batch(Vec<Command<U>>),
    /// Run commands one at a time; each settles before the next starts.
    Sequence(Vec<Command<U>>),
    /// Produce a message once a duration has elapsed.
    Tick(Tick<U>),
    /// Deliver a fixed message, optionally after a delay.
    Send(SendMessage<U>),
}

impl<U> Command<U> {
    /// The sub-commands of a batch or sequence.
    pub fn children(&self) -> &[Command<U>] {
        match self {
            Command::Batch(cmds) | Command::Sequence(cmds) => cmds,
            _ => &[],
        }
    }

    /// A short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Command::Quit => "quit",
            Command::Batch(_) => "batch",
            Command::Sequence(_) => "sequence",
            Command::Tick(_) => "tick",
            Command::Send(_) => "send",
        }
    }

    pub fn is_quit(&self) -> bool {
        matches!(self, Command::Quit)
    }
}

impl<U> fmt::Debug for Command<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Quit => f.write_str("Quit"),
            Command::Batch(cmds) => f.debug_tuple("Batch").field(cmds).finish(),
            Command::Sequence(cmds) => f.debug_tuple("Sequence").field(cmds).finish(),
            Command::Tick(tick) => f.debug_tuple("Tick").field(&tick.duration).finish(),
            Command::Send(send) => f.debug_tuple("Send").field(&send.delay).finish(),
        }
    }
}

/// A Tick or SendMessage callback failed to produce its message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallbackError {
    #[error("callback failed: {0}")]
    Failed(String),
    #[error("callback panicked: {0}")]
    Panicked(String),
}

type Callback<U> = Arc<dyn Fn() -> Result<Message<U>, CallbackError> + Send + Sync>;

/// A one-shot timer that produces a message on expiry.
pub struct Tick<U> {
    duration: Duration,
    callback: Callback<U>,
}

impl<U> Clone for Tick<U> {
    fn clone(&self) -> Self {
        Self {
            duration: self.duration,
            callback: Arc::clone(&self.callback),
        }
    }
}

impl<U> Tick<U> {
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Invoke the callback.  A panic inside the callback is caught and
    /// reported as [`CallbackError::Panicked`].
    ///
    /// While the callback runs, [`callback_in_progress`] is `true` on this
    /// thread.
    pub fn fire(&self) -> Result<Message<U>, CallbackError> {
        let _firing = FiringGuard::enter();
        match catch_unwind(AssertUnwindSafe(|| (self.callback)())) {
            Ok(result) => result,
            Err(payload) => Err(CallbackError::Panicked(panic_message(payload.as_ref()))),
        }
    }
}

thread_local! {
    static FIRING: Cell<bool> = const { Cell::new(false) };
}

/// Whether the current thread is inside [`Tick::fire`].
///
/// A panic raised there is caught and turned into a [`CallbackError`], so
/// panic hooks that tear down process-wide state (such as the terminal) should
/// leave it alone while this returns `true`.
pub fn callback_in_progress() -> bool {
    FIRING.with(Cell::get)
}

/// Sets the firing flag and puts back the previous value on drop, unwinding
/// included.
struct FiringGuard(bool);

impl FiringGuard {
    fn enter() -> Self {
        FiringGuard(FIRING.with(|f| f.replace(true)))
    }
}

impl Drop for FiringGuard {
    fn drop(&mut self) {
        let previous = self.0;
        FIRING.with(|f| f.set(previous));
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Delivers a fixed message after `delay` (zero means as soon as possible).
#[derive(Clone)]
pub struct SendMessage<U> {
    pub message: Message<U>,
    pub delay: Duration,
}

/// A flattened, absence-filtered list of commands.
///
/// This is the normalization step behind [`batch`] and [`sequence`]: each
/// argument may be a single command, an absent command, or a collection of
/// either, and converts into `Commands` through [`From`].
pub struct Commands<U>(Vec<Command<U>>);

impl<U> Commands<U> {
    pub fn into_vec(self) -> Vec<Command<U>> {
        self.0
    }
}

impl<U> From<Command<U>> for Commands<U> {
    fn from(cmd: Command<U>) -> Self {
        Commands(vec![cmd])
    }
}

impl<U> From<Option<Command<U>>> for Commands<U> {
    fn from(cmd: Option<Command<U>>) -> Self {
        Commands(cmd.into_iter().collect())
    }
}

impl<U> From<Vec<Command<U>>> for Commands<U> {
    fn from(cmds: Vec<Command<U>>) -> Self {
        Commands(cmds)
    }
}

impl<U> From<Vec<Option<Command<U>>>> for Commands<U> {
    fn from(cmds: Vec<Option<Command<U>>>) -> Self {
        Commands(cmds.into_iter().flatten().collect())
    }
}

impl<U, const N: usize> From<[Option<Command<U>>; N]> for Commands<U> {
    fn from(cmds: [Option<Command<U>>; N]) -> Self {
        Commands(cmds.into_iter().flatten().collect())
    }
}

impl<U, const N: usize> From<[Command<U>; N]> for Commands<U> {
    fn from(cmds: [Command<U>; N]) -> Self {
        Commands(cmds.into_iter().collect())
    }
}

fn flatten<U, I, T>(items: I) -> Vec<Command<U>>
where
    I: IntoIterator<Item = T>,
    T: Into<Commands<U>>,
{
    items.into_iter().flat_map(|item| item.into().0).collect()
}

/// No effect.
pub fn none<U>() -> Option<Command<U>> {
    None
}

/// Stop the run loop.
pub fn quit<U>() -> Command<U> {
    Command::Quit
}

/// Run commands concurrently.
///
/// Arguments are flattened one level and absent commands are dropped; an
/// empty result is still a valid (no-op) batch.  Use the [`batch!`] macro to
/// mix single commands, options, and lists in one call.
pub fn batch<U, I, T>(items: I) -> Command<U>
where
    I: IntoIterator<Item = T>,
    T: Into<Commands<U>>,
{
    Command::Batch(flatten(items))
}

/// Run commands in order, each settling before the next starts.
///
/// Flattens its arguments the same way as [`batch`].
pub fn sequence<U, I, T>(items: I) -> Command<U>
where
    I: IntoIterator<Item = T>,
    T: Into<Commands<U>>,
{
    Command::Sequence(flatten(items))
}

/// One-shot timer: fires once after `duration`, calling `callback` for the
/// message to deliver.
pub fn tick<U>(
    duration: Duration,
    callback: impl Fn() -> Message<U> + Send + Sync + 'static,
) -> Command<U> {
    Command::Tick(Tick {
        duration,
        callback: Arc::new(move || Ok(callback())),
    })
}

/// One-shot timer whose callback may fail.  A failed callback delivers no
/// message.
pub fn try_tick<U, E>(
    duration: Duration,
    callback: impl Fn() -> Result<Message<U>, E> + Send + Sync + 'static,
) -> Command<U>
where
    E: fmt::Display,
{
    Command::Tick(Tick {
        duration,
        callback: Arc::new(move || callback().map_err(|e| CallbackError::Failed(e.to_string()))),
    })
}

/// Deliver `message` as soon as possible.
pub fn send_message<U>(message: Message<U>) -> Command<U> {
    send_message_after(message, Duration::ZERO)
}

/// Deliver `message` after `delay`.
pub fn send_message_after<U>(message: Message<U>, delay: Duration) -> Command<U> {
    Command::Send(SendMessage { message, delay })
}

/// Build a [`Command::Batch`] from heterogeneous arguments.
///
/// Each argument may be a `Command`, an `Option<Command>`, or a list of
/// either.
///
/// ```rust,ignore
/// let cmd = batch![a, vec![b, c], None, d];
/// ```
#[macro_export]
macro_rules! batch {
    ($($item:expr),* $(,)?) => {
        $crate::command::Command::Batch(
            ::std::iter::empty()
                $(.chain($crate::command::Commands::from($item).into_vec()))*
                .collect()
        )
    };
}

/// Build a [`Command::Sequence`] from heterogeneous arguments, flattened like
/// [`batch!`].
#[macro_export]
macro_rules! sequence {
    ($($item:expr),* $(,)?) => {
        $crate::command::Command::Sequence(
            ::std::iter::empty()
                $(.chain($crate::command::Commands::from($item).into_vec()))*
                .collect()
        )
    };
}
