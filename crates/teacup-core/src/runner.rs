use crate::command::Command;
use crate::config::{ConfigError, MouseMode, RunnerOptions};
use crate::decode::{decode, RawEvent};
use crate::driver::{DriverError, Renderer, TerminalDriver};
use crate::exec::{Executor, RunState, StateCell};
use crate::message::{Message, WindowSizeMsg};
use crate::model::Model;
use crate::timers::{PendingTimer, TimerRegistry};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, error, trace, warn};

/// Errors that can occur while starting or running a [`Runner`].
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("terminal driver failed: {0}")]
    Driver(#[from] DriverError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The runner was created outside a tokio runtime.
    #[error("a runner must be created inside a tokio runtime")]
    NoRuntime,
    #[error("run loop task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// A cloneable handle for talking to a [`Runner`] from other tasks or
/// threads.
///
/// * [`send`](RunnerHandle::send) -- inject a message into the update cycle.
/// * [`quit`](RunnerHandle::quit) -- ask the runner to stop.
///
/// Obtain one with [`Runner::handle`] before calling [`Runner::run`].
pub struct RunnerHandle<U> {
    exec: Executor<U>,
}

impl<U> Clone for RunnerHandle<U> {
    fn clone(&self) -> Self {
        Self {
            exec: self.exec.clone(),
        }
    }
}

impl<U: Clone + Send + 'static> RunnerHandle<U> {
    /// Enqueue a message.  Never blocks.  Messages sent before the runner
    /// starts wait in the queue; messages sent after it stops are dropped.
    pub fn send(&self, msg: Message<U>) {
        self.exec.deliver(msg);
    }

    /// Same as the model returning a quit command.
    pub fn quit(&self) {
        self.exec.quit();
    }

    pub fn is_running(&self) -> bool {
        self.exec.is_running()
    }

    pub fn state(&self) -> RunState {
        self.exec.state()
    }
}

/// Terminal modes the runner switched on and must switch off again.
#[derive(Debug, Default)]
struct TerminalModes {
    raw: bool,
    cursor_hidden: bool,
    alt_screen: bool,
    mouse: bool,
    bracketed_paste: bool,
    report_focus: bool,
    input_reader: bool,
}

/// The execution engine.  Owns the [`Model`], the terminal driver and its
/// renderer, and drives the init/update/view loop until quit.
///
/// # Example
///
/// ```rust,ignore
/// use teacup_core::{Runner, RunnerOptions, RunError};
///
/// #[tokio::main]
/// async fn main() -> Result<(), RunError> {
///     let runner = Runner::new(MyApp::default(), driver, RunnerOptions::default())?;
///     let model = runner.run().await?;
///     // `model` is the final state after quit
///     Ok(())
/// }
/// ```
pub struct Runner<M: Model, D: TerminalDriver> {
    model: M,
    driver: D,
    renderer: D::Renderer,
    options: RunnerOptions,
    width: u16,
    height: u16,
    rx: mpsc::UnboundedReceiver<Message<M::User>>,
    exec: Executor<M::User>,
    state: Arc<StateCell>,
    timers: TimerRegistry,
    modes: TerminalModes,
    dirty: bool,
}

impl<M: Model, D: TerminalDriver> Runner<M, D> {
    /// Create a runner.  Must be called inside a tokio runtime; command
    /// tasks are spawned onto it.
    pub fn new(model: M, mut driver: D, options: RunnerOptions) -> Result<Self, RunError> {
        let runtime = Handle::try_current().map_err(|_| RunError::NoRuntime)?;
        let renderer = driver.create_renderer()?;
        let (tx, rx) = mpsc::unbounded_channel();
        let state = Arc::new(StateCell::new());
        let timers = TimerRegistry::new();
        let exec = Executor::new(
            tx,
            Arc::clone(&state),
            timers.clone(),
            runtime,
            options.sequence_step_timeout,
        );
        Ok(Self {
            model,
            driver,
            renderer,
            options,
            width: 0,
            height: 0,
            rx,
            exec,
            state,
            timers,
            modes: TerminalModes::default(),
            dirty: false,
        })
    }

    pub fn handle(&self) -> RunnerHandle<M::User> {
        RunnerHandle {
            exec: self.exec.clone(),
        }
    }

    /// Enqueue a message from outside the update cycle.
    pub fn send(&self, msg: Message<M::User>) {
        self.exec.deliver(msg);
    }

    /// Execute a command as if `update` had returned it.
    pub fn process(&self, cmd: Command<M::User>) {
        self.exec.process(cmd);
    }

    pub fn state(&self) -> RunState {
        self.state.get()
    }

    pub fn is_running(&self) -> bool {
        self.exec.is_running()
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn options(&self) -> &RunnerOptions {
        &self.options
    }

    /// Current viewport as `(width, height)`.
    pub fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    /// Timers scheduled by ticks and delayed sends that have not fired yet.
    pub fn pending_timers(&self) -> Vec<PendingTimer> {
        self.timers.snapshot()
    }

    /// Run until quit and return the final model.
    ///
    /// The loop runs on a blocking thread since driver polls block.  The
    /// terminal is restored before this returns, on success or failure.
    pub async fn run(self) -> Result<M, RunError> {
        tokio::task::spawn_blocking(move || self.run_blocking()).await?
    }

    fn run_blocking(mut self) -> Result<M, RunError> {
        if let Err(err) = self.start() {
            error!(error = %err, "terminal setup failed");
            self.restore();
            self.state.set(RunState::Stopped);
            return Err(err.into());
        }

        let result = self.event_loop();
        match &result {
            Ok(()) => {
                if self.dirty {
                    if let Err(err) = self.render() {
                        warn!(error = %err, "final frame failed");
                    }
                }
            }
            Err(err) => {
                error!(error = %err, "terminal driver failed; shutting down");
                self.exec.quit();
            }
        }

        self.restore();
        self.state.set(RunState::Stopped);
        debug!(pending_timers = self.timers.len(), "runner stopped");
        result?;
        Ok(self.model)
    }

    fn start(&mut self) -> Result<(), DriverError> {
        debug!(options = ?self.options, "setting up terminal");
        self.driver.enter_raw_mode()?;
        self.modes.raw = true;
        self.driver.hide_cursor()?;
        self.modes.cursor_hidden = true;
        if self.options.alt_screen {
            self.driver.enter_alt_screen()?;
            self.modes.alt_screen = true;
        }
        if let Some(title) = &self.options.window_title {
            best_effort("set_window_title", self.driver.set_window_title(title));
        }
        if let Some(mode) = self.options.mouse_mode {
            match mode {
                MouseMode::CellMotion => self.driver.enable_mouse_cell_motion()?,
                MouseMode::AllMotion => self.driver.enable_mouse_all_motion()?,
            }
            self.modes.mouse = true;
        }
        if self.options.bracketed_paste {
            self.driver.enable_bracketed_paste()?;
            self.modes.bracketed_paste = true;
        }
        if self.options.report_focus {
            self.driver.enable_report_focus()?;
            self.modes.report_focus = true;
        }
        self.driver.start_input_reader()?;
        self.modes.input_reader = true;
        self.renderer.set_alt_screen(self.options.alt_screen);

        let (width, height) = self.driver.size()?;
        self.width = width;
        self.height = height;
        self.renderer.set_size(width, height);

        self.state.set(RunState::Running);
        debug!(width, height, "runner running");

        if let Some(cmd) = self.model.init() {
            self.exec.process(cmd);
        }
        self.exec.deliver(WindowSizeMsg::new(width, height).into());
        self.dirty = true;
        Ok(())
    }

    /// Undo every terminal mode that was switched on, in reverse order.
    /// Keeps going when a step fails.
    fn restore(&mut self) {
        let modes = std::mem::take(&mut self.modes);
        if modes.input_reader {
            best_effort("stop_input_reader", self.driver.stop_input_reader());
        }
        if modes.report_focus {
            best_effort("disable_report_focus", self.driver.disable_report_focus());
        }
        if modes.bracketed_paste {
            best_effort("disable_bracketed_paste", self.driver.disable_bracketed_paste());
        }
        if modes.mouse {
            best_effort("disable_mouse", self.driver.disable_mouse());
        }
        if modes.alt_screen {
            best_effort("exit_alt_screen", self.driver.exit_alt_screen());
        }
        if modes.cursor_hidden {
            best_effort("show_cursor", self.driver.show_cursor());
        }
        if modes.raw {
            best_effort("exit_raw_mode", self.driver.exit_raw_mode());
        }
        debug!("terminal restored");
    }

    fn event_loop(&mut self) -> Result<(), DriverError> {
        let frame = self.options.frame_interval();
        let mut next_frame = Instant::now();

        while self.exec.is_running() {
            if let Some(raw) = self.driver.poll_event(self.poll_wait(next_frame, frame))? {
                self.enqueue_input(&raw);
            }

            self.drain();
            if !self.exec.is_running() {
                break;
            }

            if self.dirty && Instant::now() >= next_frame {
                self.render()?;
                next_frame = Instant::now() + frame;
            }
        }
        Ok(())
    }

    /// How long the next input poll may block: not at all while messages
    /// are queued, until the next frame while a repaint is due, and one
    /// frame otherwise.  Capped by [`RunnerOptions::input_wait`].
    fn poll_wait(&self, next_frame: Instant, frame: Duration) -> Duration {
        let wait = if !self.rx.is_empty() {
            Duration::ZERO
        } else if self.dirty {
            next_frame.saturating_duration_since(Instant::now())
        } else {
            frame
        };
        wait.min(self.options.input_wait())
    }

    fn enqueue_input(&self, raw: &RawEvent) {
        match decode::<M::User>(Some(raw)) {
            Ok(Some(msg)) => self.exec.deliver(msg),
            Ok(None) => trace!("ignoring unrecognized input event"),
            Err(err) => warn!(error = %err, "discarding malformed input event"),
        }
    }

    /// Process the messages queued when the drain starts, in FIFO order.
    fn drain(&mut self) {
        for _ in 0..self.rx.len() {
            let Ok(msg) = self.rx.try_recv() else { break };
            self.dispatch(msg);
            if !self.exec.is_running() {
                break;
            }
        }
    }

    fn dispatch(&mut self, msg: Message<M::User>) {
        trace!(kind = msg.kind(), "dispatching message");
        match &msg {
            Message::Quit => {
                self.exec.quit();
                return;
            }
            Message::WindowSize(size) => {
                self.width = size.width;
                self.height = size.height;
                self.renderer.set_size(size.width, size.height);
            }
            _ => {}
        }
        if let Some(cmd) = self.model.update(msg) {
            self.exec.process(cmd);
        }
        self.dirty = true;
    }

    fn render(&mut self) -> Result<(), DriverError> {
        let view = self.model.view();
        self.renderer.render(&view)?;
        self.dirty = false;
        Ok(())
    }
}

fn best_effort(step: &'static str, result: Result<(), DriverError>) {
    if let Err(err) = result {
        warn!(step, error = %err, "terminal restore step failed");
    }
}
