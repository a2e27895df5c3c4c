//! Test doubles: a headless [`TestProgram`] and a [`ScriptedDriver`] for
//! running a real [`Runner`](crate::Runner) without a terminal.

use crate::command::{Command, SendMessage};
use crate::decode::RawEvent;
use crate::driver::{DriverError, Renderer, TerminalDriver};
use crate::message::Message;
use crate::model::Model;
use serde_json::json;
use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// A headless test harness that drives a [`Model`] without a runner.
///
/// `TestProgram` lets you exercise the init/update/view cycle in a plain
/// `#[test]` function -- no tokio runtime or TTY required.  Zero-delay
/// sends are collected (batch and sequence items in list order) and can be
/// flushed with [`drain_messages`](TestProgram::drain_messages); ticks and
/// delayed sends are ignored.  A quit command or [`Message::Quit`] only sets
/// [`quit_requested`](TestProgram::quit_requested).
///
/// # Example
///
/// ```rust,ignore
/// use teacup_core::testing::TestProgram;
///
/// let mut prog = TestProgram::new(Counter::default()); // calls init
/// prog.send(Message::User(CounterMsg::Increment));     // triggers update
/// prog.send(Message::User(CounterMsg::Increment));
/// assert_eq!(prog.model().count, 2);
/// assert!(prog.view().contains("Count: 2"));
/// ```
pub struct TestProgram<M: Model> {
    model: M,
    pending_messages: Vec<Message<M::User>>,
    quit_requested: bool,
}

impl<M: Model> TestProgram<M> {
    /// Create a test program and call [`Model::init`].
    ///
    /// Zero-delay sends produced by `init` are queued; call
    /// [`drain_messages`](TestProgram::drain_messages) to process them.
    pub fn new(mut model: M) -> Self {
        let init_cmd = model.init();
        let mut program = Self {
            model,
            pending_messages: Vec::new(),
            quit_requested: false,
        };
        program.collect_sync_messages(init_cmd);
        program
    }

    /// Send a message, triggering a single update cycle.
    pub fn send(&mut self, msg: Message<M::User>) {
        if msg.is_quit() {
            self.quit_requested = true;
            return;
        }
        let cmd = self.model.update(msg);
        self.collect_sync_messages(cmd);
    }

    /// Process pending messages until no update produces new ones.
    pub fn drain_messages(&mut self) {
        while !self.pending_messages.is_empty() {
            let messages: Vec<_> = self.pending_messages.drain(..).collect();
            for msg in messages {
                self.send(msg);
            }
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Mutable access for arranging state without going through `update`.
    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    pub fn view(&self) -> String {
        self.model.view()
    }

    pub fn pending(&self) -> &[Message<M::User>] {
        &self.pending_messages
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    fn collect_sync_messages(&mut self, cmd: Option<Command<M::User>>) {
        let Some(cmd) = cmd else { return };
        match cmd {
            Command::Quit => self.quit_requested = true,
            Command::Send(SendMessage { message, delay }) if delay.is_zero() => {
                self.pending_messages.push(message);
            }
            Command::Batch(cmds) | Command::Sequence(cmds) => {
                for cmd in cmds {
                    self.collect_sync_messages(Some(cmd));
                }
            }
            // Timers can't be executed synchronously in tests
            Command::Send(_) | Command::Tick(_) => {}
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Shared log of driver/renderer calls and painted frames.
#[derive(Debug, Clone, Default)]
pub struct Recording {
    calls: Arc<Mutex<Vec<String>>>,
    frames: Arc<Mutex<Vec<String>>>,
}

impl Recording {
    /// Every call made, in order, e.g. `"enter_raw_mode"` or `"set_size 80x24"`.
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    pub fn frames(&self) -> Vec<String> {
        lock(&self.frames).clone()
    }

    pub fn last_frame(&self) -> Option<String> {
        lock(&self.frames).last().cloned()
    }

    pub fn called(&self, name: &str) -> bool {
        lock(&self.calls).iter().any(|c| c == name)
    }

    fn record(&self, call: impl Into<String>) {
        lock(&self.calls).push(call.into());
    }
}

/// One step of a [`ScriptedDriver`] input script.
#[derive(Debug, Clone)]
pub enum ScriptStep {
    /// Returned by the next poll.
    Event(RawEvent),
    /// The next poll sleeps this long and returns no event.
    Pause(Duration),
    /// The next poll fails with [`DriverError::Closed`].
    Fail,
}

/// A [`TerminalDriver`] fed from a script of raw events.
///
/// Every call is recorded in a [`Recording`] shared with the renderer it
/// creates.  Once the script runs out, polls wait out their timeout and
/// return nothing.
#[derive(Debug)]
pub struct ScriptedDriver {
    script: VecDeque<ScriptStep>,
    raw_input: VecDeque<Vec<u8>>,
    size: (u16, u16),
    tty: bool,
    fail_on: Option<&'static str>,
    recording: Recording,
}

impl Default for ScriptedDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedDriver {
    pub fn new() -> Self {
        Self {
            script: VecDeque::new(),
            raw_input: VecDeque::new(),
            size: (80, 24),
            tty: true,
            fail_on: None,
            recording: Recording::default(),
        }
    }

    pub fn with_size(mut self, width: u16, height: u16) -> Self {
        self.size = (width, height);
        self
    }

    /// Report input as coming from a pipe instead of a terminal.
    pub fn not_a_tty(mut self) -> Self {
        self.tty = false;
        self
    }

    /// Make the named driver call fail with an I/O error.
    pub fn fail_on(mut self, call: &'static str) -> Self {
        self.fail_on = Some(call);
        self
    }

    pub fn event(mut self, raw: RawEvent) -> Self {
        self.script.push_back(ScriptStep::Event(raw));
        self
    }

    /// Queue a rune key press for each character of `text`.
    pub fn keys(mut self, text: &str) -> Self {
        for c in text.chars() {
            self.script.push_back(ScriptStep::Event(
                json!({ "type": "key", "key_type": -1, "runes": [c as u32] }),
            ));
        }
        self
    }

    pub fn pause(mut self, duration: Duration) -> Self {
        self.script.push_back(ScriptStep::Pause(duration));
        self
    }

    pub fn fail_poll(mut self) -> Self {
        self.script.push_back(ScriptStep::Fail);
        self
    }

    /// Queue a chunk for [`read_raw`](TerminalDriver::read_raw).
    pub fn raw_bytes(mut self, bytes: &[u8]) -> Self {
        self.raw_input.push_back(bytes.to_vec());
        self
    }

    /// A handle on the call log, usable after the driver moves into a runner.
    pub fn recording(&self) -> Recording {
        self.recording.clone()
    }

    fn call(&self, name: &'static str) -> Result<(), DriverError> {
        self.recording.record(name);
        if self.fail_on == Some(name) {
            return Err(DriverError::Io(io::Error::other(format!(
                "scripted failure: {name}"
            ))));
        }
        Ok(())
    }
}

impl TerminalDriver for ScriptedDriver {
    type Renderer = RecordingRenderer;

    fn size(&mut self) -> Result<(u16, u16), DriverError> {
        self.call("size")?;
        Ok(self.size)
    }

    fn string_width(&self, text: &str) -> usize {
        text.chars().count()
    }

    fn enter_raw_mode(&mut self) -> Result<(), DriverError> {
        self.call("enter_raw_mode")
    }

    fn exit_raw_mode(&mut self) -> Result<(), DriverError> {
        self.call("exit_raw_mode")
    }

    fn enter_alt_screen(&mut self) -> Result<(), DriverError> {
        self.call("enter_alt_screen")
    }

    fn exit_alt_screen(&mut self) -> Result<(), DriverError> {
        self.call("exit_alt_screen")
    }

    fn show_cursor(&mut self) -> Result<(), DriverError> {
        self.call("show_cursor")
    }

    fn hide_cursor(&mut self) -> Result<(), DriverError> {
        self.call("hide_cursor")
    }

    fn enable_mouse_cell_motion(&mut self) -> Result<(), DriverError> {
        self.call("enable_mouse_cell_motion")
    }

    fn enable_mouse_all_motion(&mut self) -> Result<(), DriverError> {
        self.call("enable_mouse_all_motion")
    }

    fn disable_mouse(&mut self) -> Result<(), DriverError> {
        self.call("disable_mouse")
    }

    fn enable_bracketed_paste(&mut self) -> Result<(), DriverError> {
        self.call("enable_bracketed_paste")
    }

    fn disable_bracketed_paste(&mut self) -> Result<(), DriverError> {
        self.call("disable_bracketed_paste")
    }

    fn enable_report_focus(&mut self) -> Result<(), DriverError> {
        self.call("enable_report_focus")
    }

    fn disable_report_focus(&mut self) -> Result<(), DriverError> {
        self.call("disable_report_focus")
    }

    fn is_tty(&self) -> bool {
        self.tty
    }

    fn set_window_title(&mut self, title: &str) -> Result<(), DriverError> {
        self.call("set_window_title")?;
        self.recording.record(format!("title {title}"));
        Ok(())
    }

    fn start_input_reader(&mut self) -> Result<(), DriverError> {
        self.call("start_input_reader")
    }

    fn stop_input_reader(&mut self) -> Result<(), DriverError> {
        self.call("stop_input_reader")
    }

    fn read_raw(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, DriverError> {
        self.call("read_raw")?;
        let Some(mut chunk) = self.raw_input.pop_front() else {
            std::thread::sleep(timeout);
            return Ok(0);
        };
        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        if n < chunk.len() {
            self.raw_input.push_front(chunk.split_off(n));
        }
        Ok(n)
    }

    fn poll_event(&mut self, timeout: Duration) -> Result<Option<RawEvent>, DriverError> {
        if self.fail_on == Some("poll_event") {
            return self.call("poll_event").map(|()| None);
        }
        match self.script.pop_front() {
            Some(ScriptStep::Event(raw)) => Ok(Some(raw)),
            Some(ScriptStep::Pause(duration)) => {
                std::thread::sleep(duration);
                Ok(None)
            }
            Some(ScriptStep::Fail) => Err(DriverError::Closed),
            None => {
                std::thread::sleep(timeout);
                Ok(None)
            }
        }
    }

    fn create_renderer(&mut self) -> Result<RecordingRenderer, DriverError> {
        self.call("create_renderer")?;
        Ok(RecordingRenderer {
            recording: self.recording.clone(),
        })
    }
}

/// A [`Renderer`] that stores every painted view.
#[derive(Debug, Clone, Default)]
pub struct RecordingRenderer {
    recording: Recording,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recording(&self) -> Recording {
        self.recording.clone()
    }
}

impl Renderer for RecordingRenderer {
    fn render(&mut self, view: &str) -> Result<(), DriverError> {
        self.recording.record("render");
        lock(&self.recording.frames).push(view.to_string());
        Ok(())
    }

    fn set_size(&mut self, width: u16, height: u16) {
        self.recording.record(format!("set_size {width}x{height}"));
    }

    fn set_alt_screen(&mut self, enabled: bool) {
        self.recording.record(format!("set_alt_screen {enabled}"));
    }

    fn clear(&mut self) -> Result<(), DriverError> {
        self.recording.record("clear");
        Ok(())
    }
}
