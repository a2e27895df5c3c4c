//! Command execution.
//!
//! The [`Executor`] is the part of the runner that other tasks may hold: it
//! carries the sending half of the inbound queue, the shared run state and the
//! timer registry.  It never touches the model.

use crate::command::{Command, SendMessage, Tick};
use crate::message::Message;
use crate::timers::{TimerKind, TimerRegistry};
use futures::future::BoxFuture;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

/// Runner lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RunState {
    NotStarted = 0,
    Running = 1,
    Stopping = 2,
    Stopped = 3,
}

impl RunState {
    fn from_u8(value: u8) -> RunState {
        match value {
            0 => RunState::NotStarted,
            1 => RunState::Running,
            2 => RunState::Stopping,
            _ => RunState::Stopped,
        }
    }
}

/// Atomic cell holding a [`RunState`].
#[derive(Debug)]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub(crate) fn new() -> Self {
        StateCell(AtomicU8::new(RunState::NotStarted as u8))
    }

    pub(crate) fn get(&self) -> RunState {
        RunState::from_u8(self.0.load(Ordering::SeqCst))
    }

    pub(crate) fn set(&self, state: RunState) {
        self.0.store(state as u8, Ordering::SeqCst);
    }

    /// Move `from -> to`; returns `false` if the state was not `from`.
    pub(crate) fn transition(&self, from: RunState, to: RunState) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }
}

/// Executes commands and feeds their messages into the inbound queue.
pub struct Executor<U> {
    tx: mpsc::UnboundedSender<Message<U>>,
    state: Arc<StateCell>,
    timers: TimerRegistry,
    runtime: Handle,
    step_timeout: Option<Duration>,
}

impl<U> Clone for Executor<U> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            state: Arc::clone(&self.state),
            timers: self.timers.clone(),
            runtime: self.runtime.clone(),
            step_timeout: self.step_timeout,
        }
    }
}

impl<U: Clone + Send + 'static> Executor<U> {
    pub(crate) fn new(
        tx: mpsc::UnboundedSender<Message<U>>,
        state: Arc<StateCell>,
        timers: TimerRegistry,
        runtime: Handle,
        step_timeout: Option<Duration>,
    ) -> Self {
        Self {
            tx,
            state,
            timers,
            runtime,
            step_timeout,
        }
    }

    pub fn state(&self) -> RunState {
        self.state.get()
    }

    pub fn is_running(&self) -> bool {
        self.state() == RunState::Running
    }

    /// Enqueue a message for the run loop.  Messages produced after the
    /// runner started stopping are dropped.
    pub fn deliver(&self, msg: Message<U>) {
        match self.state() {
            RunState::Stopping | RunState::Stopped => {
                trace!("runner stopped; dropping late message");
            }
            RunState::NotStarted | RunState::Running => {
                if self.tx.send(msg).is_err() {
                    trace!("inbound queue closed; dropping message");
                }
            }
        }
    }

    /// Request shutdown.  A no-op unless the runner is running.
    pub fn quit(&self) {
        if self.state.transition(RunState::Running, RunState::Stopping) {
            debug!("quit requested; runner stopping");
        }
    }

    /// Execute a command.
    ///
    /// Quit and zero-delay sends take effect before this returns.  Batch
    /// items are processed independently; everything that has to wait runs
    /// on a spawned task.
    pub fn process(&self, cmd: Command<U>) {
        trace!(kind = cmd.kind(), "processing command");
        match cmd {
            Command::Quit => self.quit(),
            Command::Send(SendMessage { message, delay }) if delay.is_zero() => {
                self.deliver(message)
            }
            Command::Batch(cmds) => {
                for cmd in cmds {
                    self.process(cmd);
                }
            }
            cmd @ (Command::Send(_) | Command::Tick(_) | Command::Sequence(_)) => {
                let exec = self.clone();
                self.runtime.spawn(async move { exec.settle(cmd).await });
            }
        }
    }

    /// Run a command to completion: resolves once every message it produces
    /// has been enqueued.
    fn settle(&self, cmd: Command<U>) -> BoxFuture<'static, ()> {
        let exec = self.clone();
        Box::pin(async move {
            match cmd {
                Command::Quit => exec.quit(),
                Command::Send(SendMessage { message, delay }) => {
                    if !delay.is_zero() {
                        let timer = exec.timers.schedule(TimerKind::DelayedSend, delay);
                        timer.expired().await;
                    }
                    exec.deliver(message);
                }
                Command::Tick(tick) => exec.fire_tick(tick).await,
                Command::Batch(cmds) => {
                    let handles: Vec<_> = cmds
                        .into_iter()
                        .map(|cmd| exec.runtime.spawn(exec.settle(cmd)))
                        .collect();
                    for result in futures::future::join_all(handles).await {
                        if let Err(err) = result {
                            warn!(error = %err, "batch item task failed");
                        }
                    }
                }
                Command::Sequence(cmds) => {
                    for (step, cmd) in cmds.into_iter().enumerate() {
                        exec.settle_step(step, cmd).await;
                    }
                }
            }
        })
    }

    async fn fire_tick(&self, tick: Tick<U>) {
        let timer = self.timers.schedule(TimerKind::Tick, tick.duration());
        timer.expired().await;
        drop(timer);
        match tick.fire() {
            Ok(msg) => self.deliver(msg),
            Err(err) => warn!(error = %err, "tick callback failed; no message delivered"),
        }
    }

    /// Await one sequence step.  The stall bound counts from the end of the
    /// step's own scheduled timers, so only waits past them are cut short.
    async fn settle_step(&self, step: usize, cmd: Command<U>) {
        let limit = self
            .step_timeout
            .map(|grace| scheduled_span(&cmd, Instant::now()).saturating_add(grace));
        let mut handle = self.runtime.spawn(self.settle(cmd));
        let Some(limit) = limit else {
            if let Err(err) = handle.await {
                warn!(step, error = %err, "sequence step task failed");
            }
            return;
        };
        match tokio::time::timeout(limit, &mut handle).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!(step, error = %err, "sequence step task failed"),
            Err(_) => warn!(
                step,
                timeout_ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                "sequence step did not settle in time; moving on"
            ),
        }
    }
}

/// How long `cmd` is scheduled to take: delays and tick durations, summed
/// along sequences and maxed across batches.  A timer whose deadline is out
/// of `Instant` range never fires and counts as zero.
fn scheduled_span<U>(cmd: &Command<U>, now: Instant) -> Duration {
    let fires = |d: Duration| {
        if now.checked_add(d).is_some() {
            d
        } else {
            Duration::ZERO
        }
    };
    match cmd {
        Command::Quit => Duration::ZERO,
        Command::Send(send) => fires(send.delay),
        Command::Tick(tick) => fires(tick.duration()),
        Command::Batch(cmds) => cmds
            .iter()
            .map(|cmd| scheduled_span(cmd, now))
            .max()
            .unwrap_or_default(),
        Command::Sequence(cmds) => cmds
            .iter()
            .fold(Duration::ZERO, |total, cmd| {
                total.saturating_add(scheduled_span(cmd, now))
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{self, batch, sequence};
    use crate::message::Message;

    fn executor(
        step_timeout: Option<Duration>,
    ) -> (Executor<u32>, mpsc::UnboundedReceiver<Message<u32>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let state = Arc::new(StateCell::new());
        state.set(RunState::Running);
        let exec = Executor::new(tx, state, TimerRegistry::new(), Handle::current(), step_timeout);
        (exec, rx)
    }

    async fn recv_n(rx: &mut mpsc::UnboundedReceiver<Message<u32>>, n: usize) -> Vec<u32> {
        let mut out = Vec::new();
        while out.len() < n {
            match tokio::time::timeout(Duration::from_secs(2), rx.recv()).await {
                Ok(Some(Message::User(v))) => out.push(v),
                Ok(Some(other)) => panic!("unexpected message {other:?}"),
                Ok(None) | Err(_) => break,
            }
        }
        out
    }

    #[tokio::test]
    async fn zero_delay_send_is_synchronous() {
        let (exec, mut rx) = executor(None);
        exec.process(command::send_message(Message::User(1)));
        assert!(matches!(rx.try_recv(), Ok(Message::User(1))));
    }

    #[tokio::test]
    async fn quit_only_while_running() {
        let (exec, _rx) = executor(None);
        exec.process(command::quit());
        assert_eq!(exec.state(), RunState::Stopping);

        exec.state.set(RunState::NotStarted);
        exec.process(command::quit());
        assert_eq!(exec.state(), RunState::NotStarted);
    }

    #[tokio::test]
    async fn messages_dropped_after_stop() {
        let (exec, mut rx) = executor(None);
        exec.quit();
        exec.deliver(Message::User(5));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn delayed_send_waits() {
        let (exec, mut rx) = executor(None);
        let start = Instant::now();
        exec.process(command::send_message_after(
            Message::User(7),
            Duration::from_millis(30),
        ));
        assert!(rx.try_recv().is_err());
        assert_eq!(recv_n(&mut rx, 1).await, vec![7]);
        assert!(start.elapsed() >= Duration::from_millis(30));
        assert!(exec.timers.is_empty());
    }

    #[tokio::test]
    async fn tick_fires_once_and_registers_timer() {
        let (exec, mut rx) = executor(None);
        exec.process(command::tick(Duration::from_millis(20), || Message::User(3)));
        tokio::task::yield_now().await;
        assert_eq!(exec.timers.len(), 1);
        assert_eq!(recv_n(&mut rx, 1).await, vec![3]);
        assert!(exec.timers.is_empty());
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn failing_tick_delivers_nothing() {
        let (exec, mut rx) = executor(None);
        exec.process(batch([
            command::try_tick(Duration::from_millis(5), || Err::<Message<u32>, _>("nope")),
            command::tick(Duration::from_millis(5), || panic!("tick exploded")),
            command::tick(Duration::from_millis(10), || Message::User(1)),
        ]));
        assert_eq!(recv_n(&mut rx, 1).await, vec![1]);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn batch_delivers_every_item() {
        let (exec, mut rx) = executor(None);
        exec.process(batch([
            command::send_message(Message::User(1)),
            command::tick(Duration::from_millis(5), || Message::User(2)),
            command::send_message_after(Message::User(3), Duration::from_millis(1)),
        ]));
        let mut got = recv_n(&mut rx, 3).await;
        got.sort();
        assert_eq!(got, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn sequence_waits_for_slow_tick() {
        let (exec, mut rx) = executor(None);
        exec.process(sequence([
            command::tick(Duration::from_millis(50), || Message::User(1)),
            command::send_message(Message::User(2)),
        ]));
        assert_eq!(recv_n(&mut rx, 2).await, vec![1, 2]);
    }

    #[tokio::test]
    async fn nested_sequences_keep_order() {
        let (exec, mut rx) = executor(None);
        let inner = sequence([
            command::tick(Duration::from_millis(20), || Message::User(2)),
            command::send_message(Message::User(3)),
        ]);
        exec.process(sequence([
            command::send_message(Message::User(1)),
            inner,
            batch([command::tick(Duration::from_millis(5), || Message::User(4))]),
            command::send_message(Message::User(5)),
        ]));
        assert_eq!(recv_n(&mut rx, 5).await, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn sequence_quit_stops_later_deliveries() {
        let (exec, mut rx) = executor(None);
        exec.process(sequence([
            command::send_message(Message::User(1)),
            command::quit(),
            command::send_message(Message::User(2)),
        ]));
        assert_eq!(recv_n(&mut rx, 2).await, vec![1]);
        assert_eq!(exec.state(), RunState::Stopping);
    }

    #[tokio::test]
    async fn stalled_step_is_bounded() {
        let (exec, mut rx) = executor(Some(Duration::from_millis(20)));
        exec.process(sequence([
            command::tick(Duration::MAX, || Message::User(1)),
            command::send_message(Message::User(2)),
        ]));
        assert_eq!(recv_n(&mut rx, 1).await, vec![2]);
        // The stalled tick is detached, not cancelled.
        assert_eq!(exec.timers.len(), 1);
    }

    #[tokio::test]
    async fn tick_longer_than_stall_bound_keeps_order() {
        let (exec, mut rx) = executor(Some(Duration::from_millis(20)));
        exec.process(sequence([
            command::tick(Duration::from_millis(80), || Message::User(1)),
            command::send_message(Message::User(2)),
        ]));
        assert_eq!(recv_n(&mut rx, 2).await, vec![1, 2]);
    }

    #[test]
    fn scheduled_span_sums_sequences_and_maxes_batches() {
        let ms = Duration::from_millis;
        let cmd: Command<u32> = sequence([
            command::tick(ms(10), || Message::User(1)),
            batch([
                command::tick(ms(30), || Message::User(2)),
                command::send_message_after(Message::User(3), ms(5)),
            ]),
            command::tick(Duration::MAX, || Message::User(4)),
            command::quit(),
        ]);
        assert_eq!(scheduled_span(&cmd, Instant::now()), ms(40));
        assert_eq!(scheduled_span(&command::send_message(Message::User(5)), Instant::now()), ms(0));
    }

    #[tokio::test]
    async fn deep_nesting_settles() {
        let (exec, mut rx) = executor(None);
        let mut cmd = command::send_message(Message::User(42));
        for depth in 0..64 {
            cmd = if depth % 2 == 0 {
                sequence([cmd])
            } else {
                batch([cmd])
            };
        }
        exec.process(cmd);
        assert_eq!(recv_n(&mut rx, 1).await, vec![42]);
    }

    #[tokio::test]
    async fn commands_can_run_twice() {
        let (exec, mut rx) = executor(None);
        let cmd = sequence([command::tick(Duration::from_millis(1), || Message::User(8))]);
        exec.process(cmd.clone());
        exec.process(cmd);
        assert_eq!(recv_n(&mut rx, 2).await, vec![8, 8]);
    }
}
