//! # Timers Example
//!
//! Demonstrates the command algebra:
//! - `command::tick` for a self-rescheduling clock
//! - `sequence!` to run a countdown one step at a time
//! - `batch!` to start independent effects together
//! - A `RunnerHandle` feeding messages in from another task
//!
//! Options can be supplied as TOML in `TEACUP_OPTIONS` (e.g.
//! `TEACUP_OPTIONS='fps = 30'`).  Logs go to `timers.log`.
//!
//! Run with: `cargo run --example timers`

use std::time::Duration;
use teacup::term::CrosstermDriver;
use teacup::{
    batch, command, sequence, Command, Message, Model, RunState, Runner, RunnerOptions,
};

#[derive(Debug, Clone)]
enum Msg {
    Tick,
    Countdown(u32),
    Liftoff,
    Ping(u64),
}

#[derive(Default)]
struct Timers {
    ticks: u64,
    countdown: Option<u32>,
    launched: bool,
    pings: u64,
}

fn clock() -> Command<Msg> {
    command::tick(Duration::from_secs(1), || Message::User(Msg::Tick))
}

fn countdown_from(n: u32) -> Command<Msg> {
    let steps: Vec<_> = (1..=n)
        .rev()
        .map(|i| {
            command::tick(Duration::from_millis(500), move || {
                Message::User(Msg::Countdown(i))
            })
        })
        .collect();
    sequence![steps, command::send_message(Message::User(Msg::Liftoff))]
}

impl Model for Timers {
    type User = Msg;

    fn init(&mut self) -> Option<Command<Msg>> {
        Some(batch![clock(), countdown_from(5)])
    }

    fn update(&mut self, msg: Message<Msg>) -> Option<Command<Msg>> {
        match msg {
            Message::User(Msg::Tick) => {
                self.ticks += 1;
                return Some(clock());
            }
            Message::User(Msg::Countdown(n)) => self.countdown = Some(n),
            Message::User(Msg::Liftoff) => {
                self.countdown = None;
                self.launched = true;
            }
            Message::User(Msg::Ping(n)) => self.pings = n,
            Message::Key(key) => match key.to_string().as_str() {
                "q" | "ctrl+c" => return Some(command::quit()),
                "c" if self.countdown.is_none() => {
                    self.launched = false;
                    return Some(countdown_from(3));
                }
                _ => {}
            },
            _ => {}
        }
        command::none()
    }

    fn view(&self) -> String {
        let status = match (self.countdown, self.launched) {
            (Some(n), _) => format!("T-minus {n}"),
            (None, true) => "Liftoff!".to_string(),
            (None, false) => "Waiting".to_string(),
        };
        format!(
            "Clock: {}s\nCountdown: {status}\nPings from background task: {}\n\nc restart countdown  q quit",
            self.ticks, self.pings
        )
    }
}

#[teacup::tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    teacup::log_to_file("timers.log")?;

    let options = match std::env::var("TEACUP_OPTIONS") {
        Ok(text) => RunnerOptions::from_toml(&text)?,
        Err(_) => RunnerOptions::default(),
    };
    let runner = Runner::new(Timers::default(), CrosstermDriver::default(), options)?;

    let handle = runner.handle();
    teacup::tokio::spawn(async move {
        let mut n = 0;
        while handle.state() != RunState::Stopped {
            teacup::tokio::time::sleep(Duration::from_millis(750)).await;
            n += 1;
            handle.send(Message::User(Msg::Ping(n)));
        }
    });

    let model = runner.run().await?;
    tracing::info!(ticks = model.ticks, pings = model.pings, "timers demo finished");
    println!("Ran for {}s", model.ticks);
    Ok(())
}
