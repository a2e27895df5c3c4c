//! # Counter Example
//!
//! A minimal counter app demonstrating the core teacup architecture:
//! - Implementing the [`Model`] trait with `update` and `view`
//! - Matching key messages by their canonical names
//! - Returning `command::none()` and `command::quit()`
//!
//! Run with: `cargo run --example counter`

use teacup::{command, Command, Message, Model, RunnerOptions};

/// A minimal counter app that validates the core loop.
#[derive(Default)]
struct Counter {
    count: i64,
    width: u16,
}

impl Model for Counter {
    type User = ();

    // Keys arrive as `Message::Key`; their `Display` form is the canonical
    // name ("up", "ctrl+c", "k"), which keeps the match readable.
    fn update(&mut self, msg: Message<()>) -> Option<Command<()>> {
        match msg {
            Message::Key(key) => match key.to_string().as_str() {
                "up" | "k" => self.count += 1,
                "down" | "j" => self.count -= 1,
                "r" => self.count = 0,
                "q" | "esc" | "ctrl+c" => return Some(command::quit()),
                _ => {}
            },
            Message::WindowSize(size) => self.width = size.width,
            _ => {}
        }
        command::none()
    }

    fn view(&self) -> String {
        let rule = "─".repeat(usize::from(self.width.clamp(10, 40)));
        format!(
            "{rule}\n  Count: {}\n\n  ↑/k inc  ↓/j dec  r reset  q quit\n{rule}",
            self.count
        )
    }
}

#[teacup::tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if !teacup::is_tty() {
        eprintln!("counter needs an interactive terminal");
        return Ok(());
    }
    let options = RunnerOptions::default()
        .with_alt_screen()
        .with_window_title("teacup counter");
    let model = teacup::run_with(Counter::default(), options).await?;
    println!("Final count: {}", model.count);
    Ok(())
}
