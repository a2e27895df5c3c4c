//! Terminal collaborators for the **teacup** runtime.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`driver`] | [`CrosstermDriver`]: raw mode, screen modes, mouse, paste, focus and input over crossterm |
//! | [`renderer`] | [`LineRenderer`]: repaints view strings in place, line by line |
//! | [`width`] | Escape-aware display width and truncation |

pub mod driver;
pub mod renderer;
pub mod width;

pub use driver::{event_to_descriptor, CrosstermDriver, Output, OutputTarget};
pub use renderer::LineRenderer;
