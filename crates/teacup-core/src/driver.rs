//! Interfaces to the terminal collaborators the [`Runner`](crate::Runner)
//! drives.
//!
//! The runtime never touches the TTY itself.  A [`TerminalDriver`] owns raw
//! mode, screen modes and input, and hands out a [`Renderer`] that paints
//! view strings.  `teacup-term` provides a crossterm implementation;
//! [`testing::ScriptedDriver`](crate::testing::ScriptedDriver) provides a
//! scripted one.

use crate::decode::RawEvent;
use std::time::Duration;

/// A terminal driver or renderer call failed.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// An I/O error from terminal setup, input, or output.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The driver does not implement this operation.
    #[error("unsupported terminal operation: {0}")]
    Unsupported(&'static str),
    /// The input source is gone.
    #[error("terminal input closed")]
    Closed,
}

/// Raw terminal control and input.
pub trait TerminalDriver: Send + 'static {
    /// The renderer this driver hands out.
    type Renderer: Renderer;

    /// Terminal size as `(columns, rows)`.
    fn size(&mut self) -> Result<(u16, u16), DriverError>;

    /// Display width of `text` in cells.
    fn string_width(&self, text: &str) -> usize;

    fn enter_raw_mode(&mut self) -> Result<(), DriverError>;
    fn exit_raw_mode(&mut self) -> Result<(), DriverError>;

    fn enter_alt_screen(&mut self) -> Result<(), DriverError>;
    fn exit_alt_screen(&mut self) -> Result<(), DriverError>;

    fn show_cursor(&mut self) -> Result<(), DriverError>;
    fn hide_cursor(&mut self) -> Result<(), DriverError>;

    /// Report presses, releases, wheel and drags.
    fn enable_mouse_cell_motion(&mut self) -> Result<(), DriverError>;
    /// Report all of the above plus motion with no button held.
    fn enable_mouse_all_motion(&mut self) -> Result<(), DriverError>;
    fn disable_mouse(&mut self) -> Result<(), DriverError>;

    fn enable_bracketed_paste(&mut self) -> Result<(), DriverError>;
    fn disable_bracketed_paste(&mut self) -> Result<(), DriverError>;

    fn enable_report_focus(&mut self) -> Result<(), DriverError>;
    fn disable_report_focus(&mut self) -> Result<(), DriverError>;

    /// Whether input comes from an interactive terminal.
    fn is_tty(&self) -> bool {
        false
    }

    fn set_window_title(&mut self, title: &str) -> Result<(), DriverError> {
        let _ = title;
        Err(DriverError::Unsupported("set_window_title"))
    }

    fn start_input_reader(&mut self) -> Result<(), DriverError>;
    fn stop_input_reader(&mut self) -> Result<(), DriverError>;

    /// Read one raw input chunk into `buf`, waiting at most `timeout`.
    /// Returns the number of bytes read; `0` means the wait timed out.
    fn read_raw(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, DriverError> {
        let _ = (buf, timeout);
        Err(DriverError::Unsupported("read_raw"))
    }

    /// Wait at most `timeout` for one input event descriptor.
    fn poll_event(&mut self, timeout: Duration) -> Result<Option<RawEvent>, DriverError>;

    /// Create the renderer that paints views for this terminal.
    fn create_renderer(&mut self) -> Result<Self::Renderer, DriverError>;
}

/// Paints view strings.
pub trait Renderer: Send + 'static {
    fn render(&mut self, view: &str) -> Result<(), DriverError>;
    fn set_size(&mut self, width: u16, height: u16);
    fn set_alt_screen(&mut self, enabled: bool);
    fn clear(&mut self) -> Result<(), DriverError>;
}
