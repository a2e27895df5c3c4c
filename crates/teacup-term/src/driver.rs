use crate::renderer::LineRenderer;
use crate::width::display_width;
use crossterm::event::{
    self, DisableBracketedPaste, DisableFocusChange, EnableBracketedPaste, EnableFocusChange,
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton as CtMouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen, SetTitle,
};
use crossterm::tty::IsTty;
use crossterm::{cursor, execute};
use serde_json::json;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Once;
use std::time::Duration;
use teacup_core::command::callback_in_progress;
use teacup_core::{DriverError, KeyType, MouseAction, MouseButton, RawEvent, TerminalDriver};
use tracing::debug;

const MOUSE_CELL_MOTION_ON: &[u8] = b"\x1b[?1002h\x1b[?1006h";
const MOUSE_ALL_MOTION_ON: &[u8] = b"\x1b[?1003h\x1b[?1006h";
const MOUSE_OFF: &[u8] = b"\x1b[?1002l\x1b[?1003l\x1b[?1006l";

/// Set while the alternate screen is on, so the panic hook knows to leave it.
static ALT_SCREEN: AtomicBool = AtomicBool::new(false);

/// Which standard stream the UI is painted on.
///
/// Painting on stderr keeps stdout free for piping program output.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum OutputTarget {
    #[default]
    Stdout,
    Stderr,
}

impl OutputTarget {
    /// A writer for this stream.
    pub fn open(self) -> Output {
        Output { target: self }
    }

    /// Whether this stream is attached to a terminal.
    pub fn is_tty(self) -> bool {
        match self {
            OutputTarget::Stdout => io::stdout().is_tty(),
            OutputTarget::Stderr => io::stderr().is_tty(),
        }
    }
}

/// Writes to the stream named by its [`OutputTarget`].  The process-wide
/// stream handle is looked up on every call, so any number of `Output`s can
/// coexist.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    target: OutputTarget,
}

impl Output {
    pub fn target(&self) -> OutputTarget {
        self.target
    }
}

impl Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.target {
            OutputTarget::Stdout => io::stdout().write(buf),
            OutputTarget::Stderr => io::stderr().write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.target {
            OutputTarget::Stdout => io::stdout().flush(),
            OutputTarget::Stderr => io::stderr().flush(),
        }
    }
}

/// A [`TerminalDriver`] over crossterm.
///
/// Input events are translated into raw descriptors by
/// [`event_to_descriptor`].  A panic hook restores the terminal if the
/// process panics while raw mode is on.
///
/// Raw byte reads are not offered: crossterm's event reader owns stdin, and
/// reading it alongside would split escape sequences between the two.
pub struct CrosstermDriver {
    out: Output,
    reading: bool,
}

impl Default for CrosstermDriver {
    fn default() -> Self {
        Self::new(OutputTarget::default())
    }
}

impl CrosstermDriver {
    pub fn new(target: OutputTarget) -> Self {
        Self {
            out: target.open(),
            reading: false,
        }
    }

    fn write_raw(&mut self, bytes: &[u8]) -> Result<(), DriverError> {
        self.out.write_all(bytes)?;
        self.out.flush()?;
        Ok(())
    }
}

/// Installs, once per process, a hook that puts the terminal back before the
/// previous hook reports the panic.
fn install_panic_hook(target: OutputTarget) {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            if restores_on_panic() {
                let _ = reset_after_panic(target.open());
            }
            previous(info);
        }));
    });
}

/// Tick callback panics are caught and the run goes on, so the terminal is
/// kept as it is for them.
fn restores_on_panic() -> bool {
    !callback_in_progress()
}

fn reset_after_panic(mut out: impl Write) -> io::Result<()> {
    let raw = disable_raw_mode();
    let _ = execute!(out, DisableBracketedPaste);
    let _ = out.write_all(MOUSE_OFF);
    let _ = execute!(out, DisableFocusChange, cursor::Show);
    if ALT_SCREEN.load(Ordering::SeqCst) {
        let _ = execute!(out, LeaveAlternateScreen);
    }
    raw
}

/// Title text with control characters removed, so it cannot end the OSC
/// sequence early.
fn clean_title(title: &str) -> String {
    title.chars().filter(|c| !c.is_control()).collect()
}

impl TerminalDriver for CrosstermDriver {
    type Renderer = LineRenderer<Output>;

    fn size(&mut self) -> Result<(u16, u16), DriverError> {
        Ok(crossterm::terminal::size()?)
    }

    fn string_width(&self, text: &str) -> usize {
        display_width(text)
    }

    fn enter_raw_mode(&mut self) -> Result<(), DriverError> {
        install_panic_hook(self.out.target());
        enable_raw_mode()?;
        debug!("raw mode on");
        Ok(())
    }

    fn exit_raw_mode(&mut self) -> Result<(), DriverError> {
        disable_raw_mode()?;
        debug!("raw mode off");
        Ok(())
    }

    fn enter_alt_screen(&mut self) -> Result<(), DriverError> {
        execute!(self.out, EnterAlternateScreen)?;
        ALT_SCREEN.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn exit_alt_screen(&mut self) -> Result<(), DriverError> {
        execute!(self.out, LeaveAlternateScreen)?;
        ALT_SCREEN.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn show_cursor(&mut self) -> Result<(), DriverError> {
        Ok(execute!(self.out, cursor::Show)?)
    }

    fn hide_cursor(&mut self) -> Result<(), DriverError> {
        Ok(execute!(self.out, cursor::Hide)?)
    }

    fn enable_mouse_cell_motion(&mut self) -> Result<(), DriverError> {
        self.write_raw(MOUSE_CELL_MOTION_ON)
    }

    fn enable_mouse_all_motion(&mut self) -> Result<(), DriverError> {
        self.write_raw(MOUSE_ALL_MOTION_ON)
    }

    fn disable_mouse(&mut self) -> Result<(), DriverError> {
        self.write_raw(MOUSE_OFF)
    }

    fn enable_bracketed_paste(&mut self) -> Result<(), DriverError> {
        Ok(execute!(self.out, EnableBracketedPaste)?)
    }

    fn disable_bracketed_paste(&mut self) -> Result<(), DriverError> {
        Ok(execute!(self.out, DisableBracketedPaste)?)
    }

    fn enable_report_focus(&mut self) -> Result<(), DriverError> {
        Ok(execute!(self.out, EnableFocusChange)?)
    }

    fn disable_report_focus(&mut self) -> Result<(), DriverError> {
        Ok(execute!(self.out, DisableFocusChange)?)
    }

    fn start_input_reader(&mut self) -> Result<(), DriverError> {
        self.reading = true;
        Ok(())
    }

    fn stop_input_reader(&mut self) -> Result<(), DriverError> {
        self.reading = false;
        Ok(())
    }

    fn is_tty(&self) -> bool {
        io::stdin().is_tty()
    }

    fn set_window_title(&mut self, title: &str) -> Result<(), DriverError> {
        Ok(execute!(self.out, SetTitle(clean_title(title)))?)
    }

    fn poll_event(&mut self, timeout: Duration) -> Result<Option<RawEvent>, DriverError> {
        if !self.reading {
            return Err(DriverError::Closed);
        }
        if !event::poll(timeout)? {
            return Ok(None);
        }
        Ok(event_to_descriptor(&event::read()?))
    }

    fn create_renderer(&mut self) -> Result<Self::Renderer, DriverError> {
        Ok(LineRenderer::new(self.out))
    }
}

/// Translate a crossterm event into a raw event descriptor.
///
/// Returns `None` for events with no descriptor, such as key releases or
/// keys with no key class.
pub fn event_to_descriptor(event: &Event) -> Option<RawEvent> {
    match event {
        Event::Key(key) => key_descriptor(key),
        Event::Mouse(mouse) => Some(mouse_descriptor(mouse)),
        Event::Resize(width, height) => {
            Some(json!({ "type": "resize", "width": width, "height": height }))
        }
        Event::FocusGained => Some(json!({ "type": "focus" })),
        Event::FocusLost => Some(json!({ "type": "blur" })),
        Event::Paste(text) => Some(json!({ "type": "paste", "text": text })),
    }
}

fn key_descriptor(key: &KeyEvent) -> Option<RawEvent> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let shift = key.modifiers.contains(KeyModifiers::SHIFT);
    let alt = key.modifiers.contains(KeyModifiers::ALT);

    let arrow = |plain, shifted, ctrled| match (shift, ctrl) {
        (true, _) => shifted,
        (false, true) => ctrled,
        (false, false) => plain,
    };

    let (key_type, runes) = match key.code {
        KeyCode::Char(c) if ctrl => match c {
            ' ' | '@' | '2' => (KeyType::Null, None),
            c => (KeyType::ctrl_letter(c)?, None),
        },
        KeyCode::Char(' ') => (KeyType::Space, Some(vec![' '])),
        KeyCode::Char(c) => (KeyType::Runes, Some(vec![c])),
        KeyCode::Enter => (KeyType::Enter, None),
        KeyCode::Tab => (KeyType::Tab, None),
        KeyCode::BackTab => (KeyType::ShiftTab, None),
        KeyCode::Backspace => (KeyType::Backspace, None),
        KeyCode::Esc => (KeyType::Esc, None),
        KeyCode::Up => (arrow(KeyType::Up, KeyType::ShiftUp, KeyType::CtrlUp), None),
        KeyCode::Down => (arrow(KeyType::Down, KeyType::ShiftDown, KeyType::CtrlDown), None),
        KeyCode::Right => (arrow(KeyType::Right, KeyType::ShiftRight, KeyType::CtrlRight), None),
        KeyCode::Left => (arrow(KeyType::Left, KeyType::ShiftLeft, KeyType::CtrlLeft), None),
        KeyCode::Home => (KeyType::Home, None),
        KeyCode::End => (KeyType::End, None),
        KeyCode::PageUp => (KeyType::PgUp, None),
        KeyCode::PageDown => (KeyType::PgDown, None),
        KeyCode::Delete => (KeyType::Delete, None),
        KeyCode::Insert => (KeyType::Insert, None),
        KeyCode::F(n) => (KeyType::function(n)?, None),
        _ => return None,
    };

    let mut raw = json!({ "type": "key", "key_type": key_type.code(), "alt": alt });
    if let Some(runes) = runes {
        raw["runes"] = json!(runes.iter().map(|&c| u32::from(c)).collect::<Vec<_>>());
    }
    Some(raw)
}

fn mouse_descriptor(mouse: &MouseEvent) -> RawEvent {
    let button_of = |b: CtMouseButton| match b {
        CtMouseButton::Left => MouseButton::Left,
        CtMouseButton::Right => MouseButton::Right,
        CtMouseButton::Middle => MouseButton::Middle,
    };
    let (button, action) = match mouse.kind {
        MouseEventKind::Down(b) => (button_of(b), MouseAction::Press),
        MouseEventKind::Up(b) => (button_of(b), MouseAction::Release),
        MouseEventKind::Drag(b) => (button_of(b), MouseAction::Motion),
        MouseEventKind::Moved => (MouseButton::None, MouseAction::Motion),
        MouseEventKind::ScrollUp => (MouseButton::WheelUp, MouseAction::Press),
        MouseEventKind::ScrollDown => (MouseButton::WheelDown, MouseAction::Press),
        MouseEventKind::ScrollLeft => (MouseButton::WheelLeft, MouseAction::Press),
        MouseEventKind::ScrollRight => (MouseButton::WheelRight, MouseAction::Press),
    };
    json!({
        "type": "mouse",
        "x": mouse.column,
        "y": mouse.row,
        "button": button.code(),
        "action": action.code(),
        "shift": mouse.modifiers.contains(KeyModifiers::SHIFT),
        "alt": mouse.modifiers.contains(KeyModifiers::ALT),
        "ctrl": mouse.modifiers.contains(KeyModifiers::CONTROL),
    })
}
