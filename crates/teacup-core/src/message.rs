use std::fmt;

/// Inputs delivered to [`Model::update`](crate::Model::update).
///
/// Terminal input arrives as [`Key`](Message::Key), [`Mouse`](Message::Mouse),
/// [`WindowSize`](Message::WindowSize), [`Paste`](Message::Paste),
/// [`Focus`](Message::Focus) and [`Blur`](Message::Blur).  Application
/// payloads travel as [`User`](Message::User) and are passed through
/// unmodified.
///
/// # Example
///
/// ```rust,ignore
/// use teacup_core::{Message, KeyMsg, KeyType};
///
/// let msg: Message<()> = Message::Key(KeyMsg::rune('q'));
/// assert_eq!(msg.as_key().map(|k| k.to_string()), Some("q".to_string()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message<U> {
    /// A key press.
    Key(KeyMsg),
    /// A mouse event.
    Mouse(MouseMsg),
    /// The terminal viewport changed size.
    WindowSize(WindowSizeMsg),
    /// Bracketed paste content.
    Paste(String),
    /// The terminal window gained focus.
    Focus,
    /// The terminal window lost focus.
    Blur,
    /// Request program termination.
    Quit,
    /// Application-defined payload.
    User(U),
}

impl<U> Message<U> {
    /// Returns `true` for [`Message::Quit`].
    pub fn is_quit(&self) -> bool {
        matches!(self, Message::Quit)
    }

    /// A short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Key(_) => "key",
            Message::Mouse(_) => "mouse",
            Message::WindowSize(_) => "window_size",
            Message::Paste(_) => "paste",
            Message::Focus => "focus",
            Message::Blur => "blur",
            Message::Quit => "quit",
            Message::User(_) => "user",
        }
    }

    /// The key payload, if this is a key message.
    pub fn as_key(&self) -> Option<&KeyMsg> {
        match self {
            Message::Key(key) => Some(key),
            _ => None,
        }
    }

    /// The mouse payload, if this is a mouse message.
    pub fn as_mouse(&self) -> Option<&MouseMsg> {
        match self {
            Message::Mouse(mouse) => Some(mouse),
            _ => None,
        }
    }

    /// The application payload, if this is a user message.
    pub fn as_user(&self) -> Option<&U> {
        match self {
            Message::User(user) => Some(user),
            _ => None,
        }
    }
}

impl<U> From<KeyMsg> for Message<U> {
    fn from(key: KeyMsg) -> Self {
        Message::Key(key)
    }
}

impl<U> From<MouseMsg> for Message<U> {
    fn from(mouse: MouseMsg) -> Self {
        Message::Mouse(mouse)
    }
}

impl<U> From<WindowSizeMsg> for Message<U> {
    fn from(size: WindowSizeMsg) -> Self {
        Message::WindowSize(size)
    }
}

/// Key classes, numbered with the terminal driver's key codes.
///
/// Control characters keep their byte value (`CtrlC = 3`, `Esc = 27`), while
/// keys without a single-byte encoding use negative codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum KeyType {
    Null = 0,
    CtrlA = 1,
    CtrlB = 2,
    CtrlC = 3,
    CtrlD = 4,
    CtrlE = 5,
    CtrlF = 6,
    CtrlG = 7,
    CtrlH = 8,
    Tab = 9,
    CtrlJ = 10,
    CtrlK = 11,
    CtrlL = 12,
    Enter = 13,
    CtrlN = 14,
    CtrlO = 15,
    CtrlP = 16,
    CtrlQ = 17,
    CtrlR = 18,
    CtrlS = 19,
    CtrlT = 20,
    CtrlU = 21,
    CtrlV = 22,
    CtrlW = 23,
    CtrlX = 24,
    CtrlY = 25,
    CtrlZ = 26,
    Esc = 27,
    Backspace = 127,
    Runes = -1,
    Up = -2,
    Down = -3,
    Right = -4,
    Left = -5,
    Home = -6,
    End = -7,
    PgUp = -8,
    PgDown = -9,
    Delete = -10,
    Insert = -11,
    F1 = -12,
    F2 = -13,
    F3 = -14,
    F4 = -15,
    F5 = -16,
    F6 = -17,
    F7 = -18,
    F8 = -19,
    F9 = -20,
    F10 = -21,
    F11 = -22,
    F12 = -23,
    ShiftTab = -24,
    Space = -25,
    ShiftUp = -100,
    ShiftDown = -101,
    ShiftRight = -102,
    ShiftLeft = -103,
    CtrlUp = -104,
    CtrlDown = -105,
    CtrlRight = -106,
    CtrlLeft = -107,
}

impl KeyType {
    const ALL: [KeyType; 62] = [
        KeyType::Null,
        KeyType::CtrlA,
        KeyType::CtrlB,
        KeyType::CtrlC,
        KeyType::CtrlD,
        KeyType::CtrlE,
        KeyType::CtrlF,
        KeyType::CtrlG,
        KeyType::CtrlH,
        KeyType::Tab,
        KeyType::CtrlJ,
        KeyType::CtrlK,
        KeyType::CtrlL,
        KeyType::Enter,
        KeyType::CtrlN,
        KeyType::CtrlO,
        KeyType::CtrlP,
        KeyType::CtrlQ,
        KeyType::CtrlR,
        KeyType::CtrlS,
        KeyType::CtrlT,
        KeyType::CtrlU,
        KeyType::CtrlV,
        KeyType::CtrlW,
        KeyType::CtrlX,
        KeyType::CtrlY,
        KeyType::CtrlZ,
        KeyType::Esc,
        KeyType::Backspace,
        KeyType::Runes,
        KeyType::Up,
        KeyType::Down,
        KeyType::Right,
        KeyType::Left,
        KeyType::Home,
        KeyType::End,
        KeyType::PgUp,
        KeyType::PgDown,
        KeyType::Delete,
        KeyType::Insert,
        KeyType::F1,
        KeyType::F2,
        KeyType::F3,
        KeyType::F4,
        KeyType::F5,
        KeyType::F6,
        KeyType::F7,
        KeyType::F8,
        KeyType::F9,
        KeyType::F10,
        KeyType::F11,
        KeyType::F12,
        KeyType::ShiftTab,
        KeyType::Space,
        KeyType::ShiftUp,
        KeyType::ShiftDown,
        KeyType::ShiftRight,
        KeyType::ShiftLeft,
        KeyType::CtrlUp,
        KeyType::CtrlDown,
        KeyType::CtrlRight,
        KeyType::CtrlLeft,
    ];

    /// Look up a key class by its integer code.
    pub fn from_code(code: i64) -> Option<KeyType> {
        Self::ALL.iter().copied().find(|key| key.code() == code)
    }

    /// The integer code used by the terminal driver.
    pub fn code(self) -> i64 {
        self as i32 as i64
    }

    /// The function key number (`1..=12`) for `F1`..`F12`.
    pub fn function_number(self) -> Option<u8> {
        let code = self.code();
        if (KeyType::F12.code()..=KeyType::F1.code()).contains(&code) {
            Some((KeyType::F1.code() - code + 1) as u8)
        } else {
            None
        }
    }

    /// The function key for `F1`..`F12`.
    pub fn function(n: u8) -> Option<KeyType> {
        if (1..=12).contains(&n) {
            KeyType::from_code(KeyType::F1.code() - (n as i64 - 1))
        } else {
            None
        }
    }

    /// The ctrl-letter key for `a`..`z` (`ctrl+i` and `ctrl+m` are `Tab` and
    /// `Enter`).
    pub fn ctrl_letter(letter: char) -> Option<KeyType> {
        let lower = letter.to_ascii_lowercase();
        if lower.is_ascii_lowercase() {
            KeyType::from_code(lower as i64 - 'a' as i64 + 1)
        } else {
            None
        }
    }

    /// Canonical token for this key class.
    pub fn token(self) -> &'static str {
        match self {
            KeyType::Null => "ctrl+@",
            KeyType::CtrlA => "ctrl+a",
            KeyType::CtrlB => "ctrl+b",
            KeyType::CtrlC => "ctrl+c",
            KeyType::CtrlD => "ctrl+d",
            KeyType::CtrlE => "ctrl+e",
            KeyType::CtrlF => "ctrl+f",
            KeyType::CtrlG => "ctrl+g",
            KeyType::CtrlH => "ctrl+h",
            KeyType::Tab => "tab",
            KeyType::CtrlJ => "ctrl+j",
            KeyType::CtrlK => "ctrl+k",
            KeyType::CtrlL => "ctrl+l",
            KeyType::Enter => "enter",
            KeyType::CtrlN => "ctrl+n",
            KeyType::CtrlO => "ctrl+o",
            KeyType::CtrlP => "ctrl+p",
            KeyType::CtrlQ => "ctrl+q",
            KeyType::CtrlR => "ctrl+r",
            KeyType::CtrlS => "ctrl+s",
            KeyType::CtrlT => "ctrl+t",
            KeyType::CtrlU => "ctrl+u",
            KeyType::CtrlV => "ctrl+v",
            KeyType::CtrlW => "ctrl+w",
            KeyType::CtrlX => "ctrl+x",
            KeyType::CtrlY => "ctrl+y",
            KeyType::CtrlZ => "ctrl+z",
            KeyType::Esc => "esc",
            KeyType::Backspace => "backspace",
            KeyType::Runes => "runes",
            KeyType::Up => "up",
            KeyType::Down => "down",
            KeyType::Right => "right",
            KeyType::Left => "left",
            KeyType::Home => "home",
            KeyType::End => "end",
            KeyType::PgUp => "pgup",
            KeyType::PgDown => "pgdown",
            KeyType::Delete => "delete",
            KeyType::Insert => "insert",
            KeyType::F1 => "f1",
            KeyType::F2 => "f2",
            KeyType::F3 => "f3",
            KeyType::F4 => "f4",
            KeyType::F5 => "f5",
            KeyType::F6 => "f6",
            KeyType::F7 => "f7",
            KeyType::F8 => "f8",
            KeyType::F9 => "f9",
            KeyType::F10 => "f10",
            KeyType::F11 => "f11",
            KeyType::F12 => "f12",
            KeyType::ShiftTab => "shift+tab",
            KeyType::Space => "space",
            KeyType::ShiftUp => "shift+up",
            KeyType::ShiftDown => "shift+down",
            KeyType::ShiftRight => "shift+right",
            KeyType::ShiftLeft => "shift+left",
            KeyType::CtrlUp => "ctrl+up",
            KeyType::CtrlDown => "ctrl+down",
            KeyType::CtrlRight => "ctrl+right",
            KeyType::CtrlLeft => "ctrl+left",
        }
    }
}

/// A key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMsg {
    /// The key class.
    pub key_type: KeyType,
    /// Characters typed, for [`KeyType::Runes`] (and [`KeyType::Space`]).
    pub runes: Vec<char>,
    /// Whether alt was held.
    pub alt: bool,
    /// Display name overriding the canonical token.
    pub name: Option<String>,
}

impl KeyMsg {
    /// A key of the given class with no characters attached.
    pub fn new(key_type: KeyType) -> Self {
        Self {
            key_type,
            runes: Vec::new(),
            alt: false,
            name: None,
        }
    }

    /// A single typed character.
    pub fn rune(c: char) -> Self {
        Self::runes([c])
    }

    /// Typed characters.
    pub fn runes(chars: impl IntoIterator<Item = char>) -> Self {
        Self {
            runes: chars.into_iter().collect(),
            ..Self::new(KeyType::Runes)
        }
    }

    /// Set the alt modifier.
    pub fn with_alt(mut self, alt: bool) -> Self {
        self.alt = alt;
        self
    }

    /// Override the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The typed characters as a string.
    pub fn text(&self) -> String {
        self.runes.iter().collect()
    }

    /// The first typed character as a string (empty when there is none).
    pub fn char(&self) -> String {
        self.runes.first().map(|c| c.to_string()).unwrap_or_default()
    }

    pub fn is_runes(&self) -> bool {
        self.key_type == KeyType::Runes
    }

    pub fn is_enter(&self) -> bool {
        self.key_type == KeyType::Enter
    }

    pub fn is_backspace(&self) -> bool {
        self.key_type == KeyType::Backspace
    }

    pub fn is_tab(&self) -> bool {
        self.key_type == KeyType::Tab
    }

    pub fn is_esc(&self) -> bool {
        self.key_type == KeyType::Esc
    }

    pub fn is_space(&self) -> bool {
        self.key_type == KeyType::Space
    }

    pub fn is_up(&self) -> bool {
        self.key_type == KeyType::Up
    }

    pub fn is_down(&self) -> bool {
        self.key_type == KeyType::Down
    }

    pub fn is_left(&self) -> bool {
        self.key_type == KeyType::Left
    }

    pub fn is_right(&self) -> bool {
        self.key_type == KeyType::Right
    }

    /// Any arrow key, modified or not.
    pub fn is_arrow(&self) -> bool {
        matches!(
            self.key_type,
            KeyType::Up
                | KeyType::Down
                | KeyType::Left
                | KeyType::Right
                | KeyType::ShiftUp
                | KeyType::ShiftDown
                | KeyType::ShiftLeft
                | KeyType::ShiftRight
                | KeyType::CtrlUp
                | KeyType::CtrlDown
                | KeyType::CtrlLeft
                | KeyType::CtrlRight
        )
    }

    /// Key classes whose canonical token is a `ctrl+` chord.
    pub fn is_ctrl(&self) -> bool {
        self.key_type.token().starts_with("ctrl+")
    }

    /// Function key number (`1..=12`), if this is a function key.
    pub fn function_key(&self) -> Option<u8> {
        self.key_type.function_number()
    }
}

impl fmt::Display for KeyMsg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = self.name.as_deref().filter(|n| !n.is_empty()) {
            return f.write_str(name);
        }
        if self.alt {
            f.write_str("alt+")?;
        }
        match self.key_type {
            KeyType::Runes => f.write_str(&self.text()),
            other => f.write_str(other.token()),
        }
    }
}

/// Mouse buttons, numbered with the terminal driver's button codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    None,
    WheelUp,
    WheelDown,
    WheelLeft,
    WheelRight,
}

impl MouseButton {
    pub fn from_code(code: i64) -> Option<MouseButton> {
        match code {
            0 => Some(MouseButton::Left),
            1 => Some(MouseButton::Middle),
            2 => Some(MouseButton::Right),
            3 => Some(MouseButton::None),
            4 => Some(MouseButton::WheelUp),
            5 => Some(MouseButton::WheelDown),
            6 => Some(MouseButton::WheelLeft),
            7 => Some(MouseButton::WheelRight),
            _ => None,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            MouseButton::Left => 0,
            MouseButton::Middle => 1,
            MouseButton::Right => 2,
            MouseButton::None => 3,
            MouseButton::WheelUp => 4,
            MouseButton::WheelDown => 5,
            MouseButton::WheelLeft => 6,
            MouseButton::WheelRight => 7,
        }
    }
}

/// What the mouse did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseAction {
    Press,
    Release,
    Motion,
}

impl MouseAction {
    pub fn from_code(code: i64) -> Option<MouseAction> {
        match code {
            0 => Some(MouseAction::Press),
            1 => Some(MouseAction::Release),
            2 => Some(MouseAction::Motion),
            _ => None,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            MouseAction::Press => 0,
            MouseAction::Release => 1,
            MouseAction::Motion => 2,
        }
    }
}

/// A mouse event at a 0-based cell position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseMsg {
    pub x: u16,
    pub y: u16,
    pub button: MouseButton,
    pub action: MouseAction,
    pub shift: bool,
    pub alt: bool,
    pub ctrl: bool,
}

impl MouseMsg {
    /// An unmodified mouse event.
    pub fn new(x: u16, y: u16, button: MouseButton, action: MouseAction) -> Self {
        Self {
            x,
            y,
            button,
            action,
            shift: false,
            alt: false,
            ctrl: false,
        }
    }

    pub fn is_press(&self) -> bool {
        self.action == MouseAction::Press
    }

    pub fn is_release(&self) -> bool {
        self.action == MouseAction::Release
    }

    pub fn is_motion(&self) -> bool {
        self.action == MouseAction::Motion
    }

    pub fn is_left(&self) -> bool {
        self.button == MouseButton::Left
    }

    pub fn is_right(&self) -> bool {
        self.button == MouseButton::Right
    }

    pub fn is_middle(&self) -> bool {
        self.button == MouseButton::Middle
    }

    /// Any wheel direction.
    pub fn is_wheel(&self) -> bool {
        matches!(
            self.button,
            MouseButton::WheelUp
                | MouseButton::WheelDown
                | MouseButton::WheelLeft
                | MouseButton::WheelRight
        )
    }
}

/// Terminal viewport size in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSizeMsg {
    pub width: u16,
    pub height: u16,
}

impl WindowSizeMsg {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rune_key_renders_text() {
        let key = KeyMsg::rune('a');
        assert_eq!(key.key_type, KeyType::Runes);
        assert_eq!(key.runes, vec!['a']);
        assert_eq!(key.char(), "a");
        assert_eq!(key.to_string(), "a");
        assert!(key.is_runes());
    }

    #[test]
    fn alt_prefixes_token() {
        assert_eq!(KeyMsg::rune('a').with_alt(true).to_string(), "alt+a");
        assert_eq!(KeyMsg::new(KeyType::Enter).with_alt(true).to_string(), "alt+enter");
    }

    #[test]
    fn named_keys_use_tokens() {
        let cases = [
            (KeyType::Enter, "enter"),
            (KeyType::Backspace, "backspace"),
            (KeyType::Tab, "tab"),
            (KeyType::Esc, "esc"),
            (KeyType::CtrlC, "ctrl+c"),
            (KeyType::Up, "up"),
            (KeyType::Down, "down"),
            (KeyType::Left, "left"),
            (KeyType::Right, "right"),
            (KeyType::Space, "space"),
            (KeyType::F1, "f1"),
            (KeyType::F12, "f12"),
            (KeyType::ShiftTab, "shift+tab"),
        ];
        for (key_type, token) in cases {
            assert_eq!(KeyMsg::new(key_type).to_string(), token);
        }
    }

    #[test]
    fn name_override_wins() {
        let key = KeyMsg::rune('a').with_name("custom");
        assert_eq!(key.to_string(), "custom");
        let key = KeyMsg::rune('a').with_alt(true).with_name("alt+a");
        assert_eq!(key.to_string(), "alt+a");
    }

    #[test]
    fn empty_name_is_no_override() {
        assert_eq!(KeyMsg::new(KeyType::Up).with_name("").to_string(), "up");
    }

    #[test]
    fn empty_runes_render_empty() {
        let key = KeyMsg::runes([]);
        assert_eq!(key.to_string(), "");
        assert_eq!(key.char(), "");
    }

    #[test]
    fn unicode_rune() {
        let key = KeyMsg::rune('\u{1F60A}');
        assert_eq!(key.char(), "\u{1F60A}");
    }

    #[test]
    fn key_predicates() {
        assert!(KeyMsg::new(KeyType::Enter).is_enter());
        assert!(!KeyMsg::new(KeyType::Enter).is_runes());
        assert!(KeyMsg::new(KeyType::CtrlC).is_ctrl());
        assert!(KeyMsg::new(KeyType::CtrlLeft).is_ctrl());
        assert!(!KeyMsg::new(KeyType::Tab).is_ctrl());
        assert!(KeyMsg::new(KeyType::ShiftUp).is_arrow());
        assert!(!KeyMsg::new(KeyType::Home).is_arrow());
        assert_eq!(KeyMsg::new(KeyType::F7).function_key(), Some(7));
        assert_eq!(KeyMsg::new(KeyType::Esc).function_key(), None);
    }

    #[test]
    fn key_codes_round_trip() {
        for key in KeyType::ALL {
            assert_eq!(KeyType::from_code(key.code()), Some(key));
        }
        assert_eq!(KeyType::from_code(3), Some(KeyType::CtrlC));
        assert_eq!(KeyType::from_code(-25), Some(KeyType::Space));
        assert_eq!(KeyType::from_code(500), None);
    }

    #[test]
    fn key_constructors() {
        assert_eq!(KeyType::function(1), Some(KeyType::F1));
        assert_eq!(KeyType::function(12), Some(KeyType::F12));
        assert_eq!(KeyType::function(13), None);
        assert_eq!(KeyType::ctrl_letter('c'), Some(KeyType::CtrlC));
        assert_eq!(KeyType::ctrl_letter('M'), Some(KeyType::Enter));
        assert_eq!(KeyType::ctrl_letter('1'), None);
    }

    #[test]
    fn mouse_predicates() {
        let press = MouseMsg::new(10, 20, MouseButton::Left, MouseAction::Press);
        assert_eq!((press.x, press.y), (10, 20));
        assert!(press.is_press());
        assert!(!press.is_release());
        assert!(!press.is_motion());
        assert!(press.is_left());

        let release = MouseMsg::new(0, 0, MouseButton::Left, MouseAction::Release);
        assert!(release.is_release());
        assert!(!release.is_press());

        let motion = MouseMsg::new(0, 0, MouseButton::None, MouseAction::Motion);
        assert!(motion.is_motion());

        assert!(MouseMsg::new(0, 0, MouseButton::Right, MouseAction::Press).is_right());
        assert!(MouseMsg::new(0, 0, MouseButton::Middle, MouseAction::Press).is_middle());
        assert!(MouseMsg::new(0, 0, MouseButton::WheelUp, MouseAction::Press).is_wheel());
        assert!(MouseMsg::new(0, 0, MouseButton::WheelDown, MouseAction::Press).is_wheel());
        assert!(!press.is_wheel());
    }

    #[test]
    fn message_projections() {
        let msg: Message<u8> = Message::User(7);
        assert_eq!(msg.as_user(), Some(&7));
        assert!(msg.as_key().is_none());
        assert!(Message::<u8>::Quit.is_quit());

        let msg: Message<u8> = WindowSizeMsg::new(100, 50).into();
        assert_eq!(msg, Message::WindowSize(WindowSizeMsg { width: 100, height: 50 }));
    }
}
