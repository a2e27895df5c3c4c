use serde::Deserialize;
use std::time::Duration;

/// Mouse tracking granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseMode {
    /// Click, release, wheel, drag.
    CellMotion,
    /// All of above + hover.
    AllMotion,
}

/// Errors from building [`RunnerOptions`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid options file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("mouse_cell_motion and mouse_all_motion are mutually exclusive")]
    ConflictingMouseModes,
    #[error("fps must be at least 1, got {0}")]
    InvalidFps(u32),
    #[error("timeouts must be finite and non-negative, got {0}")]
    InvalidTimeout(f64),
    #[error("input_timeout must be greater than zero")]
    ZeroInputTimeout,
}

/// Shortest wait for terminal input while nothing else is pending.
pub const MIN_INPUT_WAIT: Duration = Duration::from_millis(1);

/// Configuration options for a [`Runner`](crate::Runner).
///
/// All fields have defaults (see [`Default`] impl).  Use struct update
/// syntax or the builder methods to override only what you need:
///
/// ```rust,ignore
/// use teacup_core::{MouseMode, RunnerOptions};
///
/// let opts = RunnerOptions {
///     fps: 30,
///     mouse_mode: Some(MouseMode::CellMotion),
///     ..RunnerOptions::default()
/// };
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RunnerOptions {
    /// Use the alternate screen (default: false).
    pub alt_screen: bool,
    /// Mouse tracking mode (default: off).
    pub mouse_mode: Option<MouseMode>,
    /// Enable bracketed paste (default: false).
    pub bracketed_paste: bool,
    /// Enable focus/blur reporting (default: false).
    pub report_focus: bool,
    /// Target frames per second (default: 60, clamped to 1..=120).
    pub fps: u32,
    /// Longest single wait for terminal input (default: 10s).  Values below
    /// [`MIN_INPUT_WAIT`] are raised to it.
    pub input_timeout: Duration,
    /// Grace period for one step of a [`Command::Sequence`](crate::Command::Sequence),
    /// counted past the step's own tick durations and delays, before the
    /// sequence moves on (default: 60s, `None` waits forever).
    pub sequence_step_timeout: Option<Duration>,
    /// Terminal window title set at startup (default: left alone).
    pub window_title: Option<String>,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            alt_screen: false,
            mouse_mode: None,
            bracketed_paste: false,
            report_focus: false,
            fps: 60,
            input_timeout: Duration::from_secs(10),
            sequence_step_timeout: Some(Duration::from_secs(60)),
            window_title: None,
        }
    }
}

impl RunnerOptions {
    pub fn with_alt_screen(mut self) -> Self {
        self.alt_screen = true;
        self
    }

    pub fn with_mouse_cell_motion(mut self) -> Self {
        self.mouse_mode = Some(MouseMode::CellMotion);
        self
    }

    pub fn with_mouse_all_motion(mut self) -> Self {
        self.mouse_mode = Some(MouseMode::AllMotion);
        self
    }

    pub fn with_bracketed_paste(mut self) -> Self {
        self.bracketed_paste = true;
        self
    }

    pub fn with_report_focus(mut self) -> Self {
        self.report_focus = true;
        self
    }

    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    pub fn with_input_timeout(mut self, timeout: Duration) -> Self {
        self.input_timeout = timeout;
        self
    }

    pub fn with_sequence_step_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.sequence_step_timeout = timeout;
        self
    }

    pub fn with_window_title(mut self, title: impl Into<String>) -> Self {
        self.window_title = Some(title.into());
        self
    }

    /// The input wait cap, never below [`MIN_INPUT_WAIT`].
    pub fn input_wait(&self) -> Duration {
        self.input_timeout.max(MIN_INPUT_WAIT)
    }

    /// Time between frames at the configured (clamped) fps.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.fps.clamp(1, 120) as f64)
    }

    /// Parse options from TOML using the recognized keys: `alt_screen`,
    /// `mouse_cell_motion`, `mouse_all_motion`, `bracketed_paste`,
    /// `report_focus`, `fps`, `input_timeout`, `sequence_step_timeout`
    /// (seconds; `0` disables the sequence bound) and `window_title`.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let file: OptionsFile = toml::from_str(text)?;
        file.try_into()
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct OptionsFile {
    alt_screen: bool,
    mouse_cell_motion: bool,
    mouse_all_motion: bool,
    bracketed_paste: bool,
    report_focus: bool,
    fps: u32,
    input_timeout: f64,
    sequence_step_timeout: f64,
    window_title: Option<String>,
}

impl Default for OptionsFile {
    fn default() -> Self {
        let defaults = RunnerOptions::default();
        Self {
            alt_screen: defaults.alt_screen,
            mouse_cell_motion: false,
            mouse_all_motion: false,
            bracketed_paste: defaults.bracketed_paste,
            report_focus: defaults.report_focus,
            fps: defaults.fps,
            input_timeout: defaults.input_timeout.as_secs_f64(),
            sequence_step_timeout: defaults
                .sequence_step_timeout
                .map_or(0.0, |t| t.as_secs_f64()),
            window_title: defaults.window_title,
        }
    }
}

fn seconds(value: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(value).map_err(|_| ConfigError::InvalidTimeout(value))
}

impl TryFrom<OptionsFile> for RunnerOptions {
    type Error = ConfigError;

    fn try_from(file: OptionsFile) -> Result<Self, ConfigError> {
        let mouse_mode = match (file.mouse_cell_motion, file.mouse_all_motion) {
            (true, true) => return Err(ConfigError::ConflictingMouseModes),
            (true, false) => Some(MouseMode::CellMotion),
            (false, true) => Some(MouseMode::AllMotion),
            (false, false) => None,
        };
        if file.fps == 0 {
            return Err(ConfigError::InvalidFps(file.fps));
        }
        let input_timeout = seconds(file.input_timeout)?;
        if input_timeout.is_zero() {
            return Err(ConfigError::ZeroInputTimeout);
        }
        let sequence_step_timeout = match seconds(file.sequence_step_timeout)? {
            t if t.is_zero() => None,
            t => Some(t),
        };
        Ok(Self {
            alt_screen: file.alt_screen,
            mouse_mode,
            bracketed_paste: file.bracketed_paste,
            report_focus: file.report_focus,
            fps: file.fps,
            input_timeout,
            sequence_step_timeout,
            window_title: file.window_title,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let opts = RunnerOptions::default();
        assert!(!opts.alt_screen);
        assert_eq!(opts.mouse_mode, None);
        assert!(!opts.bracketed_paste);
        assert!(!opts.report_focus);
        assert_eq!(opts.fps, 60);
        assert_eq!(opts.input_timeout, Duration::from_secs(10));
        assert_eq!(opts.sequence_step_timeout, Some(Duration::from_secs(60)));
    }

    #[test]
    fn builders() {
        let opts = RunnerOptions::default()
            .with_alt_screen()
            .with_mouse_cell_motion()
            .with_mouse_all_motion()
            .with_fps(30);
        assert!(opts.alt_screen);
        assert_eq!(opts.mouse_mode, Some(MouseMode::AllMotion));
        assert_eq!(opts.fps, 30);
    }

    #[test]
    fn frame_interval_clamps() {
        assert_eq!(RunnerOptions::default().with_fps(0).frame_interval(), Duration::from_secs(1));
        assert_eq!(
            RunnerOptions::default().with_fps(1000).frame_interval(),
            Duration::from_secs_f64(1.0 / 120.0)
        );
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(RunnerOptions::from_toml("").unwrap(), RunnerOptions::default());
    }

    #[test]
    fn toml_keys() {
        let opts = RunnerOptions::from_toml(
            "alt_screen = true\nmouse_all_motion = true\nfps = 30\ninput_timeout = 2.5\nsequence_step_timeout = 0\n",
        )
        .unwrap();
        assert!(opts.alt_screen);
        assert_eq!(opts.mouse_mode, Some(MouseMode::AllMotion));
        assert_eq!(opts.fps, 30);
        assert_eq!(opts.input_timeout, Duration::from_millis(2500));
        assert_eq!(opts.sequence_step_timeout, None);
    }

    #[test]
    fn input_wait_has_a_floor() {
        let opts = RunnerOptions::default().with_input_timeout(Duration::ZERO);
        assert_eq!(opts.input_wait(), MIN_INPUT_WAIT);
        assert_eq!(RunnerOptions::default().input_wait(), Duration::from_secs(10));
    }

    #[test]
    fn toml_window_title() {
        let opts = RunnerOptions::from_toml("window_title = \"clock\"").unwrap();
        assert_eq!(opts.window_title.as_deref(), Some("clock"));
        assert_eq!(RunnerOptions::default().window_title, None);
    }

    #[test]
    fn toml_rejects_both_mouse_modes() {
        let err = RunnerOptions::from_toml("mouse_cell_motion = true\nmouse_all_motion = true")
            .unwrap_err();
        assert!(matches!(err, ConfigError::ConflictingMouseModes));
    }

    #[test]
    fn toml_rejects_bad_values() {
        assert!(matches!(
            RunnerOptions::from_toml("fps = 0"),
            Err(ConfigError::InvalidFps(0))
        ));
        assert!(matches!(
            RunnerOptions::from_toml("input_timeout = -1.0"),
            Err(ConfigError::InvalidTimeout(_))
        ));
        assert!(matches!(
            RunnerOptions::from_toml("input_timeout = 0"),
            Err(ConfigError::ZeroInputTimeout)
        ));
        assert!(matches!(
            RunnerOptions::from_toml("frames = 3"),
            Err(ConfigError::Parse(_))
        ));
    }
}
