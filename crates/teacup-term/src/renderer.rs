use crate::width::{display_width, truncate};
use crossterm::cursor::{MoveTo, MoveUp};
use crossterm::queue;
use crossterm::terminal::{Clear, ClearType};
use std::io::{self, Write};
use teacup_core::{DriverError, Renderer};
use tracing::trace;

/// Paints view strings line by line.
///
/// Each frame replaces the previous one in place: in alt-screen mode from
/// the top-left corner, inline by moving the cursor back up over the lines
/// painted last time.  An identical view is not repainted, lines beyond the
/// terminal height are dropped from the top, and each line is cut to the
/// terminal width.
pub struct LineRenderer<W: Write> {
    out: W,
    last_render: String,
    lines_rendered: usize,
    width: u16,
    height: u16,
    alt_screen: bool,
}

impl<W: Write> LineRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            last_render: String::new(),
            lines_rendered: 0,
            width: 0,
            height: 0,
            alt_screen: false,
        }
    }

    /// Number of lines the last frame occupied.
    pub fn lines_rendered(&self) -> usize {
        self.lines_rendered
    }

    pub fn writer(&self) -> &W {
        &self.out
    }

    pub fn into_writer(self) -> W {
        self.out
    }

    fn paint(&mut self, view: &str) -> io::Result<()> {
        if view == self.last_render {
            return Ok(());
        }

        let mut lines: Vec<&str> = view.split('\n').collect();
        let height = usize::from(self.height);
        if height > 0 && lines.len() > height {
            lines.drain(..lines.len() - height);
        }

        let mut buf = Vec::with_capacity(view.len() + 16 * lines.len());
        if self.alt_screen {
            queue!(buf, MoveTo(0, 0))?;
        } else {
            if self.lines_rendered > 1 {
                queue!(buf, MoveUp(cells(self.lines_rendered - 1)))?;
            }
            buf.push(b'\r');
        }

        let width = usize::from(self.width);
        for (i, line) in lines.iter().enumerate() {
            if width > 0 && display_width(line) > width {
                buf.extend_from_slice(truncate(line, width, "").as_bytes());
            } else {
                buf.extend_from_slice(line.as_bytes());
            }
            queue!(buf, Clear(ClearType::UntilNewLine))?;
            if i + 1 < lines.len() {
                buf.extend_from_slice(b"\r\n");
            }
        }

        if lines.len() < self.lines_rendered {
            for _ in lines.len()..self.lines_rendered {
                buf.extend_from_slice(b"\r\n");
                queue!(buf, Clear(ClearType::CurrentLine))?;
            }
            if !self.alt_screen {
                queue!(buf, MoveUp(cells(self.lines_rendered - lines.len())))?;
            }
        }
        if !self.alt_screen {
            buf.push(b'\r');
        }

        self.out.write_all(&buf)?;
        self.out.flush()?;
        trace!(lines = lines.len(), bytes = buf.len(), "frame painted");

        self.lines_rendered = lines.len();
        self.last_render = view.to_string();
        Ok(())
    }
}

fn cells(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}

impl<W: Write + Send + 'static> Renderer for LineRenderer<W> {
    fn render(&mut self, view: &str) -> Result<(), DriverError> {
        Ok(self.paint(view)?)
    }

    /// A size change forces the next frame to repaint.
    fn set_size(&mut self, width: u16, height: u16) {
        if (width, height) != (self.width, self.height) {
            self.width = width;
            self.height = height;
            self.last_render.clear();
        }
    }

    fn set_alt_screen(&mut self, enabled: bool) {
        self.alt_screen = enabled;
    }

    fn clear(&mut self) -> Result<(), DriverError> {
        queue!(self.out, Clear(ClearType::All), MoveTo(0, 0))?;
        self.out.flush()?;
        self.last_render.clear();
        self.lines_rendered = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ERASE_EOL: &str = "\x1b[K";
    const ERASE_LINE: &str = "\x1b[2K";

    fn output(renderer: &mut LineRenderer<Vec<u8>>) -> String {
        let text = String::from_utf8(renderer.out.clone()).unwrap();
        renderer.out.clear();
        text
    }

    #[test]
    fn inline_first_frame() {
        let mut r = LineRenderer::new(Vec::new());
        r.render("one\ntwo").unwrap();
        assert_eq!(
            output(&mut r),
            format!("\rone{ERASE_EOL}\r\ntwo{ERASE_EOL}\r")
        );
        assert_eq!(r.lines_rendered(), 2);
    }

    #[test]
    fn identical_frame_is_skipped() {
        let mut r = LineRenderer::new(Vec::new());
        r.render("same").unwrap();
        output(&mut r);
        r.render("same").unwrap();
        assert!(output(&mut r).is_empty());
    }

    #[test]
    fn inline_repaint_moves_up_and_erases_stale_lines() {
        let mut r = LineRenderer::new(Vec::new());
        r.render("a\nb\nc").unwrap();
        output(&mut r);
        r.render("x").unwrap();
        let out = output(&mut r);
        assert!(out.starts_with("\x1b[2A\r"), "{out:?}");
        assert_eq!(out.matches(ERASE_LINE).count(), 2);
        assert!(out.ends_with("\x1b[2A\r"), "{out:?}");
        assert_eq!(r.lines_rendered(), 1);
    }

    #[test]
    fn alt_screen_paints_from_home() {
        let mut r = LineRenderer::new(Vec::new());
        r.set_alt_screen(true);
        r.render("top\nbottom").unwrap();
        let out = output(&mut r);
        assert!(out.starts_with("\x1b[1;1H"), "{out:?}");
        assert_eq!(out, format!("\x1b[1;1Htop{ERASE_EOL}\r\nbottom{ERASE_EOL}"));
    }

    #[test]
    fn lines_are_truncated_to_width() {
        let mut r = LineRenderer::new(Vec::new());
        r.set_size(4, 10);
        r.render("abcdefgh\n日本語").unwrap();
        let out = output(&mut r);
        assert!(out.contains("abcd\x1b[K"));
        assert!(!out.contains('e'));
        assert!(out.contains("日本\x1b[K"));
    }

    #[test]
    fn only_last_height_lines_are_kept() {
        let mut r = LineRenderer::new(Vec::new());
        r.set_size(0, 2);
        r.render("1\n2\n3").unwrap();
        let out = output(&mut r);
        assert!(!out.contains('1'));
        assert!(out.contains('2') && out.contains('3'));
        assert_eq!(r.lines_rendered(), 2);
    }

    #[test]
    fn resize_forces_repaint() {
        let mut r = LineRenderer::new(Vec::new());
        r.render("view").unwrap();
        output(&mut r);
        r.set_size(80, 24);
        r.render("view").unwrap();
        assert!(!output(&mut r).is_empty());
        r.set_size(80, 24);
        r.render("view").unwrap();
        assert!(output(&mut r).is_empty());
    }

    #[test]
    fn clear_resets_state() {
        let mut r = LineRenderer::new(Vec::new());
        r.render("a\nb").unwrap();
        r.clear().unwrap();
        assert_eq!(r.lines_rendered(), 0);
        assert!(output(&mut r).ends_with("\x1b[2J\x1b[1;1H"));
        r.render("a\nb").unwrap();
        assert!(output(&mut r).starts_with('\r'));
    }
}
