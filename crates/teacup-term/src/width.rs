//! Display-width measurement and truncation for rendered lines.
//!
//! Widths come from `unicode-width`; ANSI escape sequences (CSI, OSC and
//! two-byte escapes) occupy no cells and survive truncation, so a line that
//! ends in a style reset still resets after it is cut.

use unicode_width::UnicodeWidthChar;

/// One piece of a line: an escape sequence or a visible character.
enum Piece<'a> {
    Escape(&'a str),
    Char(char),
}

/// Split `s` into escape sequences and visible characters.
fn pieces(s: &str) -> impl Iterator<Item = Piece<'_>> {
    let mut rest = s;
    std::iter::from_fn(move || {
        let c = rest.chars().next()?;
        if c != '\x1b' {
            rest = &rest[c.len_utf8()..];
            return Some(Piece::Char(c));
        }
        let len = escape_len(rest);
        let (esc, tail) = rest.split_at(len);
        rest = tail;
        Some(Piece::Escape(esc))
    })
}

/// Byte length of the escape sequence at the start of `s` (which begins
/// with ESC).  An unterminated sequence runs to the end of the string.
fn escape_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    match bytes.get(1) {
        None => 1,
        // CSI: parameters and intermediates, then one final byte.
        Some(b'[') => bytes[2..]
            .iter()
            .position(|b| (0x40..=0x7e).contains(b))
            .map_or(bytes.len(), |i| i + 3),
        // OSC: terminated by BEL or ST.
        Some(b']') => {
            let mut i = 2;
            while i < bytes.len() {
                match bytes[i] {
                    0x07 => return i + 1,
                    0x1b if bytes.get(i + 1) == Some(&b'\\') => return i + 2,
                    _ => i += 1,
                }
            }
            bytes.len()
        }
        Some(_) => 1 + s[1..].chars().next().map_or(0, char::len_utf8),
    }
}

fn char_width(c: char) -> usize {
    c.width().unwrap_or(0)
}

/// Display width of `s` in terminal cells, ignoring escape sequences.
///
/// ```
/// use teacup_term::width::display_width;
///
/// assert_eq!(display_width("hello"), 5);
/// assert_eq!(display_width("日本"), 4);
/// assert_eq!(display_width("\x1b[1mbold\x1b[0m"), 4);
/// ```
pub fn display_width(s: &str) -> usize {
    pieces(s)
        .map(|piece| match piece {
            Piece::Escape(_) => 0,
            Piece::Char(c) => char_width(c),
        })
        .sum()
}

/// Truncate `s` to at most `max_width` cells, appending `tail` when
/// anything was cut.  The result including the tail never exceeds
/// `max_width`.  Escape sequences past the cut are kept.
///
/// ```
/// use teacup_term::width::truncate;
///
/// assert_eq!(truncate("hello world", 8, "..."), "hello...");
/// assert_eq!(truncate("hi", 10, "..."), "hi");
/// ```
pub fn truncate(s: &str, max_width: usize, tail: &str) -> String {
    if display_width(s) <= max_width {
        return s.to_string();
    }

    let tail_width = display_width(tail);
    let (budget, tail) = if tail_width > max_width {
        (max_width, "")
    } else {
        (max_width - tail_width, tail)
    };

    let mut result = String::with_capacity(s.len());
    let mut width = 0;
    let mut cut = false;
    for piece in pieces(s) {
        match piece {
            Piece::Escape(esc) => result.push_str(esc),
            Piece::Char(c) if !cut => {
                let cw = char_width(c);
                if width + cw > budget {
                    cut = true;
                    result.push_str(tail);
                } else {
                    result.push(c);
                    width += cw;
                }
            }
            Piece::Char(_) => {}
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_ascii_and_wide() {
        assert_eq!(display_width(""), 0);
        assert_eq!(display_width("hello"), 5);
        assert_eq!(display_width("日本語"), 6);
        assert_eq!(display_width("a日b"), 4);
    }

    #[test]
    fn width_skips_escapes() {
        assert_eq!(display_width("\x1b[31mred\x1b[0m"), 3);
        assert_eq!(display_width("\x1b]0;title\x07x"), 1);
        assert_eq!(display_width("\x1b]8;;http://x\x1b\\link"), 4);
        assert_eq!(display_width("\x1b7a"), 1);
    }

    #[test]
    fn truncate_fits_unchanged() {
        assert_eq!(truncate("hello", 5, ""), "hello");
    }

    #[test]
    fn truncate_plain() {
        assert_eq!(truncate("hello world", 5, ""), "hello");
        assert_eq!(truncate("hello world", 8, "..."), "hello...");
    }

    #[test]
    fn truncate_wide_chars_do_not_split() {
        assert_eq!(truncate("日本語", 3, ""), "日");
        assert_eq!(truncate("日本語", 5, "…"), "日本…");
    }

    #[test]
    fn truncate_keeps_trailing_reset() {
        assert_eq!(
            truncate("\x1b[1mbold text\x1b[0m", 4, ""),
            "\x1b[1mbold\x1b[0m"
        );
    }

    #[test]
    fn truncate_tail_wider_than_budget() {
        assert_eq!(truncate("hello", 2, "..."), "he");
    }

    #[test]
    fn unterminated_escape_is_swallowed() {
        assert_eq!(display_width("ab\x1b[12"), 2);
        assert_eq!(display_width("ab\x1b"), 2);
    }
}
