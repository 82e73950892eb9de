//! Helpers for putting user-supplied text (usernames, comment bodies) into
//! single-line log records.

use std::fmt::Write;

/// Longest preview of user text kept in a log line, in characters.
pub const MAX_PREVIEW: usize = 80;

/// Escape control characters and cap the length at [`MAX_PREVIEW`] characters.
///
/// `\n`, `\r`, `\t` and backslash get their usual escapes, any other control
/// character becomes `\xNN`, and overlong input ends with `…`.
pub fn escape_log(s: &str) -> String {
    preview(s, MAX_PREVIEW)
}

/// [`escape_log`] with an explicit character cap.
pub fn preview(s: &str, max_chars: usize) -> String {
    let mut out = String::with_capacity(s.len().min(max_chars) + 4);
    for (count, ch) in s.chars().enumerate() {
        if count >= max_chars {
            out.push('…');
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(&mut out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}
