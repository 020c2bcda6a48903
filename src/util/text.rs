use std::borrow::Cow;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const ELLIPSIS: &str = "...";
const ELLIPSIS_WIDTH: usize = 3;

/// Display width of a string in terminal columns (CJK and emoji count as two).
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Lowercases `s` one character at a time.
///
/// Unlike `str::to_lowercase` there is no context-sensitive final sigma, so
/// folding commutes with concatenation: if `fold_case(a)` contains
/// `fold_case(b)`, it also contains the fold of every prefix of `b`.
pub fn fold_case(s: &str) -> String {
    s.chars().flat_map(char::to_lowercase).collect()
}

/// Truncates `s` so it occupies at most `max_width` terminal columns.
///
/// Appends `...` when text was cut and there is room for it. Returns
/// `Cow::Borrowed` when the string already fits.
///
/// ```
/// use newsdash::util::truncate_to_width;
///
/// assert_eq!(truncate_to_width("Short", 10), "Short");
/// assert_eq!(truncate_to_width("Clinical trial results", 12), "Clinical ...");
/// assert_eq!(truncate_to_width("FDA", 2), "FD");
/// ```
pub fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    if display_width(s) <= max_width {
        return Cow::Borrowed(s);
    }

    // Too narrow for text plus ellipsis: keep whatever fits.
    let budget = if max_width <= ELLIPSIS_WIDTH {
        max_width
    } else {
        max_width - ELLIPSIS_WIDTH
    };

    let mut used = 0;
    let mut cut = 0;
    for (idx, c) in s.char_indices() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        cut = idx + c.len_utf8();
    }

    if max_width <= ELLIPSIS_WIDTH {
        Cow::Owned(s[..cut].to_string())
    } else {
        Cow::Owned(format!("{}{}", &s[..cut], ELLIPSIS))
    }
}

/// Removes terminal control characters and ANSI escape sequences.
///
/// Feed text is rendered straight into the terminal, so anything that could
/// move the cursor, recolour output or set the window title is dropped.
/// Tab, newline and carriage return survive.
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    let is_control = |c: char| c == '\u{7f}' || (c < ' ' && c != '\t' && c != '\n' && c != '\r');

    if !s.chars().any(is_control) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\u{1b}' {
            if !is_control(c) {
                out.push(c);
            }
            continue;
        }

        match chars.peek() {
            // CSI: parameters until a final byte in 0x40..=0x7e
            Some('[') => {
                chars.next();
                for c in chars.by_ref() {
                    if ('\u{40}'..='\u{7e}').contains(&c) {
                        break;
                    }
                }
            }
            // OSC: until BEL or ST (ESC \)
            Some(']') => {
                chars.next();
                while let Some(c) = chars.next() {
                    if c == '\u{07}' {
                        break;
                    }
                    if c == '\u{1b}' && chars.peek() == Some(&'\\') {
                        chars.next();
                        break;
                    }
                }
            }
            _ => {}
        }
    }

    Cow::Owned(out)
}

/// Sanitises a text field from the feed.
///
/// Strips control characters, trims surrounding whitespace and returns `None`
/// when nothing is left, so "present but blank" and "absent" are treated alike.
pub fn clean_feed_text(raw: Option<&str>) -> Option<String> {
    let stripped = strip_control_chars(raw?);
    let trimmed = stripped.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_case_keeps_sigma_uniform() {
        assert_eq!(fold_case("ΑΣ"), "ασ");
        assert_eq!(fold_case("ΑΣΒ"), "ασβ");
        assert_eq!(fold_case("Vaccine İ"), "vaccine i\u{307}");
        assert!(fold_case("ΑΣΒ news").contains(&fold_case("ΑΣ")));
    }

    #[test]
    fn test_truncate_fits_is_borrowed() {
        let out = truncate_to_width("Pharma", 10);
        assert!(matches!(out, Cow::Borrowed(_)));
        assert_eq!(out, "Pharma");
    }

    #[test]
    fn test_truncate_appends_ellipsis() {
        assert_eq!(truncate_to_width("Hello World", 8), "Hello...");
    }

    #[test]
    fn test_truncate_cjk() {
        // Each CJK char is two columns wide
        assert_eq!(truncate_to_width("你好世界", 7), "你好...");
    }

    #[test]
    fn test_truncate_narrow_widths() {
        assert_eq!(truncate_to_width("Test!", 0), "");
        assert_eq!(truncate_to_width("Test!", 1), "T");
        assert_eq!(truncate_to_width("Test!", 3), "Tes");
    }

    #[test]
    fn test_strip_clean_text_borrowed() {
        let out = strip_control_chars("Plain headline");
        assert!(matches!(out, Cow::Borrowed(_)));
    }

    #[test]
    fn test_strip_ansi_csi() {
        assert_eq!(strip_control_chars("\x1b[31mred\x1b[0m"), "red");
    }

    #[test]
    fn test_strip_osc_bel_and_st() {
        assert_eq!(strip_control_chars("a\x1b]0;title\x07b"), "ab");
        assert_eq!(strip_control_chars("a\x1b]0;title\x1b\\b"), "ab");
    }

    #[test]
    fn test_strip_keeps_whitespace_controls() {
        assert_eq!(strip_control_chars("a\tb\nc\u{0}d"), "a\tb\ncd");
    }

    #[test]
    fn test_clean_feed_text() {
        assert_eq!(clean_feed_text(None), None);
        assert_eq!(clean_feed_text(Some("   ")), None);
        assert_eq!(clean_feed_text(Some("\u{7}")), None);
        assert_eq!(
            clean_feed_text(Some("  FDA approves drug \n")).as_deref(),
            Some("FDA approves drug")
        );
    }
}
