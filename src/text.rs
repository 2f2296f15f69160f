//! Text normalization for fetched payloads and outgoing messages.

use once_cell::sync::OnceCell;

/// Strip markup from a raw payload: decode HTML entities, drop tags,
/// collapse whitespace. Pure; an unusable payload yields an empty string.
pub fn strip_markup(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, " ").to_string();

    // 3) Collapse whitespace
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();

    out.trim().to_string()
}

/// Truncate to at most `max_chars` characters (not bytes), appending `…`
/// when anything was cut. Prefers the last whitespace inside the budget so
/// words survive intact, but only when that whitespace sits in the final
/// 30% of the cut; otherwise cuts at the character boundary.
pub fn truncate_graceful(s: &str, max_chars: usize) -> String {
    if max_chars == 0 {
        return String::new();
    }
    if s.chars().count() <= max_chars {
        return s.to_string();
    }

    // Reserve one char for the ellipsis.
    let budget = max_chars.saturating_sub(1);
    let cut: String = s.chars().take(budget).collect();

    let min_keep = budget.saturating_mul(7) / 10;
    let trimmed = match cut.rfind(char::is_whitespace) {
        Some(pos) if cut[..pos].chars().count() >= min_keep => cut[..pos].trim_end().to_string(),
        _ => cut,
    };

    format!("{trimmed}…")
}

/// Flatten summarizer output to a single trimmed line.
pub fn single_line(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut prev_space = false;
    for ch in input.chars() {
        let c = match ch {
            '\r' | '\n' | '\t' => ' ',
            c => c,
        };
        if c == ' ' {
            if !prev_space && !out.is_empty() {
                out.push(' ');
            }
            prev_space = true;
        } else {
            out.push(c);
            prev_space = false;
        }
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_markup_removes_tags_and_entities() {
        let s = "<p>Hello &amp; welcome to the <b>show</b></p>";
        assert_eq!(strip_markup(s), "Hello & welcome to the show");
    }

    #[test]
    fn strip_markup_collapses_whitespace() {
        let s = "a\n\n  b\t c";
        assert_eq!(strip_markup(s), "a b c");
    }

    #[test]
    fn strip_markup_empty_payload_is_empty() {
        assert_eq!(strip_markup("<br/><img src='x'/>"), "");
    }

    #[test]
    fn truncate_short_input_is_untouched() {
        assert_eq!(truncate_graceful("hello", 10), "hello");
    }

    #[test]
    fn truncate_prefers_whitespace_boundary() {
        let s = "one two three four five six seven";
        let out = truncate_graceful(s, 20);
        assert!(out.chars().count() <= 20);
        assert!(out.ends_with('…'));
        // No half-word before the ellipsis.
        let body = out.trim_end_matches('…');
        assert!(s.starts_with(body));
        assert!(!body.ends_with(char::is_alphabetic) || s.split_whitespace().any(|w| body.ends_with(w)));
    }

    #[test]
    fn truncate_is_char_boundary_safe_on_multibyte() {
        let s = "ääääääääääääääääääää"; // 20 two-byte chars
        let out = truncate_graceful(s, 10);
        assert_eq!(out.chars().count(), 10);
        assert!(out.ends_with('…'));
    }

    #[test]
    fn truncate_without_usable_whitespace_cuts_hard() {
        let s = "abcdefghijklmnopqrstuvwxyz";
        let out = truncate_graceful(s, 10);
        assert_eq!(out, "abcdefghi…");
    }

    #[test]
    fn single_line_flattens_newlines() {
        assert_eq!(single_line("a\nb\r\n  c  "), "a b c");
    }
}
