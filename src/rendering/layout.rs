/// Text fitting for fixed-width boxes.
///
/// Everything works at character granularity: card text is frequently CJK
/// or mixed-width, where word boundaries are not reliable break points.
/// Widths always come from a real glyph measurement ([`TextMeasure`]).

/// Suffix appended to shortened text.
pub const ELLIPSIS: &str = "…";

/// Lines of description shown on a card.
pub const MAX_DISPLAY_LINES: usize = 3;

/// Width measurement for a font at a fixed size.
pub trait TextMeasure {
    /// Advance width of `text` in logical pixels.
    fn measure(&self, text: &str) -> f32;
}

impl<T: TextMeasure + ?Sized> TextMeasure for &T {
    fn measure(&self, text: &str) -> f32 {
        (**self).measure(text)
    }
}

/// Return `text` unchanged when it fits, otherwise shorten it with
/// [`ellipsize`].
pub fn truncate_to_width(text: &str, font: &impl TextMeasure, max_width: f32) -> String {
    if font.measure(text) <= max_width {
        return text.to_string();
    }
    ellipsize(text, font, max_width)
}

/// Drop trailing characters until `prefix + "…"` fits in `max_width`.
/// The result always ends with the ellipsis; when not even one character
/// fits, it is the ellipsis alone.
pub fn ellipsize(text: &str, font: &impl TextMeasure, max_width: f32) -> String {
    let mut boundaries: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    boundaries.push(text.len());

    // boundaries[k] is the byte length of the first k characters
    for &end in boundaries.iter().rev() {
        let candidate = format!("{}{}", &text[..end], ELLIPSIS);
        if end == 0 || font.measure(&candidate) <= max_width {
            return candidate;
        }
    }
    ELLIPSIS.to_string()
}

/// Greedy character wrap. See [`WrapLines`].
pub fn wrap_to_width<'a, M: TextMeasure>(
    text: &'a str,
    font: &'a M,
    max_width: f32,
) -> WrapLines<'a, M> {
    WrapLines {
        rest: text,
        font,
        max_width,
    }
}

/// Lines produced by [`wrap_to_width`], computed lazily.
///
/// A line grows one character at a time until the next character would
/// push it past the width; that character then starts the next line. A
/// single character wider than the box still forms a line of its own, so
/// the lines always concatenate back to the input.
pub struct WrapLines<'a, M> {
    rest: &'a str,
    font: &'a M,
    max_width: f32,
}

impl<'a, M: TextMeasure> Iterator for WrapLines<'a, M> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.rest.is_empty() {
            return None;
        }

        let mut end = 0;
        for (idx, ch) in self.rest.char_indices() {
            let next_end = idx + ch.len_utf8();
            if end > 0 && self.font.measure(&self.rest[..next_end]) > self.max_width {
                break;
            }
            end = next_end;
        }

        let (line, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(line)
    }
}

/// Apply the display cap: two lines verbatim; when more than three lines
/// exist, the third is ellipsized to `max_width` and the rest dropped.
pub fn cap_lines<'a>(
    lines: impl IntoIterator<Item = &'a str>,
    font: &impl TextMeasure,
    max_width: f32,
) -> Vec<String> {
    let mut lines = lines.into_iter();
    let mut shown: Vec<String> = lines
        .by_ref()
        .take(MAX_DISPLAY_LINES)
        .map(str::to_string)
        .collect();

    if lines.next().is_some() {
        if let Some(last) = shown.last_mut() {
            *last = ellipsize(last, font, max_width);
        }
    }
    shown
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every char is 10px wide except CJK which is 20px.
    struct Mono;

    impl TextMeasure for Mono {
        fn measure(&self, text: &str) -> f32 {
            text.chars()
                .map(|c| if c as u32 > 0x2E80 { 20.0 } else { 10.0 })
                .sum()
        }
    }

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(truncate_to_width("Hello", &Mono, 50.0), "Hello");
    }

    #[test]
    fn long_text_is_cut_at_character_boundary() {
        // "…" measures 10 here, so 4 chars + ellipsis = 50
        assert_eq!(truncate_to_width("Hello world", &Mono, 50.0), "Hell…");
        let out = truncate_to_width("你好世界你好", &Mono, 70.0);
        assert_eq!(out, "你好世…");
        assert!(Mono.measure(&out) <= 70.0);
    }

    #[test]
    fn ellipsis_alone_when_nothing_fits() {
        assert_eq!(truncate_to_width("你好", &Mono, 15.0), ELLIPSIS);
        assert_eq!(truncate_to_width("abc", &Mono, 0.0), ELLIPSIS);
    }

    #[test]
    fn truncated_width_never_exceeds_bound() {
        let text = "The quick brown fox 跳过了 the lazy dog";
        for bound in (10..400).step_by(7) {
            let out = truncate_to_width(text, &Mono, bound as f32);
            assert!(Mono.measure(&out) <= bound as f32, "bound {}: {:?}", bound, out);
        }
    }

    #[test]
    fn wrap_is_a_partition() {
        let text = "中文和English混合的一段比较长的描述文字，用来测试换行。";
        for bound in [25.0, 60.0, 100.0, 1000.0] {
            let lines: Vec<&str> = wrap_to_width(text, &Mono, bound).collect();
            assert_eq!(lines.concat(), text);
            for line in &lines {
                assert!(Mono.measure(line) <= bound || line.chars().count() == 1);
            }
        }
    }

    #[test]
    fn wrap_breaks_greedily() {
        let lines: Vec<&str> = wrap_to_width("abcdefg", &Mono, 30.0).collect();
        assert_eq!(lines, vec!["abc", "def", "g"]);
    }

    #[test]
    fn wrap_of_empty_text_is_empty() {
        assert_eq!(wrap_to_width("", &Mono, 30.0).count(), 0);
    }

    #[test]
    fn wide_character_gets_its_own_line() {
        let lines: Vec<&str> = wrap_to_width("a字b", &Mono, 15.0).collect();
        assert_eq!(lines, vec!["a", "字", "b"]);
    }

    #[test]
    fn one_or_two_lines_shown_verbatim() {
        let lines = cap_lines(wrap_to_width("abcdef", &Mono, 30.0), &Mono, 30.0);
        assert_eq!(lines, vec!["abc", "def"]);
    }

    #[test]
    fn exactly_three_lines_get_no_ellipsis() {
        let lines = cap_lines(wrap_to_width("abcdefghi", &Mono, 30.0), &Mono, 30.0);
        assert_eq!(lines, vec!["abc", "def", "ghi"]);
    }

    #[test]
    fn more_than_three_lines_end_with_ellipsis() {
        let lines = cap_lines(wrap_to_width("abcdefghijklmn", &Mono, 30.0), &Mono, 30.0);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2], "gh…");
        assert!(Mono.measure(&lines[2]) <= 30.0);
    }

    #[test]
    fn short_third_line_just_gains_ellipsis() {
        let lines = cap_lines(["ab", "cd", "e", "f"], &Mono, 30.0);
        assert_eq!(lines, vec!["ab", "cd", "e…"]);
    }
}
