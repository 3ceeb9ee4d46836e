//! Size-bounded window splitter with exact character overlap.

/// Cut `text` into windows of at most `chunk_size` characters where every
/// window after the first starts with exactly the last `chunk_overlap`
/// characters of its predecessor.
///
/// Cut points prefer soft boundaries (paragraph break, then sentence end,
/// then word boundary) and fall back to a hard character cut when none
/// exists inside the window. Sizes are in characters, not bytes.
pub fn split_windows(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    debug_assert!(chunk_overlap < chunk_size);

    if text.chars().all(char::is_whitespace) {
        return Vec::new();
    }

    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();
    if total <= chunk_size {
        return vec![text.to_string()];
    }

    let mut windows = Vec::new();
    let mut start = 0usize;
    loop {
        if total - start <= chunk_size {
            windows.push(chars[start..].iter().collect());
            break;
        }
        // The cut must land past the overlap region or the splitter would
        // stop advancing.
        let min_end = start + chunk_overlap + 1;
        let limit = start + chunk_size;
        let end = soft_boundary(&chars, min_end, limit).unwrap_or(limit);
        windows.push(chars[start..end].iter().collect());
        start = end - chunk_overlap;
    }
    windows
}

/// Best cut position in `(min_end..=limit]`, preferring the coarsest
/// boundary kind over the latest position. Positions point just past the
/// boundary, so separators stay with the preceding window.
fn soft_boundary(chars: &[char], min_end: usize, limit: usize) -> Option<usize> {
    let is_paragraph = |end: usize| end >= 2 && chars[end - 1] == '\n' && chars[end - 2] == '\n';
    let is_sentence = |end: usize| {
        end >= 2 && chars[end - 1].is_whitespace() && matches!(chars[end - 2], '.' | '!' | '?')
    };
    let is_word = |end: usize| chars[end - 1].is_whitespace();

    for check in [
        &is_paragraph as &dyn Fn(usize) -> bool,
        &is_sentence,
        &is_word,
    ] {
        if let Some(end) = (min_end..=limit).rev().find(|&end| check(end)) {
            return Some(end);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_one_window() {
        let windows = split_windows("short text", 500, 30);
        assert_eq!(windows, vec!["short text".to_string()]);
    }

    #[test]
    fn whitespace_only_yields_nothing() {
        assert!(split_windows("   \n\n\t  ", 500, 30).is_empty());
        assert!(split_windows("", 500, 30).is_empty());
    }

    #[test]
    fn windows_respect_the_size_limit() {
        let text = "lorem ipsum dolor sit amet ".repeat(40);
        for window in split_windows(&text, 100, 10) {
            assert!(window.chars().count() <= 100, "window too long: {window:?}");
        }
    }

    #[test]
    fn overlap_repeats_exactly() {
        let text = "one two three four five six seven eight nine ten ".repeat(20);
        let windows = split_windows(&text, 120, 15);
        assert!(windows.len() > 2);
        for pair in windows.windows(2) {
            let tail: String = pair[0].chars().rev().take(15).collect::<Vec<_>>()
                .into_iter().rev().collect();
            let head: String = pair[1].chars().take(15).collect();
            assert_eq!(tail, head);
        }
    }

    #[test]
    fn prefers_paragraph_boundaries() {
        let para = "a".repeat(400);
        let text = format!("{para}\n\n{para}\n\n{para}");
        let windows = split_windows(&text, 500, 30);
        assert_eq!(windows.len(), 3);
        assert!(windows[0].ends_with("\n\n"));
        assert_eq!(windows[0].chars().count(), 402);
        // Exact 30-character overlap between neighbours.
        let tail: String = windows[0].chars().skip(402 - 30).collect();
        let head: String = windows[1].chars().take(30).collect();
        assert_eq!(tail, head);
    }

    #[test]
    fn falls_back_to_sentence_then_word() {
        let text = format!("{}. {}", "x".repeat(80), "y z ".repeat(60));
        let windows = split_windows(&text, 100, 5);
        assert!(windows[0].ends_with(". "));
    }

    #[test]
    fn hard_cut_when_no_boundary_exists() {
        let text = "q".repeat(1000);
        let windows = split_windows(&text, 100, 10);
        assert_eq!(windows[0].chars().count(), 100);
        for window in &windows {
            assert!(window.chars().count() <= 100);
        }
    }

    #[test]
    fn multibyte_text_cuts_on_char_boundaries() {
        let text = "んにちはせかい ".repeat(50);
        let windows = split_windows(&text, 60, 8);
        for window in &windows {
            assert!(window.chars().count() <= 60);
        }
        // Reassembly sanity: strip each window's overlap prefix and compare.
        let mut rebuilt = windows[0].clone();
        for window in &windows[1..] {
            rebuilt.extend(window.chars().skip(8));
        }
        assert_eq!(rebuilt, text);
    }
}
