//! Display truncation that respects UTF-8 boundaries.

pub fn truncate(s: &str, max_len: usize) -> String {
    let s = s.replace('\n', " ");
    if s.len() <= max_len {
        s
    } else {
        let target_len = max_len.saturating_sub(3);
        let mut end = target_len;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &s[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_untouched() {
        assert_eq!(truncate("morning run", 20), "morning run");
    }

    #[test]
    fn test_long_text_gets_ellipsis() {
        assert_eq!(truncate("ran along the malecon\nat dawn", 12), "ran along...");
    }

    #[test]
    fn test_multibyte_boundary() {
        // 'ñ' is two bytes; the cut must not land inside it
        let out = truncate("mañanaaaaa", 6);
        assert!(out.ends_with("..."));
        assert!(out.len() <= 6);
    }
}
