/// Truncate a string to at most `max_chars` characters without splitting
/// a multi-byte character. Usage-sample labels come from free-form product
/// names, so byte-indexed slicing is not safe here.
#[inline]
pub fn safe_truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

/// Like [`safe_truncate`] but appends `...` when anything was cut off.
#[inline]
pub fn safe_truncate_ellipsis(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        format!("{}...", s.chars().take(max_chars).collect::<String>())
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_truncate_ascii() {
        assert_eq!(safe_truncate("Ethiopia Yirgacheffe", 8), "Ethiopia");
    }

    #[test]
    fn test_safe_truncate_multibyte() {
        assert_eq!(safe_truncate("Kaffee Röster München", 12), "Kaffee Röste");
    }

    #[test]
    fn test_safe_truncate_shorter() {
        assert_eq!(safe_truncate("V60", 10), "V60");
    }

    #[test]
    fn test_safe_truncate_ellipsis() {
        assert_eq!(safe_truncate_ellipsis("hello world", 5), "hello...");
        assert_eq!(safe_truncate_ellipsis("hi", 10), "hi");
    }
}
