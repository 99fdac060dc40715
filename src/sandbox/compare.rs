/// Normalizes program output for comparison: trims the whole text, trims every
/// line and drops blank lines.
pub fn normalize_output(text: &str) -> String {
    text.trim()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Compares actual output with the lab's expected output.
///
/// Whitespace around lines and blank lines are ignored; content and line order
/// must match exactly.
pub fn compare_output(actual: &str, expected: &str) -> bool {
    normalize_output(actual) == normalize_output(expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_is_reflexive() {
        for sample in ["", "1", "  a  \n\n b", "\n\n", "x\r\ny"] {
            assert!(compare_output(sample, sample), "not reflexive for {:?}", sample);
        }
    }

    #[test]
    fn test_compare_ignores_blank_lines_and_padding() {
        assert!(compare_output("1\n2\n\n", "1\n2"));
        assert!(compare_output("  1  \n\n   2", "1\n2"));
        assert!(compare_output("1\r\n2\r\n", "1\n2"));
    }

    #[test]
    fn test_compare_is_order_sensitive() {
        assert!(!compare_output("1\n2", "2\n1"));
    }

    #[test]
    fn test_compare_is_case_and_content_strict() {
        assert!(!compare_output("Hello", "hello"));
        assert!(!compare_output("a b", "a  b"));
    }

    #[test]
    fn test_normalize_output() {
        assert_eq!(normalize_output("\n  x \n\n\t y\t\n"), "x\ny");
        assert_eq!(normalize_output("   "), "");
    }
}
