//! Status glyphs for terminal output
//!
//! Windows consoles get ASCII stand-ins.

const UNICODE: bool = !cfg!(windows);

pub const CHECK: &str = if UNICODE { "\u{2713}" } else { "[OK]" };
pub const CROSS: &str = if UNICODE { "\u{2717}" } else { "[X]" };
pub const WARN: &str = if UNICODE { "!" } else { "[!]" };

/// Horizontal rule under table headers
pub fn rule(width: usize) -> String {
    (if UNICODE { "\u{2500}" } else { "-" }).repeat(width)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_width() {
        assert_eq!(rule(4).chars().count(), 4);
        assert!(rule(0).is_empty());
    }
}
