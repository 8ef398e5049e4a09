//! HTML escaping
//!
//! Turns untrusted text into inert markup text. Only escaping is done here;
//! there is no allow-list sanitizer.

/// Escape markup-significant characters so `input` renders as literal text.
///
/// `&`, `<`, `>`, `"` and `'` are replaced with entities, which also makes the
/// output safe inside quoted attribute values.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_script_tag() {
        assert_eq!(
            escape_html("<script>alert('x')</script>"),
            "&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"
        );
    }

    #[test]
    fn test_escape_attribute_breakout() {
        let escaped = escape_html(r#"" onerror="steal()"#);
        assert!(!escaped.contains('"'));
        assert!(escaped.starts_with("&quot;"));
    }

    #[test]
    fn test_escape_ampersand_first() {
        assert_eq!(escape_html("&lt;"), "&amp;lt;");
    }

    #[test]
    fn test_plain_text_untouched() {
        assert_eq!(escape_html("Grüße aus Lektion 3"), "Grüße aus Lektion 3");
        assert_eq!(escape_html(""), "");
    }
}
