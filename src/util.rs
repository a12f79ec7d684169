//! Helpers for digging JSON out of free-form LLM replies.

use regex::Regex;
use std::sync::LazyLock;

static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```(?:json)?\s*").expect("code fence pattern is valid"));

/// Remove markdown code fences (```` ```json ```` / ```` ``` ````) and trim.
pub fn strip_code_fences(text: &str) -> String {
    CODE_FENCE.replace_all(text, "").trim().to_string()
}

/// Extract the outermost JSON object from text that may contain other content.
pub fn extract_json_object(text: &str) -> Option<String> {
    extract_balanced(text, '{', '}')
}

/// Extract the outermost JSON array from text that may contain other content.
pub fn extract_json_array(text: &str) -> Option<String> {
    extract_balanced(text, '[', ']')
}

/// Bracket counting that ignores brackets inside string literals.
fn extract_balanced(text: &str, open: char, close: char) -> Option<String> {
    let start = text.find(open)?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            c if c == open => depth += 1,
            c if c == close => {
                depth -= 1;
                if depth == 0 {
                    let end = start + i + ch.len_utf8();
                    return Some(text[start..end].to_string());
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fences() {
        let text = "```json\n{\"candidateId\": 4}\n```";
        assert_eq!(strip_code_fences(text), r#"{"candidateId": 4}"#);
    }

    #[test]
    fn test_strip_code_fences_plain_text_untouched() {
        assert_eq!(strip_code_fences("  {\"a\": 1}  "), r#"{"a": 1}"#);
    }

    #[test]
    fn test_extract_json_object_with_prefix_and_suffix() {
        let text = r#"Sure! {"candidateId": 7, "rationale": "fits"} Good luck."#;
        assert_eq!(
            extract_json_object(text).as_deref(),
            Some(r#"{"candidateId": 7, "rationale": "fits"}"#)
        );
    }

    #[test]
    fn test_extract_json_object_nested() {
        let text = r#"{"outer": {"inner": 1}}"#;
        assert_eq!(extract_json_object(text).as_deref(), Some(text));
    }

    #[test]
    fn test_extract_json_object_ignores_braces_in_strings() {
        let text = r#"{"rationale": "uses a {hybrid} scheme", "candidateId": 3} trailing }"#;
        assert_eq!(
            extract_json_object(text).as_deref(),
            Some(r#"{"rationale": "uses a {hybrid} scheme", "candidateId": 3}"#)
        );
    }

    #[test]
    fn test_extract_json_object_handles_escaped_quotes() {
        let text = r#"{"rationale": "the \"QB}\" of the future"}"#;
        assert_eq!(extract_json_object(text).as_deref(), Some(text));
    }

    #[test]
    fn test_extract_json_object_unclosed() {
        assert_eq!(extract_json_object(r#"{"key": "value""#), None);
    }

    #[test]
    fn test_extract_json_object_no_json() {
        assert_eq!(extract_json_object("No JSON here"), None);
    }

    #[test]
    fn test_extract_json_array() {
        let text = r#"Grades: [{"grade": "A"}, {"grade": "B+"}]"#;
        assert_eq!(
            extract_json_array(text).as_deref(),
            Some(r#"[{"grade": "A"}, {"grade": "B+"}]"#)
        );
    }
}
