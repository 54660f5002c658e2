//! Pull JSON documents out of free-form generator responses
//!
//! Responses arrive wrapped in prose, markdown fences, or several towns at
//! once. Extraction is brace matching that reads strings and comments the
//! same way `sanitize` does, so a brace inside a single-quoted value or a
//! `//` note never ends a document early. It does not validate anything.

use crate::llm::repair::{closes_single_quote, single_quote_opens_after, skip_comment};

/// Every top-level `{...}` span in the response, in order.
///
/// An object still open at the end of the text is returned up to the end,
/// so truncation repair gets a chance at it.
pub fn extract_documents(response: &str) -> Vec<&str> {
    let offsets: Vec<usize> = response.char_indices().map(|(pos, _)| pos).collect();
    let chars: Vec<char> = response.chars().collect();

    let mut documents = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut quote: Option<char> = None;
    // Last character of structure, comments excluded
    let mut prev: Option<char> = None;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if depth == 0 {
            if c == '{' {
                start = offsets[i];
                depth = 1;
                prev = Some(c);
            }
            i += 1;
            continue;
        }

        if let Some(q) = quote {
            match c {
                '\\' => {
                    i += 2;
                    continue;
                }
                '"' if q == '"' => quote = None,
                '\'' if q == '\'' && closes_single_quote(chars.get(i + 1)) => quote = None,
                _ => {}
            }
            prev = Some(c);
            i += 1;
            continue;
        }

        match c {
            '/' if matches!(chars.get(i + 1), Some('/') | Some('*')) => {
                i = skip_comment(&chars, i);
                continue;
            }
            '"' => quote = Some('"'),
            '\'' if single_quote_opens_after(prev) => quote = Some('\''),
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    documents.push(&response[start..=offsets[i]]);
                }
            }
            _ => {}
        }
        prev = Some(c);
        i += 1;
    }

    if depth > 0 {
        documents.push(&response[start..]);
    }

    documents
}

/// The first JSON object in the response, if any
pub fn extract_json(response: &str) -> Option<&str> {
    extract_documents(response).into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_simple() {
        let response = r#"{"name": "Tombstone"}"#;
        assert_eq!(extract_json(response), Some(response));
    }

    #[test]
    fn test_extract_json_with_surrounding_text() {
        let response = "Here is your town:\n```json\n{\"name\": \"Bisbee\", \"streets\": []}\n```\nEnjoy!";
        let json = extract_json(response).unwrap();
        assert!(json.starts_with('{'));
        assert!(json.ends_with('}'));
        assert!(json.contains("Bisbee"));
    }

    #[test]
    fn test_extract_multiple_documents() {
        let response = r#"First: {"name": "A", "x": {"y": 1}} and second: {"name": "B"}"#;
        let docs = extract_documents(response);
        assert_eq!(docs, vec![r#"{"name": "A", "x": {"y": 1}}"#, r#"{"name": "B"}"#]);
    }

    #[test]
    fn test_braces_inside_strings_ignored() {
        let response = r#"{"name": "Curly } Town", "note": "a \" { quote"}"#;
        assert_eq!(extract_documents(response), vec![response]);
    }

    #[test]
    fn test_braces_inside_single_quotes_ignored() {
        let response = "Town: {'name': 'Curly } Town', 'motto': 'it's {fine}'} done";
        assert_eq!(
            extract_documents(response),
            vec!["{'name': 'Curly } Town', 'motto': 'it's {fine}'}"]
        );
    }

    #[test]
    fn test_braces_inside_comments_ignored() {
        let response = "{\"name\": \"Bisbee\", // closes with }\n /* { */ \"streets\": []}";
        assert_eq!(extract_documents(response), vec![response]);
    }

    #[test]
    fn test_apostrophe_in_bare_word_not_a_string() {
        let response = "{\"a\": 1, b's: 2} {\"name\": \"B\"}";
        assert_eq!(extract_documents(response).len(), 2);
    }

    #[test]
    fn test_unbalanced_tail_returned() {
        let response = r#"Town: {"name": "Cut", "streets": [{"name": "Ma"#;
        let docs = extract_documents(response);
        assert_eq!(docs.len(), 1);
        assert!(docs[0].starts_with(r#"{"name": "Cut""#));
    }

    #[test]
    fn test_no_json_found() {
        assert!(extract_json("I can't build that town.").is_none());
        assert!(extract_documents("").is_empty());
    }
}
