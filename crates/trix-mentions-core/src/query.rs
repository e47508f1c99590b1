//! Trigger-key query detection.
//!
//! Given the document text and the cursor, finds the most recent trigger key
//! before the cursor and decides whether the text between them is a query.
//! Pure: the same inputs always give the same answer.

/// Matcher state carried between evaluations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// Allow spaces inside the query (bounded by newlines and periods).
    pub multi_word: bool,
    /// Trigger keys starting before this offset are ignored.
    pub look_back_index: usize,
    /// `position` of the currently tracked match, if any.
    pub last_match_position: Option<usize>,
}

/// A detected query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryMatch {
    /// Text between the trigger key and the cursor.
    pub text: String,
    /// Offset just after the trigger key.
    pub position: usize,
}

/// Characters that may precede a trigger key.
fn is_boundary(c: char) -> bool {
    c.is_whitespace() || c == '(' || c == '['
}

/// Find the last occurrence of `needle` starting at or before `from`.
fn last_index_of(haystack: &[char], needle: &[char], from: usize) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    let last_start = from.min(haystack.len() - needle.len());
    (0..=last_start)
        .rev()
        .find(|&i| haystack[i..i + needle.len()] == *needle)
}

/// Whether `c` occurs after `key_index` and before `cursor`.
fn occurs_between(chars: &[char], c: char, key_index: usize, cursor: usize) -> bool {
    chars[key_index + 1..cursor].contains(&c)
}

/// Detect the query for `key` ending at `cursor`.
///
/// Returns `None` when there is no trigger key before the cursor, when it
/// starts before the look-back index, when the query breaks the single-word
/// or multi-word rules, or when the key does not start a word.
pub fn query(text: &str, key: &str, cursor: usize, options: QueryOptions) -> Option<QueryMatch> {
    if key.is_empty() {
        return None;
    }

    let chars: Vec<char> = text.chars().collect();
    let key: Vec<char> = key.chars().collect();
    let cursor = cursor.min(chars.len());

    let mut key_index = last_index_of(&chars, &key, cursor.checked_sub(1)?)?;
    if key_index < options.look_back_index {
        return None;
    }

    if options.multi_word {
        if let Some(last_position) = options.last_match_position {
            if last_position == key_index {
                return None;
            }
            // Keep anchoring to the trigger that opened the query, so a key
            // character typed inside the query does not restart it.
            key_index = last_position.checked_sub(key.len())?;
        }
    }

    let query_start = key_index + key.len();
    if query_start > cursor {
        return None;
    }

    if options.multi_word {
        if chars.get(query_start) == Some(&' ') && cursor > query_start {
            return None;
        }
        if occurs_between(&chars, '\n', key_index, cursor)
            || occurs_between(&chars, '.', key_index, cursor)
        {
            return None;
        }
    } else if occurs_between(&chars, ' ', key_index, cursor) {
        return None;
    }

    if let Some(&pre) = key_index.checked_sub(1).and_then(|i| chars.get(i)) {
        if !is_boundary(pre) {
            return None;
        }
    }

    Some(QueryMatch {
        text: chars[query_start..cursor].iter().collect(),
        position: query_start,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(text: &str, key: &str, cursor: usize) -> Option<QueryMatch> {
        query(text, key, cursor, QueryOptions::default())
    }

    fn multi(text: &str, key: &str, cursor: usize) -> Option<QueryMatch> {
        query(
            text,
            key,
            cursor,
            QueryOptions {
                multi_word: true,
                ..Default::default()
            },
        )
    }

    fn found(text: &str, position: usize) -> Option<QueryMatch> {
        Some(QueryMatch {
            text: text.to_string(),
            position,
        })
    }

    #[test]
    fn test_basic_match() {
        assert_eq!(single("Hi @ann", "@", 7), found("ann", 4));
    }

    #[test]
    fn test_empty_query_right_after_key() {
        assert_eq!(single("@", "@", 1), found("", 1));
    }

    #[test]
    fn test_no_key() {
        assert_eq!(single("hello", "@", 5), None);
    }

    #[test]
    fn test_cursor_at_start() {
        assert_eq!(single("@ann", "@", 0), None);
    }

    #[test]
    fn test_key_after_cursor_is_ignored() {
        assert_eq!(single("ab @cd", "@", 2), None);
    }

    #[test]
    fn test_key_must_start_word() {
        assert_eq!(single("foo@bar", "@", 7), None);
    }

    #[test]
    fn test_boundary_characters() {
        assert_eq!(single("(@ann", "@", 5), found("ann", 2));
        assert_eq!(single("[@ann", "@", 5), found("ann", 2));
        assert_eq!(single("hi\n@ann", "@", 7), found("ann", 4));
        assert_eq!(single("hi\t@ann", "@", 7), found("ann", 4));
    }

    #[test]
    fn test_single_word_rejects_space() {
        assert_eq!(single("@ab cd", "@", 6), None);
        assert_eq!(single("@ab cd", "@", 3), found("ab", 1));
    }

    #[test]
    fn test_multi_word_allows_space() {
        assert_eq!(multi("@john doe", "@", 9), found("john doe", 1));
    }

    #[test]
    fn test_multi_word_rejects_period() {
        assert_eq!(multi("@john.doe", "@", 9), None);
        assert_eq!(multi("@john.doe", "@", 5), found("john", 1));
    }

    #[test]
    fn test_multi_word_rejects_newline() {
        assert_eq!(multi("@john\ndoe", "@", 9), None);
    }

    #[test]
    fn test_multi_word_rejects_leading_space() {
        assert_eq!(multi("@ john", "@", 6), None);
        // Cursor still on the space itself.
        assert_eq!(multi("@ john", "@", 1), found("", 1));
    }

    #[test]
    fn test_look_back_index() {
        let options = QueryOptions {
            look_back_index: 1,
            ..Default::default()
        };
        assert_eq!(query("@ann", "@", 4, options), None);

        let options = QueryOptions {
            look_back_index: 3,
            ..Default::default()
        };
        assert_eq!(query("hi @ann", "@", 7, options), found("ann", 4));
    }

    #[test]
    fn test_multi_word_anchors_to_previous_match() {
        let options = QueryOptions {
            multi_word: true,
            look_back_index: 0,
            last_match_position: Some(1),
        };
        // The second '@' is inside the query; the match stays on the first.
        assert_eq!(query("@a @b", "@", 5, options), found("a @b", 1));
    }

    #[test]
    fn test_multi_word_rejects_same_trigger_as_previous_position() {
        let options = QueryOptions {
            multi_word: true,
            look_back_index: 0,
            last_match_position: Some(1),
        };
        assert_eq!(query("@@x", "@", 3, options), None);
    }

    #[test]
    fn test_multi_word_previous_position_past_cursor() {
        let options = QueryOptions {
            multi_word: true,
            look_back_index: 0,
            last_match_position: Some(6),
        };
        assert_eq!(query("@ab", "@", 3, options), None);
    }

    #[test]
    fn test_last_match_position_ignored_for_single_word() {
        let options = QueryOptions {
            multi_word: false,
            look_back_index: 0,
            last_match_position: Some(1),
        };
        assert_eq!(query("@a @b", "@", 5, options), found("b", 4));
    }

    #[test]
    fn test_multi_char_key() {
        assert_eq!(single("hi ::smile", "::", 10), found("smile", 5));
        // Key only partly typed before the cursor.
        assert_eq!(single("hi ::", "::", 4), None);
    }

    #[test]
    fn test_offsets_are_chars() {
        assert_eq!(single("héllo @jö", "@", 9), found("jö", 7));
    }

    #[test]
    fn test_cursor_past_end_is_clamped() {
        assert_eq!(single("@ann", "@", 40), found("ann", 1));
    }

    #[test]
    fn test_empty_key_never_matches() {
        assert_eq!(single("@ann", "", 4), None);
    }

    #[test]
    fn test_deterministic() {
        let options = QueryOptions {
            multi_word: true,
            look_back_index: 0,
            last_match_position: None,
        };
        let first = query("say hi to @ann lee", "@", 18, options);
        let second = query("say hi to @ann lee", "@", 18, options);
        assert_eq!(first, second);
        assert_eq!(first, found("ann lee", 11));
    }
}
