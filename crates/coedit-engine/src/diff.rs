//! Word-level change summaries and line-level previews.
//!
//! [`word_diff`] is a coarse signal for people browsing history, not a patch
//! format: membership is tested per word, so a word whose count changes but
//! which appears on both sides ("a a" -> "a") is never reported. Callers
//! must not rely on `modified`, which stays empty.

use coedit_core::VersionDiff;
use similar::{ChangeTag, TextDiff};
use std::collections::HashSet;

/// Compare two contents word by word.
///
/// `added` keeps every token of `new` (in order, duplicates included) that
/// never occurs in `old`; `removed` is the mirror image.
pub fn word_diff(old: &str, new: &str) -> VersionDiff {
    let old_words: Vec<&str> = old.split_whitespace().collect();
    let new_words: Vec<&str> = new.split_whitespace().collect();

    VersionDiff {
        added: missing_from(&new_words, &old_words),
        removed: missing_from(&old_words, &new_words),
        modified: Vec::new(),
    }
}

fn missing_from(words: &[&str], other: &[&str]) -> Vec<String> {
    let other: HashSet<&str> = other.iter().copied().collect();
    words
        .iter()
        .filter(|w| !other.contains(*w))
        .map(|w| w.to_string())
        .collect()
}

/// Render a line-oriented preview of the change for display.
pub fn render_diff(old: &str, new: &str) -> String {
    let diff = TextDiff::from_lines(old, new);
    let mut preview = String::new();

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => "-",
            ChangeTag::Insert => "+",
            ChangeTag::Equal => " ",
        };
        preview.push_str(sign);
        preview.push(' ');
        preview.push_str(change.value());
        if change.missing_newline() {
            preview.push('\n');
        }
    }

    preview
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_single_word_replacement() {
        let diff = word_diff("a b c", "a b d");
        assert_eq!(diff.added, vec!["d"]);
        assert_eq!(diff.removed, vec!["c"]);
        assert!(diff.modified.is_empty());
    }

    #[test]
    fn test_count_changes_are_invisible() {
        assert!(word_diff("a a", "a").is_empty());
        assert!(word_diff("x", "x x x").is_empty());
    }

    #[test]
    fn test_duplicates_of_new_words_are_kept() {
        let diff = word_diff("a", "b a b");
        assert_eq!(diff.added, vec!["b", "b"]);
        assert!(diff.removed.is_empty());
    }

    #[test]
    fn test_empty_new_content_removes_everything() {
        let diff = word_diff("one two\nthree", "");
        assert_eq!(diff.removed, vec!["one", "two", "three"]);
        assert!(diff.added.is_empty());
    }

    #[test]
    fn test_whitespace_only_changes_are_empty() {
        assert!(word_diff("a  b\tc", "a b\n c").is_empty());
    }

    #[test]
    fn test_render_diff_marks_lines() {
        let preview = render_diff("title\nold line\n", "title\nnew line\n");
        assert!(preview.contains("  title\n"));
        assert!(preview.contains("- old line\n"));
        assert!(preview.contains("+ new line\n"));
    }

    #[test]
    fn test_render_diff_terminates_last_line() {
        let preview = render_diff("a", "b");
        assert_eq!(preview, "- a\n+ b\n");
    }

    proptest! {
        #[test]
        fn prop_diff_against_self_is_empty(words in prop::collection::vec("[a-z]{1,4}", 0..20)) {
            let text = words.join(" ");
            prop_assert!(word_diff(&text, &text).is_empty());
        }

        #[test]
        fn prop_added_and_removed_are_disjoint_from_other_side(
            old in prop::collection::vec("[a-c]{1,2}", 0..15),
            new in prop::collection::vec("[a-c]{1,2}", 0..15),
        ) {
            let diff = word_diff(&old.join(" "), &new.join(" "));
            for word in &diff.added {
                prop_assert!(!old.contains(word));
                prop_assert!(new.contains(word));
            }
            for word in &diff.removed {
                prop_assert!(!new.contains(word));
                prop_assert!(old.contains(word));
            }
        }

        #[test]
        fn prop_swapping_sides_swaps_lists(
            old in prop::collection::vec("[a-d]", 0..10),
            new in prop::collection::vec("[a-d]", 0..10),
        ) {
            let forward = word_diff(&old.join(" "), &new.join(" "));
            let backward = word_diff(&new.join(" "), &old.join(" "));
            prop_assert_eq!(forward.added, backward.removed);
            prop_assert_eq!(forward.removed, backward.added);
        }
    }
}
