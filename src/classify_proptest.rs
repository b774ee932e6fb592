//! Property-based tests for diff classification.
//!
//! These tests use proptest to generate added-line corpora and verify that
//! the tagging invariants the datasets rely on hold for all of them.

#[cfg(test)]
mod proptest_tests {
    use crate::classify::{added_lines, CapabilityTag, RuleSet};
    use proptest::prelude::*;

    fn rules() -> RuleSet {
        RuleSet::builtin().unwrap()
    }

    /// Snippets that trip the various rule groups, mixed with noise.
    fn added_line() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("+async fn handler() {}".to_string()),
            Just("+    let body = req.await?;".to_string()),
            Just("+pub const MAX_SIZE: usize = 10;".to_string()),
            Just("+    let f: Box<dyn Fn(u8) -> u8> = Box::new(inc);".to_string()),
            Just("+where F: for<'a> Fn(&'a str) -> &'a str,".to_string()),
            Just("+        match value {".to_string()),
            Just("+        return Ok(());".to_string()),
            Just("+fn first<T: Clone>(items: &[T]) -> Option<T> {".to_string()),
            Just("+impl<T> Stack<T> {".to_string()),
            "\\+[ -~]{0,40}",
        ]
    }

    fn corpus() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec(added_line(), 0..12)
    }

    fn rank(tag: CapabilityTag) -> usize {
        CapabilityTag::ALL
            .iter()
            .position(|t| *t == tag)
            .unwrap()
    }

    proptest! {
        /// Property: classifying the same corpus twice gives the same tags in the same order
        #[test]
        fn classify_is_deterministic(lines in corpus()) {
            let rules = rules();
            prop_assert_eq!(rules.classify(&lines), rules.classify(&lines));
        }

        /// Property: tags follow rule-group declaration order with no repeats
        #[test]
        fn tags_follow_group_order(lines in corpus()) {
            let tags = rules().classify(&lines);
            for pair in tags.windows(2) {
                prop_assert!(
                    rank(pair[0]) < rank(pair[1]),
                    "{:?} listed before {:?}",
                    pair[0],
                    pair[1]
                );
            }
        }

        /// Property: line order in the corpus does not affect the result
        #[test]
        fn classify_ignores_line_order(lines in corpus()) {
            let rules = rules();
            let mut reversed = lines.clone();
            reversed.reverse();
            prop_assert_eq!(rules.classify(&lines), rules.classify(&reversed));
        }

        /// Property: adding a line can only add tags, never remove them
        #[test]
        fn classify_is_monotonic(lines in corpus(), extra in added_line()) {
            let rules = rules();
            let before = rules.classify(&lines);
            let mut grown = lines.clone();
            grown.push(extra);
            let after = rules.classify(&grown);
            for tag in before {
                prop_assert!(after.contains(&tag));
            }
        }

        /// Property: explain reports exactly the tags classify returns
        #[test]
        fn explain_agrees_with_classify(lines in corpus()) {
            let rules = rules();
            let explained: Vec<CapabilityTag> =
                rules.explain(&lines).into_iter().map(|hit| hit.tag).collect();
            prop_assert_eq!(explained, rules.classify(&lines));
        }

        /// Property: lines without the addition marker never produce tags
        #[test]
        fn unmarked_lines_are_never_tagged(lines in prop::collection::vec("[ a-z<>:;(){}']{0,40}", 0..10)) {
            prop_assert!(rules().classify(&lines).is_empty());
        }

        /// Property: added lines pulled from a full diff are `+` lines and never file headers
        #[test]
        fn added_lines_skip_file_headers(lines in corpus()) {
            let mut diff = String::from(
                "diff --git a/src/lib.rs b/src/lib.rs\n--- a/src/lib.rs\n+++ b/src/lib.rs\n@@ -1,0 +1,9 @@\n",
            );
            for line in &lines {
                diff.push_str(line);
                diff.push('\n');
            }
            let extracted = added_lines(&diff);
            prop_assert!(extracted.iter().all(|l| l.starts_with('+')));
            prop_assert!(!extracted.contains(&"+++ b/src/lib.rs"));
            prop_assert_eq!(extracted.len(), lines.len());
        }
    }
}
