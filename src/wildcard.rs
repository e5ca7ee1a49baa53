//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Oru.
//! The Oru project belongs to the Dunimd project team.
//!
//! Licensed under the Apache License, Version 2.0 (the "License");
//! You may not use this file except in compliance with the License.
//! You may obtain a copy of the License at
//!
//! http://www.apache.org/licenses/LICENSE-2.0
//!
//! Unless required by applicable law or agreed to in writing, software
//! distributed under the License is distributed on an "AS IS" BASIS,
//! WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//! See the License for the specific language governing permissions and
//! limitations under the License.

use regex::Regex;

/// Tests `text` against a glob `pattern` where `*` matches any run of
/// characters and `?` matches exactly one. The match is anchored at both
/// ends; every other character matches literally.
pub fn matches_wildcard(text: &str, pattern: &str) -> bool {
    if !pattern.contains('*') && !pattern.contains('?') {
        return text == pattern;
    }
    let rewritten = regex::escape(pattern)
        .replace(r"\*", ".*")
        .replace(r"\?", ".");
    match Regex::new(&format!("^{rewritten}$")) {
        Ok(re) => re.is_match(text),
        Err(_) => false,
    }
}

/// Glob comparison of two registry keys. Either side may carry wildcards:
/// a lookup key `token-*` finds a registered `token-xx`, and a registered
/// `token-*` answers a lookup for `token-abc`.
pub fn compare_wildcards(a: &str, b: &str) -> bool {
    matches_wildcard(a, b) || matches_wildcard(b, a)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_keys_compare_by_equality() {
        assert!(compare_wildcards("sentiment", "sentiment"));
        assert!(!compare_wildcards("sentiment", "sentiments"));
    }

    #[test]
    fn star_matches_any_run() {
        assert!(matches_wildcard("token-xx", "token-*"));
        assert!(matches_wildcard("token-", "token-*"));
        assert!(!matches_wildcard("tok-xx", "token-*"));
    }

    #[test]
    fn question_mark_matches_one_character() {
        assert!(matches_wildcard("stemmer-en", "stemmer-e?"));
        assert!(!matches_wildcard("stemmer-e", "stemmer-e?"));
    }

    #[test]
    fn regex_metacharacters_are_literal() {
        assert!(matches_wildcard("ner.extract", "ner.extract"));
        assert!(!matches_wildcard("nerXextract", "ner.extract"));
        assert!(matches_wildcard("ner.extract", "ner.*"));
    }

    #[test]
    fn comparison_works_from_either_side() {
        assert!(compare_wildcards("token-xx", "token-*"));
        assert!(compare_wildcards("token-*", "token-abc"));
    }
}
