//! Entity match pattern compilation.
//!
//! The watchlist is compiled into a single case-insensitive alternation.
//! Alternative order follows the watchlist order, which makes the match
//! tie-break deterministic: at equal start positions the earliest
//! alternative wins (leftmost-first, not longest-match).

use reddit_monitor_types::TrackedEntity;
use regex::{Regex, RegexBuilder};
use std::collections::HashSet;

pub struct EntityPatterns {
    re: Option<Regex>,
    pattern_count: usize,
}

impl EntityPatterns {
    /// Compile the watchlist. Each non-empty variant is escaped (variants are
    /// literal phrases, tickers like "HSBA.L" included) and anchored on word
    /// boundaries; an entity's variants are joined with `|`; identical entity
    /// patterns are deduplicated keeping first-seen order.
    pub fn compile(entities: &[TrackedEntity]) -> Result<Self, regex::Error> {
        let mut seen = HashSet::new();
        let mut parts = Vec::new();
        for entity in entities {
            let variants = entity.variants();
            if variants.is_empty() {
                continue;
            }
            let pattern = variants
                .iter()
                .map(|v| format!(r"\b{}\b", regex::escape(v)))
                .collect::<Vec<_>>()
                .join("|");
            if seen.insert(pattern.clone()) {
                parts.push(pattern);
            }
        }

        if parts.is_empty() {
            return Ok(Self {
                re: None,
                pattern_count: 0,
            });
        }

        let re = RegexBuilder::new(&parts.join("|"))
            .case_insensitive(true)
            .build()?;
        Ok(Self {
            re: Some(re),
            pattern_count: parts.len(),
        })
    }

    /// The matched phrase exactly as it appears in `text`, or None.
    pub fn first_match<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.re.as_ref()?.find(text).map(|m| m.as_str())
    }

    /// Number of distinct entity patterns in the alternation.
    pub fn pattern_count(&self) -> usize {
        self.pattern_count
    }

    pub fn is_empty(&self) -> bool {
        self.re.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(name: &str, altname: Option<&str>, ticker: Option<&str>) -> TrackedEntity {
        TrackedEntity {
            id: 0,
            name: name.to_string(),
            altname: altname.map(|s| s.to_string()),
            abbreviation: None,
            ticker: ticker.map(|s| s.to_string()),
            altticker: None,
            created_at: String::new(),
        }
    }

    #[test]
    fn test_matches_variant_on_word_boundary() {
        let p =
            EntityPatterns::compile(&[entity("Citigroup", Some("Citi"), Some("C"))]).unwrap();
        assert_eq!(p.first_match("I like Citi bank"), Some("Citi"));
        assert_eq!(p.first_match("C is undervalued"), Some("C"));
        // "C" inside a word is not a mention
        assert_eq!(p.first_match("copper prices are up"), None);
    }

    #[test]
    fn test_match_is_case_insensitive_and_returns_text_casing() {
        let p = EntityPatterns::compile(&[entity("Citigroup", Some("Citi"), None)]).unwrap();
        assert_eq!(p.first_match("CITI to the moon"), Some("CITI"));
        assert_eq!(p.first_match("citigroup earnings"), Some("citigroup"));
    }

    #[test]
    fn test_tie_break_is_alternative_order_not_longest() {
        // "Morgan" precedes "Morgan Stanley" in variant order; both match at
        // position 0, the earlier alternative wins.
        let p = EntityPatterns::compile(&[entity("Morgan", Some("Morgan Stanley"), None)])
            .unwrap();
        assert_eq!(p.first_match("Morgan Stanley beat earnings"), Some("Morgan"));
    }

    #[test]
    fn test_leftmost_occurrence_wins_across_entities() {
        let p = EntityPatterns::compile(&[
            entity("Citigroup", Some("Citi"), None),
            entity("Bank of America", Some("BofA"), None),
        ])
        .unwrap();
        assert_eq!(p.first_match("BofA and then Citi"), Some("BofA"));
    }

    #[test]
    fn test_multiword_variant_matches_inside_sentence() {
        let p = EntityPatterns::compile(&[entity("Bank of America", None, Some("BAC"))]).unwrap();
        assert_eq!(
            p.first_match("thoughts on Bank of America today?"),
            Some("Bank of America")
        );
        assert_eq!(p.first_match("Bankof America"), None);
    }

    #[test]
    fn test_variants_match_literally() {
        let p = EntityPatterns::compile(&[entity("HSBC", None, Some("HSBA.L"))]).unwrap();
        assert_eq!(p.first_match("HSBA.L is trading flat"), Some("HSBA.L"));
        // the dot is literal, not a wildcard
        assert_eq!(p.first_match("HSBAxL is trading flat"), None);
    }

    #[test]
    fn test_identical_entity_patterns_deduplicated() {
        let p = EntityPatterns::compile(&[
            entity("Citigroup", Some("Citi"), None),
            entity("Citigroup", Some("Citi"), None),
            entity("HSBC", None, None),
        ])
        .unwrap();
        assert_eq!(p.pattern_count(), 2);
    }

    #[test]
    fn test_empty_watchlist_never_matches() {
        let p = EntityPatterns::compile(&[]).unwrap();
        assert!(p.is_empty());
        assert_eq!(p.first_match("Citi something"), None);

        // entities with only empty variants are skipped too
        let blank = TrackedEntity {
            id: 1,
            name: String::new(),
            altname: None,
            abbreviation: None,
            ticker: None,
            altticker: None,
            created_at: String::new(),
        };
        let p = EntityPatterns::compile(&[blank]).unwrap();
        assert!(p.is_empty());
    }
}
