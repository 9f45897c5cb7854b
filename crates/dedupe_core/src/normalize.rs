//! Name normalization (§4.2).
//!
//! Converts a raw account name into match-ready form: a lowercase,
//! symbol-mapped `name_base`; a `name_core` with any trailing legal suffix
//! removed; a token set for Jaccard comparison; and any alias candidates the
//! raw name implies. Every step here is pure and operates on an owned
//! `String` — there is no shared normalizer state (§9 "monolithic helper
//! modules" design note: no ambient mutable state).

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{AliasCandidate, AliasSource, NormalizedRecord, Record, SuffixClass};

/// Legal-entity suffix tokens, closed table (§4.2). Several upstream
/// jurisdictions' suffixes (`plc`, `lp`, `llp`, `gmbh`, `sa`) do not have a
/// dedicated `SuffixClass` variant of their own (§3 only defines
/// INC/LLC/LTD/CORP/CO/NONE); each folds into the nearest equivalent family
/// (documented in `DESIGN.md`): `plc` -> LTD, `lp`/`llp`/`gmbh` -> LLC,
/// `sa` -> CORP.
static SUFFIX_TABLE: Lazy<Vec<(&'static str, SuffixClass)>> = Lazy::new(|| {
    vec![
        ("inc", SuffixClass::Inc),
        ("incorporated", SuffixClass::Inc),
        ("llc", SuffixClass::Llc),
        ("ltd", SuffixClass::Ltd),
        ("limited", SuffixClass::Ltd),
        ("corp", SuffixClass::Corp),
        ("corporation", SuffixClass::Corp),
        ("co", SuffixClass::Co),
        ("company", SuffixClass::Co),
        ("plc", SuffixClass::Ltd),
        ("lp", SuffixClass::Llc),
        ("llp", SuffixClass::Llc),
        ("gmbh", SuffixClass::Llc),
        ("sa", SuffixClass::Corp),
    ]
});

/// Fixed plural -> singular map for token folding (§4.2: "from a fixed map",
/// deliberately not a general stemmer).
static PLURAL_FOLD: Lazy<Vec<(&'static str, &'static str)>> = Lazy::new(|| {
    vec![
        ("stores", "store"),
        ("services", "service"),
        ("companies", "company"),
        ("holdings", "holding"),
        ("brands", "brand"),
        ("partners", "partner"),
        ("industries", "industry"),
        ("systems", "system"),
        ("solutions", "solution"),
        ("enterprises", "enterprise"),
        ("associates", "associate"),
        ("properties", "property"),
        ("markets", "market"),
        ("foods", "food"),
        ("labs", "lab"),
    ]
});

const WEAK_TOKENS: &[&str] = &["only", "the", "and", "of", "for", "a", "an", "to"];

const PARENTHETICAL_BLACKLIST: &[&str] = &[
    "paystub",
    "pay stubs",
    "not sure",
    "unsure",
    "unknown",
    "staffing agency",
];

static NUMBERED_MARKER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(\s*\d+\s*\)").unwrap());
static PAREN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(([^)]*)\)").unwrap());
static AND_WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\band\b").unwrap());
static AND_SPLIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\s+and\s+").unwrap());
static NUM_STYLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+(\s*[-/]\s*|\s+)\d+").unwrap());

/// Normalize a [`Record`] into its [`NormalizedRecord`] form.
pub fn normalize(record: &Record) -> NormalizedRecord {
    let raw = record.account_name.as_str();
    let has_parentheses = raw.contains('(');
    let numeric_style = numeric_style_signature(raw);

    let (primary_raw, aliases, fired_a, fired_b, fired_c) = split_primary_and_aliases(raw);
    let has_semicolon = fired_a;
    let has_multiple_names = fired_a || fired_b || fired_c;

    let name_base = apply_symbol_mapping(&primary_raw);
    let (name_core, suffix_class) = extract_suffix(&name_base);
    let enhanced_tokens = enhanced_tokens(&name_core);

    NormalizedRecord {
        record: record.clone(),
        name_base,
        name_core,
        suffix_class,
        enhanced_tokens,
        alias_candidates: aliases,
        has_semicolon,
        has_parentheses,
        has_multiple_names,
        numeric_style,
    }
}

/// Split a raw account name into its primary name and any alias candidates
/// implied by semicolons, numbered/`and`-repeated markers, or a qualifying
/// parenthetical (§4.2 rules a-c). Returns
/// `(primary, aliases, fired_a, fired_b, fired_c)`.
fn split_primary_and_aliases(raw: &str) -> (String, Vec<AliasCandidate>, bool, bool, bool) {
    let mut aliases = Vec::new();
    let mut working = raw.to_string();
    let mut fired_a = false;
    let mut fired_b = false;
    let mut fired_c = false;

    // (a) semicolon-separated names.
    if working.contains(';') {
        let parts: Vec<String> = working
            .split(';')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if parts.len() > 1 {
            fired_a = true;
            for part in &parts[1..] {
                aliases.push(AliasCandidate {
                    text: part.clone(),
                    source: AliasSource::Semicolon,
                });
            }
            working = parts[0].clone();
        }
    }

    // (b) numbered markers, e.g. "(1) Foo (2) Bar", or a repeated "and".
    if NUMBERED_MARKER_RE.is_match(&working) {
        let parts: Vec<String> = NUMBERED_MARKER_RE
            .split(&working)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if parts.len() > 1 {
            fired_b = true;
            for part in &parts[1..] {
                aliases.push(AliasCandidate {
                    text: part.clone(),
                    source: AliasSource::Numbered,
                });
            }
            working = parts[0].clone();
        }
    } else if AND_WORD_RE.find_iter(&working).count() >= 2 {
        let parts: Vec<String> = AND_SPLIT_RE
            .split(&working)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if parts.len() > 1 {
            fired_b = true;
            for part in &parts[1..] {
                aliases.push(AliasCandidate {
                    text: part.clone(),
                    source: AliasSource::Numbered,
                });
            }
            working = parts[0].clone();
        }
    }

    // (c) parenthetical content: every parenthetical group is always
    // stripped from the matching name; each is independently promoted to
    // an alias candidate if it passes the gate.
    if PAREN_RE.is_match(&working) {
        for caps in PAREN_RE.captures_iter(&working) {
            let content = caps[1].trim().to_string();
            if passes_parenthesis_gate(&content) {
                fired_c = true;
                aliases.push(AliasCandidate {
                    text: content,
                    source: AliasSource::Parenthesis,
                });
            }
        }
        let stripped = PAREN_RE.replace_all(&working, " ").to_string();
        working = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    }

    (working, aliases, fired_a, fired_b, fired_c)
}

/// The parenthesis gate (§4.2c): admit content that looks like a real
/// alternate legal name, and reject administrative notes.
fn passes_parenthesis_gate(content: &str) -> bool {
    let lower = content.to_lowercase();
    if PARENTHETICAL_BLACKLIST.iter().any(|b| lower.contains(b)) {
        return false;
    }
    if !content.is_empty() && content.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    let has_suffix_word = lower
        .split_whitespace()
        .any(|tok| SUFFIX_TABLE.iter().any(|(s, _)| *s == tok));
    if has_suffix_word {
        return true;
    }
    let capitalized_words = content
        .split_whitespace()
        .filter(|w| w.chars().next().is_some_and(|c| c.is_uppercase()))
        .count();
    capitalized_words >= 2
}

/// Apply the fixed symbol-mapping table (§4.2) and collapse whitespace.
/// Parentheses are handled separately in [`split_primary_and_aliases`]
/// before this function ever sees the name.
fn apply_symbol_mapping(s: &str) -> String {
    let mapped = s
        .replace('&', " and ")
        .replace('/', " ")
        .replace('-', " ")
        .replace('@', " at ")
        .replace('+', " plus ");
    let trimmed = mapped.trim_matches('_');
    let underscoreless = trimmed.replace('_', " ");
    underscoreless
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Split off a trailing legal suffix, if present (§4.2).
fn extract_suffix(name_base: &str) -> (String, SuffixClass) {
    let tokens: Vec<&str> = name_base.split_whitespace().collect();
    if let Some(last) = tokens.last() {
        if let Some((_, class)) = SUFFIX_TABLE.iter().find(|(s, _)| s == last) {
            let core = tokens[..tokens.len() - 1].join(" ");
            return (core, *class);
        }
    }
    (name_base.to_string(), SuffixClass::None)
}

/// Tokenize `name_core`, folding plurals and dropping weak tokens (§4.2).
fn enhanced_tokens(name_core: &str) -> BTreeSet<String> {
    name_core
        .split_whitespace()
        .filter(|t| !WEAK_TOKENS.contains(t))
        .map(|t| {
            PLURAL_FOLD
                .iter()
                .find(|(plural, _)| *plural == t)
                .map(|(_, singular)| singular.to_string())
                .unwrap_or_else(|| t.to_string())
        })
        .collect()
}

/// Capture the separator style between the first pair of digit runs in a
/// raw (pre-mapping) name, for the scorer's `num_style_match` comparison
/// (§4.2, §4.4). `None` means the name has no such pattern.
fn numeric_style_signature(raw: &str) -> Option<char> {
    let caps = NUM_STYLE_RE.captures(raw)?;
    let sep = caps.get(1)?.as_str();
    if sep.contains('-') {
        Some('-')
    } else if sep.contains('/') {
        Some('/')
    } else {
        Some(' ')
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn rec(name: &str) -> Record {
        Record {
            account_id: "001A000000BcDeFAA".to_string(),
            account_id_src: "001A000000BcDeF".to_string(),
            account_name: name.to_string(),
            created_date: Some(Utc::now()),
            relationship: "Customer".to_string(),
        }
    }

    #[test]
    fn test_symbol_mapping_ampersand() {
        assert_eq!(apply_symbol_mapping("A&B Co"), "a and b co");
    }

    #[test]
    fn test_symbol_mapping_dash_and_slash_unify() {
        assert_eq!(apply_symbol_mapping("99-Cents"), "99 cents");
        assert_eq!(apply_symbol_mapping("99/Cents"), "99 cents");
        assert_eq!(apply_symbol_mapping("99 Cents"), "99 cents");
    }

    #[test]
    fn test_symbol_mapping_underscores_collapsed() {
        assert_eq!(apply_symbol_mapping("_Foo_Bar_"), "foo bar");
    }

    #[test]
    fn test_symbol_mapping_preserves_commas_and_periods() {
        assert_eq!(apply_symbol_mapping("Smith, Jones & Co."), "smith, jones and co.");
    }

    #[test]
    fn test_suffix_extraction_inc() {
        let (core, class) = extract_suffix("acme inc");
        assert_eq!(core, "acme");
        assert_eq!(class, SuffixClass::Inc);
    }

    #[test]
    fn test_suffix_extraction_none() {
        let (core, class) = extract_suffix("acme studio");
        assert_eq!(core, "acme studio");
        assert_eq!(class, SuffixClass::None);
    }

    #[test]
    fn test_suffix_folds_plc_to_ltd() {
        let (_, class) = extract_suffix("acme plc");
        assert_eq!(class, SuffixClass::Ltd);
    }

    #[test]
    fn test_enhanced_tokens_drops_weak_tokens_and_folds_plurals() {
        let tokens = enhanced_tokens("the 99 cents only stores");
        assert!(!tokens.contains("the"));
        assert!(!tokens.contains("only"));
        assert!(tokens.contains("store"));
        assert!(tokens.contains("99"));
        assert!(tokens.contains("cents"));
    }

    #[test]
    fn test_semicolon_alias_extraction() {
        let (primary, aliases, fired_a, _, _) = split_primary_and_aliases("Foo Corp; Bar Corp");
        assert_eq!(primary, "Foo Corp");
        assert_eq!(aliases.len(), 1);
        assert_eq!(aliases[0].text, "Bar Corp");
        assert_eq!(aliases[0].source, AliasSource::Semicolon);
        assert!(fired_a);
    }

    #[test]
    fn test_numbered_marker_alias_extraction() {
        let (primary, aliases, _, fired_b, _) =
            split_primary_and_aliases("(1) Foo Inc (2) Bar LLC");
        assert_eq!(primary, "Foo Inc");
        assert_eq!(aliases.len(), 1);
        assert_eq!(aliases[0].text, "Bar LLC");
        assert!(fired_b);
    }

    #[test]
    fn test_repeated_and_alias_extraction() {
        let (primary, aliases, _, fired_b, _) =
            split_primary_and_aliases("Foo Inc and Bar LLC and Baz Co");
        assert_eq!(primary, "Foo Inc");
        assert_eq!(aliases.len(), 2);
        assert!(fired_b);
    }

    #[test]
    fn test_single_and_does_not_split() {
        let (primary, aliases, _, fired_b, _) = split_primary_and_aliases("Johnson and Johnson");
        assert_eq!(primary, "Johnson and Johnson");
        assert!(aliases.is_empty());
        assert!(!fired_b);
    }

    #[test]
    fn test_parenthesis_gate_accepts_legal_suffix() {
        assert!(passes_parenthesis_gate("Acme Holdings Inc"));
    }

    #[test]
    fn test_parenthesis_gate_accepts_two_capitalized_words() {
        assert!(passes_parenthesis_gate("Foo Bar"));
    }

    #[test]
    fn test_parenthesis_gate_rejects_blacklist() {
        assert!(!passes_parenthesis_gate("not sure"));
        assert!(!passes_parenthesis_gate("Pay Stubs"));
    }

    #[test]
    fn test_parenthesis_gate_rejects_digits_only() {
        assert!(!passes_parenthesis_gate("12345"));
    }

    #[test]
    fn test_parenthesis_gate_rejects_single_lowercase_word() {
        assert!(!passes_parenthesis_gate("staffing"));
    }

    #[test]
    fn test_parenthesis_always_stripped_for_matching() {
        let (primary, aliases, _, _, fired_c) = split_primary_and_aliases("Acme (unknown)");
        assert_eq!(primary, "Acme");
        assert!(aliases.is_empty());
        assert!(!fired_c);
    }

    #[test]
    fn test_parenthesis_gate_pass_emits_alias() {
        let (primary, aliases, _, _, fired_c) = split_primary_and_aliases("Acme (Acme Holdings Inc)");
        assert_eq!(primary, "Acme");
        assert_eq!(aliases.len(), 1);
        assert_eq!(aliases[0].source, AliasSource::Parenthesis);
        assert!(fired_c);
    }

    #[test]
    fn test_multiple_parentheticals_all_stripped_and_collected() {
        let (primary, aliases, _, _, fired_c) =
            split_primary_and_aliases("Acme (Acme Holdings Inc) Corp (Foo Bar)");
        assert_eq!(primary, "Acme Corp");
        assert_eq!(aliases.len(), 2);
        assert!(aliases.iter().any(|a| a.text == "Acme Holdings Inc"));
        assert!(aliases.iter().any(|a| a.text == "Foo Bar"));
        assert!(fired_c);
    }

    #[test]
    fn test_multiple_parentheticals_second_failing_gate_still_stripped() {
        let (primary, aliases, _, _, _) = split_primary_and_aliases("Acme (Acme Holdings Inc) (unknown)");
        assert_eq!(primary, "Acme");
        assert_eq!(aliases.len(), 1);
        assert_eq!(aliases[0].text, "Acme Holdings Inc");
    }

    #[test]
    fn test_numeric_style_signature_dash() {
        assert_eq!(numeric_style_signature("Store 7-11"), Some('-'));
    }

    #[test]
    fn test_numeric_style_signature_slash() {
        assert_eq!(numeric_style_signature("Store 7/11"), Some('/'));
    }

    #[test]
    fn test_numeric_style_signature_none() {
        assert_eq!(numeric_style_signature("Acme Inc"), None);
    }

    #[test]
    fn test_normalize_full_record_99_cents() {
        let n = normalize(&rec("99 Cents Only Stores LLC"));
        assert_eq!(n.suffix_class, SuffixClass::Llc);
        assert!(n.enhanced_tokens.contains("99"));
        assert!(n.enhanced_tokens.contains("store"));
        assert!(!n.has_multiple_names);
    }

    #[test]
    fn test_normalize_is_idempotent_on_name_core() {
        let n1 = normalize(&rec("Acme Holdings Inc"));
        let mut second = rec(&n1.name_core);
        second.account_name = n1.name_core.clone();
        let n2 = normalize(&second);
        // name_core has no suffix left, so re-normalizing it is a fixed point.
        assert_eq!(n2.name_core, n1.name_core);
    }
}
