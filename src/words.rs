//! Word-level glyph conversion stages.
//!
//! These stages run after marker placement and before LaTeX typesetting:
//! the buffer still looks like markdown, but every protected region is
//! bracketed in escape markers, so each rule here can be a plain
//! escape-aware rewrite.
//!
//! Boundary handling: the original notation separates words with spaces
//! and builds compounds with `-`, `+`, `<`, `=`, `>` and digits. A word
//! rule must not fire inside a longer word or compound, so patterns carry
//! a leading boundary group (start of line or a non-word character, kept
//! in the output) and a trailing boundary alternation (space, which is
//! dropped, end of line, or a kept non-word character).

use regex::Regex;

use crate::glyphs::{POSTLONG, PRELONG, PUNCTUATION};
use crate::lexicon::Lexicon;
use crate::rewrite::rewrite;

/// Character class for "may not precede a word": letters, the compound
/// joiners `+` and `-`, and the escape marker. A marker is never a word
/// boundary; letting a boundary group consume one would re-balance the
/// derived pattern and fire the rule inside an escaped span.
const BOUNDARY_BEFORE: &str = r"[^a-zA-Z+\n\x1B-]";
/// Character class for "may not follow a word": letters, the compound
/// characters `< = > + -`, and the escape marker. Digits are allowed to
/// follow (variant suffixes are handled by normalization).
const BOUNDARY_AFTER: &str = r"[^ a-zA-Z<=>+\n\x1B-]";

fn word_pattern(word: &str) -> String {
    format!(
        "(^|{BOUNDARY_BEFORE}){}(?: |$|({BOUNDARY_AFTER}))",
        regex::escape(word)
    )
}

/// Flatten nested long groups to the two supported levels.
///
/// `pi ((head rest))` hoists the head onto `pi` (`pi-head ((rest))`) and
/// `((head rest))` marks the head as extended (`head_ ((rest))`), one word
/// per application until the inner group empties and is removed. A third
/// level of nesting (`(((` / `)))`) is not supported and is silently
/// dropped; deeper documents lose that level rather than erroring.
pub(crate) fn flatten_nested_groups(content: &str) -> String {
    let content = rewrite(
        content,
        r"(pi) \(\(([^)\n ]+) ([^)\n]+)\)\) ?",
        "$1-$2 (($3))",
    );
    let content = rewrite(
        &content,
        r"\(\(([^ )\n]+)(?: ([^)\n]+))?\)\) ?",
        "$1_ (($2))",
    );
    let content = rewrite(&content, r"\(\(\)\)", "");
    rewrite(&content, r"\(\(\(+|\)\)\)+", "")
}

/// Convert words with an extending long-glyph form before a group:
/// `tawa (...)` becomes the extending glyph directly against the group.
pub(crate) fn convert_prelongs(content: &str) -> String {
    let mut content = content.to_string();
    for (word, glyph) in PRELONG {
        let pattern = format!("(^|{BOUNDARY_BEFORE}){word} ?\\(");
        content = rewrite(&content, &pattern, &format!("$1{glyph}("));
    }
    content
}

/// Convert sentence punctuation to its glyph form.
pub(crate) fn convert_punctuation(content: &str) -> String {
    let mut content = content.to_string();
    for (pattern, replacement) in PUNCTUATION {
        content = rewrite(&content, pattern, replacement);
    }
    content
}

/// Convert long-glyph forms that attach after a closing construct
/// (`) la`, `(ala`).
pub(crate) fn convert_postlongs(content: &str) -> String {
    let mut content = content.to_string();
    for (pattern, replacement) in POSTLONG {
        let pattern = format!("{pattern}(?: |$|({BOUNDARY_AFTER}))");
        content = rewrite(&content, &pattern, &format!("{replacement}$1"));
    }
    content
}

/// Convert every lexicon word to its glyph, dropping the following space.
///
/// Entries are applied longest-first (the lexicon's ordering), so variant
/// and compound forms win over their prefixes.
pub(crate) fn convert_words(content: &str, lexicon: &Lexicon) -> String {
    let mut content = content.to_string();
    for (word, glyph) in lexicon.entries() {
        content = rewrite(&content, &word_pattern(word), &format!("$1{glyph}$2"));
    }
    content
}

/// Rewrite variant suffixes on words the lexicon doesn't know back to
/// their base form, when the base form is known: `toki2` or `sona>`
/// becomes `toki` / `sona`.
pub(crate) fn normalize_variants(content: &str, lexicon: &Lexicon) -> String {
    let re = Regex::new(r"([a-zA-Z]+)(?:[<=>]|\d+)").expect("invalid variant pattern");
    let variants: Vec<(String, String)> = re
        .captures_iter(content)
        .map(|caps| (caps[0].to_string(), caps[1].to_string()))
        .collect();

    let mut content = content.to_string();
    for (full, base) in variants {
        if !lexicon.contains(&full) && lexicon.contains(&base) {
            content = rewrite(&content, &regex::escape(&full), &base);
        }
    }
    content
}

/// Break unknown compounds into their component words when every
/// component is known: `toki-pona` becomes `toki pona`.
pub(crate) fn split_compounds(content: &str, lexicon: &Lexicon) -> String {
    let word_re = Regex::new(r"[a-zA-Z0-9<=>+-]+").expect("invalid compound pattern");
    let trim_re = Regex::new(r"^[+-]+|[+-]$").expect("invalid trim pattern");
    let joiner_re = Regex::new(r"[+-]").expect("invalid joiner pattern");

    let words: Vec<String> = word_re
        .find_iter(content)
        .map(|m| m.as_str().to_string())
        .collect();

    let mut content = content.to_string();
    for word in words {
        if lexicon.contains(&word) {
            continue;
        }
        let parts: Vec<&str> = word
            .split(['<', '=', '>', '+', '-'])
            .filter(|part| !part.is_empty())
            .collect();
        if parts.is_empty() || !parts.iter().all(|part| lexicon.contains(part)) {
            continue;
        }
        let trimmed = trim_re.replace(&word, "");
        let replacement = joiner_re.replace(&trimmed, " ");
        content = rewrite(&content, &regex::escape(&word), &replacement);
    }
    content
}

#[cfg(test)]
mod tests {
    use super::*;

    // Digit glyphs stand in for the PUA codepoints: like the real glyphs,
    // they are outside the letter-based boundary classes.
    fn lexicon() -> Lexicon {
        Lexicon::from_csv("toki,1\npona,2\nala,3\nalasa,4\ntenpo,5\ntenpo_,6\nsitelen-pona,7\n")
            .unwrap()
    }

    #[test]
    fn test_word_becomes_glyph_and_space_is_dropped() {
        assert_eq!(convert_words("toki pona", &lexicon()), "12");
    }

    #[test]
    fn test_word_at_end_of_line() {
        assert_eq!(convert_words("toki", &lexicon()), "1");
    }

    #[test]
    fn test_word_inside_longer_word_is_untouched() {
        assert_eq!(convert_words("tokin", &lexicon()), "tokin");
    }

    #[test]
    fn test_compound_wins_over_prefix() {
        assert_eq!(convert_words("sitelen-pona ala", &lexicon()), "73");
    }

    #[test]
    fn test_variant_suffix_blocks_plain_word() {
        // `tenpo_` converts via its own entry; bare `tenpo` must not fire
        // against the underscore form first.
        assert_eq!(convert_words("tenpo_ tenpo", &lexicon()), "65");
    }

    #[test]
    fn test_trailing_punctuation_is_kept() {
        assert_eq!(convert_words("toki!", &lexicon()), "1!");
    }

    #[test]
    fn test_escaped_words_are_untouched() {
        assert_eq!(
            convert_words("toki \u{1B}toki\u{1B}", &lexicon()),
            "1\u{1B}toki\u{1B}"
        );
    }

    #[test]
    fn test_fully_escaped_line_is_untouched() {
        // The boundary groups must not consume the markers themselves;
        // a span containing nothing but a word is still a span.
        assert_eq!(
            convert_words("\u{1B}toki\u{1B}", &lexicon()),
            "\u{1B}toki\u{1B}"
        );
    }

    #[test]
    fn test_word_adjacent_to_span_is_untouched() {
        // No boundary between a word and a marker, so neither the word
        // inside the span nor one butted against it converts.
        assert_eq!(
            convert_words("toki\u{1B}pona\u{1B}", &lexicon()),
            "toki\u{1B}pona\u{1B}"
        );
    }

    #[test]
    fn test_prelong_fuses_with_group() {
        assert_eq!(convert_prelongs("tawa (ma)"), "\u{F0069}(ma)");
        assert_eq!(convert_prelongs("pi (toki)"), "\u{F1993}(toki)");
    }

    #[test]
    fn test_prelong_requires_group() {
        assert_eq!(convert_prelongs("tawa ma"), "tawa ma");
    }

    #[test]
    fn test_punctuation() {
        assert_eq!(convert_punctuation("toki."), "toki\u{F199C}");
    }

    #[test]
    fn test_postlong_la() {
        assert_eq!(convert_postlongs("(ni) la toki"), "(ni)\u{F0021}toki");
    }

    #[test]
    fn test_postlong_ala() {
        assert_eq!(convert_postlongs("(ala toki)"), "(\u{F0902}toki)");
    }

    #[test]
    fn test_nested_group_pi_hoist() {
        assert_eq!(
            flatten_nested_groups("pi ((toki pona))"),
            "pi-toki pona_ "
        );
    }

    #[test]
    fn test_nested_group_head_extension() {
        assert_eq!(flatten_nested_groups("((toki pona))"), "toki_ pona_ ");
    }

    #[test]
    fn test_third_nesting_level_is_dropped() {
        assert_eq!(flatten_nested_groups("((("), "");
        assert_eq!(flatten_nested_groups("a ))) b"), "a  b");
    }

    #[test]
    fn test_normalize_variants() {
        assert_eq!(normalize_variants("toki2 pona", &lexicon()), "toki pona");
        assert_eq!(normalize_variants("sona> x", &lexicon()), "sona> x");
    }

    #[test]
    fn test_split_compounds() {
        assert_eq!(split_compounds("toki-pona", &lexicon()), "toki pona");
        // Known compounds stay whole.
        assert_eq!(
            split_compounds("sitelen-pona", &lexicon()),
            "sitelen-pona"
        );
        // Unknown components stay whole.
        assert_eq!(split_compounds("toki-nasa", &lexicon()), "toki-nasa");
    }
}
