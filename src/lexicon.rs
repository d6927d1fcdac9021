//! The word table mapping Toki Pona words to sitelen pona glyphs.
//!
//! A [`Lexicon`] is loaded once per conversion run and passed explicitly
//! into the pipeline; nothing in the crate holds a global table. Entries
//! are kept sorted longest-first so that compound and variant forms
//! (`tenpo_`, `sitelen-namako`) are attempted before their prefixes
//! (`tenpo`, `sitelen`) when word rules are generated in order.

use crate::error::{Error, Result};

/// Default word table, covering the UCSUR base words plus the compound
/// assignments used by the nasin-nanpa font.
const EMBEDDED_CSV: &str = include_str!("../resources/nimi_unicode.csv");

/// Immutable word → glyph mapping.
#[derive(Debug, Clone)]
pub struct Lexicon {
    entries: Vec<(String, String)>,
}

impl Lexicon {
    /// Parse a lexicon from two-column CSV text: `word,glyph` per line.
    ///
    /// The glyph column may be wrapped in double quotes. Blank lines are
    /// skipped; a line without both columns is an error.
    pub fn from_csv(text: &str) -> Result<Self> {
        let mut entries = Vec::new();
        for (index, line) in text.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if line.is_empty() {
                continue;
            }
            let Some((word, glyph)) = line.split_once(',') else {
                return Err(Error::InvalidLexicon {
                    line: index + 1,
                    message: "expected `word,glyph`".to_string(),
                });
            };
            if word.is_empty() {
                return Err(Error::InvalidLexicon {
                    line: index + 1,
                    message: "empty word column".to_string(),
                });
            }
            let glyph = glyph
                .strip_prefix('"')
                .and_then(|g| g.strip_suffix('"'))
                .unwrap_or(glyph);
            entries.push((word.to_string(), glyph.to_string()));
        }

        // Longest-first, ties broken lexically, so longer variants always
        // precede the words they start with.
        entries.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));

        Ok(Lexicon { entries })
    }

    /// The word table shipped with the crate.
    pub fn embedded() -> Self {
        Lexicon::from_csv(EMBEDDED_CSV).expect("embedded lexicon is valid")
    }

    /// Look up the glyph for a word.
    pub fn get(&self, word: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(w, _)| w == word)
            .map(|(_, g)| g.as_str())
    }

    /// Whether the table has an entry for `word`.
    pub fn contains(&self, word: &str) -> bool {
        self.get(word).is_some()
    }

    /// Entries in application order (longest word first).
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(w, g)| (w.as_str(), g.as_str()))
    }

    /// Number of entries in the table.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Lexicon::embedded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic() {
        let lexicon = Lexicon::from_csv("toki,T\npona,P\n").unwrap();
        assert_eq!(lexicon.len(), 2);
        assert_eq!(lexicon.get("toki"), Some("T"));
        assert_eq!(lexicon.get("pona"), Some("P"));
        assert!(!lexicon.contains("ike"));
    }

    #[test]
    fn test_parse_quoted_glyph() {
        let lexicon = Lexicon::from_csv("toki,\"T\"\n").unwrap();
        assert_eq!(lexicon.get("toki"), Some("T"));
    }

    #[test]
    fn test_parse_skips_blank_lines() {
        let lexicon = Lexicon::from_csv("toki,T\n\npona,P\n").unwrap();
        assert_eq!(lexicon.len(), 2);
    }

    #[test]
    fn test_missing_column_is_an_error() {
        let err = Lexicon::from_csv("toki,T\nbroken\n").unwrap_err();
        match err {
            Error::InvalidLexicon { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_longest_first_ordering() {
        let lexicon = Lexicon::from_csv("ala,A\nalasa,S\ntenpo,T\ntenpo_,U\n").unwrap();
        let words: Vec<&str> = lexicon.entries().map(|(w, _)| w).collect();
        assert_eq!(words, vec!["tenpo_", "alasa", "tenpo", "ala"]);
    }

    #[test]
    fn test_embedded_table() {
        let lexicon = Lexicon::embedded();
        assert!(lexicon.len() > 200);
        assert_eq!(lexicon.get("toki"), Some("\u{F196C}"));
        assert_eq!(lexicon.get("kijetesantakalu"), Some("\u{F1980}"));
        // Prelong words stay in the table for their bare (non-extending) form.
        assert_eq!(lexicon.get("tawa"), Some("\u{F1969}"));
    }
}
