//! Escape-aware, fixed-point regex rewriting.
//!
//! Every conversion stage is expressed as a [`Rule`]: a search pattern plus
//! a replacement template with numbered back-references (`$1`, `$2`, …).
//! Applying a rule rewrites the first occurrence and repeats until the
//! buffer reaches a fixed point, so a replacement that shortens a line can
//! expose a further match that a single global substitution would miss.
//!
//! Rules never fire inside *escaped* spans: regions bracketed by a pair of
//! [`MARKER`] control characters. The derived pattern wraps the rule's
//! pattern between two expressions that each match "a run of non-marker
//! characters interleaved with complete marker-delimited spans", anchored
//! to a whole line. A line with an odd number of markers on either side of
//! a candidate match cannot satisfy that shape, so escaped (or malformed)
//! lines are skipped by construction rather than by explicit checks.
//!
//! # Examples
//!
//! ```
//! use kasi::rewrite::rewrite;
//!
//! // Plain text is rewritten.
//! assert_eq!(rewrite("a b c", "b", "X"), "a X c");
//!
//! // Marker-wrapped text is invisible to the rule.
//! assert_eq!(rewrite("a \u{1B}b\u{1B} c", "b", "X"), "a \u{1B}b\u{1B} c");
//! ```

use std::borrow::Cow;

use regex::Regex;

/// Reserved control character bracketing escaped spans.
///
/// U+001B never occurs in legitimate markdown input; the escape passes in
/// [`crate::escape`] insert it in pairs and the final pipeline stage strips
/// it again.
pub const MARKER: char = '\u{001B}';

/// Matches zero or more complete escaped spans interleaved with runs of
/// ordinary characters, without crossing a line boundary.
///
/// An odd marker count cannot match: markers are only consumed two at a
/// time, so unbalanced lines fall through every rule untouched.
pub(crate) const ESCAPED_SPAN: &str = r"[^\x1B\n]*(?:\x1B[^\x1B\n]*\x1B[^\x1B\n]*)*";

/// A single rewrite rule: a compiled escape-aware pattern and its adjusted
/// replacement template.
///
/// # Caller contract
///
/// The pattern must be valid regex syntax with at most nine capture groups,
/// and the template must reference the highest-numbered group it wants
/// preserved (the trailing bookkeeping reference is derived from the
/// highest reference present). A rule whose replacement re-matches its own
/// pattern never reaches a fixed point; [`Rule::apply`] does not defend
/// against that.
#[derive(Debug, Clone)]
pub struct Rule {
    regex: Regex,
    template: String,
}

impl Rule {
    /// Compile a rule from a line-scoped pattern and a `$n` template.
    ///
    /// The pattern is embedded as `^(span)pattern(span)$` in multi-line
    /// mode, which shifts every capture group up by one; the template is
    /// renumbered to match and bookended with references to the two
    /// injected groups so the text around the match survives verbatim.
    ///
    /// # Panics
    ///
    /// Panics if the pattern is not valid regex syntax. Rule tables are
    /// crate-internal (word patterns from the lexicon are escaped before
    /// they get here), so an invalid pattern is a programming error.
    pub fn new(pattern: &str, template: &str) -> Self {
        let regex = Regex::new(&format!("(?m)^({ESCAPED_SPAN}){pattern}({ESCAPED_SPAN})$"))
            .expect("invalid rewrite pattern");
        Rule {
            regex,
            template: renumber_template(template),
        }
    }

    /// Apply the rule until the buffer reaches a fixed point.
    ///
    /// Each iteration replaces the first (leftmost) remaining match; the
    /// loop ends when the derived pattern no longer matches anywhere.
    pub fn apply(&self, buffer: &str) -> String {
        let mut current = buffer.to_string();
        loop {
            match self.regex.replace(&current, self.template.as_str()) {
                Cow::Borrowed(_) => return current,
                Cow::Owned(next) => current = next,
            }
        }
    }

    /// Whether the rule still matches anywhere in the buffer.
    pub fn matches(&self, buffer: &str) -> bool {
        self.regex.is_match(buffer)
    }
}

/// One-shot convenience wrapper: compile and apply a rule.
pub fn rewrite(buffer: &str, pattern: &str, template: &str) -> String {
    Rule::new(pattern, template).apply(buffer)
}

/// Shift every `$n` back-reference up by one and add the bookkeeping
/// references for the injected prefix and suffix groups.
///
/// References are processed in descending index order so that rewriting
/// `$1` to a reference containing `2` can never be mistaken for an
/// already-shifted `$2` later in the same pass. The output uses `${n}`
/// syntax throughout; bare `$n` followed by more template text would
/// otherwise be parsed as a longer group name.
///
/// The trailing reference index is one more than the highest reference in
/// the shifted template, or 2 when the template references nothing (a
/// zero-group pattern still receives the two injected groups).
fn renumber_template(template: &str) -> String {
    let mut adjusted = template.to_string();
    let mut highest = 1;
    for index in (1..=9).rev() {
        let reference = format!("${index}");
        if adjusted.contains(&reference) {
            if highest == 1 {
                highest = index + 1;
            }
            adjusted = adjusted.replace(&reference, &format!("${{{}}}", index + 1));
        }
    }
    format!("${{1}}{adjusted}${{{}}}", highest + 1)
}
