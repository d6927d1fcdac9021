//! Fixed codepoint tables for sitelen pona typesetting.
//!
//! Non-compound glyphs follow the UCSUR sitelen pona chart
//! (<https://www.kreativekorp.com/ucsur/charts/sitelen.html>); container and
//! combiner codepoints are assigned to slots in the nasin-nanpa font.

/// Opening cartouche bracket (proper names).
pub const CARTOUCHE_OPEN: char = '\u{F1990}';
/// Closing cartouche bracket.
pub const CARTOUCHE_CLOSE: char = '\u{F1991}';

/// Opening bracket of a long-glyph container.
pub const LONG_GLYPH_OPEN: char = '\u{F1997}';
/// Closing bracket of a long-glyph container.
pub const LONG_GLYPH_CLOSE: char = '\u{F1998}';

/// Sentence-final middle dot.
pub const PERIOD: char = '\u{F199C}';
/// Sentence colon.
pub const COLON: char = '\u{F199D}';

/// Opening directional quote.
pub const QUOTE_OPEN: char = '\u{201C}';
/// Closing directional quote.
pub const QUOTE_CLOSE: char = '\u{201D}';

/// Words with a long-glyph form that extends over a following group:
/// `tawa (...)` renders as the extending glyph followed by the group.
pub(crate) const PRELONG: &[(&str, char)] = &[
    ("kepeken", '\u{F0019}'),
    ("tawa", '\u{F0069}'),
    ("lon", '\u{F002C}'),
    ("tan", '\u{F0067}'),
    ("pi", '\u{F1993}'),
];

/// Punctuation rewrites, as (pattern, replacement) fragments.
pub(crate) const PUNCTUATION: &[(&str, &str)] = &[(r"\.", "\u{F199C}")];

/// Long-glyph forms that attach after a closing construct, as
/// (pattern, replacement) fragments: `) la` and `(ala`.
pub(crate) const POSTLONG: &[(&str, &str)] = &[
    (r"\) ?la", ")\u{F0021}"),
    (r"\(ala", "(\u{F0902}"),
];
