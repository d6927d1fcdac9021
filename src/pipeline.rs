//! The conversion pipeline: markdown in, LaTeX out.
//!
//! [`convert`] threads the buffer through [`STAGES`], a fixed ordered
//! list of stage functions. The stages fall into three phases:
//!
//! 1. **Escape.** Code blocks, math and backslash sequences are bracketed
//!    in escape markers so no later rule can touch them.
//! 2. **Glyphs.** Notation words, punctuation and long-glyph forms become
//!    their codepoints.
//! 3. **Typeset.** The remaining structure (headings, cartouches, groups,
//!    images, code, math) is lowered to LaTeX, then every marker is
//!    stripped and the document footer appended.
//!
//! Later stages assume earlier stages' invariants, so the list ordering
//! is load-bearing; each entry notes the pre-condition it relies on or
//! the post-condition it establishes where that isn't obvious from the
//! stage itself.

use crate::escape;
use crate::latex;
use crate::lexicon::Lexicon;
use crate::words;

/// Conversion switches beyond the word table itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConvertOptions {
    /// Rewrite unknown variant forms (`toki2`, `sona>`) down to their
    /// base word, and split unknown compounds whose parts are all known
    /// (`toki-pona` to `toki pona`). Off by default: documents normally
    /// only use forms the font actually carries, and silently degrading
    /// a typo to a near miss hides the error.
    pub normalize: bool,
}

/// Shared read-only state threaded through every stage.
pub struct Context<'a> {
    pub lexicon: &'a Lexicon,
    pub options: ConvertOptions,
}

/// One pipeline stage: a name for diagnostics and the transform itself.
pub struct Stage {
    pub name: &'static str,
    pub run: fn(&str, &Context) -> String,
}

/// The fixed stage sequence. Every conversion runs all of it, in order.
pub const STAGES: &[Stage] = &[
    // Pre: raw file text. Post: only `\n` line endings, no leading
    // metadata block.
    Stage { name: "normalize-newlines", run: |c, _| c.replace("\r\n", "\n") },
    Stage { name: "chomp-metadata", run: |c, _| chomp_metadata(c) },
    // Marker placement. Post: markers are balanced on every line except
    // where an unclosed inline span deliberately leaves an odd count,
    // which parks that line out of reach of every later rule.
    Stage { name: "escape-code-blocks", run: |c, _| escape::escape_code_blocks(c) },
    Stage { name: "escape-block-math", run: |c, _| escape::escape_block_math(c) },
    Stage { name: "escape-inline-spans", run: |c, _| escape::escape_inline_spans(c) },
    Stage { name: "escape-backticks-in-spans", run: |c, _| escape::escape_delimiters_in_spans(c, '`') },
    Stage { name: "escape-dollars-in-spans", run: |c, _| escape::escape_delimiters_in_spans(c, '$') },
    Stage { name: "escape-backslash-sequences", run: |c, _| escape::escape_backslash_sequences(c) },
    // Glyph conversion. Groups are flattened before prelongs so a hoisted
    // head can still fuse with `pi`; prelongs run before plain words so
    // `tawa (` wins over bare `tawa`; normalization must see Latin words,
    // so it precedes the word table.
    Stage { name: "flatten-nested-groups", run: |c, _| words::flatten_nested_groups(c) },
    Stage { name: "convert-prelongs", run: |c, _| words::convert_prelongs(c) },
    Stage { name: "convert-punctuation", run: |c, _| words::convert_punctuation(c) },
    Stage { name: "convert-postlongs", run: |c, _| words::convert_postlongs(c) },
    Stage { name: "normalize-variants", run: |c, ctx| {
        if ctx.options.normalize {
            words::normalize_variants(c, ctx.lexicon)
        } else {
            c.to_string()
        }
    } },
    Stage { name: "split-compounds", run: |c, ctx| {
        if ctx.options.normalize {
            words::split_compounds(c, ctx.lexicon)
        } else {
            c.to_string()
        }
    } },
    Stage { name: "convert-words", run: |c, ctx| words::convert_words(c, ctx.lexicon) },
    // Typesetting. Images go first while `{...}{...}` spans still exist;
    // quotes must be directionalized before any LaTeX text containing
    // double quotes could appear; the title page must run before chapters
    // so the first `## ` still marks where the table of contents goes.
    Stage { name: "insert-images", run: |c, _| latex::insert_images(c) },
    Stage { name: "strip-custom-spans", run: |c, _| latex::strip_custom_spans(c) },
    Stage { name: "typeset-cartouches", run: |c, _| latex::typeset_cartouches(c) },
    Stage { name: "directionalize-quotes", run: |c, _| latex::directionalize_quotes(c) },
    Stage { name: "typeset-long-containers", run: |c, _| latex::typeset_long_containers(c) },
    Stage { name: "chomp-math-spacing", run: |c, _| latex::chomp_math_spacing(c) },
    Stage { name: "typeset-hrules", run: |c, _| latex::typeset_hrules(c) },
    Stage { name: "typeset-title-page", run: |c, _| latex::typeset_title_page(c) },
    Stage { name: "typeset-chapters", run: |c, _| latex::typeset_chapters(c) },
    Stage { name: "typeset-code-blocks", run: |c, _| latex::typeset_code_blocks(c) },
    Stage { name: "typeset-inline-code", run: |c, _| latex::typeset_inline_code(c) },
    Stage { name: "typeset-math", run: |c, _| latex::typeset_math(c) },
    // Post: no markers remain; the buffer is a complete LaTeX document.
    Stage { name: "finish-document", run: |c, _| latex::finish_document(c) },
];

/// Convert a markdown document to a complete LaTeX document.
pub fn convert(source: &str, lexicon: &Lexicon, options: ConvertOptions) -> String {
    let ctx = Context { lexicon, options };
    let mut content = source.to_string();
    for stage in STAGES {
        content = (stage.run)(&content, &ctx);
    }
    content
}

/// Drop a leading `{ ... }` metadata block.
///
/// The block may span lines and contain nested braces and strings;
/// braces inside double-quoted strings (with backslash escapes) don't
/// count. If the block never closes the buffer is returned unchanged.
fn chomp_metadata(content: &str) -> String {
    let trimmed = content.trim_start();
    if !trimmed.starts_with('{') {
        return content.to_string();
    }

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (pos, c) in trimmed.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return trimmed[pos + 1..].trim_start_matches('\n').to_string();
                }
            }
            _ => {}
        }
    }

    content.to_string()
}
