//! Marker placement: the passes that bracket protected text in escape
//! markers before any rewrite rule runs.
//!
//! These passes are the other half of the engine's contract: rewrite rules
//! assume markers are balanced within every line they touch, and balance is
//! established here. Code blocks and block math are escaped whole, inline
//! code and math spans are paired up by a per-line scanner, and
//! backslash-escaped characters become marker-wrapped literals.

use regex::Regex;

use crate::rewrite::{MARKER, rewrite};

/// Wrap every non-empty line of each fenced code block in markers.
///
/// A block opens with a fence of three or more colons whose tag list
/// contains `code` (`::: code`, `:::sources code rust`) and closes with a
/// fence of exactly the same length and nothing but trailing spaces. Both
/// fence lines are escaped along with the body; blank body lines stay
/// unescaped. A fence that never closes leaves its lines untouched.
pub(crate) fn escape_code_blocks(content: &str) -> String {
    let lines: Vec<&str> = content.split('\n').collect();
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut index = 0;

    while index < lines.len() {
        if let Some(fence) = code_fence_open(lines[index]) {
            if let Some(close) =
                (index + 1..lines.len()).find(|&j| code_fence_close(lines[j], fence))
            {
                for line in &lines[index..=close] {
                    if line.is_empty() {
                        out.push(String::new());
                    } else {
                        out.push(format!("{MARKER}{line}{MARKER}"));
                    }
                }
                index = close + 1;
                continue;
            }
        }
        out.push(lines[index].to_string());
        index += 1;
    }

    out.join("\n")
}

fn code_fence_open(line: &str) -> Option<usize> {
    let colons = line.chars().take_while(|&c| c == ':').count();
    if colons < 3 {
        return None;
    }
    line[colons..]
        .split_whitespace()
        .any(|tag| tag == "code")
        .then_some(colons)
}

fn code_fence_close(line: &str, colons: usize) -> bool {
    let n = line.chars().take_while(|&c| c == ':').count();
    n == colons && line[n..].chars().all(|c| c == ' ')
}

/// Wrap whole `$$ ... $$` display-math lines in markers.
pub(crate) fn escape_block_math(content: &str) -> String {
    let re = Regex::new(r"(?m)^\$\$[^\n]*\$\$$").expect("invalid block math pattern");
    re.replace_all(content, format!("{MARKER}${{0}}{MARKER}").as_str())
        .into_owned()
}

/// Pair up inline `` ` `` and `$` delimiters on each line, inserting a
/// marker before each opener and after its closer.
///
/// A delimiter preceded by an odd number of backslashes is literal and
/// neither opens nor closes a span. A span left open at the end of the
/// line keeps its lone opening marker; the resulting odd marker count
/// makes every later rule skip that line.
pub(crate) fn escape_inline_spans(content: &str) -> String {
    content
        .split('\n')
        .map(|line| {
            if line.starts_with(MARKER) {
                line.to_string()
            } else {
                escape_inline_line(line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn escape_inline_line(line: &str) -> String {
    let mut out = String::with_capacity(line.len() + 8);
    let mut open: Option<char> = None;
    let mut backslashes = 0;

    for c in line.chars() {
        if c == '\\' {
            backslashes += 1;
            out.push(c);
            continue;
        }
        match open {
            None if backslashes % 2 == 0 && (c == '`' || c == '$') => {
                out.push(MARKER);
                out.push(c);
                open = Some(c);
            }
            Some(delim) if c == delim && backslashes % 2 == 0 => {
                out.push(c);
                out.push(MARKER);
                open = None;
            }
            _ => out.push(c),
        }
        backslashes = 0;
    }

    out
}

/// Neutralize backslash-escaped delimiters inside already-marked spans.
///
/// Within a span running from marker+delimiter to the first delimiter
/// followed directly by a marker, a run of n backslashes before the
/// delimiter becomes n/2 backslashes plus an empty marker pair, so the
/// delimiter renders literally once markers are stripped.
pub(crate) fn escape_delimiters_in_spans(content: &str, delim: char) -> String {
    let open = format!("{MARKER}{delim}");
    let close = format!("{delim}{MARKER}");
    let mut out = String::with_capacity(content.len());
    let mut rest = content;

    loop {
        let Some(start) = rest.find(&open) else {
            out.push_str(rest);
            return out;
        };
        let body_start = start + open.len();
        // Spans never cross lines; an opener without a closer on the same
        // line is passed through unprocessed.
        let line_end = rest[body_start..]
            .find('\n')
            .map_or(rest.len(), |n| body_start + n);
        let Some(end) = rest[body_start..line_end].find(&close) else {
            out.push_str(&rest[..body_start]);
            rest = &rest[body_start..];
            continue;
        };
        let body_end = body_start + end;
        out.push_str(&rest[..body_start]);
        out.push_str(&escape_delimiter_runs(&rest[body_start..body_end], delim));
        out.push_str(&close);
        rest = &rest[body_end + close.len()..];
    }
}

fn escape_delimiter_runs(body: &str, delim: char) -> String {
    let re = Regex::new(&format!(r"\\+{}", regex::escape(&delim.to_string())))
        .expect("invalid delimiter pattern");
    re.replace_all(body, |caps: &regex::Captures| {
        let backslashes = caps[0].len() - delim.len_utf8();
        format!("{}{MARKER}{MARKER}{delim}", "\\".repeat(backslashes / 2))
    })
    .into_owned()
}

/// Turn backslash escapes into marker-wrapped literals.
///
/// `\x` (any single non-word character) and `\word` (a word of letters,
/// digits and the compound characters `+ < = > -`) lose the backslash and
/// gain a marker pair, protecting the text from every later rule.
pub(crate) fn escape_backslash_sequences(content: &str) -> String {
    rewrite(
        content,
        r"\\([^a-zA-Z\n\x1B-]|[a-zA-Z-][a-zA-Z+<=>0-9-]*)",
        "\u{1B}$1\u{1B}",
    )
}
