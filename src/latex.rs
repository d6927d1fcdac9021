//! LaTeX typesetting stages.
//!
//! These stages run after word conversion: the buffer holds glyphs plus
//! the remaining structural markdown (headings, cartouches, groups, code,
//! math), and each stage lowers one construct to LaTeX. Escape markers are
//! still in place and are only stripped by the final stage.

use regex::{Captures, Regex};

use crate::glyphs::{
    CARTOUCHE_CLOSE, CARTOUCHE_OPEN, COLON, LONG_GLYPH_CLOSE, LONG_GLYPH_OPEN, PERIOD, QUOTE_CLOSE,
    QUOTE_OPEN,
};
use crate::rewrite::{ESCAPED_SPAN, MARKER, rewrite};

/// Document preamble and cover page, emitted before the `# ` title text.
///
/// The table-of-contents name is set in glyphs: kulupu, an extending pi,
/// and kipisi-lipu inside a long-glyph container.
const PREAMBLE: &str = "\\documentclass[letterpaper, openany]{book}

\\usepackage[margin=1in]{geometry}
\\usepackage{fontspec}
\\usepackage{titletoc}
\\usepackage{titlesec}
\\usepackage{graphicx}
\\usepackage{wrapfig}
\\usepackage{float}

\\setmainfont{nasin-nanpa}
\\setlength{\\parskip}{10pt}
\\setlength{\\parindent}{0pt}
\\renewcommand{\\contentsname}{\u{F191F}\u{F1993}\\dunderline{0.1em}{\u{F1F2A}}\u{F1998}}
\\titleformat{\\chapter}[display]{\\normalfont\\bfseries}{}{0pt}{\\Huge}
\\renewcommand\\chaptermark[1]{\\markboth{#1}{}}

\\newcommand\\dunderline[3][-0.1em]{{\\sbox0{#3}\\ooalign{\\copy0\\cr\\rule[\\dimexpr#1-#2\\relax]{\\wd0}{#2}}}}
\\newcommand\\textoverline[3][1em]{{\\sbox0{#3}\\ooalign{\\copy0\\cr\\rule[\\dimexpr#1-#2\\relax]{\\wd0}{#2}}}}
\\newcommand{\\thickhrulefill}{\\vspace{-1.5em}\\leavevmode\\leaders\\hrule height 1pt\\hfill\\kern 0pt}

\\begin{document}
\\sloppy
\\raggedright
\\frontmatter

\\thispagestyle{empty}
\\begin{center}
\\vspace*{2cm}
{\\Huge\\bfseries ";

/// Closes the cover title and opens the title page proper.
const END_HEADER: &str = "\\par}
\\end{center}
\\newpage

\\thispagestyle{empty}
\\begin{center}
\\vspace{2cm}";

/// Closes the title page and emits the table of contents, inserted before
/// the first chapter heading.
const END_TITLE_PAGE: &str = "\\end{center}
\\newpage

\\titlecontents{chapter}[0pt]{\\addvspace{1em}}{}{}{\\titlerule*[1pc]{.}\\contentspage}
\\tableofcontents
\\mainmatter";

/// Replace image span pairs with figure environments.
///
/// An image is a line of the form `{path}{tags}` where the tags contain
/// `img`, optionally followed by a `{text}{tags}` caption line. A
/// `width-N` tag sets the width fraction (default 0.3); `float-left` /
/// `float-right` select a wrapped figure instead of a floating one.
///
/// Every emitted line is wrapped in a marker pair: the generated LaTeX
/// contains brackets and single-glyph braces that the cartouche and
/// span-strip stages would otherwise mangle. The final strip removes
/// the markers with everything else.
pub(crate) fn insert_images(content: &str) -> String {
    const SPAN: &str = r"(?:[^}\r\n]|\x1B\}\x1B)*";
    let re = Regex::new(&format!(
        r"(?m)^\{{({SPAN})\}}\{{((?:{SPAN} )?img(?: {SPAN})?)\}} *$(?:\n^\{{({SPAN})\}}\{{((?:{SPAN} )?caption(?: {SPAN})?)\}} *$)?"
    ))
    .expect("invalid image pattern");

    re.replace_all(content, |caps: &Captures| {
        let path = &caps[1];
        let tags: Vec<&str> = caps[2].split(' ').collect();
        let width = tags
            .iter()
            .find_map(|tag| tag.strip_prefix("width-"))
            .unwrap_or("0.3");
        let float = tags
            .iter()
            .find(|tag| **tag == "float-left" || **tag == "float-right");

        let (head, tail) = match float {
            Some(tag) => (
                format!("\\begin{{wrapfigure}}{{{}}}{{{width}\\textwidth}}", &tag[6..7]),
                "\\end{wrapfigure}",
            ),
            None => ("\\begin{figure}[H]".to_string(), "\\end{figure}"),
        };

        let mut block = vec![
            head,
            "\\centering".to_string(),
            format!("\\includegraphics[width={width}\\textwidth]{{{path}}}"),
        ];
        if let Some(text) = caps.get(3).map(|m| m.as_str()).filter(|t| !t.is_empty()) {
            block.push(format!("\\caption{{{text}}}"));
        }
        block.push(tail.to_string());

        block
            .iter()
            .map(|line| format!("{MARKER}{line}{MARKER}"))
            .collect::<Vec<_>>()
            .join("\n")
    })
    .into_owned()
}

/// Remove leftover single-character custom spans (`{x}{y}` chains).
pub(crate) fn strip_custom_spans(content: &str) -> String {
    rewrite(content, r"\{([^}\n])\}(?:\{[^}\n]\})*", "$1")
}

/// Typeset cartouches: `[name]` becomes the cartouche bracket glyphs
/// around over- and underlined content, with the trailing space dropped.
pub(crate) fn typeset_cartouches(content: &str) -> String {
    rewrite(
        content,
        r"\[([^\]\n]*)\] ?",
        &format!(
            "{CARTOUCHE_OPEN}\\dunderline{{0.1em}}{{\\textoverline{{0.1em}}{{$1}}}}{CARTOUCHE_CLOSE}"
        ),
    )
}

/// Convert undirected quotes to directional quotes, dropping the trailing
/// space.
pub(crate) fn directionalize_quotes(content: &str) -> String {
    rewrite(
        content,
        "\"([^\"\n]*)\" ?",
        &format!("{QUOTE_OPEN}$1{QUOTE_CLOSE}"),
    )
}

/// Typeset long-glyph containers: `(content)` becomes the container
/// glyphs with underlined content.
pub(crate) fn typeset_long_containers(content: &str) -> String {
    rewrite(
        content,
        r"\((.*?)\) ?",
        &format!("{LONG_GLYPH_OPEN}\\dunderline{{0.1em}}{{$1}}{LONG_GLYPH_CLOSE}"),
    )
}

/// Chomp the spaces around inline math spans, except after sentence
/// punctuation (so a span after a period keeps its separating space).
pub(crate) fn chomp_math_spacing(content: &str) -> String {
    let content = rewrite(
        content,
        &format!(r"(^|[^.:{PERIOD}{COLON}\n]) (\x1B\$[^\n]*?\$\x1B)"),
        "$1$2",
    );
    rewrite(&content, r"(\x1B\$[^\n]*?\$\x1B) ", "$1")
}

/// Convert horizontal rule lines to `\hline`.
pub(crate) fn typeset_hrules(content: &str) -> String {
    let re = Regex::new(r"(?m)^---+ *$").expect("invalid hrule pattern");
    re.replace_all(content, r"\hline").into_owned()
}

/// Expand the `# ` title into the document preamble and cover, and insert
/// the table of contents before the first chapter heading.
pub(crate) fn typeset_title_page(content: &str) -> String {
    let title_re = Regex::new(r"(?m)^# (.*)").expect("invalid title pattern");
    let content = title_re
        .replace(content, format!("{PREAMBLE}${{1}}{END_HEADER}").as_str())
        .into_owned();

    let chapter_re = Regex::new(r"(?m)^(## )").expect("invalid chapter pattern");
    chapter_re
        .replace(&content, format!("{END_TITLE_PAGE}\n${{1}}").as_str())
        .into_owned()
}

/// Convert chapter headings to `\chapter`.
pub(crate) fn typeset_chapters(content: &str) -> String {
    let re = Regex::new(r"(?m)^## (.*)").expect("invalid chapter pattern");
    re.replace_all(content, r"\chapter{${1}}").into_owned()
}

/// Typeset escaped code blocks between thick rules, with LaTeX specials
/// (including spaces) escaped and the first blank-line pair converted to
/// vertical space. The fence lines are dropped; the body lines keep their
/// markers until the final strip.
pub(crate) fn typeset_code_blocks(content: &str) -> String {
    let lines: Vec<&str> = content.split('\n').collect();
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut index = 0;

    while index < lines.len() {
        if let Some(fence) = escaped_code_fence_open(lines[index]) {
            if let Some(close) =
                (index + 1..lines.len()).find(|&j| escaped_code_fence_close(lines[j], fence))
            {
                let body = lines[index + 1..close].join("\n");
                let body = escape_latex_specials(&body, true);
                let body = replace_first_blank_pair(&body);
                out.push(format!(
                    "\\thickhrulefill\n{{\\setlength{{\\parskip}}{{0pt}}\n{body}\n}}\\thickhrulefill"
                ));
                index = close + 1;
                continue;
            }
        }
        out.push(lines[index].to_string());
        index += 1;
    }

    out.join("\n")
}

fn escaped_code_fence_open(line: &str) -> Option<usize> {
    let inner = line.strip_prefix(MARKER)?.strip_suffix(MARKER)?;
    let colons = inner.chars().take_while(|&c| c == ':').count();
    if colons < 3 {
        return None;
    }
    inner[colons..]
        .split_whitespace()
        .any(|tag| tag == "code")
        .then_some(colons)
}

fn escaped_code_fence_close(line: &str, colons: usize) -> bool {
    let Some(inner) = line.strip_prefix(MARKER).and_then(|l| l.strip_suffix(MARKER)) else {
        return false;
    };
    let n = inner.chars().take_while(|&c| c == ':').count();
    n == colons && inner[n..].chars().all(|c| c == ' ')
}

fn replace_first_blank_pair(body: &str) -> String {
    match body.find("\n\n") {
        Some(pos) => format!(
            "{}\n\\vspace{{1em}}\n{}",
            &body[..pos],
            &body[pos + 2..]
        ),
        None => body.to_string(),
    }
}

/// Typeset marker-wrapped inline code spans, keeping the markers.
pub(crate) fn typeset_inline_code(content: &str) -> String {
    let re = Regex::new(&format!("(?m)^(?:{ESCAPED_SPAN})\u{1B}(`([^`\n]*)`)\u{1B}"))
        .expect("invalid inline code pattern");

    let mut content = content.to_string();
    loop {
        let Some((range, inner)) = re
            .captures(&content)
            .map(|caps| (caps.get(1).unwrap().range(), caps[2].to_string()))
        else {
            return content;
        };
        let inner = escape_latex_specials(&inner, false);
        content.replace_range(
            range,
            &format!("\\raisebox{{0.15em}}{{\\scalebox{{0.6}}{{{inner}}}}}"),
        );
    }
}

/// Typeset marker-wrapped inline math spans.
pub(crate) fn typeset_math(content: &str) -> String {
    rewrite(
        content,
        r"\x1B\$([^$\n]+)\$\x1B",
        r"\raisebox{0.25em}{\scalebox{0.85}{$\,$1\,$}}",
    )
}

/// Strip every escape marker and append the document footer.
pub(crate) fn finish_document(content: &str) -> String {
    let mut content = content.replace(MARKER, "");
    content.push_str("\n\\end{document}");
    content
}

/// Backslash-escape the characters LaTeX treats specially in verbatim-ish
/// contexts (`#`, `_`, `{`, `}`, and optionally spaces).
fn escape_latex_specials(text: &str, escape_spaces: bool) -> String {
    let mut result = String::with_capacity(text.len() + text.len() / 8);
    for c in text.chars() {
        match c {
            '#' | '_' | '{' | '}' => {
                result.push('\\');
                result.push(c);
            }
            ' ' if escape_spaces => {
                result.push('\\');
                result.push(c);
            }
            _ => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cartouche() {
        assert_eq!(
            typeset_cartouches("[toki] pona"),
            format!(
                "{CARTOUCHE_OPEN}\\dunderline{{0.1em}}{{\\textoverline{{0.1em}}{{toki}}}}{CARTOUCHE_CLOSE}pona"
            )
        );
    }

    #[test]
    fn test_cartouche_skips_escaped_spans() {
        let input = "\u{1B}[x]\u{1B} y";
        assert_eq!(typeset_cartouches(input), input);
    }

    #[test]
    fn test_quotes() {
        assert_eq!(
            directionalize_quotes("\"toki\" pona"),
            "\u{201C}toki\u{201D}pona"
        );
    }

    #[test]
    fn test_long_container() {
        assert_eq!(
            typeset_long_containers("(ni) x"),
            format!("{LONG_GLYPH_OPEN}\\dunderline{{0.1em}}{{ni}}{LONG_GLYPH_CLOSE}x")
        );
    }

    #[test]
    fn test_chomp_math_spacing() {
        assert_eq!(
            chomp_math_spacing("a \u{1B}$x$\u{1B} b"),
            "a\u{1B}$x$\u{1B}b"
        );
    }

    #[test]
    fn test_chomp_math_spacing_keeps_space_after_period() {
        assert_eq!(
            chomp_math_spacing(&format!("a{PERIOD} \u{1B}$x$\u{1B}")),
            format!("a{PERIOD} \u{1B}$x$\u{1B}")
        );
    }

    #[test]
    fn test_hrules() {
        assert_eq!(typeset_hrules("a\n----\nb"), "a\n\\hline\nb");
    }

    #[test]
    fn test_title_page() {
        let output = typeset_title_page("# lipu\n\ntext\n\n## open");
        assert!(output.starts_with("\\documentclass"));
        assert!(output.contains("{\\Huge\\bfseries lipu\\par}"));
        assert!(output.contains("\\tableofcontents"));
        // The TOC block lands before the first chapter heading.
        let toc = output.find("\\tableofcontents").unwrap();
        let chapter = output.find("## open").unwrap();
        assert!(toc < chapter);
    }

    #[test]
    fn test_chapters() {
        assert_eq!(
            typeset_chapters("## toki\nx\n## pona"),
            "\\chapter{toki}\nx\n\\chapter{pona}"
        );
    }

    #[test]
    fn test_code_block() {
        let input = "\u{1B}::: code\u{1B}\n\u{1B}a_b\u{1B}\n\u{1B}:::\u{1B}";
        let output = typeset_code_blocks(input);
        assert!(output.starts_with("\\thickhrulefill\n{\\setlength{\\parskip}{0pt}"));
        assert!(output.contains("\u{1B}a\\_b\u{1B}"));
        assert!(output.ends_with("}\\thickhrulefill"));
    }

    #[test]
    fn test_code_block_escapes_spaces_and_adds_vspace() {
        let input =
            "\u{1B}::: code\u{1B}\n\u{1B}a b\u{1B}\n\n\u{1B}c\u{1B}\n\u{1B}:::\u{1B}";
        let output = typeset_code_blocks(input);
        assert!(output.contains("a\\ b"));
        assert!(output.contains("\\vspace{1em}"));
    }

    #[test]
    fn test_inline_code() {
        assert_eq!(
            typeset_inline_code("x \u{1B}`a_b`\u{1B} y"),
            "x \u{1B}\\raisebox{0.15em}{\\scalebox{0.6}{a\\_b}}\u{1B} y"
        );
    }

    #[test]
    fn test_math() {
        // The span's markers are part of the match and are consumed.
        assert_eq!(
            typeset_math("\u{1B}$x+y$\u{1B}"),
            "\\raisebox{0.25em}{\\scalebox{0.85}{$\\,x+y\\,$}}"
        );
    }

    #[test]
    fn test_images_plain_figure() {
        let output = insert_images("{kasi.png}{img width-0.5}");
        assert!(output.contains("\u{1B}\\begin{figure}[H]\u{1B}"));
        assert!(output.contains("\u{1B}\\includegraphics[width=0.5\\textwidth]{kasi.png}\u{1B}"));
        assert!(output.contains("\u{1B}\\end{figure}\u{1B}"));
    }

    #[test]
    fn test_images_float_with_caption() {
        let output = insert_images("{kasi.png}{img float-right}\n{toki}{caption}");
        assert!(output.contains("\u{1B}\\begin{wrapfigure}{r}{0.3\\textwidth}\u{1B}"));
        assert!(output.contains("\u{1B}\\caption{toki}\u{1B}"));
        assert!(output.contains("\u{1B}\\end{wrapfigure}\u{1B}"));
    }

    #[test]
    fn test_image_output_is_shielded_from_later_stages() {
        // Marker-wrapped figure lines must survive the bracket and span
        // rules that run after the image stage.
        let output = insert_images("{kasi.png}{img width-0.5}\n{\u{F196C}}{caption}");
        let output = strip_custom_spans(&output);
        let output = typeset_cartouches(&output);
        assert!(output.contains("[width=0.5\\textwidth]"));
        assert!(output.contains("\\caption{\u{F196C}}"));
        assert!(!output.contains(CARTOUCHE_OPEN));
    }

    #[test]
    fn test_strip_custom_spans() {
        // The greedy injected prefix collapses the rightmost span first,
        // so a chain folds to its concatenated contents.
        assert_eq!(strip_custom_spans("a {x}{y} b"), "a xy b");
    }

    #[test]
    fn test_finish_document() {
        assert_eq!(
            finish_document("a \u{1B}b\u{1B} c"),
            "a b c\n\\end{document}"
        );
    }
}
