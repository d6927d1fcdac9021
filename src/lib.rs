//! # kasi
//!
//! A markdown to LaTeX converter for Toki Pona documents written in
//! sitelen pona, the language's logographic script.
//!
//! Source documents are plain markdown with Toki Pona words in Latin
//! letters. Conversion replaces each word with its UCSUR glyph, typesets
//! cartouches, long-glyph containers, quotes and punctuation, and wraps
//! the result in a complete book-class LaTeX document ready for a
//! sitelen pona font such as nasin-nanpa.
//!
//! ## Features
//!
//! - Full word table (UCSUR base words plus font compound assignments),
//!   replaceable with a custom CSV table
//! - Cartouches, nested long groups, extending pre- and post-long glyphs
//! - Markdown structure: title page, chapters, images, horizontal rules
//! - Code blocks, inline code and math pass through unconverted
//!
//! ## Quick Start
//!
//! ```
//! use kasi::{convert, ConvertOptions, Lexicon};
//!
//! let latex = convert(
//!     "# lipu mi\n\n## open\n\ntoki pona.",
//!     &Lexicon::embedded(),
//!     ConvertOptions::default(),
//! );
//! assert!(latex.starts_with("\\documentclass"));
//! assert!(latex.contains('\u{F196C}')); // toki
//! ```
//!
//! ## The rewrite engine
//!
//! Every conversion rule runs through an escape-aware rewrite engine:
//! text bracketed in U+001B markers is never matched, so escaping a
//! region once protects it from the whole pipeline. The engine is public
//! for callers who want to add their own rules:
//!
//! ```
//! use kasi::rewrite;
//!
//! assert_eq!(rewrite("a b", "a", "x"), "x b");
//! assert_eq!(rewrite("\u{1B}a\u{1B} b", "a", "x"), "\u{1B}a\u{1B} b");
//! ```

pub mod error;
pub mod glyphs;
pub mod lexicon;
pub mod pipeline;
pub mod rewrite;

mod escape;
mod latex;
mod words;

pub use error::{Error, Result};
pub use lexicon::Lexicon;
pub use pipeline::{ConvertOptions, convert};
pub use rewrite::{MARKER, Rule, rewrite};
