//! Normalization of BDF text ahead of the [`bdf`] parser.
//!
//! The parser accepts a narrower dialect than fonts in the wild use: it panics on short
//! `COMMENT` lines and unquoted non-integer property values, rejects negative `ENCODING`
//! values, and decodes each bitmap row into a single [`u64`]. [`prepare`] rewrites the text
//! into that dialect and drops glyphs that cannot appear in a glyph table.

use std::borrow::Cow;

use font::table::code_points;
use log::trace;

use super::BdfError;

/// The widest bitmap row, in pixels, the parser can decode.
pub const MAX_ROW_WIDTH: u32 = u64::BITS;

/// Keywords the parser handles itself. Every other line with a value is a property.
const KEYWORDS: &[&str] = &[
    "STARTFONT",
    "FONT",
    "SIZE",
    "FONTBOUNDINGBOX",
    "CONTENTVERSION",
    "CHARS",
    "STARTCHAR",
    "ENCODING",
    "METRICSSET",
    "SWIDTH",
    "DWIDTH",
    "SWIDTH1",
    "DWIDTH1",
    "VVECTOR",
    "BBX",
    "BITMAP",
    "ENDCHAR",
    "ENDFONT",
    "STARTPROPERTIES",
    "ENDPROPERTIES",
];

/// Rewrites `text` so that the [`bdf`] parser can read it.
///
/// - `COMMENT` and blank lines are dropped.
/// - Property values that are neither integers nor quoted strings are quoted.
/// - Glyphs whose `ENCODING` is negative or outside of the printable ASCII range are dropped.
///   Glyphs with a missing or malformed `ENCODING` are kept for the parser to report.
///
/// # Errors
///
/// Returns [`BdfError::RowTooWide`] if a kept glyph has rows wider than [`MAX_ROW_WIDTH`].
pub fn prepare(text: &str) -> Result<String, BdfError> {
    let mut prepared = String::with_capacity(text.len());
    let mut font_width = None;
    let mut block: Option<GlyphBlock> = None;

    for line in text.lines() {
        let (keyword, rest) = split(line);

        let Some(glyph) = &mut block else {
            match keyword {
                "FONTBOUNDINGBOX" => font_width = rest.and_then(first_value),
                "STARTCHAR" => {
                    block = Some(GlyphBlock::new(rest.unwrap_or_default(), line));
                    continue;
                }
                _ => {}
            }

            if let Some(line) = normalize(keyword, rest, line) {
                prepared.push_str(&line);
                prepared.push('\n');
            }
            continue;
        };

        if glyph.bitmap_width.is_some() && keyword != "ENDCHAR" {
            glyph.lines.push(Cow::Borrowed(line));
            continue;
        }

        match keyword {
            "ENCODING" => {
                glyph.code = rest.and_then(first_value);
                if let Some(code) = glyph.code {
                    glyph.lines.push(Cow::Owned(format!("ENCODING {code}")));
                    continue;
                }
            }
            "BBX" => glyph.width = rest.and_then(first_value),
            "BITMAP" => glyph.bitmap_width = Some(glyph.width.or(font_width).unwrap_or(0)),
            "ENDCHAR" => {
                glyph.lines.push(Cow::Borrowed(line));
                if let Some(glyph) = block.take() {
                    glyph.finish(&mut prepared)?;
                }
                continue;
            }
            _ => {}
        }

        if let Some(line) = normalize(keyword, rest, line) {
            glyph.lines.push(line);
        }
    }

    // An unterminated glyph is left for the parser to report.
    if let Some(glyph) = block {
        glyph.emit(&mut prepared);
    }

    Ok(prepared)
}

/// The buffered lines of a `STARTCHAR` ... `ENDCHAR` block.
struct GlyphBlock<'text> {
    /// The `STARTCHAR` name.
    name: &'text str,
    /// The lines of the block, already normalized.
    lines: Vec<Cow<'text, str>>,
    /// The `ENCODING`, if it parses.
    code: Option<i64>,
    /// The width of the `BBX`, if any.
    width: Option<u32>,
    /// The width of the bitmap rows, once `BITMAP` was seen.
    bitmap_width: Option<u32>,
}

impl<'text> GlyphBlock<'text> {
    /// Starts a block named `name` at its `STARTCHAR` `line`.
    fn new(name: &'text str, line: &'text str) -> Self {
        Self {
            name,
            lines: vec![Cow::Borrowed(line)],
            code: None,
            width: None,
            bitmap_width: None,
        }
    }

    /// Appends the block to `prepared` unless its glyph is outside of the table.
    fn finish(self, prepared: &mut String) -> Result<(), BdfError> {
        let in_table = self.code.is_none_or(|code| {
            u32::try_from(code)
                .ok()
                .and_then(char::from_u32)
                .is_some_and(|c| code_points().contains(&c))
        });
        if !in_table {
            trace!("skipping glyph {:?} with encoding {:?}", self.name, self.code);
            return Ok(());
        }

        if let Some(width) = self.bitmap_width.filter(|width| *width > MAX_ROW_WIDTH) {
            return Err(BdfError::RowTooWide {
                glyph: self.name.to_owned(),
                width,
            });
        }

        self.emit(prepared);
        Ok(())
    }

    /// Appends every line of the block to `prepared`.
    fn emit(self, prepared: &mut String) {
        for line in self.lines {
            prepared.push_str(&line);
            prepared.push('\n');
        }
    }
}

/// Splits `line` into its keyword and value the same way the parser does.
fn split(line: &str) -> (&str, Option<&str>) {
    match line.find(' ') {
        Some(index) => (&line[..index], Some(line[index..].trim())),
        None => (line.trim(), None),
    }
}

/// Parses the first whitespace separated value of `rest`.
fn first_value<T: core::str::FromStr>(rest: &str) -> Option<T> {
    rest.split_whitespace().next()?.parse().ok()
}

/// Returns `line` in a form the parser accepts, or `None` if it should be dropped.
fn normalize<'text>(
    keyword: &str,
    rest: Option<&str>,
    line: &'text str,
) -> Option<Cow<'text, str>> {
    if keyword == "COMMENT" || line.trim().is_empty() {
        return None;
    }

    let Some(rest) = rest else {
        return Some(Cow::Borrowed(line));
    };
    if KEYWORDS.contains(&keyword) || rest.parse::<i64>().is_ok() || is_quoted(rest) {
        return Some(Cow::Borrowed(line));
    }

    Some(Cow::Owned(format!(
        "{keyword} \"{}\"",
        rest.replace('"', "\"\"")
    )))
}

/// Returns whether `value` is a complete quoted string.
fn is_quoted(value: &str) -> bool {
    value.len() >= 2 && value.starts_with('"') && value.ends_with('"')
}
