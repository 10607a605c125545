//! [`FontSource`] implementation backed by the [`bdf`] parser.

use core::{any::Any, error, fmt};
use std::{io::Read, panic};

use anyhow::{Context, Result};
use bdf::BoundingBox;
use font::{glyph::GlyphBitmap, table::CellSize};
use log::{debug, trace};

use crate::FontSource;

pub mod prepare;

pub use prepare::{MAX_ROW_WIDTH, prepare};

/// A parsed BDF font.
pub struct BdfFont {
    /// The parsed font.
    font: bdf::Font,
}

impl BdfFont {
    /// Wraps an already parsed [`bdf::Font`].
    pub fn new(font: bdf::Font) -> Self {
        Self { font }
    }

    /// Parses `reader` as a BDF font.
    ///
    /// Glyphs outside of the printable ASCII range are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if `reader` fails, does not contain a valid BDF font, or contains a
    /// printable ASCII glyph with rows wider than [`MAX_ROW_WIDTH`].
    pub fn read<R: Read>(mut reader: R) -> Result<Self> {
        let mut text = String::new();
        reader
            .read_to_string(&mut text)
            .context("error reading BDF font")?;

        let font = parse(&prepare(&text)?)?;
        debug!(
            "parsed BDF font with {} glyphs and a {}x{} bounding box",
            font.glyphs().len(),
            font.bounds().width,
            font.bounds().height
        );

        Ok(Self::new(font))
    }
}

impl FontSource for BdfFont {
    fn bounding_box(&self) -> (u32, u32) {
        let bounds = self.font.bounds();
        (bounds.width, bounds.height)
    }

    fn glyph(&self, code_point: char) -> Option<GlyphBitmap> {
        let glyph = self.font.glyphs().get(&code_point)?;
        let font_box = *self.font.bounds();
        let cell = CellSize::new(
            u8::try_from(font_box.width).ok()?,
            u8::try_from(font_box.height).ok()?,
        )?;

        // A glyph without a BITMAP section has an empty map, whatever its BBX says.
        let map = glyph.map();
        let glyph_box = BoundingBox {
            width: map.width(),
            height: map.height(),
            ..*glyph.bounds()
        };

        trace!("{code_point:?} has bounding box {glyph_box:?}");
        Some(rasterize(cell, font_box, glyph_box, |x, y| map.get(x, y)))
    }
}

/// Runs the [`bdf`] parser over already prepared `text`.
///
/// The parser panics on some malformed input, such panics are reported as
/// [`BdfError::ParserPanicked`].
fn parse(text: &str) -> Result<bdf::Font> {
    let result = panic::catch_unwind(|| bdf::read(text.as_bytes()))
        .map_err(|payload| BdfError::ParserPanicked(panic_message(&*payload)))
        .context("invalid BDF font")?;

    result.context("invalid BDF font")
}

/// Extracts the message of a panic `payload`.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_owned()
    }
}

/// Draws a glyph occupying `glyph_box` into a cell covering `font_box`.
///
/// Both boxes are in BDF font space, where `y` grows upwards from the baseline. `pixel` is
/// queried with coordinates relative to the top-left corner of `glyph_box`. Glyph pixels outside
/// of `font_box` are clipped.
pub fn rasterize<F: Fn(u32, u32) -> bool>(
    cell: CellSize,
    font_box: BoundingBox,
    glyph_box: BoundingBox,
    pixel: F,
) -> GlyphBitmap {
    let mut bitmap = GlyphBitmap::new(cell);

    // Font space coordinate of the top row of the cell.
    let top = i64::from(font_box.y) + i64::from(font_box.height) - 1;
    let glyph_top = i64::from(glyph_box.y) + i64::from(glyph_box.height) - 1;

    for cy in 0..cell.height() {
        let y = top - i64::from(cy);
        let Ok(gy) = u32::try_from(glyph_top - y) else {
            continue;
        };
        if gy >= glyph_box.height {
            continue;
        }

        for cx in 0..cell.width() {
            let x = i64::from(font_box.x) + i64::from(cx);
            let Ok(gx) = u32::try_from(x - i64::from(glyph_box.x)) else {
                continue;
            };
            if gx < glyph_box.width && pixel(gx, gy) {
                bitmap.set(cx, cy, true);
            }
        }
    }

    bitmap
}

/// Various errors that can occur while reading a BDF font.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BdfError {
    /// A printable ASCII glyph has bitmap rows wider than [`MAX_ROW_WIDTH`].
    RowTooWide {
        /// The `STARTCHAR` name of the glyph.
        glyph: String,
        /// The width of the bitmap rows.
        width: u32,
    },
    /// The [`bdf`] parser panicked.
    ParserPanicked(String),
}

impl fmt::Display for BdfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RowTooWide { glyph, width } => write!(
                f,
                "glyph {glyph:?} has {width} pixel wide rows, at most {MAX_ROW_WIDTH} are supported"
            ),
            Self::ParserPanicked(message) => write!(f, "BDF parser panicked: {message}"),
        }
    }
}

impl error::Error for BdfError {}

#[cfg(test)]
mod test {
    use std::fmt::Write;

    use bdf::BoundingBox;
    use font::table::{CellSize, GLYPH_COUNT, GlyphTable, HEADER_SIZE, code_points, glyph_index};

    use super::{BdfError, BdfFont, parse, rasterize};
    use crate::{ConvertError, FontSource, convert_bdf};

    const FONT_BOX: BoundingBox = BoundingBox {
        width: 8,
        height: 8,
        x: 0,
        y: -1,
    };

    /// `A` of [`small_font`]: a solid 4x4 block at offset (2, 0).
    const BLOCK_A: &str = "BBX 4 4 2 0\nBITMAP\nF0\nF0\nF0\nF0\n";

    /// `|` of [`small_font`]: a full height single pixel column.
    const COLUMN_BAR: &str = "BBX 8 8 0 -1\nBITMAP\n10\n10\n10\n10\n10\n10\n10\n10\n";

    /// Builds a BDF font covering printable ASCII with a `font_box` bounding box.
    ///
    /// Each entry of `glyphs` gives the lines between `DWIDTH` and `ENDCHAR` of a glyph, or
    /// leaves the glyph out when `None`. Glyphs without an entry are blank.
    fn bdf_font(font_box: BoundingBox, glyphs: &[(char, Option<&str>)]) -> String {
        let bodies = code_points()
            .filter_map(|c| {
                let body = glyphs
                    .iter()
                    .rev()
                    .find(|(glyph, _)| *glyph == c)
                    .map_or(Some("BBX 0 0 0 0\nBITMAP\n"), |(_, body)| *body);
                body.map(|body| (c, body))
            })
            .collect::<Vec<_>>();

        let BoundingBox {
            width,
            height,
            x,
            y,
        } = font_box;

        let mut text = String::new();
        writeln!(text, "STARTFONT 2.1").unwrap();
        writeln!(
            text,
            "FONT -test-fixed-medium-r-normal--{height}-{height}0-75-75-c-{width}0-iso10646-1"
        )
        .unwrap();
        writeln!(text, "SIZE {height} 75 75").unwrap();
        writeln!(text, "FONTBOUNDINGBOX {width} {height} {x} {y}").unwrap();
        writeln!(text, "STARTPROPERTIES 2").unwrap();
        writeln!(text, "FONT_ASCENT {}", i64::from(height) + i64::from(y)).unwrap();
        writeln!(text, "FONT_DESCENT {}", -y).unwrap();
        writeln!(text, "ENDPROPERTIES").unwrap();
        writeln!(text, "CHARS {}", bodies.len()).unwrap();
        for (c, body) in bodies {
            let code = u32::from(c);
            writeln!(text, "STARTCHAR U+{code:04X}").unwrap();
            writeln!(text, "ENCODING {code}").unwrap();
            writeln!(text, "SWIDTH 500 0").unwrap();
            writeln!(text, "DWIDTH {width} 0").unwrap();
            text.push_str(body);
            writeln!(text, "ENDCHAR").unwrap();
        }
        writeln!(text, "ENDFONT").unwrap();

        text
    }

    /// Builds an 8x8 font with [`BLOCK_A`] and [`COLUMN_BAR`] on top of `glyphs`.
    fn small_font(glyphs: &[(char, Option<&str>)]) -> String {
        let mut all = vec![('A', Some(BLOCK_A)), ('|', Some(COLUMN_BAR))];
        all.extend_from_slice(glyphs);
        bdf_font(FONT_BOX, &all)
    }

    /// Returns the record of `c` in `dump`.
    fn record(dump: &[u8], c: char) -> &[u8] {
        let table = GlyphTable::from_dump(dump).unwrap();
        let size = table.cell_size().glyph_byte_count();
        let start = HEADER_SIZE + glyph_index(c).unwrap() * size;
        &dump[start..start + size]
    }

    #[test]
    fn rasterize_full_cell() {
        let cell = CellSize::new(8, 8).unwrap();
        let bitmap = rasterize(cell, FONT_BOX, FONT_BOX, |x, y| x == y);

        assert_eq!(
            bitmap.as_bytes(),
            &[0x80, 0x40, 0x20, 0x10, 0x08, 0x04, 0x02, 0x01]
        );
    }

    #[test]
    fn rasterize_places_by_offset() {
        let cell = CellSize::new(8, 8).unwrap();
        let glyph_box = BoundingBox {
            width: 4,
            height: 4,
            x: 2,
            y: 0,
        };
        let bitmap = rasterize(cell, FONT_BOX, glyph_box, |_, _| true);

        // The baseline is the second row from the bottom.
        assert_eq!(
            bitmap.as_bytes(),
            &[0x00, 0x00, 0x00, 0x3C, 0x3C, 0x3C, 0x3C, 0x00]
        );
    }

    #[test]
    fn rasterize_clips_overhang() {
        let cell = CellSize::new(4, 4).unwrap();
        let font_box = BoundingBox {
            width: 4,
            height: 4,
            x: 0,
            y: 0,
        };
        let glyph_box = BoundingBox {
            width: 6,
            height: 6,
            x: -1,
            y: -1,
        };
        let bitmap = rasterize(cell, font_box, glyph_box, |_, _| true);

        assert_eq!(bitmap.as_bytes(), &[0xF0, 0xF0, 0xF0, 0xF0]);
    }

    #[test]
    fn rasterize_queries_glyph_coordinates() {
        let cell = CellSize::new(3, 3).unwrap();
        let font_box = BoundingBox {
            width: 3,
            height: 3,
            x: 0,
            y: 0,
        };
        let glyph_box = BoundingBox {
            width: 1,
            height: 1,
            x: 2,
            y: 2,
        };
        let bitmap = rasterize(cell, font_box, glyph_box, |x, y| {
            assert_eq!((x, y), (0, 0));
            true
        });

        assert_eq!(bitmap.get(2, 0), Some(true));
        assert_eq!(bitmap.as_bytes(), &[0x20, 0x00, 0x00]);
    }

    #[test]
    fn rasterize_empty_glyph() {
        let cell = CellSize::new(8, 8).unwrap();
        let glyph_box = BoundingBox {
            width: 0,
            height: 0,
            x: 2,
            y: 0,
        };
        let bitmap = rasterize(cell, FONT_BOX, glyph_box, |_, _| unreachable!());

        assert!(bitmap.as_bytes().iter().all(|row| *row == 0));
    }

    #[test]
    fn reads_bdf_font() {
        let font = BdfFont::read(small_font(&[]).as_bytes()).unwrap();
        assert_eq!(font.bounding_box(), (8, 8));

        let a = font.glyph('A').unwrap();
        assert_eq!(a.as_bytes(), &[0x00, 0x00, 0x00, 0x3C, 0x3C, 0x3C, 0x3C, 0x00]);

        let bar = font.glyph('|').unwrap();
        assert!(bar.as_bytes().iter().all(|row| *row == 0x10));

        assert!(font.glyph('\u{7F}').is_none());
    }

    #[test]
    fn converts_bdf_font() {
        let dump = convert_bdf(small_font(&[]).as_bytes()).unwrap();
        assert_eq!(dump.len(), 764);
        assert_eq!(&dump[..4], &[8, 8, 0, 0]);

        let table = GlyphTable::from_dump(&dump).unwrap();
        assert_eq!(table.glyphs().count(), GLYPH_COUNT);
        assert_eq!(
            table.glyph('A').unwrap().as_bytes(),
            &[0xFF, 0xFF, 0xFF, 0xC3, 0xC3, 0xC3, 0xC3, 0xFF]
        );
        assert_eq!(
            table.glyph('A').unwrap().to_string(),
            "........\n........\n........\n..####..\n..####..\n..####..\n..####..\n........\n"
        );
        assert!(table.glyph(' ').unwrap().as_bytes().iter().all(|byte| *byte == 0xFF));
    }

    #[test]
    fn converts_6x13_font() {
        let font_box = BoundingBox {
            width: 6,
            height: 13,
            x: 0,
            y: -3,
        };
        let a = "BBX 5 7 0 0\nBITMAP\n20\n50\n88\n88\nF8\n88\n88\n";
        let dump = convert_bdf(bdf_font(font_box, &[('A', Some(a))]).as_bytes()).unwrap();

        assert_eq!(dump.len(), 1239);
        assert_eq!(&dump[..4], &[6, 13, 0, 0]);
        assert_eq!(
            record(&dump, 'A'),
            &[
                0xFF, 0xFF, 0xFF, 0xDF, 0xAF, 0x77, 0x77, 0x07, 0x77, 0x77, 0xFF, 0xFF, 0xFF
            ]
        );
        assert!(record(&dump, '~').iter().all(|byte| *byte == 0xFF));
    }

    #[test]
    fn converts_12x16_font() {
        let font_box = BoundingBox {
            width: 12,
            height: 16,
            x: 0,
            y: -4,
        };
        let hash = "BBX 12 2 0 0\nBITMAP\nFFF0\n8010\n";
        let dump = convert_bdf(bdf_font(font_box, &[('#', Some(hash))]).as_bytes()).unwrap();

        assert_eq!(dump.len(), 3044);
        assert_eq!(&dump[..4], &[12, 16, 0, 0]);

        let hash = record(&dump, '#');
        assert_eq!(&hash[20..24], &[0x00, 0x0F, 0x7F, 0xEF]);
        assert!(hash[..20].iter().all(|byte| *byte == 0xFF));
        assert!(hash[24..].iter().all(|byte| *byte == 0xFF));
    }

    #[test]
    fn converts_cell_wider_than_row_limit() {
        let font_box = BoundingBox {
            width: 100,
            height: 8,
            x: 0,
            y: -1,
        };
        let a = "BBX 8 1 70 0\nBITMAP\nFF\n";
        let dump = convert_bdf(bdf_font(font_box, &[('A', Some(a))]).as_bytes()).unwrap();

        assert_eq!(dump.len(), 4 + GLYPH_COUNT * 13 * 8);
        let a = record(&dump, 'A');
        let baseline = &a[6 * 13..7 * 13];
        assert_eq!(&baseline[8..10], &[0xFC, 0x03]);
        assert!(baseline[..8].iter().all(|byte| *byte == 0xFF));
        assert!(baseline[10..].iter().all(|byte| *byte == 0xFF));
    }

    #[test]
    fn rejects_glyph_wider_than_row_limit() {
        let font_box = BoundingBox {
            width: 100,
            height: 8,
            x: 0,
            y: -1,
        };
        let wide = format!("BBX 100 1 0 0\nBITMAP\n{}\n", "F".repeat(26));
        let text = bdf_font(font_box, &[('W', Some(wide.as_str()))]);
        let error = convert_bdf(text.as_bytes()).unwrap_err();

        assert_eq!(
            error.downcast_ref::<BdfError>(),
            Some(&BdfError::RowTooWide {
                glyph: "U+0057".to_owned(),
                width: 100,
            })
        );
    }

    #[test]
    fn ignores_glyphs_outside_table() {
        let extra = format!(
            "STARTCHAR unencoded\nENCODING -1\nSWIDTH 500 0\nDWIDTH 8 0\nBBX 8 8 0 -1\nBITMAP\n\
             {rows}ENDCHAR\nSTARTCHAR wide\nENCODING 233\nSWIDTH 500 0\nDWIDTH 8 0\n\
             BBX 100 1 0 0\nBITMAP\n{wide}\nENDCHAR\nENDFONT\n",
            rows = "FF\n".repeat(8),
            wide = "F".repeat(26),
        );
        let text = small_font(&[]).replace("ENDFONT\n", &extra);

        let font = BdfFont::read(text.as_bytes()).unwrap();
        assert!(font.glyph('\u{E9}').is_none());

        let dump = convert_bdf(text.as_bytes()).unwrap();
        assert_eq!(dump.len(), 764);
    }

    #[test]
    fn converts_glyph_without_bitmap() {
        let dump = convert_bdf(small_font(&[('B', Some("BBX 4 4 2 0\n"))]).as_bytes()).unwrap();

        assert!(record(&dump, 'B').iter().all(|byte| *byte == 0xFF));
        assert_eq!(
            record(&dump, 'A'),
            &[0xFF, 0xFF, 0xFF, 0xC3, 0xC3, 0xC3, 0xC3, 0xFF]
        );
    }

    #[test]
    fn accepts_unquoted_properties_and_comments() {
        let text = small_font(&[])
            .replace(
                "STARTPROPERTIES 2\n",
                "COMMENT x\nCOMMENT\nSTARTPROPERTIES 4\nFONT_VERSION 1.0\nFOUNDRY Misc\n",
            )
            .replace("SWIDTH 500 0\n", "SWIDTH 500 0\nCOMMENT \"\n");

        let dump = convert_bdf(text.as_bytes()).unwrap();
        assert_eq!(dump.len(), 764);
    }

    #[test]
    fn rejects_font_missing_glyph() {
        let error = convert_bdf(small_font(&[('g', None)]).as_bytes()).unwrap_err();
        assert_eq!(
            error.downcast_ref::<ConvertError>(),
            Some(&ConvertError::MissingGlyph('g'))
        );
    }

    #[test]
    fn rejects_invalid_bdf() {
        assert!(BdfFont::read("not a font".as_bytes()).is_err());
        assert!(BdfFont::read("STARTFONT 2.1\nthis is not a font\n".as_bytes()).is_err());
        assert!(BdfFont::read("STARTFONT 2.1\nCOMMENT \"\nENDFONT\n".as_bytes()).is_err());
        assert!(BdfFont::read(&[0xFF, 0xFE][..]).is_err());
    }

    #[test]
    fn reports_parser_panic() {
        let error = parse("STARTFONT 2.1\nFOO bar\n").unwrap_err();

        assert!(matches!(
            error.downcast_ref::<BdfError>(),
            Some(BdfError::ParserPanicked(_))
        ));
    }
}
