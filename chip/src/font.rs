//! Compiles the glyph text format into font bytes.
//!
//! Every line of the text is a single row of a glyph. A `.` marks a lit
//! pixel and a space a dark one, rows are at most four pixels wide and get
//! placed into the high nibble of their byte. Empty lines are skipped, so
//! they can be used to separate the glyphs.
use once_cell::sync::Lazy;

use crate::{definitions::display::fontset, FontError};

/// The maximum amount of pixels in a glyph row.
const ROW_WIDTH: usize = 4;
const LIT: char = '.';
const DARK: char = ' ';

/// The hexadecimal digits `0-F`, five rows each.
pub const DEFAULT_GLYPHS: &str = "\
....
.  .
.  .
.  .
....

  .
 ..
  .
  .
 ...

....
   .
....
.
....

....
   .
....
   .
....

.  .
.  .
....
   .
   .

....
.
....
   .
....

....
.
....
.  .
....

....
   .
  .
 .
 .

....
.  .
....
.  .
....

....
.  .
....
   .
....

....
.  .
....
.  .
.  .

...
.  .
...
.  .
...

....
.
.
.
....

...
.  .
.  .
.  .
...

....
.
....
.
....

....
.
....
.
.
";

/// The compiled [`DEFAULT_GLYPHS`].
pub static FONTSET: Lazy<Vec<u8>> = Lazy::new(|| {
    let font = compile(DEFAULT_GLYPHS).expect("The default glyphs are well formed.");
    debug_assert_eq!(font.len(), fontset::GLYPHS * fontset::GLYPH_SIZE);
    font
});

/// Compiles the glyph text into one byte per row.
pub fn compile(text: &str) -> Result<Vec<u8>, FontError> {
    let mut bytes = Vec::with_capacity(fontset::GLYPHS * fontset::GLYPH_SIZE);

    for (index, line) in text.lines().enumerate() {
        if line.is_empty() {
            continue;
        }
        bytes.push(compile_row(line, index + 1)?);
    }

    Ok(bytes)
}

fn compile_row(row: &str, line: usize) -> Result<u8, FontError> {
    let width = row.chars().count();
    if width > ROW_WIDTH {
        return Err(FontError::RowTooWide { line, width });
    }

    let mut byte = 0u8;
    for (col, symbol) in row.chars().enumerate() {
        match symbol {
            LIT => byte |= 0x80 >> col,
            DARK => {}
            symbol => return Err(FontError::InvalidSymbol { line, symbol }),
        }
    }

    Ok(byte)
}
