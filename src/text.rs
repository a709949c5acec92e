// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

//! Scrolling text and single letters on the LED matrix.
//!
//! Glyphs are stored turned a quarter turn clockwise: each run of 8 pixels is
//! one glyph column, and pixel `j` of a run is display row `7 - j`. A glyph is
//! 5 such columns. Drawing therefore happens under the matrix rotation minus
//! 90 degrees, which makes consecutive runs march across the display from
//! left to right, and the message scrolls by advancing 8 pixels per frame.

use std::{collections::HashMap, fs, path::Path, time::Duration};

use log::{debug, trace};

use crate::{
    constants::{FALLBACK_CHAR, FRAME_LEN, GLYPH_COLUMNS, GLYPH_LEN, MATRIX_SIZE},
    interface::{Delay, FrameBufferInterface},
    matrix::LedMatrix,
    pixel::{Frame, Pixel},
    Result,
};

/// One character: 5 runs of 8 pixels
pub type Glyph = [Pixel; GLYPH_LEN];

const BLANK_GLYPH: Glyph = [Pixel::BLACK; GLYPH_LEN];

/// Printable ASCII from ' ' to '~', 5 column bytes per character with bit 0
/// as the top row
const ASCII_5X7: [[u8; GLYPH_COLUMNS]; 95] = [
    [0x00, 0x00, 0x00, 0x00, 0x00], // ' '
    [0x00, 0x00, 0x5f, 0x00, 0x00], // !
    [0x00, 0x07, 0x00, 0x07, 0x00], // "
    [0x14, 0x7f, 0x14, 0x7f, 0x14], // #
    [0x24, 0x2a, 0x7f, 0x2a, 0x12], // $
    [0x23, 0x13, 0x08, 0x64, 0x62], // %
    [0x36, 0x49, 0x55, 0x22, 0x50], // &
    [0x00, 0x05, 0x03, 0x00, 0x00], // '
    [0x00, 0x1c, 0x22, 0x41, 0x00], // (
    [0x00, 0x41, 0x22, 0x1c, 0x00], // )
    [0x08, 0x2a, 0x1c, 0x2a, 0x08], // *
    [0x08, 0x08, 0x3e, 0x08, 0x08], // +
    [0x00, 0x50, 0x30, 0x00, 0x00], // ,
    [0x08, 0x08, 0x08, 0x08, 0x08], // -
    [0x00, 0x60, 0x60, 0x00, 0x00], // .
    [0x20, 0x10, 0x08, 0x04, 0x02], // /
    [0x3e, 0x51, 0x49, 0x45, 0x3e], // 0
    [0x00, 0x42, 0x7f, 0x40, 0x00], // 1
    [0x42, 0x61, 0x51, 0x49, 0x46], // 2
    [0x21, 0x41, 0x45, 0x4b, 0x31], // 3
    [0x18, 0x14, 0x12, 0x7f, 0x10], // 4
    [0x27, 0x45, 0x45, 0x45, 0x39], // 5
    [0x3c, 0x4a, 0x49, 0x49, 0x30], // 6
    [0x01, 0x71, 0x09, 0x05, 0x03], // 7
    [0x36, 0x49, 0x49, 0x49, 0x36], // 8
    [0x06, 0x49, 0x49, 0x29, 0x1e], // 9
    [0x00, 0x36, 0x36, 0x00, 0x00], // :
    [0x00, 0x56, 0x36, 0x00, 0x00], // ;
    [0x00, 0x08, 0x14, 0x22, 0x41], // <
    [0x14, 0x14, 0x14, 0x14, 0x14], // =
    [0x41, 0x22, 0x14, 0x08, 0x00], // >
    [0x02, 0x01, 0x51, 0x09, 0x06], // ?
    [0x32, 0x49, 0x79, 0x41, 0x3e], // @
    [0x7e, 0x11, 0x11, 0x11, 0x7e], // A
    [0x7f, 0x49, 0x49, 0x49, 0x36], // B
    [0x3e, 0x41, 0x41, 0x41, 0x22], // C
    [0x7f, 0x41, 0x41, 0x22, 0x1c], // D
    [0x7f, 0x49, 0x49, 0x49, 0x41], // E
    [0x7f, 0x09, 0x09, 0x01, 0x01], // F
    [0x3e, 0x41, 0x41, 0x51, 0x32], // G
    [0x7f, 0x08, 0x08, 0x08, 0x7f], // H
    [0x00, 0x41, 0x7f, 0x41, 0x00], // I
    [0x20, 0x40, 0x41, 0x3f, 0x01], // J
    [0x7f, 0x08, 0x14, 0x22, 0x41], // K
    [0x7f, 0x40, 0x40, 0x40, 0x40], // L
    [0x7f, 0x02, 0x04, 0x02, 0x7f], // M
    [0x7f, 0x04, 0x08, 0x10, 0x7f], // N
    [0x3e, 0x41, 0x41, 0x41, 0x3e], // O
    [0x7f, 0x09, 0x09, 0x09, 0x06], // P
    [0x3e, 0x41, 0x51, 0x21, 0x5e], // Q
    [0x7f, 0x09, 0x19, 0x29, 0x46], // R
    [0x46, 0x49, 0x49, 0x49, 0x31], // S
    [0x01, 0x01, 0x7f, 0x01, 0x01], // T
    [0x3f, 0x40, 0x40, 0x40, 0x3f], // U
    [0x1f, 0x20, 0x40, 0x20, 0x1f], // V
    [0x7f, 0x20, 0x18, 0x20, 0x7f], // W
    [0x63, 0x14, 0x08, 0x14, 0x63], // X
    [0x03, 0x04, 0x78, 0x04, 0x03], // Y
    [0x61, 0x51, 0x49, 0x45, 0x43], // Z
    [0x00, 0x00, 0x7f, 0x41, 0x41], // [
    [0x02, 0x04, 0x08, 0x10, 0x20], // backslash
    [0x41, 0x41, 0x7f, 0x00, 0x00], // ]
    [0x04, 0x02, 0x01, 0x02, 0x04], // ^
    [0x40, 0x40, 0x40, 0x40, 0x40], // _
    [0x00, 0x01, 0x02, 0x04, 0x00], // `
    [0x20, 0x54, 0x54, 0x54, 0x78], // a
    [0x7f, 0x48, 0x44, 0x44, 0x38], // b
    [0x38, 0x44, 0x44, 0x44, 0x20], // c
    [0x38, 0x44, 0x44, 0x48, 0x7f], // d
    [0x38, 0x54, 0x54, 0x54, 0x18], // e
    [0x08, 0x7e, 0x09, 0x01, 0x02], // f
    [0x08, 0x14, 0x54, 0x54, 0x3c], // g
    [0x7f, 0x08, 0x04, 0x04, 0x78], // h
    [0x00, 0x44, 0x7d, 0x40, 0x00], // i
    [0x20, 0x40, 0x44, 0x3d, 0x00], // j
    [0x00, 0x7f, 0x10, 0x28, 0x44], // k
    [0x00, 0x41, 0x7f, 0x40, 0x00], // l
    [0x7c, 0x04, 0x18, 0x04, 0x78], // m
    [0x7c, 0x08, 0x04, 0x04, 0x78], // n
    [0x38, 0x44, 0x44, 0x44, 0x38], // o
    [0x7c, 0x14, 0x14, 0x14, 0x08], // p
    [0x08, 0x14, 0x14, 0x18, 0x7c], // q
    [0x7c, 0x08, 0x04, 0x04, 0x08], // r
    [0x48, 0x54, 0x54, 0x54, 0x20], // s
    [0x04, 0x3f, 0x44, 0x40, 0x20], // t
    [0x3c, 0x40, 0x40, 0x20, 0x7c], // u
    [0x1c, 0x20, 0x40, 0x20, 0x1c], // v
    [0x3c, 0x40, 0x30, 0x40, 0x3c], // w
    [0x44, 0x28, 0x10, 0x28, 0x44], // x
    [0x0c, 0x50, 0x50, 0x50, 0x3c], // y
    [0x44, 0x64, 0x54, 0x4c, 0x44], // z
    [0x00, 0x08, 0x36, 0x41, 0x00], // {
    [0x00, 0x00, 0x7f, 0x00, 0x00], // |
    [0x00, 0x41, 0x36, 0x08, 0x00], // }
    [0x08, 0x04, 0x08, 0x10, 0x08], // ~
];

fn glyph_from_columns(columns: &[u8; GLYPH_COLUMNS]) -> Glyph {
    let mut glyph = BLANK_GLYPH;
    for (run, &bits) in glyph.chunks_mut(MATRIX_SIZE).zip(columns) {
        for (j, pixel) in run.iter_mut().enumerate() {
            if bits >> (MATRIX_SIZE - 1 - j) & 1 == 1 {
                *pixel = Pixel::WHITE;
            }
        }
    }
    glyph
}

/// Character to glyph lookup
#[derive(Debug, Clone)]
pub struct Font {
    glyphs: HashMap<char, Glyph>,
}

impl Default for Font {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Font {
    /// Compiled-in 5x7 font covering printable ASCII
    pub fn builtin() -> Self {
        let glyphs = (' '..='~')
            .zip(ASCII_5X7.iter())
            .map(|(c, columns)| (c, glyph_from_columns(columns)))
            .collect();
        Self { glyphs }
    }

    /// Load a font from an 8 pixel wide image of stacked glyphs and a text
    /// file listing the character at each 40 pixel block.
    ///
    /// Lit pixels must be pure white. Characters past the end of the image
    /// are ignored.
    pub fn load<P: AsRef<Path>, Q: AsRef<Path>>(image_path: P, text_path: Q) -> Result<Self> {
        let img = image::open(image_path.as_ref())?.to_rgb8();
        let pixels: Vec<Pixel> = img.pixels().map(|p| Pixel::from(p.0)).collect();
        let chars = fs::read_to_string(text_path.as_ref())?;
        let font = Self::from_pixels(&pixels, &chars);
        debug!(
            "loaded {} glyphs from {}",
            font.len(),
            image_path.as_ref().display()
        );
        Ok(font)
    }

    /// Slice `pixels` into glyphs, the character at index i of `chars`
    /// taking pixels [i * 40, i * 40 + 40)
    pub fn from_pixels(pixels: &[Pixel], chars: &str) -> Self {
        let glyphs = chars
            .chars()
            .zip(pixels.chunks_exact(GLYPH_LEN))
            .filter_map(|(c, block)| Glyph::try_from(block).ok().map(|g| (c, g)))
            .collect();
        Self { glyphs }
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    pub fn contains(&self, c: char) -> bool {
        self.glyphs.contains_key(&c)
    }

    /// Glyph for `c`, falling back to '?' and then to a blank glyph
    pub fn glyph(&self, c: char) -> Glyph {
        self.glyphs
            .get(&c)
            .or_else(|| self.glyphs.get(&FALLBACK_CHAR))
            .copied()
            .unwrap_or(BLANK_GLYPH)
    }
}

fn is_blank(run: &[Pixel]) -> bool {
    run.iter().all(|p| p.sum() == 0)
}

/// Strip blank 8 pixel runs from the front and back of a glyph. Blank runs
/// between lit ones are kept, and an entirely blank glyph is returned as is.
pub fn trim_whitespace(glyph: &[Pixel]) -> &[Pixel] {
    if is_blank(glyph) {
        return glyph;
    }
    let runs: Vec<&[Pixel]> = glyph.chunks(MATRIX_SIZE).collect();
    let first = runs.iter().position(|r| !is_blank(r)).unwrap_or(0);
    let last = runs.iter().rposition(|r| !is_blank(r)).unwrap_or(runs.len() - 1);
    let end = ((last + 1) * MATRIX_SIZE).min(glyph.len());
    &glyph[first * MATRIX_SIZE..end]
}

fn recolour(pixel: &Pixel, fg: Pixel, bg: Pixel) -> Pixel {
    if *pixel == Pixel::WHITE {
        fg
    } else {
        bg
    }
}

fn window(strip: &[Pixel], start: usize) -> Frame {
    let mut frame = [Pixel::BLACK; FRAME_LEN];
    frame.copy_from_slice(&strip[start..start + FRAME_LEN]);
    frame
}

/// Every frame `show_message` displays, in order
pub fn message_frames(font: &Font, text: &str, fg: Pixel, bg: Pixel) -> Vec<Frame> {
    let mut strip = vec![Pixel::BLACK; FRAME_LEN];
    for c in text.chars() {
        let glyph = font.glyph(c);
        strip.extend_from_slice(trim_whitespace(&glyph));
        strip.extend_from_slice(&[Pixel::BLACK; MATRIX_SIZE]);
    }
    strip.extend_from_slice(&[Pixel::BLACK; FRAME_LEN]);

    let strip: Vec<Pixel> = strip.iter().map(|p| recolour(p, fg, bg)).collect();
    let steps = strip.len() / MATRIX_SIZE - MATRIX_SIZE;
    (0..steps).map(|i| window(&strip, i * MATRIX_SIZE)).collect()
}

/// The frame `show_letter` displays
pub fn letter_frame(font: &Font, c: char, fg: Pixel, bg: Pixel) -> Frame {
    let mut strip = [Pixel::BLACK; FRAME_LEN];
    strip[MATRIX_SIZE..MATRIX_SIZE + GLYPH_LEN].copy_from_slice(&font.glyph(c));
    strip.map(|p| recolour(&p, fg, bg))
}

impl<FB: FrameBufferInterface> LedMatrix<FB> {
    /// Scroll `text` from right to left, holding each frame for `speed`.
    /// The matrix rotation is left as it was, even on error.
    pub fn show_message<D: Delay>(
        &mut self,
        font: &Font,
        text: &str,
        speed: Duration,
        fg: Pixel,
        bg: Pixel,
        delay: &mut D,
    ) -> Result<()> {
        let frames = message_frames(font, text, fg, bg);
        trace!("show_message {:?}: {} frames", text, frames.len());
        let rotation = self.rotation().anticlockwise();
        self.with_rotation(rotation, |matrix| {
            for frame in &frames {
                matrix.set_frame(frame)?;
                delay.delay(speed);
            }
            Ok(())
        })
    }

    /// Show one character
    pub fn show_letter(&mut self, font: &Font, c: char, fg: Pixel, bg: Pixel) -> Result<()> {
        let frame = letter_frame(font, c, fg, bg);
        let rotation = self.rotation().anticlockwise();
        self.with_rotation(rotation, |matrix| matrix.set_frame(&frame))
    }
}
