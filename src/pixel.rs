// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

//! Pixels and the RGB565 codec used by the LED matrix framebuffer.
//!
//! The framebuffer stores 5 bits of red, 6 of green and 5 of blue per pixel,
//! so a pixel read back from the matrix is the written pixel with the low
//! 3/2/3 bits cleared.

use crate::{constants::FRAME_LEN, Error, Result};

/// One LED colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Full LED matrix state, row-major
pub type Frame = [Pixel; FRAME_LEN];

impl Pixel {
    pub const BLACK: Pixel = Pixel::new(0, 0, 0);
    pub const WHITE: Pixel = Pixel::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build a pixel from wider integers, rejecting channels outside 0..=255.
    /// `index` is only used to report which pixel of a frame was bad.
    pub fn try_from_channels(index: usize, channels: [i32; 3]) -> Result<Self> {
        let mut out = [0u8; 3];
        for (slot, value) in out.iter_mut().zip(channels) {
            *slot = u8::try_from(value).map_err(|_| Error::InvalidChannelValue { index, value })?;
        }
        Ok(Self::new(out[0], out[1], out[2]))
    }

    /// Encode as RGB565
    pub fn to_rgb565(self) -> u16 {
        pack_rgb565(self.r, self.g, self.b)
    }

    /// Decode from RGB565
    pub fn from_rgb565(word: u16) -> Self {
        let (r, g, b) = unpack_rgb565(word);
        Self::new(r, g, b)
    }

    /// The value this pixel reads back as after a trip through the framebuffer
    pub fn quantized(self) -> Self {
        Self::from_rgb565(self.to_rgb565())
    }

    /// Sum of all channels, zero only for black
    pub fn sum(self) -> u32 {
        self.r as u32 + self.g as u32 + self.b as u32
    }
}

impl From<(u8, u8, u8)> for Pixel {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self::new(r, g, b)
    }
}

impl From<[u8; 3]> for Pixel {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self::new(r, g, b)
    }
}

impl From<Pixel> for (u8, u8, u8) {
    fn from(p: Pixel) -> Self {
        (p.r, p.g, p.b)
    }
}

/// Pack 8-bit channels into RGB565
#[inline]
pub fn pack_rgb565(r: u8, g: u8, b: u8) -> u16 {
    let r = (r >> 3) as u16 & 0x1f;
    let g = (g >> 2) as u16 & 0x3f;
    let b = (b >> 3) as u16 & 0x1f;
    (r << 11) | (g << 5) | b
}

/// Unpack RGB565 into 8-bit channels, low bits zero
#[inline]
pub fn unpack_rgb565(word: u16) -> (u8, u8, u8) {
    let r = ((word & 0xf800) >> 11) as u8;
    let g = ((word & 0x07e0) >> 5) as u8;
    let b = (word & 0x001f) as u8;
    (r << 3, g << 2, b << 3)
}

/// Validate a caller supplied pixel list and turn it into a frame
pub fn frame_from_slice(pixels: &[Pixel]) -> Result<Frame> {
    Frame::try_from(pixels).map_err(|_| Error::InvalidFrameLength(pixels.len()))
}

/// Validate raw integer triples and turn them into a frame
pub fn frame_from_channels(pixels: &[[i32; 3]]) -> Result<Frame> {
    if pixels.len() != FRAME_LEN {
        return Err(Error::InvalidFrameLength(pixels.len()));
    }
    let mut frame = [Pixel::BLACK; FRAME_LEN];
    for (index, (slot, channels)) in frame.iter_mut().zip(pixels).enumerate() {
        *slot = Pixel::try_from_channels(index, *channels)?;
    }
    Ok(frame)
}
