// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

//! 8x8 LED matrix driver.
//!
//! Logical pixels are addressed row-major from the top left. Before touching
//! device memory the logical index goes through the permutation of the
//! current [`Rotation`], so callers can keep drawing upright when the board is
//! mounted sideways or upside down.

use std::{io, path::Path};

use log::{debug, trace};

use crate::{
    constants::{
        FRAME_LEN, GAMMA_LEN, GAMMA_LOW_LIGHT, GAMMA_MAX, MATRIX_SIZE,
        SENSE_HAT_FB_GAMMA_DEFAULT, SENSE_HAT_FB_GAMMA_LOW,
    },
    interface::FrameBufferInterface,
    pixel::{frame_from_channels, frame_from_slice, Frame, Pixel},
    Error, Result,
};

/// Map from logical (row, column) to physical pixel offset
pub type PixelMap = [[usize; MATRIX_SIZE]; MATRIX_SIZE];

/// LED matrix rotation, 0 is with the HDMI port facing downwards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

/// Rotate a pixel map a quarter turn counter-clockwise
const fn rot90(m: PixelMap) -> PixelMap {
    let mut out = [[0; MATRIX_SIZE]; MATRIX_SIZE];
    let mut i = 0;
    while i < MATRIX_SIZE {
        let mut j = 0;
        while j < MATRIX_SIZE {
            out[i][j] = m[j][MATRIX_SIZE - 1 - i];
            j += 1;
        }
        i += 1;
    }
    out
}

/// Row-major identity: logical index == physical offset
const fn base_map() -> PixelMap {
    let mut out = [[0; MATRIX_SIZE]; MATRIX_SIZE];
    let mut i = 0;
    while i < MATRIX_SIZE {
        let mut j = 0;
        while j < MATRIX_SIZE {
            out[i][j] = i * MATRIX_SIZE + j;
            j += 1;
        }
        i += 1;
    }
    out
}

const PIX_MAP_0: PixelMap = base_map();
const PIX_MAP_90: PixelMap = rot90(PIX_MAP_0);
const PIX_MAP_180: PixelMap = rot90(PIX_MAP_90);
const PIX_MAP_270: PixelMap = rot90(PIX_MAP_180);

impl Rotation {
    pub fn from_degrees(degrees: u16) -> Result<Self> {
        match degrees {
            0 => Ok(Rotation::Deg0),
            90 => Ok(Rotation::Deg90),
            180 => Ok(Rotation::Deg180),
            270 => Ok(Rotation::Deg270),
            _ => Err(Error::InvalidRotation(degrees)),
        }
    }

    pub fn degrees(self) -> u16 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// This rotation minus 90 degrees, 0 wraps to 270
    pub fn anticlockwise(self) -> Self {
        match self {
            Rotation::Deg0 => Rotation::Deg270,
            Rotation::Deg90 => Rotation::Deg0,
            Rotation::Deg180 => Rotation::Deg90,
            Rotation::Deg270 => Rotation::Deg180,
        }
    }

    pub fn pixel_map(self) -> &'static PixelMap {
        match self {
            Rotation::Deg0 => &PIX_MAP_0,
            Rotation::Deg90 => &PIX_MAP_90,
            Rotation::Deg180 => &PIX_MAP_180,
            Rotation::Deg270 => &PIX_MAP_270,
        }
    }

    /// Physical offset of logical `index` (row-major)
    #[inline]
    pub fn offset(self, index: usize) -> usize {
        self.pixel_map()[index / MATRIX_SIZE][index % MATRIX_SIZE]
    }
}

impl TryFrom<u16> for Rotation {
    type Error = Error;

    fn try_from(degrees: u16) -> Result<Self> {
        Rotation::from_degrees(degrees)
    }
}

fn check_coordinate(x: usize, y: usize) -> Result<()> {
    if x >= MATRIX_SIZE || y >= MATRIX_SIZE {
        return Err(Error::CoordinateOutOfRange { x, y });
    }
    Ok(())
}

fn short_read(wanted: usize, got: usize) -> Error {
    Error::Io(io::Error::new(
        io::ErrorKind::UnexpectedEof,
        format!("framebuffer returned {} of {} pixels", got, wanted),
    ))
}

/// The LED matrix behind a framebuffer interface
pub struct LedMatrix<FB> {
    fb: FB,
    rotation: Rotation,
}

impl<FB> LedMatrix<FB> {
    pub fn new(fb: FB) -> Self {
        Self {
            fb,
            rotation: Rotation::Deg0,
        }
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn interface(&self) -> &FB {
        &self.fb
    }

    /// Returns the framebuffer interface
    pub fn free(self) -> FB {
        self.fb
    }
}

impl<FB: FrameBufferInterface> LedMatrix<FB> {
    /// Set the rotation in degrees (0, 90, 180 or 270).
    ///
    /// Rotation only changes how future reads and writes are addressed. With
    /// `redraw` the current image is read under the old rotation and written
    /// back under the new one so it turns with the setting.
    pub fn set_rotation(&mut self, degrees: u16, redraw: bool) -> Result<()> {
        let rotation = Rotation::from_degrees(degrees)?;
        if redraw {
            let frame = self.get_frame()?;
            self.rotation = rotation;
            self.write_frame(&frame)?;
        } else {
            self.rotation = rotation;
        }
        debug!("rotation set to {}", degrees);
        Ok(())
    }

    /// Run `f` with the matrix addressed under `rotation`, restoring the
    /// previous rotation afterwards whether or not `f` succeeds
    pub(crate) fn with_rotation<T>(
        &mut self,
        rotation: Rotation,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let previous = self.rotation;
        self.rotation = rotation;
        let result = f(self);
        self.rotation = previous;
        result
    }

    fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        let rotation = self.rotation;
        let words: Vec<(usize, u16)> = frame
            .iter()
            .enumerate()
            .map(|(index, pixel)| (rotation.offset(index), pixel.to_rgb565()))
            .collect();
        self.fb.write_words(&words)?;
        Ok(())
    }

    /// Update the whole matrix from 64 pixels, row-major
    pub fn set_frame(&mut self, pixels: &[Pixel]) -> Result<()> {
        let frame = frame_from_slice(pixels)?;
        self.write_frame(&frame)
    }

    /// Update the whole matrix from 64 integer triples, each channel 0..=255
    pub fn set_frame_channels(&mut self, pixels: &[[i32; 3]]) -> Result<()> {
        let frame = frame_from_channels(pixels)?;
        self.write_frame(&frame)
    }

    /// Read the whole matrix.
    ///
    /// Values come back quantized to RGB565, so they can differ from what
    /// was written by up to 7 (red, blue) or 3 (green).
    pub fn get_frame(&mut self) -> Result<Frame> {
        let rotation = self.rotation;
        let offsets: Vec<usize> = (0..FRAME_LEN).map(|i| rotation.offset(i)).collect();
        let words = self.fb.read_words(&offsets)?;
        if words.len() < FRAME_LEN {
            return Err(short_read(FRAME_LEN, words.len()));
        }
        let mut frame = [Pixel::BLACK; FRAME_LEN];
        for (slot, word) in frame.iter_mut().zip(words) {
            *slot = Pixel::from_rgb565(word);
        }
        Ok(frame)
    }

    /// Set one pixel; top left is (0, 0), bottom right (7, 7)
    pub fn set_pixel(&mut self, x: usize, y: usize, pixel: Pixel) -> Result<()> {
        check_coordinate(x, y)?;
        let offset = self.rotation.pixel_map()[y][x];
        trace!("set_pixel ({}, {}) -> offset {}", x, y, offset);
        self.fb.write_words(&[(offset, pixel.to_rgb565())])?;
        Ok(())
    }

    /// Read one pixel; top left is (0, 0), bottom right (7, 7)
    pub fn get_pixel(&mut self, x: usize, y: usize) -> Result<Pixel> {
        check_coordinate(x, y)?;
        let offset = self.rotation.pixel_map()[y][x];
        let words = self.fb.read_words(&[offset])?;
        let word = words.first().copied().ok_or_else(|| short_read(1, 0))?;
        Ok(Pixel::from_rgb565(word))
    }

    /// Mirror the image left to right
    pub fn flip_h(&mut self, redraw: bool) -> Result<Frame> {
        let mut frame = self.get_frame()?;
        for row in frame.chunks_mut(MATRIX_SIZE) {
            row.reverse();
        }
        if redraw {
            self.write_frame(&frame)?;
        }
        Ok(frame)
    }

    /// Mirror the image top to bottom
    pub fn flip_v(&mut self, redraw: bool) -> Result<Frame> {
        let current = self.get_frame()?;
        let mut frame = [Pixel::BLACK; FRAME_LEN];
        for (dst, src) in frame
            .chunks_mut(MATRIX_SIZE)
            .zip(current.chunks(MATRIX_SIZE).rev())
        {
            dst.copy_from_slice(src);
        }
        if redraw {
            self.write_frame(&frame)?;
        }
        Ok(frame)
    }

    /// Fill the matrix with one colour
    pub fn clear(&mut self, colour: Pixel) -> Result<()> {
        self.write_frame(&[colour; FRAME_LEN])
    }

    /// Load an 8x8 image file and optionally show it
    pub fn load_image<P: AsRef<Path>>(&mut self, path: P, redraw: bool) -> Result<Frame> {
        let img = image::open(path.as_ref())?.to_rgb8();
        let (width, height) = img.dimensions();
        let pixels: Vec<Pixel> = img.pixels().map(|p| Pixel::from(p.0)).collect();
        if width as usize != MATRIX_SIZE || height as usize != MATRIX_SIZE {
            return Err(Error::InvalidFrameLength(pixels.len()));
        }
        let frame = frame_from_slice(&pixels)?;
        if redraw {
            self.write_frame(&frame)?;
        }
        Ok(frame)
    }

    /// Current gamma table
    pub fn gamma(&mut self) -> Result<[u8; GAMMA_LEN]> {
        Ok(self.fb.gamma()?)
    }

    /// Load a 32 entry gamma table, each entry 0..=31
    pub fn set_gamma(&mut self, table: &[u8]) -> Result<()> {
        let table: [u8; GAMMA_LEN] = table
            .try_into()
            .map_err(|_| Error::InvalidGammaLength(table.len()))?;
        if let Some((index, &value)) = table.iter().enumerate().find(|&(_, &v)| v > GAMMA_MAX) {
            return Err(Error::InvalidGammaValue { index, value });
        }
        self.fb.set_gamma(&table)?;
        Ok(())
    }

    /// Restore the default gamma table
    pub fn reset_gamma(&mut self) -> Result<()> {
        self.fb.reset_gamma(SENSE_HAT_FB_GAMMA_DEFAULT)?;
        Ok(())
    }

    /// Whether the low light gamma table is loaded
    pub fn low_light(&mut self) -> Result<bool> {
        Ok(self.gamma()? == GAMMA_LOW_LIGHT)
    }

    /// Switch between the low light and default gamma tables
    pub fn set_low_light(&mut self, enabled: bool) -> Result<()> {
        let preset = if enabled {
            SENSE_HAT_FB_GAMMA_LOW
        } else {
            SENSE_HAT_FB_GAMMA_DEFAULT
        };
        self.fb.reset_gamma(preset)?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Framebuffer memory held in a plain array
    #[derive(Default)]
    pub(crate) struct MemFb {
        pub mem: Vec<u16>,
        pub gamma: [u8; GAMMA_LEN],
        pub sessions: usize,
        /// Reads return at most this many words
        pub read_limit: Option<usize>,
    }

    impl MemFb {
        pub fn new() -> Self {
            Self {
                mem: vec![0; FRAME_LEN],
                gamma: [0; GAMMA_LEN],
                sessions: 0,
                read_limit: None,
            }
        }
    }

    impl FrameBufferInterface for MemFb {
        fn write_words(&mut self, words: &[(usize, u16)]) -> io::Result<()> {
            self.sessions += 1;
            for &(offset, word) in words {
                self.mem[offset] = word;
            }
            Ok(())
        }

        fn read_words(&mut self, offsets: &[usize]) -> io::Result<Vec<u16>> {
            self.sessions += 1;
            let limit = self.read_limit.unwrap_or(offsets.len());
            Ok(offsets.iter().take(limit).map(|&o| self.mem[o]).collect())
        }

        fn gamma(&mut self) -> io::Result<[u8; GAMMA_LEN]> {
            Ok(self.gamma)
        }

        fn set_gamma(&mut self, table: &[u8; GAMMA_LEN]) -> io::Result<()> {
            self.gamma = *table;
            Ok(())
        }

        fn reset_gamma(&mut self, preset: u32) -> io::Result<()> {
            self.gamma = if preset == SENSE_HAT_FB_GAMMA_LOW {
                GAMMA_LOW_LIGHT
            } else {
                std::array::from_fn(|i| (i as u8).min(GAMMA_MAX))
            };
            Ok(())
        }
    }

    pub(crate) fn test_frame() -> Frame {
        std::array::from_fn(|i| Pixel::new((i * 4) as u8, (255 - i * 3) as u8, (i * 7 % 256) as u8))
    }

    fn quantized(frame: &Frame) -> Frame {
        frame.map(Pixel::quantized)
    }

    #[test]
    fn test_pixel_maps() {
        assert_eq!(PIX_MAP_0[0], [0, 1, 2, 3, 4, 5, 6, 7]);
        // A quarter turn counter-clockwise brings the last column to the top
        assert_eq!(PIX_MAP_90[0], [7, 15, 23, 31, 39, 47, 55, 63]);
        assert_eq!(PIX_MAP_180[0], [63, 62, 61, 60, 59, 58, 57, 56]);
        assert_eq!(PIX_MAP_270[0], [56, 48, 40, 32, 24, 16, 8, 0]);
        assert_eq!(rot90(PIX_MAP_270), PIX_MAP_0);
    }

    #[test]
    fn test_pixel_maps_are_permutations() {
        for rotation in [
            Rotation::Deg0,
            Rotation::Deg90,
            Rotation::Deg180,
            Rotation::Deg270,
        ] {
            let mut seen = [false; FRAME_LEN];
            for i in 0..FRAME_LEN {
                seen[rotation.offset(i)] = true;
            }
            assert!(seen.iter().all(|&s| s), "{:?} is not a permutation", rotation);
        }
    }

    #[test]
    fn test_rotation_degrees() {
        for deg in [0, 90, 180, 270] {
            assert_eq!(Rotation::from_degrees(deg).unwrap().degrees(), deg);
        }
        assert!(matches!(Rotation::try_from(45), Err(Error::InvalidRotation(45))));
        assert_eq!(Rotation::Deg0.anticlockwise(), Rotation::Deg270);
        assert_eq!(Rotation::Deg90.anticlockwise(), Rotation::Deg0);
    }

    #[test]
    fn test_set_get_frame_quantized() {
        let mut matrix = LedMatrix::new(MemFb::new());
        let frame = test_frame();
        matrix.set_frame(&frame).unwrap();
        assert_eq!(matrix.get_frame().unwrap(), quantized(&frame));
    }

    #[test]
    fn test_set_frame_is_one_session() {
        let mut matrix = LedMatrix::new(MemFb::new());
        matrix.set_frame(&test_frame()).unwrap();
        assert_eq!(matrix.interface().sessions, 1);
    }

    #[test]
    fn test_set_frame_validation_precedes_io() {
        let mut matrix = LedMatrix::new(MemFb::new());
        assert!(matches!(
            matrix.set_frame(&[Pixel::WHITE; 10]),
            Err(Error::InvalidFrameLength(10))
        ));
        let mut raw = [[0, 0, 0]; 64];
        raw[3] = [0, 999, 0];
        assert!(matches!(
            matrix.set_frame_channels(&raw),
            Err(Error::InvalidChannelValue { index: 3, value: 999 })
        ));
        assert_eq!(matrix.interface().sessions, 0);
    }

    #[test]
    fn test_set_pixel_addresses_rotated_offset() {
        let mut matrix = LedMatrix::new(MemFb::new());
        matrix.set_rotation(90, false).unwrap();
        matrix.set_pixel(0, 0, Pixel::WHITE).unwrap();
        assert_eq!(matrix.interface().mem[7], 0xffff);
        assert_eq!(matrix.get_pixel(0, 0).unwrap(), Pixel::WHITE.quantized());
    }

    #[test]
    fn test_coordinates_out_of_range() {
        let mut matrix = LedMatrix::new(MemFb::new());
        assert!(matches!(
            matrix.set_pixel(8, 0, Pixel::WHITE),
            Err(Error::CoordinateOutOfRange { x: 8, y: 0 })
        ));
        assert!(matches!(
            matrix.get_pixel(0, 8),
            Err(Error::CoordinateOutOfRange { x: 0, y: 8 })
        ));
    }

    #[test]
    fn test_short_read_is_an_error() {
        let mut fb = MemFb::new();
        fb.read_limit = Some(10);
        let mut matrix = LedMatrix::new(fb);
        match matrix.get_frame() {
            Err(Error::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof),
            other => panic!("expected short read error, got {:?}", other),
        }

        let mut fb = matrix.free();
        fb.read_limit = Some(0);
        let mut matrix = LedMatrix::new(fb);
        match matrix.get_pixel(3, 3) {
            Err(Error::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof),
            other => panic!("expected short read error, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_rotation_leaves_rotation_unchanged() {
        let mut matrix = LedMatrix::new(MemFb::new());
        matrix.set_rotation(180, false).unwrap();
        assert!(matches!(
            matrix.set_rotation(100, true),
            Err(Error::InvalidRotation(100))
        ));
        assert_eq!(matrix.rotation(), Rotation::Deg180);
    }

    #[test]
    fn test_rotation_without_redraw_does_not_move_data() {
        let mut matrix = LedMatrix::new(MemFb::new());
        matrix.set_frame(&test_frame()).unwrap();
        let before = matrix.interface().mem.clone();
        matrix.set_rotation(90, false).unwrap();
        assert_eq!(matrix.interface().mem, before);
    }

    #[test]
    fn test_full_rotation_cycle_restores_content() {
        let mut matrix = LedMatrix::new(MemFb::new());
        let frame = test_frame();
        matrix.set_frame(&frame).unwrap();
        let physical = matrix.interface().mem.clone();
        for deg in [90, 180, 270, 0] {
            matrix.set_rotation(deg, true).unwrap();
            // Logical content follows the rotation
            assert_eq!(matrix.get_frame().unwrap(), quantized(&frame));
        }
        assert_eq!(matrix.interface().mem, physical);
    }

    #[test]
    fn test_redraw_rotates_physical_image() {
        let mut matrix = LedMatrix::new(MemFb::new());
        matrix.set_pixel(0, 0, Pixel::WHITE).unwrap();
        matrix.set_rotation(180, true).unwrap();
        // The lit pixel stays at logical (0, 0), physically the far corner
        assert_eq!(matrix.interface().mem[63], 0xffff);
        assert_eq!(matrix.interface().mem[0], 0);
    }

    #[test]
    fn test_flip_h() {
        let mut matrix = LedMatrix::new(MemFb::new());
        let frame = test_frame();
        matrix.set_frame(&frame).unwrap();
        let flipped = matrix.flip_h(true).unwrap();
        for row in 0..8 {
            for col in 0..8 {
                assert_eq!(flipped[row * 8 + col], frame[row * 8 + 7 - col].quantized());
            }
        }
        assert_eq!(matrix.get_frame().unwrap(), flipped);
    }

    #[test]
    fn test_flip_v_without_redraw() {
        let mut matrix = LedMatrix::new(MemFb::new());
        let frame = test_frame();
        matrix.set_frame(&frame).unwrap();
        let flipped = matrix.flip_v(false).unwrap();
        for row in 0..8 {
            for col in 0..8 {
                assert_eq!(flipped[row * 8 + col], frame[(7 - row) * 8 + col].quantized());
            }
        }
        assert_eq!(matrix.get_frame().unwrap(), quantized(&frame));
    }

    #[test]
    fn test_clear() {
        let mut matrix = LedMatrix::new(MemFb::new());
        matrix.clear(Pixel::new(255, 0, 0)).unwrap();
        assert!(matrix.interface().mem.iter().all(|&w| w == 0xf800));
    }

    #[test]
    fn test_with_rotation_restores_on_error() {
        let mut matrix = LedMatrix::new(MemFb::new());
        matrix.set_rotation(90, false).unwrap();
        let res: Result<()> = matrix.with_rotation(Rotation::Deg0, |m| {
            assert_eq!(m.rotation(), Rotation::Deg0);
            Err(Error::InvalidFrameLength(0))
        });
        assert!(res.is_err());
        assert_eq!(matrix.rotation(), Rotation::Deg90);
    }

    #[test]
    fn test_gamma_validation() {
        let mut matrix = LedMatrix::new(MemFb::new());
        assert!(matches!(
            matrix.set_gamma(&[0; 31]),
            Err(Error::InvalidGammaLength(31))
        ));
        let mut table = [0u8; 32];
        table[4] = 32;
        assert!(matches!(
            matrix.set_gamma(&table),
            Err(Error::InvalidGammaValue { index: 4, value: 32 })
        ));
        table[4] = 31;
        matrix.set_gamma(&table).unwrap();
        assert_eq!(matrix.gamma().unwrap(), table);
    }

    #[test]
    fn test_low_light() {
        let mut matrix = LedMatrix::new(MemFb::new());
        matrix.set_low_light(true).unwrap();
        assert!(matrix.low_light().unwrap());
        matrix.set_low_light(false).unwrap();
        assert!(!matrix.low_light().unwrap());
        matrix.set_gamma(&GAMMA_LOW_LIGHT).unwrap();
        assert!(matrix.low_light().unwrap());
        matrix.reset_gamma().unwrap();
        assert!(!matrix.low_light().unwrap());
    }

    #[test]
    fn test_load_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("img.png");
        let img = image::RgbImage::from_fn(8, 8, |x, y| image::Rgb([(x * 32) as u8, (y * 32) as u8, 0]));
        img.save(&path).unwrap();

        let mut matrix = LedMatrix::new(MemFb::new());
        let frame = matrix.load_image(&path, true).unwrap();
        assert_eq!(frame[8 * 2 + 3], Pixel::new(96, 64, 0));
        assert_eq!(matrix.get_frame().unwrap(), quantized(&frame));

        let wide = dir.path().join("wide.png");
        image::RgbImage::new(16, 8).save(&wide).unwrap();
        assert!(matches!(
            matrix.load_image(&wide, false),
            Err(Error::InvalidFrameLength(128))
        ));
    }
}
