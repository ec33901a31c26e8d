//! Packed black/white bitmap.
//!
//! Pixels are stored one bit each in 64-bit words, leftmost pixel in the
//! most significant bit. Every scanline starts on a fresh word, so a row
//! occupies `dy` words and the tail bits of its last word are padding.
//! Row 0 is the bottom of the picture (y-up).

use std::path::Path;

use image::{GrayImage, ImageReader};
use imageproc::contrast::otsu_level;

use crate::config::ThresholdMethod;
use crate::error::TraceError;

pub(crate) type Word = u64;

pub(crate) const WORD_BITS: i32 = 64;
const ALL_BITS: Word = !0;
const HI_BIT: Word = 1 << (WORD_BITS - 1);

/// Largest width or height. Lattice arithmetic reaches up to a word
/// past the bitmap edge and must stay within `i32`.
pub(crate) const MAX_SIDE: usize = (i32::MAX - WORD_BITS) as usize;

/// A black/white pixel grid, `true` = black.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: i32,
    height: i32,
    /// Words per scanline.
    dy: usize,
    words: Vec<Word>,
}

impl Bitmap {
    /// Create an all-white bitmap.
    ///
    /// Fails with [`TraceError::BitmapTooLarge`] when the word buffer
    /// cannot be sized or allocated, or when a side exceeds
    /// `i32::MAX - 64` pixels.
    pub fn new(width: usize, height: usize) -> Result<Self, TraceError> {
        let too_large = || TraceError::BitmapTooLarge { width, height };
        if width > MAX_SIDE || height > MAX_SIDE {
            return Err(too_large());
        }
        let dy = if width == 0 { 0 } else { (width - 1) / WORD_BITS as usize + 1 };
        let len = dy.checked_mul(height).ok_or_else(too_large)?;

        let mut words = Vec::new();
        words.try_reserve_exact(len).map_err(|_| too_large())?;
        words.resize(len, 0);

        Ok(Bitmap { width: width as i32, height: height as i32, dy, words })
    }

    /// Build a bitmap from a predicate over `(x, y)`, y-up.
    pub fn from_fn<F>(width: usize, height: usize, mut black: F) -> Result<Self, TraceError>
    where
        F: FnMut(usize, usize) -> bool,
    {
        let mut bm = Bitmap::new(width, height)?;
        for y in 0..height {
            for x in 0..width {
                if black(x, y) {
                    bm.set_unchecked(x as i32, y as i32);
                }
            }
        }
        Ok(bm)
    }

    /// Wrap a caller-supplied word buffer laid out as described in the
    /// module docs: `dy` words per row, bottom row first. Padding bits
    /// are cleared.
    pub fn from_raw(width: usize, height: usize, words: Vec<Word>) -> Result<Self, TraceError> {
        let mut bm = Bitmap::new(width, 0)?;
        if height > MAX_SIDE {
            return Err(TraceError::BitmapTooLarge { width, height });
        }
        let expected = bm.dy.checked_mul(height).ok_or(TraceError::BitmapTooLarge { width, height })?;
        if words.len() != expected {
            return Err(TraceError::BufferLength { expected, actual: words.len() });
        }
        bm.height = height as i32;
        bm.words = words;
        bm.clear_excess_padding();
        Ok(bm)
    }

    /// Threshold a grayscale image: luma strictly below `threshold` is
    /// black. The top image row becomes bitmap row `height - 1`.
    pub fn from_gray(img: &GrayImage, threshold: u8) -> Result<Self, TraceError> {
        let (w, h) = img.dimensions();
        let (w, h) = (w as usize, h as usize);
        Bitmap::from_fn(w, h, |x, y| img.get_pixel(x as u32, (h - 1 - y) as u32).0[0] < threshold)
    }

    /// Load an image file and threshold it. Returns the bitmap and the
    /// luma level below which pixels became black.
    pub fn open(path: &Path, method: ThresholdMethod) -> Result<(Self, u8), TraceError> {
        let img = ImageReader::open(path)
            .map_err(|e| TraceError::ImageLoad(e.to_string()))?
            .decode()
            .map_err(|e| TraceError::ImageLoad(e.to_string()))?
            .into_luma8();
        let threshold = threshold_for(&img, method);
        Ok((Bitmap::from_gray(&img, threshold)?, threshold))
    }

    pub fn width(&self) -> usize {
        self.width as usize
    }

    pub fn height(&self) -> usize {
        self.height as usize
    }

    /// Words per scanline.
    pub fn dy(&self) -> usize {
        self.dy
    }

    /// The backing words, bottom row first.
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub(crate) fn height_i32(&self) -> i32 {
        self.height
    }

    // ── Pixel access ─────────────────────────────────────

    #[inline]
    fn in_range(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width && y >= 0 && y < self.height
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> usize {
        y as usize * self.dy + (x / WORD_BITS) as usize
    }

    #[inline]
    fn mask(x: i32) -> Word {
        HI_BIT >> (x & (WORD_BITS - 1))
    }

    /// Read a pixel. Out-of-range coordinates read as white.
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> bool {
        self.in_range(x, y) && self.get_unchecked(x, y)
    }

    /// Blacken a pixel. Out-of-range coordinates are ignored.
    pub fn set(&mut self, x: i32, y: i32) {
        if self.in_range(x, y) {
            self.set_unchecked(x, y);
        }
    }

    /// Whiten a pixel. Out-of-range coordinates are ignored.
    pub fn clear(&mut self, x: i32, y: i32) {
        if self.in_range(x, y) {
            self.clear_unchecked(x, y);
        }
    }

    /// Flip a pixel. Out-of-range coordinates are ignored.
    pub fn toggle(&mut self, x: i32, y: i32) {
        if self.in_range(x, y) {
            self.toggle_unchecked(x, y);
        }
    }

    /// Set a pixel to the given color. Out-of-range coordinates are ignored.
    pub fn put(&mut self, x: i32, y: i32, black: bool) {
        if black {
            self.set(x, y);
        } else {
            self.clear(x, y);
        }
    }

    // The unchecked variants skip the range test. The caller guarantees
    // `0 <= x < width` and `0 <= y < height`; a violation is caught by
    // the debug assertion or the slice bounds check, or lands in padding.

    #[inline]
    pub fn get_unchecked(&self, x: i32, y: i32) -> bool {
        debug_assert!(self.in_range(x, y));
        self.words[self.index(x, y)] & Self::mask(x) != 0
    }

    #[inline]
    pub fn set_unchecked(&mut self, x: i32, y: i32) {
        debug_assert!(self.in_range(x, y));
        let i = self.index(x, y);
        self.words[i] |= Self::mask(x);
    }

    #[inline]
    pub fn clear_unchecked(&mut self, x: i32, y: i32) {
        debug_assert!(self.in_range(x, y));
        let i = self.index(x, y);
        self.words[i] &= !Self::mask(x);
    }

    #[inline]
    pub fn toggle_unchecked(&mut self, x: i32, y: i32) {
        debug_assert!(self.in_range(x, y));
        let i = self.index(x, y);
        self.words[i] ^= Self::mask(x);
    }

    // ── Whole-bitmap operations ──────────────────────────

    /// An independent copy with its own buffer.
    pub fn duplicate(&self) -> Bitmap {
        self.clone()
    }

    /// Zero the unused tail bits of the last word of every scanline.
    pub fn clear_excess_padding(&mut self) {
        let tail = self.width % WORD_BITS;
        if tail == 0 || self.dy == 0 {
            return;
        }
        let mask = ALL_BITS << (WORD_BITS - tail);
        for row in self.words.chunks_exact_mut(self.dy) {
            if let Some(last) = row.last_mut() {
                *last &= mask;
            }
        }
    }

    /// Make every pixel white.
    pub fn clear_all(&mut self) {
        self.words.fill(0);
    }

    /// Number of black pixels.
    pub fn count_black(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    // ── Tracer support ───────────────────────────────────

    /// Invert row `y` between column `x` and the word boundary `xa`.
    ///
    /// Whole words between `x` rounded down to a word boundary and `xa`
    /// are flipped, then the leading `x mod 64` bits of the word holding
    /// `x` are flipped, so that pixels `[min(x, xa), max(x, xa))` end up
    /// inverted. `xa` must be a multiple of the word size.
    pub(crate) fn xor_to_ref(&mut self, x: i32, y: i32, xa: i32) {
        let xhi = x & -WORD_BITS;
        let xlo = x & (WORD_BITS - 1);
        let row = y as usize * self.dy;

        let (lo, hi) = if xhi < xa { (xhi, xa) } else { (xa, xhi) };
        for i in (lo / WORD_BITS)..(hi / WORD_BITS) {
            self.words[row + i as usize] ^= ALL_BITS;
        }
        if xlo != 0 {
            self.words[row + (xhi / WORD_BITS) as usize] ^= ALL_BITS << (WORD_BITS - xlo);
        }
    }

    /// Whiten the words covering columns `[x0, x1)` of rows `[y0, y1)`.
    pub(crate) fn clear_bbox(&mut self, x0: i32, x1: i32, y0: i32, y1: i32) {
        let imin = (x0.max(0) / WORD_BITS) as usize;
        let imax = (((x1 + WORD_BITS - 1) / WORD_BITS).max(0) as usize).min(self.dy);
        if imin >= imax {
            return;
        }
        for y in y0.max(0)..y1.min(self.height) {
            let row = y as usize * self.dy;
            self.words[row + imin..row + imax].fill(0);
        }
    }

    /// Find the next black pixel at or after `(x, y)` in reading order:
    /// rows from `y` downward, left to right within a row.
    ///
    /// The search in the first row starts at the word containing `x`;
    /// callers rely on everything before it having been erased already.
    pub(crate) fn find_next(&self, x: i32, y: i32) -> Option<(i32, i32)> {
        if self.dy == 0 {
            return None;
        }
        let mut first = (x.max(0) / WORD_BITS) as usize;
        for y in (0..=y.min(self.height - 1)).rev() {
            let row = y as usize * self.dy;
            for i in first..self.dy {
                let word = self.words[row + i];
                if word != 0 {
                    let x = i as i32 * WORD_BITS + word.leading_zeros() as i32;
                    return Some((x, y));
                }
            }
            first = 0;
        }
        None
    }
}

/// Exclusive luma threshold for `method` on `img`.
pub(crate) fn threshold_for(img: &GrayImage, method: ThresholdMethod) -> u8 {
    match method {
        ThresholdMethod::Fixed(t) => t,
        ThresholdMethod::Otsu => otsu_level(img).saturating_add(1),
    }
}
