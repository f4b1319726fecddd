//! Bit-packed 2D boolean mask.
//!
//! One bit per pixel in row-major order, packed LSB-first into `u64` words.

use std::ops::Index;

use crate::buffer2::Buffer2;

const BITS_PER_WORD: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitBuffer2 {
    words: Vec<u64>,
    width: usize,
    height: usize,
    len: usize,
}

impl BitBuffer2 {
    #[inline]
    pub fn new_filled(width: usize, height: usize, value: bool) -> Self {
        let len = width * height;
        let mut buffer = Self {
            words: vec![0; len.div_ceil(BITS_PER_WORD)],
            width,
            height,
            len,
        };
        buffer.fill(value);
        buffer
    }

    #[inline]
    pub fn new_default(width: usize, height: usize) -> Self {
        Self::new_filled(width, height, false)
    }

    /// The slice length must equal `width * height`.
    pub fn from_slice(width: usize, height: usize, data: &[bool]) -> Self {
        assert_eq!(
            data.len(),
            width * height,
            "data length {} does not match dimensions {}x{}",
            data.len(),
            width,
            height
        );
        let mut buffer = Self::new_default(width, height);
        for (idx, _) in data.iter().enumerate().filter(|(_, v)| **v) {
            buffer.set(idx, true);
        }
        buffer
    }

    /// Builds a mask by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> bool) -> Self {
        let mut buffer = Self::new_default(width, height);
        for y in 0..height {
            for x in 0..width {
                if f(x, y) {
                    buffer.set(y * width + x, true);
                }
            }
        }
        buffer
    }

    /// Foreground wherever `predicate` holds for the source pixel.
    pub fn from_buffer<T>(source: &Buffer2<T>, mut predicate: impl FnMut(&T) -> bool) -> Self {
        let mut buffer = Self::new_default(source.width(), source.height());
        for (idx, value) in source.iter().enumerate() {
            if predicate(value) {
                buffer.set(idx, true);
            }
        }
        buffer
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn get(&self, idx: usize) -> bool {
        debug_assert!(idx < self.len);
        (self.words[idx / BITS_PER_WORD] >> (idx % BITS_PER_WORD)) & 1 != 0
    }

    #[inline]
    pub fn set(&mut self, idx: usize, value: bool) {
        debug_assert!(idx < self.len);
        let bit = 1u64 << (idx % BITS_PER_WORD);
        if value {
            self.words[idx / BITS_PER_WORD] |= bit;
        } else {
            self.words[idx / BITS_PER_WORD] &= !bit;
        }
    }

    #[inline]
    pub fn get_xy(&self, x: usize, y: usize) -> bool {
        debug_assert!(x < self.width && y < self.height);
        self.get(y * self.width + x)
    }

    #[inline]
    pub fn set_xy(&mut self, x: usize, y: usize, value: bool) {
        debug_assert!(x < self.width && y < self.height);
        self.set(y * self.width + x, value);
    }

    /// Signed lookup; everything outside the grid reads as background.
    #[inline]
    pub fn get_or_false(&self, x: i64, y: i64) -> bool {
        x >= 0
            && y >= 0
            && (x as usize) < self.width
            && (y as usize) < self.height
            && self.get_xy(x as usize, y as usize)
    }

    pub fn fill(&mut self, value: bool) {
        let fill = if value { !0u64 } else { 0u64 };
        self.words.fill(fill);
        self.clear_tail();
    }

    #[inline]
    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// In-place intersection with `other`.
    pub fn and_assign(&mut self, other: &Self) {
        self.assert_same_shape(other);
        for (a, b) in self.words.iter_mut().zip(&other.words) {
            *a &= *b;
        }
    }

    /// In-place difference: clears every bit set in `other`.
    pub fn and_not_assign(&mut self, other: &Self) {
        self.assert_same_shape(other);
        for (a, b) in self.words.iter_mut().zip(&other.words) {
            *a &= !*b;
        }
    }

    /// Complement within the image bounds.
    pub fn not(&self) -> Self {
        let mut out = Self {
            words: self.words.iter().map(|w| !w).collect(),
            width: self.width,
            height: self.height,
            len: self.len,
        };
        out.clear_tail();
        out
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len).map(move |idx| self.get(idx))
    }

    /// `(x, y)` of every set pixel in row-major order.
    pub fn iter_ones(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.len)
            .filter(move |&idx| self.get(idx))
            .map(move |idx| (idx % self.width, idx / self.width))
    }

    fn clear_tail(&mut self) {
        let used = self.len % BITS_PER_WORD;
        if used != 0
            && let Some(last) = self.words.last_mut()
        {
            *last &= (1u64 << used) - 1;
        }
    }

    fn assert_same_shape(&self, other: &Self) {
        assert_eq!(self.width, other.width, "width mismatch");
        assert_eq!(self.height, other.height, "height mismatch");
    }
}

impl Index<(usize, usize)> for BitBuffer2 {
    type Output = bool;

    #[inline]
    fn index(&self, (x, y): (usize, usize)) -> &Self::Output {
        if self.get_xy(x, y) { &true } else { &false }
    }
}

impl From<&BitBuffer2> for Buffer2<bool> {
    fn from(mask: &BitBuffer2) -> Self {
        Buffer2::new(mask.width(), mask.height(), mask.iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_slice_round_trips() {
        let data = [true, false, false, true, true, false];
        let mask = BitBuffer2::from_slice(3, 2, &data);
        assert_eq!(mask.iter().collect::<Vec<_>>(), data);
        assert_eq!(mask.count_ones(), 3);
    }

    #[test]
    fn test_fill_true_does_not_count_padding_bits() {
        let mask = BitBuffer2::new_filled(5, 3, true);
        assert_eq!(mask.count_ones(), 15);
        assert_eq!(mask.not().count_ones(), 0);
    }

    #[test]
    fn test_get_or_false_outside_is_background() {
        let mask = BitBuffer2::new_filled(2, 2, true);
        assert!(mask.get_or_false(1, 1));
        assert!(!mask.get_or_false(-1, 0));
        assert!(!mask.get_or_false(0, 2));
    }

    #[test]
    fn test_and_and_not() {
        let a = BitBuffer2::from_slice(2, 2, &[true, true, false, true]);
        let b = BitBuffer2::from_slice(2, 2, &[true, false, true, true]);

        let mut and = a.clone();
        and.and_assign(&b);
        assert_eq!(and.iter().collect::<Vec<_>>(), [true, false, false, true]);

        let mut diff = a.clone();
        diff.and_not_assign(&b);
        assert_eq!(diff.iter().collect::<Vec<_>>(), [false, true, false, false]);
    }

    #[test]
    fn test_iter_ones_row_major() {
        let mask = BitBuffer2::from_fn(3, 3, |x, y| x == y || (x == 2 && y == 0));
        let ones: Vec<_> = mask.iter_ones().collect();
        assert_eq!(ones, vec![(0, 0), (2, 0), (1, 1), (2, 2)]);
    }

    #[test]
    fn test_from_buffer_predicate() {
        let image = Buffer2::new(2, 2, vec![0.1f32, 0.5, 0.9, 2.0]);
        let mask = BitBuffer2::from_buffer(&image, |&v| v < 0.6);
        assert_eq!(mask.iter().collect::<Vec<_>>(), [true, true, false, false]);
    }

    #[test]
    fn test_large_mask_spanning_words() {
        let mut mask = BitBuffer2::new_default(100, 3);
        mask.set_xy(99, 2, true);
        mask.set_xy(63, 0, true);
        mask.set_xy(64, 0, true);
        assert_eq!(mask.count_ones(), 3);
        assert!(mask[(99, 2)]);
        mask.set_xy(63, 0, false);
        assert_eq!(mask.count_ones(), 2);
    }
}
