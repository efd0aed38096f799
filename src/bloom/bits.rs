//! Fixed-length packed bit vector (LSB-first inside each byte).
//!
//! Not synchronized: the filter owns it behind its mutex.
//! Bits are only ever set, never cleared.

#[derive(Debug, Clone)]
pub struct BitVector {
    bytes: Box<[u8]>,
    len: u64,
}

impl BitVector {
    /// `len` bits, all zero.
    pub fn new(len: u64) -> Self {
        let nbytes = ((len + 7) / 8) as usize;
        Self {
            bytes: vec![0u8; nbytes].into_boxed_slice(),
            len,
        }
    }

    /// Length in bits (m).
    #[inline]
    pub fn len(&self) -> u64 {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Backing storage size.
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn set(&mut self, bit: u64) {
        debug_assert!(bit < self.len, "bit {} out of range 0..{}", bit, self.len);
        let byte = (bit / 8) as usize;
        let mask = 1u8 << (bit % 8);
        self.bytes[byte] |= mask;
    }

    #[inline]
    pub fn get(&self, bit: u64) -> bool {
        debug_assert!(bit < self.len, "bit {} out of range 0..{}", bit, self.len);
        let byte = (bit / 8) as usize;
        let mask = 1u8 << (bit % 8);
        (self.bytes[byte] & mask) != 0
    }

    /// Number of set bits (fill diagnostics).
    pub fn count_ones(&self) -> u64 {
        self.bytes.iter().map(|b| b.count_ones() as u64).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_and_count() {
        let mut bv = BitVector::new(13);
        assert_eq!(bv.len(), 13);
        assert_eq!(bv.byte_len(), 2);
        assert_eq!(bv.count_ones(), 0);

        bv.set(0);
        bv.set(7);
        bv.set(12);
        bv.set(12);
        assert!(bv.get(0) && bv.get(7) && bv.get(12));
        assert!(!bv.get(1) && !bv.get(8) && !bv.get(11));
        assert_eq!(bv.count_ones(), 3);
    }

    #[test]
    fn single_bit_vector() {
        let mut bv = BitVector::new(1);
        assert!(!bv.get(0));
        bv.set(0);
        assert!(bv.get(0));
        assert!(!bv.is_empty());
    }
}
