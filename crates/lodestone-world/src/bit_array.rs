use lodestone_common::{Result, WorldError};

/// Fixed-width unsigned values packed into 64-bit words. Values never straddle two words; the
/// high bits of a word that cannot hold another whole value stay zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitPackedArray {
    bits: u8,
    len: usize,
    storage: Vec<u64>,
}

impl BitPackedArray {
    pub fn new(bits: u8, len: usize) -> Self {
        let bits = bits.clamp(1, 32);
        let values_per_long = 64 / bits as usize;
        BitPackedArray {
            bits,
            len,
            storage: vec![0; len.div_ceil(values_per_long)],
        }
    }

    pub fn bits(&self) -> u8 {
        self.bits
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn max_value(&self) -> u32 {
        ((1u64 << self.bits) - 1) as u32
    }

    fn values_per_long(&self) -> usize {
        64 / self.bits as usize
    }

    fn locate(&self, index: usize) -> (usize, u32) {
        let per_long = self.values_per_long();
        let word = index / per_long;
        let shift = ((index % per_long) * self.bits as usize) as u32;
        (word, shift)
    }

    pub fn get(&self, index: usize) -> u32 {
        debug_assert!(index < self.len, "index {} out of {}", index, self.len);
        let (word, shift) = self.locate(index);
        ((self.storage[word] >> shift) & self.max_value() as u64) as u32
    }

    pub fn set(&mut self, index: usize, value: u32) {
        debug_assert!(index < self.len, "index {} out of {}", index, self.len);
        let mask = self.max_value() as u64;
        let (word, shift) = self.locate(index);
        self.storage[word] &= !(mask << shift);
        self.storage[word] |= (value as u64 & mask) << shift;
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.len).map(move |index| self.get(index))
    }

    pub fn storage(&self) -> &[u64] {
        &self.storage
    }

    /// Replaces the raw words wholesale, e.g. with a decoded long array.
    pub fn set_storage(&mut self, storage: Vec<u64>) -> Result<()> {
        if storage.len() != self.storage.len() {
            return Err(WorldError::InvalidStorageLength {
                expected: self.storage.len(),
                actual: storage.len(),
            });
        }
        self.storage = storage;
        Ok(())
    }

    pub fn to_long_array(&self) -> Vec<i64> {
        self.storage.iter().map(|&word| word as i64).collect()
    }
}
