use super::Word;

/// Derives the layout seed from the content of the data set. The input is
/// canonicalized (sorted by text, `text:value` joined) before hashing, so two
/// lists with the same pairs in any order hash identically and the cloud never
/// jitters across re-renders triggered by unrelated state changes.
pub fn content_seed(words: &[Word]) -> u32 {
    let mut parts: Vec<String> = words
        .iter()
        .map(|w| format!("{}:{}", w.text, w.value))
        .collect();
    parts.sort();
    fnv1a32(parts.join("|").as_bytes())
}

/// 32-bit FNV-1a. The hash and the generator below form a fixed pipeline; test
/// fixtures depend on both, so neither can be swapped independently.
fn fnv1a32(bytes: &[u8]) -> u32 {
    let mut hash: u32 = 0x811c9dc5;
    for &b in bytes {
        hash ^= b as u32;
        hash = hash.wrapping_mul(0x01000193);
    }
    hash
}

/// Mulberry32 generator. Fast, tiny state, and fully determined by its seed.
pub struct Mulberry32 {
    state: u32,
}

impl Mulberry32 {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(0x6d2b_79f5);
        let mut z = self.state;
        z = (z ^ (z >> 15)).wrapping_mul(z | 1);
        z ^= z.wrapping_add((z ^ (z >> 7)).wrapping_mul(z | 61));
        z ^ (z >> 14)
    }

    /// Uniform in `[0, 1)`.
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u32() as f64 / (u32::MAX as f64 + 1.0)) as f32
    }
}
