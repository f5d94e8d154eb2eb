use xxhash_rust::xxh3::Xxh3;

const XXH3_SEED: u64 = 0x8b5ad4a0c7d8e9f1;

/// Stable fingerprint of a program text, used to key compiled templates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct SourceFingerprint {
    pub(crate) hi: u64,
    pub(crate) lo: u64,
}

pub(crate) fn fingerprint_source(text: &str) -> SourceFingerprint {
    let mut h = StableHasher::new();
    h.write_u64(text.len() as u64);
    h.write_bytes(text.as_bytes());
    h.finish()
}

struct StableHasher {
    inner: Xxh3,
}

impl StableHasher {
    fn new() -> Self {
        Self {
            inner: Xxh3::with_seed(XXH3_SEED),
        }
    }

    fn write_bytes(&mut self, b: &[u8]) {
        self.inner.update(b);
    }

    fn write_u64(&mut self, v: u64) {
        self.write_bytes(&v.to_le_bytes());
    }

    fn finish(self) -> SourceFingerprint {
        let v = self.inner.digest128();
        SourceFingerprint {
            hi: (v >> 64) as u64,
            lo: v as u64,
        }
    }
}
