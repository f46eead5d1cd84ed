use dashmap::DashMap;

/// Drops the fragment so `/path#a` and `/path#b` collapse to one key.
pub fn normalize(key: &str) -> &str {
    match key.find('#') {
        Some(idx) => &key[..idx],
        None => key,
    }
}

/// Records which job keys have already been scheduled. The first caller to
/// claim a key wins; every later claim for the same key is rejected. Lives
/// for exactly one scan.
pub struct Visited {
    seen: DashMap<String, (), ahash::RandomState>,
}

impl Visited {
    pub fn new() -> Self {
        Self {
            seen: DashMap::with_hasher(ahash::RandomState::new()),
        }
    }

    /// Returns true exactly once per normalized key, under any number of
    /// concurrent callers.
    pub fn claim(&self, key: &str) -> bool {
        self.seen.insert(normalize(key).to_string(), ()).is_none()
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }
}

impl Default for Visited {
    fn default() -> Self {
        Self::new()
    }
}
