// SPDX-License-Identifier: GPL-2.0-only

//! The image atlas (4.B): themed icon/pixmap loading, deduped and
//! ref-counted so that N buttons referencing the same themed PNG share one
//! decode.
//!
//! Grounded in `original_source/` `img.h`/`img-png.h`/`img-xbm.h` (10.6):
//! images are looked up by source path, decoded once, and handed out as
//! shared handles; a sweep drops entries nobody references any more.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Decoded pixel data. The actual decode (png/xbm/svg) is an external
/// collaborator (spec.md Non-goals say nothing about image codecs, but the
/// renderer boundary does); this crate models the handle only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub source: PathBuf,
}

/// What a `Decoder` must provide to populate the atlas on a cache miss.
pub trait Decoder {
    fn decode(&self, path: &Path) -> Option<ImageData>;
}

/// Themed image cache, keyed by source path. Handles are `Rc<ImageData>`;
/// `sweep` drops entries whose only remaining reference is the atlas's own
/// map slot (strong_count == 1), mirroring `img.h`'s refcounted `destroy`.
#[derive(Default)]
pub struct ImageAtlas {
    entries: HashMap<PathBuf, Rc<ImageData>>,
}

impl ImageAtlas {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Fetch a cached image, or decode and cache it via `decoder`. Returns
    /// `None` if decoding fails (4.B "Errors": not fatal, caller falls back
    /// to no icon).
    pub fn load(&mut self, path: &Path, decoder: &dyn Decoder) -> Option<Rc<ImageData>> {
        if let Some(existing) = self.entries.get(path) {
            return Some(existing.clone());
        }
        let data = decoder.decode(path)?;
        let rc = Rc::new(data);
        self.entries.insert(path.to_path_buf(), rc.clone());
        Some(rc)
    }

    /// Drop atlas entries with no external holders left.
    pub fn sweep(&mut self) {
        self.entries.retain(|_, rc| Rc::strong_count(rc) > 1);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeDecoder {
        fail: bool,
    }

    impl Decoder for FakeDecoder {
        fn decode(&self, path: &Path) -> Option<ImageData> {
            if self.fail {
                None
            } else {
                Some(ImageData {
                    width: 16,
                    height: 16,
                    source: path.to_path_buf(),
                })
            }
        }
    }

    #[test]
    fn repeated_load_shares_the_same_allocation() {
        let mut atlas = ImageAtlas::new();
        let decoder = FakeDecoder { fail: false };
        let path = Path::new("/usr/share/themes/Clearlooks/openbox-3/close.png");
        let a = atlas.load(path, &decoder).unwrap();
        let b = atlas.load(path, &decoder).unwrap();
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(atlas.len(), 1);
    }

    #[test]
    fn failed_decode_returns_none_and_caches_nothing() {
        let mut atlas = ImageAtlas::new();
        let decoder = FakeDecoder { fail: true };
        let path = Path::new("/bad/path.png");
        assert!(atlas.load(path, &decoder).is_none());
        assert!(atlas.is_empty());
    }

    #[test]
    fn sweep_drops_entries_with_no_external_holders() {
        let mut atlas = ImageAtlas::new();
        let decoder = FakeDecoder { fail: false };
        let path = Path::new("/theme/icon.png");
        let held = atlas.load(path, &decoder).unwrap();
        atlas.sweep();
        assert_eq!(atlas.len(), 1, "still held externally");
        drop(held);
        atlas.sweep();
        assert!(atlas.is_empty());
    }
}
