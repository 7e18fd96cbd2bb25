//! File-backed cart slot.
//!
//! The cart lives in one JSON file, `<dir>/lumina_cart_v1.json`. Writes go to
//! a temporary file in the same directory which is then renamed over the
//! slot, so readers only ever see a complete cart.
//!
//! File access is synchronous. The slot holds one small JSON array and is
//! touched once per cart request, under the shop lock.
//!
//! Content that doesn't decode (including invalid UTF-8) is an empty cart and
//! is replaced on the next write. A slot that exists but cannot be opened,
//! for example for lack of permission, is never overwritten.

use std::fs::File;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use lumina_core::cart::{
    CART_SLOT_KEY, CartLine, CartRepository, CartStoreError, encode_slot, read_slot,
};
use tempfile::NamedTempFile;

/// [`CartRepository`] persisting the slot to a file.
#[derive(Debug, Clone)]
pub struct FileCartRepository {
    dir: PathBuf,
    path: PathBuf,
}

impl FileCartRepository {
    /// A repository keeping its slot in `dir`. The directory is created on
    /// first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let path = dir.join(format!("{CART_SLOT_KEY}.json"));
        Self { dir, path }
    }

    /// Path of the slot file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CartRepository for FileCartRepository {
    fn load(&self) -> Vec<CartLine> {
        match std::fs::read(&self.path) {
            Ok(bytes) => read_slot(Some(&String::from_utf8_lossy(&bytes))),
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, path = %self.path.display(), "Failed to read cart slot");
                Vec::new()
            }
        }
    }

    fn save(&mut self, lines: &[CartLine]) -> Result<(), CartStoreError> {
        let encoded = encode_slot(lines)?;
        if let Err(e) = File::open(&self.path)
            && e.kind() != ErrorKind::NotFound
        {
            tracing::error!(error = %e, path = %self.path.display(), "Cart slot unreadable, not overwriting");
            return Err(e.into());
        }
        std::fs::create_dir_all(&self.dir)?;

        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(encoded.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        tracing::debug!(path = %self.path.display(), lines = lines.len(), "Saved cart slot");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use lumina_core::cart::{CartSelection, CartStore};
    use lumina_core::{ProductId, SizeId};

    use super::*;

    fn selection(product_id: &str) -> CartSelection {
        CartSelection {
            product_id: ProductId::new(product_id),
            size_id: SizeId::default_size(),
            size_label: String::new(),
            color: "Plata".into(),
        }
    }

    #[test]
    fn test_missing_file_is_empty_cart() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileCartRepository::new(dir.path().join("nested"));
        assert!(repo.load().is_empty());
    }

    #[test]
    fn test_cart_survives_restart() {
        let dir = tempfile::tempdir().unwrap();

        let mut cart = CartStore::new(FileCartRepository::new(dir.path()));
        cart.add(selection("p1"), Some(2)).unwrap();
        cart.add(selection("p2"), None).unwrap();
        drop(cart);

        let reopened = CartStore::new(FileCartRepository::new(dir.path()));
        assert_eq!(reopened.total_item_count(), 3);
        assert_eq!(reopened.lines()[0].product_id.as_str(), "p1");
    }

    #[test]
    fn test_slot_file_layout() {
        let dir = tempfile::tempdir().unwrap();
        let mut repo = FileCartRepository::new(dir.path());
        assert!(repo.path().ends_with("lumina_cart_v1.json"));

        repo.save(&[]).unwrap();
        assert_eq!(std::fs::read_to_string(repo.path()).unwrap(), "[]");
    }

    #[test]
    fn test_corrupt_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileCartRepository::new(dir.path());
        std::fs::write(repo.path(), "{not json").unwrap();
        assert!(repo.load().is_empty());

        let mut cart = CartStore::new(repo);
        cart.add(selection("p1"), None).unwrap();
        assert_eq!(cart.total_item_count(), 1);
    }

    #[test]
    fn test_invalid_utf8_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileCartRepository::new(dir.path());
        std::fs::write(repo.path(), [0xff, 0xfe, b'[', b']']).unwrap();
        assert!(repo.load().is_empty());

        let mut cart = CartStore::new(repo);
        cart.add(selection("p1"), None).unwrap();
        assert_eq!(cart.total_item_count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_slot_is_not_overwritten() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let mut repo = FileCartRepository::new(dir.path());
        let original = r#"[{"product_id":"p1","size_id":"na","color":"Plata","qty":4}]"#;
        std::fs::write(repo.path(), original).unwrap();
        std::fs::set_permissions(repo.path(), std::fs::Permissions::from_mode(0o000)).unwrap();

        // A privileged user reads through the permission bits.
        if std::fs::read(repo.path()).is_ok() {
            return;
        }

        assert!(repo.load().is_empty());
        assert!(matches!(repo.save(&[]), Err(CartStoreError::Io(_))));

        std::fs::set_permissions(repo.path(), std::fs::Permissions::from_mode(0o600)).unwrap();
        assert_eq!(std::fs::read_to_string(repo.path()).unwrap(), original);
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let mut cart = CartStore::new(FileCartRepository::new(dir.path()));
        for _ in 0..3 {
            cart.add(selection("p1"), None).unwrap();
        }
        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }
}
