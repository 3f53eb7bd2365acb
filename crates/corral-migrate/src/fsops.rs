//! Filesystem moves between state roots.

use std::fs;
use std::io;
use std::path::Path;

use tracing::debug;
use walkdir::WalkDir;

/// Move a directory, preferring an atomic rename.
///
/// Falls back to a recursive copy followed by source removal when rename
/// fails, which is what a cross-filesystem move looks like.
pub fn move_dir(source: &Path, dest: &Path) -> io::Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    match fs::rename(source, dest) {
        Ok(()) => Ok(()),
        Err(err) => {
            debug!(
                source = %source.display(),
                dest = %dest.display(),
                %err,
                "rename failed, falling back to copy"
            );
            copy_dir(source, dest)?;
            fs::remove_dir_all(source)
        }
    }
}

fn copy_dir(source: &Path, dest: &Path) -> io::Result<()> {
    for entry in WalkDir::new(source) {
        let entry = entry.map_err(io::Error::other)?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(io::Error::other)?;
        let target = dest.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            let _ = fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(unused_results)]
mod tests {
    use super::*;

    fn seed_tree(root: &Path) {
        fs::create_dir_all(root.join("nested")).unwrap();
        fs::write(root.join("top.txt"), "top").unwrap();
        fs::write(root.join("nested/inner.txt"), "inner").unwrap();
    }

    #[test]
    fn move_dir_relocates_the_tree() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source");
        let dest = dir.path().join("dest");
        seed_tree(&source);

        move_dir(&source, &dest).unwrap();

        assert!(!source.exists());
        assert_eq!(fs::read_to_string(dest.join("top.txt")).unwrap(), "top");
        assert_eq!(
            fs::read_to_string(dest.join("nested/inner.txt")).unwrap(),
            "inner"
        );
    }

    #[test]
    fn move_dir_creates_missing_dest_parents() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source");
        let dest = dir.path().join("a/b/dest");
        seed_tree(&source);

        move_dir(&source, &dest).unwrap();

        assert!(dest.join("top.txt").exists());
    }

    #[test]
    fn move_dir_fails_for_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let err = move_dir(&dir.path().join("ghost"), &dir.path().join("dest")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn copy_dir_duplicates_nested_structure() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source");
        let dest = dir.path().join("dest");
        seed_tree(&source);

        copy_dir(&source, &dest).unwrap();

        assert!(source.join("top.txt").exists());
        assert_eq!(
            fs::read_to_string(dest.join("nested/inner.txt")).unwrap(),
            "inner"
        );
    }
}
