use std::io;
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::shared::constants::IMAGE_EXTENSIONS;

pub fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

/// Collects image files under `root`, recursively, in sorted path order.
///
/// Hidden entries (leading `.`) are skipped. A `root` that is itself an
/// image yields just that file. Unreadable entries below `root` are logged
/// and skipped.
pub fn find_photos(root: &Path) -> io::Result<Vec<PathBuf>> {
    if !root.exists() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} does not exist", root.display()),
        ));
    }
    if root.is_file() {
        return Ok(if is_image(root) {
            vec![root.to_path_buf()]
        } else {
            Vec::new()
        });
    }

    let walker = WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e));

    let mut found = Vec::new();
    for entry in walker {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_file() && is_image(entry.path()) {
                    found.push(entry.into_path());
                }
            }
            Err(e) => log::warn!("Skipping unreadable entry: {e}"),
        }
    }
    log::debug!("Found {} photos under {}", found.len(), root.display());
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::fs;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"").unwrap();
    }

    #[rstest]
    #[case::jpg("a.jpg", true)]
    #[case::upper("A.JPEG", true)]
    #[case::png("b.png", true)]
    #[case::webp("c.webp", true)]
    #[case::text("notes.txt", false)]
    #[case::video("clip.mp4", false)]
    #[case::no_extension("README", false)]
    fn test_is_image(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(is_image(Path::new(name)), expected);
    }

    #[test]
    fn test_finds_nested_images_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("2021/summer/b.jpg"));
        touch(&root.join("2021/summer/a.JPG"));
        touch(&root.join("2020/x.png"));
        touch(&root.join("2020/notes.txt"));

        let found = find_photos(root).unwrap();

        assert_eq!(
            found,
            vec![
                root.join("2020/x.png"),
                root.join("2021/summer/a.JPG"),
                root.join("2021/summer/b.jpg"),
            ]
        );
    }

    #[test]
    fn test_skips_hidden_entries() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join(".thumbnails/t.jpg"));
        touch(&root.join("._a.jpg"));
        touch(&root.join("a.jpg"));

        assert_eq!(find_photos(root).unwrap(), vec![root.join("a.jpg")]);
    }

    #[test]
    fn test_single_file_root() {
        let dir = tempfile::tempdir().unwrap();
        let photo = dir.path().join("one.jpg");
        touch(&photo);

        assert_eq!(find_photos(&photo).unwrap(), vec![photo.clone()]);
    }

    #[test]
    fn test_missing_root_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_photos(&dir.path().join("absent")).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_broken_entries_do_not_stop_discovery() {
        use std::os::unix::fs::symlink;

        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("a.jpg"));
        touch(&root.join("sub/b.jpg"));
        symlink(root.join("missing.jpg"), root.join("dangling.jpg")).unwrap();
        symlink(root, root.join("sub/loop")).unwrap();

        let found = find_photos(root).unwrap();

        assert_eq!(found, vec![root.join("a.jpg"), root.join("sub/b.jpg")]);
    }
}
