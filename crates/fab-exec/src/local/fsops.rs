//! Blocking directory copies, run on the blocking pool.
use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// Remove `dst` if present and recreate it empty.
pub(crate) async fn reset_dir(dst: PathBuf) -> io::Result<()> {
    tokio::task::spawn_blocking(move || {
        remove_if_exists(&dst)?;
        fs::create_dir_all(&dst)
    })
    .await
    .map_err(io::Error::other)?
}

/// Replace `dst` with a copy of `src`.
pub(crate) async fn replace_dir(src: PathBuf, dst: PathBuf) -> io::Result<()> {
    tokio::task::spawn_blocking(move || {
        remove_if_exists(&dst)?;
        copy_dir_blocking(&src, &dst)
    })
    .await
    .map_err(io::Error::other)?
}

fn remove_if_exists(dir: &Path) -> io::Result<()> {
    match fs::remove_dir_all(dir) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

fn copy_dir_blocking(src: &Path, dst: &Path) -> io::Result<()> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_blocking(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replace_copies_nested_tree() {
        let src = tempfile::tempdir().unwrap();
        fs::create_dir_all(src.path().join("SWEEP/d1")).unwrap();
        fs::write(src.path().join("input.txt"), "42").unwrap();
        fs::write(src.path().join("SWEEP/d1/dummy.txt"), "d1").unwrap();
        let dst = tempfile::tempdir().unwrap();
        let target = dst.path().join("copy");

        replace_dir(src.path().to_path_buf(), target.clone()).await.unwrap();

        assert_eq!(fs::read_to_string(target.join("input.txt")).unwrap(), "42");
        assert_eq!(
            fs::read_to_string(target.join("SWEEP/d1/dummy.txt")).unwrap(),
            "d1"
        );
    }

    #[tokio::test]
    async fn replace_drops_stale_files() {
        let src = tempfile::tempdir().unwrap();
        fs::write(src.path().join("new.txt"), "new").unwrap();
        let dst = tempfile::tempdir().unwrap();
        fs::write(dst.path().join("stale.txt"), "old").unwrap();

        replace_dir(src.path().to_path_buf(), dst.path().to_path_buf())
            .await
            .unwrap();

        assert!(dst.path().join("new.txt").exists());
        assert!(!dst.path().join("stale.txt").exists());
    }

    #[tokio::test]
    async fn reset_empties_existing_dir() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("job");
        fs::create_dir_all(dir.join("nested")).unwrap();
        fs::write(dir.join("out.txt"), "4.0").unwrap();

        reset_dir(dir.clone()).await.unwrap();

        assert!(dir.is_dir());
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn reset_creates_missing_dir() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("a/b");

        reset_dir(dir.clone()).await.unwrap();

        assert!(dir.is_dir());
    }
}
