//! Capability-scoped file access for image assets and command-line inputs.
//!
//! Paths are UTF-8 ([`camino`]) and every operation opens the containing
//! directory through [`cap_std`] before touching the file, so callers never
//! follow a path outside the directory they named.
#![forbid(unsafe_code)]

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};
use std::io;
use std::path::Component;

/// Read a whole file into memory.
///
/// # Errors
///
/// Returns any error raised while opening the parent directory or reading
/// the file.
pub fn read_bytes(path: &Utf8Path) -> io::Result<Vec<u8>> {
    let (dir, name) = parent_dir_and_name(path)?;
    dir.read(name.as_str())
}

/// Read a whole UTF-8 file into memory.
///
/// # Errors
///
/// Returns any error raised while reading, including invalid UTF-8.
pub fn read_string(path: &Utf8Path) -> io::Result<String> {
    let (dir, name) = parent_dir_and_name(path)?;
    dir.read_to_string(name.as_str())
}

/// Write `contents` to `path`, creating missing parent directories and
/// replacing any existing file.
///
/// # Errors
///
/// Returns any error raised while creating directories or writing.
pub fn write_string(path: &Utf8Path, contents: &str) -> io::Result<()> {
    ensure_parent_dir(path)?;
    let (dir, name) = parent_dir_and_name(path)?;
    dir.write(name.as_str(), contents)
}

/// Whether `path` names an existing regular file. Missing parents count as
/// "not a file" rather than an error.
///
/// # Errors
///
/// Returns errors other than [`io::ErrorKind::NotFound`].
pub fn is_file(path: &Utf8Path) -> io::Result<bool> {
    let (dir, name) = match parent_dir_and_name(path) {
        Ok(found) => found,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err),
    };
    match dir.metadata(name.as_str()) {
        Ok(meta) => Ok(meta.is_file()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

/// Create every missing directory above `path`.
///
/// # Errors
///
/// Returns any error raised while opening the base directory or creating
/// the missing components.
pub fn ensure_parent_dir(path: &Utf8Path) -> io::Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_str().is_empty() || parent == Utf8Path::new("/") {
        return Ok(());
    }
    let (base, relative) = split_base(parent)?;
    if relative.as_str().is_empty() {
        return Ok(());
    }
    base.create_dir_all(&relative)
}

fn parent_dir_and_name(path: &Utf8Path) -> io::Result<(fs_utf8::Dir, String)> {
    let name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, format!("'{path}' has no file name")))?
        .to_owned();
    let parent = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let dir = fs_utf8::Dir::open_ambient_dir(parent, ambient_authority())?;
    Ok((dir, name))
}

/// Split `parent` into an ambient root (`/`, a Windows prefix or `.`) and
/// the remaining relative components, since `cap-std` only creates
/// directories relative to an open handle.
fn split_base(parent: &Utf8Path) -> io::Result<(fs_utf8::Dir, Utf8PathBuf)> {
    let std_parent = parent.as_std_path();
    let (base, relative) = match std_parent.components().next() {
        Some(Component::Prefix(prefix)) => {
            let prefix_str = prefix
                .as_os_str()
                .to_str()
                .ok_or_else(|| io::Error::other("non-UTF-8 path prefix"))?;
            let base = Utf8PathBuf::from(prefix_str).join(std::path::MAIN_SEPARATOR.to_string());
            let relative = std_parent
                .strip_prefix(base.as_std_path())
                .or_else(|_| std_parent.strip_prefix(prefix.as_os_str()))
                .map_err(|_| io::Error::other("failed to strip prefix from parent path"))?
                .to_path_buf();
            (base, relative)
        }
        Some(Component::RootDir) => {
            let base = Utf8PathBuf::from(std::path::MAIN_SEPARATOR.to_string());
            let relative = std_parent
                .strip_prefix(base.as_std_path())
                .map_err(|_| io::Error::other("failed to strip root from absolute path"))?
                .to_path_buf();
            (base, relative)
        }
        _ => (Utf8PathBuf::from("."), std_parent.to_path_buf()),
    };
    let dir = fs_utf8::Dir::open_ambient_dir(&base, ambient_authority())?;
    let relative = Utf8PathBuf::from_path_buf(relative)
        .map_err(|_| io::Error::other("non-UTF-8 parent path"))?;
    Ok((dir, relative))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    struct Scratch {
        _dir: TempDir,
        root: Utf8PathBuf,
    }

    #[fixture]
    fn scratch() -> Scratch {
        let dir = TempDir::new().expect("create temp dir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp dir");
        Scratch { _dir: dir, root }
    }

    #[rstest]
    fn write_creates_nested_parents(scratch: Scratch) {
        let target = scratch.root.join("reports/today/summary.json");
        write_string(&target, "{}").expect("write report");
        assert_eq!(read_string(&target).expect("read back"), "{}");
        assert!(is_file(&target).expect("stat report"));
    }

    #[rstest]
    fn bytes_round_trip_binary_content(scratch: Scratch) {
        let target = scratch.root.join("pixel.bin");
        std::fs::write(&target, [0_u8, 255, 7]).expect("seed file");
        assert_eq!(read_bytes(&target).expect("read bytes"), vec![0, 255, 7]);
    }

    #[rstest]
    fn missing_paths_are_not_files(scratch: Scratch) {
        assert!(!is_file(&scratch.root.join("absent.png")).expect("stat file"));
        assert!(!is_file(&scratch.root.join("absent/dir/x.png")).expect("stat nested"));
        assert!(!is_file(&scratch.root).expect("stat directory"));
    }

    #[rstest]
    fn reading_a_missing_file_fails(scratch: Scratch) {
        let err = read_bytes(&scratch.root.join("nope.png")).expect_err("missing file");
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
