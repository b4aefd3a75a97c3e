use std::path::{Path, PathBuf};

use exn::ResultExt;

use crate::consts::NUMBER_REGEX;
use crate::error::{ErrorKind, Result};

/// Lists the entries of `dir` accepted by `filter`, in natural order: the
/// first run of digits in the file stem sorts numerically, so `2.json` comes
/// before `10.json`.
pub(crate) fn sorted_entries(dir: &Path, filter: impl Fn(&Path) -> bool) -> Result<Vec<PathBuf>> {
    let mut entries = std::fs::read_dir(dir)
        .or_raise(|| ErrorKind::Io(dir.to_path_buf()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()
        .or_raise(|| ErrorKind::Io(dir.to_path_buf()))?;
    entries.retain(|path| filter(path));
    entries.sort_by_cached_key(|path| natural_key(path));
    Ok(entries)
}

pub(crate) fn is_json(path: &Path) -> bool {
    path.is_file() && path.extension().is_some_and(|ext| ext == "json")
}

fn natural_key(path: &Path) -> (Option<u64>, String) {
    let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    let number = NUMBER_REGEX.find(&stem).and_then(|m| m.as_str().parse().ok());
    (number, stem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_sorted_entries_natural_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["10.json", "2.json", "1.json", "notes.txt"] {
            fs::write(dir.path().join(name), b"[]").unwrap();
        }
        let names: Vec<_> = sorted_entries(dir.path(), is_json)
            .unwrap()
            .into_iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["1.json", "2.json", "10.json"]);
    }

    #[test]
    fn test_sorted_entries_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let err = sorted_entries(&dir.path().join("nope"), is_json).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Io(_)));
    }
}
