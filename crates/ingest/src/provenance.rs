//! Per-file provenance: every source file is hashed the first time it is
//! opened, and the set of hashes later seals the module.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use exn::ResultExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{ErrorKind, Result};

/// A source file that contributed to a module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Input {
    /// Path relative to the corpus root, `/`-separated.
    pub filename: String,
    /// BLAKE3 hash of the raw file contents (hex).
    pub hash: String,
}

/// Open-and-hash registry for one corpus.
///
/// [`open`](Self::open) registers a file at most once no matter how many
/// times it is read; newly registered inputs accumulate until
/// [`take_pending`](Self::take_pending) hands them to storage.
#[derive(Debug)]
pub struct Provenance {
    root: PathBuf,
    seen: HashSet<String>,
    pending: Vec<Input>,
}
impl Provenance {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            seen: HashSet::new(),
            pending: Vec::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reads a file, registering its hash the first time it is seen.
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub fn open(&mut self, path: &Path) -> Result<Vec<u8>> {
        let contents = std::fs::read(path).or_raise(|| ErrorKind::Io(path.to_path_buf()))?;
        let filename = self.relative(path);
        if self.seen.insert(filename.clone()) {
            let hash = blake3::hash(&contents).to_string();
            debug!(%filename, %hash, "registered input");
            self.pending.push(Input { filename, hash });
        }
        Ok(contents)
    }

    /// Like [`open`](Self::open), but requires the file to be UTF-8.
    pub fn open_to_string(&mut self, path: &Path) -> Result<String> {
        let contents = self.open(path)?;
        String::from_utf8(contents)
            .or_raise(|| ErrorKind::MalformedSource(format!("{} is not valid UTF-8", path.display())))
    }

    /// Drains the inputs registered since the last call.
    pub fn take_pending(&mut self) -> Vec<Input> {
        std::mem::take(&mut self.pending)
    }

    fn relative(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// Seals a module: BLAKE3 over the concatenated input hashes, ordered by
/// filename.
///
/// # Examples
///
/// ```
/// use exegete_ingest::{Input, completion_hash};
/// let a = Input { filename: "a.json".into(), hash: "aa".into() };
/// let b = Input { filename: "b.json".into(), hash: "bb".into() };
/// assert_eq!(completion_hash(&[a.clone(), b.clone()]), completion_hash(&[b, a]));
/// ```
pub fn completion_hash(inputs: &[Input]) -> String {
    let mut sorted: Vec<&Input> = inputs.iter().collect();
    sorted.sort_by(|a, b| a.filename.cmp(&b.filename));
    let mut hasher = blake3::Hasher::new();
    for input in sorted {
        hasher.update(input.hash.as_bytes());
    }
    hasher.finalize().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_open_registers_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ot").join("gen");
        fs::create_dir_all(&path).unwrap();
        let file = path.join("1.json");
        fs::write(&file, b"[]").unwrap();

        let mut provenance = Provenance::new(dir.path());
        assert_eq!(provenance.open(&file).unwrap(), b"[]");
        assert_eq!(provenance.open(&file).unwrap(), b"[]");
        let pending = provenance.take_pending();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].filename, "ot/gen/1.json");
        assert_eq!(pending[0].hash, blake3::hash(b"[]").to_string());

        provenance.open(&file).unwrap();
        assert!(provenance.take_pending().is_empty());
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut provenance = Provenance::new(dir.path());
        let err = provenance.open(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Io(_)));
        assert!(provenance.take_pending().is_empty());
    }

    #[test]
    fn test_completion_hash_depends_on_contents() {
        let a = Input {
            filename: "a".into(),
            hash: "1".into(),
        };
        let b = Input {
            filename: "b".into(),
            hash: "2".into(),
        };
        let swapped = Input {
            filename: "b".into(),
            hash: "3".into(),
        };
        assert_ne!(completion_hash(&[a.clone(), b]), completion_hash(&[a, swapped]));
        assert_eq!(completion_hash(&[]), blake3::Hasher::new().finalize().to_string());
    }
}
