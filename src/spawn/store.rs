//! Persistence of built towns
//!
//! A saved town is the accepted document text plus the origin it was built
//! at, which is all that is needed to rebuild it identically later.

use crate::core::error::{Result, TownError};
use crate::core::types::Vec3;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

const RECORD_EXTENSION: &str = "json";

/// Persisted form of a built town
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedTown {
    pub name: String,
    /// Post-repair, pre-normalization document text
    pub document_text: String,
    pub origin_x: f32,
    pub origin_y: f32,
    pub origin_z: f32,
}

impl SavedTown {
    pub fn new(name: &str, document_text: &str, origin: Vec3) -> Self {
        Self {
            name: name.to_string(),
            document_text: document_text.to_string(),
            origin_x: origin.x,
            origin_y: origin.y,
            origin_z: origin.z,
        }
    }

    pub fn origin(&self) -> Vec3 {
        Vec3::new(self.origin_x, self.origin_y, self.origin_z)
    }
}

/// One record per town name
pub trait TownStore {
    /// Write a record, overwriting any record of the same name
    fn save(&mut self, town: &SavedTown) -> Result<()>;

    fn load(&self, name: &str) -> Result<Option<SavedTown>>;

    /// Delete a record; returns whether one existed
    fn delete(&mut self, name: &str) -> Result<bool>;

    /// All stored town names, sorted
    fn names(&self) -> Result<Vec<String>>;
}

/// Volatile store for tests and one-shot runs
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: AHashMap<String, SavedTown>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl TownStore for MemoryStore {
    fn save(&mut self, town: &SavedTown) -> Result<()> {
        self.records.insert(town.name.clone(), town.clone());
        Ok(())
    }

    fn load(&self, name: &str) -> Result<Option<SavedTown>> {
        Ok(self.records.get(name).cloned())
    }

    fn delete(&mut self, name: &str) -> Result<bool> {
        Ok(self.records.remove(name).is_some())
    }

    fn names(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.records.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

/// One JSON file per town in a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `dir`, creating the directory if needed
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}", encode_file_stem(name), RECORD_EXTENSION))
    }
}

impl TownStore for FileStore {
    fn save(&mut self, town: &SavedTown) -> Result<()> {
        let data = serde_json::to_vec_pretty(town)?;
        atomic_write(&self.path_for(&town.name), &data)?;
        Ok(())
    }

    fn load(&self, name: &str) -> Result<Option<SavedTown>> {
        let path = self.path_for(name);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let town: SavedTown = serde_json::from_slice(&bytes).map_err(|e| {
            TownError::Store(format!("corrupt record {}: {}", path.display(), e))
        })?;
        Ok(Some(town))
    }

    fn delete(&mut self, name: &str) -> Result<bool> {
        match fs::remove_file(self.path_for(name)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn names(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match decode_file_stem(stem) {
                Some(name) => names.push(name),
                None => tracing::debug!("Ignoring foreign file {}", path.display()),
            }
        }
        names.sort();
        Ok(names)
    }
}

/// Write to `{path}.tmp`, sync, then rename over `path`.
///
/// A crash part-way leaves the previous record untouched.
fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let mut file = File::create(&tmp)?;
    file.write_all(data)?;
    file.sync_all()?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Injective file stem for a town name.
///
/// ASCII alphanumerics pass through; every other byte, `_` included, becomes
/// `_` followed by two uppercase hex digits.
pub fn encode_file_stem(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for byte in name.bytes() {
        if byte.is_ascii_alphanumeric() {
            out.push(byte as char);
        } else {
            out.push_str(&format!("_{:02X}", byte));
        }
    }
    out
}

/// Inverse of `encode_file_stem`; `None` for stems it could not have produced
pub fn decode_file_stem(stem: &str) -> Option<String> {
    let raw = stem.as_bytes();
    let mut bytes = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        match raw[i] {
            b'_' => {
                let hex = stem.get(i + 1..i + 3)?;
                if !hex.bytes().all(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(&b)) {
                    return None;
                }
                bytes.push(u8::from_str_radix(hex, 16).ok()?);
                i += 3;
            }
            b if b.is_ascii_alphanumeric() => {
                bytes.push(b);
                i += 1;
            }
            _ => return None,
        }
    }
    String::from_utf8(bytes).ok()
}
