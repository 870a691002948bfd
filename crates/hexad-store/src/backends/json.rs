use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::memory::MemoryStore;

#[derive(Serialize, Deserialize, Debug, Clone)]
struct JsonDocument {
    #[serde(default = "default_version")]
    version: u32,
    #[serde(default)]
    root: MemoryStore,
}

fn default_version() -> u32 {
    1
}

impl Default for JsonDocument {
    fn default() -> Self {
        Self {
            version: default_version(),
            root: MemoryStore::default(),
        }
    }
}

/// Where [`JsonBackend::save_to`] sends the document.
pub enum SaveDestination<'a> {
    /// The path the backend was opened from or last saved to.
    InPlace,
    Path(&'a Path),
    Writer(&'a mut dyn Write),
    Bytes,
}

/// A [`MemoryStore`] persisted as a single pretty-printed JSON document.
#[derive(Debug, Default, Clone)]
pub struct JsonBackend {
    data: JsonDocument,
    path: Option<PathBuf>,
}

impl JsonBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_store(store: MemoryStore) -> Self {
        Self {
            data: JsonDocument {
                root: store,
                ..JsonDocument::default()
            },
            path: None,
        }
    }

    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let reader = BufReader::new(file);
        let data: JsonDocument = serde_json::from_reader(reader)?;
        #[cfg(feature = "tracing")]
        tracing::info!(path = %path.as_ref().display(), version = data.version, "opened store");
        Ok(Self {
            data,
            path: Some(path.as_ref().to_path_buf()),
        })
    }

    pub fn open_reader(reader: impl Read) -> Result<Self> {
        let data: JsonDocument = serde_json::from_reader(reader)?;
        Ok(Self { data, path: None })
    }

    pub fn open_bytes(bytes: &[u8]) -> Result<Self> {
        let data: JsonDocument = serde_json::from_slice(bytes)?;
        Ok(Self { data, path: None })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn store(&self) -> &MemoryStore {
        &self.data.root
    }

    pub fn store_mut(&mut self) -> &mut MemoryStore {
        &mut self.data.root
    }

    pub fn into_store(self) -> MemoryStore {
        self.data.root
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.data)?)
    }

    /// Write back to the path the document came from. A backend that was
    /// never tied to a path has nowhere to go and does nothing.
    pub fn save(&mut self) -> Result<()> {
        if let Some(path) = &self.path {
            let mut file = File::create(path)?;
            let s = serde_json::to_string_pretty(&self.data)?;
            file.write_all(s.as_bytes())?;
            #[cfg(feature = "tracing")]
            tracing::info!(path = %path.display(), "saved store");
        }
        Ok(())
    }

    /// Returns the serialized bytes for [`SaveDestination::Bytes`] and
    /// `None` otherwise. Saving to a path rebinds the backend to it.
    pub fn save_to(&mut self, dest: SaveDestination<'_>) -> Result<Option<Vec<u8>>> {
        match dest {
            SaveDestination::InPlace => self.save().map(|_| None),
            SaveDestination::Path(path) => {
                self.path = Some(path.to_path_buf());
                self.save().map(|_| None)
            }
            SaveDestination::Writer(writer) => {
                let s = serde_json::to_string_pretty(&self.data)?;
                writer.write_all(s.as_bytes())?;
                Ok(None)
            }
            SaveDestination::Bytes => Ok(Some(serde_json::to_vec_pretty(&self.data)?)),
        }
    }
}
