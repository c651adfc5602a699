//! JSON persistence for queues.
//!
//! A queue is stored as an object keyed by 1-based position:
//!
//! ```json
//! {"1": {"unique_attachment_id": "...", "display_date": "2024-05-10", ...}, "2": {...}}
//! ```
//!
//! Files are written to a temporary file in the same directory and renamed into
//! place, so a crash never leaves a half-written queue behind.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::path::Path;

use serde::de::{self, Deserialize, Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use tempfile::NamedTempFile;

use super::fifo::FifoQueue;
use super::model::EmailImage;
use crate::{Error, Result};

impl FifoQueue {
    /// Writes the full queue to `path`, replacing any previous content.
    ///
    /// Creates the parent directory if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory, temporary file or rename fails.
    pub fn save_to_storage(&self, path: &Path) -> Result<()> {
        let parent = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent)?;

        let mut tmp = NamedTempFile::new_in(parent)?;
        tmp.write_all(&self.to_storage_bytes()?)?;
        tmp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!(path = %path.display(), len = self.len(), "Queue saved");
        Ok(())
    }

    /// Replaces the queue contents with the queue stored at `path`.
    ///
    /// A missing file yields an empty queue. On any error the current contents
    /// are left untouched.
    ///
    /// # Errors
    ///
    /// Returns `Error::Load` if the file exists but is not a valid queue, or
    /// `Error::Io` if it cannot be read.
    pub fn load_from_storage(&mut self, path: &Path) -> Result<()> {
        let contents = match std::fs::read(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.replace(Vec::new());
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let elements = Self::from_storage_bytes(&contents).map_err(|reason| Error::Load {
            path: path.to_path_buf(),
            reason,
        })?;
        self.replace(elements);
        Ok(())
    }

    /// Serializes the queue in its persisted layout, keys in position order.
    fn to_storage_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        let mut serializer = serde_json::Serializer::new(&mut buf);
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (i, element) in self.iter().enumerate() {
            map.serialize_entry(&(i + 1).to_string(), element)?;
        }
        map.end()?;
        Ok(buf)
    }

    /// Parses the persisted layout, ordering entries by numeric position.
    fn from_storage_bytes(contents: &[u8]) -> std::result::Result<Vec<EmailImage>, String> {
        let Positions(positions) = serde_json::from_slice(contents).map_err(|e| e.to_string())?;
        Ok(positions.into_values().collect())
    }
}

/// Stored entries by position. A position that appears twice is rejected.
struct Positions(BTreeMap<u64, EmailImage>);

impl<'de> Deserialize<'de> for Positions {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct PositionsVisitor;

        impl<'de> Visitor<'de> for PositionsVisitor {
            type Value = Positions;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object keyed by queue position")
            }

            fn visit_map<A>(self, mut access: A) -> std::result::Result<Positions, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut positions = BTreeMap::new();
                while let Some((position, image)) = access.next_entry::<u64, EmailImage>()? {
                    if positions.insert(position, image).is_some() {
                        return Err(de::Error::custom(format!(
                            "duplicate queue position {position}"
                        )));
                    }
                }
                Ok(Positions(positions))
            }
        }

        deserializer.deserialize_map(PositionsVisitor)
    }
}
