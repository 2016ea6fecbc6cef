use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Result, SifterError};
use crate::segment::manifest::{ManifestEntry, SegmentManifest};
use crate::segment::reader::{Segment, SegmentData};
use crate::segment::types::SegmentId;
use crate::version::EngineVersion;

const MANIFEST_FILE: &str = "manifest.json";
const SEGMENT_PREFIX: &str = "segment_";
const SEGMENT_EXT: &str = "bin";
const TMP_EXT: &str = "tmp";

/// Persistent storage for segment files and manifest.
#[derive(Debug)]
pub struct SegmentStore {
    base_dir: PathBuf,
    sync: bool,
}

impl SegmentStore {
    pub fn new<P: AsRef<Path>>(base_dir: P, sync: bool) -> Result<Self> {
        fs::create_dir_all(&base_dir)?;
        Ok(Self {
            base_dir: base_dir.as_ref().to_path_buf(),
            sync,
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn segment_path(&self, id: SegmentId) -> PathBuf {
        self.base_dir
            .join(format!("{}{}.{}", SEGMENT_PREFIX, id.0, SEGMENT_EXT))
    }

    pub fn write_segment(&self, segment: &Segment) -> Result<ManifestEntry> {
        let bytes = bincode::serialize(&segment.to_data())?;
        let checksum = crc32fast::hash(&bytes);
        write_atomic(&self.segment_path(segment.id()), &bytes, self.sync)?;

        debug!(segment = %segment.id(), bytes = bytes.len(), checksum, "Wrote segment file");
        Ok(ManifestEntry {
            meta: *segment.meta(),
            checksum,
            size_bytes: bytes.len() as u64,
        })
    }

    pub fn read_segment(&self, entry: &ManifestEntry) -> Result<Segment> {
        let path = self.segment_path(entry.meta.id);
        let bytes = fs::read(&path).map_err(|e| {
            SifterError::Corrupted(format!("{}: cannot read {}: {}", entry.meta.id, path.display(), e))
        })?;

        let checksum = crc32fast::hash(&bytes);
        if checksum != entry.checksum {
            return Err(SifterError::Corrupted(format!(
                "{}: checksum {:08x} does not match manifest {:08x}",
                entry.meta.id, checksum, entry.checksum
            )));
        }

        let data: SegmentData = bincode::deserialize(&bytes)?;
        let segment = Segment::from_data(data)?;
        if *segment.meta() != entry.meta {
            return Err(SifterError::Corrupted(format!(
                "{}: segment header disagrees with manifest",
                entry.meta.id
            )));
        }
        Ok(segment)
    }

    pub fn save_manifest(&self, manifest: &SegmentManifest) -> Result<()> {
        let bytes = manifest.to_json()?;
        write_atomic(&self.base_dir.join(MANIFEST_FILE), &bytes, self.sync)
    }

    /// Load the committed manifest, `None` for a fresh directory
    pub fn load_manifest(&self) -> Result<Option<SegmentManifest>> {
        let path = self.base_dir.join(MANIFEST_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(path)?;
        let manifest = SegmentManifest::from_json(&bytes)?;

        let current = EngineVersion::current();
        if !current.is_compatible(manifest.format_version) {
            return Err(SifterError::IncompatibleFormat {
                expected: current.format_version,
                actual: manifest.format_version,
            });
        }
        Ok(Some(manifest))
    }

    /// Delete segment and temp files the manifest does not reference
    ///
    /// Returns the number of files removed.
    pub fn remove_orphans(&self, manifest: &SegmentManifest) -> Result<usize> {
        let mut removed = 0;
        for entry in fs::read_dir(&self.base_dir)? {
            let path = entry?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };

            let orphan = if path.extension().is_some_and(|ext| ext == TMP_EXT) {
                true
            } else if let Some(id) = parse_segment_file(name) {
                manifest.get_segment(SegmentId::new(id)).is_none()
            } else {
                false
            };

            if orphan {
                match fs::remove_file(&path) {
                    Ok(()) => removed += 1,
                    Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove orphaned file"),
                }
            }
        }
        Ok(removed)
    }
}

fn parse_segment_file(name: &str) -> Option<u64> {
    name.strip_prefix(SEGMENT_PREFIX)?
        .strip_suffix(SEGMENT_EXT)?
        .strip_suffix('.')?
        .parse()
        .ok()
}

/// Write `bytes` to `<path>.tmp`, then rename over `path`
pub(crate) fn write_atomic(path: &Path, bytes: &[u8], sync: bool) -> Result<()> {
    let tmp = path.with_extension(TMP_EXT);
    {
        let mut file = File::create(&tmp)?;
        file.write_all(bytes)?;
        if sync {
            file.sync_all()?;
        }
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Document;
    use crate::segment::buffer::{AnalyzedDocument, MutableBuffer};
    use crate::segment::writer::SegmentWriter;
    use crate::tokenizer::Tokenizer;
    use tempfile::TempDir;

    fn segment(id: u64) -> Segment {
        let mut buffer = MutableBuffer::new(0);
        let doc = Document::new().with_text("body", "hello world");
        let analyzed = AnalyzedDocument::analyze(&Tokenizer::whitespace(), doc).unwrap();
        buffer.index_document(analyzed).unwrap();
        SegmentWriter::new(SegmentId::new(id))
            .write_from_buffer(&buffer)
            .unwrap()
    }

    #[test]
    fn test_segment_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = SegmentStore::new(dir.path(), false).unwrap();

        let entry = store.write_segment(&segment(3)).unwrap();
        assert!(store.segment_path(SegmentId::new(3)).exists());

        let loaded = store.read_segment(&entry).unwrap();
        assert_eq!(loaded.doc_freq("body", "hello"), 1);
    }

    #[test]
    fn test_checksum_mismatch_is_corruption() {
        let dir = TempDir::new().unwrap();
        let store = SegmentStore::new(dir.path(), false).unwrap();
        let entry = store.write_segment(&segment(1)).unwrap();

        let path = store.segment_path(SegmentId::new(1));
        let mut bytes = fs::read(&path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        fs::write(&path, bytes).unwrap();

        let err = store.read_segment(&entry).unwrap_err();
        assert!(matches!(err, SifterError::Corrupted(_)));
    }

    #[test]
    fn test_manifest_roundtrip_and_version_check() {
        let dir = TempDir::new().unwrap();
        let store = SegmentStore::new(dir.path(), true).unwrap();
        assert!(store.load_manifest().unwrap().is_none());

        let mut manifest = SegmentManifest::new();
        manifest.generation = 4;
        store.save_manifest(&manifest).unwrap();
        assert_eq!(store.load_manifest().unwrap().unwrap().generation, 4);

        manifest.format_version = 999;
        store.save_manifest(&manifest).unwrap();
        let err = store.load_manifest().unwrap_err();
        assert!(matches!(err, SifterError::IncompatibleFormat { actual: 999, .. }));
    }

    #[test]
    fn test_remove_orphans() {
        let dir = TempDir::new().unwrap();
        let store = SegmentStore::new(dir.path(), false).unwrap();

        let mut manifest = SegmentManifest::new();
        manifest.add_segment(store.write_segment(&segment(0)).unwrap());
        store.write_segment(&segment(1)).unwrap();
        fs::write(dir.path().join("manifest.tmp"), b"partial").unwrap();
        fs::write(dir.path().join("notes.txt"), b"keep").unwrap();

        assert_eq!(store.remove_orphans(&manifest).unwrap(), 2);
        assert!(store.segment_path(SegmentId::new(0)).exists());
        assert!(!store.segment_path(SegmentId::new(1)).exists());
        assert!(dir.path().join("notes.txt").exists());
    }

    #[test]
    fn test_parse_segment_file() {
        assert_eq!(parse_segment_file("segment_12.bin"), Some(12));
        assert_eq!(parse_segment_file("segment_x.bin"), None);
        assert_eq!(parse_segment_file("manifest.json"), None);
    }
}
