//! Snapshot file format: framed bincode payload plus a JSON manifest.
//!
//! Layout of a snapshot file (all integers little-endian):
//!
//! ```text
//! [magic: b"VSNP"][version: u32][crc32(payload): u32][payload_len: u64][payload]
//! ```
//!
//! The payload is `bincode(IndexSnapshot)`. Vectors are stored row-major, so
//! the row number of a vector is its id.

use crate::error::{Result, VectorStoreError};
use crate::flat_index::FlatIndex;
use crate::index::Index;
use crate::records::VectorRecordStore;
use crate::VectorId;
use serde::{Deserialize, Serialize};

pub const MAGIC: [u8; 4] = *b"VSNP";
pub const FORMAT_VERSION: u32 = 1;
pub const HEADER_LEN: usize = 20;

/// The complete durable state of an index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSnapshot {
    pub dimension: u64,
    pub count: u64,
    /// Row-major vector data, `count * dimension` entries.
    pub vectors: Vec<f32>,
    /// `(id, text)` pairs in ascending id order.
    pub records: Vec<(VectorId, String)>,
}

impl IndexSnapshot {
    /// Capture the current state of an index and its records.
    pub fn capture(index: &FlatIndex, records: &VectorRecordStore) -> Self {
        Self {
            dimension: index.dimension() as u64,
            count: index.len() as u64,
            vectors: index.as_rows().to_vec(),
            records: records
                .iter()
                .map(|(id, text)| (id, text.to_string()))
                .collect(),
        }
    }

    /// Check the internal invariants, returning a description of the first violation.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.dimension == 0 {
            return Err("dimension is zero".to_string());
        }
        let expected = self
            .count
            .checked_mul(self.dimension)
            .ok_or_else(|| "count * dimension overflows".to_string())?;
        if self.vectors.len() as u64 != expected {
            return Err(format!(
                "expected {} vector components for {} vectors of dimension {}, found {}",
                expected,
                self.count,
                self.dimension,
                self.vectors.len()
            ));
        }
        if self.records.len() as u64 != self.count {
            return Err(format!(
                "expected {} text records, found {}",
                self.count,
                self.records.len()
            ));
        }
        if let Some((pos, (id, _))) = self
            .records
            .iter()
            .enumerate()
            .find(|(pos, (id, _))| *id != *pos as VectorId)
        {
            return Err(format!("record at position {} has id {}", pos, id));
        }
        Ok(())
    }

    /// Split a validated snapshot back into an index and its records.
    pub fn into_parts(self) -> std::result::Result<(FlatIndex, VectorRecordStore), String> {
        self.validate()?;
        let index = FlatIndex::from_rows(self.dimension as usize, self.vectors)
            .ok_or_else(|| "vector buffer is not a whole number of rows".to_string())?;
        let mut records = VectorRecordStore::new();
        for (id, text) in self.records {
            records.put(id, text).map_err(|e| e.to_string())?;
        }
        Ok((index, records))
    }
}

/// Human-readable summary written next to each snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotManifest {
    pub format_version: u32,
    pub dimension: u64,
    pub vector_count: u64,
    pub checksum: u32,
    pub payload_bytes: u64,
}

/// Encode a snapshot into its framed on-disk form.
///
/// Returns the bytes along with the manifest describing them.
pub fn encode_snapshot(snapshot: &IndexSnapshot) -> Result<(Vec<u8>, SnapshotManifest)> {
    let payload = to_bincode(snapshot)?;
    let checksum = crc32fast::hash(&payload);

    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
    bytes.extend_from_slice(&MAGIC);
    bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    bytes.extend_from_slice(&checksum.to_le_bytes());
    bytes.extend_from_slice(&(payload.len() as u64).to_le_bytes());
    bytes.extend_from_slice(&payload);

    let manifest = SnapshotManifest {
        format_version: FORMAT_VERSION,
        dimension: snapshot.dimension,
        vector_count: snapshot.count,
        checksum,
        payload_bytes: payload.len() as u64,
    };
    Ok((bytes, manifest))
}

/// Decode and validate a framed snapshot.
///
/// The error is a description of what is wrong with the bytes.
pub fn decode_snapshot(bytes: &[u8]) -> std::result::Result<IndexSnapshot, String> {
    if bytes.len() < HEADER_LEN {
        return Err(format!(
            "file is {} bytes, shorter than the {}-byte header",
            bytes.len(),
            HEADER_LEN
        ));
    }
    let (header, payload) = bytes.split_at(HEADER_LEN);

    if header[0..4] != MAGIC {
        return Err("bad magic bytes".to_string());
    }
    let version = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
    if version != FORMAT_VERSION {
        return Err(format!("unsupported format version {}", version));
    }
    let expected_crc = u32::from_le_bytes([header[8], header[9], header[10], header[11]]);
    let mut len_buf = [0u8; 8];
    len_buf.copy_from_slice(&header[12..20]);
    let payload_len = u64::from_le_bytes(len_buf);

    if payload.len() as u64 != payload_len {
        return Err(format!(
            "header declares {} payload bytes, found {}",
            payload_len,
            payload.len()
        ));
    }
    let actual_crc = crc32fast::hash(payload);
    if actual_crc != expected_crc {
        return Err(format!(
            "checksum mismatch: header {:#010x}, payload {:#010x}",
            expected_crc, actual_crc
        ));
    }

    let snapshot: IndexSnapshot = from_bincode(payload).map_err(|e| e.to_string())?;
    snapshot.validate()?;
    Ok(snapshot)
}

/// Encode data to bincode bytes.
pub fn to_bincode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    bincode::serialize(value).map_err(|e| VectorStoreError::SerializationError(e.to_string()))
}

/// Decode data from bincode bytes.
pub fn from_bincode<'a, T: Deserialize<'a>>(bytes: &'a [u8]) -> Result<T> {
    bincode::deserialize(bytes).map_err(|e| VectorStoreError::SerializationError(e.to_string()))
}

/// Encode data to pretty-printed JSON bytes.
pub fn to_json<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec_pretty(value)
        .map_err(|e| VectorStoreError::SerializationError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::Vector;

    fn sample() -> IndexSnapshot {
        IndexSnapshot {
            dimension: 2,
            count: 2,
            vectors: vec![1.0, 2.0, 3.0, 4.0],
            records: vec![(0, "a".to_string()), (1, "b".to_string())],
        }
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let (bytes, manifest) = encode_snapshot(&sample()).unwrap();
        assert_eq!(&bytes[0..4], b"VSNP");
        assert_eq!(manifest.vector_count, 2);
        assert_eq!(manifest.payload_bytes as usize, bytes.len() - HEADER_LEN);

        let decoded = decode_snapshot(&bytes).unwrap();
        assert_eq!(decoded, sample());
    }

    #[test]
    fn test_capture_and_into_parts() {
        let mut index = FlatIndex::new(2);
        let mut records = VectorRecordStore::new();
        let id = index.add(Vector::new(vec![0.5, 1.5])).unwrap();
        records.put(id, "only").unwrap();

        let snapshot = IndexSnapshot::capture(&index, &records);
        assert_eq!(snapshot.count, 1);
        assert_eq!(snapshot.records, vec![(0, "only".to_string())]);

        let (index, records) = snapshot.into_parts().unwrap();
        assert_eq!(index.get_vector(0), Some(&[0.5, 1.5][..]));
        assert_eq!(records.get(0), Some("only"));
    }

    #[test]
    fn test_truncated_file_rejected() {
        let (bytes, _) = encode_snapshot(&sample()).unwrap();
        assert!(decode_snapshot(&bytes[..bytes.len() - 3]).is_err());
        assert!(decode_snapshot(&bytes[..10]).is_err());
    }

    #[test]
    fn test_flipped_payload_byte_rejected() {
        let (mut bytes, _) = encode_snapshot(&sample()).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        let err = decode_snapshot(&bytes).unwrap_err();
        assert!(err.contains("checksum"));
    }

    #[test]
    fn test_bad_magic_and_version() {
        let (mut bytes, _) = encode_snapshot(&sample()).unwrap();
        bytes[0] = b'X';
        assert!(decode_snapshot(&bytes).unwrap_err().contains("magic"));

        let (mut bytes, _) = encode_snapshot(&sample()).unwrap();
        bytes[4] = 9;
        assert!(decode_snapshot(&bytes).unwrap_err().contains("version"));
    }

    #[test]
    fn test_inconsistent_snapshot_rejected() {
        let mut snapshot = sample();
        snapshot.records.pop();
        assert!(snapshot.validate().is_err());

        let mut snapshot = sample();
        snapshot.vectors.push(5.0);
        assert!(snapshot.validate().is_err());

        let mut snapshot = sample();
        snapshot.records[1].0 = 7;
        assert!(snapshot.validate().unwrap_err().contains("position 1"));

        let (bytes, _) = encode_snapshot(&IndexSnapshot {
            count: 3,
            ..sample()
        })
        .unwrap();
        assert!(decode_snapshot(&bytes).is_err());
    }
}
