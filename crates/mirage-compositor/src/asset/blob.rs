// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Reading compiled asset blobs.
//!
//! Every blob starts with a little-endian `{format_type: u32,
//! format_version: u32}` pair, followed by a type-specific fixed-size POD
//! header, followed by the payload — optionally LZ4 block-compressed.
//! The reader validates type and version, hands out the typed header, and
//! decompresses the payload on request.

use std::borrow::Cow;
use thiserror::Error;

/// Errors produced while reading an asset blob.
#[derive(Debug, Error)]
pub enum BlobError {
    /// The blob is shorter than the bytes being read from it.
    #[error("blob truncated: needed {needed} bytes, {available} available")]
    Truncated {
        /// Bytes the read required.
        needed: usize,
        /// Bytes remaining in the blob.
        available: usize,
    },
    /// The blob's format type does not match the loader's.
    #[error("blob format type {found:#010x} does not match expected {expected:#010x}")]
    TypeMismatch {
        /// The type the loader expected.
        expected: u32,
        /// The type found in the header.
        found: u32,
    },
    /// The blob's format version does not match the loader's.
    #[error("blob format version {found} does not match expected {expected}")]
    VersionMismatch {
        /// The version the loader expected.
        expected: u32,
        /// The version found in the header.
        found: u32,
    },
    /// LZ4 decompression failed or produced the wrong size.
    #[error("payload decompression failed: {0}")]
    Decompression(String),
}

/// How the payload bytes are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// Raw bytes.
    None,
    /// LZ4 block compression.
    Lz4 {
        /// The decompressed payload size in bytes.
        uncompressed_size: usize,
    },
}

/// A cursor over one asset blob.
#[derive(Debug)]
pub struct BlobReader<'a> {
    bytes: &'a [u8],
    cursor: usize,
}

impl<'a> BlobReader<'a> {
    /// Opens a blob and validates its `{format_type, format_version}`
    /// header against the loader's expectation.
    pub fn new(bytes: &'a [u8], expected_type: u32, expected_version: u32) -> Result<Self, BlobError> {
        let mut reader = Self { bytes, cursor: 0 };
        let format_type = reader.read_u32()?;
        let format_version = reader.read_u32()?;
        if format_type != expected_type {
            return Err(BlobError::TypeMismatch {
                expected: expected_type,
                found: format_type,
            });
        }
        if format_version != expected_version {
            return Err(BlobError::VersionMismatch {
                expected: expected_version,
                found: format_version,
            });
        }
        Ok(reader)
    }

    fn read_u32(&mut self) -> Result<u32, BlobError> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8], BlobError> {
        let available = self.bytes.len() - self.cursor;
        if count > available {
            return Err(BlobError::Truncated {
                needed: count,
                available,
            });
        }
        let slice = &self.bytes[self.cursor..self.cursor + count];
        self.cursor += count;
        Ok(slice)
    }

    /// Reads the type-specific fixed-size header.
    ///
    /// Read by value (`pod_read_unaligned`): blob bytes carry no
    /// alignment guarantee.
    pub fn typed_header<T: bytemuck::AnyBitPattern>(&mut self) -> Result<T, BlobError> {
        let bytes = self.take(std::mem::size_of::<T>())?;
        Ok(bytemuck::pod_read_unaligned(bytes))
    }

    /// Consumes the reader and returns the payload, decompressing it if
    /// `compression` says so.
    pub fn payload(self, compression: Compression) -> Result<Cow<'a, [u8]>, BlobError> {
        let remaining = &self.bytes[self.cursor..];
        match compression {
            Compression::None => Ok(Cow::Borrowed(remaining)),
            Compression::Lz4 { uncompressed_size } => {
                let decompressed = lz4_flex::block::decompress(remaining, uncompressed_size)
                    .map_err(|e| BlobError::Decompression(e.to_string()))?;
                if decompressed.len() != uncompressed_size {
                    return Err(BlobError::Decompression(format!(
                        "expected {uncompressed_size} bytes, got {}",
                        decompressed.len()
                    )));
                }
                Ok(Cow::Owned(decompressed))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_TYPE: u32 = 0x4D4D_4248; // arbitrary tag used by the tests
    const TEST_VERSION: u32 = 3;

    #[repr(C)]
    #[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
    struct MeshHeader {
        vertex_count: u32,
        index_count: u32,
    }

    fn blob(payload: &[u8], compress: bool) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&TEST_TYPE.to_le_bytes());
        bytes.extend_from_slice(&TEST_VERSION.to_le_bytes());
        bytes.extend_from_slice(bytemuck::bytes_of(&MeshHeader {
            vertex_count: 12,
            index_count: 36,
        }));
        if compress {
            bytes.extend_from_slice(&lz4_flex::block::compress(payload));
        } else {
            bytes.extend_from_slice(payload);
        }
        bytes
    }

    #[test]
    fn reads_header_and_raw_payload() {
        let payload = b"vertex data bytes";
        let bytes = blob(payload, false);
        let mut reader = BlobReader::new(&bytes, TEST_TYPE, TEST_VERSION).unwrap();
        let header: MeshHeader = reader.typed_header().unwrap();
        assert_eq!(header.vertex_count, 12);
        assert_eq!(header.index_count, 36);
        let data = reader.payload(Compression::None).unwrap();
        assert_eq!(data.as_ref(), payload);
    }

    #[test]
    fn decompresses_lz4_payload() {
        let payload = vec![7u8; 4096];
        let bytes = blob(&payload, true);
        let mut reader = BlobReader::new(&bytes, TEST_TYPE, TEST_VERSION).unwrap();
        let _header: MeshHeader = reader.typed_header().unwrap();
        let data = reader
            .payload(Compression::Lz4 {
                uncompressed_size: payload.len(),
            })
            .unwrap();
        assert_eq!(data.as_ref(), payload.as_slice());
    }

    #[test]
    fn wrong_type_is_rejected() {
        let bytes = blob(b"", false);
        match BlobReader::new(&bytes, 0xDEAD_BEEF, TEST_VERSION) {
            Err(BlobError::TypeMismatch { found, .. }) => assert_eq!(found, TEST_TYPE),
            other => panic!("expected TypeMismatch, got {other:?}"),
        }
    }

    #[test]
    fn wrong_version_is_rejected() {
        let bytes = blob(b"", false);
        assert!(matches!(
            BlobReader::new(&bytes, TEST_TYPE, TEST_VERSION + 1),
            Err(BlobError::VersionMismatch { .. })
        ));
    }

    #[test]
    fn truncated_blob_is_rejected() {
        let bytes = blob(b"", false);
        assert!(matches!(
            BlobReader::new(&bytes[..6], TEST_TYPE, TEST_VERSION),
            Err(BlobError::Truncated { .. })
        ));
    }

    #[test]
    fn round_trips_through_a_file_on_disk() {
        let payload = b"packed cascade moments";
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shadow.blob");
        std::fs::write(&path, blob(payload, false)).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let mut reader = BlobReader::new(&bytes, TEST_TYPE, TEST_VERSION).unwrap();
        let header: MeshHeader = reader.typed_header().unwrap();
        assert_eq!(header.index_count, 36);
        assert_eq!(reader.payload(Compression::None).unwrap().as_ref(), payload);
    }
}
