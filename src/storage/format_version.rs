//! Format version tracking for the persisted layout
//!
//! The marker records which key/value layout a store was written with, so a
//! store from an incompatible build is refused instead of misread.

use crate::storage::{StorageEngine, StorageError, StorageResult};

/// Current layout version
pub const CURRENT_FORMAT_VERSION: u32 = 1;

/// Key for the format marker in storage
const FORMAT_VERSION_KEY: &[u8] = b"m:format_version";

/// Get the format version from storage
pub fn get_format_version(storage: &dyn StorageEngine) -> StorageResult<Option<u32>> {
    match storage.get(FORMAT_VERSION_KEY)? {
        Some(bytes) => {
            let arr: [u8; 4] = bytes.as_slice().try_into().map_err(|_| {
                StorageError::CorruptedMarker(format!("expected 4 bytes, got {}", bytes.len()))
            })?;
            Ok(Some(u32::from_le_bytes(arr)))
        }
        None => Ok(None),
    }
}

/// Write the format marker to storage
pub fn write_format_version(storage: &dyn StorageEngine, version: u32) -> StorageResult<()> {
    storage.put(FORMAT_VERSION_KEY, &version.to_le_bytes())
}

/// Stamp a fresh store, or verify an existing one matches this build
pub fn ensure_format_version(storage: &dyn StorageEngine) -> StorageResult<()> {
    match get_format_version(storage)? {
        None => write_format_version(storage, CURRENT_FORMAT_VERSION),
        Some(CURRENT_FORMAT_VERSION) => Ok(()),
        Some(found) => Err(StorageError::IncompatibleFormat {
            found,
            expected: CURRENT_FORMAT_VERSION,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryEngine;

    #[test]
    fn test_format_version_key() {
        // Ensure key is stable
        assert_eq!(FORMAT_VERSION_KEY, b"m:format_version");
    }

    #[test]
    fn test_stamp_and_verify() {
        let engine = MemoryEngine::new();
        assert_eq!(get_format_version(&engine).unwrap(), None);

        ensure_format_version(&engine).unwrap();
        assert_eq!(
            get_format_version(&engine).unwrap(),
            Some(CURRENT_FORMAT_VERSION)
        );

        // Second open is a no-op
        ensure_format_version(&engine).unwrap();
    }

    #[test]
    fn test_incompatible_version() {
        let engine = MemoryEngine::new();
        write_format_version(&engine, 99).unwrap();
        assert!(matches!(
            ensure_format_version(&engine),
            Err(StorageError::IncompatibleFormat { found: 99, .. })
        ));
    }

    #[test]
    fn test_corrupted_marker() {
        let engine = MemoryEngine::new();
        engine.put(FORMAT_VERSION_KEY, b"xx").unwrap();
        assert!(matches!(
            get_format_version(&engine),
            Err(StorageError::CorruptedMarker(_))
        ));
    }
}
