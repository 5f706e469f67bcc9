//! CRC-64 content checksums
//!
//! The checksum is non-cryptographic: it only needs to notice edits, and a
//! collision simply means one file is treated as unchanged.

use crc::{Crc, CRC_64_XZ};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// CRC-64 with the ECMA-182 reflected polynomial (Go's `crc64.ECMA` table)
const CRC64: Crc<u64> = Crc::<u64>::new(&CRC_64_XZ);

/// Checksum recorded for every directory entry
pub const DIRECTORY_CHECKSUM: u64 = 0;

/// Checksum a byte slice
pub fn checksum_bytes(data: &[u8]) -> u64 {
    CRC64.checksum(data)
}

/// Checksum a file's full contents (streaming)
pub fn checksum_file(path: &Path) -> io::Result<u64> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut digest = CRC64.digest();

    let mut buffer = [0u8; 64 * 1024];
    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        digest.update(&buffer[..bytes_read]);
    }

    Ok(digest.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::io::Write;

    #[test]
    fn test_checksum_consistency() {
        let data = b"hello world";
        assert_eq!(checksum_bytes(data), checksum_bytes(data));
    }

    #[test]
    fn test_known_value() {
        // CRC-64/XZ check value
        assert_eq!(checksum_bytes(b"123456789"), 0x995dc9bbdf1939fa);
    }

    #[test]
    fn test_different_data_different_checksum() {
        assert_ne!(checksum_bytes(b"hello"), checksum_bytes(b"world"));
    }

    #[test]
    fn test_checksum_file_matches_bytes() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let file_path = temp_dir.path().join("test.txt");

        let data = b"test file content";
        std::fs::write(&file_path, data)?;

        assert_eq!(checksum_file(&file_path)?, checksum_bytes(data));
        Ok(())
    }

    #[test]
    fn test_checksum_large_file() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let file_path = temp_dir.path().join("large.bin");

        // Spans many read buffers
        let mut file = std::fs::File::create(&file_path)?;
        let chunk = vec![0xAB; 1024 * 1024];
        for _ in 0..3 {
            file.write_all(&chunk)?;
        }
        drop(file);

        let expected = checksum_bytes(&chunk.repeat(3));
        assert_eq!(checksum_file(&file_path)?, expected);
        Ok(())
    }

    #[test]
    fn test_checksum_missing_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(checksum_file(&temp_dir.path().join("missing")).is_err());
    }
}
