//! Concatenate source files while checksumming the same byte stream.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crc32fast::Hasher;

use crate::error::{MendError, Result};

/// Writer that forwards to `inner` and feeds every byte it accepted to a CRC-32.
struct HashingWriter<'a, W: Write + ?Sized> {
    inner: &'a mut W,
    hasher: Hasher,
}

impl<W: Write + ?Sized> Write for HashingWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Copy `files` into `dst` in order and return the CRC-32 (IEEE) of everything copied.
///
/// Stops at the first file that cannot be opened or read. `dst` may then hold
/// a prefix of the concatenation and must be discarded by the caller.
pub fn concat_and_hash<W, P>(dst: &mut W, files: &[P]) -> Result<u32>
where
    W: Write + ?Sized,
    P: AsRef<Path>,
{
    let mut writer = HashingWriter {
        inner: dst,
        hasher: Hasher::new(),
    };

    for path in files {
        let path = path.as_ref();
        let read_err = |source| MendError::Read {
            path: path.to_path_buf(),
            source,
        };
        let mut file = File::open(path).map_err(read_err)?;
        io::copy(&mut file, &mut writer).map_err(read_err)?;
    }

    Ok(writer.hasher.finalize())
}

/// Concatenate into a fresh buffer. Returns `(bytes, checksum)`.
pub fn concat_files(files: &[PathBuf]) -> Result<(Vec<u8>, u32)> {
    let mut buffer = Vec::with_capacity(1024);
    let hash = concat_and_hash(&mut buffer, files)?;
    Ok((buffer, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_concat_in_order() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a.js", "var a = 1;\n");
        let b = write(&dir, "b.js", "var b = 2;\n");

        let (bytes, hash) = concat_files(&[a.clone(), b.clone()]).unwrap();
        assert_eq!(bytes, b"var a = 1;\nvar b = 2;\n");
        assert_eq!(hash, crc32fast::hash(&bytes));

        let (reversed, reversed_hash) = concat_files(&[b, a]).unwrap();
        assert_eq!(reversed, b"var b = 2;\nvar a = 1;\n");
        assert_ne!(hash, reversed_hash);
    }

    #[test]
    fn test_known_checksum() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "check.txt", "123456789");
        let (_, hash) = concat_files(&[path]).unwrap();
        // CRC-32/ISO-HDLC check value
        assert_eq!(hash, 0xcbf4_3926);
    }

    #[test]
    fn test_empty_list() {
        let (bytes, hash) = concat_files(&[]).unwrap();
        assert!(bytes.is_empty());
        assert_eq!(hash, 0);
    }

    #[test]
    fn test_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a.js", "a");
        let missing = dir.path().join("missing.js");

        let mut sink = Vec::new();
        let err = concat_and_hash(&mut sink, &[a, missing.clone()]).unwrap_err();
        match err {
            MendError::Read { path, .. } => assert_eq!(path, missing),
            other => panic!("unexpected error: {other}"),
        }
        // prefix already copied; caller is responsible for discarding it
        assert_eq!(sink, b"a");
    }
}
