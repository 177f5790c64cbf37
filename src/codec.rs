//! Fixed-offset on-disk record layout for the system file and item
//! files, plus the write discipline every persistence path shares:
//! retry-on-EINTR, fsync before returning, and atomic replacement via
//! write-to-temp-then-rename.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

use crate::error::{Error, Result};

pub const KEY_LEN: usize = 32;
pub const TAG_LEN: usize = 16;
pub const SALT_LEN: usize = 32;
pub const NONCE_LEN: usize = 12;

pub const MAX_ITEM_NAME: usize = 100;
pub const MAX_USERNAME: usize = 100;
pub const MAX_PASSWORD_SIZE: usize = 64;
pub const MAX_OTHER_INFO: usize = 300;
pub const ITEM_PLAINTEXT: usize = MAX_ITEM_NAME + MAX_USERNAME + MAX_PASSWORD_SIZE + MAX_OTHER_INFO;
pub const CONFIG_LEN: usize = 4;
pub const FILENAME_LEN: usize = 65;

pub const FORMAT_VERSION: u8 = 1;

pub const SYSTEM_RECORD_LEN: usize = 1 + 3 * SALT_LEN + TAG_LEN + CONFIG_LEN;
pub const ITEM_RECORD_LEN: usize =
    1 + NONCE_LEN + TAG_LEN + MAX_ITEM_NAME + SALT_LEN + TAG_LEN + ITEM_PLAINTEXT;

/// The vault's single system record: three salts, the encrypted
/// password-generation config, and its tag.
#[derive(Clone)]
pub struct SystemRecord {
    pub file_salt: [u8; SALT_LEN],
    pub name_salt: [u8; SALT_LEN],
    pub config_salt: [u8; SALT_LEN],
    pub config_tag: [u8; TAG_LEN],
    pub config_ciphertext: [u8; CONFIG_LEN],
}

impl SystemRecord {
    pub fn encode(&self) -> [u8; SYSTEM_RECORD_LEN] {
        let mut out = [0u8; SYSTEM_RECORD_LEN];
        let mut at = 0;
        put(&mut out, &mut at, &[FORMAT_VERSION]);
        put(&mut out, &mut at, &self.file_salt);
        put(&mut out, &mut at, &self.name_salt);
        put(&mut out, &mut at, &self.config_salt);
        put(&mut out, &mut at, &self.config_tag);
        put(&mut out, &mut at, &self.config_ciphertext);
        debug_assert_eq!(at, SYSTEM_RECORD_LEN);
        out
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() != SYSTEM_RECORD_LEN {
            return Err(Error::corrupted(format!(
                "system record has wrong length: expected {SYSTEM_RECORD_LEN}, got {}",
                buf.len()
            )));
        }
        let mut at = 0;
        let version = take1(buf, &mut at);
        if version != FORMAT_VERSION {
            return Err(Error::corrupted(format!(
                "unsupported system record version {version}"
            )));
        }
        let file_salt = take(buf, &mut at);
        let name_salt = take(buf, &mut at);
        let config_salt = take(buf, &mut at);
        let config_tag = take(buf, &mut at);
        let config_ciphertext = take(buf, &mut at);
        Ok(Self {
            file_salt,
            name_salt,
            config_salt,
            config_tag,
            config_ciphertext,
        })
    }
}

/// One stored item: the encrypted item name (random nonce, stable across
/// updates) and the encrypted item data (fixed nonce, fresh salt per
/// write).
#[derive(Clone)]
pub struct ItemRecord {
    pub name_nonce: [u8; NONCE_LEN],
    pub name_tag: [u8; TAG_LEN],
    pub name_ciphertext: [u8; MAX_ITEM_NAME],
    pub data_salt: [u8; SALT_LEN],
    pub data_tag: [u8; TAG_LEN],
    pub data_ciphertext: [u8; ITEM_PLAINTEXT],
}

impl ItemRecord {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = vec![0u8; ITEM_RECORD_LEN];
        let mut at = 0;
        put(&mut out, &mut at, &[FORMAT_VERSION]);
        put(&mut out, &mut at, &self.name_nonce);
        put(&mut out, &mut at, &self.name_tag);
        put(&mut out, &mut at, &self.name_ciphertext);
        put(&mut out, &mut at, &self.data_salt);
        put(&mut out, &mut at, &self.data_tag);
        put(&mut out, &mut at, &self.data_ciphertext);
        debug_assert_eq!(at, ITEM_RECORD_LEN);
        out
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() != ITEM_RECORD_LEN {
            return Err(Error::corrupted(format!(
                "item record has wrong length: expected {ITEM_RECORD_LEN}, got {}",
                buf.len()
            )));
        }
        let mut at = 0;
        let version = take1(buf, &mut at);
        if version != FORMAT_VERSION {
            return Err(Error::corrupted(format!(
                "unsupported item record version {version}"
            )));
        }
        let name_nonce = take(buf, &mut at);
        let name_tag = take(buf, &mut at);
        let name_ciphertext = take(buf, &mut at);
        let data_salt = take(buf, &mut at);
        let data_tag = take(buf, &mut at);
        let data_ciphertext = take(buf, &mut at);
        Ok(Self {
            name_nonce,
            name_tag,
            name_ciphertext,
            data_salt,
            data_tag,
            data_ciphertext,
        })
    }
}

fn put(out: &mut [u8], at: &mut usize, field: &[u8]) {
    out[*at..*at + field.len()].copy_from_slice(field);
    *at += field.len();
}

fn take<const N: usize>(buf: &[u8], at: &mut usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&buf[*at..*at + N]);
    *at += N;
    out
}

fn take1(buf: &[u8], at: &mut usize) -> u8 {
    let b = buf[*at];
    *at += 1;
    b
}

/// Read a file's exact contents, retrying on `EINTR`. A short read (file
/// shorter than expected) is the caller's concern — this just hands back
/// whatever bytes are actually on disk.
pub fn read_file(path: &Path) -> Result<Vec<u8>> {
    let mut file = open_retrying(path)?;
    let mut buf = Vec::new();
    loop {
        match file.read_to_end(&mut buf) {
            Ok(_) => return Ok(buf),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::internal(format!("read {}: {e}", path.display()))),
        }
    }
}

fn open_retrying(path: &Path) -> Result<File> {
    loop {
        match File::open(path) {
            Ok(f) => return Ok(f),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::internal(format!("open {}: {e}", path.display()))),
        }
    }
}

/// Write `bytes` to `path` with mode `0600`, retrying interrupted writes,
/// then fsync before returning. Truncates/creates as needed.
pub fn write_file_exact(path: &Path, bytes: &[u8], mode: u32) -> Result<()> {
    let mut file = loop {
        match OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(mode)
            .open(path)
        {
            Ok(f) => break f,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::internal(format!("create {}: {e}", path.display()))),
        }
    };

    let mut remaining = bytes;
    while !remaining.is_empty() {
        match file.write(remaining) {
            Ok(0) => return Err(Error::internal(format!("short write to {}", path.display()))),
            Ok(n) => remaining = &remaining[n..],
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::internal(format!("write {}: {e}", path.display()))),
        }
    }

    loop {
        match file.sync_all() {
            Ok(()) => break,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::internal(format!("fsync {}: {e}", path.display()))),
        }
    }

    Ok(())
}

/// Write `bytes` to `temp_path` and atomically rename it over
/// `target_path`. Used by every vault operation that replaces an
/// existing file in place (config rewrite, item update).
pub fn atomic_replace(target_path: &Path, temp_path: &Path, bytes: &[u8], mode: u32) -> Result<()> {
    write_file_exact(temp_path, bytes, mode)?;
    fs::rename(temp_path, target_path)
        .map_err(|e| Error::internal(format!("rename {} -> {}: {e}", temp_path.display(), target_path.display())))
}

/// Create a directory with mode `0700` (owner read/write/execute only).
/// Tolerates the directory already existing (a previous `init` may have
/// created it before failing to write the system file).
pub fn create_private_dir(path: &Path) -> Result<()> {
    match fs::create_dir(path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
        Err(e) => return Err(Error::internal(format!("mkdir {}: {e}", path.display()))),
    }
    fs::set_permissions(path, std::os::unix::fs::PermissionsExt::from_mode(0o700))
        .map_err(|e| Error::internal(format!("chmod {}: {e}", path.display())))
}

/// Recursively remove a directory tree. Regular files and symlinks are
/// unlinked directly (a symlink is never followed — `remove_file`
/// removes the link itself); directories are traversed physically and
/// their children removed before the directory itself, so a symlink
/// pointing back into the tree can never cause a file outside it to be
/// deleted.
pub fn remove_tree(path: &Path) -> Result<()> {
    for entry in fs::read_dir(path).map_err(|e| Error::internal(format!("readdir {}: {e}", path.display())))? {
        let entry = entry.map_err(|e| Error::internal(format!("readdir entry: {e}")))?;
        let child = entry.path();
        let file_type = entry
            .file_type()
            .map_err(|e| Error::internal(format!("stat {}: {e}", child.display())))?;
        if file_type.is_dir() {
            remove_tree(&child)?;
            fs::remove_dir(&child).map_err(|e| Error::internal(format!("rmdir {}: {e}", child.display())))?;
        } else {
            fs::remove_file(&child).map_err(|e| Error::internal(format!("unlink {}: {e}", child.display())))?;
        }
    }
    fs::remove_dir(path).map_err(|e| Error::internal(format!("rmdir {}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_record_roundtrip() {
        let rec = SystemRecord {
            file_salt: [1u8; SALT_LEN],
            name_salt: [2u8; SALT_LEN],
            config_salt: [3u8; SALT_LEN],
            config_tag: [4u8; TAG_LEN],
            config_ciphertext: [5u8; CONFIG_LEN],
        };
        let encoded = rec.encode();
        assert_eq!(encoded.len(), SYSTEM_RECORD_LEN);
        let decoded = SystemRecord::decode(&encoded).unwrap();
        assert_eq!(decoded.file_salt, rec.file_salt);
        assert_eq!(decoded.name_salt, rec.name_salt);
        assert_eq!(decoded.config_salt, rec.config_salt);
        assert_eq!(decoded.config_tag, rec.config_tag);
        assert_eq!(decoded.config_ciphertext, rec.config_ciphertext);
    }

    #[test]
    fn item_record_roundtrip() {
        let rec = ItemRecord {
            name_nonce: [9u8; NONCE_LEN],
            name_tag: [8u8; TAG_LEN],
            name_ciphertext: [7u8; MAX_ITEM_NAME],
            data_salt: [6u8; SALT_LEN],
            data_tag: [5u8; TAG_LEN],
            data_ciphertext: [4u8; ITEM_PLAINTEXT],
        };
        let encoded = rec.encode();
        assert_eq!(encoded.len(), ITEM_RECORD_LEN);
        let decoded = ItemRecord::decode(&encoded).unwrap();
        assert_eq!(decoded.name_nonce, rec.name_nonce);
        assert_eq!(decoded.data_ciphertext.as_slice(), rec.data_ciphertext.as_slice());
    }

    #[test]
    fn rejects_wrong_version() {
        let rec = SystemRecord {
            file_salt: [0u8; SALT_LEN],
            name_salt: [0u8; SALT_LEN],
            config_salt: [0u8; SALT_LEN],
            config_tag: [0u8; TAG_LEN],
            config_ciphertext: [0u8; CONFIG_LEN],
        };
        let mut encoded = rec.encode();
        encoded[0] = 0xFF;
        assert!(SystemRecord::decode(&encoded).is_err());
    }

    #[test]
    fn rejects_short_buffer() {
        assert!(SystemRecord::decode(&[0u8; 10]).is_err());
        assert!(ItemRecord::decode(&[0u8; 10]).is_err());
    }

    #[test]
    fn atomic_replace_leaves_target_with_new_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("system");
        let temp = dir.path().join("temp");
        write_file_exact(&target, b"old", 0o600).unwrap();
        atomic_replace(&target, &temp, b"new", 0o600).unwrap();
        assert_eq!(read_file(&target).unwrap(), b"new");
        assert!(!temp.exists());
    }
}
