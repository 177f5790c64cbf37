//! The vault engine: on-disk layout, the salt/key/label discipline, and
//! every vault operation (init, authenticate, config, create, get,
//! update, delete, destroy, list). Every secret flows through
//! `secure::SensitiveBuffer`; every persisted blob goes through
//! `cipher` and `codec`.
//!
//! Struct shape (a context owning the storage paths, handed an
//! already-authenticated passphrase + salts) follows the `Vault` pattern
//! of owning path + key material with an explicit unlock step, since
//! these nine operations share far more state across calls than a
//! one-shot encode/decode pipeline does.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use crate::cipher;
use crate::codec::{self, ItemRecord, SystemRecord, ITEM_PLAINTEXT, MAX_ITEM_NAME, MAX_OTHER_INFO, MAX_USERNAME};
use crate::error::{Error, Result};
use crate::kdf::{self, SALT_LEN};
use crate::passgen::{self, PasswordConfig, MAX_PASSWORD_LEN, MIN_PASSWORD_LEN};
use crate::rand_source;
use crate::secure::SensitiveBuffer;
use crate::ui::Prompter;

const LABEL_DATA: &str = "data";
const LABEL_NAMES: &str = "names";
const LABEL_FILES: &str = "files";

/// The fixed 12-byte nonce used for every config and item-data
/// encryption. Safe only because the paired key's salt is rotated on
/// every write — never reuse this nonce with a key whose salt is not
/// freshly drawn.
const FIXED_DATA_NONCE: [u8; cipher::NONCE_LEN] = *b"pwv-fixed-n!";

const MIN_PASSPHRASE_LEN: usize = 8;
const MAX_PASSPHRASE_LEN: usize = 63;

/// Storage paths derived once per process from the configured root.
pub struct VaultPaths {
    pub storage_dir: PathBuf,
    pub system_path: PathBuf,
    pub temp_path: PathBuf,
}

impl VaultPaths {
    pub fn new() -> Result<Self> {
        let storage_dir = storage_root()?;
        let system_path = storage_dir.join("system");
        let temp_path = storage_dir.join("temp");
        Ok(Self {
            storage_dir,
            system_path,
            temp_path,
        })
    }

    fn item_path(&self, filename: &str) -> PathBuf {
        self.storage_dir.join(filename)
    }
}

#[cfg(debug_assertions)]
fn storage_root() -> Result<PathBuf> {
    Ok(PathBuf::from("PwmStore"))
}

#[cfg(not(debug_assertions))]
fn storage_root() -> Result<PathBuf> {
    let home = std::env::var_os("HOME").ok_or_else(|| Error::internal("HOME is not set"))?;
    Ok(PathBuf::from(home).join("PwmStore"))
}

/// Everything `authenticate` hands back to a caller: the passphrase
/// itself (still needed to derive further per-operation keys), the
/// three system salts, and the loaded password-generation config.
pub struct AuthContext {
    pub passphrase: SensitiveBuffer,
    pub file_salt: [u8; SALT_LEN],
    pub name_salt: [u8; SALT_LEN],
    pub config_salt: [u8; SALT_LEN],
    pub config: PasswordConfig,
}

fn validate_printable(s: &str, field: &str, min_len: usize, max_len: usize) -> Result<()> {
    if s.len() < min_len || s.len() > max_len {
        return Err(Error::user(format!(
            "{field} must be between {min_len} and {max_len} characters, got {}",
            s.len()
        )));
    }
    if !s.bytes().all(|b| (0x20..=0x7e).contains(&b)) {
        return Err(Error::user(format!("{field} must contain only printable characters")));
    }
    Ok(())
}

fn validate_item_name(name: &str) -> Result<()> {
    validate_printable(name, "item name", 1, MAX_ITEM_NAME)
}

fn validate_passphrase(passphrase: &[u8]) -> Result<()> {
    if passphrase.len() < MIN_PASSPHRASE_LEN || passphrase.len() > MAX_PASSPHRASE_LEN {
        return Err(Error::user(format!(
            "passphrase must be between {MIN_PASSPHRASE_LEN} and {MAX_PASSPHRASE_LEN} characters"
        )));
    }
    if !passphrase.iter().all(|&b| (0x20..=0x7e).contains(&b)) {
        return Err(Error::user("passphrase must contain only printable characters"));
    }
    Ok(())
}

/// Create a fresh vault. Fails if one already exists at the configured
/// storage root.
pub fn init(paths: &VaultPaths, prompter: &mut dyn Prompter) -> Result<()> {
    if paths.system_path.exists() {
        return Err(Error::precondition("vault is already initialized"));
    }

    let passphrase = prompter.read_passphrase("Set master passphrase: ")?;
    let confirm = prompter.read_passphrase("Confirm master passphrase: ")?;
    if passphrase.len() != confirm.len() || !crate::secure::constant_time_eq(passphrase.as_slice(), confirm.as_slice())
    {
        return Err(Error::user("passphrase mismatch"));
    }
    validate_passphrase(passphrase.as_slice())?;

    let file_salt: [u8; SALT_LEN] = rand_source::bytes()?;
    let name_salt: [u8; SALT_LEN] = rand_source::bytes()?;
    let config_salt: [u8; SALT_LEN] = rand_source::bytes()?;

    let config = PasswordConfig::default();
    let config_plaintext = config.encode();

    let config_key = kdf::derive_key(passphrase.as_slice(), &config_salt, LABEL_DATA, cipher::KEY_LEN)?;
    let (config_ciphertext, config_tag) = encrypt_fixed(&config_key, &config_plaintext)?;

    codec::create_private_dir(&paths.storage_dir)?;

    let record = SystemRecord {
        file_salt,
        name_salt,
        config_salt,
        config_tag,
        config_ciphertext: config_ciphertext
            .try_into()
            .map_err(|_| Error::internal("config ciphertext has unexpected length"))?,
    };
    codec::write_file_exact(&paths.system_path, &record.encode(), 0o600)?;

    prompter.message("Vault initialized.");
    Ok(())
}

/// Authenticate against the system file, retrying with exponential
/// backoff on a wrong passphrase. Never returns `Error::AuthFailed` to
/// its own caller — that variant is only ever observed internally by
/// this loop.
pub fn authenticate(paths: &VaultPaths, prompter: &mut dyn Prompter) -> Result<AuthContext> {
    if !paths.system_path.exists() {
        return Err(Error::precondition("vault is not initialized; run `init` first"));
    }
    let raw = codec::read_file(&paths.system_path)?;
    let system = SystemRecord::decode(&raw)?;

    let mut delay = 1u64;
    loop {
        let passphrase = prompter.read_passphrase("Master passphrase: ")?;
        let config_key = kdf::derive_key(passphrase.as_slice(), &system.config_salt, LABEL_DATA, cipher::KEY_LEN)?;
        match decrypt_fixed(&config_key, &system.config_ciphertext, &system.config_tag) {
            Ok(plaintext) => {
                let config_bytes: [u8; 4] = plaintext
                    .try_into()
                    .map_err(|_| Error::corrupted("config plaintext has unexpected length"))?;
                let config = PasswordConfig::decode(&config_bytes)?;
                return Ok(AuthContext {
                    passphrase,
                    file_salt: system.file_salt,
                    name_salt: system.name_salt,
                    config_salt: system.config_salt,
                    config,
                });
            }
            Err(Error::AuthFailed) => {
                for _ in 0..delay {
                    prompter.tick();
                    thread::sleep(Duration::from_secs(1));
                }
                delay = delay.saturating_mul(2);
                continue;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Rotate the config salt/key, let the user adjust password-generation
/// settings, and atomically rewrite the system file. `fileSalt` and
/// `nameSalt` are preserved verbatim so existing items remain
/// addressable and decryptable.
pub fn config(paths: &VaultPaths, prompter: &mut dyn Prompter) -> Result<()> {
    let ctx = authenticate(paths, prompter)?;

    let use_numbers = prompter.confirm("Include numbers?", ctx.config.use_numbers)?;
    let use_letters = prompter.confirm("Include letters?", ctx.config.use_letters)?;
    let use_specials = prompter.confirm("Include special characters?", ctx.config.use_specials)?;
    let length = prompter.read_bounded_uint(
        "Generated password length: ",
        MIN_PASSWORD_LEN as u64,
        MAX_PASSWORD_LEN as u64,
    )? as u8;

    let new_config = PasswordConfig {
        use_numbers,
        use_letters,
        use_specials,
        length,
    };
    new_config.validate()?;

    let new_config_salt: [u8; SALT_LEN] = rand_source::bytes()?;
    let new_config_key = kdf::derive_key(ctx.passphrase.as_slice(), &new_config_salt, LABEL_DATA, cipher::KEY_LEN)?;
    let (config_ciphertext, config_tag) = encrypt_fixed(&new_config_key, &new_config.encode())?;

    let record = SystemRecord {
        file_salt: ctx.file_salt,
        name_salt: ctx.name_salt,
        config_salt: new_config_salt,
        config_tag,
        config_ciphertext: config_ciphertext
            .try_into()
            .map_err(|_| Error::internal("config ciphertext has unexpected length"))?,
    };
    codec::atomic_replace(&paths.system_path, &paths.temp_path, &record.encode(), 0o600)?;
    prompter.message("Settings updated.");
    Ok(())
}

fn item_filename(passphrase: &[u8], file_salt: &[u8; SALT_LEN], item_name: &str) -> Result<String> {
    let label = format!("{item_name}{LABEL_FILES}");
    kdf::derive_name(passphrase, file_salt, &label, codec::FILENAME_LEN)
}

fn pad_to(mut bytes: Vec<u8>, len: usize, what: &str) -> Result<Vec<u8>> {
    if bytes.len() > len {
        return Err(Error::internal(format!("{what} exceeds its on-disk field size")));
    }
    bytes.resize(len, 0);
    Ok(bytes)
}

fn strip_zero_padding(bytes: &[u8]) -> &[u8] {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    &bytes[..end]
}

struct ItemFields {
    username: String,
    password: SensitiveBuffer,
    other_info: String,
}

fn build_item_plaintext(fields: &ItemFields) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(ITEM_PLAINTEXT);
    buf.extend_from_slice(fields.username.as_bytes());
    buf.push(b'\n');
    buf.extend_from_slice(fields.password.as_slice());
    buf.push(b'\n');
    buf.extend_from_slice(fields.other_info.as_bytes());
    pad_to(buf, ITEM_PLAINTEXT, "item plaintext")
}

fn parse_item_plaintext(plaintext: &[u8]) -> Result<(String, SensitiveBuffer, String)> {
    let first_nl = plaintext
        .iter()
        .position(|&b| b == b'\n')
        .ok_or_else(|| Error::corrupted("item plaintext missing username separator"))?;
    let rest = &plaintext[first_nl + 1..];
    let second_nl = rest
        .iter()
        .position(|&b| b == b'\n')
        .ok_or_else(|| Error::corrupted("item plaintext missing password separator"))?;

    let username = &plaintext[..first_nl];
    let password = &rest[..second_nl];
    let other_info = strip_zero_padding(&rest[second_nl + 1..]);

    let username = std::str::from_utf8(username)
        .map_err(|_| Error::corrupted("item username is not valid UTF-8"))?
        .to_string();
    let other_info = std::str::from_utf8(other_info)
        .map_err(|_| Error::corrupted("item other-info is not valid UTF-8"))?
        .to_string();
    let password = SensitiveBuffer::from_bytes(password)?;

    Ok((username, password, other_info))
}

fn encrypt_fixed(key: &SensitiveBuffer, plaintext: &[u8]) -> Result<(Vec<u8>, [u8; cipher::TAG_LEN])> {
    let key_bytes: [u8; cipher::KEY_LEN] = key
        .as_slice()
        .try_into()
        .map_err(|_| Error::internal("derived key has unexpected length"))?;
    cipher::encrypt(&key_bytes, &FIXED_DATA_NONCE, plaintext)
}

fn decrypt_fixed(key: &SensitiveBuffer, ciphertext: &[u8], tag: &[u8; cipher::TAG_LEN]) -> Result<Vec<u8>> {
    let key_bytes: [u8; cipher::KEY_LEN] = key
        .as_slice()
        .try_into()
        .map_err(|_| Error::internal("derived key has unexpected length"))?;
    cipher::decrypt(&key_bytes, &FIXED_DATA_NONCE, ciphertext, tag)
}

/// Create a new item. Prompts for username, password (optionally drawn
/// from the password generator), and other info, then writes the item
/// record to its derived filename.
pub fn create(paths: &VaultPaths, prompter: &mut dyn Prompter, item_name: &str) -> Result<()> {
    validate_item_name(item_name)?;
    let ctx = authenticate(paths, prompter)?;

    let filename = item_filename(ctx.passphrase.as_slice(), &ctx.file_salt, item_name)?;
    let item_path = paths.item_path(&filename);
    if item_path.exists() {
        return Err(Error::precondition("an item with that name already exists"));
    }

    let username = prompter.read_line("Username: ")?;
    validate_printable(&username, "username", 0, MAX_USERNAME)?;

    let password = if prompter.confirm("Generate a password?", true)? {
        passgen::generate(&ctx.config)?
    } else {
        let entered = prompter.read_passphrase("Password: ")?;
        if entered.len() < MIN_PASSWORD_LEN as usize || entered.len() > MAX_PASSWORD_LEN as usize {
            return Err(Error::user(format!(
                "password must be between {MIN_PASSWORD_LEN} and {MAX_PASSWORD_LEN} characters"
            )));
        }
        entered
    };

    let other_info = prompter.read_line("Other info: ")?;
    validate_printable(&other_info, "other info", 0, MAX_OTHER_INFO)?;

    let fields = ItemFields {
        username,
        password,
        other_info,
    };
    let plaintext = build_item_plaintext(&fields)?;

    let data_salt: [u8; SALT_LEN] = rand_source::bytes()?;
    let data_key = kdf::derive_key(ctx.passphrase.as_slice(), &data_salt, LABEL_DATA, cipher::KEY_LEN)?;
    let (data_ciphertext, data_tag) = encrypt_fixed(&data_key, &plaintext)?;

    let name_key = kdf::derive_key(ctx.passphrase.as_slice(), &ctx.name_salt, LABEL_NAMES, cipher::KEY_LEN)?;
    let name_nonce: [u8; cipher::NONCE_LEN] = rand_source::bytes()?;
    let name_plaintext = pad_to(item_name.as_bytes().to_vec(), MAX_ITEM_NAME, "item name")?;
    let (name_ciphertext, name_tag) = {
        let key_bytes: [u8; cipher::KEY_LEN] = name_key
            .as_slice()
            .try_into()
            .map_err(|_| Error::internal("derived key has unexpected length"))?;
        cipher::encrypt(&key_bytes, &name_nonce, &name_plaintext)?
    };

    prompter.message(&format!("About to create item \"{item_name}\" for user \"{}\"", fields.username));
    if !prompter.confirm("Save this item?", true)? {
        return Ok(());
    }

    let record = ItemRecord {
        name_nonce,
        name_tag,
        name_ciphertext: name_ciphertext
            .try_into()
            .map_err(|_| Error::internal("name ciphertext has unexpected length"))?,
        data_salt,
        data_tag,
        data_ciphertext: data_ciphertext
            .try_into()
            .map_err(|_| Error::internal("data ciphertext has unexpected length"))?,
    };
    codec::write_file_exact(&item_path, &record.encode(), 0o600)?;
    prompter.message("Item created.");
    Ok(())
}

fn read_item_record(item_path: &Path) -> Result<ItemRecord> {
    if !item_path.exists() {
        return Err(Error::precondition("no such item"));
    }
    let raw = codec::read_file(item_path)?;
    ItemRecord::decode(&raw)
}

/// Decrypt and display a single item's username, password, and other
/// info.
pub fn get(paths: &VaultPaths, prompter: &mut dyn Prompter, item_name: &str) -> Result<()> {
    validate_item_name(item_name)?;
    let ctx = authenticate(paths, prompter)?;

    let filename = item_filename(ctx.passphrase.as_slice(), &ctx.file_salt, item_name)?;
    let item_path = paths.item_path(&filename);
    let record = read_item_record(&item_path)?;

    let data_key = kdf::derive_key(ctx.passphrase.as_slice(), &record.data_salt, LABEL_DATA, cipher::KEY_LEN)?;
    let plaintext = decrypt_fixed(&data_key, &record.data_ciphertext, &record.data_tag).map_err(|e| match e {
        Error::AuthFailed => Error::corrupted("item data failed integrity verification"),
        other => other,
    })?;
    let (username, password, other_info) = parse_item_plaintext(&plaintext)?;

    prompter.message(&format!("Name:     {item_name}"));
    prompter.message(&format!("Username: {username}"));
    prompter.message(&format!(
        "Password: {}",
        String::from_utf8_lossy(password.as_slice())
    ));
    prompter.message(&format!("Other:    {other_info}"));
    Ok(())
}

/// Interactively change username, password, and/or other info for an
/// item. Username and other-info field choices re-prompt for new
/// values; password can be typed or regenerated. The name encryption
/// prefix (`nameNonce`/`nameTag`/`nameCiphertext`) is preserved
/// byte-for-byte from the existing file.
pub fn update(paths: &VaultPaths, prompter: &mut dyn Prompter, item_name: &str) -> Result<()> {
    validate_item_name(item_name)?;
    let ctx = authenticate(paths, prompter)?;

    let filename = item_filename(ctx.passphrase.as_slice(), &ctx.file_salt, item_name)?;
    let item_path = paths.item_path(&filename);
    let record = read_item_record(&item_path)?;

    let data_key = kdf::derive_key(ctx.passphrase.as_slice(), &record.data_salt, LABEL_DATA, cipher::KEY_LEN)?;
    let plaintext = decrypt_fixed(&data_key, &record.data_ciphertext, &record.data_tag).map_err(|e| match e {
        Error::AuthFailed => Error::corrupted("item data failed integrity verification"),
        other => other,
    })?;
    let (mut username, mut password, mut other_info) = parse_item_plaintext(&plaintext)?;

    let mut changed = false;
    loop {
        let choice = prompter
            .read_line("Change [u]sername, [p]assword, [o]ther info, or [d]one? ")?
            .trim()
            .to_ascii_lowercase();
        match choice.as_str() {
            "u" | "username" => {
                username = prompter.read_line("New username: ")?;
                validate_printable(&username, "username", 0, MAX_USERNAME)?;
                changed = true;
            }
            "p" | "password" => {
                password = if prompter.confirm("Generate a password?", true)? {
                    passgen::generate(&ctx.config)?
                } else {
                    let entered = prompter.read_passphrase("New password: ")?;
                    if entered.len() < MIN_PASSWORD_LEN as usize || entered.len() > MAX_PASSWORD_LEN as usize {
                        return Err(Error::user(format!(
                            "password must be between {MIN_PASSWORD_LEN} and {MAX_PASSWORD_LEN} characters"
                        )));
                    }
                    entered
                };
                changed = true;
            }
            "o" | "other" | "other info" => {
                other_info = prompter.read_line("New other info: ")?;
                validate_printable(&other_info, "other info", 0, MAX_OTHER_INFO)?;
                changed = true;
            }
            "d" | "done" => break,
            _ => prompter.message("Please answer u, p, o, or d."),
        }
    }

    if !changed {
        prompter.message("No changes made.");
        return Ok(());
    }

    let fields = ItemFields {
        username,
        password,
        other_info,
    };
    let plaintext = build_item_plaintext(&fields)?;

    let new_data_salt: [u8; SALT_LEN] = rand_source::bytes()?;
    let new_data_key = kdf::derive_key(ctx.passphrase.as_slice(), &new_data_salt, LABEL_DATA, cipher::KEY_LEN)?;
    let (data_ciphertext, data_tag) = encrypt_fixed(&new_data_key, &plaintext)?;

    let new_record = ItemRecord {
        name_nonce: record.name_nonce,
        name_tag: record.name_tag,
        name_ciphertext: record.name_ciphertext,
        data_salt: new_data_salt,
        data_tag,
        data_ciphertext: data_ciphertext
            .try_into()
            .map_err(|_| Error::internal("data ciphertext has unexpected length"))?,
    };
    codec::atomic_replace(&item_path, &paths.temp_path, &new_record.encode(), 0o600)?;
    prompter.message("Item updated.");
    Ok(())
}

/// Delete a single item after confirmation.
pub fn delete(paths: &VaultPaths, prompter: &mut dyn Prompter, item_name: &str) -> Result<()> {
    validate_item_name(item_name)?;
    let ctx = authenticate(paths, prompter)?;
    let filename = item_filename(ctx.passphrase.as_slice(), &ctx.file_salt, item_name)?;
    let item_path = paths.item_path(&filename);
    if !item_path.exists() {
        return Err(Error::precondition("no such item"));
    }
    if !prompter.confirm(&format!("Delete item \"{item_name}\"?"), false)? {
        return Ok(());
    }
    std::fs::remove_file(&item_path).map_err(|e| Error::internal(format!("unlink {}: {e}", item_path.display())))?;
    prompter.message("Item deleted.");
    Ok(())
}

/// Destroy the entire vault: double confirmation, authentication, then
/// recursive removal of the storage directory.
pub fn destroy(paths: &VaultPaths, prompter: &mut dyn Prompter) -> Result<()> {
    if !prompter.confirm("This will permanently delete the entire vault. Continue?", false)? {
        return Ok(());
    }
    if !prompter.confirm("Are you absolutely sure? This cannot be undone.", false)? {
        return Ok(());
    }
    authenticate(paths, prompter)?;
    codec::remove_tree(&paths.storage_dir)?;
    prompter.message("Vault destroyed.");
    Ok(())
}

/// Recover and print every item's plaintext name, sorted
/// lexicographically so directory order never leaks into the listing.
pub fn list(paths: &VaultPaths, prompter: &mut dyn Prompter) -> Result<()> {
    let ctx = authenticate(paths, prompter)?;
    let name_key = kdf::derive_key(ctx.passphrase.as_slice(), &ctx.name_salt, LABEL_NAMES, cipher::KEY_LEN)?;
    let key_bytes: [u8; cipher::KEY_LEN] = name_key
        .as_slice()
        .try_into()
        .map_err(|_| Error::internal("derived key has unexpected length"))?;

    let mut names = Vec::new();
    for entry in std::fs::read_dir(&paths.storage_dir)
        .map_err(|e| Error::internal(format!("readdir {}: {e}", paths.storage_dir.display())))?
    {
        let entry = entry.map_err(|e| Error::internal(format!("readdir entry: {e}")))?;
        let file_name = entry.file_name();
        let file_name = file_name.to_string_lossy();
        if !is_item_filename(&file_name) {
            continue;
        }

        let raw = codec::read_file(&entry.path())?;
        let record = ItemRecord::decode(&raw)?;
        let plaintext = cipher::decrypt(&key_bytes, &record.name_nonce, &record.name_ciphertext, &record.name_tag)
            .map_err(|e| match e {
                Error::AuthFailed => Error::corrupted("item name failed integrity verification"),
                other => other,
            })?;
        let name = std::str::from_utf8(strip_zero_padding(&plaintext))
            .map_err(|_| Error::corrupted("item name is not valid UTF-8"))?
            .to_string();
        names.push(name);
    }

    names.sort();
    for name in &names {
        prompter.message(name);
    }
    Ok(())
}

fn is_item_filename(name: &str) -> bool {
    name.len() == codec::FILENAME_LEN - 1
        && name.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::ScriptedPrompter;

    fn test_paths() -> (tempfile::TempDir, VaultPaths) {
        let dir = tempfile::tempdir().unwrap();
        let storage_dir = dir.path().join("store");
        let paths = VaultPaths {
            system_path: storage_dir.join("system"),
            temp_path: storage_dir.join("temp"),
            storage_dir,
        };
        (dir, paths)
    }

    #[test]
    fn item_plaintext_roundtrips() {
        let fields = ItemFields {
            username: "alice".into(),
            password: SensitiveBuffer::from_bytes(b"Hunter2!hunter2!hunter2!").unwrap(),
            other_info: "work account".into(),
        };
        let plaintext = build_item_plaintext(&fields).unwrap();
        assert_eq!(plaintext.len(), ITEM_PLAINTEXT);
        let (username, password, other_info) = parse_item_plaintext(&plaintext).unwrap();
        assert_eq!(username, "alice");
        assert_eq!(password.as_slice(), b"Hunter2!hunter2!hunter2!");
        assert_eq!(other_info, "work account");
    }

    const MASTER: &str = "correct horse battery";

    #[test]
    fn init_then_create_then_get_roundtrips() {
        let (_dir, paths) = test_paths();

        let mut prompter = ScriptedPrompter::new().with_passphrases([MASTER, MASTER]);
        init(&paths, &mut prompter).unwrap();

        let mut prompter = ScriptedPrompter::new()
            .with_passphrases([MASTER, "ItemPassw0rd!"])
            .with_lines(["alice", "work account"])
            .with_confirms([false, true]);
        create(&paths, &mut prompter, "github").unwrap();

        let mut prompter = ScriptedPrompter::new().with_passphrases([MASTER]);
        get(&paths, &mut prompter, "github").unwrap();
        assert!(prompter.messages.iter().any(|m| m.contains("alice")));
        assert!(prompter.messages.iter().any(|m| m.contains("ItemPassw0rd!")));
        assert!(prompter.messages.iter().any(|m| m.contains("work account")));
    }

    #[test]
    fn create_rejects_duplicate_item_name() {
        let (_dir, paths) = test_paths();
        let mut prompter = ScriptedPrompter::new().with_passphrases([MASTER, MASTER]);
        init(&paths, &mut prompter).unwrap();

        let mut prompter = ScriptedPrompter::new()
            .with_passphrases([MASTER])
            .with_lines(["alice", ""])
            .with_confirms([true]);
        create(&paths, &mut prompter, "github").unwrap();

        let mut prompter = ScriptedPrompter::new().with_passphrases([MASTER]);
        let err = create(&paths, &mut prompter, "github").unwrap_err();
        assert!(matches!(err, Error::Precondition(_)));
    }

    #[test]
    fn list_returns_sorted_plaintext_names() {
        let (_dir, paths) = test_paths();
        let mut prompter = ScriptedPrompter::new().with_passphrases([MASTER, MASTER]);
        init(&paths, &mut prompter).unwrap();

        for name in ["zebra", "apple"] {
            let mut prompter = ScriptedPrompter::new()
                .with_passphrases([MASTER])
                .with_lines(["bob", ""])
                .with_confirms([true]);
            create(&paths, &mut prompter, name).unwrap();
        }

        let mut prompter = ScriptedPrompter::new().with_passphrases([MASTER]);
        list(&paths, &mut prompter).unwrap();
        assert_eq!(prompter.messages, vec!["apple".to_string(), "zebra".to_string()]);
    }

    #[test]
    fn delete_removes_item() {
        let (_dir, paths) = test_paths();
        let mut prompter = ScriptedPrompter::new().with_passphrases([MASTER, MASTER]);
        init(&paths, &mut prompter).unwrap();

        let mut prompter = ScriptedPrompter::new()
            .with_passphrases([MASTER])
            .with_lines(["bob", ""])
            .with_confirms([true]);
        create(&paths, &mut prompter, "site").unwrap();

        let mut prompter = ScriptedPrompter::new().with_passphrases([MASTER]).with_confirms([true]);
        delete(&paths, &mut prompter, "site").unwrap();

        let mut prompter = ScriptedPrompter::new().with_passphrases([MASTER]);
        let err = get(&paths, &mut prompter, "site").unwrap_err();
        assert!(matches!(err, Error::Precondition(_)));
    }

    #[test]
    fn destroy_removes_storage_dir() {
        let (_dir, paths) = test_paths();
        let mut prompter = ScriptedPrompter::new().with_passphrases([MASTER, MASTER]);
        init(&paths, &mut prompter).unwrap();

        let mut prompter = ScriptedPrompter::new()
            .with_passphrases([MASTER])
            .with_confirms([true, true]);
        destroy(&paths, &mut prompter).unwrap();
        assert!(!paths.storage_dir.exists());
    }
}
