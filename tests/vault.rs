//! End-to-end scenarios against the vault engine, driven by
//! `ScriptedPrompter` so they run without a real terminal. Mirrors the
//! concrete walkthroughs that motivated the on-disk format: init+get,
//! wrong-passphrase backoff, update preserving the item's identity,
//! sorted listing, destroy, and tamper detection.

use pwv::codec::{SystemRecord, ITEM_RECORD_LEN};
use pwv::error::Error;
use pwv::ui::ScriptedPrompter;
use pwv::vault::{self, VaultPaths};

const MASTER: &str = "correct horse battery";

fn fresh_paths(dir: &tempfile::TempDir) -> VaultPaths {
    let storage_dir = dir.path().join("store");
    VaultPaths {
        system_path: storage_dir.join("system"),
        temp_path: storage_dir.join("temp"),
        storage_dir,
    }
}

fn init_default(paths: &VaultPaths) {
    let mut prompter = ScriptedPrompter::new().with_passphrases([MASTER, MASTER]);
    vault::init(paths, &mut prompter).unwrap();
}

fn only_item_file(paths: &VaultPaths) -> std::path::PathBuf {
    std::fs::read_dir(&paths.storage_dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .find(|p| p != &paths.system_path && p != &paths.temp_path)
        .expect("exactly one item file")
}

#[test]
fn s1_init_and_get_roundtrip_all_three_fields() {
    let dir = tempfile::tempdir().unwrap();
    let paths = fresh_paths(&dir);
    init_default(&paths);

    let mut prompter = ScriptedPrompter::new()
        .with_passphrases([MASTER, "Hunter2!hunter2!hunter2!A"])
        .with_lines(["alice", "work account"])
        .with_confirms([false, true]);
    vault::create(&paths, &mut prompter, "github").unwrap();

    let mut prompter = ScriptedPrompter::new().with_passphrases([MASTER]);
    vault::get(&paths, &mut prompter, "github").unwrap();

    assert!(prompter.messages.iter().any(|m| m.contains("alice")));
    assert!(prompter
        .messages
        .iter()
        .any(|m| m.contains("Hunter2!hunter2!hunter2!A")));
    assert!(prompter.messages.iter().any(|m| m.contains("work account")));
}

#[test]
fn s2_wrong_passphrase_backs_off_then_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let paths = fresh_paths(&dir);
    init_default(&paths);

    let mut prompter = ScriptedPrompter::new()
        .with_passphrases([MASTER])
        .with_lines(["alice", ""])
        .with_confirms([true]);
    vault::create(&paths, &mut prompter, "github").unwrap();

    // Wrong passphrase first, then the correct one. The retry loop
    // ticks once per backoff second before re-prompting; we only assert
    // it eventually succeeds and that it consumed both scripted inputs.
    let mut prompter =
        ScriptedPrompter::new().with_passphrases([format!("{MASTER}x"), MASTER.to_string()]);
    vault::get(&paths, &mut prompter, "github").unwrap();
    assert!(prompter.ticks >= 1);
    assert!(prompter.messages.iter().any(|m| m.contains("alice")));
}

#[test]
fn s3_update_preserves_name_encryption_prefix() {
    let dir = tempfile::tempdir().unwrap();
    let paths = fresh_paths(&dir);
    init_default(&paths);

    let mut prompter = ScriptedPrompter::new()
        .with_passphrases([MASTER, "OldPassw0rd!!"])
        .with_lines(["alice", "notes"])
        .with_confirms([false, true]);
    vault::create(&paths, &mut prompter, "github").unwrap();

    let item_path = only_item_file(&paths);
    let before = std::fs::read(&item_path).unwrap();
    assert_eq!(before.len(), ITEM_RECORD_LEN);

    let mut prompter = ScriptedPrompter::new()
        .with_passphrases([MASTER, "NewPassw0rd!!"])
        .with_lines(["p", "d"])
        .with_confirms([false]);
    vault::update(&paths, &mut prompter, "github").unwrap();

    let after = std::fs::read(&item_path).unwrap();
    // format version + name nonce + name tag + name ciphertext: the
    // prefix that encodes the item's identity, untouched by a
    // password-only update.
    let name_prefix_len = 1 + 12 + 16 + 100;
    assert_eq!(before[..name_prefix_len], after[..name_prefix_len]);
    assert_ne!(before, after);

    let mut prompter = ScriptedPrompter::new().with_passphrases([MASTER]);
    vault::get(&paths, &mut prompter, "github").unwrap();
    assert!(prompter.messages.iter().any(|m| m.contains("alice")));
    assert!(prompter.messages.iter().any(|m| m.contains("NewPassw0rd!!")));
    assert!(prompter.messages.iter().any(|m| m.contains("notes")));
}

#[test]
fn s4_list_is_lexicographically_sorted() {
    let dir = tempfile::tempdir().unwrap();
    let paths = fresh_paths(&dir);
    init_default(&paths);

    for name in ["zeta", "alpha", "mu"] {
        let mut prompter = ScriptedPrompter::new()
            .with_passphrases([MASTER])
            .with_lines(["bob", ""])
            .with_confirms([true]);
        vault::create(&paths, &mut prompter, name).unwrap();
    }

    let mut prompter = ScriptedPrompter::new().with_passphrases([MASTER]);
    vault::list(&paths, &mut prompter).unwrap();
    assert_eq!(
        prompter.messages,
        vec!["alpha".to_string(), "mu".to_string(), "zeta".to_string()]
    );
}

#[test]
fn s5_destroy_removes_storage_directory() {
    let dir = tempfile::tempdir().unwrap();
    let paths = fresh_paths(&dir);
    init_default(&paths);

    let mut prompter = ScriptedPrompter::new()
        .with_passphrases([MASTER])
        .with_confirms([true, true]);
    vault::destroy(&paths, &mut prompter).unwrap();
    assert!(!paths.storage_dir.exists());
}

#[test]
fn s6_tampered_ciphertext_reports_corruption_not_plaintext() {
    let dir = tempfile::tempdir().unwrap();
    let paths = fresh_paths(&dir);
    init_default(&paths);

    let mut prompter = ScriptedPrompter::new()
        .with_passphrases([MASTER])
        .with_lines(["alice", "secret note"])
        .with_confirms([true]);
    vault::create(&paths, &mut prompter, "github").unwrap();

    let item_path = only_item_file(&paths);
    let mut bytes = std::fs::read(&item_path).unwrap();
    // Flip one byte inside dataCiphertext, well past the fixed header.
    let flip_at = bytes.len() - 1;
    bytes[flip_at] ^= 0x01;
    std::fs::write(&item_path, &bytes).unwrap();

    let mut prompter = ScriptedPrompter::new().with_passphrases([MASTER]);
    let err = vault::get(&paths, &mut prompter, "github").unwrap_err();
    assert!(matches!(err, Error::DataCorrupted(_)));
    assert!(!prompter.messages.iter().any(|m| m.contains("alice")));
    assert!(!prompter.messages.iter().any(|m| m.contains("secret note")));
}

#[test]
fn s7_config_rotates_config_salt_keeps_file_and_name_salts_and_existing_item_readable() {
    let dir = tempfile::tempdir().unwrap();
    let paths = fresh_paths(&dir);
    init_default(&paths);

    let mut prompter = ScriptedPrompter::new()
        .with_passphrases([MASTER, "Hunter2!hunter2!hunter2!A"])
        .with_lines(["alice", "work account"])
        .with_confirms([false, true]);
    vault::create(&paths, &mut prompter, "github").unwrap();

    let before = SystemRecord::decode(&std::fs::read(&paths.system_path).unwrap()).unwrap();

    let mut prompter = ScriptedPrompter::new()
        .with_passphrases([MASTER])
        .with_confirms([false, true, true])
        .with_uints([24]);
    vault::config(&paths, &mut prompter).unwrap();

    let after = SystemRecord::decode(&std::fs::read(&paths.system_path).unwrap()).unwrap();

    assert_ne!(before.config_salt, after.config_salt);
    assert_ne!(before.config_ciphertext, after.config_ciphertext);
    assert_eq!(before.file_salt, after.file_salt);
    assert_eq!(before.name_salt, after.name_salt);

    let mut prompter = ScriptedPrompter::new().with_passphrases([MASTER]);
    vault::get(&paths, &mut prompter, "github").unwrap();
    assert!(prompter.messages.iter().any(|m| m.contains("alice")));
    assert!(prompter
        .messages
        .iter()
        .any(|m| m.contains("Hunter2!hunter2!hunter2!A")));
}
