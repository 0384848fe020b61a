use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use epoch123::fsops;
use epoch123::library::{MetaRecord, MetaStore};

fn make_temp_dir(tag: &str) -> PathBuf {
    static NEXT_ID: AtomicU64 = AtomicU64::new(1);
    let now_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let seq = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    let mut dir = std::env::temp_dir();
    dir.push(format!(
        "epoch123_{tag}_{}_{}_{}",
        std::process::id(),
        now_ms,
        seq
    ));
    std::fs::create_dir_all(&dir).expect("create temp test dir");
    dir
}

fn write_tiny_wav(path: &Path) {
    epoch123::audio_io::write_wav_mono(path, &[0.1, -0.1, 0.2, -0.2], 8_000).expect("write wav");
}

fn record() -> MetaRecord {
    MetaRecord {
        file_size: 128,
        duration_secs: 0.5,
        channels: 1,
        sample_rate: 8_000,
        description: String::new(),
        tags: Vec::new(),
    }
}

#[test]
fn meta_store_survives_reopen() {
    let dir = make_temp_dir("store_reopen");
    write_tiny_wav(&dir.join("kick.wav"));
    {
        let mut store = MetaStore::open(&dir).expect("open");
        store.upsert("kick.wav", record());
        assert!(store.add_tag("kick.wav", "drum"));
        assert!(store.set_description("kick.wav", "punchy 808"));
        assert!(!store.set_description("kick.wav", "punchy 808"));
        store.save().expect("save");
    }
    let store = MetaStore::open(&dir).expect("reopen");
    assert_eq!(store.len(), 1);
    let rec = store.get("kick.wav").expect("record");
    assert_eq!(rec.tags, vec!["drum"]);
    assert_eq!(rec.description, "punchy 808");
    assert_eq!(rec.sample_rate, 8_000);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn prune_drops_records_for_missing_files() {
    let dir = make_temp_dir("store_prune");
    write_tiny_wav(&dir.join("keep.wav"));
    let mut store = MetaStore::open(&dir).expect("open");
    store.upsert("keep.wav", record());
    store.upsert("gone.wav", record());
    assert_eq!(store.prune_missing(&dir), 1);
    assert!(store.get("keep.wav").is_some());
    assert!(store.get("gone.wav").is_none());
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn scan_finds_only_supported_files() {
    let dir = make_temp_dir("scan");
    write_tiny_wav(&dir.join("a.wav"));
    std::fs::create_dir_all(dir.join("sub")).unwrap();
    write_tiny_wav(&dir.join("sub/b.wav"));
    std::fs::write(dir.join("readme.txt"), "x").unwrap();
    let files = fsops::scan_audio_files(&dir);
    assert_eq!(files.len(), 2);
    assert!(files.iter().all(|p| p.extension().unwrap() == "wav"));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn rename_keeps_extension_and_updates_store() {
    let dir = make_temp_dir("rename");
    let src = dir.join("old.wav");
    write_tiny_wav(&src);
    let mut store = MetaStore::open(&dir).expect("open");
    store.upsert("old.wav", record());
    store.add_tag("old.wav", "fx");

    let to = fsops::rename_file(&src, "new").expect("rename");
    assert_eq!(to, dir.join("new.wav"));
    assert!(to.is_file());
    assert!(!src.exists());

    store.rename("old.wav", "new.wav");
    assert_eq!(store.get("new.wav").expect("moved").tags, vec!["fx"]);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn rename_refuses_collision_and_separators() {
    let dir = make_temp_dir("rename_bad");
    let a = dir.join("a.wav");
    let b = dir.join("b.wav");
    write_tiny_wav(&a);
    write_tiny_wav(&b);
    assert!(fsops::rename_file(&a, "b.wav").is_err());
    assert!(fsops::rename_file(&a, "x/y.wav").is_err());
    assert!(fsops::rename_file(&a, "  ").is_err());
    assert!(a.is_file());
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn import_bumps_name_on_collision() {
    let src_dir = make_temp_dir("import_src");
    let lib = make_temp_dir("import_lib");
    let src = src_dir.join("clap.wav");
    write_tiny_wav(&src);

    let first = fsops::import_file(&src, &lib).expect("import");
    assert_eq!(first, lib.join("clap.wav"));
    let second = fsops::import_file(&src, &lib).expect("import again");
    assert_eq!(second, lib.join("clap_1.wav"));
    assert!(src.is_file(), "import must not consume the source");
    let _ = std::fs::remove_dir_all(&src_dir);
    let _ = std::fs::remove_dir_all(&lib);
}

#[test]
fn soft_delete_round_trip() {
    let dir = make_temp_dir("soft_delete");
    let target = dir.join("oops.wav");
    write_tiny_wav(&target);

    let ticket = fsops::soft_delete(&target).expect("delete");
    assert!(!target.exists());
    assert!(ticket.parked.is_file());

    fsops::undo_delete(&ticket).expect("restore");
    assert!(target.is_file());
    assert!(!ticket.parked.exists());
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn undo_delete_refuses_reoccupied_path() {
    let dir = make_temp_dir("soft_delete_conflict");
    let target = dir.join("twice.wav");
    write_tiny_wav(&target);
    let ticket = fsops::soft_delete(&target).expect("delete");
    write_tiny_wav(&target); // someone recreated it
    assert!(fsops::undo_delete(&ticket).is_err());
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn create_folder_validates_name() {
    let dir = make_temp_dir("mkdir");
    let sub = fsops::create_folder(&dir, "loops").expect("create");
    assert!(sub.is_dir());
    assert!(fsops::create_folder(&dir, "loops").is_err());
    assert!(fsops::create_folder(&dir, "a/b").is_err());
    let _ = std::fs::remove_dir_all(&dir);
}
