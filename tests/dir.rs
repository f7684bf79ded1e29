use std::ffi::OsStr;
use std::fs;

use poskit::{Directory, EntryType};

fn fixture() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("alpha.txt"), b"a").unwrap();
    fs::write(dir.path().join("beta.txt"), b"bb").unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    dir
}

#[test]
fn entries_lists_contents() {
    let dir = fixture();
    let mut names: Vec<String> = Directory::entries(dir.path())
        .unwrap()
        .into_iter()
        .map(|e| e.name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, [".", "..", "alpha.txt", "beta.txt", "sub"]);
}

#[test]
fn entry_types() {
    let dir = fixture();
    for entry in Directory::entries(dir.path()).unwrap() {
        match entry.name().to_str().unwrap() {
            "alpha.txt" | "beta.txt" => assert_eq!(entry.file_type(), EntryType::Regular),
            "." | ".." | "sub" => assert_eq!(entry.file_type(), EntryType::Directory),
            other => panic!("unexpected entry {}", other),
        }
        assert_ne!(entry.ino(), 0);
    }
}

#[test]
fn entry_path_joins_base() {
    let dir = fixture();
    let entry = Directory::find(dir.path(), OsStr::new("alpha.txt"))
        .unwrap()
        .expect("alpha.txt present");
    assert_eq!(entry.path(), dir.path().join("alpha.txt"));
}

#[test]
fn find_missing_is_none() {
    let dir = fixture();
    let found = Directory::find(dir.path(), OsStr::new("nope")).unwrap();
    assert!(found.is_none());
}

#[test]
fn open_missing_is_err() {
    let dir = fixture();
    let err = Directory::open(dir.path().join("missing")).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
}

#[test]
fn debug_names_the_base() {
    let dir = fixture();
    let stream = Directory::open(dir.path()).unwrap();
    let rendered = format!("{:?}", stream);
    assert!(rendered.contains(&format!("{:?}", dir.path())));
}

#[test]
fn iterator_yields_every_entry_once() {
    let dir = fixture();
    let count = Directory::open(dir.path())
        .unwrap()
        .map(|e| e.unwrap())
        .count();
    // ".", "..", two files, one subdirectory.
    assert_eq!(count, 5);
}
