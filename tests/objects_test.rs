//! Integration tests for the object codec and loose object store.
//!
//! Objects are planted on disk the way Git writes them and read back through
//! the public API, and the other way round.

use std::fs;
use std::path::Path;

use miniz_oxide::inflate::decompress_to_vec_zlib;
use sha1::{Digest, Sha1};
use tempfile::TempDir;

use gitcore::{
    Blob, Commit, Error, ErrorKind, Kvlm, Mode, Object, ObjectType, Oid, Repository, Signature,
    Tag, Tree, TreeEntry,
};

/// Helper to create a minimal git repository for testing.
fn create_test_repo() -> TempDir {
    let temp = TempDir::new().unwrap();
    let git_dir = temp.path().join(".git");
    fs::create_dir_all(git_dir.join("objects")).unwrap();
    fs::create_dir_all(git_dir.join("refs/heads")).unwrap();
    fs::write(git_dir.join("HEAD"), "ref: refs/heads/main\n").unwrap();
    temp
}

/// Writes a loose object by hand and returns its hex id.
fn create_object(objects_dir: &Path, content: &[u8], object_type: &str) -> String {
    use miniz_oxide::deflate::compress_to_vec_zlib;

    let mut raw = format!("{} {}\0", object_type, content.len()).into_bytes();
    raw.extend_from_slice(content);

    let hex = hex::encode(Sha1::digest(&raw));

    let object_path = objects_dir.join(&hex[..2]).join(&hex[2..]);
    fs::create_dir_all(object_path.parent().unwrap()).unwrap();
    fs::write(&object_path, compress_to_vec_zlib(&raw, 6)).unwrap();

    hex
}

// OI-001: an object written elsewhere is read and decoded
#[test]
fn test_read_planted_commit() {
    let temp = create_test_repo();
    let objects = temp.path().join(".git/objects");

    let blob = create_object(&objects, b"hello\n", "blob");
    let mut tree_content = b"100644 hello.txt\0".to_vec();
    tree_content.extend_from_slice(&hex::decode(&blob).unwrap());
    let tree = create_object(&objects, &tree_content, "tree");
    let commit_content = format!(
        "tree {}\nauthor Test <test@test.com> 1700000000 +0000\n\
committer Test <test@test.com> 1700000000 +0000\n\nInitial commit\n",
        tree
    );
    let commit = create_object(&objects, commit_content.as_bytes(), "commit");

    let repo = Repository::open(temp.path()).unwrap();

    let object = repo.object_read(&Oid::from_hex(&commit).unwrap()).unwrap();
    let commit = object.as_commit().unwrap();
    assert_eq!(commit.tree().unwrap().to_hex(), tree);
    assert_eq!(commit.summary().unwrap(), "Initial commit");
    assert_eq!(commit.author().unwrap().name(), "Test");

    let tree = repo
        .object_read(&commit.tree().unwrap())
        .unwrap()
        .into_tree()
        .unwrap();
    assert_eq!(tree.len(), 1);
    assert_eq!(tree.entries()[0].path(), "hello.txt");
    assert_eq!(tree.entries()[0].oid().to_hex(), blob);
}

// OI-002: files we write are zlib streams of "<type> <len>\0<payload>"
#[test]
fn test_written_layout() {
    let temp = create_test_repo();
    let repo = Repository::open(temp.path()).unwrap();

    let oid = repo
        .object_write(&Object::Blob(Blob::new(b"hello\n".to_vec())))
        .unwrap();
    assert_eq!(oid.to_hex(), "ce013625030ba8dba906f756967f9e9ca394464a");

    let path = temp
        .path()
        .join(".git/objects/ce/013625030ba8dba906f756967f9e9ca394464a");
    let raw = decompress_to_vec_zlib(&fs::read(path).unwrap()).unwrap();
    assert_eq!(raw, b"blob 6\0hello\n");
}

// OI-003: every kind survives a store round trip
#[test]
fn test_store_roundtrip() {
    let temp = create_test_repo();
    let repo = Repository::open(temp.path()).unwrap();
    let sig = Signature::new("Jane Doe", "jane@example.com", 1700000000, -300);

    let blob = repo.object_write(&Blob::new(vec![0u8, 159, 146, 150]).into()).unwrap();
    let tree = Object::from(Tree::from_entries(vec![
        TreeEntry::new(Mode::REGULAR, "data.bin", blob),
        TreeEntry::new(Mode::EXECUTABLE, "run", blob),
    ]));
    let tree_oid = repo.object_write(&tree).unwrap();
    let commit = Object::from(Commit::new(&tree_oid, &[], &sig, &sig, "msg"));
    let commit_oid = repo.object_write(&commit).unwrap();
    let tag = Object::from(Tag::new(&commit_oid, ObjectType::Commit, "v1", &sig, "tag"));
    let tag_oid = repo.object_write(&tag).unwrap();

    assert_eq!(repo.object_read(&tree_oid).unwrap(), tree);
    assert_eq!(repo.object_read(&commit_oid).unwrap(), commit);
    assert_eq!(repo.object_read(&tag_oid).unwrap(), tag);
    assert_eq!(tag_oid, tag.oid());
}

// OI-004: writes are idempotent
#[test]
fn test_write_idempotent() {
    let temp = create_test_repo();
    let repo = Repository::open(temp.path()).unwrap();
    let object = Object::from(Blob::new(b"same".to_vec()));

    let first = repo.object_write(&object).unwrap();
    let second = repo.object_write(&object).unwrap();

    assert_eq!(first, second);
    let files = fs::read_dir(temp.path().join(".git/objects").join(&first.to_hex()[..2]))
        .unwrap()
        .count();
    assert_eq!(files, 1);
}

// OI-005: corrupted objects report the right category
#[test]
fn test_corrupt_objects() {
    let temp = create_test_repo();
    let objects = temp.path().join(".git/objects");
    let repo = Repository::open(temp.path()).unwrap();

    let missing = Oid::from_hex("0123456789abcdef0123456789abcdef01234567").unwrap();
    assert_eq!(repo.object_read(&missing).unwrap_err().kind(), ErrorKind::NotFound);

    let dir = objects.join("aa");
    fs::create_dir_all(&dir).unwrap();
    let bad_length = "aa".to_string() + &"1".repeat(38);
    fs::write(
        dir.join(&bad_length[2..]),
        miniz_oxide::deflate::compress_to_vec_zlib(b"blob 99\0short", 6),
    )
    .unwrap();
    let err = repo
        .object_read(&Oid::from_hex(&bad_length).unwrap())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Malformed);

    let unknown = "aa".to_string() + &"2".repeat(38);
    fs::write(
        dir.join(&unknown[2..]),
        miniz_oxide::deflate::compress_to_vec_zlib(b"note 1\0x", 6),
    )
    .unwrap();
    let err = repo
        .object_read(&Oid::from_hex(&unknown).unwrap())
        .unwrap_err();
    assert!(matches!(err, Error::UnknownObjectType(_)));
    assert_eq!(err.kind(), ErrorKind::UnknownKind);

    let garbage = "aa".to_string() + &"3".repeat(38);
    fs::write(dir.join(&garbage[2..]), b"not zlib at all").unwrap();
    assert!(repo
        .object_read(&Oid::from_hex(&garbage).unwrap())
        .is_err());
}

// OI-006: signed commits keep their continuation lines byte for byte
#[test]
fn test_signed_commit_roundtrip() {
    let raw = b"tree 29ff16c9c14e2652b22f8b78bb08a5a07930c147\n\
parent 206941306e8a8af65b66eaaaea388a7ae24d49a0\n\
author Thibault Polge <thibault@thb.lt> 1527025023 +0200\n\
committer Thibault Polge <thibault@thb.lt> 1527025044 +0200\n\
gpgsig -----BEGIN PGP SIGNATURE-----\n \n iQIzBAABCAAdFiEExwXquOM8bWb4Q2zVGxM2FxoLkGQFAlsEjZQACgkQGxM2FxoL\n -----END PGP SIGNATURE-----\n\
\n\
Create first draft";

    let kvlm = Kvlm::parse(raw).unwrap();
    assert!(kvlm
        .get(b"gpgsig")
        .unwrap()
        .starts_with(b"-----BEGIN PGP SIGNATURE-----\n\n"));
    assert_eq!(kvlm.serialize(), raw.to_vec());

    let object = Object::from_payload(ObjectType::Commit, raw).unwrap();
    assert_eq!(object.serialize(), raw.to_vec());
}
