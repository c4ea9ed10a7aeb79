use super::*;

#[test]
fn base_name_is_prefix_and_seed() {
    let dir = tempfile::tempdir().unwrap();
    let p = next_output_path(dir.path(), "outsd", 42).unwrap();
    assert_eq!(p, dir.path().join("outsd_42.png"));
}

#[test]
fn existing_files_push_the_counter() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("outsd_42.png"), b"").unwrap();
    let p = next_output_path(dir.path(), "outsd", 42).unwrap();
    assert_eq!(p, dir.path().join("outsd_42_1.png"));

    std::fs::write(&p, b"").unwrap();
    let p = next_output_path(dir.path(), "outsd", 42).unwrap();
    assert_eq!(p, dir.path().join("outsd_42_2.png"));
}

#[test]
fn other_seeds_do_not_collide() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("outsd_42.png"), b"").unwrap();
    let p = next_output_path(dir.path(), "outsd", 43).unwrap();
    assert_eq!(p, dir.path().join("outsd_43.png"));
}
