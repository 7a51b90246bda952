//! Active pointer tests

use std::path::Path;

use releasectl::errors::DeployError;
use releasectl::release::pointer::ActivePointer;

fn release_dir(root: &Path, name: &str, contents: &str) -> std::path::PathBuf {
    let dir = root.join("releases").join(name);
    std::fs::create_dir_all(dir.join("public")).unwrap();
    std::fs::write(dir.join("public").join("index.html"), contents).unwrap();
    dir
}

#[tokio::test]
async fn test_swap_on_absent_pointer() {
    let tmp = tempfile::tempdir().unwrap();
    let target = release_dir(tmp.path(), "one", "v1");
    let pointer = ActivePointer::new(tmp.path().join("current"));

    pointer.swap(&target).await.unwrap();

    assert_eq!(pointer.target().await.unwrap(), Some(target.clone()));
    assert_eq!(
        std::fs::read_to_string(tmp.path().join("current/public/index.html")).unwrap(),
        "v1"
    );
}

#[tokio::test]
async fn test_swap_moves_to_new_release_and_keeps_old() {
    let tmp = tempfile::tempdir().unwrap();
    let one = release_dir(tmp.path(), "one", "v1");
    let two = release_dir(tmp.path(), "two", "v2");
    let pointer = ActivePointer::new(tmp.path().join("current"));

    pointer.swap(&one).await.unwrap();
    pointer.swap(&two).await.unwrap();

    assert_eq!(pointer.target().await.unwrap(), Some(two));
    assert_eq!(
        std::fs::read_to_string(tmp.path().join("current/public/index.html")).unwrap(),
        "v2"
    );
    assert_eq!(
        std::fs::read_to_string(one.join("public/index.html")).unwrap(),
        "v1"
    );
}

#[tokio::test]
async fn test_swap_refuses_plain_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let target = release_dir(tmp.path(), "one", "v1");
    let current = tmp.path().join("current");
    std::fs::create_dir(&current).unwrap();
    std::fs::write(current.join("data.db"), "precious").unwrap();
    let pointer = ActivePointer::new(&current);

    let err = pointer.swap(&target).await.unwrap_err();

    assert!(matches!(err, DeployError::UnsafePointerState(ref p) if p == &current));
    assert!(std::fs::symlink_metadata(&current).unwrap().is_dir());
    assert_eq!(
        std::fs::read_to_string(current.join("data.db")).unwrap(),
        "precious"
    );
}

#[tokio::test]
async fn test_remove_never_deletes_through_link() {
    let tmp = tempfile::tempdir().unwrap();
    let target = release_dir(tmp.path(), "one", "v1");
    let pointer = ActivePointer::new(tmp.path().join("current"));
    pointer.swap(&target).await.unwrap();

    pointer.remove().await.unwrap();

    assert!(std::fs::symlink_metadata(tmp.path().join("current")).is_err());
    assert_eq!(pointer.target().await.unwrap(), None);
    assert_eq!(
        std::fs::read_to_string(target.join("public/index.html")).unwrap(),
        "v1"
    );
}

#[tokio::test]
async fn test_remove_refuses_plain_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let current = tmp.path().join("current");
    std::fs::create_dir(&current).unwrap();
    std::fs::write(current.join("keep"), "x").unwrap();

    let err = ActivePointer::new(&current).remove().await.unwrap_err();

    assert!(matches!(err, DeployError::UnsafePointerState(_)));
    assert!(current.join("keep").exists());
}

#[tokio::test]
async fn test_target_on_plain_file_is_an_error() {
    let tmp = tempfile::tempdir().unwrap();
    let current = tmp.path().join("current");
    std::fs::write(&current, "x").unwrap();

    let err = ActivePointer::new(&current).target().await.unwrap_err();

    assert!(matches!(err, DeployError::UnsafePointerState(_)));
}

#[tokio::test]
async fn test_swap_to_dangling_target_is_still_a_link() {
    let tmp = tempfile::tempdir().unwrap();
    let one = release_dir(tmp.path(), "one", "v1");
    let pointer = ActivePointer::new(tmp.path().join("current"));
    pointer.swap(&tmp.path().join("releases/missing")).await.unwrap();

    // A dangling link is still a link and can be replaced
    pointer.swap(&one).await.unwrap();

    assert_eq!(pointer.target().await.unwrap(), Some(one));
}
