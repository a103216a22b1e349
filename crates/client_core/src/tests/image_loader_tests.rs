use super::*;

use std::{fs, time::Duration};

use tokio::sync::mpsc;

fn write_file(dir: &tempfile::TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, bytes).expect("write fixture");
    path
}

#[tokio::test]
async fn reads_file_as_data_url_with_guessed_mime() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_file(&dir, "me.png", b"\x89PNG\r\n");

    let url = read_data_url(&path).await.expect("read");
    assert_eq!(url.mime(), "image/png");
    assert_eq!(url.decode().expect("decode"), b"\x89PNG\r\n");
}

#[tokio::test]
async fn unknown_extension_falls_back_to_octet_stream() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_file(&dir, "shirt.weird", b"bytes");

    let url = read_data_url(&path).await.expect("read");
    assert_eq!(url.mime(), DataUrl::FALLBACK_MIME);
}

#[tokio::test]
async fn missing_and_empty_files_are_errors() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("nope.jpg");
    assert!(matches!(
        read_data_url(&missing).await,
        Err(ImageLoadError::Read { .. })
    ));

    let empty = write_file(&dir, "empty.jpg", b"");
    assert!(matches!(
        read_data_url(&empty).await,
        Err(ImageLoadError::Empty { .. })
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn loader_reports_outcome_with_generation() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_file(&dir, "dress.jpg", b"jpeg-bytes");
    let (tx, mut rx) = mpsc::unbounded_channel();

    let mut loader = ImageLoader::new(Handle::current());
    loader.load(ImageSlot::Clothing, 7, path, move |outcome| {
        let _ = tx.send(outcome);
    });

    let outcome = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timely")
        .expect("outcome");
    assert_eq!(outcome.slot, ImageSlot::Clothing);
    assert_eq!(outcome.generation, 7);
    assert_eq!(outcome.result.expect("ok").mime(), "image/jpeg");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn superseding_load_delivers_the_newest_generation() {
    let dir = tempfile::tempdir().expect("tempdir");
    let first = write_file(&dir, "a.png", &vec![1u8; 4 * 1024 * 1024]);
    let second = write_file(&dir, "b.png", b"second");
    let (tx, mut rx) = mpsc::unbounded_channel();

    let mut loader = ImageLoader::new(Handle::current());
    let tx_first = tx.clone();
    loader.load(ImageSlot::User, 1, first, move |outcome| {
        let _ = tx_first.send(outcome);
    });
    loader.load(ImageSlot::User, 2, second, move |outcome| {
        let _ = tx.send(outcome);
    });

    let mut newest = None;
    while let Ok(Some(outcome)) = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await {
        let done = outcome.generation == 2;
        newest = Some(outcome);
        if done {
            break;
        }
    }

    let newest = newest.expect("at least one outcome");
    assert_eq!(newest.generation, 2);
    assert_eq!(newest.result.expect("ok").decode().expect("decode"), b"second");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancel_drops_pending_read() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_file(&dir, "a.png", b"a");
    let mut loader = ImageLoader::new(Handle::current());

    loader.load(ImageSlot::User, 1, path, |_| {});
    loader.cancel(ImageSlot::User);
    assert_eq!(loader.in_flight(ImageSlot::User), None);
}
