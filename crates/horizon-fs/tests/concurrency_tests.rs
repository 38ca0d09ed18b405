//! Concurrent access tests for atomic writes and the writer lock

use horizon_fs::{FileLock, io};
use std::sync::{Arc, Barrier};
use std::thread;
use tempfile::tempdir;

#[test]
fn test_concurrent_writes_no_corruption() {
    let dir = tempdir().unwrap();
    let file_path = Arc::new(dir.path().join("current-state.json"));

    let num_threads = 8;
    let writes_per_thread = 25;
    let barrier = Arc::new(Barrier::new(num_threads));

    let handles: Vec<_> = (0..num_threads)
        .map(|thread_id| {
            let path = Arc::clone(&file_path);
            let barrier = Arc::clone(&barrier);

            thread::spawn(move || {
                barrier.wait();
                for i in 0..writes_per_thread {
                    let content = format!("thread{}:write{}\n", thread_id, i);
                    io::write_text(&path, &content).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread should not panic");
    }

    // Exactly one complete write survives, never an interleaving
    let content = std::fs::read_to_string(file_path.as_ref()).unwrap();
    assert!(content.starts_with("thread"), "got: {content}");
    assert_eq!(content.matches("thread").count(), 1);
    assert!(content.ends_with('\n'));
}

#[test]
fn test_file_lock_serializes_read_modify_write() {
    let dir = tempdir().unwrap();
    let counter_path = Arc::new(dir.path().join("counter.txt"));
    let lock_path = Arc::new(dir.path().join(".counter.lock"));
    io::write_text(&counter_path, "0").unwrap();

    let num_threads = 6;
    let increments = 20;
    let barrier = Arc::new(Barrier::new(num_threads));

    let handles: Vec<_> = (0..num_threads)
        .map(|_| {
            let counter_path = Arc::clone(&counter_path);
            let lock_path = Arc::clone(&lock_path);
            let barrier = Arc::clone(&barrier);

            thread::spawn(move || {
                barrier.wait();
                for _ in 0..increments {
                    let _guard = FileLock::acquire(&lock_path).unwrap();
                    let value: u32 = io::read_text(&counter_path).unwrap().parse().unwrap();
                    io::write_text(&counter_path, &(value + 1).to_string()).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread should not panic");
    }

    let total: u32 = io::read_text(&counter_path).unwrap().parse().unwrap();
    assert_eq!(total, (num_threads * increments) as u32);
}
