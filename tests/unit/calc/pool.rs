use super::*;

#[test]
fn explicit_thread_count_is_honored() {
    let pool = WorkerPool::new(Some(3)).unwrap();
    assert_eq!(pool.workers(), 3);
    let shared = pool.clone();
    assert_eq!(shared.install(rayon::current_num_threads), 3);
}

#[test]
fn zero_threads_is_rejected() {
    let err = WorkerPool::new(Some(0)).unwrap_err();
    assert!(matches!(err, PixelflowError::Config(_)));
}
