use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;
use tokio_util::sync::CancellationToken;

use recycle_bin_core::{RecycleConfig, RecycleEngine, Scheduler};

fn open_engine(root: &std::path::Path) -> Arc<RecycleEngine> {
    let config = RecycleConfig::with_recycle_bin_dir(root.join("bin"));
    Arc::new(RecycleEngine::open(&config).unwrap())
}

#[tokio::test]
async fn test_cancelled_before_start_runs_no_cycle() {
    let tmp = tempdir().unwrap();
    let engine = open_engine(tmp.path());
    let file = tmp.path().join("a.txt");
    fs::write(&file, "x").unwrap();
    let deleted = engine.delete(&file, 0).unwrap();

    let token = CancellationToken::new();
    token.cancel();
    let cycles = Scheduler::new(engine.clone(), Duration::from_millis(10))
        .run(token)
        .await;

    assert_eq!(cycles, 0);
    assert!(deleted.held_path.exists());
}

#[tokio::test]
async fn test_cancel_interrupts_sleep() {
    let tmp = tempdir().unwrap();
    let engine = open_engine(tmp.path());
    let scheduler = Scheduler::new(engine, Duration::from_secs(3600));

    let token = CancellationToken::new();
    let handle = {
        let token = token.clone();
        tokio::spawn(async move { scheduler.run(token).await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    token.cancel();

    let cycles = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("scheduler did not stop")
        .unwrap();
    assert_eq!(cycles, 0);
}

#[tokio::test]
async fn test_loop_purges_expired_files() {
    let tmp = tempdir().unwrap();
    let engine = open_engine(tmp.path());
    let file = tmp.path().join("expired.txt");
    fs::write(&file, "x").unwrap();
    let deleted = engine.delete(&file, 0).unwrap();

    let token = CancellationToken::new();
    let handle = {
        let scheduler = Scheduler::new(engine.clone(), Duration::from_millis(20));
        let token = token.clone();
        tokio::spawn(async move { scheduler.run(token).await })
    };

    let mut purged = false;
    for _ in 0..100 {
        if !deleted.held_path.exists() {
            purged = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    token.cancel();
    let cycles = handle.await.unwrap();

    assert!(purged);
    assert!(cycles >= 1);
    assert!(engine.list().unwrap().is_empty());
}

#[tokio::test]
async fn test_purge_once_reports_summary() {
    let tmp = tempdir().unwrap();
    let engine = open_engine(tmp.path());
    let scheduler = Scheduler::new(engine.clone(), Duration::from_secs(60));

    assert!(scheduler.purge_once().await.unwrap().is_idle());

    let file = tmp.path().join("b.txt");
    fs::write(&file, "x").unwrap();
    engine.delete(&file, 0).unwrap();
    assert_eq!(scheduler.purge_once().await.unwrap().purged, 1);
}
