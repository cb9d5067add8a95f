//! Joint restart behavior of the channel supervisor.

use pmsync_bot::{AppError, Supervisor};
use pmsync_ws::WsError;
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Increments a counter when the owning task is torn down.
struct DropCounter(Arc<AtomicU32>);

impl Drop for DropCounter {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// A channel that stays healthy until it is aborted.
fn healthy_channel(
    starts: Arc<AtomicU32>,
    drops: Arc<AtomicU32>,
) -> impl Fn() -> std::pin::Pin<Box<dyn Future<Output = Result<(), WsError>> + Send>> {
    move || {
        let starts = starts.clone();
        let drops = drops.clone();
        Box::pin(async move {
            starts.fetch_add(1, Ordering::SeqCst);
            let _guard = DropCounter(drops);
            std::future::pending::<()>().await;
            Ok(())
        })
    }
}

async fn failing_channel() -> Result<(), WsError> {
    Err(WsError::ConnectionFailed("auth rejected".to_string()))
}

async fn settle() {
    for _ in 0..5 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn test_user_failure_tears_down_healthy_market_channel() {
    let starts = Arc::new(AtomicU32::new(0));
    let drops = Arc::new(AtomicU32::new(0));
    let market = healthy_channel(starts.clone(), drops.clone());

    let result = Supervisor::new().run_once(&market, &failing_channel).await;

    match result {
        Err(AppError::ChannelFailed { channel, source }) => {
            assert_eq!(channel, "user");
            assert!(matches!(source, WsError::ConnectionFailed(_)));
        }
        other => panic!("unexpected result: {other:?}"),
    }

    settle().await;
    assert_eq!(starts.load(Ordering::SeqCst), 1);
    assert_eq!(drops.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_pair_restarts_after_delay() {
    let starts = Arc::new(AtomicU32::new(0));
    let drops = Arc::new(AtomicU32::new(0));
    let market = healthy_channel(starts.clone(), drops.clone());

    let supervisor = tokio::spawn(async move {
        Supervisor::new().run(market, failing_channel).await;
    });

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(starts.load(Ordering::SeqCst), 1);
    assert_eq!(drops.load(Ordering::SeqCst), 1);

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(starts.load(Ordering::SeqCst), 2);

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(starts.load(Ordering::SeqCst), 3);

    supervisor.abort();
}

#[tokio::test(start_paused = true)]
async fn test_clean_return_of_both_channels_is_ok() {
    let done = || async { Ok::<(), WsError>(()) };
    tokio_test::assert_ok!(Supervisor::new().run_once(&done, &done).await);
}

#[tokio::test(start_paused = true)]
async fn test_panicking_channel_is_reported() {
    let starts = Arc::new(AtomicU32::new(0));
    let drops = Arc::new(AtomicU32::new(0));
    let user = healthy_channel(starts.clone(), drops.clone());
    let market = || async {
        if std::hint::black_box(true) {
            panic!("decoder bug");
        }
        Ok::<(), WsError>(())
    };

    let result = Supervisor::new().run_once(&market, &user).await;

    assert!(matches!(
        result,
        Err(AppError::ChannelAborted { channel: "market", .. })
    ));
    settle().await;
    assert_eq!(drops.load(Ordering::SeqCst), starts.load(Ordering::SeqCst));
}
