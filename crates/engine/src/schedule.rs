use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::trace;

pub struct RepeatingTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl RepeatingTask {
    pub fn spawn<F, Fut>(period: Duration, mut cycle: F) -> Self
    where
        F: FnMut(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            while !token.is_cancelled() {
                cycle(token.clone()).await;
                if token.is_cancelled() {
                    break;
                }

                trace!(?period, "scheduled next cycle");
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(period) => {}
                }
            }
        });

        Self { cancel, handle }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl Drop for RepeatingTask {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::RepeatingTask;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn counting_task(period: Duration, cycle_time: Duration) -> (RepeatingTask, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let task = RepeatingTask::spawn(period, move |_token| {
            let counter = Arc::clone(&counter);
            async move {
                tokio::time::sleep(cycle_time).await;
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });
        (task, count)
    }

    #[tokio::test(start_paused = true)]
    async fn first_cycle_runs_immediately() {
        let (_task, count) = counting_task(Duration::from_secs(10), Duration::ZERO);

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn period_is_measured_from_cycle_completion() {
        let (_task, count) = counting_task(Duration::from_secs(1), Duration::from_millis(500));

        // cycles complete at 0.5s, 2.0s, 3.5s
        tokio::time::sleep(Duration::from_millis(2_100)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);

        tokio::time::sleep(Duration::from_millis(1_500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_rescheduling() {
        let (task, count) = counting_task(Duration::from_secs(1), Duration::ZERO);

        tokio::time::sleep(Duration::from_millis(1_500)).await;
        task.cancel();
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert!(task.cancel.is_cancelled());
        assert!(task.handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_lets_running_cycle_finish() {
        let (task, count) = counting_task(Duration::from_secs(1), Duration::from_secs(2));

        tokio::time::sleep(Duration::from_millis(500)).await;
        task.cancel();
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(task.handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn drop_cancels() {
        let (task, count) = counting_task(Duration::from_secs(1), Duration::ZERO);

        tokio::time::sleep(Duration::from_millis(1)).await;
        drop(task);
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
