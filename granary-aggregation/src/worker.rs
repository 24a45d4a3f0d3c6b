//! Background worker that owns the collector.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use granary_metrics::Sample;
use granary_timesource::TimeSource;
use tokio::sync::oneshot;

use crate::collect::Collector;
use crate::config::{AggregatorConfig, ConfigError};
use crate::queue::BucketQueue;

enum WorkerMessage {
    Sample(Sample),
    Flush(oneshot::Sender<()>),
}

/// Drives a [`Collector`] from a dedicated thread so that any number of
/// producer threads can feed samples while ingestion and expiry stay
/// single-writer.
///
/// The worker is fronted by a channel: `send` enqueues a sample, the
/// channel's receive timeout doubles as the periodic expiry tick, and
/// expired buckets are pushed to the shared [`BucketQueue`] the exporter
/// drains. When the last handle is dropped the worker drops the expiry
/// delay, flushes every remaining bucket, and exits, so shutdown never
/// loses tail data.
pub struct BackgroundCollector {
    sender: Sender<WorkerMessage>,
    handle: Arc<thread::JoinHandle<()>>,
}

impl Clone for BackgroundCollector {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            handle: Arc::clone(&self.handle),
        }
    }
}

impl BackgroundCollector {
    /// Spawn the worker thread.
    ///
    /// Expired buckets are pushed to `queue` once per aggregation period
    /// and on every [`Self::flush`] call.
    pub fn spawn(
        config: &AggregatorConfig,
        time_source: TimeSource,
        queue: Arc<BucketQueue>,
    ) -> Result<Self, ConfigError> {
        let collector = Collector::new(config, time_source)?;
        let tick = config.aggregation_period;
        let (sender, receiver) = mpsc::channel();

        let handle = thread::spawn(move || run(collector, receiver, queue, tick));

        Ok(Self {
            sender,
            handle: Arc::new(handle),
        })
    }

    /// Hand a sample to the worker; never blocks
    pub fn send(&self, sample: Sample) {
        let _ = self.sender.send(WorkerMessage::Sample(sample));
    }

    /// Push the currently-expired buckets to the queue and wait until
    /// the worker has done so.
    ///
    /// In synchronous code, you can use `futures::executor::block_on` to
    /// wait for this future to complete.
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        let _ = self.sender.send(WorkerMessage::Flush(tx));
        rx.await.unwrap()
    }

    /// Drop this handle and, if it was the last one, wait for the final
    /// drain to finish.
    pub fn close(self) {
        let Self { sender, handle } = self;
        drop(sender);
        if let Some(handle) = Arc::into_inner(handle) {
            let _ = handle.join();
        }
    }
}

fn run(
    mut collector: Collector,
    receiver: Receiver<WorkerMessage>,
    queue: Arc<BucketQueue>,
    tick: Duration,
) {
    fn push_expired(collector: &mut Collector, queue: &BucketQueue) {
        let expired = collector.expired_buckets();
        if !expired.is_empty() {
            queue.push(expired);
        }
    }

    loop {
        match receiver.recv_timeout(tick) {
            Ok(WorkerMessage::Sample(sample)) => collector.collect_sample(sample),
            Ok(WorkerMessage::Flush(ack)) => {
                push_expired(&mut collector, &queue);
                let _ = ack.send(());
            }
            Err(RecvTimeoutError::Timeout) => push_expired(&mut collector, &queue),
            Err(RecvTimeoutError::Disconnected) => {
                collector.drop_expiring_delay();
                push_expired(&mut collector, &queue);
                tracing::info!("sample channel closed, drained remaining buckets");
                break;
            }
        }
    }
}
