//! Demo run: producers and consumers sharing one broadcast queue
//!
//! Producers each publish a fixed number of messages. Consumers read until
//! the producers are done and their cursor is drained; with
//! `unsubscribe_every` set they leave and rejoin periodically, missing
//! whatever is published while they are away. Halfway through, a monitor
//! takes a lag snapshot and applies the optional resize.
//!
//! Workers run on tokio's blocking pool since the queue blocks the calling
//! thread. Ctrl-C or the run timeout destroys the queue, which releases every
//! blocked worker.

use crate::app::config::DemoConfig;
use crate::core::error_handling::ContextualError;
use crate::core::styles::StyleRole;
use crate::queue::{BroadcastQueue, ConfigError, LagStats, QueueError, QueueStats};
use prettytable::{format, Cell, Row, Table};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;

type DemoQueue = BroadcastQueue<DemoMessage, usize>;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoMessage {
    pub producer: usize,
    pub index: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum DemoError {
    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Run did not finish within {secs}s")]
    TimedOut { secs: u64 },
}

impl ContextualError for DemoError {
    fn is_user_actionable(&self) -> bool {
        match self {
            DemoError::Config(e) => e.is_user_actionable(),
            DemoError::Queue(e) => e.is_user_actionable(),
            DemoError::TimedOut { .. } => true,
            DemoError::Join(_) => false,
        }
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            DemoError::Config(e) => e.user_message(),
            DemoError::Queue(e) => e.user_message(),
            DemoError::TimedOut { .. } => {
                Some("Run timed out; raise --timeout or reduce --messages")
            }
            DemoError::Join(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProducerReport {
    pub id: usize,
    pub queued: usize,
    pub dropped: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsumerReport {
    pub id: usize,
    pub received: usize,
    pub rejoins: usize,
    /// Messages seen out of publish order for one producer; always 0
    pub out_of_order: usize,
}

#[derive(Debug, Clone)]
pub struct DemoReport {
    pub elapsed: Duration,
    pub interrupted: bool,
    pub producers: Vec<ProducerReport>,
    pub consumers: Vec<ConsumerReport>,
    /// Lag snapshot taken halfway through the run
    pub midpoint_lag: Option<LagStats>,
    pub evicted_on_resize: usize,
    pub stats: QueueStats,
}

enum WorkerReport {
    Producer(ProducerReport),
    Consumer(ConsumerReport),
    Monitor {
        lag: Option<LagStats>,
        evicted: usize,
    },
}

/// Run the demo described by `config` to completion
pub async fn run(config: &DemoConfig) -> Result<DemoReport, DemoError> {
    config.validate()?;

    let queue: Arc<DemoQueue> = Arc::new(BroadcastQueue::from_config(&config.queue)?);
    let producers_done = Arc::new(AtomicBool::new(false));
    let interrupted = Arc::new(AtomicBool::new(false));
    let started = Instant::now();

    log::info!(
        "Starting run: capacity {}, {} producers x {} messages, {} consumers",
        config.queue.capacity,
        config.producers,
        config.messages,
        config.consumers
    );

    // Subscribe up front so no early message is dropped for lack of readers
    for id in 0..config.consumers {
        queue.subscribe(id)?;
    }

    let mut consumers = JoinSet::new();
    for id in 0..config.consumers {
        let queue = Arc::clone(&queue);
        let done = Arc::clone(&producers_done);
        let every = config.unsubscribe_every;
        consumers.spawn_blocking(move || consume_loop(&queue, id, every, &done));
    }

    let mut producers = JoinSet::new();
    for id in 0..config.producers {
        let queue = Arc::clone(&queue);
        let count = config.messages;
        producers.spawn_blocking(move || produce_loop(&queue, id, count));
    }

    let monitor = {
        let queue = Arc::clone(&queue);
        let done = Arc::clone(&producers_done);
        let midpoint = (config.total_messages() / 2) as u64;
        let resize_to = config.resize_to;
        tokio::task::spawn_blocking(move || monitor_loop(&queue, midpoint, resize_to, &done))
    };

    let signal_watch = {
        let queue = Arc::clone(&queue);
        let interrupted = Arc::clone(&interrupted);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::warn!("Interrupted, destroying queue");
                interrupted.store(true, Ordering::Release);
                if let Err(e) = queue.destroy() {
                    log::error!("Failed to destroy queue: {}", e);
                }
            }
        })
    };

    let work = async {
        let mut reports = Vec::new();
        while let Some(result) = producers.join_next().await {
            reports.push(WorkerReport::Producer(result??));
        }
        producers_done.store(true, Ordering::Release);
        log::debug!("All producers finished");

        while let Some(result) = consumers.join_next().await {
            reports.push(WorkerReport::Consumer(result??));
        }
        let (lag, evicted) = monitor.await??;
        reports.push(WorkerReport::Monitor { lag, evicted });
        Ok::<_, DemoError>(reports)
    };

    let limit = Duration::from_secs(config.timeout_secs);
    let outcome = tokio::time::timeout(limit, work).await;
    signal_watch.abort();

    let reports = match outcome {
        Ok(reports) => reports?,
        Err(_) => {
            // Release any worker still blocked before reporting
            queue.destroy()?;
            return Err(DemoError::TimedOut {
                secs: config.timeout_secs,
            });
        }
    };

    let stats = queue.stats()?;
    queue.destroy()?;

    let mut report = DemoReport {
        elapsed: started.elapsed(),
        interrupted: interrupted.load(Ordering::Acquire),
        producers: Vec::new(),
        consumers: Vec::new(),
        midpoint_lag: None,
        evicted_on_resize: 0,
        stats,
    };
    for worker in reports {
        match worker {
            WorkerReport::Producer(p) => report.producers.push(p),
            WorkerReport::Consumer(c) => report.consumers.push(c),
            WorkerReport::Monitor { lag, evicted } => {
                report.midpoint_lag = lag;
                report.evicted_on_resize = evicted;
            }
        }
    }
    report.producers.sort_by_key(|p| p.id);
    report.consumers.sort_by_key(|c| c.id);

    log::info!(
        "Run finished in {:.2?}: {} published, {} dropped",
        report.elapsed,
        report.stats.published,
        report.stats.dropped
    );
    Ok(report)
}

fn produce_loop(queue: &DemoQueue, id: usize, count: usize) -> Result<ProducerReport, QueueError> {
    let mut report = ProducerReport {
        id,
        ..Default::default()
    };

    for index in 0..count {
        match queue.publish(DemoMessage {
            producer: id,
            index,
        }) {
            Ok(outcome) if outcome.is_queued() => report.queued += 1,
            Ok(_) => report.dropped += 1,
            Err(QueueError::Closed) => {
                log::debug!("Producer {} stopping, queue destroyed", id);
                break;
            }
            Err(e) => return Err(e),
        }
    }

    log::debug!(
        "Producer {} done: {} queued, {} dropped",
        id,
        report.queued,
        report.dropped
    );
    Ok(report)
}

fn consume_loop(
    queue: &DemoQueue,
    id: usize,
    unsubscribe_every: usize,
    producers_done: &AtomicBool,
) -> Result<ConsumerReport, QueueError> {
    let mut report = ConsumerReport {
        id,
        ..Default::default()
    };
    let mut last_seen: Vec<Option<usize>> = Vec::new();
    let mut since_join = 0;

    loop {
        match queue.consume_timeout(&id, POLL_INTERVAL) {
            Ok(Some(message)) => {
                report.received += 1;
                since_join += 1;

                if last_seen.len() <= message.producer {
                    last_seen.resize(message.producer + 1, None);
                }
                if matches!(last_seen[message.producer], Some(prev) if prev >= message.index) {
                    report.out_of_order += 1;
                }
                last_seen[message.producer] = Some(message.index);

                if unsubscribe_every > 0 && since_join >= unsubscribe_every {
                    queue.unsubscribe(&id)?;
                    match queue.subscribe(id) {
                        Ok(_) => report.rejoins += 1,
                        Err(QueueError::Closed) => break,
                        Err(e) => return Err(e),
                    }
                    since_join = 0;
                }
            }
            // Unsubscribed or destroyed underneath us
            Ok(None) => break,
            Err(QueueError::Timeout { .. }) => {
                // Publishes can land between the timeout and the flag check
                if producers_done.load(Ordering::Acquire) && queue.available(&id)? == 0 {
                    break;
                }
            }
            Err(e) => return Err(e),
        }
    }

    queue.unsubscribe(&id)?;
    log::debug!(
        "Consumer {} done: {} received, {} rejoins",
        id,
        report.received,
        report.rejoins
    );
    Ok(report)
}

fn monitor_loop(
    queue: &DemoQueue,
    midpoint: u64,
    resize_to: Option<usize>,
    producers_done: &AtomicBool,
) -> Result<(Option<LagStats>, usize), QueueError> {
    loop {
        let stats = queue.stats()?;
        if stats.published + stats.dropped >= midpoint {
            break;
        }
        if producers_done.load(Ordering::Acquire) || queue.is_closed()? {
            return Ok((None, 0));
        }
        std::thread::sleep(Duration::from_millis(1));
    }

    let lag = queue.lag_stats()?;
    log::debug!(
        "Midpoint lag: max {}, min {}, avg {:.1}",
        lag.max_lag,
        lag.min_lag,
        lag.avg_lag
    );

    let evicted = match resize_to {
        Some(capacity) => queue.resize(capacity)?,
        None => 0,
    };
    Ok((Some(lag), evicted))
}

impl DemoReport {
    pub fn total_received(&self) -> usize {
        self.consumers.iter().map(|c| c.received).sum()
    }

    /// Render the run summary as plain or coloured tables
    pub fn render(&self, use_color: bool) -> String {
        let mut out = String::new();

        out.push_str(&StyleRole::Header.paint("Run summary", use_color));
        out.push('\n');
        let mut summary = new_table();
        let mut add = |key: &str, value: String| {
            summary.add_row(Row::new(vec![key_cell(key, use_color), Cell::new(&value)]));
        };
        add("elapsed", format!("{:.2?}", self.elapsed));
        add("capacity", self.stats.capacity.to_string());
        add("published", self.stats.published.to_string());
        add("dropped (no subscribers)", self.stats.dropped.to_string());
        add("retired", self.stats.retired.to_string());
        add("evicted", self.stats.evicted.to_string());
        add("evicted on resize", self.evicted_on_resize.to_string());
        add("delivered", self.total_received().to_string());
        if let Some(lag) = &self.midpoint_lag {
            add(
                "midpoint lag (max/min/avg)",
                format!("{}/{}/{:.1}", lag.max_lag, lag.min_lag, lag.avg_lag),
            );
        }
        if self.interrupted {
            add("interrupted", "yes".to_string());
        }
        out.push_str(&summary.to_string());

        if !self.consumers.is_empty() {
            out.push('\n');
            out.push_str(&StyleRole::Header.paint("Consumers", use_color));
            out.push('\n');
            let mut table = new_table();
            table.set_titles(Row::new(vec![
                key_cell("consumer", use_color),
                key_cell("received", use_color),
                key_cell("rejoins", use_color),
                key_cell("out of order", use_color),
            ]));
            for c in &self.consumers {
                table.add_row(Row::new(vec![
                    Cell::new(&c.id.to_string()),
                    Cell::new(&c.received.to_string()),
                    Cell::new(&c.rejoins.to_string()),
                    Cell::new(&c.out_of_order.to_string()),
                ]));
            }
            out.push_str(&table.to_string());
        }

        out
    }

    pub fn print(&self, use_color: bool) {
        print!("{}", self.render(use_color));
    }
}

fn new_table() -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_CLEAN);
    table
}

fn key_cell(text: &str, use_color: bool) -> Cell {
    let cell = Cell::new(text);
    match StyleRole::Key.to_prettytable_spec() {
        Some(spec) if use_color => cell.style_spec(&spec),
        _ => cell,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> DemoConfig {
        DemoConfig {
            producers: 2,
            consumers: 3,
            messages: 50,
            timeout_secs: 30,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_every_consumer_sees_every_message() {
        let report = run(&small_config()).await.unwrap();

        assert_eq!(report.producers.len(), 2);
        assert_eq!(report.consumers.len(), 3);
        assert_eq!(report.stats.published, 100);
        assert_eq!(report.stats.dropped, 0);
        for consumer in &report.consumers {
            assert_eq!(consumer.received, 100);
            assert_eq!(consumer.out_of_order, 0);
        }
        assert!(report.midpoint_lag.is_some());
        assert!(!report.interrupted);
    }

    #[tokio::test]
    async fn test_no_consumers_drops_everything() {
        let config = DemoConfig {
            consumers: 0,
            ..small_config()
        };
        let report = run(&config).await.unwrap();

        assert_eq!(report.stats.published, 0);
        assert_eq!(report.stats.dropped, 100);
        assert_eq!(report.total_received(), 0);
    }

    #[tokio::test]
    async fn test_churning_consumers_stay_ordered() {
        let config = DemoConfig {
            unsubscribe_every: 7,
            ..small_config()
        };
        let report = run(&config).await.unwrap();

        for consumer in &report.consumers {
            assert!(consumer.received <= 100);
            assert_eq!(consumer.out_of_order, 0);
        }
        assert!(report.consumers.iter().any(|c| c.rejoins > 0));
    }

    #[tokio::test]
    async fn test_resize_is_applied() {
        let config = DemoConfig {
            resize_to: Some(2),
            ..small_config()
        };
        let report = run(&config).await.unwrap();
        assert_eq!(report.stats.capacity, 2);
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let config = DemoConfig {
            producers: 0,
            ..small_config()
        };
        assert!(matches!(run(&config).await, Err(DemoError::Config(_))));
    }

    #[tokio::test]
    async fn test_render_plain_summary() {
        let report = run(&small_config()).await.unwrap();
        let text = report.render(false);

        assert!(text.contains("Run summary"));
        assert!(text.contains("published"));
        assert!(text.contains("100"));
        assert!(text.contains("Consumers"));
        assert!(!text.contains('\x1b'));
    }
}
