//! Public API integration tests for the broadcast queue

use broadcastq::queue::{BroadcastQueue, PublishOutcome, QueueConfig, QueueError};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

#[test]
fn test_thread_ids_as_subscriber_keys() {
    let queue: Arc<BroadcastQueue<String>> = Arc::new(BroadcastQueue::new(4).unwrap());
    let ready = Arc::new(Barrier::new(3));

    let readers: Vec<_> = (0..2)
        .map(|_| {
            let queue = Arc::clone(&queue);
            let ready = Arc::clone(&ready);
            thread::spawn(move || {
                let me = thread::current().id();
                queue.subscribe(me).unwrap();
                ready.wait();

                let mut seen = Vec::new();
                for _ in 0..3 {
                    let message = queue.consume(&me).unwrap().unwrap();
                    seen.push(message.as_str().to_string());
                }
                queue.unsubscribe(&me).unwrap();
                seen
            })
        })
        .collect();

    ready.wait();
    for text in ["a", "b", "c"] {
        let outcome = queue.publish(text.to_string()).unwrap();
        assert!(outcome.is_queued());
    }

    for reader in readers {
        assert_eq!(reader.join().unwrap(), vec!["a", "b", "c"]);
    }
    assert!(queue.is_empty().unwrap());
    assert_eq!(queue.subscriber_count().unwrap(), 0);
}

#[test]
fn test_join_after_publish_sees_nothing_old() {
    let queue: BroadcastQueue<u32, &str> = BroadcastQueue::new(4).unwrap();
    queue.subscribe("early").unwrap();
    queue.publish(1u32).unwrap();
    queue.subscribe("late").unwrap();
    queue.publish(2u32).unwrap();

    assert_eq!(queue.available(&"early").unwrap(), 2);
    assert_eq!(queue.available(&"late").unwrap(), 1);
    assert_eq!(queue.try_consume(&"late").unwrap().as_deref(), Some(&2));
    assert_eq!(queue.pending_readers(1).unwrap(), Some(1));
    assert_eq!(queue.pending_readers(2).unwrap(), Some(1));
}

#[test]
fn test_backpressure_releases_in_order() {
    let queue: Arc<BroadcastQueue<u32, &str>> =
        Arc::new(BroadcastQueue::from_config(&QueueConfig::with_capacity(2)).unwrap());
    queue.subscribe("reader").unwrap();

    let producer = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || {
            for n in 0..10u32 {
                queue.publish(n).unwrap();
            }
        })
    };

    let mut received = Vec::new();
    while received.len() < 10 {
        let message = queue.consume(&"reader").unwrap().unwrap();
        assert!(queue.len().unwrap() <= 2);
        received.push(*message);
    }
    producer.join().unwrap();

    assert_eq!(received, (0..10).collect::<Vec<_>>());
}

#[test]
fn test_lossy_shrink_and_removal() {
    let queue: BroadcastQueue<String, &str> = BroadcastQueue::new(5).unwrap();
    queue.subscribe("reader").unwrap();

    let mut handles = Vec::new();
    for n in 0..5 {
        let payload = Arc::new(format!("m{}", n));
        handles.push(Arc::clone(&payload));
        queue.publish(payload).unwrap();
    }

    // m0 and m1 are evicted unread
    assert_eq!(queue.resize(3).unwrap(), 2);
    // m3 is withdrawn by identity
    assert!(queue.remove_message(&handles[3]).unwrap());
    assert!(!queue.remove_message(&handles[0]).unwrap());

    let rest: Vec<String> = std::iter::from_fn(|| queue.try_consume(&"reader").unwrap())
        .map(|m| m.as_str().to_string())
        .collect();
    assert_eq!(rest, vec!["m2", "m4"]);
}

#[test]
fn test_handles_and_destroy() {
    let queue: Arc<BroadcastQueue<u32, u8>> = Arc::new(BroadcastQueue::new(1).unwrap());
    let publisher = queue.publisher("main");
    let consumer = queue.consumer(7).unwrap();

    assert_eq!(
        publisher.publish(1u32).unwrap(),
        PublishOutcome::Queued {
            sequence: 1,
            readers: 1
        }
    );
    assert!(matches!(
        publisher.publish_timeout(2u32, Duration::from_millis(10)),
        Err(QueueError::Timeout { .. })
    ));

    queue.destroy().unwrap();
    assert!(consumer.read().unwrap().is_none());
    assert!(matches!(publisher.publish(3u32), Err(QueueError::Closed)));
}
