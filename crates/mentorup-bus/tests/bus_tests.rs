//! Fan-out semantics against a real Redis instance (spec §4.4 step 8, §4.5).
//!
//! Ignored by default: these need `REDIS_URL` (or local `redis://127.0.0.1:6379`)
//! reachable. Run with `cargo test -p mentorup-bus -- --ignored`.

use mentorup_bus::{JobBus, QueueConfig};
use mentorup_models::{JobMessage, TaskName, TaskRef, TaskStatus};

fn redis_url() -> String {
    std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string())
}

fn sample_message(mentor: &str, question: &str) -> JobMessage {
    JobMessage {
        mentor: mentor.to_string(),
        question: question.to_string(),
        video: format!("videos/{mentor}/{question}/original.mp4"),
        transcode_web_task: TaskRef {
            task_id: "web-task".into(),
            task_name: TaskName::TranscodingWeb,
            status: TaskStatus::Queued,
        },
        transcode_mobile_task: TaskRef {
            task_id: "mobile-task".into(),
            task_name: TaskName::TranscodingMobile,
            status: TaskStatus::Queued,
        },
        transcribe_task: Some(TaskRef {
            task_id: "transcribe-task".into(),
            task_name: TaskName::Transcribing,
            status: TaskStatus::Queued,
        }),
        trim_upload_task: None,
        trim: None,
    }
}

#[tokio::test]
#[ignore = "requires a reachable Redis instance"]
async fn one_publish_is_delivered_to_every_stage_consumer_group() {
    let bus = JobBus::new(QueueConfig {
        redis_url: redis_url(),
        stream_name: "mentorup:jobs:test-fanout".into(),
    })
    .expect("failed to build JobBus");

    for group in ["transcode-web", "transcode-mobile", "transcribe"] {
        bus.init_group(group).await.expect("failed to init consumer group");
    }

    let message = sample_message("mentor-fanout", "question-fanout");
    bus.publish(&message).await.expect("failed to publish job message");

    for group in ["transcode-web", "transcode-mobile", "transcribe"] {
        let received = bus
            .consume(group, "test-consumer", 2000, 10)
            .await
            .expect("failed to consume");
        assert_eq!(received.len(), 1, "stage {group} did not receive the fan-out message");
        let (message_id, received_message) = &received[0];
        assert_eq!(received_message.mentor, "mentor-fanout");
        bus.ack(group, message_id).await.expect("failed to ack");
    }
}

#[tokio::test]
#[ignore = "requires a reachable Redis instance"]
async fn unacked_message_is_redelivered_to_a_fresh_consumer_in_the_same_group() {
    let bus = JobBus::new(QueueConfig {
        redis_url: redis_url(),
        stream_name: "mentorup:jobs:test-redelivery".into(),
    })
    .expect("failed to build JobBus");

    bus.init_group("transcode-web").await.expect("failed to init consumer group");
    let message = sample_message("mentor-redelivery", "question-redelivery");
    bus.publish(&message).await.expect("failed to publish");

    // First consumer reads but never acks, simulating a crashed worker.
    let first = bus
        .consume("transcode-web", "consumer-a", 2000, 10)
        .await
        .expect("failed to consume");
    assert_eq!(first.len(), 1);

    // A brand-new message to the same stream should still reach a second,
    // independently-named consumer in the same group (distinct delivery).
    let message2 = sample_message("mentor-redelivery-2", "question-redelivery-2");
    bus.publish(&message2).await.expect("failed to publish second message");

    let second = bus
        .consume("transcode-web", "consumer-b", 2000, 10)
        .await
        .expect("failed to consume");
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].1.mentor, "mentor-redelivery-2");
}
