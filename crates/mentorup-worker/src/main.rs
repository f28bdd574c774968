//! Mentor-upload stage-worker and transfer/import orchestrator binary.
//!
//! Spawns one poll loop per consumer group: the four fan-out stages off the
//! shared job stream, plus the two single-consumer C7 triggers off their own
//! streams (spec §4.5, §4.7, §9 "Global clients").

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mentorup_bus::{JobBus, MENTOR_IMPORT_STREAM, TRANSFER_GROUP, TRANSFER_STREAM};
use mentorup_metadata::MetadataClient;
use mentorup_models::{JobMessage, MentorImportJobMessage, TaskName, TransferJobMessage};
use mentorup_storage::{operations::StorageLayout, S3Client};
use mentorup_transcribe::TranscribeClient;
use mentorup_worker::{config::WorkerConfig, mentor_import, stages, transfer, WorkerContext};

#[tokio::main]
async fn main() {
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("failed to install rustls crypto provider");

    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::try_from_env("LOG_LEVEL_UPLOAD_WORKER")
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("starting mentorup-worker");

    let ctx = match build_context().await {
        Ok(ctx) => ctx,
        Err(e) => {
            error!(error = %e, "failed to build worker context");
            std::process::exit(1);
        }
    };

    if let Err(e) = init_groups(&ctx.bus).await {
        error!(error = %e, "failed to initialize consumer groups");
        std::process::exit(1);
    }

    let consumer_name = format!("worker-{}", std::process::id());

    tokio::spawn(run_fanout_loop(ctx.clone(), TaskName::TranscodingWeb, consumer_name.clone(), |ctx, msg| {
        async move { stages::transcode_web::run(&ctx, &msg).await }
    }));
    tokio::spawn(run_fanout_loop(ctx.clone(), TaskName::TranscodingMobile, consumer_name.clone(), |ctx, msg| {
        async move { stages::transcode_mobile::run(&ctx, &msg).await }
    }));
    tokio::spawn(run_fanout_loop(ctx.clone(), TaskName::Transcribing, consumer_name.clone(), |ctx, msg| {
        async move { stages::transcribe::run(&ctx, &msg).await }
    }));
    tokio::spawn(run_fanout_loop(ctx.clone(), TaskName::TrimUpload, consumer_name.clone(), |ctx, msg| {
        async move { stages::trim_upload::run(&ctx, &msg).await }
    }));
    tokio::spawn(run_trigger_loop::<TransferJobMessage, _, _>(
        ctx.clone(),
        TRANSFER_STREAM,
        TRANSFER_GROUP,
        consumer_name.clone(),
        |ctx, msg| async move { transfer::run(&ctx, &msg).await },
    ));
    tokio::spawn(run_trigger_loop::<MentorImportJobMessage, _, _>(
        ctx.clone(),
        MENTOR_IMPORT_STREAM,
        TRANSFER_GROUP,
        consumer_name,
        |ctx, msg| async move { mentor_import::run(&ctx, &msg).await },
    ));

    tokio::signal::ctrl_c().await.ok();
    info!("received shutdown signal, draining for up to {:?}", ctx.config.shutdown_timeout);
    tokio::time::sleep(ctx.config.shutdown_timeout).await;
    info!("worker shutdown complete");
}

async fn build_context() -> anyhow::Result<WorkerContext> {
    let metadata = MetadataClient::from_env()?;
    let storage = S3Client::from_env()?;
    let transcribe = TranscribeClient::from_env()?;
    let bus = JobBus::from_env()?;
    let static_url_base = std::env::var("STATIC_URL_BASE")
        .map_err(|_| anyhow::anyhow!("STATIC_URL_BASE not set"))?;

    Ok(WorkerContext {
        metadata: Arc::new(metadata),
        storage: Arc::new(storage),
        transcribe: Arc::new(transcribe),
        bus: Arc::new(bus),
        layout: Arc::new(StorageLayout::new(static_url_base)),
        config: WorkerConfig::from_env(),
        http: Arc::new(reqwest::Client::new()),
    })
}

async fn init_groups(bus: &JobBus) -> anyhow::Result<()> {
    for stage in [
        TaskName::TranscodingWeb,
        TaskName::TranscodingMobile,
        TaskName::Transcribing,
        TaskName::TrimUpload,
    ] {
        bus.init_group(stage.as_str()).await?;
    }
    bus.init_group_on(TRANSFER_STREAM, TRANSFER_GROUP).await?;
    bus.init_group_on(MENTOR_IMPORT_STREAM, TRANSFER_GROUP).await?;
    Ok(())
}

/// Polls `stage`'s consumer group on the shared fan-out job stream forever,
/// invoking `handler` for each message and acking regardless of outcome — a
/// stage failure is already reported as a FAILED task status by `handler`
/// itself; retry/DLQ policy is left to the host runtime (spec §7).
async fn run_fanout_loop<F, Fut>(ctx: WorkerContext, stage: TaskName, consumer_name: String, handler: F)
where
    F: Fn(WorkerContext, JobMessage) -> Fut + Send + 'static,
    Fut: Future<Output = mentorup_worker::WorkerResult<()>> + Send,
{
    let group = stage.as_str();
    loop {
        let messages = match ctx
            .bus
            .consume(group, &consumer_name, ctx.config.poll_block.as_millis() as u64, ctx.config.batch_size)
            .await
        {
            Ok(messages) => messages,
            Err(e) => {
                warn!(group, error = %e, "failed to poll job stream");
                tokio::time::sleep(Duration::from_secs(1)).await;
                continue;
            }
        };

        for (message_id, msg) in messages {
            if let Err(e) = handler(ctx.clone(), msg).await {
                warn!(group, error = %e, "stage handler returned an error");
            }
            if let Err(e) = ctx.bus.ack(group, &message_id).await {
                warn!(group, message_id, error = %e, "failed to ack message");
            }
        }
    }
}

/// Polls a single-consumer trigger stream forever (spec §4.7's C7 triggers).
async fn run_trigger_loop<T, F, Fut>(
    ctx: WorkerContext,
    stream: &'static str,
    group: &'static str,
    consumer_name: String,
    handler: F,
) where
    T: serde::de::DeserializeOwned + Send + 'static,
    F: Fn(WorkerContext, T) -> Fut + Send + 'static,
    Fut: Future<Output = mentorup_worker::WorkerResult<()>> + Send,
{
    loop {
        let messages = match ctx
            .bus
            .consume_json::<T>(stream, group, &consumer_name, ctx.config.poll_block.as_millis() as u64, ctx.config.batch_size)
            .await
        {
            Ok(messages) => messages,
            Err(e) => {
                warn!(stream, error = %e, "failed to poll trigger stream");
                tokio::time::sleep(Duration::from_secs(1)).await;
                continue;
            }
        };

        for (message_id, msg) in messages {
            if let Err(e) = handler(ctx.clone(), msg).await {
                warn!(stream, error = %e, "trigger handler returned an error");
            }
            if let Err(e) = ctx.bus.ack_on(stream, group, &message_id).await {
                warn!(stream, message_id, error = %e, "failed to ack message");
            }
        }
    }
}
