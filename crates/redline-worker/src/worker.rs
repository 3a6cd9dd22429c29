//! AMQP consumer loop

use crate::config::WorkerConfig;
use crate::error::WorkerError;
use crate::handler::JobHandler;
use crate::message::JobResponse;
use futures::StreamExt;
use lapin::message::Delivery;
use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicPublishOptions, BasicQosOptions, QueueDeclareOptions,
};
use lapin::types::{FieldTable, ShortString};
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties};
use redline_service::SettingsFactory;
use std::sync::Arc;

/// Consumes job requests and publishes replies
///
/// Messages are handled strictly one after another (prefetch 1), so a worker
/// never has more than one pipeline in flight. Every delivery is acknowledged
/// once handled, malformed ones included.
pub struct QueueWorker {
    config: WorkerConfig,
    handler: JobHandler,
}

impl QueueWorker {
    /// Create a worker; fails on invalid settings
    pub fn new(config: WorkerConfig) -> Result<Self, WorkerError> {
        let factory = SettingsFactory::new(config.settings.clone())?;
        Ok(Self::with_handler(config, JobHandler::new(Arc::new(factory))))
    }

    /// Create a worker around an existing handler
    pub fn with_handler(config: WorkerConfig, handler: JobHandler) -> Self {
        Self { config, handler }
    }

    /// Consume until Ctrl+C or until the broker closes the stream
    ///
    /// A job in progress when the signal arrives is finished and acknowledged
    /// before the worker stops.
    pub async fn run(&mut self) -> Result<(), WorkerError> {
        tracing::info!("Connecting to broker: {}", self.config.rabbitmq_url);
        let connection =
            Connection::connect(&self.config.rabbitmq_url, ConnectionProperties::default()).await?;
        let channel = connection.create_channel().await?;

        channel
            .basic_qos(self.config.prefetch, BasicQosOptions::default())
            .await?;
        channel
            .queue_declare(
                &self.config.queue_name,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;

        let mut consumer = channel
            .basic_consume(
                &self.config.queue_name,
                &self.config.consumer_tag,
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await?;

        tracing::info!("Waiting for messages on queue: {}", self.config.queue_name);

        loop {
            tokio::select! {
                delivery = consumer.next() => {
                    match delivery {
                        Some(Ok(delivery)) => self.process(&channel, delivery).await?,
                        Some(Err(e)) => return Err(e.into()),
                        None => {
                            tracing::warn!("Consumer stream closed by broker");
                            break;
                        }
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Shutdown signal received, stopping worker");
                    break;
                }
            }
        }

        tracing::info!("Worker stopped. Final metrics:\n{}", self.handler.metrics().summary());

        channel.close(200, "worker shutdown").await?;
        connection.close(200, "worker shutdown").await?;
        Ok(())
    }

    async fn process(&mut self, channel: &Channel, delivery: Delivery) -> Result<(), WorkerError> {
        if let Some(response) = self.handler.handle(&delivery.data).await {
            match delivery.properties.reply_to() {
                Some(reply_to) => {
                    let correlation_id = delivery.properties.correlation_id().clone();
                    let published =
                        publish_reply(channel, reply_to.as_str(), correlation_id, &response).await;
                    match published {
                        Ok(()) => self.handler.record_reply(),
                        Err(e) => tracing::error!(
                            job_id = %response.job_id,
                            error = %e,
                            "Failed to publish reply"
                        ),
                    }
                }
                None => tracing::debug!(
                    job_id = %response.job_id,
                    "No reply_to, result not published"
                ),
            }
        }

        delivery.ack(BasicAckOptions::default()).await?;
        Ok(())
    }
}

/// Publish `response` to `routing_key` on the default exchange
async fn publish_reply(
    channel: &Channel,
    routing_key: &str,
    correlation_id: Option<ShortString>,
    response: &JobResponse,
) -> Result<(), WorkerError> {
    let body = response.to_bytes()?;
    let mut properties =
        BasicProperties::default().with_content_type(ShortString::from("application/json"));
    if let Some(id) = correlation_id {
        properties = properties.with_correlation_id(id);
    }

    channel
        .basic_publish("", routing_key, BasicPublishOptions::default(), &body, properties)
        .await?
        .await?;
    Ok(())
}
