//! Emotion classification client for the gRPC model service.
//!
//! This crate provides a Rust client for the facial emotion model served
//! over gRPC (`proto/emotion.proto`). It handles:
//! - Connection management to the model service
//! - Sending encoded images in permissive mode (no face required)
//! - Converting the protobuf response into a [`RawClassification`]
//! - Bounding every call with a timeout

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use model::RawClassification;
use thiserror::Error;
use tonic::transport::{Channel, Endpoint};
use tracing::{debug, error, info};

// Include the generated protobuf code
pub mod emotion {
    tonic::include_proto!("emotion");
}

use emotion::{
    emotion_classifier_client::EmotionClassifierClient as GrpcEmotionClassifierClient,
    ClassifyRequest,
};

/// Default upper bound for one classification RPC
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur when interacting with the classification service
#[derive(Error, Debug)]
pub enum ClassifierClientError {
    #[error("Failed to connect to classification service: {0}")]
    ConnectionError(String),

    #[error("Classification failed ({code}): {message}")]
    ClassificationFailed { code: String, message: String },

    #[error("Invalid response from classification service: {0}")]
    InvalidResponse(String),
}

impl From<tonic::Status> for ClassifierClientError {
    fn from(status: tonic::Status) -> Self {
        match status.code() {
            tonic::Code::Unavailable => Self::ConnectionError(status.message().to_string()),
            code => Self::ClassificationFailed {
                code: format!("{:?}", code),
                message: status.message().to_string(),
            },
        }
    }
}

/// Client for the emotion classification service.
///
/// Cloning is cheap: clones share the underlying channel.
#[derive(Clone)]
pub struct EmotionServiceClient {
    client: GrpcEmotionClassifierClient<Channel>,
    service_addr: String,
}

impl EmotionServiceClient {
    /// Connect to the classification service, failing if it is unreachable.
    ///
    /// # Arguments
    /// * `addr` - Address of the gRPC service (e.g., "http://localhost:50051")
    /// * `timeout` - Upper bound for each RPC
    pub async fn connect(addr: impl Into<String>, timeout: Duration) -> Result<Self> {
        let addr = addr.into();
        info!("Connecting to classification service at {}", addr);

        let channel = Self::endpoint(&addr, timeout)?
            .connect()
            .await
            .context("Connecting to classification service")?;

        Ok(Self::from_channel(channel, addr))
    }

    /// Create a client that connects on first use.
    ///
    /// Lets the server start while the model service is still warming up;
    /// an unreachable service then surfaces as a per-request error.
    pub fn connect_lazy(addr: impl Into<String>, timeout: Duration) -> Result<Self> {
        let addr = addr.into();
        info!("Using classification service at {} (lazy connect)", addr);

        let channel = Self::endpoint(&addr, timeout)?.connect_lazy();
        Ok(Self::from_channel(channel, addr))
    }

    fn endpoint(addr: &str, timeout: Duration) -> Result<Endpoint> {
        Ok(Channel::from_shared(addr.to_string())
            .context("Creating channel from address")?
            .timeout(timeout)
            .connect_timeout(timeout))
    }

    fn from_channel(channel: Channel, service_addr: String) -> Self {
        Self {
            client: GrpcEmotionClassifierClient::new(channel),
            service_addr,
        }
    }

    /// Classify the dominant emotion of an encoded image.
    ///
    /// Face detection is never enforced: an image without a detectable face
    /// is classified as a whole.
    pub async fn classify_image(
        &self,
        image: Vec<u8>,
    ) -> Result<RawClassification, ClassifierClientError> {
        debug!("Classifying image of {} bytes", image.len());

        let request = tonic::Request::new(ClassifyRequest {
            image,
            enforce_detection: false,
        });

        let mut client = self.client.clone();
        let response = client.classify(request).await.map_err(|status| {
            error!("gRPC error while classifying image: {}", status);
            ClassifierClientError::from(status)
        })?;

        let response = response.into_inner();
        if response.scores.is_empty() {
            error!("Classification service returned no scores");
            return Err(ClassifierClientError::InvalidResponse(
                "response contains no scores".into(),
            ));
        }

        Ok(RawClassification {
            label: response.label,
            scores: response.scores.into_iter().collect(),
        })
    }

    /// Get the address of the classification service this client uses.
    pub fn service_address(&self) -> &str {
        &self.service_addr
    }
}

#[async_trait]
impl pipeline::EmotionClassifier for EmotionServiceClient {
    fn name(&self) -> &str {
        "emotion-grpc"
    }

    async fn classify(&self, image: &[u8]) -> Result<RawClassification> {
        Ok(self.classify_image(image.to_vec()).await?)
    }
}
