// src/tutor.rs

use std::time::Duration;

use async_trait::async_trait;

use crate::{
    error::AppError,
    models::tutor::{TutorQuestion, TutorReply},
};

/// The AI tutor is an external service; this backend only forwards questions.
#[async_trait]
pub trait TutorClient: Send + Sync {
    async fn ask(&self, question: &TutorQuestion) -> Result<TutorReply, AppError>;
}

/// Posts questions as JSON to the tutor service and expects a `TutorReply` back.
/// There is no retry; a failed call surfaces as 503.
pub struct HttpTutorClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTutorClient {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl TutorClient for HttpTutorClient {
    async fn ask(&self, question: &TutorQuestion) -> Result<TutorReply, AppError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(question)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Tutor request failed: {:?}", e);
                AppError::ServiceUnavailable("The tutor is unavailable right now.".to_string())
            })?;

        if !response.status().is_success() {
            tracing::error!("Tutor service answered {}", response.status());
            return Err(AppError::ServiceUnavailable(
                "The tutor is unavailable right now.".to_string(),
            ));
        }

        response.json::<TutorReply>().await.map_err(|e| {
            tracing::error!("Tutor reply could not be decoded: {:?}", e);
            AppError::ServiceUnavailable("The tutor sent an unreadable reply.".to_string())
        })
    }
}
