//! Stand-in for the marketplace API: waits, logs the JSON body and issues a
//! receipt, or fails with a configured message.

use std::time::Duration;

use async_trait::async_trait;
use form_wizard::{Receipt, SubmissionError, SubmissionOperation, SubmissionPayload};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::SubmissionConfig;

#[derive(Debug, Clone)]
pub struct SimulatedSubmission {
    delay: Duration,
    reference_prefix: String,
    fail_with: Option<String>,
}

impl SimulatedSubmission {
    pub fn new(delay: Duration, reference_prefix: impl Into<String>) -> Self {
        Self {
            delay,
            reference_prefix: reference_prefix.into(),
            fail_with: None,
        }
    }

    pub fn from_config(cfg: &SubmissionConfig) -> Self {
        Self::new(cfg.delay(), cfg.reference_prefix.clone())
    }

    /// Every submission is rejected with `message` after the delay.
    pub fn failing_with(mut self, message: impl Into<String>) -> Self {
        self.fail_with = Some(message.into());
        self
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    fn next_reference(&self) -> String {
        let id = Uuid::new_v4().simple().to_string().to_uppercase();
        format!("{}-{}", self.reference_prefix, &id[..8])
    }
}

#[async_trait]
impl SubmissionOperation for SimulatedSubmission {
    async fn submit(&self, payload: SubmissionPayload) -> Result<Receipt, SubmissionError> {
        debug!(form = payload.form(), body = %payload.to_json(), "posting submission");
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if let Some(message) = &self.fail_with {
            return Err(SubmissionError::new(message.clone()));
        }

        let receipt = Receipt::new(self.next_reference(), &payload);
        info!(form = payload.form(), reference = %receipt.reference, "submission accepted");
        Ok(receipt)
    }
}
