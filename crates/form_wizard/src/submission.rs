//! Submission pipeline.
//!
//! The wizard never talks to a backend directly. It hands an immutable
//! [`SubmissionPayload`] to an injected [`SubmissionOperation`] and records the
//! outcome. Tests substitute a stub; production substitutes a real transport.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};
use thiserror::Error;

use crate::value::{FieldValue, Values};

/// Failure reported by a submission operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{message}")]
pub struct SubmissionError {
    pub message: String,
}

impl SubmissionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<&str> for SubmissionError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for SubmissionError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

/// Acknowledgement of an accepted submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub reference: String,
    pub submitted_at: DateTime<Utc>,
    /// Number of fields carried by the payload.
    pub fields: usize,
}

impl Receipt {
    pub fn new(reference: impl Into<String>, payload: &SubmissionPayload) -> Self {
        Self {
            reference: reference.into(),
            submitted_at: Utc::now(),
            fields: payload.len(),
        }
    }
}

/// Read-only snapshot of the wizard values taken when submission starts.
///
/// Cloning is cheap; every clone shares the same frozen values.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionPayload {
    form: Arc<str>,
    values: Arc<Values>,
    taken_at: DateTime<Utc>,
}

impl SubmissionPayload {
    pub fn new(form: &str, values: Values) -> Self {
        Self {
            form: Arc::from(form),
            values: Arc::new(values),
            taken_at: Utc::now(),
        }
    }

    /// Name of the wizard that produced the payload.
    pub fn form(&self) -> &str {
        &self.form
    }

    pub fn values(&self) -> &Values {
        &self.values
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.values.get(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }

    /// JSON object of all values, the shape a backend would receive.
    pub fn to_json(&self) -> JsonValue {
        let map: JsonMap<String, JsonValue> = self
            .values
            .iter()
            .map(|(k, v)| {
                let json = serde_json::to_value(v).unwrap_or(JsonValue::Null);
                (k.clone(), json)
            })
            .collect();
        JsonValue::Object(map)
    }
}

/// The remote-call boundary invoked once the last step validates.
#[async_trait]
pub trait SubmissionOperation: Send + Sync {
    async fn submit(&self, payload: SubmissionPayload) -> Result<Receipt, SubmissionError>;
}

#[async_trait]
impl<T: SubmissionOperation + ?Sized> SubmissionOperation for Arc<T> {
    async fn submit(&self, payload: SubmissionPayload) -> Result<Receipt, SubmissionError> {
        (**self).submit(payload).await
    }
}

/// Adapter turning an async closure into a [`SubmissionOperation`].
pub struct FnSubmission<F> {
    f: F,
}

/// ```ignore
/// let op = submission_fn(|payload| async move {
///     Err(SubmissionError::new("network down"))
/// });
/// ```
pub fn submission_fn<F, Fut>(f: F) -> FnSubmission<F>
where
    F: Fn(SubmissionPayload) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Receipt, SubmissionError>> + Send + 'static,
{
    FnSubmission { f }
}

#[async_trait]
impl<F, Fut> SubmissionOperation for FnSubmission<F>
where
    F: Fn(SubmissionPayload) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Receipt, SubmissionError>> + Send + 'static,
{
    async fn submit(&self, payload: SubmissionPayload) -> Result<Receipt, SubmissionError> {
        (self.f)(payload).await
    }
}
