//! Natural-language explanations of a computed result.
//!
//! The calculator talks to this module through [`Explainer`]; the only
//! production backend is Gemini. Callers normally go through
//! [`explain_or_fallback`], which never fails.

mod gate;
mod gemini;

use serde::{Deserialize, Serialize};
use std::future::Future;
use thiserror::Error;
use tracing::warn;

pub use gate::{ExplanationGate, Ticket};
pub use gemini::{GeminiClient, GeminiConfig};

/// Structured commentary on an expression and its result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Explanation {
    pub step_by_step: Vec<String>,
    pub concept: String,
    pub real_world_usage: String,
}

impl Explanation {
    /// Locally built explanation used whenever the service cannot answer.
    pub fn fallback(result: &str) -> Self {
        Self {
            step_by_step: vec![format!("Result calculated: {result}")],
            concept: "General Mathematics".to_string(),
            real_world_usage: "Calculation performed via NovaCalc.".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ExplainError {
    #[error("explanations are disabled")]
    Disabled,
    #[error("no API key available. Set GEMINI_API_KEY or api_key in [explain]")]
    MissingApiKey,
    #[error("API key contains characters not allowed in an HTTP header")]
    InvalidApiKey,
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("unparseable explanation payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Something that can explain a result.
pub trait Explainer {
    fn explain(
        &self,
        expression: &str,
        result: &str,
    ) -> impl Future<Output = Result<Explanation, ExplainError>> + Send;
}

/// Explainer used when the feature is switched off in config.
#[derive(Clone, Copy, Debug, Default)]
pub struct DisabledExplainer;

impl Explainer for DisabledExplainer {
    async fn explain(&self, _expression: &str, _result: &str) -> Result<Explanation, ExplainError> {
        Err(ExplainError::Disabled)
    }
}

/// Instruction sent to the model.
pub fn build_prompt(expression: &str, result: &str) -> String {
    format!(
        "Explain the mathematical expression \"{expression}\" which equals \"{result}\". \
         Provide a step-by-step breakdown, the underlying concept, and a real-world application."
    )
}

/// Ask for an explanation, substituting the local fallback on any failure.
pub async fn explain_or_fallback<E: Explainer>(
    explainer: &E,
    expression: &str,
    result: &str,
) -> Explanation {
    match explainer.explain(expression, result).await {
        Ok(explanation) => explanation,
        Err(ExplainError::Disabled) => Explanation::fallback(result),
        Err(e) => {
            warn!(error = %e, expression, "Explanation unavailable, using fallback");
            Explanation::fallback(result)
        }
    }
}
