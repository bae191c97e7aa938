//! Selection client: asks the model which action a prompt calls for.
//!
//! One request per prompt: the fixed system instruction from
//! [`actions::system_prompt`] plus the prompt verbatim. The reply must be a
//! JSON object with `selected_function`, `parameters` and `reasoning`.
//! Nothing here returns an error to the caller. Transport failures and
//! malformed replies both become [`Decision::DecodeFailed`], which the engine
//! scores as a miss.

use std::sync::Arc;
use std::time::Instant;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::actions;
use crate::providers::ChatProvider;
use crate::telemetry;
use crate::types::{ChatOptions, Decision, Message};
use crate::{Result, VedrError};

/// Default model queried for decisions.
pub const DEFAULT_MODEL: &str = "gpt-4";

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Issues structured function-selection requests through a [`ChatProvider`].
pub struct SelectionClient {
    provider: Arc<dyn ChatProvider>,
    options: ChatOptions,
    system_prompt: String,
}

impl SelectionClient {
    /// Create a client using the default model and temperature.
    pub fn new(provider: Arc<dyn ChatProvider>) -> Self {
        Self {
            provider,
            options: ChatOptions::default()
                .model(DEFAULT_MODEL)
                .temperature(DEFAULT_TEMPERATURE),
            system_prompt: actions::system_prompt(),
        }
    }

    /// Replace the request options (model, temperature, response format).
    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }

    /// Ask the provider for JSON-mode output.
    pub fn json_mode(mut self, enabled: bool) -> Self {
        self.options.json_mode = enabled;
        self
    }

    pub fn options(&self) -> &ChatOptions {
        &self.options
    }

    /// Request a decision for one prompt.
    pub async fn select(&self, prompt: &str) -> Decision {
        let messages = [
            Message::system(self.system_prompt.as_str()),
            Message::user(prompt),
        ];

        let start = Instant::now();
        let result = self.provider.chat(&messages, &self.options).await;
        metrics::histogram!(telemetry::SELECTION_DURATION_SECONDS,
            "provider" => self.provider.name().to_owned(),
        )
        .record(start.elapsed().as_secs_f64());

        let decision = match result {
            Ok(response) => match decode_reply(&response.content) {
                Ok(decision) => decision,
                Err(e) => {
                    warn!(error = %e, "error parsing model reply");
                    Decision::failed(response.content, e)
                }
            },
            Err(e) => {
                warn!(provider = self.provider.name(), error = %e, "selection request failed");
                Decision::failed(String::new(), e)
            }
        };

        debug!(selected = ?decision.selected_function(), "decision received");
        decision
    }
}

#[derive(Deserialize)]
struct WireDecision {
    selected_function: String,
    parameters: Map<String, Value>,
    reasoning: String,
}

/// Decode a model reply into a [`Decision::Decoded`].
///
/// Tolerates a surrounding markdown code fence; anything else that is not
/// exactly the three-field object is a [`VedrError::Decode`].
pub fn decode_reply(content: &str) -> Result<Decision> {
    let body = strip_code_fence(content);
    if body.is_empty() {
        return Err(VedrError::Decode("empty reply".to_string()));
    }
    let wire: WireDecision =
        serde_json::from_str(body).map_err(|e| VedrError::Decode(e.to_string()))?;
    Ok(Decision::Decoded {
        selected_function: wire.selected_function,
        parameters: wire.parameters,
        reasoning: wire.reasoning,
    })
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // drop the info string (e.g. "json") on the opening fence line
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}
