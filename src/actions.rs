//! The ten callable actions offered to the model.
//!
//! The evaluation only compares function names, so these are stubs: each
//! checks that its required arguments are present and non-empty and reports
//! what it would have done. They exist so a selected decision can be
//! replayed and so the system instruction is generated from one table.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::info;

use crate::{Result, VedrError};

/// Value shape an action parameter expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Text,
    List,
    Number,
}

/// Signature of one callable action.
#[derive(Debug, Clone, Copy)]
pub struct FunctionSpec {
    pub name: &'static str,
    pub params: &'static [(&'static str, ParamKind)],
}

impl FunctionSpec {
    pub fn param_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.params.iter().map(|(name, _)| *name)
    }

    /// Render as `name(a, b, c)` for the system instruction.
    pub fn signature(&self) -> String {
        let params: Vec<&str> = self.param_names().collect();
        format!("{}({})", self.name, params.join(", "))
    }
}

use ParamKind::{List, Number, Text};

/// All callable actions, in the order they are presented to the model.
pub const FUNCTIONS: [FunctionSpec; 10] = [
    FunctionSpec {
        name: "weatherCheck",
        params: &[("location", Text), ("date", Text)],
    },
    FunctionSpec {
        name: "scheduleAppointment",
        params: &[("date", Text), ("time", Text), ("purpose", Text)],
    },
    FunctionSpec {
        name: "sendMessage",
        params: &[("recipient", Text), ("content", Text)],
    },
    FunctionSpec {
        name: "searchWeb",
        params: &[("query", Text)],
    },
    FunctionSpec {
        name: "calculateMath",
        params: &[("expression", Text)],
    },
    FunctionSpec {
        name: "translateText",
        params: &[
            ("text", Text),
            ("source_language", Text),
            ("target_language", Text),
        ],
    },
    FunctionSpec {
        name: "playMedia",
        params: &[("title", Text), ("platform", Text)],
    },
    FunctionSpec {
        name: "orderFood",
        params: &[
            ("restaurant", Text),
            ("items", List),
            ("delivery_address", Text),
        ],
    },
    FunctionSpec {
        name: "findDirections",
        params: &[("origin", Text), ("destination", Text), ("mode", Text)],
    },
    FunctionSpec {
        name: "manageFinance",
        params: &[("action", Text), ("account", Text), ("amount", Number)],
    },
];

/// Look up an action by exact name.
pub fn find(name: &str) -> Option<&'static FunctionSpec> {
    FUNCTIONS.iter().find(|spec| spec.name == name)
}

/// The fixed system instruction enumerating every action and the reply shape.
pub fn system_prompt() -> String {
    let mut prompt = String::from(
        "You are an AI assistant that needs to select the most appropriate function \
         to call based on the user's request.\nAvailable functions are:\n",
    );
    for spec in &FUNCTIONS {
        prompt.push_str("- ");
        prompt.push_str(&spec.signature());
        prompt.push('\n');
    }
    prompt.push_str(
        "\nRespond with a JSON object containing:\n\
         {\n\
         \x20   \"selected_function\": \"function_name\",\n\
         \x20   \"parameters\": {param_name: param_value},\n\
         \x20   \"reasoning\": \"explanation of why this function was chosen\"\n\
         }\n",
    );
    prompt
}

/// Result of a successful stub invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionStatus {
    pub status: &'static str,
    pub message: String,
}

impl ActionStatus {
    fn success(message: String) -> Self {
        Self {
            status: "success",
            message,
        }
    }
}

/// Invoke the stub for `name` with the model-extracted parameters.
pub fn invoke(name: &str, parameters: &Map<String, Value>) -> Result<ActionStatus> {
    let spec = find(name).ok_or_else(|| VedrError::UnknownFunction(name.to_string()))?;
    validate(spec, parameters)?;

    let text = |key: &str| display_value(&parameters[key]);
    let message = match spec.name {
        "weatherCheck" => format!("Weather checked for {} on {}", text("location"), text("date")),
        "scheduleAppointment" => {
            format!("Appointment scheduled for {} at {}", text("date"), text("time"))
        }
        "sendMessage" => format!("Message sent to {}", text("recipient")),
        "searchWeb" => format!("Web search completed for: {}", text("query")),
        "calculateMath" => format!("Math calculation completed: {}", text("expression")),
        "translateText" => format!(
            "Text translated from {} to {}",
            text("source_language"),
            text("target_language")
        ),
        "playMedia" => format!("Playing {} on {}", text("title"), text("platform")),
        "orderFood" => format!("Order placed at {}", text("restaurant")),
        "findDirections" => format!(
            "Directions found from {} to {}",
            text("origin"),
            text("destination")
        ),
        "manageFinance" => format!("Finance action {} completed", text("action")),
        other => return Err(VedrError::UnknownFunction(other.to_string())),
    };

    info!(function = spec.name, %message, "action invoked");
    Ok(ActionStatus::success(message))
}

fn validate(spec: &FunctionSpec, parameters: &Map<String, Value>) -> Result<()> {
    let missing: Vec<&str> = spec
        .params
        .iter()
        .filter(|(param, kind)| !is_present(parameters.get(*param), *kind))
        .map(|(param, _)| *param)
        .collect();

    if missing.is_empty() {
        return Ok(());
    }
    let required: Vec<&str> = spec.param_names().collect();
    Err(VedrError::Validation {
        function: spec.name.to_string(),
        message: format!(
            "{} required (missing: {})",
            required.join(", "),
            missing.join(", ")
        ),
    })
}

fn is_present(value: Option<&Value>, kind: ParamKind) -> bool {
    match (value, kind) {
        (None | Some(Value::Null), _) => false,
        (Some(Value::String(s)), Text) => !s.trim().is_empty(),
        // models often send numbers as strings or vice versa
        (Some(Value::Number(_) | Value::Bool(_)), Text) => true,
        (Some(Value::Array(items)), List) => !items.is_empty(),
        (Some(Value::String(s)), List) => !s.trim().is_empty(),
        (Some(Value::Number(n)), Number) => n.as_f64().is_some_and(|v| v != 0.0),
        (Some(Value::String(s)), Number) => s.trim().parse::<f64>().is_ok_and(|v| v != 0.0),
        _ => false,
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(display_value)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}
