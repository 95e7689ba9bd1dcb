use archgraph_core::RawOperation;
use serde::Deserialize;
use serde_json::Value;

use crate::engine::AgentError;

#[derive(Deserialize)]
#[serde(untagged)]
enum Reply {
    Calls(Vec<RawOperation>),
    Wrapped { operations: Vec<RawOperation> },
    Single(RawOperation),
}

impl Reply {
    fn into_calls(self) -> Vec<RawOperation> {
        match self {
            Self::Calls(calls) | Self::Wrapped { operations: calls } => calls,
            Self::Single(call) => vec![call],
        }
    }
}

/// Read the function calls out of raw LLM output.
///
/// Accepts a JSON array of `{name, args}`, a single call, or `{"operations": [...]}`, with or
/// without surrounding prose or code fences. Objects that still parse are salvaged from a
/// malformed array. `[]` means the model chose to do nothing.
pub fn parse_function_calls(raw: &str) -> Result<Vec<RawOperation>, AgentError> {
    let body = strip_code_fence(raw);

    if let Ok(reply) = serde_json::from_str::<Reply>(body) {
        return Ok(normalize(reply.into_calls()));
    }

    if let Some(array) = extract_span(body, '[', ']') {
        if let Ok(calls) = serde_json::from_str::<Vec<RawOperation>>(array) {
            return Ok(normalize(calls));
        }
        let salvaged = salvage_objects(array);
        if !salvaged.is_empty() {
            return Ok(normalize(salvaged));
        }
    }

    if let Some(object) = extract_span(body, '{', '}') {
        if let Ok(reply) = serde_json::from_str::<Reply>(object) {
            return Ok(normalize(reply.into_calls()));
        }
    }

    Err(AgentError::Parse(
        "expected a JSON array of {\"name\", \"args\"} objects".to_string(),
    ))
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // drop the language tag line
    let rest = rest.split_once('\n').map_or(rest, |(_, body)| body);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

/// The substring from the first `open` to the last `close`.
fn extract_span(raw: &str, open: char, close: char) -> Option<&str> {
    let start = raw.find(open)?;
    let end = raw.rfind(close)?;
    if end <= start {
        return None;
    }
    Some(&raw[start..=end])
}

/// Try to parse individual top-level objects from a malformed JSON array.
fn salvage_objects(json_str: &str) -> Vec<RawOperation> {
    let inner = json_str
        .trim()
        .strip_prefix('[')
        .unwrap_or(json_str)
        .strip_suffix(']')
        .unwrap_or(json_str);

    let mut calls = Vec::new();
    let mut depth = 0usize;
    let mut start = None;
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in inner.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    if let Some(s) = start.take() {
                        if let Ok(call) = serde_json::from_str::<RawOperation>(&inner[s..=i]) {
                            calls.push(call);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    calls
}

/// Providers that mimic native tool calls send `args` as a JSON-encoded string.
fn normalize(calls: Vec<RawOperation>) -> Vec<RawOperation> {
    calls
        .into_iter()
        .map(|mut call| {
            if let Value::String(encoded) = &call.args {
                if let Ok(decoded) = serde_json::from_str::<Value>(encoded) {
                    call.args = decoded;
                }
            }
            call.name = call.name.trim().to_string();
            call
        })
        .collect()
}
