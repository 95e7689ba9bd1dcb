pub mod engine;
mod parse;
mod prompt;

use archgraph_core::{batch_update_validated, AiSettings, BatchReport, GraphNode};
use tracing::{debug, info};

pub use engine::AgentError;
pub use parse::parse_function_calls;
pub use prompt::{feedback_message, outline, system_prompt, user_message};

/// Turns kept in the prompt; older ones are dropped.
pub const MAX_HISTORY: usize = 8;

/// One finished turn: what was asked, what the model answered, what it was told back.
#[derive(Debug, Clone, PartialEq)]
pub struct Exchange {
    pub request: String,
    pub reply: String,
    pub feedback: String,
}

/// Everything a turn needs, passed explicitly by the caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnContext {
    pub graph: GraphNode,
    pub history: Vec<Exchange>,
}

impl TurnContext {
    pub fn new(graph: GraphNode) -> Self {
        Self {
            graph,
            history: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub report: BatchReport,
    pub feedback: String,
}

/// Ask the model for edits to `ctx.graph` and apply them.
///
/// On success the context holds the new graph and the exchange is appended to its history.
/// On error the context is unchanged.
pub async fn run_turn(
    settings: &AiSettings,
    ctx: &mut TurnContext,
    request: &str,
) -> Result<TurnOutcome, AgentError> {
    let system = prompt::system_prompt();
    let user_msg = prompt::user_message(ctx, request);

    info!(provider = %settings.provider, model = %settings.model, "sending turn");
    let raw = engine::generate(settings, &system, &user_msg).await?;
    debug!(%raw, "raw LLM output");
    apply_reply(ctx, request, &raw)
}

/// Apply a raw model reply to the context. Split out of [`run_turn`] so it runs without a provider.
pub fn apply_reply(
    ctx: &mut TurnContext,
    request: &str,
    raw: &str,
) -> Result<TurnOutcome, AgentError> {
    let calls = parse::parse_function_calls(raw)?;
    info!(calls = calls.len(), "parsed function calls");

    let report = batch_update_validated(&ctx.graph, &calls);
    let feedback = prompt::feedback_message(&report);
    ctx.graph = report.tree.clone();
    ctx.history.push(Exchange {
        request: request.to_string(),
        reply: raw.to_string(),
        feedback: feedback.clone(),
    });
    if ctx.history.len() > MAX_HISTORY {
        let excess = ctx.history.len() - MAX_HISTORY;
        ctx.history.drain(..excess);
    }
    Ok(TurnOutcome { report, feedback })
}
