//! Action bodies.
//!
//! Every body follows the same shape: take a read-only snapshot of the
//! context it operates on, do the work (possibly streaming from the LLM or
//! querying the analyzer), and return zero or one new context for the
//! coordinator to apply. Bodies never touch history themselves.
//!
//! Cancellation points: before and between streamed chunks, and before
//! each analyzer call. A body that observes its token unwinds with
//! [`ActionError::Cancelled`] and the coordinator appends nothing; tokens
//! already streamed to observers are not retracted.
//!
//! A fragment whose text can no longer be read is pruned from the produced
//! context and surfaced as a recoverable [`WorkspaceEvent::FragmentDropped`],
//! never as a task failure.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use dossier_context::{auto, Context, OutputStyle, ParsedOutput};
use dossier_core::analyzer::{AnalyzerCell, Repository};
use dossier_core::events::{BaseEvent, WorkspaceEvent};
use dossier_core::units::CodeUnit;
use dossier_fragments::paste::PasteDescription;
use dossier_fragments::{units_mentioned_in, Fragment};
use dossier_llm::{CompletionRequest, LlmClient, StreamChunk};

use crate::emitter::EventEmitter;
use crate::errors::ActionError;
use crate::types::{Action, ContextOp, OrchestratorConfig};

/// Frozen summary used when the background paste summarizer fails.
const PASTE_SUMMARY_ERROR: &str = "(Error summarizing paste)";

/// Everything an action body needs, bundled for worker tasks.
pub struct ActionDeps {
    /// Latest-analyzer cell.
    pub cell: Arc<AnalyzerCell>,
    /// Version-control oracle.
    pub repo: Arc<dyn Repository>,
    /// LLM transport.
    pub llm: Arc<dyn LlmClient>,
    /// Orchestrator configuration.
    pub config: OrchestratorConfig,
    /// Event fan-out.
    pub emitter: EventEmitter,
}

/// Run one action body over a snapshot.
///
/// Pointer moves never reach this function; the coordinator handles them
/// inline.
pub async fn execute(
    action: Action,
    snapshot: Arc<Context>,
    deps: Arc<ActionDeps>,
    cancel: CancellationToken,
) -> Result<Option<Context>, ActionError> {
    let label = action.label();
    match action {
        Action::Code { instructions } => {
            llm_action(&deps, &cancel, &snapshot, &label, &instructions, OutputStyle::Code, false)
                .await
        }
        Action::Ask { question } => {
            llm_action(&deps, &cancel, &snapshot, &label, &question, OutputStyle::Markdown, false)
                .await
        }
        Action::Search { query } => {
            llm_action(&deps, &cancel, &snapshot, &label, &query, OutputStyle::Markdown, true)
                .await
        }
        Action::RunCommand { command } => {
            run_command(&deps, &cancel, &snapshot, &label, &command).await
        }
        Action::CaptureOutput => capture_output(&deps, &cancel, &snapshot, &label),
        Action::ContextOp(op) => context_op(&deps, &cancel, &snapshot, &label, op),
        Action::Undo { .. } | Action::Redo { .. } | Action::UndoTo { .. } => {
            unreachable!("pointer moves are handled by the coordinator")
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// LLM-backed actions
// ─────────────────────────────────────────────────────────────────────────────

#[allow(clippy::too_many_arguments)]
async fn llm_action(
    deps: &ActionDeps,
    cancel: &CancellationToken,
    snapshot: &Context,
    label: &str,
    instructions: &str,
    style: OutputStyle,
    capture_search_fragment: bool,
) -> Result<Option<Context>, ActionError> {
    if cancel.is_cancelled() {
        return Err(ActionError::Cancelled);
    }

    let base = prune(deps, snapshot);
    let output_description = format!("Output of {label}");

    if !deps.llm.is_available() {
        let parsed = ParsedOutput::failed(&output_description, "no LLM available");
        return finish(deps, cancel, base.with_parsed_output(parsed, label));
    }

    let request = CompletionRequest::new(render_for_llm(&base), instructions);
    let response = match stream_response(deps, cancel, &request).await? {
        Ok(text) => text,
        Err(message) => {
            warn!(label, %message, "LLM action failed; recording failure in history");
            let parsed = ParsedOutput::failed(&output_description, message);
            return finish(deps, cancel, base.with_parsed_output(parsed, label));
        }
    };

    let parsed = ParsedOutput::new(&output_description, &response, style);
    let next = if capture_search_fragment {
        // Cooperative check before touching the analyzer.
        if cancel.is_cancelled() {
            return Err(ActionError::Cancelled);
        }
        let sources = match deps.cell.current() {
            Ok(analyzer) => {
                units_mentioned_in(&response, analyzer.as_ref(), deps.repo.as_ref())
            }
            Err(_) => BTreeSet::new(),
        };
        let fragment = Arc::new(Fragment::Search {
            query: instructions.to_owned(),
            explanation: response,
            sources,
        });
        base.adding([fragment], label).with_parsed_output(parsed, label)
    } else {
        base.with_parsed_output(parsed, label)
    };

    finish(deps, cancel, next)
}

/// Stream the response, emitting each delta to observers.
///
/// `Ok(Ok(text))` is a complete response, `Ok(Err(message))` a failure to
/// be recorded in history, `Err(Cancelled)` a cooperative unwind.
async fn stream_response(
    deps: &ActionDeps,
    cancel: &CancellationToken,
    request: &CompletionRequest,
) -> Result<Result<String, String>, ActionError> {
    let mut stream = match deps.llm.stream(request).await {
        Ok(stream) => stream,
        Err(e) => return Ok(Err(e.to_string())),
    };

    let mut accumulated = String::new();
    loop {
        let chunk = tokio::select! {
            () = cancel.cancelled() => return Err(ActionError::Cancelled),
            chunk = stream.next() => chunk,
        };
        match chunk {
            None => break,
            Some(Ok(StreamChunk::Delta { delta })) => {
                deps.emitter.emit(WorkspaceEvent::OutputToken {
                    base: BaseEvent::now(),
                    delta: delta.clone(),
                });
                accumulated.push_str(&delta);
            }
            Some(Ok(StreamChunk::Done { text })) => return Ok(Ok(text)),
            Some(Err(e)) => return Ok(Err(e.to_string())),
        }
    }
    // Stream ended without a terminal chunk: a malformed response, but the
    // failure stays visible and undoable rather than aborting the action.
    if accumulated.is_empty() {
        Ok(Err("model returned no output".to_owned()))
    } else {
        Ok(Err(format!(
            "response ended without completing; partial output:\n{accumulated}"
        )))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Command and capture actions
// ─────────────────────────────────────────────────────────────────────────────

async fn run_command(
    deps: &ActionDeps,
    cancel: &CancellationToken,
    snapshot: &Context,
    label: &str,
    command: &str,
) -> Result<Option<Context>, ActionError> {
    if cancel.is_cancelled() {
        return Err(ActionError::Cancelled);
    }

    let base = prune(deps, snapshot);
    let output_description = format!("Output of {label}");

    let child = tokio::process::Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .kill_on_drop(true)
        .spawn();

    let child = match child {
        Ok(child) => child,
        Err(e) => {
            let parsed = ParsedOutput::failed(&output_description, e.to_string());
            return finish(deps, cancel, base.with_parsed_output(parsed, label));
        }
    };

    let output = tokio::select! {
        () = cancel.cancelled() => return Err(ActionError::Cancelled),
        output = child.wait_with_output() => output,
    };

    let parsed = match output {
        Ok(output) => {
            let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
            text.push_str(&String::from_utf8_lossy(&output.stderr));
            deps.emitter.emit(WorkspaceEvent::OutputToken {
                base: BaseEvent::now(),
                delta: text.clone(),
            });
            if output.status.success() {
                ParsedOutput::new(&output_description, text, OutputStyle::Plain)
            } else {
                ParsedOutput::failed(&output_description, text)
            }
        }
        Err(e) => ParsedOutput::failed(&output_description, e.to_string()),
    };

    finish(deps, cancel, base.with_parsed_output(parsed, label))
}

fn capture_output(
    deps: &ActionDeps,
    cancel: &CancellationToken,
    snapshot: &Context,
    label: &str,
) -> Result<Option<Context>, ActionError> {
    let Some(parsed) = snapshot.parsed_output() else {
        debug!("no parsed output to capture");
        return Ok(None);
    };
    let fragment = Arc::clone(&parsed.fragment);
    let base = prune(deps, snapshot);
    finish(deps, cancel, base.adding([fragment], label))
}

// ─────────────────────────────────────────────────────────────────────────────
// Context operations (no LLM)
// ─────────────────────────────────────────────────────────────────────────────

fn context_op(
    deps: &ActionDeps,
    cancel: &CancellationToken,
    snapshot: &Context,
    label: &str,
    op: ContextOp,
) -> Result<Option<Context>, ActionError> {
    if cancel.is_cancelled() {
        return Err(ActionError::Cancelled);
    }
    let base = prune(deps, snapshot);

    match op {
        ContextOp::Edit { files } => {
            let fragments = files
                .into_iter()
                .map(|f| Arc::new(Fragment::repo_path(f)));
            finish(deps, cancel, base.adding(fragments, label))
        }
        ContextOp::Read { repo, external } => {
            let fragments: Vec<Arc<Fragment>> = repo
                .into_iter()
                .map(|f| Arc::new(Fragment::repo_path(f)))
                .chain(
                    external
                        .into_iter()
                        .map(|f| Arc::new(Fragment::external_path(f))),
                )
                .collect();
            finish(deps, cancel, base.adding(fragments, label))
        }
        ContextOp::Summarize { files } => {
            let analyzer = deps
                .cell
                .current()
                .map_err(|e| ActionError::Failed {
                    message: e.to_string(),
                })?;

            let mut skeletons: BTreeMap<CodeUnit, String> = BTreeMap::new();
            for file in &files {
                for unit in analyzer.classes_in_file(file) {
                    if let Some(text) = analyzer.skeleton(&unit) {
                        let _ = skeletons.insert(unit, text);
                    }
                }
            }
            if skeletons.is_empty() {
                return Err(ActionError::Failed {
                    message: "no summarizable classes in selection".to_owned(),
                });
            }

            // The summary replaces the full-text fragments for these files.
            let replaced: BTreeSet<usize> = base
                .fragments()
                .iter()
                .enumerate()
                .filter(|(_, f)| {
                    matches!(f.as_ref(), Fragment::RepoPath { file } if files.contains(file))
                })
                .map(|(i, _)| i)
                .collect();
            let fragment = Arc::new(Fragment::Skeleton { skeletons });
            finish(
                deps,
                cancel,
                base.removing(&replaced, label).adding([fragment], label),
            )
        }
        ContextOp::Drop { positions } => {
            if positions.is_empty() {
                return Ok(None);
            }
            finish(deps, cancel, base.removing(&positions, label))
        }
        ContextOp::Copy { positions } => {
            let mut formatted = String::new();
            for (i, fragment) in base.fragments().iter().enumerate() {
                if !positions.is_empty() && !positions.contains(&i) {
                    continue;
                }
                if let Ok(text) = fragment.format() {
                    formatted.push_str(&text);
                }
            }
            deps.emitter.emit(WorkspaceEvent::OutputToken {
                base: BaseEvent::now(),
                delta: formatted,
            });
            Ok(None)
        }
        ContextOp::Paste { text } => {
            let (description, slot) = PasteDescription::pending();
            let fragment = Arc::new(Fragment::Paste { text: text.clone(), description });

            // Summarization continues in the background, detached from this
            // action's cancellation; the paste itself is already applied.
            let llm = Arc::clone(&deps.llm);
            drop(tokio::spawn(async move {
                let request = CompletionRequest::new(
                    text,
                    "Summarize the preceding content in one short phrase.",
                );
                let summary = match collect_response(llm.as_ref(), &request).await {
                    Some(summary) => summary,
                    None => PASTE_SUMMARY_ERROR.to_owned(),
                };
                slot.fill(summary);
            }));

            finish(deps, cancel, base.adding([fragment], label))
        }
    }
}

/// Drain a stream into its final text, for the background summarizer.
async fn collect_response(llm: &dyn LlmClient, request: &CompletionRequest) -> Option<String> {
    let mut stream = llm.stream(request).await.ok()?;
    let mut accumulated = String::new();
    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(StreamChunk::Delta { delta }) => accumulated.push_str(&delta),
            Ok(StreamChunk::Done { text }) => return Some(text),
            Err(_) => return None,
        }
    }
    (!accumulated.is_empty()).then_some(accumulated)
}

// ─────────────────────────────────────────────────────────────────────────────
// Shared helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Remove unreadable fragments from the snapshot, surfacing each removal
/// as a recoverable event.
fn prune(deps: &ActionDeps, snapshot: &Context) -> Context {
    let (pruned, dropped) = snapshot.pruning_unreadable();
    for fragment in dropped {
        warn!(fragment = %fragment.description(), "dropping unreadable fragment");
        deps.emitter.emit(WorkspaceEvent::FragmentDropped {
            base: BaseEvent::now(),
            description: fragment.description(),
            reason: "content unavailable".to_owned(),
        });
    }
    pruned
}

/// LLM-facing rendering of the working fragment set.
fn render_for_llm(context: &Context) -> String {
    let mut rendered = String::new();
    for fragment in context.fragments() {
        if let Ok(text) = fragment.format() {
            rendered.push_str(&text);
        }
    }
    rendered.push_str(&context.auto_context().format());
    rendered
}

/// Attach a freshly derived auto-context and wrap for the coordinator.
///
/// The derivation is recomputed from scratch; the final cooperative check
/// sits before the analyzer query.
fn finish(
    deps: &ActionDeps,
    cancel: &CancellationToken,
    context: Context,
) -> Result<Option<Context>, ActionError> {
    if cancel.is_cancelled() {
        return Err(ActionError::Cancelled);
    }
    let auto = auto::derive(
        &deps.cell,
        deps.repo.as_ref(),
        context.fragments(),
        deps.config.auto_context_enabled,
        deps.config.auto_context_top_k,
    );
    Ok(Some(context.with_auto_context(auto)))
}
