//! Response Sequencer: drives the fixed demo chain against a server speaking
//! line-delimited JSON-RPC.
//!
//! listTools -> onThisDay(today) -> findPage(subject) -> getPage(subject)
//! -> getImagesForPage(subject). Each request is sent only after the reply to
//! the previous one has been handled. Replies are matched to requests through
//! an explicit pending map keyed by request id; ids are handed out in order
//! and never reused, so a retried step gets a fresh id.
//!
//! The state machine here does no I/O. `driver` feeds it lines and writes
//! whatever it asks to send.

pub mod driver;

use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;
use serde_json::{json, Value as JsonValue};

use crate::core::mcp::request;

pub const DEFAULT_SUBJECT: &str = "Albert Einstein";
pub const DEFAULT_RETRIES: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    ListTools,
    OnThisDay,
    FindPage,
    GetPage,
    GetImages,
}

impl Step {
    pub fn next(self) -> Option<Step> {
        match self {
            Step::ListTools => Some(Step::OnThisDay),
            Step::OnThisDay => Some(Step::FindPage),
            Step::FindPage => Some(Step::GetPage),
            Step::GetPage => Some(Step::GetImages),
            Step::GetImages => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Step::ListTools => "listTools",
            Step::OnThisDay => "onThisDay",
            Step::FindPage => "findPage",
            Step::GetPage => "getPage",
            Step::GetImages => "getImagesForPage",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Inputs for one run of the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainParams {
    /// `YYYY-MM-DD`
    pub date: String,
    pub subject: String,
    /// Re-issues allowed per step after a failed reply.
    pub retries: u32,
}

impl ChainParams {
    pub fn for_today(subject: impl Into<String>) -> Self {
        Self {
            date: chrono::Local::now().format("%Y-%m-%d").to_string(),
            subject: subject.into(),
            retries: DEFAULT_RETRIES,
        }
    }
}

impl Default for ChainParams {
    fn default() -> Self {
        Self::for_today(DEFAULT_SUBJECT)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ToolSummary {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepResult {
    /// Parsed JSON payload of a successful call.
    Payload(JsonValue),
    /// Text of a reply flagged `isError`.
    ToolError(String),
}

/// Everything gathered during one run, handed to `render_report` once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub tools: Vec<ToolSummary>,
    pub results: Vec<(Step, StepResult)>,
}

impl Session {
    pub fn result(&self, step: Step) -> Option<&StepResult> {
        self.results.iter().find(|(s, _)| *s == step).map(|(_, r)| r)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequencerState {
    Idle,
    Running,
    Completed,
    Aborted { step: Step, reason: String },
    Interrupted(String),
}

impl SequencerState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SequencerState::Completed | SequencerState::Aborted { .. } | SequencerState::Interrupted(_)
        )
    }
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    step: Step,
    attempt: u32,
}

pub struct Sequencer {
    params: ChainParams,
    next_id: u64,
    pending: HashMap<u64, Pending>,
    state: SequencerState,
    session: Session,
}

impl Sequencer {
    pub fn new(params: ChainParams) -> Self {
        Self {
            params,
            next_id: 1,
            pending: HashMap::new(),
            state: SequencerState::Idle,
            session: Session::default(),
        }
    }

    /// First request of the chain. `None` if already started.
    pub fn start(&mut self) -> Option<JsonValue> {
        if self.state != SequencerState::Idle {
            return None;
        }
        self.state = SequencerState::Running;
        Some(self.issue(Step::ListTools, 0))
    }

    /// Feed one reply line; returns the next request to send, if any.
    pub fn on_line(&mut self, line: &str) -> Option<JsonValue> {
        if self.state != SequencerState::Running {
            tracing::debug!(state = ?self.state, "reply after chain ended, dropped");
            return None;
        }
        let reply: JsonValue = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => return self.fail_sole_pending(format!("unparseable reply: {e}")),
        };
        let Some(id) = reply.get("id").and_then(JsonValue::as_u64) else {
            if let Some(err) = reply.get("error") {
                return self.fail_sole_pending(fault_reason(err));
            }
            tracing::warn!(reply = %reply, "reply without numeric id dropped");
            return None;
        };
        let Some(pending) = self.pending.remove(&id) else {
            tracing::warn!(id, "reply for unknown or stale id dropped");
            return None;
        };

        let outcome = self.evaluate(pending.step, &reply);
        self.advance(pending, outcome)
    }

    /// A reply that cannot be matched by id is charged to the in-flight step
    /// when there is exactly one.
    fn fail_sole_pending(&mut self, reason: String) -> Option<JsonValue> {
        if self.pending.len() != 1 {
            tracing::warn!(%reason, pending = self.pending.len(), "unattributable reply dropped");
            return None;
        }
        let id = self.pending.keys().next().copied()?;
        let pending = self.pending.remove(&id)?;
        self.advance(pending, Err(reason))
    }

    fn advance(&mut self, pending: Pending, outcome: Result<(), String>) -> Option<JsonValue> {
        match outcome {
            Ok(()) => match pending.step.next() {
                Some(step) => Some(self.issue(step, 0)),
                None => {
                    tracing::info!("chain completed");
                    self.state = SequencerState::Completed;
                    None
                }
            },
            Err(reason) if pending.attempt < self.params.retries => {
                tracing::warn!(step = %pending.step, attempt = pending.attempt + 1, %reason, "step failed, retrying");
                Some(self.issue(pending.step, pending.attempt + 1))
            }
            Err(reason) => {
                tracing::error!(step = %pending.step, %reason, "step failed, retry budget exhausted");
                self.state = SequencerState::Aborted { step: pending.step, reason };
                None
            }
        }
    }

    /// Stop the chain from outside (signal, server exit). No-op once terminal.
    pub fn interrupt(&mut self, reason: impl Into<String>) {
        if !self.state.is_terminal() {
            self.pending.clear();
            self.state = SequencerState::Interrupted(reason.into());
        }
    }

    pub fn state(&self) -> &SequencerState {
        &self.state
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn into_session(self) -> (Session, SequencerState) {
        (self.session, self.state)
    }

    fn issue(&mut self, step: Step, attempt: u32) -> JsonValue {
        let id = self.next_id;
        self.next_id += 1;
        self.pending.insert(id, Pending { step, attempt });
        let (method, params) = match step {
            Step::ListTools => ("tools/list", json!({})),
            Step::OnThisDay => ("tools/call", json!({ "name": "onThisDay", "arguments": { "date": self.params.date } })),
            Step::FindPage => ("tools/call", json!({ "name": "findPage", "arguments": { "query": self.params.subject } })),
            Step::GetPage => ("tools/call", json!({ "name": "getPage", "arguments": { "title": self.params.subject } })),
            Step::GetImages => (
                "tools/call",
                json!({ "name": "getImagesForPage", "arguments": { "title": self.params.subject } }),
            ),
        };
        tracing::debug!(id, %step, attempt, "sending request");
        request(id, method, params)
    }

    /// `Ok` means the chain may advance; `Err` carries why the reply is unusable.
    fn evaluate(&mut self, step: Step, reply: &JsonValue) -> Result<(), String> {
        if let Some(err) = reply.get("error") {
            return Err(fault_reason(err));
        }
        let result = reply.get("result").ok_or("reply has neither result nor error")?;

        if step == Step::ListTools {
            let tools = result.get("tools").ok_or("reply has no tools array")?;
            self.session.tools =
                serde_json::from_value(tools.clone()).map_err(|e| format!("malformed tools array: {e}"))?;
            return Ok(());
        }

        let text = result
            .pointer("/content/0/text")
            .and_then(JsonValue::as_str)
            .ok_or("reply has no text content")?;
        let outcome = if result.get("isError").and_then(JsonValue::as_bool).unwrap_or(false) {
            tracing::warn!(%step, error = text, "tool reported failure, continuing");
            StepResult::ToolError(text.to_owned())
        } else {
            StepResult::Payload(serde_json::from_str(text).map_err(|e| format!("content is not JSON: {e}"))?)
        };
        self.session.results.push((step, outcome));
        Ok(())
    }
}

fn fault_reason(err: &JsonValue) -> String {
    let code = err.get("code").and_then(JsonValue::as_i64).unwrap_or_default();
    let message = err.get("message").and_then(JsonValue::as_str).unwrap_or("no message");
    format!("{code}: {message}")
}

const IMAGES_SHOWN: usize = 10;

/// Plain-text report of a finished (or stopped) run.
pub fn render_report(session: &Session, state: &SequencerState) -> String {
    let mut out = String::new();
    let mut line = |s: String| {
        out.push_str(&s);
        out.push('\n');
    };

    line("Available tools".into());
    for tool in &session.tools {
        line(format!("  {}: {}", tool.name, tool.description));
    }

    for step in [Step::OnThisDay, Step::FindPage, Step::GetPage, Step::GetImages] {
        line(String::new());
        line(step.label().to_owned());
        match session.result(step) {
            None => line("  (no result)".into()),
            Some(StepResult::ToolError(text)) => line(format!("  error: {text}")),
            Some(StepResult::Payload(v)) => {
                for l in describe(step, v) {
                    line(format!("  {l}"));
                }
            }
        }
    }

    line(String::new());
    line(match state {
        SequencerState::Completed => "Status: completed".to_owned(),
        SequencerState::Aborted { step, reason } => format!("Status: aborted at {step}: {reason}"),
        SequencerState::Interrupted(reason) => format!("Status: interrupted: {reason}"),
        SequencerState::Idle | SequencerState::Running => "Status: incomplete".to_owned(),
    });
    out
}

fn describe(step: Step, v: &JsonValue) -> Vec<String> {
    let len = |key: &str| v.get(key).and_then(JsonValue::as_array).map_or(0, Vec::len);
    match step {
        Step::ListTools => Vec::new(),
        Step::OnThisDay => ["selected", "events", "births", "deaths", "holidays"]
            .iter()
            .map(|k| format!("{k}: {}", len(k)))
            .collect(),
        Step::FindPage => {
            let mut lines: Vec<String> = v
                .get("results")
                .and_then(JsonValue::as_array)
                .into_iter()
                .flatten()
                .filter_map(|hit| hit.get("title").and_then(JsonValue::as_str))
                .map(|t| format!("- {t}"))
                .collect();
            if let Some(s) = v.get("suggestion").and_then(JsonValue::as_str) {
                lines.push(format!("suggestion: {s}"));
            }
            lines
        }
        Step::GetPage => {
            let text = |key: &str| v.get(key).and_then(JsonValue::as_str).unwrap_or_default().to_owned();
            let extract = v.pointer("/summary/extract").and_then(JsonValue::as_str).unwrap_or_default();
            vec![
                format!("title: {}", text("title")),
                format!("url: {}", text("url")),
                format!("summary: {extract}"),
                format!("content: {} chars", text("content").chars().count()),
            ]
        }
        Step::GetImages => {
            let images = v.as_array().map(Vec::as_slice).unwrap_or_default();
            let mut lines: Vec<String> = images
                .iter()
                .take(IMAGES_SHOWN)
                .filter_map(|img| img.get("url").and_then(JsonValue::as_str))
                .map(|u| format!("- {u}"))
                .collect();
            lines.push(format!("showing {} of {} images", images.len().min(IMAGES_SHOWN), images.len()));
            lines
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ChainParams {
        ChainParams { date: "2024-03-14".into(), subject: "Albert Einstein".into(), retries: 1 }
    }

    fn id_of(req: &JsonValue) -> u64 {
        req["id"].as_u64().unwrap()
    }

    fn text_reply(id: u64, payload: JsonValue) -> String {
        json!({"jsonrpc":"2.0","id":id,"result":{"content":[{"type":"text","text":payload.to_string()}]}}).to_string()
    }

    fn tools_reply(id: u64) -> String {
        json!({"jsonrpc":"2.0","id":id,"result":{"tools":[
            {"name":"onThisDay","description":"Get historical events that occurred on a specific date","inputSchema":{}},
            {"name":"findPage","description":"Search for Wikipedia pages matching a query","inputSchema":{}}
        ]}})
        .to_string()
    }

    fn fault_reply(id: u64) -> String {
        json!({"jsonrpc":"2.0","id":id,"error":{"code":-32603,"message":"Internal error: boom"}}).to_string()
    }

    #[test]
    fn happy_path_uses_ids_one_to_five() {
        let mut seq = Sequencer::new(params());
        let mut req = seq.start().unwrap();
        assert_eq!(req["method"], "tools/list");
        let mut ids = vec![id_of(&req)];

        req = seq.on_line(&tools_reply(1)).unwrap();
        assert_eq!(req["params"]["arguments"]["date"], "2024-03-14");
        ids.push(id_of(&req));
        req = seq.on_line(&text_reply(2, json!({"events": [{"text": "x"}]}))).unwrap();
        assert_eq!(req["params"]["name"], "findPage");
        ids.push(id_of(&req));
        req = seq.on_line(&text_reply(3, json!({"results": [{"title": "Albert Einstein"}]}))).unwrap();
        assert_eq!(req["params"]["arguments"]["title"], "Albert Einstein");
        ids.push(id_of(&req));
        req = seq.on_line(&text_reply(4, json!({"title": "Albert Einstein", "url": "u"}))).unwrap();
        assert_eq!(req["params"]["name"], "getImagesForPage");
        ids.push(id_of(&req));
        assert!(seq.on_line(&text_reply(5, json!([]))).is_none());

        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        assert_eq!(*seq.state(), SequencerState::Completed);
        assert_eq!(seq.session().tools.len(), 2);
        assert_eq!(seq.session().results.len(), 4);
    }

    #[test]
    fn start_is_only_honored_once() {
        let mut seq = Sequencer::new(params());
        assert!(seq.start().is_some());
        assert!(seq.start().is_none());
    }

    #[test]
    fn unknown_and_duplicate_ids_are_dropped() {
        let mut seq = Sequencer::new(params());
        seq.start();
        assert!(seq.on_line(&tools_reply(42)).is_none());
        assert_eq!(*seq.state(), SequencerState::Running);
        assert!(seq.on_line(&tools_reply(1)).is_some());
        // id 1 was consumed; a second reply for it is stale
        assert!(seq.on_line(&tools_reply(1)).is_none());
        // a bare notification has no id and no error
        assert!(seq.on_line(r#"{"jsonrpc":"2.0","method":"notifications/message"}"#).is_none());
        assert_eq!(*seq.state(), SequencerState::Running);
    }

    #[test]
    fn failed_step_is_retried_under_a_fresh_id() {
        let mut seq = Sequencer::new(params());
        seq.start();
        let retry = seq.on_line(&fault_reply(1)).unwrap();
        assert_eq!(retry["method"], "tools/list");
        assert_eq!(id_of(&retry), 2);
        // the old id is gone
        assert!(seq.on_line(&tools_reply(1)).is_none());
        let next = seq.on_line(&tools_reply(2)).unwrap();
        assert_eq!(id_of(&next), 3);
        assert_eq!(next["params"]["name"], "onThisDay");
    }

    #[test]
    fn exhausted_retry_budget_aborts() {
        let mut seq = Sequencer::new(params());
        seq.start();
        seq.on_line(&tools_reply(1));
        seq.on_line(&text_reply(2, json!({})));
        let bad = json!({"jsonrpc":"2.0","id":3,"result":{"content":[{"type":"text","text":"<html>"}]}}).to_string();
        assert!(seq.on_line(&bad).is_some());
        let bad = json!({"jsonrpc":"2.0","id":4,"result":{"content":[]}}).to_string();
        assert!(seq.on_line(&bad).is_none());
        match seq.state() {
            SequencerState::Aborted { step, reason } => {
                assert_eq!(*step, Step::FindPage);
                assert!(reason.contains("no text content"));
            }
            other => panic!("expected abort, got {other:?}"),
        }
        // terminal: later replies change nothing
        assert!(seq.on_line(&text_reply(5, json!([]))).is_none());
    }

    #[test]
    fn garbled_reply_counts_against_the_in_flight_step() {
        let mut seq = Sequencer::new(params());
        seq.start();
        let retry = seq.on_line(r#"{"jsonrpc":"2.0","id":1,"result":{"tools":["#).unwrap();
        assert_eq!(retry["method"], "tools/list");
        assert_eq!(id_of(&retry), 2);
        assert!(seq.on_line("not json at all").is_none());
        match seq.state() {
            SequencerState::Aborted { step, reason } => {
                assert_eq!(*step, Step::ListTools);
                assert!(reason.starts_with("unparseable reply"));
            }
            other => panic!("expected abort, got {other:?}"),
        }
    }

    #[test]
    fn null_id_fault_counts_against_the_in_flight_step() {
        let mut seq = Sequencer::new(params());
        seq.start();
        seq.on_line(&tools_reply(1));
        let parse_error = r#"{"jsonrpc":"2.0","id":null,"error":{"code":-32700,"message":"parse error"}}"#;
        let retry = seq.on_line(parse_error).unwrap();
        assert_eq!(id_of(&retry), 3);
        assert_eq!(retry["params"]["name"], "onThisDay");
        assert!(seq.on_line(parse_error).is_none());
        assert_eq!(
            *seq.state(),
            SequencerState::Aborted { step: Step::OnThisDay, reason: "-32700: parse error".into() }
        );
    }

    #[test]
    fn zero_retries_aborts_on_first_failure() {
        let mut seq = Sequencer::new(ChainParams { retries: 0, ..params() });
        seq.start();
        assert!(seq.on_line(&fault_reply(1)).is_none());
        assert!(matches!(seq.state(), SequencerState::Aborted { step: Step::ListTools, .. }));
    }

    #[test]
    fn business_error_is_recorded_and_chain_advances() {
        let mut seq = Sequencer::new(params());
        seq.start();
        seq.on_line(&tools_reply(1));
        let failed = json!({"jsonrpc":"2.0","id":2,"result":{
            "content":[{"type":"text","text":"Error fetching on this day data: upstream status 503"}],
            "isError":true
        }})
        .to_string();
        let next = seq.on_line(&failed).unwrap();
        assert_eq!(next["params"]["name"], "findPage");
        assert_eq!(
            seq.session().result(Step::OnThisDay),
            Some(&StepResult::ToolError("Error fetching on this day data: upstream status 503".into()))
        );
    }

    #[test]
    fn interrupt_is_terminal_and_sticky() {
        let mut seq = Sequencer::new(params());
        seq.start();
        seq.interrupt("ctrl-c");
        assert!(seq.on_line(&tools_reply(1)).is_none());
        assert_eq!(*seq.state(), SequencerState::Interrupted("ctrl-c".into()));
        seq.interrupt("again");
        assert_eq!(*seq.state(), SequencerState::Interrupted("ctrl-c".into()));
    }

    #[test]
    fn today_params_use_iso_date() {
        let p = ChainParams::default();
        assert_eq!(p.subject, "Albert Einstein");
        assert_eq!(p.retries, 1);
        assert_eq!(p.date.len(), 10);
        assert_eq!(&p.date[4..5], "-");
    }

    #[test]
    fn report_lists_every_step_and_the_outcome() {
        let session = Session {
            tools: vec![ToolSummary { name: "findPage".into(), description: "Search".into() }],
            results: vec![
                (Step::FindPage, StepResult::Payload(json!({"results":[{"title":"Albert Einstein"}],"suggestion":"einstein"}))),
                (Step::GetPage, StepResult::ToolError("Error fetching page: not found: X".into())),
                (
                    Step::GetImages,
                    StepResult::Payload(json!((0..12).map(|n| json!({"url": format!("https://u/{n}.png"), "title": "t"})).collect::<Vec<_>>())),
                ),
            ],
        };
        let report = render_report(&session, &SequencerState::Aborted { step: Step::GetImages, reason: "x".into() });
        assert!(report.contains("  findPage: Search"));
        assert!(report.contains("- Albert Einstein"));
        assert!(report.contains("suggestion: einstein"));
        assert!(report.contains("error: Error fetching page: not found: X"));
        assert!(report.contains("showing 10 of 12 images"));
        assert!(report.contains("onThisDay\n  (no result)"));
        assert!(report.ends_with("Status: aborted at getImagesForPage: x\n"));
    }
}
