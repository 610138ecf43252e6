//! Visual-prompt flattening.
//!
//! A scene's visual prompt is expected to be a structured JSON specification,
//! but it is user-editable and model-produced, so it is never trusted to be
//! well-formed. This crate turns any input into a single natural-language
//! directive for a generation call. It never fails: malformed documents
//! degrade through best-effort extraction down to a generic summary.

use std::sync::OnceLock;

use regex::Regex;

use broll_models::{VisualSpec, PLACEHOLDER};

/// Summary used when nothing usable can be extracted from the prompt.
pub const FALLBACK_SUMMARY: &str = "Cinematic B-roll footage";

/// Cap on summaries salvaged from broken JSON documents.
const RAW_SUMMARY_MAX_CHARS: usize = 400;

/// Outcome of parsing a visual-prompt document.
///
/// The degraded path is a first-class variant rather than an error so the
/// flattener's behavior on broken input stays explicit and testable.
#[derive(Debug, Clone)]
pub enum ParsedPrompt {
    /// The document parsed as a structured specification.
    Structured(VisualSpec),
    /// The document is not valid JSON; carried verbatim.
    Raw(String),
}

/// Parse a visual-prompt document.
pub fn parse(prompt: &str) -> ParsedPrompt {
    match serde_json::from_str::<VisualSpec>(prompt) {
        Ok(spec) => ParsedPrompt::Structured(spec),
        Err(_) => ParsedPrompt::Raw(prompt.to_string()),
    }
}

/// Flatten a visual-prompt document into a single generation directive.
///
/// The result is non-empty, single-line, whitespace-normalized, and always
/// ends with the supplied style modifier. Pure and deterministic.
pub fn flatten(prompt: &str, style_modifier: &str) -> String {
    let (summary, details) = match parse(prompt) {
        ParsedPrompt::Structured(spec) => structured_parts(&spec),
        ParsedPrompt::Raw(text) => (raw_summary(&text), Vec::new()),
    };

    let summary = summary.trim();
    let summary = if summary.is_empty() {
        FALLBACK_SUMMARY
    } else {
        summary
    };

    let full = format!("{summary}. {} Style: {style_modifier}", details.join(". "));
    normalize_whitespace(&full)
}

/// Extract the summary and labeled detail clauses from a parsed spec.
///
/// Fields still holding the template placeholder are treated as absent.
fn structured_parts(spec: &VisualSpec) -> (String, Vec<String>) {
    let summary = filled(spec.scene.as_deref())
        .map(str::to_string)
        .unwrap_or_default();

    let mut details = Vec::new();

    if let Some(shot) = &spec.shot {
        if let Some(composition) = filled(shot.composition.as_deref()) {
            details.push(format!("Shot: {composition}"));
        }
        if let Some(motion) = filled(shot.camera_motion.as_deref()) {
            details.push(format!("Movement: {motion}"));
        }
    }

    if let Some(primary) = spec
        .lighting
        .as_ref()
        .and_then(|l| filled(l.primary.as_deref()))
    {
        details.push(format!("Lighting: {primary}"));
    }

    let actions: Vec<&str> = spec
        .timeline
        .iter()
        .filter_map(|entry| filled(entry.action.as_deref()))
        .collect();
    if !actions.is_empty() {
        details.push(format!("Action: {}", actions.join(", ")));
    }

    (summary, details)
}

/// Salvage a summary from a document that failed to parse.
fn raw_summary(text: &str) -> String {
    if text.trim_start().starts_with('{') {
        // Likely broken JSON: try to pull out the scene field directly.
        if let Some(scene) = extract_scene_field(text) {
            return scene;
        }
        // Last resort: strip structural punctuation and bound the length.
        text.chars()
            .filter(|c| !matches!(c, '{' | '}' | '"'))
            .take(RAW_SUMMARY_MAX_CHARS)
            .collect()
    } else {
        text.to_string()
    }
}

/// Best-effort regex extraction of the `scene` field from broken JSON.
fn extract_scene_field(text: &str) -> Option<String> {
    static SCENE_RE: OnceLock<Regex> = OnceLock::new();
    let re = SCENE_RE.get_or_init(|| Regex::new(r#""scene"\s*:\s*"([^"]+)""#).expect("valid regex"));

    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .and_then(|s| filled(Some(s)))
        .map(str::to_string)
}

/// A field value that is present, non-empty, and not the template sentinel.
fn filled(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty() && *v != PLACEHOLDER)
}

/// Collapse whitespace runs to single spaces and trim.
fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
