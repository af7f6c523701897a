use crate::gitlab::types::{JobStatus, PipelineStatus};

/// Semantic colour category for a CI status.
///
/// The theme decides which terminal colour each tone gets; nothing in this
/// module knows about colours directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tone {
    /// Finished successfully
    Positive,
    /// Failed or canceled
    Negative,
    /// Currently executing
    Active,
    /// Waiting on a human or deliberately skipped
    Attention,
    /// Created but not started
    NotStarted,
    /// Anything else, including values outside the known enumeration
    Neutral,
}

/// Display style for one status value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusStyle {
    pub tone: Tone,
    pub icon: &'static str,
}

/// Fallback for unmapped or absent statuses. Lookups never fail.
pub const DEFAULT_STYLE: StatusStyle = StatusStyle {
    tone: Tone::Neutral,
    icon: "·",
};

const SUCCESS_STYLE: StatusStyle = StatusStyle {
    tone: Tone::Positive,
    icon: "✓",
};

const FAILURE_STYLE: StatusStyle = StatusStyle {
    tone: Tone::Negative,
    icon: "✗",
};

const RUNNING_STYLE: StatusStyle = StatusStyle {
    tone: Tone::Active,
    icon: "⟳",
};

const ATTENTION_STYLE: StatusStyle = StatusStyle {
    tone: Tone::Attention,
    icon: "⏸",
};

const NOT_STARTED_STYLE: StatusStyle = StatusStyle {
    tone: Tone::NotStarted,
    icon: "○",
};

/// Shared mapping for pipeline and job statuses.
///
/// CANCELED styles like FAILED, MANUAL like SKIPPED; the remaining queue
/// states fall through to the neutral default.
fn ci_style(status: &str) -> StatusStyle {
    match status {
        "SUCCESS" => SUCCESS_STYLE,
        "FAILED" | "CANCELED" => FAILURE_STYLE,
        "RUNNING" => RUNNING_STYLE,
        "MANUAL" | "SKIPPED" => ATTENTION_STYLE,
        "CREATED" => NOT_STARTED_STYLE,
        _ => DEFAULT_STYLE,
    }
}

pub fn pipeline_style(status: PipelineStatus) -> StatusStyle {
    ci_style(status.as_str())
}

pub fn job_style(status: JobStatus) -> StatusStyle {
    ci_style(status.as_str())
}

/// Stage statuses arrive as free-form lowercase strings mirroring a subset
/// of the job statuses; unmapped strings get the neutral default.
pub fn stage_style(status: Option<&str>) -> StatusStyle {
    match status.unwrap_or_default() {
        "success" => SUCCESS_STYLE,
        "failed" | "canceled" => FAILURE_STYLE,
        "running" => RUNNING_STYLE,
        "manual" | "skipped" => ATTENTION_STYLE,
        _ => DEFAULT_STYLE,
    }
}
