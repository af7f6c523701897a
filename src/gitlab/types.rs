use chrono::{DateTime, Utc};

/// An open merge request with its most recent pipeline data.
///
/// Immutable snapshot of what the API returned for one query; a re-fetch
/// replaces the whole list rather than patching individual fields.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeRequest {
    /// GraphQL Global ID (e.g., <gid://gitlab/MergeRequest/123>)
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub author: Option<Author>,
    /// Whether the source branch has diverged from its target and must be
    /// rebased before merge
    pub should_be_rebased: bool,
    pub web_url: Option<String>,
    /// Most-recent-first; the query caps this at one pipeline
    pub pipelines: Vec<Pipeline>,
}

impl MergeRequest {
    /// Short reference derived from the GraphQL Global ID
    /// (`gid://gitlab/MergeRequest/123` becomes `!123`). Falls back to the
    /// raw id when the tail is not numeric.
    pub fn reference(&self) -> String {
        self.id
            .rsplit('/')
            .next()
            .filter(|tail| !tail.is_empty() && tail.chars().all(|c| c.is_ascii_digit()))
            .map(|tail| format!("!{tail}"))
            .unwrap_or_else(|| self.id.clone())
    }

    /// The most recent pipeline, if the merge request has one.
    pub fn latest_pipeline(&self) -> Option<&Pipeline> {
        self.pipelines.first()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub name: String,
    pub avatar_url: Option<String>,
}

/// A single pipeline run with its stages.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    /// GraphQL Global ID (e.g., <gid://gitlab/Ci::Pipeline/456>)
    pub id: String,
    pub status: PipelineStatus,
    /// Ordered as defined in the pipeline configuration
    pub stages: Vec<Stage>,
}

/// A named group of jobs within a pipeline.
///
/// Stage names are only unique within one pipeline; UI state keys them
/// together with the parent merge request id.
#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    pub name: String,
    /// Free-form lowercase status string (e.g., "success", "running")
    pub status: Option<String>,
    pub jobs: Vec<Job>,
}

/// A single job execution within a stage.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    /// GraphQL Global ID; absent while GitLab is still provisioning the job
    pub id: Option<String>,
    pub name: String,
    pub status: JobStatus,
    pub started_at: Option<DateTime<Utc>>,
}

/// Pipeline status as reported by the GitLab GraphQL enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStatus {
    Created,
    WaitingForResource,
    Preparing,
    Pending,
    Running,
    Failed,
    Success,
    Canceled,
    Skipped,
    Manual,
    Scheduled,
    /// Any value outside the known enumeration
    Unknown,
}

impl PipelineStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PipelineStatus::Created => "CREATED",
            PipelineStatus::WaitingForResource => "WAITING_FOR_RESOURCE",
            PipelineStatus::Preparing => "PREPARING",
            PipelineStatus::Pending => "PENDING",
            PipelineStatus::Running => "RUNNING",
            PipelineStatus::Failed => "FAILED",
            PipelineStatus::Success => "SUCCESS",
            PipelineStatus::Canceled => "CANCELED",
            PipelineStatus::Skipped => "SKIPPED",
            PipelineStatus::Manual => "MANUAL",
            PipelineStatus::Scheduled => "SCHEDULED",
            PipelineStatus::Unknown => "UNKNOWN",
        }
    }
}

/// Job status as reported by the GitLab GraphQL enum.
///
/// Shares the pipeline value set; `Created` additionally marks jobs that
/// have not started yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    Created,
    WaitingForResource,
    Preparing,
    Pending,
    Running,
    Failed,
    Success,
    Canceled,
    Skipped,
    Manual,
    Scheduled,
    Unknown,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Created => "CREATED",
            JobStatus::WaitingForResource => "WAITING_FOR_RESOURCE",
            JobStatus::Preparing => "PREPARING",
            JobStatus::Pending => "PENDING",
            JobStatus::Running => "RUNNING",
            JobStatus::Failed => "FAILED",
            JobStatus::Success => "SUCCESS",
            JobStatus::Canceled => "CANCELED",
            JobStatus::Skipped => "SKIPPED",
            JobStatus::Manual => "MANUAL",
            JobStatus::Scheduled => "SCHEDULED",
            JobStatus::Unknown => "UNKNOWN",
        }
    }
}
