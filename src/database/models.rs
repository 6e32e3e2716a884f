use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Storage format for every timestamp column. Lexicographic order matches
/// chronological order, so range filters can compare strings.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

pub fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}

pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Release channel of an uploaded build.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum BuildType {
    Alpha,
    #[default]
    Beta,
    RC,
    Production,
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildType::Alpha => write!(f, "Alpha"),
            BuildType::Beta => write!(f, "Beta"),
            BuildType::RC => write!(f, "RC"),
            BuildType::Production => write!(f, "Production"),
        }
    }
}

impl FromStr for BuildType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "alpha" => Ok(BuildType::Alpha),
            "beta" => Ok(BuildType::Beta),
            "rc" => Ok(BuildType::RC),
            "production" => Ok(BuildType::Production),
            _ => Err(format!("Unknown build type: {s}")),
        }
    }
}

/// Review state of a build.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum BuildStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildStatus::Pending => write!(f, "Pending"),
            BuildStatus::Approved => write!(f, "Approved"),
            BuildStatus::Rejected => write!(f, "Rejected"),
        }
    }
}

impl FromStr for BuildStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(BuildStatus::Pending),
            "approved" => Ok(BuildStatus::Approved),
            "rejected" => Ok(BuildStatus::Rejected),
            _ => Err(format!("Unknown build status: {s}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProjectRow {
    pub id: i64,
    pub name: String,
    pub package_name: String,
    pub description: Option<String>,
    pub icon_path: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BuildRow {
    pub id: i64,
    pub project_id: i64,
    pub uploaded_by: Option<String>,
    pub version_name: String,
    pub version_code: i64,
    pub build_type: String,
    pub release_notes: Option<String>,
    /// `None` once the archive has been pruned.
    pub file_path: Option<String>,
    pub file_size: i64,
    pub status: String,
    pub reviewed_by: Option<String>,
    pub review_remarks: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl BuildRow {
    pub fn status(&self) -> BuildStatus {
        self.status.parse().unwrap_or_default()
    }

    pub fn file_size_human(&self) -> String {
        human_size(self.file_size)
    }
}

/// Insert payload for a new build.
#[derive(Debug, Clone)]
pub struct NewBuild {
    pub project_id: i64,
    pub uploaded_by: Option<String>,
    pub version_name: String,
    pub version_code: i64,
    pub build_type: BuildType,
    pub release_notes: Option<String>,
    pub file_path: String,
    pub file_size: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ActivityRow {
    pub id: i64,
    pub actor: Option<String>,
    pub action: String,
    pub description: Option<String>,
    pub subject_type: Option<String>,
    pub subject_id: Option<i64>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ShareLinkRow {
    pub id: i64,
    pub build_id: i64,
    pub created_by: Option<String>,
    pub token: String,
    pub download_limit: Option<i64>,
    pub download_count: i64,
    pub expires_at: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub created_at: String,
}

impl ShareLinkRow {
    /// A link is usable until it expires or hits its download limit.
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        if let Some(expires_at) = self.expires_at.as_deref().and_then(parse_timestamp) {
            if expires_at <= now {
                return false;
            }
        }
        if let Some(limit) = self.download_limit {
            if self.download_count >= limit {
                return false;
            }
        }
        true
    }

    pub fn is_password_protected(&self) -> bool {
        self.password_hash.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DownloadRow {
    pub id: i64,
    pub build_id: i64,
    pub share_link_id: Option<i64>,
    pub downloaded_by: Option<String>,
    pub created_at: String,
}

/// Kind of a feedback report.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FeedbackType {
    Bug,
    Feature,
    Improvement,
}

impl fmt::Display for FeedbackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedbackType::Bug => write!(f, "Bug"),
            FeedbackType::Feature => write!(f, "Feature"),
            FeedbackType::Improvement => write!(f, "Improvement"),
        }
    }
}

impl FromStr for FeedbackType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bug" => Ok(FeedbackType::Bug),
            "feature" => Ok(FeedbackType::Feature),
            "improvement" => Ok(FeedbackType::Improvement),
            _ => Err(format!("Unknown feedback type: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Critical => write!(f, "Critical"),
            Severity::High => write!(f, "High"),
            Severity::Medium => write!(f, "Medium"),
            Severity::Low => write!(f, "Low"),
        }
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "critical" => Ok(Severity::Critical),
            "high" => Ok(Severity::High),
            "medium" => Ok(Severity::Medium),
            "low" => Ok(Severity::Low),
            _ => Err(format!("Unknown severity: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum FeedbackStatus {
    #[default]
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl fmt::Display for FeedbackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedbackStatus::Open => write!(f, "Open"),
            FeedbackStatus::InProgress => write!(f, "In Progress"),
            FeedbackStatus::Resolved => write!(f, "Resolved"),
            FeedbackStatus::Closed => write!(f, "Closed"),
        }
    }
}

impl FromStr for FeedbackStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_label(s).as_str() {
            "open" => Ok(FeedbackStatus::Open),
            "in progress" => Ok(FeedbackStatus::InProgress),
            "resolved" => Ok(FeedbackStatus::Resolved),
            "closed" => Ok(FeedbackStatus::Closed),
            _ => Err(format!("Unknown feedback status: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskPriority::Low => write!(f, "Low"),
            TaskPriority::Medium => write!(f, "Medium"),
            TaskPriority::High => write!(f, "High"),
            TaskPriority::Urgent => write!(f, "Urgent"),
        }
    }
}

impl FromStr for TaskPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(TaskPriority::Low),
            "medium" => Ok(TaskPriority::Medium),
            "high" => Ok(TaskPriority::High),
            "urgent" => Ok(TaskPriority::Urgent),
            _ => Err(format!("Unknown task priority: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Todo => write!(f, "Todo"),
            TaskStatus::InProgress => write!(f, "In Progress"),
            TaskStatus::Done => write!(f, "Done"),
        }
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_label(s).as_str() {
            "todo" => Ok(TaskStatus::Todo),
            "in progress" => Ok(TaskStatus::InProgress),
            "done" => Ok(TaskStatus::Done),
            _ => Err(format!("Unknown task status: {s}")),
        }
    }
}

/// What a comment thread is attached to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CommentSubject {
    Build,
    Feedback,
    Task,
}

impl CommentSubject {
    /// Value stored in `comments.subject_type`.
    pub fn as_str(self) -> &'static str {
        match self {
            CommentSubject::Build => "build",
            CommentSubject::Feedback => "feedback",
            CommentSubject::Task => "task",
        }
    }
}

impl fmt::Display for CommentSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommentSubject {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "build" => Ok(CommentSubject::Build),
            "feedback" => Ok(CommentSubject::Feedback),
            "task" => Ok(CommentSubject::Task),
            _ => Err(format!("Unknown comment subject: {s}")),
        }
    }
}

/// `"In_Progress"`, `"in-progress"` and `"In Progress"` all read the same.
fn normalize_label(s: &str) -> String {
    s.trim().to_lowercase().replace(['_', '-'], " ")
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct FeedbackRow {
    pub id: i64,
    pub build_id: i64,
    pub reported_by: Option<String>,
    pub feedback_type: String,
    pub severity: Option<String>,
    pub status: String,
    pub title: String,
    pub description: String,
    pub device_model: Option<String>,
    pub os_version: Option<String>,
    pub screen_size: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl FeedbackRow {
    pub fn status(&self) -> FeedbackStatus {
        self.status.parse().unwrap_or_default()
    }
}

/// Editable content of a feedback report.
#[derive(Debug, Clone)]
pub struct FeedbackDetails {
    pub feedback_type: FeedbackType,
    pub severity: Option<Severity>,
    pub status: FeedbackStatus,
    pub title: String,
    pub description: String,
    pub device_model: Option<String>,
    pub os_version: Option<String>,
    pub screen_size: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskRow {
    pub id: i64,
    pub build_id: i64,
    pub created_by: Option<String>,
    pub assignee: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub priority: String,
    pub status: String,
    /// `YYYY-MM-DD`.
    pub due_date: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl TaskRow {
    pub fn priority(&self) -> TaskPriority {
        self.priority.parse().unwrap_or_default()
    }

    pub fn status(&self) -> TaskStatus {
        self.status.parse().unwrap_or_default()
    }
}

/// Editable content of a task.
#[derive(Debug, Clone)]
pub struct TaskDetails {
    pub title: String,
    pub description: Option<String>,
    pub assignee: Option<String>,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub due_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CommentRow {
    pub id: i64,
    pub subject_type: String,
    pub subject_id: i64,
    pub parent_id: Option<i64>,
    pub author: Option<String>,
    pub body: String,
    pub created_at: String,
}

pub fn human_size(bytes: i64) -> String {
    let bytes = bytes.max(0) as f64;
    if bytes >= 1_048_576.0 {
        format!("{:.2} MB", bytes / 1_048_576.0)
    } else if bytes >= 1024.0 {
        format!("{:.2} KB", bytes / 1024.0)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
#[path = "tests/models_tests.rs"]
mod tests;
