// SPDX-License-Identifier: MIT OR Apache-2.0
//! The platform-agnostic ticket record and its closed enumerations.

use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::slug::{
    BRANCH_SUMMARY_MAX_LENGTH, sanitize_for_branch_component, sanitize_title_for_branch,
};
use crate::value::parse_timestamp;
use ingot_error::TicketError;

// ---------------------------------------------------------------------------
// Platform
// ---------------------------------------------------------------------------

/// Supported issue tracking platforms.
///
/// Serializes as the uppercase name (`"JIRA"`, `"AZURE_DEVOPS"`, ...).
/// Deserialization of an unknown platform is an error — a ticket with a
/// wrong platform would corrupt everything keyed on it downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Platform {
    /// Atlassian Jira.
    Jira,
    /// GitHub Issues and Pull Requests.
    Github,
    /// Linear.
    Linear,
    /// Azure DevOps Boards work items.
    AzureDevops,
    /// Monday.com items.
    Monday,
    /// Trello cards.
    Trello,
}

impl Platform {
    /// All platforms, in declaration order.
    pub const ALL: &'static [Platform] = &[
        Platform::Jira,
        Platform::Github,
        Platform::Linear,
        Platform::AzureDevops,
        Platform::Monday,
        Platform::Trello,
    ];

    /// Stable uppercase name used in serialization and cache keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jira => "JIRA",
            Self::Github => "GITHUB",
            Self::Linear => "LINEAR",
            Self::AzureDevops => "AZURE_DEVOPS",
            Self::Monday => "MONDAY",
            Self::Trello => "TRELLO",
        }
    }

    /// Lowercase name, as the credential and configuration layers spell it.
    pub fn lower_name(&self) -> String {
        self.as_str().to_ascii_lowercase()
    }

    /// Parse a platform from its name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Platform> {
        match name.trim().to_ascii_uppercase().as_str() {
            "JIRA" => Some(Self::Jira),
            "GITHUB" => Some(Self::Github),
            "LINEAR" => Some(Self::Linear),
            "AZURE_DEVOPS" => Some(Self::AzureDevops),
            "MONDAY" => Some(Self::Monday),
            "TRELLO" => Some(Self::Trello),
            _ => None,
        }
    }

    /// Sorted uppercase names of all platforms.
    pub fn sorted_names() -> Vec<String> {
        let mut names: Vec<String> = Self::ALL.iter().map(|p| p.as_str().to_string()).collect();
        names.sort();
        names
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Platform {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Platform {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Platform::from_name(&s).ok_or_else(|| D::Error::custom(format!("unknown platform: {s:?}")))
    }
}

// ---------------------------------------------------------------------------
// TicketStatus
// ---------------------------------------------------------------------------

/// Normalized ticket status across platforms.
///
/// Serializes lowercase (`"in_progress"`). Unknown strings deserialize to
/// [`TicketStatus::Unknown`] so stale cache entries never crash a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TicketStatus {
    /// Ready or not yet started.
    Open,
    /// Actively being worked on.
    InProgress,
    /// In review, testing, or QA.
    Review,
    /// Work finished successfully.
    Done,
    /// Closed without completion (won't fix, canceled, archived).
    Closed,
    /// Blocked, stuck, or on hold.
    Blocked,
    /// Could not be determined.
    #[default]
    Unknown,
}

impl TicketStatus {
    /// Stable lowercase serialization form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Review => "review",
            Self::Done => "done",
            Self::Closed => "closed",
            Self::Blocked => "blocked",
            Self::Unknown => "unknown",
        }
    }

    /// Parse a serialized status; unknown values map to `Unknown`.
    pub fn from_str_lossy(s: &str) -> TicketStatus {
        match s {
            "open" => Self::Open,
            "in_progress" => Self::InProgress,
            "review" => Self::Review,
            "done" => Self::Done,
            "closed" => Self::Closed,
            "blocked" => Self::Blocked,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TicketStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TicketStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(TicketStatus::from_str_lossy(&String::deserialize(deserializer)?))
    }
}

// ---------------------------------------------------------------------------
// TicketType
// ---------------------------------------------------------------------------

/// Normalized ticket type, used downstream for semantic branch prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TicketType {
    /// New functionality, stories, enhancements.
    Feature,
    /// Defects and fixes.
    Bug,
    /// General tasks and chores.
    Task,
    /// Tech debt, refactoring, infrastructure.
    Maintenance,
    /// Could not be determined.
    #[default]
    Unknown,
}

impl TicketType {
    /// Stable lowercase serialization form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Feature => "feature",
            Self::Bug => "bug",
            Self::Task => "task",
            Self::Maintenance => "maintenance",
            Self::Unknown => "unknown",
        }
    }

    /// Parse a serialized type; unknown values map to `Unknown`.
    pub fn from_str_lossy(s: &str) -> TicketType {
        match s {
            "feature" => Self::Feature,
            "bug" => Self::Bug,
            "task" => Self::Task,
            "maintenance" => Self::Maintenance,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for TicketType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TicketType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TicketType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(TicketType::from_str_lossy(&String::deserialize(deserializer)?))
    }
}

// ---------------------------------------------------------------------------
// GenericTicket
// ---------------------------------------------------------------------------

/// Windows reserved filenames (case-insensitive).
const WINDOWS_RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Maximum length for filename stems.
const MAX_FILENAME_STEM_LENGTH: usize = 64;

/// Fallback summary when a present title sanitizes to nothing.
const FALLBACK_SUMMARY: &str = "unnamed-ticket";

/// Platform-agnostic ticket representation.
///
/// Every provider populates this record; the workflow engine downstream
/// interacts only with this shape. Immutable by convention after
/// normalization — the cache hands out owned clones, so no caller can
/// observe another caller's mutations.
#[derive(Debug, Clone, PartialEq)]
pub struct GenericTicket {
    /// Canonical identifier in platform-specific but stable form
    /// (`PROJ-123`, `owner/repo#42`, `org/project#123`, `board:item`).
    pub id: String,
    /// Source platform.
    pub platform: Platform,
    /// Canonical browse URL; empty when unreconstructable.
    pub url: String,
    /// Short human title.
    pub title: String,
    /// Long description; rich formats collapse to a placeholder with the raw
    /// structure retained in `platform_metadata`.
    pub description: String,
    /// Normalized status.
    pub status: TicketStatus,
    /// Normalized type.
    pub ticket_type: TicketType,
    /// Assignee display name, if any.
    pub assignee: Option<String>,
    /// Labels, trimmed and deduplicated of empties.
    pub labels: Vec<String>,
    /// Creation timestamp (UTC), if parseable.
    pub created_at: Option<DateTime<Utc>>,
    /// Last-update timestamp (UTC), if parseable.
    pub updated_at: Option<DateTime<Utc>>,
    /// Git-safe short slug derived from the title (≤ 50 chars, `[a-z0-9-]`).
    pub branch_summary: String,
    /// Complete raw ticket text for downstream prompt context.
    pub full_info: String,
    /// Platform-specific fields; always JSON-safe.
    pub platform_metadata: Map<String, Value>,
}

impl GenericTicket {
    /// Create a ticket with the given identity and all other fields empty.
    pub fn new(id: impl Into<String>, platform: Platform) -> Self {
        Self {
            id: id.into(),
            platform,
            url: String::new(),
            title: String::new(),
            description: String::new(),
            status: TicketStatus::Unknown,
            ticket_type: TicketType::Unknown,
            assignee: None,
            labels: Vec::new(),
            created_at: None,
            updated_at: None,
            branch_summary: String::new(),
            full_info: String::new(),
            platform_metadata: Map::new(),
        }
    }

    /// Human-readable ticket id for display.
    pub fn display_id(&self) -> &str {
        &self.id
    }

    /// Conventional-commits branch prefix for this ticket's type.
    pub fn semantic_branch_prefix(&self) -> &'static str {
        match self.ticket_type {
            TicketType::Feature => "feat",
            TicketType::Bug => "fix",
            TicketType::Task => "chore",
            TicketType::Maintenance => "refactor",
            TicketType::Unknown => "feature",
        }
    }

    /// Git-safe branch slug, without any semantic prefix.
    ///
    /// Format is `id` or `id-summary`, all `[a-z0-9-]`. When the ticket id
    /// sanitizes to nothing (emoji-only ids), a deterministic
    /// `ticket-<6 hex>` fallback derived from the raw id is used. When a
    /// present title sanitizes to nothing, the summary falls back to
    /// `unnamed-ticket`. The result always satisfies git ref rules: no
    /// `..`, no `@{`, no trailing `/`, no `.lock` suffix.
    pub fn branch_slug(&self) -> String {
        let mut safe_id = sanitize_for_branch_component(&self.id);
        if safe_id.is_empty() {
            safe_id = self.fallback_id();
        }

        let safe_summary = if !self.branch_summary.is_empty() {
            sanitize_title_for_branch(&self.branch_summary, BRANCH_SUMMARY_MAX_LENGTH)
        } else if !self.title.is_empty() {
            sanitize_title_for_branch(&self.title, BRANCH_SUMMARY_MAX_LENGTH)
        } else {
            String::new()
        };

        let safe_summary =
            if safe_summary.is_empty() && (!self.branch_summary.is_empty() || !self.title.is_empty()) {
                FALLBACK_SUMMARY.to_string()
            } else {
                safe_summary
            };

        let slug = if safe_summary.is_empty() {
            safe_id
        } else {
            format!("{safe_id}-{safe_summary}")
        };

        finalize_git_ref(&slug)
    }

    /// Filesystem-safe stem derived from the ticket id.
    ///
    /// Path separators, `#`, spaces, and other unsafe characters become
    /// underscores; Windows reserved names are prefixed; length is capped at
    /// 64. Never empty.
    pub fn safe_filename_stem(&self) -> String {
        if self.id.is_empty() {
            return "unknown-ticket".to_string();
        }

        let mut result = String::with_capacity(self.id.len());
        let mut last_underscore = false;
        for ch in self.id.chars() {
            let to_underscore = matches!(
                ch,
                '/' | '\\' | '#' | ' ' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '_'
            );
            if to_underscore {
                if !last_underscore {
                    result.push('_');
                }
                last_underscore = true;
            } else {
                result.push(ch);
                last_underscore = false;
            }
        }

        let mut result = result.trim_matches([' ', '.', '_']).to_string();
        if result.is_empty() {
            return "unknown-ticket".to_string();
        }

        if WINDOWS_RESERVED_NAMES.contains(&result.to_ascii_uppercase().as_str()) {
            result = format!("ticket_{result}");
        }

        if result.chars().count() > MAX_FILENAME_STEM_LENGTH {
            result = result.chars().take(MAX_FILENAME_STEM_LENGTH).collect();
            result = result.trim_end_matches(['_', '.', ' ']).to_string();
        }

        if result.is_empty() {
            "unknown-ticket".to_string()
        } else {
            result
        }
    }

    /// Deterministic fallback id: `ticket-` + first 6 hex of sha256(id).
    fn fallback_id(&self) -> String {
        let digest = Sha256::digest(self.id.as_bytes());
        let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
        format!("ticket-{}", &hex[..6])
    }

    /// Serialize to the stable JSON shape.
    ///
    /// Platform serializes to its uppercase name, status and type to their
    /// lowercase forms, timestamps to RFC 3339. `platform_metadata` is
    /// emitted as-is: it is JSON by construction, values with no JSON form
    /// having been degraded to a marker object at insertion time.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("id".into(), Value::String(self.id.clone()));
        map.insert("platform".into(), Value::String(self.platform.as_str().into()));
        map.insert("url".into(), Value::String(self.url.clone()));
        map.insert("title".into(), Value::String(self.title.clone()));
        map.insert("description".into(), Value::String(self.description.clone()));
        map.insert("status".into(), Value::String(self.status.as_str().into()));
        map.insert("type".into(), Value::String(self.ticket_type.as_str().into()));
        map.insert(
            "assignee".into(),
            self.assignee.clone().map(Value::String).unwrap_or(Value::Null),
        );
        map.insert(
            "labels".into(),
            Value::Array(self.labels.iter().cloned().map(Value::String).collect()),
        );
        map.insert(
            "created_at".into(),
            self.created_at
                .map(|dt| Value::String(dt.to_rfc3339()))
                .unwrap_or(Value::Null),
        );
        map.insert(
            "updated_at".into(),
            self.updated_at
                .map(|dt| Value::String(dt.to_rfc3339()))
                .unwrap_or(Value::Null),
        );
        map.insert("branch_summary".into(), Value::String(self.branch_summary.clone()));
        map.insert("full_info".into(), Value::String(self.full_info.clone()));
        map.insert(
            "platform_metadata".into(),
            Value::Object(self.platform_metadata.clone()),
        );
        Value::Object(map)
    }

    /// Deserialize from the JSON shape produced by [`GenericTicket::to_value`].
    ///
    /// Resilient to stale data: unknown status/type values become `Unknown`,
    /// unparseable timestamps become `None`, null labels/metadata become
    /// empty. An unknown platform or missing id is a hard error — both would
    /// corrupt everything keyed on them.
    pub fn from_value(data: &Value) -> Result<GenericTicket, TicketError> {
        let obj = data
            .as_object()
            .ok_or_else(|| TicketError::Validation("ticket data is not an object".into()))?;

        let platform_str = obj.get("platform").and_then(Value::as_str).unwrap_or("");
        let platform = Platform::from_name(platform_str).ok_or_else(|| {
            TicketError::Validation(format!("unknown platform: {platform_str:?}"))
        })?;

        let id = obj
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();
        if id.is_empty() {
            return Err(TicketError::Validation("ticket id is missing or empty".into()));
        }

        let get_str =
            |key: &str| obj.get(key).and_then(Value::as_str).unwrap_or("").to_string();
        let get_time = |key: &str| {
            obj.get(key)
                .and_then(Value::as_str)
                .and_then(parse_timestamp)
        };

        let labels = obj
            .get("labels")
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let platform_metadata = obj
            .get("platform_metadata")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        Ok(GenericTicket {
            id,
            platform,
            url: get_str("url"),
            title: get_str("title"),
            description: get_str("description"),
            status: TicketStatus::from_str_lossy(&get_str("status")),
            ticket_type: TicketType::from_str_lossy(&get_str("type")),
            assignee: obj
                .get("assignee")
                .and_then(Value::as_str)
                .map(str::to_string),
            labels,
            created_at: get_time("created_at"),
            updated_at: get_time("updated_at"),
            branch_summary: get_str("branch_summary"),
            full_info: get_str("full_info"),
            platform_metadata,
        })
    }
}

/// Apply final git ref safety rules to a slug.
///
/// These sequences cannot appear in sanitizer output, but the rules are
/// enforced here regardless so the guarantee holds for any caller.
fn finalize_git_ref(branch: &str) -> String {
    let mut b = branch.replace("..", "-").replace("@{", "-");
    while b.ends_with('/') {
        b.pop();
    }
    if let Some(stripped) = b.strip_suffix(".lock") {
        b = stripped.to_string();
    }
    // Collapse hyphen runs introduced by the replacements above.
    let mut collapsed = String::with_capacity(b.len());
    let mut last_hyphen = false;
    for ch in b.chars() {
        if ch == '-' {
            if !last_hyphen {
                collapsed.push('-');
            }
            last_hyphen = true;
        } else {
            collapsed.push(ch);
            last_hyphen = false;
        }
    }
    collapsed.trim_end_matches('-').to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ticket(id: &str, title: &str) -> GenericTicket {
        let mut t = GenericTicket::new(id, Platform::Jira);
        t.title = title.to_string();
        t
    }

    // -- Platform --------------------------------------------------------

    #[test]
    fn platform_names_roundtrip() {
        for p in Platform::ALL {
            assert_eq!(Platform::from_name(p.as_str()), Some(*p));
            assert_eq!(Platform::from_name(&p.as_str().to_lowercase()), Some(*p));
        }
    }

    #[test]
    fn platform_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Platform::AzureDevops).unwrap(), "\"AZURE_DEVOPS\"");
        let back: Platform = serde_json::from_str("\"azure_devops\"").unwrap();
        assert_eq!(back, Platform::AzureDevops);
    }

    #[test]
    fn unknown_platform_fails_deserialization() {
        assert!(serde_json::from_str::<Platform>("\"GITLAB\"").is_err());
    }

    #[test]
    fn sorted_names_are_sorted() {
        let names = Platform::sorted_names();
        let mut expect = names.clone();
        expect.sort();
        assert_eq!(names, expect);
        assert_eq!(names.len(), 6);
    }

    // -- Status / Type ---------------------------------------------------

    #[test]
    fn status_lossy_parse() {
        assert_eq!(TicketStatus::from_str_lossy("in_progress"), TicketStatus::InProgress);
        assert_eq!(TicketStatus::from_str_lossy("on-fire"), TicketStatus::Unknown);
        let back: TicketStatus = serde_json::from_str("\"someday\"").unwrap();
        assert_eq!(back, TicketStatus::Unknown);
    }

    #[test]
    fn type_lossy_parse() {
        assert_eq!(TicketType::from_str_lossy("bug"), TicketType::Bug);
        assert_eq!(TicketType::from_str_lossy("saga"), TicketType::Unknown);
    }

    // -- Branch slug -----------------------------------------------------

    #[test]
    fn slug_combines_id_and_title() {
        let t = ticket("PROJ-123", "Fix login bug");
        assert_eq!(t.branch_slug(), "proj-123-fix-login-bug");
    }

    #[test]
    fn slug_prefers_branch_summary() {
        let mut t = ticket("PROJ-123", "Some Title");
        t.branch_summary = "custom-summary".into();
        assert_eq!(t.branch_slug(), "proj-123-custom-summary");
    }

    #[test]
    fn slug_without_title_is_id_only() {
        let t = ticket("PROJ-7", "");
        assert_eq!(t.branch_slug(), "proj-7");
    }

    #[test]
    fn slug_for_github_style_id() {
        let t = ticket("owner/repo#42", "Add CI");
        assert_eq!(t.branch_slug(), "owner-repo-42-add-ci");
    }

    #[test]
    fn emoji_only_id_uses_deterministic_fallback() {
        let t = ticket("💥🔥", "");
        let slug = t.branch_slug();
        assert!(slug.starts_with("ticket-"), "got {slug}");
        assert_eq!(slug.len(), "ticket-".len() + 6);
        assert!(slug["ticket-".len()..].chars().all(|c| c.is_ascii_hexdigit()));
        // Deterministic across invocations.
        assert_eq!(slug, ticket("💥🔥", "").branch_slug());
        // Different raw ids hash differently.
        assert_ne!(slug, ticket("✨", "").branch_slug());
    }

    #[test]
    fn symbol_only_title_falls_back_to_unnamed() {
        let t = ticket("PROJ-9", "!!!");
        assert_eq!(t.branch_slug(), "proj-9-unnamed-ticket");
    }

    #[test]
    fn slug_is_git_ref_safe() {
        let t = ticket("weird..id@{}", "branch.lock");
        let slug = t.branch_slug();
        assert!(!slug.contains(".."));
        assert!(!slug.contains("@{"));
        assert!(!slug.ends_with('/'));
        assert!(!slug.ends_with(".lock"));
        assert!(!slug.ends_with('-'));
    }

    #[test]
    fn slug_summary_respects_length_cap() {
        let t = ticket("PROJ-1", &"very long title ".repeat(20));
        let slug = t.branch_slug();
        let summary = &slug["proj-1-".len()..];
        assert!(summary.len() <= 50, "summary was {} chars", summary.len());
    }

    // -- Filename stem ---------------------------------------------------

    #[test]
    fn stem_neutralizes_path_separators() {
        let t = ticket("owner/repo#42", "");
        assert_eq!(t.safe_filename_stem(), "owner_repo_42");
    }

    #[test]
    fn stem_preserves_plain_ids() {
        assert_eq!(ticket("TEST-123", "").safe_filename_stem(), "TEST-123");
    }

    #[test]
    fn stem_prefixes_windows_reserved_names() {
        assert_eq!(ticket("CON", "").safe_filename_stem(), "ticket_CON");
        assert_eq!(ticket("com1", "").safe_filename_stem(), "ticket_com1");
    }

    #[test]
    fn stem_never_empty() {
        assert_eq!(ticket("", "").safe_filename_stem(), "unknown-ticket");
        assert_eq!(ticket("...", "").safe_filename_stem(), "unknown-ticket");
    }

    #[test]
    fn stem_caps_length() {
        let t = ticket(&"x".repeat(200), "");
        assert_eq!(t.safe_filename_stem().chars().count(), 64);
    }

    #[test]
    fn stem_strips_leading_dots() {
        assert_eq!(ticket(".hidden", "").safe_filename_stem(), "hidden");
    }

    // -- Serialization ---------------------------------------------------

    fn full_ticket() -> GenericTicket {
        let mut t = GenericTicket::new("PROJ-123", Platform::Jira);
        t.url = "https://company.atlassian.net/browse/PROJ-123".into();
        t.title = "Fix login bug".into();
        t.description = "Users cannot login".into();
        t.status = TicketStatus::InProgress;
        t.ticket_type = TicketType::Bug;
        t.assignee = Some("Alice".into());
        t.labels = vec!["backend".into(), "auth".into()];
        t.created_at = parse_timestamp("2024-01-15T10:30:00Z");
        t.updated_at = parse_timestamp("2024-01-16T14:20:00+0000");
        t.branch_summary = "fix-login-bug".into();
        t.platform_metadata
            .insert("project_key".into(), json!("PROJ"));
        t
    }

    #[test]
    fn to_value_matches_contract_shape() {
        let v = full_ticket().to_value();
        assert_eq!(v["platform"], json!("JIRA"));
        assert_eq!(v["status"], json!("in_progress"));
        assert_eq!(v["type"], json!("bug"));
        assert_eq!(v["assignee"], json!("Alice"));
        assert_eq!(v["created_at"], json!("2024-01-15T10:30:00+00:00"));
        assert_eq!(v["labels"], json!(["backend", "auth"]));
        assert_eq!(v["full_info"], json!(""));
        assert_eq!(v["platform_metadata"]["project_key"], json!("PROJ"));
    }

    #[test]
    fn value_roundtrip_is_lossless() {
        let t = full_ticket();
        let back = GenericTicket::from_value(&t.to_value()).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn roundtrip_with_null_optionals() {
        let t = GenericTicket::new("T-1", Platform::Trello);
        let back = GenericTicket::from_value(&t.to_value()).unwrap();
        assert_eq!(back, t);
        assert!(back.assignee.is_none());
        assert!(back.created_at.is_none());
    }

    #[test]
    fn from_value_unknown_enums_degrade() {
        let v = json!({
            "id": "X-1",
            "platform": "JIRA",
            "url": "",
            "status": "weird-status",
            "type": "weird-type",
        });
        let t = GenericTicket::from_value(&v).unwrap();
        assert_eq!(t.status, TicketStatus::Unknown);
        assert_eq!(t.ticket_type, TicketType::Unknown);
    }

    #[test]
    fn from_value_unknown_platform_is_error() {
        let v = json!({"id": "X-1", "platform": "BUGZILLA"});
        assert!(GenericTicket::from_value(&v).is_err());
    }

    #[test]
    fn from_value_missing_id_is_error() {
        let v = json!({"platform": "JIRA"});
        assert!(GenericTicket::from_value(&v).is_err());
    }

    #[test]
    fn from_value_bad_timestamp_degrades_to_none() {
        let v = json!({"id": "X-1", "platform": "JIRA", "created_at": "not a date"});
        let t = GenericTicket::from_value(&v).unwrap();
        assert!(t.created_at.is_none());
    }

    #[test]
    fn semantic_prefix_mapping() {
        let mut t = GenericTicket::new("A-1", Platform::Linear);
        t.ticket_type = TicketType::Bug;
        assert_eq!(t.semantic_branch_prefix(), "fix");
        t.ticket_type = TicketType::Unknown;
        assert_eq!(t.semantic_branch_prefix(), "feature");
    }
}
