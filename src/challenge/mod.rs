//! Typed parsing of coaching challenge records.
//!
//! The remote service returns challenges whose useful fields are embedded in
//! a free-text `generated_challenge` blob using bold markers:
//!
//! ```text
//! **Challenge Title:** <title>\n
//! **Daily/Weekly Task:** | **Daily Task:** | **Weekly Task:** <body>\n\n**...
//! ... goal of GHS <digits> ...
//! ```

use serde::{Deserialize, Serialize};

const TITLE_MARKER: &str = "**Challenge Title:** ";
const SECTION_BREAK: &str = "\n\n**";
const GOAL_PHRASE: &str = "goal of ";
const DEFAULT_TITLE: &str = "Untitled Challenge";
const DEFAULT_GOAL: f64 = 500.0;
const DEFAULT_DURATION_DAYS: u32 = 30;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskCadence {
    DailyOrWeekly,
    Daily,
    Weekly,
}

impl TaskCadence {
    /// Markers in precedence order.
    const MARKERS: [(TaskCadence, &'static str); 3] = [
        (TaskCadence::DailyOrWeekly, "**Daily/Weekly Task:**"),
        (TaskCadence::Daily, "**Daily Task:**"),
        (TaskCadence::Weekly, "**Weekly Task:**"),
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChallengeTask {
    pub cadence: TaskCadence,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ChallengeText {
    Parsed {
        title: Option<String>,
        task: Option<ChallengeTask>,
        goal: Option<f64>,
    },
    Unparseable,
}

/// Parses the marker grammar. Text carrying neither a title nor a task
/// marker is `Unparseable`; a goal phrase alone is not enough.
pub fn parse_challenge_text(text: &str) -> ChallengeText {
    let title = extract_title(text);
    let task = extract_task(text);
    if title.is_none() && task.is_none() {
        return ChallengeText::Unparseable;
    }

    ChallengeText::Parsed {
        title,
        task,
        goal: extract_goal(text),
    }
}

fn extract_title(text: &str) -> Option<String> {
    let start = text.find(TITLE_MARKER)? + TITLE_MARKER.len();
    let rest = &text[start..];
    let line = rest.split('\n').next().unwrap_or_default().trim();
    (!line.is_empty()).then(|| line.to_string())
}

fn extract_task(text: &str) -> Option<ChallengeTask> {
    TaskCadence::MARKERS.iter().find_map(|(cadence, marker)| {
        let start = text.find(marker)? + marker.len();
        let rest = &text[start..];
        let body = match rest.find(SECTION_BREAK) {
            Some(end) => &rest[..end],
            None => rest,
        };
        Some(ChallengeTask {
            cadence: *cadence,
            text: body.trim().to_string(),
        })
    })
}

fn extract_goal(text: &str) -> Option<f64> {
    // ASCII lowercasing keeps byte offsets aligned with `text`.
    let lowered = text.to_ascii_lowercase();
    let mut search_from = 0;
    while let Some(found) = lowered[search_from..].find(GOAL_PHRASE) {
        let after = search_from + found + GOAL_PHRASE.len();
        if let Some(goal) = goal_amount(&text[after..]) {
            return Some(goal);
        }
        search_from = after;
    }
    None
}

/// Digit runs too long for `f64` saturate rather than being dropped.
fn goal_amount(rest: &str) -> Option<f64> {
    let rest = strip_prefix_ignore_ascii_case(rest, "GHS")
        .or_else(|| strip_prefix_ignore_ascii_case(rest, "GH₵"))
        .unwrap_or(rest)
        .trim_start();
    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if digits_end == 0 {
        return None;
    }
    rest[..digits_end]
        .parse::<f64>()
        .ok()
        .map(|goal| goal.min(f64::MAX))
}

fn strip_prefix_ignore_ascii_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let n = prefix.len();
    if s.is_char_boundary(n) && s.len() >= n && s[..n].eq_ignore_ascii_case(prefix) {
        Some(&s[n..])
    } else {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum NumberOrText {
    Number(f64),
    Text(String),
}

impl NumberOrText {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            NumberOrText::Number(v) => Some(*v).filter(|v| v.is_finite()),
            NumberOrText::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordId::Number(v) => write!(f, "{v}"),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

/// Challenge record as returned by the coaching backend.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ChallengeRecord {
    pub id: RecordId,
    pub generated_challenge: String,
    pub challenge_type: String,
    pub status: String,
    #[serde(default)]
    pub challenge_duration: Option<u32>,
    #[serde(default)]
    pub last_updated: Option<String>,
    #[serde(default)]
    pub progress: Option<NumberOrText>,
    #[serde(default)]
    pub financial_goal: Option<NumberOrText>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeKind {
    Savings,
    Investment,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedChallenge {
    pub id: String,
    pub title: String,
    pub description: String,
    pub kind: ChallengeKind,
    pub goal: f64,
    pub progress: f64,
    pub duration_days: u32,
    pub last_updated: Option<String>,
    pub is_completed: bool,
    pub text: ChallengeText,
}

impl ChallengeRecord {
    pub fn parse(&self) -> ParsedChallenge {
        let text = parse_challenge_text(&self.generated_challenge);
        let (title, description, text_goal) = match &text {
            ChallengeText::Parsed { title, task, goal } => (
                title.clone(),
                task.as_ref().map(|t| t.text.clone()),
                *goal,
            ),
            ChallengeText::Unparseable => (None, None, None),
        };

        let kind = if self.challenge_type.to_lowercase().contains("savings") {
            ChallengeKind::Savings
        } else {
            ChallengeKind::Investment
        };

        ParsedChallenge {
            id: self.id.to_string(),
            title: title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            description: description.unwrap_or_default(),
            kind,
            goal: text_goal
                .or_else(|| self.financial_goal.as_ref().and_then(NumberOrText::as_f64))
                .unwrap_or(DEFAULT_GOAL),
            progress: self
                .progress
                .as_ref()
                .and_then(NumberOrText::as_f64)
                .unwrap_or(0.0),
            duration_days: self
                .challenge_duration
                .filter(|d| *d > 0)
                .unwrap_or(DEFAULT_DURATION_DAYS),
            last_updated: self.last_updated.clone(),
            is_completed: self.status == "completed",
            text,
        }
    }
}
