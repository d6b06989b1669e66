//! Heuristic memory extraction from a committed conversation transcript.
//!
//! `MemoryExtractor` is the pluggable contract; `HeuristicExtractor` is the
//! deterministic default implementation described for offline/test use —
//! keyword and sentence-boundary based candidate generation, no LLM call.

use serde::{Deserialize, Serialize};

use crate::session::{Message, Role};

/// Category a candidate memory falls into, driving where it's stored and
/// whether it's merged into an existing note rather than appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryCategory {
    Profile,
    Preferences,
    Events,
    Technical,
    Cases,
    Patterns,
}

impl MemoryCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::Preferences => "preferences",
            Self::Events => "events",
            Self::Technical => "technical",
            Self::Cases => "cases",
            Self::Patterns => "patterns",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "profile" => Self::Profile,
            "preferences" => Self::Preferences,
            "events" => Self::Events,
            "technical" => Self::Technical,
            "cases" => Self::Cases,
            _ => Self::Patterns,
        }
    }

    /// Storage path relative to the owning memory space.
    pub fn directory(&self) -> &'static str {
        match self {
            Self::Profile => "memories/profile.md",
            Self::Preferences => "memories/preferences.md",
            Self::Events => "memories/events",
            Self::Technical => "memories/technical.md",
            Self::Cases => "memories/cases",
            Self::Patterns => "memories/patterns.md",
        }
    }

    /// Categories stored as a single file always get merged into the
    /// existing note rather than appended as a new leaf context.
    pub fn always_merge(&self) -> bool {
        matches!(self, Self::Profile | Self::Preferences | Self::Technical | Self::Patterns)
    }
}

/// A memory extracted from a transcript, not yet committed to storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateMemory {
    pub session_id: String,
    pub user_id: String,
    pub category: MemoryCategory,
    pub content: String,
    pub language: String,
}

/// Outcome of one extraction pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionStats {
    pub created: usize,
    pub merged: usize,
    pub skipped_duplicate: usize,
}

/// Pluggable memory-extraction contract. The heuristic default below stands
/// in for an LLM consolidation step.
pub trait MemoryExtractor: Send + Sync {
    fn extract(&self, messages: &[Message], session_id: &str, user_id: &str) -> Vec<CandidateMemory>;
}

/// Deterministic, keyword/sentence-boundary based extractor.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicExtractor;

impl MemoryExtractor for HeuristicExtractor {
    fn extract(&self, messages: &[Message], session_id: &str, user_id: &str) -> Vec<CandidateMemory> {
        extract_candidates(messages, session_id, user_id)
    }
}

const MIN_CONTENT_LEN: usize = 20;

const PREFERENCE_MARKERS: &[&str] = &["i prefer", "i like", "i always use", "i usually", "i want", "please use"];
const PROFILE_MARKERS: &[&str] = &["my name is", "i am a", "i'm a", "i work as", "i live in"];
const EVENT_MARKERS: &[&str] = &["yesterday", "last week", "tomorrow", "next friday", "on monday", "scheduled"];
const TECHNICAL_MARKERS: &[&str] = &["i use", "my ide", "i always use rust", "programming language", "framework"];

/// Detect the dominant script in a batch of user messages. Falls back to
/// `"en"` for empty input or text with no recognizable non-Latin script.
pub fn detect_language(messages: &[Message]) -> &'static str {
    let text: String = messages
        .iter()
        .filter(|m| m.role == Role::User)
        .map(|m| m.content())
        .collect::<Vec<_>>()
        .join(" ");

    if text.is_empty() {
        return "en";
    }

    let mut han = 0usize;
    let mut kana = 0usize;
    let mut cyrillic = 0usize;
    for c in text.chars() {
        let cp = c as u32;
        if (0x3040..=0x30FF).contains(&cp) {
            kana += 1;
        } else if (0x4E00..=0x9FFF).contains(&cp) {
            han += 1;
        } else if (0x0400..=0x04FF).contains(&cp) {
            cyrillic += 1;
        }
    }

    if kana > 0 {
        "ja"
    } else if han > 0 {
        "zh-CN"
    } else if cyrillic > 0 {
        "ru"
    } else {
        "en"
    }
}

fn classify(sentence: &str) -> Option<MemoryCategory> {
    let lower = sentence.to_lowercase();
    if PREFERENCE_MARKERS.iter().any(|m| lower.contains(m)) {
        Some(MemoryCategory::Preferences)
    } else if PROFILE_MARKERS.iter().any(|m| lower.contains(m)) {
        Some(MemoryCategory::Profile)
    } else if EVENT_MARKERS.iter().any(|m| lower.contains(m)) {
        Some(MemoryCategory::Events)
    } else if TECHNICAL_MARKERS.iter().any(|m| lower.contains(m)) {
        Some(MemoryCategory::Technical)
    } else {
        None
    }
}

/// Extract candidate memories from the user turns of a transcript using
/// keyword/sentence-boundary heuristics. Assistant-only transcripts never
/// produce candidates — memories describe the user, not the assistant.
pub fn extract_candidates(messages: &[Message], session_id: &str, user_id: &str) -> Vec<CandidateMemory> {
    let language = detect_language(messages);
    let mut candidates = Vec::new();

    for msg in messages.iter().filter(|m| m.role == Role::User) {
        let content = msg.content();
        for sentence in content.split(|c| c == '.' || c == '!' || c == '?' || c == '\n') {
            let sentence = sentence.trim();
            if sentence.chars().count() < MIN_CONTENT_LEN {
                continue;
            }
            if let Some(category) = classify(sentence) {
                candidates.push(CandidateMemory {
                    session_id: session_id.to_string(),
                    user_id: user_id.to_string(),
                    category,
                    content: sentence.to_string(),
                    language: language.to_string(),
                });
            }
        }
    }

    candidates
}
