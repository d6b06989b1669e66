//! SKILL.md loader and parser.
//!
//! Port of `openviking/core/skill_loader.py`.

use crate::error::{OvError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Parsed skill definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Skill {
    /// Skill name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Markdown body content.
    pub content: String,
    /// File the skill was loaded from.
    pub source_path: String,
    /// Allowed tool names.
    pub allowed_tools: Vec<String>,
    /// Tags for categorization.
    pub tags: Vec<String>,
}

/// Load and parse SKILL.md files.
pub struct SkillLoader;

impl SkillLoader {
    /// Load a skill from a file path.
    pub fn load(path: impl AsRef<Path>) -> Result<Skill> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            OvError::Storage(format!("Skill file not found: {}: {e}", path.display()))
        })?;
        Self::parse(&content, &path.display().to_string())
    }

    /// Parse SKILL.md content string.
    pub fn parse(content: &str, source_path: &str) -> Result<Skill> {
        let (frontmatter, body) = Self::split_frontmatter(content);

        let fm = frontmatter.ok_or_else(|| {
            OvError::Storage("SKILL.md must have YAML frontmatter".into())
        })?;

        let meta: HashMap<String, serde_json::Value> =
            serde_json::from_str(&Self::yaml_to_json(&fm)?).map_err(|e| {
                OvError::Storage(format!("Invalid YAML frontmatter: {e}"))
            })?;

        let name = meta
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| OvError::Storage("Skill must have 'name' field".into()))?
            .to_string();

        let description = meta
            .get("description")
            .and_then(|v| v.as_str())
            .ok_or_else(|| OvError::Storage("Skill must have 'description' field".into()))?
            .to_string();

        let allowed_tools = meta
            .get("allowed-tools")
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default();

        let tags = meta
            .get("tags")
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default();

        Ok(Skill {
            name,
            description,
            content: body.trim().to_string(),
            source_path: source_path.to_string(),
            allowed_tools,
            tags,
        })
    }

    /// Convert a skill back to SKILL.md format string.
    pub fn to_skill_md(skill: &Skill) -> String {
        format!(
            "---\nname: {}\ndescription: {}\n---\n\n{}",
            skill.name, skill.description, skill.content
        )
    }

    /// Split frontmatter (between `---`) from body.
    fn split_frontmatter(content: &str) -> (Option<String>, String) {
        if !content.starts_with("---") {
            return (None, content.to_string());
        }
        // Find second ---
        let rest = &content[3..];
        if let Some(end) = rest.find("\n---") {
            let fm = rest[..end].trim().to_string();
            let body = rest[end + 4..].to_string();
            (Some(fm), body)
        } else {
            (None, content.to_string())
        }
    }

    /// Minimal YAML key: value to JSON converter (handles simple flat YAML).
    fn yaml_to_json(yaml: &str) -> Result<String> {
        let mut map = serde_json::Map::new();
        let mut current_key: Option<String> = None;
        let mut current_list: Option<Vec<String>> = None;

        for line in yaml.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            // List item
            if trimmed.starts_with("- ") {
                if let Some(ref mut list) = current_list {
                    list.push(trimmed.strip_prefix("- ").unwrap().trim().to_string());
                }
                continue;
            }

            // Flush previous list
            if let (Some(key), Some(list)) = (current_key.take(), current_list.take()) {
                let arr: Vec<serde_json::Value> = list.into_iter().map(|s| serde_json::json!(s)).collect();
                map.insert(key, serde_json::Value::Array(arr));
            }

            // key: value
            if let Some(colon) = trimmed.find(':') {
                let key = trimmed[..colon].trim().to_string();
                let val = trimmed[colon + 1..].trim();
                if val.is_empty() {
                    // Could be a list follows
                    current_key = Some(key);
                    current_list = Some(Vec::new());
                } else {
                    map.insert(key, serde_json::Value::String(val.to_string()));
                }
            }
        }

        // Flush final list
        if let (Some(key), Some(list)) = (current_key, current_list) {
            let arr: Vec<serde_json::Value> = list.into_iter().map(|s| serde_json::json!(s)).collect();
            map.insert(key, serde_json::Value::Array(arr));
        }

        Ok(serde_json::to_string(&map).unwrap())
    }
}
