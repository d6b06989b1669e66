//! MCP to Skill converter.
//!
//! Port of `openviking/core/mcp_converter.py`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A converted skill from MCP format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct McpSkill {
    /// Skill name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Full SKILL.md content (frontmatter + body).
    pub content: String,
}

/// JSON Schema style input schema.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct InputSchema {
    /// Property definitions.
    #[serde(default)]
    pub properties: HashMap<String, PropertyInfo>,
    /// Required field names.
    #[serde(default)]
    pub required: Vec<String>,
}

/// Property definition in an input schema.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PropertyInfo {
    /// Type name (string, number, etc.).
    #[serde(default, rename = "type")]
    pub type_name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
}

/// MCP tool config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpToolConfig {
    /// Tool name.
    #[serde(default)]
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Input schema.
    #[serde(default, rename = "inputSchema")]
    pub input_schema: Option<InputSchema>,
}

/// Convert an MCP tool definition to a [`McpSkill`].
pub fn mcp_to_skill(config: &McpToolConfig) -> McpSkill {
    let name = config.name.replace('_', "-");
    let name = if name.is_empty() {
        "unnamed-tool".to_string()
    } else {
        name
    };
    let description = &config.description;

    let mut body = format!("# {name}\n\n");
    if !description.is_empty() {
        body.push_str(description);
        body.push('\n');
    }

    if let Some(schema) = &config.input_schema {
        if !schema.properties.is_empty() {
            body.push_str("\n## Parameters\n\n");
            for (param_name, info) in &schema.properties {
                let typ = if info.type_name.is_empty() {
                    "any"
                } else {
                    &info.type_name
                };
                let req = if schema.required.contains(param_name) {
                    " (required)"
                } else {
                    " (optional)"
                };
                body.push_str(&format!(
                    "- **{param_name}** ({typ}){req}: {}\n",
                    info.description
                ));
            }
        }
    }

    body.push_str(&format!(
        "\n## Usage\n\nThis tool wraps the MCP tool `{name}`. \
         Call this when the user needs functionality matching the description above.\n"
    ));

    let content = format!(
        "---\nname: {name}\ndescription: {description}\n---\n\n{body}"
    );

    McpSkill {
        name,
        description: description.clone(),
        content,
    }
}

/// Check if a JSON value looks like an MCP tool config.
pub fn is_mcp_format(data: &serde_json::Value) -> bool {
    data.is_object() && data.get("inputSchema").is_some()
}
