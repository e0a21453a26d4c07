use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use tracing::info;

/// One entry of the content file. The calendar never looks inside it; only
/// its position in the list matters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskContent {
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl TaskContent {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            link: None,
            code: None,
            extra: BTreeMap::new(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ContentFile {
    List(Vec<TaskContent>),
    Wrapped { tasks: Vec<TaskContent> },
}

/// Parses a content document: either a bare JSON array of tasks or an
/// object with a `tasks` array.
pub fn parse_tasks(raw: &str) -> anyhow::Result<Vec<TaskContent>> {
    let parsed: ContentFile = serde_json::from_str(raw)
        .map_err(|e| anyhow!("content must be a task array or an object with `tasks`: {e}"))?;
    Ok(match parsed {
        ContentFile::List(tasks) | ContentFile::Wrapped { tasks } => tasks,
    })
}

#[tracing::instrument]
pub fn load_tasks(path: &Path) -> anyhow::Result<Vec<TaskContent>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let tasks =
        parse_tasks(&raw).with_context(|| format!("failed to parse {}", path.display()))?;
    info!(file = %path.display(), count = tasks.len(), "loaded task content");
    Ok(tasks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_bare_and_wrapped_lists() {
        let bare = parse_tasks(r#"[{"title":"Gift"},{"title":"Song","link":"https://x"}]"#)
            .expect("bare list");
        assert_eq!(bare.len(), 2);
        assert_eq!(bare[1].link.as_deref(), Some("https://x"));

        let wrapped =
            parse_tasks(r#"{"tasks":[{"title":"Gift","image":"gift.webp"}]}"#).expect("wrapped");
        assert_eq!(wrapped[0].title, "Gift");
        assert_eq!(
            wrapped[0].extra.get("image"),
            Some(&serde_json::Value::String("gift.webp".to_string()))
        );
    }

    #[test]
    fn rejects_other_shapes() {
        assert!(parse_tasks(r#"{"items":[]}"#).is_err());
        assert!(parse_tasks(r#"[{"description":"no title"}]"#).is_err());
    }
}
