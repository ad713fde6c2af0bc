//! Reflows free-text prompt fields into paragraphs and bulleted lists.
//!
//! Paragraphs are separated by one or more blank lines. Inside a paragraph,
//! single line breaks are soft and get joined with spaces, unless the
//! paragraph contains a bullet line (`- ` or `• `), in which case it becomes
//! a list. Numbered lines (`1. `) are deliberately not bullets.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static HORIZONTAL_WS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]+").expect("horizontal whitespace regex"));

static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{2,}").expect("paragraph break regex"));

const BULLET_PREFIXES: [&str; 2] = ["- ", "• "];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TextBlock {
    Paragraph {
        text: String,
    },
    List {
        leading_text: Option<String>,
        items: Vec<String>,
    },
}

fn strip_bullet(line: &str) -> Option<&str> {
    BULLET_PREFIXES
        .iter()
        .find_map(|prefix| line.strip_prefix(prefix))
}

pub fn format_prompt_text(text: Option<&str>) -> Vec<TextBlock> {
    let Some(text) = text else {
        return Vec::new();
    };

    let text = text.replace("\r\n", "\n");
    let normalized = HORIZONTAL_WS.replace_all(&text, " ");
    let normalized = normalized.trim();
    if normalized.is_empty() {
        return Vec::new();
    }

    let mut blocks = Vec::new();

    for group in PARAGRAPH_BREAK.split(normalized) {
        let lines: Vec<&str> = group
            .split('\n')
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        let is_list = lines.iter().any(|line| strip_bullet(line).is_some());

        if is_list {
            let mut items = Vec::new();
            let mut regular = Vec::new();
            for line in &lines {
                match strip_bullet(line) {
                    Some(item) => items.push(item.trim().to_string()),
                    None => regular.push(*line),
                }
            }
            let leading_text = if regular.is_empty() {
                None
            } else {
                Some(regular.join(" "))
            };
            blocks.push(TextBlock::List {
                leading_text,
                items,
            });
        } else {
            let text = lines.join(" ");
            if !text.is_empty() {
                blocks.push(TextBlock::Paragraph { text });
            }
        }
    }

    blocks
}

/// Writes blocks back out as source text that formats to the same blocks.
pub fn render_plain(blocks: &[TextBlock]) -> String {
    blocks
        .iter()
        .map(|block| match block {
            TextBlock::Paragraph { text } => text.clone(),
            TextBlock::List {
                leading_text,
                items,
            } => {
                let mut lines: Vec<String> = Vec::with_capacity(items.len() + 1);
                if let Some(lead) = leading_text {
                    lines.push(lead.clone());
                }
                lines.extend(items.iter().map(|item| format!("- {}", item)));
                lines.join("\n")
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
