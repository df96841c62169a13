use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const BUNDLED_EPISODES: &str = include_str!("../../data/episodes.json");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Episode {
    pub(crate) id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) original_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) video_id: Option<String>,
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) level: String,
    #[serde(default)]
    pub(crate) folder: String,
    #[serde(default)]
    pub(crate) description: String,
    #[serde(default)]
    pub(crate) audio_url: String,
    #[serde(default)]
    pub(crate) transcript: Transcript,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Transcript {
    #[serde(default)]
    pub(crate) dialogue: Vec<DialogueLine>,
    #[serde(default)]
    pub(crate) vocabulary: Vec<VocabularyItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) supplementary_vocabulary: Option<Vec<VocabularyItem>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct DialogueLine {
    pub(crate) speaker: String,
    pub(crate) text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct VocabularyItem {
    pub(crate) word: String,
    pub(crate) definition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) subcategory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) example: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) pronunciation: Option<String>,
}

impl Transcript {
    pub(crate) fn supplementary(&self) -> &[VocabularyItem] {
        self.supplementary_vocabulary.as_deref().unwrap_or(&[])
    }
}

pub(crate) fn parse_episodes(raw: &str) -> Result<Vec<Episode>> {
    serde_json::from_str(raw).context("episode data is not a JSON array of episodes")
}

/// Loads the collection once at startup: the user file when given, otherwise
/// the copy compiled into the binary.
pub(crate) fn load_episodes(path: Option<&Path>) -> Result<Vec<Episode>> {
    match path {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read episode data at {}", path.display()))?;
            parse_episodes(&raw).with_context(|| format!("invalid episode data in {}", path.display()))
        }
        None => parse_episodes(BUNDLED_EPISODES),
    }
}

pub(crate) fn episodes_to_json(episodes: &[Episode]) -> Result<String> {
    serde_json::to_string_pretty(episodes).context("failed to serialize episodes")
}

pub(crate) fn find_episode(episodes: &[Episode], id: u32) -> Option<&Episode> {
    episodes.iter().find(|episode| episode.id == id)
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    let mut out = s.to_string();
    if out.chars().count() > max {
        out = out.chars().take(max.saturating_sub(3)).collect::<String>() + "...";
    }
    out
}
