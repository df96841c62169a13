use std::cmp::Ordering;
use std::collections::BTreeSet;

use super::episode::Episode;

pub(crate) const LEVEL_ORDER: [&str; 7] = [
    "Elementary",
    "Basic",
    "Pre-Intermediate",
    "Lower Intermediate",
    "Intermediate",
    "Upper Intermediate",
    "Advanced",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CategoryFilter {
    All,
    Favorites,
    Folder(String),
}

impl CategoryFilter {
    pub(crate) fn display_name(&self) -> String {
        match self {
            Self::All => "All Levels".to_string(),
            Self::Favorites => "Favorites".to_string(),
            Self::Folder(name) => format_category_name(name),
        }
    }

    pub(crate) fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            Self::All
        } else if trimmed.eq_ignore_ascii_case("favorites") {
            Self::Favorites
        } else {
            Self::Folder(trimmed.to_string())
        }
    }
}

pub(crate) fn compare_categories(a: &str, b: &str) -> Ordering {
    let rank = |name: &str| LEVEL_ORDER.iter().position(|level| *level == name);
    match (rank(a), rank(b)) {
        (Some(left), Some(right)) => left.cmp(&right),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Tabs for the list pane: `All`, `Favorites`, then every distinct folder in
/// difficulty order.
pub(crate) fn categories(episodes: &[Episode]) -> Vec<CategoryFilter> {
    let mut folders: Vec<&str> = episodes
        .iter()
        .map(|episode| episode.folder.as_str())
        .filter(|folder| !folder.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    folders.sort_by(|a, b| compare_categories(a, b));

    let mut out = vec![CategoryFilter::All, CategoryFilter::Favorites];
    out.extend(
        folders
            .into_iter()
            .map(|folder| CategoryFilter::Folder(folder.to_string())),
    );
    out
}

pub(crate) fn format_category_name(raw: &str) -> String {
    raw.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Top-level search: title, description or level contain the query.
pub(crate) fn search_episodes<'a>(episodes: &'a [Episode], query: &str) -> Vec<&'a Episode> {
    let query = query.trim();
    if query.is_empty() {
        return episodes.iter().collect();
    }
    let needle = query.to_lowercase();
    episodes
        .iter()
        .filter(|episode| {
            episode.title.to_lowercase().contains(&needle)
                || episode.description.to_lowercase().contains(&needle)
                || episode.level.to_lowercase().contains(&needle)
        })
        .collect()
}

pub(crate) fn matches_category(
    episode: &Episode,
    category: &CategoryFilter,
    favorites: &BTreeSet<u32>,
) -> bool {
    match category {
        CategoryFilter::All => true,
        CategoryFilter::Favorites => favorites.contains(&episode.id),
        CategoryFilter::Folder(folder) => episode.folder == *folder,
    }
}

/// List-pane text match: title substring or the query inside the decimal id.
pub(crate) fn matches_list_query(episode: &Episode, query: &str) -> bool {
    episode.title.to_lowercase().contains(&query.to_lowercase())
        || episode.id.to_string().contains(query)
}

pub(crate) fn filter_list<'a>(
    episodes: &[&'a Episode],
    category: &CategoryFilter,
    query: &str,
    favorites: &BTreeSet<u32>,
) -> Vec<&'a Episode> {
    let query = query.trim();
    episodes
        .iter()
        .copied()
        .filter(|episode| {
            matches_category(episode, category, favorites) && matches_list_query(episode, query)
        })
        .collect()
}
