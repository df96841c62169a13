mod admin;
mod catalog;
mod episode;
mod flashcards;
mod navigation;
mod playback;
mod progress;
mod root;
mod theme;
mod transcript;
mod tui;

#[cfg(test)]
mod tests;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use tracing::info;

use crate::cli::{Cli, Command};
use crate::db::Database;
use crate::paths::{database_file_path, default_export_path};
use crate::store::KeyValueStore;

use self::catalog::{CategoryFilter, filter_list, format_category_name, search_episodes};
use self::episode::{Episode, find_episode, load_episodes, truncate};
use self::navigation::parse_location_id;
use self::playback::{MpvBackend, resolve_player_bin};
use self::progress::Progress;
use self::root::{Root, RootConfig};
use self::theme::system_prefers_dark;
use self::transcript::display_word;

pub fn run(cli: Cli) -> Result<()> {
    let db = open_db()?;
    let episodes = load_episodes(cli.data.as_deref())?;
    info!(
        count = episodes.len(),
        source = %cli.data.as_deref().map_or("bundled".to_string(), |p| p.display().to_string()),
        "episodes loaded"
    );

    match cli.command {
        Some(Command::List {
            category,
            search,
            favorites,
        }) => run_list(&db, &episodes, category.as_deref(), search.as_deref(), favorites),
        Some(Command::Show { id }) => run_show(&db, &episodes, id),
        Some(Command::Favorite { id }) => run_favorite(&db, &episodes, id),
        Some(Command::Export { path }) => run_export(&episodes, path),
        Some(Command::Tui) | None => {
            let requested_id = cli
                .id
                .or_else(|| cli.location.as_deref().and_then(parse_location_id));
            let config = RootConfig {
                data_path: cli.data,
                requested_id,
                visitor_log: cli.visitor_log,
                download_path: default_export_path(),
                prefers_dark: system_prefers_dark(),
                fetch_remote: true,
            };
            let backend = MpvBackend::new(resolve_player_bin());
            let mut root = Root::new(Box::new(db), Box::new(backend), episodes, config);
            tui::run_tui(&mut root)
        }
    }
}

fn open_db() -> Result<Database> {
    let db_path = database_file_path()?;
    let db = Database::open(&db_path)?;
    db.migrate()?;
    Ok(db)
}

fn run_list(
    store: &dyn KeyValueStore,
    episodes: &[Episode],
    category: Option<&str>,
    search: Option<&str>,
    favorites: bool,
) -> Result<()> {
    let progress = Progress::load(store);
    let category = if favorites {
        CategoryFilter::Favorites
    } else {
        category.map_or(CategoryFilter::All, CategoryFilter::parse)
    };
    let searched = search_episodes(episodes, search.unwrap_or_default());
    let items = filter_list(&searched, &category, "", progress.favorites());
    if items.is_empty() {
        println!("No episodes match.");
        return Ok(());
    }

    println!(
        "{:<5} {:<40} {:<20} {:<20} {:<4}",
        "ID", "TITLE", "LEVEL", "CATEGORY", "MARK"
    );
    for episode in items {
        let mut mark = String::new();
        if progress.is_completed(episode.id) {
            mark.push('✓');
        }
        if progress.is_favorite(episode.id) {
            mark.push('★');
        }
        println!(
            "{:<5} {:<40} {:<20} {:<20} {:<4}",
            episode.id,
            truncate(&episode.title, 40),
            truncate(&episode.level, 20),
            truncate(&format_category_name(&episode.folder), 20),
            mark
        );
    }
    println!(
        "\nCompleted {} of {} episodes, {} favorites.",
        progress.completed().len(),
        episodes.len(),
        progress.favorites().len()
    );
    Ok(())
}

fn run_show(store: &dyn KeyValueStore, episodes: &[Episode], id: u32) -> Result<()> {
    let Some(episode) = find_episode(episodes, id) else {
        bail!("no episode with id {id}");
    };
    let progress = Progress::load(store);

    println!("#{} {}", episode.id, episode.title);
    println!(
        "  Level: {}   Category: {}",
        episode.level,
        format_category_name(&episode.folder)
    );
    println!(
        "  Favorite: {}   Completed: {}",
        yes_no(progress.is_favorite(episode.id)),
        yes_no(progress.is_completed(episode.id))
    );
    println!("  Audio: {}", episode.audio_url);
    println!("\n{}\n", episode.description);

    println!("Dialogue:");
    for line in &episode.transcript.dialogue {
        println!("  {}: {}", line.speaker, line.text);
    }

    let vocabulary = episode
        .transcript
        .vocabulary
        .iter()
        .chain(episode.transcript.supplementary());
    println!("\nVocabulary:");
    for item in vocabulary {
        let shown = display_word(item);
        let kind = match (shown.category.as_deref(), shown.subcategory.as_deref()) {
            (Some(category), Some(subcategory)) => format!(" [{category}, {subcategory}]"),
            (Some(category), None) => format!(" [{category}]"),
            _ => String::new(),
        };
        println!("  {}{} - {}", shown.word, kind, item.definition);
    }
    Ok(())
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

fn run_favorite(store: &dyn KeyValueStore, episodes: &[Episode], id: u32) -> Result<()> {
    let Some(episode) = find_episode(episodes, id) else {
        bail!("no episode with id {id}");
    };
    let mut progress = Progress::load(store);
    if progress.toggle_favorite(store, id)? {
        println!("Added to favorites: {}", episode.title);
    } else {
        println!("Removed from favorites: {}", episode.title);
    }
    Ok(())
}

fn run_export(episodes: &[Episode], path: Option<PathBuf>) -> Result<()> {
    let path = path.unwrap_or_else(default_export_path);
    admin::write_export(episodes, &path)
        .with_context(|| format!("failed to export episodes to {}", path.display()))?;
    println!("Exported {} episodes to {}", episodes.len(), path.display());
    Ok(())
}
