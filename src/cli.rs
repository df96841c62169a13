use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "podlearn",
    version,
    about = "Listen to podcast lessons and study their vocabulary in the terminal"
)]
pub struct Cli {
    /// Episode collection to load instead of the bundled one.
    #[arg(long, global = true, env = "PODLEARN_DATA", value_name = "FILE")]
    pub data: Option<PathBuf>,

    /// Episode to open on start.
    #[arg(long, global = true, conflicts_with = "location")]
    pub id: Option<u32>,

    /// Location string to open on start, e.g. `?id=5`.
    #[arg(long, global = true, value_name = "QUERY")]
    pub location: Option<String>,

    /// Visitor log for the admin panel: an http(s) URL or a local file.
    #[arg(long, global = true, env = "PODLEARN_VISITOR_LOG", value_name = "SOURCE")]
    pub visitor_log: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Open the interactive player (default).
    Tui,
    /// Print the episode list.
    List {
        /// Only this category, e.g. `Intermediate` or `favorites`.
        #[arg(long)]
        category: Option<String>,
        /// Case-insensitive match on title, description or level.
        #[arg(long)]
        search: Option<String>,
        /// Only favorite episodes.
        #[arg(long, conflicts_with = "category")]
        favorites: bool,
    },
    /// Print one episode with its transcript and vocabulary.
    Show { id: u32 },
    /// Toggle an episode's favorite mark.
    Favorite { id: u32 },
    /// Write the episode collection as JSON.
    Export {
        /// Destination file; defaults to the downloads directory.
        path: Option<PathBuf>,
    },
}
