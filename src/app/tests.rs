use std::path::PathBuf;

use super::episode::load_episodes;
use super::navigation::parse_location_id;
use super::playback::MediaEvent;
use super::playback::fake::{Call, FakeBackend};
use super::progress::Progress;
use super::root::{Modal, Root, RootConfig};
use crate::db::Database;
use crate::store::{KEY_FAVORITES, KeyValueStore, MemoryStore};

const SONG_2: &str = "https://www.soundhelix.com/examples/mp3/SoundHelix-Song-2.mp3";
const SONG_3: &str = "https://www.soundhelix.com/examples/mp3/SoundHelix-Song-3.mp3";

fn config(requested_id: Option<u32>) -> RootConfig {
    RootConfig {
        data_path: None,
        requested_id,
        visitor_log: None,
        download_path: PathBuf::from("all-episodes-mapped.json"),
        prefers_dark: true,
        fetch_remote: false,
    }
}

fn root_with(store: Box<dyn KeyValueStore>, backend: &FakeBackend, requested_id: Option<u32>) -> Root {
    Root::new(
        store,
        Box::new(backend.clone()),
        load_episodes(None).expect("bundled episodes"),
        config(requested_id),
    )
}

fn new_root(requested_id: Option<u32>) -> (Root, FakeBackend) {
    let backend = FakeBackend::default();
    let root = root_with(Box::new(MemoryStore::new()), &backend, requested_id);
    (root, backend)
}

fn displayed_ids(root: &Root) -> Vec<u32> {
    root.displayed().iter().map(|episode| episode.id).collect()
}

#[test]
fn next_and_previous_walk_the_displayed_order() {
    let (mut root, _) = new_root(Some(1));
    assert_eq!(root.navigator().selected(), Some(1));
    assert!(!root.navigator().has_previous());

    root.next_episode();
    assert_eq!(root.navigator().selected(), Some(2));
    root.next_episode();
    assert_eq!(root.navigator().selected(), Some(3));
    root.previous_episode();
    assert_eq!(root.navigator().selected(), Some(2));
    assert_eq!(root.navigator().history().query_string(), "?id=2");
}

#[test]
fn navigation_stops_at_the_end_of_the_list() {
    let (mut root, _) = new_root(Some(8));
    assert!(!root.navigator().has_next());
    root.next_episode();
    assert_eq!(root.navigator().selected(), Some(8));
    assert!(root.status.contains("No next episode"));
}

#[test]
fn ended_with_auto_next_completes_and_starts_the_next_episode() {
    let (mut root, backend) = new_root(Some(2));
    root.playback_mut().toggle_autoplay();
    backend.push_event(MediaEvent::Ended);

    root.tick();

    assert_eq!(root.navigator().selected(), Some(3));
    assert!(root.progress().is_completed(2));
    assert!(Progress::load(root.store()).is_completed(2));
    assert_eq!(root.playback().source(), SONG_3);
    assert!(root.playback().state().is_autoplay);
    assert!(root.playback().state().is_playing);

    let calls = backend.calls();
    let tail = &calls[calls.len() - 4..];
    assert_eq!(
        tail,
        &[
            Call::Pause,
            Call::Closed(SONG_2.to_string()),
            Call::Open(SONG_3.to_string()),
            Call::Play,
        ]
    );
}

#[test]
fn ended_without_auto_next_stays_put() {
    let (mut root, backend) = new_root(Some(2));
    backend.push_event(MediaEvent::Ended);

    root.tick();

    assert_eq!(root.navigator().selected(), Some(2));
    assert!(!root.progress().is_completed(2));
    assert!(!root.playback().state().is_playing);
    assert_eq!(root.playback().state().current_time, 0.0);
}

#[test]
fn auto_next_on_last_episode_only_marks_it_completed() {
    let (mut root, backend) = new_root(Some(8));
    root.playback_mut().toggle_autoplay();
    backend.push_event(MediaEvent::Ended);

    root.tick();

    assert_eq!(root.navigator().selected(), Some(8));
    assert!(root.progress().is_completed(8));
}

#[test]
fn search_narrows_the_list_and_navigation() {
    let (mut root, _) = new_root(Some(3));
    root.set_search("restaurant".to_string());
    assert_eq!(displayed_ids(&root), vec![3, 6]);

    root.next_episode();
    assert_eq!(root.navigator().selected(), Some(6));
    assert!(!root.navigator().has_next());

    root.set_search("  ".to_string());
    assert_eq!(displayed_ids(&root).len(), 8);
}

#[test]
fn selection_outside_the_filter_jumps_to_first_visible() {
    let (mut root, _) = new_root(Some(1));
    root.set_search("travel".to_string());
    assert_eq!(displayed_ids(&root), vec![8]);
    assert!(root.navigator().has_next());
    root.next_episode();
    assert_eq!(root.navigator().selected(), Some(8));
}

#[test]
fn location_query_selects_episode_or_falls_back() {
    let (root, _) = new_root(parse_location_id("?id=5"));
    assert_eq!(root.navigator().selected(), Some(5));
    assert_eq!(
        root.selected_episode().map(|episode| episode.id),
        Some(5)
    );

    let (root, _) = new_root(parse_location_id("?id=999"));
    assert_eq!(root.navigator().selected(), Some(1));

    let (root, _) = new_root(parse_location_id("?id=abc"));
    assert_eq!(root.navigator().selected(), Some(1));
}

#[test]
fn favorites_persist_and_filter_the_list() {
    let db = Database::open_in_memory().expect("in-memory db");
    db.migrate().expect("migrate");
    let backend = FakeBackend::default();
    let mut root = root_with(Box::new(db), &backend, Some(4));

    root.toggle_favorite();
    assert!(root.progress().is_favorite(4));
    assert_eq!(
        root.store().get(KEY_FAVORITES).expect("read"),
        Some("[4]".to_string())
    );

    root.cycle_category(true);
    assert_eq!(root.category().display_name(), "Favorites");
    assert_eq!(displayed_ids(&root), vec![4]);

    root.toggle_favorite();
    assert!(displayed_ids(&root).is_empty());
    root.next_episode();
    assert_eq!(root.navigator().selected(), Some(5));
}

#[test]
fn category_tab_leaves_auto_next_on_the_searched_order() {
    let (mut root, backend) = new_root(Some(2));
    root.cycle_category(true);
    assert_eq!(root.category().display_name(), "Favorites");
    assert!(displayed_ids(&root).is_empty());

    root.playback_mut().toggle_autoplay();
    backend.push_event(MediaEvent::Ended);
    root.tick();
    assert_eq!(root.navigator().selected(), Some(3));
    assert_eq!(root.playback().source(), SONG_3);

    root.set_search("restaurant".to_string());
    root.next_episode();
    assert_eq!(root.navigator().selected(), Some(6));
    assert!(!root.navigator().has_next());
}

#[test]
fn list_query_matches_title_or_id() {
    let (mut root, _) = new_root(None);
    root.set_list_query("7".to_string());
    assert_eq!(displayed_ids(&root), vec![7]);
    root.set_list_query("salary".to_string());
    assert_eq!(displayed_ids(&root), vec![7]);
}

#[test]
fn cursor_selection_opens_the_episode_audio() {
    let (mut root, backend) = new_root(Some(1));
    root.move_cursor(2);
    root.select_at_cursor();
    assert_eq!(root.navigator().selected(), Some(3));
    assert!(backend.calls().contains(&Call::Open(SONG_3.to_string())));
    assert!(!root.playback().state().is_playing);
}

#[test]
fn stale_advance_request_is_ignored() {
    let (mut root, backend) = new_root(Some(2));
    root.playback_mut().toggle_autoplay();
    backend.push_event(MediaEvent::Ended);
    root.playback_mut().sync();
    root.select(5);

    root.tick();

    assert_eq!(root.navigator().selected(), Some(5));
    assert!(!root.progress().is_completed(2));
}

#[test]
fn history_back_and_forward_restore_selection() {
    let (mut root, _) = new_root(Some(1));
    root.select(4);
    root.select(6);
    root.history_back();
    assert_eq!(root.navigator().selected(), Some(4));
    root.history_back();
    assert_eq!(root.navigator().selected(), Some(1));
    root.history_forward();
    assert_eq!(root.navigator().selected(), Some(4));
}

#[test]
fn flashcards_follow_the_selected_episode() {
    let (mut root, _) = new_root(Some(1));
    root.open_flashcards();
    let Some(Modal::Flashcards(deck)) = root.modal() else {
        panic!("flashcards should open");
    };
    assert_eq!(deck.index(), 0);
    assert!(!deck.is_flipped());

    root.next_episode();
    assert!(matches!(root.modal(), Some(Modal::Flashcards(_))));
}

#[test]
fn admin_edit_shows_up_in_the_list() {
    let (mut root, _) = new_root(Some(1));
    root.enter_admin();
    assert!(!root.admin_login("wrong"));
    assert!(matches!(root.modal(), Some(Modal::Notice { .. })));
    root.close_modal();
    assert!(root.admin_login("admin123"));

    root.admin_move_cursor(1);
    root.admin_begin_edit();
    let editor = root.admin_editor_mut().expect("editor open");
    editor.title.clear();
    for ch in "Phoning In Sick".chars() {
        editor.input(ch);
    }
    root.admin_save_edit();

    root.exit_admin();
    root.set_list_query("phoning".to_string());
    assert_eq!(displayed_ids(&root), vec![2]);
}

#[test]
fn entering_admin_persists_mode_and_requires_login() {
    let db = Database::open_in_memory().expect("in-memory db");
    db.migrate().expect("migrate");
    let backend = FakeBackend::default();
    let mut root = root_with(Box::new(db), &backend, None);
    root.enter_admin();
    assert_eq!(root.store().get("app_mode").expect("read").as_deref(), Some("admin"));
    assert!(!root.admin().authenticated);
}

#[test]
fn empty_collection_has_no_selection() {
    let backend = FakeBackend::default();
    let mut root = Root::new(
        Box::new(MemoryStore::new()),
        Box::new(backend.clone()),
        Vec::new(),
        config(Some(3)),
    );
    assert!(root.selected_episode().is_none());
    assert!(!root.navigator().has_next());
    root.next_episode();
    root.toggle_favorite();
    root.open_flashcards();
    assert!(root.modal().is_none());
    assert!(!root.playback().has_media());
    assert!(backend.calls().is_empty());
}
