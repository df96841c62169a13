use std::path::{Path, PathBuf};
use std::sync::mpsc;

use tracing::{debug, info, warn};

use crate::store::{KeyValueStore, MemoryStore};

use super::admin::analytics::{self, Analytics, AnalyticsUpdate};
use super::admin::{self, AppMode, EpisodeEditor, SupportSettings};
use super::catalog::{self, CategoryFilter};
use super::episode::{Episode, find_episode, truncate};
use super::flashcards::FlashcardDeck;
use super::navigation::Navigator;
use super::playback::{AdvanceRequest, MediaBackend, PlaybackViewModel};
use super::progress::Progress;
use super::theme::ThemeController;
use super::transcript::TranscriptView;

pub(crate) const SKIP_SECONDS: f64 = 10.0;
pub(crate) const VOLUME_STEP: f64 = 0.1;

pub(crate) fn status_info(msg: &str) -> String {
    format!("INFO: {msg}")
}

pub(crate) fn status_error(msg: &str) -> String {
    format!("ERROR: {msg}")
}

#[derive(Debug, Clone)]
pub(crate) struct RootConfig {
    pub(crate) data_path: Option<PathBuf>,
    pub(crate) requested_id: Option<u32>,
    pub(crate) visitor_log: Option<String>,
    pub(crate) download_path: PathBuf,
    pub(crate) prefers_dark: bool,
    pub(crate) fetch_remote: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Modal {
    Flashcards(FlashcardDeck),
    Manual,
    Support,
    Notice { title: String, message: String },
}

#[derive(Debug, Clone, Default)]
pub(crate) struct AdminState {
    pub(crate) authenticated: bool,
    pub(crate) cursor: usize,
    pub(crate) editor: Option<EpisodeEditor>,
}

/// Everything the terminal front end shows, and every action it can take.
pub(crate) struct Root {
    store: Box<dyn KeyValueStore>,
    session: MemoryStore,
    backend: Box<dyn MediaBackend>,
    config: RootConfig,
    episodes: Vec<Episode>,
    theme: ThemeController,
    navigator: Navigator,
    playback: PlaybackViewModel,
    advance_rx: mpsc::Receiver<AdvanceRequest>,
    analytics: Analytics,
    analytics_tx: mpsc::Sender<AnalyticsUpdate>,
    analytics_rx: mpsc::Receiver<AnalyticsUpdate>,
    search: String,
    list_query: String,
    category: CategoryFilter,
    list_cursor: usize,
    transcript: TranscriptView,
    modal: Option<Modal>,
    mode: AppMode,
    admin: AdminState,
    support: SupportSettings,
    pub(crate) status: String,
}

impl Root {
    pub(crate) fn new(
        store: Box<dyn KeyValueStore>,
        backend: Box<dyn MediaBackend>,
        episodes: Vec<Episode>,
        config: RootConfig,
    ) -> Self {
        let progress = Progress::load(store.as_ref());
        let theme = ThemeController::load(store.as_ref(), config.prefers_dark);
        let ids: Vec<u32> = episodes.iter().map(|episode| episode.id).collect();
        let navigator = Navigator::new(ids, config.requested_id, progress);

        let source = navigator
            .selected()
            .and_then(|id| find_episode(&episodes, id))
            .map(|episode| episode.audio_url.clone())
            .unwrap_or_default();
        let (advance_tx, advance_rx) = mpsc::channel();
        let playback = PlaybackViewModel::open(backend.as_ref(), &source, false, advance_tx);

        let (analytics_tx, analytics_rx) = mpsc::channel();
        let mode = AppMode::load(store.as_ref());
        let support = SupportSettings::load(store.as_ref());
        let status = if episodes.is_empty() {
            status_info("No episodes available.")
        } else {
            status_info("Ready. Press ? for the user manual.")
        };

        let mut root = Self {
            store,
            session: MemoryStore::new(),
            backend,
            config,
            episodes,
            theme,
            navigator,
            playback,
            advance_rx,
            analytics: Analytics::default(),
            analytics_tx,
            analytics_rx,
            search: String::new(),
            list_query: String::new(),
            category: CategoryFilter::All,
            list_cursor: 0,
            transcript: TranscriptView::default(),
            modal: None,
            mode,
            admin: AdminState::default(),
            support,
            status,
        };
        root.refresh_order();
        root.focus_cursor_on_selection();
        if root.config.fetch_remote {
            root.start_visit_counter();
        }
        info!(
            episodes = root.episodes.len(),
            selected = ?root.navigator.selected(),
            mode = root.mode.as_str(),
            "podlearn started"
        );
        root
    }

    #[cfg(test)]
    pub(crate) fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    pub(crate) fn episodes(&self) -> &[Episode] {
        &self.episodes
    }

    pub(crate) fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub(crate) fn progress(&self) -> &Progress {
        self.navigator.progress()
    }

    pub(crate) fn selected_episode(&self) -> Option<&Episode> {
        self.navigator
            .selected()
            .and_then(|id| find_episode(&self.episodes, id))
    }

    pub(crate) fn playback(&self) -> &PlaybackViewModel {
        &self.playback
    }

    pub(crate) fn playback_mut(&mut self) -> &mut PlaybackViewModel {
        &mut self.playback
    }

    pub(crate) fn theme(&self) -> &ThemeController {
        &self.theme
    }

    pub(crate) fn cycle_theme(&mut self) {
        let next = self.theme.theme().cycle();
        match self
            .theme
            .set_theme(self.store.as_ref(), next, self.config.prefers_dark)
        {
            Ok(()) => self.status = status_info(&format!("Theme: {}", next.as_str())),
            Err(err) => self.status = status_error(&format!("Failed to save theme: {err}")),
        }
    }

    /// The terminal regained focus; the OS color scheme may have flipped.
    pub(crate) fn on_system_color_scheme(&mut self, prefers_dark: bool) {
        self.config.prefers_dark = prefers_dark;
        if self.theme.on_system_change(prefers_dark) {
            debug!(appearance = ?self.theme.appearance(), "system appearance changed");
        }
    }

    pub(crate) fn search(&self) -> &str {
        &self.search
    }

    pub(crate) fn set_search(&mut self, query: String) {
        self.search = query;
        self.refresh_order();
    }

    pub(crate) fn list_query(&self) -> &str {
        &self.list_query
    }

    pub(crate) fn set_list_query(&mut self, query: String) {
        self.list_query = query;
        self.refresh_order();
    }

    pub(crate) fn category(&self) -> &CategoryFilter {
        &self.category
    }

    pub(crate) fn categories(&self) -> Vec<CategoryFilter> {
        catalog::categories(&self.episodes)
    }

    pub(crate) fn cycle_category(&mut self, forward: bool) {
        let categories = self.categories();
        let idx = categories
            .iter()
            .position(|category| *category == self.category)
            .unwrap_or(0);
        let len = categories.len();
        let next = if forward {
            (idx + 1) % len
        } else {
            (idx + len - 1) % len
        };
        self.category = categories[next].clone();
        self.refresh_order();
    }

    /// Root search first, then the list pane's category and text filter.
    pub(crate) fn displayed(&self) -> Vec<&Episode> {
        let searched = catalog::search_episodes(&self.episodes, &self.search);
        catalog::filter_list(
            &searched,
            &self.category,
            &self.list_query,
            self.navigator.progress().favorites(),
        )
    }

    /// Next/previous walk the searched collection; the category tab and list
    /// query only narrow the list pane.
    fn refresh_order(&mut self) {
        let order: Vec<u32> = catalog::search_episodes(&self.episodes, &self.search)
            .iter()
            .map(|episode| episode.id)
            .collect();
        self.list_cursor = self
            .list_cursor
            .min(self.displayed().len().saturating_sub(1));
        self.navigator.set_order(order);
    }

    pub(crate) fn list_cursor(&self) -> usize {
        self.list_cursor
    }

    pub(crate) fn move_cursor(&mut self, delta: isize) {
        let len = self.displayed().len();
        if len == 0 {
            self.list_cursor = 0;
            return;
        }
        self.list_cursor = self.list_cursor.saturating_add_signed(delta).min(len - 1);
    }

    fn focus_cursor_on_selection(&mut self) {
        let Some(selected) = self.navigator.selected() else {
            return;
        };
        if let Some(idx) = self
            .displayed()
            .iter()
            .position(|episode| episode.id == selected)
        {
            self.list_cursor = idx;
        }
    }

    pub(crate) fn select_at_cursor(&mut self) {
        let Some(id) = self.displayed().get(self.list_cursor).map(|episode| episode.id) else {
            return;
        };
        self.select(id);
    }

    pub(crate) fn select(&mut self, id: u32) {
        self.navigator.select_episode(id);
        self.after_selection_change();
    }

    pub(crate) fn next_episode(&mut self) {
        if self.navigator.next().is_some() {
            self.after_selection_change();
        } else {
            self.status = status_info("No next episode.");
        }
    }

    pub(crate) fn previous_episode(&mut self) {
        if self.navigator.previous().is_some() {
            self.after_selection_change();
        } else {
            self.status = status_info("No previous episode.");
        }
    }

    pub(crate) fn history_back(&mut self) {
        if self.navigator.history_back().is_some() {
            self.after_selection_change();
        }
    }

    pub(crate) fn history_forward(&mut self) {
        if self.navigator.history_forward().is_some() {
            self.after_selection_change();
        }
    }

    fn after_selection_change(&mut self) {
        self.sync_player();
        self.transcript.reset_scroll();
        self.focus_cursor_on_selection();
        if matches!(self.modal, Some(Modal::Flashcards(_))) {
            self.modal = None;
            self.open_flashcards();
        }
        if let Some(episode) = self.selected_episode() {
            self.status = status_info(&format!("Selected: {}", truncate(&episode.title, 60)));
        }
    }

    /// Opens a fresh player when the selected episode's audio differs from
    /// what is loaded.
    fn sync_player(&mut self) {
        let source = self
            .selected_episode()
            .map(|episode| episode.audio_url.clone())
            .unwrap_or_default();
        if source == self.playback.source() {
            return;
        }
        debug!(source, "replacing audio source");
        self.playback.replace_source(self.backend.as_ref(), &source);
    }

    pub(crate) fn toggle_favorite(&mut self) {
        let Some(id) = self.navigator.selected() else {
            return;
        };
        match self.navigator.toggle_favorite(self.store.as_ref(), id) {
            Ok(true) => self.status = status_info("Added to favorites."),
            Ok(false) => self.status = status_info("Removed from favorites."),
            Err(err) => self.status = status_error(&format!("Failed to save favorites: {err}")),
        }
        self.refresh_order();
    }

    /// Per-iteration housekeeping: media events, advance requests and
    /// background fetch results.
    pub(crate) fn tick(&mut self) {
        self.playback.sync();
        while let Ok(request) = self.advance_rx.try_recv() {
            self.handle_advance(request);
        }
        analytics::drain_analytics_updates(&self.analytics_rx, &mut self.analytics, &self.session);
    }

    fn handle_advance(&mut self, request: AdvanceRequest) {
        if request.source != self.playback.source() {
            debug!(source = %request.source, "ignoring stale advance request");
            return;
        }
        match self.navigator.on_advance_request(self.store.as_ref()) {
            Ok(outcome) => {
                if outcome.moved_to.is_some() {
                    self.after_selection_change();
                } else {
                    self.status = status_info("Finished the last episode in the list.");
                }
                self.refresh_order();
            }
            Err(err) => {
                warn!(error = %format!("{err:#}"), "failed to record completed episode");
                self.status = status_error(&format!("Failed to save progress: {err}"));
            }
        }
    }

    pub(crate) fn transcript(&self) -> &TranscriptView {
        &self.transcript
    }

    pub(crate) fn transcript_mut(&mut self) -> &mut TranscriptView {
        &mut self.transcript
    }

    pub(crate) fn modal(&self) -> Option<&Modal> {
        self.modal.as_ref()
    }

    pub(crate) fn modal_mut(&mut self) -> Option<&mut Modal> {
        self.modal.as_mut()
    }

    pub(crate) fn close_modal(&mut self) {
        self.modal = None;
    }

    pub(crate) fn open_flashcards(&mut self) {
        let deck = self
            .selected_episode()
            .and_then(|episode| FlashcardDeck::open(&episode.transcript.vocabulary));
        match deck {
            Some(deck) => self.modal = Some(Modal::Flashcards(deck)),
            None => self.status = status_info("No vocabulary to practice for this episode."),
        }
    }

    pub(crate) fn open_manual(&mut self) {
        self.modal = Some(Modal::Manual);
    }

    pub(crate) fn open_support(&mut self) {
        self.modal = Some(Modal::Support);
    }

    pub(crate) fn notice(&mut self, title: &str, message: impl Into<String>) {
        self.modal = Some(Modal::Notice {
            title: title.to_string(),
            message: message.into(),
        });
    }

    pub(crate) fn analytics(&self) -> &Analytics {
        &self.analytics
    }

    fn start_visit_counter(&mut self) {
        let (url, counted) = analytics::counter_url(&self.session);
        analytics::spawn_visit_count(url, counted, &self.analytics_tx);
    }

    pub(crate) fn support(&self) -> &SupportSettings {
        &self.support
    }

    pub(crate) fn mode(&self) -> AppMode {
        self.mode
    }

    fn set_mode(&mut self, mode: AppMode) {
        self.mode = mode;
        if let Err(err) = mode.persist(self.store.as_ref()) {
            warn!(error = %err, "failed to persist app mode");
        }
    }

    pub(crate) fn enter_admin(&mut self) {
        self.modal = None;
        self.admin = AdminState::default();
        self.set_mode(AppMode::Admin);
    }

    pub(crate) fn exit_admin(&mut self) {
        self.admin = AdminState::default();
        self.set_mode(AppMode::App);
        self.status = status_info("Left the admin panel.");
    }

    pub(crate) fn admin(&self) -> &AdminState {
        &self.admin
    }

    pub(crate) fn admin_login(&mut self, attempt: &str) -> bool {
        match admin::login(self.store.as_ref(), attempt) {
            Ok(()) => {
                self.admin.authenticated = true;
                self.analytics = Analytics::default();
                if self.config.fetch_remote {
                    analytics::spawn_admin_fetches(self.config.visitor_log.clone(), &self.analytics_tx);
                }
                self.status = status_info("Admin panel unlocked.");
                true
            }
            Err(err) => {
                self.notice("Admin", err.to_string());
                false
            }
        }
    }

    pub(crate) fn admin_move_cursor(&mut self, delta: isize) {
        if self.episodes.is_empty() {
            return;
        }
        self.admin.cursor = self
            .admin
            .cursor
            .saturating_add_signed(delta)
            .min(self.episodes.len() - 1);
    }

    pub(crate) fn admin_begin_edit(&mut self) {
        if let Some(episode) = self.episodes.get(self.admin.cursor) {
            self.admin.editor = Some(EpisodeEditor::begin(episode));
        }
    }

    pub(crate) fn admin_editor_mut(&mut self) -> Option<&mut EpisodeEditor> {
        self.admin.editor.as_mut()
    }

    pub(crate) fn admin_cancel_edit(&mut self) {
        self.admin.editor = None;
    }

    pub(crate) fn admin_save_edit(&mut self) {
        let Some(editor) = self.admin.editor.take() else {
            return;
        };
        if editor.apply(&mut self.episodes) {
            self.status = status_info(&format!("Saved changes to episode {}.", editor.id));
        } else {
            self.status = status_error(&format!("Episode {} no longer exists.", editor.id));
        }
        self.refresh_order();
    }

    pub(crate) fn admin_save_to_file(&mut self) {
        let result = admin::save_to_file(
            &self.episodes,
            self.config.data_path.as_deref(),
            &self.config.download_path,
        );
        match result {
            Ok(outcome) => self.notice("Export", outcome.message()),
            Err(err) => self.notice("Export", format!("Export failed: {err:#}")),
        }
    }

    pub(crate) fn admin_change_password(&mut self, new: &str, confirm: &str) -> bool {
        match admin::change_password(self.store.as_ref(), new, confirm) {
            Ok(()) => {
                self.notice("Password", "Password changed successfully!");
                true
            }
            Err(err) => {
                self.notice("Password", err.to_string());
                false
            }
        }
    }

    pub(crate) fn admin_save_support_link(&mut self, link: &str) {
        match self.support.save_link(self.store.as_ref(), link) {
            Ok(()) => self.notice("Support", "Support settings saved successfully!"),
            Err(err) => self.notice("Support", format!("{err:#}")),
        }
    }

    pub(crate) fn admin_store_support_image(&mut self, path: &Path) {
        match self.support.store_image(self.store.as_ref(), path) {
            Ok(()) => self.notice("Support", "Image uploaded!"),
            Err(err) => self.notice("Support", format!("{err:#}")),
        }
    }
}
