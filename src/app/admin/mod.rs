pub(crate) mod analytics;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;
use tracing::{info, warn};

use crate::store::{
    KEY_ADMIN_PASSWORD, KEY_APP_MODE, KEY_SUPPORT_IMAGE, KEY_SUPPORT_LINK, KeyValueStore,
    get_or_log,
};

use super::episode::{Episode, episodes_to_json};

pub(crate) const DEFAULT_ADMIN_PASSWORD: &str = "admin123";
pub(crate) const DEFAULT_SUPPORT_LINK: &str = "https://buymeacoffee.com/quangtringuyen";
pub(crate) const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub(crate) enum AdminError {
    #[error("Wrong password")]
    WrongPassword,
    #[error("Please fill in both password fields")]
    MissingPasswordFields,
    #[error("Passwords do not match!")]
    PasswordMismatch,
    #[error("Password must be at least 6 characters long")]
    PasswordTooShort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AppMode {
    App,
    Admin,
}

impl AppMode {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::App => "app",
            Self::Admin => "admin",
        }
    }

    pub(crate) fn load(store: &dyn KeyValueStore) -> Self {
        match get_or_log(store, KEY_APP_MODE).as_deref() {
            Some("admin") => Self::Admin,
            _ => Self::App,
        }
    }

    pub(crate) fn persist(self, store: &dyn KeyValueStore) -> Result<()> {
        store.set(KEY_APP_MODE, self.as_str())
    }
}

fn stored_password(store: &dyn KeyValueStore) -> String {
    get_or_log(store, KEY_ADMIN_PASSWORD)
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_ADMIN_PASSWORD.to_string())
}

/// Cosmetic gate only; the password sits in plain text next to everything else.
pub(crate) fn login(store: &dyn KeyValueStore, attempt: &str) -> Result<(), AdminError> {
    if attempt == stored_password(store) {
        info!("admin login accepted");
        Ok(())
    } else {
        warn!("admin login rejected");
        Err(AdminError::WrongPassword)
    }
}

pub(crate) fn validate_new_password(new: &str, confirm: &str) -> Result<(), AdminError> {
    if new.is_empty() || confirm.is_empty() {
        return Err(AdminError::MissingPasswordFields);
    }
    if new != confirm {
        return Err(AdminError::PasswordMismatch);
    }
    if new.chars().count() < MIN_PASSWORD_LEN {
        return Err(AdminError::PasswordTooShort);
    }
    Ok(())
}

pub(crate) fn change_password(store: &dyn KeyValueStore, new: &str, confirm: &str) -> Result<()> {
    validate_new_password(new, confirm)?;
    store
        .set(KEY_ADMIN_PASSWORD, new)
        .context("failed to store admin password")?;
    info!("admin password changed");
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SupportSettings {
    pub(crate) link: String,
    pub(crate) image: Option<String>,
}

impl SupportSettings {
    pub(crate) fn load(store: &dyn KeyValueStore) -> Self {
        Self {
            link: get_or_log(store, KEY_SUPPORT_LINK)
                .filter(|link| !link.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_SUPPORT_LINK.to_string()),
            image: get_or_log(store, KEY_SUPPORT_IMAGE).filter(|image| !image.is_empty()),
        }
    }

    pub(crate) fn save_link(&mut self, store: &dyn KeyValueStore, link: &str) -> Result<()> {
        let link = link.trim();
        store
            .set(KEY_SUPPORT_LINK, link)
            .context("failed to store support link")?;
        self.link = if link.is_empty() {
            DEFAULT_SUPPORT_LINK.to_string()
        } else {
            link.to_string()
        };
        Ok(())
    }

    pub(crate) fn store_image(&mut self, store: &dyn KeyValueStore, path: &Path) -> Result<()> {
        let bytes = fs::read(path)
            .with_context(|| format!("failed to read support image {}", path.display()))?;
        let data_url = image_data_url(path, &bytes);
        store
            .set(KEY_SUPPORT_IMAGE, &data_url)
            .context("failed to store support image")?;
        info!(path = %path.display(), bytes = bytes.len(), "support image stored");
        self.image = Some(data_url);
        Ok(())
    }

    pub(crate) fn image_summary(&self) -> String {
        match self.image.as_deref().and_then(data_url_mime) {
            Some(mime) => format!("custom image ({mime})"),
            None if self.image.is_some() => "custom image".to_string(),
            None => "default image".to_string(),
        }
    }
}

fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

pub(crate) fn image_data_url(path: &Path, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_for_path(path), STANDARD.encode(bytes))
}

fn data_url_mime(data_url: &str) -> Option<&str> {
    data_url.strip_prefix("data:")?.split(';').next()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EditField {
    Title,
    Description,
    Folder,
}

impl EditField {
    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::Title => "Title",
            Self::Description => "Description",
            Self::Folder => "Category",
        }
    }

    fn next(self) -> Self {
        match self {
            Self::Title => Self::Description,
            Self::Description => Self::Folder,
            Self::Folder => Self::Title,
        }
    }
}

/// Draft of one episode's editable metadata. Dropping it discards the edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct EpisodeEditor {
    pub(crate) id: u32,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) folder: String,
    pub(crate) field: EditField,
}

impl EpisodeEditor {
    pub(crate) fn begin(episode: &Episode) -> Self {
        Self {
            id: episode.id,
            title: episode.title.clone(),
            description: episode.description.clone(),
            folder: episode.folder.clone(),
            field: EditField::Title,
        }
    }

    pub(crate) fn value(&self, field: EditField) -> &str {
        match field {
            EditField::Title => &self.title,
            EditField::Description => &self.description,
            EditField::Folder => &self.folder,
        }
    }

    fn active_mut(&mut self) -> &mut String {
        match self.field {
            EditField::Title => &mut self.title,
            EditField::Description => &mut self.description,
            EditField::Folder => &mut self.folder,
        }
    }

    pub(crate) fn input(&mut self, ch: char) {
        self.active_mut().push(ch);
    }

    pub(crate) fn backspace(&mut self) {
        self.active_mut().pop();
    }

    pub(crate) fn next_field(&mut self) {
        self.field = self.field.next();
    }

    /// Merges the draft into the matching record. Returns `false` when the
    /// episode no longer exists.
    pub(crate) fn apply(&self, episodes: &mut [Episode]) -> bool {
        let Some(episode) = episodes.iter_mut().find(|episode| episode.id == self.id) else {
            return false;
        };
        episode.title = self.title.clone();
        episode.description = self.description.clone();
        episode.folder = self.folder.clone();
        info!(id = self.id, "episode metadata updated");
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ExportOutcome {
    Saved(PathBuf),
    Downloaded {
        path: PathBuf,
        write_error: Option<String>,
    },
}

impl ExportOutcome {
    pub(crate) fn message(&self) -> String {
        match self {
            Self::Saved(path) => format!(
                "Success! File saved to {}. Changes are now permanent on your disk.",
                path.display()
            ),
            Self::Downloaded { path, write_error } => {
                let mut message = format!(
                    "File downloaded to {}. Move it over your episode data file to persist changes.",
                    path.display()
                );
                if let Some(err) = write_error {
                    message = format!("Could not write to file directly ({err}). {message}");
                }
                message
            }
        }
    }
}

pub(crate) fn write_export(episodes: &[Episode], path: &Path) -> Result<()> {
    let json = episodes_to_json(episodes)?;
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}

/// Writes over the data file when there is one, otherwise (or when that
/// write fails) drops a copy at `download_path`.
pub(crate) fn save_to_file(
    episodes: &[Episode],
    data_path: Option<&Path>,
    download_path: &Path,
) -> Result<ExportOutcome> {
    let mut write_error = None;
    if let Some(path) = data_path {
        match write_export(episodes, path) {
            Ok(()) => {
                info!(path = %path.display(), count = episodes.len(), "episode data saved");
                return Ok(ExportOutcome::Saved(path.to_path_buf()));
            }
            Err(err) => {
                warn!(path = %path.display(), error = %format!("{err:#}"), "saving data file failed, downloading instead");
                write_error = Some(format!("{err:#}"));
            }
        }
    }
    write_export(episodes, download_path)?;
    info!(path = %download_path.display(), count = episodes.len(), "episode data downloaded");
    Ok(ExportOutcome::Downloaded {
        path: download_path.to_path_buf(),
        write_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::episode::load_episodes;
    use crate::store::MemoryStore;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("podlearn-admin-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    #[test]
    fn default_password_unlocks_until_changed() {
        let store = MemoryStore::new();
        assert_eq!(login(&store, "admin123"), Ok(()));
        assert_eq!(login(&store, "nope"), Err(AdminError::WrongPassword));

        change_password(&store, "secret1", "secret1").expect("change");
        assert_eq!(login(&store, "admin123"), Err(AdminError::WrongPassword));
        assert_eq!(login(&store, "secret1"), Ok(()));
    }

    #[test]
    fn password_rules_have_distinct_errors() {
        assert_eq!(
            validate_new_password("", "abcdef"),
            Err(AdminError::MissingPasswordFields)
        );
        assert_eq!(
            validate_new_password("abcdef", "abcdeg"),
            Err(AdminError::PasswordMismatch)
        );
        assert_eq!(
            validate_new_password("abc", "abc"),
            Err(AdminError::PasswordTooShort)
        );
        assert_eq!(validate_new_password("abcdef", "abcdef"), Ok(()));
    }

    #[test]
    fn rejected_change_keeps_old_password() {
        let store = MemoryStore::new();
        let err = change_password(&store, "abc", "abc").expect_err("too short");
        assert_eq!(
            err.downcast_ref::<AdminError>(),
            Some(&AdminError::PasswordTooShort)
        );
        assert_eq!(store.get(KEY_ADMIN_PASSWORD).expect("get"), None);
    }

    #[test]
    fn app_mode_round_trips_through_store() {
        let store = MemoryStore::new();
        assert_eq!(AppMode::load(&store), AppMode::App);
        AppMode::Admin.persist(&store).expect("persist");
        assert_eq!(AppMode::load(&store), AppMode::Admin);
    }

    #[test]
    fn support_settings_default_and_persist() {
        let store = MemoryStore::new();
        let mut settings = SupportSettings::load(&store);
        assert_eq!(settings.link, DEFAULT_SUPPORT_LINK);
        assert_eq!(settings.image_summary(), "default image");

        settings
            .save_link(&store, " https://example.com/tip ")
            .expect("save link");
        assert_eq!(SupportSettings::load(&store).link, "https://example.com/tip");
    }

    #[test]
    fn support_image_is_stored_as_data_url() {
        let dir = temp_dir("image");
        let path = dir.join("qr.PNG");
        fs::write(&path, [0x89, b'P', b'N', b'G']).expect("write image");

        let store = MemoryStore::new();
        let mut settings = SupportSettings::load(&store);
        settings.store_image(&store, &path).expect("store image");

        let stored = store.get(KEY_SUPPORT_IMAGE).expect("get").expect("image");
        assert_eq!(stored, "data:image/png;base64,iVBORw==");
        assert_eq!(settings.image_summary(), "custom image (image/png)");
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn editor_merges_fields_and_cancel_discards() {
        let mut episodes = load_episodes(None).expect("episodes");
        let original = episodes[0].clone();

        let mut editor = EpisodeEditor::begin(&original);
        editor.input('!');
        editor.next_field();
        editor.next_field();
        assert_eq!(editor.field, EditField::Folder);
        editor.backspace();
        assert_eq!(episodes[0], original);

        assert!(editor.apply(&mut episodes));
        assert_eq!(episodes[0].title, format!("{}!", original.title));
        assert_eq!(episodes[0].description, original.description);
        assert_eq!(episodes[0].audio_url, original.audio_url);
        assert_eq!(editor.value(EditField::Folder).len() + 1, original.folder.len());
    }

    #[test]
    fn save_prefers_data_file_then_falls_back_to_download() {
        let dir = temp_dir("export");
        let episodes = load_episodes(None).expect("episodes");
        let data = dir.join("episodes.json");
        let download = dir.join("downloads").join("all-episodes-mapped.json");

        let saved = save_to_file(&episodes, Some(&data), &download).expect("save");
        assert_eq!(saved, ExportOutcome::Saved(data.clone()));
        let written = load_episodes(Some(&data)).expect("reload");
        assert_eq!(written, episodes);

        let downloaded = save_to_file(&episodes, None, &download).expect("download");
        assert_eq!(
            downloaded,
            ExportOutcome::Downloaded {
                path: download.clone(),
                write_error: None
            }
        );

        // A directory cannot be overwritten as a file.
        let fallback = save_to_file(&episodes, Some(&dir), &download).expect("fallback");
        assert!(matches!(
            fallback,
            ExportOutcome::Downloaded {
                write_error: Some(_),
                ..
            }
        ));
        let _ = fs::remove_dir_all(dir);
    }
}
