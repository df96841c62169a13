mod mpv;
mod process;

use std::sync::mpsc;

use anyhow::Result;
use tracing::{debug, warn};

pub(crate) use mpv::{MpvBackend, resolve_player_bin};

pub(crate) const PLAYBACK_RATES: [f64; 6] = [0.5, 0.75, 1.0, 1.25, 1.5, 2.0];

/// Asynchronous notifications from a media resource.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum MediaEvent {
    LoadedMetadata { duration: f64 },
    TimeUpdate { position: f64 },
    Ended,
}

/// One open audio resource. Dropping it releases the underlying player.
pub(crate) trait MediaElement {
    fn play(&mut self) -> Result<()>;
    fn pause(&mut self) -> Result<()>;
    fn set_position(&mut self, seconds: f64) -> Result<()>;
    fn set_volume(&mut self, volume: f64) -> Result<()>;
    fn set_rate(&mut self, rate: f64) -> Result<()>;
    fn set_loop(&mut self, looping: bool) -> Result<()>;
    fn poll_events(&mut self) -> Vec<MediaEvent>;
}

pub(crate) trait MediaBackend {
    fn open(&self, source: &str) -> Result<Box<dyn MediaElement>>;
}

/// Sent when playback ends naturally while auto-next is on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AdvanceRequest {
    pub(crate) source: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PlaybackState {
    pub(crate) is_playing: bool,
    pub(crate) current_time: f64,
    pub(crate) duration: f64,
    pub(crate) volume: f64,
    pub(crate) playback_rate: f64,
    pub(crate) is_looping: bool,
    pub(crate) is_autoplay: bool,
}

impl PlaybackState {
    /// Defaults for a newly opened source; only auto-next survives a source change.
    pub(crate) fn fresh(carried_autoplay: bool) -> Self {
        Self {
            is_playing: carried_autoplay,
            current_time: 0.0,
            duration: 0.0,
            volume: 1.0,
            playback_rate: 1.0,
            is_looping: false,
            is_autoplay: carried_autoplay,
        }
    }

    pub(crate) fn progress_ratio(&self) -> f64 {
        if self.duration > 0.0 && self.duration.is_finite() {
            (self.current_time / self.duration).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

pub(crate) struct PlaybackViewModel {
    source: String,
    media: Option<Box<dyn MediaElement>>,
    state: PlaybackState,
    advance_tx: mpsc::Sender<AdvanceRequest>,
}

impl PlaybackViewModel {
    pub(crate) fn open(
        backend: &dyn MediaBackend,
        source: &str,
        carried_autoplay: bool,
        advance_tx: mpsc::Sender<AdvanceRequest>,
    ) -> Self {
        let media = if source.trim().is_empty() {
            None
        } else {
            match backend.open(source) {
                Ok(media) => Some(media),
                Err(err) => {
                    warn!(source, error = %err, "failed to open audio source");
                    None
                }
            }
        };

        let mut model = Self {
            source: source.to_string(),
            media,
            state: PlaybackState::fresh(carried_autoplay),
            advance_tx,
        };

        if carried_autoplay {
            let started = match model.media.as_mut() {
                Some(media) => media.play(),
                None => Err(anyhow::anyhow!("no media resource")),
            };
            if let Err(err) = started {
                debug!(source, error = %err, "autoplay blocked");
                model.state.is_playing = false;
            }
        }
        model
    }

    /// Tears down the current resource and opens `source`, carrying only the
    /// auto-next preference across.
    pub(crate) fn replace_source(&mut self, backend: &dyn MediaBackend, source: &str) {
        let carried_autoplay = self.state.is_autoplay;
        self.teardown();
        *self = Self::open(backend, source, carried_autoplay, self.advance_tx.clone());
    }

    fn teardown(&mut self) {
        let Some(mut media) = self.media.take() else {
            return;
        };
        if let Err(err) = media.pause() {
            debug!(source = %self.source, error = %err, "pause during teardown failed");
        }
    }

    pub(crate) fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub(crate) fn source(&self) -> &str {
        &self.source
    }

    pub(crate) fn has_media(&self) -> bool {
        self.media.is_some()
    }

    pub(crate) fn toggle_play(&mut self) -> Result<()> {
        let Some(media) = self.media.as_mut() else {
            return Ok(());
        };
        if self.state.is_playing {
            media.pause()?;
        } else {
            media.play()?;
        }
        self.state.is_playing = !self.state.is_playing;
        Ok(())
    }

    /// Sets the position as given; callers own the clamping.
    pub(crate) fn seek(&mut self, time: f64) -> Result<()> {
        let Some(media) = self.media.as_mut() else {
            return Ok(());
        };
        media.set_position(time)?;
        self.state.current_time = time;
        Ok(())
    }

    pub(crate) fn skip(&mut self, delta: f64) -> Result<()> {
        if self.media.is_none() {
            return Ok(());
        }
        let target = clamp_position(self.state.current_time + delta, self.state.duration);
        self.seek(target)
    }

    pub(crate) fn set_volume(&mut self, volume: f64) -> Result<()> {
        let Some(media) = self.media.as_mut() else {
            return Ok(());
        };
        let clamped = clamp_volume(volume);
        media.set_volume(clamped)?;
        self.state.volume = clamped;
        Ok(())
    }

    pub(crate) fn set_playback_rate(&mut self, rate: f64) -> Result<()> {
        let Some(media) = self.media.as_mut() else {
            return Ok(());
        };
        media.set_rate(rate)?;
        self.state.playback_rate = rate;
        Ok(())
    }

    pub(crate) fn cycle_playback_rate(&mut self) -> Result<()> {
        self.set_playback_rate(next_rate(self.state.playback_rate))
    }

    pub(crate) fn toggle_loop(&mut self) -> Result<()> {
        let Some(media) = self.media.as_mut() else {
            return Ok(());
        };
        media.set_loop(!self.state.is_looping)?;
        self.state.is_looping = !self.state.is_looping;
        Ok(())
    }

    pub(crate) fn toggle_autoplay(&mut self) {
        self.state.is_autoplay = !self.state.is_autoplay;
    }

    /// Drains pending media events into the state.
    pub(crate) fn sync(&mut self) {
        let events = match self.media.as_mut() {
            Some(media) => media.poll_events(),
            None => return,
        };
        for event in events {
            self.apply_event(event);
        }
    }

    pub(crate) fn apply_event(&mut self, event: MediaEvent) {
        match event {
            MediaEvent::LoadedMetadata { duration } => self.state.duration = duration,
            MediaEvent::TimeUpdate { position } => self.state.current_time = position,
            MediaEvent::Ended => {
                self.state.is_playing = false;
                self.state.current_time = 0.0;
                if self.state.is_autoplay {
                    let request = AdvanceRequest {
                        source: self.source.clone(),
                    };
                    if self.advance_tx.send(request).is_err() {
                        debug!("advance listener is gone");
                    }
                }
            }
        }
    }
}

impl Drop for PlaybackViewModel {
    fn drop(&mut self) {
        self.teardown();
    }
}

pub(crate) fn clamp_position(target: f64, duration: f64) -> f64 {
    let upper = if duration.is_finite() && duration > 0.0 {
        duration
    } else {
        0.0
    };
    if target.is_nan() {
        return 0.0;
    }
    target.clamp(0.0, upper)
}

pub(crate) fn clamp_volume(volume: f64) -> f64 {
    if volume.is_nan() {
        0.0
    } else {
        volume.clamp(0.0, 1.0)
    }
}

pub(crate) fn next_rate(current: f64) -> f64 {
    match PLAYBACK_RATES
        .iter()
        .position(|rate| (rate - current).abs() < f64::EPSILON)
    {
        Some(idx) => PLAYBACK_RATES[(idx + 1) % PLAYBACK_RATES.len()],
        None => PLAYBACK_RATES[0],
    }
}

pub(crate) fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "0:00".to_string();
    }
    let total = seconds.floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}
