use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::Result;
use serde_json::{Value, json};

use super::{MediaBackend, MediaElement, MediaEvent};

const PLAYER_BIN_ENV: &str = "PODLEARN_PLAYER_BIN";

const OBSERVED_PROPERTIES: [(u64, &str); 3] = [(1, "duration"), (2, "time-pos"), (3, "eof-reached")];

pub(crate) fn resolve_player_bin() -> PathBuf {
    resolve_player_bin_from_env(env::var_os(PLAYER_BIN_ENV))
}

pub(crate) fn resolve_player_bin_from_env(env_value: Option<OsString>) -> PathBuf {
    match env_value {
        Some(value) if !value.is_empty() => PathBuf::from(value),
        _ => PathBuf::from("mpv"),
    }
}

/// Maps one line of mpv JSON IPC output onto a media event.
pub(crate) fn parse_ipc_line(line: &str) -> Option<MediaEvent> {
    let value: Value = serde_json::from_str(line).ok()?;
    if value.get("event")?.as_str()? != "property-change" {
        return None;
    }
    let data = value.get("data")?;
    match value.get("name")?.as_str()? {
        "duration" => data
            .as_f64()
            .map(|duration| MediaEvent::LoadedMetadata { duration }),
        "time-pos" => data
            .as_f64()
            .map(|position| MediaEvent::TimeUpdate { position }),
        "eof-reached" if data.as_bool() == Some(true) => Some(MediaEvent::Ended),
        _ => None,
    }
}

pub(crate) fn command_line(args: Value) -> String {
    format!("{}\n", json!({ "command": args }))
}

/// Opens each source in its own `mpv` process driven over JSON IPC.
#[derive(Debug, Clone)]
pub(crate) struct MpvBackend {
    bin: PathBuf,
}

impl MpvBackend {
    pub(crate) fn new(bin: PathBuf) -> Self {
        Self { bin }
    }
}

#[cfg(unix)]
impl MediaBackend for MpvBackend {
    fn open(&self, source: &str) -> Result<Box<dyn MediaElement>> {
        Ok(Box::new(unix::MpvMedia::spawn(&self.bin, source)?))
    }
}

#[cfg(not(unix))]
impl MediaBackend for MpvBackend {
    fn open(&self, _source: &str) -> Result<Box<dyn MediaElement>> {
        Err(anyhow::anyhow!(
            "audio playback through {} needs Unix domain sockets",
            self.bin.display()
        ))
    }
}

#[cfg(unix)]
mod unix {
    use std::fs;
    use std::io::{BufRead, BufReader, Write};
    use std::os::unix::net::UnixStream;
    use std::path::{Path, PathBuf};
    use std::process::{Child, Command as ProcessCommand};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::mpsc::{self, TryRecvError};
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::{Duration, Instant};

    use anyhow::{Context, Result, anyhow};
    use serde_json::{Value, json};
    use tracing::{debug, warn};

    use super::super::process::{spawn_player, terminate, terminate_detached};
    use super::super::{MediaElement, MediaEvent};
    use super::{OBSERVED_PROPERTIES, command_line, parse_ipc_line};

    const SOCKET_WAIT: Duration = Duration::from_secs(3);

    static SOCKET_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn socket_path() -> PathBuf {
        let n = SOCKET_COUNTER.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!("podlearn-mpv-{}-{n}.sock", std::process::id()))
    }

    enum LinkState<W> {
        Connecting(mpsc::Receiver<Result<W>>),
        Ready(W),
        Failed(String),
    }

    /// Write half of the player IPC connection. Commands sent while the
    /// socket is still coming up are queued and flushed once it connects.
    pub(crate) struct IpcLink<W> {
        state: LinkState<W>,
        pending: Vec<String>,
    }

    impl<W: Write> IpcLink<W> {
        pub(crate) fn connecting(rx: mpsc::Receiver<Result<W>>) -> Self {
            Self {
                state: LinkState::Connecting(rx),
                pending: Vec::new(),
            }
        }

        pub(crate) fn send(&mut self, args: Value) -> Result<()> {
            self.pending.push(command_line(args));
            self.flush()?;
            match &self.state {
                LinkState::Failed(reason) => Err(anyhow!("audio player unavailable: {reason}")),
                _ => Ok(()),
            }
        }

        /// Picks up a finished connection attempt and writes queued commands.
        pub(crate) fn flush(&mut self) -> Result<()> {
            if let LinkState::Connecting(rx) = &self.state {
                let next = match rx.try_recv() {
                    Ok(Ok(writer)) => LinkState::Ready(writer),
                    Ok(Err(err)) => LinkState::Failed(format!("{err:#}")),
                    Err(TryRecvError::Empty) => return Ok(()),
                    Err(TryRecvError::Disconnected) => {
                        LinkState::Failed("connection attempt abandoned".to_string())
                    }
                };
                if let LinkState::Failed(reason) = &next {
                    warn!(reason = %reason, "audio player connection failed");
                }
                self.state = next;
            }

            match &mut self.state {
                LinkState::Connecting(_) => Ok(()),
                LinkState::Ready(writer) => {
                    for line in self.pending.drain(..) {
                        writer
                            .write_all(line.as_bytes())
                            .context("failed to send command to audio player")?;
                    }
                    Ok(())
                }
                LinkState::Failed(_) => {
                    self.pending.clear();
                    Ok(())
                }
            }
        }

        #[cfg(test)]
        fn writer(&self) -> Option<&W> {
            match &self.state {
                LinkState::Ready(writer) => Some(writer),
                _ => None,
            }
        }
    }

    fn connect(path: &Path, child: &Mutex<Child>) -> Result<UnixStream> {
        let deadline = Instant::now() + SOCKET_WAIT;
        loop {
            let exited = child
                .lock()
                .map_err(|_| anyhow!("audio player handle poisoned"))?
                .try_wait()
                .context("failed to poll audio player")?;
            if let Some(status) = exited {
                return Err(anyhow!("audio player exited early ({status})"));
            }
            if let Ok(stream) = UnixStream::connect(path) {
                return Ok(stream);
            }
            if Instant::now() >= deadline {
                return Err(anyhow!(
                    "timed out waiting for player IPC socket {}",
                    path.display()
                ));
            }
            thread::sleep(Duration::from_millis(30));
        }
    }

    /// Connects to the player socket, hands the write half back, then turns
    /// IPC output into media events until the player goes away.
    fn run_ipc(
        path: PathBuf,
        child: Arc<Mutex<Child>>,
        link_tx: mpsc::Sender<Result<UnixStream>>,
        events_tx: mpsc::Sender<MediaEvent>,
    ) {
        let streams = connect(&path, &child).and_then(|stream| {
            let reader = stream
                .try_clone()
                .context("failed to clone player IPC socket")?;
            Ok((stream, reader))
        });
        let reader = match streams {
            Ok((writer, reader)) => {
                if link_tx.send(Ok(writer)).is_err() {
                    return;
                }
                reader
            }
            Err(err) => {
                if let Ok(mut child) = child.lock() {
                    terminate(&mut child);
                }
                let _ = link_tx.send(Err(err));
                return;
            }
        };

        for line in BufReader::new(reader).lines() {
            let Ok(line) = line else {
                break;
            };
            let Some(event) = parse_ipc_line(&line) else {
                continue;
            };
            if events_tx.send(event).is_err() {
                break;
            }
        }
        debug!("player IPC reader finished");
    }

    fn remove_socket(path: &Path) {
        match fs::remove_file(path) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to remove player socket");
            }
        }
    }

    pub(crate) struct MpvMedia {
        child: Arc<Mutex<Child>>,
        socket_path: PathBuf,
        link: IpcLink<UnixStream>,
        events_rx: mpsc::Receiver<MediaEvent>,
        ended: bool,
    }

    impl MpvMedia {
        /// Starts the player and returns at once; the IPC socket is connected
        /// on a worker thread.
        pub(crate) fn spawn(bin: &Path, source: &str) -> Result<Self> {
            let socket_path = socket_path();
            let mut cmd = ProcessCommand::new(bin);
            cmd.args([
                "--no-video",
                "--no-terminal",
                "--idle=no",
                "--keep-open=yes",
                "--pause",
            ])
            .arg(format!("--input-ipc-server={}", socket_path.display()))
            .arg(source);

            let child = spawn_player(cmd)
                .with_context(|| format!("failed to start {}", bin.display()))?;
            let child = Arc::new(Mutex::new(child));

            let (link_tx, link_rx) = mpsc::channel();
            let (events_tx, events_rx) = mpsc::channel();
            {
                let child = Arc::clone(&child);
                let path = socket_path.clone();
                thread::spawn(move || run_ipc(path, child, link_tx, events_tx));
            }

            let mut media = Self {
                child,
                socket_path,
                link: IpcLink::connecting(link_rx),
                events_rx,
                ended: false,
            };
            for (id, name) in OBSERVED_PROPERTIES {
                media.send(json!(["observe_property", id, name]))?;
            }
            debug!(source, "audio player starting");
            Ok(media)
        }

        fn send(&mut self, args: Value) -> Result<()> {
            self.link.send(args)
        }
    }

    impl MediaElement for MpvMedia {
        fn play(&mut self) -> Result<()> {
            if self.ended {
                self.send(json!(["seek", 0, "absolute"]))?;
                self.ended = false;
            }
            self.send(json!(["set_property", "pause", false]))
        }

        fn pause(&mut self) -> Result<()> {
            self.send(json!(["set_property", "pause", true]))
        }

        fn set_position(&mut self, seconds: f64) -> Result<()> {
            self.ended = false;
            self.send(json!(["seek", seconds, "absolute"]))
        }

        fn set_volume(&mut self, volume: f64) -> Result<()> {
            self.send(json!(["set_property", "volume", volume * 100.0]))
        }

        fn set_rate(&mut self, rate: f64) -> Result<()> {
            self.send(json!(["set_property", "speed", rate]))
        }

        fn set_loop(&mut self, looping: bool) -> Result<()> {
            let value = if looping { "inf" } else { "no" };
            self.send(json!(["set_property", "loop-file", value]))
        }

        fn poll_events(&mut self) -> Vec<MediaEvent> {
            if let Err(err) = self.link.flush() {
                warn!(error = %err, "queued player commands not delivered");
            }
            let events: Vec<MediaEvent> = self.events_rx.try_iter().collect();
            if events.contains(&MediaEvent::Ended) {
                self.ended = true;
            }
            events
        }
    }

    impl Drop for MpvMedia {
        fn drop(&mut self) {
            if let Err(err) = self.send(json!(["quit"])) {
                debug!(error = %err, "quit command not delivered");
            }
            let socket_path = std::mem::take(&mut self.socket_path);
            terminate_detached(Arc::clone(&self.child), move || remove_socket(&socket_path));
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn sent(link: &IpcLink<Vec<u8>>) -> Vec<Value> {
            let bytes = link.writer().expect("connected");
            String::from_utf8_lossy(bytes)
                .lines()
                .map(|line| serde_json::from_str(line).expect("json line"))
                .collect()
        }

        #[test]
        fn commands_wait_for_the_socket_then_go_out_in_order() {
            let (tx, rx) = mpsc::channel();
            let mut link = IpcLink::connecting(rx);
            link.send(json!(["observe_property", 1, "duration"])).expect("queued");
            link.send(json!(["set_property", "pause", false])).expect("queued");
            assert!(link.writer().is_none());

            tx.send(Ok(Vec::new())).expect("hand over writer");
            link.flush().expect("flush");
            link.send(json!(["seek", 12.5, "absolute"])).expect("send");

            let sent = sent(&link);
            assert_eq!(sent.len(), 3);
            assert_eq!(sent[0]["command"][0], "observe_property");
            assert_eq!(sent[1]["command"][1], "pause");
            assert_eq!(sent[2]["command"][1], 12.5);
        }

        #[test]
        fn failed_connection_rejects_later_commands() {
            let (tx, rx) = mpsc::channel::<Result<Vec<u8>>>();
            let mut link = IpcLink::connecting(rx);
            link.send(json!(["set_property", "pause", false])).expect("queued");

            tx.send(Err(anyhow!("timed out waiting for player IPC socket")))
                .expect("report failure");
            link.flush().expect("failure is not a write error");
            let err = link.send(json!(["quit"])).expect_err("link is down");
            assert!(err.to_string().contains("timed out"));
        }

        #[test]
        fn abandoned_connection_attempt_counts_as_failure() {
            let (tx, rx) = mpsc::channel::<Result<Vec<u8>>>();
            let mut link = IpcLink::connecting(rx);
            drop(tx);
            assert!(link.send(json!(["quit"])).is_err());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_bin_env_override() {
        assert_eq!(resolve_player_bin_from_env(None), PathBuf::from("mpv"));
        assert_eq!(
            resolve_player_bin_from_env(Some(OsString::new())),
            PathBuf::from("mpv")
        );
        assert_eq!(
            resolve_player_bin_from_env(Some(OsString::from("/opt/mpv/bin/mpv"))),
            PathBuf::from("/opt/mpv/bin/mpv")
        );
    }

    #[test]
    fn property_changes_map_to_media_events() {
        assert_eq!(
            parse_ipc_line(r#"{"event":"property-change","id":1,"name":"duration","data":184.5}"#),
            Some(MediaEvent::LoadedMetadata { duration: 184.5 })
        );
        assert_eq!(
            parse_ipc_line(r#"{"event":"property-change","id":2,"name":"time-pos","data":3.25}"#),
            Some(MediaEvent::TimeUpdate { position: 3.25 })
        );
        assert_eq!(
            parse_ipc_line(r#"{"event":"property-change","id":3,"name":"eof-reached","data":true}"#),
            Some(MediaEvent::Ended)
        );
    }

    #[test]
    fn unrelated_ipc_lines_are_ignored() {
        for line in [
            r#"{"event":"property-change","id":3,"name":"eof-reached","data":false}"#,
            r#"{"event":"property-change","id":2,"name":"time-pos","data":null}"#,
            r#"{"event":"playback-restart"}"#,
            r#"{"data":null,"request_id":0,"error":"success"}"#,
            "not json",
        ] {
            assert_eq!(parse_ipc_line(line), None, "{line}");
        }
    }

    #[test]
    fn commands_are_newline_terminated_json() {
        let line = command_line(json!(["set_property", "pause", true]));
        assert!(line.ends_with('\n'));
        let value: Value = serde_json::from_str(line.trim_end()).expect("json");
        assert_eq!(value["command"][1], "pause");
    }
}
