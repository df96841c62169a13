use std::time::Duration;

use serde::de::DeserializeOwned;
use thiserror::Error;

pub(crate) const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);
pub(crate) const READ_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub(crate) enum FetchError {
    #[error("HTTP status {status}{}", body_suffix(.body))]
    Status { status: u16, body: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("response decode failed: {0}")]
    Decode(String),
}

fn body_suffix(body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        String::new()
    } else {
        let truncated = body.chars().take(240).collect::<String>();
        format!(" ({truncated})")
    }
}

/// Single best-effort GET. Callers treat every failure as "leave the field
/// unresolved"; nothing here retries.
pub(crate) fn get_text(
    url: &str,
    connect_timeout: Duration,
    read_timeout: Duration,
) -> Result<String, FetchError> {
    let agent = ureq::AgentBuilder::new()
        .timeout_connect(connect_timeout)
        .timeout_read(read_timeout)
        .timeout_write(read_timeout)
        .build();

    match agent.get(url).call() {
        Ok(response) => response
            .into_string()
            .map_err(|err| FetchError::Decode(err.to_string())),
        Err(ureq::Error::Status(status, response)) => {
            let body = response.into_string().ok().unwrap_or_default();
            Err(FetchError::Status { status, body })
        }
        Err(ureq::Error::Transport(err)) => Err(FetchError::Transport(err.to_string())),
    }
}

pub(crate) fn get_json<T: DeserializeOwned>(url: &str) -> Result<T, FetchError> {
    let body = get_text(url, CONNECT_TIMEOUT, READ_TIMEOUT)?;
    serde_json::from_str(&body).map_err(|err| FetchError::Decode(err.to_string()))
}

#[cfg(test)]
pub(crate) mod test_server {
    use std::collections::VecDeque;
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Debug, Clone)]
    pub(crate) enum Behavior {
        Respond(u16, String),
        DelayRespond(Duration, u16, String),
    }

    #[derive(Debug)]
    pub(crate) struct TestServer {
        pub(crate) base_url: String,
        requests: Arc<AtomicUsize>,
        shutdown_tx: mpsc::Sender<()>,
        join_handle: Option<std::thread::JoinHandle<()>>,
    }

    impl TestServer {
        pub(crate) fn spawn(behaviors: Vec<Behavior>) -> Self {
            let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind test server");
            listener.set_nonblocking(true).expect("set nonblocking");
            let addr = listener.local_addr().expect("local addr");

            let requests = Arc::new(AtomicUsize::new(0));
            let requests_clone = Arc::clone(&requests);
            let shared_behaviors = Arc::new(Mutex::new(VecDeque::from(behaviors)));
            let behaviors_clone = Arc::clone(&shared_behaviors);
            let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

            let join_handle = std::thread::spawn(move || {
                loop {
                    if shutdown_rx.try_recv().is_ok() {
                        break;
                    }

                    match listener.accept() {
                        Ok((mut stream, _)) => {
                            requests_clone.fetch_add(1, Ordering::SeqCst);
                            let behavior = {
                                let mut queue = behaviors_clone.lock().expect("lock behaviors");
                                queue.pop_front().unwrap_or_else(|| {
                                    Behavior::Respond(200, "default-ok".to_string())
                                })
                            };
                            std::thread::spawn(move || {
                                let _ = consume_request(&mut stream);
                                serve_behavior(&mut stream, behavior);
                            });
                        }
                        Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                            std::thread::sleep(Duration::from_millis(5));
                        }
                        Err(_) => break,
                    }
                }
            });

            Self {
                base_url: format!("http://{addr}"),
                requests,
                shutdown_tx,
                join_handle: Some(join_handle),
            }
        }

        pub(crate) fn request_count(&self) -> usize {
            self.requests.load(Ordering::SeqCst)
        }
    }

    impl Drop for TestServer {
        fn drop(&mut self) {
            let _ = self.shutdown_tx.send(());
            if let Some(handle) = self.join_handle.take() {
                let _ = handle.join();
            }
        }
    }

    fn consume_request(stream: &mut TcpStream) -> std::io::Result<()> {
        stream.set_read_timeout(Some(Duration::from_millis(200)))?;
        let mut buf = [0_u8; 1024];
        let mut data = Vec::new();
        loop {
            match stream.read(&mut buf) {
                Ok(0) => break,
                Ok(read) => {
                    data.extend_from_slice(&buf[..read]);
                    if data.windows(4).any(|window| window == b"\r\n\r\n") {
                        break;
                    }
                }
                Err(err)
                    if err.kind() == std::io::ErrorKind::WouldBlock
                        || err.kind() == std::io::ErrorKind::TimedOut =>
                {
                    break;
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    fn reason_phrase(status: u16) -> &'static str {
        match status {
            200 => "OK",
            404 => "Not Found",
            429 => "Too Many Requests",
            500 => "Internal Server Error",
            503 => "Service Unavailable",
            _ => "Status",
        }
    }

    fn serve_behavior(stream: &mut TcpStream, behavior: Behavior) {
        match behavior {
            Behavior::Respond(status, body) => {
                let _ = write_response(stream, status, &body);
            }
            Behavior::DelayRespond(delay, status, body) => {
                std::thread::sleep(delay);
                let _ = write_response(stream, status, &body);
            }
        }
    }

    fn write_response(stream: &mut TcpStream, status: u16, body: &str) -> std::io::Result<()> {
        let reason = reason_phrase(status);
        let payload = body.as_bytes();
        write!(
            stream,
            "HTTP/1.1 {status} {reason}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            payload.len()
        )?;
        stream.write_all(payload)?;
        stream.flush()
    }
}
