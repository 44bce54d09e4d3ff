use std::sync::Arc;

use anyhow::Result;

use crate::config::Config;

pub(crate) mod history;
pub(crate) mod profile;

use history::{GeminiHistoryGenerator, GenerateError, LoginRecord};
use profile::{FetchError, HttpProfileFetcher, Profile};

pub(crate) trait ProfileSource: Send + Sync {
    fn fetch_profile(&self, username: &str) -> std::result::Result<Profile, FetchError>;
}

pub(crate) trait HistorySource: Send + Sync {
    fn generate_history(
        &self,
        username: &str,
    ) -> std::result::Result<Vec<LoginRecord>, GenerateError>;
}

/// The two remote collaborators a command run needs, shared with worker threads.
#[derive(Clone)]
pub(crate) struct Services {
    pub(crate) profiles: Arc<dyn ProfileSource>,
    pub(crate) histories: Arc<dyn HistorySource>,
}

impl Services {
    pub(crate) fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            profiles: Arc::new(HttpProfileFetcher::new(config)?),
            histories: Arc::new(GeminiHistoryGenerator::new(config)?),
        })
    }
}

#[cfg(test)]
pub(crate) mod test_server {
    use std::io::{Read, Write};
    use std::net::TcpListener;

    use crossbeam_channel::{unbounded, Receiver};

    /// Serves exactly one canned HTTP response and hands back the raw request it saw.
    pub(crate) struct OneShotServer {
        pub(crate) base_url: String,
        requests: Receiver<String>,
    }

    impl OneShotServer {
        pub(crate) fn request(&self) -> String {
            self.requests
                .recv_timeout(std::time::Duration::from_secs(5))
                .expect("server saw a request")
        }
    }

    pub(crate) fn serve_once(status_line: &str, body: &str) -> OneShotServer {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind test listener");
        let addr = listener.local_addr().expect("listener addr");
        let response = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let (tx, rx) = unbounded();
        std::thread::spawn(move || {
            let Ok((mut stream, _)) = listener.accept() else {
                return;
            };
            let request = read_request(&mut stream);
            let _ = stream.write_all(response.as_bytes());
            let _ = stream.flush();
            let _ = tx.send(request);
        });
        OneShotServer {
            base_url: format!("http://{addr}"),
            requests: rx,
        }
    }

    /// A base URL nothing listens on.
    pub(crate) fn closed_port_url() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind probe listener");
        let addr = listener.local_addr().expect("probe addr");
        drop(listener);
        format!("http://{addr}")
    }

    fn read_request(stream: &mut std::net::TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = match stream.read(&mut chunk) {
                Ok(0) | Err(_) => break,
                Ok(n) => n,
            };
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf);
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if buf.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }
}
