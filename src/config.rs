use std::path::PathBuf;
use std::time::Duration;

/// Base URL used when neither `--api-url` nor `TASKHUB_API_URL` is set.
pub const DEFAULT_API_URL: &str = "http://localhost:3001";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Runtime settings for the client.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root of the remote API; every request path is joined onto it.
    pub api_url: String,
    /// Where the login token and user id are persisted.
    pub session_path: PathBuf,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Config {
    /// Builds the configuration from the environment.
    ///
    /// A `.env` file in the working directory is loaded first. An explicit
    /// `api_url` (from the command line) wins over `TASKHUB_API_URL`.
    pub fn load(api_url: Option<String>) -> Config {
        dotenvy::dotenv().ok();

        let api_url = api_url
            .or_else(|| std::env::var("TASKHUB_API_URL").ok())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let timeout = std::env::var("TASKHUB_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Config {
            api_url,
            session_path: session_path(),
            timeout: Duration::from_secs(timeout),
        }
    }
}

/// Returns the directory holding the session file and the TUI log.
///
/// `~/.local/share/taskhub` on Linux, `./` when no data dir is known.
pub fn data_dir() -> PathBuf {
    let mut p = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    p.push("taskhub");
    if !p.exists() {
        let _ = std::fs::create_dir_all(&p);
    }
    p
}

/// Returns the path to the session file (`session.json`).
///
/// The path is determined in the following order:
/// 1. `TASKHUB_SESSION` environment variable.
/// 2. `session.json` inside [`data_dir`].
fn session_path() -> PathBuf {
    std::env::var("TASKHUB_SESSION")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let mut p = data_dir();
            p.push("session.json");
            p
        })
}
