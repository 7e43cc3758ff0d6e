//! Retrieval settings read from the environment.

use std::time::Duration;

/// Default per-connection timeout for remote roots.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration shared by the retrieval backends.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Per-request timeout for HTTP roots.
    pub timeout: Duration,
    /// FTP user, used when the root URL carries none.
    pub ftp_user: Option<String>,
    /// FTP password, used when the root URL carries none.
    pub ftp_password: Option<String>,
    /// SFTP user, used when the root URL carries none.
    pub sftp_user: Option<String>,
    /// Path to the private key for SFTP.
    pub sftp_key: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_FETCH_TIMEOUT,
            ftp_user: None,
            ftp_password: None,
            sftp_user: None,
            sftp_key: None,
        }
    }
}

impl FetchConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Meaning |
    /// |---|---|
    /// | `HYDRA_FETCH_TIMEOUT` | HTTP timeout in seconds (default 30) |
    /// | `HYDRA_FTP_USER` / `HYDRA_FTP_PASSWORD` | FTP credentials |
    /// | `HYDRA_SFTP_USER` / `HYDRA_SFTP_KEY` | SFTP user and key path |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let timeout = non_empty("HYDRA_FETCH_TIMEOUT")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map_or(DEFAULT_FETCH_TIMEOUT, Duration::from_secs);

        Self {
            timeout,
            ftp_user: non_empty("HYDRA_FTP_USER"),
            ftp_password: non_empty("HYDRA_FTP_PASSWORD"),
            sftp_user: non_empty("HYDRA_SFTP_USER"),
            sftp_key: non_empty("HYDRA_SFTP_KEY"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = FetchConfig::from_lookup(lookup(&[]));
        assert_eq!(config.timeout, DEFAULT_FETCH_TIMEOUT);
        assert!(config.ftp_user.is_none());
    }

    #[test]
    fn reads_timeout_and_credentials() {
        let config = FetchConfig::from_lookup(lookup(&[
            ("HYDRA_FETCH_TIMEOUT", "5"),
            ("HYDRA_SFTP_USER", "deploy"),
            ("HYDRA_FTP_PASSWORD", " "),
        ]));
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.sftp_user.as_deref(), Some("deploy"));
        assert!(config.ftp_password.is_none());
    }

    #[test]
    fn ignores_unparsable_timeout() {
        let config = FetchConfig::from_lookup(lookup(&[("HYDRA_FETCH_TIMEOUT", "soon")]));
        assert_eq!(config.timeout, DEFAULT_FETCH_TIMEOUT);
    }
}
