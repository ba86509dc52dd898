//! Credential discovery from openQA `client.conf` files.
//!
//! The reference clients read an INI-style file from `/etc/openqa` and from
//! the user config directory (usually `~/.config/openqa`), where each
//! section is named after a server and carries `key` and `secret` entries:
//!
//! ```ini
//! [openqa.example.org]
//! key = 1234567890ABCDEF
//! secret = 1234567890ABCDEF
//! ```
//!
//! Section names may also be full URLs like `[https://openqa.example.org]`.
//! The user file overrides the system file per key; section order is
//! preserved because the first configured server is the default when the
//! caller names none. The format is three rules deep, so it is parsed here
//! directly rather than pulling in a dedicated crate.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use log::{debug, warn};

/// API key and secret for one server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub key: String,
    pub secret: String,
}

/// Parsed contents of the client config files.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    // ordered: the first section is the default server
    sections: Vec<(String, BTreeMap<String, String>)>,
}

impl ClientConfig {
    /// Reads the well-known config file locations, system first so the
    /// user file wins on conflict. Missing files are fine; unreadable or
    /// malformed ones are skipped with a warning.
    pub fn load() -> Self {
        let mut paths = vec![PathBuf::from("/etc/openqa/client.conf")];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("openqa").join("client.conf"));
        }
        Self::from_paths(&paths)
    }

    /// Reads and merges an explicit list of config files, in order.
    pub fn from_paths(paths: &[PathBuf]) -> Self {
        let mut config = ClientConfig::default();
        for path in paths {
            match fs::read_to_string(path) {
                Ok(text) => {
                    debug!("Reading client config from {}", path.display());
                    config.merge_str(&text);
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to read {}: {}", path.display(), e),
            }
        }
        config
    }

    /// Parses one file's text into the config, overriding existing keys.
    fn merge_str(&mut self, text: &str) {
        let mut current: Option<usize> = None;
        for raw in text.lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }
            if let Some(name) = line
                .strip_prefix('[')
                .and_then(|rest| rest.strip_suffix(']'))
            {
                let name = name.trim();
                let index = match self.sections.iter().position(|(n, _)| n == name) {
                    Some(index) => index,
                    None => {
                        self.sections.push((name.to_string(), BTreeMap::new()));
                        self.sections.len() - 1
                    }
                };
                current = Some(index);
                continue;
            }
            let Some(index) = current else {
                // key/value before any section header; configparser would
                // reject the whole file, we just skip the line
                continue;
            };
            if let Some((key, value)) = line.split_once('=') {
                self.sections[index]
                    .1
                    .insert(key.trim().to_string(), value.trim().to_string());
            }
        }
    }

    /// The first configured server, used as the default when the caller
    /// does not name one.
    pub fn first_server(&self) -> Option<&str> {
        self.sections.first().map(|(name, _)| name.as_str())
    }

    /// Looks up the key/secret pair for a server section. Returns `None`
    /// when the section is absent or incomplete.
    pub fn credentials(&self, server: &str) -> Option<Credentials> {
        let (_, values) = self.sections.iter().find(|(name, _)| name == server)?;
        Some(Credentials {
            key: values.get("key")?.clone(),
            secret: values.get("secret")?.clone(),
        })
    }

    /// True when no config file contributed any section.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_conf(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn parses_sections_in_order() {
        let dir = TempDir::new().unwrap();
        let path = write_conf(
            &dir,
            "client.conf",
            "[openqa.example.org]\nkey = aaaa\nsecret = bbbb\n\n[localhost]\nkey = cccc\nsecret = dddd\n",
        );
        let config = ClientConfig::from_paths(&[path]);
        assert_eq!(config.first_server(), Some("openqa.example.org"));
        assert_eq!(
            config.credentials("localhost"),
            Some(Credentials {
                key: "cccc".to_string(),
                secret: "dddd".to_string(),
            })
        );
    }

    #[test]
    fn section_without_credentials_yields_none() {
        let dir = TempDir::new().unwrap();
        let path = write_conf(&dir, "client.conf", "[openqa.nokey.org]\n");
        let config = ClientConfig::from_paths(&[path]);
        assert_eq!(config.first_server(), Some("openqa.nokey.org"));
        assert_eq!(config.credentials("openqa.nokey.org"), None);
    }

    #[test]
    fn url_style_section_names() {
        let dir = TempDir::new().unwrap();
        let path = write_conf(
            &dir,
            "client.conf",
            "[https://openqa.example.org]\nkey = aaaa\nsecret = bbbb\n",
        );
        let config = ClientConfig::from_paths(&[path]);
        assert!(config.credentials("https://openqa.example.org").is_some());
        assert_eq!(config.credentials("openqa.example.org"), None);
    }

    #[test]
    fn later_file_overrides_earlier() {
        let dir = TempDir::new().unwrap();
        let system = write_conf(
            &dir,
            "system.conf",
            "[openqa.example.org]\nkey = old\nsecret = old\n",
        );
        let user = write_conf(
            &dir,
            "user.conf",
            "[openqa.example.org]\nkey = new\nsecret = new\n",
        );
        let config = ClientConfig::from_paths(&[system, user]);
        assert_eq!(
            config.credentials("openqa.example.org"),
            Some(Credentials {
                key: "new".to_string(),
                secret: "new".to_string(),
            })
        );
        // section count unchanged, order kept
        assert_eq!(config.first_server(), Some("openqa.example.org"));
    }

    #[test]
    fn missing_files_are_ignored() {
        let dir = TempDir::new().unwrap();
        let config = ClientConfig::from_paths(&[dir.path().join("does-not-exist.conf")]);
        assert!(config.is_empty());
        assert_eq!(config.first_server(), None);
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let dir = TempDir::new().unwrap();
        let path = write_conf(
            &dir,
            "client.conf",
            "# system wide\n; also a comment\n\n[localhost]\nkey = aaaa\nsecret = bbbb\n",
        );
        let config = ClientConfig::from_paths(&[path]);
        assert!(config.credentials("localhost").is_some());
    }
}
