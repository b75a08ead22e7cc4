use crate::error::Result;
use regex::Regex;
use serde::Serialize;

const BLOCK_PATTERN: &str = r"(?ims)^[ \t]*<VirtualHost\b([^>]*)>(.*?)</VirtualHost>";
const SERVER_NAME_PATTERN: &str =
    r#"(?im)^[ \t]*ServerName[ \t]+"?(?:[a-z][a-z0-9+.-]*://)?([^"\s:]+)"#;
const DOCUMENT_ROOT_PATTERN: &str = r#"(?im)^[ \t]*DocumentRoot[ \t]+"?([^"\s]+)"#;
const SERVER_ALIAS_PATTERN: &str = r#"(?im)^[ \t]*ServerAlias[ \t]+"?([^"\n]*)"#;

/// A virtual host declared in the configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Host {
    /// Primary server name, without scheme or port
    pub name: String,
    /// Document root, empty when the block doesn't declare one
    pub root: String,
    /// Alternate names, in order of appearance
    pub aliases: Vec<String>,
    /// Port of the first `<VirtualHost>` address that carries one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

impl Host {
    pub fn new(name: impl Into<String>, root: impl Into<String>, aliases: Vec<String>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
            aliases,
            port: None,
        }
    }

    #[must_use]
    pub fn with_port(mut self, port: Option<u16>) -> Self {
        self.port = port;
        self
    }
}

/// Extracts `Host` records from `<VirtualHost>` blocks of an expanded configuration
#[derive(Debug, Clone)]
pub struct VhostExtractor {
    block: Regex,
    server_name: Regex,
    document_root: Regex,
    server_alias: Regex,
}

impl VhostExtractor {
    /// # Errors
    ///
    /// Returns `VhostError::Regex` if one of the directive patterns fails to compile.
    pub fn new() -> Result<Self> {
        Ok(Self {
            block: Regex::new(BLOCK_PATTERN)?,
            server_name: Regex::new(SERVER_NAME_PATTERN)?,
            document_root: Regex::new(DOCUMENT_ROOT_PATTERN)?,
            server_alias: Regex::new(SERVER_ALIAS_PATTERN)?,
        })
    }

    /// Returns one `Host` per `<VirtualHost>` block that declares a `ServerName`,
    /// in block order
    pub fn extract(&self, config: &str) -> Vec<Host> {
        let mut hosts = Vec::new();

        for block in self.block.captures_iter(config) {
            let address = block.get(1).map_or("", |m| m.as_str());
            let body = block.get(2).map_or("", |m| m.as_str());

            match self.extract_block(address, body) {
                Some(host) => hosts.push(host),
                None => tracing::trace!(address = address.trim(), "skipping vhost without ServerName"),
            }
        }

        hosts
    }

    fn extract_block(&self, address: &str, body: &str) -> Option<Host> {
        let name = self.server_name.captures(body)?.get(1)?.as_str();

        let root = self
            .document_root
            .captures(body)
            .and_then(|c| c.get(1))
            .map_or("", |m| m.as_str());

        let aliases = self
            .server_alias
            .captures_iter(body)
            .filter_map(|c| c.get(1))
            .flat_map(|m| m.as_str().split_whitespace())
            .map(str::to_string)
            .collect();

        Some(Host::new(name, root, aliases).with_port(address_port(address)))
    }
}

/// Port of the first address in a `<VirtualHost>` opener that has a numeric one
fn address_port(address: &str) -> Option<u16> {
    address
        .split_whitespace()
        .filter_map(|addr| addr.rsplit_once(':'))
        .find_map(|(_, port)| port.parse().ok())
}

/// Extracts hosts from configuration text with a freshly built extractor
///
/// # Errors
///
/// Returns `VhostError::Regex` if one of the directive patterns fails to compile.
pub fn extract_hosts(config: &str) -> Result<Vec<Host>> {
    Ok(VhostExtractor::new()?.extract(config))
}
