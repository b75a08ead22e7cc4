//! # vhostconf
//!
//! A library and CLI tool for reading Apache httpd configuration trees. It resolves
//! `Include`/`IncludeOptional` directives into one flat document and extracts the
//! virtual hosts declared in `<VirtualHost>` blocks.
//!
//! ## Features
//!
//! - Recursive include expansion, relative to the including file
//! - Directory includes (`Include sites-enabled/`) and wildcards (`Include conf.d/*.conf`)
//! - Deterministic, file-name ordered directory traversal
//! - Circular include detection
//! - Tolerant, case-insensitive extraction of `ServerName`, `ServerAlias` and `DocumentRoot`
//!
//! ## Usage
//!
//! ### As a Library
//!
//! ```no_run
//! use vhostconf::ConfigParser;
//!
//! let parser = ConfigParser::new("/etc/apache2/apache2.conf")?;
//! for host in parser.hosts()? {
//!     println!("{} -> {}", host.name, host.root);
//! }
//! # Ok::<(), vhostconf::VhostError>(())
//! ```
//!
//! ### As a CLI Tool
//!
//! ```bash
//! # List virtual hosts
//! vhostconf /etc/apache2/apache2.conf
//!
//! # Print the fully expanded configuration
//! vhostconf /etc/httpd/conf/httpd.conf --expand
//!
//! # JSON output for scripting
//! vhostconf /etc/apache2/apache2.conf -f json
//! ```

pub mod error;
pub mod expander;
pub mod fs_utils;
pub mod parser;
pub mod vhost;
pub mod wildcard;

// Re-export main types and functions for convenience
pub use error::{Result, VhostError};
pub use expander::{ConfigExpander, ExpandConfig, IncludeDirective, expand, find_includes};
pub use parser::{ConfigParser, ResolvedInclude};
pub use vhost::{Host, VhostExtractor, extract_hosts};
pub use wildcard::WildcardMatcher;
