use clap::{Parser, ValueEnum};
use std::fmt::Write as _;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use vhostconf::{ConfigParser, ExpandConfig, Host, Result};

const LONG_HELP: &str = r#"
Resolution:
  Include file.conf        - Relative to the including file's directory
  Include /abs/file.conf   - Absolute path, must exist
  Include sites/           - Every file below sites/, recursively
  Include conf.d/*.conf    - Files below conf.d/ matching the wildcard
  IncludeOptional ...      - Same as Include

Examples:
  # List virtual hosts
  vhostconf /etc/apache2/apache2.conf
  # Use the config path from the environment
  VHOSTCONF_CONFIG=/etc/httpd/conf/httpd.conf vhostconf
  # Print the fully expanded configuration
  vhostconf /etc/apache2/apache2.conf --expand
  # Show what each Include of the root file resolves to
  vhostconf /etc/apache2/apache2.conf --list-includes
  # Output as JSON for scripting
  vhostconf /etc/apache2/apache2.conf --format json
  # Save output to file
  vhostconf /etc/apache2/apache2.conf -o hosts.txt

For more information, visit: https://github.com/0x484558/vhostconf
"#;

/// Apache virtual host discovery.
///
/// Copyright 2025 0x484558 @ aleph0 s.r.o.
/// Licensed under the EUPL v1.2.
#[derive(Parser, Debug)]
#[command(
    name = "vhostconf",
    version,
    author = "0x484558 @ aleph0 s.r.o.",
    about = "Apache virtual host discovery.",
    after_long_help = LONG_HELP,
    after_help = "For more information, visit: https://github.com/0x484558/vhostconf"
)]
struct Cli {
    /// Root Apache configuration file
    #[arg(value_name = "CONFIG", env = "VHOSTCONF_CONFIG")]
    config: PathBuf,

    /// Print the fully expanded configuration instead of hosts
    #[arg(long, conflicts_with = "list_includes")]
    expand: bool,

    /// List include directives of the root file and the files they resolve to
    #[arg(long)]
    list_includes: bool,

    /// Output format for hosts and includes
    #[arg(short = 'f', long, value_enum, default_value = "plain")]
    format: OutputFormat,

    /// Output file (defaults to stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Keep filesystem order when listing include directories
    #[arg(long)]
    no_sort: bool,

    /// Increase verbosity (can be used multiple times)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    /// Human readable output
    Plain,
    /// JSON output for scripting
    Json,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli);

    if let Err(e) = run(&cli) {
        tracing::error!(config = %cli.config.display(), "{e}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(cli: &Cli) {
    let default_level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let config = ExpandConfig {
        sort_entries: !cli.no_sort,
        ..ExpandConfig::default()
    };
    let parser = ConfigParser::with_config(&cli.config, config)?;
    tracing::info!(config = %parser.config_path().display(), "reading configuration");

    let rendered = if cli.expand {
        parser.expanded()?
    } else if cli.list_includes {
        render_includes(&parser, cli.format)?
    } else {
        let hosts = parser.hosts()?;
        tracing::info!(hosts = hosts.len(), "extracted virtual hosts");
        render_hosts(&hosts, cli.format)?
    };

    if let Some(output_path) = &cli.output {
        tracing::info!(output = %output_path.display(), "writing output");
        std::fs::write(output_path, rendered)?;
    } else {
        print!("{rendered}");
        io::stdout().flush()?;
    }

    Ok(())
}

fn render_hosts(hosts: &[Host], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(hosts)? + "\n"),
        OutputFormat::Plain => {
            let mut out = String::new();
            for host in hosts {
                let port = host.port.map(|p| format!(":{p}")).unwrap_or_default();
                let root = if host.root.is_empty() { "-" } else { &host.root };
                let _ = writeln!(out, "{}{port} {root}", host.name);
                for alias in &host.aliases {
                    let _ = writeln!(out, "  alias {alias}");
                }
            }
            Ok(out)
        }
    }
}

#[derive(serde::Serialize)]
struct IncludeInfo {
    target: String,
    optional: bool,
    files: Vec<String>,
}

fn render_includes(parser: &ConfigParser, format: OutputFormat) -> Result<String> {
    let includes = parser.includes()?;

    match format {
        OutputFormat::Json => {
            let infos: Vec<_> = includes
                .into_iter()
                .map(|inc| IncludeInfo {
                    target: inc.directive.target,
                    optional: inc.directive.optional,
                    files: inc.files.iter().map(|f| f.display().to_string()).collect(),
                })
                .collect();
            Ok(serde_json::to_string_pretty(&infos)? + "\n")
        }
        OutputFormat::Plain => {
            let mut out = String::new();
            for inc in &includes {
                let keyword = if inc.directive.optional {
                    "IncludeOptional"
                } else {
                    "Include"
                };
                let _ = writeln!(out, "{keyword} {}", inc.directive.target);
                if inc.files.is_empty() {
                    let _ = writeln!(out, "  (no files)");
                }
                for file in &inc.files {
                    let _ = writeln!(out, "  {}", file.display());
                }
            }
            Ok(out)
        }
    }
}
