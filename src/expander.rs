use crate::error::{Result, VhostError};
use crate::fs_utils::{including_dir, list_config_files, read_config_file};
use crate::wildcard::{WildcardMatcher, split_wildcard};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

/// Matches a whole `Include`/`IncludeOptional` line, including its line break.
const INCLUDE_PATTERN: &str = r#"(?m)^[ \t]*Include(Optional)?[ \t]+"?([^"\n]*?)"?[ \t]*(?:\r?\n|$)"#;

/// Configuration for include expansion
#[derive(Debug, Clone)]
pub struct ExpandConfig {
    /// Fail with `CircularInclude` when a file re-enters its own include chain
    pub detect_cycles: bool,
    /// Visit directory entries in file name order instead of filesystem order
    pub sort_entries: bool,
}

impl Default for ExpandConfig {
    fn default() -> Self {
        Self {
            detect_cycles: true,
            sort_entries: true,
        }
    }
}

/// An include directive found in configuration text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeDirective {
    /// Target path as written, without quotes
    pub target: String,
    /// Whether the directive was spelled `IncludeOptional`
    pub optional: bool,
    /// Starting byte offset of the directive line
    pub start: usize,
    /// Byte offset just past the directive line and its line break
    pub end: usize,
}

/// Expands include directives recursively into one configuration document
#[derive(Debug, Clone)]
pub struct ConfigExpander {
    config: ExpandConfig,
    include_pattern: Regex,
}

impl ConfigExpander {
    /// Creates an expander with the given configuration
    ///
    /// # Errors
    ///
    /// Returns `VhostError::Regex` if the include pattern fails to compile.
    pub fn new(config: ExpandConfig) -> Result<Self> {
        Ok(Self {
            config,
            include_pattern: Regex::new(INCLUDE_PATTERN)?,
        })
    }

    /// Finds all include directives in the given text, in order of appearance
    pub fn find_includes(&self, text: &str) -> Vec<IncludeDirective> {
        let mut includes = Vec::new();

        for capture in self.include_pattern.captures_iter(text) {
            if let Some(full_match) = capture.get(0)
                && let Some(target) = capture.get(2)
            {
                includes.push(IncludeDirective {
                    target: target.as_str().trim().to_string(),
                    optional: capture.get(1).is_some(),
                    start: full_match.start(),
                    end: full_match.end(),
                });
            }
        }

        includes
    }

    /// Resolves an include target to the list of files it names
    ///
    /// Relative targets are resolved against `base_dir`, the directory of the
    /// including file. Directory targets (trailing separator, or an existing
    /// directory) list every regular file below them. Wildcard targets list the
    /// literal directory prefix and keep paths matching the whole pattern. Any
    /// other target names a single file, which is returned even if missing.
    ///
    /// # Errors
    ///
    /// - `VhostError::Regex` if a wildcard pattern cannot be compiled.
    /// - `VhostError::WalkDir` or `VhostError::Io` on directory traversal failures.
    pub fn resolve(&self, target: &str, base_dir: &Path) -> Result<Vec<PathBuf>> {
        if target.is_empty() {
            return Ok(Vec::new());
        }

        let path = if Path::new(target).is_absolute() {
            PathBuf::from(target)
        } else {
            base_dir.join(target)
        };

        if target.ends_with(std::path::is_separator) {
            return list_config_files(&path, self.config.sort_entries);
        }

        let full = path.to_string_lossy();
        if let Some((prefix, rest)) = split_wildcard(&full) {
            return self.resolve_wildcard(prefix, rest);
        }

        if path.is_dir() {
            return list_config_files(&path, self.config.sort_entries);
        }

        Ok(vec![path])
    }

    fn resolve_wildcard(&self, prefix: &str, rest: &str) -> Result<Vec<PathBuf>> {
        let prefix = if prefix.is_empty() { "." } else { prefix };
        let base = match fs::canonicalize(prefix) {
            Ok(base) => base,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let matcher = WildcardMatcher::new(&base.join(rest).to_string_lossy())?;
        let files = list_config_files(&base, self.config.sort_entries)?
            .into_iter()
            .filter(|file| matcher.is_match(file))
            .collect();

        Ok(files)
    }

    /// Returns the text of `path` with every include directive replaced by the
    /// expanded contents of the files it resolves to
    ///
    /// # Errors
    ///
    /// - `VhostError::ConfigNotFound` if the root file or a directly included file is missing.
    /// - `VhostError::ConfigUnreadable` if any file in the tree cannot be read.
    /// - `VhostError::CircularInclude` if cycle detection is enabled and a file includes itself.
    /// - Other errors from directory traversal or wildcard compilation.
    pub fn expand(&self, path: &Path) -> Result<String> {
        let mut chain = Vec::new();
        self.expand_file(path, &mut chain)
    }

    fn expand_file(&self, path: &Path, chain: &mut Vec<PathBuf>) -> Result<String> {
        let text = read_config_file(path)?;

        let tracked = if self.config.detect_cycles {
            let canonical = fs::canonicalize(path)
                .map_err(|e| VhostError::from_read(path.to_path_buf(), e))?;
            if chain.contains(&canonical) {
                return Err(VhostError::CircularInclude { path: canonical });
            }
            chain.push(canonical);
            true
        } else {
            false
        };

        let expanded = self.substitute(&text, &including_dir(path), chain);

        if tracked {
            chain.pop();
        }
        expanded
    }

    fn substitute(&self, text: &str, base_dir: &Path, chain: &mut Vec<PathBuf>) -> Result<String> {
        let includes = self.find_includes(text);
        if includes.is_empty() {
            return Ok(text.to_string());
        }

        let mut result = String::with_capacity(text.len());
        let mut cursor = 0;
        for include in &includes {
            result.push_str(&text[cursor..include.start]);
            cursor = include.end;

            let files = self.resolve(&include.target, base_dir)?;
            tracing::debug!(
                target_path = %include.target,
                optional = include.optional,
                files = files.len(),
                "resolved include directive"
            );

            for file in &files {
                let contents = self.expand_file(file, chain)?;
                result.push_str(&contents);
                if !contents.is_empty() && !contents.ends_with('\n') {
                    result.push('\n');
                }
            }
        }
        result.push_str(&text[cursor..]);

        Ok(result)
    }
}

/// Finds all include directives in the given text
///
/// # Errors
///
/// Returns `VhostError::Regex` if the include pattern fails to compile.
pub fn find_includes(text: &str) -> Result<Vec<IncludeDirective>> {
    Ok(ConfigExpander::new(ExpandConfig::default())?.find_includes(text))
}

/// Expands a configuration file with the default configuration
///
/// # Errors
///
/// See [`ConfigExpander::expand`].
pub fn expand(path: &Path) -> Result<String> {
    ConfigExpander::new(ExpandConfig::default())?.expand(path)
}
