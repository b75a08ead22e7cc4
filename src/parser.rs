use crate::error::{Result, VhostError};
use crate::expander::{ConfigExpander, ExpandConfig, IncludeDirective};
use crate::fs_utils::{including_dir, read_config_file};
use crate::vhost::{Host, VhostExtractor};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

/// An include directive of the root file together with the files it resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInclude {
    pub directive: IncludeDirective,
    pub files: Vec<PathBuf>,
}

/// Parser for an Apache configuration tree rooted at one file
#[derive(Debug, Clone)]
pub struct ConfigParser {
    config_path: PathBuf,
    expander: ConfigExpander,
    extractor: VhostExtractor,
}

impl ConfigParser {
    /// Creates a parser for the given root configuration file
    ///
    /// # Errors
    ///
    /// - `VhostError::ConfigNotFound` if the path doesn't exist.
    /// - `VhostError::ConfigUnreadable` if it exists but can't be opened or isn't a file.
    pub fn new(config_path: impl Into<PathBuf>) -> Result<Self> {
        Self::with_config(config_path, ExpandConfig::default())
    }

    /// Creates a parser with a custom expansion configuration
    ///
    /// # Errors
    ///
    /// See [`ConfigParser::new`].
    pub fn with_config(config_path: impl Into<PathBuf>, config: ExpandConfig) -> Result<Self> {
        let config_path = config_path.into();

        if !config_path.exists() {
            return Err(VhostError::ConfigNotFound { path: config_path });
        }
        if !config_path.is_file() {
            return Err(VhostError::ConfigUnreadable {
                path: config_path,
                source: io::Error::other("not a regular file"),
            });
        }
        File::open(&config_path).map_err(|e| VhostError::from_read(config_path.clone(), e))?;

        Ok(Self {
            config_path,
            expander: ConfigExpander::new(config)?,
            extractor: VhostExtractor::new()?,
        })
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Returns the configuration with all includes expanded
    ///
    /// # Errors
    ///
    /// See [`ConfigExpander::expand`].
    pub fn expanded(&self) -> Result<String> {
        self.expander.expand(&self.config_path)
    }

    /// Returns the virtual hosts declared anywhere in the configuration tree
    ///
    /// # Errors
    ///
    /// See [`ConfigExpander::expand`].
    pub fn hosts(&self) -> Result<Vec<Host>> {
        let config = self.expanded()?;
        Ok(self.extractor.extract(&config))
    }

    /// Lists the include directives of the root file and the files each one names
    ///
    /// # Errors
    ///
    /// Returns errors from reading the root file or resolving include targets.
    pub fn includes(&self) -> Result<Vec<ResolvedInclude>> {
        let text = read_config_file(&self.config_path)?;
        let base_dir = including_dir(&self.config_path);

        self.expander
            .find_includes(&text)
            .into_iter()
            .map(|directive| {
                let files = self.expander.resolve(&directive.target, &base_dir)?;
                Ok(ResolvedInclude { directive, files })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const FOO_VHOST: &str = r#"<VirtualHost *:80>
    ServerName foo.test
    ServerAlias www.foo.test www2.foo.test
    ServerAlias www3.foo.test
    DocumentRoot "/var/www/foo/public/"
</VirtualHost>
"#;

    fn vhost(name: &str) -> String {
        format!("<VirtualHost *:80>\n  ServerName {name}\n  DocumentRoot /srv/{name}\n</VirtualHost>\n")
    }

    /// Builds a small Debian-style layout:
    ///
    /// ```text
    /// apache.conf           Include foo.test.conf
    /// apache2.conf          IncludeOptional sites-available/
    /// apacheregex.conf      Include sites-available/*.com.conf
    /// foo.test.conf
    /// sites-available/{foo1.test.conf, default.com.conf, foo1.com.conf, nested/foo2.test.conf}
    /// ```
    fn create_test_env() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path();

        fs::write(base.join("foo.test.conf"), FOO_VHOST).unwrap();
        fs::write(base.join("apache.conf"), "ServerRoot /etc/apache2\nInclude foo.test.conf\n").unwrap();
        fs::write(base.join("apache2.conf"), "Listen 80\nIncludeOptional sites-available/\n").unwrap();
        fs::write(
            base.join("apacheregex.conf"),
            "Include sites-available/*.com.conf\n",
        )
        .unwrap();

        let sites = base.join("sites-available");
        fs::create_dir_all(sites.join("nested")).unwrap();
        fs::write(sites.join("foo1.test.conf"), vhost("foo1.test")).unwrap();
        fs::write(sites.join("default.com.conf"), vhost("default.com")).unwrap();
        fs::write(sites.join("foo1.com.conf"), vhost("foo1.com")).unwrap();
        fs::write(sites.join("nested/foo2.test.conf"), vhost("foo2.test")).unwrap();

        temp_dir
    }

    fn names(hosts: &[Host]) -> Vec<&str> {
        hosts.iter().map(|h| h.name.as_str()).collect()
    }

    #[test]
    fn test_retrieves_vhost() {
        let temp_dir = create_test_env();
        let parser = ConfigParser::new(temp_dir.path().join("foo.test.conf")).unwrap();

        let hosts = parser.hosts().unwrap();
        assert_eq!(hosts.len(), 1);
        assert_eq!(hosts[0].name, "foo.test");
        assert_eq!(hosts[0].root, "/var/www/foo/public/");
        assert_eq!(hosts[0].port, Some(80));
        assert_eq!(
            hosts[0].aliases,
            vec!["www.foo.test", "www2.foo.test", "www3.foo.test"]
        );
    }

    #[test]
    fn test_loads_files() {
        let temp_dir = create_test_env();
        let parser = ConfigParser::new(temp_dir.path().join("apache.conf")).unwrap();
        assert_eq!(names(&parser.hosts().unwrap()), vec!["foo.test"]);
    }

    #[test]
    fn test_loads_absolute_files() {
        let temp_dir = create_test_env();
        let base = temp_dir.path();
        fs::write(
            base.join("apacheabsolute.conf"),
            format!("Include {}\n", base.join("foo.test.conf").display()),
        )
        .unwrap();

        let parser = ConfigParser::new(base.join("apacheabsolute.conf")).unwrap();
        assert_eq!(names(&parser.hosts().unwrap()), vec!["foo.test"]);
    }

    #[test]
    fn test_loads_directories() {
        let temp_dir = create_test_env();
        let parser = ConfigParser::new(temp_dir.path().join("apache2.conf")).unwrap();

        assert_eq!(
            names(&parser.hosts().unwrap()),
            vec!["default.com", "foo1.com", "foo1.test", "foo2.test"]
        );
    }

    #[test]
    fn test_loads_absolute_directories() {
        let temp_dir = create_test_env();
        let base = temp_dir.path();
        fs::write(
            base.join("apache2absolute.conf"),
            format!("IncludeOptional {}/\n", base.join("sites-available").display()),
        )
        .unwrap();

        let parser = ConfigParser::new(base.join("apache2absolute.conf")).unwrap();
        assert_eq!(parser.hosts().unwrap().len(), 4);
    }

    #[test]
    fn test_loads_with_wildcard() {
        let temp_dir = create_test_env();
        let parser = ConfigParser::new(temp_dir.path().join("apacheregex.conf")).unwrap();
        assert_eq!(
            names(&parser.hosts().unwrap()),
            vec!["default.com", "foo1.com"]
        );
    }

    #[test]
    fn test_loads_absolute_wildcard() {
        let temp_dir = create_test_env();
        let base = temp_dir.path();
        fs::write(
            base.join("apacheregexabsolute.conf"),
            format!("Include {}/*.test.conf\n", base.join("sites-available").display()),
        )
        .unwrap();

        let parser = ConfigParser::new(base.join("apacheregexabsolute.conf")).unwrap();
        assert_eq!(
            names(&parser.hosts().unwrap()),
            vec!["foo1.test", "foo2.test"]
        );
    }

    #[test]
    fn test_missing_config() {
        let temp_dir = TempDir::new().unwrap();
        let result = ConfigParser::new(temp_dir.path().join("missing.conf"));
        assert!(matches!(result, Err(VhostError::ConfigNotFound { .. })));

        let result = ConfigParser::new(temp_dir.path());
        assert!(matches!(result, Err(VhostError::ConfigUnreadable { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_config() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("locked.conf");
        fs::write(&file, FOO_VHOST).unwrap();
        fs::set_permissions(&file, fs::Permissions::from_mode(0o000)).unwrap();

        // root ignores file permissions
        if fs::read(&file).is_ok() {
            return;
        }

        let result = ConfigParser::new(&file);
        assert!(matches!(result, Err(VhostError::ConfigUnreadable { .. })));
    }

    #[test]
    fn test_include_failure_aborts_hosts() {
        let temp_dir = create_test_env();
        let base = temp_dir.path();
        fs::write(
            base.join("broken.conf"),
            format!("{}Include gone.conf\n", vhost("kept.test")),
        )
        .unwrap();

        let parser = ConfigParser::new(base.join("broken.conf")).unwrap();
        assert!(matches!(parser.hosts(), Err(VhostError::ConfigNotFound { .. })));
    }

    #[test]
    fn test_circular_include() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path();
        fs::write(base.join("loop.conf"), "Include loop.conf\n").unwrap();

        let parser = ConfigParser::new(base.join("loop.conf")).unwrap();
        assert!(matches!(parser.hosts(), Err(VhostError::CircularInclude { .. })));
    }

    #[test]
    fn test_includes_listing() {
        let temp_dir = create_test_env();
        let base = temp_dir.path();
        let parser = ConfigParser::new(base.join("apache.conf")).unwrap();

        let includes = parser.includes().unwrap();
        assert_eq!(includes.len(), 1);
        assert_eq!(includes[0].directive.target, "foo.test.conf");
        assert_eq!(includes[0].files, vec![base.join("foo.test.conf")]);
        assert_eq!(parser.config_path(), base.join("apache.conf"));
    }

    #[test]
    fn test_expanded_matches_hosts() {
        let temp_dir = create_test_env();
        let parser = ConfigParser::new(temp_dir.path().join("apache.conf")).unwrap();

        let expanded = parser.expanded().unwrap();
        assert_eq!(expanded, format!("ServerRoot /etc/apache2\n{FOO_VHOST}"));
        assert_eq!(parser.hosts().unwrap(), parser.hosts().unwrap());
    }
}
