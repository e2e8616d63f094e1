//! Namespaced configuration keys

use crate::{Error, Result};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// Longest accepted key segment.
pub const MAX_SEGMENT_LEN: usize = 63;

static SEGMENT: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]*$").ok());

/// Top-level namespace of a configuration key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConfigNamespace {
    /// Values scoped to the current project
    Project,
}

impl ConfigNamespace {
    /// The namespace as written in a key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Project => "project",
        }
    }

    fn parse(segment: &str) -> Option<Self> {
        match segment {
            "project" => Some(Self::Project),
            _ => None,
        }
    }
}

/// A validated configuration key such as `project.my.variable`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConfigKey {
    namespace: ConfigNamespace,
    path: Vec<String>,
}

impl ConfigKey {
    /// Validate a key given as its segments.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if the key is empty, its first
    /// segment is not a known namespace, it has no segment after the
    /// namespace, or any segment is malformed.
    pub fn parse<S: AsRef<str>>(segments: &[S]) -> Result<Self> {
        let Some((first, rest)) = segments.split_first() else {
            return Err(Error::invalid_parameter("Config key must not be empty"));
        };

        let namespace = ConfigNamespace::parse(first.as_ref()).ok_or_else(|| {
            Error::invalid_parameter(format!(
                "Invalid config namespace '{}' (allowed: 'project')",
                first.as_ref()
            ))
        })?;

        if rest.is_empty() {
            return Err(Error::invalid_parameter(format!(
                "Config key must have at least one segment after '{}'",
                namespace.as_str()
            )));
        }

        let path = rest
            .iter()
            .map(|segment| validate_segment(segment.as_ref()).map(str::to_string))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { namespace, path })
    }

    /// Validate a dotted key such as `project.my.variable`.
    ///
    /// # Errors
    ///
    /// Same as [`ConfigKey::parse`].
    pub fn parse_dotted(key: &str) -> Result<Self> {
        Self::parse(key.split('.').collect::<Vec<_>>().as_slice())
    }

    /// The key's namespace.
    #[must_use]
    pub const fn namespace(&self) -> ConfigNamespace {
        self.namespace
    }

    /// Segments after the namespace.
    #[must_use]
    pub fn path(&self) -> &[String] {
        &self.path
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.namespace.as_str())?;
        for segment in &self.path {
            write!(f, ".{segment}")?;
        }
        Ok(())
    }
}

fn validate_segment(segment: &str) -> Result<&str> {
    if segment.len() > MAX_SEGMENT_LEN {
        return Err(Error::invalid_parameter(format!(
            "Config key segment '{segment}' is longer than {MAX_SEGMENT_LEN} characters"
        )));
    }
    if !SEGMENT.as_ref().is_some_and(|re| re.is_match(segment)) {
        return Err(Error::invalid_parameter(format!(
            "Malformed config key segment '{segment}': use letters, digits, '-' and '_', \
             starting with a letter or digit"
        )));
    }
    Ok(segment)
}
