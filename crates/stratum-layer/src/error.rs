//! Layer error types.

use std::path::PathBuf;

/// Broad category of a [`LayerError`].
///
/// Callers branch on the class rather than the variant: configuration and
/// resolution errors abort startup or a rescan, lookup misses are ordinary
/// outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Fatal setup problem. Never recovered automatically.
    Configuration,
    /// A module graph could not be closed. Aborts one rescan.
    Resolution,
    /// Expected, non-fatal miss.
    LookupMiss,
    /// Filesystem failure while scanning or reading a package.
    Io,
}

/// Errors from layer operations.
#[derive(Debug, thiserror::Error)]
pub enum LayerError {
    /// No bootstrap finder artifact could be located.
    #[error(
        "bootstrap finder artifact not found: no override configured and no file named \
         '{key}*.jar' below {searched}; set `finder.path` or STRATUM_FINDER_PATH"
    )]
    FinderNotFound {
        /// Filename prefix that was searched for.
        key: String,
        /// Directory the search started from.
        searched: PathBuf,
    },

    /// The host already accepted a watch directory.
    #[error("service manager already initialized")]
    AlreadyInitialized,

    /// Configuration could not be loaded or is invalid.
    #[error("configuration error: {0}")]
    Config(#[from] stratum_config::ConfigError),

    /// A capability identifier is malformed.
    #[error("invalid capability id: {0}")]
    InvalidId(String),

    /// A module requires another module that no package or ancestor provides.
    #[error("module '{module}' requires '{requires}', which is not available")]
    Resolution {
        /// The requiring module.
        module: String,
        /// The missing dependency.
        requires: String,
    },

    /// Two packages in one build declare the same module.
    #[error("module '{0}' is declared by more than one package")]
    DuplicateModule(String),

    /// A package or its descriptor is malformed.
    #[error("invalid package {path}: {message}")]
    InvalidPackage {
        /// Path to the package.
        path: PathBuf,
        /// What was wrong with it.
        message: String,
    },

    /// The file extension is not a recognized package format.
    #[error("unsupported package format: {0}")]
    UnsupportedPackage(PathBuf),

    /// No domain could resolve the named type.
    #[error("type not found: {name} (probed {probed} domains)")]
    TypeNotFound {
        /// Fully qualified type name.
        name: String,
        /// Number of domains that were probed.
        probed: usize,
    },

    /// No bootstrap finder is installed.
    #[error("no capability finder installed")]
    FinderNotInstalled,

    /// The caller has not declared interest in the capability.
    #[error("module '{module}' has not declared use of capability '{capability}'")]
    UndeclaredInterest {
        /// The calling module.
        module: String,
        /// The capability it tried to look up.
        capability: String,
    },

    /// A provider type could not be instantiated.
    #[error("failed to instantiate {type_name}: {message}")]
    Instantiation {
        /// The provider type.
        type_name: String,
        /// Failure reason.
        message: String,
    },

    /// I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// The path being accessed.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl LayerError {
    /// Classify this error.
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::FinderNotFound { .. }
            | Self::AlreadyInitialized
            | Self::Config(_)
            | Self::InvalidId(_) => ErrorClass::Configuration,
            Self::Resolution { .. }
            | Self::DuplicateModule(_)
            | Self::InvalidPackage { .. }
            | Self::UnsupportedPackage(_) => ErrorClass::Resolution,
            Self::TypeNotFound { .. }
            | Self::FinderNotInstalled
            | Self::UndeclaredInterest { .. }
            | Self::Instantiation { .. } => ErrorClass::LookupMiss,
            Self::Io { .. } => ErrorClass::Io,
        }
    }

    /// Whether this error is an expected miss rather than a failure.
    #[must_use]
    pub fn is_lookup_miss(&self) -> bool {
        self.class() == ErrorClass::LookupMiss
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for layer operations.
pub type LayerResult<T> = Result<T, LayerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classes() {
        assert_eq!(
            LayerError::AlreadyInitialized.class(),
            ErrorClass::Configuration
        );
        assert_eq!(
            LayerError::DuplicateModule("a".into()).class(),
            ErrorClass::Resolution
        );
        assert!(
            LayerError::TypeNotFound {
                name: "x.Y".into(),
                probed: 2
            }
            .is_lookup_miss()
        );
        assert_eq!(
            LayerError::io("/tmp", std::io::Error::other("boom")).class(),
            ErrorClass::Io
        );
    }

    #[test]
    fn test_finder_not_found_is_actionable() {
        let err = LayerError::FinderNotFound {
            key: "plugin-service-loader".into(),
            searched: PathBuf::from("/work"),
        };
        let msg = err.to_string();
        assert!(msg.contains("plugin-service-loader*.jar"));
        assert!(msg.contains("finder.path"));
    }
}
