use std::fmt;

/// Errors surfaced by the world and the loop driving it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A bundle declared the same component type more than once, so it has no valid encoding.
    DuplicateComponent {
        /// The bundle's type name.
        bundle: &'static str,
        /// The repeated component's type name.
        component: &'static str,
    },

    /// A system takes an asset that has not been registered.
    MissingAsset {
        /// The system's name.
        system: &'static str,
        /// The missing asset's type name.
        asset: &'static str,
    },

    /// The loop's context was cancelled.
    Cancelled,

    /// The loop's context reached its deadline.
    DeadlineExceeded,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::DuplicateComponent { bundle, component } => {
                write!(f, "bundle {bundle} contains component {component} more than once")
            }
            Error::MissingAsset { system, asset } => {
                write!(f, "system {system} requires unregistered asset {asset}")
            }
            Error::Cancelled => write!(f, "context cancelled"),
            Error::DeadlineExceeded => write!(f, "context deadline exceeded"),
        }
    }
}

impl std::error::Error for Error {}

/// Result alias for fallible world operations.
pub type Result<T> = std::result::Result<T, Error>;
