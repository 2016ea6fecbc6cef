//! Version and compatibility metadata

use std::fmt;

use serde::Serialize;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// On-disk format written by this build
pub const INDEX_FORMAT_VERSION: u32 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct EngineVersion {
    pub impl_version: &'static str,
    pub format_version: u32,
}

impl EngineVersion {
    pub fn current() -> Self {
        Self {
            impl_version: VERSION,
            format_version: INDEX_FORMAT_VERSION,
        }
    }

    /// Whether this build can open a store written with `format_version`
    pub fn is_compatible(&self, format_version: u32) -> bool {
        format_version >= 1 && format_version <= self.format_version
    }
}

impl fmt::Display for EngineVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sifter {} (index format {})", self.impl_version, self.format_version)
    }
}
