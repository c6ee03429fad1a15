//! Compile-time build metadata reported by `/version` and `--version`.

use serde::Serialize;

pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const COMMIT: &str = match option_env!("REPCOACH_BUILD_COMMIT") {
    Some(c) => c,
    None => "unknown",
};
pub const BUILD_DATE: &str = match option_env!("REPCOACH_BUILD_DATE") {
    Some(d) => d,
    None => "unknown",
};

/// Human-readable version line, used in the startup log.
pub fn version_string() -> String {
    format!("{NAME} {VERSION} (commit: {COMMIT}, built: {BUILD_DATE})")
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct BuildInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub commit: &'static str,
    pub build_date: &'static str,
}

impl BuildInfo {
    #[must_use]
    pub const fn current() -> Self {
        Self {
            name: NAME,
            version: VERSION,
            commit: COMMIT,
            build_date: BUILD_DATE,
        }
    }
}
