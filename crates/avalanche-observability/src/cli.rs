//! CLI argument parsing for per-crate debug flags
//!
//! Supports flags like `--debug-avalanche-core`, `--debug-avalanche-analysis`,
//! etc. to raise the log level of a single crate.

use std::collections::HashMap;
use std::env;

use crate::KNOWN_CRATES;

/// Environment variable holding comma-separated crate names (or `all`)
pub const DEBUG_ENV_VAR: &str = "AVALANCHE_DEBUG";

/// Parse debug flags from command-line arguments
///
/// # Example
/// ```rust
/// use avalanche_observability::CrateDebugFlags;
///
/// let flags = CrateDebugFlags::from_args(vec!["--debug-avalanche-core".to_string()]);
/// assert!(flags.is_enabled("avalanche-core"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct CrateDebugFlags {
    pub enabled_crates: HashMap<String, bool>,
}

impl CrateDebugFlags {
    /// Parse debug flags from command-line arguments
    ///
    /// Looks for arguments matching `--debug-{crate-name}` pattern.
    /// Also supports `--debug-all` to enable all crates.
    pub fn from_args<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut flags = CrateDebugFlags::default();
        for arg in args {
            flags.absorb(&arg);
        }
        flags
    }

    /// Returns true if `arg` was a debug flag and has been recorded.
    fn absorb(&mut self, arg: &str) -> bool {
        if arg == "--debug-all" {
            self.enable_all();
            return true;
        }
        if let Some(crate_name) = arg.strip_prefix("--debug-") {
            if !crate_name.is_empty() {
                self.enabled_crates.insert(crate_name.to_string(), true);
                return true;
            }
        }
        false
    }

    fn enable_all(&mut self) {
        for crate_name in KNOWN_CRATES {
            self.enabled_crates.insert(crate_name.to_string(), true);
        }
    }

    /// Check if debug is enabled for a specific crate
    pub fn is_enabled(&self, crate_name: &str) -> bool {
        self.enabled_crates.contains_key(crate_name)
    }

    /// Get all enabled crates
    pub fn enabled_crates(&self) -> Vec<&String> {
        self.enabled_crates.keys().collect()
    }

    /// Check if debug is enabled for any crate
    pub fn any_enabled(&self) -> bool {
        !self.enabled_crates.is_empty()
    }

    /// Get log level filter for a crate
    ///
    /// Returns `tracing::Level::DEBUG` if enabled, `tracing::Level::INFO` otherwise.
    pub fn log_level(&self, crate_name: &str) -> tracing::Level {
        if self.is_enabled(crate_name) {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Create a tracing filter from debug flags
    ///
    /// Returns a filter string that can be used with `EnvFilter`, e.g.
    /// `"avalanche_core=debug,info"`. Tracing targets are module paths, so
    /// crate names are written with underscores.
    pub fn to_filter_string(&self, base_level: &str) -> String {
        let mut filters: Vec<String> = self
            .enabled_crates
            .keys()
            .map(|crate_name| format!("{}=debug", crate_name.replace('-', "_")))
            .collect();
        filters.sort();
        filters.push(base_level.to_string());
        filters.join(",")
    }
}

/// Helper function to parse debug flags from environment
///
/// Checks both command-line arguments and the `AVALANCHE_DEBUG` environment
/// variable. Environment variable format: comma-separated crate names, e.g.
/// "avalanche-core,avalanche-analysis"
pub fn parse_debug_flags() -> CrateDebugFlags {
    let mut flags = CrateDebugFlags::from_args(env::args());
    merge_env_flags(&mut flags);
    flags
}

/// Separate debug flags from the remaining arguments.
///
/// Used by binaries whose argument parser would reject unknown
/// `--debug-*` switches. The `AVALANCHE_DEBUG` variable is merged in.
pub fn split_debug_args<I>(args: I) -> (CrateDebugFlags, Vec<String>)
where
    I: IntoIterator<Item = String>,
{
    let mut flags = CrateDebugFlags::default();
    let rest = args.into_iter().filter(|arg| !flags.absorb(arg)).collect();
    merge_env_flags(&mut flags);
    (flags, rest)
}

fn merge_env_flags(flags: &mut CrateDebugFlags) {
    if let Ok(env_var) = env::var(DEBUG_ENV_VAR) {
        if env_var == "all" {
            flags.enable_all();
        } else {
            for crate_name in env_var.split(',') {
                let crate_name = crate_name.trim();
                if !crate_name.is_empty() {
                    flags.enabled_crates.insert(crate_name.to_string(), true);
                }
            }
        }
    }
}

/// Generate help text for debug flags
pub fn debug_flags_help() -> String {
    format!(
        r#"Debug Flags:
  --debug-all                    Enable debug logging for all crates
  --debug-{{crate-name}}          Enable debug logging for specific crate

Available crates:
  {}

Environment Variable:
  AVALANCHE_DEBUG={{crate-name}}[,{{crate-name}}]  Enable debug for crates (comma-separated)
  AVALANCHE_DEBUG=all                               Enable debug for all crates

Examples:
  --debug-avalanche-core
  --debug-avalanche-core --debug-avalanche-analysis
  AVALANCHE_DEBUG=avalanche-analysis
"#,
        KNOWN_CRATES.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_crate_flag() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-avalanche-core".to_string()]);
        assert!(flags.is_enabled("avalanche-core"));
        assert!(!flags.is_enabled("avalanche-analysis"));
    }

    #[test]
    fn test_debug_all() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-all".to_string()]);
        for crate_name in KNOWN_CRATES {
            assert!(flags.is_enabled(crate_name), "{} should be enabled", crate_name);
        }
    }

    #[test]
    fn test_filter_string_uses_module_paths() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-avalanche-core".to_string()]);
        assert_eq!(flags.to_filter_string("warn"), "avalanche_core=debug,warn");
        assert_eq!(CrateDebugFlags::default().to_filter_string("info"), "info");
    }

    #[test]
    fn test_log_level() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-avalanche-core".to_string()]);
        assert_eq!(flags.log_level("avalanche-core"), tracing::Level::DEBUG);
        assert_eq!(flags.log_level("avalanche-config"), tracing::Level::INFO);
    }

    #[test]
    fn test_split_debug_args_keeps_other_arguments() {
        let args = vec![
            "run_analysis".to_string(),
            "--debug-avalanche-analysis".to_string(),
            "threshold".to_string(),
            "--threshold".to_string(),
            "3".to_string(),
        ];
        let (flags, rest) = split_debug_args(args);
        assert!(flags.is_enabled("avalanche-analysis"));
        assert_eq!(rest, vec!["run_analysis", "threshold", "--threshold", "3"]);
    }
}
