//! Logging initialization
//!
//! One `init` entry point selects a subscriber configuration per runtime
//! profile. Initialization is guarded so libraries and tests can call it
//! freely; only the first call installs a subscriber.

use std::sync::Once;
use tracing_subscriber::{util::SubscriberInitExt, EnvFilter};

/// Runtime logging profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Pretty-printed events at debug level
    Development,
    /// JSON events at info level
    Production,
    /// No subscriber output
    Test,
}

impl Profile {
    /// Filter applied when `RUST_LOG` is unset
    fn default_directive(self) -> &'static str {
        match self {
            Profile::Development => "atheneum=debug",
            Profile::Production => "atheneum=info",
            Profile::Test => "off",
        }
    }
}

static INIT_ONCE: Once = Once::new();

/// Install the global tracing subscriber for `profile`
///
/// Safe to call more than once; every call after the first is a no-op.
/// `RUST_LOG` overrides the profile's default filter when set.
pub fn init(profile: Profile) {
    INIT_ONCE.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(profile.default_directive()));
        match profile {
            Profile::Development => {
                tracing_subscriber::fmt().with_env_filter(filter).init();
            }
            Profile::Production => {
                tracing_subscriber::fmt().json().with_env_filter(filter).init();
            }
            Profile::Test => {
                tracing_subscriber::registry().init();
            }
        }
    });
}
