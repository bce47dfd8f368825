//! Logging setup.
//!
//! The crate logs through the `log` facade. Binaries and tests that want to
//! see the output call [`init_logger`] once; it installs an `env_logger`
//! backend filtered at `Info` unless `RUST_LOG` says otherwise.

use std::sync::Once;

use env_logger::Builder;
use log::LevelFilter;

static INIT: Once = Once::new();

/// Install the `env_logger` backend. Safe to call repeatedly.
pub fn init_logger() {
    INIT.call_once(|| {
        let mut builder = Builder::new();

        builder
            .filter_level(LevelFilter::Info)
            .filter_module("pagecache::buffer", LevelFilter::Info)
            .filter_module("pagecache::container", LevelFilter::Info)
            .filter_module("pagecache::storage", LevelFilter::Info)
            .format_timestamp_millis()
            .is_test(cfg!(test))
            .parse_default_env();

        // Another logger may already be installed by the host application.
        let _ = builder.try_init();
    });
}
