//! Browser console logging and panic reporting.

use log::{Level, LevelFilter};
use std::sync::Once;

/// Parse a level name (`"off"`, `"error"` … `"trace"`), defaulting to info.
pub fn parse_level(level: &str) -> LevelFilter {
    level.trim().parse().unwrap_or(LevelFilter::Info)
}

/// Route `log` records to the browser console. Safe to call repeatedly;
/// later calls only change the level.
pub fn init_logging(level: LevelFilter) {
    static INIT: Once = Once::new();
    if level != LevelFilter::Off {
        // Install wide open; `set_max_level` below does the filtering.
        INIT.call_once(|| wasm_logger::init(wasm_logger::Config::new(Level::Trace)));
    }
    log::set_max_level(level);
    log::debug!("console logging at {level}");
}

pub fn install_panic_hook() {
    #[cfg(target_arch = "wasm32")]
    {
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("handwriting canvas panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}
