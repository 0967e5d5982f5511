//! Logger setup for native hosts. On the web the host installs its own
//! `log` backend.

/// Installs `env_logger`, honoring `RUST_LOG`. Safe to call more than once.
#[cfg(not(target_arch = "wasm32"))]
pub fn init() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .try_init();
}

/// Captures all levels through the test harness
#[cfg(not(target_arch = "wasm32"))]
pub fn init_for_tests() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::max())
        .is_test(true)
        .try_init();
}

#[cfg(target_arch = "wasm32")]
pub fn init() {}

#[cfg(target_arch = "wasm32")]
pub fn init_for_tests() {}
