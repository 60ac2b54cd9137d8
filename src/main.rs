use scrim::app::App;
use scrim::config::types::Config;

fn main() {
    env_logger::init();
    log::info!("scrim v0.1.0 starting");

    // Load config from XDG path or use defaults
    let config_path = dirs_config_path();
    let config = match Config::load(&config_path) {
        Ok(cfg) => {
            log::info!("Config loaded from {}", config_path.display());
            cfg
        }
        Err(e) => {
            log::warn!("Config load error ({}), using defaults", e);
            Config::default()
        }
    };
    log::info!(
        "Fill: {}, layer: {}, opacity: {} step {}",
        config.fill.color,
        config.display.layer,
        config.opacity.initial,
        config.opacity.step
    );

    let app = App::new(config);
    if let Err(e) = app.run() {
        log::error!("Application error: {e:#}");
        std::process::exit(1);
    }
}

/// Get the config file path (~/.config/scrim/config.toml).
fn dirs_config_path() -> std::path::PathBuf {
    let mut path = dirs_home().join(".config").join("scrim");
    std::fs::create_dir_all(&path).ok();
    path.push("config.toml");
    path
}

/// Get the user's home directory.
fn dirs_home() -> std::path::PathBuf {
    std::env::var("HOME")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| std::path::PathBuf::from("."))
}
