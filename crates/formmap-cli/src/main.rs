//! The `formmap` binary.

use formmap_cli::command::{CommandRegistry, SETTINGS_ARG};
use formmap_cli::commands::register_builtin_commands;
use formmap_core::logging::setup_logging;
use formmap_core::settings_loader;

fn main() {
    let mut registry = CommandRegistry::new();
    register_builtin_commands(&mut registry);
    let matches = registry.build_cli().get_matches();

    let loaded = match matches.get_one::<String>(SETTINGS_ARG) {
        Some(path) => settings_loader::from_file_with_env(path),
        None => {
            let settings = settings_loader::from_env();
            settings.check().map(|()| settings)
        }
    };
    let settings = match loaded {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("formmap: {e}");
            std::process::exit(2);
        }
    };
    setup_logging(&settings);

    if let Err(e) = registry.execute(&matches, &settings) {
        tracing::error!("{e}");
        eprintln!("formmap: {e}");
        std::process::exit(1);
    }
}
