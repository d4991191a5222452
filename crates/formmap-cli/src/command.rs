//! Command framework for the `formmap` CLI.
//!
//! A [`ManagementCommand`] declares its name, help text and arguments, and
//! handles a parsed invocation. [`CommandRegistry`] collects commands, builds
//! the clap command tree, and dispatches to the selected subcommand.
//!
//! ```rust
//! use formmap_cli::command::{CommandRegistry, ManagementCommand};
//! use formmap_core::{FormmapResult, Settings};
//!
//! struct Hello;
//!
//! impl ManagementCommand for Hello {
//!     fn name(&self) -> &'static str { "hello" }
//!     fn help(&self) -> &'static str { "Say hello" }
//!
//!     fn handle(&self, _matches: &clap::ArgMatches, _settings: &Settings) -> FormmapResult<()> {
//!         println!("hello");
//!         Ok(())
//!     }
//! }
//!
//! let mut registry = CommandRegistry::new();
//! registry.register(Box::new(Hello));
//! let matches = registry.build_cli().try_get_matches_from(["formmap", "hello"]).unwrap();
//! registry.execute(&matches, &Settings::default()).unwrap();
//! ```

use std::collections::HashMap;

use formmap_core::{FormmapError, FormmapResult, Settings};

/// Name of the global option pointing at a settings file.
pub const SETTINGS_ARG: &str = "settings";

/// A command that can be registered and invoked through the CLI.
pub trait ManagementCommand: Send + Sync {
    /// The subcommand name.
    fn name(&self) -> &'static str;

    /// A one-line description shown in `--help`.
    fn help(&self) -> &'static str;

    /// Adds the command's arguments. The default adds none.
    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd
    }

    /// Runs the command.
    fn handle(&self, matches: &clap::ArgMatches, settings: &Settings) -> FormmapResult<()>;
}

/// A registry of commands keyed by name.
pub struct CommandRegistry {
    commands: HashMap<&'static str, Box<dyn ManagementCommand>>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
        }
    }

    /// Registers a command, replacing any command with the same name.
    pub fn register(&mut self, command: Box<dyn ManagementCommand>) {
        self.commands.insert(command.name(), command);
    }

    /// Returns the command with the given name.
    pub fn get(&self, name: &str) -> Option<&dyn ManagementCommand> {
        self.commands.get(name).map(AsRef::as_ref)
    }

    /// Returns the registered command names, sorted.
    pub fn list_commands(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Returns the number of registered commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns `true` if no command is registered.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Builds the top-level clap command with one subcommand per entry.
    pub fn build_cli(&self) -> clap::Command {
        let mut app = clap::Command::new("formmap")
            .about("formmap definition tooling")
            .subcommand_required(true)
            .arg(
                clap::Arg::new(SETTINGS_ARG)
                    .long(SETTINGS_ARG)
                    .global(true)
                    .value_name("FILE")
                    .help("Settings file (TOML or JSON)"),
            );

        for name in self.list_commands() {
            if let Some(cmd) = self.commands.get(name) {
                let sub = clap::Command::new(cmd.name()).about(cmd.help());
                app = app.subcommand(cmd.add_arguments(sub));
            }
        }
        app
    }

    /// Dispatches to the subcommand selected in `matches`.
    pub fn execute(&self, matches: &clap::ArgMatches, settings: &Settings) -> FormmapResult<()> {
        let (name, sub_matches) = matches.subcommand().ok_or_else(|| {
            FormmapError::ConfigurationError("No subcommand specified".to_string())
        })?;

        let cmd = self
            .get(name)
            .ok_or_else(|| FormmapError::ConfigurationError(format!("Unknown command: {name}")))?;

        tracing::debug!(command = name, "running command");
        cmd.handle(sub_matches, settings)
    }
}
