use std::path::{Path, PathBuf};

mod interview;
mod summary;
mod terminal;

use clap::ArgAction;
use interview::Interview;
use tracing::instrument;

/// Location of the configuration file, relative to the root.
const CONFIG_PATH: &str = ".elicit/config.toml";

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// The directory holding the `.elicit` configuration
    #[arg(short, long, default_value = ".", global = true)]
    root: PathBuf,

    /// Use this configuration file instead of the one under the root
    #[arg(short, long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        let config_path = self
            .config
            .unwrap_or_else(|| self.root.join(CONFIG_PATH));

        self.command
            .unwrap_or_else(|| Command::Interview(Interview::default()))
            .run(&config_path)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        // stdout carries the interview itself
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Run a requirement interview (default)
    Interview(Interview),

    /// Show or modify configuration settings
    Config(Config),
}

impl Command {
    fn run(self, config_path: &Path) -> anyhow::Result<()> {
        match self {
            Self::Interview(command) => {
                let config = load_config(config_path)?;
                command.run(&config)?;
            }
            Self::Config(command) => command.run(config_path)?,
        }
        Ok(())
    }
}

fn load_config(path: &Path) -> anyhow::Result<elicit::Config> {
    elicit::Config::load_or_default(path).map_err(|e| anyhow::anyhow!("{e}"))
}

#[derive(Debug, clap::Parser)]
pub struct Config {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Debug, clap::Parser)]
enum ConfigCommand {
    /// Show current configuration
    Show,

    /// Write a configuration file with the default settings
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key to set
        key: String,

        /// Value to set
        value: String,
    },
}

impl Config {
    #[instrument]
    fn run(self, config_path: &Path) -> anyhow::Result<()> {
        use terminal::Colorize;

        match self.command {
            ConfigCommand::Show => {
                let config = load_config(config_path)?;
                let source = if config_path.exists() {
                    config_path.display().to_string()
                } else {
                    "defaults".to_string()
                };

                println!("Configuration {}:", format!("({source})").dim());
                println!("  quit_word: {}", config.quit_word());
                println!("  oracle.kind: {}", config.oracle.kind);
                println!("  oracle.min_words: {}", config.oracle.min_words);
                println!("  oracle.model: {}", config.oracle.model);
                println!("  oracle.retries: {}", config.oracle.retries);
                if !config.oracle.command.is_empty() {
                    println!("  oracle.command: {:?}", config.oracle.command);
                }
            }
            ConfigCommand::Init { force } => {
                if config_path.exists() && !force {
                    anyhow::bail!(
                        "{} already exists (use --force to overwrite)",
                        config_path.display()
                    );
                }
                elicit::Config::default()
                    .save(config_path)
                    .map_err(|e| anyhow::anyhow!("{e}"))?;
                println!(
                    "{}",
                    format!("Created {}", config_path.display()).success()
                );
            }
            ConfigCommand::Set { key, value } => {
                let mut config = load_config(config_path)?;
                set(&mut config, &key, &value)?;
                config
                    .save(config_path)
                    .map_err(|e| anyhow::anyhow!("{e}"))?;
                println!("{}", format!("{key} = {value}").success());
            }
        }

        Ok(())
    }
}

fn set(config: &mut elicit::Config, key: &str, value: &str) -> anyhow::Result<()> {
    match key {
        "quit_word" => config.set_quit_word(value).map_err(|e| anyhow::anyhow!("{e}"))?,
        "oracle.kind" => {
            config.oracle.kind = value.parse().map_err(|e| anyhow::anyhow!("{e}"))?;
        }
        "oracle.min_words" => {
            config.oracle.min_words = value
                .parse()
                .map_err(|_| anyhow::anyhow!("Value must be a whole number"))?;
        }
        "oracle.retries" => {
            config.oracle.retries = value
                .parse()
                .map_err(|_| anyhow::anyhow!("Value must be a whole number"))?;
        }
        "oracle.model" => value.trim().clone_into(&mut config.oracle.model),
        "oracle.command" => {
            config.oracle.command = value.split_whitespace().map(str::to_string).collect();
        }
        _ => {
            return Err(anyhow::anyhow!(
                "Unknown configuration key: '{key}'\nSupported keys: quit_word, oracle.kind, \
                 oracle.min_words, oracle.retries, oracle.model, oracle.command",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use elicit::domain::OracleKind;
    use test_case::test_case;

    use super::*;

    #[test]
    fn defaults_to_interview() {
        let cli = Cli::try_parse_from(["elicit"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.root, PathBuf::from("."));
    }

    #[test]
    fn parses_interview_flags() {
        let cli = Cli::try_parse_from([
            "elicit",
            "-vv",
            "interview",
            "--script",
            "answers.txt",
            "--format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Some(Command::Interview(_))));
    }

    #[test]
    fn rejects_unknown_format() {
        assert!(Cli::try_parse_from(["elicit", "interview", "--format", "xml"]).is_err());
    }

    #[test_case("quit_word", "stop"; "quit word")]
    #[test_case("oracle.kind", "command"; "kind")]
    #[test_case("oracle.min_words", "6"; "min words")]
    #[test_case("oracle.model", "gpt-4o"; "model")]
    #[test_case("oracle.retries", "0"; "retries")]
    fn sets_known_keys(key: &str, value: &str) {
        let mut config = elicit::Config::default();
        set(&mut config, key, value).unwrap();
        assert_ne!(config, elicit::Config::default());
    }

    #[test]
    fn sets_command_as_argv() {
        let mut config = elicit::Config::default();
        set(&mut config, "oracle.kind", "command").unwrap();
        set(&mut config, "oracle.command", "python judge.py --strict").unwrap();
        assert_eq!(config.oracle.kind, OracleKind::Command);
        assert_eq!(config.oracle.command, ["python", "judge.py", "--strict"]);
    }

    #[test_case("colour", "blue"; "unknown key")]
    #[test_case("oracle.min_words", "four"; "not a number")]
    #[test_case("oracle.kind", "llm"; "unknown kind")]
    #[test_case("oracle.retries", "-1"; "negative retries")]
    #[test_case("quit_word", " "; "blank quit word")]
    fn rejects_bad_settings(key: &str, value: &str) {
        let mut config = elicit::Config::default();
        assert!(set(&mut config, key, value).is_err());
    }

    #[test]
    fn config_init_then_set() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_PATH);

        Config {
            command: ConfigCommand::Init { force: false },
        }
        .run(&path)
        .unwrap();
        assert!(path.exists());

        let again = Config {
            command: ConfigCommand::Init { force: false },
        }
        .run(&path);
        assert!(again.is_err());

        Config {
            command: ConfigCommand::Set {
                key: "quit_word".to_string(),
                value: "exit".to_string(),
            },
        }
        .run(&path)
        .unwrap();
        assert_eq!(load_config(&path).unwrap().quit_word(), "exit");
    }
}
