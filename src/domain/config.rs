use std::{fmt, path::Path, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::domain::{
    Oracle,
    oracle::{CommandOracle, DEFAULT_RETRIES, HeuristicOracle},
};

/// Configuration for an interview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// Typing this word on its own ends the interview early.
    quit_word: String,

    /// How free-text answers are judged.
    pub oracle: OracleConfig,
}

/// Settings for the semantic judge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Which judge to use.
    #[serde(default)]
    pub kind: OracleKind,

    /// Minimum word count for descriptive answers (heuristic judge only).
    #[serde(default = "default_min_words")]
    pub min_words: usize,

    /// Program and arguments to run (command judge only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,

    /// Model name passed to the command judge.
    #[serde(default = "default_model")]
    pub model: String,

    /// How many times a malformed or failed judgment is retried (command
    /// judge only).
    #[serde(default = "default_retries")]
    pub retries: usize,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            kind: OracleKind::default(),
            min_words: default_min_words(),
            command: Vec::new(),
            model: default_model(),
            retries: default_retries(),
        }
    }
}

/// The available semantic judges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OracleKind {
    /// Offline, rule-of-thumb judgment.
    #[default]
    Heuristic,
    /// An external program, typically wrapping a language model.
    Command,
}

impl fmt::Display for OracleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Heuristic => f.write_str("heuristic"),
            Self::Command => f.write_str("command"),
        }
    }
}

impl FromStr for OracleKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "heuristic" => Ok(Self::Heuristic),
            "command" => Ok(Self::Command),
            other => Err(format!(
                "Unknown oracle kind '{other}' (expected 'heuristic' or 'command')"
            )),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            quit_word: default_quit_word(),
            oracle: OracleConfig::default(),
        }
    }
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))
    }

    /// Loads the configuration at `path`, or the defaults if there is no file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_or_default(path: &Path) -> Result<Self, String> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// Missing parent directories are created.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {e}"))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {e}"))?;
        }
        std::fs::write(path, content).map_err(|e| format!("Failed to write config file: {e}"))
    }

    /// Returns the word that ends the interview early.
    #[must_use]
    pub fn quit_word(&self) -> &str {
        &self.quit_word
    }

    /// Sets the quit word.
    ///
    /// # Errors
    ///
    /// Returns an error if the word is blank.
    pub fn set_quit_word(&mut self, word: &str) -> Result<(), String> {
        let word = word.trim();
        if word.is_empty() {
            return Err("The quit word cannot be empty".to_string());
        }
        word.clone_into(&mut self.quit_word);
        Ok(())
    }

    /// Whether `answer` is the quit word.
    #[must_use]
    pub fn is_quit(&self, answer: &str) -> bool {
        answer.trim().eq_ignore_ascii_case(&self.quit_word)
    }

    /// Builds the configured semantic judge.
    ///
    /// # Errors
    ///
    /// Returns an error if the command judge is selected but no command is
    /// configured.
    pub fn build_oracle(&self) -> Result<Box<dyn Oracle>, String> {
        match self.oracle.kind {
            OracleKind::Heuristic => Ok(Box::new(HeuristicOracle::new(self.oracle.min_words))),
            OracleKind::Command => {
                let Some((program, args)) = self.oracle.command.split_first() else {
                    return Err(
                        "The command oracle needs 'oracle.command' to name a program".to_string()
                    );
                };
                Ok(Box::new(
                    CommandOracle::new(program.clone(), args.to_vec(), self.oracle.model.clone())
                        .with_retries(self.oracle.retries),
                ))
            }
        }
    }
}

fn default_quit_word() -> String {
    "quit".to_string()
}

const fn default_min_words() -> usize {
    4
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

const fn default_retries() -> usize {
    DEFAULT_RETRIES
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_quit_word")]
        quit_word: String,

        #[serde(default)]
        oracle: OracleConfig,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 { quit_word, oracle } => Self { quit_word, oracle },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            quit_word: config.quit_word,
            oracle: config.oracle,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::domain::{Judgment, SemanticRule};

    #[test]
    fn load_reads_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            b"_version = \"1\"\nquit_word = \"exit\"\n\n[oracle]\nkind = \"command\"\ncommand = [\"judge\", \"--strict\"]\nmodel = \"gpt-4o\"\n",
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.quit_word(), "exit");
        assert_eq!(config.oracle.kind, OracleKind::Command);
        assert_eq!(config.oracle.command, ["judge", "--strict"]);
        assert_eq!(config.oracle.model, "gpt-4o");
        assert_eq!(config.oracle.min_words, 4);
        assert_eq!(config.oracle.retries, 2);
    }

    #[test]
    fn reads_retries() {
        let config: Config = toml::from_str("_version = \"1\"\n[oracle]\nretries = 5\n").unwrap();
        assert_eq!(config.oracle.retries, 5);
    }

    #[test]
    fn load_missing_file_returns_error() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing.toml");

        let error = Config::load(&missing).unwrap_err();
        assert!(error.starts_with("Failed to read config file:"));
    }

    #[test]
    fn load_or_default_tolerates_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(&tmp.path().join("missing.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn load_invalid_toml_returns_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"_version = \"1\"\n[oracle]\nmin_words = \"four\"\n")
            .unwrap();

        let error = Config::load(file.path()).unwrap_err();
        assert!(error.starts_with("Failed to parse config file:"));
    }

    #[test]
    fn unknown_version_is_rejected() {
        let result: Result<Config, _> = toml::from_str(r#"_version = "2""#);
        assert!(result.is_err());
    }

    #[test]
    fn empty_file_returns_default() {
        let expected = Config::default();
        let actual: Config = toml::from_str(r#"_version = "1""#).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn save_then_load() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(".elicit").join("config.toml");

        let mut config = Config::default();
        config.set_quit_word("stop").unwrap();
        config.oracle.min_words = 6;
        config.save(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("_version = \"1\""));
        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn quit_word_matches_loosely() {
        let config = Config::default();
        assert!(config.is_quit("quit"));
        assert!(config.is_quit("  QUIT\n"));
        assert!(!config.is_quit("quit now"));
    }

    #[test]
    fn blank_quit_word_is_refused() {
        let mut config = Config::default();
        assert!(config.set_quit_word("  ").is_err());
        assert_eq!(config.quit_word(), "quit");
    }

    #[test]
    fn default_oracle_is_heuristic() {
        let mut config = Config::default();
        config.oracle.min_words = 2;
        let oracle = config.build_oracle().unwrap();
        assert!(matches!(
            oracle.assess("Fix login", SemanticRule::ConcreteImpact),
            Ok(Judgment::Accept { .. })
        ));
    }

    #[test]
    fn command_oracle_needs_a_command() {
        let mut config = Config::default();
        config.oracle.kind = OracleKind::Command;
        assert!(config.build_oracle().is_err());

        config.oracle.command = vec!["judge".to_string()];
        assert!(config.build_oracle().is_ok());
    }

    #[test]
    fn oracle_kind_parses() {
        assert_eq!("Command".parse::<OracleKind>(), Ok(OracleKind::Command));
        assert!("llm".parse::<OracleKind>().is_err());
    }
}
