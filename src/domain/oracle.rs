use std::{
    io::Write,
    process::{Command, Stdio},
};

use serde::{Deserialize, Serialize};

/// A semantic requirement that no deterministic rule can certify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticRule {
    /// Says what needs to be done and where.
    WhatAndWhere,
    /// States a quantifiable benefit.
    QuantifiableBenefit,
    /// Defines success in specific, measurable terms.
    MeasurableSuccess,
    /// A single KPI that can be measured.
    MeasurableMetric,
    /// Names a concrete business impact.
    ConcreteImpact,
    /// A test case stating its input and expected output.
    InputAndExpectedOutput,
}

impl SemanticRule {
    /// Description of the rule handed to the judge.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::WhatAndWhere => {
                "The answer must describe WHAT needs to be done and WHERE it needs to be done."
            }
            Self::QuantifiableBenefit => "The answer must state a quantifiable business benefit.",
            Self::MeasurableSuccess => "The answer must define success in specific, measurable terms.",
            Self::MeasurableMetric => "The answer must be a KPI that can be measured.",
            Self::ConcreteImpact => "The answer must describe a concrete business impact.",
            Self::InputAndExpectedOutput => {
                "The answer must be a test case stating its input and its expected output."
            }
        }
    }
}

/// The verdict returned by an [`Oracle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Judgment {
    /// The text satisfies the rule.
    Accept {
        /// Normalized form of the answer.
        value: String,
    },
    /// The text does not satisfy the rule.
    Reject {
        /// Human-readable explanation shown to the user.
        reason: String,
    },
}

/// Failure to obtain a verdict.
///
/// The answer is treated as never having been given.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum OracleError {
    /// The judge could not be reached.
    #[error("semantic judge unavailable: {0}")]
    Unavailable(String),

    /// The judge answered with something that is not a verdict.
    #[error("semantic judge returned malformed output: {0}")]
    Malformed(String),
}

/// The semantic-judgment capability.
///
/// Consulted only for free-text rules; everything else is validated locally.
pub trait Oracle {
    /// Assesses `text` against `rule`.
    ///
    /// # Errors
    ///
    /// Returns an [`OracleError`] if no verdict could be obtained.
    fn assess(&self, text: &str, rule: SemanticRule) -> Result<Judgment, OracleError>;
}

impl<O: Oracle + ?Sized> Oracle for &O {
    fn assess(&self, text: &str, rule: SemanticRule) -> Result<Judgment, OracleError> {
        (**self).assess(text, rule)
    }
}

impl<O: Oracle + ?Sized> Oracle for Box<O> {
    fn assess(&self, text: &str, rule: SemanticRule) -> Result<Judgment, OracleError> {
        (**self).assess(text, rule)
    }
}

/// A deterministic, offline judge built from simple textual cues.
///
/// Numbers, percentages and currency amounts count as quantifiable; arrows
/// and words such as "expect" mark a test case's expected output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeuristicOracle {
    min_words: usize,
}

impl Default for HeuristicOracle {
    fn default() -> Self {
        Self::new(4)
    }
}

const LOCATION_WORDS: &[&str] = &[
    "in", "on", "for", "to", "within", "at", "across", "into", "inside", "from", "via",
];

const MEASURE_WORDS: &[&str] = &[
    "rate", "ratio", "percent", "percentage", "count", "number", "score", "time", "latency",
    "uptime", "volume", "average", "median",
];

const OUTCOME_MARKERS: &[&str] = &["->", "=>", "→"];

const OUTCOME_WORDS: &[&str] = &["expect", "expected", "expects", "should", "returns", "then"];

impl HeuristicOracle {
    /// Creates a judge requiring at least `min_words` words for descriptive
    /// answers.
    #[must_use]
    pub const fn new(min_words: usize) -> Self {
        Self { min_words }
    }

    fn words(text: &str) -> Vec<String> {
        text.split(|c: char| !c.is_alphanumeric() && c != '\'')
            .filter(|word| !word.is_empty())
            .map(str::to_lowercase)
            .collect()
    }

    fn is_quantified(text: &str) -> bool {
        text.chars()
            .any(|c| c.is_ascii_digit() || matches!(c, '%' | '$' | '£' | '€'))
    }

    fn mentions(words: &[String], vocabulary: &[&str]) -> bool {
        words.iter().any(|word| vocabulary.contains(&word.as_str()))
    }
}

impl Oracle for HeuristicOracle {
    fn assess(&self, text: &str, rule: SemanticRule) -> Result<Judgment, OracleError> {
        let words = Self::words(text);
        let rejection = match rule {
            SemanticRule::WhatAndWhere if words.len() < self.min_words => Some(
                "Please describe the requirement in more detail: what needs to be done, and \
                 where."
                    .to_string(),
            ),
            SemanticRule::WhatAndWhere if !Self::mentions(&words, LOCATION_WORDS) => Some(
                "Could you clarify WHERE this will be implemented (which product, system or \
                 screen)?"
                    .to_string(),
            ),
            SemanticRule::QuantifiableBenefit if !Self::is_quantified(text) => Some(
                "Can you provide specific, measurable benefits, such as a percentage, an amount \
                 or the time saved?"
                    .to_string(),
            ),
            SemanticRule::MeasurableSuccess
                if !Self::is_quantified(text) && !Self::mentions(&words, MEASURE_WORDS) =>
            {
                Some(
                    "How exactly will success be measured? Please include a target or threshold."
                        .to_string(),
                )
            }
            SemanticRule::MeasurableMetric
                if !Self::is_quantified(text) && !Self::mentions(&words, MEASURE_WORDS) =>
            {
                Some(format!(
                    "How will we measure '{text}'? Please include a unit or a target."
                ))
            }
            SemanticRule::ConcreteImpact if words.len() < self.min_words => Some(
                "What concrete business impact would missing the date cause, for example lost \
                 revenue, penalties or affected customers?"
                    .to_string(),
            ),
            SemanticRule::InputAndExpectedOutput
                if !OUTCOME_MARKERS.iter().any(|marker| text.contains(marker))
                    && !Self::mentions(&words, OUTCOME_WORDS) =>
            {
                Some(format!(
                    "Test case '{text}' needs an input and the expected output, for example \
                     'expired card -> payment declined'."
                ))
            }
            _ => None,
        };

        Ok(rejection.map_or_else(
            || Judgment::Accept {
                value: text.to_string(),
            },
            |reason| Judgment::Reject { reason },
        ))
    }
}

/// Delegates judgment to an external program.
///
/// The program receives one JSON request on stdin:
///
/// ```json
/// {"text": "...", "rule": "quantifiable_benefit", "description": "...", "model": "gpt-4o-mini"}
/// ```
///
/// and must print a verdict to stdout, either
/// `{"verdict": "accept", "value": "..."}` (the value is optional) or
/// `{"verdict": "reject", "reason": "..."}`.
///
/// Malformed output and non-zero exits are retried up to `retries` times
/// before the judgment is given up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOracle {
    program: String,
    args: Vec<String>,
    model: String,
    retries: usize,
}

/// The default number of retries for a failed judgment.
pub const DEFAULT_RETRIES: usize = 2;

/// A failed call, and whether trying again may help.
enum Failure {
    Fatal(OracleError),
    Transient(OracleError),
}

#[derive(Debug, Serialize)]
struct Request<'a> {
    text: &'a str,
    rule: SemanticRule,
    description: &'a str,
    model: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "verdict", rename_all = "lowercase")]
enum Response {
    Accept {
        #[serde(default)]
        value: Option<String>,
    },
    Reject {
        reason: String,
    },
}

impl CommandOracle {
    /// Creates a judge that runs `program` with `args`, asking it to use
    /// `model`.
    #[must_use]
    pub const fn new(program: String, args: Vec<String>, model: String) -> Self {
        Self {
            program,
            args,
            model,
            retries: DEFAULT_RETRIES,
        }
    }

    /// Sets how many times a malformed or failed judgment is retried.
    #[must_use]
    pub const fn with_retries(mut self, retries: usize) -> Self {
        self.retries = retries;
        self
    }

    /// Interprets the judge's output for an answer of `text`.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError::Malformed`] when the output is not a verdict.
    pub fn parse_verdict(output: &str, text: &str) -> Result<Judgment, OracleError> {
        let response: Response = serde_json::from_str(output.trim())
            .map_err(|e| OracleError::Malformed(e.to_string()))?;
        match response {
            Response::Accept { value } => Ok(Judgment::Accept {
                value: value
                    .filter(|v| !v.trim().is_empty())
                    .unwrap_or_else(|| text.to_string()),
            }),
            Response::Reject { reason } if reason.trim().is_empty() => Err(
                OracleError::Malformed("rejection without a reason".to_string()),
            ),
            Response::Reject { reason } => Ok(Judgment::Reject { reason }),
        }
    }
}

impl CommandOracle {
    fn call(&self, request: &str, text: &str) -> Result<Judgment, Failure> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                Failure::Fatal(OracleError::Unavailable(format!(
                    "failed to run {}: {e}",
                    self.program
                )))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(request.as_bytes())
                .map_err(|e| Failure::Transient(OracleError::Unavailable(e.to_string())))?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| Failure::Fatal(OracleError::Unavailable(e.to_string())))?;

        if !output.status.success() {
            return Err(Failure::Transient(OracleError::Unavailable(format!(
                "{} exited with {}",
                self.program, output.status
            ))));
        }

        let stdout = String::from_utf8(output.stdout)
            .map_err(|e| Failure::Transient(OracleError::Malformed(e.to_string())))?;
        Self::parse_verdict(&stdout, text).map_err(Failure::Transient)
    }
}

impl Oracle for CommandOracle {
    fn assess(&self, text: &str, rule: SemanticRule) -> Result<Judgment, OracleError> {
        let request = serde_json::to_string(&Request {
            text,
            rule,
            description: rule.description(),
            model: &self.model,
        })
        .map_err(|e| OracleError::Unavailable(e.to_string()))?;

        let mut attempt = 0;
        loop {
            tracing::debug!(program = %self.program, ?rule, attempt, "requesting judgment");
            match self.call(&request, text) {
                Ok(judgment) => return Ok(judgment),
                Err(Failure::Transient(error)) if attempt < self.retries => {
                    tracing::warn!(program = %self.program, %error, attempt, "retrying judgment");
                    attempt += 1;
                }
                Err(Failure::Transient(error) | Failure::Fatal(error)) => return Err(error),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn accepts(rule: SemanticRule, text: &str) -> bool {
        matches!(
            HeuristicOracle::default().assess(text, rule).unwrap(),
            Judgment::Accept { .. }
        )
    }

    #[test_case(SemanticRule::WhatAndWhere, "Add a new checkout flow for the mobile app", true; "what and where")]
    #[test_case(SemanticRule::WhatAndWhere, "Checkout", false; "too short")]
    #[test_case(SemanticRule::WhatAndWhere, "Build a brand new checkout flow", false; "no where")]
    #[test_case(SemanticRule::QuantifiableBenefit, "Increase conversion by 15%", true; "percentage")]
    #[test_case(SemanticRule::QuantifiableBenefit, "Customers will be happier", false; "unquantified")]
    #[test_case(SemanticRule::MeasurableSuccess, "Checkout completion rate above target", true; "measure word")]
    #[test_case(SemanticRule::MeasurableSuccess, "It works well", false; "vague success")]
    #[test_case(SemanticRule::MeasurableMetric, "Average order value", true; "metric")]
    #[test_case(SemanticRule::ConcreteImpact, "We lose the holiday trading window", true; "impact")]
    #[test_case(SemanticRule::ConcreteImpact, "Bad", false; "impact too short")]
    #[test_case(SemanticRule::InputAndExpectedOutput, "valid card -> payment succeeds", true; "arrow")]
    #[test_case(SemanticRule::InputAndExpectedOutput, "Given an expired card the payment should be declined", true; "should")]
    #[test_case(SemanticRule::InputAndExpectedOutput, "Test payments", false; "no expectation")]
    fn heuristic_verdicts(rule: SemanticRule, text: &str, expected: bool) {
        assert_eq!(accepts(rule, text), expected);
    }

    #[test]
    fn heuristic_is_deterministic() {
        let oracle = HeuristicOracle::default();
        let first = oracle.assess("Nice to have", SemanticRule::QuantifiableBenefit);
        let second = oracle.assess("Nice to have", SemanticRule::QuantifiableBenefit);
        assert_eq!(first, second);
    }

    #[test]
    fn metric_rejection_names_the_metric() {
        let judgment = HeuristicOracle::default()
            .assess("Happiness", SemanticRule::MeasurableMetric)
            .unwrap();
        let Judgment::Reject { reason } = judgment else {
            panic!("expected rejection");
        };
        assert!(reason.contains("'Happiness'"));
    }

    #[test]
    fn parses_accept_with_value() {
        let judgment =
            CommandOracle::parse_verdict(r#"{"verdict": "accept", "value": "tidy"}"#, "raw").unwrap();
        assert_eq!(
            judgment,
            Judgment::Accept {
                value: "tidy".to_string()
            }
        );
    }

    #[test]
    fn accept_without_value_keeps_text() {
        let judgment = CommandOracle::parse_verdict(r#"{"verdict": "accept"}"#, "raw").unwrap();
        assert_eq!(
            judgment,
            Judgment::Accept {
                value: "raw".to_string()
            }
        );
    }

    #[test]
    fn parses_reject() {
        let judgment = CommandOracle::parse_verdict(
            r#"{"verdict": "reject", "reason": "Not measurable"}"#,
            "raw",
        )
        .unwrap();
        assert_eq!(
            judgment,
            Judgment::Reject {
                reason: "Not measurable".to_string()
            }
        );
    }

    #[test_case("I think this is fine"; "prose")]
    #[test_case(r#"{"verdict": "maybe"}"#; "unknown verdict")]
    #[test_case(r#"{"verdict": "reject", "reason": " "}"#; "blank reason")]
    fn malformed_verdicts(output: &str) {
        let error = CommandOracle::parse_verdict(output, "raw").unwrap_err();
        assert!(matches!(error, OracleError::Malformed(_)));
    }

    #[test]
    fn missing_program_is_unavailable() {
        let oracle = CommandOracle::new(
            "definitely-not-a-real-judge-program".to_string(),
            Vec::new(),
            "gpt-4o-mini".to_string(),
        );
        let error = oracle
            .assess("Increase revenue", SemanticRule::QuantifiableBenefit)
            .unwrap_err();
        assert!(matches!(error, OracleError::Unavailable(_)));
    }

    /// A judge that prints garbage on its first `failures` runs, counting
    /// runs in a file under `dir`.
    #[cfg(unix)]
    fn flaky_judge(dir: &std::path::Path, failures: usize, retries: usize) -> CommandOracle {
        let counter = dir.join("runs");
        let script = format!(
            r#"cat > /dev/null; echo x >> "$1"; if [ "$(wc -l < "$1")" -le {failures} ]; then echo 'not json'; else echo '{{"verdict": "accept"}}'; fi"#
        );
        CommandOracle::new(
            "sh".to_string(),
            vec![
                "-c".to_string(),
                script,
                "sh".to_string(),
                counter.display().to_string(),
            ],
            "gpt-4o-mini".to_string(),
        )
        .with_retries(retries)
    }

    #[cfg(unix)]
    #[test]
    fn retries_malformed_output() {
        let dir = tempfile::tempdir().unwrap();
        let oracle = flaky_judge(dir.path(), 1, DEFAULT_RETRIES);

        let judgment = oracle
            .assess("Increase revenue", SemanticRule::QuantifiableBenefit)
            .unwrap();

        assert_eq!(
            judgment,
            Judgment::Accept {
                value: "Increase revenue".to_string()
            }
        );
        let runs = std::fs::read_to_string(dir.path().join("runs")).unwrap();
        assert_eq!(runs.lines().count(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn gives_up_after_retries() {
        let dir = tempfile::tempdir().unwrap();
        let oracle = flaky_judge(dir.path(), 3, 2);

        let error = oracle
            .assess("Increase revenue", SemanticRule::QuantifiableBenefit)
            .unwrap_err();

        assert!(matches!(error, OracleError::Malformed(_)));
        let runs = std::fs::read_to_string(dir.path().join("runs")).unwrap();
        assert_eq!(runs.lines().count(), 3);
    }

    #[cfg(unix)]
    #[test]
    fn retries_non_zero_exit() {
        let dir = tempfile::tempdir().unwrap();
        let counter = dir.path().join("runs");
        let oracle = CommandOracle::new(
            "sh".to_string(),
            vec![
                "-c".to_string(),
                r#"cat > /dev/null; if [ -f "$1" ]; then echo '{"verdict": "reject", "reason": "No numbers"}'; else touch "$1"; exit 1; fi"#.to_string(),
                "sh".to_string(),
                counter.display().to_string(),
            ],
            "gpt-4o-mini".to_string(),
        );

        let judgment = oracle
            .assess("Increase revenue", SemanticRule::QuantifiableBenefit)
            .unwrap();
        assert!(matches!(judgment, Judgment::Reject { .. }));
    }

    #[test]
    fn missing_program_is_not_retried() {
        let oracle = CommandOracle::new(
            "definitely-not-a-real-judge-program".to_string(),
            Vec::new(),
            "gpt-4o-mini".to_string(),
        )
        .with_retries(100);
        assert!(matches!(
            oracle.assess("Increase revenue", SemanticRule::QuantifiableBenefit),
            Err(OracleError::Unavailable(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn runs_external_judge() {
        let oracle = CommandOracle::new(
            "sh".to_string(),
            vec![
                "-c".to_string(),
                r#"cat > /dev/null; echo '{"verdict": "reject", "reason": "No numbers"}'"#
                    .to_string(),
            ],
            "gpt-4o-mini".to_string(),
        );
        let judgment = oracle
            .assess("Increase revenue", SemanticRule::QuantifiableBenefit)
            .unwrap();
        assert_eq!(
            judgment,
            Judgment::Reject {
                reason: "No numbers".to_string()
            }
        );
    }
}
