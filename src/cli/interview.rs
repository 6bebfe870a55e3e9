use std::{
    fs::File,
    io::{self, BufRead, BufReader, Write},
    path::PathBuf,
};

use anyhow::Context;
use clap::Parser;
use elicit::{
    Config, Oracle, RequirementRecord, Session,
    domain::Outcome,
};
use tracing::instrument;

use super::{summary, terminal::Colorize};

#[derive(Debug, Default, Parser)]
#[command(about = "Interview the user until every requirement field is filled")]
pub struct Interview {
    /// Read answers from a file, one per line, instead of the terminal
    #[arg(long, value_name = "FILE")]
    script: Option<PathBuf>,

    /// Output format for the completed record
    #[arg(long, value_name = "FORMAT", default_value = "summary")]
    format: OutputFormat,

    /// Write the completed record to a file instead of stdout
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Summary,
    Json,
    Yaml,
}

/// Supplies the user's answers.
trait AnswerSource {
    /// The next answer, or `None` when there are no more.
    fn next_answer(&mut self) -> anyhow::Result<Option<String>>;

    /// Whether answers should be echoed after the prompt.
    fn echo(&self) -> bool {
        false
    }
}

/// Reads answers interactively.
struct Prompted;

impl AnswerSource for Prompted {
    fn next_answer(&mut self) -> anyhow::Result<Option<String>> {
        let answer = dialoguer::Input::<String>::new()
            .with_prompt(">")
            .allow_empty(true)
            .interact_text()?;
        Ok(Some(answer))
    }
}

/// Replays answers from a reader, one per line.
struct Scripted<R> {
    lines: io::Lines<R>,
}

impl<R: BufRead> Scripted<R> {
    fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }
}

impl<R: BufRead> AnswerSource for Scripted<R> {
    fn next_answer(&mut self) -> anyhow::Result<Option<String>> {
        Ok(self.lines.next().transpose()?)
    }

    fn echo(&self) -> bool {
        true
    }
}

/// How an interview ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ending {
    Complete,
    Quit,
    OutOfAnswers,
}

impl Interview {
    #[instrument(level = "debug", skip(self, config))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let oracle = config.build_oracle().map_err(|e| anyhow::anyhow!("{e}"))?;
        let mut session = Session::new(oracle);

        let stdout = io::stdout();
        let mut out = stdout.lock();

        let ending = match &self.script {
            Some(path) => {
                let file = File::open(path)
                    .with_context(|| format!("failed to open script {}", path.display()))?;
                drive(&mut session, &mut Scripted::new(BufReader::new(file)), config, &mut out)?
            }
            None => drive(&mut session, &mut Prompted, config, &mut out)?,
        };

        match ending {
            Ending::Complete => {
                let record = session.export()?;
                self.deliver(&record, &mut out)
            }
            Ending::Quit => {
                let (filled, total) = session.progress();
                writeln!(
                    out,
                    "{}",
                    format!("Interview ended early with {filled} of {total} fields filled.")
                        .warning()
                )?;
                Ok(())
            }
            Ending::OutOfAnswers => {
                let missing = session.export().err().map(|e| e.to_string()).unwrap_or_default();
                anyhow::bail!("the script ran out of answers: {missing}")
            }
        }
    }

    fn deliver(&self, record: &RequirementRecord, out: &mut impl Write) -> anyhow::Result<()> {
        let rendered = render(record, self.format)?;
        match &self.output {
            Some(path) => {
                std::fs::write(path, rendered)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                writeln!(
                    out,
                    "{}",
                    format!("Requirement written to {}", path.display()).success()
                )?;
            }
            None => write!(out, "{rendered}")?,
        }
        Ok(())
    }
}

fn render(record: &RequirementRecord, format: OutputFormat) -> anyhow::Result<String> {
    Ok(match format {
        OutputFormat::Summary => summary::render(record),
        OutputFormat::Json => serde_json::to_string_pretty(record)? + "\n",
        OutputFormat::Yaml => serde_yaml::to_string(record)?,
    })
}

/// Runs the question loop until the session completes or answers run out.
fn drive<O: Oracle>(
    session: &mut Session<O>,
    answers: &mut impl AnswerSource,
    config: &Config,
    out: &mut impl Write,
) -> anyhow::Result<Ending> {
    while !session.is_complete() {
        let (filled, total) = session.progress();
        writeln!(out, "{} {}", format!("[{filled}/{total}]").dim(), session.next_prompt().info())?;

        let Some(answer) = answers.next_answer()? else {
            return Ok(Ending::OutOfAnswers);
        };
        if answers.echo() {
            writeln!(out, "> {answer}")?;
        }
        if config.is_quit(&answer) {
            tracing::info!(session = %session.id(), "interview abandoned");
            return Ok(Ending::Quit);
        }

        let turn = session.submit_answer(&answer);
        let acknowledgement = match turn.outcome {
            Outcome::Accepted { .. } | Outcome::Noted { .. } | Outcome::Corrected { .. } => {
                turn.acknowledgement.success()
            }
            Outcome::Rejected(_) | Outcome::NotAssessed(_) => turn.acknowledgement.warning(),
            _ => turn.acknowledgement.dim(),
        };
        writeln!(out, "{acknowledgement}")?;
    }

    writeln!(out, "{}", session.next_prompt().success())?;
    Ok(Ending::Complete)
}
