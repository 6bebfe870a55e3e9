use std::{collections::BTreeMap, sync::LazyLock};

use regex::Regex;
use uuid::Uuid;

use crate::domain::{
    FieldId, FieldValue, Oracle, OracleError, Rejection, RequirementRecord, ValidationError,
    validator::{self, parse_flag},
};

/// `label: answer` or `label = answer`, addressing a field by name.
static ADDRESSED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*([A-Za-z][A-Za-z0-9 _.\-]{0,60}?)\s*[:=]\s*(.*)$")
        .expect("valid addressed-answer pattern")
});

/// Where the interview stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for an answer to this field.
    AwaitingField(FieldId),
    /// Waiting for a yes/no on replacing an accepted answer.
    ConfirmingCorrection {
        /// The field whose value would change.
        field: FieldId,
    },
    /// Every field is filled. Terminal.
    Complete,
}

/// What a single answer did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The current field was filled.
    Accepted {
        /// The field filled.
        field: FieldId,
        /// Its normalized value.
        value: FieldValue,
    },
    /// Another, unfilled field was filled; the current field is still asked.
    Noted {
        /// The field filled.
        field: FieldId,
        /// Its normalized value.
        value: FieldValue,
    },
    /// The answer was not accepted; nothing changed.
    Rejected(Rejection),
    /// An accepted field was given a different answer; confirmation needed.
    CorrectionRequested {
        /// The field concerned.
        field: FieldId,
        /// The value held now.
        current: FieldValue,
        /// The value offered instead.
        proposed: FieldValue,
    },
    /// A confirmed correction replaced an accepted value.
    Corrected {
        /// The field concerned.
        field: FieldId,
        /// The value replaced.
        previous: FieldValue,
        /// The value now held.
        value: FieldValue,
    },
    /// A proposed correction was declined.
    CorrectionDeclined {
        /// The field concerned.
        field: FieldId,
    },
    /// An accepted field was given the same answer again.
    AlreadyRecorded {
        /// The field concerned.
        field: FieldId,
    },
    /// The answer could not be assessed and does not count.
    NotAssessed(OracleError),
    /// The interview had already finished.
    Finished,
}

/// The result of submitting one answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    /// The state after the answer.
    pub state: SessionState,
    /// What the answer did.
    pub outcome: Outcome,
    /// Text acknowledging the answer, for display.
    pub acknowledgement: String,
    /// The question to show next.
    pub prompt: String,
    /// Whether the interview is finished.
    pub complete: bool,
}

/// Export was attempted before every field was filled.
///
/// This is a programming error in the caller: a partial record is never
/// exported.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("the requirement record is incomplete; missing: {}", display_fields(.missing))]
pub struct SchemaViolation {
    /// Fields without a value.
    pub missing: Vec<FieldId>,
}

fn display_fields(fields: &[FieldId]) -> String {
    fields
        .iter()
        .map(|field| field.key())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Something to say before the next question.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Notice {
    Rejected(Rejection),
    NotAssessed,
}

/// One interview, from an empty record to [`SessionState::Complete`].
///
/// The driver owns the loop: it shows [`Session::next_prompt`], reads an
/// answer, and passes it to [`Session::submit_answer`]. The record is owned
/// by the session and only lent out read-only.
#[derive(Debug)]
pub struct Session<O> {
    id: Uuid,
    oracle: O,
    record: RequirementRecord,
    state: SessionState,
    pending: Option<FieldValue>,
    notice: Option<Notice>,
    attempts: BTreeMap<FieldId, usize>,
}

impl<O: Oracle> Session<O> {
    /// Starts an interview with an empty record.
    #[must_use]
    pub fn new(oracle: O) -> Self {
        let id = Uuid::new_v4();
        tracing::debug!(session = %id, "starting interview");
        Self {
            id,
            oracle,
            record: RequirementRecord::default(),
            state: SessionState::AwaitingField(FieldId::ALL[0]),
            pending: None,
            notice: None,
            attempts: BTreeMap::new(),
        }
    }

    /// Identifies this session in logs.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// The current state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// The field being asked, if any.
    #[must_use]
    pub const fn current_field(&self) -> Option<FieldId> {
        match self.state {
            SessionState::AwaitingField(field) => Some(field),
            SessionState::ConfirmingCorrection { .. } | SessionState::Complete => None,
        }
    }

    /// The record gathered so far.
    #[must_use]
    pub const fn record(&self) -> &RequirementRecord {
        &self.record
    }

    /// Whether every field is filled.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.state == SessionState::Complete && self.record.all_details_given()
    }

    /// Filled and total field counts.
    #[must_use]
    pub fn progress(&self) -> (usize, usize) {
        let total = FieldId::ALL.len();
        (total - self.record.missing().len(), total)
    }

    /// How many answers for `field` have been rejected.
    #[must_use]
    pub fn attempts(&self, field: FieldId) -> usize {
        self.attempts.get(&field).copied().unwrap_or_default()
    }

    /// The completed record.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaViolation`] if the interview is not complete.
    pub fn export(&self) -> Result<RequirementRecord, SchemaViolation> {
        if self.is_complete() {
            Ok(self.record.clone())
        } else {
            Err(SchemaViolation {
                missing: self.record.missing(),
            })
        }
    }

    /// The question to show for the current state.
    ///
    /// After a rejection the question is prefixed with the reason, so the
    /// same question is never repeated without saying why.
    #[must_use]
    pub fn next_prompt(&self) -> String {
        match self.state {
            SessionState::Complete => "All required information has been gathered.".to_string(),
            SessionState::ConfirmingCorrection { field } => {
                let current = self
                    .record
                    .get(field)
                    .map_or_else(String::new, |value| value.to_string());
                let proposed = self
                    .pending
                    .as_ref()
                    .map_or_else(String::new, ToString::to_string);
                let prefix = match &self.notice {
                    Some(Notice::Rejected(rejection)) => format!("{rejection} "),
                    _ => String::new(),
                };
                format!(
                    "{prefix}The {} is already recorded as {current}. Replace it with \
                     {proposed}? Please type 'yes' or 'no'.",
                    field.label()
                )
            }
            SessionState::AwaitingField(field) => match &self.notice {
                Some(Notice::Rejected(rejection)) if rejection.field == field => {
                    format!("{rejection} {}", field.question())
                }
                Some(Notice::NotAssessed) => format!(
                    "Sorry, I couldn't assess that answer, so it hasn't been counted. {}",
                    field.question()
                ),
                _ => field.question().to_string(),
            },
        }
    }

    /// Processes one raw answer.
    ///
    /// An answer may start with a field's name followed by `:` or `=`
    /// (e.g. `target date: 01-05-2025`) to address a field other than the
    /// one being asked. Such answers fill that field if it is empty, or
    /// propose a correction if it is already filled; either way the current
    /// question stays in focus.
    pub fn submit_answer(&mut self, raw: &str) -> Turn {
        let outcome = match self.state {
            SessionState::Complete => Outcome::Finished,
            SessionState::ConfirmingCorrection { field } => self.confirm_correction(field, raw),
            SessionState::AwaitingField(current) => self.answer(current, raw),
        };

        tracing::debug!(session = %self.id, state = ?self.state, ?outcome, "answer processed");

        Turn {
            state: self.state,
            acknowledgement: self.acknowledge(&outcome),
            prompt: self.next_prompt(),
            complete: self.is_complete(),
            outcome,
        }
    }

    fn answer(&mut self, current: FieldId, raw: &str) -> Outcome {
        let (field, value) = match self.resolve(current, raw) {
            Ok(resolved) => resolved,
            Err((field, ValidationError::Oracle(error))) => {
                tracing::warn!(session = %self.id, %field, %error, "answer not assessed");
                self.notice = Some(Notice::NotAssessed);
                return Outcome::NotAssessed(error);
            }
            Err((field, ValidationError::Rejected(reason))) => {
                let rejection = Rejection { field, reason };
                tracing::debug!(session = %self.id, %field, %rejection, "answer rejected");
                if field == current {
                    *self.attempts.entry(field).or_default() += 1;
                    self.notice = Some(Notice::Rejected(rejection.clone()));
                } else {
                    self.notice = None;
                }
                return Outcome::Rejected(rejection);
            }
        };

        self.notice = None;

        if let Some(existing) = self.record.get(field) {
            if existing == value {
                return Outcome::AlreadyRecorded { field };
            }
            self.pending = Some(value.clone());
            self.state = SessionState::ConfirmingCorrection { field };
            return Outcome::CorrectionRequested {
                field,
                current: existing,
                proposed: value,
            };
        }

        self.record.set(field, value.clone());
        tracing::info!(session = %self.id, %field, "field accepted");

        if field == current {
            self.advance();
            Outcome::Accepted { field, value }
        } else {
            Outcome::Noted { field, value }
        }
    }

    /// Validates `raw` for the field it addresses.
    ///
    /// An answer that only looks addressed, such as `Backend: add a rate
    /// limiter to the payments API`, is tried as a whole against `current`
    /// when the addressed field rejects it. The addressed field's rejection
    /// is reported only if `current` rejects the answer too.
    fn resolve(
        &self,
        current: FieldId,
        raw: &str,
    ) -> Result<(FieldId, FieldValue), (FieldId, ValidationError)> {
        let (field, text) = match addressed_field(raw) {
            Some((field, text)) if field == current => return self.check(current, text),
            Some(addressed) => addressed,
            None => return self.check(current, raw),
        };

        match self.check(field, text) {
            Ok(resolved) => Ok(resolved),
            Err(addressed) => match self.check(current, raw) {
                Ok(resolved) => {
                    tracing::debug!(
                        session = %self.id,
                        addressed = %field,
                        "prefix was not a field answer, taking it for the current field"
                    );
                    Ok(resolved)
                }
                Err(unassessed @ (_, ValidationError::Oracle(_))) => Err(unassessed),
                Err(_) => Err(addressed),
            },
        }
    }

    fn check(
        &self,
        field: FieldId,
        text: &str,
    ) -> Result<(FieldId, FieldValue), (FieldId, ValidationError)> {
        validator::validate(field, text, &self.oracle)
            .map(|value| (field, value))
            .map_err(|error| (field, error))
    }

    fn confirm_correction(&mut self, field: FieldId, raw: &str) -> Outcome {
        match parse_flag(raw) {
            Ok(true) => {
                self.notice = None;
                let outcome = match self.pending.take() {
                    Some(value) => {
                        let previous = self.record.set(field, value.clone());
                        tracing::info!(session = %self.id, %field, "field corrected");
                        match previous {
                            Some(previous) => Outcome::Corrected {
                                field,
                                previous,
                                value,
                            },
                            None => Outcome::Accepted { field, value },
                        }
                    }
                    None => Outcome::CorrectionDeclined { field },
                };
                self.advance();
                outcome
            }
            Ok(false) => {
                self.notice = None;
                self.pending = None;
                self.advance();
                Outcome::CorrectionDeclined { field }
            }
            Err(reason) => {
                let rejection = Rejection { field, reason };
                self.notice = Some(Notice::Rejected(rejection.clone()));
                Outcome::Rejected(rejection)
            }
        }
    }

    /// Moves to the first unfilled field, or completes.
    fn advance(&mut self) {
        self.state = self
            .record
            .missing()
            .first()
            .map_or(SessionState::Complete, |&field| {
                SessionState::AwaitingField(field)
            });
        if self.state == SessionState::Complete {
            tracing::info!(session = %self.id, "all details gathered");
        }
    }

    fn acknowledge(&self, outcome: &Outcome) -> String {
        let resume = || {
            self.current_field().map_or_else(String::new, |field| {
                format!(" Let's get back to the {}.", field.label())
            })
        };

        match outcome {
            Outcome::Accepted { field, value } => {
                format!("Recorded the {}: {value}.", field.label())
            }
            Outcome::Noted { field, value } => {
                format!("Noted the {}: {value}.{}", field.label(), resume())
            }
            Outcome::Rejected(rejection) if Some(rejection.field) == self.current_field() => {
                format!("That answer for the {} wasn't accepted.", rejection.field.label())
            }
            Outcome::Rejected(rejection) => match self.state {
                SessionState::ConfirmingCorrection { .. } => {
                    "That wasn't a yes or no, so nothing has changed yet.".to_string()
                }
                _ => format!(
                    "That answer for the {} wasn't accepted: {rejection}{}",
                    rejection.field.label(),
                    resume()
                ),
            },
            Outcome::CorrectionRequested { field, .. } => {
                format!("You've already answered the {}.", field.label())
            }
            Outcome::Corrected {
                field,
                previous,
                value,
            } => format!(
                "Corrected the {}: {previous} is now {value}.{}",
                field.label(),
                resume()
            ),
            Outcome::CorrectionDeclined { field } => {
                format!("Kept the existing {}.{}", field.label(), resume())
            }
            Outcome::AlreadyRecorded { field } => {
                format!(
                    "The {} is already recorded with that answer.{}",
                    field.label(),
                    resume()
                )
            }
            Outcome::NotAssessed(_) => {
                "I couldn't assess that answer right now, so it hasn't been counted.".to_string()
            }
            Outcome::Finished => {
                "All details have already been gathered. Start a new session to change them."
                    .to_string()
            }
        }
    }
}

/// Splits `label: answer` into the addressed field and the answer.
fn addressed_field(raw: &str) -> Option<(FieldId, &str)> {
    let captures = ADDRESSED.captures(raw)?;
    let field = FieldId::from_label(captures.get(1)?.as_str())?;
    Some((field, captures.get(2)?.as_str()))
}
