use std::{fmt, sync::LazyLock};

use chrono::NaiveDate;
use non_empty_string::NonEmptyString;
use nonempty::NonEmpty;
use regex::Regex;

use crate::domain::{
    Approval, BuildKind, FieldId, FieldKind, FieldValue, Judgment, Oracle, OracleError,
    SemanticRule, record::DATE_FORMAT,
};

static DATE_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}-\d{2}-\d{4}$").expect("valid date pattern"));

static BULLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[-*•]|\d+[.)])\s+").expect("valid bullet pattern"));

static APPROVAL_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:^|[\s,;"'])(date[\s_-]*approved|date|name|role)["']?\s*[:=]"#)
        .expect("valid approval key pattern")
});

/// Answers that name no application in particular.
const PLACEHOLDER_APPLICATIONS: &[&str] = &[
    "all", "any", "none", "n/a", "na", "tbd", "tbc", "various", "everything", "unknown",
    "several", "many", "some",
];

/// What is wrong with an approval answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructureProblem {
    /// These pieces were absent or blank.
    Missing(Vec<&'static str>),
    /// The approval date is not a `DD-MM-YYYY` calendar date.
    BadDate(String),
}

impl fmt::Display for StructureProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(parts) => write!(
                f,
                "The approval is missing its {}. Please give the name, role and approval date.",
                parts.join(", ")
            ),
            Self::BadDate(date) => write!(
                f,
                "The approval date '{date}' must be a real calendar date written as DD-MM-YYYY."
            ),
        }
    }
}

/// Why an answer was not accepted.
///
/// The message of each variant is written for the person answering.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum RejectionReason {
    /// Nothing was entered.
    #[error("The answer was empty.")]
    Empty,

    /// Anything other than a literal yes or no.
    #[error("Please answer with 'yes' or 'no'.")]
    AmbiguousBoolean,

    /// Neither `new build` nor `enhancement`.
    #[error("Please answer with either 'new build' or 'enhancement'.")]
    InvalidEnum,

    /// Not a `DD-MM-YYYY` calendar date.
    #[error("'{0}' is not a real calendar date written as DD-MM-YYYY.")]
    BadDateFormat(String),

    /// A list answer made only of separators.
    #[error(
        "No items were found. Put each item on its own line, or separate the items with ';'."
    )]
    NoItems,

    /// A fixed-size list with the wrong number of items.
    #[error("Exactly {expected} items are needed, but {found} were given.")]
    WrongCount {
        /// How many items the field takes.
        expected: usize,
        /// How many were given.
        found: usize,
    },

    /// An approval without all of its parts.
    #[error("{0}")]
    IncompleteStructure(StructureProblem),

    /// A placeholder where a specific name is needed.
    #[error("'{0}' is not a specific application name. Please list each application by name.")]
    NotSpecific(String),

    /// The semantic judge found the answer lacking.
    #[error("{0}")]
    Insufficient(String),
}

/// An answer for `field` that was not accepted.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("{reason}")]
pub struct Rejection {
    /// The field the answer was for.
    pub field: FieldId,
    /// Why it was not accepted.
    pub reason: RejectionReason,
}

/// Errors from [`validate`].
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    /// The answer does not satisfy the field's rule.
    #[error(transparent)]
    Rejected(#[from] RejectionReason),

    /// No verdict could be obtained for a semantic rule.
    #[error(transparent)]
    Oracle(#[from] OracleError),
}

/// Validates a raw answer for `field`, returning its normalized value.
///
/// Structural rules are checked locally; free-text rules are then put to the
/// `oracle`. For a deterministic oracle the result depends only on the
/// arguments.
///
/// # Errors
///
/// Returns [`ValidationError::Rejected`] when the answer is not acceptable,
/// or [`ValidationError::Oracle`] when a verdict could not be obtained.
pub fn validate<O: Oracle + ?Sized>(
    field: FieldId,
    raw: &str,
    oracle: &O,
) -> Result<FieldValue, ValidationError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(RejectionReason::Empty.into());
    }

    let value = match field.kind() {
        FieldKind::Flag => FieldValue::Flag(parse_flag(text)?),
        FieldKind::BuildKind => FieldValue::BuildKind(parse_build_kind(text)?),
        FieldKind::Date => FieldValue::Date(parse_date(text)?),
        FieldKind::Approval => FieldValue::Approval(parse_approval(text)?),
        FieldKind::Applications => FieldValue::List(parse_applications(text)?),
        FieldKind::Text(rule) => FieldValue::Text(judge(oracle, text, rule)?),
        FieldKind::Metrics => {
            let items = split_items(text);
            if items.is_empty() {
                return Err(RejectionReason::NoItems.into());
            }
            let [first, second, third]: [String; 3] =
                items.try_into().map_err(|items: Vec<String>| RejectionReason::WrongCount {
                    expected: 3,
                    found: items.len(),
                })?;
            FieldValue::Metrics([
                judge(oracle, &first, SemanticRule::MeasurableMetric)?.to_string(),
                judge(oracle, &second, SemanticRule::MeasurableMetric)?.to_string(),
                judge(oracle, &third, SemanticRule::MeasurableMetric)?.to_string(),
            ])
        }
        FieldKind::TestCases => {
            let cases = split_statements(text);
            if cases.is_empty() {
                return Err(RejectionReason::NoItems.into());
            }
            let mut judged = Vec::with_capacity(cases.len());
            for case in &cases {
                judged.push(judge(oracle, case, SemanticRule::InputAndExpectedOutput)?.to_string());
            }
            FieldValue::List(NonEmpty::from_vec(judged).ok_or(RejectionReason::NoItems)?)
        }
    };

    Ok(value)
}

/// Accepts every text unchanged.
struct Unjudged;

impl Oracle for Unjudged {
    fn assess(&self, text: &str, _rule: SemanticRule) -> Result<Judgment, OracleError> {
        Ok(Judgment::Accept {
            value: text.to_string(),
        })
    }
}

/// Checks only the local, structural rules for `field`.
///
/// Free-text answers pass as long as they are not blank. This is a pure
/// function of its arguments.
///
/// # Errors
///
/// Returns the [`RejectionReason`] for an answer with the wrong shape.
pub fn validate_structure(field: FieldId, raw: &str) -> Result<(), RejectionReason> {
    match validate(field, raw, &Unjudged) {
        Ok(_) | Err(ValidationError::Oracle(_)) => Ok(()),
        Err(ValidationError::Rejected(reason)) => Err(reason),
    }
}

fn judge<O: Oracle + ?Sized>(
    oracle: &O,
    text: &str,
    rule: SemanticRule,
) -> Result<NonEmptyString, ValidationError> {
    match oracle.assess(text, rule)? {
        Judgment::Accept { value } => {
            let value = value.trim();
            let value = if value.is_empty() { text } else { value };
            Ok(NonEmptyString::new(value.to_string()).map_err(|_| RejectionReason::Empty)?)
        }
        Judgment::Reject { reason } => Err(RejectionReason::Insufficient(reason).into()),
    }
}

/// Parses a literal `yes` or `no`, ignoring case and surrounding whitespace.
///
/// # Errors
///
/// Returns [`RejectionReason::AmbiguousBoolean`] for anything else.
pub fn parse_flag(text: &str) -> Result<bool, RejectionReason> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("yes") {
        Ok(true)
    } else if text.eq_ignore_ascii_case("no") {
        Ok(false)
    } else {
        Err(RejectionReason::AmbiguousBoolean)
    }
}

/// Parses `new build` or `enhancement`, ignoring case.
///
/// # Errors
///
/// Returns [`RejectionReason::InvalidEnum`] for anything else.
pub fn parse_build_kind(text: &str) -> Result<BuildKind, RejectionReason> {
    let words: Vec<String> = text.split_whitespace().map(str::to_lowercase).collect();
    match words.as_slice() {
        [new, build] if new == "new" && build == "build" => Ok(BuildKind::NewBuild),
        [enhancement] if enhancement == "enhancement" => Ok(BuildKind::Enhancement),
        _ => Err(RejectionReason::InvalidEnum),
    }
}

/// Parses a `DD-MM-YYYY` date that exists on the calendar.
///
/// # Errors
///
/// Returns [`RejectionReason::BadDateFormat`] if the text has another shape
/// or names an impossible date such as `31-02-2025`.
pub fn parse_date(text: &str) -> Result<NaiveDate, RejectionReason> {
    let text = text.trim();
    if !DATE_SHAPE.is_match(text) {
        return Err(RejectionReason::BadDateFormat(text.to_string()));
    }
    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .map_err(|_| RejectionReason::BadDateFormat(text.to_string()))
}

/// Parses an approval given either as a JSON object or as `key: value`
/// pairs, e.g. `Name: Jane; Role: Director; Date Approved: 01-05-2025`.
///
/// # Errors
///
/// Returns [`RejectionReason::IncompleteStructure`] if the name, role or
/// approval date is missing or blank, or the date is invalid.
pub fn parse_approval(text: &str) -> Result<Approval, RejectionReason> {
    let text = text.trim();
    let pairs = match text.strip_prefix('{') {
        Some(inner) => json_pairs(text).unwrap_or_else(|| {
            labelled_pairs(inner.strip_suffix('}').unwrap_or(inner))
        }),
        None => labelled_pairs(text),
    };

    let mut name = None;
    let mut role = None;
    let mut date = None;
    for (key, value) in pairs {
        let slot = match key.as_str() {
            "name" => &mut name,
            "role" => &mut role,
            "date" | "dateapproved" => &mut date,
            _ => continue,
        };
        if !value.is_empty() {
            *slot = Some(value);
        }
    }

    let missing: Vec<&'static str> = [
        ("name", name.is_none()),
        ("role", role.is_none()),
        ("date_approved", date.is_none()),
    ]
    .into_iter()
    .filter_map(|(part, absent)| absent.then_some(part))
    .collect();

    match (name, role, date) {
        (Some(name), Some(role), Some(date)) => {
            let date_approved = parse_date(&date).map_err(|_| {
                RejectionReason::IncompleteStructure(StructureProblem::BadDate(date.clone()))
            })?;
            let name = NonEmptyString::new(name).map_err(|_| {
                RejectionReason::IncompleteStructure(StructureProblem::Missing(vec!["name"]))
            })?;
            let role = NonEmptyString::new(role).map_err(|_| {
                RejectionReason::IncompleteStructure(StructureProblem::Missing(vec!["role"]))
            })?;
            Ok(Approval::new(name, role, date_approved))
        }
        _ => Err(RejectionReason::IncompleteStructure(
            StructureProblem::Missing(missing),
        )),
    }
}

fn approval_key(key: &str) -> String {
    key.chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn json_pairs(text: &str) -> Option<Vec<(String, String)>> {
    let Ok(serde_json::Value::Object(map)) = serde_json::from_str(text) else {
        tracing::debug!("approval is not a JSON object, reading it as labelled pairs");
        return None;
    };
    let pairs = map
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                serde_json::Value::String(s) => s.trim().to_string(),
                serde_json::Value::Null => String::new(),
                other => other.to_string(),
            };
            (approval_key(&key), value)
        })
        .collect();
    Some(pairs)
}

fn labelled_pairs(text: &str) -> Vec<(String, String)> {
    let keys: Vec<_> = APPROVAL_KEY.captures_iter(text).collect();
    keys.iter()
        .enumerate()
        .filter_map(|(index, captures)| {
            let key = captures.get(1)?;
            let start = captures.get(0)?.end();
            let end = keys
                .get(index + 1)
                .and_then(|next| next.get(0))
                .map_or(text.len(), |next| next.start());
            let value = text[start..end]
                .trim()
                .trim_end_matches([',', ';'])
                .trim()
                .trim_matches(['"', '\''])
                .trim();
            Some((approval_key(key.as_str()), value.to_string()))
        })
        .collect()
}

/// Splits a list answer into items.
///
/// Items are separated by newlines if the answer spans several lines,
/// otherwise by `;`, otherwise by `,`. Leading bullets and numbering are
/// removed and blank items dropped.
#[must_use]
pub fn split_items(text: &str) -> Vec<String> {
    let separator = if text.contains('\n') {
        '\n'
    } else if text.contains(';') {
        ';'
    } else {
        ','
    };
    split_on(text, separator)
}

/// Like [`split_items`], but never splits on commas.
///
/// Used where a single item is a sentence that may contain commas.
#[must_use]
pub fn split_statements(text: &str) -> Vec<String> {
    let separator = if text.contains('\n') { '\n' } else { ';' };
    split_on(text, separator)
}

fn split_on(text: &str, separator: char) -> Vec<String> {
    text.split(separator)
        .map(|item| BULLET.replace(item.trim(), "").trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

fn parse_applications(text: &str) -> Result<NonEmpty<String>, RejectionReason> {
    let mut applications: Vec<String> = Vec::new();
    for item in split_items(text) {
        if PLACEHOLDER_APPLICATIONS.contains(&item.to_lowercase().as_str()) {
            return Err(RejectionReason::NotSpecific(item));
        }
        if !applications.iter().any(|seen| seen.eq_ignore_ascii_case(&item)) {
            applications.push(item);
        }
    }
    NonEmpty::from_vec(applications).ok_or(RejectionReason::NoItems)
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::domain::oracle::HeuristicOracle;

    /// Accepts everything unchanged.
    struct Lenient;

    impl Oracle for Lenient {
        fn assess(&self, text: &str, _rule: SemanticRule) -> Result<Judgment, OracleError> {
            Ok(Judgment::Accept {
                value: text.to_string(),
            })
        }
    }

    /// Never reachable.
    struct Offline;

    impl Oracle for Offline {
        fn assess(&self, _text: &str, _rule: SemanticRule) -> Result<Judgment, OracleError> {
            Err(OracleError::Unavailable("offline".to_string()))
        }
    }

    fn rejection(field: FieldId, raw: &str) -> RejectionReason {
        match validate(field, raw, &Lenient) {
            Err(ValidationError::Rejected(reason)) => reason,
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test_case("Yes", true; "capitalised")]
    #[test_case("yes", true; "lowercase")]
    #[test_case(" YES ", true; "padded uppercase")]
    #[test_case("no", false; "no")]
    #[test_case("No\n", false; "trailing newline")]
    fn booleans_accept_literals(raw: &str, expected: bool) {
        assert_eq!(
            validate(FieldId::RequiresBeBuild, raw, &Lenient),
            Ok(FieldValue::Flag(expected))
        );
    }

    #[test_case("y"; "initial")]
    #[test_case("true"; "true")]
    #[test_case("1"; "digit")]
    #[test_case("maybe"; "maybe")]
    #[test_case("yes please"; "extra words")]
    fn booleans_reject_anything_else(raw: &str) {
        assert_eq!(
            rejection(FieldId::RequiresMobile, raw),
            RejectionReason::AmbiguousBoolean
        );
    }

    #[test_case("new build", BuildKind::NewBuild; "new build")]
    #[test_case("New  Build", BuildKind::NewBuild; "inner whitespace")]
    #[test_case("ENHANCEMENT", BuildKind::Enhancement; "uppercase")]
    fn build_kind_accepts(raw: &str, expected: BuildKind) {
        assert_eq!(parse_build_kind(raw), Ok(expected));
    }

    #[test_case("new"; "partial")]
    #[test_case("new_build"; "snake case")]
    #[test_case("an enhancement"; "article")]
    fn build_kind_rejects(raw: &str) {
        assert_eq!(rejection(FieldId::IsNewBuild, raw), RejectionReason::InvalidEnum);
    }

    #[test]
    fn date_parses_exact_format() {
        assert_eq!(
            validate(FieldId::TargetDate, "01-05-2025", &Lenient),
            Ok(FieldValue::Date(NaiveDate::from_ymd_opt(2025, 5, 1).unwrap()))
        );
    }

    #[test_case("31-02-2025"; "impossible day")]
    #[test_case("29-02-2025"; "not a leap year")]
    #[test_case("1-5-2025"; "unpadded")]
    #[test_case("2025-05-01"; "iso order")]
    #[test_case("01/05/2025"; "slashes")]
    #[test_case("next friday"; "prose")]
    fn date_rejects(raw: &str) {
        assert_eq!(
            rejection(FieldId::TargetDate, raw),
            RejectionReason::BadDateFormat(raw.to_string())
        );
    }

    #[test]
    fn leap_day_is_valid() {
        assert!(parse_date("29-02-2024").is_ok());
    }

    #[test_case("Conversion rate; Average order value; Checkout time"; "semicolons")]
    #[test_case("Conversion rate\nAverage order value\nCheckout time"; "lines")]
    #[test_case("1. Conversion rate\n2. Average order value\n3. Checkout time"; "numbered")]
    #[test_case("Conversion rate, Average order value, Checkout time"; "commas")]
    fn metrics_accept_three(raw: &str) {
        assert_eq!(
            validate(FieldId::SuccessMetrics, raw, &Lenient),
            Ok(FieldValue::Metrics([
                "Conversion rate".to_string(),
                "Average order value".to_string(),
                "Checkout time".to_string(),
            ]))
        );
    }

    #[test_case("Conversion rate; Average order value", 2; "two")]
    #[test_case("Conversion rate; Average order value; Checkout time; NPS", 4; "four")]
    #[test_case("Conversion rate", 1; "one")]
    fn metrics_reject_wrong_count(raw: &str, found: usize) {
        assert_eq!(
            rejection(FieldId::SuccessMetrics, raw),
            RejectionReason::WrongCount { expected: 3, found }
        );
    }

    #[test]
    fn metrics_reject_whole_field_if_one_is_unmeasurable() {
        let result = validate(
            FieldId::SuccessMetrics,
            "Conversion rate; Happiness; Checkout time",
            &HeuristicOracle::default(),
        );
        assert!(matches!(
            result,
            Err(ValidationError::Rejected(RejectionReason::Insufficient(ref reason)))
                if reason.contains("Happiness")
        ));
    }

    #[test]
    fn approval_from_labelled_lines() {
        let approval =
            parse_approval("Name: Jane Smith\nRole: Design Authority\nDate Approved: 16-04-2025")
                .unwrap();
        assert_eq!(approval.name(), "Jane Smith");
        assert_eq!(approval.role(), "Design Authority");
        assert_eq!(
            approval.date_approved(),
            NaiveDate::from_ymd_opt(2025, 4, 16).unwrap()
        );
    }

    #[test]
    fn approval_from_single_line() {
        let approval =
            parse_approval("name = Jane Smith, role = Director, date_approved = 16-04-2025").unwrap();
        assert_eq!(approval.name(), "Jane Smith");
        assert_eq!(approval.role(), "Director");
    }

    #[test]
    fn approval_from_json() {
        let approval = parse_approval(
            r#"{"name": "Jane", "role": "Director", "date_approved": "16-04-2025"}"#,
        )
        .unwrap();
        assert_eq!(approval.name(), "Jane");
    }

    #[test_case("{name: Jane, role: Director, date: 01-05-2025}"; "unquoted keys")]
    #[test_case(r#"{"name": "Jane", "role": "Director", "date": "01-05-2025",}"#; "trailing comma")]
    fn approval_from_loose_json(raw: &str) {
        let approval = parse_approval(raw).unwrap();
        assert_eq!(approval.name(), "Jane");
        assert_eq!(approval.role(), "Director");
        assert_eq!(
            approval.date_approved(),
            NaiveDate::from_ymd_opt(2025, 5, 1).unwrap()
        );
    }

    #[test]
    fn approval_json_missing_date() {
        assert_eq!(
            rejection(
                FieldId::LobDesignApproval,
                r#"{"name": "Jane", "role": "Director"}"#
            ),
            RejectionReason::IncompleteStructure(StructureProblem::Missing(vec!["date_approved"]))
        );
    }

    #[test]
    fn approval_blank_role_is_missing() {
        assert_eq!(
            parse_approval("Name: Jane; Role: ; Date Approved: 16-04-2025"),
            Err(RejectionReason::IncompleteStructure(
                StructureProblem::Missing(vec!["role"])
            ))
        );
    }

    #[test]
    fn approval_invalid_date() {
        assert_eq!(
            parse_approval("Name: Jane; Role: Director; Date: 31-02-2025"),
            Err(RejectionReason::IncompleteStructure(
                StructureProblem::BadDate("31-02-2025".to_string())
            ))
        );
    }

    #[test]
    fn approval_prose_is_missing_everything() {
        assert_eq!(
            parse_approval("Jane said it was fine"),
            Err(RejectionReason::IncompleteStructure(
                StructureProblem::Missing(vec!["name", "role", "date_approved"])
            ))
        );
    }

    #[test]
    fn applications_keep_first_spelling_and_order() {
        assert_eq!(
            validate(
                FieldId::ImpactedApplications,
                "Mobile App, Payment Service, mobile app",
                &Lenient
            ),
            Ok(FieldValue::List(nonempty::nonempty![
                "Mobile App".to_string(),
                "Payment Service".to_string()
            ]))
        );
    }

    #[test_case("all"; "all")]
    #[test_case("TBD"; "tbd")]
    #[test_case("Mobile App, various"; "mixed")]
    fn applications_reject_placeholders(raw: &str) {
        assert!(matches!(
            rejection(FieldId::ImpactedApplications, raw),
            RejectionReason::NotSpecific(_)
        ));
    }

    #[test]
    fn test_cases_keep_commas() {
        assert_eq!(
            validate(
                FieldId::TestCases,
                "valid card, correct CVV -> payment succeeds; expired card -> declined",
                &Lenient
            ),
            Ok(FieldValue::List(nonempty::nonempty![
                "valid card, correct CVV -> payment succeeds".to_string(),
                "expired card -> declined".to_string()
            ]))
        );
    }

    #[test]
    fn test_cases_need_expected_output() {
        let result = validate(
            FieldId::TestCases,
            "valid card -> payment succeeds; test timeouts",
            &HeuristicOracle::default(),
        );
        assert!(matches!(
            result,
            Err(ValidationError::Rejected(RejectionReason::Insufficient(ref reason)))
                if reason.contains("test timeouts")
        ));
    }

    #[test_case(FieldId::SpecificRequirement; "text")]
    #[test_case(FieldId::TargetDate; "date")]
    #[test_case(FieldId::SuccessMetrics; "metrics")]
    fn blank_answers_are_empty(field: FieldId) {
        assert_eq!(rejection(field, "   "), RejectionReason::Empty);
    }

    #[test_case(FieldId::SuccessMetrics, "; ;"; "metrics")]
    #[test_case(FieldId::TestCases, "; ;"; "test cases")]
    #[test_case(FieldId::ImpactedApplications, ", ;"; "applications")]
    fn separators_alone_name_the_separator(field: FieldId, raw: &str) {
        let reason = rejection(field, raw);
        assert_eq!(reason, RejectionReason::NoItems);
        assert!(reason.to_string().contains("';'"));
    }

    #[test]
    fn free_text_defers_to_oracle() {
        let result = validate(
            FieldId::BusinessValue,
            "Customers will love it",
            &HeuristicOracle::default(),
        );
        assert!(matches!(
            result,
            Err(ValidationError::Rejected(RejectionReason::Insufficient(_)))
        ));
    }

    #[test]
    fn oracle_failure_is_not_a_rejection() {
        assert_eq!(
            validate(FieldId::BusinessValue, "Saves 10 hours a week", &Offline),
            Err(ValidationError::Oracle(OracleError::Unavailable(
                "offline".to_string()
            )))
        );
    }

    #[test]
    fn structure_check_ignores_semantics() {
        assert_eq!(validate_structure(FieldId::BusinessValue, "Customers will love it"), Ok(()));
        assert_eq!(
            validate_structure(FieldId::SuccessMetrics, "Conversion rate; Happiness"),
            Err(RejectionReason::WrongCount {
                expected: 3,
                found: 2
            })
        );
        assert_eq!(
            validate_structure(FieldId::TargetDate, "31-02-2025"),
            Err(RejectionReason::BadDateFormat("31-02-2025".to_string()))
        );
    }

    #[test]
    fn structural_fields_never_consult_oracle() {
        assert_eq!(
            validate(FieldId::RequiresMobile, "yes", &Offline),
            Ok(FieldValue::Flag(true))
        );
    }

    #[test]
    fn validation_is_deterministic() {
        let oracle = HeuristicOracle::default();
        for field in FieldId::ALL {
            for raw in ["yes", "Increase revenue by 5% in the app", "01-05-2025", ""] {
                assert_eq!(validate(field, raw, &oracle), validate(field, raw, &oracle));
            }
        }
    }

    #[test]
    fn rejection_displays_reason() {
        let rejection = Rejection {
            field: FieldId::RequiresBeBuild,
            reason: RejectionReason::AmbiguousBoolean,
        };
        assert_eq!(rejection.to_string(), "Please answer with 'yes' or 'no'.");
    }
}
