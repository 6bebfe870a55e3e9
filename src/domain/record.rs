use std::fmt;

use chrono::NaiveDate;
use non_empty_string::NonEmptyString;
use nonempty::NonEmpty;
use serde::{Serialize, Serializer, ser::SerializeStruct};

use crate::domain::FieldId;

/// The date format used for every date in the record.
pub const DATE_FORMAT: &str = "%d-%m-%Y";

/// Whether the work is new or extends an existing capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildKind {
    /// A capability that does not exist yet.
    NewBuild,
    /// An augmentation of an existing capability.
    Enhancement,
}

impl fmt::Display for BuildKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NewBuild => f.write_str("new build"),
            Self::Enhancement => f.write_str("enhancement"),
        }
    }
}

/// Development-specific details.
///
/// Only ever constructed once all four answers have been validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DevelopmentDetails {
    /// New build or enhancement.
    #[serde(rename = "is_new_build")]
    pub build_kind: BuildKind,
    /// Whether a backend build is required.
    pub requires_be_build: bool,
    /// Whether mobile is a key capability.
    pub requires_mobile: bool,
    /// Whether shared services are required.
    pub requires_shared_services: bool,
}

/// Answers to the development questions collected so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct DevelopmentDraft {
    build_kind: Option<BuildKind>,
    requires_be_build: Option<bool>,
    requires_mobile: Option<bool>,
    requires_shared_services: Option<bool>,
}

impl DevelopmentDraft {
    const fn complete(self) -> Option<DevelopmentDetails> {
        match (
            self.build_kind,
            self.requires_be_build,
            self.requires_mobile,
            self.requires_shared_services,
        ) {
            (
                Some(build_kind),
                Some(requires_be_build),
                Some(requires_mobile),
                Some(requires_shared_services),
            ) => Some(DevelopmentDetails {
                build_kind,
                requires_be_build,
                requires_mobile,
                requires_shared_services,
            }),
            _ => None,
        }
    }
}

/// A sign-off recorded against the requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Approval {
    name: NonEmptyString,
    role: NonEmptyString,
    date_approved: NaiveDate,
}

impl Approval {
    /// Creates an approval from already-validated parts.
    #[must_use]
    pub const fn new(name: NonEmptyString, role: NonEmptyString, date_approved: NaiveDate) -> Self {
        Self {
            name,
            role,
            date_approved,
        }
    }

    /// Who approved.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// The approver's role.
    #[must_use]
    pub fn role(&self) -> &str {
        self.role.as_str()
    }

    /// When the approval was given.
    #[must_use]
    pub const fn date_approved(&self) -> NaiveDate {
        self.date_approved
    }
}

impl fmt::Display for Approval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}), approved {}",
            self.name,
            self.role,
            self.date_approved.format(DATE_FORMAT)
        )
    }
}

impl Serialize for Approval {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Approval", 3)?;
        state.serialize_field("name", self.name())?;
        state.serialize_field("role", self.role())?;
        state.serialize_field(
            "date_approved",
            &self.date_approved.format(DATE_FORMAT).to_string(),
        )?;
        state.end()
    }
}

/// A validated, normalized answer for one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Free text.
    Text(NonEmptyString),
    /// New build or enhancement.
    BuildKind(BuildKind),
    /// A yes/no answer.
    Flag(bool),
    /// A calendar date.
    Date(NaiveDate),
    /// Exactly three metrics.
    Metrics([String; 3]),
    /// A sign-off.
    Approval(Approval),
    /// Distinct items in the order first given.
    List(NonEmpty<String>),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => write!(f, "\"{text}\""),
            Self::BuildKind(kind) => write!(f, "{kind}"),
            Self::Flag(true) => f.write_str("yes"),
            Self::Flag(false) => f.write_str("no"),
            Self::Date(date) => write!(f, "{}", date.format(DATE_FORMAT)),
            Self::Metrics(metrics) => f.write_str(&metrics.join("; ")),
            Self::Approval(approval) => write!(f, "{approval}"),
            Self::List(items) => {
                let items: Vec<&str> = items.iter().map(String::as_str).collect();
                f.write_str(&items.join("; "))
            }
        }
    }
}

/// The business requirement being gathered.
///
/// Fields start empty and are filled one answer at a time by a
/// [`Session`](crate::Session). Collaborators only ever see it through a
/// shared reference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequirementRecord {
    specific_requirement: Option<NonEmptyString>,
    development: DevelopmentDraft,
    development_details: Option<DevelopmentDetails>,
    business_value: Option<NonEmptyString>,
    success_definition: Option<NonEmptyString>,
    success_metrics: Option<[String; 3]>,
    target_date: Option<NaiveDate>,
    date_implications: Option<NonEmptyString>,
    lob_design_approval: Option<Approval>,
    lob_senior_approval: Option<Approval>,
    impacted_applications: Option<NonEmpty<String>>,
    test_cases: Option<NonEmpty<String>>,
}

impl RequirementRecord {
    /// The specific requirement, if given.
    #[must_use]
    pub fn specific_requirement(&self) -> Option<&str> {
        self.specific_requirement.as_ref().map(NonEmptyString::as_str)
    }

    /// Development details, once all four answers are known.
    #[must_use]
    pub const fn development_details(&self) -> Option<&DevelopmentDetails> {
        self.development_details.as_ref()
    }

    /// The business value, if given.
    #[must_use]
    pub fn business_value(&self) -> Option<&str> {
        self.business_value.as_ref().map(NonEmptyString::as_str)
    }

    /// The definition of success, if given.
    #[must_use]
    pub fn success_definition(&self) -> Option<&str> {
        self.success_definition.as_ref().map(NonEmptyString::as_str)
    }

    /// The three success metrics, if given.
    #[must_use]
    pub const fn success_metrics(&self) -> Option<&[String; 3]> {
        self.success_metrics.as_ref()
    }

    /// The go-live date, if given.
    #[must_use]
    pub const fn target_date(&self) -> Option<NaiveDate> {
        self.target_date
    }

    /// Implications of missing the target date, if given.
    #[must_use]
    pub fn date_implications(&self) -> Option<&str> {
        self.date_implications.as_ref().map(NonEmptyString::as_str)
    }

    /// The design authority approval, if given.
    #[must_use]
    pub const fn lob_design_approval(&self) -> Option<&Approval> {
        self.lob_design_approval.as_ref()
    }

    /// The senior approval, if given.
    #[must_use]
    pub const fn lob_senior_approval(&self) -> Option<&Approval> {
        self.lob_senior_approval.as_ref()
    }

    /// Impacted applications, if given.
    #[must_use]
    pub const fn impacted_applications(&self) -> Option<&NonEmpty<String>> {
        self.impacted_applications.as_ref()
    }

    /// Test cases, if given.
    #[must_use]
    pub const fn test_cases(&self) -> Option<&NonEmpty<String>> {
        self.test_cases.as_ref()
    }

    /// Whether every field holds a validated value.
    ///
    /// This is always derived, never stored.
    #[must_use]
    pub fn all_details_given(&self) -> bool {
        FieldId::ALL.into_iter().all(|field| self.is_filled(field))
    }

    /// Fields still without a value, in interview order.
    #[must_use]
    pub fn missing(&self) -> Vec<FieldId> {
        FieldId::ALL
            .into_iter()
            .filter(|&field| !self.is_filled(field))
            .collect()
    }

    /// Whether `field` holds a validated value.
    #[must_use]
    pub fn is_filled(&self, field: FieldId) -> bool {
        self.get(field).is_some()
    }

    /// The value currently held for `field`.
    #[must_use]
    pub fn get(&self, field: FieldId) -> Option<FieldValue> {
        match field {
            FieldId::SpecificRequirement => self.specific_requirement.clone().map(FieldValue::Text),
            FieldId::IsNewBuild => self.development.build_kind.map(FieldValue::BuildKind),
            FieldId::RequiresBeBuild => self.development.requires_be_build.map(FieldValue::Flag),
            FieldId::RequiresMobile => self.development.requires_mobile.map(FieldValue::Flag),
            FieldId::RequiresSharedServices => {
                self.development.requires_shared_services.map(FieldValue::Flag)
            }
            FieldId::BusinessValue => self.business_value.clone().map(FieldValue::Text),
            FieldId::SuccessDefinition => self.success_definition.clone().map(FieldValue::Text),
            FieldId::SuccessMetrics => self.success_metrics.clone().map(FieldValue::Metrics),
            FieldId::TargetDate => self.target_date.map(FieldValue::Date),
            FieldId::DateImplications => self.date_implications.clone().map(FieldValue::Text),
            FieldId::LobDesignApproval => self.lob_design_approval.clone().map(FieldValue::Approval),
            FieldId::LobSeniorApproval => self.lob_senior_approval.clone().map(FieldValue::Approval),
            FieldId::ImpactedApplications => {
                self.impacted_applications.clone().map(FieldValue::List)
            }
            FieldId::TestCases => self.test_cases.clone().map(FieldValue::List),
        }
    }

    /// Stores `value` in `field`, returning the value it replaces.
    ///
    /// # Panics
    ///
    /// Panics if `value` is not of the kind `field` holds. Values produced by
    /// the validator for that field always are.
    pub(crate) fn set(&mut self, field: FieldId, value: FieldValue) -> Option<FieldValue> {
        let previous = self.get(field);
        match (field, value) {
            (FieldId::SpecificRequirement, FieldValue::Text(text)) => {
                self.specific_requirement = Some(text);
            }
            (FieldId::IsNewBuild, FieldValue::BuildKind(kind)) => {
                self.development.build_kind = Some(kind);
            }
            (FieldId::RequiresBeBuild, FieldValue::Flag(flag)) => {
                self.development.requires_be_build = Some(flag);
            }
            (FieldId::RequiresMobile, FieldValue::Flag(flag)) => {
                self.development.requires_mobile = Some(flag);
            }
            (FieldId::RequiresSharedServices, FieldValue::Flag(flag)) => {
                self.development.requires_shared_services = Some(flag);
            }
            (FieldId::BusinessValue, FieldValue::Text(text)) => self.business_value = Some(text),
            (FieldId::SuccessDefinition, FieldValue::Text(text)) => {
                self.success_definition = Some(text);
            }
            (FieldId::SuccessMetrics, FieldValue::Metrics(metrics)) => {
                self.success_metrics = Some(metrics);
            }
            (FieldId::TargetDate, FieldValue::Date(date)) => self.target_date = Some(date),
            (FieldId::DateImplications, FieldValue::Text(text)) => {
                self.date_implications = Some(text);
            }
            (FieldId::LobDesignApproval, FieldValue::Approval(approval)) => {
                self.lob_design_approval = Some(approval);
            }
            (FieldId::LobSeniorApproval, FieldValue::Approval(approval)) => {
                self.lob_senior_approval = Some(approval);
            }
            (FieldId::ImpactedApplications, FieldValue::List(items)) => {
                self.impacted_applications = Some(items);
            }
            (FieldId::TestCases, FieldValue::List(items)) => self.test_cases = Some(items),
            (field, value) => unreachable!("{value:?} is not a valid value for {field}"),
        }
        if field.is_development_detail() {
            self.development_details = self.development.complete();
        }
        previous
    }

    #[cfg(test)]
    pub(crate) fn clear(&mut self, field: FieldId) {
        match field {
            FieldId::SpecificRequirement => self.specific_requirement = None,
            FieldId::IsNewBuild => self.development.build_kind = None,
            FieldId::RequiresBeBuild => self.development.requires_be_build = None,
            FieldId::RequiresMobile => self.development.requires_mobile = None,
            FieldId::RequiresSharedServices => self.development.requires_shared_services = None,
            FieldId::BusinessValue => self.business_value = None,
            FieldId::SuccessDefinition => self.success_definition = None,
            FieldId::SuccessMetrics => self.success_metrics = None,
            FieldId::TargetDate => self.target_date = None,
            FieldId::DateImplications => self.date_implications = None,
            FieldId::LobDesignApproval => self.lob_design_approval = None,
            FieldId::LobSeniorApproval => self.lob_senior_approval = None,
            FieldId::ImpactedApplications => self.impacted_applications = None,
            FieldId::TestCases => self.test_cases = None,
        }
        self.development_details = self.development.complete();
    }
}

impl Serialize for RequirementRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let list = |items: &Option<NonEmpty<String>>| -> Option<Vec<String>> {
            items.as_ref().map(|items| items.iter().cloned().collect())
        };

        let mut state = serializer.serialize_struct("RequirementRecord", 12)?;
        state.serialize_field("specific_requirement", &self.specific_requirement())?;
        state.serialize_field("development_details", &self.development_details)?;
        state.serialize_field("business_value", &self.business_value())?;
        state.serialize_field("success_definition", &self.success_definition())?;
        state.serialize_field("success_metrics", &self.success_metrics)?;
        state.serialize_field(
            "target_date",
            &self
                .target_date
                .map(|date| date.format(DATE_FORMAT).to_string()),
        )?;
        state.serialize_field("date_implications", &self.date_implications())?;
        state.serialize_field("lob_design_approval", &self.lob_design_approval)?;
        state.serialize_field("lob_senior_approval", &self.lob_senior_approval)?;
        state.serialize_field("impacted_applications", &list(&self.impacted_applications))?;
        state.serialize_field("test_cases", &list(&self.test_cases))?;
        state.serialize_field("all_details_given", &self.all_details_given())?;
        state.end()
    }
}
