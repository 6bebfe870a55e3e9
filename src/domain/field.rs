use std::{fmt, str::FromStr};

use serde::Serialize;

use crate::domain::SemanticRule;

/// Identifies one slot of the requirement schema.
///
/// The declaration order is the interview order: fields are always asked in
/// the order of [`FieldId::ALL`], skipping those already filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(into = "&'static str")]
pub enum FieldId {
    /// What needs to be done, and where.
    SpecificRequirement,
    /// Whether the work is a new build or an enhancement.
    IsNewBuild,
    /// Whether backend development is required.
    RequiresBeBuild,
    /// Whether mobile app integration is required.
    RequiresMobile,
    /// Whether shared services are used.
    RequiresSharedServices,
    /// The quantifiable business value.
    BusinessValue,
    /// How success will be judged.
    SuccessDefinition,
    /// Exactly three KPIs.
    SuccessMetrics,
    /// Production go-live date.
    TargetDate,
    /// Business impact of missing the target date.
    DateImplications,
    /// Line-of-business design authority sign-off.
    LobDesignApproval,
    /// Line-of-business senior sign-off.
    LobSeniorApproval,
    /// Partner applications affected by the change.
    ImpactedApplications,
    /// Test cases to be supported.
    TestCases,
}

/// The shape of answer a field expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text judged against a semantic rule.
    Text(SemanticRule),
    /// The `new build` / `enhancement` choice.
    BuildKind,
    /// A literal `yes` / `no`.
    Flag,
    /// A `DD-MM-YYYY` calendar date.
    Date,
    /// Exactly three measurable metrics.
    Metrics,
    /// Name, role and approval date.
    Approval,
    /// One or more named applications.
    Applications,
    /// One or more input/expected-output statements.
    TestCases,
}

impl FieldId {
    /// Every field, in interview order.
    pub const ALL: [Self; 14] = [
        Self::SpecificRequirement,
        Self::IsNewBuild,
        Self::RequiresBeBuild,
        Self::RequiresMobile,
        Self::RequiresSharedServices,
        Self::BusinessValue,
        Self::SuccessDefinition,
        Self::SuccessMetrics,
        Self::TargetDate,
        Self::DateImplications,
        Self::LobDesignApproval,
        Self::LobSeniorApproval,
        Self::ImpactedApplications,
        Self::TestCases,
    ];

    /// The schema key, e.g. `development_details.requires_mobile`.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::SpecificRequirement => "specific_requirement",
            Self::IsNewBuild => "development_details.is_new_build",
            Self::RequiresBeBuild => "development_details.requires_be_build",
            Self::RequiresMobile => "development_details.requires_mobile",
            Self::RequiresSharedServices => "development_details.requires_shared_services",
            Self::BusinessValue => "business_value",
            Self::SuccessDefinition => "success_definition",
            Self::SuccessMetrics => "success_metrics",
            Self::TargetDate => "target_date",
            Self::DateImplications => "date_implications",
            Self::LobDesignApproval => "lob_design_approval",
            Self::LobSeniorApproval => "lob_senior_approval",
            Self::ImpactedApplications => "impacted_applications",
            Self::TestCases => "test_cases",
        }
    }

    /// Human-readable name used in acknowledgements.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::SpecificRequirement => "specific requirement",
            Self::IsNewBuild => "build type",
            Self::RequiresBeBuild => "backend build",
            Self::RequiresMobile => "mobile integration",
            Self::RequiresSharedServices => "shared services",
            Self::BusinessValue => "business value",
            Self::SuccessDefinition => "success definition",
            Self::SuccessMetrics => "success metrics",
            Self::TargetDate => "target date",
            Self::DateImplications => "date implications",
            Self::LobDesignApproval => "LoB Design Authority approval",
            Self::LobSeniorApproval => "LoB Senior approval",
            Self::ImpactedApplications => "impacted applications",
            Self::TestCases => "test cases",
        }
    }

    /// Extra names a user may prefix an answer with to address this field.
    const fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::SpecificRequirement => &["requirement"],
            Self::IsNewBuild => &["is new build", "new build or enhancement"],
            Self::RequiresBeBuild => &["requires be build", "be build", "backend"],
            Self::RequiresMobile => &["requires mobile", "mobile"],
            Self::RequiresSharedServices => &["requires shared services"],
            Self::BusinessValue => &["value"],
            Self::SuccessDefinition => &["success"],
            Self::SuccessMetrics => &["metrics", "kpis", "kpi"],
            Self::TargetDate => &["go live", "go-live date", "go live date"],
            Self::DateImplications => &["implications"],
            Self::LobDesignApproval => &["design approval", "design authority approval"],
            Self::LobSeniorApproval => &["senior approval"],
            Self::ImpactedApplications => &["applications", "impacted apps", "apps"],
            Self::TestCases => &["tests"],
        }
    }

    /// Resolves a user-supplied field name.
    ///
    /// Matching is case-insensitive and treats spaces, underscores and dots
    /// alike, so `Target Date`, `target_date` and
    /// `development_details.requires_mobile` all resolve.
    #[must_use]
    pub fn from_label(name: &str) -> Option<Self> {
        let wanted = normalise(name);
        if wanted.is_empty() {
            return None;
        }
        Self::ALL.into_iter().find(|field| {
            normalise(field.key()) == wanted
                || normalise(field.label()) == wanted
                || field.key().rsplit('.').next().is_some_and(|k| normalise(k) == wanted)
                || field.aliases().iter().any(|alias| normalise(alias) == wanted)
        })
    }

    /// The kind of answer expected for this field.
    #[must_use]
    pub const fn kind(self) -> FieldKind {
        match self {
            Self::SpecificRequirement => FieldKind::Text(SemanticRule::WhatAndWhere),
            Self::IsNewBuild => FieldKind::BuildKind,
            Self::RequiresBeBuild | Self::RequiresMobile | Self::RequiresSharedServices => {
                FieldKind::Flag
            }
            Self::BusinessValue => FieldKind::Text(SemanticRule::QuantifiableBenefit),
            Self::SuccessDefinition => FieldKind::Text(SemanticRule::MeasurableSuccess),
            Self::SuccessMetrics => FieldKind::Metrics,
            Self::TargetDate => FieldKind::Date,
            Self::DateImplications => FieldKind::Text(SemanticRule::ConcreteImpact),
            Self::LobDesignApproval | Self::LobSeniorApproval => FieldKind::Approval,
            Self::ImpactedApplications => FieldKind::Applications,
            Self::TestCases => FieldKind::TestCases,
        }
    }

    /// The canonical question asked when this field becomes current.
    #[must_use]
    pub const fn question(self) -> &'static str {
        match self {
            Self::SpecificRequirement => {
                "What exactly needs to be done? Please describe the requirement in detail, \
                 including where it needs to be done."
            }
            Self::IsNewBuild => {
                "Is this a new build or an enhancement? Please type either 'new build' or \
                 'enhancement'."
            }
            Self::RequiresBeBuild => {
                "Will this require backend development? Please type 'yes' or 'no'."
            }
            Self::RequiresMobile => {
                "Will this need mobile app integration? Please type 'yes' or 'no'."
            }
            Self::RequiresSharedServices => {
                "Will this use shared services? Please type 'yes' or 'no'."
            }
            Self::BusinessValue => {
                "What specific business value will this deliver? Please explain the exact, \
                 measurable benefits."
            }
            Self::SuccessDefinition => {
                "How exactly will we measure if this requirement is successful?"
            }
            Self::SuccessMetrics => {
                "Please provide exactly 3 specific KPIs we will use to measure success, one per \
                 line or separated by ';'."
            }
            Self::TargetDate => {
                "What is the exact target date for production go-live? Please specify in \
                 DD-MM-YYYY format."
            }
            Self::DateImplications => {
                "What are the specific business impacts if we miss the target date?"
            }
            Self::LobDesignApproval => {
                "Please provide the LoB Design Authority approval details as \
                 'Name: [name]; Role: [role]; Date Approved: [DD-MM-YYYY]'."
            }
            Self::LobSeniorApproval => {
                "Please provide the LoB Senior approval details as \
                 'Name: [name]; Role: [role]; Date Approved: [DD-MM-YYYY]'."
            }
            Self::ImpactedApplications => {
                "Please list ALL applications that will be impacted by this change, separated \
                 by commas."
            }
            Self::TestCases => {
                "Please list the specific test cases that need to be supported, each with its \
                 input and expected output (e.g. 'expired card -> payment declined'), one per \
                 line or separated by ';'."
            }
        }
    }

    /// Whether this field is one of the four `development_details` answers.
    #[must_use]
    pub const fn is_development_detail(self) -> bool {
        matches!(
            self,
            Self::IsNewBuild
                | Self::RequiresBeBuild
                | Self::RequiresMobile
                | Self::RequiresSharedServices
        )
    }
}

fn normalise(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

impl From<FieldId> for &'static str {
    fn from(field: FieldId) -> Self {
        field.key()
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Error returned when a string names no known field.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Unknown field '{0}'")]
pub struct UnknownFieldError(String);

impl FromStr for FieldId {
    type Err = UnknownFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| UnknownFieldError(s.to_string()))
    }
}
