//! Domain models for requirement elicitation.
//!
//! This module contains the requirement schema, the answer validators, the
//! semantic-judgment seam, and the interview state machine that ties them
//! together.

/// Schema definition: field identifiers, ordering and questions.
pub mod field;
pub use field::{FieldId, FieldKind};

/// The requirement record being populated.
pub mod record;
pub use record::{Approval, BuildKind, DevelopmentDetails, FieldValue, RequirementRecord};

/// Structural answer validation.
pub mod validator;
pub use validator::{Rejection, RejectionReason, ValidationError};

/// Pluggable semantic judgment for free-text rules.
pub mod oracle;
pub use oracle::{Judgment, Oracle, OracleError, SemanticRule};

/// The elicitation state machine.
pub mod session;
pub use session::{Outcome, SchemaViolation, Session, SessionState, Turn};

mod config;
pub use config::{Config, OracleConfig, OracleKind};
