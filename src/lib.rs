//! Conversational Requirement Elicitation
//!
//! A [`Session`] interviews a user one field at a time, validating each
//! answer before moving on, until every field of a [`RequirementRecord`] is
//! populated.

pub mod domain;
pub use domain::{
    Config, FieldId, FieldValue, Oracle, RequirementRecord, Session, SessionState, Turn,
};
