//! Product catalog rules for bulk uploads: reading files, checking rows,
//! resolving categories, generating templates and submitting the result.

pub mod category;
pub mod fields;
pub mod gate;
pub mod ingest;
pub mod submit;
pub mod template;
pub mod validate;
