//! Extraction-note contract for docpipe.
//!
//! This crate does not extract anything from documents. It validates and
//! carries the `extraction_notes` of whatever an upstream producer emits,
//! and checks the output contract consumers rely on.

pub mod notes;
pub mod result;

use docpipe_core::AppError;

pub use notes::{
    validate, validate_batch, BatchValidation, ExtractionNote, ExtractionStatus, SchemaViolation,
};
pub use result::{intake, ContractViolation, ExtractionResult, IntakeReport};

impl From<SchemaViolation> for AppError {
    fn from(err: SchemaViolation) -> Self {
        AppError::Extraction(err.to_string())
    }
}

impl From<ContractViolation> for AppError {
    fn from(err: ContractViolation) -> Self {
        AppError::Extraction(err.to_string())
    }
}
