//! Student sequence codes and the identifiers derived from them.
//!
//! Everything here is pure. Persisting the last issued code and serializing
//! concurrent allocations is the registry's job.

pub mod compose;
pub mod sequence;

pub use compose::{
    compose_semester_code, compose_static_code, split_static_code, validate_code_segment,
    FormatError, CODE_SEPARATOR,
};
pub use sequence::{SequenceCode, SequenceError};
