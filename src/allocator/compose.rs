use super::SequenceCode;

pub const CODE_SEPARATOR: char = '-';

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("static code `{value}` must have the form COURSE-SEQUENCE")]
    StaticCodeShape { value: String },
    #[error("{kind} `{value}` must be non-empty and must not contain `-`")]
    CodeSegment { kind: &'static str, value: String },
}

/// Checks a code segment (course code, semester short code) that will be
/// joined with `-`.
pub fn validate_code_segment(kind: &'static str, value: &str) -> Result<(), FormatError> {
    if value.trim().is_empty() || value.contains(CODE_SEPARATOR) {
        return Err(FormatError::CodeSegment {
            kind,
            value: value.to_string(),
        });
    }
    Ok(())
}

/// `BAGC` + `AA01` -> `BAGC-AA01`.
pub fn compose_static_code(course_code: &str, sequence: &SequenceCode) -> String {
    format!("{course_code}{CODE_SEPARATOR}{sequence}")
}

/// `BAGC-AA01` + `S1` -> `BAGC-S1-AA01`.
pub fn compose_semester_code(
    static_code: &str,
    semester_short_code: &str,
) -> Result<String, FormatError> {
    let (course, sequence) = split_static_code(static_code)?;
    validate_code_segment("semester short code", semester_short_code)?;
    Ok(format!(
        "{course}{CODE_SEPARATOR}{semester_short_code}{CODE_SEPARATOR}{sequence}"
    ))
}

pub fn split_static_code(static_code: &str) -> Result<(&str, &str), FormatError> {
    let shape_error = || FormatError::StaticCodeShape {
        value: static_code.to_string(),
    };
    let (course, sequence) = static_code
        .split_once(CODE_SEPARATOR)
        .ok_or_else(shape_error)?;
    if course.is_empty() || sequence.is_empty() || sequence.contains(CODE_SEPARATOR) {
        return Err(shape_error());
    }
    Ok((course, sequence))
}
