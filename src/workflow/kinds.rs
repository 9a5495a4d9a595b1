use super::error::WorkflowError;
use serde::{Deserialize, Serialize};

/// The five approval processes. Each one has a stage set fixed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowKind {
    Registration,
    DeadSemester,
    SemesterClearance,
    Graduation,
    Certification,
}

impl WorkflowKind {
    pub const ALL: [WorkflowKind; 5] = [
        WorkflowKind::Registration,
        WorkflowKind::DeadSemester,
        WorkflowKind::SemesterClearance,
        WorkflowKind::Graduation,
        WorkflowKind::Certification,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Registration => "registration",
            Self::DeadSemester => "dead_semester",
            Self::SemesterClearance => "semester_clearance",
            Self::Graduation => "graduation",
            Self::Certification => "certification",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == raw)
    }

    pub fn required_stages(self) -> &'static [Stage] {
        match self {
            Self::Registration => &[
                Stage::Finance,
                Stage::Academic,
                Stage::Orientation,
                Stage::Assimilation,
            ],
            Self::DeadSemester => &[Stage::Hod, Stage::Faculty, Stage::Registrar],
            Self::SemesterClearance => &[Stage::Finance, Stage::Academic],
            Self::Graduation => &[Stage::ApprovingOfficer],
            Self::Certification => &[Stage::Certifier],
        }
    }

    /// Graduation carries a caller-set "all requirements met" flag that
    /// counts towards completion alongside its stages.
    pub fn has_requirements_gate(self) -> bool {
        matches!(self, Self::Graduation)
    }

    /// Resolves a caller-supplied stage name against this kind's stage set.
    pub fn stage_named(self, name: &str) -> Result<Stage, WorkflowError> {
        Stage::parse(name.trim())
            .filter(|stage| self.required_stages().contains(stage))
            .ok_or_else(|| WorkflowError::UnknownStage {
                kind: self,
                stage: name.to_string(),
            })
    }
}

impl std::fmt::Display for WorkflowKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Finance,
    Academic,
    Orientation,
    Assimilation,
    Hod,
    Faculty,
    Registrar,
    ApprovingOfficer,
    Certifier,
}

impl Stage {
    pub const ALL: [Stage; 9] = [
        Stage::Finance,
        Stage::Academic,
        Stage::Orientation,
        Stage::Assimilation,
        Stage::Hod,
        Stage::Faculty,
        Stage::Registrar,
        Stage::ApprovingOfficer,
        Stage::Certifier,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Finance => "finance",
            Self::Academic => "academic",
            Self::Orientation => "orientation",
            Self::Assimilation => "assimilation",
            Self::Hod => "hod",
            Self::Faculty => "faculty",
            Self::Registrar => "registrar",
            Self::ApprovingOfficer => "approving_officer",
            Self::Certifier => "certifier",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|stage| stage.as_str() == raw)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Items handed over during registration orientation and assimilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecklistItem {
    UndergraduateGown,
    TShirt,
    MembershipCard,
    AdmissionLetter,
    StudentId,
    ExaminationCard,
}

impl ChecklistItem {
    pub const ALL: [ChecklistItem; 6] = [
        ChecklistItem::UndergraduateGown,
        ChecklistItem::TShirt,
        ChecklistItem::MembershipCard,
        ChecklistItem::AdmissionLetter,
        ChecklistItem::StudentId,
        ChecklistItem::ExaminationCard,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::UndergraduateGown => "undergraduate_gown",
            Self::TShirt => "t_shirt",
            Self::MembershipCard => "membership_card",
            Self::AdmissionLetter => "admission_letter",
            Self::StudentId => "student_id",
            Self::ExaminationCard => "examination_card",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|item| item.as_str() == raw)
    }

    pub fn stage(self) -> Stage {
        match self {
            Self::UndergraduateGown | Self::TShirt | Self::MembershipCard => Stage::Orientation,
            Self::AdmissionLetter | Self::StudentId | Self::ExaminationCard => Stage::Assimilation,
        }
    }
}

impl std::fmt::Display for ChecklistItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The record a process is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(tag = "type", content = "ref", rename_all = "snake_case")]
pub enum ProcessSubject {
    AccessNumber(String),
    Student(String),
    DeadSemesterApplication(String),
    CourseUnit(i64),
    CourseWork(i64),
    Association(i64),
}

impl ProcessSubject {
    pub fn kind_str(&self) -> &'static str {
        match self {
            Self::AccessNumber(_) => "access_number",
            Self::Student(_) => "student",
            Self::DeadSemesterApplication(_) => "dead_semester_application",
            Self::CourseUnit(_) => "course_unit",
            Self::CourseWork(_) => "course_work",
            Self::Association(_) => "association",
        }
    }

    pub fn ref_string(&self) -> String {
        match self {
            Self::AccessNumber(value)
            | Self::Student(value)
            | Self::DeadSemesterApplication(value) => value.clone(),
            Self::CourseUnit(id) | Self::CourseWork(id) | Self::Association(id) => id.to_string(),
        }
    }

    pub fn from_db(kind: &str, reference: &str) -> Option<Self> {
        let record_id = || reference.parse::<i64>().ok();
        match kind {
            "access_number" => Some(Self::AccessNumber(reference.to_string())),
            "student" => Some(Self::Student(reference.to_string())),
            "dead_semester_application" => {
                Some(Self::DeadSemesterApplication(reference.to_string()))
            }
            "course_unit" => record_id().map(Self::CourseUnit),
            "course_work" => record_id().map(Self::CourseWork),
            "association" => record_id().map(Self::Association),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProcessSubject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind_str(), self.ref_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_sets_are_fixed_per_kind() {
        assert_eq!(WorkflowKind::Registration.required_stages().len(), 4);
        assert_eq!(
            WorkflowKind::DeadSemester.required_stages(),
            &[Stage::Hod, Stage::Faculty, Stage::Registrar]
        );
        assert_eq!(
            WorkflowKind::SemesterClearance.required_stages(),
            &[Stage::Finance, Stage::Academic]
        );
        assert_eq!(
            WorkflowKind::Graduation.required_stages(),
            &[Stage::ApprovingOfficer]
        );
        assert_eq!(
            WorkflowKind::Certification.required_stages(),
            &[Stage::Certifier]
        );
    }

    #[test]
    fn stage_lookup_is_scoped_to_kind() {
        assert_eq!(
            WorkflowKind::SemesterClearance.stage_named("finance").expect("stage"),
            Stage::Finance
        );
        assert_eq!(
            WorkflowKind::DeadSemester.stage_named(" hod ").expect("stage"),
            Stage::Hod
        );
        assert!(matches!(
            WorkflowKind::SemesterClearance.stage_named("orientation"),
            Err(WorkflowError::UnknownStage { .. })
        ));
        assert!(matches!(
            WorkflowKind::DeadSemester.stage_named("dean"),
            Err(WorkflowError::UnknownStage { .. })
        ));
    }

    #[test]
    fn names_round_trip_through_parse() {
        for kind in WorkflowKind::ALL {
            assert_eq!(WorkflowKind::parse(kind.as_str()), Some(kind));
        }
        for stage in Stage::ALL {
            assert_eq!(Stage::parse(stage.as_str()), Some(stage));
        }
        for item in ChecklistItem::ALL {
            assert_eq!(ChecklistItem::parse(item.as_str()), Some(item));
            assert!(WorkflowKind::Registration
                .required_stages()
                .contains(&item.stage()));
        }
    }

    #[test]
    fn subjects_round_trip_through_db_columns() {
        let subjects = [
            ProcessSubject::AccessNumber("BAGC-S1-AA01".to_string()),
            ProcessSubject::Student("abc".to_string()),
            ProcessSubject::DeadSemesterApplication("token".to_string()),
            ProcessSubject::CourseUnit(4),
            ProcessSubject::CourseWork(5),
            ProcessSubject::Association(6),
        ];
        for subject in subjects {
            let decoded = ProcessSubject::from_db(subject.kind_str(), &subject.ref_string());
            assert_eq!(decoded, Some(subject));
        }
        assert_eq!(ProcessSubject::from_db("course_unit", "x"), None);
    }
}
