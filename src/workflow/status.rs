use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessStatus {
    Pending,
    Partial,
    Approved,
}

impl ProcessStatus {
    /// Aggregate status over the completion flags of every required condition.
    pub fn fold<I>(flags: I) -> Self
    where
        I: IntoIterator<Item = bool>,
    {
        let (completed, total) = flags
            .into_iter()
            .fold((0usize, 0usize), |(completed, total), flag| {
                (completed + usize::from(flag), total + 1)
            });
        if completed == 0 {
            Self::Pending
        } else if completed == total {
            Self::Approved
        } else {
            Self::Partial
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Partial => "PARTIAL",
            Self::Approved => "APPROVED",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Approved)
    }
}

impl std::fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_stage_fold() {
        assert_eq!(ProcessStatus::fold([false, false, false]), ProcessStatus::Pending);
        assert_eq!(ProcessStatus::fold([true, false, false]), ProcessStatus::Partial);
        assert_eq!(ProcessStatus::fold([true, false, true]), ProcessStatus::Partial);
        assert_eq!(ProcessStatus::fold([true, true, true]), ProcessStatus::Approved);
    }

    #[test]
    fn empty_fold_is_pending() {
        assert_eq!(ProcessStatus::fold(Vec::new()), ProcessStatus::Pending);
    }

    #[test]
    fn only_approved_is_terminal() {
        assert!(ProcessStatus::Approved.is_terminal());
        assert!(!ProcessStatus::Partial.is_terminal());
        assert_eq!(
            serde_json::to_string(&ProcessStatus::Partial).expect("serialize"),
            "\"PARTIAL\""
        );
    }
}
