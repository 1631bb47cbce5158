use serde::{Deserialize, Serialize};

/// Closed set of functional roles used for notification routing. Raw role
/// strings in the user directory are free-form (and occasionally
/// misspelled), so parsing folds the input down to alphanumerics before
/// matching aliases.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Hr,
    ProjectManager,
    Finance,
    Offtake,
    MonitoringAndEvaluation,
    Other,
}

impl Role {
    pub fn parse(raw: &str) -> Self {
        match fold_key(raw).as_str() {
            "hr" | "humanresource" | "humanresources" => Self::Hr,
            "projectmanager" | "projectmanger" | "pm" | "programmemanager" => Self::ProjectManager,
            "finance" | "financeofficer" | "finanace" => Self::Finance,
            "offtake" | "offtaker" | "offtakeofficer" => Self::Offtake,
            "monitoringandevaluation" | "monitoringevaluation" | "me" | "mande" => {
                Self::MonitoringAndEvaluation
            }
            _ => Self::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hr => "hr",
            Self::ProjectManager => "project_manager",
            Self::Finance => "finance",
            Self::Offtake => "offtake",
            Self::MonitoringAndEvaluation => "monitoring_and_evaluation",
            Self::Other => "other",
        }
    }
}

/// Lowercase and keep only alphanumerics, so `"Project  Manager"`,
/// `"project-manager"`, and `"M&E"` all fold to stable keys.
fn fold_key(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_alphanumeric).collect::<String>().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::Role;

    #[test]
    fn aliases_and_spacing_fold_to_the_same_role() {
        assert_eq!(Role::parse("HR"), Role::Hr);
        assert_eq!(Role::parse("Human Resources"), Role::Hr);
        assert_eq!(Role::parse("Project Manager"), Role::ProjectManager);
        assert_eq!(Role::parse("project-manager"), Role::ProjectManager);
        assert_eq!(Role::parse(" PM "), Role::ProjectManager);
        assert_eq!(Role::parse("M&E"), Role::MonitoringAndEvaluation);
        assert_eq!(Role::parse("Monitoring and Evaluation"), Role::MonitoringAndEvaluation);
        assert_eq!(Role::parse("Offtake Officer"), Role::Offtake);
    }

    #[test]
    fn observed_misspellings_still_match() {
        assert_eq!(Role::parse("Project Manger"), Role::ProjectManager);
        assert_eq!(Role::parse("Finanace"), Role::Finance);
        assert_eq!(Role::parse("offtaker"), Role::Offtake);
    }

    #[test]
    fn unrecognized_roles_map_to_other() {
        assert_eq!(Role::parse("Driver"), Role::Other);
        assert_eq!(Role::parse(""), Role::Other);
    }

    #[test]
    fn canonical_names_are_stable() {
        assert_eq!(Role::Hr.as_str(), "hr");
        assert_eq!(Role::ProjectManager.as_str(), "project_manager");
        assert_eq!(Role::MonitoringAndEvaluation.as_str(), "monitoring_and_evaluation");
    }
}
