use thiserror::Error;

use crate::switcher::SwitchPhase;

/// Errors surfaced by the profile engine.
///
/// Store failures are carried unchanged as `anyhow::Error`; only the
/// conditions the engine itself detects get their own variant.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// No unique folder carries the reserved profile-root title.
    /// Recovered internally by lazy creation.
    #[error("could not find profile folder '{0}'")]
    ProfileRootNotFound(String),

    #[error("invalid profile name: {}", describe_name(.0))]
    InvalidProfileName(Option<String>),

    #[error("failed to move bookmark {node_id} into {parent_id} while {phase}")]
    MoveFailed {
        phase: SwitchPhase,
        node_id: String,
        parent_id: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("bookmark store error: {0}")]
    Store(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ProfileError>;

fn describe_name(name: &Option<String>) -> String {
    match name.as_deref() {
        None => "no name given".to_string(),
        Some("") => "name is empty".to_string(),
        Some(name) => format!("'{}'", name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_name_messages_are_readable() {
        assert_eq!(
            ProfileError::InvalidProfileName(None).to_string(),
            "invalid profile name: no name given"
        );
        assert_eq!(
            ProfileError::InvalidProfileName(Some(String::new())).to_string(),
            "invalid profile name: name is empty"
        );
        assert_eq!(
            ProfileError::InvalidProfileName(Some("a/b".to_string())).to_string(),
            "invalid profile name: 'a/b'"
        );
    }

    #[test]
    fn test_move_failure_names_phase_and_keeps_source() {
        let err = ProfileError::MoveFailed {
            phase: SwitchPhase::ImportingProfile,
            node_id: "11".to_string(),
            parent_id: "1".to_string(),
            source: anyhow::anyhow!("locked"),
        };
        assert_eq!(
            err.to_string(),
            "failed to move bookmark 11 into 1 while importing the profile"
        );
        assert_eq!(std::error::Error::source(&err).map(|e| e.to_string()).as_deref(), Some("locked"));
    }
}
