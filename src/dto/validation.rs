//! Validation helpers for DTOs.

use validator::ValidationError;

use crate::dto::matches::CreateMatchRequest;

/// Longest accepted team name, in characters.
pub const MAX_TEAM_NAME_CHARS: usize = 80;

/// Validates that a team name has visible characters and a bounded length.
///
/// # Examples
///
/// ```ignore
/// validate_team_name("Lakers") // Ok
/// validate_team_name("   ")    // Err - blank
/// ```
pub fn validate_team_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        let mut err = ValidationError::new("team_name_blank");
        err.message = Some("Team name is required".into());
        return Err(err);
    }

    let length = trimmed.chars().count();
    if length > MAX_TEAM_NAME_CHARS {
        let mut err = ValidationError::new("team_name_length");
        err.message = Some(
            format!("Team name must be at most {MAX_TEAM_NAME_CHARS} characters (got {length})")
                .into(),
        );
        return Err(err);
    }

    Ok(())
}

/// Validates that a match opposes two different teams.
pub fn validate_distinct_teams(request: &CreateMatchRequest) -> Result<(), ValidationError> {
    if request.home_team_id == request.away_team_id {
        let mut err = ValidationError::new("same_team");
        err.message = Some("Select two different teams".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn test_validate_team_name_valid() {
        assert!(validate_team_name("Lakers").is_ok());
        assert!(validate_team_name("  Celtics  ").is_ok());
        assert!(validate_team_name(&"x".repeat(MAX_TEAM_NAME_CHARS)).is_ok());
    }

    #[test]
    fn test_validate_team_name_invalid() {
        assert!(validate_team_name("").is_err());
        assert!(validate_team_name(" \t ").is_err());
        assert!(validate_team_name(&"x".repeat(MAX_TEAM_NAME_CHARS + 1)).is_err());
    }

    #[test]
    fn test_validate_distinct_teams() {
        let team = Uuid::new_v4();
        let same = CreateMatchRequest {
            home_team_id: team,
            away_team_id: team,
            quarter_duration_seconds: None,
        };
        assert!(validate_distinct_teams(&same).is_err());

        let different = CreateMatchRequest {
            away_team_id: Uuid::new_v4(),
            ..same
        };
        assert!(validate_distinct_teams(&different).is_ok());
    }
}
