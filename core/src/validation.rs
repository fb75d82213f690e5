use crate::error::{Result, TickTickError};
use crate::models::Priority;

/// The object kinds `ticktick_get_all` can enumerate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    Tasks,
    Projects,
    Tags,
}

/// Input validation for tool parameters.
///
/// Checks are deliberately shallow: anything the TickTick service itself
/// enforces (project existence, id shapes) is left to the API call so the
/// error the agent sees matches what the service said.
pub struct ToolValidator;

impl ToolValidator {
    /// Require a non-empty string field.
    pub fn require_non_empty(field: &str, value: &str) -> Result<()> {
        if value.trim().is_empty() {
            return Err(TickTickError::empty_field(field));
        }
        Ok(())
    }

    /// Validate a priority wire value.
    pub fn validate_priority(value: i32) -> Result<Priority> {
        Priority::from_value(value)
    }

    /// Parse the `search` argument of `ticktick_get_all` (case-insensitive).
    pub fn parse_search_kind(search: &str) -> Result<SearchKind> {
        match search.to_lowercase().as_str() {
            "tasks" => Ok(SearchKind::Tasks),
            "projects" => Ok(SearchKind::Projects),
            "tags" => Ok(SearchKind::Tags),
            other => Err(TickTickError::Validation(format!(
                "Invalid search type: {other}. Must be 'tasks', 'projects' or 'tags'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_non_empty() {
        assert!(ToolValidator::require_non_empty("title", "Buy milk").is_ok());
        assert!(ToolValidator::require_non_empty("title", "").is_err());
        assert!(ToolValidator::require_non_empty("title", "   ").is_err());
    }

    #[test]
    fn test_validate_priority() {
        assert_eq!(ToolValidator::validate_priority(5).unwrap(), Priority::High);
        assert!(ToolValidator::validate_priority(4).is_err());
    }

    #[test]
    fn test_parse_search_kind() {
        assert_eq!(
            ToolValidator::parse_search_kind("Projects").unwrap(),
            SearchKind::Projects
        );
        assert_eq!(
            ToolValidator::parse_search_kind("TASKS").unwrap(),
            SearchKind::Tasks
        );
        assert!(ToolValidator::parse_search_kind("habits").is_err());
    }
}
