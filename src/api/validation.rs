use super::ApiError;
use crate::domain::HabitId;

pub fn parse_habit_id(raw: &str) -> Result<HabitId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::validation(format!("Invalid habit ID: {raw}. ID must be a UUID")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_habit_id() {
        let id = HabitId::new();
        assert_eq!(parse_habit_id(&id.to_string()).unwrap(), id);
        assert!(parse_habit_id("not-a-uuid").is_err());
        assert!(parse_habit_id("").is_err());
        assert!(parse_habit_id("12345").is_err());
    }
}
