//! Query normalizer: flat query-parameter bag -> relationship request.

use mentor_types::{RelationshipError, RelationshipRequest, SupportRole};

/// Parses the query parameters of an attach/detach request.
///
/// Exactly one `student` key and exactly one support-role key (`mentor`,
/// `coach`, `teacher` or `family`) must be present; anything else in the
/// bag rejects the whole request. Id values pass through untouched; whether
/// they parse and resolve is the engine's concern.
pub fn normalize_query(params: &[(String, String)]) -> Result<RelationshipRequest, RelationshipError> {
    let mut student: Option<&str> = None;
    let mut counterpart: Option<(SupportRole, &str)> = None;

    for (key, value) in params {
        if key == "student" {
            if student.replace(value.as_str()).is_some() {
                return Err(RelationshipError::BadRequest(
                    "student parameter given more than once".to_string(),
                ));
            }
        } else if let Some(role) = SupportRole::from_param(key) {
            if counterpart.replace((role, value.as_str())).is_some() {
                return Err(RelationshipError::BadRequest(
                    "exactly one of mentor, coach, teacher or family is allowed".to_string(),
                ));
            }
        } else {
            return Err(RelationshipError::BadRequest(format!(
                "unrecognized query parameter: {}",
                key
            )));
        }
    }

    let student_id = student.ok_or_else(|| {
        RelationshipError::BadRequest("student parameter is required".to_string())
    })?;
    let (support_role, counterpart_id) = counterpart.ok_or_else(|| {
        RelationshipError::BadRequest(
            "one of mentor, coach, teacher or family is required".to_string(),
        )
    })?;

    Ok(RelationshipRequest {
        student_id: student_id.to_string(),
        support_role,
        counterpart_id: counterpart_id.to_string(),
    })
}
