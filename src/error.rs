use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde::Serialize;
use serde_json::json;
use strum::Display as StrumDisplay;

use crate::model::schedule::ScheduleStatus;
use crate::scheduling::conflict::ShiftConflict;

/// Failure inside a store implementation.
#[derive(Debug, Display)]
pub enum StoreError {
    #[display(fmt = "database error: {}", _0)]
    Database(sqlx::Error),
    /// A unique key (email, phone, username) is already taken.
    #[display(fmt = "duplicate value: {}", _0)]
    Duplicate(String),
    /// A stored value could not be turned back into a domain type.
    #[display(fmt = "corrupt record: {}", _0)]
    Corrupt(String),
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        // foreign-key failures share SQLSTATE 23000 with duplicate keys
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.is_unique_violation() {
                return StoreError::Duplicate(db_err.message().to_string());
            }
        }
        StoreError::Database(e)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Corrupt(e.to_string())
    }
}

impl From<strum::ParseError> for StoreError {
    fn from(e: strum::ParseError) -> Self {
        StoreError::Corrupt(e.to_string())
    }
}

/// Entities a lookup can miss.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, StrumDisplay)]
#[strum(serialize_all = "snake_case")]
pub enum Entity {
    Schedule,
    Shift,
    Employee,
    PickupPoint,
    Agent,
    AgentDocument,
}

/// Everything a schedule or document operation can refuse with.
#[derive(Debug, Display)]
pub enum ServiceError {
    #[display(fmt = "{} {} not found", entity, id)]
    NotFound { entity: Entity, id: u64 },
    #[display(fmt = "{}", _0)]
    Conflict(ShiftConflict),
    #[display(fmt = "cannot move schedule from {} to {}", from, to)]
    InvalidTransition {
        from: ScheduleStatus,
        to: ScheduleStatus,
    },
    #[display(fmt = "schedule is {} and can no longer be edited", _0)]
    NotEditable(ScheduleStatus),
    #[display(fmt = "{}", _0)]
    Validation(String),
    #[display(fmt = "{}", _0)]
    Duplicate(String),
    #[display(fmt = "{}", _0)]
    Storage(StoreError),
}

impl std::error::Error for ServiceError {}

impl ServiceError {
    pub fn not_found(entity: Entity, id: u64) -> Self {
        ServiceError::NotFound { entity, id }
    }
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate(msg) => ServiceError::Duplicate(msg),
            other => ServiceError::Storage(other),
        }
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::NotFound { .. } => StatusCode::NOT_FOUND,
            ServiceError::Conflict(_) | ServiceError::Duplicate(_) => StatusCode::CONFLICT,
            ServiceError::InvalidTransition { .. }
            | ServiceError::NotEditable(_)
            | ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            ServiceError::Storage(e) => {
                tracing::error!(error = %e, "Store operation failed");
                json!({ "message": "Internal Server Error" })
            }
            ServiceError::Conflict(conflict) => json!({
                "message": self.to_string(),
                "conflict": conflict,
            }),
            other => json!({ "message": other.to_string() }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::borrow::Cow;

    #[test]
    fn not_found_names_the_entity() {
        let e = ServiceError::not_found(Entity::PickupPoint, 3);
        assert_eq!(e.to_string(), "pickup_point 3 not found");
        assert_eq!(e.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn invalid_transition_is_a_bad_request() {
        let e = ServiceError::InvalidTransition {
            from: ScheduleStatus::Approved,
            to: ScheduleStatus::Rejected,
        };
        assert_eq!(e.to_string(), "cannot move schedule from approved to rejected");
        assert_eq!(e.status_code(), StatusCode::BAD_REQUEST);
    }

    #[derive(Debug)]
    struct FakeDbError {
        unique: bool,
    }

    impl std::fmt::Display for FakeDbError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("Duplicate entry 'north@agency.example' for key 'agents.email'")
        }
    }

    impl std::error::Error for FakeDbError {}

    impl DatabaseError for FakeDbError {
        fn message(&self) -> &str {
            "Duplicate entry 'north@agency.example' for key 'agents.email'"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed("23000"))
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            if self.unique {
                ErrorKind::UniqueViolation
            } else {
                ErrorKind::ForeignKeyViolation
            }
        }
    }

    fn db_error(unique: bool) -> sqlx::Error {
        sqlx::Error::Database(Box::new(FakeDbError { unique }))
    }

    #[test]
    fn only_unique_violations_are_duplicates() {
        assert!(matches!(
            StoreError::from(db_error(true)),
            StoreError::Duplicate(_)
        ));
        let fk = StoreError::from(db_error(false));
        assert!(matches!(fk, StoreError::Database(_)));
        let e: ServiceError = fk.into();
        assert_eq!(e.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn duplicate_store_error_keeps_its_message() {
        let e: ServiceError = StoreError::Duplicate("email taken".into()).into();
        assert!(matches!(e, ServiceError::Duplicate(ref m) if m == "email taken"));
        assert_eq!(e.status_code(), StatusCode::CONFLICT);
    }
}
