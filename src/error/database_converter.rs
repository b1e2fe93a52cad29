use crate::error::AppError;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// Converts diesel errors into structured `AppError` variants.
pub struct DatabaseErrorConverter;

impl DatabaseErrorConverter {
    /// Converts a Diesel error to an appropriate AppError variant.
    ///
    /// # Arguments
    /// * `error` - The Diesel error to convert
    /// * `operation` - Description of the database operation that failed
    pub fn convert_diesel_error(error: DieselError, operation: &str) -> AppError {
        match error {
            DieselError::DatabaseError(kind, info) => {
                Self::convert_database_error(kind, info.message(), info.constraint_name(), operation)
            }
            DieselError::NotFound => AppError::NotFound {
                entity: "resource".to_string(),
                field: "id".to_string(),
                value: "unknown".to_string(),
            },
            other => AppError::Database {
                operation: operation.to_string(),
                source: anyhow::Error::from(other),
            },
        }
    }

    fn convert_database_error(
        kind: DatabaseErrorKind,
        message: &str,
        constraint_name: Option<&str>,
        operation: &str,
    ) -> AppError {
        match kind {
            DatabaseErrorKind::UniqueViolation => {
                let (entity, field) = Self::split_constraint(constraint_name);
                AppError::Duplicate {
                    entity,
                    field,
                    value: "unknown".to_string(),
                }
            }
            DatabaseErrorKind::CheckViolation | DatabaseErrorKind::NotNullViolation => {
                let (_, field) = Self::split_constraint(constraint_name);
                AppError::Validation {
                    field,
                    reason: message.to_string(),
                }
            }
            _ => AppError::Database {
                operation: operation.to_string(),
                source: anyhow::Error::msg(message.to_string()),
            },
        }
    }

    /// Postgres names constraints `{table}_{column}_{suffix}` by default.
    fn split_constraint(constraint_name: Option<&str>) -> (String, String) {
        let Some(name) = constraint_name else {
            return ("resource".to_string(), "unknown".to_string());
        };
        let trimmed = ["_pkey", "_key", "_check", "_not_null"]
            .iter()
            .find_map(|suffix| name.strip_suffix(suffix))
            .unwrap_or(name);
        match trimmed.split_once('_') {
            Some((table, column)) if !column.is_empty() => {
                (table.to_string(), column.to_string())
            }
            _ => (trimmed.to_string(), "unknown".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_conversion() {
        let err = DatabaseErrorConverter::convert_diesel_error(DieselError::NotFound, "select");
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[test]
    fn test_other_errors_become_database_errors() {
        let err = DatabaseErrorConverter::convert_diesel_error(
            DieselError::RollbackTransaction,
            "delete task",
        );
        match err {
            AppError::Database { operation, .. } => assert_eq!(operation, "delete task"),
            other => panic!("Expected Database error, got {:?}", other),
        }
    }

    #[test]
    fn test_unique_violation_uses_constraint_name() {
        let err = DatabaseErrorConverter::convert_database_error(
            DatabaseErrorKind::UniqueViolation,
            "duplicate key value violates unique constraint",
            Some("tasks_pkey"),
            "insert task",
        );
        match err {
            AppError::Duplicate { entity, .. } => assert_eq!(entity, "tasks"),
            other => panic!("Expected Duplicate error, got {:?}", other),
        }
    }

    #[test]
    fn test_check_violation_becomes_validation() {
        let err = DatabaseErrorConverter::convert_database_error(
            DatabaseErrorKind::CheckViolation,
            "new row violates check constraint",
            Some("tasks_status_check"),
            "update task",
        );
        match err {
            AppError::Validation { field, .. } => assert_eq!(field, "status"),
            other => panic!("Expected Validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_split_constraint_without_name() {
        assert_eq!(
            DatabaseErrorConverter::split_constraint(None),
            ("resource".to_string(), "unknown".to_string())
        );
    }
}
