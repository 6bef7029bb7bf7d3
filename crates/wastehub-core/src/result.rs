//! Convenience result type alias for WasteHub.

use crate::error::AppError;

/// A specialized `Result` type for WasteHub operations.
pub type AppResult<T> = Result<T, AppError>;
