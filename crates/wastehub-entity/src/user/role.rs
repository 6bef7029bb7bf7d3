//! User role enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The three actor roles of the pickup workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Files waste reports and follows their pickup.
    Resident,
    /// Performs pickups.
    Collector,
    /// Assigns and supervises work.
    Admin,
}

impl UserRole {
    /// All roles, in a stable order.
    pub const ALL: [UserRole; 3] = [Self::Resident, Self::Collector, Self::Admin];

    /// Check if this role is an admin.
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Check if this role is a collector.
    pub fn is_collector(&self) -> bool {
        matches!(self, Self::Collector)
    }

    /// Return the role as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Resident => "resident",
            Self::Collector => "collector",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = wastehub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "resident" => Ok(Self::Resident),
            "collector" => Ok(Self::Collector),
            "admin" => Ok(Self::Admin),
            _ => Err(wastehub_core::AppError::validation(format!(
                "Invalid user role: '{s}'. Expected one of: resident, collector, admin"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str() {
        assert_eq!("admin".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert_eq!("Collector".parse::<UserRole>().unwrap(), UserRole::Collector);
        assert!("viewer".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_display_round_trips() {
        for role in UserRole::ALL {
            assert_eq!(role.to_string().parse::<UserRole>().unwrap(), role);
        }
    }
}
