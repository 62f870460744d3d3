//! System-wide and per-book roles.
//!
//! Both are stored lowercase in the database.

use crate::EngineError;

/// Role a user holds across the whole application.
///
/// A user may have no system role at all; that user is treated like a
/// `Partner` for display purposes but without the extra `Partner` denials.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SystemRole {
    Admin,
    Manager,
    Partner,
}

impl SystemRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Partner => "partner",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::Manager => "Manager",
            Self::Partner => "Partner",
        }
    }
}

impl TryFrom<&str> for SystemRole {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "manager" => Ok(Self::Manager),
            "partner" => Ok(Self::Partner),
            other => Err(EngineError::Validation(format!(
                "invalid system role: {other}"
            ))),
        }
    }
}

/// Role of a member inside a single book.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BookRole {
    Partner,
    Manager,
    Admin,
}

impl BookRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Partner => "partner",
            Self::Manager => "manager",
            Self::Admin => "admin",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Partner => "Partner",
            Self::Manager => "Manager",
            Self::Admin => "Admin",
        }
    }

    /// Members with this role may add, edit and delete entries.
    pub fn can_write(self) -> bool {
        matches!(self, Self::Admin | Self::Manager)
    }
}

impl TryFrom<&str> for BookRole {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "partner" => Ok(Self::Partner),
            "manager" => Ok(Self::Manager),
            "admin" => Ok(Self::Admin),
            other => Err(EngineError::Validation(format!(
                "invalid book role: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_role_parses_case_insensitively() {
        assert_eq!(SystemRole::try_from("Admin").unwrap(), SystemRole::Admin);
        assert_eq!(SystemRole::try_from(" manager ").unwrap(), SystemRole::Manager);
        assert!(SystemRole::try_from("owner").is_err());
    }

    #[test]
    fn book_role_write_access() {
        assert!(BookRole::Admin.can_write());
        assert!(BookRole::Manager.can_write());
        assert!(!BookRole::Partner.can_write());
    }

    #[test]
    fn stored_form_is_lowercase() {
        for role in [SystemRole::Admin, SystemRole::Manager, SystemRole::Partner] {
            assert_eq!(SystemRole::try_from(role.as_str()).unwrap(), role);
            assert_eq!(role.as_str(), role.as_str().to_lowercase());
        }
        for role in [BookRole::Admin, BookRole::Manager, BookRole::Partner] {
            assert_eq!(BookRole::try_from(role.as_str()).unwrap(), role);
        }
    }
}
