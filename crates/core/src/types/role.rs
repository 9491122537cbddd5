//! Account roles.

use serde::{Deserialize, Serialize};

/// Account tier with different capabilities.
///
/// Every operation declares the role(s) it requires and checks them once at
/// the request boundary; handlers never branch on role internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "account_role", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum AccountRole {
    /// Can browse, purchase, and review games.
    Buyer,
    /// Everything a buyer can do, plus submitting game listings.
    Developer,
    /// Full moderation and console access.
    Admin,
}

impl AccountRole {
    /// Whether this role may submit game listings.
    #[must_use]
    pub const fn can_publish(self) -> bool {
        matches!(self, Self::Developer | Self::Admin)
    }

    /// Whether this role has admin console access.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for AccountRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buyer => write!(f, "buyer"),
            Self::Developer => write!(f, "developer"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for AccountRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buyer" => Ok(Self::Buyer),
            "developer" => Ok(Self::Developer),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid account role: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_from_str_roundtrip() {
        for role in [AccountRole::Buyer, AccountRole::Developer, AccountRole::Admin] {
            let parsed: AccountRole = role.to_string().parse().unwrap();
            assert_eq!(parsed, role);
        }
    }

    #[test]
    fn test_from_str_invalid() {
        assert!("superuser".parse::<AccountRole>().is_err());
    }

    #[test]
    fn test_capabilities() {
        assert!(!AccountRole::Buyer.can_publish());
        assert!(AccountRole::Developer.can_publish());
        assert!(AccountRole::Admin.can_publish());
        assert!(AccountRole::Admin.is_admin());
        assert!(!AccountRole::Developer.is_admin());
    }
}
