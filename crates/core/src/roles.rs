//! Role capability model.
//!
//! Authorization decisions key off a closed set of role kinds rather than
//! raw role-name strings scattered through the services.

use civic_db::repositories::UserWithRoles;

/// The closed set of department roles the report engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleKind {
    /// Sole role authorized to approve or reject pending reports.
    PublicRelationsOfficer,
    /// Senior technical staff.
    TechnicalManager,
    /// Junior technical staff.
    TechnicalAssistant,
    /// Third-party company representative working delegated reports.
    ExternalMaintainer,
    /// Ordinary citizen account.
    Citizen,
}

impl RoleKind {
    /// All role kinds.
    pub const ALL: [Self; 5] = [
        Self::PublicRelationsOfficer,
        Self::TechnicalManager,
        Self::TechnicalAssistant,
        Self::ExternalMaintainer,
        Self::Citizen,
    ];

    /// The role name as stored in the role registry.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::PublicRelationsOfficer => "Municipal Public Relations Officer",
            Self::TechnicalManager => "Technical Manager",
            Self::TechnicalAssistant => "Technical Assistant",
            Self::ExternalMaintainer => "External Maintainer",
            Self::Citizen => "Citizen",
        }
    }

    /// Parse a role kind from its registry name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    /// The role kinds held by a user, in registry order.
    #[must_use]
    pub fn for_user(user: &UserWithRoles) -> Vec<Self> {
        user.roles
            .iter()
            .filter_map(|r| Self::from_name(&r.name))
            .collect()
    }

    /// Whether this role may approve or reject pending reports.
    #[must_use]
    pub const fn can_moderate(self) -> bool {
        matches!(self, Self::PublicRelationsOfficer)
    }

    /// Whether this role is internal technical staff.
    #[must_use]
    pub const fn is_technical_staff(self) -> bool {
        matches!(self, Self::TechnicalManager | Self::TechnicalAssistant)
    }

    /// Whether this role belongs to an external maintenance company.
    #[must_use]
    pub const fn is_external(self) -> bool {
        matches!(self, Self::ExternalMaintainer)
    }

    /// Whether this role is municipal staff of any kind.
    #[must_use]
    pub const fn is_municipal_staff(self) -> bool {
        self.can_moderate() || self.is_technical_staff()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for kind in RoleKind::ALL {
            assert_eq!(RoleKind::from_name(kind.name()), Some(kind));
        }
        assert!(RoleKind::from_name("Mayor").is_none());
    }

    #[test]
    fn test_capabilities() {
        assert!(RoleKind::PublicRelationsOfficer.can_moderate());
        assert!(!RoleKind::PublicRelationsOfficer.is_technical_staff());

        assert!(RoleKind::TechnicalManager.is_technical_staff());
        assert!(RoleKind::TechnicalAssistant.is_technical_staff());
        assert!(!RoleKind::TechnicalManager.can_moderate());

        assert!(RoleKind::ExternalMaintainer.is_external());
        assert!(!RoleKind::ExternalMaintainer.is_municipal_staff());

        assert!(!RoleKind::Citizen.is_municipal_staff());
        assert!(!RoleKind::Citizen.is_external());
    }
}
