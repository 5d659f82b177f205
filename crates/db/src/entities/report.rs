//! Report entity.

use std::fmt;

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Report lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[derive(Default)]
pub enum ReportStatus {
    #[sea_orm(string_value = "Pending Approval")]
    #[serde(rename = "Pending Approval")]
    #[default]
    PendingApproval,
    #[sea_orm(string_value = "Assigned")]
    Assigned,
    #[sea_orm(string_value = "In Progress")]
    #[serde(rename = "In Progress")]
    InProgress,
    #[sea_orm(string_value = "Suspended")]
    Suspended,
    #[sea_orm(string_value = "Rejected")]
    Rejected,
    #[sea_orm(string_value = "Resolved")]
    Resolved,
}

impl ReportStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [Self; 6] = [
        Self::PendingApproval,
        Self::Assigned,
        Self::InProgress,
        Self::Suspended,
        Self::Rejected,
        Self::Resolved,
    ];

    /// The wire name of this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PendingApproval => "Pending Approval",
            Self::Assigned => "Assigned",
            Self::InProgress => "In Progress",
            Self::Suspended => "Suspended",
            Self::Rejected => "Rejected",
            Self::Resolved => "Resolved",
        }
    }

    /// Parse a status from its wire name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == name)
    }

    /// Whether no further transitions leave this status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Resolved)
    }

    /// Whether the state machine permits moving from `self` to `target`.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        match self {
            Self::PendingApproval => matches!(target, Self::Assigned | Self::Rejected),
            Self::Assigned | Self::InProgress => {
                matches!(target, Self::InProgress | Self::Resolved | Self::Suspended)
            }
            Self::Suspended => matches!(target, Self::InProgress | Self::Resolved),
            Self::Rejected | Self::Resolved => false,
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Report category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(64))")]
pub enum ReportCategory {
    #[sea_orm(string_value = "Water Supply - Drinking Water")]
    #[serde(rename = "Water Supply - Drinking Water")]
    WaterSupply,
    #[sea_orm(string_value = "Architectural Barriers")]
    #[serde(rename = "Architectural Barriers")]
    ArchitecturalBarriers,
    #[sea_orm(string_value = "Sewer System")]
    #[serde(rename = "Sewer System")]
    SewerSystem,
    #[sea_orm(string_value = "Public Lighting")]
    #[serde(rename = "Public Lighting")]
    PublicLighting,
    #[sea_orm(string_value = "Waste")]
    Waste,
    #[sea_orm(string_value = "Road Signs and Traffic Lights")]
    #[serde(rename = "Road Signs and Traffic Lights")]
    RoadSigns,
    #[sea_orm(string_value = "Roads and Urban Furnishings")]
    #[serde(rename = "Roads and Urban Furnishings")]
    Roads,
    #[sea_orm(string_value = "Public Green Areas and Playgrounds")]
    #[serde(rename = "Public Green Areas and Playgrounds")]
    GreenAreas,
    #[sea_orm(string_value = "Other")]
    Other,
}

impl ReportCategory {
    /// All categories.
    pub const ALL: [Self; 9] = [
        Self::WaterSupply,
        Self::ArchitecturalBarriers,
        Self::SewerSystem,
        Self::PublicLighting,
        Self::Waste,
        Self::RoadSigns,
        Self::Roads,
        Self::GreenAreas,
        Self::Other,
    ];

    /// The wire name of this category.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WaterSupply => "Water Supply - Drinking Water",
            Self::ArchitecturalBarriers => "Architectural Barriers",
            Self::SewerSystem => "Sewer System",
            Self::PublicLighting => "Public Lighting",
            Self::Waste => "Waste",
            Self::RoadSigns => "Road Signs and Traffic Lights",
            Self::Roads => "Roads and Urban Furnishings",
            Self::GreenAreas => "Public Green Areas and Playgrounds",
            Self::Other => "Other",
        }
    }

    /// Parse a category from its wire name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }
}

impl fmt::Display for ReportCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Report model.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "report")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// The citizen who submitted the report. NULL for anonymous submissions.
    #[sea_orm(nullable)]
    pub reporter_id: Option<i64>,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub category: ReportCategory,
    /// Latitude of the reported issue.
    pub latitude: f64,
    /// Longitude of the reported issue.
    pub longitude: f64,
    /// Street address, when resolvable.
    #[sea_orm(nullable)]
    pub address: Option<String>,
    /// Whether the reporter's identity is hidden from public views.
    #[sea_orm(default_value = false)]
    pub is_anonymous: bool,
    /// Current lifecycle status.
    pub status: ReportStatus,
    /// Internal staff member responsible for the report.
    #[sea_orm(nullable)]
    pub assignee_id: Option<i64>,
    /// External maintainer the report has been delegated to.
    #[sea_orm(nullable)]
    pub external_assignee_id: Option<i64>,
    /// Set when status is Rejected, cleared otherwise.
    #[sea_orm(column_type = "Text", nullable)]
    pub rejection_reason: Option<String>,
    /// Optimistic-lock counter, bumped on every status transition.
    #[sea_orm(default_value = 0)]
    pub version: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ReporterId",
        to = "super::user::Column::Id",
        on_delete = "SetNull"
    )]
    Reporter,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AssigneeId",
        to = "super::user::Column::Id",
        on_delete = "SetNull"
    )]
    Assignee,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ExternalAssigneeId",
        to = "super::user::Column::Id",
        on_delete = "SetNull"
    )]
    ExternalAssignee,

    #[sea_orm(has_many = "super::photo::Entity")]
    Photos,

    #[sea_orm(has_many = "super::internal_comment::Entity")]
    InternalComments,

    #[sea_orm(has_many = "super::message::Entity")]
    Messages,
}

impl Related<super::photo::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Photos.def()
    }
}

impl Related<super::internal_comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InternalComments.def()
    }
}

impl Related<super::message::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Messages.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions() {
        use ReportStatus::{
            Assigned, InProgress, PendingApproval, Rejected, Resolved, Suspended,
        };

        assert!(PendingApproval.can_transition_to(Assigned));
        assert!(PendingApproval.can_transition_to(Rejected));
        assert!(!PendingApproval.can_transition_to(Resolved));
        assert!(!PendingApproval.can_transition_to(InProgress));

        assert!(Assigned.can_transition_to(InProgress));
        assert!(Assigned.can_transition_to(Resolved));
        assert!(Assigned.can_transition_to(Suspended));
        assert!(!Assigned.can_transition_to(Rejected));

        assert!(InProgress.can_transition_to(Resolved));
        assert!(InProgress.can_transition_to(Suspended));
        assert!(Suspended.can_transition_to(InProgress));
        assert!(Suspended.can_transition_to(Resolved));

        assert!(!Resolved.can_transition_to(InProgress));
        assert!(!Rejected.can_transition_to(Assigned));
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(ReportStatus::Resolved.is_terminal());
        assert!(ReportStatus::Rejected.is_terminal());
        assert!(!ReportStatus::Suspended.is_terminal());
    }

    #[test]
    fn test_status_wire_names_round_trip() {
        for status in ReportStatus::ALL {
            assert_eq!(ReportStatus::from_name(status.as_str()), Some(status));
        }
        assert_eq!(ReportStatus::from_name("Pending Approval"), Some(ReportStatus::PendingApproval));
        assert!(ReportStatus::from_name("pending").is_none());
    }

    #[test]
    fn test_category_wire_names_round_trip() {
        for category in ReportCategory::ALL {
            assert_eq!(ReportCategory::from_name(category.as_str()), Some(category));
        }
        assert_eq!(
            ReportCategory::from_name("Water Supply - Drinking Water"),
            Some(ReportCategory::WaterSupply)
        );
        assert!(ReportCategory::from_name("Potholes").is_none());
    }

    #[test]
    fn test_status_serializes_to_wire_name() {
        let json = serde_json::to_string(&ReportStatus::InProgress).unwrap();
        assert_eq!(json, "\"In Progress\"");
        let json = serde_json::to_string(&ReportCategory::RoadSigns).unwrap();
        assert_eq!(json, "\"Road Signs and Traffic Lights\"");
    }
}
