use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use super::Profile;

/// Closed role vocabulary for team rosters. Doubles as the UI choice list.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, Display,
    EnumIter, EnumString,
)]
pub enum TeamRole {
    #[serde(rename = "Team Lead")]
    #[strum(serialize = "Team Lead")]
    TeamLead,
    #[default]
    #[serde(rename = "Frontend Developer")]
    #[strum(serialize = "Frontend Developer")]
    FrontendDeveloper,
    #[serde(rename = "Backend Developer")]
    #[strum(serialize = "Backend Developer")]
    BackendDeveloper,
    #[serde(rename = "Full Stack Developer")]
    #[strum(serialize = "Full Stack Developer")]
    FullStackDeveloper,
    Designer,
    Other,
}

impl TeamRole {
    pub fn is_lead(&self) -> bool {
        matches!(self, TeamRole::TeamLead)
    }
}

/// Which kind of entity a roster belongs to.
///
/// Projects and hackathons share one membership implementation; the kind only
/// selects the tables and the foreign-key column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Project,
    Hackathon,
}

impl EntityKind {
    pub fn entity_table(&self) -> &'static str {
        match self {
            EntityKind::Project => "projects",
            EntityKind::Hackathon => "hackathons",
        }
    }

    pub fn member_table(&self) -> &'static str {
        match self {
            EntityKind::Project => "project_members",
            EntityKind::Hackathon => "hackathon_members",
        }
    }

    /// Column on the member table referencing the owning entity.
    pub fn fk_column(&self) -> &'static str {
        match self {
            EntityKind::Project => "project_id",
            EntityKind::Hackathon => "hackathon_id",
        }
    }

    /// Human-readable name used in error messages.
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Project => "project",
            EntityKind::Hackathon => "hackathon",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub id: String,
    pub entity_id: String,
    pub user_id: String,
    pub role: TeamRole,
    /// Derived from `role`, kept in sync by the roster.
    pub is_lead: bool,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MembershipWithProfile {
    #[serde(flatten)]
    pub membership: Membership,
    /// Missing when the member's profile could not be loaded.
    pub profile: Option<Profile>,
}

#[derive(Debug, Deserialize)]
pub struct CreateMember {
    pub user_id: String,
    #[serde(default)]
    pub role: TeamRole,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMember {
    pub role: TeamRole,
}
