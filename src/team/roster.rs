//! In-memory roster of one entity's team members.
//!
//! All roster invariants are checked here before anything is written:
//! - at most one member holds [`TeamRole::TeamLead`]
//! - a user appears at most once
//!
//! A rejected operation leaves the roster untouched. The same type serves
//! projects and hackathons; [`EntityKind`] only tags which one it is.

use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{EntityKind, Membership, Profile, TeamRole};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MembershipError {
    #[error(
        "A {0} can only have one Team Lead. Please change the existing Team Lead's role first."
    )]
    TeamLeadTaken(&'static str),
    #[error("This user is already a team member.")]
    AlreadyMember,
    #[error("Team member not found")]
    MemberNotFound,
}

#[derive(Debug, Clone)]
pub struct Roster {
    kind: EntityKind,
    entity_id: String,
    members: Vec<Membership>,
}

impl Roster {
    pub fn new(kind: EntityKind, entity_id: impl Into<String>, members: Vec<Membership>) -> Self {
        Self {
            kind,
            entity_id: entity_id.into(),
            members,
        }
    }

    pub fn members(&self) -> &[Membership] {
        &self.members
    }

    pub fn get(&self, member_id: &str) -> Option<&Membership> {
        self.members.iter().find(|m| m.id == member_id)
    }

    pub fn team_lead(&self) -> Option<&Membership> {
        self.members.iter().find(|m| m.role.is_lead())
    }

    pub fn contains_user(&self, user_id: &str) -> bool {
        self.members.iter().any(|m| m.user_id == user_id)
    }

    /// Check whether `user_id` could join with `role`.
    pub fn check_add(&self, user_id: &str, role: TeamRole) -> Result<(), MembershipError> {
        if role.is_lead() && self.team_lead().is_some() {
            return Err(MembershipError::TeamLeadTaken(self.kind.label()));
        }
        if self.contains_user(user_id) {
            return Err(MembershipError::AlreadyMember);
        }
        Ok(())
    }

    /// Append a new membership for `user_id`. Returns the appended record.
    pub fn add(&mut self, user_id: &str, role: TeamRole) -> Result<&Membership, MembershipError> {
        self.check_add(user_id, role)?;

        self.members.push(Membership {
            id: Uuid::new_v4().to_string(),
            entity_id: self.entity_id.clone(),
            user_id: user_id.to_string(),
            role,
            is_lead: role.is_lead(),
            created_at: Utc::now().timestamp(),
        });

        let last = self.members.len() - 1;
        Ok(&self.members[last])
    }

    /// Check whether member `member_id` could take `role`.
    pub fn check_role_update(&self, member_id: &str, role: TeamRole) -> Result<(), MembershipError> {
        if self.get(member_id).is_none() {
            return Err(MembershipError::MemberNotFound);
        }
        if role.is_lead() && self.team_lead().is_some_and(|lead| lead.id != member_id) {
            return Err(MembershipError::TeamLeadTaken(self.kind.label()));
        }
        Ok(())
    }

    /// Replace one member's role in place.
    pub fn update_role(
        &mut self,
        member_id: &str,
        role: TeamRole,
    ) -> Result<&Membership, MembershipError> {
        self.check_role_update(member_id, role)?;

        let member = self
            .members
            .iter_mut()
            .find(|m| m.id == member_id)
            .ok_or(MembershipError::MemberNotFound)?;
        member.role = role;
        member.is_lead = role.is_lead();
        Ok(member)
    }

    /// Remove one member. A missing id is a no-op and returns `None`.
    pub fn remove(&mut self, member_id: &str) -> Option<Membership> {
        let index = self.members.iter().position(|m| m.id == member_id)?;
        Some(self.members.remove(index))
    }

    /// Profiles that are not on this roster yet, in input order.
    pub fn available_profiles<'a>(&self, profiles: &'a [Profile]) -> Vec<&'a Profile> {
        profiles
            .iter()
            .filter(|p| !self.contains_user(&p.id))
            .collect()
    }
}
