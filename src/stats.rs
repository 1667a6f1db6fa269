//! Per-user statistics over projects and hackathons.

use std::collections::HashSet;

use serde::Serialize;

use crate::models::{Hackathon, HackathonStatus, Membership, Project, ProjectStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UserStats {
    pub total_projects: u32,
    pub completed_projects: u32,
    pub in_progress_projects: u32,
    pub aborted_projects: u32,
    pub projects_led: u32,
    pub total_hackathons: u32,
    pub upcoming_hackathons: u32,
    pub ongoing_hackathons: u32,
    pub completed_hackathons: u32,
    pub hackathons_led: u32,
}

/// Ids of entities `user_id` created or belongs to.
fn involved_ids<'a>(
    created: impl Iterator<Item = (&'a str, &'a str)>,
    memberships: &'a [Membership],
    user_id: &str,
) -> HashSet<&'a str> {
    created
        .filter(|(_, created_by)| *created_by == user_id)
        .map(|(id, _)| id)
        .chain(
            memberships
                .iter()
                .filter(|m| m.user_id == user_id)
                .map(|m| m.entity_id.as_str()),
        )
        .collect()
}

fn count_led(memberships: &[Membership], user_id: &str) -> u32 {
    memberships
        .iter()
        .filter(|m| m.user_id == user_id && m.role.is_lead())
        .count() as u32
}

/// Aggregate statistics for `user_id`.
///
/// Pure: the result depends only on the arguments. Memberships pointing at
/// entities missing from the entity lists add nothing to totals; led counts are
/// taken from the memberships directly.
pub fn compute_stats(
    user_id: &str,
    projects: &[Project],
    project_memberships: &[Membership],
    hackathons: &[Hackathon],
    hackathon_memberships: &[Membership],
) -> UserStats {
    let mut stats = UserStats::default();

    let my_project_ids = involved_ids(
        projects.iter().map(|p| (p.id.as_str(), p.created_by.as_str())),
        project_memberships,
        user_id,
    );
    for project in projects.iter().filter(|p| my_project_ids.contains(p.id.as_str())) {
        stats.total_projects += 1;
        match project.status {
            ProjectStatus::Completed => stats.completed_projects += 1,
            ProjectStatus::InProgress => stats.in_progress_projects += 1,
            ProjectStatus::Aborted => stats.aborted_projects += 1,
        }
    }
    stats.projects_led = count_led(project_memberships, user_id);

    let my_hackathon_ids = involved_ids(
        hackathons.iter().map(|h| (h.id.as_str(), h.created_by.as_str())),
        hackathon_memberships,
        user_id,
    );
    for hackathon in hackathons
        .iter()
        .filter(|h| my_hackathon_ids.contains(h.id.as_str()))
    {
        stats.total_hackathons += 1;
        match hackathon.status {
            HackathonStatus::Upcoming => stats.upcoming_hackathons += 1,
            HackathonStatus::Ongoing => stats.ongoing_hackathons += 1,
            HackathonStatus::Completed => stats.completed_hackathons += 1,
        }
    }
    stats.hackathons_led = count_led(hackathon_memberships, user_id);

    stats
}
