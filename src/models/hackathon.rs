use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

use super::Entity;
use crate::tech_stack::TechStackInput;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HackathonStatus {
    #[default]
    Upcoming,
    Ongoing,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hackathon {
    pub id: String,
    pub title: String,
    pub short_description: Option<String>,
    pub problem_statement: Option<String>,
    pub solution_description: Option<String>,
    pub tech_stack: Vec<String>,
    pub github_url: Option<String>,
    pub deployed_url: Option<String>,
    pub download_url: Option<String>,
    pub qr_code_url: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: HackathonStatus,
    pub created_by: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Entity for Hackathon {
    fn id(&self) -> &str {
        &self.id
    }

    fn created_by(&self) -> &str {
        &self.created_by
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateHackathon {
    pub title: String,
    #[serde(default)]
    pub short_description: Option<String>,
    #[serde(default)]
    pub problem_statement: Option<String>,
    #[serde(default)]
    pub solution_description: Option<String>,
    #[serde(default)]
    pub tech_stack: TechStackInput,
    #[serde(default)]
    pub github_url: Option<String>,
    #[serde(default)]
    pub deployed_url: Option<String>,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub qr_code_url: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: HackathonStatus,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateHackathon {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub short_description: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub problem_statement: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub solution_description: Option<Option<String>>,
    pub tech_stack: Option<TechStackInput>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub github_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub deployed_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub download_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub qr_code_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub start_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub end_date: Option<Option<NaiveDate>>,
    pub status: Option<HackathonStatus>,
}

/// Link between a hackathon and a project submitted to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HackathonProject {
    pub id: String,
    pub hackathon_id: String,
    pub project_id: String,
    pub created_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct LinkHackathonProject {
    pub project_id: String,
}

/// `end` may not precede `start`. Either side may be open.
pub fn check_date_range(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<(), String> {
    match (start, end) {
        (Some(start), Some(end)) if end < start => {
            Err("End date cannot be before start date".into())
        }
        _ => Ok(()),
    }
}

impl CreateHackathon {
    pub fn normalize(&mut self) {
        for field in [
            &mut self.short_description,
            &mut self.problem_statement,
            &mut self.solution_description,
            &mut self.github_url,
            &mut self.deployed_url,
            &mut self.download_url,
            &mut self.qr_code_url,
        ] {
            super::clear_blank(field);
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        super::check_title(&self.title)?;
        check_date_range(self.start_date, self.end_date)
    }
}

impl UpdateHackathon {
    pub fn normalize(&mut self) {
        for field in [
            &mut self.short_description,
            &mut self.problem_statement,
            &mut self.solution_description,
            &mut self.github_url,
            &mut self.deployed_url,
            &mut self.download_url,
            &mut self.qr_code_url,
        ] {
            if let Some(value) = field {
                super::clear_blank(value);
            }
        }
    }

    /// Validate against the stored row, since the update may change only one
    /// of the two dates.
    pub fn validate(&self, existing: &Hackathon) -> Result<(), String> {
        if let Some(ref title) = self.title {
            super::check_title(title)?;
        }
        check_date_range(
            self.start_date.unwrap_or(existing.start_date),
            self.end_date.unwrap_or(existing.end_date),
        )
    }
}
