use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

use super::Entity;
use crate::tech_stack::TechStackInput;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProjectStatus {
    Completed,
    #[default]
    InProgress,
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
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
    pub status: ProjectStatus,
    pub created_by: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Entity for Project {
    fn id(&self) -> &str {
        &self.id
    }

    fn created_by(&self) -> &str {
        &self.created_by
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateProject {
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
    pub status: ProjectStatus,
}

/// Nullable fields use `Option<Option<T>>`:
/// None = leave unchanged, Some(None) = clear, Some(Some(v)) = set.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProject {
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
    pub status: Option<ProjectStatus>,
}

impl CreateProject {
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
        super::check_title(&self.title)
    }
}

impl UpdateProject {
    /// A blank value clears the field.
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

    pub fn validate(&self) -> Result<(), String> {
        match self.title {
            Some(ref title) => super::check_title(title),
            None => Ok(()),
        }
    }
}
