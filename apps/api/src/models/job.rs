use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category tags derived from a job's free text. A job may carry any subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "AI Video")]
    AiVideo,
    #[serde(rename = "3D Design")]
    ThreeDDesign,
    #[serde(rename = "Post-Production")]
    PostProduction,
    Marketing,
    Editor,
    Creator,
    Technical,
}

impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Category::AiVideo => "AI Video",
            Category::ThreeDDesign => "3D Design",
            Category::PostProduction => "Post-Production",
            Category::Marketing => "Marketing",
            Category::Editor => "Editor",
            Category::Creator => "Creator",
            Category::Technical => "Technical",
        }
    }
}

/// Single-valued engagement type. Defaults to full-time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobType {
    #[default]
    #[serde(rename = "Full-time")]
    FullTime,
    Contract,
    Freelance,
    Gig,
}

impl JobType {
    pub fn label(&self) -> &'static str {
        match self {
            JobType::FullTime => "Full-time",
            JobType::Contract => "Contract",
            JobType::Freelance => "Freelance",
            JobType::Gig => "Gig",
        }
    }
}

/// Single-valued work location type. Defaults to on-site.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocationType {
    Remote,
    Hybrid,
    #[default]
    #[serde(rename = "On-site")]
    OnSite,
}

impl LocationType {
    pub fn label(&self) -> &'static str {
        match self {
            LocationType::Remote => "Remote",
            LocationType::Hybrid => "Hybrid",
            LocationType::OnSite => "On-site",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for LocationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Canonical job record. Built fresh on every search and owned by the
/// pipeline for the lifetime of one result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub title: String,
    pub company: String,
    pub description: String,
    pub location: String,
    pub created: Option<DateTime<Utc>>,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub contract_type: String,
    pub redirect_url: String,
    pub detected_categories: Vec<Category>,
    pub detected_job_type: JobType,
    pub detected_location_type: LocationType,
    /// Set exactly once, when enrichment succeeds. Terminal afterwards.
    pub expanded_description: Option<String>,
}

impl Job {
    pub fn has_category(&self, category: Category) -> bool {
        self.detected_categories.contains(&category)
    }

    /// Whitespace-delimited word count of the current description.
    pub fn word_count(&self) -> usize {
        self.description.split_whitespace().count()
    }

    pub fn is_enriched(&self) -> bool {
        self.expanded_description.is_some()
    }
}
