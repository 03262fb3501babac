//! Classifier: derives category tags, job type and location type from free
//! text using ordered substring rules.
//!
//! The rule tables are immutable configuration handed to [`classify`]; the
//! function itself is pure, so identical inputs always give identical output.

use serde::Serialize;

use crate::models::job::{Category, Job, JobType, LocationType};

/// A category is assigned when the combined text contains any trigger.
pub struct CategoryRule {
    pub category: Category,
    pub triggers: &'static [&'static str],
}

/// Compound rule: at least one signal from each set must be present.
pub struct CompoundCategoryRule {
    pub category: Category,
    pub all_of: &'static [&'static [&'static str]],
}

/// Job-type rule. `contract_triggers` are also matched against the
/// provider's contract type field.
pub struct JobTypeRule {
    pub job_type: JobType,
    pub text_triggers: &'static [&'static str],
    pub contract_triggers: &'static [&'static str],
}

pub struct LocationTypeRule {
    pub location_type: LocationType,
    pub triggers: &'static [&'static str],
}

/// Full rule set. Job-type and location-type rules are evaluated in order;
/// the first match wins and the default applies when none match.
pub struct ClassificationRules {
    pub categories: &'static [CategoryRule],
    pub compound_categories: &'static [CompoundCategoryRule],
    pub job_types: &'static [JobTypeRule],
    pub default_job_type: JobType,
    pub location_types: &'static [LocationTypeRule],
    pub default_location_type: LocationType,
}

const CREATIVE_AI_SIGNALS: &[&str] = &["ai video", "ai film", "video", "creative", "ai content"];
const TECHNICAL_ROLE_SIGNALS: &[&str] = &[
    "software engineer",
    "data scientist",
    "developer",
    "programmer",
    "prompt engineer",
];

pub static DEFAULT_RULES: ClassificationRules = ClassificationRules {
    categories: &[
        CategoryRule {
            category: Category::AiVideo,
            triggers: &["video", "film", "cinemat"],
        },
        CategoryRule {
            category: Category::ThreeDDesign,
            triggers: &["3d", "three dimensional", "modeling"],
        },
        CategoryRule {
            category: Category::PostProduction,
            triggers: &["post-production", "post production", "editing", "color grade"],
        },
        CategoryRule {
            category: Category::Marketing,
            triggers: &["marketing", "campaign", "brand"],
        },
        CategoryRule {
            category: Category::Editor,
            triggers: &["editor", "edit"],
        },
        CategoryRule {
            category: Category::Creator,
            triggers: &["creator", "content creator", "ugc"],
        },
    ],
    compound_categories: &[CompoundCategoryRule {
        category: Category::Technical,
        all_of: &[CREATIVE_AI_SIGNALS, TECHNICAL_ROLE_SIGNALS],
    }],
    job_types: &[
        JobTypeRule {
            job_type: JobType::Freelance,
            text_triggers: &["freelance"],
            contract_triggers: &["freelance"],
        },
        JobTypeRule {
            job_type: JobType::Contract,
            text_triggers: &["contract"],
            contract_triggers: &["contract"],
        },
        JobTypeRule {
            job_type: JobType::Gig,
            text_triggers: &["gig", "project-based"],
            contract_triggers: &[],
        },
    ],
    default_job_type: JobType::FullTime,
    location_types: &[
        LocationTypeRule {
            location_type: LocationType::Remote,
            triggers: &["remote"],
        },
        LocationTypeRule {
            location_type: LocationType::Hybrid,
            triggers: &["hybrid"],
        },
    ],
    default_location_type: LocationType::OnSite,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub categories: Vec<Category>,
    pub job_type: JobType,
    pub location_type: LocationType,
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

/// Classifies a job from its title, description and provider contract type.
pub fn classify(
    rules: &ClassificationRules,
    title: &str,
    description: &str,
    contract_type: &str,
) -> Classification {
    let combined = format!("{} {}", title.to_lowercase(), description.to_lowercase());
    let contract_type = contract_type.to_lowercase();

    let mut categories: Vec<Category> = rules
        .categories
        .iter()
        .filter(|rule| contains_any(&combined, rule.triggers))
        .map(|rule| rule.category)
        .collect();

    for rule in rules.compound_categories {
        let matched = rule
            .all_of
            .iter()
            .all(|signals| contains_any(&combined, signals));
        if matched && !categories.contains(&rule.category) {
            categories.push(rule.category);
        }
    }

    let job_type = rules
        .job_types
        .iter()
        .find(|rule| {
            contains_any(&combined, rule.text_triggers)
                || contains_any(&contract_type, rule.contract_triggers)
        })
        .map(|rule| rule.job_type)
        .unwrap_or(rules.default_job_type);

    let location_type = rules
        .location_types
        .iter()
        .find(|rule| contains_any(&combined, rule.triggers))
        .map(|rule| rule.location_type)
        .unwrap_or(rules.default_location_type);

    Classification {
        categories,
        job_type,
        location_type,
    }
}

/// Writes the detected fields onto a freshly normalized job.
pub fn apply(rules: &ClassificationRules, mut job: Job) -> Job {
    let Classification {
        categories,
        job_type,
        location_type,
    } = classify(rules, &job.title, &job.description, &job.contract_type);

    job.detected_categories = categories;
    job.detected_job_type = job_type;
    job.detected_location_type = location_type;
    job
}
