//! Normalizer: structural mapping from provider payloads to the canonical
//! [`Job`]. No classification happens here; detected fields are left at
//! their defaults for the classifier to fill in.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use scraper::Html;
use serde_json::Value;

use crate::discovery::providers::{AdzunaJob, JoobleJob, RawProviderRecord};
use crate::models::job::{Job, JobType, LocationType};

pub fn normalize(record: RawProviderRecord) -> Job {
    match record {
        RawProviderRecord::Adzuna(job) => normalize_adzuna(job),
        RawProviderRecord::Jooble(job) => normalize_jooble(job),
    }
}

pub fn normalize_adzuna(raw: AdzunaJob) -> Job {
    // Without an upstream id the listing URL is the only stable key.
    let id = raw
        .id
        .or_else(|| raw.redirect_url.clone())
        .unwrap_or_default();
    Job {
        id: format!("adzuna-{id}"),
        title: raw.title.map(|t| strip_html(&t)).unwrap_or_default(),
        company: raw
            .company
            .and_then(|c| c.display_name)
            .unwrap_or_default(),
        description: raw.description.map(|d| strip_html(&d)).unwrap_or_default(),
        location: raw
            .location
            .and_then(|l| l.display_name)
            .unwrap_or_default(),
        created: raw.created.as_deref().and_then(parse_timestamp),
        salary_min: raw.salary_min,
        salary_max: raw.salary_max,
        contract_type: raw
            .contract_type
            .or(raw.contract_time)
            .unwrap_or_default(),
        redirect_url: raw.redirect_url.unwrap_or_default(),
        ..blank_job()
    }
}

pub fn normalize_jooble(raw: JoobleJob) -> Job {
    let id = match raw.id {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => raw.link.clone().unwrap_or_default(),
    };
    let (salary_min, salary_max) = raw
        .salary
        .as_deref()
        .map(parse_salary_range)
        .unwrap_or((None, None));

    Job {
        id: format!("jooble-{id}"),
        title: raw.title.map(|t| strip_html(&t)).unwrap_or_default(),
        company: raw.company.unwrap_or_default(),
        description: raw.snippet.map(|s| strip_html(&s)).unwrap_or_default(),
        location: raw.location.unwrap_or_default(),
        created: raw.updated.as_deref().and_then(parse_timestamp),
        salary_min,
        salary_max,
        contract_type: raw.job_type.unwrap_or_default(),
        redirect_url: raw.link.unwrap_or_default(),
        ..blank_job()
    }
}

fn blank_job() -> Job {
    Job {
        id: String::new(),
        title: String::new(),
        company: String::new(),
        description: String::new(),
        location: String::new(),
        created: None,
        salary_min: None,
        salary_max: None,
        contract_type: String::new(),
        redirect_url: String::new(),
        detected_categories: Vec::new(),
        detected_job_type: JobType::default(),
        detected_location_type: LocationType::default(),
        expanded_description: None,
    }
}

/// Accepts RFC 3339, offset-less ISO date-times (treated as UTC) and bare
/// dates. Anything else is treated as absent.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Extracts a (min, max) pair from free-text salary such as
/// "$50k - $65k" or "$45 per hour". A single figure fills both bounds.
pub fn parse_salary_range(raw: &str) -> (Option<f64>, Option<f64>) {
    let mut figures = Vec::new();
    let mut chars = raw.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        if !c.is_ascii_digit() {
            continue;
        }
        let mut end = start + c.len_utf8();
        while let Some(&(idx, next)) = chars.peek() {
            if next.is_ascii_digit() || next == ',' || next == '.' {
                end = idx + next.len_utf8();
                chars.next();
            } else {
                break;
            }
        }

        let digits: String = raw[start..end]
            .trim_end_matches(['.', ','])
            .chars()
            .filter(|c| *c != ',')
            .collect();
        let Ok(mut value) = digits.parse::<f64>() else {
            continue;
        };
        if matches!(chars.peek(), Some((_, 'k')) | Some((_, 'K'))) {
            value *= 1000.0;
        }
        figures.push(value);
    }

    match figures.as_slice() {
        [] => (None, None),
        [only] => (Some(*only), Some(*only)),
        [first, .., last] => (Some(first.min(*last)), Some(first.max(*last))),
    }
}

/// Plain text of an HTML fragment: tags dropped, entities decoded once,
/// whitespace collapsed. A bare `<` in prose stays as text.
pub fn strip_html(raw: &str) -> String {
    let fragment = Html::parse_fragment(raw);
    let text = fragment.root_element().text().collect::<Vec<_>>().join(" ");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
