//! Post plans: draft normalisation, upsert/ordering rules, and the JSON
//! document shape shared by persistence, export and import.

use crate::catalog::ImageEntry;
use crate::database::{Database, StoreError};
use crate::suggest::{SuggestMode, SuggestionResult};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::RwLock;

/// Namespaced key the plan document is stored under.
pub const PLANS_STORAGE_KEY: &str = "ig-planner.v1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPlan {
    pub image_id: String,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub hashtags: String,
    #[serde(default)]
    pub scheduled_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Form state for the plan being edited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanDraft {
    pub image_id: String,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub hashtags: String,
    #[serde(default)]
    pub scheduled_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanDocument {
    pub plans: Vec<PostPlan>,
}

/// Plan enriched with catalog metadata for portable exports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedPlan {
    pub image_id: String,
    pub source: Option<String>,
    pub image_name: Option<String>,
    pub image_path: Option<String>,
    pub caption: String,
    pub hashtags: String,
    pub scheduled_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportDocument {
    pub plans: Vec<ExportedPlan>,
}

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Invalid JSON file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid JSON file: expected a \"plans\" array")]
    MissingPlans,
    #[error("Invalid JSON file: more than one plan for image {0}")]
    DuplicateImage(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("Select an image first.")]
    MissingImage,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Splits on whitespace and commas and prefixes every token with `#`.
pub fn normalize_hashtags(raw: &str) -> String {
    raw.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .map(|token| {
            if token.starts_with('#') {
                token.to_string()
            } else {
                format!("#{}", token)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Copies the non-empty suggested fields the mode asked for into `draft`.
pub fn apply_suggestion(draft: &mut PlanDraft, mode: SuggestMode, suggestion: &SuggestionResult) {
    let caption = suggestion.caption.trim();
    if mode.wants_caption() && !caption.is_empty() {
        draft.caption = caption.to_string();
    }
    if mode.wants_hashtags() && !suggestion.hashtags.trim().is_empty() {
        draft.hashtags = normalize_hashtags(&suggestion.hashtags);
    }
}

fn parse_schedule(value: &str) -> Option<NaiveDateTime> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc).naive_utc());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
}

/// Scheduled plans first, ascending by time; values that are not a
/// recognisable timestamp follow in string order; unscheduled plans last.
pub fn compare_schedule(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => match (parse_schedule(a), parse_schedule(b)) {
            (Some(left), Some(right)) => left.cmp(&right),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.cmp(b),
        },
    }
}

pub fn sort_plans(plans: &mut [PostPlan]) {
    plans.sort_by(|a, b| compare_schedule(a.scheduled_at.as_deref(), b.scheduled_at.as_deref()));
}

/// Replaces the plan for the same image in place, or appends a new one.
pub fn upsert_plan(plans: &mut Vec<PostPlan>, plan: PostPlan) {
    match plans.iter_mut().find(|existing| existing.image_id == plan.image_id) {
        Some(existing) => *existing = plan,
        None => plans.push(plan),
    }
}

pub fn plan_from_draft(draft: &PlanDraft, now: DateTime<Utc>) -> PostPlan {
    PostPlan {
        image_id: draft.image_id.trim().to_string(),
        caption: draft.caption.trim().to_string(),
        hashtags: normalize_hashtags(&draft.hashtags),
        scheduled_at: draft
            .scheduled_at
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string),
        updated_at: Some(now.to_rfc3339_opts(SecondsFormat::Millis, true)),
    }
}

pub fn export_document(plans: &[PostPlan], catalog: &[ImageEntry]) -> ExportDocument {
    let plans = plans
        .iter()
        .map(|plan| {
            let image = catalog.iter().find(|entry| entry.id == plan.image_id);
            ExportedPlan {
                image_id: plan.image_id.clone(),
                source: image.map(|entry| entry.source.clone()),
                image_name: image.map(|entry| entry.name.clone()),
                image_path: image.map(|entry| entry.path.clone()),
                caption: plan.caption.clone(),
                hashtags: plan.hashtags.clone(),
                scheduled_at: plan.scheduled_at.clone(),
                updated_at: plan.updated_at.clone(),
            }
        })
        .collect();
    ExportDocument { plans }
}

/// Validates an import document without touching any state.
pub fn parse_import(raw: &str) -> Result<Vec<PostPlan>, ImportError> {
    let document: Value = serde_json::from_str(raw)?;
    let plans = document.get("plans").ok_or(ImportError::MissingPlans)?;
    if !plans.is_array() {
        return Err(ImportError::MissingPlans);
    }
    let mut plans: Vec<PostPlan> = serde_json::from_value(plans.clone())?;
    {
        let mut seen = HashSet::new();
        if let Some(duplicate) = plans.iter().find(|plan| !seen.insert(plan.image_id.as_str())) {
            return Err(ImportError::DuplicateImage(duplicate.image_id.clone()));
        }
    }
    sort_plans(&mut plans);
    Ok(plans)
}

/// The in-memory plan queue, mirrored to the store on every change.
pub struct PlanBook {
    db: Database,
    plans: RwLock<Vec<PostPlan>>,
}

impl PlanBook {
    /// Loads the stored queue; unreadable data starts an empty queue.
    pub fn open(db: Database) -> Self {
        let plans = match db.get_value(PLANS_STORAGE_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<PlanDocument>(&raw) {
                Ok(document) => document.plans,
                Err(error) => {
                    log::warn!("Failed to parse stored plans, starting empty: {}", error);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(error) => {
                log::warn!("Failed to load stored plans, starting empty: {}", error);
                Vec::new()
            }
        };
        log::info!("Loaded {} stored plans", plans.len());

        PlanBook {
            db,
            plans: RwLock::new(plans),
        }
    }

    pub fn list(&self) -> Vec<PostPlan> {
        self.plans
            .read()
            .map(|plans| plans.clone())
            .unwrap_or_default()
    }

    pub fn save_draft(&self, draft: &PlanDraft) -> Result<PostPlan, PlanError> {
        let plan = plan_from_draft(draft, Utc::now());
        if plan.image_id.is_empty() {
            return Err(PlanError::MissingImage);
        }

        let mut plans = self.write_lock()?;
        let mut next = plans.clone();
        upsert_plan(&mut next, plan.clone());
        sort_plans(&mut next);
        self.persist(&next)?;
        *plans = next;
        Ok(plan)
    }

    /// Returns whether a plan for `image_id` existed.
    pub fn delete(&self, image_id: &str) -> Result<bool, PlanError> {
        let mut plans = self.write_lock()?;
        let next: Vec<PostPlan> = plans
            .iter()
            .filter(|plan| plan.image_id != image_id)
            .cloned()
            .collect();
        if next.len() == plans.len() {
            return Ok(false);
        }
        self.persist(&next)?;
        *plans = next;
        Ok(true)
    }

    /// Replaces the whole queue; on any failure the current queue stays.
    pub fn import(&self, raw: &str) -> Result<usize, ImportError> {
        let imported = parse_import(raw)?;
        let mut plans = self.write_lock()?;
        self.persist(&imported)?;
        let count = imported.len();
        *plans = imported;
        Ok(count)
    }

    pub fn export(&self, catalog: &[ImageEntry]) -> ExportDocument {
        export_document(&self.list(), catalog)
    }

    fn persist(&self, plans: &[PostPlan]) -> Result<(), StoreError> {
        let document = serde_json::to_string(&PlanDocument {
            plans: plans.to_vec(),
        })?;
        self.db.set_value(PLANS_STORAGE_KEY, &document)
    }

    fn write_lock(&self) -> Result<std::sync::RwLockWriteGuard<'_, Vec<PostPlan>>, StoreError> {
        self.plans
            .write()
            .map_err(|_| StoreError::Poisoned("plan queue".to_string()))
    }
}
