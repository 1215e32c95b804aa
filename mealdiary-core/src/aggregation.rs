//! Meal aggregation.
//!
//! Resolves the meal entries of one (user, date, meal type) into view
//! entries. Each entry either embeds a food snapshot or points at a set;
//! set references are deduplicated and each set is fetched once, then every
//! entry is tagged `"food"` or `"set"` with its resolved value attached.

use std::collections::HashMap;

use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::StoreResult;
use crate::models::{
    Food, MealEntry, MealEntryDocument, MealSet, MealSource, MealType, Nutrition,
};
use crate::path::{self, DocPath};
use crate::store::{
    combine_latest, decode, switch_map, watch_document, watch_query, LiveStream, Query,
    SharedStore, Snapshot, Subscription,
};

/// How food entries are merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeMode {
    /// Attach only the entry's own food.
    #[default]
    OwnFood,
    /// Attach every standalone food of the meal to each food entry, as older
    /// clients did.
    LegacyUnion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MealKind {
    Food,
    Set,
}

impl MealKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MealKind::Food => "food",
            MealKind::Set => "set",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MealValue {
    Food(Food),
    /// Only produced by [`MergeMode::LegacyUnion`].
    Foods(Vec<Food>),
    /// `None` when the set no longer exists.
    Set(Option<MealSet>),
}

/// A meal entry with its food or set attached.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMeal {
    pub meal_id: String,
    pub amount: f64,
    pub value: MealValue,
}

impl ResolvedMeal {
    pub fn kind(&self) -> MealKind {
        match self.value {
            MealValue::Food(_) | MealValue::Foods(_) => MealKind::Food,
            MealValue::Set(_) => MealKind::Set,
        }
    }

    pub fn set(&self) -> Option<&MealSet> {
        match &self.value {
            MealValue::Set(set) => set.as_ref(),
            _ => None,
        }
    }

    pub fn food(&self) -> Option<&Food> {
        match &self.value {
            MealValue::Food(food) => Some(food),
            _ => None,
        }
    }

    /// What this entry contributes to the day: the food's per-100 g values
    /// for `amount` grams, or the set's total times `amount` servings.
    ///
    /// `None` for a set that no longer exists and for the shared food list
    /// of [`MergeMode::LegacyUnion`].
    pub fn nutrition(&self) -> Option<Nutrition> {
        match &self.value {
            MealValue::Food(food) => Some(food.nutrition.for_amount(self.amount)),
            MealValue::Foods(_) => None,
            MealValue::Set(set) => set.as_ref().map(|s| s.nutrition().scaled(self.amount)),
        }
    }
}

impl Serialize for ResolvedMeal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ResolvedMeal", 4)?;
        state.serialize_field("mealId", &self.meal_id)?;
        state.serialize_field("amount", &self.amount)?;
        state.serialize_field("kind", &self.kind())?;
        state.serialize_field("value", &self.value)?;
        state.end()
    }
}

/// Converts raw meal documents into entries, skipping any that fail to decode
/// or break the exactly-one-reference rule.
pub fn parse_entries(snapshots: &[Snapshot]) -> Vec<MealEntry> {
    snapshots
        .iter()
        .filter_map(|snapshot| {
            let doc: MealEntryDocument = match serde_json::from_value(snapshot.data.clone()) {
                Ok(doc) => doc,
                Err(e) => {
                    tracing::warn!(path = %snapshot.path, error = %e, "skipping undecodable meal entry");
                    return None;
                }
            };
            match MealEntry::try_from(doc) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!(path = %snapshot.path, "skipping meal entry: {}", e);
                    None
                }
            }
        })
        .collect()
}

/// Set IDs referenced by `entries`, each once, in order of first reference.
pub fn distinct_set_ids(entries: &[MealEntry]) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for id in entries.iter().filter_map(MealEntry::set_id) {
        if !ids.iter().any(|seen| seen == id) {
            ids.push(id.to_string());
        }
    }
    ids
}

/// Attaches resolved values to `entries`, preserving their order.
///
/// Sets missing from `sets` resolve to an absent placeholder.
pub fn merge_meals(
    entries: &[MealEntry],
    sets: &HashMap<String, MealSet>,
    mode: MergeMode,
) -> Vec<ResolvedMeal> {
    let standalone: Vec<Food> = match mode {
        MergeMode::OwnFood => Vec::new(),
        MergeMode::LegacyUnion => entries
            .iter()
            .filter_map(MealEntry::embedded_food)
            .cloned()
            .collect(),
    };

    entries
        .iter()
        .map(|entry| {
            let value = match (&entry.source, mode) {
                (MealSource::Set(set_id), _) => MealValue::Set(sets.get(set_id).cloned()),
                (MealSource::Food(food), MergeMode::OwnFood) => MealValue::Food(food.clone()),
                (MealSource::Food(_), MergeMode::LegacyUnion) => {
                    MealValue::Foods(standalone.clone())
                }
            };
            ResolvedMeal {
                meal_id: entry.meal_id.clone(),
                amount: entry.amount,
                value,
            }
        })
        .collect()
}

fn decode_set(path: &DocPath, value: Option<Value>) -> Option<MealSet> {
    let value = value?;
    match decode(path, value) {
        Ok(set) => Some(set),
        Err(e) => {
            tracing::warn!(error = %e, "treating undecodable set as missing");
            None
        }
    }
}

/// Reads meal entries and the sets they reference.
#[derive(Clone)]
pub struct MealAggregator {
    store: SharedStore,
    mode: MergeMode,
}

impl MealAggregator {
    pub fn new(store: SharedStore) -> Self {
        Self {
            store,
            mode: MergeMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: MergeMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> MergeMode {
        self.mode
    }

    /// One-shot read of the resolved meal.
    pub async fn resolve(
        &self,
        user_id: &str,
        date: NaiveDate,
        meal_type: MealType,
    ) -> StoreResult<Vec<ResolvedMeal>> {
        let query = Query::new(path::meals(user_id, date, meal_type)?);
        let snapshots = self.store.query(&query).await?;
        let entries = parse_entries(&snapshots);
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let mut sets = HashMap::new();
        for set_id in distinct_set_ids(&entries) {
            let set_path = match path::set(user_id, &set_id) {
                Ok(p) => p,
                Err(e) => {
                    tracing::warn!(set_id = %set_id, "unresolvable set reference: {}", e);
                    continue;
                }
            };
            if let Some(set) = decode_set(&set_path, self.store.get(&set_path).await?) {
                sets.insert(set_id, set);
            }
        }

        tracing::debug!(
            user_id,
            %date,
            meal = %meal_type,
            entries = entries.len(),
            sets = sets.len(),
            "resolved meal"
        );
        Ok(merge_meals(&entries, &sets, self.mode))
    }

    /// Live resolved meal.
    ///
    /// Re-emits whenever the meal collection or any referenced set changes.
    /// When the collection changes, the set watches for the previous
    /// snapshot are dropped and new ones are opened.
    pub fn watch(
        &self,
        user_id: &str,
        date: NaiveDate,
        meal_type: MealType,
    ) -> StoreResult<LiveStream<Vec<ResolvedMeal>>> {
        let query = Query::new(path::meals(user_id, date, meal_type)?);
        let store = self.store.clone();
        let mode = self.mode;
        let user_id = user_id.to_string();

        let outer = watch_query(store.clone(), query);
        Ok(switch_map(outer, move |snapshots| {
            let entries = parse_entries(&snapshots);
            let watches: Vec<LiveStream<(String, Option<MealSet>)>> = distinct_set_ids(&entries)
                .into_iter()
                .map(|set_id| match path::set(&user_id, &set_id) {
                    Ok(set_path) => watch_document(store.clone(), set_path.clone())
                        .map(move |item| {
                            item.map(|value| (set_id.clone(), decode_set(&set_path, value)))
                        })
                        .boxed(),
                    Err(e) => {
                        tracing::warn!(set_id = %set_id, "unresolvable set reference: {}", e);
                        stream::once(async move { Ok((set_id, None)) }).boxed()
                    }
                })
                .collect();

            combine_latest(watches)
                .map(move |item| {
                    item.map(|resolved| {
                        let sets: HashMap<String, MealSet> = resolved
                            .into_iter()
                            .filter_map(|(id, set)| set.map(|s| (id, s)))
                            .collect();
                        merge_meals(&entries, &sets, mode)
                    })
                })
                .boxed()
        }))
    }

    /// [`watch`](Self::watch) driven by a background task. Dispose the
    /// returned handle to close every watch it opened.
    pub fn subscribe(
        &self,
        user_id: &str,
        date: NaiveDate,
        meal_type: MealType,
    ) -> StoreResult<Subscription<StoreResult<Vec<ResolvedMeal>>>> {
        Ok(Subscription::spawn(self.watch(user_id, date, meal_type)?))
    }
}
