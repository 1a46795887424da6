//! Denormalizes parsed workout trees into four flat, FK-linked row
//! collections ready for relational storage.
//!
//! Input is raw JSON rather than the parser structs so that pages scraped by
//! older builds (or enriched with link-page date fields) flatten the same way.
//! Numeric fields arrive as the scraped digit strings and are integer-parsed
//! here; anything non-numeric flattens to NULL rather than an error.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::identity::IdentityEncoder;

/// The four levels of the workout tree, top to bottom. Each level knows the
/// JSON field holding its children; the foreign keys themselves are typed
/// fields on the row structs below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeLevel {
    Workouts,
    WorkoutComponents,
    Sets,
    SetComponents,
}

impl TreeLevel {
    pub fn child_field(self) -> Option<&'static str> {
        match self {
            TreeLevel::Workouts => Some("workout_components"),
            TreeLevel::WorkoutComponents => Some("sets"),
            TreeLevel::Sets => Some("set_components"),
            TreeLevel::SetComponents => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkoutRow {
    pub workout_id: String,
    pub name: Option<String>,
    pub created_at: Option<String>,
    pub created_by: Option<String>,
    pub duration: Option<i64>,
    pub cardio_duration: Option<i64>,
    pub energy_level: Option<i64>,
    pub self_rating: Option<i64>,
    /// Muscle names ";"-joined, the storage form of the scraped list.
    pub muscles_used: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkoutComponentRow {
    pub workout_component_id: String,
    pub workout_id: String,
    pub sequence: Option<i64>,
    pub rest_time: Option<i64>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SetRow {
    pub set_id: String,
    pub workout_component_id: String,
    pub sequence: Option<i64>,
    pub rest_time: Option<i64>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SetComponentRow {
    pub set_component_id: String,
    pub set_id: String,
    pub sequence: Option<i64>,
    pub weight_metric: Option<String>,
    pub weight: Option<i64>,
    pub reps: Option<i64>,
    pub rest_time: Option<i64>,
    pub exercise_link: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Default)]
pub struct FlatTables {
    pub workouts: Vec<WorkoutRow>,
    pub workout_components: Vec<WorkoutComponentRow>,
    pub sets: Vec<SetRow>,
    pub set_components: Vec<SetComponentRow>,
}

fn children<'a>(node: &'a Value, level: TreeLevel) -> &'a [Value] {
    level
        .child_field()
        .and_then(|field| node.get(field))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn str_field(node: &Value, key: &str) -> Option<String> {
    node.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Digit-string-or-number to integer; anything else is NULL. Strings must be
/// all ASCII digits, so "12.5" and "8 or so" both flatten to NULL.
fn int_field(node: &Value, key: &str) -> Option<i64> {
    match node.get(key)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => {
            s.parse().ok()
        }
        _ => None,
    }
}

fn month_number(month: &str) -> Option<u32> {
    let lower = month.to_lowercase();
    let number = match lower.get(0..3)? {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(number)
}

/// Combines the link-page date fields (`month`, `month_date`, `year`) into
/// "YYYY-MM-DD HH:MM:SS". Pages scraped without link metadata have no date
/// and yield `None`.
fn created_at_from_raw(workout: &Value) -> Option<String> {
    let month = str_field(workout, "month")?;
    let day = int_field(workout, "month_date")?;
    let year = int_field(workout, "year")?;

    let date = NaiveDate::from_ymd_opt(year as i32, month_number(&month)?, day as u32)?;
    let timestamp = date.and_hms_opt(0, 0, 0)?;
    Some(timestamp.format("%Y-%m-%d %H:%M:%S").to_string())
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Flattens parsed workout trees into the four tables, minting a v4 UUID per
/// row and carrying the workout's `created_at` down to every descendant.
pub fn flatten_workout_tree(workouts: &[Value], encoder: &dyn IdentityEncoder) -> FlatTables {
    let mut tables = FlatTables::default();

    for workout in workouts {
        let workout_id = new_id();
        let created_at = created_at_from_raw(workout);
        let created_by = str_field(workout, "username").map(|u| encoder.encode(&u));
        let muscles_used = workout
            .get("muscles_used")
            .and_then(Value::as_array)
            .map(|muscles| {
                muscles
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(";")
            });

        tables.workouts.push(WorkoutRow {
            workout_id: workout_id.clone(),
            name: str_field(workout, "name"),
            created_at: created_at.clone(),
            created_by,
            duration: int_field(workout, "duration"),
            cardio_duration: int_field(workout, "cardio_duration"),
            energy_level: int_field(workout, "energy_level"),
            self_rating: int_field(workout, "self_rating"),
            muscles_used,
            url: str_field(workout, "url"),
        });

        for component in children(workout, TreeLevel::Workouts) {
            let workout_component_id = new_id();
            tables.workout_components.push(WorkoutComponentRow {
                workout_component_id: workout_component_id.clone(),
                workout_id: workout_id.clone(),
                sequence: int_field(component, "sequence"),
                rest_time: int_field(component, "rest_time"),
                created_at: created_at.clone(),
            });

            for set in children(component, TreeLevel::WorkoutComponents) {
                let set_id = new_id();
                tables.sets.push(SetRow {
                    set_id: set_id.clone(),
                    workout_component_id: workout_component_id.clone(),
                    sequence: int_field(set, "sequence"),
                    rest_time: int_field(set, "rest_time"),
                    kind: str_field(set, "type"),
                    created_at: created_at.clone(),
                });

                for set_component in children(set, TreeLevel::Sets) {
                    tables.set_components.push(SetComponentRow {
                        set_component_id: new_id(),
                        set_id: set_id.clone(),
                        sequence: int_field(set_component, "sequence"),
                        weight_metric: str_field(set_component, "weight_metric"),
                        weight: int_field(set_component, "weight"),
                        reps: int_field(set_component, "reps"),
                        rest_time: int_field(set_component, "rest_time"),
                        exercise_link: str_field(set_component, "exercise_link"),
                        created_at: created_at.clone(),
                    });
                }
            }
        }
    }

    tables
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::identity::Plaintext;

    use super::*;

    struct Masked;

    impl IdentityEncoder for Masked {
        fn encode(&self, username: &str) -> String {
            format!("masked:{username}")
        }
    }

    fn sample_workout() -> Value {
        json!({
            "name": "Push Day Log",
            "username": "coachdmurph",
            "url": "https://bodyspace.bodybuilding.com/workouts/viewworkoutlog/coachdmurph/5bf3",
            "month": "Nov",
            "month_date": "20",
            "year": "2018",
            "muscles_used": ["Chest", "Triceps"],
            "duration": 4500,
            "cardio_duration": 600,
            "energy_level": 3,
            "self_rating": "8",
            "workout_components": [
                {
                    "sequence": 1,
                    "rest_time": 120,
                    "sets": [
                        {
                            "type": "STRAIGHT_SET",
                            "sequence": 1,
                            "rest_time": 90,
                            "set_components": [
                                {
                                    "sequence": 1,
                                    "weight_metric": "lbs",
                                    "weight": "135",
                                    "reps": "10",
                                    "rest_time": 90,
                                    "exercise_link": "/exercises/bench",
                                    "exercise_name": "Barbell Bench Press"
                                }
                            ]
                        },
                        {
                            "type": "STRAIGHT_SET",
                            "sequence": 2,
                            "rest_time": 120,
                            "set_components": [
                                {
                                    "sequence": 1,
                                    "weight_metric": "lbs",
                                    "weight": "145",
                                    "reps": "8",
                                    "rest_time": 120,
                                    "exercise_link": "/exercises/bench",
                                    "exercise_name": "Barbell Bench Press"
                                },
                                {
                                    "sequence": 2,
                                    "weight_metric": "lbs",
                                    "weight": "",
                                    "reps": "not logged",
                                    "rest_time": null,
                                    "exercise_link": null,
                                    "exercise_name": "Barbell Bench Press"
                                }
                            ]
                        }
                    ]
                },
                {
                    "sequence": 2,
                    "rest_time": null,
                    "sets": []
                }
            ]
        })
    }

    #[test]
    fn tree_levels_describe_the_hierarchy() {
        assert_eq!(TreeLevel::Workouts.child_field(), Some("workout_components"));
        assert_eq!(TreeLevel::WorkoutComponents.child_field(), Some("sets"));
        assert_eq!(TreeLevel::Sets.child_field(), Some("set_components"));
        assert_eq!(TreeLevel::SetComponents.child_field(), None);
    }

    #[test]
    fn counts_match_the_tree() {
        let tables = flatten_workout_tree(&[sample_workout()], &Plaintext);
        assert_eq!(tables.workouts.len(), 1);
        assert_eq!(tables.workout_components.len(), 2);
        assert_eq!(tables.sets.len(), 2);
        assert_eq!(tables.set_components.len(), 3);
    }

    #[test]
    fn foreign_keys_link_every_row_to_its_parent() {
        let tables = flatten_workout_tree(&[sample_workout()], &Plaintext);

        let workout_id = &tables.workouts[0].workout_id;
        assert!(tables
            .workout_components
            .iter()
            .all(|c| &c.workout_id == workout_id));

        for set in &tables.sets {
            assert!(tables
                .workout_components
                .iter()
                .any(|c| c.workout_component_id == set.workout_component_id));
        }
        for sc in &tables.set_components {
            assert!(tables.sets.iter().any(|s| s.set_id == sc.set_id));
        }
    }

    #[test]
    fn created_at_propagates_to_every_level() {
        let tables = flatten_workout_tree(&[sample_workout()], &Plaintext);
        let stamp = Some("2018-11-20 00:00:00".to_string());
        assert_eq!(tables.workouts[0].created_at, stamp);
        assert!(tables.workout_components.iter().all(|r| r.created_at == stamp));
        assert!(tables.sets.iter().all(|r| r.created_at == stamp));
        assert!(tables.set_components.iter().all(|r| r.created_at == stamp));
    }

    #[test]
    fn missing_date_fields_mean_no_created_at() {
        let mut workout = sample_workout();
        workout.as_object_mut().unwrap().remove("month");
        let tables = flatten_workout_tree(&[workout], &Plaintext);
        assert_eq!(tables.workouts[0].created_at, None);
    }

    #[test]
    fn digit_strings_parse_and_junk_is_null() {
        let tables = flatten_workout_tree(&[sample_workout()], &Plaintext);
        assert_eq!(tables.workouts[0].self_rating, Some(8));
        assert_eq!(tables.set_components[0].weight, Some(135));
        assert_eq!(tables.set_components[0].reps, Some(10));
        // Empty and non-numeric strings flatten to NULL.
        assert_eq!(tables.set_components[2].weight, None);
        assert_eq!(tables.set_components[2].reps, None);
    }

    #[test]
    fn muscles_join_and_identity_encoding() {
        let tables = flatten_workout_tree(&[sample_workout()], &Masked);
        assert_eq!(
            tables.workouts[0].muscles_used.as_deref(),
            Some("Chest;Triceps")
        );
        assert_eq!(
            tables.workouts[0].created_by.as_deref(),
            Some("masked:coachdmurph")
        );
    }

    #[test]
    fn every_row_gets_a_distinct_id() {
        let tables = flatten_workout_tree(&[sample_workout(), sample_workout()], &Plaintext);
        let mut ids: Vec<&str> = tables
            .workouts
            .iter()
            .map(|r| r.workout_id.as_str())
            .chain(tables.sets.iter().map(|r| r.set_id.as_str()))
            .collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), tables.workouts.len() + tables.sets.len());
    }
}
