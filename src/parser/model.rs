use serde::{Deserialize, Serialize};

/// How a set was performed. Supersets interleave two or more exercises;
/// drop sets repeat one exercise at successively reduced load. The drop
/// variant is only discovered from a marker inside a set-component title,
/// so the assembler may reclassify a set mid-build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SetKind {
    StraightSet,
    SuperSet,
    DropSet,
}

/// Unit of the `weight` field. Timed entries (cardio, planks) store their
/// elapsed seconds in `weight` with this metric set to `Seconds`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightMetric {
    Lbs,
    Kg,
    Seconds,
}

/// Exercise metadata pulled from the component's overview block. Shared by
/// every set-component that performs this exercise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseInfo {
    pub exercise_name: String,
    pub exercise_link: Option<String>,
    pub exercise_muscle: Option<String>,
    #[serde(rename = "exercise_type")]
    pub exercise_kind: Option<String>,
    pub exercise_equipment: Option<String>,
}

/// One exercise's performance record within a set. Weight and reps stay as
/// the scraped digit strings; integer conversion happens at flatten time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetComponent {
    pub sequence: u32,
    pub weight_metric: Option<WeightMetric>,
    pub weight: Option<String>,
    pub reps: Option<String>,
    /// Prescribed goal from the title row, distinct from the performed value.
    pub target: Option<String>,
    pub rest_time: Option<u32>,
    #[serde(flatten)]
    pub exercise: ExerciseInfo,
}

/// One performed set. Invariant: `rest_time` equals the last set-component's
/// rest time after assembly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Set {
    #[serde(rename = "type")]
    pub kind: SetKind,
    pub sequence: u32,
    pub rest_time: Option<u32>,
    pub set_components: Vec<SetComponent>,
}

/// One exercise slot within a workout. `rest_time` is the inter-exercise
/// rest; the final slot on a page often has none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutComponent {
    pub sequence: u32,
    pub rest_time: Option<u32>,
    pub sets: Vec<Set>,
}

/// One scraped workout log session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workout {
    pub name: String,
    pub username: String,
    pub url: String,
    pub muscles_used: Vec<String>,
    /// Total session length in seconds.
    pub duration: u32,
    /// Cardio portion in seconds.
    pub cardio_duration: u32,
    /// Tier 1 (low) to 4 (high).
    pub energy_level: u8,
    pub self_rating: String,
    pub workout_components: Vec<WorkoutComponent>,
}
