//! One exercise-overview / exercise-details pair makes one
//! [`WorkoutComponent`]. The overview supplies a pool of exercise metadata
//! that set-components draw from in rotation, which is what lines supersets
//! up with the right exercise names.

use std::sync::LazyLock;

use scraper::{ElementRef, Selector};

use super::error::ParseError;
use super::model::{ExerciseInfo, WorkoutComponent};
use super::sets::assemble_set;
use super::text_of;

static EXERCISE_INFO: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.exercise-info").unwrap());
static MUSCLES_EQUIPMENT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("ul.muscles-and-equipment").unwrap());
static H3: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h3").unwrap());
static NAV_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p.exercise-nav a").unwrap());
static LI: LazyLock<Selector> = LazyLock::new(|| Selector::parse("li").unwrap());
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());
static SET: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div.set").unwrap());

/// Rotating cursor over a component's exercises. A straight set draws the
/// same exercise every time; a superset's components walk the pool in order
/// and wrap around for the next set.
pub(super) struct ExercisePool {
    entries: Vec<ExerciseInfo>,
    cursor: usize,
}

impl ExercisePool {
    pub(super) fn new(entries: Vec<ExerciseInfo>) -> Self {
        Self { entries, cursor: 0 }
    }

    pub(super) fn is_single(&self) -> bool {
        self.entries.len() == 1
    }

    pub(super) fn next_exercise(&mut self) -> Result<ExerciseInfo, ParseError> {
        if self.entries.is_empty() {
            return Err(ParseError::MissingElement("exercise-info"));
        }
        let entry = self.entries[self.cursor % self.entries.len()].clone();
        self.cursor += 1;
        Ok(entry)
    }
}

/// Reads the overview's exercise blocks. The name is mandatory; link, muscle,
/// type and equipment degrade to `None` when the page omits them.
pub(super) fn exercise_entries(overview: ElementRef) -> Result<Vec<ExerciseInfo>, ParseError> {
    let info_blocks: Vec<ElementRef> = overview.select(&EXERCISE_INFO).collect();
    let detail_lists: Vec<ElementRef> = overview.select(&MUSCLES_EQUIPMENT).collect();

    let mut entries = Vec::with_capacity(info_blocks.len());
    for (index, block) in info_blocks.iter().enumerate() {
        let name = block
            .select(&H3)
            .next()
            .map(|h| text_of(h).trim().to_string())
            .ok_or(ParseError::MissingElement("exercise name"))?;
        let link = block
            .select(&NAV_LINK)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(str::to_string);

        // The list holds muscle, type and equipment in that order; a slot
        // whose li carries no anchor degrades to None without shifting the
        // slots after it.
        let mut details = detail_lists
            .get(index)
            .map(|list| list.select(&LI))
            .into_iter()
            .flatten()
            .map(|li| {
                li.select(&ANCHOR)
                    .next()
                    .map(|a| text_of(a).trim().to_string())
            });

        entries.push(ExerciseInfo {
            exercise_name: name,
            exercise_link: link,
            exercise_muscle: details.next().flatten(),
            exercise_kind: details.next().flatten(),
            exercise_equipment: details.next().flatten(),
        });
    }
    Ok(entries)
}

/// Builds the component at `sequence` from its overview and details blocks.
/// A details block with no `div.set` was never performed and yields
/// `Ok(None)`; the caller keeps the sequence gap.
pub(super) fn assemble_workout_component(
    overview: ElementRef,
    details: ElementRef,
    rest_time: Option<u32>,
    sequence: u32,
) -> Result<Option<WorkoutComponent>, ParseError> {
    let set_els: Vec<ElementRef> = details.select(&SET).collect();
    if set_els.is_empty() {
        return Ok(None);
    }

    let mut pool = ExercisePool::new(exercise_entries(overview)?);

    let total = set_els.len();
    let mut sets = Vec::with_capacity(total);
    for (index, set_el) in set_els.into_iter().enumerate() {
        let is_last = index == total - 1;
        if let Some(set) =
            assemble_set(set_el, index as u32 + 1, is_last, rest_time, &mut pool)?
        {
            sets.push(set);
        }
    }

    Ok(Some(WorkoutComponent {
        sequence,
        rest_time,
        sets,
    }))
}

#[cfg(test)]
mod tests {
    use scraper::Html;

    use super::*;

    #[test]
    fn pool_cycles_in_order() {
        let mut pool = ExercisePool::new(vec![
            ExerciseInfo {
                exercise_name: "Curl".into(),
                exercise_link: None,
                exercise_muscle: None,
                exercise_kind: None,
                exercise_equipment: None,
            },
            ExerciseInfo {
                exercise_name: "Pushdown".into(),
                exercise_link: None,
                exercise_muscle: None,
                exercise_kind: None,
                exercise_equipment: None,
            },
        ]);
        let names: Vec<String> = (0..5)
            .map(|_| pool.next_exercise().unwrap().exercise_name)
            .collect();
        assert_eq!(names, ["Curl", "Pushdown", "Curl", "Pushdown", "Curl"]);
    }

    #[test]
    fn empty_pool_is_an_error() {
        let mut pool = ExercisePool::new(vec![]);
        assert!(matches!(
            pool.next_exercise(),
            Err(ParseError::MissingElement(_))
        ));
    }

    #[test]
    fn entries_read_name_link_and_details() {
        let doc = Html::parse_fragment(
            r#"<div class="exercise-overview">
                 <div class="exercise-info">
                   <h3> Barbell Bench Press </h3>
                   <p class="exercise-nav"><a href="/exercises/bench">view</a></p>
                 </div>
                 <ul class="muscles-and-equipment">
                   <li><a>Chest</a></li>
                   <li><a>Strength</a></li>
                   <li><a>Barbell</a></li>
                 </ul>
               </div>"#,
        );
        let root = doc.root_element();
        let entries = exercise_entries(root).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].exercise_name, "Barbell Bench Press");
        assert_eq!(entries[0].exercise_link.as_deref(), Some("/exercises/bench"));
        assert_eq!(entries[0].exercise_muscle.as_deref(), Some("Chest"));
        assert_eq!(entries[0].exercise_kind.as_deref(), Some("Strength"));
        assert_eq!(entries[0].exercise_equipment.as_deref(), Some("Barbell"));
    }

    #[test]
    fn anchorless_li_keeps_later_slots_in_place() {
        let doc = Html::parse_fragment(
            r#"<div class="exercise-overview">
                 <div class="exercise-info"><h3>Dumbbell Fly</h3></div>
                 <ul class="muscles-and-equipment">
                   <li><a>Chest</a></li>
                   <li>Strength</li>
                   <li><a>Dumbbell</a></li>
                 </ul>
               </div>"#,
        );
        let entries = exercise_entries(doc.root_element()).unwrap();
        assert_eq!(entries[0].exercise_muscle.as_deref(), Some("Chest"));
        assert_eq!(entries[0].exercise_kind, None);
        assert_eq!(entries[0].exercise_equipment.as_deref(), Some("Dumbbell"));
    }

    #[test]
    fn entries_degrade_missing_details_to_none() {
        let doc = Html::parse_fragment(
            r#"<div class="exercise-overview">
                 <div class="exercise-info"><h3>Plank</h3></div>
               </div>"#,
        );
        let entries = exercise_entries(doc.root_element()).unwrap();
        assert_eq!(entries[0].exercise_name, "Plank");
        assert_eq!(entries[0].exercise_link, None);
        assert_eq!(entries[0].exercise_muscle, None);
    }
}
