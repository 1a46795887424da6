//! Workout log page parser. The page is a wicket-rendered tree whose CSS
//! classes carry all the structure: `exercise-overview`/`exercise-details`
//! pairs are workout components, `div.set` elements are sets, and
//! `label.left-label`/`div.inputWrapper` pairs inside them are the individual
//! performance records.

pub mod error;
pub mod fields;
pub mod model;

mod components;
mod set_component;
mod sets;

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use components::assemble_workout_component;
use error::ParseError;
use fields::{decode_duration_hhmmss, decode_rest_time};
use model::Workout;

static SECTION_HEADER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.rowSectionHeader").unwrap());
static MUSCLES_WORKED: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.musclesWorked span.value").unwrap());
static TOTAL_WORKOUT_TIME: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"span[wicketpath="logResultsPanel_workoutSummary_totalWorkoutTime"]"#)
        .unwrap()
});
static TOTAL_CARDIO_TIME: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"span[wicketpath="logResultsPanel_workoutSummary_totalCardioTime"]"#)
        .unwrap()
});
static WORKOUT_FOOTER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.workout-footer").unwrap());
static BIG_RATING: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span.bigRating").unwrap());
static EXERCISE_OVERVIEW: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.exercise-overview").unwrap());
static EXERCISE_DETAILS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.exercise-details").unwrap());
static EXERCISE_REST: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.exercise-rest").unwrap());

// Energy tiers, highest first; the footer renders exactly one of them.
static TIER_SELECTORS: LazyLock<[(Selector, u8); 4]> = LazyLock::new(|| {
    [
        (Selector::parse("div.high").unwrap(), 4),
        (Selector::parse("div.mid-high").unwrap(), 3),
        (Selector::parse("div.mid-low").unwrap(), 2),
        (Selector::parse("div.low").unwrap(), 1),
    ]
});

pub(crate) fn text_of(el: ElementRef) -> String {
    el.text().collect()
}

pub(crate) fn has_class(el: ElementRef, class: &str) -> bool {
    el.value().classes().any(|c| c == class)
}

/// The log owner's username sits between "viewworkoutlog" and the log id in
/// the page URL.
pub fn username_from_url(url: &str) -> Option<&str> {
    let (_, tail) = url.split_once("viewworkoutlog")?;
    tail.split('/').nth(1).filter(|s| !s.is_empty())
}

fn energy_level(footer: ElementRef) -> Result<u8, ParseError> {
    for (selector, tier) in TIER_SELECTORS.iter() {
        if footer.select(selector).next().is_some() {
            return Ok(*tier);
        }
    }
    Err(ParseError::EnergyLevelNotFound)
}

/// Parses one workout log page into the nested workout tree.
///
/// Structural surprises are errors; a summary-only page with no exercise
/// blocks is not one of them and parses to an empty component list.
pub fn parse_workout(html: &str, url: &str) -> Result<Workout, ParseError> {
    let document = Html::parse_document(html);

    let username = username_from_url(url)
        .ok_or(ParseError::MissingElement("username segment in url"))?
        .to_string();

    let name = document
        .select(&SECTION_HEADER)
        .next()
        .map(|el| text_of(el).trim().to_string())
        .ok_or(ParseError::MissingElement("rowSectionHeader"))?;

    let muscles_used: Vec<String> = document
        .select(&MUSCLES_WORKED)
        .next()
        .ok_or(ParseError::MissingElement("musclesWorked value"))?
        .text()
        .collect::<String>()
        .split(',')
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .collect();

    // Summary durations render as hr:min.
    let duration = decode_duration_hhmmss(
        &document
            .select(&TOTAL_WORKOUT_TIME)
            .next()
            .map(text_of)
            .ok_or(ParseError::MissingElement("totalWorkoutTime"))?,
    )?;
    let cardio_duration = decode_duration_hhmmss(
        &document
            .select(&TOTAL_CARDIO_TIME)
            .next()
            .map(text_of)
            .ok_or(ParseError::MissingElement("totalCardioTime"))?,
    )?;

    let footer = document
        .select(&WORKOUT_FOOTER)
        .next()
        .ok_or(ParseError::MissingElement("workout-footer"))?;
    let energy_level = energy_level(footer)?;
    let self_rating = footer
        .select(&BIG_RATING)
        .next()
        .map(|el| text_of(el).trim().to_string())
        .ok_or(ParseError::MissingElement("bigRating"))?;

    let overviews: Vec<ElementRef> = document.select(&EXERCISE_OVERVIEW).collect();
    let details: Vec<ElementRef> = document.select(&EXERCISE_DETAILS).collect();
    let rests: Vec<ElementRef> = document.select(&EXERCISE_REST).collect();

    let mut workout_components = Vec::with_capacity(overviews.len());
    for (index, overview) in overviews.iter().enumerate() {
        let detail = *details
            .get(index)
            .ok_or(ParseError::MissingElement("exercise-details"))?;
        // Rest blocks line up positionally; the page drops the trailing one.
        let rest_time = match rests.get(index) {
            Some(el) => Some(decode_rest_time(&text_of(*el))?),
            None => None,
        };
        if let Some(component) =
            assemble_workout_component(*overview, detail, rest_time, index as u32 + 1)?
        {
            workout_components.push(component);
        }
    }

    Ok(Workout {
        name,
        username,
        url: url.to_string(),
        muscles_used,
        duration,
        cardio_duration,
        energy_level,
        self_rating,
        workout_components,
    })
}
