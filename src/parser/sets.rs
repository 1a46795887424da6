//! Assembles one `div.set` into a [`Set`], classifying it as straight, super
//! or drop and routing multi-row bodies through the compound extractor.

use std::sync::LazyLock;

use scraper::{ElementRef, Selector};

use super::components::ExercisePool;
use super::error::ParseError;
use super::model::{Set, SetKind};
use super::set_component::{
    drop_marker, extract_compound_component, extract_set_component, label_mentions_drop,
    CompoundMode,
};
use super::text_of;

static SET_TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div.set-title").unwrap());
static SET_BODY: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div.set-body").unwrap());
static SET_ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div.set-row").unwrap());
static LEFT_LABEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("label.left-label").unwrap());
static INPUT_WRAPPER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.inputWrapper").unwrap());

/// Builds the set from `set_el`. Returns `Ok(None)` when the set holds no
/// logged components at all.
///
/// `component_rest` is the owning workout-component's rest; when this is the
/// last set of that component, its last set-component takes that value over
/// whatever the sibling walk found.
pub(super) fn assemble_set(
    set_el: ElementRef,
    sequence: u32,
    is_last_set: bool,
    component_rest: Option<u32>,
    pool: &mut ExercisePool,
) -> Result<Option<Set>, ParseError> {
    let titles: Vec<ElementRef> = set_el.select(&SET_TITLE).collect();
    let bodies: Vec<ElementRef> = set_el.select(&SET_BODY).collect();
    let labels: Vec<ElementRef> = set_el.select(&LEFT_LABEL).collect();
    let performances: Vec<ElementRef> = set_el.select(&INPUT_WRAPPER).collect();

    if labels.is_empty() {
        return Ok(None);
    }

    // One titled exercise is a straight set; several interleaved ones (or a
    // title-less body) is a superset until a drop marker says otherwise.
    let mut kind = if titles.len() == 1 {
        SetKind::StraightSet
    } else {
        SetKind::SuperSet
    };

    if kind == SetKind::StraightSet && labels.len() > 1 && text_of(titles[0]).contains("Cardio") {
        let mut component = extract_compound_component(
            &labels,
            &performances,
            &pool.next_exercise()?,
            1,
            CompoundMode::Cardio,
        )?;
        if is_last_set {
            component.rest_time = component_rest;
        }
        return Ok(Some(Set {
            kind,
            sequence,
            rest_time: component.rest_time,
            set_components: vec![component],
        }));
    }

    let total = labels.len();
    let mut components = Vec::with_capacity(total);

    for (index, label) in labels.iter().enumerate() {
        // A body spanning several set-rows without a drop marker is a single
        // exercise spread over rows; the compound path consumes the rest of
        // the slice and ends the set.
        let multi_row = bodies
            .get(index)
            .is_some_and(|body| body.select(&SET_ROW).count() > 1);
        let drop_in_lead = label_mentions_drop(labels[0])
            || labels.get(1).is_some_and(|l| label_mentions_drop(*l));

        if multi_row && !drop_in_lead {
            let (label_slice, performance_slice) = if pool.is_single() {
                (&labels[..], &performances[..])
            } else {
                (&labels[index..], &performances[index.min(performances.len())..])
            };
            let mut component = extract_compound_component(
                label_slice,
                performance_slice,
                &pool.next_exercise()?,
                index as u32 + 1,
                CompoundMode::Weight,
            )?;
            if is_last_set {
                component.rest_time = component_rest;
            }
            components.push(component);
            break;
        }

        if drop_marker(*label).is_some() {
            kind = SetKind::DropSet;
        }

        let performance = performances
            .get(index)
            .ok_or(ParseError::MissingElement("set-component performance"))?;

        let mut component = extract_set_component(
            *label,
            *performance,
            &pool.next_exercise()?,
            index as u32 + 1,
            kind,
        )?;

        if kind == SetKind::DropSet && index < total - 1 {
            // Within a drop set only the final drop rests.
            component.rest_time = Some(0);
        }
        if kind == SetKind::DropSet && index == 1 {
            // The marker only shows up on the second row, so the first
            // component was built before we knew it belonged to a drop set.
            if let Some(first) = components.first_mut() {
                first.rest_time = Some(0);
            }
        }

        if is_last_set && index == total - 1 {
            component.rest_time = component_rest;
        }

        components.push(component);
    }

    if components.is_empty() {
        return Ok(None);
    }

    let rest_time = components.last().and_then(|c| c.rest_time);
    Ok(Some(Set {
        kind,
        sequence,
        rest_time,
        set_components: components,
    }))
}
