//! Turns one `label.left-label` + `div.inputWrapper` pair into a
//! [`SetComponent`]. Also hosts the compound (multi-row) extraction used by
//! cardio entries and by weight entries whose body spans several set-rows.

use std::sync::LazyLock;

use scraper::{ElementRef, Selector};

use super::error::ParseError;
use super::fields::{
    clean_reps_text, decode_duration_hhmmss, decode_rest_time, decode_set_type_and_target,
    decode_weight_only, decode_weight_reps, PerformanceKind,
};
use super::model::{ExerciseInfo, SetComponent, SetKind, WeightMetric};
use super::{has_class, text_of};

static SPAN: LazyLock<Selector> = LazyLock::new(|| Selector::parse("span").unwrap());

/// Text of the first span inside a label when it is a drop marker ("DROP 1").
/// The marker is how drop sets announce themselves at all.
pub(super) fn drop_marker(label: ElementRef) -> Option<String> {
    let span = label.select(&SPAN).next()?;
    let text = text_of(span).trim().to_string();
    if text.to_lowercase().contains("drop") {
        Some(text)
    } else {
        None
    }
}

pub(super) fn label_mentions_drop(label: ElementRef) -> bool {
    text_of(label).to_lowercase().contains("drop")
}

/// The label's text chunks, drop marker excluded, dash-joined so the type tag
/// and target arrive as separate segments for the title decoder.
pub(super) fn title_text(label: ElementRef) -> String {
    let marker = drop_marker(label);
    label
        .text()
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .filter(|chunk| marker.as_deref() != Some(chunk))
        .collect::<Vec<_>>()
        .join("-")
}

/// Finds the rest time that applies to the component owning `label`.
///
/// Climbs to the enclosing `set-body` (supersets rest between exercises
/// inside one set) or `set` (every other kind rests between sets), then scans
/// the following sibling divs: a `set-rest` carries the value, another body
/// starting first means no rest was logged.
pub(super) fn rest_for_component(
    label: ElementRef,
    kind: SetKind,
) -> Result<Option<u32>, ParseError> {
    let stop_class = match kind {
        SetKind::SuperSet => "set-body",
        _ => "set",
    };

    let mut anchor = None;
    let mut node = label.parent();
    while let Some(parent) = node {
        if let Some(el) = ElementRef::wrap(parent) {
            if has_class(el, stop_class) {
                anchor = Some(el);
                break;
            }
        }
        node = parent.parent();
    }
    let anchor = anchor.ok_or(ParseError::MissingElement("set container"))?;

    for sibling in anchor.next_siblings() {
        let Some(el) = ElementRef::wrap(sibling) else {
            continue;
        };
        if has_class(el, "set-body") {
            return Ok(None);
        }
        if has_class(el, "set-rest") {
            return Ok(Some(decode_rest_time(&text_of(el))?));
        }
    }
    Ok(None)
}

fn decode_performance(
    kind: PerformanceKind,
    performance: &str,
) -> Result<(Option<WeightMetric>, Option<String>, Option<String>), ParseError> {
    match kind {
        PerformanceKind::WeightReps => decode_weight_reps(performance),
        PerformanceKind::Reps => Ok((None, None, clean_reps_text(performance))),
        PerformanceKind::Time => {
            let seconds = decode_duration_hhmmss(performance)?;
            Ok((Some(WeightMetric::Seconds), Some(seconds.to_string()), None))
        }
        PerformanceKind::Weight => {
            let (metric, weight) = decode_weight_only(performance)?;
            Ok((Some(metric), Some(weight), None))
        }
    }
}

/// The single-row path: one label, one performance cell. Drop-set rows are
/// forced down the weight/reps path whatever their tag says, because their
/// title is occupied by the drop marker.
pub(super) fn extract_set_component(
    label: ElementRef,
    performance: ElementRef,
    exercise: &ExerciseInfo,
    sequence: u32,
    kind: SetKind,
) -> Result<SetComponent, ParseError> {
    let (tag, target) = decode_set_type_and_target(&title_text(label))?;

    let performance_kind = if kind == SetKind::DropSet {
        PerformanceKind::WeightReps
    } else {
        PerformanceKind::from_tag(&tag).ok_or(ParseError::UnrecognizedSetType(tag))?
    };

    let (weight_metric, weight, reps) = decode_performance(performance_kind, &text_of(performance))?;
    let rest_time = rest_for_component(label, kind)?;

    Ok(SetComponent {
        sequence,
        weight_metric,
        weight,
        reps,
        target,
        rest_time,
        exercise: exercise.clone(),
    })
}

/// Which of the two compound layouts a multi-row body follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum CompoundMode {
    /// Cardio entries: one of the rows is labelled "Time" and holds a clock
    /// value; the other rows (heart rate etc.) are ignored.
    Cardio,
    /// Weight entries spread over several rows: the first row's tag decides
    /// the path, the rest are spillover.
    Weight,
}

/// The multi-row path. Produces exactly one component from a slice of
/// label/performance pairs; rest is read from the last label with
/// between-sets semantics.
pub(super) fn extract_compound_component(
    labels: &[ElementRef],
    performances: &[ElementRef],
    exercise: &ExerciseInfo,
    sequence: u32,
    mode: CompoundMode,
) -> Result<SetComponent, ParseError> {
    let first_label = *labels.first().ok_or(ParseError::MissingElement("set-component label"))?;

    let (weight_metric, weight, reps, target) = match mode {
        CompoundMode::Cardio => {
            let mut decoded = None;
            for (label, performance) in labels.iter().zip(performances) {
                let title = text_of(*label);
                if title.trim().trim_end_matches(':').eq_ignore_ascii_case("time") {
                    let seconds = decode_duration_hhmmss(&text_of(*performance))?;
                    decoded = Some((
                        Some(WeightMetric::Seconds),
                        Some(seconds.to_string()),
                        None,
                        None,
                    ));
                    break;
                }
            }
            decoded.ok_or(ParseError::MissingElement("cardio time row"))?
        }
        CompoundMode::Weight => {
            let (tag, target) = decode_set_type_and_target(&title_text(first_label))?;
            let kind =
                PerformanceKind::from_tag(&tag).ok_or(ParseError::UnrecognizedSetType(tag))?;
            let performance = performances
                .first()
                .ok_or(ParseError::MissingElement("set-component performance"))?;
            let (metric, weight, reps) = decode_performance(kind, &text_of(*performance))?;
            (metric, weight, reps, target)
        }
    };

    let last_label = *labels.last().ok_or(ParseError::MissingElement("set-component label"))?;
    let rest_time = rest_for_component(last_label, SetKind::StraightSet)?;

    Ok(SetComponent {
        sequence,
        weight_metric,
        weight,
        reps,
        target,
        rest_time,
        exercise: exercise.clone(),
    })
}
