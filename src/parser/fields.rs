//! Pure text decoders for the raw fragments a workout page mixes together:
//! rest labels, "weight x reps" cells, title tags with optional targets, and
//! clock-style durations.

use std::sync::LazyLock;

use regex::Regex;

use super::error::ParseError;
use super::model::WeightMetric;

static REST_LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Rest Between Exercises|Rest Between Sets|\s").unwrap());
static TIME_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"hr|min|sec").unwrap());
static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s").unwrap());

/// The measurement scheme a set-component title announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformanceKind {
    WeightReps,
    Reps,
    Time,
    Weight,
}

impl PerformanceKind {
    /// Maps a decoded title tag onto a measurement scheme. `None` means the
    /// tag is outside the known grammar and the page cannot be parsed.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "WEIGHT/REPS" => Some(Self::WeightReps),
            "REPS" => Some(Self::Reps),
            "TIME" => Some(Self::Time),
            "WEIGHT" => Some(Self::Weight),
            _ => None,
        }
    }
}

/// Decodes a rest label like "Rest Between Sets 1 min 30 sec" into seconds.
pub fn decode_rest_time(text: &str) -> Result<u32, ParseError> {
    let cleaned = REST_LABEL_RE.replace_all(text, "").to_lowercase();
    let err = || ParseError::MalformedRestTime(text.to_string());

    let (minutes, remainder) = cleaned.split_once("min").ok_or_else(err)?;
    let seconds = remainder.split("sec").next().unwrap_or("");

    let minutes: u32 = minutes.parse().map_err(|_| err())?;
    let seconds: u32 = seconds.parse().map_err(|_| err())?;
    Ok(minutes * 60 + seconds)
}

/// Splits a performance cell on its "x" separator. A single token is a
/// reps-only value (WEIGHT/REPS cells can look exactly like REPS cells);
/// two tokens are weight-with-unit and reps. Empty cells decode to all-None.
pub fn decode_weight_reps(
    text: &str,
) -> Result<(Option<WeightMetric>, Option<String>, Option<String>), ParseError> {
    let cleaned = WS_RE.replace_all(text, "").to_lowercase();
    let tokens: Vec<&str> = cleaned.split('x').collect();

    let (weight_token, reps_token) = match tokens.as_slice() {
        [reps] => (None, *reps),
        [weight, reps] => (Some(*weight), *reps),
        _ => return Err(ParseError::MalformedWeightReps(text.to_string())),
    };

    let (metric, weight) = match weight_token {
        None => (None, None),
        Some(w) if w.contains("lbs") => (Some(WeightMetric::Lbs), Some(strip_unit(w, "lbs"))),
        Some(w) if w.contains("kg") => (Some(WeightMetric::Kg), Some(strip_unit(w, "kg"))),
        Some(w) => return Err(ParseError::UnrecognizedUnit(w.to_string())),
    };

    Ok((metric, weight, clean_reps_text(reps_token)))
}

/// Decodes a weight-only cell ("225 lbs." / "100 kg.") into metric + value.
pub fn decode_weight_only(text: &str) -> Result<(WeightMetric, String), ParseError> {
    let cleaned = WS_RE.replace_all(text, "").to_lowercase();
    if cleaned.contains("lbs") {
        Ok((WeightMetric::Lbs, strip_unit(&cleaned, "lbs")))
    } else if cleaned.contains("kg") {
        Ok((WeightMetric::Kg, strip_unit(&cleaned, "kg")))
    } else {
        Err(ParseError::UnrecognizedUnit(text.to_string()))
    }
}

/// Strips "reps" labels and punctuation from a reps token. Users who logged
/// nothing leave an empty cell, which decodes to `None`.
pub fn clean_reps_text(text: &str) -> Option<String> {
    let cleaned = WS_RE
        .replace_all(text, "")
        .to_lowercase()
        .replace("reps", "")
        .replace('.', "");
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Splits a set-component title into its type tag and optional target.
///
/// Titles arrive as dash-joined segments ("WEIGHT/REPS:-TARGET 10 REPS").
/// The first segment, colon stripped, is the tag; the tag is returned as-is
/// because drop sets are decoded by position, not by tag, and must not fail
/// here. The second segment, after dropping "target"/"reps" tokens and unit
/// suffixes, is the target; colon-delimited targets are clock values and are
/// converted to seconds, ranges take the lower bound.
pub fn decode_set_type_and_target(title: &str) -> Result<(String, Option<String>), ParseError> {
    let cleaned = WS_RE.replace_all(title.trim(), "").to_string();
    let mut segments = cleaned.split('-');

    let tag = segments.next().unwrap_or("").replace(':', "");
    let target = match segments.next() {
        Some(segment) => decode_target(segment)?,
        None => None,
    };
    Ok((tag, target))
}

fn decode_target(segment: &str) -> Result<Option<String>, ParseError> {
    let mut target = segment
        .to_lowercase()
        .replace("target", "")
        .replace("reps", "");

    if target.contains("lbs") {
        target = strip_unit(&target, "lbs");
    } else if target.contains("kg") {
        target = strip_unit(&target, "kg");
    }

    // A range like "00:02:00to00:03:00" takes the lower bound.
    if let Some((low, _)) = target.split_once("to") {
        target = low.to_string();
    }

    if target.is_empty() {
        return Ok(None);
    }

    if target.contains(':') {
        let err = || ParseError::MalformedTarget(segment.to_string());
        let components: Vec<&str> = target.split(':').collect();
        let (hours, minutes, seconds) = match components.as_slice() {
            [h, m, s] => (*h, *m, *s),
            // "TARGET: 00:02:00" keeps its label colon as an empty lead.
            [_, h, m, s] => (*h, *m, *s),
            _ => return Err(err()),
        };
        let total = num(hours, err)? * 3600 + num(minutes, err)? * 60 + num(seconds, err)?;
        target = total.to_string();
    }

    Ok(Some(target))
}

/// Decodes clock-style text into seconds: "01:15:30" (hr:min:sec) or the
/// page-summary form "01:15" (hr:min). Unit labels inside the components
/// ("1hr:05min:30sec") are tolerated.
pub fn decode_duration_hhmmss(text: &str) -> Result<u32, ParseError> {
    let cleaned = TIME_LABEL_RE.replace_all(text, "");
    let cleaned = WS_RE.replace_all(&cleaned, "");
    let err = || ParseError::MalformedDuration(text.to_string());

    let components: Vec<&str> = cleaned.split(':').collect();
    match components.as_slice() {
        [h, m, s] => Ok(num(h, err)? * 3600 + num(m, err)? * 60 + num(s, err)?),
        [h, m] => Ok(num(h, err)? * 3600 + num(m, err)? * 60),
        _ => Err(err()),
    }
}

fn strip_unit(value: &str, unit: &str) -> String {
    value.replace(unit, "").replace('.', "")
}

fn num(text: &str, err: impl Fn() -> ParseError) -> Result<u32, ParseError> {
    text.parse().map_err(|_| err())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weight_reps_with_units() {
        let (metric, weight, reps) = decode_weight_reps("135lbs.x10reps.").unwrap();
        assert_eq!(metric, Some(WeightMetric::Lbs));
        assert_eq!(weight.as_deref(), Some("135"));
        assert_eq!(reps.as_deref(), Some("10"));
    }

    #[test]
    fn weight_reps_with_spacing() {
        let (metric, weight, reps) = decode_weight_reps("135 lbs. x 10 reps.").unwrap();
        assert_eq!(metric, Some(WeightMetric::Lbs));
        assert_eq!(weight.as_deref(), Some("135"));
        assert_eq!(reps.as_deref(), Some("10"));
    }

    #[test]
    fn weight_reps_kg() {
        let (metric, weight, _) = decode_weight_reps("60 kg. x 12 reps.").unwrap();
        assert_eq!(metric, Some(WeightMetric::Kg));
        assert_eq!(weight.as_deref(), Some("60"));
    }

    #[test]
    fn reps_only() {
        let (metric, weight, reps) = decode_weight_reps("10reps.").unwrap();
        assert_eq!(metric, None);
        assert_eq!(weight, None);
        assert_eq!(reps.as_deref(), Some("10"));
    }

    #[test]
    fn empty_cell_is_all_none() {
        let (metric, weight, reps) = decode_weight_reps("").unwrap();
        assert_eq!((metric, weight, reps), (None, None, None));
    }

    #[test]
    fn unknown_unit_fails() {
        assert!(matches!(
            decode_weight_reps("135 stone x 10 reps."),
            Err(ParseError::UnrecognizedUnit(_))
        ));
    }

    #[test]
    fn three_tokens_fail() {
        assert!(matches!(
            decode_weight_reps("1 x 2 x 3"),
            Err(ParseError::MalformedWeightReps(_))
        ));
    }

    #[test]
    fn duration_hhmmss() {
        assert_eq!(decode_duration_hhmmss("01:15:30").unwrap(), 4530);
    }

    #[test]
    fn duration_hhmm_summary_form() {
        assert_eq!(decode_duration_hhmmss("01:15").unwrap(), 4500);
    }

    #[test]
    fn duration_with_unit_labels() {
        assert_eq!(decode_duration_hhmmss("1hr:05min:30sec").unwrap(), 3930);
    }

    #[test]
    fn duration_garbage_fails() {
        assert!(decode_duration_hhmmss("soon").is_err());
    }

    #[test]
    fn rest_time_between_sets() {
        assert_eq!(decode_rest_time("Rest Between Sets 1 min 30 sec").unwrap(), 90);
    }

    #[test]
    fn rest_time_between_exercises() {
        assert_eq!(decode_rest_time("Rest Between Exercises 2 min 0 sec").unwrap(), 120);
    }

    #[test]
    fn rest_time_garbage_fails() {
        assert!(matches!(
            decode_rest_time("no rest recorded"),
            Err(ParseError::MalformedRestTime(_))
        ));
    }

    #[test]
    fn title_without_target() {
        let (tag, target) = decode_set_type_and_target("WEIGHT/REPS:").unwrap();
        assert_eq!(tag, "WEIGHT/REPS");
        assert_eq!(target, None);
    }

    #[test]
    fn title_with_reps_target() {
        let (tag, target) = decode_set_type_and_target("REPS:-TARGET 300 REPS").unwrap();
        assert_eq!(tag, "REPS");
        assert_eq!(target.as_deref(), Some("300"));
    }

    #[test]
    fn title_with_clock_target() {
        let (tag, target) = decode_set_type_and_target("TIME:-TARGET 00:02:00").unwrap();
        assert_eq!(tag, "TIME");
        assert_eq!(target.as_deref(), Some("120"));
    }

    #[test]
    fn title_with_labelled_clock_target() {
        // The label colon survives token stripping as an empty lead component.
        let (_, target) = decode_set_type_and_target("TIME:-TARGET: 00:02:00").unwrap();
        assert_eq!(target.as_deref(), Some("120"));
    }

    #[test]
    fn clock_target_range_takes_lower_bound() {
        let (_, target) =
            decode_set_type_and_target("TIME:-TARGET 00:02:00 to 00:03:00").unwrap();
        assert_eq!(target.as_deref(), Some("120"));
    }

    #[test]
    fn weight_target_strips_unit() {
        let (_, target) = decode_set_type_and_target("WEIGHT:-TARGET 225 lbs.").unwrap();
        assert_eq!(target.as_deref(), Some("225"));
    }

    #[test]
    fn tag_dispatch() {
        assert_eq!(PerformanceKind::from_tag("WEIGHT/REPS"), Some(PerformanceKind::WeightReps));
        assert_eq!(PerformanceKind::from_tag("REPS"), Some(PerformanceKind::Reps));
        assert_eq!(PerformanceKind::from_tag("TIME"), Some(PerformanceKind::Time));
        assert_eq!(PerformanceKind::from_tag("WEIGHT"), Some(PerformanceKind::Weight));
        assert_eq!(PerformanceKind::from_tag("HEARTRATE"), None);
    }
}
