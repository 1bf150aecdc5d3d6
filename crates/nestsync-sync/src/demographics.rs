//! Routing of `follower_demographics` breakdown segments into fixed slots.

use nestsync_core::DemographicSlots;
use nestsync_meta::GraphInsight;

/// What a breakdown segment describes, from its `dimension_keys`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    City,
    Country,
    Age,
    Gender,
    Locale,
}

/// Classifies a segment. A segment naming `age` is an age segment even when
/// it also names `gender`; otherwise the first recognised key decides.
#[must_use]
pub fn classify(dimension_keys: &[String]) -> Option<Segment> {
    if dimension_keys.iter().any(|k| k == "age") {
        return Some(Segment::Age);
    }
    dimension_keys.iter().find_map(|key| match key.as_str() {
        "city" => Some(Segment::City),
        "country" => Some(Segment::Country),
        "gender" => Some(Segment::Gender),
        "locale" => Some(Segment::Locale),
        _ => None,
    })
}

/// Routes every breakdown of every metric into the four slots. Segment
/// `results` are stored as-is. A gender-only segment fills the age/gender
/// slot only while it is empty, so an age breakdown always wins.
#[must_use]
pub fn route_demographics(data: &[GraphInsight]) -> DemographicSlots {
    let mut slots = DemographicSlots::default();

    let segments = data
        .iter()
        .filter_map(|metric| metric.total_value.as_ref())
        .flat_map(|total| total.breakdowns.iter());

    for segment in segments {
        let payload = segment.results.clone();
        match classify(&segment.dimension_keys) {
            Some(Segment::City) => slots.city = Some(payload),
            Some(Segment::Country) => slots.country = Some(payload),
            Some(Segment::Age) => slots.age_gender = Some(payload),
            Some(Segment::Gender) => {
                if slots.age_gender.is_none() {
                    slots.age_gender = Some(payload);
                }
            }
            Some(Segment::Locale) => slots.locale = Some(payload),
            None => {
                tracing::debug!(
                    dimension_keys = ?segment.dimension_keys,
                    "ignoring demographic segment with unknown dimensions"
                );
            }
        }
    }

    slots
}
