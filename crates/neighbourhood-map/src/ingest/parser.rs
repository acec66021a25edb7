use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

use crate::store::PRICE_SENTINELS;

#[derive(Debug, Deserialize)]
pub(crate) struct NeighbourhoodRow {
    pub(crate) neighbourhood: String,
    pub(crate) latitude: f64,
    pub(crate) longitude: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HostRow {
    pub(crate) host_id: i64,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) host_since: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) host_is_superhost: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListingRow {
    pub(crate) id: i64,
    pub(crate) host_id: i64,
    pub(crate) neighbourhood: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) review_scores_rating: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) price: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) room_type: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) accommodates: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) bedrooms: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) beds: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) minimum_nights: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) number_of_reviews: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) availability_365: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) instant_bookable: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) last_review: Option<String>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

pub(crate) fn parse_bool(value: Option<&str>) -> Result<bool, String> {
    match value.map(|raw| raw.trim().to_ascii_lowercase()).as_deref() {
        None => Ok(false),
        Some("t" | "true" | "1" | "y" | "yes") => Ok(true),
        Some("f" | "false" | "0" | "n" | "no") => Ok(false),
        Some(other) => Err(format!("'{other}' is not a boolean")),
    }
}

pub(crate) fn parse_date(value: Option<&str>) -> Result<Option<NaiveDate>, String> {
    value
        .map(|raw| {
            NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
        })
        .transpose()
}

pub(crate) fn is_sentinel(raw: &str) -> bool {
    PRICE_SENTINELS.contains(&raw.trim().to_ascii_lowercase().as_str())
}

/// Numeric column where upstream placeholders mean "not recorded".
pub(crate) fn parse_optional_number<T: std::str::FromStr>(
    value: Option<&str>,
    column: &str,
) -> Result<Option<T>, String> {
    match value.map(str::trim) {
        None => Ok(None),
        Some(raw) if is_sentinel(raw) => Ok(None),
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| format!("{column} '{raw}' is not a number")),
    }
}

/// Ratings are stored on a 0–5 scale. Exports on a 0–100 scale are not
/// rescaled; they are rejected so the mistake is visible.
pub(crate) fn parse_rating(value: Option<&str>) -> Result<Option<f64>, String> {
    let rating = parse_optional_number::<f64>(value, "review_scores_rating")?
        .filter(|rating| rating.is_finite());
    match rating {
        Some(rating) if !(0.0..=5.0).contains(&rating) => Err(format!(
            "review_scores_rating {rating} is outside the 0-5 scale"
        )),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booleans_accept_listing_export_flags() {
        assert_eq!(parse_bool(Some("t")), Ok(true));
        assert_eq!(parse_bool(Some("FALSE")), Ok(false));
        assert_eq!(parse_bool(None), Ok(false));
        assert!(parse_bool(Some("maybe")).is_err());
    }

    #[test]
    fn dates_are_iso_formatted() {
        assert_eq!(
            parse_date(Some("2016-05-02")),
            Ok(NaiveDate::from_ymd_opt(2016, 5, 2))
        );
        assert_eq!(parse_date(None), Ok(None));
        assert!(parse_date(Some("05/02/2016")).is_err());
    }

    #[test]
    fn sentinel_numbers_become_none() {
        assert_eq!(parse_optional_number::<i64>(Some("N/A"), "beds"), Ok(None));
        assert_eq!(parse_optional_number::<i64>(Some("3"), "beds"), Ok(Some(3)));
        assert!(parse_optional_number::<i64>(Some("3.5"), "beds").is_err());
    }

    #[test]
    fn ratings_must_be_on_five_point_scale() {
        assert_eq!(parse_rating(Some("4.87")), Ok(Some(4.87)));
        assert_eq!(parse_rating(Some("NaN")), Ok(None));
        assert!(parse_rating(Some("97")).is_err());
    }
}
