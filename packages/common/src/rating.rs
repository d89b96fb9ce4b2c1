use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Lowest accepted star rating.
pub const MIN_RATING: i32 = 1;
/// Highest accepted star rating.
pub const MAX_RATING: i32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RatingError {
    #[error("Rating must be between 1 and 5, got {0}")]
    OutOfRange(i32),
}

/// A validated star rating in `1..=5`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Rating(u8);

impl Rating {
    pub fn new(value: i32) -> Result<Self, RatingError> {
        if (MIN_RATING..=MAX_RATING).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(RatingError::OutOfRange(value))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Every rating value, lowest first.
    pub fn all() -> impl Iterator<Item = Rating> {
        (MIN_RATING..=MAX_RATING).map(|v| Rating(v as u8))
    }
}

impl TryFrom<i32> for Rating {
    type Error = RatingError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for i32 {
    fn from(r: Rating) -> Self {
        r.0 as i32
    }
}

impl<'de> Deserialize<'de> for Rating {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = i32::deserialize(deserializer)?;
        Rating::new(value).map_err(serde::de::Error::custom)
    }
}

/// Round to one decimal place, halves away from zero (`4.25` -> `4.3`).
pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Aggregate view over a set of approved reviews.
#[derive(Clone, Debug, PartialEq, Serialize, utoipa::ToSchema)]
pub struct RatingSummary {
    /// Mean rating rounded to one decimal; `0` when there are no reviews.
    #[schema(example = 4.3)]
    pub average_rating: f64,
    /// Number of approved reviews.
    #[schema(example = 4)]
    pub total_reviews: u64,
    /// Number of approved reviews from verified purchases.
    #[schema(example = 2)]
    pub verified_reviews_count: u64,
    /// Count per rating value; keys 1 through 5 are always present.
    pub rating_distribution: BTreeMap<u8, u64>,
}

impl RatingSummary {
    /// Summary of an empty review set.
    pub fn empty() -> Self {
        Self {
            average_rating: 0.0,
            total_reviews: 0,
            verified_reviews_count: 0,
            rating_distribution: Rating::all().map(|r| (r.get(), 0)).collect(),
        }
    }

    /// Fold `(rating, is_verified)` pairs of approved reviews.
    ///
    /// Values outside `1..=5` cannot be stored, but are skipped here rather
    /// than counted under a key that does not exist.
    pub fn from_reviews<I>(reviews: I) -> Self
    where
        I: IntoIterator<Item = (i32, bool)>,
    {
        let mut summary = Self::empty();
        let mut sum: u64 = 0;

        for (value, is_verified) in reviews {
            let Ok(rating) = Rating::new(value) else {
                tracing::warn!(value, "Skipping out-of-range rating");
                continue;
            };
            sum += rating.get() as u64;
            summary.total_reviews += 1;
            if is_verified {
                summary.verified_reviews_count += 1;
            }
            *summary
                .rating_distribution
                .entry(rating.get())
                .or_default() += 1;
        }

        if summary.total_reviews > 0 {
            summary.average_rating = round_to_tenth(sum as f64 / summary.total_reviews as f64);
        }
        summary
    }
}

/// Unrounded mean of `ratings`; `0` for an empty set.
pub fn mean_rating<I>(ratings: I) -> f64
where
    I: IntoIterator<Item = i32>,
{
    let (sum, count) = ratings
        .into_iter()
        .fold((0i64, 0u64), |(sum, count), r| (sum + r as i64, count + 1));
    if count == 0 {
        0.0
    } else {
        sum as f64 / count as f64
    }
}
