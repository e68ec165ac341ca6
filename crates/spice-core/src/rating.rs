//! Rating bounds and aggregation.

/// Lowest accepted star rating.
pub const RATING_MIN: i32 = 1;

/// Highest accepted star rating.
pub const RATING_MAX: i32 = 10;

/// Returns `true` if `rating` lies in `[RATING_MIN, RATING_MAX]`.
#[inline]
pub fn is_valid_rating(rating: i32) -> bool {
    (RATING_MIN..=RATING_MAX).contains(&rating)
}

/// Arithmetic mean of the given ratings, or `None` when there are none.
pub fn mean_rating<I>(ratings: I) -> Option<f64>
where
    I: IntoIterator<Item = i32>,
{
    let (sum, count) = ratings
        .into_iter()
        .fold((0i64, 0u64), |(sum, count), r| (sum + i64::from(r), count + 1));
    if count == 0 {
        None
    } else {
        Some(sum as f64 / count as f64)
    }
}
