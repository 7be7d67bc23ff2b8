/// Average review score rounded half-up, or `None` when there are no reviews.
///
/// Scores are positive, so `(2 * sum + count) / (2 * count)` is the half-up
/// rounding of `sum / count` without going through floating point.
pub fn average_rating(score_sum: i64, review_count: i64) -> Option<i32> {
    if review_count <= 0 {
        return None;
    }
    let rounded = (2 * score_sum + review_count) / (2 * review_count);
    i32::try_from(rounded).ok()
}
