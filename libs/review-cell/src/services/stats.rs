use crate::models::{DoctorReviewStats, RatingCount};

/// Folds raw ratings into the summary shown on a doctor's profile.
/// Every rating value 1..=5 appears in the distribution, zero counts included.
pub fn summarize(ratings: &[u8]) -> DoctorReviewStats {
    let total_reviews = ratings.len() as u64;

    let average_rating = if ratings.is_empty() {
        0.0
    } else {
        let sum: u64 = ratings.iter().map(|&r| u64::from(r)).sum();
        let mean = sum as f64 / total_reviews as f64;
        (mean * 100.0).round() / 100.0
    };

    let rating_distribution = (1..=5u8)
        .map(|rating| RatingCount {
            rating,
            count: ratings.iter().filter(|&&r| r == rating).count() as u64,
        })
        .collect();

    DoctorReviewStats {
        total_reviews,
        average_rating,
        rating_distribution,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_reviews_averages_zero() {
        let stats = summarize(&[]);
        assert_eq!(stats.total_reviews, 0);
        assert_eq!(stats.average_rating, 0.0);
        assert_eq!(stats.rating_distribution.len(), 5);
        assert!(stats.rating_distribution.iter().all(|c| c.count == 0));
    }

    #[test]
    fn average_is_rounded_to_cents() {
        let stats = summarize(&[5, 4, 4]);
        assert_eq!(stats.total_reviews, 3);
        assert_eq!(stats.average_rating, 4.33);
        assert_eq!(stats.rating_distribution[3], RatingCount { rating: 4, count: 2 });
        assert_eq!(stats.rating_distribution[4], RatingCount { rating: 5, count: 1 });
        assert_eq!(stats.rating_distribution[0], RatingCount { rating: 1, count: 0 });
    }
}
