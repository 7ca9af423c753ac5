//! Product reviews.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use stern_core::ReviewId;

use super::clean_optional;

const MIN_RATING: i16 = 1;
const MAX_RATING: i16 = 5;

/// A published review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub review_id: ReviewId,
    pub rating: i16,
    pub comment: Option<String>,
    pub customer_name: String,
    pub created_at: DateTime<Utc>,
}

/// Reviews of one product with their count and average rating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewSummary {
    pub total: usize,
    /// Mean rating rounded to one decimal; zero without reviews.
    pub average: Decimal,
    pub reviews: Vec<Review>,
}

impl ReviewSummary {
    /// Summarize reviews already sorted newest first.
    #[must_use]
    pub fn new(reviews: Vec<Review>) -> Self {
        let total = reviews.len();
        let average = if total == 0 {
            Decimal::ZERO
        } else {
            let sum: i64 = reviews.iter().map(|r| i64::from(r.rating)).sum();
            (Decimal::from(sum) / Decimal::from(total))
                .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
        };

        Self {
            total,
            average,
            reviews,
        }
    }
}

/// Body of `POST /api/products/{id}/reviews`.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewInput {
    pub rating: Option<i16>,
    pub comment: Option<String>,
}

/// A validated review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReview {
    pub rating: i16,
    pub comment: Option<String>,
}

impl ReviewInput {
    /// Check the rating range and trim the comment.
    ///
    /// # Errors
    ///
    /// Returns a message when the rating is missing or outside 1..=5.
    pub fn validate(self) -> Result<NewReview, String> {
        let rating = self.rating.ok_or_else(|| "rating is required".to_owned())?;
        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(format!(
                "rating must be between {MIN_RATING} and {MAX_RATING}"
            ));
        }

        Ok(NewReview {
            rating,
            comment: clean_optional(self.comment),
        })
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn review(id: i64, rating: i16) -> Review {
        Review {
            review_id: ReviewId::new(id),
            rating,
            comment: None,
            customer_name: "Ana".into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_summary_average_rounds_to_one_decimal() {
        let summary = ReviewSummary::new(vec![review(1, 5), review(2, 4), review(3, 4)]);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.average, dec!(4.3));
    }

    #[test]
    fn test_summary_without_reviews() {
        let summary = ReviewSummary::new(Vec::new());
        assert_eq!(summary.total, 0);
        assert_eq!(summary.average, Decimal::ZERO);
    }

    #[test]
    fn test_review_input_validation() {
        let ok = ReviewInput {
            rating: Some(5),
            comment: Some("  ".into()),
        }
        .validate();
        assert_eq!(
            ok,
            Ok(NewReview {
                rating: 5,
                comment: None
            })
        );

        let out_of_range = ReviewInput {
            rating: Some(6),
            comment: None,
        };
        assert!(out_of_range.validate().is_err());

        let missing = ReviewInput {
            rating: None,
            comment: None,
        };
        assert_eq!(missing.validate(), Err("rating is required".to_owned()));
    }
}
