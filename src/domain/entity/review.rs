use chrono::{DateTime, Utc};

use crate::domain::datatype::list::parse_list;

use super::{impl_entity, EntityData};

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct ReviewState {
    pub user_id: i64,
    pub dish_id: Option<i64>,
    pub producer_id: Option<i64>,
    pub order_id: Option<i64>,
    pub rating: i32,
    pub comment: Option<String>,
    pub tags: Option<String>,
    pub is_verified: bool,
    pub is_visible: bool,
    pub producer_response: Option<String>,
    pub producer_response_at: Option<DateTime<Utc>>,
}

pub fn is_valid_rating(rating: i64) -> bool {
    (MIN_RATING as i64..=MAX_RATING as i64).contains(&rating)
}

#[derive(Debug, Clone)]
pub struct Review {
    pub(in crate::domain) data: EntityData,
    pub state: ReviewState,
}

impl_entity!(Review, ReviewState);

impl Review {
    pub fn tags(&self) -> Vec<String> {
        parse_list(self.state.tags.as_deref())
    }

    pub fn respond(&mut self, response: String, now: DateTime<Utc>) {
        self.state.producer_response = Some(response);
        self.state.producer_response_at = Some(now);
    }

    pub fn hide(&mut self) {
        self.state.is_visible = false;
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn rating_bounds() {
        assert!(is_valid_rating(1));
        assert!(is_valid_rating(5));
        assert!(!is_valid_rating(0));
        assert!(!is_valid_rating(6));
    }

    #[test]
    fn producer_response() {
        let mut review = Review::restore(
            EntityData::fixture(5),
            ReviewState {
                user_id: 1,
                dish_id: Some(2),
                producer_id: Some(3),
                order_id: None,
                rating: 4,
                comment: Some("Lovely".into()),
                tags: Some(r#"["Perfect taste"]"#.into()),
                is_verified: false,
                is_visible: true,
                producer_response: None,
                producer_response_at: None,
            },
        );
        let now = Utc::now();

        review.respond("Thank you!".into(), now);
        review.hide();

        assert_eq!(review.state.producer_response.as_deref(), Some("Thank you!"));
        assert_eq!(review.state.producer_response_at, Some(now));
        assert!(!review.state.is_visible);
        assert_eq!(review.tags(), vec!["Perfect taste"]);
    }
}
