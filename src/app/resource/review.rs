use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    base::resource_id,
    domain::entity::{Entity, Review, User},
};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewReview {
    pub dish_id: Option<i64>,
    pub rating: Option<i64>,
    pub order_id: Option<i64>,
    pub comment: Option<String>,
    pub tags: Option<Value>,
}

resource_id!(NewReview, "review::Review");

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewReply {
    pub response: Option<String>,
}

resource_id!(ReviewReply, "review::Response");

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewAuthor {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewResponse {
    pub id: i64,
    pub user_id: i64,
    pub dish_id: Option<i64>,
    pub producer_id: Option<i64>,
    pub order_id: Option<i64>,
    pub rating: i32,
    pub comment: Option<String>,
    pub tags: Vec<String>,
    pub is_verified: bool,
    pub is_visible: bool,
    pub producer_response: Option<String>,
    pub producer_response_at: Option<DateTime<Utc>>,
    pub user: Option<ReviewAuthor>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

resource_id!(ReviewResponse, "review::Review");

impl ReviewResponse {
    pub fn new(review: &Review, author: Option<&User>) -> Self {
        let state = &review.state;
        Self {
            id: review.ident(),
            user_id: state.user_id,
            dish_id: state.dish_id,
            producer_id: state.producer_id,
            order_id: state.order_id,
            rating: state.rating,
            comment: state.comment.clone(),
            tags: review.tags(),
            is_verified: state.is_verified,
            is_visible: state.is_visible,
            producer_response: state.producer_response.clone(),
            producer_response_at: state.producer_response_at,
            user: author.map(|user| ReviewAuthor {
                id: user.ident(),
                name: user.state.name.clone(),
            }),
            created_at: review.created(),
            updated_at: review.updated(),
        }
    }
}
