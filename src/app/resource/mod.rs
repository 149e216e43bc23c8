//! Request and response bodies of the API.

pub mod admin;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod dish;
pub mod order;
pub mod producer;
pub mod review;
pub mod user;

use serde::{ser::SerializeMap, Deserialize, Deserializer, Serialize, Serializer};

use crate::base::Pagination;

/// Mark a field as sent, keeping an explicit `null`.
///
/// Paired with `#[serde(default)]`, an absent field stays `None` while
/// `null` becomes `Some(None)`, so patches can clear nullable columns.
pub(crate) fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// `{"message": ...}`, optionally with one named payload.
#[derive(Debug, Clone)]
pub struct Message<T = ()> {
    pub message: &'static str,
    pub payload: Option<(&'static str, T)>,
}

impl Message {
    pub fn new(message: &'static str) -> Self {
        Self {
            message,
            payload: None,
        }
    }
}

impl<T> Message<T> {
    pub fn with(message: &'static str, key: &'static str, value: T) -> Self {
        Self {
            message,
            payload: Some((key, value)),
        }
    }
}

impl<T: Serialize> Serialize for Message<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("message", self.message)?;
        if let Some((key, value)) = &self.payload {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Single named entry, such as `{"dishes": [...]}`.
#[derive(Debug, Clone)]
pub struct Keyed<T>(pub &'static str, pub T);

impl<T: Serialize> Serialize for Keyed<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.0, &self.1)?;
        map.end()
    }
}

/// Page of a listing under its collection name.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub key: &'static str,
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub pages: i64,
}

impl<T> Page<T> {
    pub fn new(key: &'static str, items: Vec<T>, total: i64, pagination: Pagination) -> Self {
        Self {
            key,
            items,
            total,
            page: pagination.page,
            per_page: pagination.per_page,
            pages: pagination.pages(total),
        }
    }

    pub fn empty(key: &'static str, pagination: Pagination) -> Self {
        Self::new(key, Vec::new(), 0, pagination)
    }
}

impl<T: Serialize> Serialize for Page<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(5))?;
        map.serialize_entry(self.key, &self.items)?;
        map.serialize_entry("total", &self.total)?;
        map.serialize_entry("page", &self.page)?;
        map.serialize_entry("per_page", &self.per_page)?;
        map.serialize_entry("pages", &self.pages)?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "present")]
        bio: Option<Option<String>>,
    }

    #[test]
    fn absent_null_and_value() {
        let absent: Patch = serde_json::from_value(json!({})).unwrap();
        let null: Patch = serde_json::from_value(json!({ "bio": null })).unwrap();
        let value: Patch = serde_json::from_value(json!({ "bio": "Home cook" })).unwrap();

        assert_eq!(absent.bio, None);
        assert_eq!(null.bio, Some(None));
        assert_eq!(value.bio, Some(Some("Home cook".into())));
    }

    #[test]
    fn page_body() {
        let page = Page::new("dishes", vec![1, 2], 41, Pagination::new(Some(2), None, 20));

        assert_eq!(
            serde_json::to_value(&page).unwrap(),
            json!({ "dishes": [1, 2], "total": 41, "page": 2, "per_page": 20, "pages": 3 })
        );
    }

    #[test]
    fn message_body() {
        assert_eq!(
            serde_json::to_value(Message::new("Logged out successfully")).unwrap(),
            json!({ "message": "Logged out successfully" })
        );
        assert_eq!(
            serde_json::to_value(Message::with("Cart item updated successfully", "cart_item", None::<i64>))
                .unwrap(),
            json!({ "message": "Cart item updated successfully", "cart_item": null })
        );
        assert_eq!(
            serde_json::to_value(Keyed("producers", Vec::<i64>::new())).unwrap(),
            json!({ "producers": [] })
        );
    }
}
