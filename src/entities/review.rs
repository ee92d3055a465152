// ✍️ Review Entity - belongs to one Place, written by one User

use super::base::Base;
use super::fields::{self, Payload};
use crate::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(flatten)]
    pub base: Base,

    #[serde(default)]
    pub place_id: String,

    #[serde(default)]
    pub user_id: String,

    #[serde(default)]
    pub text: String,
}

impl Review {
    pub fn new(place_id: String, user_id: String, text: String) -> Self {
        Review {
            base: Base::new(),
            place_id,
            user_id,
            text,
        }
    }

    /// Requires `user_id` then `text`; the place comes from the caller.
    pub fn from_payload(place_id: &str, payload: &Payload) -> Result<Self> {
        let user_id = fields::required_string(payload, "user_id")?;
        let text = fields::required_string(payload, "text")?;
        Ok(Review::new(place_id.to_string(), user_id, text))
    }

    /// Mutable: `text`. `place_id` and `user_id` are immutable.
    pub fn apply_update(&mut self, payload: &Payload) -> Result<()> {
        for (key, value) in payload {
            if key == "text" {
                self.text = fields::string(key, value)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_review_required_fields() {
        let no_user = json!({"text": "Lovely"});
        let err = Review::from_payload("place-1", no_user.as_object().unwrap()).unwrap_err();
        assert_eq!(err.to_string(), "Missing user_id");

        let no_text = json!({"user_id": "user-1"});
        let err = Review::from_payload("place-1", no_text.as_object().unwrap()).unwrap_err();
        assert_eq!(err.to_string(), "Missing text");
    }

    #[test]
    fn test_review_update_keeps_references() {
        let mut review = Review::new(
            "place-1".to_string(),
            "user-1".to_string(),
            "Great stay".to_string(),
        );
        let payload = json!({
            "text": "Noisy at night",
            "place_id": "place-2",
            "user_id": "user-2"
        });

        review.apply_update(payload.as_object().unwrap()).unwrap();

        assert_eq!(review.text, "Noisy at night");
        assert_eq!(review.place_id, "place-1");
        assert_eq!(review.user_id, "user-1");
    }
}
