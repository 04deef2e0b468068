use serde::Serialize;

use crate::db::PostView;
use crate::votes::VoteKind;

/// Everything that goes out over the live feed. One event per
/// counter-changing mutation, delivered to every subscriber.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum FeedEvent {
    PostCreated(PostView),
    VoteChanged(VoteDelta),
    ImpressionChanged(ImpressionDelta),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteDelta {
    pub post_id: String,
    pub upvotes: i64,
    pub downvotes: i64,
    pub user_vote: Option<VoteKind>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpressionDelta {
    pub post_id: String,
    pub impressions: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vote_event_wire_shape() {
        let event = FeedEvent::VoteChanged(VoteDelta {
            post_id: "p1".into(),
            upvotes: 3,
            downvotes: 1,
            user_vote: Some(VoteKind::Upvote),
        });
        let v = serde_json::to_value(&event).unwrap();
        assert_eq!(v["type"], "vote_changed");
        assert_eq!(v["data"]["postId"], "p1");
        assert_eq!(v["data"]["upvotes"], 3);
        assert_eq!(v["data"]["downvotes"], 1);
        assert_eq!(v["data"]["userVote"], "upvote");
    }

    #[test]
    fn removed_vote_serializes_as_null() {
        let event = FeedEvent::VoteChanged(VoteDelta {
            post_id: "p1".into(),
            upvotes: 0,
            downvotes: 0,
            user_vote: None,
        });
        let v = serde_json::to_value(&event).unwrap();
        assert!(v["data"]["userVote"].is_null());
    }

    #[test]
    fn impression_event_wire_shape() {
        let event = FeedEvent::ImpressionChanged(ImpressionDelta {
            post_id: "p2".into(),
            impressions: 7,
        });
        let v = serde_json::to_value(&event).unwrap();
        assert_eq!(v["type"], "impression_changed");
        assert_eq!(v["data"], serde_json::json!({"postId": "p2", "impressions": 7}));
    }
}
