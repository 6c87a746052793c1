//! Tests for the chat router.

#[cfg(test)]
mod router_tests {
    use std::sync::Arc;

    use serde_json::{json, Value};
    use tokio::task::JoinSet;

    use crate::chat::{
        ChatCommand, ChatRouter, ClientRegistry, CommandReply, MessageKind, PostMessageRequest,
        Rejection, RoomStore, UpdateSessionRequest, DEFAULT_USERNAME, HISTORY_LIMIT,
    };

    fn router() -> ChatRouter {
        ChatRouter::new(Arc::new(RoomStore::new()), Arc::new(ClientRegistry::new()))
    }

    async fn history_texts(router: &ChatRouter, room: &str) -> Vec<String> {
        router
            .history(room)
            .await
            .body
            .unwrap()
            .messages
            .into_iter()
            .map(|m| m.text)
            .collect()
    }

    #[tokio::test]
    async fn test_post_message_success() {
        let router = router();
        let request = PostMessageRequest::new("lobby", "hello").with_username("Alice");

        let reply = router.post_message("10.0.0.1", request).await;
        assert!(reply.success);
        assert!(reply.error.is_none());

        let message = reply.body.unwrap().message;
        assert_eq!(message.kind, MessageKind::Message);
        assert_eq!(message.text, "hello");
        assert_eq!(message.room, "lobby");
        assert_eq!(message.username, "Alice");

        let session = router.clients().get("10.0.0.1").await.unwrap();
        assert_eq!(session.username, "Alice");
        assert_eq!(session.room.as_deref(), Some("lobby"));
    }

    #[tokio::test]
    async fn test_history_cap_keeps_last_posted() {
        let router = router();
        let total = HISTORY_LIMIT + 25;
        for i in 0..total {
            let reply = router
                .post_message("10.0.0.1", PostMessageRequest::new("lobby", format!("msg {i}")))
                .await;
            assert!(reply.success);
        }

        let expected: Vec<String> = (total - HISTORY_LIMIT..total).map(|i| format!("msg {i}")).collect();
        assert_eq!(history_texts(&router, "lobby").await, expected);
    }

    #[tokio::test]
    async fn test_room_auto_creation() {
        let router = router();
        let before = router.list_rooms().await.body.unwrap().rooms;
        assert!(!before.contains(&"X".to_string()));

        router.post_message("10.0.0.1", PostMessageRequest::new("X", "first")).await;

        let after = router.list_rooms().await;
        assert!(after.success);
        assert!(after.body.unwrap().rooms.contains(&"X".to_string()));
    }

    #[tokio::test]
    async fn test_unknown_room_history() {
        let router = router();
        let reply = router.history("nonexistent").await;

        assert!(reply.success);
        let history = reply.body.unwrap();
        assert_eq!(history.room, "nonexistent");
        assert!(history.messages.is_empty());
    }

    #[tokio::test]
    async fn test_history_read_is_idempotent() {
        let router = router();
        router.post_message("10.0.0.1", PostMessageRequest::new("lobby", "a")).await;
        router.post_message("10.0.0.2", PostMessageRequest::new("lobby", "b")).await;

        let first = router.history("lobby").await;
        let second = router.history("lobby").await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_rename_posts_system_message() {
        let router = router();
        router
            .post_message("10.0.0.1", PostMessageRequest::new("lobby", "hi").with_username("Alice"))
            .await;
        let before = router.history("lobby").await.body.unwrap().messages.len();

        let reply = router
            .update_session("10.0.0.1", UpdateSessionRequest::username("Bob"))
            .await;
        assert!(reply.success);

        let messages = router.history("lobby").await.body.unwrap().messages;
        assert_eq!(messages.len(), before + 1);
        let last = messages.last().unwrap();
        assert_eq!(last.kind, MessageKind::System);
        assert_eq!(last.text, "Alice's nickname is now Bob");
        assert_eq!(router.clients().get("10.0.0.1").await.unwrap().username, "Bob");
    }

    #[tokio::test]
    async fn test_rename_does_not_rewrite_history() {
        let router = router();
        router
            .post_message("10.0.0.1", PostMessageRequest::new("lobby", "hi").with_username("Alice"))
            .await;
        router
            .update_session("10.0.0.1", UpdateSessionRequest::username("Bob"))
            .await;

        let messages = router.history("lobby").await.body.unwrap().messages;
        assert_eq!(messages[0].username, "Alice");
    }

    #[tokio::test]
    async fn test_rename_without_room_posts_nothing() {
        let router = router();
        router.clients().touch("10.0.0.1").await;

        let reply = router
            .update_session("10.0.0.1", UpdateSessionRequest::username("Bob"))
            .await;
        assert!(reply.success);
        assert!(router.list_rooms().await.body.unwrap().rooms.is_empty());
    }

    #[tokio::test]
    async fn test_rename_blank_falls_back_to_default() {
        let router = router();
        router
            .post_message("10.0.0.1", PostMessageRequest::new("lobby", "hi").with_username("Alice"))
            .await;
        router
            .update_session("10.0.0.1", UpdateSessionRequest::username("   "))
            .await;

        assert_eq!(router.clients().get("10.0.0.1").await.unwrap().username, DEFAULT_USERNAME);
    }

    #[tokio::test]
    async fn test_rename_unknown_client() {
        let router = router();
        let reply = router
            .update_session("10.9.9.9", UpdateSessionRequest::username("Bob"))
            .await;

        assert!(!reply.success);
        assert_eq!(reply.error, Some(Rejection::UnknownUpdateType));
    }

    #[tokio::test]
    async fn test_unrecognized_update_type() {
        let router = router();
        router.post_message("10.0.0.1", PostMessageRequest::new("lobby", "hi")).await;

        let request = UpdateSessionRequest {
            kind: "typing".to_string(),
            username: None,
        };
        let reply = router.update_session("10.0.0.1", request).await;
        assert_eq!(reply.error, Some(Rejection::InvalidRequest));
    }

    #[tokio::test]
    async fn test_invalid_post_has_no_side_effect() {
        let router = router();
        router.post_message("10.0.0.1", PostMessageRequest::new("lobby", "first")).await;
        let before = history_texts(&router, "lobby").await;

        let reply = router.post_message("10.0.0.2", PostMessageRequest::new("lobby", "")).await;
        assert!(!reply.success);
        assert_eq!(reply.error, Some(Rejection::InvalidRequest));
        assert!(reply.body.is_none());

        assert_eq!(history_texts(&router, "lobby").await, before);
        assert!(router.clients().get("10.0.0.2").await.is_none());
    }

    #[tokio::test]
    async fn test_post_rejections() {
        let router = router();

        let blank_text = PostMessageRequest::new("lobby", "   ");
        let blank_room = PostMessageRequest::new("", "hello");
        let mut wrong_type = PostMessageRequest::new("lobby", "hello");
        wrong_type.kind = "system".to_string();

        for request in [blank_text, blank_room, wrong_type, PostMessageRequest::default()] {
            let reply = router.post_message("10.0.0.1", request).await;
            assert_eq!(reply.error, Some(Rejection::InvalidRequest));
        }
        assert!(router.list_rooms().await.body.unwrap().rooms.is_empty());
    }

    #[tokio::test]
    async fn test_post_stores_trimmed_text_and_room() {
        let router = router();
        let reply = router.post_message("10.0.0.1", PostMessageRequest::new(" lobby ", "  hi  ")).await;

        let message = reply.body.unwrap().message;
        assert_eq!(message.room, "lobby");
        assert_eq!(message.text, "hi");
        assert_eq!(history_texts(&router, "lobby").await, vec!["hi"]);
        assert_eq!(router.list_rooms().await.body.unwrap().rooms, vec!["lobby"]);
    }

    #[tokio::test]
    async fn test_post_without_username_uses_session_name() {
        let router = router();
        let first = router.post_message("10.0.0.1", PostMessageRequest::new("lobby", "a")).await;
        assert_eq!(first.body.unwrap().message.username, DEFAULT_USERNAME);

        router
            .post_message("10.0.0.1", PostMessageRequest::new("lobby", "b").with_username("Dana"))
            .await;
        let third = router.post_message("10.0.0.1", PostMessageRequest::new("lobby", "c")).await;
        assert_eq!(third.body.unwrap().message.username, "Dana");
    }

    #[tokio::test]
    async fn test_reply_to_is_carried() {
        let router = router();
        let quote = json!({"id": "abcd1234", "username": "Alice", "text": "original"});
        let reply = router
            .post_message(
                "10.0.0.1",
                PostMessageRequest::new("lobby", "answer").with_reply_to(quote.clone()),
            )
            .await;

        assert_eq!(reply.body.unwrap().message.reply_to, quote);
        assert_eq!(router.history("lobby").await.body.unwrap().messages[0].reply_to, quote);
    }

    #[tokio::test]
    async fn test_dispatch_routes_on_type() {
        let router = router();

        let posted = router
            .dispatch("10.0.0.1", ChatCommand::from_value(json!({"type": "message", "text": "hi", "room": "r"})))
            .await;
        assert!(matches!(posted, CommandReply::Posted(ref r) if r.success));

        let renamed = router
            .dispatch("10.0.0.1", ChatCommand::from_value(json!({"type": "username", "username": "Eve"})))
            .await;
        assert!(matches!(renamed, CommandReply::Updated(ref r) if r.success));

        let unknown = router
            .dispatch("10.0.0.1", ChatCommand::from_value(json!({"type": "typing"})))
            .await;
        assert!(!unknown.success());
        assert_eq!(
            serde_json::to_value(&unknown).unwrap(),
            json!({"success": false, "error": "Invalid request"})
        );

        let empty = router.dispatch("10.0.0.1", ChatCommand::from_value(Value::Null)).await;
        assert!(!empty.success());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_posts_to_one_room() {
        let router = router();
        let clients = 40;

        let mut tasks = JoinSet::new();
        for i in 0..clients {
            let router = router.clone();
            tasks.spawn(async move {
                let client_id = format!("10.0.1.{i}");
                router
                    .post_message(&client_id, PostMessageRequest::new("busy", format!("from {i}")))
                    .await
            });
        }
        while let Some(result) = tasks.join_next().await {
            assert!(result.unwrap().success);
        }

        let mut texts = history_texts(&router, "busy").await;
        assert_eq!(texts.len(), clients);
        texts.sort();
        texts.dedup();
        assert_eq!(texts.len(), clients, "a message was lost or duplicated");
        assert_eq!(router.clients().len().await, clients);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_overflow_stays_capped() {
        let router = router();
        let posts = HISTORY_LIMIT * 3;

        let mut tasks = JoinSet::new();
        for i in 0..posts {
            let router = router.clone();
            tasks.spawn(async move {
                router
                    .post_message("10.0.2.1", PostMessageRequest::new("flood", i.to_string()))
                    .await
                    .success
            });
        }
        while let Some(result) = tasks.join_next().await {
            assert!(result.unwrap());
        }

        let messages = router.history("flood").await.body.unwrap().messages;
        assert_eq!(messages.len(), HISTORY_LIMIT);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_rooms_are_independent() {
        let router = router();

        let mut tasks = JoinSet::new();
        for room in 0..8 {
            for i in 0..10 {
                let router = router.clone();
                tasks.spawn(async move {
                    router
                        .post_message("10.0.3.1", PostMessageRequest::new(format!("room-{room}"), i.to_string()))
                        .await;
                });
            }
        }
        while let Some(result) = tasks.join_next().await {
            result.unwrap();
        }

        let rooms = router.list_rooms().await.body.unwrap().rooms;
        assert_eq!(rooms.len(), 8);
        for room in rooms {
            assert_eq!(router.history(&room).await.body.unwrap().messages.len(), 10);
        }
    }
}
