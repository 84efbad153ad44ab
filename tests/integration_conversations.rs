#![allow(clippy::unwrap_used, clippy::panic, missing_debug_implementations, unreachable_pub)]
use reqwest::StatusCode;
use serde_json::{Value, json};
use uuid::Uuid;

mod common;

#[tokio::test]
async fn test_create_or_get_is_symmetric_and_idempotent() {
    let app = common::TestApp::spawn().await;
    let alice = app.register_user("alice").await;
    let bob = app.register_user("bob").await;

    let first = app.conversation_id(&alice, &bob).await;
    let again = app.conversation_id(&alice, &bob).await;
    let reverse = app.conversation_id(&bob, &alice).await;

    assert_eq!(first, again);
    assert_eq!(first, reverse);

    let resp = app.get(&alice.token, &format!("/conversations/{first}")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["participant"]["id"], bob.user_id.to_string());
    assert_eq!(body["unread_count"], 0);
    assert_eq!(body["is_blocked"], false);
    assert!(body.get("last_message").is_none());
}

#[tokio::test]
async fn test_create_conversation_rejects_self_and_unknown_recipient() {
    let app = common::TestApp::spawn().await;
    let alice = app.register_user("alice").await;

    let own = app.open_conversation(&alice, &alice).await;
    assert_eq!(own.status(), StatusCode::BAD_REQUEST);

    let unknown = app
        .post(&alice.token, "/conversations")
        .json(&json!({ "recipient_id": Uuid::new_v4() }))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_non_participant_cannot_read_conversation() {
    let app = common::TestApp::spawn().await;
    let alice = app.register_user("alice").await;
    let bob = app.register_user("bob").await;
    let eve = app.register_user("eve").await;

    let conversation_id = app.conversation_id(&alice, &bob).await;
    app.send_text(&alice, conversation_id, "private").await;

    let resp = app.get(&eve.token, &format!("/conversations/{conversation_id}")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let messages = app.get(&eve.token, &format!("/conversations/{conversation_id}/messages")).send().await.unwrap();
    assert_eq!(messages.status(), StatusCode::FORBIDDEN);

    let send = app.send_raw(&eve, conversation_id, json!({ "message_type": "text", "content": "hi" })).await;
    assert_eq!(send.status(), StatusCode::FORBIDDEN);

    let missing = app.get(&alice.token, &format!("/conversations/{}", Uuid::new_v4())).send().await.unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_orders_by_latest_activity_and_tracks_unread() {
    let app = common::TestApp::spawn().await;
    let alice = app.register_user("alice").await;
    let bob = app.register_user("bob").await;
    let carol = app.register_user("carol").await;

    let with_bob = app.conversation_id(&alice, &bob).await;
    let with_carol = app.conversation_id(&alice, &carol).await;

    app.send_text(&carol, with_carol, "first").await;
    app.send_text(&bob, with_bob, "second").await;
    app.send_text(&bob, with_bob, "third").await;

    let list = app.list_conversations(&alice).await;
    let conversations = list["conversations"].as_array().unwrap();
    assert_eq!(conversations.len(), 2);
    assert_eq!(conversations[0]["id"], with_bob.to_string());
    assert_eq!(conversations[0]["unread_count"], 2);
    assert_eq!(conversations[0]["last_message"]["content"], "third");
    assert_eq!(conversations[0]["last_message"]["sender_id"], bob.user_id.to_string());
    assert_eq!(conversations[1]["id"], with_carol.to_string());

    assert_eq!(list["pagination"]["total"], 2);
    assert_eq!(list["pagination"]["total_unread"], 3);

    // Reading one thread drops it from the unread-only view
    let resp = app.post(&alice.token, &format!("/conversations/{with_bob}/read")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let unread_only = app.get(&alice.token, "/conversations?unread_only=true").send().await.unwrap();
    let body: Value = unread_only.json().await.unwrap();
    let ids: Vec<&str> = body["conversations"].as_array().unwrap().iter().map(|c| c["id"].as_str().unwrap()).collect();
    let expected = with_carol.to_string();
    assert_eq!(ids, vec![expected.as_str()]);
}

#[tokio::test]
async fn test_conversation_list_pagination() {
    let app = common::TestApp::spawn().await;
    let alice = app.register_user("alice").await;

    for i in 0..3 {
        let other = app.register_user(&format!("peer{i}")).await;
        let id = app.conversation_id(&alice, &other).await;
        app.send_text(&alice, id, "hello").await;
    }

    let resp = app.get(&alice.token, "/conversations?page=1&limit=2").send().await.unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["conversations"].as_array().unwrap().len(), 2);
    assert_eq!(body["pagination"]["total_pages"], 2);
    assert_eq!(body["pagination"]["has_more"], true);

    let resp = app.get(&alice.token, "/conversations?page=2&limit=2").send().await.unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["conversations"].as_array().unwrap().len(), 1);
    assert_eq!(body["pagination"]["has_more"], false);
}

#[tokio::test]
async fn test_delete_conversation_is_per_participant() {
    let app = common::TestApp::spawn().await;
    let alice = app.register_user("alice").await;
    let bob = app.register_user("bob").await;

    let conversation_id = app.conversation_id(&alice, &bob).await;
    app.send_text(&alice, conversation_id, "before").await;
    app.send_text(&bob, conversation_id, "reply").await;

    let resp = app.delete(&alice.token, &format!("/conversations/{conversation_id}")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    // Hidden for Alice, unread cleared
    let list = app.list_conversations(&alice).await;
    assert!(list["conversations"].as_array().unwrap().is_empty());
    let unread: Value =
        app.get(&alice.token, "/conversations/unread-count").send().await.unwrap().json().await.unwrap();
    assert_eq!(unread["total_unread"], 0);

    // No preview of the cleared history either
    let view: Value =
        app.get(&alice.token, &format!("/conversations/{conversation_id}")).send().await.unwrap().json().await.unwrap();
    assert!(view.get("last_message").is_none());
    assert_eq!(view["unread_count"], 0);
    let reopened: Value = app.open_conversation(&alice, &bob).await.json().await.unwrap();
    assert!(reopened.get("last_message").is_none());
    let bob_view: Value =
        app.get(&bob.token, &format!("/conversations/{conversation_id}")).send().await.unwrap().json().await.unwrap();
    assert_eq!(bob_view["last_message"]["content"], "reply");

    // Bob still sees everything
    let bob_list = app.list_conversations(&bob).await;
    assert_eq!(bob_list["conversations"].as_array().unwrap().len(), 1);
    let bob_history = app.list_messages(&bob, conversation_id).await;
    assert_eq!(bob_history["messages"].as_array().unwrap().len(), 2);

    // A new message brings the thread back for Alice, without the cleared history
    app.send_text(&bob, conversation_id, "after").await;

    let list = app.list_conversations(&alice).await;
    let conversations = list["conversations"].as_array().unwrap();
    assert_eq!(conversations.len(), 1);
    assert_eq!(conversations[0]["last_message"]["content"], "after");

    let history = app.list_messages(&alice, conversation_id).await;
    let messages = history["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["content"], "after");
    let view: Value =
        app.get(&alice.token, &format!("/conversations/{conversation_id}")).send().await.unwrap().json().await.unwrap();
    assert_eq!(view["last_message"]["content"], "after");

    // Reopening returns the same conversation
    assert_eq!(app.conversation_id(&alice, &bob).await, conversation_id);
}

#[tokio::test]
async fn test_unread_counts_skip_messages_hidden_by_clear() {
    let app = common::TestApp::spawn().await;
    let alice = app.register_user("alice").await;
    let bob = app.register_user("bob").await;

    let conversation_id = app.conversation_id(&alice, &bob).await;
    app.send_text(&bob, conversation_id, "hello").await;
    let resp = app.delete(&alice.token, &format!("/conversations/{conversation_id}")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    // A message that committed after the clear but was stamped before it
    sqlx::query(
        r"
        INSERT INTO messages (conversation_id, sender_id, message_type, content, is_read, created_at)
        SELECT id, $2, 'text', 'in flight', FALSE,
               CASE WHEN user1_id = $3 THEN user1_cleared_at ELSE user2_cleared_at END - INTERVAL '1 millisecond'
        FROM conversations WHERE id = $1
        ",
    )
    .bind(conversation_id)
    .bind(bob.user_id)
    .bind(alice.user_id)
    .execute(&app.pool)
    .await
    .unwrap();

    let history = app.list_messages(&alice, conversation_id).await;
    assert!(history["messages"].as_array().unwrap().is_empty());

    let unread: Value =
        app.get(&alice.token, "/conversations/unread-count").send().await.unwrap().json().await.unwrap();
    assert_eq!(unread["total_unread"], 0);
    assert_eq!(unread["unread_conversations"], 0);

    let view: Value =
        app.get(&alice.token, &format!("/conversations/{conversation_id}")).send().await.unwrap().json().await.unwrap();
    assert_eq!(view["unread_count"], 0);

    // Messages after the clear still count
    app.send_text(&bob, conversation_id, "fresh").await;
    let unread: Value =
        app.get(&alice.token, "/conversations/unread-count").send().await.unwrap().json().await.unwrap();
    assert_eq!(unread["total_unread"], 1);
    let list = app.list_conversations(&alice).await;
    assert_eq!(list["conversations"][0]["unread_count"], 1);
    assert_eq!(list["pagination"]["total_unread"], 1);
}
