#![allow(clippy::unwrap_used, clippy::panic, missing_debug_implementations, unreachable_pub)]
use reqwest::StatusCode;
use serde_json::{Value, json};
use uuid::Uuid;

mod common;

#[tokio::test]
async fn test_send_and_fetch_newest_first() {
    let app = common::TestApp::spawn().await;
    let alice = app.register_user("alice").await;
    let bob = app.register_user("bob").await;
    let conversation_id = app.conversation_id(&alice, &bob).await;

    let sent = app.send_text(&alice, conversation_id, "one").await;
    assert_eq!(sent["conversation_id"], conversation_id.to_string());
    assert_eq!(sent["sender"]["id"], alice.user_id.to_string());
    assert_eq!(sent["message_type"], "text");
    assert_eq!(sent["status"], "sent");
    assert_eq!(sent["is_read"], false);

    app.send_text(&bob, conversation_id, "two").await;
    app.send_text(&alice, conversation_id, "three").await;

    let page = app.list_messages(&bob, conversation_id).await;
    let contents: Vec<&str> =
        page["messages"].as_array().unwrap().iter().map(|m| m["content"].as_str().unwrap()).collect();
    assert_eq!(contents, vec!["three", "two", "one"]);
    assert_eq!(page["pagination"]["total"], 3);

    let resp = app
        .get(&bob.token, &format!("/conversations/{conversation_id}/messages?page=2&limit=2"))
        .send()
        .await
        .unwrap();
    let second: Value = resp.json().await.unwrap();
    assert_eq!(second["messages"].as_array().unwrap().len(), 1);
    assert_eq!(second["messages"][0]["content"], "one");
    assert_eq!(second["pagination"]["has_more"], false);
}

#[tokio::test]
async fn test_message_validation() {
    let app = common::TestApp::spawn().await;
    let alice = app.register_user("alice").await;
    let bob = app.register_user("bob").await;
    let conversation_id = app.conversation_id(&alice, &bob).await;

    let blank = app.send_raw(&alice, conversation_id, json!({ "message_type": "text", "content": "   " })).await;
    assert_eq!(blank.status(), StatusCode::BAD_REQUEST);

    let too_long = app
        .send_raw(&alice, conversation_id, json!({ "message_type": "text", "content": "x".repeat(10_001) }))
        .await;
    assert_eq!(too_long.status(), StatusCode::BAD_REQUEST);

    let bad_type = app.send_raw(&alice, conversation_id, json!({ "message_type": "video", "content": "hi" })).await;
    assert_eq!(bad_type.status(), StatusCode::BAD_REQUEST);

    let no_attachments = app.send_raw(&alice, conversation_id, json!({ "message_type": "image" })).await;
    assert_eq!(no_attachments.status(), StatusCode::BAD_REQUEST);

    let six: Vec<Value> = (0..6).map(common::image_attachment).collect();
    let too_many =
        app.send_raw(&alice, conversation_id, json!({ "message_type": "image", "attachments": six })).await;
    assert_eq!(too_many.status(), StatusCode::BAD_REQUEST);

    // Nothing above was stored
    let page = app.list_messages(&alice, conversation_id).await;
    assert!(page["messages"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_image_message_updates_preview() {
    let app = common::TestApp::spawn().await;
    let alice = app.register_user("alice").await;
    let bob = app.register_user("bob").await;
    let conversation_id = app.conversation_id(&alice, &bob).await;

    let two: Vec<Value> = (0..2).map(common::image_attachment).collect();
    let resp = app.send_raw(&alice, conversation_id, json!({ "message_type": "image", "attachments": two })).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let message: Value = resp.json().await.unwrap();
    assert_eq!(message["attachments"].as_array().unwrap().len(), 2);
    assert_eq!(message["attachments"][0]["type"], "image");

    let list = app.list_conversations(&bob).await;
    assert_eq!(list["conversations"][0]["last_message"]["content"], "📷 Photo");
}

#[tokio::test]
async fn test_soft_delete_hides_message() {
    let app = common::TestApp::spawn().await;
    let alice = app.register_user("alice").await;
    let bob = app.register_user("bob").await;
    let conversation_id = app.conversation_id(&alice, &bob).await;

    let kept = app.send_text(&alice, conversation_id, "keep me").await;
    let doomed = app.send_text(&alice, conversation_id, "delete me").await;
    let doomed_id = doomed["id"].as_str().unwrap();

    // Only the sender may delete
    let foreign = app.delete(&bob.token, &format!("/messages/{doomed_id}")).send().await.unwrap();
    assert_eq!(foreign.status(), StatusCode::FORBIDDEN);

    let resp = app.delete(&alice.token, &format!("/messages/{doomed_id}")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let again = app.delete(&alice.token, &format!("/messages/{doomed_id}")).send().await.unwrap();
    assert_eq!(again.status(), StatusCode::NOT_FOUND);

    let page = app.list_messages(&bob, conversation_id).await;
    let messages = page["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["id"], kept["id"]);

    let unknown = app.delete(&alice.token, &format!("/messages/{}", Uuid::new_v4())).send().await.unwrap();
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_read_receipts_and_unread_count() {
    let app = common::TestApp::spawn().await;
    let alice = app.register_user("alice").await;
    let bob = app.register_user("bob").await;
    let conversation_id = app.conversation_id(&alice, &bob).await;

    let first = app.send_text(&alice, conversation_id, "one").await;
    app.send_text(&alice, conversation_id, "two").await;
    app.send_text(&bob, conversation_id, "mine").await;

    // Own messages never count as unread
    let unread: Value = app.get(&bob.token, "/conversations/unread-count").send().await.unwrap().json().await.unwrap();
    assert_eq!(unread["total_unread"], 2);
    assert_eq!(unread["unread_conversations"], 1);

    let alice_unread: Value =
        app.get(&alice.token, "/conversations/unread-count").send().await.unwrap().json().await.unwrap();
    assert_eq!(alice_unread["total_unread"], 1);

    let first_id = first["id"].as_str().unwrap();
    let own = app.post(&alice.token, &format!("/messages/{first_id}/read")).send().await.unwrap();
    assert_eq!(own.status(), StatusCode::BAD_REQUEST);

    let resp = app.post(&bob.token, &format!("/messages/{first_id}/read")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let unread: Value = app.get(&bob.token, "/conversations/unread-count").send().await.unwrap().json().await.unwrap();
    assert_eq!(unread["total_unread"], 1);

    let page = app.list_messages(&alice, conversation_id).await;
    let read = page["messages"].as_array().unwrap().iter().find(|m| m["id"] == first["id"]).unwrap();
    assert_eq!(read["status"], "read");
    assert!(read["read_at"].is_string());

    let resp = app.post(&bob.token, &format!("/conversations/{conversation_id}/read")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let unread: Value = app.get(&bob.token, "/conversations/unread-count").send().await.unwrap().json().await.unwrap();
    assert_eq!(unread["total_unread"], 0);
    assert_eq!(unread["unread_conversations"], 0);
}
