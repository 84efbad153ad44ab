#![allow(clippy::unwrap_used, clippy::panic, missing_debug_implementations, unreachable_pub)]
use reqwest::StatusCode;
use serde_json::{Value, json};

mod common;

#[tokio::test]
async fn test_block_denies_both_directions_with_distinct_reasons() {
    let app = common::TestApp::spawn().await;
    let alice = app.register_user("alice").await;
    let bob = app.register_user("bob").await;
    let conversation_id = app.conversation_id(&alice, &bob).await;
    app.send_text(&bob, conversation_id, "hello").await;

    let resp = app.block(&alice, &bob).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let from_bob = app.can_message(&bob, &alice).await;
    assert_eq!(from_bob["can_message"], false);
    assert_eq!(from_bob["reason"], "You have been blocked by this user");

    let from_alice = app.can_message(&alice, &bob).await;
    assert_eq!(from_alice["can_message"], false);
    assert_eq!(from_alice["reason"], "You have blocked this user");

    let bob_send = app.send_raw(&bob, conversation_id, json!({ "message_type": "text", "content": "hey?" })).await;
    assert_eq!(bob_send.status(), StatusCode::FORBIDDEN);
    let body: Value = bob_send.json().await.unwrap();
    assert_eq!(body["error"], "You have been blocked by this user");

    let alice_send = app.send_raw(&alice, conversation_id, json!({ "message_type": "text", "content": "bye" })).await;
    assert_eq!(alice_send.status(), StatusCode::FORBIDDEN);

    // History survives the block
    let history = app.list_messages(&alice, conversation_id).await;
    assert_eq!(history["messages"].as_array().unwrap().len(), 1);

    let view: Value =
        app.get(&alice.token, &format!("/conversations/{conversation_id}")).send().await.unwrap().json().await.unwrap();
    assert_eq!(view["is_blocked"], true);
}

#[tokio::test]
async fn test_block_prevents_new_conversation() {
    let app = common::TestApp::spawn().await;
    let alice = app.register_user("alice").await;
    let bob = app.register_user("bob").await;

    app.block(&bob, &alice).await;

    let resp = app.open_conversation(&alice, &bob).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let resp = app.open_conversation(&bob, &alice).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_block_is_idempotent_and_listed() {
    let app = common::TestApp::spawn().await;
    let alice = app.register_user("alice").await;
    let bob = app.register_user("bob").await;
    let carol = app.register_user("carol").await;

    let resp = app
        .post(&alice.token, &format!("/users/{}/block", bob.user_id))
        .json(&json!({ "reason": "  spam  " }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert_eq!(app.block(&alice, &bob).await.status(), StatusCode::NO_CONTENT);
    assert_eq!(app.block(&alice, &carol).await.status(), StatusCode::NO_CONTENT);

    let resp = app.get(&alice.token, "/users/blocked").send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    let blocked = body["blocked_users"].as_array().unwrap();
    assert_eq!(blocked.len(), 2);
    assert_eq!(blocked[0]["id"], carol.user_id.to_string());
    assert_eq!(blocked[1]["id"], bob.user_id.to_string());
    assert_eq!(blocked[1]["username"], bob.username);
    assert_eq!(blocked[1]["reason"], "spam");

    let own = app.block(&alice, &alice).await;
    assert_eq!(own.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unblock_restores_messaging() {
    let app = common::TestApp::spawn().await;
    let alice = app.register_user("alice").await;
    let bob = app.register_user("bob").await;

    app.block(&alice, &bob).await;
    let resp = app.delete(&alice.token, &format!("/users/{}/block", bob.user_id)).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    assert_eq!(app.can_message(&bob, &alice).await["can_message"], true);

    let missing = app.delete(&alice.token, &format!("/users/{}/block", bob.user_id)).send().await.unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}
