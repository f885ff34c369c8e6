//! Conversations and the live message stream.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use futures::StreamExt;

use craftly_integration_tests::{sign_up, sign_up_seller};

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_send_and_read_messages() {
    let seller = sign_up_seller("chat-seller").await.unwrap();
    let buyer = sign_up("chat-buyer").await.unwrap();

    let conversation = buyer
        .app
        .chat
        .start(buyer.user.id, seller.user.id)
        .await
        .unwrap();
    buyer
        .app
        .chat
        .send(&conversation.id, "Is the bowl food safe?")
        .await
        .unwrap();

    assert_eq!(seller.app.chat.unread_total().await.unwrap(), 1);
    let history = seller
        .app
        .chat
        .messages(&conversation.id, None, None)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);

    seller.app.chat.mark_read(&conversation.id).await.unwrap();
    assert_eq!(seller.app.chat.unread_total().await.unwrap(), 0);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_stream_delivers_new_messages() {
    let seller = sign_up_seller("stream-seller").await.unwrap();
    let buyer = sign_up("stream-buyer").await.unwrap();

    let conversation = seller
        .app
        .chat
        .start(seller.user.id, buyer.user.id)
        .await
        .unwrap();
    let mut stream = buyer.app.chat.subscribe(&conversation.id).await.unwrap();

    let sent = seller
        .app
        .chat
        .send(&conversation.id, "Shipped this morning")
        .await
        .unwrap();

    let received = tokio::time::timeout(Duration::from_secs(5), stream.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(received.id, sent.id);
    assert_eq!(received.sender_id, seller.user.id);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_outsider_cannot_read_conversation() {
    let seller = sign_up_seller("private-seller").await.unwrap();
    let buyer = sign_up("private-buyer").await.unwrap();
    let outsider = sign_up("outsider").await.unwrap();

    let conversation = buyer
        .app
        .chat
        .start(buyer.user.id, seller.user.id)
        .await
        .unwrap();
    let err = outsider
        .app
        .chat
        .messages(&conversation.id, None, None)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(403));
}
