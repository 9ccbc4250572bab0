use std::time::Duration;

use axum::{extract::State, response::IntoResponse};
use futures_util::StreamExt;
use slotbook_api::handlers::events::stream_events;
use slotbook_core::models::events::TimeslotEvent;

use crate::test_utils::TestContext;

async fn next_frame(body: &mut axum::body::BodyDataStream) -> String {
    let chunk = tokio::time::timeout(Duration::from_secs(2), body.next())
        .await
        .expect("Timed out waiting for an event")
        .expect("Event stream ended")
        .expect("Event stream failed");

    String::from_utf8(chunk.to_vec()).expect("Event frame is not UTF-8")
}

#[tokio::test]
async fn test_stream_carries_named_json_events() {
    let ctx = TestContext::with_slots(1).await;

    let response = stream_events(State(ctx.state.clone())).await.into_response();
    assert_eq!(
        response.headers()["content-type"],
        "text/event-stream"
    );
    let mut body = response.into_body().into_data_stream();

    ctx.state
        .events
        .send(TimeslotEvent::Occupied {
            id: 1,
            email: "a@example.com".to_string(),
        })
        .expect("Subscriber should be connected");

    let frame = next_frame(&mut body).await;

    assert!(frame.contains("event: timeslot_occupied"));
    assert!(frame.contains(r#"data: {"type":"OccupiedEvent","id":1,"email":"a@example.com"}"#));
}

#[tokio::test]
async fn test_stream_reports_claims_made_over_http() {
    let ctx = TestContext::with_slots(2).await;

    let response = stream_events(State(ctx.state.clone())).await.into_response();
    let mut body = response.into_body().into_data_stream();

    ctx.server
        .post("/timeslots/occupy")
        .json(&serde_json::json!({ "id": 2, "email": "b@example.com" }))
        .await
        .assert_status_ok();

    let frame = next_frame(&mut body).await;

    assert!(frame.contains("event: timeslot_occupied"));
    assert!(frame.contains(r#""id":2"#));
}

#[tokio::test]
async fn test_lagging_subscriber_keeps_streaming() {
    let ctx = TestContext::with_slots(1).await;

    let response = stream_events(State(ctx.state.clone())).await.into_response();
    let mut body = response.into_body().into_data_stream();

    // Overflow the channel capacity before the subscriber reads anything
    for id in 0..40 {
        ctx.state
            .events
            .send(TimeslotEvent::Released {
                id,
                email: "a@example.com".to_string(),
            })
            .expect("Subscriber should be connected");
    }

    let frame = next_frame(&mut body).await;

    assert!(frame.contains("event: timeslot_released"));
}
