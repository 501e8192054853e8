//! Realtime events endpoint
//!
//! Exposes bridge subscriptions as an SSE stream. Customers get a
//! subscription scoped to their own orders; operators see everything.
//! Each event is a refresh cue only; consumers re-fetch their collection
//! through the regular endpoints.

use std::convert::Infallible;

use axum::{
    Router,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
};
use axum::extract::State;
use futures::Stream;
use futures::stream;

use crate::auth::CurrentUser;
use crate::core::AppState;
use crate::realtime::{Scope, Subscription};

pub fn router() -> Router<AppState> {
    Router::new().route("/api/events", get(events))
}

async fn events(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let scope = if user.is_elevated() {
        Scope::All
    } else {
        Scope::Identity(user.id.clone())
    };
    tracing::debug!(user_id = %user.id, ?scope, "Realtime subscription opened");
    let subscription = state.bridge.subscribe(scope);

    // Dropping the stream (client disconnect) drops the subscription and
    // tears down its forwarding task.
    let stream = stream::unfold(subscription, |mut sub: Subscription| async move {
        let signal = sub.recv().await?;
        let event = Event::default().event("sync").json_data(&signal).ok()?;
        Some((Ok::<Event, Infallible>(event), sub))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
