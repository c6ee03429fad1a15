//! Adapts a [`ChatRun`] into an SSE body.

use std::convert::Infallible;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::response::sse::Event;
use futures::Stream;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

use super::events::ChatEvent;
use super::orchestrator::ChatRun;

/// SSE stream over a running chat response.
///
/// Ends right after the terminal event. Dropping it (client disconnect)
/// cancels the producing task.
pub struct ChatEventStream {
    inner: ReceiverStream<ChatEvent>,
    cancel: CancellationToken,
    finished: bool,
}

impl ChatEventStream {
    #[must_use]
    pub fn new(run: ChatRun) -> Self {
        Self {
            inner: ReceiverStream::new(run.events),
            cancel: run.cancel,
            finished: false,
        }
    }
}

/// Render an event as SSE: `event:` is the type name, `data:` its JSON.
pub fn to_sse_event(event: &ChatEvent) -> Event {
    let name = event.event_name();
    Event::default()
        .event(name)
        .json_data(event)
        .unwrap_or_else(|_| Event::default().event(name).data("{}"))
}

impl Stream for ChatEventStream {
    type Item = Result<Event, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.finished {
            return Poll::Ready(None);
        }
        match Pin::new(&mut self.inner).poll_next(cx) {
            Poll::Ready(Some(event)) => {
                self.finished = event.is_terminal();
                Poll::Ready(Some(Ok(to_sse_event(&event))))
            }
            other => other.map(|_| None),
        }
    }
}

impl Drop for ChatEventStream {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
