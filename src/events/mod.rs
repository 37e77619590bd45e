use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, info};
use uuid::Uuid;

/// Domain events emitted by the services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Catalog events
    BookCreated(Uuid),
    BookUpdated(Uuid),
    BookDeleted(Uuid),
    CategoryCreated(Uuid),
    CategoryUpdated(Uuid),
    CategoryDeleted(Uuid),

    // Cart events
    CartItemAdded { user_id: Uuid, book_id: Uuid },
    CartItemUpdated { user_id: Uuid, item_id: Uuid },
    CartItemRemoved { user_id: Uuid, item_id: Uuid },

    // Order events
    OrderPlaced { order_id: Uuid, user_id: Uuid },
    OrderApproved(Uuid),
    OrderDeleted(Uuid),

    // Review events
    ReviewSubmitted { book_id: Uuid, review_id: Uuid },
}

/// Handle used by services to publish events onto the in-process channel.
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event, surfacing channel failures to the caller.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event and logs a failure instead of propagating it.
    /// Event delivery must never fail the originating request.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(err) = self.send(event.clone()).await {
            error!(?event, "Dropping event: {}", err);
        }
    }
}

/// Drains the event channel, logging each event. Runs until every sender is
/// dropped.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        info!(?event, "domain event");
    }
    info!("Event channel closed; processor exiting");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sender_delivers_events() {
        let (tx, mut rx) = mpsc::channel(8);
        let sender = EventSender::new(tx);

        let order_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        sender
            .send(Event::OrderPlaced { order_id, user_id })
            .await
            .expect("send should succeed");

        match rx.recv().await {
            Some(Event::OrderPlaced {
                order_id: got_order,
                user_id: got_user,
            }) => {
                assert_eq!(got_order, order_id);
                assert_eq!(got_user, user_id);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn send_or_log_swallows_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);

        // Must not panic or error.
        sender.send_or_log(Event::BookCreated(Uuid::new_v4())).await;
    }
}
