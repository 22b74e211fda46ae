//! Catalog change feed
//!
//! Every admin mutation publishes a [`ChangeEvent`]. Subscribers receive
//! events published after they subscribed; a lagging subscriber skips what
//! it missed and re-reads the collection.

use futures::stream::Stream;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio_stream::StreamExt as _;
use tokio_stream::wrappers::BroadcastStream;

use crate::data::Collection;

const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    Created,
    Updated,
    Deleted,
    /// Bulk change (seed, clear); the whole collection should be re-read
    Reset,
}

impl ChangeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
            Self::Reset => "reset",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeEvent {
    pub collection: Collection,
    pub action: ChangeAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// Broadcast hub for [`ChangeEvent`]s
#[derive(Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<ChangeEvent>,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeFeed {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Publish an event and count the mutation.
    ///
    /// Publishing with no subscribers is not an error.
    pub fn publish(&self, collection: Collection, action: ChangeAction, id: Option<&str>) {
        crate::metrics::CONTENT_MUTATIONS_TOTAL
            .with_label_values(&[collection.as_str(), action.as_str()])
            .inc();

        let event = ChangeEvent {
            collection,
            action,
            id: id.map(str::to_string),
        };
        let receivers = self.sender.send(event).unwrap_or(0);
        tracing::debug!(
            collection = collection.as_str(),
            action = action.as_str(),
            receivers,
            "Published change event"
        );
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }

    /// Stream of events for one subscriber, skipping lagged gaps.
    pub fn stream(&self) -> impl Stream<Item = ChangeEvent> + Send + use<> {
        BroadcastStream::new(self.subscribe()).filter_map(|item| match item {
            Ok(event) => Some(event),
            Err(error) => {
                tracing::debug!(%error, "Change feed subscriber lagged");
                None
            }
        })
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let feed = ChangeFeed::new();
        let mut receiver = feed.subscribe();

        feed.publish(Collection::Videos, ChangeAction::Created, Some("v1"));

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.collection, Collection::Videos);
        assert_eq!(event.action, ChangeAction::Created);
        assert_eq!(event.id.as_deref(), Some("v1"));
    }

    #[tokio::test]
    async fn stream_yields_events_in_order() {
        let feed = ChangeFeed::new();
        let stream = feed.stream();
        tokio::pin!(stream);

        feed.publish(Collection::Models, ChangeAction::Created, Some("m1"));
        feed.publish(Collection::Models, ChangeAction::Deleted, Some("m1"));

        let first = stream.next().await.unwrap();
        let second = stream.next().await.unwrap();
        assert_eq!(first.action, ChangeAction::Created);
        assert_eq!(second.action, ChangeAction::Deleted);
    }

    #[tokio::test]
    async fn stream_outlives_the_handle_it_came_from() {
        let feed = ChangeFeed::new();
        let stream = {
            let handle = feed.clone();
            handle.stream()
        };
        let mut stream = Box::pin(stream);

        feed.publish(Collection::Videos, ChangeAction::Updated, Some("v9"));

        let event = stream.next().await.unwrap();
        assert_eq!(event.id.as_deref(), Some("v9"));
    }

    #[test]
    fn publishing_without_subscribers_is_harmless() {
        let feed = ChangeFeed::new();
        feed.publish(Collection::Tags, ChangeAction::Reset, None);
        assert_eq!(feed.subscriber_count(), 0);
    }

    #[test]
    fn events_serialize_lowercase() {
        let event = ChangeEvent {
            collection: Collection::Galleries,
            action: ChangeAction::Updated,
            id: Some("g1".to_string()),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["collection"], "galleries");
        assert_eq!(json["action"], "updated");
    }
}
