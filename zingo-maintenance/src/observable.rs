//! Hot observables carrying the latest wallet and sync state

use tokio::sync::watch;

use crate::error::SourceClosed;

/// Publishing side of a state source. Holds the latest value, or nothing while absent.
///
/// Dropping it closes the source; subscribers keep reading the last value.
#[derive(Debug)]
pub struct StateObservable<T> {
    sender: watch::Sender<Option<T>>,
}

impl<T> StateObservable<T>
where
    T: Clone,
{
    /// A source that is absent until the first publish
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        StateObservable { sender }
    }

    /// A source that starts with `value`
    pub fn with_value(value: T) -> Self {
        let (sender, _) = watch::channel(Some(value));
        StateObservable { sender }
    }

    /// Replace the current value and notify subscribers
    pub fn publish(&self, value: T) {
        self.sender.send_replace(Some(value));
    }

    /// Return to absent and notify subscribers
    pub fn clear(&self) {
        self.sender.send_replace(None);
    }

    /// Current value, if any
    pub fn current(&self) -> Option<T> {
        self.sender.borrow().clone()
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Subscribe to future changes. The current value counts as already seen.
    pub fn subscribe(&self) -> StateSubscription<T> {
        StateSubscription {
            receiver: self.sender.subscribe(),
        }
    }
}

impl<T> StateObservable<T>
where
    T: Clone + PartialEq,
{
    /// Publish only when `value` differs from the current one
    pub fn publish_if_changed(&self, value: T) -> bool {
        self.sender.send_if_modified(|current| {
            if current.as_ref() == Some(&value) {
                false
            } else {
                *current = Some(value);
                true
            }
        })
    }
}

impl<T> Default for StateObservable<T>
where
    T: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Consuming side of a state source
#[derive(Debug)]
pub struct StateSubscription<T> {
    receiver: watch::Receiver<Option<T>>,
}

impl<T> StateSubscription<T>
where
    T: Clone,
{
    /// Wait for the next change. Errors once the source is closed and every change was seen.
    pub async fn changed(&mut self) -> Result<(), SourceClosed> {
        self.receiver.changed().await.map_err(|_| SourceClosed)
    }

    /// Latest value, if any
    pub fn latest(&self) -> Option<T> {
        self.receiver.borrow().clone()
    }
}

impl<T> Clone for StateSubscription<T> {
    fn clone(&self) -> Self {
        StateSubscription {
            receiver: self.receiver.clone(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn starts_absent() {
        let source = StateObservable::<u32>::new();
        let subscription = source.subscribe();
        assert_eq!(source.current(), None);
        assert_eq!(subscription.latest(), None);
    }

    #[tokio::test]
    async fn subscription_sees_published_values() {
        let source = StateObservable::with_value(1u32);
        let mut subscription = source.subscribe();
        assert_eq!(subscription.latest(), Some(1));

        source.publish(2);
        subscription.changed().await.unwrap();
        assert_eq!(subscription.latest(), Some(2));

        source.clear();
        subscription.changed().await.unwrap();
        assert_eq!(subscription.latest(), None);
    }

    #[tokio::test]
    async fn publish_if_changed_skips_equal_values() {
        let source = StateObservable::with_value(7u32);
        let mut subscription = source.subscribe();

        assert!(!source.publish_if_changed(7));
        assert!(source.publish_if_changed(8));
        subscription.changed().await.unwrap();
        assert_eq!(subscription.latest(), Some(8));
    }

    #[tokio::test]
    async fn closed_source_keeps_last_value() {
        let source = StateObservable::with_value("loaded".to_string());
        let mut subscription = source.subscribe();
        assert_eq!(source.subscriber_count(), 1);

        drop(source);
        assert_eq!(subscription.changed().await, Err(SourceClosed));
        assert_eq!(subscription.latest().as_deref(), Some("loaded"));
    }

    #[tokio::test]
    async fn unseen_change_is_delivered_before_close() {
        let source = StateObservable::<u32>::new();
        let mut subscription = source.subscribe();
        source.publish(3);
        drop(source);

        assert_eq!(subscription.changed().await, Ok(()));
        assert_eq!(subscription.latest(), Some(3));
        assert_eq!(subscription.changed().await, Err(SourceClosed));
    }
}
