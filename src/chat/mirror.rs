use crate::common::Message;

/// Local reflection of the remote collection.
///
/// Only ever changed by a whole snapshot; nothing is added or removed locally.
#[derive(Debug, Default)]
pub struct ChatMirror {
    messages: Vec<Message>,
    scroll_requested: bool,
}

impl ChatMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the held sequence with `snapshot` and asks the view to scroll
    /// to the end.
    pub fn on_snapshot(&mut self, snapshot: Vec<Message>) {
        self.messages = snapshot;
        self.scroll_requested = true;
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Returns whether a scroll-to-end is pending and resets it.
    pub fn take_scroll_request(&mut self) -> bool {
        std::mem::take(&mut self.scroll_requested)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(items: &[(&str, &str)]) -> Vec<Message> {
        items
            .iter()
            .map(|&(text, time)| Message::stored(text, time))
            .collect()
    }

    #[test]
    fn starts_empty() {
        let mut mirror = ChatMirror::new();
        assert!(mirror.is_empty());
        assert!(!mirror.take_scroll_request());
    }

    #[test]
    fn same_snapshot_twice_is_stable() {
        let snapshot = seq(&[("a", "10:00"), ("b", "10:01")]);
        let mut mirror = ChatMirror::new();

        mirror.on_snapshot(snapshot.clone());
        mirror.on_snapshot(snapshot.clone());

        assert_eq!(mirror.messages(), snapshot.as_slice());
    }

    #[test]
    fn later_snapshot_fully_replaces_earlier() {
        let mut mirror = ChatMirror::new();
        mirror.on_snapshot(seq(&[("a", "10:00"), ("b", "10:01"), ("c", "10:02")]));
        mirror.on_snapshot(seq(&[("z", "11:00")]));

        assert_eq!(mirror.messages(), seq(&[("z", "11:00")]).as_slice());
    }

    #[test]
    fn keeps_store_order_and_duplicates() {
        let snapshot = seq(&[("b", "10:05"), ("a", "09:00"), ("b", "10:05")]);
        let mut mirror = ChatMirror::new();
        mirror.on_snapshot(snapshot.clone());
        assert_eq!(mirror.messages(), snapshot.as_slice());
    }

    #[test]
    fn snapshot_then_empty_snapshot() {
        let mut mirror = ChatMirror::new();
        mirror.on_snapshot(seq(&[("hi", "09:00")]));
        assert_eq!(mirror.messages(), seq(&[("hi", "09:00")]).as_slice());

        mirror.on_snapshot(Vec::new());
        assert!(mirror.is_empty());
    }

    #[test]
    fn each_snapshot_requests_one_scroll() {
        let mut mirror = ChatMirror::new();
        mirror.on_snapshot(seq(&[("hi", "09:00")]));
        assert!(mirror.take_scroll_request());
        assert!(!mirror.take_scroll_request());

        mirror.on_snapshot(Vec::new());
        assert!(mirror.take_scroll_request());
    }
}
