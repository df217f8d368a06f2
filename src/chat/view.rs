use crate::common::Message;

/// One line of the chat list as the UI draws it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRow<'a> {
    pub text: &'a str,
    pub time_label: &'a str,
}

/// Derives the render list from the latest snapshot.
pub fn render(messages: &[Message]) -> Vec<MessageRow<'_>> {
    messages
        .iter()
        .map(|message| MessageRow {
            text: message.text(),
            time_label: message.time_label(),
        })
        .collect()
}
