//! Serialization context passed to every serializer call.

use std::fmt;

/// Which part of a record is being (de)serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageField {
    Key,
    Value,
}

impl MessageField {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageField::Key => "key",
            MessageField::Value => "value",
        }
    }
}

impl fmt::Display for MessageField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Destination topic and record position of a serializer call.
///
/// Built per call and read-only to serializers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerializationContext<'a> {
    topic: &'a str,
    field: MessageField,
}

impl<'a> SerializationContext<'a> {
    pub fn new(topic: &'a str, field: MessageField) -> Self {
        Self { topic, field }
    }

    pub fn key(topic: &'a str) -> Self {
        Self::new(topic, MessageField::Key)
    }

    pub fn value(topic: &'a str) -> Self {
        Self::new(topic, MessageField::Value)
    }

    pub fn topic(&self) -> &'a str {
        self.topic
    }

    pub fn field(&self) -> MessageField {
        self.field
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_display() {
        assert_eq!(MessageField::Key.to_string(), "key");
        assert_eq!(MessageField::Value.to_string(), "value");
    }

    #[test]
    fn test_context_constructors() {
        let ctx = SerializationContext::key("orders");
        assert_eq!(ctx.topic(), "orders");
        assert_eq!(ctx.field(), MessageField::Key);
        assert_eq!(
            SerializationContext::value("orders"),
            SerializationContext::new("orders", MessageField::Value)
        );
    }
}
