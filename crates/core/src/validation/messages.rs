//! User-facing text for validation failures.

/// Identifies a localizable validation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKey {
    FileTooLarge,
    FileEmpty,
    UnsupportedFormat,
}

impl MessageKey {
    /// String-table key for this message.
    pub fn key(&self) -> &'static str {
        match self {
            Self::FileTooLarge => "fileTooLarge",
            Self::FileEmpty => "fileEmpty",
            Self::UnsupportedFormat => "unsupportedFormat",
        }
    }

    /// English text used when no translation is supplied.
    pub fn default_text(&self) -> &'static str {
        match self {
            Self::FileTooLarge => "File size exceeds limit (max 500MB), current file",
            Self::FileEmpty => "File size is 0, please select a valid file",
            Self::UnsupportedFormat => "Unsupported file format. Supported formats",
        }
    }
}

/// Source of message text, e.g. a presentation layer's string table.
pub trait Messages {
    fn text(&self, key: MessageKey) -> String;
}

/// The built-in English messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultMessages;

impl Messages for DefaultMessages {
    fn text(&self, key: MessageKey) -> String {
        key.default_text().to_string()
    }
}

impl<F> Messages for F
where
    F: Fn(MessageKey) -> String,
{
    fn text(&self, key: MessageKey) -> String {
        self(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_messages() {
        assert_eq!(
            DefaultMessages.text(MessageKey::FileEmpty),
            "File size is 0, please select a valid file"
        );
    }

    #[test]
    fn test_closure_messages() {
        let table = |key: MessageKey| format!("[{}]", key.key());
        assert_eq!(table.text(MessageKey::UnsupportedFormat), "[unsupportedFormat]");
    }
}
