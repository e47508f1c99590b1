//! Error types for the mention expander.

use miette::Diagnostic;

use crate::host::HostError;

/// Main error type for expander operations.
#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum MentionsError {
    /// The expander was bound to the wrong kind of editor element.
    #[error("mention expander requires a <{expected}> element, found <{found}>")]
    #[diagnostic(
        code(trix_mentions::unsupported_editor),
        help("bind the expander to the configured editor element")
    )]
    UnsupportedEditor { expected: String, found: String },

    /// The host editor rejected a mutation.
    #[error(transparent)]
    Host(#[from] HostError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = MentionsError::UnsupportedEditor {
            expected: "trix-editor".to_string(),
            found: "textarea".to_string(),
        };
        insta::assert_snapshot!(err.to_string(), @"mention expander requires a <trix-editor> element, found <textarea>");

        let err = MentionsError::from(HostError::from("range out of bounds"));
        assert_eq!(err.to_string(), "range out of bounds");
    }
}
