//! Attachment payloads built from a committed list option.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::listbox::ElementData;

/// Attribute holding a JSON object of attachment options.
pub const ATTACHMENT_ATTRIBUTE: &str = "data-trix-attachment";

const ATTACHMENT_PREFIX: &str = "data-trix-attachment-";

/// Options passed to the host's attachment constructor.
pub type AttachmentOptions = Map<String, Value>;

/// An atomic inline object replacing the trigger key and query on commit.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Attachment {
    options: AttachmentOptions,
}

impl Attachment {
    pub fn from_options(options: AttachmentOptions) -> Self {
        Self { options }
    }

    /// Build options from an option element.
    ///
    /// Later sources win: the element's markup as `content`, then the JSON
    /// object in `data-trix-attachment`, then each `data-trix-attachment-*`
    /// attribute under its camel-cased suffix.
    pub fn from_element(element: &ElementData) -> Self {
        let mut options = AttachmentOptions::new();
        options.insert("content".to_string(), Value::String(element.content.clone()));

        if let Some(raw) = element.attribute(ATTACHMENT_ATTRIBUTE) {
            options.extend(parse_options(raw));
        }

        for (name, value) in &element.attributes {
            let Some(suffix) = name.strip_prefix(ATTACHMENT_PREFIX) else {
                continue;
            };
            if suffix.is_empty() {
                continue;
            }
            options.insert(camel_case(suffix), Value::String(value.clone()));
        }

        Self { options }
    }

    pub fn options(&self) -> &AttachmentOptions {
        &self.options
    }

    pub fn into_options(self) -> AttachmentOptions {
        self.options
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.options.get(name)
    }

    pub fn content(&self) -> Option<&str> {
        self.options.get("content").and_then(Value::as_str)
    }
}

fn parse_options(raw: &str) -> AttachmentOptions {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            tracing::debug!(kind = ?other, "attachment options are not an object, ignoring");
            AttachmentOptions::new()
        }
        Err(e) => {
            tracing::debug!(error = %e, "malformed attachment options, ignoring");
            AttachmentOptions::new()
        }
    }
}

/// `content-type` -> `contentType`.
fn camel_case(kebab: &str) -> String {
    let mut out = String::with_capacity(kebab.len());
    let mut upper = false;
    for c in kebab.chars() {
        if c == '-' {
            upper = !out.is_empty();
            continue;
        }
        if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else if out.is_empty() {
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_only() {
        let attachment = Attachment::from_element(&ElementData::new("<b>Ann</b>"));
        assert_eq!(attachment.content(), Some("<b>Ann</b>"));
        assert_eq!(attachment.options().len(), 1);
    }

    #[test]
    fn test_json_and_prefixed_overrides() {
        let element = ElementData::new("Ann")
            .with_attribute(
                ATTACHMENT_ATTRIBUTE,
                r#"{"sgid": "abc", "content": "<span>@ann</span>"}"#,
            )
            .with_attribute("data-trix-attachment-sgid", "xyz")
            .with_attribute("data-trix-attachment-content-type", "mention")
            .with_attribute("data-other", "ignored");
        let attachment = Attachment::from_element(&element);

        insta::assert_snapshot!(
            serde_json::to_string_pretty(&attachment).unwrap(),
            @r#"
        {
          "content": "<span>@ann</span>",
          "contentType": "mention",
          "sgid": "xyz"
        }
        "#
        );
    }

    #[test]
    fn test_malformed_json_is_ignored() {
        let element = ElementData::new("Ann")
            .with_attribute(ATTACHMENT_ATTRIBUTE, "{not json")
            .with_attribute("data-trix-attachment-href", "/users/1");
        let attachment = Attachment::from_element(&element);
        assert_eq!(attachment.content(), Some("Ann"));
        assert_eq!(attachment.get("href"), Some(&Value::from("/users/1")));
    }

    #[test]
    fn test_non_object_json_is_ignored() {
        let element = ElementData::new("Ann").with_attribute(ATTACHMENT_ATTRIBUTE, "[1, 2]");
        let attachment = Attachment::from_element(&element);
        assert_eq!(attachment.options().len(), 1);
    }

    #[test]
    fn test_camel_case() {
        assert_eq!(camel_case("content-type"), "contentType");
        assert_eq!(camel_case("href"), "href");
        assert_eq!(camel_case("Caption"), "caption");
        assert_eq!(camel_case("file-size-bytes"), "fileSizeBytes");
    }
}
