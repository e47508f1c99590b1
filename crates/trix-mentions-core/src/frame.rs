//! Fallback content frame URL.

use url::Url;

use crate::host::FrameTarget;

/// URL to load into the fallback frame for a query.
///
/// `src` (the widget's attribute) wins over the frame's own source. The
/// result is resolved against the frame's base URI and has `name` set to
/// `value`: the first existing occurrence is replaced in place, later ones
/// are dropped, and the pair is appended when absent.
pub fn frame_url(
    src: Option<&str>,
    frame: &FrameTarget,
    name: &str,
    value: &str,
) -> Result<Url, url::ParseError> {
    let base = Url::parse(&frame.base_uri)?;
    let source = src
        .filter(|src| !src.is_empty())
        .or(frame.src.as_deref())
        .unwrap_or_default();
    let mut url = base.join(source)?;

    let mut replaced = false;
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter_map(|(k, v)| {
            if k != name {
                Some((k.into_owned(), v.into_owned()))
            } else if !replaced {
                replaced = true;
                Some((k.into_owned(), value.to_string()))
            } else {
                None
            }
        })
        .collect();

    {
        let mut query = url.query_pairs_mut();
        query.clear();
        query.extend_pairs(pairs.iter());
        if !replaced {
            query.append_pair(name, value);
        }
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(src: Option<&str>) -> FrameTarget {
        FrameTarget {
            id: "mentions".to_string(),
            src: src.map(str::to_string),
            base_uri: "https://example.com/posts/new".to_string(),
        }
    }

    #[test]
    fn test_relative_src_resolves_against_base() {
        let url = frame_url(Some("/users"), &frame(None), "q", "ann").unwrap();
        assert_eq!(url.as_str(), "https://example.com/users?q=ann");
    }

    #[test]
    fn test_widget_src_wins_over_frame_src() {
        let url = frame_url(Some("/users"), &frame(Some("/other")), "q", "ann").unwrap();
        assert_eq!(url.path(), "/users");

        let url = frame_url(None, &frame(Some("/other")), "q", "ann").unwrap();
        assert_eq!(url.path(), "/other");

        let url = frame_url(Some(""), &frame(Some("/other")), "q", "ann").unwrap();
        assert_eq!(url.path(), "/other");
    }

    #[test]
    fn test_existing_param_replaced_in_place() {
        let url = frame_url(
            Some("https://example.com/mentions?q=old&x=1&q=dup"),
            &frame(None),
            "q",
            "john doe",
        )
        .unwrap();
        assert_eq!(url.as_str(), "https://example.com/mentions?q=john+doe&x=1");
    }

    #[test]
    fn test_no_source_uses_base() {
        let url = frame_url(None, &frame(None), "name", "").unwrap();
        assert_eq!(url.as_str(), "https://example.com/posts/new?name=");
    }

    #[test]
    fn test_invalid_base() {
        let mut target = frame(None);
        target.base_uri = "not a url".to_string();
        assert!(frame_url(Some("/users"), &target, "q", "a").is_err());
    }
}
