//! Media URL extraction from an item's embedded HTML.

use scraper::{ElementRef, Html};

use crate::error::ExtractError;
use crate::utils::config::Defaults;

/// Which element carries the media URL and what it is expected to look like.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaShape {
    /// Element name, matched case-insensitively (HTML parsing lowercases names).
    pub tag: String,
    /// Attribute holding the URL.
    pub src_attr: String,
    /// Exact attribute count the element must have. `None` accepts any count.
    pub expected_attrs: Option<usize>,
}

impl Default for MediaShape {
    fn default() -> Self {
        Self {
            tag: Defaults::MEDIA_TAG.to_string(),
            src_attr: Defaults::SRC_ATTR.to_string(),
            expected_attrs: Defaults::EXPECTED_ATTRS,
        }
    }
}

/// Find the first `shape.tag` element in document order and return its source attribute.
pub fn extract_media_url(content: &str, shape: &MediaShape) -> Result<String, ExtractError> {
    let fragment = Html::parse_fragment(content);
    let tag = shape.tag.to_ascii_lowercase();

    let element = fragment
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == tag)
        .ok_or(ExtractError::ContentUrlNotFound)?;

    let found = element.value().attrs().count();
    if let Some(expected) = shape.expected_attrs
        && found != expected
    {
        log::debug!("<{}> attributes: {:?}", tag, element.value().attrs().collect::<Vec<_>>());
        return Err(ExtractError::InvalidFeed {
            tag,
            found,
            expected,
        });
    }

    element
        .value()
        .attr(&shape.src_attr)
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
        .ok_or_else(|| ExtractError::MissingSource {
            tag,
            attr: shape.src_attr.clone(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn any_count() -> MediaShape {
        MediaShape {
            expected_attrs: None,
            ..MediaShape::default()
        }
    }

    #[test]
    fn test_first_audio_wins() {
        let html = r#"<p>show notes</p>
            <audio src="https://cdn.example/a.mp3" preload="none"></audio>
            <audio src="https://cdn.example/b.mp3" preload="none"></audio>"#;
        assert_eq!(
            extract_media_url(html, &MediaShape::default()).unwrap(),
            "https://cdn.example/a.mp3"
        );
    }

    #[test]
    fn test_uppercase_tag_in_markup() {
        let html = r#"<AUDIO SRC="https://cdn.example/a.mp3" PRELOAD="none"></AUDIO>"#;
        assert_eq!(
            extract_media_url(html, &MediaShape::default()).unwrap(),
            "https://cdn.example/a.mp3"
        );
    }

    #[test]
    fn test_no_audio_element() {
        let html = "<p>No episode this week</p><img src=\"cover.jpg\">";
        assert_eq!(
            extract_media_url(html, &MediaShape::default()),
            Err(ExtractError::ContentUrlNotFound)
        );
    }

    #[test]
    fn test_empty_content() {
        assert_eq!(
            extract_media_url("", &MediaShape::default()),
            Err(ExtractError::ContentUrlNotFound)
        );
    }

    #[test]
    fn test_attribute_count_mismatch() {
        let html = r#"<audio src="https://cdn.example/a.mp3"></audio>"#;
        assert_eq!(
            extract_media_url(html, &MediaShape::default()),
            Err(ExtractError::InvalidFeed {
                tag: "audio".into(),
                found: 1,
                expected: 2
            })
        );
        let strict = MediaShape {
            expected_attrs: Some(1),
            ..MediaShape::default()
        };
        assert_eq!(
            extract_media_url(html, &strict).unwrap(),
            "https://cdn.example/a.mp3"
        );
    }

    #[test]
    fn test_unchecked_count_still_needs_src() {
        let html = r#"<audio controls preload="none"></audio>"#;
        assert_eq!(
            extract_media_url(html, &any_count()),
            Err(ExtractError::MissingSource {
                tag: "audio".into(),
                attr: "src".into()
            })
        );
    }

    #[test]
    fn test_custom_tag_and_attr() {
        let shape = MediaShape {
            tag: "source".into(),
            src_attr: "src".into(),
            expected_attrs: None,
        };
        let html = r#"<video><source type="video/mp4" src="https://cdn.example/v.mp4"></video>"#;
        assert_eq!(
            extract_media_url(html, &shape).unwrap(),
            "https://cdn.example/v.mp4"
        );
    }
}
