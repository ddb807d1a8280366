use chardetng::EncodingDetector;
use encoding_rs::Encoding;

use crate::{RenderError, RenderFailure};

/// Decode a fetched page into UTF-8.
///
/// Order: BOM, then the Content-Type charset, then chardetng guessing over
/// the whole body. Malformed sequences are an error rather than being
/// silently replaced.
pub fn decode_page(bytes: &[u8], content_type: Option<&str>) -> Result<String, RenderError> {
    let encoding = Encoding::for_bom(bytes)
        .map(|(enc, _)| enc)
        .or_else(|| {
            content_type
                .and_then(charset_label)
                .and_then(|label| Encoding::for_label(label.as_bytes()))
        })
        .unwrap_or_else(|| {
            let mut detector = EncodingDetector::new();
            detector.feed(bytes, true);
            detector.guess(None, true)
        });

    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(RenderError::new(
            RenderFailure::Decode,
            format!("malformed {} body", encoding.name()),
        ));
    }
    Ok(text.into_owned())
}

fn charset_label(content_type: &str) -> Option<String> {
    content_type.split(';').find_map(|part| {
        let (key, value) = part.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches(&['"', '\''][..]).to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_charset_is_honoured() {
        let bytes = [0x63, 0x61, 0x66, 0xE9]; // "café" in latin-1
        let text = decode_page(&bytes, Some("text/html; Charset=\"ISO-8859-1\"")).unwrap();
        assert_eq!(text, "café");
    }

    #[test]
    fn bom_wins_over_header() {
        let bytes = [0xEF, 0xBB, 0xBF, b'o', b'k'];
        let text = decode_page(&bytes, Some("text/html; charset=windows-1252")).unwrap();
        assert_eq!(text, "ok");
    }

    #[test]
    fn plain_ascii_without_hints() {
        assert_eq!(decode_page(b"<p>hi</p>", None).unwrap(), "<p>hi</p>");
    }
}
