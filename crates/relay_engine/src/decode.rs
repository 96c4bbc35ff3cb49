use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};

use crate::page::{PageError, PageFailureKind};

/// Decodes a document snapshot to UTF-8.
///
/// Order: BOM, then the `charset` of the Content-Type header, then plain
/// UTF-8 when the bytes are valid UTF-8, then chardetng's guess.
pub fn decode_document(bytes: &[u8], content_type: Option<&str>) -> Result<String, PageError> {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return decode_with(bytes, encoding);
    }

    if let Some(encoding) = content_type
        .and_then(charset_of)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
    {
        return decode_with(bytes, encoding);
    }

    if std::str::from_utf8(bytes).is_ok() {
        return decode_with(bytes, UTF_8);
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    decode_with(bytes, detector.guess(None, true))
}

fn charset_of(content_type: &str) -> Option<String> {
    content_type.split(';').find_map(|part| {
        let (name, value) = part.trim().split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches(&['"', '\''][..]).to_string())
    })
}

fn decode_with(bytes: &[u8], encoding: &'static Encoding) -> Result<String, PageError> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(PageError::new(
            PageFailureKind::Decode,
            format!("invalid {} byte sequence", encoding.name()),
        ));
    }
    Ok(text.into_owned())
}
