//! Content-type classification of arbitrary blobs.
//!
//! Only the outer `SEQUENCE` header and the first object identifier are read,
//! so classification is cheap and never fails: anything that does not start
//! like a ContentInfo is `Unrecognized`.

use der::asn1::ObjectIdentifier;
use der::{Decode, Header, Reader, SliceReader, Tag};

use crate::domain::types::ContentTypeTag;

/// Stateless classifier; the single routing authority for container paths.
pub struct ContentTypeClassifier;

impl Default for ContentTypeClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentTypeClassifier {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    #[must_use]
    pub fn classify(&self, blob: &[u8]) -> ContentTypeTag {
        if blob.is_empty() {
            log::warn!("Cannot classify empty input");
            return ContentTypeTag::Unrecognized;
        }
        match outer_content_type(blob) {
            Ok(oid) => {
                let tag = ContentTypeTag::from_oid(&oid);
                log::debug!("Classified blob with content type {oid} as {tag}");
                tag
            }
            Err(e) => {
                log::debug!("Input is not a ContentInfo: {e}");
                ContentTypeTag::Unrecognized
            }
        }
    }

    /// True only for SignedData.
    #[must_use]
    pub fn is_signature(&self, blob: &[u8]) -> bool {
        self.classify(blob) == ContentTypeTag::SignedData
    }

    /// True for any of the six recognized PKCS#7 content types.
    #[must_use]
    pub fn is_valid_container(&self, blob: &[u8]) -> bool {
        self.classify(blob).is_recognized()
    }

    #[must_use]
    pub fn is_valid_container_of(&self, blob: &[u8], tag: ContentTypeTag) -> bool {
        tag.is_recognized() && self.classify(blob) == tag
    }
}

fn outer_content_type(blob: &[u8]) -> der::Result<ObjectIdentifier> {
    let mut reader = SliceReader::new(blob)?;
    let header = Header::decode(&mut reader)?;
    if header.tag != Tag::Sequence {
        return Err(der::Error::new(
            der::ErrorKind::TagUnexpected {
                expected: Some(Tag::Sequence),
                actual: header.tag,
            },
            reader.position(),
        ));
    }
    ObjectIdentifier::decode(&mut reader)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_garbage_are_unrecognized() {
        let classifier = ContentTypeClassifier::new();
        assert_eq!(classifier.classify(&[]), ContentTypeTag::Unrecognized);
        assert_eq!(classifier.classify(b"hello"), ContentTypeTag::Unrecognized);
        assert!(!classifier.is_signature(&[]));
        assert!(!classifier.is_valid_container(&[0x30]));
    }

    #[test]
    fn reads_only_the_leading_oid() {
        // SEQUENCE header claiming more content than present, followed by id-signedData.
        let mut blob = vec![0x30, 0x82, 0x10, 0x00];
        blob.extend_from_slice(&[0x06, 0x09, 0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x07, 0x02]);
        let classifier = ContentTypeClassifier::new();
        assert_eq!(classifier.classify(&blob), ContentTypeTag::SignedData);
        assert!(classifier.is_signature(&blob));
        assert!(classifier.is_valid_container_of(&blob, ContentTypeTag::SignedData));
        assert!(!classifier.is_valid_container_of(&blob, ContentTypeTag::EnvelopedData));
    }

    #[test]
    fn unknown_oid_is_unrecognized() {
        // SEQUENCE { OID 1.2.3 }
        let blob = [0x30, 0x04, 0x06, 0x02, 0x2a, 0x03];
        let classifier = ContentTypeClassifier::new();
        assert_eq!(classifier.classify(&blob), ContentTypeTag::Unrecognized);
        assert!(!classifier.is_valid_container_of(&blob, ContentTypeTag::Unrecognized));
    }
}
