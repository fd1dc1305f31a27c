//! Extraction of embedded plaintext content.

use cms::digested_data::DigestedData;
use der::asn1::OctetString;

use crate::domain::cms::{decode_any, decode_content_info, SignatureContainer};
use crate::domain::types::ContentTypeTag;
use crate::infra::error::{CadesError, CadesResult};
use crate::services::classifier::ContentTypeClassifier;

/// Return the content embedded in a Data, implicit SignedData or
/// DigestedData structure.
pub fn extract_content(blob: &[u8]) -> CadesResult<Vec<u8>> {
    let tag = ContentTypeClassifier::new().classify(blob);
    match tag {
        ContentTypeTag::Data => {
            let content_info = decode_content_info(blob)?;
            let octets: OctetString = decode_any(&content_info.content)?;
            Ok(octets.into_bytes())
        }
        ContentTypeTag::SignedData => SignatureContainer::from_der(blob)?
            .embedded_content()?
            .ok_or_else(|| {
                CadesError::UnsupportedFormat(
                    "The signature is explicit and does not embed the signed data".to_string(),
                )
            }),
        ContentTypeTag::DigestedData => {
            let content_info = decode_content_info(blob)?;
            let digested: DigestedData = decode_any(&content_info.content)?;
            let econtent = digested.encap_content_info.econtent.ok_or_else(|| {
                CadesError::UnsupportedFormat("The DigestedData does not embed its data".to_string())
            })?;
            let octets: OctetString = decode_any(&econtent)?;
            Ok(octets.into_bytes())
        }
        other => Err(CadesError::UnsupportedFormat(format!(
            "Cannot extract plaintext from {other}"
        ))),
    }
}
