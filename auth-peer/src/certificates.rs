use auth_wire::{RequestedCertificateSet, VerifiableCertificate};

use crate::error::PeerError;
use crate::wallet::Wallet;

/// Selects certificates from `wallet`'s store satisfying `request`, prepared
/// for disclosure to `verifier_identity_key`. Returns an empty vector when
/// nothing matches; this is not an error.
pub async fn get_verifiable_certificates(
    wallet: &dyn Wallet,
    request: &RequestedCertificateSet,
    verifier_identity_key: &str,
) -> Result<Vec<VerifiableCertificate>, PeerError> {
    wallet
        .select_certificates(request, verifier_identity_key)
        .await
        .map_err(PeerError::from)
}

/// Verifies that every certificate in `certificates` satisfies `request`:
/// its certifier is requested, its type is requested, and every field name
/// the request names for that type is present and disclosed.
///
/// Certificate issuance and the selective-disclosure decryption that
/// produces a [`VerifiableCertificate`]'s `fields` are wallet-internal
/// concerns; this function only checks the request/response shape against
/// the already-disclosed plaintext.
pub fn validate_certificates(
    certificates: &[VerifiableCertificate],
    request: &RequestedCertificateSet,
) -> Result<(), PeerError> {
    for cert in certificates {
        if !request.certifiers.iter().any(|c| c == &cert.certifier) {
            return Err(PeerError::CertificateValidation(format!(
                "certifier {} was not requested",
                cert.certifier
            )));
        }
        let Some(required_fields) = request.types.get(&cert.cert_type) else {
            return Err(PeerError::CertificateValidation(format!(
                "type {} was not requested",
                cert.cert_type
            )));
        };
        for field in required_fields {
            if !cert.fields.contains_key(field) {
                return Err(PeerError::CertificateValidation(format!(
                    "certificate of type {} is missing required field {}",
                    cert.cert_type, field
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn cert(certifier: &str, cert_type: &str, fields: &[&str]) -> VerifiableCertificate {
        VerifiableCertificate {
            certifier: certifier.to_string(),
            cert_type: cert_type.to_string(),
            fields: fields.iter().map(|f| (f.to_string(), "v".to_string())).collect::<BTreeMap<_, _>>(),
            signature: vec![0xAA],
        }
    }

    fn request(certifiers: &[&str], type_fields: &[(&str, &[&str])]) -> RequestedCertificateSet {
        RequestedCertificateSet {
            certifiers: certifiers.iter().map(|s| s.to_string()).collect(),
            types: type_fields
                .iter()
                .map(|(t, fs)| (t.to_string(), fs.iter().map(|f| f.to_string()).collect()))
                .collect(),
        }
    }

    #[test]
    fn accepts_matching_certificate() {
        let req = request(&["C"], &[("T", &["x"])]);
        let certs = vec![cert("C", "T", &["x", "y"])];
        assert!(validate_certificates(&certs, &req).is_ok());
    }

    #[test]
    fn rejects_uninvited_certifier() {
        let req = request(&["C"], &[("T", &["x"])]);
        let certs = vec![cert("OTHER", "T", &["x"])];
        assert!(validate_certificates(&certs, &req).is_err());
    }

    #[test]
    fn rejects_missing_required_field() {
        let req = request(&["C"], &[("T", &["x"])]);
        let certs = vec![cert("C", "T", &["y"])];
        assert!(validate_certificates(&certs, &req).is_err());
    }

    #[test]
    fn empty_certificate_list_is_always_valid() {
        let req = request(&["C"], &[("T", &["x"])]);
        assert!(validate_certificates(&[], &req).is_ok());
    }
}
