//! Rendering of account signer keys.

use stellar_xdr::curr::SignerKey;

use crate::strkey::{
    encode_account_id, encode_pre_auth_tx, encode_sha256_hash, encode_signed_payload,
};

/// Renders a signer key as the StrKey Horizon reports for it.
///
/// Signer keys identify signer sponsorships, so this string is also the
/// stable identity of a signer subject.
pub fn signer_key_to_strkey(key: &SignerKey) -> String {
    match key {
        SignerKey::Ed25519(k) => encode_account_id(&k.0),
        SignerKey::PreAuthTx(h) => encode_pre_auth_tx(&h.0),
        SignerKey::HashX(h) => encode_sha256_hash(&h.0),
        SignerKey::Ed25519SignedPayload(p) => {
            encode_signed_payload(&p.ed25519.0, p.payload.as_slice())
        }
    }
}
