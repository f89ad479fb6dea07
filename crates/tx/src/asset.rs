//! Canonical asset strings.
//!
//! Assets render as `native` or `CODE:ISSUER`; liquidity pool shares render
//! as `liquidity_pool:<pool id hex>`. The same string identifies a trustline
//! whether it comes from a `change_trust` or a revoke ledger key.

use henyey_common::Hash256;
use henyey_crypto::xdr_sha256;
use stellar_xdr::curr::{AlphaNum12, AlphaNum4, Asset, ChangeTrustAsset, TrustLineAsset};

use crate::account::account_id_to_strkey;
use crate::Result;

/// Reads an asset code up to its first NUL byte.
pub fn asset_code_to_str<const N: usize>(code: &[u8; N]) -> String {
    let len = code.iter().position(|&b| b == 0).unwrap_or(N);
    String::from_utf8_lossy(&code[..len]).into_owned()
}

pub fn asset_to_string(asset: &Asset) -> String {
    match asset {
        Asset::Native => "native".to_string(),
        Asset::CreditAlphanum4(a) => alphanum4(a),
        Asset::CreditAlphanum12(a) => alphanum12(a),
    }
}

/// Renders the asset of a `change_trust` operation.
///
/// Pool-share assets are identified by the hash of their parameters.
pub fn change_trust_asset_to_string(asset: &ChangeTrustAsset) -> Result<String> {
    Ok(match asset {
        ChangeTrustAsset::Native => "native".to_string(),
        ChangeTrustAsset::CreditAlphanum4(a) => alphanum4(a),
        ChangeTrustAsset::CreditAlphanum12(a) => alphanum12(a),
        ChangeTrustAsset::PoolShare(params) => {
            format!("liquidity_pool:{}", xdr_sha256(params)?.to_hex())
        }
    })
}

pub fn trustline_asset_to_string(asset: &TrustLineAsset) -> String {
    match asset {
        TrustLineAsset::Native => "native".to_string(),
        TrustLineAsset::CreditAlphanum4(a) => alphanum4(a),
        TrustLineAsset::CreditAlphanum12(a) => alphanum12(a),
        TrustLineAsset::PoolShare(pool_id) => {
            format!("liquidity_pool:{}", Hash256::from(pool_id.0.clone()).to_hex())
        }
    }
}

fn alphanum4(a: &AlphaNum4) -> String {
    format!(
        "{}:{}",
        asset_code_to_str(&a.asset_code.0),
        account_id_to_strkey(&a.issuer)
    )
}

fn alphanum12(a: &AlphaNum12) -> String {
    format!(
        "{}:{}",
        asset_code_to_str(&a.asset_code.0),
        account_id_to_strkey(&a.issuer)
    )
}
