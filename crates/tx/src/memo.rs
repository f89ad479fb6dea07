//! Memo decoding for display.
//!
//! Text memos are arbitrary bytes on the wire, so they are exposed twice: as a
//! lossy UTF-8 string for display and as the base64 of the exact raw bytes.

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use stellar_xdr::curr::Memo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoType {
    #[default]
    None,
    Text,
    Id,
    Hash,
    Return,
}

impl MemoType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoType::None => "none",
            MemoType::Text => "text",
            MemoType::Id => "id",
            MemoType::Hash => "hash",
            MemoType::Return => "return",
        }
    }
}

/// Display form of a transaction memo.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MemoView {
    pub memo_type: MemoType,
    /// Displayable value; absent for `none`.
    pub value: Option<String>,
    /// Base64 of the raw bytes; only set for text memos.
    pub bytes: Option<String>,
}

impl MemoView {
    pub fn from_memo(memo: &Memo) -> Self {
        match memo {
            Memo::None => Self::default(),
            Memo::Text(text) => {
                let raw = text.as_vec();
                Self {
                    memo_type: MemoType::Text,
                    value: Some(String::from_utf8_lossy(raw).into_owned()),
                    bytes: Some(STANDARD.encode(raw)),
                }
            }
            Memo::Id(id) => Self {
                memo_type: MemoType::Id,
                value: Some(id.to_string()),
                bytes: None,
            },
            Memo::Hash(hash) => Self {
                memo_type: MemoType::Hash,
                value: Some(STANDARD.encode(hash.0)),
                bytes: None,
            },
            Memo::Return(hash) => Self {
                memo_type: MemoType::Return,
                value: Some(STANDARD.encode(hash.0)),
                bytes: None,
            },
        }
    }
}
