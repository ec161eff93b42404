use chrono::{DateTime, Utc};
use leaf_sentinel_common::Prediction;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;

/// 台帳アイテムID
///
/// 台帳の生存期間中は再利用されない（clear後も採番を続ける）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ItemId(pub(crate) u64);

impl ItemId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 画像データ（作成時に取り込んだ不変のバイト列）
///
/// 複製は参照カウントのみで、バイト列はコピーされない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    name: String,
    bytes: Arc<[u8]>,
}

impl ImageData {
    pub fn new(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// SHA-256 の先頭8バイト（16進）
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.bytes());
        hex::encode(&digest[..8])
    }
}

impl Serialize for ImageData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("ImageData", 3)?;
        s.serialize_field("name", &self.name)?;
        s.serialize_field("size", &self.bytes.len())?;
        s.serialize_field("fingerprint", &self.fingerprint())?;
        s.end()
    }
}

/// 判定の最終結果（台帳に書き戻す値）
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Classified(Prediction),
    /// 判定失敗（再試行しない終端状態）
    Failed(String),
}

impl<E: fmt::Display> From<Result<Prediction, E>> for Outcome {
    fn from(result: Result<Prediction, E>) -> Self {
        match result {
            Ok(prediction) => Outcome::Classified(prediction),
            Err(e) => Outcome::Failed(e.to_string()),
        }
    }
}

/// アイテムの状態
///
/// Pending から一度だけ遷移し、戻ることはない。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum ItemStatus {
    Pending,
    Completed { result: Prediction },
    Failed { reason: String },
}

impl From<Outcome> for ItemStatus {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Classified(result) => ItemStatus::Completed { result },
            Outcome::Failed(reason) => ItemStatus::Failed { reason },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    pub image: ImageData,
    pub created_at: DateTime<Utc>,
    pub status: ItemStatus,
}

impl Item {
    pub fn is_pending(&self) -> bool {
        matches!(self.status, ItemStatus::Pending)
    }

    pub fn prediction(&self) -> Option<&Prediction> {
        match &self.status {
            ItemStatus::Completed { result } => Some(result),
            _ => None,
        }
    }
}
