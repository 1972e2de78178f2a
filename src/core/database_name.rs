// データベース名
//
// PostgreSQLの識別子規則に従って検証済みのデータベース名。
// カタログの集合演算や転送対象の並び順のキーとして使用します。

use crate::core::error::MigrationError;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// PostgreSQLの識別子の最大長（NAMEDATALEN - 1）
pub const MAX_NAME_BYTES: usize = 63;

/// 検証済みデータベース名
///
/// 大文字小文字を区別し、バイト列の辞書順で並びます。
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DatabaseName(String);

impl DatabaseName {
    /// 名前を検証して作成
    pub fn new(name: impl Into<String>) -> Result<Self, MigrationError> {
        let name = name.into();

        if name.is_empty() {
            return Err(MigrationError::InvalidDatabaseName {
                name,
                reason: "Database name must not be empty".to_string(),
            });
        }

        if name.len() > MAX_NAME_BYTES {
            let reason = format!(
                "Database name must be at most {} bytes (got {})",
                MAX_NAME_BYTES,
                name.len()
            );
            return Err(MigrationError::InvalidDatabaseName { name, reason });
        }

        if name.contains('\0') {
            return Err(MigrationError::InvalidDatabaseName {
                name,
                reason: "Database name must not contain NUL characters".to_string(),
            });
        }

        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// SQL文に埋め込むためにダブルクォートで囲んだ識別子
    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.0.replace('"', "\"\""))
    }
}

impl fmt::Display for DatabaseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DatabaseName {
    type Err = MigrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for DatabaseName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for DatabaseName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}
