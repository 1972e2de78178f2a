// カタログと差分
//
// サーバー上のデータベース名の集合（カタログ）と、
// 2つのカタログの差分結果を表現するデータ構造を定義します。

use crate::core::config::ServerRole;
use crate::core::database_name::DatabaseName;
use serde::Serialize;
use std::collections::BTreeSet;

/// カタログ
///
/// ある時点でサーバーに存在するデータベース名の集合。
/// 取得元のサーバーでタグ付けされ、実行をまたいでキャッシュしません。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Catalog {
    /// 取得元サーバー
    pub role: ServerRole,
    /// データベース名（重複なし、辞書順）
    pub databases: BTreeSet<DatabaseName>,
}

impl Catalog {
    /// 空のカタログを作成
    pub fn new(role: ServerRole) -> Self {
        Self {
            role,
            databases: BTreeSet::new(),
        }
    }

    /// データベース名の集合からカタログを作成
    pub fn from_names<I>(role: ServerRole, names: I) -> Self
    where
        I: IntoIterator<Item = DatabaseName>,
    {
        Self {
            role,
            databases: names.into_iter().collect(),
        }
    }

    /// データベースを追加（既に存在する場合はfalse）
    pub fn insert(&mut self, name: DatabaseName) -> bool {
        self.databases.insert(name)
    }

    /// データベースが存在するかどうか
    pub fn contains(&self, name: &DatabaseName) -> bool {
        self.databases.contains(name)
    }

    pub fn len(&self) -> usize {
        self.databases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.databases.is_empty()
    }

    /// 辞書順にデータベース名を走査
    pub fn iter(&self) -> impl Iterator<Item = &DatabaseName> {
        self.databases.iter()
    }
}

/// カタログ差分
///
/// 比較した2つのカタログのスナップショットに対してのみ有効です。
/// 3つの集合は両カタログの和集合を重複なく分割します。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffResult {
    /// 移行元にのみ存在
    pub source_only: BTreeSet<DatabaseName>,
    /// 移行先にのみ存在
    pub dest_only: BTreeSet<DatabaseName>,
    /// 両方に存在
    pub common: BTreeSet<DatabaseName>,
}

impl DiffResult {
    /// 両サーバーが同じデータベース構成かどうか
    pub fn is_identical(&self) -> bool {
        self.source_only.is_empty() && self.dest_only.is_empty()
    }

    /// 差分に含まれるデータベースの総数
    pub fn total(&self) -> usize {
        self.source_only.len() + self.dest_only.len() + self.common.len()
    }
}
