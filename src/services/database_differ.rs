// カタログ差分検出サービス
//
// 2つのカタログ間で、移行元のみ・移行先のみ・共通のデータベースを求めます。
// 入出力を伴わない純粋な集合演算です。

use crate::core::catalog::{Catalog, DiffResult};

/// カタログ差分検出サービス
#[derive(Debug, Clone, Default)]
pub struct DatabaseDiffer {}

impl DatabaseDiffer {
    /// 新しいDatabaseDifferを作成
    pub fn new() -> Self {
        Self {}
    }

    /// カタログ差分を検出
    ///
    /// # Arguments
    ///
    /// * `source` - 移行元のカタログ
    /// * `destination` - 移行先のカタログ
    ///
    /// # Returns
    ///
    /// カタログ差分
    pub fn diff(&self, source: &Catalog, destination: &Catalog) -> DiffResult {
        DiffResult {
            source_only: source
                .databases
                .difference(&destination.databases)
                .cloned()
                .collect(),
            dest_only: destination
                .databases
                .difference(&source.databases)
                .cloned()
                .collect(),
            common: source
                .databases
                .intersection(&destination.databases)
                .cloned()
                .collect(),
        }
    }
}
