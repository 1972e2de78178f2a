// dbferryライブラリのエントリーポイント
//
// モジュール構造:
// - cli: CLIレイヤー（ユーザー入力の受付とコマンドルーティング）
// - core: コアドメイン（エンドポイント設定、カタログ、転送結果、エラー）
// - adapters: PostgreSQLサーバーとpg_dump/psqlへのアクセスを抽象化
// - services: 接続確認・カタログ比較・一括移行の実行

pub mod cli;
pub mod core;
pub mod adapters;
pub mod services;
