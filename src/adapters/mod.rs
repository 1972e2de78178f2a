// Adapters
// PostgreSQLサーバーと外部ダンプ/リストアツールへのアクセスを抽象化

pub mod connection_string;
pub mod database;
pub mod toolchain;
