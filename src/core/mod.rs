// Core Domain
// データベース名、カタログ、転送結果などの純粋なドメインモデル

pub mod catalog;
pub mod config;
pub mod database_name;
pub mod error;
pub mod naming;
pub mod transfer;
