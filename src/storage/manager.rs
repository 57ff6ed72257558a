//! 存储管理器
//!
//! 定义关系型存储的统一接口。作业只依赖这个 trait，具体实现由调用方注入。

use crate::error::StoreError;
use crate::storage::table::Table;
use async_trait::async_trait;

/// 数据存储 trait
///
/// `append` 不保证幂等：部分失败后重跑作业可能产生重复行。
#[async_trait]
pub trait DataStore: Send + Sync {
    /// 执行只读查询
    async fn query(&self, sql: &str) -> Result<Table, StoreError>;

    /// 将整张表追加到目标表，返回写入行数
    async fn append(&self, table_name: &str, data: &Table) -> Result<u64, StoreError>;
}

/// 为 SQL 标识符加引号
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("TotalCharges"), "\"TotalCharges\"");
        assert_eq!(quote_ident("odd\"name"), "\"odd\"\"name\"");
    }
}
