//! 内存存储
//!
//! 用于测试与演练的 `DataStore` 实现。查询优先返回排队的结果；
//! 队列为空时按 SQL 中 `FROM <table>` 返回已写入的整张表（不做过滤）。

use crate::error::StoreError;
use crate::storage::manager::DataStore;
use crate::storage::table::Table;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

/// 排队的查询结果
enum QueryResponse {
    Rows(Table),
    Fail(StoreError),
}

/// 内存存储
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<String, Table>>,
    responses: Mutex<VecDeque<QueryResponse>>,
    queries: Mutex<Vec<String>>,
    appends: Mutex<Vec<String>>,
    failing_tables: Mutex<HashSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置一张表
    pub fn with_table(self, name: &str, table: Table) -> Self {
        lock(&self.tables).insert(name.to_string(), table);
        self
    }

    /// 下一次查询返回给定结果
    pub fn push_query_result(&self, table: Table) {
        lock(&self.responses).push_back(QueryResponse::Rows(table));
    }

    /// 下一次查询以 `StoreError::Query` 失败
    pub fn push_query_error(&self, message: &str) {
        self.push_query_failure(StoreError::Query(message.to_string()));
    }

    /// 下一次查询以给定错误失败
    pub fn push_query_failure(&self, error: StoreError) {
        lock(&self.responses).push_back(QueryResponse::Fail(error));
    }

    /// 之后对该表的追加写入都失败
    pub fn fail_writes_to(&self, table_name: &str) {
        lock(&self.failing_tables).insert(table_name.to_string());
    }

    /// 表内容快照
    pub fn table(&self, name: &str) -> Option<Table> {
        lock(&self.tables).get(name).cloned()
    }

    /// 表行数，表不存在时为 0
    pub fn row_count(&self, name: &str) -> usize {
        lock(&self.tables).get(name).map(Table::len).unwrap_or(0)
    }

    /// 已执行的查询
    pub fn queries(&self) -> Vec<String> {
        lock(&self.queries).clone()
    }

    /// 成功追加过的表名（按调用顺序）
    pub fn appends(&self) -> Vec<String> {
        lock(&self.appends).clone()
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn query(&self, sql: &str) -> Result<Table, StoreError> {
        lock(&self.queries).push(sql.to_string());

        if let Some(response) = lock(&self.responses).pop_front() {
            return match response {
                QueryResponse::Rows(table) => Ok(table),
                QueryResponse::Fail(error) => Err(error),
            };
        }

        let tables = lock(&self.tables);
        let table = source_table(sql)
            .and_then(|name| tables.get(&name))
            .cloned()
            .unwrap_or_default();
        Ok(table)
    }

    async fn append(&self, table_name: &str, data: &Table) -> Result<u64, StoreError> {
        if lock(&self.failing_tables).contains(table_name) {
            return Err(StoreError::Write {
                table: table_name.to_string(),
                message: "write rejected".to_string(),
            });
        }

        lock(&self.tables)
            .entry(table_name.to_string())
            .or_default()
            .extend(data.clone());
        lock(&self.appends).push(table_name.to_string());

        Ok(data.len() as u64)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// 提取 `FROM` 之后的表名
fn source_table(sql: &str) -> Option<String> {
    let mut tokens = sql.split_whitespace();
    while let Some(token) = tokens.next() {
        if token.eq_ignore_ascii_case("from") {
            return tokens
                .next()
                .map(|t| t.trim_matches(|c| c == '"' || c == ';').to_string());
        }
    }
    None
}
