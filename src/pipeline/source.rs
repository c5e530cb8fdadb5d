//! Page sources

use crate::api::{Criteria, Table};
use crate::error::Result;
use crate::types::ReadMode;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;

/// Something that can be read a page at a time
#[async_trait]
pub trait PageSource: Send + Sync + 'static {
    /// What one page holds a list of
    type Item: Send + 'static;

    /// Number of records, when it can be known up front
    async fn total(&self) -> Result<Option<u64>>;

    /// Read `count` records starting at `offset`. Empty means end of data.
    async fn fetch(&self, offset: u32, count: u32) -> Result<Vec<Self::Item>>;
}

/// A table read as typed records
pub struct TableSource<T> {
    table: Table,
    criteria: Criteria,
    mode: ReadMode,
    counted: bool,
    _item: PhantomData<fn() -> T>,
}

impl<T> TableSource<T> {
    /// `getObjects.sjs` reads of `table`
    pub fn objects(table: Table, criteria: Criteria) -> Self {
        Self {
            table,
            criteria,
            mode: ReadMode::Objects,
            counted: false,
            _item: PhantomData,
        }
    }

    /// `getLeftJoin.sjs` reads of a join expression
    pub fn left_join(table: Table, criteria: Criteria) -> Self {
        Self {
            mode: ReadMode::LeftJoin,
            ..Self::objects(table, criteria)
        }
    }

    /// Ask `getCount.sjs` for the total before reading
    #[must_use]
    pub fn counted(mut self, counted: bool) -> Self {
        self.counted = counted;
        self
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn criteria(&self) -> &Criteria {
        &self.criteria
    }
}

impl<T> std::fmt::Debug for TableSource<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableSource")
            .field("table", &self.table.name())
            .field("criteria", &self.criteria.to_string())
            .field("mode", &self.mode)
            .field("counted", &self.counted)
            .finish()
    }
}

#[async_trait]
impl<T> PageSource for TableSource<T>
where
    T: DeserializeOwned + Send + 'static,
{
    type Item = T;

    async fn total(&self) -> Result<Option<u64>> {
        if !self.counted {
            return Ok(None);
        }
        Ok(Some(self.table.count(&self.criteria).await?))
    }

    async fn fetch(&self, offset: u32, count: u32) -> Result<Vec<T>> {
        self.table
            .read(self.mode, offset, count, &self.criteria)
            .await
    }
}
