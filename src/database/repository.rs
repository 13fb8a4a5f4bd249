use sqlx::{postgres::PgRow, FromRow, PgPool};

use crate::database::manager::DatabaseError;
use crate::database::query_builder::QueryBuilder;
use crate::filter::FilterData;
use crate::types::{Page, Pagination};

/// Filtered reads against a single table
pub struct Repository<T> {
    table_name: &'static str,
    pool: PgPool,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Repository<T>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    pub fn new(table_name: &'static str, pool: PgPool) -> Self {
        Self {
            table_name,
            pool,
            _phantom: std::marker::PhantomData,
        }
    }

    pub async fn select_any(&self, filter_data: FilterData) -> Result<Vec<T>, DatabaseError> {
        QueryBuilder::<T>::new(self.table_name)?
            .filter(filter_data)?
            .select_all(&self.pool)
            .await
    }

    pub async fn select_one(&self, filter_data: FilterData) -> Result<Option<T>, DatabaseError> {
        QueryBuilder::<T>::new(self.table_name)?
            .filter(FilterData { limit: Some(1), offset: None, ..filter_data })?
            .select_optional(&self.pool)
            .await
    }

    pub async fn count(&self, filter_data: FilterData) -> Result<i64, DatabaseError> {
        QueryBuilder::<T>::new(self.table_name)?
            .filter(filter_data)?
            .count(&self.pool)
            .await
    }

    /// One page of rows plus the exact total for the same conditions
    pub async fn select_page(
        &self,
        filter_data: FilterData,
        pagination: Pagination,
    ) -> Result<Page<T>, DatabaseError> {
        let count_filter = FilterData {
            where_clause: filter_data.where_clause.clone(),
            ..FilterData::default()
        };
        let (items, total) = futures::try_join!(
            self.select_any(filter_data.paginate(pagination)),
            self.count(count_filter),
        )?;
        Ok(Page::new(items, total.max(0) as u64, pagination))
    }
}
