use chrono::{Duration, NaiveDate, Utc};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::{
    entities::{
        order::{self, Entity as OrderEntity, STATUS_COMPLETED},
        order_item::{self, Entity as OrderItemEntity},
    },
    errors::ServiceError,
    ml::SalesObservation,
};

/// Reads completed order lines and turns them into a daily sales series.
#[derive(Clone)]
pub struct DemandHistoryService {
    db: Arc<DatabaseConnection>,
}

impl DemandHistoryService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Units sold per calendar day (UTC, by order date) over the trailing
    /// `window_days`, ascending. Days without a completed sale are absent.
    #[instrument(skip(self))]
    pub async fn daily_demand(
        &self,
        product_id: Uuid,
        window_days: u32,
    ) -> Result<Vec<SalesObservation>, ServiceError> {
        if window_days == 0 {
            return Err(ServiceError::ValidationError(
                "history window must be at least one day".to_string(),
            ));
        }

        let since = Utc::now() - Duration::days(i64::from(window_days));

        let rows = OrderItemEntity::find()
            .filter(order_item::Column::ProductId.eq(product_id))
            .find_also_related(OrderEntity)
            .filter(order::Column::Status.eq(STATUS_COMPLETED))
            .filter(order::Column::CreatedAt.gte(since))
            .all(&*self.db)
            .await?;

        let series = bucket_by_day(rows.into_iter().filter_map(|(item, order)| {
            order.map(|order| (order.created_at.date_naive(), i64::from(item.quantity)))
        }));

        debug!(
            product_id = %product_id,
            days_with_sales = series.len(),
            "loaded demand history"
        );

        Ok(series)
    }
}

/// Sums quantities per day and returns them in date order.
pub fn bucket_by_day<I>(entries: I) -> Vec<SalesObservation>
where
    I: IntoIterator<Item = (NaiveDate, i64)>,
{
    let mut buckets: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for (date, quantity) in entries {
        *buckets.entry(date).or_insert(0) += quantity;
    }

    buckets
        .into_iter()
        .map(|(date, quantity)| SalesObservation::new(date, quantity))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn sums_same_day_lines_and_sorts() {
        let series = bucket_by_day(vec![
            (day(5), 2),
            (day(1), 4),
            (day(5), 3),
            (day(3), 1),
        ]);

        assert_eq!(
            series,
            vec![
                SalesObservation::new(day(1), 4),
                SalesObservation::new(day(3), 1),
                SalesObservation::new(day(5), 5),
            ]
        );
    }

    #[test]
    fn no_lines_means_empty_series() {
        assert!(bucket_by_day(Vec::new()).is_empty());
    }
}
