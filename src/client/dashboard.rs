// src/client/dashboard.rs

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::models::{
    inventory::CurrentStock,
    production::{ProductionBatch, ProductionRequest, WasteEvent},
};

pub const RECENT_WASTE_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub low_stock_items: Vec<CurrentStock>,
    pub open_requests: Vec<ProductionRequest>,
    pub todays_batches: Vec<ProductionBatch>,
    pub recent_waste: Vec<WasteEvent>,
}

/// Monta o painel a partir das quatro listas. Função pura: `now` (com o fuso
/// de quem olha) decide o que é "hoje".
pub fn summarize(
    stock: Vec<CurrentStock>,
    open_requests: Vec<ProductionRequest>,
    batches: Vec<ProductionBatch>,
    waste: Vec<WasteEvent>,
    now: DateTime<FixedOffset>,
) -> DashboardData {
    let today = now.date_naive();
    let offset = now.offset();

    DashboardData {
        low_stock_items: stock.into_iter().filter(CurrentStock::is_below_par).collect(),
        open_requests,
        todays_batches: batches
            .into_iter()
            .filter(|batch| batch.created_at.with_timezone(offset).date_naive() == today)
            .collect(),
        recent_waste: waste.into_iter().take(RECENT_WASTE_LIMIT).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        inventory::{InventoryCategory, InventoryItem},
        production::{BatchStatus, WasteReason},
    };
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn stock(quantity: Decimal, par: Decimal) -> CurrentStock {
        let now = Utc::now();
        let item = InventoryItem {
            id: Uuid::new_v4(),
            name: "Vanilla Base".into(),
            category: InventoryCategory::Base,
            unit: "gallons".into(),
            par_stock_level: par,
            default_location_id: None,
            sku: None,
            notes: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        CurrentStock {
            id: Uuid::new_v4(),
            item_id: item.id,
            location_id: Uuid::new_v4(),
            quantity,
            last_updated: now,
            item: Some(item),
            location: None,
        }
    }

    fn batch_created_at(created_at: DateTime<Utc>) -> ProductionBatch {
        ProductionBatch {
            id: Uuid::new_v4(),
            product_item_id: Uuid::new_v4(),
            quantity_made: dec!(4),
            unit: "gallons".into(),
            storage_location_id: Uuid::new_v4(),
            made_by: Uuid::new_v4(),
            started_at: created_at,
            finished_at: None,
            lot_code: "20260101-001".into(),
            notes: None,
            status: BatchStatus::InProgress,
            created_at,
            updated_at: created_at,
        }
    }

    fn waste() -> WasteEvent {
        WasteEvent {
            id: Uuid::new_v4(),
            batch_id: None,
            item_id: Uuid::new_v4(),
            quantity: dec!(1),
            unit: "gallons".into(),
            reason: WasteReason::Spoilage,
            recorded_by: Uuid::new_v4(),
            recorded_at: Utc::now(),
            notes: None,
        }
    }

    fn brasilia() -> FixedOffset {
        FixedOffset::west_opt(3 * 3600).unwrap()
    }

    #[test]
    fn low_stock_is_strictly_below_par() {
        let data = summarize(
            vec![stock(dec!(2), dec!(10)), stock(dec!(10), dec!(10)), stock(dec!(11), dec!(10))],
            vec![],
            vec![],
            vec![],
            Utc::now().with_timezone(&brasilia()),
        );
        assert_eq!(data.low_stock_items.len(), 1);
        assert_eq!(data.low_stock_items[0].quantity, dec!(2));
    }

    #[test]
    fn todays_batches_use_the_viewer_offset() {
        let now = brasilia().with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap();
        // 01:00 UTC do dia 10 ainda é dia 9 em UTC-3
        let yesterday_local = Utc.with_ymd_and_hms(2026, 3, 10, 1, 0, 0).unwrap();
        let today_local = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();

        let data = summarize(
            vec![],
            vec![],
            vec![batch_created_at(yesterday_local), batch_created_at(today_local)],
            vec![],
            now,
        );
        assert_eq!(data.todays_batches.len(), 1);
        assert_eq!(data.todays_batches[0].created_at, today_local);
    }

    #[test]
    fn recent_waste_keeps_the_first_ten() {
        let events: Vec<WasteEvent> = (0..15).map(|_| waste()).collect();
        let first = events[0].id;
        let data = summarize(vec![], vec![], vec![], events, Utc::now().fixed_offset());
        assert_eq!(data.recent_waste.len(), RECENT_WASTE_LIMIT);
        assert_eq!(data.recent_waste[0].id, first);
    }

    #[test]
    fn summarize_is_deterministic() {
        let now = Utc::now().fixed_offset();
        let stock = vec![stock(dec!(1), dec!(5)), stock(dec!(9), dec!(5))];
        let batches = vec![batch_created_at(now.with_timezone(&Utc))];
        let waste = vec![waste(), waste()];

        let first = summarize(stock.clone(), vec![], batches.clone(), waste.clone(), now);
        let second = summarize(stock, vec![], batches, waste, now);
        assert_eq!(first, second);
    }
}
