//! In-memory bonus store.
//!
//! Bonuses are not persisted: the ledger is the source of truth for whether
//! a bonus was paid, and this store only carries the metadata (reason,
//! timestamps, transaction hash) the API shows alongside it.

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use crate::domain::{AppError, Bonus, BonusStore, ListBonusesParams};

/// Thread-safe bonus store backed by `DashMap`
#[derive(Debug, Default)]
pub struct InMemoryBonusStore {
    store: DashMap<String, Bonus>,
}

impl InMemoryBonusStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

#[async_trait]
impl BonusStore for InMemoryBonusStore {
    async fn insert(&self, bonus: Bonus) -> Result<(), AppError> {
        debug!(bonus_id = %bonus.id, employee_id = %bonus.employee_id, "Bonus stored");
        self.store.insert(bonus.id.clone(), bonus);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Bonus>, AppError> {
        Ok(self.store.get(id).map(|entry| entry.value().clone()))
    }

    async fn list(&self, params: &ListBonusesParams) -> Result<Vec<Bonus>, AppError> {
        let mut bonuses: Vec<Bonus> = self
            .store
            .iter()
            .filter(|entry| {
                let bonus = entry.value();
                params.status.is_none_or(|s| bonus.status == s)
                    && params
                        .employee_id
                        .as_ref()
                        .is_none_or(|id| &bonus.employee_id == id)
            })
            .map(|entry| entry.value().clone())
            .collect();
        bonuses.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(bonuses)
    }

    async fn update(&self, bonus: Bonus) -> Result<bool, AppError> {
        match self.store.get_mut(&bonus.id) {
            Some(mut entry) => {
                *entry = bonus;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BonusStatus;
    use chrono::{Duration, Utc};

    fn bonus(id: &str, employee_id: &str, minutes_ago: i64) -> Bonus {
        Bonus {
            id: id.to_string(),
            employee_id: employee_id.to_string(),
            wallet_address: "0x1111111111111111111111111111111111111111".to_string(),
            amount: "100".to_string(),
            token: "USDC".to_string(),
            reason: "Launch".to_string(),
            status: BonusStatus::Pending,
            tx_hash: None,
            created_at: Utc::now() - Duration::minutes(minutes_ago),
            distributed_at: None,
        }
    }

    #[tokio::test]
    async fn test_list_filters_and_orders_newest_first() {
        let store = InMemoryBonusStore::new();
        store.insert(bonus("b1", "e1", 30)).await.unwrap();
        store.insert(bonus("b2", "e2", 10)).await.unwrap();
        store.insert(bonus("b3", "e1", 20)).await.unwrap();

        let all = store.list(&ListBonusesParams::default()).await.unwrap();
        let ids: Vec<_> = all.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["b2", "b3", "b1"]);

        let for_e1 = store
            .list(&ListBonusesParams {
                employee_id: Some("e1".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(for_e1.len(), 2);
    }

    #[tokio::test]
    async fn test_update_existing_only() {
        let store = InMemoryBonusStore::new();
        let mut b = bonus("b1", "e1", 0);
        assert!(!store.update(b.clone()).await.unwrap());

        store.insert(b.clone()).await.unwrap();
        b.status = BonusStatus::Distributed;
        assert!(store.update(b).await.unwrap());

        let distributed = store
            .list(&ListBonusesParams {
                status: Some(BonusStatus::Distributed),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(distributed.len(), 1);
        assert_eq!(store.len(), 1);
    }
}
