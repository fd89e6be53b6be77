//! Static modulus partition of the system id space.
//!
//! Worker `offset` of `modulus` owns every id in `[first_id, last_id]` with
//! `id % modulus == offset`. There is no rebalancing: a worker that dies
//! simply leaves its ids for a re-run.

use std::sync::Arc;

use top500_core::SystemId;
use tracing::warn;

use crate::{ShardStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardPlan {
    modulus: u32,
    offset: u32,
    first_id: u32,
    last_id: u32,
}

impl ShardPlan {
    pub fn new(modulus: u32, offset: u32, first_id: u32, last_id: u32) -> Result<Self, StoreError> {
        if modulus == 0 || offset >= modulus {
            return Err(StoreError::InvalidShard { modulus, offset });
        }
        Ok(Self {
            modulus,
            offset,
            first_id,
            last_id,
        })
    }

    pub fn modulus(&self) -> u32 {
        self.modulus
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Ids owned by this worker, ascending.
    pub fn ids(&self) -> impl Iterator<Item = SystemId> + use<> {
        let modulus = u64::from(self.modulus);
        let first = u64::from(self.first_id);
        let skip = (u64::from(self.offset) + modulus - first % modulus) % modulus;
        (first + skip..=u64::from(self.last_id))
            .step_by(self.modulus as usize)
            .map(|id| SystemId(id as u32))
    }
}

/// Pairs a [`ShardPlan`] with the advisory store.
///
/// Store failures are logged and otherwise ignored: an unreadable marker means
/// the id is processed again, an unwritable one means a later run may repeat it.
pub struct ShardCoordinator {
    plan: ShardPlan,
    store: Arc<dyn ShardStore>,
}

impl ShardCoordinator {
    pub fn new(plan: ShardPlan, store: Arc<dyn ShardStore>) -> Self {
        Self { plan, store }
    }

    pub fn plan(&self) -> &ShardPlan {
        &self.plan
    }

    pub fn store(&self) -> &dyn ShardStore {
        self.store.as_ref()
    }

    pub fn assigned(&self) -> impl Iterator<Item = SystemId> + use<> {
        self.plan.ids()
    }

    /// Whether `id` still needs work.
    pub async fn is_pending(&self, id: SystemId) -> bool {
        match self.store.is_processed(id).await {
            Ok(done) => !done,
            Err(e) => {
                warn!(id = %id, error = %e, "marker lookup failed, processing anyway");
                true
            }
        }
    }

    pub async fn mark_done(&self, id: SystemId) {
        if let Err(e) = self.store.mark_processed(id).await {
            warn!(id = %id, error = %e, "could not record processed marker");
        }
    }
}
