//! Admin unit management

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{failure_message, MountGuard, Refreshable, MSG_UNIT_NOT_FOUND};
use crate::client::{BoxClient, ClientResult};
use crate::models::{AdminUnit, UnitDraft, UnitOccupancy, UnitPatch};

#[derive(Debug, Default)]
struct UnitsState {
    units: Vec<AdminUnit>,
    occupancy: Vec<UnitOccupancy>,
    message: Option<String>,
}

pub struct AdminUnitsPage {
    client: BoxClient,
    guard: MountGuard,
    state: RwLock<UnitsState>,
}

impl AdminUnitsPage {
    pub fn new(client: BoxClient) -> Self {
        Self {
            client,
            guard: MountGuard::new(),
            state: RwLock::new(UnitsState::default()),
        }
    }

    pub fn unmount(&self) {
        self.guard.unmount();
    }

    /// Fetch the unit list and the occupancy overview concurrently
    pub async fn load(&self) -> ClientResult<()> {
        let (units, occupancy) = tokio::join!(self.client.list_units(), self.client.unit_occupancy());

        let mut state = self.state.write().await;
        if !self.guard.is_mounted() {
            return Ok(());
        }

        state.message = None;
        let mut first_error = None;

        match units {
            Ok(units) => state.units = units,
            Err(e) => {
                state.message = Some(failure_message(&e, MSG_UNIT_NOT_FOUND));
                first_error = Some(e);
            }
        }
        match occupancy {
            Ok(rows) => state.occupancy = rows,
            Err(e) => {
                state.message = Some(failure_message(&e, MSG_UNIT_NOT_FOUND));
                first_error.get_or_insert(e);
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    pub async fn create(&self, draft: &UnitDraft) -> ClientResult<AdminUnit> {
        let result = self.client.create_unit(draft).await;
        let mut state = self.state.write().await;
        if !self.guard.is_mounted() {
            return result;
        }

        match result {
            Ok(unit) => {
                state.units.push(unit.clone());
                state.message = Some(format!("unit {} created", unit.id));
                Ok(unit)
            }
            Err(e) => {
                state.message = Some(failure_message(&e, MSG_UNIT_NOT_FOUND));
                Err(e)
            }
        }
    }

    /// Apply a partial update; the stored unit is replaced by the backend's copy
    pub async fn update(&self, unit_id: &str, patch: &UnitPatch) -> ClientResult<AdminUnit> {
        let result = self.client.update_unit(unit_id, patch).await;
        let mut state = self.state.write().await;
        if !self.guard.is_mounted() {
            return result;
        }

        match result {
            Ok(unit) => {
                match state.units.iter_mut().find(|u| u.id == unit_id) {
                    Some(slot) => *slot = unit.clone(),
                    None => state.units.push(unit.clone()),
                }
                state.message = None;
                Ok(unit)
            }
            Err(e) => {
                state.message = Some(failure_message(&e, MSG_UNIT_NOT_FOUND));
                Err(e)
            }
        }
    }

    pub async fn delete(&self, unit_id: &str) -> ClientResult<()> {
        let result = self.client.delete_unit(unit_id).await;
        let mut state = self.state.write().await;
        if !self.guard.is_mounted() {
            return result;
        }

        match result {
            Ok(()) => {
                state.units.retain(|u| u.id != unit_id);
                state.occupancy.retain(|o| o.box_id != unit_id);
                state.message = Some(format!("unit {} deleted", unit_id));
                Ok(())
            }
            Err(e) => {
                state.message = Some(failure_message(&e, MSG_UNIT_NOT_FOUND));
                Err(e)
            }
        }
    }

    pub async fn units(&self) -> Vec<AdminUnit> {
        self.state.read().await.units.clone()
    }

    pub async fn occupancy(&self) -> Vec<UnitOccupancy> {
        self.state.read().await.occupancy.clone()
    }

    pub async fn message(&self) -> Option<String> {
        self.state.read().await.message.clone()
    }
}

#[async_trait]
impl Refreshable for AdminUnitsPage {
    fn name(&self) -> &'static str {
        "admin-units"
    }

    fn guard(&self) -> &MountGuard {
        &self.guard
    }

    async fn refresh(&self) {
        if let Err(e) = self.load().await {
            tracing::warn!(error = %e, "Unit refresh failed");
        }
    }
}
