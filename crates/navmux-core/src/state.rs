//! Decoded navigation record with dirty flags.
//!
//! `NavigationState` is written only by the UBX decoder. Consumers read it
//! through [`NavigationState::snapshot`] and clear the flags once they have
//! handled the new values; the decoder never clears them. When the consumer
//! lives on another thread, wrap the state in a [`SharedNavigationState`]
//! and use [`SharedNavigationState::take_snapshot`], which copies every field
//! and clears both flags under a single lock.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;

use crate::protocols::ubx::{PosLlh, RelPosNed, UniqueId};

/// Decimal places kept on heading values handed to consumers.
pub const HEADING_DECIMALS: i32 = 4;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavigationState {
    longitude: f64,
    latitude: f64,
    altitude: f64,
    horizontal_accuracy: f64,
    vertical_accuracy: f64,
    heading: f64,
    heading_valid: bool,
    posllh_itow: Option<u32>,
    relposned_itow: Option<u32>,
    unique_id: Option<UniqueId>,
    new_position: bool,
    new_heading: bool,
}

/// Consistent copy of the navigation record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct NavigationSnapshot {
    pub longitude: f64,
    pub latitude: f64,
    /// Metres above mean sea level.
    pub altitude: f64,
    pub horizontal_accuracy: f64,
    pub vertical_accuracy: f64,
    /// Degrees, rounded to [`HEADING_DECIMALS`] places.
    pub heading: f64,
    /// Receiver flagged the last heading as valid.
    pub heading_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posllh_itow: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relposned_itow: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_id: Option<UniqueId>,
    pub new_position: bool,
    pub new_heading: bool,
}

impl NavigationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> NavigationSnapshot {
        NavigationSnapshot {
            longitude: self.longitude,
            latitude: self.latitude,
            altitude: self.altitude,
            horizontal_accuracy: self.horizontal_accuracy,
            vertical_accuracy: self.vertical_accuracy,
            heading: round_heading(self.heading),
            heading_valid: self.heading_valid,
            posllh_itow: self.posllh_itow,
            relposned_itow: self.relposned_itow,
            unique_id: self.unique_id,
            new_position: self.new_position,
            new_heading: self.new_heading,
        }
    }

    pub fn new_heading(&self) -> bool {
        self.new_heading
    }

    pub fn new_position(&self) -> bool {
        self.new_position
    }

    pub fn unique_id(&self) -> Option<UniqueId> {
        self.unique_id
    }

    pub fn clear_heading_flag(&mut self) {
        self.new_heading = false;
    }

    pub fn clear_position_flag(&mut self) {
        self.new_position = false;
    }

    pub(crate) fn apply_relposned(&mut self, relpos: RelPosNed) {
        self.heading = relpos.heading_deg;
        self.heading_valid = relpos.heading_valid;
        self.relposned_itow = Some(relpos.itow);
        self.new_heading = true;
    }

    pub(crate) fn apply_posllh(&mut self, pos: PosLlh) {
        self.longitude = pos.lon_deg;
        self.latitude = pos.lat_deg;
        self.altitude = pos.height_msl_m;
        self.horizontal_accuracy = pos.h_acc_m;
        self.vertical_accuracy = pos.v_acc_m;
        self.posllh_itow = Some(pos.itow);
        self.new_position = true;
    }

    pub(crate) fn apply_unique_id(&mut self, id: UniqueId) {
        self.unique_id = Some(id);
    }
}

pub fn round_heading(heading: f64) -> f64 {
    let factor = 10f64.powi(HEADING_DECIMALS);
    (heading * factor).round() / factor
}

/// Where a decoding session writes its results.
///
/// Implemented directly by `NavigationState` for single-threaded use and by
/// `SharedNavigationState` when a consumer reads from another thread.
pub trait StateStore {
    fn with_state<R>(&mut self, f: impl FnOnce(&mut NavigationState) -> R) -> R;
}

impl StateStore for NavigationState {
    fn with_state<R>(&mut self, f: impl FnOnce(&mut NavigationState) -> R) -> R {
        f(self)
    }
}

/// Cloneable, lock-protected handle to a `NavigationState`.
#[derive(Debug, Clone, Default)]
pub struct SharedNavigationState {
    inner: Arc<Mutex<NavigationState>>,
}

impl SharedNavigationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy every field and clear both flags in one critical section.
    pub fn take_snapshot(&self) -> NavigationSnapshot {
        let mut state = self.lock();
        let snapshot = state.snapshot();
        state.clear_heading_flag();
        state.clear_position_flag();
        snapshot
    }

    pub fn snapshot(&self) -> NavigationSnapshot {
        self.lock().snapshot()
    }

    pub fn clear_heading_flag(&self) {
        self.lock().clear_heading_flag();
    }

    pub fn clear_position_flag(&self) {
        self.lock().clear_position_flag();
    }

    // Writers only touch the state after a message is fully decoded, so a
    // poisoned lock still guards a consistent record.
    fn lock(&self) -> MutexGuard<'_, NavigationState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl StateStore for SharedNavigationState {
    fn with_state<R>(&mut self, f: impl FnOnce(&mut NavigationState) -> R) -> R {
        f(&mut *self.lock())
    }
}
