/*
 * This file is part of nctmon.
 *
 * Copyright (C) 2025 nctmon contributors
 *
 * nctmon is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * nctmon is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with nctmon. If not, see <https://www.gnu.org/licenses/>.
 */

//! Sensor arrays and serialisable snapshots

use serde::Serialize;

use crate::chip::ChipFamily;
use crate::error::Result;
use crate::profile::{ChipProfile, SensorKind};
use crate::vendor::Identity;

/// Latest decoded readings. `None` marks an absent or invalid reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorState {
    pub voltages: Vec<Option<f32>>,
    pub temperatures: Vec<Option<f32>>,
    pub fans: Vec<Option<f32>>,
    pub controls: Vec<Option<f32>>,
}

impl SensorState {
    /// Empty arrays sized from the profile; lengths never change afterwards
    pub fn for_profile(profile: &ChipProfile) -> Self {
        Self {
            voltages: vec![None; profile.len(SensorKind::Voltage)],
            temperatures: vec![None; profile.len(SensorKind::Temperature)],
            fans: vec![None; profile.len(SensorKind::Fan)],
            controls: vec![None; profile.len(SensorKind::Control)],
        }
    }

    pub fn values(&self, kind: SensorKind) -> &[Option<f32>] {
        match kind {
            SensorKind::Voltage => &self.voltages,
            SensorKind::Temperature => &self.temperatures,
            SensorKind::Fan => &self.fans,
            SensorKind::Control => &self.controls,
        }
    }
}

/// One labelled channel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub index: usize,
    pub label: String,
    pub value: Option<f32>,
}

/// Point-in-time view of a driver instance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorSnapshot {
    pub chip: String,
    pub family: ChipFamily,
    pub revision: u8,
    pub base_address: u16,
    pub identity: Identity,
    pub voltages: Vec<Reading>,
    pub temperatures: Vec<Reading>,
    pub fans: Vec<Reading>,
    pub controls: Vec<Reading>,
}

impl SensorSnapshot {
    pub fn capture(
        profile: &ChipProfile,
        revision: u8,
        base_address: u16,
        identity: Identity,
        state: &SensorState,
    ) -> Self {
        let readings = |kind: SensorKind| -> Vec<Reading> {
            state
                .values(kind)
                .iter()
                .enumerate()
                .map(|(index, value)| Reading {
                    index,
                    label: profile.label(kind, index),
                    value: *value,
                })
                .collect()
        };

        Self {
            chip: profile.chip.to_string(),
            family: profile.family(),
            revision,
            base_address,
            identity,
            voltages: readings(SensorKind::Voltage),
            temperatures: readings(SensorKind::Temperature),
            fans: readings(SensorKind::Fan),
            controls: readings(SensorKind::Control),
        }
    }
}

/// Render a snapshot as pretty-printed JSON
pub fn snapshot_to_json(snapshot: &SensorSnapshot) -> Result<String> {
    Ok(serde_json::to_string_pretty(snapshot)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::Chip;

    #[test]
    fn test_state_sized_from_profile() {
        let profile = ChipProfile::resolve(Chip::Nct6779D);
        let state = SensorState::for_profile(&profile);
        assert_eq!(state.voltages.len(), 15);
        assert_eq!(state.temperatures.len(), 7);
        assert_eq!(state.fans.len(), 5);
        assert_eq!(state.controls.len(), 5);
        assert!(state.fans.iter().all(Option::is_none));
    }

    #[test]
    fn test_snapshot_labels_and_json() {
        let profile = ChipProfile::resolve(Chip::Nct6687D);
        let mut state = SensorState::for_profile(&profile);
        state.fans[0] = Some(1200.0);

        let snapshot = SensorSnapshot::capture(&profile, 0x01, 0xA20, Identity::Confirmed, &state);
        assert_eq!(snapshot.chip, "NCT6687D");
        assert_eq!(snapshot.fans[0].label, "CPU Fan");
        assert_eq!(snapshot.fans[0].value, Some(1200.0));
        assert_eq!(snapshot.fans[1].value, None);

        let json = snapshot_to_json(&snapshot).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["family"], "embedded_controller");
        assert_eq!(parsed["identity"], "confirmed");
        assert_eq!(parsed["base_address"], 0xA20);
        assert_eq!(parsed["fans"][0]["value"], 1200.0);
        assert!(parsed["fans"][1]["value"].is_null());
    }
}
