// ── Filter predicates for device snapshots ──
//
// Used by device views to narrow a snapshot without re-querying the backend.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::model::Device;

/// Online/offline selector.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Online,
    Offline,
}

/// Name substring (case-insensitive) plus status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceFilter {
    pub name: String,
    pub status: StatusFilter,
}

impl DeviceFilter {
    pub fn new(name: impl Into<String>, status: StatusFilter) -> Self {
        Self {
            name: name.into(),
            status,
        }
    }

    pub fn matches(&self, device: &Device) -> bool {
        let name_match = self.name.is_empty()
            || device
                .name
                .to_lowercase()
                .contains(&self.name.to_lowercase());
        let status_match = match self.status {
            StatusFilter::All => true,
            StatusFilter::Online => device.online,
            StatusFilter::Offline => !device.online,
        };
        name_match && status_match
    }

    /// Matching devices, sorted by name.
    pub fn apply(&self, devices: &[Arc<Device>]) -> Vec<Arc<Device>> {
        let mut out: Vec<Arc<Device>> = devices
            .iter()
            .filter(|d| self.matches(d))
            .cloned()
            .collect();
        out.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.name.cmp(&b.name))
                .then_with(|| a.id.cmp(&b.id))
        });
        out
    }
}
