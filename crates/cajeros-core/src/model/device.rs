// ── Device domain types ──

use cajeros_api::models::nullable;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::entity_id::DeviceId;

/// A terminal device in canonical form.
///
/// `count <= max_count` is expected but not enforced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    pub online: bool,
    pub phone_number: Option<String>,
    pub group_id: Option<String>,
    pub count: i64,
    pub max_count: i64,
    pub daily_count: i64,
}

impl Device {
    /// A device with only an id; every other field at its zero value.
    pub fn new(id: DeviceId) -> Self {
        Self {
            id,
            name: String::new(),
            online: false,
            phone_number: None,
            group_id: None,
            count: 0,
            max_count: 0,
            daily_count: 0,
        }
    }

    pub fn status(&self) -> DeviceStatus {
        DeviceStatus::from(self.online)
    }

    /// Cost of each daily count for a given investment. `None` when either
    /// the investment or the daily count is not positive.
    #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
    pub fn cost_per_daily_count(&self, investment: f64) -> Option<f64> {
        (investment > 0.0 && self.daily_count > 0).then(|| investment / self.daily_count as f64)
    }

    /// Overwrite the fields `patch` carries, keeping every other field.
    pub fn merge(&mut self, patch: &DevicePatch) {
        if let Some(ref name) = patch.name {
            self.name.clone_from(name);
        }
        if let Some(online) = patch.online {
            self.online = online;
        }
        if let Some(ref phone) = patch.phone_number {
            self.phone_number.clone_from(phone);
        }
        if let Some(ref group) = patch.group_id {
            self.group_id.clone_from(group);
        }
        if let Some(count) = patch.count {
            self.count = count;
        }
        if let Some(max) = patch.max_count {
            self.max_count = max;
        }
        if let Some(daily) = patch.daily_count {
            self.daily_count = daily;
        }
    }
}

/// A partial device: the fields of an edit, or of a realtime payload.
/// `None` means "not present", never "clear". The nullable columns use
/// `Some(None)` to clear.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevicePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub online: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "nullable")]
    pub phone_number: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "nullable")]
    pub group_id: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_count: Option<i64>,
}

impl DevicePatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Fields an administrator supplies when registering a device. Status and
/// counters start at `close` / zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDevice {
    pub name: String,
    pub phone_number: Option<String>,
    pub group_id: Option<String>,
    pub max_count: i64,
}

/// Line status as the table backend spells it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DeviceStatus {
    Open,
    Close,
}

impl DeviceStatus {
    pub fn is_online(self) -> bool {
        matches!(self, Self::Open)
    }
}

impl From<bool> for DeviceStatus {
    fn from(online: bool) -> Self {
        if online { Self::Open } else { Self::Close }
    }
}
