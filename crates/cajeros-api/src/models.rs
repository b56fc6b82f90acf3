// Wire records shared by both backends
//
// The REST and table backends disagree on field names and on how the
// device status is encoded, so every field here is optional and lenient.
// The same record type decodes full rows and partial realtime payloads;
// canonicalization happens in `cajeros-core`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ── Nullable columns ─────────────────────────────────────────────────

/// Serde adapter for `Option<Option<T>>` fields that must tell an absent
/// key (`None`) from an explicit `null` (`Some(None)`). Pair it with
/// `#[serde(default)]`.
pub mod nullable {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }

    /// An absent value serializes as `null`; skip it with
    /// `skip_serializing_if = "Option::is_none"`.
    #[allow(clippy::ref_option)]
    pub fn serialize<T, S>(value: &Option<Option<T>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }
}

// ── Device ───────────────────────────────────────────────────────────

/// A device (`cajero`) row as either backend sends it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CajeroRecord {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub nombre: Option<String>,
    /// Boolean on the REST backend, `"open"`/`"close"` in the table.
    #[serde(default)]
    pub estadolinea: Option<LineStatus>,
    /// `Some(None)` when the column is sent as `null`.
    #[serde(default, with = "nullable")]
    pub numerotelefono: Option<Option<String>>,
    /// Text in most rows, occasionally numeric. `Some(None)` when sent as
    /// `null`.
    #[serde(default, with = "nullable")]
    pub idgrupo: Option<Option<Value>>,
    #[serde(default)]
    pub conteo: Option<i64>,
    #[serde(default)]
    pub maxconteo: Option<i64>,
    /// Daily count under its camel-cased key.
    #[serde(default, rename = "conteoDia")]
    pub conteo_dia: Option<i64>,
    /// Daily count under the lower-cased column name.
    #[serde(default)]
    pub conteodia: Option<i64>,
    /// Catch-all for columns this client does not model.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Raw device status as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum LineStatus {
    Flag(bool),
    Text(String),
    Other(Value),
}

// ── Administrator ────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct AdminRecord {
    pub id: i64,
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub contrasena: Option<String>,
    #[serde(
        default,
        rename = "permisoAdmin",
        alias = "permisoadmin",
        alias = "permiso_admin"
    )]
    pub permiso_admin: Option<bool>,
}

// ── Macro ────────────────────────────────────────────────────────────

/// The singleton macro row. The table names its columns `cbu90%` /
/// `cbu100%`; the REST backend answers with `cbu90` / `cbu100`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MacroRecord {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default, rename = "cbu90%", alias = "cbu90")]
    pub cbu90: Option<String>,
    #[serde(default, rename = "cbu100%", alias = "cbu100")]
    pub cbu100: Option<String>,
}

// ── Assignment ───────────────────────────────────────────────────────

/// One row of the administrator ↔ device join table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRecord {
    pub id_administrador: i64,
    pub id_cajero: i64,
}

/// `{ "id": N }` answers from the name lookup endpoints.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct IdRecord {
    pub id: i64,
}
