// ── Macro configuration ──

use serde::{Deserialize, Serialize};

/// The singleton payment-routing record. Missing identifiers read as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroConfig {
    pub cbu90: String,
    pub cbu100: String,
}
