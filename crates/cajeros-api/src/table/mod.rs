// Table backend
//
// Direct table access over the hosted Postgres service's HTTP interface
// (`/rest/v1/<table>`, PostgREST filter syntax). Answers are bare JSON
// arrays; failures come back as non-2xx with a `{message, code}` body.

pub mod admins;
pub mod assignments;
pub mod cajeros;
pub mod client;
pub mod filter;
pub mod macros;

pub use client::TableClient;
pub use filter::Filter;

/// Device table.
pub const CAJEROS: &str = "cajeros";
/// Administrator table.
pub const ADMINISTRADORES: &str = "administradores";
/// Administrator ↔ device join table.
pub const ADMINISTRADOR_CAJERO: &str = "administrador_cajero";
/// Singleton macro table.
pub const MACROS: &str = "macros";
