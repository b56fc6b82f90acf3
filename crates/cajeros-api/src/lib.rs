// cajeros-api: Async Rust client for the cajeros data service
// (REST envelope API, table API and realtime change feed)

pub mod envelope;
pub mod error;
pub mod models;
pub mod realtime;
pub mod rest;
pub mod table;
pub mod transport;

pub use error::Error;
pub use models::{AdminRecord, AssignmentRecord, CajeroRecord, LineStatus, MacroRecord};
pub use realtime::{ChangeFilter, ChangeKind, RealtimeConfig, RealtimeHandle, RowChange, SubscriptionState};
pub use rest::RestClient;
pub use table::{Filter, TableClient};
pub use transport::{TlsMode, TransportConfig};
