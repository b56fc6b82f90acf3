// REST envelope backend
//
// Hand-written client for the dashboard's REST service. Every endpoint
// answers with the `{ success, data, message, error }` envelope (or a bare
// payload), and request bodies use the service's own Spanish field names.

pub mod admins;
pub mod cajeros;
pub mod client;
pub mod macros;

pub use client::RestClient;
