// ── Local device mirror ──
//
// Ordered in-memory copy of the remote device table, owned by one view,
// with push-based change notification.

mod mirror;

pub use mirror::{DeviceMirror, MirrorChange};
