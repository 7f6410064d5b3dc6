//! # Records
//!
//! Documents the clinic keeps in its hosted store, and the seam to that store.
//!
//! ## Collections
//! - `users`: account profiles keyed by identity uid
//! - `appointments`: bookings keyed by appointment id
//!
//! Nothing here owns an authoritative copy. Callers re-read on demand.
pub mod appointments;
pub mod memory;
pub mod models;
pub mod redis_store;
pub mod store;

pub use appointments::update_status;
pub use memory::MemoryStore;
pub use models::{APPOINTMENTS, AccountRecord, Appointment, AppointmentStatus, Role, USERS};
pub use redis_store::RedisStore;
pub use store::{Document, DocumentStore, StoreError, read_record, to_document, write_record};
