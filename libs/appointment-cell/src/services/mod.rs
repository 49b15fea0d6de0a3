pub mod conflict;
pub mod memory;
pub mod store;
pub mod supabase;

pub use memory::InMemoryAppointmentStore;
pub use store::{AppointmentResult, AppointmentStore, SharedStore};
pub use supabase::SupabaseAppointmentStore;
