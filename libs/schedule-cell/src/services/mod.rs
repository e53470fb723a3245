pub mod availability;
pub mod overlap;
pub mod schedule;
pub mod store;

pub use availability::AvailabilityResolver;
pub use overlap::{check_overlap, OverlapChecker, OverlapPolicy};
pub use schedule::ScheduleService;
pub use store::{ScheduleStore, SupabaseScheduleStore};
