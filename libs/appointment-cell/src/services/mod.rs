pub mod booking;
pub mod lifecycle;
pub mod locks;
pub mod notifications;
pub mod ports;
pub mod rules;
pub mod store;

pub use booking::{BookingCollaborators, BookingService};
pub use lifecycle::AppointmentLifecycleService;
pub use notifications::{AppointmentEvent, AppointmentNotifier, LogNotifier};
pub use ports::{
    AppointmentStore, AvailabilityLookup, Clock, DoctorDirectory, FixedClock, PatientDirectory,
    SystemClock,
};
pub use store::SupabaseAppointmentStore;
