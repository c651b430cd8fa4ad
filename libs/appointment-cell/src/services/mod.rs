pub mod booking;
pub mod slots;

pub use booking::AppointmentService;
