pub mod booking;
pub mod draft;
pub mod mentor;
pub mod payment_config;
pub mod user;

pub use booking::{Booking, BookingOrigin, BookingStatus, PaymentStatus};
pub use draft::BookingDraft;
pub use mentor::{MentorProfile, WeeklyAvailability};
pub use payment_config::PaymentConfig;
pub use user::UserIdentity;
