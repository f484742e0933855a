pub mod booking;
pub mod offering;
pub mod stats;
pub mod user;

pub use booking::{
    BookingRequest, BookingStatus, ConfirmedBooking, DonationAmount, Gender, RequesterDetails,
};
pub use offering::{CatalogEntry, OfferingCategory};
pub use stats::TempleStats;
pub use user::{Identity, UserDetails, UserRecord, UserSummary};
