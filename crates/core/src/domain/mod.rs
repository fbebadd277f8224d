pub mod booking;
pub mod catalog;
pub mod invoice;
pub mod option;
pub mod session;
