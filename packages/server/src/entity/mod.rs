pub mod booking;
pub mod construction_update;
pub mod developer;
pub mod media;
pub mod milestone;
pub mod notification;
pub mod notification_preference;
pub mod payment;
pub mod project;
pub mod property;
pub mod refund;
pub mod user;
