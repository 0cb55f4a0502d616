pub mod activity;
pub mod checkin_entry;
pub mod morning_checkin;
pub mod nightly_checkin;
pub mod summary;
pub mod warning_flag;
