pub mod checkin;
pub mod history;
pub mod reconcile;
pub mod severity;
pub mod summarizer;
