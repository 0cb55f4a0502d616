pub mod health;
pub mod history;
pub mod morning;
pub mod nightly;
