pub mod health;
pub mod motion;
