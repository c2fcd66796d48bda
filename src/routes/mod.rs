pub mod episode;
pub mod health;
