pub mod coverage;
pub mod generate;
pub mod inventory;
