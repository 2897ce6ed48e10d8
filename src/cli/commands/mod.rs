pub mod fixture;
pub mod migrate;
pub mod serve;
pub mod user;
