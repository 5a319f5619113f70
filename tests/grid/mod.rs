pub mod fixtures;
mod mutations;
mod queries;
