pub mod utils;

mod bootstrap;
mod catalog;
