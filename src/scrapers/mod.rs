pub mod kicktipp;

pub use kicktipp::*;
