pub mod betting;
pub mod models;
pub mod predictors;
pub mod scrapers;
pub mod utils;

pub use betting::*;
pub use models::*;
pub use predictors::*;
pub use scrapers::*;
pub use utils::*;
