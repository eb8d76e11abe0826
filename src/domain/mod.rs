pub mod forecast;
pub mod historical;
pub mod series;

pub use forecast::*;
pub use historical::*;
pub use series::*;
