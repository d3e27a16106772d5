pub mod traits;
pub mod trajectory;
