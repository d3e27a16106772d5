pub mod params;
pub mod results;
pub mod state;
pub mod system;
