pub mod framework;
pub mod infrastructure;
pub mod utilities;
