pub mod app;
pub mod clock;
pub mod in_memory;
pub mod logger;
pub mod path;
pub mod rolling;
