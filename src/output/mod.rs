pub mod console;
pub mod format;
