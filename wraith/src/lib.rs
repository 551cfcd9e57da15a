// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{load_urls_from_file, parse_url_line};

// Re-export pipeline functionality from wraith-core
pub use wraith_core::{
    CheckOptions, CheckReport, execute_check, generate_check_report, print_banner,
};
