pub mod output;
pub mod pipeline;
pub mod reduce;
pub mod report;
pub mod sitemap;

pub use pipeline::{CheckOptions, DEFAULT_USER_AGENT, execute_check};
pub use report::{CheckReport, generate_check_report};

pub fn print_banner() {
    println!(
        r#"
                     _ _   _
__      ___ __ __ _(_) |_| |__
\ \ /\ / / '__/ _` | | __| '_ \
 \ V  V /| | | (_| | | |_| | | |
  \_/\_/ |_|  \__,_|_|\__|_| |_|
"#
    );
    println!(
        "  wraith v{} - finds the pages that are really there",
        env!("CARGO_PKG_VERSION")
    );
    println!();
}
