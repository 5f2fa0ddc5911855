//! CLI command implementations.

mod show;
mod validate;

pub use show::show;
pub use validate::validate;

use factory_config::Diagnostics;

fn print_diagnostics(diags: &Diagnostics) {
    for diag in diags {
        eprintln!("{}\n", diag);
    }
}
