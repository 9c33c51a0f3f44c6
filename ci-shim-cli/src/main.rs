use clap::Parser;

use ci_shim_cli::app;
use ci_shim_cli::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let code = match app::dispatch(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, exit_code = e.exit_code(), "ci-shim failed");
            eprintln!("error: {e}");
            e.exit_code()
        }
    };

    std::process::exit(code);
}
