//! Binary entrypoint for the vidsync command-line tool.

#[tokio::main]
async fn main() {
    let exit_code = vidsync_cli::run().await;
    std::process::exit(exit_code);
}
