use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = outpost::cli::Cli::parse();
    if let Err(e) = outpost::cmd::dispatch(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
