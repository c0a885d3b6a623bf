#[tokio::main]
async fn main() {
    if let Err(err) = lending::run::start(std::env::args()).await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
