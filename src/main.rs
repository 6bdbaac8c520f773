#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = timenag_lib::run().await {
        log::error!("{} ({})", e, e.recovery_suggestion());
        std::process::exit(1);
    }
}
