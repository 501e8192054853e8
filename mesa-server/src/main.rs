use mesa_server::core::{AppState, Config, Server};
use mesa_server::print_banner;
use mesa_server::utils::logger::init_logger;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_logger();
    print_banner();

    let config = Config::from_env();
    let state = AppState::initialize(&config).await?;
    state.start_background_tasks();

    Server::new(config, state).run().await
}
