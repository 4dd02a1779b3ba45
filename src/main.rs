use dotenvy::dotenv;
use storefront_checkout::{build_server, create_pool, run_migrations, Config, StartupError};

#[actix_web::main]
async fn main() -> Result<(), StartupError> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env()?;
    let pool = create_pool(&config.database_url)?;
    run_migrations(&pool)?;

    log::info!(
        "Starting server at http://{}:{} with {:?}",
        config.host,
        config.port,
        config.policy
    );

    build_server(pool, config.policy, &config.host, config.port)?.await?;
    Ok(())
}
