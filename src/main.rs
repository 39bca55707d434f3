mod config;
mod progress;
mod reports;
mod routes;
mod state;

use sqlx::PgPool;

#[tokio::main]
async fn main() {
    let config = config::Config::from_env();

    let db = PgPool::connect(&config.database_url)
        .await
        .expect("Error connecting DB");

    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .expect("Error running migrations");

    let state = state::AppState { db };

    let app = routes::routes(state.clone()).with_state(state);

    let listener = tokio::net::TcpListener::bind(config.addr()).await.unwrap();

    println!("server is chilling at http://{}", config.addr());

    axum::serve(listener, app).await.unwrap();
}
