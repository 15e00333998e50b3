//! Connects to a running game, prints the player's economy and every own
//! actor, then points the camera at the first one.
//!
//! ```text
//! RALLY_HOST=127.0.0.1 RALLY_PORT=7445 RALLY_LANG=en RUST_LOG=rally_client=debug \
//!     cargo run -p recon
//! ```

use std::env;

use rally::client::DEFAULT_PORT;
use rally::prelude::*;

fn builder_from_env() -> Result<ClientBuilder, Box<dyn std::error::Error>> {
    let mut builder = GameClient::builder();
    if let Ok(host) = env::var("RALLY_HOST") {
        builder = builder.host(host);
    }
    let port = match env::var("RALLY_PORT") {
        Ok(port) => port.parse()?,
        Err(_) => DEFAULT_PORT,
    };
    builder = builder.port(port);
    if let Ok(lang) = env::var("RALLY_LANG") {
        builder = builder.language(lang.parse::<Language>()?);
    }
    Ok(builder)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "recon=info,rally=info".into()),
        )
        .init();

    let api = GameApi::from_client(builder_from_env()?.build());
    let addr = api.client().addr().to_string();
    if !api.ping().await {
        tracing::error!(%addr, "game server is not answering");
        return Err(format!("no game server at {addr}").into());
    }
    tracing::info!(%addr, "connected");

    let base = api.player_base_info_query().await?;
    println!(
        "money {} (cash {} + resources {}), power {}/{}",
        base.cash + base.resources,
        base.cash,
        base.resources,
        base.power_drained,
        base.power_provided,
    );

    let mut own = api.query_actor(&TargetsQuery::new().faction(FACTION_OWN)).await?;
    own.sort_by_key(|a| a.id);
    for actor in &own {
        println!(
            "{:>6}  {:<8} {:>10}  hp {:>3}%",
            actor.id.into_inner(),
            actor.kind,
            actor.position.to_string(),
            actor.hp_percent,
        );
    }
    println!("{} own actors", own.len());

    if let Some(first) = own.first() {
        api.move_camera_to_actor(first).await?;
    }
    Ok(())
}
