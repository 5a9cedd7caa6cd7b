//! Headless carousel driver
//!
//! Runs one round for every configured carousel stage with a table of bots
//! and one idle human, then prints the settled player records.
//!
//! Usage: `carousel-sim [config.json] [seed]`

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use std::path::Path;

    use carousel::consts::SIM_DT;
    use carousel::sim::MiniGame;
    use carousel::{CarouselConfig, Player, RecordingHooks};

    env_logger::init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => CarouselConfig::load(Path::new(&path)),
        None => CarouselConfig::default(),
    };
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(0xC0FFEE);
    log::info!("Carousel sim starting with seed {}", seed);

    let mut players: carousel::game::Players = (1..=5)
        .map(|id| {
            let mut player = if id == 1 {
                Player::new(id, "you")
            } else {
                Player::bot(id, format!("bot{id}"))
            };
            player.rank = id;
            player.money = 5 * id;
            (player.id, player)
        })
        .collect();

    let mut stages: Vec<u32> = config
        .item_carousel_stages
        .iter()
        .chain(&config.portal_carousel_stages)
        .copied()
        .collect();
    stages.sort_unstable();

    let mut game = MiniGame::new(seed, config);
    let mut hooks = RecordingHooks::new();
    for stage in stages {
        game.initialize(&players, stage, None, &mut hooks);
        let mut t = 0.0;
        while t < 20.0 {
            game.tick(SIM_DT, &mut players, &mut hooks);
            t += SIM_DT;
        }
        let settlement = game.stop(&mut players, &mut hooks);
        log::info!("Stage {} settlement: {:?}", stage, settlement);
    }
    log::info!("{} hook calls made", hooks.events.len());

    let records: Vec<&Player> = players.values().collect();
    match serde_json::to_string_pretty(&records) {
        Ok(json) => println!("{json}"),
        Err(e) => log::error!("Cannot serialize players: {}", e),
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Embedders drive `MiniGame` directly on the web
}
