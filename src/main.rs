//! Arkanoid session headless runner
//!
//! Drives the session worker with a scripted simulation thread so the whole
//! resume → play → pause cycle can be exercised without an engine or a
//! screen. UI refreshes are printed from the main thread.

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use clap::Parser;

    use arkanoid_session::level::{self, Cell};
    use arkanoid_session::{
        Dispatcher, JsonFileStore, LoggingEngine, Prize, PrizeGenerator, SessionController,
        Settings, UiSink, ui_queue,
    };

    /// Replay a scripted game against the session controller
    #[derive(Parser, Debug)]
    #[command(name = "arkanoid-session")]
    #[command(about = "Headless session runner for the brick-breaker game", long_about = None)]
    #[command(version)]
    struct Cli {
        /// Settings file (defaults are used if it does not exist)
        #[arg(long, default_value = "arkanoid_settings.json")]
        settings: PathBuf,

        /// Play as this player instead of the one in the settings file
        #[arg(long)]
        player: Option<i64>,

        /// Number of levels to play through
        #[arg(long, default_value = "2")]
        levels: u32,

        /// Lose the ball after every N broken cells (0 = never)
        #[arg(long, default_value = "7")]
        lose_every: usize,

        /// Seed for random prize drops
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Reset lives and score before playing
        #[arg(long)]
        reset: bool,

        /// Write the effective settings back to the settings file
        #[arg(long)]
        save_settings: bool,
    }

    /// Prints every refresh to stdout
    struct ConsoleHud;

    impl UiSink for ConsoleHud {
        fn on_lives_changed(&mut self, lives: i32) {
            println!("  lives: {lives}");
        }

        fn on_score_changed(&mut self, score: u64, delta: i64) {
            if delta == 0 {
                println!("  score: {score}");
            } else {
                println!("  score: {score} ({delta:+})");
            }
        }

        fn on_level_changed(&mut self, level: u32) {
            println!("  level: {}", level + 1);
        }

        fn on_cardinality_changed(&mut self, cardinality: i32) {
            log::trace!("cardinality: {cardinality}");
        }

        fn on_game_over(&mut self) {
            println!("  *** GAME OVER ***");
        }
    }

    /// Break every cell of the catalog levels starting at `first`, the way an
    /// engine would report it.
    fn simulate(dispatcher: &Dispatcher, first: u32, cli: &Cli, drop_probability: f64) {
        let mut prizes = PrizeGenerator::new(cli.seed, drop_probability);
        let mut current = first;
        let mut broken = 0usize;

        for _ in 0..cli.levels {
            let layout = level::decode(i64::from(current));
            let mut remaining = i32::try_from(layout.cardinality()).unwrap_or(i32::MAX);
            log::info!("sim: playing level {} ({remaining} hits)", current + 1);

            dispatcher.ball_thrown();
            dispatcher.angle_changed(std::f32::consts::FRAC_PI_4);
            dispatcher.cardinality_changed(remaining);

            let mut won = false;
            'board: for row in 0..layout.height() {
                for col in 0..layout.width() {
                    let Some(cell) = layout.cell(row, col) else {
                        continue;
                    };
                    match cell {
                        Cell::Empty => continue,
                        Cell::Block(kind) => {
                            let cost = kind.cardinality_cost();
                            if cost == 0 {
                                continue;
                            }
                            remaining -= i32::try_from(cost).unwrap_or(i32::MAX);
                            dispatcher.score_updated(i64::from(kind.score()));
                        }
                        Cell::PrizeSpawn(prize) => {
                            remaining -= 1;
                            dispatcher.prize_caught(i32::from(prize.code()));
                        }
                    }
                    dispatcher.cardinality_changed(remaining.max(0));
                    broken += 1;

                    let prize = prizes.generate();
                    if prize != Prize::None {
                        dispatcher.prize_caught(i32::from(prize.code()));
                        if prize == Prize::Win {
                            won = true;
                            break 'board;
                        }
                    }

                    if cli.lose_every > 0 && broken % cli.lose_every == 0 {
                        dispatcher.ball_lost();
                        dispatcher.ball_thrown();
                    }
                    thread::sleep(Duration::from_millis(2));
                }
            }

            if !won {
                dispatcher.level_finished();
            }
            current = level::next_level(current);
        }
        log::info!("sim: done");
    }

    pub fn run() -> Result<(), Box<dyn std::error::Error>> {
        env_logger::init();
        let cli = Cli::parse();
        log::info!("Arkanoid session (headless) starting...");

        let mut settings = Settings::load(&cli.settings);
        if let Some(player) = cli.player {
            settings.player_id = player;
        }
        if cli.save_settings {
            settings.save(&cli.settings)?;
        }

        let store = Arc::new(JsonFileStore::new(&settings.store_path));
        let dispatcher = Arc::new(Dispatcher::new());
        let (ui, updates) = ui_queue();
        let controller = SessionController::spawn(
            &settings,
            Arc::new(LoggingEngine::new()),
            store,
            Arc::clone(&dispatcher),
            ui,
        )?;

        if let Err(e) = controller.resume() {
            log::warn!("Resume reported {e}; continuing with a fresh session");
        }
        if cli.reset {
            controller.reset_stat()?;
        }

        let start = controller.stats()?;
        println!(
            "player {}: lives {} level {} score {}",
            settings.player_id,
            start.lives,
            start.level + 1,
            start.score
        );

        let mut hud = ConsoleHud;
        thread::scope(|scope| {
            let sim = scope.spawn(|| {
                simulate(&dispatcher, start.level, &cli, settings.drop_probability)
            });
            while !sim.is_finished() {
                updates.drain_into(&mut hud);
                thread::sleep(Duration::from_millis(16));
            }
        });

        controller.pause()?;
        updates.drain_into(&mut hud);

        let end = controller.stats()?;
        println!(
            "saved: lives {} level {} score {}",
            end.lives,
            end.level + 1,
            end.score
        );
        controller.shutdown();
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    if let Err(e) = native::run() {
        log::error!("{e}");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The session is embedded by the host on wasm; there is no runner
}
