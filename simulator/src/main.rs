use clap::{Parser, ValueEnum};
use reelhouse_simulator::{log_report, SimulationConfig, Simulator};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Game {
    Line,
    Cascade,
    Both,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Spins to run per game
    #[arg(short, long, default_value_t = 10_000)]
    spins: u64,

    /// Concurrent players to rotate through
    #[arg(short, long, default_value_t = 8)]
    players: u64,

    /// Bet per spin, in minor units (must be even)
    #[arg(short, long, default_value_t = 10)]
    bet: i64,

    /// RNG seed for a reproducible batch
    #[arg(long, default_value_t = 0)]
    seed: u64,

    #[arg(short, long, value_enum, default_value_t = Game::Both)]
    game: Game,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Create logger
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let config = SimulationConfig {
        spins: args.spins,
        players: args.players.max(1),
        bet: args.bet,
        seed: args.seed,
        ..SimulationConfig::default()
    };
    let mut simulator = Simulator::new(config);

    if matches!(args.game, Game::Line | Game::Both) {
        let report = simulator.run_line().await?;
        log_report("line", &report);
    }
    if matches!(args.game, Game::Cascade | Game::Both) {
        let report = simulator.run_cascade().await?;
        log_report("cascade", &report);
    }

    Ok(())
}
