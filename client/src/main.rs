use std::path::PathBuf;

use anyhow::{anyhow, Result};
use chrono::{Local, Utc};
use clap::{Parser, Subcommand};
use daily_puzzle_client::{
    render, ClientConfig, Completion, Connectivity, DailyClient, HttpScoreApi,
};
use daily_puzzle_core::{achievements::Achievement, Difficulty, PuzzleKind, Verdict};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(version, about = "Play the daily logic puzzle", long_about = None)]
struct Args {
    /// Config file (defaults to ./daily-puzzle.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Play without contacting the score service
    #[arg(long, global = true)]
    offline: bool,

    /// Apply game commands to the saved practice puzzle
    #[arg(long, global = true)]
    practice: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open today's puzzle and show the board
    Today {
        #[arg(short, long, default_value = "binary")]
        kind: PuzzleKind,
        #[arg(short, long, default_value = "easy")]
        difficulty: Difficulty,
    },
    /// Start a practice puzzle that does not count towards stats
    Practice {
        #[arg(short, long, default_value = "binary")]
        kind: PuzzleKind,
        #[arg(short, long, default_value = "easy")]
        difficulty: Difficulty,
        /// Replay a specific seed instead of a random one
        #[arg(long)]
        seed: Option<u32>,
    },
    /// Write a value into a cell; leave out the value to clear it
    Set { row: usize, col: usize, value: Option<u8> },
    /// Lights-out: press a cell
    Press { row: usize, col: usize },
    /// Pairs: turn a card over
    Flip { row: usize, col: usize },
    Hint,
    /// Check the board; a solved board finishes the game
    Check,
    GiveUp,
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "email")]
        provider: String,
        #[arg(long)]
        name: Option<String>,
    },
    Logout,
    /// Upload queued scores and pull the server history
    Sync,
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "daily_puzzle_client=warn,daily_puzzle_core=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => ClientConfig::load_with(path, None)?,
        None => ClientConfig::load()?,
    };
    let now = Utc::now();
    let today = Local::now().date_naive();

    let api = HttpScoreApi::new(&config.api_url, config.request_timeout())?;
    let mut client = DailyClient::open(&config, api, today).await?;
    if args.offline {
        client.set_connectivity(Connectivity::Offline);
    }

    match args.command {
        Command::Today { kind, difficulty } => {
            client.open_today(kind, difficulty, today, now).await?;
        }
        Command::Practice {
            kind,
            difficulty,
            seed,
        } => {
            let game = client.open_practice(kind, difficulty, seed, now).await?;
            println!("Practice seed {}", game.puzzle.seed);
        }
        Command::Login {
            email,
            provider,
            name,
        } => {
            let session = client.login(&email, &provider, name.as_deref()).await?;
            println!("Logged in as {}", session.email);
            return Ok(());
        }
        Command::Logout => {
            client.logout().await?;
            println!("Logged out");
            return Ok(());
        }
        Command::Sync => {
            let report = client.flush(now, today).await?;
            match report.skipped {
                Some(reason) => println!("Sync skipped: {:?}", reason),
                None => println!(
                    "Sent {} score(s): {} accepted, {} unchanged, {} rejected, {} retrying",
                    report.sent, report.accepted, report.unchanged, report.rejected, report.retrying
                ),
            }
            return Ok(());
        }
        Command::Stats => {
            print_stats(&client);
            return Ok(());
        }
        command => {
            let restored = if args.practice {
                client.restore_practice(now).await?.is_some()
            } else {
                client.restore_today(today, now).await?.is_some()
            };
            if !restored {
                return Err(anyhow!(
                    "No puzzle open, run `daily-puzzle today` or `daily-puzzle practice` first"
                ));
            }
            play(&mut client, command, now).await?;
        }
    }

    if let Some(game) = client.game() {
        println!("{}", render::header(game));
        print!("{}", render::board(game));
    }
    if let Some(completion) = client.take_completion() {
        print_completion(&completion);
    }
    Ok(())
}

async fn play(
    client: &mut DailyClient<HttpScoreApi>,
    command: Command,
    now: chrono::DateTime<Utc>,
) -> Result<()> {
    match command {
        Command::Set { row, col, value } => client.set_cell(row, col, value, now).await?,
        Command::Press { row, col } => client.press(row, col, now).await?,
        Command::Flip { row, col } => {
            let outcome = client.flip(row, col, now).await?;
            println!("{:?}", outcome);
        }
        Command::Hint => {
            let (row, col) = client.hint(now).await?;
            println!("Revealed ({}, {})", row, col);
        }
        Command::Check => match client.check(now).await? {
            Verdict::Solved => println!("Solved!"),
            Verdict::Incomplete => println!("Not finished yet"),
            Verdict::Invalid(cells) => println!("{} cell(s) break a rule", cells.len()),
        },
        Command::GiveUp => client.give_up(now).await?,
        other => return Err(anyhow!("{:?} is not a game command", other)),
    }
    Ok(())
}

fn print_completion(completion: &Completion) {
    let result = &completion.result;
    if result.solved {
        println!(
            "Solved {} in {}s with {} hint(s): {} points",
            completion.date, result.time_taken, result.hints_used, result.score
        );
    } else {
        println!("Puzzle for {} not solved", completion.date);
    }
    for achievement in &completion.unlocked {
        print_achievement(*achievement);
    }
    if completion.flush.is_none() {
        println!("Score saved locally, will sync later");
    }
}

fn print_achievement(achievement: Achievement) {
    let info = achievement.info();
    println!("Achievement unlocked: {} ({})", info.title, info.description);
}

fn print_stats(client: &DailyClient<HttpScoreApi>) {
    let stats = client.stats();
    println!("Streak:         {} (longest {})", stats.streak, stats.longest_streak);
    println!("Points:         {} (level {})", stats.total_points, stats.level);
    println!("Puzzles solved: {}", stats.puzzles_solved());
    if let Some(last) = stats.last_played {
        println!("Last played:    {}", last);
    }
    println!("Pending sync:   {}", client.queue().pending());
    for item in client.queue().dead() {
        println!(
            "  not synced {}: {}",
            item.date,
            item.last_error.as_deref().unwrap_or("unknown error")
        );
    }
    match client.session() {
        Some(session) => println!("Logged in as {}", session.email),
        None => println!("Not logged in"),
    }
}
