use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use rand::{SeedableRng, rngs::StdRng};
use tracing::info;
use tracing_subscriber::EnvFilter;
use wumpus_world_core::{
    Rewards, WorldConfig,
    agent::{Agent, PlanningAgent, RandomAgent},
    episode::{EpisodeSummary, run_episode},
    world::load_world_from_string,
};

const DEFAULT_MAP: &str = include_str!("../maps/classic.txt");

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum AgentKind {
    Random,
    Planning,
}

#[derive(Parser, Debug)]
#[command(version, about = "Runs episodes in a stochastic Wumpus World", long_about = None)]
struct Args {
    /// Map file to load; the built-in 4x4 map is used when omitted
    #[arg(short, long, value_name = "MAP_FILE")]
    map: Option<PathBuf>,

    /// Number of episodes to run
    #[arg(short, long, default_value_t = 10)]
    episodes: usize,

    /// Step limit per episode
    #[arg(long, default_value_t = 200)]
    max_steps: usize,

    /// Seed for both the world and the agent
    #[arg(short, long, default_value_t = 0)]
    seed: u64,

    /// Policy driving the agent
    #[arg(short, long, value_enum, default_value_t = AgentKind::Planning)]
    agent: AgentKind,

    /// Penalty charged for every non-terminal move
    #[arg(long, default_value_t = 1.0)]
    step_cost: f64,

    /// Probability that a move goes in the intended direction
    #[arg(long, default_value_t = 0.7)]
    intended_probability: f64,

    /// Default goal payoff for map cells without an explicit value
    #[arg(long, default_value_t = Rewards::default().goal, allow_negative_numbers = true)]
    goal_reward: f64,

    /// Default wumpus payoff for map cells without an explicit value
    #[arg(long, default_value_t = Rewards::default().wumpus, allow_negative_numbers = true)]
    wumpus_reward: f64,

    /// Print one JSON summary per episode instead of text
    #[arg(long)]
    json: bool,
}

impl Args {
    fn world_config(&self) -> WorldConfig {
        WorldConfig {
            step_cost: self.step_cost,
            intended_probability: self.intended_probability,
            rewards: Rewards {
                goal: self.goal_reward,
                wumpus: self.wumpus_reward,
                ..Rewards::default()
            },
        }
    }

    fn build_agent(&self, episode: usize) -> Box<dyn Agent> {
        match self.agent {
            AgentKind::Random => Box::new(RandomAgent::new(self.seed.wrapping_add(episode as u64))),
            AgentKind::Planning => Box::new(PlanningAgent::new()),
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let map_string = match &args.map {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read map file {}", path.display()))?,
        None => DEFAULT_MAP.to_string(),
    };
    let (world, start) = load_world_from_string(&map_string, &args.world_config())
        .context("Failed to load world")?;
    info!(
        width = world.width(),
        height = world.height(),
        %start,
        agent = ?args.agent,
        "world ready"
    );

    let mut rng = StdRng::seed_from_u64(args.seed);
    let mut summaries: Vec<EpisodeSummary> = Vec::with_capacity(args.episodes);
    for episode in 0..args.episodes {
        let mut agent = args.build_agent(episode);
        let summary = run_episode(&world, agent.as_mut(), start, args.max_steps, &mut rng)
            .with_context(|| format!("Episode {episode} failed"))?;
        if args.json {
            println!("{}", serde_json::to_string(&summary)?);
        } else {
            println!(
                "episode {:>3}: steps {:>4}  return {:>8.2}  {}  final {}",
                episode,
                summary.steps,
                summary.total_reward,
                if summary.terminated { "terminal " } else { "truncated" },
                summary.final_state
            );
        }
        summaries.push(summary);
    }

    if !args.json && !summaries.is_empty() {
        let mean =
            summaries.iter().map(|s| s.total_reward).sum::<f64>() / summaries.len() as f64;
        println!("mean return over {} episodes: {:.2}", summaries.len(), mean);
    }

    Ok(())
}
