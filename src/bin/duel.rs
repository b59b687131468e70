//! Scripted two-peer duel over an in-process link.
//!
//! Runs a host and a guest on one current-thread runtime, lets the host
//! play a few rounds of every reference ability, and prints both combat
//! logs plus whether the peers ended in agreement.

use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info, warn};

use battle_sync::effects::{mending_chorus, necromancer, poison_vial, skeleton_archer};
use battle_sync::telemetry::init_tracing;
use battle_sync::{
    AbsoluteSide, BattleConfig, CombatLog, EntityId, FormationSpec, LocalLink, Peer, Position,
    TracingPresenter,
};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Run a scripted host/guest duel and compare both peers",
    long_about = None
)]
struct Args {
    /// TOML file with battle configuration
    #[arg(long)]
    config: Option<PathBuf>,
    /// RNG seed (overrides the config file)
    #[arg(long)]
    seed: Option<u64>,
    /// Host animation speed multiplier
    #[arg(long)]
    speed: Option<f64>,
    /// Guest animation speed multiplier (defaults to the host's)
    #[arg(long)]
    guest_speed: Option<f64>,
    /// Maximum number of rounds
    #[arg(long, default_value_t = 4)]
    rounds: u32,
    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn load_config(args: &Args) -> Result<BattleConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            BattleConfig::from_toml_str(&text)
                .with_context(|| format!("parsing {}", path.display()))?
        }
        None => BattleConfig::default(),
    };
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    if let Some(speed) = args.speed {
        config = config.with_speed(speed);
    }
    Ok(config)
}

fn host_formation() -> FormationSpec {
    FormationSpec::new()
        .hero(Position::Left, "Mort the Necromancer", 30)
        .creature("Skeleton Archer", 8)
        .hero(Position::Center, "Lyra the Bard", 26)
}

fn guest_formation() -> FormationSpec {
    FormationSpec::new()
        .hero(Position::Center, "Vex the Alchemist", 28)
        .creature("Skeleton Archer", 8)
        .hero(Position::Right, "Brann", 32)
}

/// One round: who acts, with what.
fn script() -> Vec<(&'static str, EntityId)> {
    vec![
        (skeleton_archer::KIND, EntityId::creature(AbsoluteSide::Host, Position::Left, 0)),
        (skeleton_archer::KIND, EntityId::creature(AbsoluteSide::Guest, Position::Center, 0)),
        (poison_vial::KIND, EntityId::hero(AbsoluteSide::Guest, Position::Center)),
        (mending_chorus::KIND, EntityId::hero(AbsoluteSide::Host, Position::Center)),
        (necromancer::KIND, EntityId::hero(AbsoluteSide::Host, Position::Left)),
    ]
}

/// Play up to `rounds` rounds on the host. Returns the winner, if any.
async fn play_rounds(host: &mut Peer, rounds: u32) -> Result<Option<AbsoluteSide>> {
    host.session_mut()
        .authoritative_set_counter(AbsoluteSide::Host, necromancer::GRAVEYARD, 2)?;
    for round in 1..=rounds {
        info!(round, "round start");
        for (kind, actor) in script() {
            if !host.session().is_alive(actor) {
                continue;
            }
            let outcome = host
                .act(kind, actor)
                .await
                .with_context(|| format!("{} by {}", kind, actor))?;
            debug!(kind, %actor, ?outcome, "ability resolved");
            if let Some(winner) = host.session().check_battle_end() {
                return Ok(winner);
            }
        }
    }
    Ok(None)
}

fn print_log(label: &str, log: &CombatLog) {
    println!("\n== {} combat log ({} lines) ==", label, log.len());
    for line in log.iter() {
        println!("  [{:?}] {}", line.severity, line.message);
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    let config = load_config(&args)?;
    let guest_config = match args.guest_speed {
        Some(speed) => config.clone().with_speed(speed),
        None => config.clone(),
    };
    info!(
        seed = config.seed,
        speed = config.speed,
        guest_speed = guest_config.speed,
        "starting duel"
    );

    let (transport, inbox) = LocalLink::pair();
    let mut host = Peer::host(
        config,
        &host_formation(),
        &guest_formation(),
        transport,
        Rc::new(TracingPresenter::new("host")),
    );
    let mut guest = Peer::guest(
        guest_config,
        &host_formation(),
        &guest_formation(),
        inbox,
        Rc::new(TracingPresenter::new("guest")),
    );

    let rounds = args.rounds;
    let play = async {
        let result = play_rounds(&mut host, rounds).await;
        if let Err(err) = &result {
            warn!(error = %err, "script aborted");
        }
        // Always end, or the guest would wait forever.
        host.end_battle(result.as_ref().ok().copied().flatten());
        result
    };

    let (played, handled) = tokio::join!(play, guest.run());
    played?;
    info!(handled, "guest finished");

    print_log("host", host.session().combat_log());
    print_log("guest", guest.session().combat_log());

    let logs_match =
        host.session().combat_log().snapshot() == guest.session().combat_log().snapshot();
    let vitals_match = host.session().final_vitals() == guest.session().final_vitals();
    println!("\noutcome: {:?}", host.session().outcome().flatten());
    println!("combat logs match: {}", logs_match);
    println!("final vitals match: {}", vitals_match);
    Ok(())
}
