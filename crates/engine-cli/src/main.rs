use std::collections::BTreeMap;
use std::env;

use contracts::{Action, DecisionPolicy, DecisionWindow, Role, RunConfig};
use engine_core::rng::{replay_seed, SessionRng};
use engine_core::{Catalogue, GameSession};

const TICK_MS: u64 = 50;
const BETWEEN_ITEMS_MS: u64 = 1_200;
const REPLAY_RESPONSE_MS: u64 = 800;

fn print_usage() {
    println!("engine-cli <command>");
    println!("commands:");
    println!("  simulate <seed> [seconds] [role] [policy]");
    println!("    drives one full session with a deterministic scripted bot");
    println!("    roles: factory technician engineer logistics (default factory)");
    println!("    policies: score meter hybrid (default score)");
    println!("  replay <seed> <actions>");
    println!("    comma-separated script: fair,shortcut,stop,timeout");
    println!("  catalogue [role]");
    println!("    weighted item counts per action kind plus lint findings");
}

fn parse_seed(value: Option<&String>) -> Result<u32, String> {
    let raw = value.ok_or_else(|| "missing seed".to_string())?;
    raw.parse::<u32>()
        .map_err(|_| format!("invalid seed: {raw}"))
}

fn parse_seconds(value: Option<&String>) -> Result<u64, String> {
    let raw = match value {
        Some(raw) => raw,
        None => return Ok(60),
    };
    raw.parse::<u64>()
        .map_err(|_| format!("invalid seconds: {raw}"))
}

fn parse_role(value: Option<&String>) -> Result<Role, String> {
    let raw = value.map(String::as_str).unwrap_or("factory");
    match raw {
        "factory" => Ok(Role::Factory),
        "technician" => Ok(Role::Technician),
        "engineer" => Ok(Role::Engineer),
        "logistics" => Ok(Role::Logistics),
        other => Err(format!("invalid role: {other}")),
    }
}

fn parse_policy(value: Option<&String>) -> Result<DecisionPolicy, String> {
    let raw = value.map(String::as_str).unwrap_or("score");
    match raw {
        "score" => Ok(DecisionPolicy::ScoreOnly),
        "meter" => Ok(DecisionPolicy::MeterOnly),
        "hybrid" => Ok(DecisionPolicy::Hybrid),
        other => Err(format!("invalid policy: {other}")),
    }
}

fn parse_actions(value: Option<&String>) -> Result<Vec<Option<Action>>, String> {
    let raw = value.ok_or_else(|| "missing actions".to_string())?;
    raw.split(',')
        .map(|token| match token.trim() {
            "fair" => Ok(Some(Action::Fair)),
            "shortcut" => Ok(Some(Action::Shortcut)),
            "stop" => Ok(Some(Action::Stop)),
            "timeout" => Ok(None),
            other => Err(format!("invalid action: {other}")),
        })
        .collect()
}

fn config_for(seed: u32, seconds: u64, role: Role, policy: DecisionPolicy) -> RunConfig {
    let mut config = RunConfig::default();
    config.run_id = format!("run_cli_{seed}");
    config.seed = seed;
    config.session_ms = seconds.saturating_mul(1_000);
    config.role = role;
    config.policy = policy;
    config.decision_window = DecisionWindow::default_for(policy);
    config
}

/// Tick the session forward in host cadence, landing exactly on
/// `until_ms` so response times and deadlines stay deterministic.
fn tick_until(session: &mut GameSession, now_ms: &mut u64, until_ms: u64) {
    while *now_ms < until_ms && !session.is_finished() {
        *now_ms = (*now_ms + TICK_MS).min(until_ms);
        session.tick(*now_ms);
    }
}

fn print_outcome(session: &GameSession) -> Result<(), String> {
    let mut event_counts = BTreeMap::<String, usize>::new();
    for event in session.events() {
        *event_counts
            .entry(format!("{:?}", event.event_type))
            .or_insert(0) += 1;
    }
    for (kind, count) in &event_counts {
        println!("event {kind}: {count}");
    }

    let summary = session
        .summary()
        .ok_or_else(|| "session did not finish".to_string())?;
    let rendered = serde_json::to_string_pretty(summary)
        .map_err(|err| format!("failed to render summary: {err}"))?;
    println!("{rendered}");
    Ok(())
}

/// Scripted bot: decision noise comes from its own RNG stream derived
/// from the seed, so bot behavior never perturbs content order.
fn run_simulate(args: &[String]) -> Result<(), String> {
    let seed = parse_seed(args.get(2))?;
    let seconds = parse_seconds(args.get(3))?;
    let role = parse_role(args.get(4))?;
    let policy = parse_policy(args.get(5))?;

    let catalogue = Catalogue::standard();
    let config = config_for(seed, seconds, role, policy);
    let mut session = GameSession::new(config, &catalogue);
    let mut bot = SessionRng::new(replay_seed(seed, 0x00b0_7b07));

    let mut now = 0u64;
    session.start(now);

    while !session.is_finished() {
        let Some(presented) = session.current_item() else {
            // Exhausted content: run the clock out.
            let session_ms = session.config().session_ms;
            tick_until(&mut session, &mut now, session_ms.saturating_add(1_000));
            break;
        };
        let correct = presented.item.correct_action;
        let deadline = presented.deadline_at_ms;

        let roll = bot.next_f64();
        if roll < 0.10 {
            // Freeze: let the deadline expire.
            tick_until(&mut session, &mut now, deadline);
        } else {
            let action = if roll < 0.85 {
                correct
            } else {
                match correct {
                    Action::Fair => Action::Shortcut,
                    Action::Shortcut | Action::Stop => Action::Fair,
                }
            };
            let respond_at = now + 300 + bot.range_usize(1_500) as u64;
            tick_until(&mut session, &mut now, respond_at.min(deadline - 1));
            let _ = session.submit(action, now);
        }

        let resume_at = now + BETWEEN_ITEMS_MS;
        tick_until(&mut session, &mut now, resume_at);
        session.advance_next(now);
    }

    println!("simulated {}", session.status());
    print_outcome(&session)
}

fn run_replay(args: &[String]) -> Result<(), String> {
    let seed = parse_seed(args.get(2))?;
    let actions = parse_actions(args.get(3))?;

    let catalogue = Catalogue::standard();
    let config = config_for(seed, 60, Role::Factory, DecisionPolicy::ScoreOnly);
    let mut session = GameSession::new(config, &catalogue);

    let mut now = 0u64;
    session.start(now);

    for action in actions {
        if session.is_finished() {
            break;
        }
        let Some(presented) = session.current_item() else {
            break;
        };
        println!("item {}", presented.item.id);
        let deadline = presented.deadline_at_ms;
        match action {
            Some(action) => {
                let respond_at = (now + REPLAY_RESPONSE_MS).min(deadline - 1);
                tick_until(&mut session, &mut now, respond_at);
                let _ = session.submit(action, now);
            }
            None => {
                tick_until(&mut session, &mut now, deadline);
            }
        }
        let resume_at = now + BETWEEN_ITEMS_MS;
        tick_until(&mut session, &mut now, resume_at);
        session.advance_next(now);
    }

    // Run the clock out so the summary fires.
    let session_ms = session.config().session_ms;
    tick_until(&mut session, &mut now, session_ms.saturating_add(1_000));
    print_outcome(&session)
}

fn run_catalogue(args: &[String]) -> Result<(), String> {
    let catalogue = Catalogue::standard();
    let roles: Vec<Role> = match args.get(2) {
        Some(raw) => vec![parse_role(Some(raw))?],
        None => Role::ALL.to_vec(),
    };

    for role in roles {
        let pool = catalogue.for_role(role);
        let mut weighted_by_action = BTreeMap::<String, u32>::new();
        for (item, weight) in &pool {
            *weighted_by_action
                .entry(item.correct_action.to_string())
                .or_insert(0) += weight;
        }
        println!(
            "role {}: {} items, weighted pool {}",
            role.as_str(),
            pool.len(),
            weighted_by_action.values().sum::<u32>()
        );
        for (action, weight) in &weighted_by_action {
            println!("  {action}: {weight}");
        }
    }

    let findings = catalogue.lint();
    if findings.is_empty() {
        println!("lint: clean");
    } else {
        for finding in findings {
            println!("lint: {finding:?}");
        }
    }
    Ok(())
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(String::as_str);

    match command {
        Some("simulate") => {
            if let Err(err) = run_simulate(&args) {
                eprintln!("error: {err}");
                print_usage();
                std::process::exit(2);
            }
        }
        Some("replay") => {
            if let Err(err) = run_replay(&args) {
                eprintln!("error: {err}");
                print_usage();
                std::process::exit(2);
            }
        }
        Some("catalogue") => {
            if let Err(err) = run_catalogue(&args) {
                eprintln!("error: {err}");
                std::process::exit(2);
            }
        }
        _ => {
            print_usage();
        }
    }
}
