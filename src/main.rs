// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Result};
use std::env;

// Use library instead of local modules
use roster_ledger::{
    describe_add, format_salary, init_tracing, open_ledger, open_pool, AvailableQuery, Candidate,
    LedgerConfig, RemoveOutcome, RosterStore,
};

fn main() -> Result<()> {
    let config = LedgerConfig::from_env();
    init_tracing(&config.log_level);

    let args: Vec<String> = env::args().skip(1).collect();
    let command = args.first().map(String::as_str).unwrap_or("tui");

    match command {
        "tui" => run_ui_mode(&config),
        "show" => {
            let ledger = open_ledger(&config);
            print_team(&ledger);
            Ok(())
        }
        "add" => run_add(&config, &args[1..]),
        "remove" => run_remove(&config, &args[1..]),
        "reset" => {
            let mut ledger = open_ledger(&config);
            ledger.reset_roster();
            println!("✓ Team cleared");
            print_team(&ledger);
            Ok(())
        }
        "budget" => run_budget(&config, &args[1..], false),
        "budget-reset" => run_budget(&config, &args[1..], true),
        "available" => run_available(&config, &args[1..]),
        "history" => {
            let ledger = open_ledger(&config);
            for event in ledger.history(20) {
                println!(
                    "{}  {:<15} {:<25} {}",
                    event.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    event.event_type,
                    event.subject,
                    event.data
                );
            }
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            print_usage();
            bail!("unknown command: {}", other)
        }
    }
}

fn run_add(config: &LedgerConfig, args: &[String]) -> Result<()> {
    let (name, salary) = match args {
        [name, salary, ..] => (name, salary),
        _ => bail!("usage: roster-ledger add <name> <salary> [position]"),
    };

    let mut candidate = Candidate::new(name.clone(), salary.clone());
    if let Some(position) = args.get(2) {
        candidate = candidate.with_position(position.clone());
    }

    let mut ledger = open_ledger(config);
    let outcome = ledger.add_player(candidate);

    println!("{}", describe_add(outcome, name, ledger.remaining()));
    warn_if_not_durable(&ledger);
    Ok(())
}

fn run_remove(config: &LedgerConfig, args: &[String]) -> Result<()> {
    let Some(name) = args.first() else {
        bail!("usage: roster-ledger remove <name>");
    };

    let mut ledger = open_ledger(config);
    match ledger.remove_player(name) {
        RemoveOutcome::Removed => println!("✓ Removed {}", name),
        RemoveOutcome::NotFound => println!("{} is not on your team", name),
    }

    print_team(&ledger);
    warn_if_not_durable(&ledger);
    Ok(())
}

fn run_budget(config: &LedgerConfig, args: &[String], reset: bool) -> Result<()> {
    let amount = match args.first() {
        Some(raw) => match roster_ledger::salary::parse_salary_text(raw) {
            Some(value) => Some(value),
            None => bail!("not a budget amount: {}", raw),
        },
        None if reset => None,
        None => bail!("usage: roster-ledger budget <amount>"),
    };

    let mut ledger = open_ledger(config);
    let change = match amount {
        Some(value) if !reset => ledger.set_budget(value),
        other => ledger.reset_budget(other),
    };

    if change.clamped {
        println!(
            "⚠️  Requested {} is outside {} - {}, using {}",
            format_salary(change.requested),
            format_salary(ledger.config().min_ceiling),
            format_salary(ledger.config().max_ceiling),
            format_salary(change.applied)
        );
    } else {
        println!("✓ Budget set to {}", format_salary(change.applied));
    }

    println!("{}", ledger.summary().describe());
    warn_if_not_durable(&ledger);
    Ok(())
}

fn run_available(config: &LedgerConfig, args: &[String]) -> Result<()> {
    let rank = match args {
        [flag, value, ..] if flag == "--rank" => match value.parse::<u32>() {
            Ok(rank) => Some(rank),
            Err(_) => bail!("not a rank: {}", value),
        },
        _ => None,
    };

    let ledger = open_ledger(config);
    let pool = open_pool(config);
    let players = pool.query(AvailableQuery::from_params(rank, ledger.remaining()));

    if players.is_empty() {
        println!("No players available for your current budget or rank.");
        return Ok(());
    }

    println!("{:>5}  {:<28} {:>15}", "Rank", "Player", "Salary");
    for player in players {
        println!("{:>5}  {:<28} {:>15}", player.rank, player.name, player.salary);
    }

    Ok(())
}

fn print_team(ledger: &RosterStore) {
    println!("\n🏀 My Team");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    if ledger.roster().is_empty() {
        println!("  (no players yet)");
    }
    for entry in ledger.roster() {
        println!("  {:<28} {:<6} {:>15}", entry.name, entry.position, entry.display_salary);
    }

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("{}", ledger.summary().describe());
}

fn warn_if_not_durable(ledger: &RosterStore) {
    if !ledger.is_durable() {
        eprintln!("⚠️  Changes could not be saved; they only live in this session.");
    }
}

fn print_usage() {
    println!("roster-ledger {}", roster_ledger::VERSION);
    println!();
    println!("USAGE:");
    println!("  roster-ledger [tui]                     interactive team builder");
    println!("  roster-ledger show                      print team and budget");
    println!("  roster-ledger add <name> <salary> [pos] add a player");
    println!("  roster-ledger remove <name>             remove a player");
    println!("  roster-ledger reset                     clear the team");
    println!("  roster-ledger budget <amount>           set the budget ceiling");
    println!("  roster-ledger budget-reset [amount]     reset the budget ceiling");
    println!("  roster-ledger available [--rank N]      list available players");
    println!("  roster-ledger history                   recent changes");
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &LedgerConfig) -> Result<()> {
    let ledger = open_ledger(config);
    let pool = open_pool(config);

    // Create and run app
    let mut app = ui::App::new(ledger, pool);
    ui::run_ui(&mut app)?;

    println!("\n✅ Team saved. {}", app.ledger.summary().describe());

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &LedgerConfig) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the API: cargo run --bin roster-server --features server");
    std::process::exit(1);
}
