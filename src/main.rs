// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::env;
use std::time::Instant;
use the_conductor::calendar::{Clock, DefaultClock, DurationHelper};
use the_conductor::config::{load_and_validate_config, CompilerBuilder};
use the_conductor::model::load_definition;

fn print_usage(program: &str) {
    eprintln!("Usage: {} compile <engine.yaml> <definition.yaml>", program);
    eprintln!("       {} next <schedule> [--zone <tz>] [--at <rfc3339>] [--end <date-time>]", program);
    eprintln!("Example: {} compile configs/engine.yaml definitions/order.yaml", program);
    eprintln!("Example: {} next R5/2024-03-01T09:00:00/P1D --zone Europe/Amsterdam", program);
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("conductor");

    let outcome = match args.get(1).map(String::as_str) {
        Some("compile") if args.len() == 4 => run_compile(&args[2], &args[3]),
        Some("next") if args.len() >= 3 => run_next(&args[2], &args[3..]),
        _ => {
            print_usage(program);
            std::process::exit(1);
        }
    };

    if let Err(e) = outcome {
        eprintln!("❌ {:#}", e);
        std::process::exit(1);
    }
}

fn run_compile(config_file: &str, definition_file: &str) -> Result<()> {
    let start_time = Instant::now();

    let config = load_and_validate_config(config_file)
        .map_err(|e| anyhow!("{e}"))
        .with_context(|| format!("loading engine config {config_file}"))?;
    let definition = load_definition(definition_file)
        .map_err(|e| anyhow!("{e}"))
        .with_context(|| format!("loading process definition {definition_file}"))?;

    let (compiler, calendars, clock) =
        CompilerBuilder::from_config(&config).context("building compiler from engine config")?;

    println!("📋 Definition: {} ({})", definition.id, definition_file);
    println!("🌍 Time zone: {}", clock.zone());

    let behaviors = compiler
        .compile_definition(&definition)
        .with_context(|| format!("compiling definition '{}'", definition.id))?;

    println!("\n📊 Compiled Behaviors:");
    for node_id in behaviors.sorted_ids() {
        let Some(behavior) = behaviors.get(node_id) else {
            continue;
        };
        println!("  • {:<24} {}", node_id, behavior.label());

        if let Some(timer) = behavior.as_leaf().and_then(|leaf| leaf.timer()) {
            match timer.due_date(&calendars, &clock) {
                Ok(due) => println!("    ⏰ next due {}", due.to_rfc3339()),
                Err(e) => println!("    ⏰ due date unavailable: {}", e),
            }
        }
    }

    println!("\n🔀 Conditional flows: {}", behaviors.condition_count());
    println!("⏱️  Compiled in {:?}", start_time.elapsed());
    Ok(())
}

fn run_next(spec: &str, options: &[String]) -> Result<()> {
    let mut zone = chrono_tz::UTC;
    let mut at: Option<DateTime<Utc>> = None;
    let mut end: Option<&str> = None;

    let mut remaining = options.iter();
    while let Some(flag) = remaining.next() {
        let value = remaining
            .next()
            .with_context(|| format!("missing value for {flag}"))?;
        match flag.as_str() {
            "--zone" => {
                zone = value
                    .parse::<Tz>()
                    .map_err(|_| anyhow!("unknown time zone '{value}'"))?;
            }
            "--at" => {
                let parsed = DateTime::parse_from_rfc3339(value)
                    .with_context(|| format!("'{value}' is not an RFC 3339 date-time"))?;
                at = Some(parsed.with_timezone(&Utc));
            }
            "--end" => end = Some(value.as_str()),
            other => bail!("unknown option '{other}'"),
        }
    }

    let clock = match at {
        Some(instant) => DefaultClock::fixed(instant, zone),
        None => DefaultClock::new(zone),
    };

    let helper = DurationHelper::new(spec)
        .and_then(|helper| helper.with_end_boundary(end.unwrap_or_default()))
        .with_context(|| format!("parsing schedule '{spec}'"))?;
    let next = helper.next_occurrence(&clock);

    println!("🕐 Now:  {}", clock.now_local().to_rfc3339());
    println!("⏭️  Next: {}", next.to_rfc3339());
    Ok(())
}
