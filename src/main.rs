use clap::Parser;
use crowdsignal::cli::commands::{Cli, Commands};
use crowdsignal::config::Settings;
use crowdsignal::domain::entities::recommendation::RecommendationContent;
use crowdsignal::domain::entities::trading_signal::SignalPerformance;
use crowdsignal::domain::values::signal_status::SignalStatus;
use crowdsignal::domain::values::vote_direction::VoteDirection;
use crowdsignal::CrowdSignal;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let settings = match Settings::from_env() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading settings: {e}");
            std::process::exit(1);
        }
    };

    let cs = match CrowdSignal::new(&settings) {
        Ok(cs) => cs,
        Err(e) => {
            eprintln!("Error initializing crowdsignal: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = run_command(cs, &settings, cli.command).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run_command(
    cs: CrowdSignal,
    settings: &Settings,
    cmd: Commands,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        Commands::Submit {
            submitter_id,
            submitter_name,
            json,
        } => {
            let content: RecommendationContent = serde_json::from_str(&json)?;
            let rec = cs.submit(submitter_id, submitter_name, content).await?;
            print_json(&rec)?;
        }
        Commands::Vote {
            recommendation_id,
            voter_id,
            direction,
            reputation,
            comment,
        } => {
            let dir: VoteDirection = direction.parse().map_err(|e: String| e)?;
            let receipt = match reputation {
                Some(rep) => cs.apply_vote(&recommendation_id, &voter_id, dir, rep, comment).await?,
                None => cs.cast_vote(&recommendation_id, &voter_id, dir, comment).await?,
            };
            print_json(&receipt)?;
        }
        Commands::Show { id } => {
            print_json(&cs.recommendation(&id).await?)?;
        }
        Commands::Queue { limit, pending } => {
            let items = if pending {
                cs.pending(Some(limit)).await?
            } else {
                cs.queue(Some(limit)).await?
            };
            print_json(&items)?;
        }
        Commands::History { submitter_id, limit } => {
            print_json(&cs.recommendations_by(&submitter_id, Some(limit)).await?)?;
        }
        Commands::Convert { recommendation_id } => {
            print_json(&cs.convert(&recommendation_id).await?)?;
        }
        Commands::Signals { limit } => {
            print_json(&cs.active_signals(Some(limit)).await?)?;
        }
        Commands::SignalSubscribe { signal_id, user_id } => {
            print_json(&cs.subscribe(&signal_id, &user_id).await?)?;
        }
        Commands::SignalUnsubscribe { signal_id, user_id } => {
            print_json(&cs.unsubscribe(&signal_id, &user_id).await?)?;
        }
        Commands::SignalClose {
            signal_id,
            status,
            json,
        } => {
            let status: SignalStatus = status.parse().map_err(|e: String| e)?;
            let performance: Option<SignalPerformance> = json
                .map(|j| serde_json::from_str(&j))
                .transpose()?;
            print_json(&cs.close_signal(&signal_id, status, performance).await?)?;
        }
        Commands::Reputation { user_id } => match cs.reputation(&user_id).await? {
            Some(rep) => print_json(&rep)?,
            None => println!("No reputation recorded for {user_id}"),
        },
        Commands::Leaderboard { limit } => {
            for (rank, rep) in cs.leaderboard(limit).await?.iter().enumerate() {
                println!(
                    "{:>3}. {} {:.1} ({})",
                    rank + 1,
                    rep.user_id,
                    rep.score,
                    rep.level
                );
            }
        }
        Commands::Follow { user_id, delta } => {
            print_json(&cs.record_follower_change(&user_id, delta).await?)?;
        }
        Commands::Sweep => {
            print_json(&cs.sweep().await?)?;
        }
        Commands::Watch { interval } => {
            let period = interval
                .map(Duration::from_secs)
                .unwrap_or(settings.sweep_interval)
                .max(Duration::from_secs(1));
            tracing::info!(interval_secs = period.as_secs(), "starting expiry sweeper");
            let mut ticker = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match cs.sweep().await {
                            Ok(report) => tracing::info!(
                                recommendations = report.expired_recommendations.len(),
                                settled = report.settled_recommendations.len(),
                                signals = report.expired_signals.len(),
                                "sweep complete"
                            ),
                            Err(e) => tracing::warn!(error = %e, "sweep failed"),
                        }
                    }
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("shutting down sweeper");
                        break;
                    }
                }
            }
        }
    }
    Ok(())
}
