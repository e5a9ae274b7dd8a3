use std::time::Duration;

use clap::Subcommand;
use pomorun_core::{Config, Database, Event, SystemClock, TimerController};
use tokio::time::MissedTickBehavior;

use super::{print_json, CliResult, Context};

type Controller = TimerController<Database, SystemClock>;

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start a focus run, replacing any current run
    Start {
        /// Task to attach the run to
        #[arg(long = "task")]
        task_id: Option<String>,
    },
    /// Pause the running run
    Pause,
    /// Resume the paused run
    Resume,
    /// Stop the current run and log it as not completed
    Stop,
    /// Rewind the current phase to its full length, paused
    Reset,
    /// Abandon the current break and wait at the start of a focus phase
    SkipBreak,
    /// Print the current run as JSON, completing a crossed deadline
    Status,
    /// Follow the current run until interrupted
    Watch,
}

pub fn run(action: TimerAction, ctx: &Context) -> CliResult {
    let mut controller = ctx.controller()?;

    // Notices are reported whether or not the command itself failed.
    let result = execute(action, &mut controller, &ctx.config);
    report_notices(&mut controller);
    result
}

fn execute(action: TimerAction, controller: &mut Controller, config: &Config) -> CliResult {
    match action {
        TimerAction::Start { task_id } => {
            let event = controller.start(task_id.as_deref())?;
            print_json(&event)?;
        }
        TimerAction::Pause => {
            let event = controller.pause()?;
            print_event_or_snapshot(event, controller)?;
        }
        TimerAction::Resume => {
            let event = controller.resume()?;
            print_event_or_snapshot(event, controller)?;
        }
        TimerAction::Stop => {
            let event = controller.stop()?;
            print_event_or_snapshot(event, controller)?;
        }
        TimerAction::Reset => {
            let event = controller.reset()?;
            print_event_or_snapshot(event, controller)?;
        }
        TimerAction::SkipBreak => {
            let event = controller.skip_break()?;
            print_event_or_snapshot(event, controller)?;
        }
        TimerAction::Status => {
            let tick = controller.tick();
            print_json(&controller.snapshot())?;
            if let Some(event) = tick.completed {
                print_json(&event)?;
            }
        }
        TimerAction::Watch => watch(controller, config)?,
    }
    Ok(())
}

/// Without a run to act on, the command is a no-op and prints the snapshot.
fn print_event_or_snapshot(event: Option<Event>, controller: &Controller) -> CliResult {
    match event {
        Some(event) => print_json(&event),
        None => print_json(&controller.snapshot()),
    }
}

fn report_notices(controller: &mut Controller) {
    for notice in controller.take_notices() {
        eprintln!("notice: {:?} {:?}: {}", notice.command, notice.kind, notice.message);
    }
}

/// One JSON line per tick on stdout. The run is refetched every poll
/// interval so changes made elsewhere show up.
fn watch(controller: &mut Controller, config: &Config) -> CliResult {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let tick_every = Duration::from_millis(config.tick_interval_ms);
    let poll_every = Duration::from_secs(config.poll_interval_secs);

    runtime.block_on(async move {
        let mut ticks = tokio::time::interval(tick_every);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut polls = tokio::time::interval(poll_every);
        polls.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = ticks.tick() => {
                    let tick = controller.tick();
                    println!("{}", serde_json::to_string(&tick)?);
                }
                _ = polls.tick() => {
                    if let Err(e) = controller.refresh() {
                        tracing::warn!(error = %e, "refresh failed; keeping cached run");
                    }
                }
                _ = &mut shutdown => {
                    tracing::debug!("watch interrupted");
                    break;
                }
            }

            for notice in controller.take_notices() {
                println!("{}", serde_json::to_string(&notice)?);
            }
        }

        Ok::<(), Box<dyn std::error::Error>>(())
    })
}
