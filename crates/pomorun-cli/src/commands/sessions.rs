use clap::Subcommand;
use pomorun_core::DEFAULT_SESSION_LIMIT;

use super::{print_json, CliResult, Context};

#[derive(Subcommand)]
pub enum SessionsAction {
    /// Most recent sessions first
    List {
        #[arg(long, default_value_t = DEFAULT_SESSION_LIMIT)]
        limit: usize,
    },
}

pub fn run(action: SessionsAction, ctx: &Context) -> CliResult {
    let store = ctx.store()?;

    match action {
        SessionsAction::List { limit } => {
            let sessions = store.sessions(ctx.user_id(), limit)?;
            print_json(&sessions)?;
        }
    }
    Ok(())
}
