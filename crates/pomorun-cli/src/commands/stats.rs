use pomorun_core::SessionStats;

use super::{print_json, CliResult, Context};

pub fn run(days: u32, ctx: &Context) -> CliResult {
    let store = ctx.store()?;
    let now = store.now();

    let sessions = store.sessions_since(ctx.user_id(), SessionStats::window_start(days, now))?;
    let stats = SessionStats::compute(&sessions, days, now.date_naive());
    print_json(&stats)
}
