mod controller;
mod run;
mod store;

pub use controller::{Command, Notice, NoticeKind, Tick, TimerController};
pub use run::{Phase, RunStatus, TimerRun, TransitionKey};
pub use store::{LoggedTransition, TimerRunStore};
