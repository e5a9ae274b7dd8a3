pub mod config;
pub mod sessions;
pub mod settings;
pub mod stats;
pub mod timer;

use pomorun_core::{Config, Database, SystemClock, TimerController, TimerRunStore};
use serde::Serialize;

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

pub type Store = TimerRunStore<Database, SystemClock>;

/// What every command needs: the loaded config and the effective user.
pub struct Context {
    pub config: Config,
    user_override: Option<String>,
}

impl Context {
    pub fn new(config: Config, user_override: Option<String>) -> Self {
        Self {
            config,
            user_override,
        }
    }

    pub fn user_id(&self) -> &str {
        self.user_override
            .as_deref()
            .unwrap_or(&self.config.user_id)
    }

    pub fn store(&self) -> pomorun_core::Result<Store> {
        let db = Database::open_at(self.config.database_path()?)?;
        Ok(TimerRunStore::new(db, SystemClock))
    }

    pub fn controller(&self) -> pomorun_core::Result<TimerController<Database, SystemClock>> {
        let mut controller = TimerController::new(self.store()?, self.user_id());
        controller.refresh()?;
        Ok(controller)
    }
}

pub fn print_json<T: Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
