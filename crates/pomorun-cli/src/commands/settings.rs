use clap::Subcommand;
use pomorun_core::Settings;

use super::{print_json, CliResult, Context};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Print the settings as JSON
    Show,
    /// Change one setting
    Set {
        /// Setting key (e.g. "focus_minutes", "ambient_sound")
        key: String,
        /// New value
        value: String,
    },
    /// Restore the default settings
    Reset,
}

pub fn run(action: SettingsAction, ctx: &Context) -> CliResult {
    let store = ctx.store()?;
    let user_id = ctx.user_id();

    match action {
        SettingsAction::Show => {
            print_json(&store.settings(user_id)?)?;
        }
        SettingsAction::Set { key, value } => {
            let mut settings = store.settings(user_id)?;
            settings.set_field(&key, &value)?;
            print_json(&store.update_settings(user_id, &settings)?)?;
        }
        SettingsAction::Reset => {
            print_json(&store.update_settings(user_id, &Settings::default())?)?;
        }
    }
    Ok(())
}
