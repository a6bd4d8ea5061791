use ansi_term::Colour;
use anyhow::Result;
use clap::Subcommand;

use crate::store::{
    entities::{SettingsPatch, UserSettings},
    local::LocalStore,
    SessionStore,
};

#[derive(Debug, Subcommand)]
pub enum SettingsCommand {
    #[command(about = "Show the current settings")]
    Show,
    #[command(about = "Set the self reported attention level")]
    Attention {
        #[arg(
            value_parser = clap::value_parser!(u8).range(0..=100),
            help = "Level between 0 and 100"
        )]
        level: u8,
    },
    #[command(about = "Toggle dark mode for colored output")]
    DarkMode,
}

pub async fn run(command: SettingsCommand, store: LocalStore) -> Result<()> {
    let settings = match command {
        SettingsCommand::Show => store.load_settings().await?,
        SettingsCommand::Attention { level } => {
            store
                .merge_settings(SettingsPatch {
                    attention_level: Some(level),
                    ..Default::default()
                })
                .await?
        }
        SettingsCommand::DarkMode => {
            let current = store.load_settings().await?;
            store
                .merge_settings(SettingsPatch {
                    dark_mode: Some(!current.dark_mode),
                    ..Default::default()
                })
                .await?
        }
    };
    print_settings(&settings);
    Ok(())
}

const ATTENTION_BAR_WIDTH: usize = 20;

fn print_settings(settings: &UserSettings) {
    println!(
        "dark mode  {}",
        if settings.dark_mode { "on" } else { "off" }
    );

    let (colour, message) = attention_band(settings.attention_level);
    let filled = settings.attention_level as usize * ATTENTION_BAR_WIDTH / 100;
    println!(
        "attention  {:3}% [{}{}] {}",
        settings.attention_level,
        colour.paint("■".repeat(filled)),
        "·".repeat(ATTENTION_BAR_WIDTH - filled),
        colour.paint(message)
    );
}

fn attention_band(level: u8) -> (Colour, &'static str) {
    match level {
        80.. => (Colour::Green, "excellent focus"),
        60.. => (Colour::Yellow, "good focus"),
        40.. => (Colour::Fixed(208), "average focus"),
        _ => (Colour::Red, "low focus"),
    }
}

#[cfg(test)]
mod tests {
    use ansi_term::Colour;

    use super::attention_band;

    #[test]
    fn test_attention_bands() {
        assert_eq!(attention_band(100).1, "excellent focus");
        assert_eq!(attention_band(80).1, "excellent focus");
        assert_eq!(attention_band(79).1, "good focus");
        assert_eq!(attention_band(59).1, "average focus");
        assert_eq!(attention_band(39).0, Colour::Red);
        assert_eq!(attention_band(0).1, "low focus");
    }
}
