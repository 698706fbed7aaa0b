use crate::error::Result;
use crate::settings::{save_settings, settings_file_exists, settings_path, Settings};

pub fn run(force: bool) -> Result<()> {
    let path = settings_path();
    if settings_file_exists() && !force {
        println!("Settings already exist at {} (use --force to overwrite)", path.display());
        return Ok(());
    }
    save_settings(&Settings::default())?;
    println!("Wrote default settings to {}", path.display());
    Ok(())
}
