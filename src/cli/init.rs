use crate::error::Result;
use crate::settings::{save_settings_to, settings_path, Settings};

pub fn run(force: bool) -> Result<()> {
    let path = settings_path();
    if path.exists() && !force {
        println!(
            "Settings already exist at {} (use --force to overwrite)",
            path.display()
        );
        return Ok(());
    }
    let settings = Settings::default();
    save_settings_to(&settings, &path)?;
    std::fs::create_dir_all(&settings.export_dir)?;
    println!("Wrote settings to {}", path.display());
    Ok(())
}
