use crate::database::Database;
use crate::error::Result;
use crate::settings::{load_settings, save_settings, shellexpand_path};

/// Create the data directory and schema. A given `data_dir` becomes the
/// saved default.
pub fn run(data_dir: Option<&str>) -> Result<()> {
    let mut settings = load_settings();
    if let Some(dir) = data_dir {
        settings.data_dir = shellexpand_path(dir);
    }
    save_settings(&settings)?;

    Database::open(&settings)?;
    log::info!("initialized {}", settings.db_path().display());

    println!("Initialized awards-oracle at {}", settings.data_path().display());
    Ok(())
}
