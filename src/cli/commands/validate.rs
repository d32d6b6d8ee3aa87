use anyhow::Result;

use crate::infrastructure::ConfigLoader;

pub fn handle(config_path: Option<&std::path::Path>) -> Result<()> {
    let config = match config_path {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load()?,
    };
    println!("{}", serde_yaml::to_string(&config)?);
    Ok(())
}
