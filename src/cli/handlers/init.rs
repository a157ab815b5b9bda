use std::path::Path;

use super::CmdResult;
use crate::cli::commands::InitArgs;
use crate::io::config_io;

pub fn cmd_init(data_dir: &Path, args: InitArgs) -> CmdResult {
    if data_dir.exists() && !data_dir.is_dir() {
        return Err(format!("{} exists and is not a directory", data_dir.display()).into());
    }

    let path = config_io::config_path(data_dir);
    if !config_io::write_default_config(data_dir, args.force)? {
        return Err(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )
        .into());
    }

    println!("Initialized {}", data_dir.display());
    println!("Next: mp signup --name <NAME> --email <EMAIL> --password <PASSWORD>");
    Ok(())
}
