use std::path::Path;

use super::CmdResult;
use crate::cli::commands::{ConfigAction, ConfigCmd};
use crate::io::config_io;

pub fn cmd_config(data_dir: &Path, args: ConfigCmd, json: bool) -> CmdResult {
    let (key, value) = match args.action {
        ConfigAction::Get(a) => {
            let (config, _) = config_io::read_config(data_dir)?;
            let value = config_io::config_value(&config, &a.key)?;
            (a.key, value)
        }
        ConfigAction::Set(a) => {
            let (_, mut doc) = config_io::read_config(data_dir)?;
            config_io::set_config_value(&mut doc, &a.key, &a.value)?;
            config_io::write_config(data_dir, &doc)?;

            // Echo the stored form (levels are lowercased, booleans parsed).
            let (config, _) = config_io::read_config(data_dir)?;
            let value = config_io::config_value(&config, &a.key)?;
            log::info!(
                "event=config_set module=cli status=ok key={} value={}",
                a.key,
                value
            );
            (a.key, value)
        }
    };

    if json {
        println!("{}", serde_json::json!({ "key": key, "value": value }));
    } else {
        println!("{}", value);
    }
    Ok(())
}
