use clap::Parser;
use missions::cli::commands::Cli;
use missions::cli::handlers;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = handlers::dispatch(cli.command, cli.data_dir.as_deref(), cli.json) {
        log::error!("event=command module=cli status=error error={}", e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
