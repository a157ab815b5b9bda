mod account;
mod config;
mod init;
pub use account::{cmd_signin, cmd_signout, cmd_signup, cmd_whoami};
pub use config::cmd_config;
pub use init::cmd_init;

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io;
use crate::io::recovery::{self, RecoveryCategory, RecoveryEntry};
use crate::io::store::{FileStore, SnapshotStore};
use crate::logging;
use crate::model::category::PRESET_COLORS;
use crate::model::config::Config;
use crate::model::task::is_valid_task_text;
use crate::ops::task_ops::{self, Direction};
use crate::session::context::{PersistMode, Session, SessionHost};
use crate::session::gate::{LocalSessionGate, SessionGate};

type CmdResult<T = ()> = Result<T, Box<dyn Error>>;

static HEX_COLOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#?([0-9A-Fa-f]{6}|[0-9A-Fa-f]{3})$").expect("hex color pattern is valid")
});

const DEFAULT_RECOVERY_LIMIT: usize = 10;

/// Everything a handler needs besides its own args.
pub struct Context {
    pub data_dir: PathBuf,
    pub config: Config,
    pub json: bool,
}

impl Context {
    fn load(data_dir: PathBuf, json: bool) -> CmdResult<Self> {
        let (config, _) = config_io::read_config(&data_dir)?;
        start_logging(&data_dir, &config);
        Ok(Context {
            data_dir,
            config,
            json,
        })
    }

    fn store(&self) -> FileStore {
        FileStore::new(&self.data_dir, &self.config.storage.slot)
    }
}

/// Logging is best effort; a broken log directory never blocks a command.
fn start_logging(data_dir: &std::path::Path, config: &Config) {
    let level = logging::effective_level(&config.log.level);
    if let Err(e) = logging::init_logging(&level, &data_dir.join("logs"))
        && std::env::var_os(logging::LOG_ENV).is_some()
    {
        eprintln!("note: logging disabled: {}", e);
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(command: Commands, data_dir: Option<&str>, json: bool) -> CmdResult {
    let data_dir = config_io::resolve_data_dir(data_dir);

    // Init and config manage config.toml themselves.
    let command = match command {
        Commands::Init(args) => return cmd_init(&data_dir, args),
        Commands::Config(args) => return cmd_config(&data_dir, args, json),
        other => other,
    };

    let ctx = Context::load(data_dir, json)?;
    log::info!(
        "event=command module=cli status=start command={}",
        command_name(&command)
    );

    match command {
        // Handled above
        Commands::Init(_) | Commands::Config(_) => Ok(()),

        // Account
        Commands::Signup(args) => cmd_signup(&ctx, args),
        Commands::Signin(args) => cmd_signin(&ctx, args),
        Commands::Signout => cmd_signout(&ctx),
        Commands::Whoami => cmd_whoami(&ctx),

        // Read commands
        Commands::List(args) => cmd_list(&ctx, args),
        Commands::Stats => cmd_stats(&ctx),

        // Categories
        Commands::Category(args) => cmd_category(&ctx, args),

        // Tasks
        Commands::Add(args) => cmd_add(&ctx, args),
        Commands::Toggle(args) => cmd_toggle(&ctx, args),
        Commands::Rm(args) => cmd_rm(&ctx, args),
        Commands::Up(args) => cmd_move(&ctx, args, Direction::Up),
        Commands::Down(args) => cmd_move(&ctx, args, Direction::Down),
        Commands::Edit(args) => cmd_edit(&ctx, args),

        // Maintenance
        Commands::Recovery(args) => cmd_recovery(&ctx, args),
    }
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Init(_) => "init",
        Commands::Signup(_) => "signup",
        Commands::Signin(_) => "signin",
        Commands::Signout => "signout",
        Commands::Whoami => "whoami",
        Commands::List(_) => "list",
        Commands::Stats => "stats",
        Commands::Category(_) => "category",
        Commands::Add(_) => "add",
        Commands::Toggle(_) => "toggle",
        Commands::Rm(_) => "rm",
        Commands::Up(_) => "up",
        Commands::Down(_) => "down",
        Commands::Edit(_) => "edit",
        Commands::Recovery(_) => "recovery",
        Commands::Config(_) => "config",
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Run `f` against a freshly loaded session, enforcing the sign-in
/// requirement. Changes are written before this returns.
fn with_session<T>(ctx: &Context, f: impl FnOnce(&mut Session) -> CmdResult<T>) -> CmdResult<T> {
    let identity = LocalSessionGate::open(&ctx.data_dir).current_user();
    if identity.is_none() && ctx.config.session.required {
        log::warn!("event=session_check module=cli status=rejected");
        return Err("not signed in (run `mp signin` or `mp signup` first)".into());
    }

    let store: Arc<dyn SnapshotStore> = Arc::new(ctx.store());
    let mut host = SessionHost::new(store, PersistMode::Immediate);
    let result = f(host.start(identity));
    host.end();
    result
}

/// Resolve a category id or name to its id.
fn resolve_category(session: &Session, key: &str) -> CmdResult<String> {
    session
        .category(key)
        .map(|c| c.id.clone())
        .ok_or_else(|| format!("no category matching \"{}\"", key).into())
}

fn notice(message: &str) {
    eprintln!("note: {}", message);
}

/// Print the outcome of a mutating command. No-ops get a notice on stderr.
fn report(ctx: &Context, changed: bool, id: Option<String>, noop: &str) -> CmdResult {
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&ChangeJson { changed, id })?);
    } else if let Some(id) = &id {
        println!("{}", id);
    }
    if !changed {
        notice(noop);
    }
    Ok(())
}

fn confirm(prompt: &str) -> CmdResult<bool> {
    eprint!("{} [y/n] ", prompt);
    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

/// Accept a palette number (1-15), a hex color with or without `#`, or any
/// other non-empty token as-is. Hex colors are normalized to `#RRGGBB` case.
pub fn parse_color(input: &str) -> Result<String, String> {
    let s = input.trim();
    // Longer digit runs such as `112233` are hex, not palette numbers.
    if s.len() <= 2
        && let Ok(n) = s.parse::<usize>()
    {
        return n
            .checked_sub(1)
            .and_then(|i| PRESET_COLORS.get(i))
            .map(|c| c.to_string())
            .ok_or_else(|| format!("palette number must be 1-{}", PRESET_COLORS.len()));
    }
    if HEX_COLOR_RE.is_match(s) {
        return Ok(format!("#{}", s.trim_start_matches('#').to_ascii_uppercase()));
    }
    if s.is_empty() {
        return Err("color cannot be empty".to_string());
    }
    Ok(s.to_string())
}

// ---------------------------------------------------------------------------
// Read handlers
// ---------------------------------------------------------------------------

fn cmd_list(ctx: &Context, args: ListArgs) -> CmdResult {
    with_session(ctx, |session| {
        let selected = match &args.category {
            Some(key) => {
                let id = resolve_category(session, key)?;
                session
                    .categories()
                    .iter()
                    .filter(|c| c.id == id)
                    .collect::<Vec<_>>()
            }
            None => session.categories().iter().collect(),
        };

        if ctx.json {
            let items: Vec<CategoryJson> = selected.iter().map(|c| category_to_json(c)).collect();
            println!("{}", serde_json::to_string_pretty(&items)?);
        } else if selected.is_empty() {
            println!("no categories (add one with `mp category add <NAME>`)");
        } else {
            let blocks: Vec<String> = selected.iter().map(|c| format_category(c)).collect();
            println!("{}", blocks.join("\n\n"));
        }
        Ok(())
    })
}

fn cmd_stats(ctx: &Context) -> CmdResult {
    with_session(ctx, |session| {
        let summary = session.summary();
        if ctx.json {
            let output = stats_to_json(session.categories(), &summary);
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", format_stats(session.categories(), &summary));
        }
        Ok(())
    })
}

// ---------------------------------------------------------------------------
// Category handlers
// ---------------------------------------------------------------------------

fn cmd_category(ctx: &Context, args: CategoryCmd) -> CmdResult {
    match args.action {
        CategoryAction::Add(a) => cmd_category_add(ctx, a),
        CategoryAction::Rm(a) => cmd_category_rm(ctx, a),
        CategoryAction::Rename(a) => cmd_category_rename(ctx, a),
        CategoryAction::Color(a) => cmd_category_color(ctx, a),
        CategoryAction::Colors => cmd_category_colors(ctx),
    }
}

fn cmd_category_add(ctx: &Context, args: CategoryAddArgs) -> CmdResult {
    let color = match &args.color {
        Some(c) => parse_color(c)?,
        None => PRESET_COLORS[0].to_string(),
    };
    with_session(ctx, |session| {
        let id = session.add_category(&args.name, &color);
        report(
            ctx,
            id.is_some(),
            id,
            "nothing added: category name is empty",
        )
    })
}

fn cmd_category_rm(ctx: &Context, args: CategoryRmArgs) -> CmdResult {
    with_session(ctx, |session| {
        let id = resolve_category(session, &args.category)?;
        if !args.yes {
            let (name, count) = session
                .category(&id)
                .map(|c| (c.name.clone(), c.tasks.len()))
                .unwrap_or_default();
            let prompt = format!("Delete \"{}\" and its {} task(s)?", name, count);
            if !confirm(&prompt)? {
                println!("cancelled");
                return Ok(());
            }
        }

        let removed = session.delete_category(&id);
        if let Some(category) = &removed {
            recovery::log_recovery(
                &ctx.data_dir,
                RecoveryEntry {
                    timestamp: Utc::now(),
                    category: RecoveryCategory::Delete,
                    description: format!("category \"{}\" deleted", category.name),
                    fields: vec![
                        ("Category".to_string(), category.id.clone()),
                        ("Tasks".to_string(), category.tasks.len().to_string()),
                    ],
                    body: serde_json::to_string_pretty(category).unwrap_or_default(),
                },
            );
            if session.categories().is_empty() {
                notice("that was the last category; the stored copy keeps it until you add another");
            }
        }
        report(ctx, removed.is_some(), None, "nothing deleted")
    })
}

fn cmd_category_rename(ctx: &Context, args: CategoryRenameArgs) -> CmdResult {
    with_session(ctx, |session| {
        let id = resolve_category(session, &args.category)?;
        let changed = session.rename_category(&id, &args.name);
        report(ctx, changed, None, "nothing changed: name is empty or unchanged")
    })
}

fn cmd_category_color(ctx: &Context, args: CategoryColorArgs) -> CmdResult {
    let color = parse_color(&args.color)?;
    with_session(ctx, |session| {
        let id = resolve_category(session, &args.category)?;
        let changed = session.recolor_category(&id, &color);
        report(ctx, changed, None, "nothing changed: color is unchanged")
    })
}

/// The palette is static, so no session is needed.
fn cmd_category_colors(ctx: &Context) -> CmdResult {
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&palette_to_json())?);
    } else {
        println!("{}", format_palette());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Task handlers
// ---------------------------------------------------------------------------

fn cmd_add(ctx: &Context, args: AddArgs) -> CmdResult {
    with_session(ctx, |session| {
        let id = resolve_category(session, &args.category)?;
        let task_id = session.add_task(&id, &args.text);
        report(
            ctx,
            task_id.is_some(),
            task_id,
            "nothing added: task text is empty",
        )
    })
}

fn missing_task(task_id: &str, category: &str) -> String {
    format!("no task {} in \"{}\"", task_id, category)
}

fn cmd_toggle(ctx: &Context, args: TaskRefArgs) -> CmdResult {
    with_session(ctx, |session| {
        let id = resolve_category(session, &args.category)?;
        let changed = session.toggle_task(&id, &args.task_id);
        report(ctx, changed, None, &missing_task(&args.task_id, &args.category))
    })
}

fn cmd_rm(ctx: &Context, args: TaskRefArgs) -> CmdResult {
    with_session(ctx, |session| {
        let id = resolve_category(session, &args.category)?;
        let changed = session.delete_task(&id, &args.task_id);
        report(ctx, changed, None, &missing_task(&args.task_id, &args.category))
    })
}

fn cmd_move(ctx: &Context, args: TaskRefArgs, direction: Direction) -> CmdResult {
    with_session(ctx, |session| {
        let id = resolve_category(session, &args.category)?;
        let changed = session.move_task(&id, &args.task_id, direction);
        let noop = match session.category(&id).and_then(|c| task_ops::find_task(c, &args.task_id)) {
            None => missing_task(&args.task_id, &args.category),
            Some(_) if direction == Direction::Up => "task is already at the top".to_string(),
            Some(_) => "task is already at the bottom".to_string(),
        };
        report(ctx, changed, None, &noop)
    })
}

fn cmd_edit(ctx: &Context, args: EditArgs) -> CmdResult {
    with_session(ctx, |session| {
        let id = resolve_category(session, &args.category)?;
        let changed = session.edit_task(&id, &args.task_id, &args.text);
        let noop = if !is_valid_task_text(&args.text) {
            "nothing changed: task text is empty".to_string()
        } else if session
            .category(&id)
            .and_then(|c| task_ops::find_task(c, &args.task_id))
            .is_none()
        {
            missing_task(&args.task_id, &args.category)
        } else {
            "nothing changed: text is the same".to_string()
        };
        report(ctx, changed, None, &noop)
    })
}

// ---------------------------------------------------------------------------
// Recovery log
// ---------------------------------------------------------------------------

fn cmd_recovery(ctx: &Context, args: RecoveryCmd) -> CmdResult {
    match args.action {
        Some(RecoveryAction::Prune(prune)) => {
            let removed = recovery::prune_recovery(&ctx.data_dir, prune.all)?;
            if ctx.json {
                println!("{}", serde_json::json!({ "removed": removed }));
            } else {
                println!("removed {} entries", removed);
            }
        }
        None => {
            let limit = args.limit.unwrap_or(DEFAULT_RECOVERY_LIMIT);
            let entries = recovery::read_recovery_entries(&ctx.data_dir, Some(limit));
            if ctx.json {
                let items: Vec<serde_json::Value> = entries.iter().map(|e| e.to_json()).collect();
                println!("{}", serde_json::to_string_pretty(&items)?);
            } else if entries.is_empty() {
                println!("recovery log is empty");
            } else {
                for entry in &entries {
                    print!("{}", entry.to_display_markdown());
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_color_palette_numbers() {
        assert_eq!(parse_color("1").unwrap(), "#FF6B9D");
        assert_eq!(parse_color(" 15 ").unwrap(), "#C0392B");
        assert!(parse_color("0").is_err());
        assert!(parse_color("16").is_err());
    }

    #[test]
    fn parse_color_normalizes_hex() {
        assert_eq!(parse_color("#ff00aa").unwrap(), "#FF00AA");
        assert_eq!(parse_color("ff00aa").unwrap(), "#FF00AA");
        assert_eq!(parse_color("#abc").unwrap(), "#ABC");
        assert_eq!(parse_color("112233").unwrap(), "#112233");
        assert_eq!(parse_color("000000").unwrap(), "#000000");
        assert_eq!(parse_color("123").unwrap(), "#123");
    }

    #[test]
    fn parse_color_keeps_free_form_tokens() {
        assert_eq!(parse_color("teal").unwrap(), "teal");
        assert!(parse_color("  ").is_err());
    }

    #[test]
    fn every_command_has_a_log_name() {
        assert_eq!(command_name(&Commands::Stats), "stats");
        assert_eq!(command_name(&Commands::Whoami), "whoami");
    }
}
