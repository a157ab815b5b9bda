use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use super::{CmdResult, Context};
use crate::cli::commands::{SigninArgs, SignupArgs};
use crate::cli::output::WhoamiJson;
use crate::io::store::SnapshotStore;
use crate::session::context::{PersistMode, SessionHost};
use crate::session::gate::{AuthError, LocalSessionGate, SessionEvent, SessionGate};
use crate::session::identity::Identity;

pub fn cmd_signup(ctx: &Context, args: SignupArgs) -> CmdResult {
    sign_in_with(ctx, |gate| {
        gate.sign_up(&args.name, &args.email, &args.password)
    })
}

pub fn cmd_signin(ctx: &Context, args: SigninArgs) -> CmdResult {
    sign_in_with(ctx, |gate| gate.sign_in(&args.email, &args.password))
}

/// Run a sign-in flow with a session host listening on the gate, then greet
/// the user with a summary of the snapshot the host loaded.
fn sign_in_with(
    ctx: &Context,
    flow: impl FnOnce(&mut LocalSessionGate) -> Result<Identity, AuthError>,
) -> CmdResult {
    let mut gate = LocalSessionGate::open(&ctx.data_dir);
    let store: Arc<dyn SnapshotStore> = Arc::new(ctx.store());
    let host = Rc::new(RefCell::new(SessionHost::new(store, PersistMode::Immediate)));

    let listener = Rc::clone(&host);
    gate.on_session_change(Box::new(move |event: &SessionEvent| {
        listener.borrow_mut().handle_event(event)
    }));

    let identity = flow(&mut gate)?;

    if ctx.json {
        let output = WhoamiJson {
            signed_in: true,
            user: Some(identity),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Welcome, {}! Signed in as {}", identity.greeting_name(), identity.email);
        if let Some(session) = host.borrow().session() {
            let summary = session.summary();
            println!(
                "{} of {} tasks done across {} categories ({}%)",
                summary.completed,
                summary.total,
                session.categories().len(),
                summary.percent
            );
        }
    }

    host.borrow_mut().end();
    Ok(())
}

pub fn cmd_signout(ctx: &Context) -> CmdResult {
    let mut gate = LocalSessionGate::open(&ctx.data_dir);
    let was_signed_in = gate.current_user().is_some();
    gate.sign_out()?;

    if ctx.json {
        let output = WhoamiJson {
            signed_in: false,
            user: None,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if was_signed_in {
        println!("Signed out");
    } else {
        println!("Not signed in");
    }
    Ok(())
}

pub fn cmd_whoami(ctx: &Context) -> CmdResult {
    let user = LocalSessionGate::open(&ctx.data_dir).current_user();

    if ctx.json {
        let output = WhoamiJson {
            signed_in: user.is_some(),
            user,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    match user {
        Some(identity) if identity.display_name.is_empty() => println!("{}", identity.email),
        Some(identity) => println!("{} <{}>", identity.display_name, identity.email),
        None => println!("Not signed in"),
    }
    Ok(())
}
