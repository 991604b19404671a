//! Sign-in, sign-out and identity handlers.

use secrecy::SecretString;
use serde::Serialize;

use portal_core::Portal;

use crate::cli::{GlobalOpts, LoginArgs};
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct Identity {
    user_token: String,
    name: Option<String>,
    expires_at: String,
    abilities: Vec<String>,
}

fn detail(id: &Identity, color: bool) -> String {
    let header = output::heading(id.name.as_deref().unwrap_or("Signed in"), color);
    let abilities = if id.abilities.is_empty() {
        output::muted("none", color)
    } else {
        id.abilities.join(", ")
    };
    let body = output::detail_lines(&[
        ("User", id.user_token.clone()),
        ("Expires", id.expires_at.clone()),
        ("Abilities", abilities),
    ]);
    format!("{header}\n{body}")
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn login(portal: &Portal, args: LoginArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let code = match args.access_code {
        Some(code) => code,
        None => rpassword::prompt_password("Access code: ")?,
    };
    if code.trim().is_empty() {
        return Err(CliError::Validation {
            field: "access_code".into(),
            reason: "access code cannot be empty".into(),
        });
    }

    portal
        .user()
        .login(&args.email, &SecretString::from(code))
        .await?;
    if !portal.load_schedule().await? {
        tracing::warn!("signed in, but the schedule could not be loaded");
    }

    if !global.quiet {
        eprintln!("Signed in as {}", args.email);
    }
    Ok(())
}

pub fn logout(portal: &Portal, global: &GlobalOpts) -> Result<(), CliError> {
    let was_identified = portal.user().is_identified();
    portal.user().logout()?;
    if !global.quiet {
        if was_identified {
            eprintln!("Signed out");
        } else {
            eprintln!("Not signed in");
        }
    }
    Ok(())
}

pub fn whoami(portal: &Portal, global: &GlobalOpts) -> Result<(), CliError> {
    let user = portal.user();
    let user_token = user.user_token()?;
    let name = portal
        .event()
        .volunteer(&user_token)
        .ok()
        .flatten()
        .map(|v| v.full_name());

    let identity = Identity {
        name,
        expires_at: user.expires_at()?.to_rfc3339(),
        abilities: user.abilities(),
        user_token,
    };

    let color = output::should_color(&global.color());
    let out = output::render_single(
        &global.output(),
        &identity,
        |id| detail(id, color),
        |id| id.user_token.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
