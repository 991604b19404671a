//! Environment command handler.

use portal_api::EnvironmentData;
use portal_core::Portal;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

fn detail(env: &EnvironmentData, color: bool) -> String {
    let header = output::heading(&env.event_name, color);
    let body = output::detail_lines(&[
        ("Portal", env.portal_title.clone()),
        ("Year", env.year.to_string()),
        ("Time zone", env.timezone.clone()),
        ("Senior title", env.senior_title.clone()),
    ]);
    format!("{header}\n{body}")
}

pub fn handle(portal: &Portal, global: &GlobalOpts) -> Result<(), CliError> {
    let env = portal.environment().data()?;
    let color = output::should_color(&global.color());
    let out = output::render_single(
        &global.output(),
        &*env,
        |e| detail(e, color),
        |e| e.event_name.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
