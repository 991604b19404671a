//! Content page command handler.

use chrono::DateTime;
use tabled::Tabled;

use portal_api::ContentPage;
use portal_core::Portal;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct PageRow {
    #[tabled(rename = "Slug")]
    slug: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Modified")]
    modified: String,
}

impl From<&ContentPage> for PageRow {
    fn from(p: &ContentPage) -> Self {
        Self {
            slug: p.slug.clone(),
            title: p.title.clone(),
            modified: format_modified(p.modified),
        }
    }
}

fn format_modified(secs: i64) -> String {
    DateTime::from_timestamp(secs, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

fn detail(page: &ContentPage, color: bool) -> String {
    format!(
        "{}\n{}\n\n{}",
        output::heading(&page.title, color),
        output::muted(&format!("updated {}", format_modified(page.modified)), color),
        page.content
    )
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    portal: &Portal,
    slug: Option<&str>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if !portal.load_content().await {
        return Err(CliError::NotLoaded {
            what: "Content".into(),
        });
    }
    let content = portal.content();

    let out = match slug {
        None => output::render_list(
            &global.output(),
            &content.pages()?,
            |p| PageRow::from(p),
            |p| p.slug.clone(),
        ),
        Some(slug) => {
            let page = content.page(slug)?.ok_or_else(|| CliError::NotFound {
                resource_type: "Page".into(),
                identifier: slug.into(),
                list_command: "content".into(),
            })?;
            portal.title().set_page(Some(&page.title));
            let color = output::should_color(&global.color());
            output::render_single(
                &global.output(),
                &page,
                |p| detail(p, color),
                |p| p.content.clone(),
            )
        }
    };
    output::print_output(&out, global.quiet);
    Ok(())
}
