// Document title composition: "{page} | {portal title}".

use std::sync::{Arc, Mutex};

use crate::notifier::Notifier;

#[derive(Debug, Default)]
struct TitleParts {
    page: Option<String>,
    suffix: Option<String>,
}

impl TitleParts {
    fn compose(&self) -> String {
        match (&self.page, &self.suffix) {
            (Some(page), Some(suffix)) => format!("{page} | {suffix}"),
            (Some(only), None) | (None, Some(only)) => only.clone(),
            (None, None) => String::new(),
        }
    }
}

/// Owns the current title and publishes every change on the title
/// notifier.
#[derive(Debug)]
pub struct TitleManager {
    parts: Mutex<TitleParts>,
    notifier: Arc<Notifier<String>>,
}

impl TitleManager {
    pub fn new(notifier: Arc<Notifier<String>>) -> Self {
        Self {
            parts: Mutex::new(TitleParts::default()),
            notifier,
        }
    }

    /// Set the portal-wide suffix, normally the environment's portal title.
    pub fn set_suffix(&self, suffix: impl Into<String>) {
        self.update(|parts| parts.suffix = Some(suffix.into()));
    }

    /// Set (or clear) the title of the current page.
    pub fn set_page(&self, page: Option<&str>) {
        self.update(|parts| parts.page = page.map(str::to_owned));
    }

    pub fn title(&self) -> String {
        self.parts.lock().expect("title lock poisoned").compose()
    }

    fn update(&self, f: impl FnOnce(&mut TitleParts)) {
        let (before, after) = {
            let mut parts = self.parts.lock().expect("title lock poisoned");
            let before = parts.compose();
            f(&mut parts);
            (before, parts.compose())
        };
        if before != after {
            self.notifier.notify(&after);
        }
    }
}
