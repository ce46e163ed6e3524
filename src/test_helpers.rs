//! Shared test utilities for the gensite test suite.
//!
//! Builds a small but complete project in a temp directory:
//!
//! ```text
//! <tmp>/
//! ├── config.toml
//! ├── content/
//! │   ├── articles/
//! │   │   ├── hello.md              # well-formed, the worked example
//! │   │   ├── nested/second.md      # well-formed, nested
//! │   │   ├── no-header.md          # missing front matter
//! │   │   └── bad-header.md         # header line with two colons
//! │   └── pages/
//! │       └── about.md
//! ├── publish/
//! └── templates/themes/default/
//!     ├── article_template.html
//!     ├── about_template.html
//!     └── static/style.css
//! ```

use std::fs;
use std::path::Path;
use tempfile::TempDir;

use crate::config::{CONFIG_FILE, ProjectConfig};
use crate::generate::Generator;

pub const ARTICLE_TEMPLATE_BODY: &str =
    "<!DOCTYPE html><html><head><title>{{ title }}</title></head><body>{{ content }}</body></html>";
pub const ABOUT_TEMPLATE_BODY: &str =
    "<section class=\"about\"><h2>{{ title }}</h2>{{ content }}</section>";
pub const STYLE_CSS: &str = "body { margin: 0 auto; max-width: 40rem; }";

// =========================================================================
// Fixture setup
// =========================================================================

/// Create the fixture project and return its temp directory.
pub fn setup_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();

    for dir in [
        "content/articles/nested",
        "content/pages",
        "publish",
        "templates/themes/default/static",
    ] {
        fs::create_dir_all(root.join(dir)).unwrap();
    }

    let theme = root.join("templates/themes/default");
    fs::write(theme.join("article_template.html"), ARTICLE_TEMPLATE_BODY).unwrap();
    fs::write(theme.join("about_template.html"), ABOUT_TEMPLATE_BODY).unwrap();
    fs::write(theme.join("static/style.css"), STYLE_CSS).unwrap();

    write_source(&tmp, "articles/hello.md", "---\ntitle: Hello\n---\n# Hi\n");
    write_source(
        &tmp,
        "articles/nested/second.md",
        "---\ntitle: Second post\ndate: 2024-05-01\n---\nSome *text*.\n",
    );
    write_source(&tmp, "articles/no-header.md", "# No header\n\nJust text.\n");
    write_source(
        &tmp,
        "articles/bad-header.md",
        "---\ntitle: Bad\ntime: 10:30\n---\nbody\n",
    );
    write_source(&tmp, "pages/about.md", "---\ntitle: About me\n---\nHello there.\n");

    fs::write(
        root.join(CONFIG_FILE),
        format!(
            "project_directory = {:?}\ntheme = \"default\"\n",
            root.display().to_string()
        ),
    )
    .unwrap();

    tmp
}

/// Write a source document relative to the project's `content/` directory.
pub fn write_source(project: &TempDir, rel: &str, text: &str) {
    let path = project.path().join("content").join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

// =========================================================================
// Lookups
// =========================================================================

pub fn project_config(project: &TempDir) -> ProjectConfig {
    ProjectConfig::new(project.path())
}

pub fn generator(project: &TempDir) -> Generator {
    Generator::new(project_config(project)).unwrap()
}

/// Read a file from `publish/`. Panics with the directory listing on miss.
pub fn read_output(project: &TempDir, name: &str) -> String {
    let publish = project.path().join("publish");
    fs::read_to_string(publish.join(name)).unwrap_or_else(|_| {
        panic!("output '{name}' not found. Available: {:?}", list_dir(&publish))
    })
}

fn list_dir(dir: &Path) -> Vec<String> {
    fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default()
}
