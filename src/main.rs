use clap::{Parser, Subcommand};
use gensite::generate::{GenerationReport, Generator};
use gensite::scaffold::{self, InitOptions};
use gensite::{config, output};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gensite")]
#[command(about = "Static site generator for markdown articles and pages")]
#[command(long_about = "\
Static site generator for markdown articles and pages

Each document starts with a front matter header of `key: value` lines between
two `---` fences. Header keys become template variables; the markdown body is
rendered to HTML and passed as `content`.

Project structure:

  <project>/
  ├── config.toml                  # project_directory, theme, [processing]
  ├── content/
  │   ├── articles/                # rendered with article_template.html
  │   │   └── hello.md
  │   └── pages/                   # about.md renders with about_template.html
  │       └── about.md
  ├── publish/                     # <stem>.html outputs and static/ assets
  └── templates/
      ├── <theme>/                 # requested theme
      └── themes/<default>/        # fallback theme

Documents with a missing or malformed header are reported and skipped.

Run 'gensite gen-config' to print a documented config.toml.")]
#[command(version)]
struct Cli {
    /// More log output (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a new project from the stock templates
    Init {
        /// Project directory (must exist)
        #[arg(default_value = ".")]
        path: PathBuf,
        /// Stock templates directory to copy into the project
        #[arg(long, env = "GEN_TEMPLATES")]
        templates: PathBuf,
        /// Project name recorded in config.toml
        #[arg(long)]
        name: Option<String>,
        /// Default theme recorded in config.toml
        #[arg(long, default_value = config::DEFAULT_THEME)]
        theme: String,
    },
    /// Render articles and pages into publish/
    Make {
        /// Project directory containing config.toml
        #[arg(long, default_value = ".")]
        project: PathBuf,
        /// Only render content/articles
        #[arg(long, conflicts_with = "pages")]
        articles: bool,
        /// Only render content/pages
        #[arg(long)]
        pages: bool,
        /// Theme to request instead of the configured one
        #[arg(long)]
        theme: Option<String>,
        /// Print the batch reports as JSON
        #[arg(long)]
        json: bool,
    },
    /// Re-copy the stock templates into an existing project
    UpdateTemplates {
        /// Project directory containing config.toml
        #[arg(long, default_value = ".")]
        project: PathBuf,
        /// Stock templates directory
        #[arg(long, env = "GEN_TEMPLATES")]
        templates: PathBuf,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    match cli.command {
        Command::Init {
            path,
            templates,
            name,
            theme,
        } => {
            let options = InitOptions {
                project_name: name,
                theme,
            };
            let config = scaffold::init_project(&path, &templates, &options)?;
            println!(
                "==> Initialized project in {}",
                config.project_directory.display()
            );
        }
        Command::Make {
            project,
            articles,
            pages,
            theme,
            json,
        } => {
            let mut generator = Generator::from_dir(&project)?;
            if let Some(theme) = theme {
                generator = generator.with_theme(theme);
            }
            let project_dir = generator.config().project_directory.clone();

            let mut reports: Vec<GenerationReport> = Vec::new();
            if !pages {
                reports.push(generator.generate_articles()?);
            }
            if !articles {
                reports.push(generator.generate_pages()?);
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            } else {
                for report in &reports {
                    output::print_report(report, &project_dir);
                }
                output::print_totals(&reports);
            }
        }
        Command::UpdateTemplates { project, templates } => {
            let copied = scaffold::update_templates(&project, &templates)?;
            println!("==> Updated {copied} template files");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) -> Result<(), Box<dyn std::error::Error>> {
    let level = match verbose {
        0 => "gensite=warn",
        1 => "gensite=info",
        _ => "gensite=debug",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| format!("failed to initialize tracing subscriber: {error}"))?;
    Ok(())
}
