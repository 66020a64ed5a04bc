use clap::{Parser, Subcommand};
use content_pipeline::config::{self, PathsConfig, PipelineConfig};
use content_pipeline::imaging::RustBackend;
use content_pipeline::markdown::{self, EscapePolicy, Node};
use content_pipeline::{frontmatter, images, index, manifest, output, validate};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "content-pipeline")]
#[command(about = "Build-time manifests, link validation and image checks for a markdown site")]
#[command(long_about = "\
Build-time manifests, link validation and image checks for a markdown site

Project structure (default paths, see 'gen-config'):

  project/
  ├── pipeline.toml                # Optional config
  ├── content/writing/             # Writing posts
  │   ├── hooks.md                 # → /writing/hooks
  │   └── manifest.json            # Generated
  ├── courses/
  │   └── react/                   # → /courses/react
  │       ├── README.md            # Course overview, frontmatter = course block
  │       ├── _index.md            # Section file, not listed in the manifest
  │       ├── intro.md             # → /courses/react/intro
  │       └── manifest.json        # Generated
  ├── static/                      # Site-rooted assets (/images/x.png)
  └── src/lib/generated/
      └── content-index.json       # Generated from all manifests

Generators skip writing when their inputs are unchanged. 'validate' and
'check-images' report every issue found and exit 1 if there were any.

Run 'content-pipeline gen-config' to print a documented pipeline.toml.")]
#[command(version)]
struct Cli {
    /// Project root (holds pipeline.toml; configured paths are relative to it)
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate the writing collection manifest
    WritingManifest,
    /// Generate one manifest per course directory
    CourseManifests,
    /// Combine all manifests into the site content index
    ContentIndex,
    /// Run writing-manifest, course-manifests and content-index in order
    Build,
    /// Check frontmatter and every internal link
    Validate,
    /// Check that every referenced image can be read and transcoded
    CheckImages,
    /// Print the markdown tree of a file as JSON after the escape transform
    Ast {
        /// Markdown file, or a `.json` mdast tree
        file: PathBuf,
        /// Escape policy (defaults to `[markdown] escape`)
        #[arg(long)]
        escape: Option<EscapePolicy>,
    },
    /// Print a stock pipeline.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let config = config::load_config(&cli.root)?;
    let paths = PathsConfig::resolve(&cli.root, &config.paths);

    match cli.command {
        Command::WritingManifest => {
            let outcome = manifest::generate_writing_manifest(&paths)?;
            output::print_outcomes(&[outcome], &paths);
        }
        Command::CourseManifests => {
            let outcomes = manifest::generate_course_manifests(&paths)?;
            output::print_outcomes(&outcomes, &paths);
        }
        Command::ContentIndex => {
            let outcome = index::generate_content_index(&paths)?;
            output::print_outcomes(&[outcome], &paths);
        }
        Command::Build => {
            println!("==> Writing manifest");
            let outcome = manifest::generate_writing_manifest(&paths)?;
            output::print_outcomes(&[outcome], &paths);

            println!("==> Course manifests");
            let outcomes = manifest::generate_course_manifests(&paths)?;
            output::print_outcomes(&outcomes, &paths);

            println!("==> Content index");
            let outcome = index::generate_content_index(&paths)?;
            output::print_outcomes(&[outcome], &paths);
        }
        Command::Validate => {
            let report = validate::validate(&paths, &config.routes)?;
            output::print_validation(&report, &paths);
            if !report.is_clean() {
                std::process::exit(1);
            }
        }
        Command::CheckImages => {
            let report = images::check_images(&RustBackend::new(), &paths, &config.images)?;
            output::print_image_report(&report, &paths);
            if !report.issues.is_empty() {
                std::process::exit(1);
            }
        }
        Command::Ast { file, escape } => {
            let tree = escaped_tree(&file, escape, &config)?;
            println!("{}", serde_json::to_string_pretty(&tree.to_json())?);
        }
        Command::GenConfig => unreachable!("handled before config is loaded"),
    }

    Ok(())
}

/// Load a tree from markdown (frontmatter becomes a `yaml` node) or mdast
/// JSON, then apply the escape transform.
fn escaped_tree(
    file: &Path,
    escape: Option<EscapePolicy>,
    config: &PipelineConfig,
) -> Result<Node, Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(file)?;
    let is_json = file
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    let mut tree = if is_json {
        Node::from_json(serde_json::from_str(&raw)?)?
    } else {
        // Report malformed frontmatter here rather than printing a tree
        // the manifests would silently read as defaults.
        frontmatter::parse_fields(&raw)?;
        markdown::parse(&raw)
    };
    markdown::escape_text(&mut tree, escape.unwrap_or(config.markdown.escape));
    Ok(tree)
}
