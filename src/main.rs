use clap::{Parser, Subcommand};
use panelgen::config::{self, CONTENT_DIR, ComicInfo};
use panelgen::hooks::NoHooks;
use panelgen::scan::ScanOptions;
use panelgen::serve::{self, ServeOptions};
use panelgen::{logging, output, site};
use std::path::PathBuf;

fn version_string() -> &'static str {
    if env!("PANELGEN_RELEASE") == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("PANELGEN_GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Called once per process.
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "panelgen")]
#[command(about = "Static site generator for webcomics")]
#[command(long_about = "\
Static site generator for webcomics

Each comic page is a folder with an info.ini and its images. The generated
HTML is written next to your_content/, ready to publish as-is.

Project structure:

  your_content/
  ├── comic_info.ini               # Site settings
  ├── home page.txt                # Home page text (markdown)
  ├── comics/
  │   └── Page 1/
  │       ├── info.ini             # Post date, Title, Storyline, Characters, Tags
  │       ├── page_1.png           # Images (or list them under Filenames)
  │       ├── post.txt             # Post under the page (markdown)
  │       └── English.txt          # Transcript
  ├── themes/default/templates/    # Template overrides
  └── side_story/                  # Extra comic listed under Extra comics

Pages dated in the future stay unpublished until their date passes.")]
#[command(version = version_string())]
struct Cli {
    /// Project directory (default: nearest directory containing your_content/)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

/// Flags shared by commands that build the site.
#[derive(clap::Args, Clone, Copy)]
struct BuildArgs {
    /// Delete the folders of scheduled pages. Use at your own risk!
    #[arg(short, long)]
    delete_scheduled_posts: bool,

    /// Publish every page, even those dated in the future
    #[arg(short, long)]
    publish_all_comics: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Build the whole site
    Build(BuildArgs),
    /// Build, serve locally, and rebuild when files change
    Serve {
        #[command(flatten)]
        build: BuildArgs,

        /// Port to listen on
        #[arg(long, default_value_t = 8000)]
        port: u16,
    },
    /// Delete generated output
    Clean,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let start = match cli.root {
        Some(root) => root,
        None => std::env::current_dir()?,
    };
    let root = config::find_project_root(&start)?;

    match cli.command {
        Command::Build(args) => {
            let options = ScanOptions::new(args.delete_scheduled_posts, args.publish_all_comics);
            let report = site::build_site(&root, &NoHooks, &options)?;
            output::print_build_output(&report);
            output::print_timings(&report.timings);
        }
        Command::Serve { build, port } => {
            serve::serve(
                &root,
                &NoHooks,
                ServeOptions {
                    port,
                    delete_scheduled_posts: build.delete_scheduled_posts,
                    publish_all_comics: build.publish_all_comics,
                },
            )?;
        }
        Command::Clean => {
            let info = ComicInfo::load(&root.join(CONTENT_DIR).join("comic_info.ini"))?;
            let removed = site::clean_output(&root, &info)?;
            output::print_clean_output(&root, &removed);
        }
    }

    Ok(())
}
