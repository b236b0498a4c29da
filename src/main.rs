use clap::{Parser, Subcommand};
use photo_renditions::imaging::RustBackend;
use photo_renditions::process::{self, AlbumRun, ProcessConfig, ProcessError, ProcessEvent};
use photo_renditions::types::AlbumSource;
use photo_renditions::{config, discover, export, logging, output, scan};
use std::path::PathBuf;
use std::sync::mpsc::{self, Sender};
use std::thread::JoinHandle;

/// Shared flags for commands that process images.
#[derive(clap::Args, Clone)]
struct CacheArgs {
    /// Disable the rendition cache and re-encode every rendition
    #[arg(long)]
    no_cache: bool,
}

#[derive(Parser)]
#[command(name = "photo-renditions")]
#[command(about = "Web-sized JPEG renditions and album manifests for Hugo photo albums")]
#[command(long_about = "\
Web-sized JPEG renditions and album manifests for Hugo photo albums

Each page in content/album/ names a directory of original photos in its
front matter. For every album the originals are resized, turned upright
according to their EXIF orientation, and written as JPEG renditions;
an album.toml listing them in capture order is written for the templates.

Site structure:

  my-site/
  ├── renditions.toml              # Optional config (see gen-config)
  ├── content/album/iceland.md     # album = \"/photos/2020-iceland\"
  ├── static/album/iceland/        # cover_small.jpg, cover_medium.jpg, ...
  └── data/album/iceland/album.toml

Every photo gets small (600px) and large (1536px) renditions; cover.jpg
also gets medium (800px). Existing renditions are reused unless the source,
width, quality or orientation changed.

Run 'photo-renditions gen-config' to print a documented renditions.toml.")]
#[command(version)]
struct Cli {
    /// Hugo site root
    #[arg(long, default_value = ".", global = true)]
    site: PathBuf,

    /// More log output on stderr (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Process every album found in the content directory
    Build(CacheArgs),
    /// Process a single album directory
    Album {
        /// Output name under the static and data roots
        #[arg(long)]
        slug: String,
        /// Directory holding the original photos
        #[arg(long)]
        source: PathBuf,
        #[command(flatten)]
        cache: CacheArgs,
    },
    /// List albums and planned renditions without encoding anything
    Check,
    /// Print a stock renditions.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Command::Build(cache_args) => {
            let config = load_site_config(&cli.site)?;
            init_thread_pool(&config.processing);

            println!("==> Discovering albums in {}", config.paths.content_dir.display());
            let albums = discover::find_albums(&config.paths.content_dir, &cli.site)?;

            println!("==> Processing {} albums", albums.len());
            let process_config = ProcessConfig::from_pipeline_config(&config, !cache_args.no_cache);
            let (tx, printer) = spawn_printer();
            let results =
                process::process_albums(&RustBackend::new(), &albums, &process_config, Some(tx));
            join_printer(printer)?;

            let failed = write_manifests(&config.paths.data_root, results);
            if failed > 0 {
                return Err(format!("{} of {} albums failed", failed, albums.len()).into());
            }
            println!("==> Build complete");
        }
        Command::Album {
            slug,
            source,
            cache: cache_args,
        } => {
            let config = load_site_config(&cli.site)?;
            init_thread_pool(&config.processing);

            let album = AlbumSource {
                slug,
                source_dir: cli.site.join(source),
            };
            let process_config = ProcessConfig::from_pipeline_config(&config, !cache_args.no_cache);
            let (tx, printer) = spawn_printer();
            let albums = [album];
            let results =
                process::process_albums(&RustBackend::new(), &albums, &process_config, Some(tx));
            join_printer(printer)?;

            let failed = write_manifests(&config.paths.data_root, results);
            if failed > 0 {
                return Err("album failed".into());
            }
        }
        Command::Check => {
            let config = load_site_config(&cli.site)?;
            println!("==> Checking {}", config.paths.content_dir.display());
            let albums = discover::find_albums(&config.paths.content_dir, &cli.site)?;
            let scanned = albums
                .into_iter()
                .map(|album| {
                    let files = scan::scan_album_dir(&album.source_dir);
                    (album, files)
                })
                .collect::<Vec<_>>();
            output::print_check_output(&scanned, &config.renditions);
            if scanned.iter().any(|(_, files)| files.is_err()) {
                return Err("some album source directories are missing".into());
            }
            println!("==> Content is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load `renditions.toml` from the site root and resolve its paths.
fn load_site_config(site: &std::path::Path) -> Result<config::PipelineConfig, config::ConfigError> {
    let mut config = config::load_config(site)?;
    config.paths = config.paths.resolve(site);
    Ok(config)
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

fn spawn_printer() -> (Sender<ProcessEvent>, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            output::print_process_event(&event);
        }
    });
    (tx, printer)
}

fn join_printer(printer: JoinHandle<()>) -> Result<(), Box<dyn std::error::Error>> {
    printer.join().map_err(|_| "output thread panicked")?;
    Ok(())
}

/// Write `album.toml` for each successful album and print the cache totals.
/// Returns the number of albums that failed (already logged).
fn write_manifests(data_root: &std::path::Path, results: Vec<Result<AlbumRun, ProcessError>>) -> usize {
    let summary = export::write_album_tomls(data_root, results);
    println!("Cache: {}", summary.stats);
    summary.failed
}
