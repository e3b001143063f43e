use clap::{Parser, Subcommand, ValueEnum};
use quire::auth::{PasswordGate, SessionVerifier};
use quire::cache::PageCache;
use quire::collection::{CollectionOp, Direction};
use quire::editor::{CollectionTarget, EditSession};
use quire::handlers::{self, AudioUploadForm, UploadedFile};
use quire::invalidation::CacheInvalidator;
use quire::resolver::Resolver;
use quire::sections::Document;
use quire::site::Site;
use quire::store::{self, StoreAdapter};
use quire::types::{ArchiveEntry, Book, Category, NavItem, Poem, Recording};
use quire::uploads::{FsObjectStore, UploadLimits};
use quire::{config, defaults, output, telemetry};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup.
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "quire")]
#[command(about = "Content store, renderer and publish workflow for an author website")]
#[command(long_about = "\
Content store, renderer and publish workflow for an author website

Site copy lives as one JSON document per section in a content store.
Anything the store lacks falls back to compiled-in defaults, so the site
always renders. Edits are saved per section and reach visitors when the
site is published.

Sections:
  hero, introduction, current_work, read_invitation, newsletter,
  nav_items, read_page, listen_page, books_page, about_page,
  archive_page, intervals_page

Store:
  Set [store] url and key in quire.toml, or QUIRE_STORE_URL and
  QUIRE_STORE_KEY (STORE_URL / STORE_KEY also work). Without both the
  site serves defaults only and admin commands cannot save.
  Run 'quire store init' once to provision a SQLite store.

Admin commands sign in with [admin] email and the password in
QUIRE_ADMIN_PASSWORD.

Run 'quire gen-config' to generate a documented quire.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Directory containing quire.toml
    #[arg(long, default_value = ".", global = true)]
    config_dir: PathBuf,

    /// Output directory (overrides [site] output_dir)
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the HTML for one page, served through the render cache
    Render {
        /// Page path, e.g. / or /read
        path: String,
    },
    /// Render every page into the output directory
    Build,
    /// Print a resolved section document
    Show {
        /// Section id; omit to print every section
        section: Option<String>,
    },
    /// Print the public navigation
    Nav,
    /// List sections and where their content comes from
    Sections,
    /// Print a stock quire.toml with all options documented
    GenConfig,
    /// Content store maintenance
    #[command(subcommand)]
    Store(StoreCommand),
    /// Edit, save and publish content
    Admin(AdminArgs),
}

#[derive(Subcommand)]
enum StoreCommand {
    /// Create the store schema and record the access key
    Init,
}

#[derive(clap::Args)]
struct AdminArgs {
    /// Sign-in email (defaults to [admin] email)
    #[arg(long)]
    email: Option<String>,

    #[command(subcommand)]
    command: AdminCommand,
}

/// Shared flag for commands that save a section.
#[derive(clap::Args, Clone, Copy)]
struct PublishArgs {
    /// Publish after saving
    #[arg(long)]
    publish: bool,
}

#[derive(Subcommand)]
enum AdminCommand {
    /// Replace a section with a JSON document and save it
    Set {
        section: String,
        /// JSON object
        json: String,
        #[command(flatten)]
        publish: PublishArgs,
    },
    /// Set one field of a section and save it
    SetField {
        section: String,
        field: String,
        /// JSON value; anything that does not parse as JSON is a string
        value: String,
        #[command(flatten)]
        publish: PublishArgs,
    },
    /// Move an item one step up or down
    Move {
        #[command(flatten)]
        target: TargetArgs,
        id: String,
        direction: Direction,
        #[command(flatten)]
        publish: PublishArgs,
    },
    /// Show or hide an item
    Toggle {
        #[command(flatten)]
        target: TargetArgs,
        id: String,
        #[command(flatten)]
        publish: PublishArgs,
    },
    /// Append a new item
    Add {
        #[command(flatten)]
        target: TargetArgs,
        #[command(flatten)]
        publish: PublishArgs,
    },
    /// Delete an item
    Remove {
        #[command(flatten)]
        target: TargetArgs,
        id: String,
        #[command(flatten)]
        publish: PublishArgs,
    },
    /// Invalidate every public page
    Publish,
    /// Upload an audio file and attach it to a recording
    Upload {
        recording_id: String,
        file: PathBuf,
        /// Content type (guessed from the extension when omitted)
        #[arg(long)]
        content_type: Option<String>,
        #[command(flatten)]
        publish: PublishArgs,
    },
    /// Invalidate specific paths or a cache tag
    Revalidate {
        /// Paths to invalidate
        #[arg(long = "path", required_unless_present = "tag")]
        paths: Vec<String>,
        /// Cache tag to invalidate
        #[arg(long, conflicts_with = "paths")]
        tag: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum TargetKind {
    Nav,
    Poems,
    Recordings,
    Books,
    Archive,
}

#[derive(clap::Args, Clone)]
struct TargetArgs {
    /// Which list to edit
    target: TargetKind,
    /// Archive category id (required for the archive)
    #[arg(long)]
    category: Option<String>,
}

impl TargetArgs {
    fn resolve(&self) -> Result<CollectionTarget, Box<dyn std::error::Error>> {
        Ok(match self.target {
            TargetKind::Nav => CollectionTarget::NavItems,
            TargetKind::Poems => CollectionTarget::Poems,
            TargetKind::Recordings => CollectionTarget::Recordings,
            TargetKind::Books => CollectionTarget::Books,
            TargetKind::Archive => CollectionTarget::ArchiveEntries {
                category: self
                    .category
                    .clone()
                    .ok_or("--category is required for the archive")?,
            },
        })
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut site_config = config::load_config(&cli.config_dir)?;
    site_config.apply_env(|name: &str| std::env::var(name).ok());
    if let Some(output) = &cli.output {
        site_config.site.output_dir = output.display().to_string();
    }
    telemetry::init(&site_config.logging.level);

    let store = StoreAdapter::from_settings(
        site_config.store.url.as_deref(),
        site_config.store.key.as_deref(),
    );
    let output_dir = PathBuf::from(&site_config.site.output_dir);

    match cli.command {
        Command::Render { path } => {
            let site = open_site(store, &output_dir, &site_config);
            println!("{}", site.serve(&path)?);
        }
        Command::Build => {
            let site = open_site(store, &output_dir, &site_config);
            let results = site.build()?;
            output::print_build_output(&results, &site_config.site.output_dir);
        }
        Command::Show { section } => {
            let resolver = Resolver::new(store);
            match section {
                Some(id) => output::print_document(&id, &resolver.resolve(&id)),
                None => {
                    for (id, doc) in resolver.resolve_all() {
                        output::print_document(&id, &doc);
                    }
                }
            }
        }
        Command::Nav => {
            let nav = Resolver::new(store).resolve_navigation();
            output::print_collection(&nav, |n: &NavItem| (n.label.clone(), Some(n.href.clone())));
        }
        Command::Sections => {
            let records = match store.read_all() {
                Ok(records) => records,
                Err(e) if e.is_unconfigured() => Vec::new(),
                Err(e) => {
                    tracing::warn!(error = %e, "content store read failed, listing defaults only");
                    Vec::new()
                }
            };
            let rows = output::section_summaries(&defaults::default_documents(), &records);
            output::print_sections(&store.describe(), &rows);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
        Command::Store(StoreCommand::Init) => {
            let (Some(url), Some(key)) = (&site_config.store.url, &site_config.store.key) else {
                return Err("store url and key must be configured before 'quire store init'".into());
            };
            let location = store::provision(url, key)?;
            println!("Content store ready: {location}");
        }
        Command::Admin(args) => run_admin(args, store, &output_dir, &site_config)?,
    }

    Ok(())
}

fn open_site(store: StoreAdapter, output_dir: &Path, site_config: &config::SiteConfig) -> Site {
    let cache = Arc::new(PageCache::open(output_dir));
    Site::new(Resolver::new(store), cache, site_config.clone())
}

fn run_admin(
    args: AdminArgs,
    store: StoreAdapter,
    output_dir: &Path,
    site_config: &config::SiteConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let gate = PasswordGate::new(&site_config.admin);
    let email = args
        .email
        .or_else(|| site_config.admin.email.clone())
        .unwrap_or_default();
    let password = std::env::var("QUIRE_ADMIN_PASSWORD").unwrap_or_default();
    let session = gate.sign_in(&email, &password)?;
    let token = session.token.clone();

    let cache = Arc::new(PageCache::open(output_dir));
    let invalidator = Arc::new(CacheInvalidator::new(cache));
    let mut editor = EditSession::open(store, invalidator.clone())?;

    let result = match args.command {
        AdminCommand::Set {
            section,
            json,
            publish,
        } => {
            let doc: Document = serde_json::from_str(&json)?;
            editor.update_content(&section, doc);
            save(&mut editor, &section, publish)
        }
        AdminCommand::SetField {
            section,
            field,
            value,
            publish,
        } => {
            let value = serde_json::from_str(&value).unwrap_or(Value::String(value));
            editor.update_field(&section, &field, value);
            save(&mut editor, &section, publish)
        }
        AdminCommand::Move {
            target,
            id,
            direction,
            publish,
        } => edit(&mut editor, &target, &CollectionOp::Move { id, direction }, publish),
        AdminCommand::Toggle { target, id, publish } => {
            edit(&mut editor, &target, &CollectionOp::Toggle { id }, publish)
        }
        AdminCommand::Add { target, publish } => edit(&mut editor, &target, &CollectionOp::Insert, publish),
        AdminCommand::Remove { target, id, publish } => {
            edit(&mut editor, &target, &CollectionOp::Remove { id }, publish)
        }
        AdminCommand::Publish => {
            let paths = editor.publish()?;
            println!("Published: {}", paths.join(" "));
            Ok(())
        }
        AdminCommand::Upload {
            recording_id,
            file,
            content_type,
            publish,
        } => {
            let objects = FsObjectStore::from_config(&site_config.uploads);
            let limits = UploadLimits::from_config(&site_config.uploads);
            let file_name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let form = AudioUploadForm {
                file: Some(UploadedFile {
                    content_type: content_type.unwrap_or_else(|| guess_content_type(&file_name).to_string()),
                    bytes: std::fs::read(&file)?,
                    file_name: file_name.clone(),
                }),
                recording_id: Some(recording_id.clone()),
            };
            let (status, body) = handlers::upload_audio(&gate, &objects, &limits, Some(&token), &form);
            if !status.is_success() {
                return Err(format!("upload failed ({status}): {body}").into());
            }
            let file_url = body["file_url"].as_str().unwrap_or_default();
            editor.attach_recording_file(&recording_id, file_url, &file_name)?;
            println!("Uploaded {file_name} → {file_url}");
            save(&mut editor, "listen_page", publish)
        }
        AdminCommand::Revalidate { paths, tag } => {
            let (status, body) = match tag {
                Some(tag) => handlers::revalidate_tag(
                    &gate,
                    invalidator.as_ref(),
                    Some(&token),
                    &serde_json::json!({ "tag": tag }),
                ),
                None => handlers::revalidate_paths(
                    &gate,
                    invalidator.as_ref(),
                    Some(&token),
                    &serde_json::json!({ "paths": paths }),
                ),
            };
            println!("{body}");
            if status.is_success() {
                Ok(())
            } else {
                Err(format!("revalidation failed ({status})").into())
            }
        }
    };

    gate.sign_out(&token);
    debug_assert!(gate.verify(&token).is_none());
    result
}

fn save(editor: &mut EditSession, section: &str, publish: PublishArgs) -> Result<(), Box<dyn std::error::Error>> {
    let record = editor.save_section(section)?;
    println!("Saved {} at {}", record.id, record.updated_at.to_rfc3339());
    if publish.publish {
        editor.publish()?;
        println!("Published");
    } else if editor.has_unpublished_changes() {
        println!("Not yet visible to visitors; run 'quire admin publish'");
    }
    Ok(())
}

fn edit(
    editor: &mut EditSession,
    target: &TargetArgs,
    op: &CollectionOp,
    publish: PublishArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let target = target.resolve()?;
    editor.edit_collection(&target, op)?;
    print_target(editor, &target)?;
    save(editor, target.section().as_str(), publish)
}

fn print_target(editor: &mut EditSession, target: &CollectionTarget) -> Result<(), Box<dyn std::error::Error>> {
    let content = editor.content(target.section().as_str());
    let list = content.get(target.field()).cloned().unwrap_or(Value::Array(Vec::new()));
    match target {
        CollectionTarget::NavItems => {
            let items: Vec<NavItem> = serde_json::from_value(list)?;
            output::print_collection(&items, |n| (n.label.clone(), Some(n.href.clone())));
        }
        CollectionTarget::Poems => {
            let items: Vec<Poem> = serde_json::from_value(list)?;
            output::print_collection(&items, |p| (p.title.clone(), None));
        }
        CollectionTarget::Recordings => {
            let items: Vec<Recording> = serde_json::from_value(list)?;
            output::print_collection(&items, |r| (r.label.clone(), Some(r.source_url())));
        }
        CollectionTarget::Books => {
            let items: Vec<Book> = serde_json::from_value(list)?;
            output::print_collection(&items, |b| (b.title.clone(), Some(b.link_url.clone())));
        }
        CollectionTarget::ArchiveEntries { category } => {
            let categories: Vec<Category> = serde_json::from_value(list)?;
            let entries: Vec<ArchiveEntry> = categories
                .into_iter()
                .find(|c| &c.id == category)
                .map(|c| c.entries)
                .unwrap_or_default();
            output::print_collection(&entries, |e| (e.title.clone(), e.url.clone()));
        }
    }
    Ok(())
}

fn guess_content_type(file_name: &str) -> &'static str {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "m4a" | "mp4" | "aac" => "audio/mp4",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" | "oga" => "audio/ogg",
        "flac" => "audio/flac",
        _ => "application/octet-stream",
    }
}
