mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::{load_config, Backend, ScholarConfig};
use scholar_core::{Aggregate, NoteType, Principal};
use scholar_services::{ScholarServices, ServiceOptions};
use scholar_storage::{
    ChangeBus, ChangeNotifier, FileStore, KeyValueStore, MemoryStore, RecordStore, Records,
    SledStore, StoreOptions,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "scholar")]
#[command(about = "ICP Scholar local platform")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("SCHOLAR_GIT_HASH"), ")"))]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Act as this principal instead of the configured one
    #[arg(short, long)]
    principal: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create, browse and publish courses
    #[command(subcommand)]
    Course(CourseCommand),

    /// Educator profiles
    #[command(subcommand)]
    Educator(EducatorCommand),

    /// Profiles, enrollments, progress and certificates
    #[command(subcommand)]
    Student(StudentCommand),

    /// Balances and transfers
    #[command(subcommand)]
    Token(TokenCommand),

    /// Peer notes and tips
    #[command(subcommand)]
    Peer(PeerCommand),

    /// Maintenance of the stored records
    #[command(subcommand)]
    Store(StoreCommand),
}

#[derive(Subcommand)]
enum CourseCommand {
    /// Create an unpublished course owned by the caller
    Create {
        #[arg(short, long)]
        title: String,

        #[arg(short, long, default_value = "")]
        description: String,

        #[arg(short, long, default_value_t = 0)]
        reward: u64,
    },

    /// Show one course
    Get { id: String },

    /// List published courses
    List,

    /// List the caller's courses
    Mine,

    /// Append a section to a course
    AddSection {
        course_id: String,

        #[arg(short, long)]
        title: String,

        #[arg(short, long, default_value = "")]
        content: String,
    },

    /// Make a course visible to students
    Publish { id: String },
}

#[derive(Subcommand)]
enum EducatorCommand {
    /// Create or replace the caller's profile
    Create {
        #[arg(short, long)]
        name: String,

        #[arg(short, long, default_value = "")]
        bio: String,

        /// Comma separated subjects
        #[arg(short, long, value_delimiter = ',')]
        expertise: Vec<String>,
    },

    /// Show a profile, the caller's by default
    Show { principal: Option<String> },
}

#[derive(Subcommand)]
enum StudentCommand {
    /// Create or replace the caller's profile
    Create {
        #[arg(short, long)]
        name: String,

        #[arg(short, long, default_value = "")]
        email: String,

        #[arg(short, long, default_value = "")]
        bio: String,
    },

    /// Change fields of the caller's profile
    Update {
        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        email: Option<String>,

        #[arg(short, long)]
        bio: Option<String>,
    },

    /// Show the caller's profile
    Profile,

    /// Enroll in a course
    Enroll { course_id: String },

    /// List the caller's enrollments
    Enrollments,

    /// Mark a section as done
    CompleteSection { course_id: String, section_id: String },

    /// Complete a course and receive its certificate
    Complete {
        course_id: String,

        #[arg(short, long)]
        title: Option<String>,
    },

    /// List the caller's certificates
    Certificates,
}

#[derive(Subcommand)]
enum TokenCommand {
    /// Show a balance, the caller's by default
    Balance { principal: Option<String> },

    /// Send tokens to another principal
    Transfer {
        to: String,
        amount: u64,

        #[arg(short, long, default_value = "")]
        memo: String,
    },

    /// List the caller's transactions
    History,

    /// Create new tokens for a principal
    Mint {
        to: String,
        amount: u64,

        #[arg(short, long, default_value = "")]
        memo: String,
    },

    /// Tokens minted so far
    Supply,

    /// Tip another principal directly
    Tip {
        to: String,
        amount: u64,

        #[arg(short, long, default_value = "")]
        memo: String,
    },

    /// Pay a course completion reward
    Reward {
        student: String,
        amount: u64,
        course_id: String,
    },
}

#[derive(Subcommand)]
enum PeerCommand {
    /// Share a note on a course
    Note {
        #[arg(short, long)]
        course: String,

        #[arg(short, long)]
        author_name: String,

        #[arg(long)]
        content: String,

        /// question, answer, study-note or tip
        #[arg(short = 't', long = "type", default_value = "study-note")]
        note_type: NoteType,
    },

    /// List notes
    List {
        /// Only notes on this course
        #[arg(short, long)]
        course: Option<String>,

        /// Only the caller's notes
        #[arg(short, long, conflicts_with = "course")]
        mine: bool,
    },

    /// Replace the content of a note
    Update {
        note_id: String,

        #[arg(long)]
        content: String,
    },

    /// List tips on a note, or tips received by a principal
    Tips {
        #[arg(short, long)]
        note: Option<String>,

        /// Recipient, the caller by default
        #[arg(short, long, conflicts_with = "note")]
        recipient: Option<String>,
    },

    /// Tip the author of a note
    Tip {
        note_id: String,
        amount: u64,

        #[arg(short, long, default_value = "")]
        message: String,
    },
}

#[derive(Subcommand)]
enum StoreCommand {
    /// Print the whole aggregate, or write it to a file
    Export {
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Replace the stored aggregate with a JSON file
    Import { file: PathBuf },

    /// Delete every stored record
    Clear,
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn open_backend(config: &ScholarConfig) -> Result<Arc<dyn KeyValueStore>> {
    let backend: Arc<dyn KeyValueStore> = match config.storage.backend {
        Backend::Memory => Arc::new(MemoryStore::new()),
        Backend::File => {
            let dir = config.storage.data_dir();
            Arc::new(
                FileStore::open(&dir)
                    .with_context(|| format!("opening file store at {}", dir.display()))?,
            )
        }
        Backend::Sled => {
            let dir = config.storage.data_dir().join("records.sled");
            Arc::new(
                SledStore::open(&dir)
                    .with_context(|| format!("opening sled store at {}", dir.display()))?,
            )
        }
    };
    debug!(backend = ?config.storage.backend, "storage backend opened");
    Ok(backend)
}

/// Wire storage, notifier and accessors together from `config`.
fn open_records(config: &ScholarConfig, backend: Arc<dyn KeyValueStore>) -> Result<Records> {
    let notifier = ChangeNotifier::new(Some(ChangeBus::new(config.notifier.bus_capacity)));
    let options = StoreOptions {
        key: config.storage.key.clone(),
        max_conflict_retries: config.storage.max_conflict_retries,
    };
    let store = RecordStore::new(backend, notifier, options);
    let records = Records::new(Arc::new(store)).with_default_balance(config.tokens.default_balance);

    if config.seed.enabled && records.initialize_defaults()? {
        info!("seeded default peer notes");
    }
    Ok(records)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(command: Commands, services: &ScholarServices) -> Result<()> {
    match command {
        Commands::Course(command) => run_course(command, services).await,
        Commands::Educator(command) => match command {
            EducatorCommand::Create {
                name,
                bio,
                expertise,
            } => print_json(
                &services
                    .course
                    .create_educator_profile(&name, &bio, expertise)
                    .await?,
            ),
            EducatorCommand::Show { principal } => print_json(
                &services
                    .course
                    .get_educator_profile(principal.as_deref())
                    .await?,
            ),
        },
        Commands::Student(command) => run_student(command, services).await,
        Commands::Token(command) => match command {
            TokenCommand::Balance { principal } => {
                print_json(&services.token.get_balance(principal.as_deref()).await?)
            }
            TokenCommand::Transfer { to, amount, memo } => {
                print_json(&services.token.transfer_tokens(&to, amount, &memo).await?)
            }
            TokenCommand::History => print_json(&services.token.get_transaction_history().await?),
            TokenCommand::Mint { to, amount, memo } => {
                print_json(&services.token.mint_tokens(&to, amount, &memo).await?)
            }
            TokenCommand::Supply => print_json(&services.token.get_total_supply().await?),
            TokenCommand::Tip { to, amount, memo } => {
                print_json(&services.token.tip_peer(&to, amount, &memo).await?)
            }
            TokenCommand::Reward {
                student,
                amount,
                course_id,
            } => print_json(
                &services
                    .token
                    .reward_course_completion(&student, amount, &course_id)
                    .await?,
            ),
        },
        Commands::Peer(command) => match command {
            PeerCommand::Note {
                course,
                author_name,
                content,
                note_type,
            } => print_json(
                &services
                    .peer
                    .create_peer_note(&course, &author_name, &content, note_type)
                    .await?,
            ),
            PeerCommand::List { course, mine } => {
                let notes = match course {
                    Some(course) => services.peer.get_course_notes(&course).await?,
                    None if mine => services.peer.get_user_notes().await?,
                    None => services.peer.get_all_notes().await?,
                };
                print_json(&notes)
            }
            PeerCommand::Update { note_id, content } => {
                print_json(&services.peer.update_peer_note(&note_id, &content).await?)
            }
            PeerCommand::Tips { note, recipient } => {
                let tips = match note {
                    Some(note) => services.peer.get_note_tips(&note).await?,
                    None => {
                        services
                            .peer
                            .get_user_tips_received(recipient.as_deref())
                            .await?
                    }
                };
                print_json(&tips)
            }
            PeerCommand::Tip {
                note_id,
                amount,
                message,
            } => print_json(
                &services
                    .peer
                    .tip_peer_note(&note_id, amount, &message)
                    .await?,
            ),
        },
        Commands::Store(command) => run_store(command, services.records()),
    }
}

async fn run_course(command: CourseCommand, services: &ScholarServices) -> Result<()> {
    let course = &services.course;
    match command {
        CourseCommand::Create {
            title,
            description,
            reward,
        } => print_json(&course.create_course(&title, &description, reward).await?),
        CourseCommand::Get { id } => print_json(&course.get_course(&id).await?),
        CourseCommand::List => print_json(&course.get_published_courses().await?),
        CourseCommand::Mine => print_json(&course.get_educator_courses().await?),
        CourseCommand::AddSection {
            course_id,
            title,
            content,
        } => print_json(&course.add_course_section(&course_id, &title, &content).await?),
        CourseCommand::Publish { id } => print_json(&course.publish_course(&id).await?),
    }
}

async fn run_student(command: StudentCommand, services: &ScholarServices) -> Result<()> {
    let student = &services.student;
    match command {
        StudentCommand::Create { name, email, bio } => {
            print_json(&student.create_student_profile(&name, &email, &bio).await?)
        }
        StudentCommand::Update { name, email, bio } => print_json(
            &student
                .update_student_profile(name.as_deref(), email.as_deref(), bio.as_deref())
                .await?,
        ),
        StudentCommand::Profile => print_json(&student.get_student_profile().await?),
        StudentCommand::Enroll { course_id } => {
            print_json(&student.enroll_in_course(&course_id).await?)
        }
        StudentCommand::Enrollments => print_json(&student.get_student_enrollments().await?),
        StudentCommand::CompleteSection {
            course_id,
            section_id,
        } => print_json(
            &student
                .mark_section_complete(&course_id, &section_id)
                .await?,
        ),
        StudentCommand::Complete { course_id, title } => {
            let title = match title {
                Some(title) => title,
                None => services
                    .course
                    .get_course(&course_id)
                    .await?
                    .map(|course| course.title)
                    .unwrap_or_else(|| course_id.clone()),
            };
            print_json(&student.complete_course(&course_id, &title).await?)
        }
        StudentCommand::Certificates => print_json(&student.get_student_certificates().await?),
    }
}

fn run_store(command: StoreCommand, records: &Records) -> Result<()> {
    let store = records.store();
    match command {
        StoreCommand::Export { out: None } => print_json(&store.export()),
        StoreCommand::Export { out: Some(path) } => {
            let json = serde_json::to_string_pretty(&store.export())?;
            std::fs::write(&path, json)
                .with_context(|| format!("writing export to {}", path.display()))?;
            info!(path = %path.display(), "records exported");
            Ok(())
        }
        StoreCommand::Import { file } => {
            let contents = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let aggregate: Aggregate = serde_json::from_str(&contents)
                .with_context(|| format!("parsing {}", file.display()))?;
            store.import(aggregate)?;
            info!(path = %file.display(), "records imported");
            Ok(())
        }
        StoreCommand::Clear => {
            store.clear()?;
            info!("records cleared");
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    init_logging(&config.logging.level);

    let backend = open_backend(&config)?;
    let records = open_records(&config, backend)?;
    let listener = records.store().notifier().spawn_listener();

    let principal = cli
        .principal
        .unwrap_or_else(|| config.identity.principal.clone());
    let options = ServiceOptions {
        default_student_name: config.identity.student_name.clone(),
        include_seed_courses: config.seed.include_courses,
    };
    let services = ScholarServices::new(records, Principal::from(principal), options);

    let result = run(cli.command, &services).await;
    if let Some(listener) = listener {
        listener.abort();
    }
    result
}
