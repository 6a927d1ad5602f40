use std::path::PathBuf;

use anyhow::Context as _;
use arrow::util::pretty::pretty_format_batches;
use arrow_array::RecordBatch;
use clap::{Parser, Subcommand, ValueEnum};
use snowlib::config::{load_from_env, load_profile};
use snowlib::execute::Executor;
use snowlib::models::{Scope, ShowFilter, show_sql};
use snowlib::observability::init_logging;
use snowlib::{
    ConnectionOverrides, Database, DynamicTable, Fqn, MaterializedView, Schema, SchemaChild,
    Session, SnowflakeObject, Stage, Table, View, connection_url, list_profiles,
};

#[derive(Parser, Debug)]
#[command(name = "snowlib")]
#[command(about = "Run statements and inspect objects through Snowflake connection profiles", long_about = None)]
#[command(version)]
struct Args {
    /// Path to connections.toml
    #[arg(short, long, env = "SNOWLIB_CONFIG")]
    config: Option<PathBuf>,

    /// Profile to connect with
    #[arg(short, long, default_value = "default", env = "SNOWLIB_PROFILE")]
    profile: String,

    /// Override the profile's warehouse
    #[arg(long)]
    warehouse: Option<String>,

    /// Override the profile's role
    #[arg(long)]
    role: Option<String>,

    /// Override the profile's database
    #[arg(long)]
    database: Option<String>,

    /// Override the profile's schema
    #[arg(long)]
    schema: Option<String>,

    /// Log level used when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Enable JSON logging output
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List profile names
    Profiles,
    /// Print the snowflake:// URL for the profile
    Url,
    /// Run a query and print its rows
    Query {
        sql: String,
        /// Keep column names as Snowflake reports them
        #[arg(long)]
        keep_case: bool,
    },
    /// Run statements and print row counts
    Exec {
        sql: String,
        /// Treat the input as several `;`-separated statements
        #[arg(long)]
        block: bool,
    },
    /// List objects with SHOW
    Show {
        /// Plural object keyword, e.g. TABLES or "DYNAMIC TABLES"
        plural: String,
        #[arg(long, conflicts_with = "in_schema")]
        in_database: Option<String>,
        /// `database.schema`
        #[arg(long)]
        in_schema: Option<String>,
        #[arg(long)]
        like: Option<String>,
        #[arg(long)]
        starts_with: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Describe an object
    Describe {
        kind: ObjectKind,
        /// Name, qualified as far as the session cannot fill in
        name: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ObjectKind {
    Database,
    Schema,
    Table,
    View,
    MaterializedView,
    DynamicTable,
    Stage,
}

impl Args {
    fn overrides(&self) -> ConnectionOverrides {
        let mut overrides = ConnectionOverrides::new();
        if let Some(warehouse) = &self.warehouse {
            overrides = overrides.warehouse(warehouse);
        }
        if let Some(role) = &self.role {
            overrides = overrides.role(role);
        }
        if let Some(database) = &self.database {
            overrides = overrides.database(database);
        }
        if let Some(schema) = &self.schema {
            overrides = overrides.schema(schema);
        }
        load_from_env(overrides)
    }

    fn session(&self) -> anyhow::Result<Session> {
        Session::from_profile(&self.profile, self.config.as_deref(), self.overrides())
            .with_context(|| format!("Failed to load profile '{}'", self.profile))
    }
}

fn print_batch(batch: &RecordBatch) -> anyhow::Result<()> {
    println!("{}", pretty_format_batches(std::slice::from_ref(batch))?);
    Ok(())
}

async fn describe(session: &Session, kind: ObjectKind, name: &str) -> snowlib::Result<RecordBatch> {
    match kind {
        ObjectKind::Database => session.database(name)?.describe().await,
        ObjectKind::Schema => session.schema(name).await?.describe().await,
        ObjectKind::Table => describe_child::<Table>(session, name).await,
        ObjectKind::View => describe_child::<View>(session, name).await,
        ObjectKind::MaterializedView => describe_child::<MaterializedView>(session, name).await,
        ObjectKind::DynamicTable => describe_child::<DynamicTable>(session, name).await,
        ObjectKind::Stage => describe_child::<Stage>(session, name).await,
    }
}

async fn describe_child<T: SchemaChild>(session: &Session, name: &str) -> snowlib::Result<RecordBatch> {
    session.object::<T>(name).await?.describe().await
}

async fn run(command: &Command, session: &Session) -> anyhow::Result<()> {
    match command {
        Command::Profiles | Command::Url => {}
        Command::Query { sql, keep_case } => {
            let batch = session
                .execute_sql(sql, &[])
                .await?
                .to_batch(!keep_case)
                .await?;
            print_batch(&batch)?;
        }
        Command::Exec { sql, block } => {
            let results = if *block {
                session.execute_block(sql).await?
            } else {
                vec![session.execute_sql(sql, &[]).await?]
            };
            for result in &results {
                println!("{}\t{}", result.query_id(), result.rowcount());
            }
        }
        Command::Show {
            plural,
            in_database,
            in_schema,
            like,
            starts_with,
            limit,
        } => {
            let scope = match (in_database, in_schema) {
                (Some(database), _) => Some(Scope::new(Database::OBJECT_TYPE, Fqn::parse(database)?)),
                (None, Some(schema)) => Some(Scope::new(Schema::OBJECT_TYPE, Fqn::parse(schema)?)),
                (None, None) => None,
            };
            let mut filter = ShowFilter::default();
            if let Some(like) = like {
                filter = filter.like(like);
            }
            if let Some(prefix) = starts_with {
                filter = filter.starts_with(prefix);
            }
            if let Some(limit) = limit {
                filter = filter.limit(*limit);
            }

            let sql = show_sql(&plural.to_uppercase(), scope.as_ref(), &filter);
            let batch = Executor::new(session.context().clone())
                .run_with_result_scan(&sql, &[])
                .await?
                .to_batch(true)
                .await?;
            print_batch(&batch)?;
        }
        Command::Describe { kind, name } => {
            print_batch(&describe(session, *kind, name).await?)?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level, args.json_logs)?;

    match &args.command {
        Command::Profiles => {
            for profile in list_profiles(args.config.as_deref())? {
                println!("{profile}");
            }
            return Ok(());
        }
        Command::Url => {
            let mut profile = load_profile(&args.profile, args.config.as_deref())?;
            args.overrides().apply(&mut profile);
            println!("{}", connection_url(&profile)?);
            return Ok(());
        }
        _ => {}
    }

    let session = args.session()?;
    let outcome = run(&args.command, &session).await;
    session.close().await?;
    outcome
}
