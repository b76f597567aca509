use clap::Parser;
use tracing_subscriber::EnvFilter;

use sheetlens::cli::{self, Cli, Commands, RecentCommands, TemplateCommands};

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::builder().from_env_lossy()
    } else {
        EnvFilter::builder().parse_lossy(format!("sheetlens={level}"))
    };
    let _ = tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::new(
            "%Y-%m-%d %H:%M:%S%.3f".to_string(),
        ))
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Load { file, sheet, name } => {
            cli::load::run(&file, sheet.as_deref(), name.as_deref())
        }
        Commands::Sheets { file } => cli::load::sheets(&file),
        Commands::Columns { dataset } => cli::columns::run(&dataset),
        Commands::View {
            dataset,
            view,
            page,
            per_page,
        } => cli::view::records(&dataset, &view, page, per_page),
        Commands::Chart { dataset, view } => cli::view::chart(&dataset, &view),
        Commands::Insights { dataset, view } => cli::view::insights(&dataset, &view),
        Commands::Export {
            dataset,
            view,
            format,
            output,
        } => cli::export::run(&dataset, &view, format, output),
        Commands::History => cli::export::history(),
        Commands::Recent { command } => match command {
            RecentCommands::List { search } => cli::recent::list(search.as_deref()),
            RecentCommands::Pin { name } => cli::recent::pin(&name, true),
            RecentCommands::Unpin { name } => cli::recent::pin(&name, false),
            RecentCommands::Remove { name } => cli::recent::remove(&name),
        },
        Commands::Template { command } => match command {
            TemplateCommands::Save {
                name,
                view,
                chart_type,
                title,
            } => cli::template::save(&name, &view, chart_type, title),
            TemplateCommands::List => cli::template::list(),
            TemplateCommands::Show { name } => cli::template::show(&name),
            TemplateCommands::Remove { name } => cli::template::remove(&name),
            TemplateCommands::Export { name, output } => cli::template::export(&name, output),
        },
        Commands::Reset => cli::status::reset(),
        Commands::Status => cli::status::run(),
        Commands::Config {
            data_dir,
            top_n,
            recent_limit,
            rows_per_page,
        } => cli::status::config(data_dir, top_n, recent_limit, rows_per_page),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
