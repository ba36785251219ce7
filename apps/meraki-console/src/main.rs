use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use console_kit::{
    ApiError, Key, Labeled, ListStatus, Notifier, Session, TracingNotifier, Typeahead,
    TypeaheadBuilder,
};
use meraki_os::{lookups, screens, AuthApi, EntityKind, ListScreen, MerakiApi};
use query_core::PagedResult;
use runtime::{CliArgs, ConsoleConfig};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::task::JoinHandle;

/// Meraki OS console - list, inspect and manage service-order records
#[derive(Parser)]
#[command(name = "meraki-console")]
#[command(about = "Meraki OS console - list, inspect and manage service-order records")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// API base URL (overrides config)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Bearer token sent with every request (overrides config)
    #[arg(long, global = true)]
    token: Option<String>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check configuration
    Check,
    /// Fetch one page of a resource list
    List(ListArgs),
    /// Fetch one record by id
    Get { resource: EntityKind, id: String },
    /// Search units or items the way the form pickers do
    Lookup {
        kind: LookupKind,
        term: String,
        /// Pick the first match, as pressing Enter does
        #[arg(long)]
        select_first: bool,
    },
    /// Flip the active flag of one record
    Toggle { resource: EntityKind, id: String },
    /// Log in and print the issued token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
}

#[derive(Args)]
struct ListArgs {
    resource: EntityKind,

    #[arg(long)]
    page: Option<u32>,

    #[arg(long)]
    page_size: Option<u32>,

    /// Sort field
    #[arg(long)]
    sort: Option<String>,

    /// Sort descending
    #[arg(long, requires = "sort")]
    desc: bool,

    /// Search field (value or label of the screen's picker)
    #[arg(long)]
    search_by: Option<String>,

    #[arg(long)]
    search_term: Option<String>,

    /// Status picker value (e.g. 1/0 for active/inactive, all)
    #[arg(long)]
    status: Option<String>,

    /// Filter entry, repeatable
    #[arg(long = "filter", value_name = "KEY=VALUE", value_parser = parse_filter)]
    filters: Vec<(String, String)>,
}

#[derive(Clone, Copy, ValueEnum)]
enum LookupKind {
    Unidades,
    Itens,
}

fn parse_filter(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((k, v)) if !k.trim().is_empty() => Ok((k.trim().to_string(), v.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", user_message(&err));
            ExitCode::FAILURE
        }
    }
}

/// API failures print their user-facing text; anything else its full chain.
fn user_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<ApiError>() {
        Some(api) => api.user_message(),
        None => format!("{err:#}"),
    }
}

async fn run(cli: Cli) -> Result<()> {
    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        base_url: cli.base_url.clone(),
        token: cli.token.clone(),
        print_config: cli.print_config,
        verbose: cli.verbose,
    };

    let mut config = ConsoleConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);
    config.validate()?;

    let logging_config = config.logging.clone().unwrap_or_default();
    runtime::init_logging_from_config(&logging_config, &config.home_path());
    tracing::debug!(base_url = %config.api.base_url, "meraki-console starting");

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    let command = cli.command.unwrap_or(Commands::Check);
    if matches!(command, Commands::Check) {
        return check_config(&config);
    }

    let api = MerakiApi::from_config(&config, Session::new())?;
    match command {
        Commands::Check => check_config(&config),
        Commands::List(list) => list_command(&api, &config, list).await,
        Commands::Get { resource, id } => get_command(&api, resource, &id).await,
        Commands::Lookup {
            kind,
            term,
            select_first,
        } => match kind {
            LookupKind::Unidades => {
                lookup_command(lookups::unidade_picker(&api, &config), &term, select_first).await
            }
            LookupKind::Itens => {
                lookup_command(lookups::item_picker(&api, &config), &term, select_first).await
            }
        },
        Commands::Toggle { resource, id } => toggle_command(&api, resource, &id).await,
        Commands::Login { email, password } => {
            let auth = AuthApi::for_api(&api);
            let resp = auth.login(&email, &password).await?;
            println!("{}", resp.token);
            Ok(())
        }
    }
}

fn check_config(config: &ConsoleConfig) -> Result<()> {
    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("{}", config.to_yaml()?);
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn list_command(api: &MerakiApi, config: &ConsoleConfig, args: ListArgs) -> Result<()> {
    let page_size = args.page_size.unwrap_or(config.lists.page_size);
    match args.resource {
        EntityKind::Cliente => list_screen(api, screens::clientes(), page_size, &args).await,
        EntityKind::Item => list_screen(api, screens::itens(), page_size, &args).await,
        EntityKind::Servico => list_screen(api, screens::servicos(), page_size, &args).await,
        EntityKind::Unidade => list_screen(api, screens::unidades(), page_size, &args).await,
        EntityKind::Estoque => list_screen(api, screens::estoques(), page_size, &args).await,
        EntityKind::Os => list_screen(api, screens::ordens(), page_size, &args).await,
    }
}

async fn list_screen<E>(
    api: &MerakiApi,
    screen: ListScreen<E>,
    page_size: u32,
    args: &ListArgs,
) -> Result<()>
where
    E: Serialize + Clone + Send + Sync + 'static,
{
    let screen = screen.with_page_size(page_size);
    let notifier: Arc<dyn Notifier> = Arc::new(TracingNotifier);
    let ctl = screen.mount(api, notifier);

    let mut pending: Vec<JoinHandle<()>> = Vec::new();
    if args.search_term.is_some() || args.status.is_some() {
        let field = match args.search_by.as_deref() {
            Some(name) => screen
                .search_field(name)
                .map(|f| f.value.to_string())
                .unwrap_or_else(|| name.to_string()),
            None => screen.default_search_field().unwrap_or_default().to_string(),
        };
        pending.push(screen.search(
            &ctl,
            &field,
            args.search_term.as_deref().unwrap_or_default(),
            args.status.as_deref(),
        ));
    }
    for (key, value) in &args.filters {
        pending.push(ctl.set_filter(key.clone(), value.clone()));
    }
    if let Some(field) = &args.sort {
        pending.push(ctl.set_sort(field.clone()));
        if args.desc {
            pending.push(ctl.set_sort(field.clone()));
        }
    }
    if let Some(page) = args.page {
        pending.push(ctl.set_page(page));
    }
    for handle in pending {
        handle.await.context("list fetch task failed")?;
    }

    let state = ctl.settled().await;
    ctl.close();
    if state.status == ListStatus::Failed {
        let detail = state.error.unwrap_or_default();
        bail!("{} {detail}", screen.failure_message);
    }

    let page = PagedResult {
        items: state.items,
        total_count: state.total_count,
        page_number: state.params.page_number(),
        page_size: state.params.page_size(),
        total_pages: state.total_pages,
    };
    print_json(&page)
}

async fn get_command(api: &MerakiApi, kind: EntityKind, id: &str) -> Result<()> {
    match kind {
        EntityKind::Cliente => get_one(&*api.clientes, id).await,
        EntityKind::Item => get_one(&*api.itens, id).await,
        EntityKind::Servico => get_one(&*api.servicos, id).await,
        EntityKind::Unidade => get_one(&*api.unidades, id).await,
        EntityKind::Estoque => get_one(&*api.estoques, id).await,
        EntityKind::Os => get_one(&*api.ordens, id).await,
    }
}

async fn get_one<E, D>(resource: &console_kit::RestResource<E, D>, id: &str) -> Result<()>
where
    E: DeserializeOwned + Serialize,
    D: Serialize + console_kit::Validate,
{
    let entity = resource.buscar_por_id(id).await?;
    print_json(&entity)
}

async fn toggle_command(api: &MerakiApi, kind: EntityKind, id: &str) -> Result<()> {
    match kind {
        EntityKind::Item => api.itens.ativar_inativar(id).await?,
        EntityKind::Servico => api.servicos.ativar_inativar(id).await?,
        EntityKind::Estoque => api.estoques.ativar_inativar(id).await?,
        other => bail!("{other} does not support AtivarInativar"),
    }
    println!("{} {id} atualizado.", kind.names().singular);
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PanelOutput<'a, T> {
    text: &'a str,
    page: u32,
    total_pages: u32,
    no_results: bool,
    results: Vec<ResultRow<'a, T>>,
}

#[derive(Serialize)]
struct ResultRow<'a, T> {
    label: String,
    #[serde(flatten)]
    item: &'a T,
}

async fn lookup_command<T>(builder: TypeaheadBuilder<T>, term: &str, select_first: bool) -> Result<()>
where
    T: Labeled + Serialize + Clone + Send + Sync + 'static,
{
    let picker: Typeahead<T> = builder.build();
    let typed = picker.input(term);

    let handle = if select_first {
        picker.key(Key::Enter)
    } else {
        typed
    };
    if let Some(handle) = handle {
        // A superseded search reports as cancelled.
        if let Err(err) = handle.await {
            if !err.is_cancelled() {
                return Err(anyhow!(err).context("lookup task failed"));
            }
        }
    }

    let view = picker.view();
    if select_first {
        return match view.selected {
            Some(item) => print_json(&item),
            None => bail!("Nenhum resultado encontrado para '{term}'."),
        };
    }

    print_json(&PanelOutput {
        text: &view.text,
        page: view.page,
        total_pages: view.total_pages,
        no_results: view.shows_no_results(),
        results: view
            .results
            .iter()
            .map(|item| ResultRow {
                label: item.label(),
                item,
            })
            .collect(),
    })
}
