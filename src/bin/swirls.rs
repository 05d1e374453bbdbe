// src/bin/swirls.rs

use std::{process::ExitCode, sync::Arc};

use anyhow::{anyhow, Result};
use chrono::{DateTime, Local, NaiveDate, Utc};
use clap::{ArgAction, Args, Parser, Subcommand};
use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Serialize};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use sweet_swirls::{
    client::{
        auth::AuthContext,
        forms::FormErrors,
        pages::{
            format_quantity, item_card, navigation, request_actions, route_access,
            session_notice, ActionError, DashboardPage, InventoryPage, PageState, ProductionPage,
            RouteDecision, SessionsPage, WastePage,
        },
        ApiClient, ClientConfig, ClientError, FileStorage, Session,
    },
    models::{
        auth::{CreateUserRequest, LoginRequest, Role},
        inventory::{
            AddSessionLineRequest, InventoryCategory, InventoryItemRequest, InventorySnapshot,
            RecordSnapshotRequest,
        },
        location::LocationType,
        production::{
            CreateBatchRequest, CreateProductionRequestRequest, Priority, RecordWasteRequest,
            RequestStatus, WasteReason,
        },
    },
};

const LOGIN_HINT: &str = "You are not logged in. Run `swirls login --email <email> --password <password>`.";

#[derive(Parser)]
#[command(name = "swirls", about = "Sweet Swirls operations from the terminal", version)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON when available"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Login(LoginArgs),
    Logout,
    Whoami,
    Dashboard,
    #[command(subcommand)]
    Inventory(InventoryCommands),
    #[command(subcommand)]
    Sessions(SessionCommands),
    #[command(subcommand)]
    Snapshots(SnapshotCommands),
    #[command(subcommand)]
    Production(ProductionCommands),
    #[command(subcommand)]
    Waste(WasteCommands),
    #[command(subcommand)]
    Users(UserCommands),
    Locations {
        #[arg(long = "type", value_parser = parse_enum::<LocationType>, help = "SHOP, TRUCK, FREEZER or STORAGE")]
        kind: Option<LocationType>,
    },
}

#[derive(Args)]
struct LoginArgs {
    #[arg(long, help = "Email address for the account")]
    email: String,
    #[arg(long, help = "Password for the account")]
    password: String,
}

#[derive(Subcommand)]
enum InventoryCommands {
    List {
        #[arg(long, help = "Filter by name, SKU or category")]
        search: Option<String>,
    },
    Add(ItemArgs),
    Update {
        id: Uuid,
        #[command(flatten)]
        item: ItemArgs,
    },
    Delete { id: Uuid },
    Stock {
        #[arg(long)]
        location: Option<Uuid>,
        #[arg(long, action = ArgAction::SetTrue, help = "Only entries below par")]
        below_par: bool,
    },
}

#[derive(Args)]
struct ItemArgs {
    #[arg(long)]
    name: String,
    #[arg(long, value_parser = parse_enum::<InventoryCategory>, help = "BASE, MIX_IN, PACKAGING or BEVERAGE")]
    category: InventoryCategory,
    #[arg(long)]
    unit: String,
    #[arg(long)]
    par: Decimal,
    #[arg(long)]
    sku: Option<String>,
    #[arg(long)]
    notes: Option<String>,
    #[arg(long)]
    location: Option<Uuid>,
}

impl ItemArgs {
    fn into_request(self) -> InventoryItemRequest {
        InventoryItemRequest {
            name: self.name,
            category: self.category,
            unit: self.unit,
            par_stock_level: self.par,
            default_location_id: self.location,
            sku: self.sku,
            notes: self.notes,
        }
    }
}

#[derive(Subcommand)]
enum SessionCommands {
    List,
    Start {
        #[arg(long)]
        location: Uuid,
    },
    Show { id: Uuid },
    AddLine {
        session: Uuid,
        #[arg(long)]
        item: Uuid,
        #[arg(long)]
        count: Decimal,
        #[arg(long)]
        unit: String,
        #[arg(long)]
        note: Option<String>,
    },
    Close {
        session: Uuid,
        #[arg(long)]
        notes: Option<String>,
    },
}

#[derive(Subcommand)]
enum SnapshotCommands {
    #[command(about = "Latest snapshot of each item")]
    Current,
    History { item: Uuid },
    Record {
        #[arg(long)]
        item: Uuid,
        #[arg(long)]
        quantity: Decimal,
    },
    #[command(about = "Minutes with recorded snapshots")]
    Minutes,
    Minute {
        #[arg(help = "Any instant inside the minute, RFC 3339")]
        at: DateTime<Utc>,
    },
}

#[derive(Subcommand)]
enum ProductionCommands {
    Requests,
    Request(RequestArgs),
    Transition {
        id: Uuid,
        #[arg(value_parser = parse_enum::<RequestStatus>, help = "IN_PROGRESS, COMPLETED or ARCHIVED")]
        status: RequestStatus,
    },
    DeleteRequest { id: Uuid },
    Batches,
    Batch(BatchArgs),
    CompleteBatch { id: Uuid },
    RunOut { id: Uuid },
}

#[derive(Args)]
struct RequestArgs {
    #[arg(long)]
    item: Uuid,
    #[arg(long)]
    location: Uuid,
    #[arg(long, help = "Date the product is needed by (YYYY-MM-DD)")]
    needed_by: NaiveDate,
    #[arg(long)]
    quantity: Decimal,
    #[arg(long)]
    unit: String,
    #[arg(long, value_parser = parse_enum::<Priority>, default_value = "NORMAL")]
    priority: Priority,
    #[arg(long)]
    reason: String,
}

#[derive(Args)]
struct BatchArgs {
    #[arg(long)]
    item: Uuid,
    #[arg(long)]
    quantity: Decimal,
    #[arg(long)]
    unit: String,
    #[arg(long, help = "Freezer or storage location")]
    storage: Uuid,
    #[arg(long)]
    notes: Option<String>,
}

#[derive(Subcommand)]
enum WasteCommands {
    List,
    Record {
        #[arg(long)]
        item: Uuid,
        #[arg(long)]
        batch: Option<Uuid>,
        #[arg(long)]
        quantity: Decimal,
        #[arg(long)]
        unit: String,
        #[arg(long, value_parser = parse_enum::<WasteReason>)]
        reason: WasteReason,
        #[arg(long)]
        notes: Option<String>,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    List,
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, value_parser = parse_enum::<Role>)]
        role: Role,
    },
    Deactivate { id: Uuid },
    Activate { id: Uuid },
}

// Os enums do modelo já sabem se desserializar de "MIX_IN", "HIGH"...
fn parse_enum<T: DeserializeOwned>(value: &str) -> Result<T, String> {
    let normalized = value.trim().to_uppercase().replace('-', "_");
    serde_json::from_value(serde_json::Value::String(normalized))
        .map_err(|_| format!("unknown value '{value}'"))
}

struct CliContext {
    api: ApiClient,
    auth: AuthContext,
    json: bool,
}

impl CliContext {
    // Mesmas regras de acesso das telas
    fn guard(&self, path: &str) -> Result<()> {
        match route_access(path, self.api.session()) {
            RouteDecision::Allow => Ok(()),
            RouteDecision::Redirect("/login") => Err(anyhow!(LOGIN_HINT)),
            RouteDecision::Redirect(_) => Err(anyhow!("Your role does not have access to {path}.")),
        }
    }

    fn output<T: Serialize>(&self, value: &T, render: impl FnOnce(&T)) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            render(value);
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = ClientConfig::from_env();
    let session = Arc::new(Session::hydrate(FileStorage::new(&config.session_file)));
    let api = ApiClient::new(&config, session)?;
    let context = CliContext { auth: AuthContext::new(api.clone()), api, json: cli.json };

    match cli.command {
        Commands::Login(args) => login(&context, args).await,
        Commands::Logout => {
            context.auth.logout();
            println!("Logged out.");
            Ok(())
        }
        Commands::Whoami => whoami(&context),
        Commands::Dashboard => {
            context.guard("/dashboard")?;
            dashboard(&context).await
        }
        Commands::Inventory(command) => {
            context.guard("/inventory")?;
            inventory(&context, command).await
        }
        Commands::Sessions(command) => {
            context.guard("/inventory/sessions")?;
            sessions(&context, command).await
        }
        Commands::Snapshots(command) => {
            context.guard("/inventory")?;
            snapshots(&context, command).await
        }
        Commands::Production(command) => {
            context.guard("/production")?;
            production(&context, command).await
        }
        Commands::Waste(command) => {
            context.guard("/production/waste")?;
            waste(&context, command).await
        }
        Commands::Users(command) => {
            context.guard("/users")?;
            users(&context, command).await
        }
        Commands::Locations { kind } => {
            context.guard("/inventory")?;
            let locations = context
                .api
                .list_locations(kind)
                .await
                .map_err(client_failed("load", "locations"))?;
            context.output(&locations, |locations| {
                for location in locations {
                    println!("- {} • {} • {}", location.name, location.location_type, location.id);
                }
            })
        }
    }
}

// ---
// Conversão de erros para mensagens de terminal
// ---

fn client_failed(action: &'static str, subject: &'static str) -> impl Fn(ClientError) -> anyhow::Error {
    move |e| match e {
        ClientError::Unauthorized => anyhow!(LOGIN_HINT),
        e => anyhow!(e.user_message(action, subject)),
    }
}

fn action_failed(err: ActionError) -> anyhow::Error {
    match err {
        ActionError::Form(errors) => anyhow!(render_form_errors(&errors)),
        ActionError::Failed(message) => anyhow!(message),
        ActionError::RedirectToLogin => anyhow!(LOGIN_HINT),
    }
}

fn render_form_errors(errors: &FormErrors) -> String {
    let mut out = String::from("Please fix the following fields:");
    for (field, message) in errors.fields() {
        out.push_str(&format!("\n  {field}: {message}"));
    }
    out
}

fn ready<T>(state: &PageState<T>) -> Result<&T> {
    match state {
        PageState::Ready(data) => Ok(data),
        PageState::Failed(message) => Err(anyhow!(message.clone())),
        PageState::RedirectToLogin => Err(anyhow!(LOGIN_HINT)),
        PageState::Loading => Err(anyhow!("Still loading.")),
    }
}

// ---
// Comandos
// ---

async fn login(context: &CliContext, args: LoginArgs) -> Result<()> {
    let credentials = LoginRequest { email: args.email, password: args.password };
    let user = context.auth.login(&credentials).await.map_err(|e| match e {
        ClientError::InvalidCredentials => anyhow!("Invalid email or password"),
        e => anyhow!(e.user_message("log", "in")),
    })?;

    context.output(&user, |user| {
        println!("Welcome, {} ({})", user.name, user.role);
        let menu: Vec<_> = navigation(Some(user)).iter().map(|n| n.label).collect();
        println!("Available: {}", menu.join(" · "));
    })
}

fn whoami(context: &CliContext) -> Result<()> {
    let user = context.auth.user().ok_or_else(|| anyhow!(LOGIN_HINT))?;
    context.output(&user, |user| {
        println!("{} <{}> • {}", user.name, user.email, user.role);
    })
}

async fn dashboard(context: &CliContext) -> Result<()> {
    let now = Local::now().fixed_offset();
    let mut page = DashboardPage::new(context.api.clone());
    page.load(now).await;
    let data = ready(&page.state)?;

    context.output(data, |data| {
        println!("{}", page.headline(now));
        println!();
        println!("Low stock items: {}", data.low_stock_items.len());
        for entry in &data.low_stock_items {
            if let Some(item) = &entry.item {
                println!(
                    "  - {}: {} (par {})",
                    item.name,
                    format_quantity(entry.quantity, &item.unit),
                    format_quantity(item.par_stock_level, &item.unit)
                );
            }
        }
        println!("Open requests: {}", data.open_requests.len());
        println!("Today's batches: {}", data.todays_batches.len());
        for batch in &data.todays_batches {
            println!("  - {} • {} • {}", batch.lot_code, format_quantity(batch.quantity_made, &batch.unit), batch.status);
        }
        println!("Recent waste: {}", data.recent_waste.len());
    })
}

async fn inventory(context: &CliContext, command: InventoryCommands) -> Result<()> {
    let mut page = InventoryPage::new(context.api.clone());
    match command {
        InventoryCommands::List { search } => {
            page.load().await;
            ready(&page.state)?;
            let items = page.search(search.as_deref().unwrap_or_default());
            context.output(&items, |items| {
                if items.is_empty() {
                    println!("No inventory items found.");
                }
                for item in items {
                    println!("{}", item_card(item));
                }
            })
        }
        InventoryCommands::Add(args) => {
            let item = page.create(&args.into_request()).await.map_err(action_failed)?;
            context.output(&item, |item| println!("Created:\n{}", item_card(item)))
        }
        InventoryCommands::Update { id, item } => {
            let item = page.update(id, &item.into_request()).await.map_err(action_failed)?;
            context.output(&item, |item| println!("Updated:\n{}", item_card(item)))
        }
        InventoryCommands::Delete { id } => {
            page.delete(id).await.map_err(action_failed)?;
            println!("Item {id} deactivated.");
            Ok(())
        }
        InventoryCommands::Stock { location, below_par } => {
            let stock = if below_par {
                context.api.below_par(location).await
            } else {
                context.api.current_stock(location).await
            }
            .map_err(client_failed("load", "current stock"))?;

            context.output(&stock, |stock| {
                for entry in stock {
                    let (name, unit) = entry
                        .item
                        .as_ref()
                        .map(|i| (i.name.as_str(), i.unit.as_str()))
                        .unwrap_or(("?", ""));
                    let location = entry.location.as_ref().map(|l| l.name.as_str()).unwrap_or("?");
                    let flag = if entry.is_below_par() { "  ⚠ below par" } else { "" };
                    println!("- {name} @ {location}: {}{flag}", format_quantity(entry.quantity, unit));
                }
            })
        }
    }
}

async fn sessions(context: &CliContext, command: SessionCommands) -> Result<()> {
    let mut page = SessionsPage::new(context.api.clone());
    page.load().await;
    ready(&page.state)?;

    match command {
        SessionCommands::List => context.output(&page.sessions().to_vec(), |sessions| {
            for session in sessions {
                println!(
                    "- {} • {} • {} • started {}",
                    session.id,
                    page.location_name(session.location_id).unwrap_or("?"),
                    session.status,
                    session.started_at.format("%Y-%m-%d %H:%M")
                );
            }
        }),
        SessionCommands::Start { location } => {
            let session = page.start(location).await.map_err(action_failed)?;
            context.output(&session, |s| println!("Session {} started (DRAFT).", s.id))
        }
        SessionCommands::Show { id } => {
            let session = page.open(id).await.map_err(action_failed)?.clone();
            context.output(&session, |session| {
                println!("Session {} • {}", session.id, session.status);
                if let Some(notice) = session_notice(session) {
                    println!("{notice}");
                }
                for line in &session.lines {
                    println!(
                        "  - {}: {}",
                        page.item_name(line.item_id).unwrap_or("?"),
                        format_quantity(line.count, &line.unit)
                    );
                }
            })
        }
        SessionCommands::AddLine { session, item, count, unit, note } => {
            page.open(session).await.map_err(action_failed)?;
            let form = AddSessionLineRequest { item_id: item, count, unit, note, photo_url: None };
            let line = page.add_line(&form).await.map_err(action_failed)?;
            context.output(&line, |line| {
                println!("Counted {}.", format_quantity(line.count, &line.unit));
            })
        }
        SessionCommands::Close { session, notes } => {
            page.open(session).await.map_err(action_failed)?;
            let closed = page.close(notes).await.map_err(action_failed)?;
            context.output(&closed, |s| {
                println!("Session {} closed with {} line(s). Current stock updated.", s.id, s.lines.len());
            })
        }
    }
}

fn print_snapshots(snapshots: &Vec<InventorySnapshot>) {
    for snapshot in snapshots {
        let (name, unit) = snapshot
            .item
            .as_ref()
            .map(|item| (item.name.as_str(), item.unit.as_str()))
            .unwrap_or(("(unknown item)", ""));
        println!(
            "- {} • {} • {}",
            snapshot.recorded_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
            name,
            format_quantity(snapshot.quantity, unit)
        );
    }
}

async fn snapshots(context: &CliContext, command: SnapshotCommands) -> Result<()> {
    let api = &context.api;
    match command {
        SnapshotCommands::Current => {
            let snapshots = api.current_snapshots().await.map_err(client_failed("load", "snapshots"))?;
            context.output(&snapshots, print_snapshots)
        }
        SnapshotCommands::History { item } => {
            let snapshots = api.item_snapshots(item).await.map_err(client_failed("load", "snapshots"))?;
            context.output(&snapshots, print_snapshots)
        }
        SnapshotCommands::Record { item, quantity } => {
            let snapshot = api
                .record_snapshot(&RecordSnapshotRequest { item_id: item, quantity })
                .await
                .map_err(client_failed("record", "snapshot"))?;
            context.output(&snapshot, |s| println!("Snapshot recorded at {}.", s.recorded_at))
        }
        SnapshotCommands::Minutes => {
            let minutes = api.snapshot_minutes().await.map_err(client_failed("load", "snapshots"))?;
            context.output(&minutes, |minutes| {
                for minute in minutes {
                    println!("- {}", minute.with_timezone(&Local).format("%Y-%m-%d %H:%M"));
                }
            })
        }
        SnapshotCommands::Minute { at } => {
            let snapshots = api.snapshots_in_minute(at).await.map_err(client_failed("load", "snapshots"))?;
            context.output(&snapshots, print_snapshots)
        }
    }
}

async fn production(context: &CliContext, command: ProductionCommands) -> Result<()> {
    let mut page = ProductionPage::new(context.api.clone());
    match command {
        ProductionCommands::Requests => {
            page.load().await;
            let data = ready(&page.state)?;
            context.output(&data.requests, |requests| {
                for request in requests {
                    let actions: Vec<_> = request_actions(request).iter().map(|s| s.as_str()).collect();
                    println!(
                        "- {} • {} • {} • {} • needed by {} • next: {}",
                        request.id,
                        request.status,
                        request.priority,
                        format_quantity(request.target_quantity, &request.unit),
                        request.needed_by.format("%Y-%m-%d"),
                        if actions.is_empty() { "-".to_string() } else { actions.join(", ") }
                    );
                }
            })
        }
        ProductionCommands::Request(args) => {
            let needed_by = end_of_day(args.needed_by)?;
            let form = CreateProductionRequestRequest {
                product_item_id: args.item,
                location_id: args.location,
                needed_by,
                target_quantity: args.quantity,
                unit: args.unit,
                priority: args.priority,
                reason: args.reason,
            };
            let request = page.create_request(&form, Utc::now()).await.map_err(action_failed)?;
            context.output(&request, |r| println!("Request {} created ({}).", r.id, r.status))
        }
        ProductionCommands::Transition { id, status } => {
            let request = page.transition_request(id, status).await.map_err(action_failed)?;
            context.output(&request, |r| println!("Request {} is now {}.", r.id, r.status))
        }
        ProductionCommands::DeleteRequest { id } => {
            page.delete_request(id).await.map_err(action_failed)?;
            println!("Request {id} deleted.");
            Ok(())
        }
        ProductionCommands::Batches => {
            page.load().await;
            let data = ready(&page.state)?;
            context.output(&data.batches, |batches| {
                for batch in batches {
                    println!(
                        "- {} • lot {} • {} • {}",
                        batch.id,
                        batch.lot_code,
                        format_quantity(batch.quantity_made, &batch.unit),
                        batch.status
                    );
                }
            })
        }
        ProductionCommands::Batch(args) => {
            let form = CreateBatchRequest {
                product_item_id: args.item,
                quantity_made: args.quantity,
                unit: args.unit,
                storage_location_id: args.storage,
                notes: args.notes,
            };
            let batch = page.create_batch(&form).await.map_err(action_failed)?;
            context.output(&batch, |b| println!("Batch recorded with lot {}.", b.lot_code))
        }
        ProductionCommands::CompleteBatch { id } => {
            let batch = page.complete_batch(id).await.map_err(action_failed)?;
            context.output(&batch, |b| println!("Lot {} completed.", b.lot_code))
        }
        ProductionCommands::RunOut { id } => {
            let batch = page.run_out_batch(id).await.map_err(action_failed)?;
            context.output(&batch, |b| println!("Lot {} marked as run out.", b.lot_code))
        }
    }
}

fn end_of_day(date: NaiveDate) -> Result<DateTime<Utc>> {
    date.and_hms_opt(23, 59, 59)
        .map(|dt| dt.and_utc())
        .ok_or_else(|| anyhow!("invalid date {date}"))
}

async fn waste(context: &CliContext, command: WasteCommands) -> Result<()> {
    let mut page = WastePage::new(context.api.clone());
    match command {
        WasteCommands::List => {
            page.load().await;
            let data = ready(&page.state)?;
            context.output(&data.events, |events| {
                for event in events {
                    println!(
                        "- {} • {} • {} • {}",
                        event.recorded_at.format("%Y-%m-%d %H:%M"),
                        format_quantity(event.quantity, &event.unit),
                        event.reason,
                        event.notes.as_deref().unwrap_or("")
                    );
                }
            })
        }
        WasteCommands::Record { item, batch, quantity, unit, reason, notes } => {
            let form = RecordWasteRequest { batch_id: batch, item_id: item, quantity, unit, reason, notes };
            let event = page.record(&form).await.map_err(action_failed)?;
            context.output(&event, |e| {
                println!("Recorded {} of waste ({}).", format_quantity(e.quantity, &e.unit), e.reason);
            })
        }
    }
}

async fn users(context: &CliContext, command: UserCommands) -> Result<()> {
    match command {
        UserCommands::List => {
            let users = context.api.list_users(None).await.map_err(client_failed("load", "users"))?;
            context.output(&users, |users| {
                for user in users {
                    let status = if user.is_active { "active" } else { "inactive" };
                    println!("- {} <{}> • {} • {}", user.name, user.email, user.role, status);
                }
            })
        }
        UserCommands::Create { name, email, password, role } => {
            let payload = CreateUserRequest { name, email, password, role };
            let user = context.api.create_user(&payload).await.map_err(client_failed("create", "user"))?;
            context.output(&user, |u| println!("User {} created ({}).", u.email, u.role))
        }
        UserCommands::Deactivate { id } => {
            let user = context.api.deactivate_user(id).await.map_err(client_failed("deactivate", "user"))?;
            context.output(&user, |u| println!("{} deactivated.", u.email))
        }
        UserCommands::Activate { id } => {
            let user = context.api.activate_user(id).await.map_err(client_failed("activate", "user"))?;
            context.output(&user, |u| println!("{} activated.", u.email))
        }
    }
}
