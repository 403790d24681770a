//! Boxbook CLI
//!
//! Command-line front end for the storage-box booking portal:
//! - Log in and out
//! - Search free units and book them
//! - Admin: browse, filter and export all bookings
//! - Admin: manage units

use anyhow::{anyhow, bail, Context};
use boxbook::config::LoggingConfig;
use boxbook::models::ACCESS_CODE_PENDING;
use boxbook::pages::{failure_message, MSG_BOOKING_NOT_FOUND};
use boxbook::views::{export_filename, write_csv_file};
use boxbook::{
    spawn_auto_refresh, AdminBooking, AdminDashboard, AdminUnitsPage, BookingFilter, BookingPage,
    BoxClient, Config, FileSessionStore, MyBookingsPage, Navigator, Route, Session,
    SortDirection, SortKey, SortSpec, StatusFilter, UnitDraft, UnitPatch, ViewParams,
};
use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "boxbook")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Book storage boxes and manage the booking portal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search the usual locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Backend URL, overrides the config file and BOXBOOK_API_URL
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and store the session token
    Login {
        email: String,
        /// Password (prompted when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Forget the stored session token
    Logout,

    /// Create a customer account
    Register {
        email: String,
        #[arg(short, long)]
        password: Option<String>,
        /// Full name shown on bookings
        #[arg(long)]
        name: Option<String>,
        /// Registration API key
        #[arg(long)]
        api_key: Option<String>,
    },

    /// Show the logged-in user
    Whoami,

    /// List units free for a period
    Available {
        /// Minutes from now until the period starts
        #[arg(short, long, default_value = "0")]
        start: u32,
        /// Length of the period in minutes
        #[arg(short, long, default_value = "60")]
        duration: u32,
    },

    /// Book a unit for yourself
    Book {
        unit_id: String,
        #[arg(short, long, default_value = "60")]
        duration: u32,
        /// Name shown on the booking (default: your account name)
        #[arg(long)]
        name: Option<String>,
    },

    /// List your bookings
    MyBookings {
        /// Only bookings that are still valid
        #[arg(long)]
        active: bool,
    },

    /// Admin commands
    #[command(subcommand)]
    Admin(AdminCommands),

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum AdminCommands {
    /// Browse all bookings
    Bookings(BookingsArgs),

    /// Book a unit on behalf of a customer
    Book {
        /// Customer account email
        email: String,
        unit_id: String,
        #[arg(short, long, default_value = "60")]
        duration: u32,
        #[arg(long)]
        name: Option<String>,
    },

    /// Cancel a booking
    Cancel { booking_id: String },

    /// Manage units
    #[command(subcommand)]
    Units(UnitCommands),
}

#[derive(Args)]
pub struct BookingsArgs {
    /// Matches customer, email, unit and access code
    #[arg(short, long, default_value = "")]
    search: String,
    /// all, active, expired
    #[arg(long, default_value = "all")]
    status: StatusFilter,
    /// created, expires, unit, customer, price
    #[arg(long, default_value = "created")]
    sort: SortKey,
    /// asc, desc
    #[arg(long, default_value = "desc")]
    direction: SortDirection,
    /// Created on or after. Supports: ISO 8601, YYYY-MM-DD, now-7d
    #[arg(long)]
    from: Option<String>,
    /// Created on or before
    #[arg(long)]
    to: Option<String>,
    /// Write the listed rows to a CSV file (a directory gets a generated name)
    #[arg(long)]
    csv: Option<PathBuf>,
    /// Keep refreshing; optional interval in seconds (default: from config)
    #[arg(long, num_args = 0..=1, default_missing_value = "0")]
    watch: Option<u64>,
}

#[derive(Subcommand)]
pub enum UnitCommands {
    /// List units
    List,

    /// Show which units are occupied
    Status,

    /// Create a unit
    Create {
        id: String,
        name: String,
        /// Floor area in m²
        #[arg(long)]
        size: f64,
        /// Lock device id
        #[arg(long)]
        device: String,
        #[arg(long)]
        hourly: bool,
        #[arg(long)]
        no_daily: bool,
        #[arg(long)]
        monthly: bool,
        #[arg(long)]
        price_hour: Option<f64>,
        #[arg(long)]
        price_day: Option<f64>,
        #[arg(long)]
        price_month: Option<f64>,
    },

    /// Change selected fields of a unit
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        size: Option<f64>,
        #[arg(long)]
        device: Option<String>,
        #[arg(long)]
        hourly: Option<bool>,
        #[arg(long)]
        daily: Option<bool>,
        #[arg(long)]
        monthly: Option<bool>,
        #[arg(long)]
        price_hour: Option<f64>,
        #[arg(long)]
        price_day: Option<f64>,
        #[arg(long)]
        price_month: Option<f64>,
    },

    /// Delete a unit
    Delete { id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Commands::Config { output } = &cli.command {
        let content = boxbook::config::generate_default_config();
        match output {
            Some(path) => {
                std::fs::write(path, content)
                    .with_context(|| format!("writing config to {:?}", path))?;
                println!("Config written to {:?}", path);
            }
            None => print!("{}", content),
        }
        return Ok(());
    }

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    if let Some(url) = &cli.api_url {
        config.api.base_url = Some(url.clone());
    }
    init_logging(&config.logging);

    let session = Session::new(FileSessionStore::new(config.session.path()));
    let client = BoxClient::new(&config.api, session)?;
    let mut nav = Navigator::new(client.clone());
    let json = cli.format == "json";

    match cli.command {
        Commands::Login { email, password } => {
            let password = match password {
                Some(p) => p,
                None => prompt("Password: ")?,
            };
            let state = nav.login(&email, &password).await?;
            let user = state.user().ok_or_else(|| anyhow!("login did not confirm a user"))?;
            println!(
                "Logged in as {} ({})",
                user.display_name(),
                if state.is_admin() { "admin" } else { "customer" }
            );
        }

        Commands::Logout => {
            nav.logout()?;
            println!("Logged out");
        }

        Commands::Register {
            email,
            password,
            name,
            api_key,
        } => {
            let password = match password {
                Some(p) => p,
                None => prompt("Password: ")?,
            };
            let user = client
                .register(&email, &password, name.as_deref(), api_key.as_deref())
                .await?;
            println!("Account {} created; log in with `boxbook login {}`", user.id, user.email);
        }

        Commands::Whoami => {
            nav.navigate(Route::Home.path()).await;
            match nav.state().user() {
                Some(user) if json => println!("{}", serde_json::to_string_pretty(user)?),
                Some(user) => {
                    println!("{:<10} {}", "Name", user.display_name());
                    println!("{:<10} {}", "Email", user.email);
                    println!("{:<10} {}", "Role", if user.is_admin { "admin" } else { "customer" });
                }
                None if client.session().is_logged_in() => {
                    println!("Session stored, but the backend could not confirm it")
                }
                None => println!("Not logged in"),
            }
        }

        Commands::Available { start, duration } => {
            let page = BookingPage::new(client, None);
            page.search(start, duration).await?;
            let units = page.units().await;

            if json {
                println!("{}", serde_json::to_string_pretty(&units)?);
            } else if units.is_empty() {
                println!("No units free for that period.");
            } else {
                println!(
                    "{:<14} {:<20} {:>8} {:<8} {:>10}",
                    "ID", "Name", "m²", "Billing", "Price"
                );
                println!("{}", "-".repeat(64));
                for unit in units {
                    println!(
                        "{:<14} {:<20} {:>8.1} {:<8} {:>10.2}",
                        unit.id,
                        unit.name,
                        unit.size_m2,
                        format!("{}x {}", unit.billed_units, unit.unit_label),
                        unit.price_for_period
                    );
                }
            }
        }

        Commands::Book {
            unit_id,
            duration,
            name,
        } => {
            let user = enter(&mut nav, Route::Book).await?;
            let page = BookingPage::new(client, user);
            let booking = page.book(&unit_id, duration, name.as_deref()).await?;

            println!("Booked {} until {}", booking.unit_display(), local(booking.valid_until));
            println!("Booking ID:  {}", booking.id);
            println!("Access code: {}", booking.access_code_display());
            if let Some(price) = booking.price_for_period {
                println!("Price:       {:.2}", price);
            }
        }

        Commands::MyBookings { active } => {
            enter(&mut nav, Route::MyBookings).await?;
            let page = MyBookingsPage::new(client, active);
            page.load().await?;
            let bookings = page.bookings().await;

            if json {
                println!("{}", serde_json::to_string_pretty(&bookings)?);
            } else if bookings.is_empty() {
                println!("No bookings yet.");
                println!();
                println!("Find a free unit with:");
                println!("  boxbook available --duration 120");
            } else {
                let now = Utc::now();
                println!(
                    "{:<10} {:<16} {:<18} {:<17} {:<8}",
                    "ID", "Unit", "Access code", "Valid until", "Status"
                );
                println!("{}", "-".repeat(72));
                for b in bookings {
                    println!(
                        "{:<10} {:<16} {:<18} {:<17} {:<8}",
                        short(&b.id, 10),
                        short(b.unit_display(), 16),
                        b.access_code_display(),
                        local(b.valid_until),
                        b.status_at(now)
                    );
                }
            }
        }

        Commands::Admin(command) => run_admin(command, &mut nav, &config, json).await?,

        Commands::Config { .. } => {}
    }

    Ok(())
}

async fn run_admin(
    command: AdminCommands,
    nav: &mut Navigator,
    config: &Config,
    json: bool,
) -> anyhow::Result<()> {
    let route = match &command {
        AdminCommands::Units(_) => Route::AdminUnits,
        _ => Route::AdminDashboard,
    };
    enter(nav, route).await?;
    let client = nav.client().clone();

    match command {
        AdminCommands::Bookings(args) => {
            let now = Utc::now();
            let params = ViewParams {
                filter: BookingFilter {
                    search: args.search,
                    status: args.status,
                    created_from: args.from.as_deref().map(|s| parse_bound(s, now, false)).transpose()?,
                    created_to: args.to.as_deref().map(|s| parse_bound(s, now, true)).transpose()?,
                },
                sort: SortSpec::new(args.sort, args.direction),
            };

            let page = Arc::new(AdminDashboard::new(client));
            page.load().await?;

            if let Some(path) = &args.csv {
                let path = if path.is_dir() { path.join(export_filename(now)) } else { path.clone() };
                let count = page
                    .with_view(&params, &now, |view| write_csv_file(&path, &view.rows, now))
                    .await?;
                println!("Exported {} bookings to {:?}", count, path);
                return Ok(());
            }

            match args.watch {
                None => render_dashboard(&page, &params, json).await?,
                Some(secs) => {
                    let interval = match secs {
                        0 => config
                            .dashboard
                            .refresh_interval()
                            .unwrap_or(std::time::Duration::from_secs(30)),
                        s => std::time::Duration::from_secs(s),
                    };
                    let refresher = spawn_auto_refresh(Arc::clone(&page), interval);

                    loop {
                        print!("\x1B[2J\x1B[H");
                        render_dashboard(&page, &params, json).await?;
                        println!();
                        println!("Refreshing every {}s, Ctrl-C to stop", interval.as_secs());

                        tokio::select! {
                            _ = tokio::signal::ctrl_c() => break,
                            _ = tokio::time::sleep(interval) => {}
                        }
                    }

                    page.unmount();
                    refresher.abort();
                }
            }
        }

        AdminCommands::Book {
            email,
            unit_id,
            duration,
            name,
        } => {
            let page = AdminDashboard::new(client);
            let booking = page
                .create_for_customer(&email, &unit_id, duration, name.as_deref())
                .await?;
            println!(
                "Booked {} for {} until {}",
                booking.booking.unit_display(),
                email,
                local(booking.booking.valid_until)
            );
            println!("Booking ID:  {}", booking.id());
            println!("Access code: {}", booking.booking.access_code_display());
        }

        AdminCommands::Cancel { booking_id } => {
            let page = AdminDashboard::new(client);
            if let Err(e) = page.cancel(&booking_id).await {
                nav.handle_failure(&e);
                bail!("{}", failure_message(&e, MSG_BOOKING_NOT_FOUND));
            }
            println!("Booking {} cancelled", booking_id);
        }

        AdminCommands::Units(command) => run_units(command, AdminUnitsPage::new(client), json).await?,
    }

    Ok(())
}

async fn run_units(command: UnitCommands, page: AdminUnitsPage, json: bool) -> anyhow::Result<()> {
    match command {
        UnitCommands::List => {
            page.load().await?;
            let units = page.units().await;

            if json {
                println!("{}", serde_json::to_string_pretty(&units)?);
                return Ok(());
            }
            println!(
                "{:<14} {:<20} {:>6} {:<12} {:<22}",
                "ID", "Name", "m²", "Device", "Billing"
            );
            println!("{}", "-".repeat(78));
            for unit in units {
                let modes: Vec<&str> = unit.allowed_modes().iter().map(|m| m.as_str()).collect();
                println!(
                    "{:<14} {:<20} {:>6.1} {:<12} {:<22}",
                    unit.id,
                    short(&unit.name, 20),
                    unit.size_m2,
                    short(&unit.device_id, 12),
                    modes.join(",")
                );
            }
        }

        UnitCommands::Status => {
            page.load().await?;
            let rows = page.occupancy().await;

            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
                return Ok(());
            }
            println!(
                "{:<14} {:<20} {:<9} {:<17} {:<16}",
                "ID", "Name", "Status", "Until", "Customer"
            );
            println!("{}", "-".repeat(80));
            for row in rows {
                let customer = row
                    .current_booking
                    .as_ref()
                    .map(|b| b.user_name.as_str())
                    .unwrap_or("-");
                println!(
                    "{:<14} {:<20} {:<9} {:<17} {:<16}",
                    row.box_id,
                    short(&row.name, 20),
                    format!("{:?}", row.status).to_lowercase(),
                    row.occupied_until.map(local).unwrap_or_else(|| "-".to_string()),
                    short(customer, 16)
                );
            }
        }

        UnitCommands::Create {
            id,
            name,
            size,
            device,
            hourly,
            no_daily,
            monthly,
            price_hour,
            price_day,
            price_month,
        } => {
            let mut draft = UnitDraft::new(id, name, size, device);
            draft.allow_hourly = hourly;
            draft.allow_daily = !no_daily;
            draft.allow_monthly = monthly;
            draft.price_per_hour = price_hour;
            draft.price_per_day = price_day;
            draft.price_per_31days = price_month;
            if !draft.has_billing_mode() {
                bail!("enable at least one of --hourly, --monthly or daily billing");
            }

            let unit = page.create(&draft).await?;
            println!("Unit {} created", unit.id);
        }

        UnitCommands::Update {
            id,
            name,
            size,
            device,
            hourly,
            daily,
            monthly,
            price_hour,
            price_day,
            price_month,
        } => {
            let patch = UnitPatch {
                name,
                size_m2: size,
                device_id: device,
                allow_hourly: hourly,
                allow_daily: daily,
                allow_monthly: monthly,
                price_per_hour: price_hour,
                price_per_day: price_day,
                price_per_31days: price_month,
            };
            if patch.is_empty() {
                bail!("nothing to update");
            }

            let unit = page.update(&id, &patch).await?;
            println!("Unit {} updated", unit.id);
        }

        UnitCommands::Delete { id } => {
            page.delete(&id).await?;
            println!("Unit {} deleted", id);
        }
    }

    Ok(())
}

/// Navigate to `route`; fails unless the page may render
async fn enter(nav: &mut Navigator, route: Route) -> anyhow::Result<Option<boxbook::CurrentUser>> {
    match nav.navigate(route.path()).await.target() {
        Some(target) if target == route => Ok(nav.state().user().cloned()),
        Some(Route::Login) => bail!("not logged in; run `boxbook login <email>`"),
        Some(_) => bail!("insufficient privilege"),
        None => bail!("could not confirm your role with the backend; try again"),
    }
}

async fn render_dashboard(page: &AdminDashboard, params: &ViewParams, json: bool) -> anyhow::Result<()> {
    let now = Local::now();

    if let Some(message) = page.message().await {
        eprintln!("! {}", message);
    }

    page.with_view(params, &now, |view| {
        if json {
            let rows: Vec<&AdminBooking> = view.rows.clone();
            return serde_json::to_string_pretty(&rows).map(|s| println!("{}", s));
        }

        let k = &view.kpis;
        println!(
            "Total {}   Active {}   Expired {}   Today {}   Active revenue {:.2}",
            k.total, k.active, k.expired, k.created_today, k.active_revenue
        );
        println!();

        if view.is_empty() {
            println!("No bookings match.");
            return Ok(());
        }

        println!(
            "{:<10} {:<18} {:<14} {:<18} {:<17} {:<17} {:<8} {:>8}",
            "ID", "Customer", "Unit", "Access code", "Created", "Valid until", "Status", "Price"
        );
        println!("{}", "-".repeat(116));
        let instant = now.with_timezone(&Utc);
        for b in &view.rows {
            println!(
                "{:<10} {:<18} {:<14} {:<18} {:<17} {:<17} {:<8} {:>8}",
                short(b.id(), 10),
                short(&b.booking.user_name, 18),
                short(b.booking.unit_display(), 14),
                b.booking.access_code.as_deref().unwrap_or(ACCESS_CODE_PENDING),
                local(b.booking.created_at),
                local(b.booking.valid_until),
                b.status_at(instant),
                b.booking
                    .price_for_period
                    .map(|p| format!("{:.2}", p))
                    .unwrap_or_else(|| "-".to_string())
            );
        }
        Ok(())
    })
    .await?;

    Ok(())
}

fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("boxbook={}", config.level)));
    let registry = tracing_subscriber::registry().with(filter);

    if config.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// Parse a date bound: `now`, `now-<n>[hdwm]`, ISO 8601 or `YYYY-MM-DD`.
///
/// A bare date covers the whole day, so an upper bound ends at 23:59:59.
fn parse_bound(s: &str, now: DateTime<Utc>, end_of_day: bool) -> anyhow::Result<DateTime<Utc>> {
    let s = s.trim();

    if s.starts_with("now") {
        if s == "now" {
            return Ok(now);
        }

        let re = regex::Regex::new(r"^now-(\d+)([hdwm])$")?;
        let caps = re
            .captures(s)
            .ok_or_else(|| anyhow!("Cannot parse time: {}. Use: now-12h, now-7d, now-2w, now-3m", s))?;
        let amount: i64 = caps[1].parse().context("invalid number")?;

        let delta = match &caps[2] {
            "h" => Duration::hours(amount),
            "d" => Duration::days(amount),
            "w" => Duration::weeks(amount),
            "m" => Duration::days(amount * 30),
            unit => bail!("Invalid time unit: {}", unit),
        };
        return Ok(now - delta);
    }

    if let Some(dt) = boxbook::models::time::parse_timestamp(s) {
        return Ok(dt);
    }

    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Cannot parse date: {}. Use ISO 8601, YYYY-MM-DD or now-7d", s))?;
    let time = if end_of_day {
        date.and_hms_opt(23, 59, 59)
    } else {
        date.and_hms_opt(0, 0, 0)
    };
    time.map(|t| t.and_utc())
        .ok_or_else(|| anyhow!("invalid date: {}", s))
}

fn prompt(label: &str) -> anyhow::Result<String> {
    eprint!("{}", label);
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn local(dt: DateTime<Utc>) -> String {
    dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

fn short(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let cut: String = s.chars().take(width.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}
