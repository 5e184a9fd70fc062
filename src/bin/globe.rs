use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use globe_rs::config::{self, Config};
use globe_rs::identity::{self, IdentityStore};
use globe_rs::storage::FileStore;
use globe_rs::{Client, Country, CountryQuery, NewUser, SortOrder, export, pipeline};
use num_format::{Locale, ToFormattedString};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "globe",
    version,
    about = "Browse, filter & bookmark the world's countries"
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// REST Countries API base URL.
    #[arg(long, global = true, env = "GLOBE_API_BASE", default_value = config::DEFAULT_BASE_URL)]
    base_url: String,
    /// Directory holding the local user table and session.
    #[arg(long, global = true, env = "GLOBE_DATA_DIR")]
    data_dir: Option<PathBuf>,
    /// Total HTTP timeout in seconds.
    #[arg(
        long,
        global = true,
        env = "GLOBE_TIMEOUT_SECS",
        default_value_t = config::DEFAULT_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    timeout: u64,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List countries (optionally searched, filtered, sorted, and saved).
    List(ListArgs),
    /// Show details for one country by alpha-2/alpha-3 code.
    Show { code: String },
    /// List the distinct regions.
    Regions,
    /// List the distinct languages (code and name).
    Languages,
    /// Show a random handful of countries.
    Featured {
        #[arg(long, default_value_t = pipeline::FEATURED_COUNT)]
        count: usize,
    },
    /// Create a local account and log in.
    Register(RegisterArgs),
    /// Log in with email and password.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Log out the current user.
    Logout,
    /// Show the logged-in user's profile.
    Whoami,
    /// Manage the logged-in user's favorite countries.
    #[command(subcommand)]
    Favorites(FavoritesCommand),
}

#[derive(Subcommand, Debug)]
enum FavoritesCommand {
    /// List saved countries.
    List,
    /// Save a country by code.
    Add { code: String },
    /// Remove a saved country by alpha-3 code.
    Remove { code: String },
}

#[derive(ValueEnum, Clone, Debug)]
enum OutFormat {
    Csv,
    Json,
}

#[derive(Args, Debug)]
struct ListArgs {
    /// Name search, sent to the API.
    #[arg(short, long)]
    search: Option<String>,
    /// Exact region (e.g., Europe, Americas).
    #[arg(short, long)]
    region: Option<String>,
    /// ISO 639-1 language code (e.g., fr).
    #[arg(short, long)]
    language: Option<String>,
    /// nameAsc, nameDesc, populationAsc, populationDesc.
    #[arg(long, default_value_t = SortOrder::NameAsc)]
    sort: SortOrder,
    /// Save results to file (format inferred by --format or extension).
    #[arg(long)]
    out: Option<PathBuf>,
    /// Output format (csv or json). If omitted, inferred from --out extension.
    #[arg(long, value_enum)]
    format: Option<OutFormat>,
}

#[derive(Args, Debug)]
struct RegisterArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: String,
    #[arg(long)]
    confirm_password: String,
}

fn fmt_population(n: u64) -> String {
    n.to_formatted_string(&Locale::en)
}

fn print_countries(countries: &[Country]) {
    if countries.is_empty() {
        println!("No countries found.");
        return;
    }
    for c in countries {
        println!(
            "{:<4} {:<40} {:<10} {:>15}",
            c.alpha3_code,
            c.name,
            c.region,
            fmt_population(c.population)
        );
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let cfg = Config::default()
        .with_base_url(&cli.global.base_url)
        .with_timeout_secs(cli.global.timeout);
    let cfg = match cli.global.data_dir {
        Some(dir) => cfg.with_data_dir(dir),
        None => cfg,
    };
    match cli.cmd {
        Command::List(args) => cmd_list(&cfg, args),
        Command::Show { code } => cmd_show(&cfg, &code),
        Command::Regions => cmd_regions(&cfg),
        Command::Languages => cmd_languages(&cfg),
        Command::Featured { count } => cmd_featured(&cfg, count),
        Command::Register(args) => cmd_register(&cfg, args),
        Command::Login { email, password } => cmd_login(&cfg, &email, &password),
        Command::Logout => cmd_logout(&cfg),
        Command::Whoami => cmd_whoami(&cfg),
        Command::Favorites(sub) => cmd_favorites(&cfg, sub),
    }
}

fn open_identity(cfg: &Config) -> Result<IdentityStore<FileStore>> {
    let store = FileStore::open(&cfg.data_dir)
        .with_context(|| format!("open data dir {}", cfg.data_dir.display()))?;
    Ok(IdentityStore::open(store)?)
}

// A failed fetch ends in an empty list, not an error exit.
fn all_or_empty(client: &Client) -> Vec<Country> {
    client.all().unwrap_or_else(|e| {
        log::error!("error fetching all countries: {:#}", e);
        Vec::new()
    })
}

fn cmd_list(cfg: &Config, args: ListArgs) -> Result<()> {
    let client = Client::new(cfg)?;
    let query = CountryQuery {
        search: args.search.unwrap_or_default(),
        region: args.region.unwrap_or_default(),
        language: args.language.unwrap_or_default(),
        sort: args.sort,
    };

    // The search step replaces the full list, so skip the bulk fetch then.
    let all = if query.search.trim().is_empty() {
        all_or_empty(&client)
    } else {
        Vec::new()
    };
    let shown = pipeline::apply(&all, &query, &client).unwrap_or_else(|e| {
        log::error!("error applying filters: {:#}", e);
        Vec::new()
    });

    if let Some(path) = args.out.as_ref() {
        let fmt = match args.format {
            Some(OutFormat::Csv) => "csv",
            Some(OutFormat::Json) => "json",
            None => path.extension().and_then(|e| e.to_str()).unwrap_or("csv"),
        }
        .to_ascii_lowercase();
        match fmt.as_str() {
            "csv" => export::save_csv(&shown, path)?,
            "json" => export::save_json(&shown, path)?,
            other => bail!("unsupported format: {}", other),
        }
        eprintln!("Saved {} countries to {}", shown.len(), path.display());
    }

    print_countries(&shown);
    if query.has_filters() {
        eprintln!("{} countries match", shown.len());
    }
    Ok(())
}

fn cmd_show(cfg: &Config, code: &str) -> Result<()> {
    let client = Client::new(cfg)?;
    let Some(c) = client.by_code(code)? else {
        bail!("Country Not Found: no country with code {}", code);
    };
    let ids = open_identity(cfg)?;

    println!("{} ({})", c.name, c.alpha3_code);
    if let Some(native) = &c.native_name {
        println!("  Native name:   {}", native);
    }
    println!("  Capital:       {}", c.capital.as_deref().unwrap_or("N/A"));
    println!("  Region:        {}", c.region);
    println!("  Subregion:     {}", c.subregion.as_deref().unwrap_or("N/A"));
    println!("  Population:    {}", fmt_population(c.population));
    println!("  Languages:     {}", c.language_names());
    println!("  Currencies:    {}", c.currency_names());
    println!("  Calling codes: {}", join_or_na(&c.calling_codes));
    println!("  Timezones:     {}", join_or_na(&c.timezones));
    println!("  Domains:       {}", join_or_na(&c.top_level_domain));
    if let Some(flag) = c.flags.svg.as_deref().or(c.flags.png.as_deref()) {
        println!("  Flag:          {}", flag);
    }
    if ids.is_logged_in() {
        let saved = if ids.is_in_favorites(&c.alpha3_code) { "yes" } else { "no" };
        println!("  In favorites:  {}", saved);
    }

    if !c.borders.is_empty() {
        match client.borders(&c) {
            Ok(neighbours) => {
                let names: Vec<String> = neighbours.iter().map(|n| n.name.clone()).collect();
                println!("  Borders:       {}", names.join(", "));
            }
            Err(e) => log::error!("error fetching border countries: {:#}", e),
        }
    }
    Ok(())
}

fn join_or_na(items: &[String]) -> String {
    if items.is_empty() {
        "N/A".into()
    } else {
        items.join(", ")
    }
}

fn cmd_regions(cfg: &Config) -> Result<()> {
    let client = Client::new(cfg)?;
    for r in pipeline::regions(&all_or_empty(&client)) {
        println!("{}", r);
    }
    Ok(())
}

fn cmd_languages(cfg: &Config) -> Result<()> {
    let client = Client::new(cfg)?;
    for l in pipeline::languages(&all_or_empty(&client)) {
        println!("{:<3} {}", l.code, l.name);
    }
    Ok(())
}

fn cmd_featured(cfg: &Config, count: usize) -> Result<()> {
    let client = Client::new(cfg)?;
    let all = all_or_empty(&client);
    print_countries(&pipeline::featured(&all, count, &mut rand::rng()));
    Ok(())
}

fn cmd_register(cfg: &Config, args: RegisterArgs) -> Result<()> {
    identity::validate_password_confirmation(&args.password, &args.confirm_password)?;
    let mut ids = open_identity(cfg)?;
    let user = ids.register(NewUser {
        name: args.name,
        email: args.email,
        password: args.password,
    })?;
    eprintln!("Registered and logged in as {}", user.email);
    Ok(())
}

fn cmd_login(cfg: &Config, email: &str, password: &str) -> Result<()> {
    let mut ids = open_identity(cfg)?;
    let user = ids
        .login(email, password)
        .context("Failed to log in. Please check your credentials.")?;
    eprintln!("Logged in as {}", user.email);
    Ok(())
}

fn cmd_logout(cfg: &Config) -> Result<()> {
    let mut ids = open_identity(cfg)?;
    ids.logout()?;
    eprintln!("Logged out");
    Ok(())
}

fn cmd_whoami(cfg: &Config) -> Result<()> {
    let ids = open_identity(cfg)?;
    match ids.current_user() {
        Some(u) => {
            let display = if u.name.trim().is_empty() { &u.email } else { &u.name };
            println!("{}", display);
            println!("  Email:        {}", u.email);
            println!("  Member since: {}", u.created_at.format("%Y-%m-%d"));
            println!("  Favorites:    {} countries saved", u.favorites.len());
        }
        None => println!("Not logged in"),
    }
    Ok(())
}

fn cmd_favorites(cfg: &Config, sub: FavoritesCommand) -> Result<()> {
    let mut ids = open_identity(cfg)?;
    if !ids.is_logged_in() {
        bail!("Not logged in. Run `globe login` first.");
    }
    match sub {
        FavoritesCommand::List => {
            if ids.favorites().is_empty() {
                println!("No favorites yet");
            } else {
                print_countries(ids.favorites());
            }
        }
        FavoritesCommand::Add { code } => {
            let client = Client::new(cfg)?;
            let Some(c) = client.by_code(&code)? else {
                bail!("Country Not Found: no country with code {}", code);
            };
            if ids.add_to_favorites(&c)? {
                eprintln!("Added {} to favorites", c.name);
            } else {
                eprintln!("{} is already in favorites", c.name);
            }
        }
        FavoritesCommand::Remove { code } => {
            let code = code.trim().to_ascii_uppercase();
            if ids.remove_from_favorites(&code)? {
                eprintln!("Removed {} from favorites", code);
            } else {
                eprintln!("{} was not in favorites", code);
            }
        }
    }
    Ok(())
}
