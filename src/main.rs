mod layout;
mod model;
mod pdf;
mod pricing;
mod store;

use chrono::Local;
use clap::{Parser, Subcommand};
use comfy_table::{Attribute, Cell, Table};
use inquire::{Confirm, DateSelect, Select, Text};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

use directories::{BaseDirs, ProjectDirs};

use crate::model::{
    AdditionalCost, ClientDetails, CompanyDetails, DevelopmentItem, LineItem, ProjectInfo,
    QuotationForm, SavedQuotation, UserTier,
};
use crate::pdf::AssetStore;
use crate::pricing::compute_totals;
use crate::store::QuotationStore;

// ==========================================
// Constants & Embeds
// ==========================================

const DEFAULT_API_URL: &str = "http://localhost:7070";

// Embed the default company profile so first run works out of the box
const DEFAULT_COMPANY_TEMPLATE: &str = include_str!("../company.toml");

const PROJECT_CATEGORIES: &[&str] = &[
    "Mobile Application",
    "E-Commerce Website",
    "Business Website",
    "Portfolio Website",
    "Custom Software",
];

// ==========================================
// Structs & Enums
// ==========================================

#[derive(Error, Debug)]
enum AppError {
    #[error("prompt failed: {0}")]
    Prompt(#[from] inquire::InquireError),
    #[error(transparent)]
    Store(#[from] store::StoreError),
    #[error(transparent)]
    Render(#[from] pdf::RenderError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config error: {0}")]
    Config(String),
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

#[derive(Debug, Serialize, Deserialize)]
struct AppSettings {
    data_root: String,
    #[serde(default = "default_api_url")]
    api_base_url: String,
}

#[derive(Parser)]
#[command(name = "quotation-maker")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a new quotation and export it as a PDF
    New,
    /// List all saved quotations
    List,
    /// Show the full detail of a saved quotation
    View {
        /// Record id as shown by `list`
        id: i64,
    },
    /// Delete a saved quotation
    Delete {
        /// Record id as shown by `list`
        id: i64,
    },
    /// Configure data directory and store URL
    Config,
    /// Open output folder
    Open,
}

// ==========================================
// Main Function
// ==========================================

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("❌ {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), AppError> {
    let cli = Cli::parse();

    // 1. Initialize configuration
    let settings = match load_settings() {
        Some(s) => s,
        None => setup_config_wizard()?,
    };
    let root = PathBuf::from(expand_home_dir(&settings.data_root));
    fs::create_dir_all(&root)?;

    let Some(command) = cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help().ok();
        return Ok(());
    };

    let store = QuotationStore::new(&settings.api_base_url);

    match command {
        Commands::New => new_quotation(&root, &store)?,
        Commands::List => list_quotations(&store)?,
        Commands::View { id } => view_quotation(&store, id)?,
        Commands::Delete { id } => delete_quotation(&store, id)?,
        Commands::Config => {
            setup_config_wizard()?;
        }
        Commands::Open => open_folder(&root),
    }
    Ok(())
}

// ==========================================
// 1. New Quotation Flow
// ==========================================

fn new_quotation(root: &Path, store: &QuotationStore) -> Result<(), AppError> {
    let company = load_company_profile(root)?;

    let mut form = QuotationForm {
        company: wizard_company(&company)?,
        client: wizard_client()?,
        project: wizard_project()?,
        ..Default::default()
    };

    enter_development_items(&mut form)?;
    enter_user_tiers(&mut form)?;
    enter_additional_costs(&mut form)?;

    form.tax_percent = Text::new("Tax % (e.g. 18, empty for none):").prompt()?;
    form.payment_terms = Text::new("Payment Terms (use \\n for new lines):")
        .prompt()?
        .replace("\\n", "\n");

    let date = DateSelect::new("Quotation Date:")
        .with_default(Local::now().date_naive())
        .prompt()?;
    form.quotation_date = date.format("%d/%m/%Y").to_string();

    form.ensure_quotation_number();
    println!("✅ Quotation Number: {}", form.quotation_number);

    let totals = compute_totals(&form);
    print_totals_preview(&totals);

    // Generate the PDF artifact
    let output_dir = root.join("output");
    fs::create_dir_all(&output_dir)?;
    let pdf_path = output_dir.join(layout::artifact_name(&form));

    let pages = layout::paginate(&form, &totals);
    let assets = AssetStore::load(&root.join("assets"));
    pdf::render_pdf(&pages, &assets, &pdf_path)?;
    println!("✅ PDF Generated: {:?}", pdf_path);
    open_and_reveal(&pdf_path);

    // Hand the payload to the remote store, if wanted
    let save = Confirm::new("Save to quotation store?")
        .with_default(true)
        .prompt()?;
    if save {
        match store.save(&form, &totals) {
            Ok(()) => println!("✅ Quotation saved: {}", form.quotation_number),
            Err(e) => println!("❌ Could not save quotation: {e}"),
        }
    }
    Ok(())
}

fn print_totals_preview(totals: &pricing::QuotationTotals) {
    let mut table = Table::new();
    table.set_header(vec![Cell::new("Section"), Cell::new("Amount (INR)")]);
    table.add_row(vec![
        Cell::new("Development"),
        Cell::new(format!("{:.2}", totals.development)),
    ]);
    table.add_row(vec![
        Cell::new("User Pricing"),
        Cell::new(format!("{:.2}", totals.users)),
    ]);
    table.add_row(vec![
        Cell::new("Additional"),
        Cell::new(format!("{:.2}", totals.additional)),
    ]);
    table.add_row(vec![
        Cell::new("Sub-Total").add_attribute(Attribute::Bold),
        Cell::new(format!("{:.2}", totals.subtotal)).add_attribute(Attribute::Bold),
    ]);
    table.add_row(vec![
        Cell::new(format!("Tax ({}%)", totals.tax_rate)),
        Cell::new(format!("{:.2}", totals.tax_amount)),
    ]);
    table.add_row(vec![
        Cell::new(format!("Total {}", totals.tax_label())).add_attribute(Attribute::Bold),
        Cell::new(format!("{:.2}", totals.grand_total)).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");
}

// ==========================================
// 2. Data Entry Wizards
// ==========================================

fn wizard_company(profile: &CompanyDetails) -> Result<CompanyDetails, AppError> {
    println!("\n--- Company Details ---");
    Ok(CompanyDetails {
        name: Text::new("Company Name:")
            .with_default(&profile.name)
            .prompt()?,
        address: Text::new("Address:")
            .with_default(&profile.address)
            .prompt()?,
        email: Text::new("Email:").with_default(&profile.email).prompt()?,
        phone: Text::new("Phone:").with_default(&profile.phone).prompt()?,
    })
}

fn wizard_client() -> Result<ClientDetails, AppError> {
    println!("\n--- Client Details ---");
    Ok(ClientDetails {
        name: Text::new("Client Name:").prompt()?,
        email: Text::new("Client Email:").prompt()?,
        phone: Text::new("Client Phone:").prompt()?,
    })
}

fn wizard_project() -> Result<ProjectInfo, AppError> {
    println!("\n--- Project Information ---");
    let name = Text::new("Project Name:").prompt()?;
    let category = Select::new("Project Category:", PROJECT_CATEGORIES.to_vec()).prompt()?;
    let kind = Text::new("Project Type:").prompt()?;
    Ok(ProjectInfo {
        name,
        category: category.to_string(),
        kind,
    })
}

fn enter_development_items(form: &mut QuotationForm) -> Result<(), AppError> {
    println!("\n--- Development Costs ---");
    println!("💡 Fixed cost wins over hours x rate whenever it is > 0.");
    println!("(Leave Description empty to finish)");

    loop {
        let label = Text::new("Task description (leave empty to finish):").prompt()?;
        if label.trim().is_empty() {
            break;
        }
        let cost = Text::new("Fixed cost (optional):").prompt()?;
        let hours = Text::new("Hours:").prompt()?;
        let rate = Text::new("Rate/hr:").prompt()?;
        form.push_row(LineItem::Development(DevelopmentItem {
            label,
            cost,
            hours,
            rate,
        }));
    }
    Ok(())
}

fn enter_user_tiers(form: &mut QuotationForm) -> Result<(), AppError> {
    println!("\n--- User Pricing ---");
    loop {
        let count = Text::new("No. of Users (leave empty to finish):").prompt()?;
        if count.trim().is_empty() {
            break;
        }
        let price = Text::new("Cost Per User:").prompt()?;
        form.push_row(LineItem::UserTier(UserTier { count, price }));
    }
    Ok(())
}

fn enter_additional_costs(form: &mut QuotationForm) -> Result<(), AppError> {
    println!("\n--- Additional Costs ---");
    loop {
        let label = Text::new("Description (leave empty to finish):").prompt()?;
        if label.trim().is_empty() {
            break;
        }
        let cost = Text::new("Cost:").prompt()?;
        form.push_row(LineItem::Additional(AdditionalCost { label, cost }));
    }
    Ok(())
}

// ==========================================
// 3. Saved Quotation Views
// ==========================================

fn list_quotations(store: &QuotationStore) -> Result<(), AppError> {
    let quotations = store.list()?;
    if quotations.is_empty() {
        println!("(No saved quotations)");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("ID"),
        Cell::new("Number"),
        Cell::new("Date"),
        Cell::new("Client"),
        Cell::new("Project"),
        Cell::new("Total (INR)"),
        Cell::new("Status"),
    ]);
    for q in &quotations {
        table.add_row(vec![
            Cell::new(q.id),
            Cell::new(&q.quotation_number),
            Cell::new(&q.quotation_date),
            Cell::new(&q.client_name),
            Cell::new(&q.project_name),
            Cell::new(format!("{:.2}", q.total_amount)),
            Cell::new(&q.status),
        ]);
    }
    println!("--- Saved Quotations ---");
    println!("{table}");
    Ok(())
}

fn view_quotation(store: &QuotationStore, id: i64) -> Result<(), AppError> {
    let q = store.fetch(id)?;
    print_quotation_detail(&q);
    Ok(())
}

fn print_quotation_detail(q: &SavedQuotation) {
    println!("--- Quotation {} ---", q.quotation_number);
    println!("Date    : {}", q.quotation_date);
    println!("Company : {}", q.company_name);
    println!("Client  : {} <{}>", q.client_name, q.client_email);
    println!("Project : {} ({})", q.project_name, q.project_category);
    println!("Status  : {}", q.status);

    let development: Vec<DevelopmentItem> = store::parse_items(&q.development);
    if !development.is_empty() {
        let mut table = Table::new();
        table.set_header(vec![
            Cell::new("Task"),
            Cell::new("Cost"),
            Cell::new("Hours"),
            Cell::new("Rate"),
            Cell::new("Total"),
        ]);
        for row in &development {
            table.add_row(vec![
                Cell::new(&row.label),
                Cell::new(&row.cost),
                Cell::new(&row.hours),
                Cell::new(&row.rate),
                Cell::new(format!("{}", row.effective_cost())),
            ]);
        }
        println!("\nDevelopment Costs");
        println!("{table}");
    }

    let users: Vec<UserTier> = store::parse_items(&q.users);
    if !users.is_empty() {
        let mut table = Table::new();
        table.set_header(vec![
            Cell::new("Users"),
            Cell::new("Price"),
            Cell::new("Total"),
        ]);
        for row in &users {
            table.add_row(vec![
                Cell::new(&row.count),
                Cell::new(&row.price),
                Cell::new(format!("{}", row.effective_cost())),
            ]);
        }
        println!("\nUser Pricing");
        println!("{table}");
    }

    let additional: Vec<AdditionalCost> = store::parse_items(&q.additional_costs);
    if !additional.is_empty() {
        let mut table = Table::new();
        table.set_header(vec![Cell::new("Description"), Cell::new("Cost")]);
        for row in &additional {
            table.add_row(vec![Cell::new(&row.label), Cell::new(&row.cost)]);
        }
        println!("\nAdditional Costs");
        println!("{table}");
    }

    println!("\nSub-Total    : INR {}", q.subtotal);
    println!("Tax ({}%)    : INR {:.2}", q.tax_percent, q.tax_amount);
    println!("Total Amount : INR {:.2}", q.total_amount);
    if !q.payment_terms.trim().is_empty() {
        println!("\nPayment Terms:\n{}", q.payment_terms);
    }
}

fn delete_quotation(store: &QuotationStore, id: i64) -> Result<(), AppError> {
    let confirm = Confirm::new(&format!("Delete quotation {id}?"))
        .with_default(false)
        .prompt()?;
    if !confirm {
        println!("Cancelled");
        return Ok(());
    }
    store.delete(id)?;
    println!("✅ Quotation deleted");
    Ok(())
}

// ==========================================
// 4. Open Folder Logic
// ==========================================

fn open_folder(root: &Path) {
    let output_root = root.join("output");
    println!("🚀 Opening: {:?}", output_root);

    #[cfg(target_os = "macos")]
    Command::new("open").arg(&output_root).spawn().ok();
    #[cfg(target_os = "windows")]
    Command::new("explorer").arg(&output_root).spawn().ok();
    #[cfg(target_os = "linux")]
    Command::new("xdg-open").arg(&output_root).spawn().ok();
}

// Helper: Open file and reveal in Finder/Explorer
fn open_and_reveal(path: &Path) {
    #[cfg(target_os = "macos")]
    Command::new("open").arg("-R").arg(path).spawn().ok();

    #[cfg(target_os = "windows")]
    Command::new("explorer")
        .arg(format!("/select,{}", path.to_string_lossy()))
        .spawn()
        .ok();

    #[cfg(target_os = "linux")]
    if let Some(parent) = path.parent() {
        Command::new("xdg-open").arg(parent).spawn().ok();
    }
}

// ==========================================
// 5. Config & Utilities
// ==========================================

fn get_config_path() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("com", "quotation-maker", "app") {
        let config_dir = proj_dirs.config_dir();
        if !config_dir.exists() {
            fs::create_dir_all(config_dir).ok();
        }
        return config_dir.join("settings.toml");
    }
    PathBuf::from("settings.toml")
}

fn load_settings() -> Option<AppSettings> {
    let path = get_config_path();
    if !path.exists() {
        return None;
    }
    let content = fs::read_to_string(path).ok()?;
    toml::from_str(&content).ok()
}

fn setup_config_wizard() -> Result<AppSettings, AppError> {
    println!("\n⚙️  --- Configuration Setup ---");
    let current = load_settings();
    let default_root = current
        .as_ref()
        .map(|s| s.data_root.clone())
        .unwrap_or_else(|| "~/Documents/Quotations".to_string());
    let default_api = current
        .map(|s| s.api_base_url)
        .unwrap_or_else(default_api_url);

    println!("📂 Opening folder picker...");
    let picked_path = rfd::FileDialog::new()
        .set_title("Select Root Data Directory")
        .pick_folder();

    let data_root = if let Some(path) = picked_path {
        path.to_string_lossy().to_string()
    } else {
        println!("❌ No folder selected. Falling back to manual input.");
        Text::new("Enter Root Data Directory:")
            .with_default(&default_root)
            .prompt()?
    };

    let api_base_url = Text::new("Quotation store URL:")
        .with_default(&default_api)
        .prompt()?;

    let settings = AppSettings {
        data_root,
        api_base_url,
    };

    let path = get_config_path();
    let toml_str = toml::to_string_pretty(&settings)
        .map_err(|e| AppError::Config(e.to_string()))?;
    fs::write(&path, toml_str)?;
    println!("✅ Settings saved.");
    Ok(settings)
}

fn load_company_profile(root: &Path) -> Result<CompanyDetails, AppError> {
    let path = root.join("company.toml");
    if path.exists() {
        let content = fs::read_to_string(&path)?;
        toml::from_str(&content).map_err(|e| AppError::Config(e.to_string()))
    } else {
        println!("✨ Initializing default company profile...");
        let profile: CompanyDetails = toml::from_str(DEFAULT_COMPANY_TEMPLATE)
            .map_err(|e| AppError::Config(e.to_string()))?;
        fs::write(&path, DEFAULT_COMPANY_TEMPLATE)?;
        Ok(profile)
    }
}

fn expand_home_dir(path: &str) -> String {
    if path.starts_with("~") {
        if let Some(base_dirs) = BaseDirs::new() {
            let home = base_dirs.home_dir().to_string_lossy();
            return path.replacen("~", &home, 1);
        }
    }
    path.to_string()
}
