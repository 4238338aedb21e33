mod api;
mod audience;
mod models;
mod sheets;
mod store;
mod table;
mod tui;
mod watch;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use log::LevelFilter;
use simplelog::{ColorChoice, CombinedLogger, ConfigBuilder, TermLogger, TerminalMode};
use std::path::PathBuf;

use api::{ApiClient, CreateJobRequest};
use models::{ChatRole, Job, JobStatus, Lead};
use store::Database;
use table::{ConfidenceBucket, LeadQuery, SortDirection, SortKey};
use watch::WatchEvent;

#[derive(Parser)]
#[command(name = "prospect")]
#[command(about = "Lead generation client - search, watch, and qualify prospects")]
struct Cli {
    /// Backend base URL (default: $PROSPECT_API_URL, then http://localhost:8000)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Log debug detail to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show backend dashboard metrics
    Dashboard,

    /// Check backend connectivity
    Health,

    /// Manage lead generation jobs
    Job {
        #[command(subcommand)]
        command: JobCommands,
    },

    /// Search and inspect leads
    Leads {
        #[command(subcommand)]
        command: LeadCommands,
    },

    /// Browse leads interactively
    Browse {
        /// Free-text search (company, contact, email, industry, location)
        #[arg(short, long)]
        search: Option<String>,

        /// Confidence bucket (high, medium, low)
        #[arg(short, long)]
        bucket: Option<String>,

        /// Only starred leads
        #[arg(long)]
        starred: bool,
    },

    /// Build the target audience profile
    Audience {
        #[command(subcommand)]
        command: AudienceCommands,
    },

    /// Manage connected Google Sheets
    Sheets {
        #[command(subcommand)]
        command: SheetCommands,
    },

    /// Manage campaigns
    Campaign {
        #[command(subcommand)]
        command: CampaignCommands,
    },
}

#[derive(Subcommand)]
enum JobCommands {
    /// Start a new lead generation job
    Create {
        /// What to search for, in plain language
        prompt: String,

        /// How many leads to aim for
        #[arg(short, long, default_value = "50")]
        target_count: u32,

        /// Minimum confidence to keep a lead (0.0 - 1.0)
        #[arg(short, long, default_value = "0.7")]
        quality_threshold: f64,

        /// Restrict to one industry
        #[arg(long)]
        industry: Option<String>,

        /// Restrict to one location
        #[arg(long)]
        location: Option<String>,

        /// Company size band, e.g. 11-50
        #[arg(long)]
        company_size: Option<String>,

        /// Keyword to require (repeatable)
        #[arg(long = "keyword")]
        keywords: Vec<String>,

        /// Keyword to exclude (repeatable)
        #[arg(long = "exclude-keyword")]
        exclude_keywords: Vec<String>,

        /// Data source to use (repeatable)
        #[arg(long = "data-source")]
        data_sources: Vec<String>,

        /// Contact verification level
        #[arg(long)]
        verification_level: Option<String>,

        /// Output format hint for the backend
        #[arg(long)]
        output_format: Option<String>,

        /// Fill blank filters from the saved audience profile
        #[arg(long)]
        use_profile: bool,

        /// Stay attached and report progress until the job finishes
        #[arg(short, long)]
        watch: bool,
    },

    /// List jobs
    List {
        /// Keep polling and reprint when the list changes
        #[arg(short, long)]
        watch: bool,
    },

    /// Show one job
    Show {
        /// Job id
        id: String,

        /// Keep polling until the job finishes
        #[arg(short, long)]
        watch: bool,
    },

    /// Poll a job until it completes or fails
    Watch {
        /// Job id
        id: String,
    },
}

#[derive(Subcommand)]
enum LeadCommands {
    /// List leads with filters, sorting and pagination
    List {
        /// Free-text search (company, contact, email, industry, location)
        #[arg(short, long)]
        search: Option<String>,

        /// Filter by status, e.g. verified
        #[arg(long)]
        status: Option<String>,

        /// Filter by source, e.g. linkedin
        #[arg(long)]
        source: Option<String>,

        /// Filter by industry
        #[arg(long)]
        industry: Option<String>,

        /// Confidence bucket (high, medium, low)
        #[arg(short, long)]
        bucket: Option<String>,

        /// Only starred leads
        #[arg(long)]
        starred: bool,

        /// Sort key (company, contact, email, confidence, industry, location, source, status)
        #[arg(long, default_value = "company")]
        sort: String,

        /// Sort descending
        #[arg(long)]
        desc: bool,

        /// Page number
        #[arg(short, long, default_value = "1")]
        page: usize,

        /// Rows per page
        #[arg(long, default_value_t = table::DEFAULT_PAGE_SIZE)]
        per_page: usize,
    },

    /// Show one lead
    Show {
        /// Lead id
        id: String,
    },

    /// Star a lead
    Star {
        /// Lead id
        id: String,
    },

    /// Remove the star from a lead
    Unstar {
        /// Lead id
        id: String,
    },
}

#[derive(Subcommand)]
enum AudienceCommands {
    /// Send a message to the audience assistant
    Chat {
        /// The message
        #[arg(required = true)]
        message: Vec<String>,
    },

    /// Print the conversation so far
    History,

    /// Clear the conversation and start over
    Reset,

    /// Show the audience profile
    Profile {
        /// Regenerate the profile from the conversation first
        #[arg(short, long)]
        regenerate: bool,
    },

    /// Record an uploaded reference document
    Upload {
        /// Path to the document (pdf, csv, txt, md or docx)
        file: PathBuf,
    },

    /// List uploaded documents
    Documents,

    /// Forget an uploaded document
    Remove {
        /// Document id
        id: i64,
    },

    /// Suggest header mappings for a connected sheet
    Map {
        /// Sheet id
        sheet_id: String,

        /// Save the suggested mappings
        #[arg(long)]
        apply: bool,
    },

    /// Show where the audience setup stands
    Status,
}

#[derive(Subcommand)]
enum SheetCommands {
    /// Connect a Google Sheet by URL
    Connect {
        /// Full Google Sheets URL
        url: String,
    },

    /// List connected sheets
    List,

    /// Show the header columns of a connected sheet
    Columns {
        /// Sheet id
        id: String,
    },

    /// Import rows using the saved header mappings
    Sync {
        /// Sheet id
        id: String,
    },

    /// Forget a sheet locally
    Disconnect {
        /// Sheet id
        id: String,
    },
}

#[derive(Subcommand)]
enum CampaignCommands {
    /// List campaigns
    List,

    /// Create a campaign
    Create {
        /// Campaign name
        name: String,

        /// Optional description
        #[arg(short, long)]
        description: Option<String>,
    },
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    let config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .build();
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        config,
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )]);
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let api = ApiClient::new(api::resolve_base_url(cli.api_url.as_deref()));
    let db = Database::open()?;
    log::debug!("using {} against {}", db.path().display(), api.base_url());

    match cli.command {
        Commands::Dashboard => {
            let metrics = api.dashboard_metrics()?;
            println!("Total leads:       {}", metrics.total_leads);
            println!("Active jobs:       {}", metrics.active_jobs);
            println!("Success rate:      {:.1}%", metrics.success_rate);
            println!("Verified contacts: {}", metrics.verified_contacts);
        }

        Commands::Health => {
            let health = api.health()?;
            println!(
                "Backend at {} is {} (as of {})",
                api.base_url(),
                health.status,
                health.timestamp
            );
        }

        Commands::Job { command } => match command {
            JobCommands::Create {
                prompt,
                target_count,
                quality_threshold,
                industry,
                location,
                company_size,
                keywords,
                exclude_keywords,
                data_sources,
                verification_level,
                output_format,
                use_profile,
                watch,
            } => {
                if prompt.trim().is_empty() {
                    return Err(anyhow!("Prompt must not be empty."));
                }
                if target_count == 0 {
                    return Err(anyhow!("Target count must be at least 1."));
                }
                let mut request = CreateJobRequest::new(prompt, target_count);
                request.quality_threshold = quality_threshold;
                request.industry = industry;
                request.location = location;
                request.company_size = company_size;
                request.keywords = keywords;
                request.exclude_keywords = exclude_keywords;
                request.data_sources = data_sources;
                request.verification_level = verification_level;
                request.output_format = output_format;

                if use_profile {
                    match db.load_profile()? {
                        Some(profile) => audience::apply_profile(&mut request, &profile),
                        None => println!(
                            "No audience profile saved yet; continuing without it."
                        ),
                    }
                }

                let job = api.create_job(&request)?;
                println!("Started job {} ({})", job.id, job.status);
                if !job.message.is_empty() {
                    println!("  {}", job.message);
                }

                if watch {
                    watch_until_done(&api, &job.id);
                } else {
                    println!("Follow it with: prospect job watch {}", job.id);
                }
            }

            JobCommands::List { watch } => {
                if watch {
                    println!("Watching jobs (Ctrl+C to stop)...");
                    let handle = watch::watch_jobs(api.clone(), watch::LIST_POLL_INTERVAL);
                    while let Some(event) = handle.recv() {
                        match event {
                            WatchEvent::Jobs(jobs) => {
                                println!();
                                print_job_table(&jobs);
                            }
                            WatchEvent::Error(err) => {
                                println!("  (transient error: {err}; retrying)")
                            }
                            _ => {}
                        }
                    }
                } else {
                    let jobs = api.list_jobs()?;
                    if jobs.is_empty() {
                        println!("No jobs yet. Start one with 'prospect job create'.");
                    } else {
                        print_job_table(&jobs);
                    }
                }
            }

            JobCommands::Show { id, watch } => {
                if watch {
                    watch_until_done(&api, &id);
                } else {
                    match api.get_job(&id) {
                        Ok(job) => print_job_detail(&job),
                        Err(err) if err.is_not_found() => {
                            println!("Job '{id}' not found. See 'prospect job list'.")
                        }
                        Err(err) => return Err(err.into()),
                    }
                }
            }

            JobCommands::Watch { id } => watch_until_done(&api, &id),
        },

        Commands::Leads { command } => match command {
            LeadCommands::List {
                search,
                status,
                source,
                industry,
                bucket,
                starred,
                sort,
                desc,
                page,
                per_page,
            } => {
                let query = LeadQuery {
                    search,
                    status,
                    source,
                    industry,
                    bucket: parse_bucket(bucket.as_deref())?,
                    starred_only: starred,
                    sort: parse_sort(&sort)?,
                    direction: if desc {
                        SortDirection::Descending
                    } else {
                        SortDirection::Ascending
                    },
                };

                let mut leads = api.list_leads()?;
                db.apply_stars(&mut leads)?;
                let rows = query.apply(&leads);
                let page = table::paginate(&rows, page, per_page);

                if page.total_items == 0 {
                    println!("No leads match.");
                } else {
                    print_lead_table(page.items);
                    println!(
                        "\nPage {} of {} ({} lead{})",
                        page.page,
                        page.total_pages,
                        page.total_items,
                        if page.total_items == 1 { "" } else { "s" }
                    );
                }
            }

            LeadCommands::Show { id } => match api.get_lead(&id) {
                Ok(mut lead) => {
                    db.apply_stars(std::slice::from_mut(&mut lead))?;
                    print_lead_detail(&lead);
                }
                Err(err) if err.is_not_found() => {
                    println!("Lead '{id}' not found. See 'prospect leads list'.")
                }
                Err(err) => return Err(err.into()),
            },

            LeadCommands::Star { id } => match api.get_lead(&id) {
                Ok(_) => {
                    db.set_starred(&id, true)?;
                    println!("Starred lead {id}.");
                }
                Err(err) if err.is_not_found() => {
                    println!("Lead '{id}' not found. See 'prospect leads list'.")
                }
                Err(err) => return Err(err.into()),
            },

            LeadCommands::Unstar { id } => {
                db.set_starred(&id, false)?;
                println!("Removed star from lead {id}.");
            }
        },

        Commands::Browse {
            search,
            bucket,
            starred,
        } => {
            let query = LeadQuery {
                search,
                bucket: parse_bucket(bucket.as_deref())?,
                starred_only: starred,
                ..Default::default()
            };
            tui::run_browse(&api, &db, query, &tui::Theme::default())?;
        }

        Commands::Audience { command } => match command {
            AudienceCommands::Chat { message } => {
                let text = message.join(" ");
                let outcome = audience::send_chat(&api, &db, &text)?;
                print_wrapped("assistant", &outcome.reply);
                if outcome.profile.is_some() {
                    println!("\nAudience profile updated. View it with 'prospect audience profile'.");
                }
            }

            AudienceCommands::History => {
                for message in audience::history(&db)? {
                    let who = match message.role {
                        ChatRole::User => "you",
                        ChatRole::Assistant => "assistant",
                    };
                    print_wrapped(who, &message.content);
                }
            }

            AudienceCommands::Reset => {
                db.reset_chat(audience::GREETING)?;
                println!("Conversation cleared.");
            }

            AudienceCommands::Profile { regenerate } => {
                let profile = if regenerate {
                    let profile = audience::regenerate_profile(&api, &db)?;
                    println!("Profile regenerated.\n");
                    profile
                } else {
                    audience::current_profile(&db)?
                };
                print_profile(&profile);
                match db.profile_updated_at()? {
                    Some(at) => println!("\nLast updated: {at}"),
                    None => println!(
                        "\n(Starter profile. Chat with 'prospect audience chat' to build yours.)"
                    ),
                }
            }

            AudienceCommands::Upload { file } => {
                let doc = audience::upload_document(&db, &file)?;
                println!(
                    "Stored {} ({}, {} bytes)",
                    doc.name, doc.content_type, doc.size_bytes
                );
            }

            AudienceCommands::Documents => {
                let docs = db.list_documents()?;
                if docs.is_empty() {
                    println!("No documents uploaded.");
                } else {
                    println!("{:<6} {:<32} {:>10} {:<20} {:<20}", "ID", "NAME", "SIZE", "TYPE", "UPLOADED");
                    println!("{}", "-".repeat(92));
                    for doc in docs {
                        println!(
                            "{:<6} {:<32} {:>10} {:<20} {:<20}",
                            doc.id,
                            truncate(&doc.name, 30),
                            doc.size_bytes,
                            doc.content_type,
                            doc.uploaded_at
                        );
                    }
                }
            }

            AudienceCommands::Remove { id } => {
                if db.remove_document(id)? {
                    println!("Removed document #{id}.");
                } else {
                    println!("Document #{id} not found.");
                }
            }

            AudienceCommands::Map { sheet_id, apply } => {
                let Some(sheet) = db.get_sheet(&sheet_id)? else {
                    println!("Sheet '{sheet_id}' is not connected.");
                    return Ok(());
                };
                if sheet.columns.is_empty() {
                    println!("Sheet '{}' has no header columns recorded.", sheet.name);
                    return Ok(());
                }

                let suggestions = audience::suggest_mappings(&sheet.columns);
                println!("{:<28} {}", "SHEET HEADER", "LEAD FIELD");
                println!("{}", "-".repeat(46));
                for suggestion in &suggestions {
                    println!(
                        "{:<28} {}",
                        truncate(&suggestion.source_header, 26),
                        suggestion.lead_field.unwrap_or("-")
                    );
                }

                if apply {
                    let mappings = sheets::suggested_mappings_for(&sheet);
                    let count = mappings.len();
                    db.save_mappings(&sheet.id, &mappings)?;
                    println!("\nSaved {count} mapping{}.", if count == 1 { "" } else { "s" });
                } else {
                    println!("\nRun with --apply to save these mappings.");
                }
            }

            AudienceCommands::Status => {
                let status = audience::workflow_status(&db)?;
                println!(
                    "Step: {}{}",
                    status.step.label(),
                    if status.step.is_skippable() {
                        " (optional, skip with 'prospect audience profile -r')"
                    } else {
                        ""
                    }
                );
                println!("  chat messages: {}", status.messages);
                println!("  documents:     {}", status.documents);
                println!("  sheets:        {}", status.sheets);
                println!(
                    "  profile:       {}",
                    if status.has_profile { "saved" } else { "not generated yet" }
                );
            }
        },

        Commands::Sheets { command } => match command {
            SheetCommands::Connect { url } => {
                let sheet = sheets::connect(&api, &db, &url)?;
                println!("Connected '{}' (id: {})", sheet.name, sheet.id);
                if sheet.columns.is_empty() {
                    println!("No header columns reported.");
                } else {
                    println!("Columns: {}", sheet.columns.join(", "));
                    println!("Map them with: prospect audience map {}", sheet.id);
                }
            }

            SheetCommands::List => {
                let sheets = db.list_sheets()?;
                if sheets.is_empty() {
                    println!("No sheets connected.");
                } else {
                    println!("{:<12} {:<28} {:>6} {:<20}", "ID", "NAME", "ROWS", "LAST SYNCED");
                    println!("{}", "-".repeat(70));
                    for sheet in sheets {
                        let rows = sheet
                            .row_count
                            .map(|n| n.to_string())
                            .unwrap_or_else(|| "-".to_string());
                        println!(
                            "{:<12} {:<28} {:>6} {:<20}",
                            truncate(&sheet.id, 10),
                            truncate(&sheet.name, 26),
                            rows,
                            sheet.last_synced.unwrap_or_else(|| "never".to_string())
                        );
                    }
                }
            }

            SheetCommands::Columns { id } => match db.get_sheet(&id)? {
                Some(sheet) => {
                    if sheet.columns.is_empty() {
                        println!("Sheet '{}' has no header columns recorded.", sheet.name);
                    } else {
                        for column in &sheet.columns {
                            println!("{column}");
                        }
                    }
                }
                None => println!("Sheet '{id}' is not connected."),
            },

            SheetCommands::Sync { id } => {
                let rows = sheets::sync(&api, &db, &id)?;
                println!("Synced {rows} row{}.", if rows == 1 { "" } else { "s" });
            }

            SheetCommands::Disconnect { id } => {
                if db.disconnect_sheet(&id)? {
                    println!("Disconnected sheet {id}.");
                } else {
                    println!("Sheet '{id}' is not connected.");
                }
            }
        },

        Commands::Campaign { command } => match command {
            CampaignCommands::List => {
                let campaigns = api.list_campaigns()?;
                if campaigns.is_empty() {
                    println!("No campaigns yet.");
                } else {
                    println!("{:<12} {:<28} {:>6} {:<20}", "ID", "NAME", "LEADS", "CREATED");
                    println!("{}", "-".repeat(70));
                    for campaign in campaigns {
                        println!(
                            "{:<12} {:<28} {:>6} {:<20}",
                            truncate(&campaign.id, 10),
                            truncate(&campaign.name, 26),
                            campaign.lead_count,
                            campaign.created_at.unwrap_or_default()
                        );
                    }
                }
            }

            CampaignCommands::Create { name, description } => {
                let campaign = api.create_campaign(&api::CreateCampaignRequest {
                    name,
                    description,
                })?;
                println!("Created campaign '{}' (id: {})", campaign.name, campaign.id);
            }
        },
    }

    Ok(())
}

/// Attach to a job and print progress lines until it reaches a terminal
/// status. Poll failures are reported and retried, never fatal.
fn watch_until_done(api: &ApiClient, id: &str) {
    let final_job = watch::wait_for_job(
        api.clone(),
        id,
        watch::JOB_POLL_INTERVAL,
        |event| match event {
            WatchEvent::Job(job) => {
                println!("  [{:>3}%] {:<11} {}", job.progress, job.status, job.message)
            }
            WatchEvent::Error(err) => println!("  (transient error: {err}; retrying)"),
            _ => {}
        },
    );

    match final_job {
        Some(job) => match job.status {
            JobStatus::Completed => {
                println!(
                    "Job {} completed with {} lead{}.",
                    job.id,
                    job.leads.len(),
                    if job.leads.len() == 1 { "" } else { "s" }
                );
                if !job.leads.is_empty() {
                    println!();
                    print_lead_table(&job.leads);
                }
            }
            JobStatus::Failed => {
                println!(
                    "Job {} failed: {}",
                    job.id,
                    job.error.as_deref().unwrap_or("no error reported")
                );
            }
            _ => {}
        },
        None => println!("Watch ended before the job finished."),
    }
}

// --- Output helpers ---

fn print_job_table(jobs: &[Job]) {
    println!(
        "{:<14} {:<11} {:>5} {:>6} {:<20} {}",
        "ID", "STATUS", "PROG", "LEADS", "CREATED", "MESSAGE"
    );
    println!("{}", "-".repeat(90));
    for job in jobs {
        println!(
            "{:<14} {:<11} {:>4}% {:>6} {:<20} {}",
            truncate(&job.id, 12),
            job.status,
            job.progress,
            job.leads.len(),
            truncate(job.created_at.as_deref().unwrap_or("-"), 18),
            truncate(&job.message, 30)
        );
    }
}

fn print_job_detail(job: &Job) {
    println!("Job {}", job.id);
    println!("Status:   {}", job.status);
    println!("Progress: {}%", job.progress);
    if !job.message.is_empty() {
        println!("Message:  {}", job.message);
    }
    if let Some(created) = &job.created_at {
        println!("Created:  {created}");
    }
    if let Some(completed) = &job.completed_at {
        println!("Finished: {completed}");
    }
    if let Some(error) = &job.error {
        println!("Error:    {error}");
    }
    if !job.leads.is_empty() {
        println!("\nLeads ({}):", job.leads.len());
        print_lead_table(&job.leads);
    }
}

fn print_lead_table(leads: &[Lead]) {
    println!(
        "  {:<12} {:<24} {:<20} {:<28} {:>5} {:<10}",
        "ID", "COMPANY", "CONTACT", "EMAIL", "CONF", "STATUS"
    );
    println!("  {}", "-".repeat(104));
    for lead in leads {
        let star = if lead.starred { "*" } else { " " };
        println!(
            "{} {:<12} {:<24} {:<20} {:<28} {:>4.0}% {:<10}",
            star,
            truncate(lead.id.as_deref().unwrap_or("-"), 10),
            truncate(&lead.company, 22),
            truncate(&lead.contact_name, 18),
            truncate(&lead.email, 26),
            lead.confidence * 100.0,
            lead.status.as_deref().unwrap_or("-")
        );
    }
}

fn print_lead_detail(lead: &Lead) {
    if lead.starred {
        println!("* {}", lead.company);
    } else {
        println!("{}", lead.company);
    }
    println!("Contact:    {}", lead.contact_name);
    println!("Email:      {}", lead.email);
    if let Some(phone) = &lead.phone {
        println!("Phone:      {phone}");
    }
    if let Some(industry) = &lead.industry {
        println!("Industry:   {industry}");
    }
    if let Some(location) = &lead.location {
        println!("Location:   {location}");
    }
    if let Some(source) = &lead.source {
        println!("Source:     {source}");
    }
    if let Some(status) = &lead.status {
        println!("Status:     {status}");
    }
    let bucket = ConfidenceBucket::of(lead.confidence);
    println!(
        "Confidence: {:.0}% ({})",
        lead.confidence * 100.0,
        bucket.label()
    );
    if let Some(id) = &lead.id {
        println!("Id:         {id}");
    }
}

fn print_profile(profile: &models::AudienceProfile) {
    println!("Demographics");
    print_field("age range", &profile.demographics.age_range);
    print_list("job titles", &profile.demographics.job_titles);
    print_field("education", &profile.demographics.education);

    println!("\nPsychographics");
    print_list("pain points", &profile.psychographics.pain_points);
    print_list("goals", &profile.psychographics.goals);
    print_list("values", &profile.psychographics.values);

    println!("\nFirmographics");
    print_list("industries", &profile.firmographics.industries);
    print_list("company sizes", &profile.firmographics.company_sizes);
    print_list("locations", &profile.firmographics.locations);
    print_field("revenue range", &profile.firmographics.revenue_range);

    println!("\nBehavior");
    print_list("channels", &profile.behavior.channels);
    print_list("buying triggers", &profile.behavior.buying_triggers);
    print_list("objections", &profile.behavior.objections);
}

fn print_field(label: &str, value: &str) {
    if !value.is_empty() {
        println!("  {:<16} {}", format!("{label}:"), value);
    }
}

fn print_list(label: &str, values: &[String]) {
    if values.is_empty() {
        return;
    }
    let joined = values.join(", ");
    let wrapped = textwrap::fill(&joined, 58);
    let mut lines = wrapped.lines();
    if let Some(first) = lines.next() {
        println!("  {:<16} {}", format!("{label}:"), first);
    }
    for line in lines {
        println!("  {:<16} {}", "", line);
    }
}

fn print_wrapped(who: &str, content: &str) {
    let wrapped = textwrap::fill(content, 66);
    let mut lines = wrapped.lines();
    if let Some(first) = lines.next() {
        println!("{who:>9}  {first}");
    }
    for line in lines {
        println!("{:>9}  {line}", "");
    }
}

fn parse_bucket(raw: Option<&str>) -> Result<Option<ConfidenceBucket>> {
    match raw {
        None => Ok(None),
        Some(raw) => ConfidenceBucket::from_str(raw)
            .map(Some)
            .ok_or_else(|| anyhow!("Unknown bucket '{raw}' (use high, medium or low)")),
    }
}

fn parse_sort(raw: &str) -> Result<SortKey> {
    SortKey::from_str(raw).ok_or_else(|| {
        anyhow!(
            "Unknown sort key '{raw}' (use company, contact, email, confidence, \
             industry, location, source or status)"
        )
    })
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}
