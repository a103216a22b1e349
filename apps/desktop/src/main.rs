use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use client_core::{
    image_loader::read_data_url, load_settings, SubmissionController, TryOnClient, Wizard,
};
use shared::domain::{ImageSlot, MeasurementField, StylePreference, TryOnId};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tryon", about = "Virtual try-on from the command line")]
struct Cli {
    /// Overrides the backend URL from tryon.toml and the environment.
    #[arg(long, global = true)]
    backend_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload a photo and a garment and generate a try-on.
    Generate(GenerateArgs),
    /// Show a stored try-on result.
    Show {
        id: String,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List previous try-ons, newest first.
    History,
    /// Check that the backend is reachable.
    Health,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    #[arg(long)]
    photo: PathBuf,
    #[arg(long)]
    clothing: PathBuf,
    #[arg(long)]
    name: String,
    #[arg(long)]
    height: String,
    #[arg(long)]
    weight: String,
    #[arg(long)]
    chest: String,
    #[arg(long)]
    waist: String,
    #[arg(long)]
    hips: String,
    #[arg(long, default_value = "casual")]
    style: StylePreference,
    /// Where to write the generated image.
    #[arg(long)]
    output: Option<PathBuf>,
}

impl GenerateArgs {
    fn measurement(&self, field: MeasurementField) -> &str {
        match field {
            MeasurementField::Height => &self.height,
            MeasurementField::Weight => &self.weight,
            MeasurementField::Chest => &self.chest,
            MeasurementField::Waist => &self.waist,
            MeasurementField::Hips => &self.hips,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let mut settings = load_settings()?;
    if let Some(url) = cli.backend_url.as_deref() {
        settings = settings.with_backend_url(url)?;
    }
    info!(backend = settings.backend_url(), "tryon: using backend");
    let client = Arc::new(TryOnClient::new(settings)?);

    match cli.command {
        Command::Generate(generate) => run_generate(client, generate).await,
        Command::Show { id, output } => run_show(&client, TryOnId(id), output).await,
        Command::History => run_history(&client).await,
        Command::Health => {
            let message = client.health().await.context("backend is not reachable")?;
            println!("{message}");
            Ok(())
        }
    }
}

async fn run_generate(client: Arc<TryOnClient>, args: GenerateArgs) -> Result<()> {
    let mut wizard = Wizard::new();

    for (slot, path) in [(ImageSlot::User, &args.photo), (ImageSlot::Clothing, &args.clothing)] {
        let image = read_data_url(path)
            .await
            .with_context(|| format!("could not load the {}", slot.label()))?;
        wizard.set_image(slot, image);
    }
    if let Some(data) = wizard.data_mut() {
        data.name = args.name.clone();
    }
    wizard.next()?;

    if let Some(data) = wizard.data_mut() {
        for field in MeasurementField::ALL {
            *data.measurements.get_mut(field) = args.measurement(field).to_string();
        }
        data.style = args.style;
    }

    eprintln!("Generating your try-on, this can take a minute...");
    let controller = SubmissionController::new(client.clone())
        .with_progress_interval(client.settings().progress_interval);
    let result = controller.generate_try_on(&mut wizard).await?;

    if let Some(id) = &result.id {
        println!("id: {id}");
    }
    if let Some(feedback) = &result.feedback {
        println!("{feedback}");
    }
    match (&result.result_image, args.output) {
        (Some(image), Some(path)) => write_image(&client, image, &path).await?,
        (Some(image), None) if image.starts_with("http") => println!("image: {image}"),
        (Some(_), None) => println!("image: inline (use --output to save it)"),
        (None, _) => println!("the backend did not return an image"),
    }
    Ok(())
}

async fn run_show(client: &TryOnClient, id: TryOnId, output: Option<PathBuf>) -> Result<()> {
    let record = client.fetch_result(&id).await?;
    println!("id:       {}", record.id);
    println!("name:     {}", record.name);
    println!("style:    {}", record.style);
    println!("status:   {:?}", record.status);
    println!("created:  {}", record.created_at.to_rfc3339());
    println!(
        "measurements: {}",
        serde_json::to_string(&record.measurements)?
    );
    if let Some(feedback) = &record.feedback {
        println!("feedback: {feedback}");
    }
    if let Some(path) = output {
        let image = match record.tryon_image {
            Some(image) => image,
            None => client.fetch_result_image(&id).await?,
        };
        write_image(client, &image, &path).await?;
    }
    Ok(())
}

async fn run_history(client: &TryOnClient) -> Result<()> {
    let records = client.list_results().await?;
    if records.is_empty() {
        println!("no try-ons yet");
    }
    for record in records {
        println!(
            "{}  {}  {:<8} {:?}  {}",
            record.created_at.format("%Y-%m-%d %H:%M"),
            record.id,
            record.style,
            record.status,
            record.name
        );
    }
    Ok(())
}

async fn write_image(client: &TryOnClient, image: &str, path: &Path) -> Result<()> {
    let bytes = client.result_image_bytes(image).await?;
    tokio::fs::write(path, &bytes)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("saved {} bytes to {}", bytes.len(), path.display());
    Ok(())
}
