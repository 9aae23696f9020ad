//! Course outline generator: the reference consumer of the extraction engine.
//!
//! One extraction call in list-input mode produces a unit (title plus
//! chapters with YouTube search queries) per requested topic; an optional
//! second call in single mode suggests an image search term for the course.

use anyhow::{Context, bail};
use clap::Parser;
use outform::prelude::*;
use outform_openai::{OpenAiClient, OpenAiConfig};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{info, warn};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Course title.
    #[arg(long)]
    title: String,

    /// Unit topics; one generated unit per flag, in order.
    #[arg(long = "unit", required = true)]
    units: Vec<String>,

    /// Model identifier passed to the chat endpoint.
    #[arg(long, default_value = outform::DEFAULT_MODEL)]
    model: String,

    /// Sampling temperature for unit generation.
    #[arg(long, default_value_t = 0.7)]
    temperature: f32,

    /// Attempt budget per extraction call.
    #[arg(long, default_value_t = 3)]
    attempts: usize,

    /// Also suggest an image search term for the course.
    #[arg(long)]
    image_term: bool,

    /// Log composed prompts and raw responses.
    #[arg(long)]
    verbose: bool,
}

/// One generated unit, in the shape the surrounding application persists.
#[derive(Debug, Serialize, Deserialize)]
struct CourseUnit {
    title: String,
    chapters: Vec<Chapter>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Chapter {
    chapter_title: String,
    youtube_search_query: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let api_key = std::env::var("OPENAI_API_KEY").context("OPENAI_API_KEY is not set")?;
    let mut config = OpenAiConfig::new(api_key);
    if let Ok(endpoint) = std::env::var("OPENAI_BASE_URL") {
        config = config.with_endpoint(endpoint);
    }
    let extractor = Extractor::new(OpenAiClient::new(config)?);

    let units = generate_units(&extractor, &cli).await?;
    let mut output = json!({ "course": cli.title, "units": units });

    if cli.image_term {
        match image_search_term(&extractor, &cli).await {
            Ok(Some(term)) => {
                output["image_search_term"] = Value::String(term);
            }
            Ok(None) => warn!("image search term extraction failed; continuing without one"),
            Err(err) => warn!(%err, "image search term extraction errored; continuing without one"),
        }
    }

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn generate_units<C: ModelClient>(
    extractor: &Extractor<C>,
    cli: &Cli,
) -> anyhow::Result<Vec<CourseUnit>> {
    let schema = OutputSchema::new()
        .text("title", "title of the unit")
        .text(
            "chapters",
            "an array of chapters, each chapter should have a youtube_search_query and a \
             chapter_title key in the JSON object",
        );

    let prompts: Vec<String> = cli
        .units
        .iter()
        .map(|unit| {
            format!(
                "Create a comprehensive unit about \"{unit}\" as part of a course titled \
                 \"{title}\". Generate relevant chapters with detailed YouTube search queries \
                 that will find educational videos for each chapter.",
                title = cli.title,
            )
        })
        .collect();

    let request = ExtractionRequest::new(
        "You are an AI capable of curating course content, coming up with relevant chapter \
         titles, and finding relevant youtube videos for each chapter",
        prompts,
        schema,
    )
    .with_model(cli.model.as_str())
    .with_temperature(cli.temperature)
    .with_max_attempts(cli.attempts)
    .with_verbose(cli.verbose);

    let (extraction, metrics) = extractor.extract(&request).await?;
    let units = match extraction {
        Extraction::Many(units) => units,
        Extraction::Single(unit) => vec![unit],
        Extraction::Exhausted(report) => {
            bail!("course generation failed after {} attempts", report.attempts)
        }
    };
    if units.is_empty() {
        bail!("the model produced no units");
    }
    info!(
        units = units.len(),
        attempts = metrics.attempts,
        coercions = metrics.coercions,
        "course content generated"
    );

    units
        .into_iter()
        .map(|unit| {
            serde_json::from_value(unit).context("generated unit did not match the expected shape")
        })
        .collect()
}

async fn image_search_term<C: ModelClient>(
    extractor: &Extractor<C>,
    cli: &Cli,
) -> anyhow::Result<Option<String>> {
    let schema = OutputSchema::new().text(
        "image_search_term",
        "a good search term for the title of the course",
    );
    let request = ExtractionRequest::new(
        "you are an AI capable of finding the most relevant image for a course",
        format!(
            "Please provide a good image search term for the title of a course about {title}. \
             This search term will be fed into the unsplash API, so make sure it is a good \
             search term that will return good results",
            title = cli.title,
        ),
        schema,
    )
    .with_model(cli.model.as_str())
    .with_verbose(cli.verbose);

    let (extraction, _) = extractor.extract(&request).await?;
    match extraction {
        Extraction::Single(object) => Ok(object
            .get("image_search_term")
            .and_then(Value::as_str)
            .map(String::from)),
        Extraction::Many(_) | Extraction::Exhausted(_) => Ok(None),
    }
}
