use crate::app::PaddockReport;
use crate::config::Config;
use crate::datasources::extraction::parse_extraction;
use crate::datasources::{CommentsClient, ExtractedAnalysis, ExtractionClient};
use crate::logic::comments::{compose, resolve_names};
use crate::logic::corrections::CorrectionProgress;
use crate::logic::rates::OptionFilter;
use crate::logic::{FertilizerCatalog, RateEngine};
use crate::models::{Element, NutrientStatus, ReleaseType};
use anyhow::{bail, Context};
use std::path::Path;

/// Read an extraction JSON file saved by `soilcorrect extract`.
pub fn read_report(file: &Path, config: &Config) -> anyhow::Result<Vec<ExtractedAnalysis>> {
    let body = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let analyses = parse_extraction(&body, config.agronomy.status_thresholds)
        .with_context(|| format!("Failed to parse {}", file.display()))?;
    Ok(analyses)
}

fn pick_paddock(
    analyses: Vec<ExtractedAnalysis>,
    paddock: Option<&str>,
) -> anyhow::Result<PaddockReport> {
    let keys: Vec<String> = analyses.iter().map(|a| a.key.clone()).collect();
    let chosen = match paddock {
        Some(key) => analyses
            .into_iter()
            .find(|a| a.key.eq_ignore_ascii_case(key)),
        None => analyses.into_iter().next(),
    };
    match chosen {
        Some(analysis) => Ok(PaddockReport::new(analysis)),
        None => bail!(
            "Paddock '{}' not found (available: {})",
            paddock.unwrap_or_default(),
            keys.join(", ")
        ),
    }
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.2}", v))
}

pub fn analyze(file: &Path, config: &Config) -> anyhow::Result<()> {
    for analysis in read_report(file, config)? {
        let paddock = PaddockReport::new(analysis);
        println!("== {} ==", paddock.display_name());
        if let Some(crop) = &paddock.info.crop {
            println!("Crop: {}", crop);
        }
        println!();
        println!(
            "{:<36} {:>10} {:>10} {:<8} {:>8}  {}",
            "Nutrient", "Current", "Ideal", "Unit", "Dev %", "Status"
        );
        for n in &paddock.profile.nutrients {
            println!(
                "{:<36} {:>10.2} {:>10} {:<8} {:>8}  {}",
                n.name,
                n.current,
                fmt_opt(n.ideal),
                n.unit,
                n.deviation_percent()
                    .map_or_else(|| "-".to_string(), |d| format!("{:+.0}", d)),
                n.status
            );
        }
        let profile = &paddock.profile;
        println!(
            "{} low, {} optimal, {} high",
            profile.with_status(NutrientStatus::Low).count(),
            profile.with_status(NutrientStatus::Optimal).count(),
            profile.with_status(NutrientStatus::High).count()
        );

        println!();
        println!("Ratios");
        for ratio in paddock.ratios() {
            let status = ratio
                .status()
                .map_or_else(|| "n/a".to_string(), |s| s.to_string());
            println!(
                "  {:<6} {:>8} (ideal {}) {}",
                ratio.label,
                fmt_opt(ratio.value),
                fmt_opt(ratio.ideal),
                status
            );
        }

        let health = paddock.health();
        println!();
        println!(
            "Plant health score: {:.0} {} ({})",
            health.overall,
            health.stars,
            health.stars.label()
        );

        let corrections = paddock.corrections();
        if !corrections.is_empty() {
            let names: Vec<&str> = corrections.all().map(|n| n.name.as_str()).collect();
            println!("Corrections needed: {}", names.join(", "));
        }
        println!();
    }
    Ok(())
}

pub async fn extract(pdf: &Path, output: Option<&Path>, config: &Config) -> anyhow::Result<()> {
    let client = ExtractionClient::new(
        &config.services.extraction_url,
        config.agronomy.status_thresholds,
    );
    let body = client
        .extract_raw(pdf)
        .await
        .context("Failed to parse PDF")?;
    // Validate before saving so bad responses are caught here
    let analyses = parse_extraction(&body, config.agronomy.status_thresholds)?;

    match output {
        Some(path) => {
            std::fs::write(path, &body)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!(
                "Saved {} analyses to {}",
                analyses.len(),
                path.display()
            );
        }
        None => println!("{}", body),
    }
    Ok(())
}

pub fn catalog(
    nutrient: Option<&str>,
    release: Option<&str>,
    search: Option<&str>,
) -> anyhow::Result<()> {
    let element = match nutrient {
        Some(name) => match Element::resolve(name) {
            Some(e) => Some(e),
            None => bail!("Unknown nutrient '{}'", name),
        },
        None => None,
    };
    let release = match release {
        Some(r) => match ReleaseType::from_str(r) {
            Some(r) => Some(r),
            None => bail!("Unknown release type '{}'", r),
        },
        None => None,
    };

    let catalog = FertilizerCatalog::standard();
    for def in catalog.filter(element, release, search.unwrap_or_default()) {
        let release = def.release_type.map(|r| r.as_str()).unwrap_or("-");
        let window = def
            .ph_window
            .filter(|w| !w.is_open())
            .map(|w| w.to_string())
            .unwrap_or_default();
        println!(
            "{:<40} {:<20} {:<14} {}",
            def.label,
            release,
            window,
            def.content_summary()
        );
    }
    Ok(())
}

pub fn recommend(
    file: &Path,
    nutrient: &str,
    paddock: Option<&str>,
    config: &Config,
) -> anyhow::Result<()> {
    let report = pick_paddock(read_report(file, config)?, paddock)?;
    let Some(target) = report.profile.find_by_name(nutrient) else {
        bail!("Nutrient '{}' not found in {}", nutrient, report.display_name());
    };

    let catalog = FertilizerCatalog::standard();
    let engine = RateEngine::new(&catalog, config.agronomy.max_excess_percent());

    println!(
        "{}: {:.2} {} (ideal {}), status {}",
        target.name,
        target.current,
        target.unit,
        fmt_opt(target.ideal),
        target.status
    );
    if let Some(progress) = CorrectionProgress::compute_with_band(
        &engine,
        &report.selections,
        target,
        config.agronomy.progress_band_percent,
    ) {
        println!("Requirement: {:.2} {}", progress.requirement, target.unit);
    }
    println!(
        "Max allowed excess: {:.0}%",
        engine.max_excess_percent()
    );
    println!();

    let options = engine.ranked_options(
        target,
        &report.profile,
        &report.selections,
        &OptionFilter::default(),
    );
    if options.is_empty() {
        println!("No products supply {}", target.generic_name);
    }
    for option in options {
        println!(
            "{} {:<40} {:>9.1} kg/ha  {}",
            option.priority.symbol(),
            option.label,
            option.rate(),
            option.priority
        );
        println!("    {}", option.explanation);
        for point in &option.data_points {
            println!("    {}: {}", point.label, point.value);
        }
    }
    Ok(())
}

/// Summary from the comments service spliced with the template paragraphs.
/// Falls back to the template alone when the service cannot be reached.
async fn general_comments(report: &PaddockReport, config: &Config) -> String {
    let client = CommentsClient::new(
        &config.services.comments_url,
        config.services.ai_comments_key.clone(),
    );
    match client.fetch(&report.key, &report.comment_inputs()).await {
        Ok(summary) => compose(
            &summary.summary,
            &resolve_names(&summary.deficient),
            &resolve_names(&summary.excess),
        ),
        Err(e) => {
            tracing::warn!("Comments service failed: {}", e);
            eprintln!("Error contacting AI service.");
            report.template_comments()
        }
    }
}

pub async fn comments(
    file: &Path,
    paddock: Option<&str>,
    offline: bool,
    config: &Config,
) -> anyhow::Result<()> {
    let report = pick_paddock(read_report(file, config)?, paddock)?;
    let text = if offline {
        report.template_comments()
    } else {
        general_comments(&report, config).await
    };
    println!("{}", text);
    Ok(())
}

pub async fn export(
    file: &Path,
    output: &Path,
    paddock: Option<&str>,
    config: &Config,
) -> anyhow::Result<()> {
    let mut report = pick_paddock(read_report(file, config)?, paddock)?;
    let catalog = FertilizerCatalog::standard();
    let engine = RateEngine::new(&catalog, config.agronomy.max_excess_percent());
    let added = report.auto_select(&engine);
    tracing::info!("Auto-selected {} products for {}", added, report.key);

    let comments = general_comments(&report, config).await;
    let json = report.to_export(config, &comments).to_json()?;
    std::fs::write(output, json).with_context(|| format!("Failed to write {}", output.display()))?;
    println!(
        "Exported {} ({} recommendations) to {}",
        report.display_name(),
        report.amendments.len(),
        output.display()
    );
    Ok(())
}

pub async fn check(config: &Config) -> anyhow::Result<()> {
    println!("Configuration OK");
    println!("  Max allowed excess: {:.0}%", config.agronomy.max_excess_percent());
    println!(
        "  Status thresholds: {} / {}",
        config.agronomy.status_thresholds.low, config.agronomy.status_thresholds.high
    );
    println!();

    let extraction = ExtractionClient::new(
        &config.services.extraction_url,
        config.agronomy.status_thresholds,
    );
    match extraction.test_connection().await {
        Ok(true) => println!("Extraction service: OK"),
        Ok(false) => println!("Extraction service: ERROR"),
        Err(e) => println!("Extraction service: OFFLINE ({})", e),
    }

    let comments = CommentsClient::new(
        &config.services.comments_url,
        config.services.ai_comments_key.clone(),
    );
    match comments.test_connection().await {
        Ok(true) => println!("Comments service: OK"),
        Ok(false) => println!("Comments service: ERROR"),
        Err(e) => println!("Comments service: OFFLINE ({})", e),
    }
    Ok(())
}
