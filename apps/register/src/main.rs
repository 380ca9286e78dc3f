use std::{io::Write, path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use registration_core::{load_settings_from, FormEvent, RegistrationController, SubmitOutcome};
use shared::{
    domain::{CallSite, FormFields, SubmissionStatus},
    pricing::PricingTier,
};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Drive the domain registration form from the terminal")]
struct Cli {
    #[arg(long, default_value = registration_core::config::DEFAULT_SETTINGS_FILE)]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open the form, fill it in and submit it.
    Submit {
        #[arg(long, default_value = "")]
        domain: String,
        #[arg(long, default_value = "")]
        wallet: String,
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long, value_enum, default_value_t = Site::Register)]
        from: Site,
        /// Print every form event as a JSON line instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Show which pricing tier a domain falls into.
    Price { domain: String },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Site {
    Hero,
    Pricing,
    Faq,
    Register,
}

fn call_site(site: Site, domain: &str) -> CallSite {
    match site {
        Site::Hero => CallSite::Hero,
        Site::Pricing => {
            CallSite::Pricing(PricingTier::for_domain(domain).unwrap_or(PricingTier::Standard))
        }
        Site::Faq => CallSite::Faq,
        Site::Register => CallSite::RegisterSection,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
    let cli = Cli::parse();

    match cli.command {
        Command::Submit {
            domain,
            wallet,
            email,
            name,
            from,
            json,
        } => {
            let settings = load_settings_from(&cli.config)
                .with_context(|| format!("failed to load {}", cli.config.display()))?;
            let site = call_site(from, &domain);
            let fields = FormFields::new(domain, wallet, email, name);
            run_submission(RegistrationController::new(&settings), site, fields, json).await
        }
        Command::Price { domain } => {
            match PricingTier::for_domain(&domain) {
                Some(tier) => println!(
                    "{domain}.near: {} ({}) {} one-time fee in NEAR tokens - {}",
                    tier.title(),
                    tier.tagline(),
                    tier.price_label(),
                    tier.cta_label()
                ),
                None => println!("enter a domain to see its price"),
            }
            Ok(())
        }
    }
}

async fn run_submission(
    controller: Arc<RegistrationController>,
    site: CallSite,
    fields: FormFields,
    json: bool,
) -> Result<()> {
    let mut events = controller.subscribe_events();
    let renderer = tokio::spawn(async move {
        render_until_closed(&mut events, &mut std::io::stdout(), json).await
    });

    controller.launcher(site).request_open().await;
    controller.set_fields(fields).await;

    let outcome = controller.submit().await;
    if outcome != SubmitOutcome::Registered {
        // nobody is here to press "Try Again"
        controller.close().await;
    }
    renderer
        .await
        .context("form renderer stopped unexpectedly")?
        .context("failed to render form events")?;

    match outcome {
        SubmitOutcome::Registered => Ok(()),
        SubmitOutcome::Failed(err) => bail!("registration failed: {err}"),
        SubmitOutcome::Abandoned | SubmitOutcome::Rejected(_) => {
            bail!("registration did not complete: {outcome:?}")
        }
    }
}

/// Writes form events to `out` until the form closes. Falling behind the channel
/// only skips the missed events.
async fn render_until_closed(
    events: &mut broadcast::Receiver<FormEvent>,
    out: &mut impl Write,
    json: bool,
) -> Result<()> {
    loop {
        match events.recv().await {
            Ok(event) => {
                render(&event, json, &mut *out)?;
                if matches!(event, FormEvent::Closed { .. }) {
                    return Ok(());
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "form renderer fell behind; some events were not shown");
            }
            Err(RecvError::Closed) => bail!("form went away before it was closed"),
        }
    }
}

fn render(event: &FormEvent, json: bool, out: &mut impl Write) -> Result<()> {
    if json {
        writeln!(out, "{}", serde_json::to_string(event)?)?;
        return Ok(());
    }

    match event {
        FormEvent::Opened { site } => writeln!(
            out,
            "Register Domain (opened from {})",
            site.map(CallSite::name).unwrap_or("page")
        )?,
        FormEvent::FieldChanged { .. } | FormEvent::StatusChanged(SubmissionStatus::Idle) => {}
        FormEvent::StatusChanged(SubmissionStatus::Submitting) => writeln!(out, "Registering...")?,
        FormEvent::StatusChanged(SubmissionStatus::Success) => writeln!(
            out,
            "Registration Successful! Your domain has been registered successfully."
        )?,
        FormEvent::StatusChanged(SubmissionStatus::Error(err)) => {
            writeln!(out, "Registration Failed: {err}")?
        }
        FormEvent::Closed { fields_reset: true } => writeln!(out, "Form closed and cleared.")?,
        FormEvent::Closed { fields_reset: false } => writeln!(out, "Form closed.")?,
    }
    Ok(())
}
