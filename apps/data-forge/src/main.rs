// [apps/data-forge/src/main.rs]
/*!
 * =================================================================
 * APARATO: DATA FORGE MAIN ENTRY POINT (V10.0 - LAB CARTOGRAPHER)
 * CLASIFICACIÓN: APPLICATION SHELL (ESTRATO L6)
 * RESPONSABILIDAD: SÍNTESIS DE CORPUS Y CRISTALIZACIÓN CSV
 * =================================================================
 */

use aegis_data_forge::{SynthesisProfile, TransactionSynthesizer};
use aegis_domain_features::records_to_csv;
use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing::info;

/// Coordenadas de mando del cartógrafo.
#[derive(Debug, Parser)]
#[command(name = "aegis-data-forge", about = "Synthetic fraud transaction dataset forge")]
struct ForgeCommand {
    /// Filas totales del corpus.
    #[arg(long, default_value_t = 100_000)]
    rows: usize,

    /// Prevalencia de fraude en [0, 1].
    #[arg(long, default_value_t = 0.05)]
    fraud_rate: f64,

    /// Cardinalidad del universo de usuarios.
    #[arg(long, default_value_t = 2_500)]
    users: usize,

    /// Semilla del universo sintético.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Desplazamiento de media de montos (σ) para inyección de deriva.
    #[arg(long, default_value_t = 0.0)]
    amount_shift_sigmas: f64,

    /// Ruta de salida del CSV cristalizado.
    #[arg(long, default_value = "dist/synthetic_transactions.csv")]
    output: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").compact().init();

    let command = ForgeCommand::parse();
    info!(
        "🗺️  [DATA_FORGE]: Synthesizing {} rows (fraud rate {:.1}%, seed {})...",
        command.rows,
        command.fraud_rate * 100.0,
        command.seed
    );

    let progress_bar = ProgressBar::new(3);
    progress_bar.set_style(
        ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    progress_bar.set_message("synthesis");
    let records = TransactionSynthesizer::synthesize(&SynthesisProfile {
        row_count: command.rows,
        fraud_rate: command.fraud_rate,
        user_count: command.users,
        random_seed: command.seed,
        amount_shift_sigmas: command.amount_shift_sigmas,
    });
    progress_bar.inc(1);

    progress_bar.set_message("csv crystallization");
    let csv_bytes = records_to_csv(&records).context("csv serialization")?;
    progress_bar.inc(1);

    progress_bar.set_message("physical write");
    if let Some(parent_directory) = command.output.parent() {
        std::fs::create_dir_all(parent_directory)?;
    }
    std::fs::write(&command.output, &csv_bytes)?;
    progress_bar.inc(1);
    progress_bar.finish_with_message("sealed");

    info!(
        "✅ [DATA_FORGE]: Corpus sealed at {:?} ({} bytes).",
        command.output,
        csv_bytes.len()
    );
    Ok(())
}
