use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context};
use colored::Colorize;
use garc_archive::{ArchiveSummary, UnarchiveContext};
use garc_expr::{registry, Ex, ExArchive};
use serde::Serialize;
use tracing::debug;

use crate::cli::*;
use crate::config::CliConfig;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = CliConfig::load_or_default(cli.config.as_deref())?;
    let format = config.format(cli.format);
    debug!(?format, symbols = config.symbols.len(), "loaded cli config");
    match cli.command {
        Command::Dump(args) => cmd_dump(args),
        Command::List(args) => cmd_list(args, format),
        Command::Show(args) => cmd_show(args, &config, format),
        Command::Summary(args) => cmd_summary(args, format),
        Command::Demo(args) => cmd_demo(args),
    }
}

fn open(path: &Path) -> anyhow::Result<ExArchive> {
    ExArchive::open(path).with_context(|| format!("opening archive {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_dump(args: FileArgs) -> anyhow::Result<()> {
    let ar = open(&args.file)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    ar.printraw(&mut out)?;
    out.flush()?;
    Ok(())
}

fn cmd_list(args: FileArgs, format: OutputFormat) -> anyhow::Result<()> {
    let ar = open(&args.file)?;
    let summary = ar.summary()?;
    match format {
        OutputFormat::Json => print_json(&summary.expressions),
        OutputFormat::Text => {
            if summary.expressions.is_empty() {
                println!("No expressions.");
            }
            for root in &summary.expressions {
                println!(
                    "{:>4}  {}  {}",
                    root.index.to_string().dimmed(),
                    root.name.bold(),
                    format!("node {}", root.root).cyan()
                );
            }
            Ok(())
        }
    }
}

#[derive(Debug, Serialize)]
struct ShownExpression {
    index: usize,
    name: String,
    expression: String,
}

fn cmd_show(args: ShowArgs, config: &CliConfig, format: OutputFormat) -> anyhow::Result<()> {
    let ar = open(&args.file)?;
    let symbols: Vec<Ex> = config
        .symbol_names(&args.symbols)
        .into_iter()
        .map(Ex::symbol)
        .collect();
    let shown = show_expressions(&ar, args.name.as_deref(), args.index, &symbols)?;
    match format {
        OutputFormat::Json => print_json(&shown),
        OutputFormat::Text => {
            for e in &shown {
                println!("{} = {}", e.name.bold(), e.expression);
            }
            Ok(())
        }
    }
}

/// Unarchive the selected roots, or all of them when neither a name nor an
/// index is given.
fn show_expressions(
    ar: &ExArchive,
    name: Option<&str>,
    index: Option<usize>,
    symbols: &[Ex],
) -> anyhow::Result<Vec<ShownExpression>> {
    let reg = registry();
    let ctx = UnarchiveContext::new(&reg).with_symbols(symbols);
    let indices: Vec<usize> = match (name, index) {
        (Some(_), Some(_)) => bail!("give an expression name or --index, not both"),
        (None, Some(i)) => vec![i],
        (Some(name), None) => {
            let i = (0..ar.num_expressions())
                .find(|&i| ar.expression_name(i).is_ok_and(|n| n == name))
                .with_context(|| format!("no expression named {name:?}"))?;
            vec![i]
        }
        (None, None) => (0..ar.num_expressions()).collect(),
    };
    indices
        .into_iter()
        .map(|index| {
            let (name, ex) = ar.unarchive_ex_with_name(ctx, index)?;
            Ok(ShownExpression {
                index,
                name,
                expression: ex.to_string(),
            })
        })
        .collect::<anyhow::Result<Vec<_>>>()
}

fn cmd_summary(args: FileArgs, format: OutputFormat) -> anyhow::Result<()> {
    let ar = open(&args.file)?;
    let summary = ar.summary()?;
    match format {
        OutputFormat::Json => print_json(&summary),
        OutputFormat::Text => {
            print_summary_text(&summary);
            Ok(())
        }
    }
}

fn print_summary_text(summary: &ArchiveSummary) {
    let props: usize = summary.nodes.iter().map(|n| n.properties.len()).sum();
    println!("Version:     {}", summary.version.to_string().bold());
    println!("Atoms:       {}", summary.atoms.len());
    println!("Expressions: {}", summary.expressions.len());
    println!("Nodes:       {} ({} properties)", summary.nodes.len(), props);
}

/// Expressions that share sub-expressions, so the written archive shows node
/// reuse.
fn demo_archive() -> ExArchive {
    let x = Ex::symbol("x");
    let y = Ex::symbol("y");
    let sum = Ex::add(vec![x.clone(), y.clone()]);
    let square = Ex::pow(sum.clone(), Ex::integer(2));
    let product = Ex::mul(vec![sum.clone(), sum, Ex::integer(-3), x]);

    let mu = Ex::symbol("mu");
    let nu = Ex::symbol("nu");
    let dim = Ex::integer(4);
    let up = Ex::varidx(mu.clone(), dim.clone(), false);
    let down = Ex::varidx(mu, dim.clone(), true);
    let nu_up = Ex::varidx(nu, dim, false);
    let gammas = Ex::mul(vec![
        Ex::dirac_gamma(up.clone(), 0),
        Ex::dirac_gamma(nu_up.clone(), 0),
        Ex::dirac_gamma(down.clone(), 0),
    ]);
    let metric = Ex::lorentz_g(up.clone(), nu_up.clone(), false);
    let eps = Ex::epsilon(vec![up, nu_up, down], true, false);

    let mut ar = ExArchive::new();
    ar.archive_ex(&square, "square");
    ar.archive_ex(&product, "product");
    ar.archive_ex(&y, "y");
    ar.archive_ex(&gammas, "gammas");
    ar.archive_ex(&metric, "metric");
    ar.archive_ex(&eps, "epsilon");
    ar
}

fn cmd_demo(args: FileArgs) -> anyhow::Result<()> {
    let ar = demo_archive();
    ar.save(&args.file)
        .with_context(|| format!("writing archive {}", args.file.display()))?;
    println!(
        "{} Wrote {} expressions ({} nodes, {} atoms) to {}",
        "✓".green().bold(),
        ar.num_expressions(),
        ar.nodes().len(),
        ar.atoms().len(),
        args.file.display().to_string().bold()
    );
    Ok(())
}
