//! Per-diagram pipeline driver.
//!
//! One call drives one diagram through the staged batch pipeline:
//! canonicalize and extract abbreviations (growing the shared table and the
//! record stream), then optimize, split on the indicator pair, and emit the
//! two artifact streams. Stages are separated by explicit barriers — each
//! stage receives a fully normalized snapshot, never partially rewritten
//! state — and all errors abort only this diagram's run.
//!
//! The table and its counters are the only shared mutable state. Callers
//! processing diagrams in parallel must give each its own table or serialize
//! access to a shared one.

use std::io;

use log::info;

use crate::abbrev::{AbbrevTable, RecordWriter, extract_abbreviations};
use crate::canon::{BracketMode, SymbolSet};
use crate::config::DiagramConfig;
use crate::core::expr::Expr;
use crate::core::symbol::symb;
use crate::emit;
use crate::error::AbbrevError;
use crate::optimize::optimize;
use crate::split::split;

/// What one diagram's run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// The processed diagram's identifier.
    pub diagram_id: String,
    /// Abbreviation table entries added by this run.
    pub new_abbreviations: usize,
    /// Assignments introduced by the optimizer pass.
    pub optimizer_assignments: usize,
}

/// Process one diagram: extract abbreviations from `expr`, optimize, split
/// on the configured indicator pair, and emit all three artifact streams.
///
/// `expr` is the tagged total (both contributions weighted by their
/// indicator symbols); the generated procedure reconstructs the primary
/// quantity and the optimized stream carries the secondary assignment.
///
/// # Errors
/// Configuration errors (`EmptySymbolSet`, `PrefixCollision`) are returned
/// before any extraction work; extraction and sink failures abort this
/// diagram's run.
pub fn process_diagram<W1, W2, W3>(
    expr: &Expr,
    cfg: &DiagramConfig,
    table: &mut AbbrevTable,
    abbrev_sink: W1,
    optimized_sink: W2,
    procedure_sink: W3,
) -> Result<RunSummary, AbbrevError>
where
    W1: io::Write,
    W2: io::Write,
    W3: io::Write,
{
    cfg.validate()?;
    table.claim(&cfg.abbrev_prefix, &cfg.diagram_id)?;

    let primary_tag = symb(&cfg.split_tags.0);
    let secondary_tag = symb(&cfg.split_tags.1);

    let mut set = SymbolSet::from_names(&cfg.bracket_symbols);
    // The split tags are never abbreviated: keep them on the external side
    // of the bracketing in either mode.
    match cfg.mode {
        BracketMode::Bracket => {
            set.insert(primary_tag);
            set.insert(secondary_tag);
        }
        BracketMode::AntiBracket => {
            set.remove(primary_tag);
            set.remove(secondary_tag);
        }
    }

    let entries_before = table.len();
    let mut writer = RecordWriter::new(abbrev_sink);
    let abbreviated =
        extract_abbreviations(expr, &set, cfg.mode, &cfg.abbrev_prefix, table, &mut writer)?;
    writer.into_inner()?;
    let new_abbreviations = table.len() - entries_before;
    info!(
        "diagram {}: {new_abbreviations} new abbreviations under '{}'",
        cfg.diagram_id, cfg.abbrev_prefix
    );

    // Barrier: the abbreviated snapshot is normalized; the optimizer sees no
    // pending rewrites. The tags stay visible in the optimized body.
    let mut tags = SymbolSet::new();
    tags.insert(primary_tag);
    tags.insert(secondary_tag);
    let optimized = optimize(&abbreviated, &cfg.opt_prefix, &tags);

    let components = split(&optimized.body, primary_tag, secondary_tag);
    info!(
        "diagram {}: {} optimizer assignments",
        cfg.diagram_id,
        optimized.assignments.len()
    );

    emit::write_optimized_stream(
        optimized_sink,
        &cfg.diagram_id,
        &cfg.generated_on,
        &optimized,
        &components.secondary,
        &cfg.prefactor,
    )?;
    emit::write_procedure_stream(
        procedure_sink,
        &cfg.proc_name,
        &cfg.diagram_id,
        &components.primary,
    )?;

    Ok(RunSummary {
        diagram_id: cfg.diagram_id.clone(),
        new_abbreviations,
        optimizer_assignments: optimized.assignments.len(),
    })
}
