//! Artifact emission: the optimized-expression stream and the generated
//! procedure stream.
//!
//! Both streams are plain text keyed by the diagram identifier and are
//! opaque to later assembly stages. Formats:
//!
//! ```text
//! *Abbreviations for diagram d12. Generated on <timestamp>
//!
//! #####Abbreviations
//! abb12_1 = ...;
//! #####R2
//!
//! R2d12 = <prefactor>*(...);
//! ```
//!
//! ```text
//! #Procedure d12
//! Id diagram12 = ...;
//! #EndProcedure
//! ```

use std::io;

use crate::core::expr::{Expr, ExprKind};
use crate::optimize::Optimized;

/// Write the optimized-expression stream: header comment block, the
/// optimizer's own abbreviation section, then the secondary ("rational
/// part") numeric assignment, in that fixed order.
///
/// When the prefactor is exactly the unit value the explicit multiplication
/// is omitted.
///
/// # Errors
/// Propagates sink write failures.
pub fn write_optimized_stream<W: io::Write>(
    mut sink: W,
    diagram_id: &str,
    generated_on: &str,
    optimized: &Optimized,
    secondary: &Expr,
    prefactor: &Expr,
) -> io::Result<()> {
    writeln!(
        sink,
        "*Abbreviations for diagram d{diagram_id}. Generated on {generated_on}"
    )?;
    writeln!(sink)?;
    writeln!(sink, "#####Abbreviations")?;
    for (name, rhs) in &optimized.assignments {
        writeln!(sink, "{name} = {rhs};")?;
    }
    writeln!(sink, "#####R2")?;
    writeln!(sink)?;
    if prefactor.is_one_num() {
        writeln!(sink, "R2d{diagram_id} = {secondary};")?;
    } else if matches!(prefactor.kind(), ExprKind::Sum(_)) {
        writeln!(sink, "R2d{diagram_id} = ({prefactor})*({secondary});")?;
    } else {
        writeln!(sink, "R2d{diagram_id} = {prefactor}*({secondary});")?;
    }
    writeln!(sink)
}

/// Write the generated procedure stream: a named procedure block whose body
/// assigns the primary split component to the diagram quantity.
///
/// # Errors
/// Propagates sink write failures.
pub fn write_procedure_stream<W: io::Write>(
    mut sink: W,
    proc_name: &str,
    diagram_id: &str,
    primary: &Expr,
) -> io::Result<()> {
    writeln!(sink, "#Procedure {proc_name}")?;
    writeln!(sink, "Id diagram{diagram_id} = {primary};")?;
    writeln!(sink, "#EndProcedure")
}
