//! MPS model-file reader.
//!
//! Parses the fixed set of sections (`NAME`, `ROWS`, `COLUMNS` with
//! integrality markers, `RHS`, `RANGES`, `BOUNDS`, `ENDATA`) into a
//! [`Model`]. Fields are whitespace-delimited; the strict column positions
//! of the original format are not enforced. Variables default to
//! `[0, +inf)` as the format prescribes.
//!
//! Only minimization is supported; an `OBJSENSE MAXIMIZE` file is
//! rejected rather than silently negated.

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;

use crate::model::{Expression, Model, Variable};

/// Errors produced by the MPS reader.
#[derive(Error, Debug)]
pub enum MpsError {
    /// File could not be read.
    #[error("failed to read MPS file: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed content.
    #[error("MPS syntax error on line {line}: {message}")]
    Syntax {
        /// 1-based line number.
        line: usize,
        /// What went wrong.
        message: String,
    },
}

fn syntax(line: usize, message: impl Into<String>) -> MpsError {
    MpsError::Syntax {
        line,
        message: message.into(),
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Section {
    Prelude,
    ObjSense,
    Rows,
    Columns,
    Rhs,
    Ranges,
    Bounds,
    Done,
}

#[derive(Clone, Copy, PartialEq)]
enum RowKind {
    /// The objective, or a free row to be ignored.
    Objective,
    Free,
    LessEqual,
    GreaterEqual,
    Equal,
}

struct RowInfo {
    kind: RowKind,
    /// Index into the model's expressions. Free rows have none.
    expr: Option<usize>,
}

/// Read and parse an MPS file from disk.
pub fn read_mps(path: impl AsRef<Path>) -> Result<Model, MpsError> {
    let text = std::fs::read_to_string(path)?;
    parse_str(&text)
}

/// Parse MPS text into a model.
pub fn parse_str(text: &str) -> Result<Model, MpsError> {
    let mut model = Model::new("");
    let mut section = Section::Prelude;

    let mut rows: HashMap<String, RowInfo> = HashMap::new();
    let mut columns: HashMap<String, usize> = HashMap::new();
    let mut objective: Option<usize> = None;
    let mut integer_mode = false;
    // Whether a lower bound was set explicitly in BOUNDS, per variable.
    let mut lower_set: Vec<bool> = Vec::new();

    for (lineno, raw) in text.lines().enumerate() {
        let lineno = lineno + 1;
        if raw.trim().is_empty() || raw.starts_with('*') {
            continue;
        }

        // Section headers start in column one.
        let is_header = !raw.starts_with(' ') && !raw.starts_with('\t');
        let fields: Vec<&str> = raw.split_whitespace().collect();

        if is_header {
            section = match fields[0] {
                "NAME" => {
                    if let Some(name) = fields.get(1) {
                        model.name = (*name).to_string();
                    }
                    Section::Prelude
                }
                "OBJSENSE" => Section::ObjSense,
                "ROWS" => Section::Rows,
                "COLUMNS" => Section::Columns,
                "RHS" => Section::Rhs,
                "RANGES" => Section::Ranges,
                "BOUNDS" => Section::Bounds,
                "ENDATA" => Section::Done,
                other => return Err(syntax(lineno, format!("unknown section `{other}`"))),
            };
            continue;
        }

        match section {
            Section::Prelude | Section::Done => {
                return Err(syntax(lineno, "data outside of any section"))
            }
            Section::ObjSense => match fields[0] {
                "MIN" | "MINIMIZE" => {}
                other => {
                    return Err(syntax(
                        lineno,
                        format!("objective sense `{other}` is not supported"),
                    ))
                }
            },
            Section::Rows => {
                let &[kind, name] = &fields[..] else {
                    return Err(syntax(lineno, "expected `<type> <row name>`"));
                };
                let kind = match kind {
                    "N" => {
                        if objective.is_none() {
                            RowKind::Objective
                        } else {
                            RowKind::Free
                        }
                    }
                    "L" => RowKind::LessEqual,
                    "G" => RowKind::GreaterEqual,
                    "E" => RowKind::Equal,
                    other => return Err(syntax(lineno, format!("unknown row type `{other}`"))),
                };
                let expr = match kind {
                    RowKind::Free => None,
                    RowKind::Objective => {
                        let idx = model.add_expression(Expression::new(name).as_objective());
                        objective = Some(idx);
                        Some(idx)
                    }
                    // RHS defaults to zero until the RHS section says
                    // otherwise.
                    RowKind::LessEqual => {
                        Some(model.add_expression(Expression::new(name).with_upper(0.0)))
                    }
                    RowKind::GreaterEqual => {
                        Some(model.add_expression(Expression::new(name).with_lower(0.0)))
                    }
                    RowKind::Equal => Some(model.add_expression(Expression::new(name).level(0.0))),
                };
                if rows.insert(name.to_string(), RowInfo { kind, expr }).is_some() {
                    return Err(syntax(lineno, format!("duplicate row `{name}`")));
                }
            }
            Section::Columns => {
                if fields.contains(&"'MARKER'") {
                    if fields.contains(&"'INTORG'") {
                        integer_mode = true;
                    } else if fields.contains(&"'INTEND'") {
                        integer_mode = false;
                    } else {
                        return Err(syntax(lineno, "unrecognized marker"));
                    }
                    continue;
                }

                let col = fields[0];
                let var = *columns.entry(col.to_string()).or_insert_with(|| {
                    lower_set.push(false);
                    let mut v = Variable::new(col).with_lower(0.0);
                    if integer_mode {
                        v = v.as_integer();
                    }
                    model.add_variable(v)
                });

                for pair in fields[1..].chunks(2) {
                    let &[row, value] = pair else {
                        return Err(syntax(lineno, "dangling row name without a value"));
                    };
                    let value = parse_value(value, lineno)?;
                    let info = rows
                        .get(row)
                        .ok_or_else(|| syntax(lineno, format!("unknown row `{row}`")))?;
                    if let Some(expr) = info.expr {
                        model.expression_mut(expr).add_linear(var, value);
                    }
                }
            }
            Section::Rhs => {
                for pair in fields[1..].chunks(2) {
                    let &[row, value] = pair else {
                        return Err(syntax(lineno, "dangling row name without a value"));
                    };
                    let value = parse_value(value, lineno)?;
                    let info = rows
                        .get(row)
                        .ok_or_else(|| syntax(lineno, format!("unknown row `{row}`")))?;
                    let Some(expr) = info.expr else { continue };
                    let e = model.expression_mut(expr);
                    match info.kind {
                        // An RHS on the objective row is a constant offset;
                        // objective values are reported without it.
                        RowKind::Objective | RowKind::Free => {}
                        RowKind::LessEqual => e.upper = Some(value),
                        RowKind::GreaterEqual => e.lower = Some(value),
                        RowKind::Equal => {
                            e.lower = Some(value);
                            e.upper = Some(value);
                        }
                    }
                }
            }
            Section::Ranges => {
                for pair in fields[1..].chunks(2) {
                    let &[row, value] = pair else {
                        return Err(syntax(lineno, "dangling row name without a value"));
                    };
                    let range = parse_value(value, lineno)?;
                    let info = rows
                        .get(row)
                        .ok_or_else(|| syntax(lineno, format!("unknown row `{row}`")))?;
                    let Some(expr) = info.expr else { continue };
                    let e = model.expression_mut(expr);
                    match info.kind {
                        RowKind::LessEqual => {
                            let u = e.upper.unwrap_or(0.0);
                            e.lower = Some(u - range.abs());
                        }
                        RowKind::GreaterEqual => {
                            let l = e.lower.unwrap_or(0.0);
                            e.upper = Some(l + range.abs());
                        }
                        RowKind::Equal => {
                            let level = e.upper.unwrap_or(0.0);
                            if range >= 0.0 {
                                e.upper = Some(level + range);
                            } else {
                                e.lower = Some(level + range);
                            }
                        }
                        RowKind::Objective | RowKind::Free => {
                            return Err(syntax(
                                lineno,
                                format!("range on non-constraint row `{row}`"),
                            ))
                        }
                    }
                }
            }
            Section::Bounds => {
                let kind = fields[0];
                let var_name = fields
                    .get(2)
                    .ok_or_else(|| syntax(lineno, "expected `<type> <set> <column> [value]`"))?;
                let var = *columns
                    .get(*var_name)
                    .ok_or_else(|| syntax(lineno, format!("unknown column `{var_name}`")))?;
                let value = match fields.get(3) {
                    Some(v) => Some(parse_value(v, lineno)?),
                    None => None,
                };
                let need = |value: Option<f64>| {
                    value.ok_or_else(|| syntax(lineno, format!("bound `{kind}` needs a value")))
                };
                let v = model.variable_mut(var);
                match kind {
                    "LO" => {
                        v.lower = Some(need(value)?);
                        lower_set[var] = true;
                    }
                    "UP" => {
                        let u = need(value)?;
                        v.upper = Some(u);
                        // A negative upper bound with the default lower of
                        // zero would be contradictory; the convention is
                        // that it releases the lower bound.
                        if u < 0.0 && !lower_set[var] {
                            v.lower = None;
                        }
                    }
                    "FX" => {
                        let f = need(value)?;
                        v.lower = Some(f);
                        v.upper = Some(f);
                        lower_set[var] = true;
                    }
                    "FR" => {
                        v.lower = None;
                        v.upper = None;
                        lower_set[var] = true;
                    }
                    "MI" => {
                        v.lower = None;
                        lower_set[var] = true;
                    }
                    "PL" => v.upper = None,
                    "BV" => {
                        v.lower = Some(0.0);
                        v.upper = Some(1.0);
                        v.integer = true;
                        lower_set[var] = true;
                    }
                    "LI" => {
                        v.lower = Some(need(value)?);
                        v.integer = true;
                        lower_set[var] = true;
                    }
                    "UI" => {
                        v.upper = Some(need(value)?);
                        v.integer = true;
                    }
                    other => return Err(syntax(lineno, format!("unknown bound type `{other}`"))),
                }
            }
        }
    }

    Ok(model)
}

fn parse_value(field: &str, lineno: usize) -> Result<f64, MpsError> {
    field
        .parse::<f64>()
        .map_err(|_| syntax(lineno, format!("`{field}` is not a number")))
}
