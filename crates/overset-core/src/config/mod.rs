//! `yoga.config` reader (spec.md §6): a whitespace-separated keyword
//! stream, parsed with the same hand-rolled token-state-machine style the
//! teacher uses for small formats (`tools/grid.rs`, `tools/selector.rs`)
//! rather than reaching for a parser-combinator crate.

use std::collections::BTreeMap;

use crate::error::{OversetError, OversetResult};
use crate::mesh::ComponentId;

/// Diagnostic dump requests recognized by the `dump` keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpTarget {
    Fun3dPartFile,
    PartitionExtents,
}

/// Parsed `yoga.config` contents (spec.md §6 table).
#[derive(Debug, Clone, PartialEq)]
pub struct AssemblerFileConfig {
    pub trace_ranks: Vec<u32>,
    pub trace_basename: String,
    pub extra_layers_for_interpolation_bcs: usize,
    pub target_voxel_size: usize,
    pub max_hole_map_cells: usize,
    pub max_receptors: bool,
    pub load_balancer: Option<i64>,
    pub rcb: usize,
    pub dumps: Vec<DumpTarget>,
    pub component_grid_importance: BTreeMap<ComponentId, f64>,
}

impl Default for AssemblerFileConfig {
    fn default() -> Self {
        AssemblerFileConfig {
            trace_ranks: Vec::new(),
            trace_basename: "trace".to_string(),
            extra_layers_for_interpolation_bcs: 1,
            target_voxel_size: 25_000,
            max_hole_map_cells: 8_000,
            max_receptors: false,
            load_balancer: None,
            rcb: 256,
            dumps: Vec::new(),
            component_grid_importance: BTreeMap::new(),
        }
    }
}

/// Parses a `yoga.config` whitespace-token stream (spec.md §6). Unknown
/// keywords and missing arguments are `OversetError::Config` (spec.md §7
/// "unknown keyword or missing argument: fatal at startup").
pub fn parse(text: &str) -> OversetResult<AssemblerFileConfig> {
    let mut config = AssemblerFileConfig::default();
    let mut tokens = text.split_whitespace().peekable();

    while let Some(tok) = tokens.next() {
        match tok {
            "trace" => {
                let mut any = false;
                while let Some(&next) = tokens.peek() {
                    match next.parse::<u32>() {
                        Ok(rank) => {
                            config.trace_ranks.push(rank);
                            tokens.next();
                            any = true;
                        }
                        Err(_) => break,
                    }
                }
                if !any {
                    return Err(OversetError::config("'trace' requires at least one rank"));
                }
            }
            "trace-basename" => {
                config.trace_basename = next_token(&mut tokens, "trace-basename")?.to_string();
            }
            "extra-layers-for-interpolation-bcs" => {
                config.extra_layers_for_interpolation_bcs = parse_usize(&mut tokens, tok)?;
            }
            "target-voxel-size" => {
                config.target_voxel_size = parse_usize(&mut tokens, tok)?;
            }
            "max-hole-map-cells" => {
                config.max_hole_map_cells = parse_usize(&mut tokens, tok)?;
            }
            "max-receptors" => {
                config.max_receptors = true;
            }
            "load-balancer" => {
                config.load_balancer = Some(parse_i64(&mut tokens, tok)?);
            }
            "rcb" => {
                config.rcb = parse_usize(&mut tokens, tok)?;
            }
            "dump" => {
                let target = next_token(&mut tokens, "dump")?;
                let dump = match target {
                    "fun3d-part-file" => DumpTarget::Fun3dPartFile,
                    "partition-extents" => DumpTarget::PartitionExtents,
                    other => return Err(OversetError::config(format!("unknown dump target '{other}'"))),
                };
                config.dumps.push(dump);
            }
            "component-grid-importance" => {
                let mut component = 0u32;
                let mut any = false;
                while let Some(&next) = tokens.peek() {
                    match next.parse::<f64>() {
                        Ok(value) => {
                            config.component_grid_importance.insert(ComponentId(component), value);
                            component += 1;
                            tokens.next();
                            any = true;
                        }
                        Err(_) => break,
                    }
                }
                if !any {
                    return Err(OversetError::config("'component-grid-importance' requires at least one value"));
                }
            }
            other => return Err(OversetError::config(format!("unknown yoga.config keyword '{other}'"))),
        }
    }

    Ok(config)
}

fn next_token<'a>(tokens: &mut std::iter::Peekable<std::str::SplitWhitespace<'a>>, keyword: &str) -> OversetResult<&'a str> {
    tokens.next().ok_or_else(|| OversetError::config(format!("'{keyword}' requires an argument")))
}

fn parse_usize(tokens: &mut std::iter::Peekable<std::str::SplitWhitespace<'_>>, keyword: &str) -> OversetResult<usize> {
    next_token(tokens, keyword)?
        .parse::<usize>()
        .map_err(|_| OversetError::config(format!("'{keyword}' requires an integer argument")))
}

fn parse_i64(tokens: &mut std::iter::Peekable<std::str::SplitWhitespace<'_>>, keyword: &str) -> OversetResult<i64> {
    next_token(tokens, keyword)?
        .parse::<i64>()
        .map_err(|_| OversetError::config(format!("'{keyword}' requires an integer argument")))
}
