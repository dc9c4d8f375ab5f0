//! Boundary-condition script reader (spec.md §6): free-form keyword-driven
//! text assigning BC tags to integer face-tag ranges within the current
//! `domain` block. Comment lines start with `#`.
//!
//! Parsed with the same hand-rolled token-state-machine style as
//! [`crate::config`] rather than a parser-combinator crate.

use std::collections::BTreeMap;

use crate::error::{OversetError, OversetResult};
use crate::mesh::BcTag;

/// One `domain` block and everything assigned to it until the next
/// `domain` keyword (spec.md §6 "applied to the current domain block").
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DomainBlock {
    pub names: Vec<String>,
    pub solid_tags: Vec<i64>,
    pub interpolation_tags: Vec<i64>,
    /// `(axis, tag)`, axis 0/1/2 for x/y/z symmetry.
    pub symmetry_tags: Vec<(usize, i64)>,
    pub importance: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundaryConditionScript {
    pub domains: Vec<DomainBlock>,
}

impl BoundaryConditionScript {
    /// Flattens every domain's tag assignments into one face-tag -> BC tag
    /// map, for callers that don't need per-domain structure.
    pub fn resolve_bc_tags(&self) -> BTreeMap<i64, BcTag> {
        let mut map = BTreeMap::new();
        for domain in &self.domains {
            for &tag in &domain.solid_tags {
                map.insert(tag, BcTag::Solid);
            }
            for &tag in &domain.interpolation_tags {
                map.insert(tag, BcTag::Interpolation);
            }
            for &(axis, tag) in &domain.symmetry_tags {
                let bc = match axis {
                    0 => BcTag::SymmetryX,
                    1 => BcTag::SymmetryY,
                    _ => BcTag::SymmetryZ,
                };
                map.insert(tag, bc);
            }
        }
        map
    }
}

/// Parses a boundary-condition script (spec.md §6). Lines starting with
/// `#` are comments; `#NAME` tokens following `domain` are domain names,
/// not comments, since they appear mid-line rather than at line start.
pub fn parse(text: &str) -> OversetResult<BoundaryConditionScript> {
    let body: String = text
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .collect::<Vec<_>>()
        .join(" ");
    let mut tokens = body.split_whitespace().peekable();
    let mut script = BoundaryConditionScript::default();

    while let Some(tok) = tokens.next() {
        match tok {
            "domain" => {
                let mut names = Vec::new();
                while let Some(&next) = tokens.peek() {
                    if let Some(name) = next.strip_prefix('#') {
                        names.push(name.to_string());
                        tokens.next();
                    } else {
                        break;
                    }
                }
                if names.is_empty() {
                    return Err(OversetError::config("'domain' requires at least one #NAME"));
                }
                script.domains.push(DomainBlock {
                    names,
                    ..Default::default()
                });
            }
            "solid" | "interpolation" | "x-symmetry" | "y-symmetry" | "z-symmetry" => {
                let tags = expand_tags(&collect_tag_tokens(&mut tokens))?;
                let domain = current_domain(&mut script)?;
                match tok {
                    "solid" => domain.solid_tags.extend(tags),
                    "interpolation" => domain.interpolation_tags.extend(tags),
                    "x-symmetry" => domain.symmetry_tags.extend(tags.into_iter().map(|t| (0, t))),
                    "y-symmetry" => domain.symmetry_tags.extend(tags.into_iter().map(|t| (1, t))),
                    _ => domain.symmetry_tags.extend(tags.into_iter().map(|t| (2, t))),
                }
            }
            "importance" => {
                let value = tokens
                    .next()
                    .ok_or_else(|| OversetError::config("'importance' requires an argument"))?
                    .parse::<i64>()
                    .map_err(|_| OversetError::config("'importance' requires an integer argument"))?;
                current_domain(&mut script)?.importance = Some(value);
            }
            other => return Err(OversetError::config(format!("unknown boundary-condition keyword '{other}'"))),
        }
    }

    Ok(script)
}

fn current_domain(script: &mut BoundaryConditionScript) -> OversetResult<&mut DomainBlock> {
    script
        .domains
        .last_mut()
        .ok_or_else(|| OversetError::config("BC keyword used before any 'domain' block was opened"))
}

fn collect_tag_tokens<'a>(tokens: &mut std::iter::Peekable<std::str::SplitWhitespace<'a>>) -> Vec<&'a str> {
    let mut raw = Vec::new();
    while let Some(&t) = tokens.peek() {
        if t == ":" || t.parse::<i64>().is_ok() {
            raw.push(t);
            tokens.next();
        } else {
            break;
        }
    }
    raw
}

/// Expands a flat token list like `["3", ":", "7", "9"]` into `[3,4,5,6,7,9]`
/// (spec.md §6 "`<tags>` is a sequence of integers possibly containing the
/// range marker `:`").
fn expand_tags(raw: &[&str]) -> OversetResult<Vec<i64>> {
    let mut tags = Vec::new();
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == ":" {
            return Err(OversetError::config("range marker ':' must sit between two tag integers"));
        }
        let start: i64 = raw[i].parse().map_err(|_| OversetError::config(format!("invalid tag '{}'", raw[i])))?;
        if raw.get(i + 1) == Some(&":") {
            let end_tok = raw
                .get(i + 2)
                .ok_or_else(|| OversetError::config("range marker ':' has no closing tag"))?;
            let end: i64 = end_tok.parse().map_err(|_| OversetError::config(format!("invalid tag '{end_tok}'")))?;
            let (lo, hi) = if start <= end { (start, end) } else { (end, start) };
            tags.extend(lo..=hi);
            i += 3;
        } else {
            tags.push(start);
            i += 1;
        }
    }
    Ok(tags)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_domain_and_solid_tags() {
        let text = "# a comment\ndomain #WING #FUSELAGE\nsolid 1 2 3\ninterpolation 3 : 7\n";
        let script = parse(text).unwrap();
        assert_eq!(script.domains.len(), 1);
        assert_eq!(script.domains[0].names, vec!["WING", "FUSELAGE"]);
        assert_eq!(script.domains[0].solid_tags, vec![1, 2, 3]);
        assert_eq!(script.domains[0].interpolation_tags, vec![3, 4, 5, 6, 7]);
    }

    #[test]
    fn resolve_bc_tags_merges_across_domains() {
        let text = "domain #A\nsolid 1\ndomain #B\nx-symmetry 2\nimportance 5\n";
        let script = parse(text).unwrap();
        let resolved = script.resolve_bc_tags();
        assert_eq!(resolved[&1], BcTag::Solid);
        assert_eq!(resolved[&2], BcTag::SymmetryX);
        assert_eq!(script.domains[1].importance, Some(5));
    }

    #[test]
    fn bc_keyword_before_any_domain_is_an_error() {
        let err = parse("solid 1 2").unwrap_err();
        assert!(matches!(err, OversetError::Config(_)));
    }

    #[test]
    fn descending_range_is_normalized() {
        let text = "domain #A\nsolid 7 : 3\n";
        let script = parse(text).unwrap();
        assert_eq!(script.domains[0].solid_tags, vec![3, 4, 5, 6, 7]);
    }
}
