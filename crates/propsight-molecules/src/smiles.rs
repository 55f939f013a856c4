//! SMILES reader and the molecular graph it produces.
//!
//! Supported: organic-subset atoms (aliphatic and aromatic), bracket atoms
//! with isotope, chirality marks, hydrogen count, charge and atom class,
//! all bond symbols, branches, ring closures (`1`-`9`, `%nn`), dot-separated
//! fragments and the `*` wildcard. Stereo marks are accepted and discarded.

use std::collections::HashMap;
use thiserror::Error;

use crate::element::{self, Element};

/// Largest structure the reader accepts, in atoms.
pub const MAX_ATOMS: usize = 1000;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SmilesError {
    #[error("empty structure")]
    Empty,

    #[error("unexpected character '{ch}' at position {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    #[error("unknown element '{symbol}' at position {pos}")]
    UnknownElement { symbol: String, pos: usize },

    #[error("unterminated bracket atom starting at position {0}")]
    UnterminatedBracket(usize),

    #[error("bond at position {0} is not followed by an atom")]
    DanglingBond(usize),

    #[error("unbalanced parenthesis at position {0}")]
    UnbalancedBranch(usize),

    #[error("ring closure {0} is never closed")]
    UnclosedRing(u16),

    #[error("ring closure {digit} at position {pos}: {reason}")]
    InvalidRingClosure { digit: u16, pos: usize, reason: &'static str },

    #[error("atom {index} ({symbol}) exceeds every allowed valence")]
    Valence { index: usize, symbol: String },

    #[error("atom {index} is marked aromatic but is not in a ring")]
    AromaticOutsideRing { index: usize },

    #[error("structure has more than {limit} atoms")]
    TooLarge { limit: usize },
}

// ── Graph ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BondOrder {
    Single,
    Double,
    Triple,
    Quadruple,
    Aromatic,
}

impl BondOrder {
    /// Contribution to an atom's explicit valence.
    pub fn valence(self) -> u8 {
        match self {
            BondOrder::Single | BondOrder::Aromatic => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
            BondOrder::Quadruple => 4,
        }
    }

    fn from_symbol(c: char) -> Option<Self> {
        match c {
            // directional bonds only carry stereo, which is discarded
            '-' | '/' | '\\' => Some(BondOrder::Single),
            '=' => Some(BondOrder::Double),
            '#' => Some(BondOrder::Triple),
            '$' => Some(BondOrder::Quadruple),
            ':' => Some(BondOrder::Aromatic),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// `None` for the `*` wildcard.
    pub element: Option<&'static Element>,
    pub aromatic: bool,
    pub bracket: bool,
    pub isotope: Option<u16>,
    pub charge: i8,
    /// Attached hydrogens: explicit for bracket atoms, implied otherwise.
    pub hydrogens: u8,
    pub class: Option<u16>,
}

impl Atom {
    pub fn atomic_number(&self) -> u8 {
        self.element.map(|e| e.number).unwrap_or(0)
    }

    pub fn symbol(&self) -> &'static str {
        self.element.map(|e| e.symbol).unwrap_or("*")
    }

    fn bare(element: Option<&'static Element>, aromatic: bool) -> Self {
        Self {
            element,
            aromatic,
            bracket: false,
            isotope: None,
            charge: 0,
            hydrogens: 0,
            class: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bond {
    pub a: usize,
    pub b: usize,
    pub order: BondOrder,
}

/// Molecular graph with hydrogens held as atom counts.
#[derive(Debug, Clone, Default)]
pub struct Mol {
    pub atoms: Vec<Atom>,
    pub bonds: Vec<Bond>,
    adjacency: Vec<Vec<(usize, usize)>>,
}

impl Mol {
    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    /// `(neighbour, bond index)` pairs of an atom.
    pub fn neighbors(&self, atom: usize) -> &[(usize, usize)] {
        &self.adjacency[atom]
    }

    pub fn degree(&self, atom: usize) -> usize {
        self.adjacency[atom].len()
    }

    pub fn bond_between(&self, a: usize, b: usize) -> Option<&Bond> {
        self.adjacency[a]
            .iter()
            .find(|&&(n, _)| n == b)
            .map(|&(_, bi)| &self.bonds[bi])
    }

    /// Sum of explicit bond orders, aromatic bonds counting 1.
    pub fn bond_order_sum(&self, atom: usize) -> u32 {
        self.adjacency[atom]
            .iter()
            .map(|&(_, bi)| u32::from(self.bonds[bi].order.valence()))
            .sum()
    }

    pub fn has_double_bond(&self, atom: usize) -> bool {
        self.adjacency[atom]
            .iter()
            .any(|&(_, bi)| self.bonds[bi].order == BondOrder::Double)
    }

    pub fn heavy_atom_count(&self) -> usize {
        self.atoms.iter().filter(|a| a.atomic_number() != 1).count()
    }

    /// Connected components as atom index lists, ordered by lowest member.
    pub fn components(&self) -> Vec<Vec<usize>> {
        let mut seen = vec![false; self.atoms.len()];
        let mut out = Vec::new();
        for start in 0..self.atoms.len() {
            if seen[start] {
                continue;
            }
            let mut stack = vec![start];
            let mut members = Vec::new();
            seen[start] = true;
            while let Some(a) = stack.pop() {
                members.push(a);
                for &(n, _) in &self.adjacency[a] {
                    if !seen[n] {
                        seen[n] = true;
                        stack.push(n);
                    }
                }
            }
            members.sort_unstable();
            out.push(members);
        }
        out
    }

    /// Number of independent rings (cyclomatic number).
    pub fn ring_count(&self) -> usize {
        (self.bonds.len() + self.components().len()).saturating_sub(self.atoms.len())
    }

    /// Per-bond flag: true when the bond lies on a cycle (is not a bridge).
    pub fn ring_bonds(&self) -> Vec<bool> {
        let n = self.atoms.len();
        let mut state = BridgeSearch {
            disc: vec![usize::MAX; n],
            low: vec![0; n],
            timer: 0,
            in_ring: vec![true; self.bonds.len()],
        };
        for start in 0..n {
            if state.disc[start] == usize::MAX {
                state.run(self, start);
            }
        }
        state.in_ring
    }

    /// Per-atom flag: true when the atom has at least one ring bond.
    pub fn ring_atoms(&self) -> Vec<bool> {
        let ring_bonds = self.ring_bonds();
        let mut atoms = vec![false; self.atoms.len()];
        for (bond, &in_ring) in self.bonds.iter().zip(&ring_bonds) {
            if in_ring {
                atoms[bond.a] = true;
                atoms[bond.b] = true;
            }
        }
        atoms
    }

    fn add_atom(&mut self, atom: Atom) -> usize {
        self.atoms.push(atom);
        self.adjacency.push(Vec::new());
        self.atoms.len() - 1
    }

    fn add_bond(&mut self, a: usize, b: usize, order: BondOrder) {
        let idx = self.bonds.len();
        self.bonds.push(Bond { a, b, order });
        self.adjacency[a].push((b, idx));
        self.adjacency[b].push((a, idx));
    }

    fn default_order(&self, a: usize, b: usize) -> BondOrder {
        if self.atoms[a].aromatic && self.atoms[b].aromatic {
            BondOrder::Aromatic
        } else {
            BondOrder::Single
        }
    }
}

/// Tarjan bridge search state.
struct BridgeSearch {
    disc: Vec<usize>,
    low: Vec<usize>,
    timer: usize,
    in_ring: Vec<bool>,
}

impl BridgeSearch {
    fn enter(&mut self, atom: usize) {
        self.disc[atom] = self.timer;
        self.low[atom] = self.timer;
        self.timer += 1;
    }

    /// Iterative DFS from `root`; frames are `(atom, tree bond in, next neighbour index)`.
    fn run(&mut self, mol: &Mol, root: usize) {
        self.enter(root);
        let mut stack: Vec<(usize, Option<usize>, usize)> = vec![(root, None, 0)];
        while let Some(frame) = stack.last_mut() {
            let (atom, via_bond, idx) = *frame;
            if let Some(&(next, bond)) = mol.neighbors(atom).get(idx) {
                frame.2 += 1;
                if Some(bond) == via_bond {
                    continue;
                }
                if self.disc[next] == usize::MAX {
                    self.enter(next);
                    stack.push((next, Some(bond), 0));
                } else {
                    self.low[atom] = self.low[atom].min(self.disc[next]);
                }
                continue;
            }

            stack.pop();
            if let (Some(bond), Some(&(parent, _, _))) = (via_bond, stack.last()) {
                self.low[parent] = self.low[parent].min(self.low[atom]);
                if self.low[atom] > self.disc[parent] {
                    self.in_ring[bond] = false;
                }
            }
        }
    }
}

// ── Reader ────────────────────────────────────────────────────────────────────

struct RingOpening {
    atom: usize,
    order: Option<BondOrder>,
}

/// Parse a SMILES string into a validated graph with hydrogen counts filled in.
pub fn parse_smiles(input: &str) -> Result<Mol, SmilesError> {
    let chars: Vec<char> = input.chars().collect();
    if chars.is_empty() {
        return Err(SmilesError::Empty);
    }

    let mut mol = Mol::default();
    let mut prev: Option<usize> = None;
    let mut pending: Option<(BondOrder, usize)> = None;
    let mut branches: Vec<(usize, usize)> = Vec::new();
    let mut rings: HashMap<u16, RingOpening> = HashMap::new();
    let mut branch_just_opened = false;
    let mut pos = 0;

    while pos < chars.len() {
        let c = chars[pos];
        let opens_branch = c == '(';

        match c {
            '(' => {
                if let Some((_, p)) = pending {
                    return Err(SmilesError::DanglingBond(p));
                }
                let atom = prev.ok_or(SmilesError::UnbalancedBranch(pos))?;
                branches.push((atom, pos));
                pos += 1;
            }
            ')' => {
                if branch_just_opened {
                    return Err(SmilesError::UnexpectedChar { ch: c, pos });
                }
                if let Some((_, p)) = pending {
                    return Err(SmilesError::DanglingBond(p));
                }
                let (atom, _) = branches.pop().ok_or(SmilesError::UnbalancedBranch(pos))?;
                prev = Some(atom);
                pos += 1;
            }
            '.' => {
                if let Some((_, p)) = pending {
                    return Err(SmilesError::DanglingBond(p));
                }
                if prev.is_none() {
                    return Err(SmilesError::UnexpectedChar { ch: c, pos });
                }
                prev = None;
                pos += 1;
            }
            '0'..='9' | '%' => {
                let (digit, next) = read_ring_number(&chars, pos)?;
                let atom = prev.ok_or(SmilesError::InvalidRingClosure {
                    digit,
                    pos,
                    reason: "no preceding atom",
                })?;
                let order = pending.take().map(|(o, _)| o);
                match rings.remove(&digit) {
                    Some(open) => {
                        if open.atom == atom {
                            return Err(SmilesError::InvalidRingClosure {
                                digit,
                                pos,
                                reason: "atom bonded to itself",
                            });
                        }
                        if mol.bond_between(open.atom, atom).is_some() {
                            return Err(SmilesError::InvalidRingClosure {
                                digit,
                                pos,
                                reason: "duplicate bond",
                            });
                        }
                        let order = match (open.order, order) {
                            (Some(a), Some(b)) if a != b => {
                                return Err(SmilesError::InvalidRingClosure {
                                    digit,
                                    pos,
                                    reason: "conflicting bond symbols",
                                })
                            }
                            (Some(a), _) | (None, Some(a)) => a,
                            (None, None) => mol.default_order(open.atom, atom),
                        };
                        mol.add_bond(open.atom, atom, order);
                    }
                    None => {
                        rings.insert(digit, RingOpening { atom, order });
                    }
                }
                pos = next;
            }
            _ if BondOrder::from_symbol(c).is_some() => {
                if prev.is_none() || pending.is_some() {
                    return Err(SmilesError::DanglingBond(pos));
                }
                pending = BondOrder::from_symbol(c).map(|o| (o, pos));
                pos += 1;
            }
            _ => {
                let (atom, next) = if c == '[' {
                    read_bracket_atom(&chars, pos)?
                } else {
                    read_organic_atom(&chars, pos)?
                };
                if mol.atoms.len() == MAX_ATOMS {
                    return Err(SmilesError::TooLarge { limit: MAX_ATOMS });
                }
                let idx = mol.add_atom(atom);
                if let Some(p) = prev {
                    let order = pending
                        .take()
                        .map(|(o, _)| o)
                        .unwrap_or_else(|| mol.default_order(p, idx));
                    mol.add_bond(p, idx, order);
                }
                prev = Some(idx);
                pos = next;
            }
        }

        branch_just_opened = opens_branch;
    }

    if let Some((_, p)) = pending {
        return Err(SmilesError::DanglingBond(p));
    }
    if let Some(&(_, p)) = branches.last() {
        return Err(SmilesError::UnbalancedBranch(p));
    }
    if let Some(&digit) = rings.keys().min() {
        return Err(SmilesError::UnclosedRing(digit));
    }
    if mol.atoms.is_empty() {
        return Err(SmilesError::Empty);
    }

    assign_hydrogens(&mut mol)?;
    check_aromatic_rings(&mol)?;
    Ok(mol)
}

fn assign_hydrogens(mol: &mut Mol) -> Result<(), SmilesError> {
    for i in 0..mol.atoms.len() {
        if mol.atoms[i].bracket {
            continue;
        }
        let Some(el) = mol.atoms[i].element else {
            continue;
        };
        let sum = mol.bond_order_sum(i);
        let h = element::implicit_hydrogens(el.number, mol.atoms[i].aromatic, sum).ok_or_else(|| {
            SmilesError::Valence { index: i, symbol: el.symbol.to_string() }
        })?;
        mol.atoms[i].hydrogens = h;
    }
    Ok(())
}

fn check_aromatic_rings(mol: &Mol) -> Result<(), SmilesError> {
    if !mol.atoms.iter().any(|a| a.aromatic) {
        return Ok(());
    }
    let in_ring = mol.ring_atoms();
    match mol.atoms.iter().enumerate().find(|(i, a)| a.aromatic && !in_ring[*i]) {
        Some((index, _)) => Err(SmilesError::AromaticOutsideRing { index }),
        None => Ok(()),
    }
}

fn read_ring_number(chars: &[char], pos: usize) -> Result<(u16, usize), SmilesError> {
    if chars[pos] == '%' {
        let digits: Option<Vec<u32>> = chars
            .get(pos + 1..pos + 3)
            .and_then(|s| s.iter().map(|c| c.to_digit(10)).collect());
        return match digits {
            Some(d) => Ok(((d[0] * 10 + d[1]) as u16, pos + 3)),
            None => Err(SmilesError::UnexpectedChar { ch: '%', pos }),
        };
    }
    let d = chars[pos].to_digit(10).ok_or(SmilesError::UnexpectedChar { ch: chars[pos], pos })?;
    Ok((d as u16, pos + 1))
}

fn read_organic_atom(chars: &[char], pos: usize) -> Result<(Atom, usize), SmilesError> {
    let c = chars[pos];
    let next = chars.get(pos + 1).copied();

    let (symbol, aromatic, len) = match (c, next) {
        ('C', Some('l')) => ("Cl", false, 2),
        ('B', Some('r')) => ("Br", false, 2),
        ('B', _) => ("B", false, 1),
        ('C', _) => ("C", false, 1),
        ('N', _) => ("N", false, 1),
        ('O', _) => ("O", false, 1),
        ('P', _) => ("P", false, 1),
        ('S', _) => ("S", false, 1),
        ('F', _) => ("F", false, 1),
        ('I', _) => ("I", false, 1),
        ('b', _) => ("B", true, 1),
        ('c', _) => ("C", true, 1),
        ('n', _) => ("N", true, 1),
        ('o', _) => ("O", true, 1),
        ('p', _) => ("P", true, 1),
        ('s', _) => ("S", true, 1),
        ('*', _) => return Ok((Atom::bare(None, false), pos + 1)),
        (u, n) if u.is_ascii_uppercase() => {
            let mut symbol = u.to_string();
            if let Some(l) = n.filter(|l| l.is_ascii_lowercase()) {
                symbol.push(l);
            }
            return Err(SmilesError::UnknownElement { symbol, pos });
        }
        _ => return Err(SmilesError::UnexpectedChar { ch: c, pos }),
    };

    let el = element::by_symbol(symbol)
        .ok_or_else(|| SmilesError::UnknownElement { symbol: symbol.to_string(), pos })?;
    Ok((Atom::bare(Some(el), aromatic), pos + len))
}

fn read_number(chars: &[char], mut pos: usize) -> (Option<u32>, usize) {
    let mut value: Option<u32> = None;
    while let Some(d) = chars.get(pos).and_then(|c| c.to_digit(10)) {
        value = Some(value.unwrap_or(0).saturating_mul(10).saturating_add(d));
        pos += 1;
    }
    (value, pos)
}

fn read_bracket_atom(chars: &[char], start: usize) -> Result<(Atom, usize), SmilesError> {
    let unexpected = |pos: usize| match chars.get(pos) {
        Some(&ch) => SmilesError::UnexpectedChar { ch, pos },
        None => SmilesError::UnterminatedBracket(start),
    };

    let mut pos = start + 1;
    let (isotope, next) = read_number(chars, pos);
    pos = next;

    // element symbol
    let c = *chars.get(pos).ok_or(SmilesError::UnterminatedBracket(start))?;
    let next = chars.get(pos + 1).copied();
    let (element, aromatic) = if c == '*' {
        pos += 1;
        (None, false)
    } else if c.is_ascii_lowercase() {
        let two: Option<String> = next.map(|n| [c, n].iter().collect());
        match two.as_deref() {
            Some(s @ ("se" | "as" | "te")) => {
                pos += 2;
                (element::by_symbol(&capitalize(s)), true)
            }
            _ if matches!(c, 'b' | 'c' | 'n' | 'o' | 'p' | 's') => {
                pos += 1;
                (element::by_symbol(&capitalize(&c.to_string())), true)
            }
            _ => return Err(unexpected(pos)),
        }
    } else if c.is_ascii_uppercase() {
        let two = next
            .filter(|n| n.is_ascii_lowercase())
            .and_then(|n| element::by_symbol(&[c, n].iter().collect::<String>()));
        match two {
            Some(el) => {
                pos += 2;
                (Some(el), false)
            }
            None => {
                let el = element::by_symbol(&c.to_string()).ok_or_else(|| SmilesError::UnknownElement {
                    symbol: c.to_string(),
                    pos,
                })?;
                pos += 1;
                (Some(el), false)
            }
        }
    } else {
        return Err(unexpected(pos));
    };

    // chirality (discarded)
    if chars.get(pos) == Some(&'@') {
        pos += 1;
        if chars.get(pos) == Some(&'@') {
            pos += 1;
        } else if let (Some(a), Some(b)) = (chars.get(pos), chars.get(pos + 1)) {
            if matches!((a, b), ('T', 'H') | ('A', 'L') | ('S', 'P') | ('T', 'B') | ('O', 'H')) {
                pos = read_number(chars, pos + 2).1;
            }
        }
    }

    // hydrogen count
    let mut hydrogens = 0u8;
    if chars.get(pos) == Some(&'H') {
        let (count, next) = read_number(chars, pos + 1);
        hydrogens = count.unwrap_or(1).min(u32::from(u8::MAX)) as u8;
        pos = next;
    }

    // charge
    let mut charge: i32 = 0;
    if let Some(&sign_char) = chars.get(pos).filter(|c| **c == '+' || **c == '-') {
        let sign = if sign_char == '+' { 1 } else { -1 };
        pos += 1;
        let (magnitude, next) = read_number(chars, pos);
        match magnitude {
            Some(m) => {
                charge = sign * m.min(99) as i32;
                pos = next;
            }
            None => {
                charge = sign;
                while chars.get(pos) == Some(&sign_char) {
                    charge += sign;
                    pos += 1;
                }
            }
        }
    }
    if !(-15..=15).contains(&charge) {
        return Err(unexpected(pos.saturating_sub(1)));
    }

    // atom class
    let mut class = None;
    if chars.get(pos) == Some(&':') {
        let (value, next) = read_number(chars, pos + 1);
        match value {
            Some(v) => {
                class = Some(v.min(u32::from(u16::MAX)) as u16);
                pos = next;
            }
            None => return Err(unexpected(pos + 1)),
        }
    }

    if chars.get(pos) != Some(&']') {
        return Err(unexpected(pos));
    }

    let atom = Atom {
        element,
        aromatic,
        bracket: true,
        isotope: isotope.map(|i| i.min(u32::from(u16::MAX)) as u16),
        charge: charge as i8,
        hydrogens,
        class,
    };
    Ok((atom, pos + 1))
}

fn capitalize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for (i, c) in s.chars().enumerate() {
        if i == 0 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hydrogens(mol: &Mol) -> Vec<u8> {
        mol.atoms.iter().map(|a| a.hydrogens).collect()
    }

    #[test]
    fn test_parse_ethanol() {
        let mol = parse_smiles("CCO").unwrap();
        assert_eq!(mol.atom_count(), 3);
        assert_eq!(mol.bonds.len(), 2);
        assert_eq!(hydrogens(&mol), vec![3, 2, 1]);
    }

    #[test]
    fn test_parse_benzene_aromatic() {
        let mol = parse_smiles("c1ccccc1").unwrap();
        assert_eq!(mol.atom_count(), 6);
        assert!(mol.bonds.iter().all(|b| b.order == BondOrder::Aromatic));
        assert_eq!(hydrogens(&mol), vec![1; 6]);
        assert_eq!(mol.ring_count(), 1);
        assert!(mol.ring_atoms().iter().all(|&r| r));
    }

    #[test]
    fn test_parse_branches_and_double_bonds() {
        // acetic acid
        let mol = parse_smiles("CC(=O)O").unwrap();
        assert_eq!(mol.bond_between(1, 2).map(|b| b.order), Some(BondOrder::Double));
        assert_eq!(hydrogens(&mol), vec![3, 0, 0, 1]);
    }

    #[test]
    fn test_parse_bracket_atoms() {
        let mol = parse_smiles("[NH4+].[Cl-]").unwrap();
        assert_eq!(mol.atoms[0].charge, 1);
        assert_eq!(mol.atoms[0].hydrogens, 4);
        assert_eq!(mol.atoms[1].charge, -1);
        assert_eq!(mol.components().len(), 2);

        let mol = parse_smiles("[13CH3][C@@H](O)[O-:2]").unwrap();
        assert_eq!(mol.atoms[0].isotope, Some(13));
        assert_eq!(mol.atoms[1].hydrogens, 1);
        assert_eq!(mol.atoms[3].class, Some(2));

        let mol = parse_smiles("[Fe++]").unwrap();
        assert_eq!(mol.atoms[0].charge, 2);
    }

    #[test]
    fn test_parse_two_letter_organic_atoms() {
        let mol = parse_smiles("ClCBr").unwrap();
        let symbols: Vec<&str> = mol.atoms.iter().map(|a| a.symbol()).collect();
        assert_eq!(symbols, vec!["Cl", "C", "Br"]);
    }

    #[test]
    fn test_parse_percent_ring_closure() {
        let mol = parse_smiles("C%10CCC%10").unwrap();
        assert_eq!(mol.bonds.len(), 4);
        assert_eq!(mol.ring_count(), 1);
    }

    #[test]
    fn test_ring_bonds_exclude_bridges() {
        // toluene: methyl bond is a bridge
        let mol = parse_smiles("Cc1ccccc1").unwrap();
        let ring = mol.ring_bonds();
        assert!(!ring[0]);
        assert_eq!(ring.iter().filter(|&&r| r).count(), 6);
    }

    #[test]
    fn test_rejects_invalid_input() {
        assert!(matches!(parse_smiles(""), Err(SmilesError::Empty)));
        assert!(matches!(parse_smiles("XX1invalid"), Err(SmilesError::UnknownElement { .. })));
        assert!(matches!(parse_smiles("C1CC"), Err(SmilesError::UnclosedRing(1))));
        assert!(matches!(parse_smiles("CC(C"), Err(SmilesError::UnbalancedBranch(_))));
        assert!(matches!(parse_smiles("CC)C"), Err(SmilesError::UnbalancedBranch(_))));
        assert!(matches!(parse_smiles("C()C"), Err(SmilesError::UnexpectedChar { .. })));
        assert!(matches!(parse_smiles("CC="), Err(SmilesError::DanglingBond(_))));
        assert!(matches!(parse_smiles("=CC"), Err(SmilesError::DanglingBond(_))));
        assert!(matches!(parse_smiles("C11"), Err(SmilesError::InvalidRingClosure { .. })));
        assert!(matches!(parse_smiles("C1C1"), Err(SmilesError::InvalidRingClosure { .. })));
        assert!(matches!(parse_smiles("C=1CC#1"), Err(SmilesError::InvalidRingClosure { .. })));
        assert!(matches!(parse_smiles("[CH4"), Err(SmilesError::UnterminatedBracket(0))));
        assert!(matches!(parse_smiles("C(C)(C)(C)(C)C"), Err(SmilesError::Valence { .. })));
        assert!(matches!(parse_smiles("cc"), Err(SmilesError::AromaticOutsideRing { .. })));
        assert!(matches!(parse_smiles("C C"), Err(SmilesError::UnexpectedChar { ch: ' ', .. })));
    }

    #[test]
    fn test_huge_valence_is_rejected_not_wrapped() {
        // 256 single bonds would wrap an 8-bit sum back to zero
        let smiles = format!("C{}", "(C)".repeat(256));
        assert!(matches!(
            parse_smiles(&smiles),
            Err(SmilesError::Valence { index: 0, .. })
        ));
        let aromatic = format!("c1ccccc1{}", "(C)".repeat(300));
        assert!(matches!(parse_smiles(&aromatic), Err(SmilesError::Valence { .. })));
    }

    #[test]
    fn test_atom_limit() {
        assert!(parse_smiles(&"C".repeat(MAX_ATOMS)).is_ok());
        assert_eq!(
            parse_smiles(&"C".repeat(MAX_ATOMS + 1)).unwrap_err(),
            SmilesError::TooLarge { limit: MAX_ATOMS }
        );
    }

    #[test]
    fn test_ring_search_on_long_chain_small_stack() {
        let handle = std::thread::Builder::new()
            .stack_size(2 * 1024 * 1024)
            .spawn(|| {
                let ring = format!("C1{}C1", "C".repeat(MAX_ATOMS - 2));
                let mol = parse_smiles(&ring).unwrap();
                mol.ring_bonds().iter().all(|&r| r)
            })
            .unwrap();
        assert!(handle.join().unwrap());
    }
}
