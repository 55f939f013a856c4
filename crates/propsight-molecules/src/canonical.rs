//! Canonical SMILES writer.
//!
//! Atoms are ranked by iterated neighbourhood refinement of local invariants;
//! remaining ties are broken one class at a time and refined again until every
//! atom has its own rank. The string is then produced by a two-pass traversal:
//! the first pass walks the graph in rank order and records which bonds close
//! rings, the second emits atoms, ring digits and branches.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::element;
use crate::smiles::{BondOrder, Mol};

// ── Ranking ───────────────────────────────────────────────────────────────────

/// Replace arbitrary sortable keys with dense ranks starting at 0.
fn dense_ranks<K: Ord + Clone>(keys: &[K]) -> Vec<usize> {
    let mut sorted: Vec<K> = keys.to_vec();
    sorted.sort();
    sorted.dedup();
    keys.iter()
        .map(|k| sorted.binary_search(k).unwrap_or_default())
        .collect()
}

fn class_count(ranks: &[usize]) -> usize {
    let mut seen: Vec<usize> = ranks.to_vec();
    seen.sort_unstable();
    seen.dedup();
    seen.len()
}

fn bond_code(order: BondOrder) -> u8 {
    match order {
        BondOrder::Single => 1,
        BondOrder::Double => 2,
        BondOrder::Triple => 3,
        BondOrder::Quadruple => 4,
        BondOrder::Aromatic => 5,
    }
}

fn initial_ranks(mol: &Mol) -> Vec<usize> {
    let invariants: Vec<_> = mol
        .atoms
        .iter()
        .enumerate()
        .map(|(i, a)| {
            // degree first, so traversal starts from a terminal atom
            (
                mol.degree(i),
                a.atomic_number(),
                a.isotope.unwrap_or(0),
                a.charge,
                a.hydrogens,
                a.aromatic,
                a.class.unwrap_or(0),
            )
        })
        .collect();
    dense_ranks(&invariants)
}

/// Refine ranks by neighbourhood until the number of classes stops growing.
fn refine(mol: &Mol, mut ranks: Vec<usize>) -> Vec<usize> {
    let mut classes = class_count(&ranks);
    loop {
        let keys: Vec<(usize, Vec<(usize, u8)>)> = (0..mol.atom_count())
            .map(|i| {
                let mut env: Vec<(usize, u8)> = mol
                    .neighbors(i)
                    .iter()
                    .map(|&(n, b)| (ranks[n], bond_code(mol.bonds[b].order)))
                    .collect();
                env.sort_unstable();
                (ranks[i], env)
            })
            .collect();
        let next = dense_ranks(&keys);
        let next_classes = class_count(&next);
        ranks = next;
        if next_classes == classes {
            return ranks;
        }
        classes = next_classes;
    }
}

/// Give every atom a distinct rank.
pub fn canonical_ranks(mol: &Mol) -> Vec<usize> {
    let n = mol.atom_count();
    let mut ranks = refine(mol, initial_ranks(mol));

    while class_count(&ranks) < n {
        // lowest rank shared by more than one atom
        let mut members: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (i, &r) in ranks.iter().enumerate() {
            members.entry(r).or_default().push(i);
        }
        let Some((&tied, atoms)) = members.iter().find(|(_, atoms)| atoms.len() > 1) else {
            break;
        };
        let chosen = atoms[0];
        let split: Vec<usize> = ranks
            .iter()
            .enumerate()
            .map(|(i, &r)| {
                if r == tied && i != chosen {
                    2 * r + 1
                } else {
                    2 * r
                }
            })
            .collect();
        ranks = refine(mol, dense_ranks(&split));
    }
    ranks
}

// ── Writer ────────────────────────────────────────────────────────────────────

/// Ring digits currently in use; the lowest free one is handed out first.
#[derive(Default)]
struct DigitPool {
    used: Vec<u16>,
}

impl DigitPool {
    fn acquire(&mut self) -> u16 {
        let mut digit = 1;
        while self.used.contains(&digit) {
            digit += 1;
        }
        self.used.push(digit);
        digit
    }

    fn release(&mut self, digit: u16) {
        self.used.retain(|&d| d != digit);
    }
}

/// Traversal plan from the first pass.
struct Plan {
    children: Vec<Vec<(usize, usize)>>,
    ring_opens: Vec<Vec<usize>>,
    ring_closes: Vec<Vec<usize>>,
    visited: Vec<bool>,
    bond_seen: Vec<bool>,
}

impl Plan {
    fn new(mol: &Mol) -> Self {
        let n = mol.atom_count();
        Self {
            children: vec![Vec::new(); n],
            ring_opens: vec![Vec::new(); n],
            ring_closes: vec![Vec::new(); n],
            visited: vec![false; n],
            bond_seen: vec![false; mol.bonds.len()],
        }
    }

    /// Depth-first walk from `root`, taking neighbours in rank order.
    fn discover(&mut self, mol: &Mol, ranks: &[usize], root: usize) {
        let by_rank = |atom: usize| {
            let mut nbrs: Vec<(usize, usize)> = mol.neighbors(atom).to_vec();
            nbrs.sort_by_key(|&(n, _)| ranks[n]);
            nbrs
        };

        self.visited[root] = true;
        let mut stack: Vec<(usize, Vec<(usize, usize)>, usize)> = vec![(root, by_rank(root), 0)];
        while let Some((atom, nbrs, idx)) = stack.last_mut() {
            let Some(&(next, bond)) = nbrs.get(*idx) else {
                stack.pop();
                continue;
            };
            *idx += 1;
            let atom = *atom;
            if self.bond_seen[bond] {
                continue;
            }
            self.bond_seen[bond] = true;
            if self.visited[next] {
                // back edge: the ring opens at the ancestor
                self.ring_opens[next].push(bond);
                self.ring_closes[atom].push(bond);
            } else {
                self.visited[next] = true;
                self.children[atom].push((next, bond));
                stack.push((next, by_rank(next), 0));
            }
        }
    }
}

struct Emitter<'a> {
    mol: &'a Mol,
    plan: &'a Plan,
    digits: DigitPool,
    bond_digit: Vec<u16>,
    out: String,
}

/// Pending output of the emission pass.
enum Step {
    Atom(usize),
    Text(&'static str),
}

impl<'a> Emitter<'a> {
    fn emit(&mut self, root: usize) {
        let (mol, plan) = (self.mol, self.plan);
        let mut steps = vec![Step::Atom(root)];

        while let Some(step) = steps.pop() {
            let atom = match step {
                Step::Text(text) => {
                    self.out.push_str(text);
                    continue;
                }
                Step::Atom(atom) => atom,
            };
            self.out.push_str(&atom_text(mol, atom));

            let mut closing: Vec<(u16, usize)> = plan.ring_closes[atom]
                .iter()
                .map(|&b| (self.bond_digit[b], b))
                .collect();
            closing.sort_unstable();
            for (digit, _) in closing {
                push_digit(&mut self.out, digit);
                self.digits.release(digit);
            }

            for &bond in &plan.ring_opens[atom] {
                let digit = self.digits.acquire();
                self.bond_digit[bond] = digit;
                self.out.push_str(bond_symbol(mol, bond));
                push_digit(&mut self.out, digit);
            }

            // every child but the last becomes a parenthesised branch;
            // pushed in reverse so they pop in rank order
            let children = &plan.children[atom];
            for (k, &(child, bond)) in children.iter().enumerate().rev() {
                let last = k + 1 == children.len();
                if !last {
                    steps.push(Step::Text(")"));
                }
                steps.push(Step::Atom(child));
                steps.push(Step::Text(bond_symbol(mol, bond)));
                if !last {
                    steps.push(Step::Text("("));
                }
            }
        }
    }
}

fn push_digit(out: &mut String, digit: u16) {
    if digit < 10 {
        let _ = write!(out, "{}", digit);
    } else {
        let _ = write!(out, "%{:02}", digit);
    }
}

fn bond_symbol(mol: &Mol, bond: usize) -> &'static str {
    let b = &mol.bonds[bond];
    let both_aromatic = mol.atoms[b.a].aromatic && mol.atoms[b.b].aromatic;
    match b.order {
        BondOrder::Single if both_aromatic => "-",
        BondOrder::Single => "",
        BondOrder::Double => "=",
        BondOrder::Triple => "#",
        BondOrder::Quadruple => "$",
        BondOrder::Aromatic if both_aromatic => "",
        BondOrder::Aromatic => ":",
    }
}

fn atom_text(mol: &Mol, i: usize) -> String {
    let atom = &mol.atoms[i];
    let plain = atom.isotope.is_none() && atom.charge == 0 && atom.class.is_none();

    let symbol = match atom.element {
        Some(el) if atom.aromatic => el.symbol.to_ascii_lowercase(),
        Some(el) => el.symbol.to_string(),
        None => "*".to_string(),
    };

    let bare = plain
        && match atom.element {
            Some(el) => {
                element::is_organic_subset(el.number)
                    && element::implicit_hydrogens(el.number, atom.aromatic, mol.bond_order_sum(i))
                        == Some(atom.hydrogens)
            }
            None => atom.hydrogens == 0,
        };
    if bare {
        return symbol;
    }

    let mut text = String::from("[");
    if let Some(iso) = atom.isotope {
        let _ = write!(text, "{}", iso);
    }
    text.push_str(&symbol);
    match atom.hydrogens {
        0 => {}
        1 => text.push('H'),
        h => {
            let _ = write!(text, "H{}", h);
        }
    }
    match atom.charge {
        0 => {}
        1 => text.push('+'),
        -1 => text.push('-'),
        c if c > 0 => {
            let _ = write!(text, "+{}", c);
        }
        c => {
            let _ = write!(text, "-{}", -i16::from(c));
        }
    }
    if let Some(class) = atom.class {
        let _ = write!(text, ":{}", class);
    }
    text.push(']');
    text
}

/// Write the canonical SMILES for a parsed graph.
pub fn write_canonical(mol: &Mol) -> String {
    let ranks = canonical_ranks(mol);
    let mut plan = Plan::new(mol);

    // fragments in order of their lowest-ranked atom
    let mut roots: Vec<usize> = mol
        .components()
        .iter()
        .filter_map(|members| members.iter().copied().min_by_key(|&a| ranks[a]))
        .collect();
    roots.sort_by_key(|&a| ranks[a]);

    for &root in &roots {
        plan.discover(mol, &ranks, root);
    }

    let mut emitter = Emitter {
        mol,
        plan: &plan,
        digits: DigitPool::default(),
        bond_digit: vec![0; mol.bonds.len()],
        out: String::new(),
    };
    for (k, &root) in roots.iter().enumerate() {
        if k > 0 {
            emitter.out.push('.');
        }
        emitter.emit(root);
    }
    emitter.out
}

// ── Formula ───────────────────────────────────────────────────────────────────

/// Hill-order molecular formula with a net charge suffix, e.g. `C2H6O`, `H4N+`.
pub fn hill_formula(mol: &Mol) -> String {
    let mut counts: BTreeMap<&'static str, u32> = BTreeMap::new();
    let mut hydrogens: u32 = 0;
    let mut charge: i32 = 0;

    for atom in &mol.atoms {
        hydrogens += u32::from(atom.hydrogens);
        charge += i32::from(atom.charge);
        match atom.element {
            Some(el) if el.number == 1 => hydrogens += 1,
            Some(el) => *counts.entry(el.symbol).or_insert(0) += 1,
            None => {}
        }
    }

    let mut formula = String::new();
    let mut push = |symbol: &str, count: u32| {
        if count == 0 {
            return;
        }
        formula.push_str(symbol);
        if count > 1 {
            let _ = write!(formula, "{}", count);
        }
    };

    if let Some(carbons) = counts.remove("C") {
        push("C", carbons);
        push("H", hydrogens);
        for (symbol, count) in &counts {
            push(symbol, *count);
        }
    } else {
        counts.insert("H", hydrogens);
        for (symbol, count) in &counts {
            push(symbol, *count);
        }
    }

    match charge {
        0 => {}
        1 => formula.push('+'),
        -1 => formula.push('-'),
        c if c > 0 => {
            let _ = write!(formula, "+{}", c);
        }
        c => {
            let _ = write!(formula, "-{}", -c);
        }
    }
    formula
}
